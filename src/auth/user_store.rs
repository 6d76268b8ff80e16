//! Credential Store
//! Mission: Persist user accounts with salted password hashes

use crate::auth::models::{Role, User};
use crate::store::Db;
use anyhow::{Context, Result};
use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::Utc;
use rusqlite::{params, ErrorCode, OptionalExtension, Row};
use tracing::info;

/// Failure creating a user.
#[derive(Debug)]
pub enum UserStoreError {
    /// The email column carries a UNIQUE constraint; the insert itself is the
    /// only reliable duplicate check under concurrent registrations.
    DuplicateEmail,
    Database(anyhow::Error),
}

impl std::fmt::Display for UserStoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserStoreError::DuplicateEmail => write!(f, "email already registered"),
            UserStoreError::Database(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for UserStoreError {}

/// User storage over the shared SQLite handle.
pub struct UserStore {
    db: Db,
}

impl UserStore {
    /// Create the store and initialize its schema.
    pub async fn new(db: Db) -> Result<Self> {
        {
            let conn = db.lock().await;
            conn.execute(
                "CREATE TABLE IF NOT EXISTS users (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name TEXT NOT NULL,
                    email TEXT NOT NULL UNIQUE,
                    password_hash TEXT NOT NULL,
                    role TEXT NOT NULL DEFAULT 'client',
                    created_at TEXT NOT NULL
                )",
                [],
            )
            .context("create users table")?;
        }

        Ok(Self { db })
    }

    fn row_to_user(row: &Row<'_>) -> rusqlite::Result<User> {
        let role_str: String = row.get(4)?;
        // A role outside the closed set is data corruption, not a default
        let role = Role::from_str(&role_str).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                4,
                rusqlite::types::Type::Text,
                format!("unrecognized role {role_str:?}").into(),
            )
        })?;

        Ok(User {
            id: row.get(0)?,
            name: row.get(1)?,
            email: row.get(2)?,
            password_hash: row.get(3)?,
            role,
            created_at: row.get(5)?,
        })
    }

    /// Create a new user. The plaintext password is bcrypt-hashed before it
    /// touches the database. A duplicate email surfaces as
    /// `UserStoreError::DuplicateEmail`.
    pub async fn create(
        &self,
        name: &str,
        email: &str,
        password: &str,
        role: Role,
    ) -> Result<User, UserStoreError> {
        let password_hash = hash(password, DEFAULT_COST)
            .context("failed to hash password")
            .map_err(UserStoreError::Database)?;
        let created_at = Utc::now().to_rfc3339();

        let conn = self.db.lock().await;
        let inserted = conn.execute(
            "INSERT INTO users (name, email, password_hash, role, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![name, email, password_hash, role.as_str(), created_at],
        );
        match inserted {
            Ok(_) => {}
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == ErrorCode::ConstraintViolation =>
            {
                return Err(UserStoreError::DuplicateEmail);
            }
            Err(e) => {
                return Err(UserStoreError::Database(
                    anyhow::Error::new(e).context("failed to insert user"),
                ));
            }
        }
        let id = conn.last_insert_rowid();

        info!(email, role = role.as_str(), "created user");

        Ok(User {
            id,
            name: name.to_string(),
            email: email.to_string(),
            password_hash,
            role,
            created_at,
        })
    }

    /// Look up a user by email (includes the hash, for the login flow).
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let conn = self.db.lock().await;
        let mut stmt = conn.prepare_cached(
            "SELECT id, name, email, password_hash, role, created_at
             FROM users WHERE email = ?1",
        )?;

        stmt.query_row(params![email], Self::row_to_user)
            .optional()
            .context("failed to query user by email")
    }

    /// Look up a user by id (the authentication gate's existence check).
    pub async fn find_by_id(&self, id: i64) -> Result<Option<User>> {
        let conn = self.db.lock().await;
        let mut stmt = conn.prepare_cached(
            "SELECT id, name, email, password_hash, role, created_at
             FROM users WHERE id = ?1",
        )?;

        stmt.query_row(params![id], Self::row_to_user)
            .optional()
            .context("failed to query user by id")
    }

    /// Verify an email/password pair against the stored hash.
    pub async fn verify_password(&self, email: &str, password: &str) -> Result<bool> {
        match self.find_by_email(email).await? {
            Some(user) => {
                let valid =
                    verify(password, &user.password_hash).context("failed to verify password")?;
                Ok(valid)
            }
            None => Ok(false),
        }
    }

    /// Change a user's role. Returns false when the user does not exist.
    pub async fn set_role(&self, id: i64, role: Role) -> Result<bool> {
        let conn = self.db.lock().await;
        let rows = conn.execute(
            "UPDATE users SET role = ?1 WHERE id = ?2",
            params![role.as_str(), id],
        )?;

        if rows > 0 {
            info!(user_id = id, role = role.as_str(), "updated user role");
        }

        Ok(rows > 0)
    }

    /// List all users (admin endpoint backing).
    pub async fn list(&self) -> Result<Vec<User>> {
        let conn = self.db.lock().await;
        let mut stmt = conn.prepare_cached(
            "SELECT id, name, email, password_hash, role, created_at
             FROM users ORDER BY id ASC",
        )?;

        let users = stmt
            .query_map([], Self::row_to_user)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(users)
    }
}
