//! Client Store
//! Mission: CRUD over dealership clients and their vehicle consultations

use crate::store::Db;
use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{params, params_from_iter, types::Value, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
pub struct Client {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewClient {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// Optional listing filters. Names match on substring, email exactly.
#[derive(Debug, Default, Deserialize)]
pub struct ClientFilters {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
}

/// A client's interest in a vehicle, joined with the vehicle's identity.
#[derive(Debug, Clone, Serialize)]
pub struct Consultation {
    pub id: i64,
    pub client_id: i64,
    pub vehicle_id: i64,
    pub created_at: String,
    pub notes: Option<String>,
    pub vehicle_make: String,
    pub vehicle_model: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewConsultation {
    pub vehicle_id: i64,
    pub notes: Option<String>,
}

pub struct ClientStore {
    db: Db,
}

impl ClientStore {
    pub async fn new(db: Db) -> Result<Self> {
        {
            let conn = db.lock().await;
            conn.execute(
                "CREATE TABLE IF NOT EXISTS clients (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    first_name TEXT NOT NULL,
                    last_name TEXT NOT NULL,
                    email TEXT NOT NULL UNIQUE,
                    phone TEXT,
                    address TEXT
                )",
                [],
            )
            .context("create clients table")?;

            conn.execute(
                "CREATE TABLE IF NOT EXISTS consultations (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    client_id INTEGER NOT NULL,
                    vehicle_id INTEGER NOT NULL,
                    created_at TEXT NOT NULL,
                    notes TEXT,
                    FOREIGN KEY (client_id) REFERENCES clients(id) ON DELETE CASCADE,
                    FOREIGN KEY (vehicle_id) REFERENCES vehicles(id) ON DELETE CASCADE
                )",
                [],
            )
            .context("create consultations table")?;
        }

        Ok(Self { db })
    }

    fn row_to_client(row: &Row<'_>) -> rusqlite::Result<Client> {
        Ok(Client {
            id: row.get(0)?,
            first_name: row.get(1)?,
            last_name: row.get(2)?,
            email: row.get(3)?,
            phone: row.get(4)?,
            address: row.get(5)?,
        })
    }

    pub async fn create(&self, client: &NewClient) -> Result<Client> {
        let conn = self.db.lock().await;
        conn.execute(
            "INSERT INTO clients (first_name, last_name, email, phone, address)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                client.first_name,
                client.last_name,
                client.email,
                client.phone,
                client.address
            ],
        )
        .context("failed to insert client")?;

        Ok(Client {
            id: conn.last_insert_rowid(),
            first_name: client.first_name.clone(),
            last_name: client.last_name.clone(),
            email: client.email.clone(),
            phone: client.phone.clone(),
            address: client.address.clone(),
        })
    }

    pub async fn get(&self, id: i64) -> Result<Option<Client>> {
        let conn = self.db.lock().await;
        let mut stmt = conn.prepare_cached(
            "SELECT id, first_name, last_name, email, phone, address FROM clients WHERE id = ?1",
        )?;

        stmt.query_row(params![id], Self::row_to_client)
            .optional()
            .context("failed to query client")
    }

    pub async fn list(&self, filters: &ClientFilters) -> Result<Vec<Client>> {
        let mut sql =
            String::from("SELECT id, first_name, last_name, email, phone, address FROM clients");
        let mut clauses: Vec<&str> = Vec::new();
        let mut values: Vec<Value> = Vec::new();

        if let Some(first_name) = &filters.first_name {
            clauses.push("first_name LIKE ?");
            values.push(Value::Text(format!("%{first_name}%")));
        }
        if let Some(last_name) = &filters.last_name {
            clauses.push("last_name LIKE ?");
            values.push(Value::Text(format!("%{last_name}%")));
        }
        if let Some(email) = &filters.email {
            clauses.push("email = ?");
            values.push(Value::Text(email.clone()));
        }

        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY id ASC");

        let conn = self.db.lock().await;
        let mut stmt = conn.prepare(&sql)?;
        let clients = stmt
            .query_map(params_from_iter(values), Self::row_to_client)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(clients)
    }

    pub async fn update(&self, id: i64, client: &NewClient) -> Result<Option<Client>> {
        let conn = self.db.lock().await;
        let rows = conn.execute(
            "UPDATE clients SET first_name = ?1, last_name = ?2, email = ?3, phone = ?4, address = ?5
             WHERE id = ?6",
            params![
                client.first_name,
                client.last_name,
                client.email,
                client.phone,
                client.address,
                id
            ],
        )?;

        if rows == 0 {
            return Ok(None);
        }

        Ok(Some(Client {
            id,
            first_name: client.first_name.clone(),
            last_name: client.last_name.clone(),
            email: client.email.clone(),
            phone: client.phone.clone(),
            address: client.address.clone(),
        }))
    }

    pub async fn delete(&self, id: i64) -> Result<bool> {
        let conn = self.db.lock().await;
        let rows = conn.execute("DELETE FROM clients WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    /// Record a client's interest in a vehicle.
    pub async fn add_consultation(
        &self,
        client_id: i64,
        consultation: &NewConsultation,
    ) -> Result<Consultation> {
        let created_at = Utc::now().to_rfc3339();

        let conn = self.db.lock().await;
        conn.execute(
            "INSERT INTO consultations (client_id, vehicle_id, created_at, notes)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                client_id,
                consultation.vehicle_id,
                created_at,
                consultation.notes
            ],
        )
        .context("failed to insert consultation")?;
        let id = conn.last_insert_rowid();

        let mut stmt = conn.prepare_cached(
            "SELECT make, model FROM vehicles WHERE id = ?1",
        )?;
        let (vehicle_make, vehicle_model) = stmt
            .query_row(params![consultation.vehicle_id], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })
            .context("consultation references a missing vehicle")?;

        Ok(Consultation {
            id,
            client_id,
            vehicle_id: consultation.vehicle_id,
            created_at,
            notes: consultation.notes.clone(),
            vehicle_make,
            vehicle_model,
        })
    }

    /// A client's consultations, newest first, joined with vehicle identity.
    pub async fn consultations(&self, client_id: i64) -> Result<Vec<Consultation>> {
        let conn = self.db.lock().await;
        let mut stmt = conn.prepare_cached(
            "SELECT c.id, c.client_id, c.vehicle_id, c.created_at, c.notes, v.make, v.model
             FROM consultations c
             JOIN vehicles v ON c.vehicle_id = v.id
             WHERE c.client_id = ?1
             ORDER BY c.created_at DESC",
        )?;

        let consultations = stmt
            .query_map(params![client_id], |row| {
                Ok(Consultation {
                    id: row.get(0)?,
                    client_id: row.get(1)?,
                    vehicle_id: row.get(2)?,
                    created_at: row.get(3)?,
                    notes: row.get(4)?,
                    vehicle_make: row.get(5)?,
                    vehicle_model: row.get(6)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(consultations)
    }
}
