//! Authentication API Endpoints
//! Mission: Registration, login, profile, and admin user management

use crate::auth::{
    middleware::{authorize, CurrentUser},
    models::{LoginRequest, RegisterRequest, Role, SetRoleRequest, UserResponse},
    user_store::UserStoreError,
};
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde_json::json;
use tracing::{info, warn};

const MIN_PASSWORD_LEN: usize = 6;

/// Register endpoint - POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Response, AuthApiError> {
    if payload.name.trim().is_empty()
        || payload.email.trim().is_empty()
        || payload.password.is_empty()
    {
        return Err(AuthApiError::MissingFields);
    }

    if !email_is_valid(&payload.email) {
        return Err(AuthApiError::InvalidEmail);
    }

    if payload.password.len() < MIN_PASSWORD_LEN {
        return Err(AuthApiError::WeakPassword);
    }

    let role = payload.role.unwrap_or(Role::Client);

    // No find-then-insert: the UNIQUE constraint is the duplicate check, so
    // two concurrent registrations cannot both get past it.
    let user = state
        .users
        .create(&payload.name, &payload.email, &payload.password, role)
        .await
        .map_err(|e| match e {
            UserStoreError::DuplicateEmail => AuthApiError::EmailTaken,
            UserStoreError::Database(err) => AuthApiError::internal(err),
        })?;

    let token = state.codec.issue(user.id).map_err(AuthApiError::internal)?;

    info!(email = %user.email, "user registered");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "user registered",
            "data": {
                "user": UserResponse::from_user(&user),
                "token": token,
            }
        })),
    )
        .into_response())
}

/// Login endpoint - POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<serde_json::Value>, AuthApiError> {
    if payload.email.trim().is_empty() || payload.password.is_empty() {
        return Err(AuthApiError::MissingFields);
    }

    let valid = state
        .users
        .verify_password(&payload.email, &payload.password)
        .await
        .map_err(AuthApiError::internal)?;

    if !valid {
        // Unknown email and wrong password are indistinguishable on purpose
        warn!(email = %payload.email, "failed login attempt");
        return Err(AuthApiError::InvalidCredentials);
    }

    let user = state
        .users
        .find_by_email(&payload.email)
        .await
        .map_err(AuthApiError::internal)?
        .ok_or(AuthApiError::InvalidCredentials)?;

    let token = state.codec.issue(user.id).map_err(AuthApiError::internal)?;

    info!(email = %user.email, role = user.role.as_str(), "login successful");

    Ok(Json(json!({
        "success": true,
        "message": "login successful",
        "data": {
            "user": UserResponse::from_user(&user),
            "token": token,
        }
    })))
}

/// Current user profile - GET /api/auth/profile
pub async fn profile(
    user: Option<Extension<CurrentUser>>,
) -> Result<Json<serde_json::Value>, AuthApiError> {
    let user = authorize(user.as_deref(), &[])?;

    Ok(Json(json!({
        "success": true,
        "data": {
            "user": {
                "id": user.id,
                "name": user.name,
                "email": user.email,
                "role": user.role,
            }
        }
    })))
}

/// List all users - GET /api/auth/users (admin only)
pub async fn list_users(
    State(state): State<AppState>,
    user: Option<Extension<CurrentUser>>,
) -> Result<Json<serde_json::Value>, AuthApiError> {
    authorize(user.as_deref(), &[Role::Admin])?;

    let users = state.users.list().await.map_err(AuthApiError::internal)?;
    let users: Vec<UserResponse> = users.iter().map(UserResponse::from_user).collect();

    Ok(Json(json!({
        "success": true,
        "count": users.len(),
        "data": users,
    })))
}

/// Change a user's role - PUT /api/auth/users/:id/role (admin only)
pub async fn set_role(
    State(state): State<AppState>,
    user: Option<Extension<CurrentUser>>,
    Path(user_id): Path<i64>,
    Json(payload): Json<SetRoleRequest>,
) -> Result<Json<serde_json::Value>, AuthApiError> {
    authorize(user.as_deref(), &[Role::Admin])?;

    let updated = state
        .users
        .set_role(user_id, payload.role)
        .await
        .map_err(AuthApiError::internal)?;

    if !updated {
        return Err(AuthApiError::UserNotFound);
    }

    Ok(Json(json!({
        "success": true,
        "message": "role updated",
    })))
}

/// Good enough for input hygiene: one '@' with a dot somewhere after it.
fn email_is_valid(email: &str) -> bool {
    if email.contains(char::is_whitespace) {
        return false;
    }
    let mut parts = email.split('@');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        _ => false,
    }
}

/// Auth API errors
#[derive(Debug)]
pub enum AuthApiError {
    MissingFields,
    InvalidEmail,
    WeakPassword,
    EmailTaken,
    InvalidCredentials,
    UserNotFound,
    Gate(crate::auth::middleware::AuthError),
    Internal,
}

impl AuthApiError {
    fn internal(err: anyhow::Error) -> Self {
        warn!(error = %err, "auth endpoint failure");
        AuthApiError::Internal
    }
}

impl From<crate::auth::middleware::AuthError> for AuthApiError {
    fn from(err: crate::auth::middleware::AuthError) -> Self {
        AuthApiError::Gate(err)
    }
}

impl IntoResponse for AuthApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthApiError::MissingFields => (
                StatusCode::BAD_REQUEST,
                "name, email and password are required",
            ),
            AuthApiError::InvalidEmail => (StatusCode::BAD_REQUEST, "invalid email"),
            AuthApiError::WeakPassword => (
                StatusCode::BAD_REQUEST,
                "password must be at least 6 characters",
            ),
            AuthApiError::EmailTaken => (StatusCode::CONFLICT, "email already registered"),
            AuthApiError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "invalid credentials"),
            AuthApiError::UserNotFound => (StatusCode::NOT_FOUND, "user not found"),
            AuthApiError::Gate(err) => return err.into_response(),
            AuthApiError::Internal => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
            }
        };

        (
            status,
            Json(json!({ "success": false, "message": message })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_validation() {
        assert!(email_is_valid("ana@x.com"));
        assert!(email_is_valid("first.last@sub.domain.org"));

        assert!(!email_is_valid("ana"));
        assert!(!email_is_valid("ana@"));
        assert!(!email_is_valid("@x.com"));
        assert!(!email_is_valid("ana@nodot"));
        assert!(!email_is_valid("ana@.com"));
        assert!(!email_is_valid("ana@x.com."));
        assert!(!email_is_valid("a na@x.com"));
        assert!(!email_is_valid("ana@x@y.com"));
    }

    #[test]
    fn test_auth_api_error_responses() {
        assert_eq!(
            AuthApiError::MissingFields.into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AuthApiError::EmailTaken.into_response().status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AuthApiError::InvalidCredentials.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthApiError::UserNotFound.into_response().status(),
            StatusCode::NOT_FOUND
        );
    }
}
