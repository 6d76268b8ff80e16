//! Authentication & Authorization Gates
//! Mission: Protect API endpoints with bearer-token validation and role checks

use crate::auth::{
    jwt::VerifyError,
    models::{Role, User},
};
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::time::Duration;
use tokio::time::timeout;
use tracing::warn;

/// Upper bound on the credential lookup so a wedged database cannot hang
/// requests indefinitely.
const USER_LOOKUP_TIMEOUT: Duration = Duration::from_secs(5);

/// Identity attached to the request after authentication.
///
/// Owned by the request lifecycle; dropped with the request.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl CurrentUser {
    fn from_user(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
        }
    }
}

/// Authentication gate.
///
/// Extracts the `Authorization: Bearer <token>` header, verifies the token,
/// confirms the referenced user still exists, and attaches the resolved
/// identity to the request. Every failure short-circuits the request.
pub async fn authenticate(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let header_value = req
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingHeader)?;

    let token = parse_bearer(header_value.to_str().map_err(|_| AuthError::MalformedHeader)?)
        .ok_or(AuthError::MalformedHeader)?;

    let claims = state.codec.verify(token).map_err(|e| match e {
        VerifyError::Expired => AuthError::TokenExpired,
        VerifyError::InvalidSignature => AuthError::InvalidToken,
    })?;

    // Stricter variant: the user behind the token must still exist.
    let lookup = timeout(USER_LOOKUP_TIMEOUT, state.users.find_by_id(claims.sub)).await;
    let user = match lookup {
        Err(_) => {
            warn!(user_id = claims.sub, "credential lookup timed out");
            return Err(AuthError::Internal);
        }
        Ok(Err(e)) => {
            warn!(user_id = claims.sub, error = %e, "credential lookup failed");
            return Err(AuthError::Internal);
        }
        Ok(Ok(None)) => return Err(AuthError::UnknownUser),
        Ok(Ok(Some(user))) => user,
    };

    req.extensions_mut().insert(CurrentUser::from_user(&user));

    Ok(next.run(req).await)
}

/// Split an `Authorization` header value into a bearer token.
///
/// Exactly two space-separated parts, the first literally `Bearer`.
fn parse_bearer(value: &str) -> Option<&str> {
    let mut parts = value.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some("Bearer"), Some(token), None) if !token.is_empty() => Some(token),
        _ => None,
    }
}

/// Authorization gate: pure predicate over the authenticated identity.
///
/// An empty `allowed` set means any authenticated role. Invocation without a
/// populated identity is a wiring error and is reported as unauthenticated.
pub fn authorize<'a>(
    user: Option<&'a CurrentUser>,
    allowed: &[Role],
) -> Result<&'a CurrentUser, AuthError> {
    let user = user.ok_or(AuthError::NotAuthenticated)?;

    if !allowed.is_empty() && !allowed.contains(&user.role) {
        return Err(AuthError::Forbidden);
    }

    Ok(user)
}

/// Gate failures, each terminal for the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    MissingHeader,
    MalformedHeader,
    InvalidToken,
    TokenExpired,
    UnknownUser,
    NotAuthenticated,
    Forbidden,
    Internal,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthError::MissingHeader => {
                (StatusCode::UNAUTHORIZED, "authorization header missing")
            }
            AuthError::MalformedHeader => (StatusCode::UNAUTHORIZED, "expected Bearer token"),
            AuthError::InvalidToken => (StatusCode::UNAUTHORIZED, "invalid token"),
            AuthError::TokenExpired => (StatusCode::UNAUTHORIZED, "token expired"),
            AuthError::UnknownUser => (StatusCode::UNAUTHORIZED, "user not found"),
            AuthError::NotAuthenticated => (StatusCode::UNAUTHORIZED, "authentication required"),
            AuthError::Forbidden => (StatusCode::FORBIDDEN, "insufficient role"),
            AuthError::Internal => (StatusCode::INTERNAL_SERVER_ERROR, "internal server error"),
        };

        (
            status,
            Json(json!({ "success": false, "message": message })),
        )
            .into_response()
    }
}
