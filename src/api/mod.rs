//! HTTP API
//! Mission: Translate requests into store operations and JSON envelopes

pub mod clients;
pub mod currency;
pub mod sales;
pub mod vehicles;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::warn;

/// `{ "success": true, "data": ... }`
pub fn ok<T: Serialize>(data: T) -> Json<Value> {
    Json(json!({ "success": true, "data": data }))
}

/// `{ "success": true, "message": ..., "data": ... }`
pub fn ok_with<T: Serialize>(message: &str, data: T) -> Json<Value> {
    Json(json!({ "success": true, "message": message, "data": data }))
}

/// `{ "success": true, "count": N, "data": [...] }`
pub fn listing<T: Serialize>(items: &[T]) -> Json<Value> {
    Json(json!({ "success": true, "count": items.len(), "data": items }))
}

/// `{ "success": true, "message": ... }`
pub fn message(message: &str) -> Json<Value> {
    Json(json!({ "success": true, "message": message }))
}

/// Resource endpoint failures.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(&'static str),
    Gate(crate::auth::AuthError),
    Internal,
}

impl ApiError {
    /// Log the detail server-side, return a generic 500 to the caller.
    pub fn internal(err: anyhow::Error) -> Self {
        warn!(error = %err, "request failed");
        ApiError::Internal
    }
}

impl From<crate::auth::AuthError> for ApiError {
    fn from(err: crate::auth::AuthError) -> Self {
        ApiError::Gate(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.to_string()),
            ApiError::Gate(err) => return err.into_response(),
            ApiError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal server error".to_string(),
            ),
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
    use crate::auth::AuthError;

    #[test]
    fn test_envelope_shapes() {
        let Json(value) = listing(&["a", "b"]);
        assert_eq!(value["success"], true);
        assert_eq!(value["count"], 2);

        let Json(value) = message("done");
        assert_eq!(value["message"], "done");
        assert!(value.get("data").is_none());
    }

    #[test]
    fn test_api_error_status_codes() {
        assert_eq!(
            ApiError::BadRequest("bad".to_string())
                .into_response()
                .status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::NotFound("vehicle not found").into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::Internal.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        // Gate failures keep their own status
        assert_eq!(
            ApiError::Gate(AuthError::Forbidden).into_response().status(),
            StatusCode::FORBIDDEN
        );
    }
}
