//! Client Endpoints
//! Mission: Client records and their vehicle consultations

use crate::api::{listing, message, ok, ok_with, ApiError};
use crate::auth::{authorize, CurrentUser, Role};
use crate::store::clients::{ClientFilters, NewClient, NewConsultation};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde_json::Value;

const STAFF: &[Role] = &[Role::Admin, Role::Seller];

/// GET /api/clients
pub async fn list(
    State(state): State<AppState>,
    Query(filters): Query<ClientFilters>,
) -> Result<Json<Value>, ApiError> {
    let clients = state
        .clients
        .list(&filters)
        .await
        .map_err(ApiError::internal)?;

    Ok(listing(&clients))
}

/// GET /api/clients/:id
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let client = state
        .clients
        .get(id)
        .await
        .map_err(ApiError::internal)?
        .ok_or(ApiError::NotFound("client not found"))?;

    Ok(ok(client))
}

/// POST /api/clients
pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<NewClient>,
) -> Result<Response, ApiError> {
    let client = state
        .clients
        .create(&body)
        .await
        .map_err(ApiError::internal)?;

    Ok((StatusCode::CREATED, ok_with("client created", client)).into_response())
}

/// PUT /api/clients/:id
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<NewClient>,
) -> Result<Json<Value>, ApiError> {
    let client = state
        .clients
        .update(id, &body)
        .await
        .map_err(ApiError::internal)?
        .ok_or(ApiError::NotFound("client not found"))?;

    Ok(ok_with("client updated", client))
}

/// DELETE /api/clients/:id (admin, seller)
pub async fn remove(
    State(state): State<AppState>,
    user: Option<Extension<CurrentUser>>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    authorize(user.as_deref(), STAFF)?;

    let deleted = state
        .clients
        .delete(id)
        .await
        .map_err(ApiError::internal)?;
    if !deleted {
        return Err(ApiError::NotFound("client not found"));
    }

    Ok(message("client deleted"))
}

/// GET /api/clients/:id/consultations
pub async fn consultations(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    // 404 for an unknown client rather than an empty list
    state
        .clients
        .get(id)
        .await
        .map_err(ApiError::internal)?
        .ok_or(ApiError::NotFound("client not found"))?;

    let consultations = state
        .clients
        .consultations(id)
        .await
        .map_err(ApiError::internal)?;

    Ok(listing(&consultations))
}

/// POST /api/clients/:id/consultations
pub async fn add_consultation(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<NewConsultation>,
) -> Result<Response, ApiError> {
    state
        .clients
        .get(id)
        .await
        .map_err(ApiError::internal)?
        .ok_or(ApiError::NotFound("client not found"))?;

    state
        .vehicles
        .get(body.vehicle_id)
        .await
        .map_err(ApiError::internal)?
        .ok_or(ApiError::NotFound("vehicle not found"))?;

    let consultation = state
        .clients
        .add_consultation(id, &body)
        .await
        .map_err(ApiError::internal)?;

    Ok((
        StatusCode::CREATED,
        ok_with("consultation recorded", consultation),
    )
        .into_response())
}
