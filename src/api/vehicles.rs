//! Vehicle Endpoints
//! Mission: Inventory listing, lookup, and staff-only mutation

use crate::api::{listing, message, ok, ok_with, ApiError};
use crate::auth::{authorize, CurrentUser, Role};
use crate::store::vehicles::{NewVehicle, VehicleFilters};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde_json::Value;

const STAFF: &[Role] = &[Role::Admin, Role::Seller];

/// GET /api/vehicles (public)
pub async fn list(
    State(state): State<AppState>,
    Query(filters): Query<VehicleFilters>,
) -> Result<Json<Value>, ApiError> {
    let vehicles = state
        .vehicles
        .list(&filters)
        .await
        .map_err(ApiError::internal)?;

    Ok(listing(&vehicles))
}

/// GET /api/vehicles/:id (public)
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let vehicle = state
        .vehicles
        .get(id)
        .await
        .map_err(ApiError::internal)?
        .ok_or(ApiError::NotFound("vehicle not found"))?;

    Ok(ok(vehicle))
}

/// POST /api/vehicles (admin, seller)
pub async fn create(
    State(state): State<AppState>,
    user: Option<Extension<CurrentUser>>,
    Json(body): Json<NewVehicle>,
) -> Result<Response, ApiError> {
    authorize(user.as_deref(), STAFF)?;

    let vehicle = state
        .vehicles
        .create(&body)
        .await
        .map_err(ApiError::internal)?;

    Ok((StatusCode::CREATED, ok_with("vehicle created", vehicle)).into_response())
}

/// PUT /api/vehicles/:id (admin, seller)
pub async fn update(
    State(state): State<AppState>,
    user: Option<Extension<CurrentUser>>,
    Path(id): Path<i64>,
    Json(body): Json<NewVehicle>,
) -> Result<Json<Value>, ApiError> {
    authorize(user.as_deref(), STAFF)?;

    let vehicle = state
        .vehicles
        .update(id, &body)
        .await
        .map_err(ApiError::internal)?
        .ok_or(ApiError::NotFound("vehicle not found"))?;

    Ok(ok_with("vehicle updated", vehicle))
}

/// DELETE /api/vehicles/:id (admin, seller)
pub async fn remove(
    State(state): State<AppState>,
    user: Option<Extension<CurrentUser>>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    authorize(user.as_deref(), STAFF)?;

    let deleted = state
        .vehicles
        .delete(id)
        .await
        .map_err(ApiError::internal)?;
    if !deleted {
        return Err(ApiError::NotFound("vehicle not found"));
    }

    Ok(message("vehicle deleted"))
}
