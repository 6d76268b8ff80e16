//! Sale Endpoints
//! Mission: Sales records, revenue stats, and inventory hand-off

use crate::api::{listing, message, ok, ok_with, ApiError};
use crate::auth::{authorize, CurrentUser, Role};
use crate::store::sales::{NewSale, SaleFilters, UpdateSale};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::Deserialize;
use serde_json::Value;

const STAFF: &[Role] = &[Role::Admin, Role::Seller];
const ADMIN_ONLY: &[Role] = &[Role::Admin];

/// GET /api/sales
pub async fn list(
    State(state): State<AppState>,
    Query(filters): Query<SaleFilters>,
) -> Result<Json<Value>, ApiError> {
    let sales = state
        .sales
        .list(&filters)
        .await
        .map_err(ApiError::internal)?;

    Ok(listing(&sales))
}

/// GET /api/sales/:id
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let sale = state
        .sales
        .get(id)
        .await
        .map_err(ApiError::internal)?
        .ok_or(ApiError::NotFound("sale not found"))?;

    Ok(ok(sale))
}

/// POST /api/sales (admin, seller)
pub async fn create(
    State(state): State<AppState>,
    user: Option<Extension<CurrentUser>>,
    Json(body): Json<NewSale>,
) -> Result<Response, ApiError> {
    authorize(user.as_deref(), STAFF)?;

    // Reject dangling references up front; FK failures read as 500s
    state
        .vehicles
        .get(body.vehicle_id)
        .await
        .map_err(ApiError::internal)?
        .ok_or(ApiError::NotFound("vehicle not found"))?;
    state
        .clients
        .get(body.client_id)
        .await
        .map_err(ApiError::internal)?
        .ok_or(ApiError::NotFound("client not found"))?;
    state
        .users
        .find_by_id(body.seller_id)
        .await
        .map_err(ApiError::internal)?
        .ok_or(ApiError::NotFound("seller not found"))?;

    let sale = state.sales.create(&body).await.map_err(ApiError::internal)?;

    Ok((StatusCode::CREATED, ok_with("sale recorded", sale)).into_response())
}

/// PUT /api/sales/:id (admin, seller)
pub async fn update(
    State(state): State<AppState>,
    user: Option<Extension<CurrentUser>>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateSale>,
) -> Result<Json<Value>, ApiError> {
    authorize(user.as_deref(), STAFF)?;

    let sale = state
        .sales
        .update(id, &body)
        .await
        .map_err(ApiError::internal)?
        .ok_or(ApiError::NotFound("sale not found"))?;

    Ok(ok_with("sale updated", sale))
}

/// DELETE /api/sales/:id (admin)
pub async fn remove(
    State(state): State<AppState>,
    user: Option<Extension<CurrentUser>>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    authorize(user.as_deref(), ADMIN_ONLY)?;

    let deleted = state.sales.delete(id).await.map_err(ApiError::internal)?;
    if !deleted {
        return Err(ApiError::NotFound("sale not found"));
    }

    Ok(message("sale deleted"))
}

#[derive(Debug, Deserialize)]
pub struct TotalsQuery {
    pub from: Option<String>,
    pub to: Option<String>,
}

/// GET /api/sales/stats/total?from&to (admin, seller)
pub async fn totals(
    State(state): State<AppState>,
    user: Option<Extension<CurrentUser>>,
    Query(query): Query<TotalsQuery>,
) -> Result<Json<Value>, ApiError> {
    authorize(user.as_deref(), STAFF)?;

    let (Some(from), Some(to)) = (query.from, query.to) else {
        return Err(ApiError::BadRequest(
            "from and to query parameters are required".to_string(),
        ));
    };

    let totals = state
        .sales
        .totals(&from, &to)
        .await
        .map_err(ApiError::internal)?;

    Ok(ok(totals))
}

/// GET /api/sales/stats/seller/:id (admin, seller)
pub async fn by_seller(
    State(state): State<AppState>,
    user: Option<Extension<CurrentUser>>,
    Path(seller_id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    authorize(user.as_deref(), STAFF)?;

    let sales = state
        .sales
        .by_seller(seller_id)
        .await
        .map_err(ApiError::internal)?;

    Ok(listing(&sales))
}
