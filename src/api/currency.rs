//! Currency Endpoints
//! Mission: Rate lookup and vehicle price conversion (authenticated)

use crate::api::{listing, ok, ApiError};
use crate::currency::{round_cents, DEFAULT_BASE_CURRENCY};
use crate::store::vehicles::VehicleFilters;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::warn;

const DEFAULT_TARGETS: &[&str] = &["EUR", "GBP", "JPY"];

fn upstream(err: anyhow::Error) -> ApiError {
    warn!(error = %err, "exchange rate lookup failed");
    ApiError::Internal
}

/// GET /api/currency/currencies
pub async fn currencies(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let currencies = state
        .currency
        .available_currencies()
        .await
        .map_err(upstream)?;

    Ok(ok(currencies))
}

#[derive(Debug, Deserialize)]
pub struct ConvertQuery {
    pub amount: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
}

/// GET /api/currency/convert?amount&from&to
pub async fn convert(
    State(state): State<AppState>,
    Query(query): Query<ConvertQuery>,
) -> Result<Json<Value>, ApiError> {
    let (Some(amount), Some(from), Some(to)) = (query.amount, query.from, query.to) else {
        return Err(ApiError::BadRequest(
            "amount, from and to query parameters are required".to_string(),
        ));
    };

    let amount: f64 = amount
        .parse()
        .map_err(|_| ApiError::BadRequest("amount must be a number".to_string()))?;

    let rates = state.currency.rates(&from).await.map_err(upstream)?;
    let rate = *rates
        .get(&to)
        .ok_or_else(|| ApiError::BadRequest(format!("currency {to} not supported")))?;

    Ok(ok(json!({
        "amount": amount,
        "from": from,
        "to": to,
        "rate": rate,
        "converted": round_cents(amount * rate),
    })))
}

#[derive(Debug, Deserialize)]
pub struct VehiclePriceQuery {
    pub base_currency: Option<String>,
    /// Comma-separated currency codes; defaults to EUR,GBP,JPY
    pub target_currencies: Option<String>,
}

/// GET /api/currency/vehicle/:id?base_currency&target_currencies
pub async fn vehicle_price(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<VehiclePriceQuery>,
) -> Result<Json<Value>, ApiError> {
    let vehicle = state
        .vehicles
        .get(id)
        .await
        .map_err(ApiError::internal)?
        .ok_or(ApiError::NotFound("vehicle not found"))?;

    let base = query
        .base_currency
        .unwrap_or_else(|| DEFAULT_BASE_CURRENCY.to_string());
    let targets: Vec<String> = match query.target_currencies {
        Some(list) => list.split(',').map(|s| s.trim().to_string()).collect(),
        None => DEFAULT_TARGETS.iter().map(|s| s.to_string()).collect(),
    };

    let rates = state.currency.rates(&base).await.map_err(upstream)?;

    let mut conversions = serde_json::Map::new();
    for target in &targets {
        let rate = *rates
            .get(target)
            .ok_or_else(|| ApiError::BadRequest(format!("currency {target} not supported")))?;
        conversions.insert(target.clone(), json!(round_cents(vehicle.price * rate)));
    }

    Ok(ok(json!({
        "vehicle": {
            "id": vehicle.id,
            "make": vehicle.make,
            "model": vehicle.model,
            "year": vehicle.year,
        },
        "base_currency": base,
        "price": vehicle.price,
        "conversions": conversions,
    })))
}

#[derive(Debug, Deserialize)]
pub struct VehicleListingQuery {
    pub base_currency: Option<String>,
    pub target_currency: Option<String>,
}

/// GET /api/currency/vehicles?base_currency&target_currency
pub async fn vehicle_listing(
    State(state): State<AppState>,
    Query(query): Query<VehicleListingQuery>,
) -> Result<Json<Value>, ApiError> {
    let Some(target) = query.target_currency else {
        return Err(ApiError::BadRequest(
            "target_currency query parameter is required".to_string(),
        ));
    };
    let base = query
        .base_currency
        .unwrap_or_else(|| DEFAULT_BASE_CURRENCY.to_string());

    let vehicles = state
        .vehicles
        .list(&VehicleFilters::default())
        .await
        .map_err(ApiError::internal)?;

    let rates = state.currency.rates(&base).await.map_err(upstream)?;
    let rate = *rates
        .get(&target)
        .ok_or_else(|| ApiError::BadRequest(format!("currency {target} not supported")))?;

    let converted: Vec<Value> = vehicles
        .iter()
        .map(|v| {
            json!({
                "id": v.id,
                "make": v.make,
                "model": v.model,
                "year": v.year,
                "available": v.available,
                "original_price": v.price,
                "original_currency": base,
                "converted_price": round_cents(v.price * rate),
                "converted_currency": target,
                "exchange_rate": rate,
            })
        })
        .collect();

    Ok(listing(&converted))
}
