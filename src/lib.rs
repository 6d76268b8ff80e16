//! Autolot Backend Library
//!
//! REST backend for a vehicle dealership: inventory, clients, sales, and
//! user accounts with role-based access, plus a currency conversion layer.
//! Exposes the router builder so integration tests can drive the full app.

pub mod api;
pub mod auth;
pub mod config;
pub mod currency;
pub mod middleware;
pub mod store;

use crate::auth::{TokenCodec, UserStore};
use crate::config::AppConfig;
use crate::currency::CurrencyService;
use crate::store::{ClientStore, Db, SaleStore, VehicleStore};
use anyhow::Result;
use axum::{
    middleware as axum_middleware,
    routing::{get, post, put},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Shared application state, cloned into every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub codec: Arc<TokenCodec>,
    pub users: Arc<UserStore>,
    pub vehicles: Arc<VehicleStore>,
    pub clients: Arc<ClientStore>,
    pub sales: Arc<SaleStore>,
    pub currency: Arc<CurrencyService>,
}

impl AppState {
    /// Wire up every store and service from configuration.
    pub async fn from_config(config: AppConfig) -> Result<Self> {
        let db = Db::open(&config.database_path)?;

        let users = Arc::new(UserStore::new(db.clone()).await?);
        let vehicles = Arc::new(VehicleStore::new(db.clone()).await?);
        let clients = Arc::new(ClientStore::new(db.clone()).await?);
        let sales = Arc::new(SaleStore::new(db).await?);

        let codec = Arc::new(TokenCodec::new(
            config.jwt_secret.clone(),
            config.token_ttl_hours,
        ));
        let currency = Arc::new(CurrencyService::new(config.exchange_rate_api_base.clone()));

        Ok(Self {
            config: Arc::new(config),
            codec,
            users,
            vehicles,
            clients,
            sales,
            currency,
        })
    }
}

async fn health_check() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// Assemble the full application router.
///
/// Public surface: health, register/login, and vehicle lookups. Everything
/// else sits behind the authentication gate; role checks happen per handler.
pub fn build_router(state: AppState) -> Router {
    let public = Router::new()
        .route("/health", get(health_check))
        .route("/api/auth/register", post(auth::api::register))
        .route("/api/auth/login", post(auth::api::login))
        .route("/api/vehicles", get(api::vehicles::list))
        .route("/api/vehicles/:id", get(api::vehicles::get))
        .with_state(state.clone());

    let protected = Router::new()
        .route("/api/auth/profile", get(auth::api::profile))
        .route("/api/auth/users", get(auth::api::list_users))
        .route("/api/auth/users/:id/role", put(auth::api::set_role))
        .route("/api/vehicles", post(api::vehicles::create))
        .route(
            "/api/vehicles/:id",
            put(api::vehicles::update).delete(api::vehicles::remove),
        )
        .route(
            "/api/clients",
            get(api::clients::list).post(api::clients::create),
        )
        .route(
            "/api/clients/:id",
            get(api::clients::get)
                .put(api::clients::update)
                .delete(api::clients::remove),
        )
        .route(
            "/api/clients/:id/consultations",
            get(api::clients::consultations).post(api::clients::add_consultation),
        )
        .route("/api/sales", get(api::sales::list).post(api::sales::create))
        .route(
            "/api/sales/:id",
            get(api::sales::get)
                .put(api::sales::update)
                .delete(api::sales::remove),
        )
        .route("/api/sales/stats/total", get(api::sales::totals))
        .route("/api/sales/stats/seller/:id", get(api::sales::by_seller))
        .route("/api/currency/currencies", get(api::currency::currencies))
        .route("/api/currency/convert", get(api::currency::convert))
        .route("/api/currency/vehicle/:id", get(api::currency::vehicle_price))
        .route("/api/currency/vehicles", get(api::currency::vehicle_listing))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            auth::authenticate,
        ))
        .with_state(state);

    Router::new()
        .merge(public)
        .merge(protected)
        .layer(axum_middleware::from_fn(middleware::request_logging))
        .layer(CorsLayer::permissive())
}
