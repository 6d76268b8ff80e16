//! End-to-end authentication and authorization flow against the full router.

use autolot_backend::{
    auth::{Role, TokenCodec, UserStore},
    build_router,
    config::AppConfig,
    currency::CurrencyService,
    store::{ClientStore, Db, SaleStore, VehicleStore},
    AppState,
};
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::NamedTempFile;
use tower::ServiceExt;

const TEST_SECRET: &str = "integration-test-secret";

async fn test_app() -> (Router, AppState, NamedTempFile) {
    let file = NamedTempFile::new().unwrap();

    let config = AppConfig {
        bind_addr: "127.0.0.1:0".to_string(),
        database_path: file.path().to_str().unwrap().to_string(),
        jwt_secret: TEST_SECRET.to_string(),
        token_ttl_hours: 24,
        exchange_rate_api_base: "http://127.0.0.1:9/latest".to_string(),
    };

    let db = Db::open(&config.database_path).unwrap();
    let state = AppState {
        codec: Arc::new(TokenCodec::new(
            config.jwt_secret.clone(),
            config.token_ttl_hours,
        )),
        users: Arc::new(UserStore::new(db.clone()).await.unwrap()),
        vehicles: Arc::new(VehicleStore::new(db.clone()).await.unwrap()),
        clients: Arc::new(ClientStore::new(db.clone()).await.unwrap()),
        sales: Arc::new(SaleStore::new(db).await.unwrap()),
        currency: Arc::new(CurrencyService::new(config.exchange_rate_api_base.clone())),
        config: Arc::new(config),
    };

    (build_router(state.clone()), state, file)
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

#[tokio::test]
async fn register_then_promote_then_access_admin_route() {
    let (app, state, _file) = test_app().await;

    // Register Ana - 201 with a token and a client role
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/register",
            None,
            json!({ "name": "Ana", "email": "ana@x.com", "password": "secret1" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["user"]["role"], "client");
    let user_id = body["data"]["user"]["id"].as_i64().unwrap();
    let token = body["data"]["token"].as_str().unwrap().to_string();

    // The admin route rejects a client token
    let response = app
        .clone()
        .oneshot(get_request("/api/auth/users", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Promote Ana directly in the store, then the same token works:
    // the gate resolves the user (and role) on every request
    assert!(state.users.set_role(user_id, Role::Admin).await.unwrap());

    let response = app
        .clone()
        .oneshot(get_request("/api/auth/users", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["data"][0]["email"], "ana@x.com");
}

#[tokio::test]
async fn gate_rejections() {
    let (app, state, _file) = test_app().await;

    // No Authorization header
    let response = app
        .clone()
        .oneshot(get_request("/api/auth/profile", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "authorization header missing");

    // Wrong scheme
    let request = Request::builder()
        .method("GET")
        .uri("/api/auth/profile")
        .header(header::AUTHORIZATION, "Basic abc123")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["message"], "expected Bearer token");

    // Garbage token
    let response = app
        .clone()
        .oneshot(get_request("/api/auth/profile", Some("not.a.token")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["message"], "invalid token");

    // Valid signature, nonexistent user
    let orphan = state.codec.issue(9999).unwrap();
    let response = app
        .clone()
        .oneshot(get_request("/api/auth/profile", Some(&orphan)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["message"], "user not found");

    // Expired token for a user that does exist
    let user = state
        .users
        .create("Ana", "ana@x.com", "secret1", Role::Client)
        .await
        .unwrap();
    let expired = TokenCodec::new(TEST_SECRET.to_string(), -1)
        .issue(user.id)
        .unwrap();
    let response = app
        .clone()
        .oneshot(get_request("/api/auth/profile", Some(&expired)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["message"], "token expired");

    // Token signed under a different secret
    let foreign = TokenCodec::new("some-other-secret".to_string(), 24)
        .issue(1)
        .unwrap();
    let response = app
        .clone()
        .oneshot(get_request("/api/auth/profile", Some(&foreign)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["message"], "invalid token");
}

#[tokio::test]
async fn login_and_profile() {
    let (app, _state, _file) = test_app().await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/register",
            None,
            json!({ "name": "Bea", "email": "bea@x.com", "password": "secret2", "role": "seller" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    // Wrong password
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            None,
            json!({ "email": "bea@x.com", "password": "wrong" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Unknown email reads the same
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            None,
            json!({ "email": "ghost@x.com", "password": "secret2" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["message"], "invalid credentials");

    // Correct credentials
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            None,
            json!({ "email": "bea@x.com", "password": "secret2" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let token = body["data"]["token"].as_str().unwrap().to_string();

    let response = app
        .clone()
        .oneshot(get_request("/api/auth/profile", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["user"]["email"], "bea@x.com");
    assert_eq!(body["data"]["user"]["role"], "seller");
    // The hash never leaves the server
    assert!(body["data"]["user"].get("password_hash").is_none());
}

#[tokio::test]
async fn duplicate_registration_conflicts() {
    let (app, _state, _file) = test_app().await;

    let payload = json!({ "name": "Ana", "email": "ana@x.com", "password": "secret1" });
    let response = app
        .clone()
        .oneshot(json_request("POST", "/api/auth/register", None, payload.clone()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .clone()
        .oneshot(json_request("POST", "/api/auth/register", None, payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Validation failures
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/register",
            None,
            json!({ "name": "X", "email": "not-an-email", "password": "secret1" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/register",
            None,
            json!({ "name": "X", "email": "x@x.com", "password": "abc" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn vehicle_routes_respect_roles() {
    let (app, state, _file) = test_app().await;

    // Public read works without any token
    let response = app
        .clone()
        .oneshot(get_request("/api/vehicles", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["count"], 0);

    // A client may not create vehicles
    let client = state
        .users
        .create("Cli", "cli@x.com", "secret3", Role::Client)
        .await
        .unwrap();
    let client_token = state.codec.issue(client.id).unwrap();

    let vehicle = json!({ "make": "Toyota", "model": "Corolla", "year": 2021, "price": 21500.0 });
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/vehicles",
            Some(&client_token),
            vehicle.clone(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // A seller may
    let seller = state
        .users
        .create("Bea", "bea@x.com", "secret2", Role::Seller)
        .await
        .unwrap();
    let seller_token = state.codec.issue(seller.id).unwrap();

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/vehicles",
            Some(&seller_token),
            vehicle,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    // And the new vehicle is publicly visible
    let response = app
        .clone()
        .oneshot(get_request("/api/vehicles?make=Toyota", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["data"][0]["model"], "Corolla");
}
