//! Shared fixtures: the test permission catalog and token minting.
#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::{Json, Router, routing};
use jsonwebtoken::{EncodingKey, Header};
use serde_json::{Value, json};

use web_auth::{Context, FileSource, PermissionCatalog, PermissionDefinition};

/// Decodes to 32 set bits followed by `01111111 01111111`: indices 7 and 15
/// (counted from the right) are the only unset bits.
pub const FIXTURE_BITMASK: &str = "/////39/";

/// Six zero bytes, nothing granted.
pub const EMPTY_BITMASK: &str = "AAAAAAAA";

pub fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/permissions.json")
}

pub fn fixture_context() -> Arc<Context> {
    let catalog = PermissionCatalog::new(FileSource::new(fixture_path()), 60)
        .expect("fixture catalog should load");
    Arc::new(Context::new(catalog, "web_auth_test"))
}

/// Sign `claims` with a key this crate never sees; only the payload matters.
pub fn mint_token(claims: &Value) -> String {
    jsonwebtoken::encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(b"gateway-secret"),
    )
    .expect("token should encode")
}

pub fn token_for(user_id: i64, bitmask: &str) -> String {
    mint_token(&json!({
        "user_id": user_id,
        "iat": 1_700_000_000,
        "exp": 1_700_003_600,
        "permission_bitmask": bitmask,
    }))
}

pub fn fixture_token() -> String {
    token_for(1, FIXTURE_BITMASK)
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub fn get_with_bearer(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header("Authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

/// Serve permission catalogs over HTTP on an ephemeral port and return the
/// base URL. `/permissions` answers with the fixture catalog, `/broken`
/// with a 500, and `/object` with JSON that is not an array.
///
/// The blocking HTTP source waits on its own thread, so callers need a
/// multi-threaded runtime for the server task to make progress.
pub async fn spawn_catalog_server() -> String {
    let contents = std::fs::read_to_string(fixture_path()).unwrap();
    let definitions: Vec<PermissionDefinition> = serde_json::from_str(&contents).unwrap();

    let app = Router::new()
        .route("/permissions", routing::get(move || async move { Json(definitions) }))
        .route("/broken", routing::get(|| async { StatusCode::INTERNAL_SERVER_ERROR }))
        .route(
            "/object",
            routing::get(|| async { Json(json!({"bitmask_idx": 0, "codename": "view_order"})) }),
        );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{addr}")
}
