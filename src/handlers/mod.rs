//! Demo routes guarded by the axum bridge.

use axum::{Json, Router, middleware, routing::get};
use serde::Serialize;
use serde_json::Value;

use crate::bridge::axum::{AxumBridge, require_permissions};
use crate::error::Result;
use crate::models::{AggregationPolicy, Claims, Consumer, JwtUser};

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Debug, Serialize)]
pub struct OrdersResponse {
    pub viewer: Option<Value>,
    pub orders: Vec<&'static str>,
}

pub async fn list_orders(consumer: Consumer) -> Json<OrdersResponse> {
    Json(OrdersResponse {
        viewer: consumer.claim("user_id").cloned(),
        orders: vec!["order-1001", "order-1002"],
    })
}

pub async fn list_tickets() -> Json<Vec<&'static str>> {
    Json(vec!["ticket-1", "ticket-2"])
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub user: JwtUser,
    pub scheme: String,
    pub claims: Claims,
}

pub async fn profile(consumer: Consumer) -> Result<Json<ProfileResponse>> {
    Ok(Json(ProfileResponse {
        user: consumer.user()?,
        scheme: consumer.auth_scheme().to_string(),
        claims: consumer.claims().clone(),
    }))
}

pub fn router(bridge: &AxumBridge) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(
            Router::new()
                .route("/orders", get(list_orders))
                .layer(middleware::from_fn_with_state(
                    bridge.require(["view_order"], AggregationPolicy::All),
                    require_permissions,
                )),
        )
        .merge(
            Router::new()
                .route("/tickets", get(list_tickets))
                .layer(middleware::from_fn_with_state(
                    bridge.require(["view_ticket", "delete_tickettype"], AggregationPolicy::Any),
                    require_permissions,
                )),
        )
        .merge(
            Router::new()
                // Any authenticated consumer
                .route("/profile", get(profile))
                .layer(middleware::from_fn_with_state(
                    bridge.require(Vec::<String>::new(), AggregationPolicy::All),
                    require_permissions,
                )),
        )
}
