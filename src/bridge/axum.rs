//! axum bridge.
//!
//! Routes are guarded with a [`PermissionGuard`] state and the
//! [`require_permissions`] middleware:
//!
//! ```no_run
//! use axum::{Router, middleware::from_fn_with_state, routing::get};
//! use web_auth::{AggregationPolicy, AxumBridge, Consumer, require_permissions};
//!
//! async fn list_orders(consumer: Consumer) -> String {
//!     consumer.auth_scheme().to_string()
//! }
//!
//! # fn router(bridge: AxumBridge) -> Router {
//! Router::new().route(
//!     "/orders",
//!     get(list_orders).route_layer(from_fn_with_state(
//!         bridge.require(["view_order"], AggregationPolicy::All),
//!         require_permissions,
//!     )),
//! )
//! # }
//! ```

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Query, Request, State},
    http::{HeaderMap, Uri, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::CookieJar;

use super::{RequestAccessor, WebBridge, authenticate_request};
use crate::context::{Context, default_context};
use crate::error::{AuthError, Result};
use crate::models::{AggregationPolicy, Consumer};

/// Owned copy of the parts of a request that carry credentials.
#[derive(Debug, Clone)]
pub struct RequestHead {
    headers: HeaderMap,
    uri: Uri,
}

impl RequestHead {
    pub fn new(headers: HeaderMap, uri: Uri) -> Self {
        Self { headers, uri }
    }
}

impl From<&Parts> for RequestHead {
    fn from(parts: &Parts) -> Self {
        Self::new(parts.headers.clone(), parts.uri.clone())
    }
}

impl RequestAccessor for RequestHead {
    fn header(&self, name: &str) -> Option<String> {
        self.headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(String::from)
    }

    fn query_param(&self, name: &str) -> Option<String> {
        Query::<HashMap<String, String>>::try_from_uri(&self.uri)
            .ok()
            .and_then(|Query(mut params)| params.remove(name))
    }

    fn cookie(&self, name: &str) -> Option<String> {
        CookieJar::from_headers(&self.headers)
            .get(name)
            .map(|c| c.value().to_string())
    }
}

#[derive(Debug, Clone)]
pub struct AxumBridge {
    context: Arc<Context>,
}

impl AxumBridge {
    pub fn new(context: Arc<Context>) -> Self {
        Self { context }
    }

    /// Bridge over the process-wide default context.
    pub fn from_default() -> Result<Self> {
        Ok(Self::new(default_context()?))
    }

    /// Guard state requiring `required` under `aggregation`.
    pub fn require<I, S>(&self, required: I, aggregation: AggregationPolicy) -> PermissionGuard
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.permissions(required, aggregation)
    }
}

impl WebBridge for AxumBridge {
    type Request = RequestHead;
    type Wrapper = PermissionGuard;

    fn context(&self) -> &Context {
        &self.context
    }

    fn authenticate(&self, request: &RequestHead) -> Result<Consumer> {
        authenticate_request(request)
    }

    fn create_view_func_wrapper(
        &self,
        permissions: BTreeSet<String>,
        aggregation: AggregationPolicy,
    ) -> PermissionGuard {
        tracing::debug!(
            ?permissions,
            aggregation = aggregation.as_ref(),
            "Wrapped view, which requires permissions"
        );
        PermissionGuard {
            bridge: self.clone(),
            permissions: Arc::new(permissions),
            aggregation,
        }
    }
}

/// Middleware state: the permissions one route requires.
#[derive(Debug, Clone)]
pub struct PermissionGuard {
    bridge: AxumBridge,
    permissions: Arc<BTreeSet<String>>,
    aggregation: AggregationPolicy,
}

impl PermissionGuard {
    pub fn permissions(&self) -> &BTreeSet<String> {
        &self.permissions
    }

    pub fn aggregation(&self) -> AggregationPolicy {
        self.aggregation
    }
}

/// Run access control and hand the resolved [`Consumer`] to the handler
/// through request extensions. Failures short-circuit with the error body.
pub async fn require_permissions(
    State(guard): State<PermissionGuard>,
    request: Request,
    next: Next,
) -> Response {
    let (mut parts, body) = request.into_parts();
    let head = RequestHead::from(&parts);

    // The catalog may block on a refresh; keep it off the async workers.
    let outcome = tokio::task::spawn_blocking(move || {
        guard
            .bridge
            .access_control(&head, &guard.permissions, guard.aggregation)
    })
    .await;

    match outcome {
        Ok(Ok(consumer)) => {
            parts.extensions.insert(consumer);
            next.run(Request::from_parts(parts, body)).await
        }
        Ok(Err(e)) => {
            tracing::debug!("Access denied for {} {}: {}", parts.method, parts.uri.path(), e);
            e.into_response()
        }
        Err(e) => {
            tracing::error!("Access control task failed: {}", e);
            AuthError::storage("Access control task failed").into_response()
        }
    }
}

impl<S: Send + Sync> FromRequestParts<S> for Consumer {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Consumer>()
            .cloned()
            .ok_or_else(AuthError::unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use axum::http::header::{AUTHORIZATION, COOKIE};

    use super::*;

    fn head(uri: &str, headers: &[(axum::http::HeaderName, &str)]) -> RequestHead {
        let mut map = HeaderMap::new();
        for (name, value) in headers {
            map.insert(name.clone(), value.parse().unwrap());
        }
        RequestHead::new(map, uri.parse().unwrap())
    }

    #[test]
    fn reads_credentials_from_every_location() {
        let request = head(
            "/orders?page=2&access_token=from-query",
            &[
                (AUTHORIZATION, "Bearer from-header"),
                (COOKIE, "theme=dark; access_token=from-cookie"),
            ],
        );

        assert_eq!(request.header("authorization").as_deref(), Some("Bearer from-header"));
        assert_eq!(request.query_param("access_token").as_deref(), Some("from-query"));
        assert_eq!(request.cookie("access_token").as_deref(), Some("from-cookie"));
        assert_eq!(request.query_param("missing"), None);
    }

    #[test]
    fn bare_request_has_no_credentials() {
        let request = head("/orders", &[]);
        assert_eq!(request.header("authorization"), None);
        assert_eq!(request.query_param("access_token"), None);
        assert_eq!(request.cookie("access_token"), None);

        let err = authenticate_request(&request).unwrap_err();
        assert_eq!(err.code, crate::ErrorCode::Unauthorized);
    }
}
