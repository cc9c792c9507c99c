//! Framework bridges.
//!
//! A bridge knows how to read credentials out of its framework's request
//! type and how to wrap that framework's handlers. The access-control
//! pipeline itself (authenticate, then authorize) is shared and lives on
//! [`WebBridge::access_control`].

pub mod axum;

use std::collections::BTreeSet;

use crate::context::Context;
use crate::error::{AuthError, Result};
use crate::jwt;
use crate::models::{AggregationPolicy, Consumer};

/// Query parameter and cookie name that may carry the token.
pub const ACCESS_TOKEN: &str = "access_token";

/// Scheme recorded on consumers authenticated from a JWT.
pub const JWT_SCHEME: &str = "JWT";

/// Read-only view over whatever a framework calls a request.
pub trait RequestAccessor {
    fn header(&self, name: &str) -> Option<String>;
    fn query_param(&self, name: &str) -> Option<String>;
    fn cookie(&self, name: &str) -> Option<String>;
}

/// Locate the caller's token and decode it into a [`Consumer`].
///
/// The token is taken from the `Authorization` bearer header, then the
/// `access_token` query parameter, then the `access_token` cookie; the first
/// non-empty one wins.
pub fn authenticate_request<R: RequestAccessor + ?Sized>(request: &R) -> Result<Consumer> {
    let token = request
        .header("authorization")
        .map(|value| jwt::extract_bearer(&value).to_string())
        .filter(|token| !token.is_empty())
        .or_else(|| request.query_param(ACCESS_TOKEN).filter(|t| !t.is_empty()))
        .or_else(|| request.cookie(ACCESS_TOKEN).filter(|t| !t.is_empty()))
        .ok_or_else(AuthError::unauthorized)?;

    let claims = jwt::decode_claims(&token)?;
    Consumer::from_claims(claims, JWT_SCHEME, token)
}

pub trait WebBridge {
    /// What the framework hands to `authenticate`.
    type Request: ?Sized;
    /// What `create_view_func_wrapper` produces for the framework's router.
    type Wrapper;

    fn context(&self) -> &Context;

    fn authenticate(&self, request: &Self::Request) -> Result<Consumer>;

    /// Build the framework object that guards a handler with `permissions`.
    fn create_view_func_wrapper(
        &self,
        permissions: BTreeSet<String>,
        aggregation: AggregationPolicy,
    ) -> Self::Wrapper;

    /// Validate `required` against the catalog, then build the wrapper.
    fn permissions<I, S>(&self, required: I, aggregation: AggregationPolicy) -> Self::Wrapper
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let permissions = self.context().validate_required_permissions(required);
        self.create_view_func_wrapper(permissions, aggregation)
    }

    /// Authenticate the request and authorize the resulting consumer.
    fn access_control(
        &self,
        request: &Self::Request,
        permissions: &BTreeSet<String>,
        aggregation: AggregationPolicy,
    ) -> Result<Consumer> {
        let context = self.context();
        let span = tracing::debug_span!("access_control", logger = %context.logger_name());
        let _entered = span.enter();

        tracing::debug!(?permissions, aggregation = aggregation.as_ref(), "Bridging request");
        let consumer = self.authenticate(request)?;
        tracing::debug!(
            scheme = consumer.auth_scheme(),
            "Authenticated consumer {:?}",
            consumer.claims()
        );

        context.authorization().authorize(
            &consumer,
            permissions,
            aggregation,
            context.catalog(),
        )?;
        tracing::debug!("The consumer required permissions are granted");

        Ok(consumer)
    }
}
