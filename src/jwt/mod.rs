//! Bearer token extraction and claim decoding.
//!
//! Tokens are decoded without verifying their signature. Services running
//! this middleware sit behind a gateway that has already verified the token.

use std::sync::LazyLock;

use jsonwebtoken::{DecodingKey, Validation};
use regex::Regex;

use crate::error::{AuthError, Result};
use crate::models::Claims;

static BEARER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*bearer\s+(.+)").expect("bearer pattern is valid"));

/// Return the token from an `Authorization: Bearer <token>` value, or an
/// empty string when the value is not a bearer credential.
pub fn extract_bearer(header_value: &str) -> &str {
    BEARER_RE
        .captures(header_value)
        .and_then(|caps| caps.get(1))
        .map_or("", |m| m.as_str())
}

/// Decode a JWT payload into its claims without checking the signature,
/// expiry or audience.
pub fn decode_claims(token: &str) -> Result<Claims> {
    let mut validation = Validation::default();
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    jsonwebtoken::decode::<Claims>(token, &DecodingKey::from_secret(&[]), &validation)
        .map(|data| data.claims)
        .map_err(|_| AuthError::bad_token(format!("Bad token `{token}`")))
}
