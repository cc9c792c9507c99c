use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{AuthError, Result};

/// Decoded JWT payload.
pub type Claims = Map<String, Value>;

/// The claim carrying the base64-encoded permission bitmask.
pub const PERMISSION_BITMASK_CLAIM: &str = "permission_bitmask";

/// Typed view over the identity claims of a default token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtUser {
    pub user_id: i64,
    /// Issued-at (Unix timestamp)
    pub iat: i64,
    /// Expiration (Unix timestamp)
    pub exp: i64,
}

/// An authenticated caller, resolved once per request.
///
/// Handlers behind [`crate::require_permissions`] receive it by declaring a
/// `Consumer` argument.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Consumer {
    permission_bitmask: String,
    claims: Claims,
    auth_scheme: String,
    credential: String,
}

impl Consumer {
    /// Build a consumer from decoded claims. The only claim required here is
    /// `permission_bitmask`; everything else is carried through untouched.
    pub fn from_claims(
        claims: Claims,
        auth_scheme: impl Into<String>,
        credential: impl Into<String>,
    ) -> Result<Self> {
        let permission_bitmask = match claims.get(PERMISSION_BITMASK_CLAIM) {
            Some(Value::String(bitmask)) => bitmask.clone(),
            _ => {
                return Err(AuthError::bad_token(format!(
                    "Token has no string `{PERMISSION_BITMASK_CLAIM}` claim"
                )));
            }
        };

        Ok(Self {
            permission_bitmask,
            claims,
            auth_scheme: auth_scheme.into(),
            credential: credential.into(),
        })
    }

    pub fn permission_bitmask(&self) -> &str {
        &self.permission_bitmask
    }

    pub fn claims(&self) -> &Claims {
        &self.claims
    }

    pub fn claim(&self, key: &str) -> Option<&Value> {
        self.claims.get(key)
    }

    /// Authentication scheme, `"JWT"` for bearer tokens.
    pub fn auth_scheme(&self) -> &str {
        &self.auth_scheme
    }

    /// The raw token the consumer presented.
    pub fn credential(&self) -> &str {
        &self.credential
    }

    pub fn user(&self) -> Result<JwtUser> {
        serde_json::from_value(Value::Object(self.claims.clone()))
            .map_err(|e| AuthError::bad_token(format!("Token has no valid user claims: {e}")))
    }
}
