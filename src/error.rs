use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;

/// Machine-readable failure codes returned at the framework boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// No bearer header, `access_token` query param or cookie
    Unauthorized,
    /// Token is not a decodable JWT
    BadToken,
    /// `permission_bitmask` is not valid base64
    BadEncoding,
    /// Codename missing from the catalog or its index is out of range
    BadBitmask,
    /// Aggregation policy not satisfied
    PermissionDenied,
    /// Permission source unreadable or malformed
    StorageError,
}

impl ErrorCode {
    pub fn as_u16(&self) -> u16 {
        match self {
            Self::Unauthorized => 4010,
            Self::BadToken => 4011,
            Self::BadEncoding => 4030,
            Self::BadBitmask => 4031,
            Self::PermissionDenied => 4032,
            Self::StorageError => 5000,
        }
    }

    /// 401 when the caller could not be identified, 403 when it was but the
    /// grant is missing or unreadable.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized | Self::BadToken => StatusCode::UNAUTHORIZED,
            Self::BadEncoding | Self::BadBitmask | Self::PermissionDenied => StatusCode::FORBIDDEN,
            Self::StorageError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_u16())
    }
}

impl Serialize for ErrorCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} (code: {code})")]
pub struct AuthError {
    pub code: ErrorCode,
    pub message: String,
}

impl AuthError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn unauthorized() -> Self {
        Self::new(ErrorCode::Unauthorized, "Unauthorized")
    }

    pub fn bad_token(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::BadToken, message)
    }

    pub fn bad_encoding(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::BadEncoding, message)
    }

    pub fn bad_bitmask(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::BadBitmask, message)
    }

    pub fn permission_denied() -> Self {
        Self::new(ErrorCode::PermissionDenied, "Permission denied")
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::StorageError, message)
    }

    pub fn status(&self) -> StatusCode {
        self.code.status()
    }
}

pub type Result<T> = std::result::Result<T, AuthError>;

/// Error body rendered by the framework adapters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorMessage {
    pub code: String,
    pub message: String,
}

impl From<&AuthError> for ErrorMessage {
    fn from(err: &AuthError) -> Self {
        Self {
            code: err.code.to_string(),
            message: err.message.clone(),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        (self.status(), Json(ErrorMessage::from(&self))).into_response()
    }
}
