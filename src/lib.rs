//! Bearer-token access control for web services.
//!
//! A request is authenticated by decoding its JWT (signature verification is
//! left to the gateway in front of the service), then authorized by checking
//! the token's base64-encoded permission bitmask against a time-cached
//! catalog of permission definitions.

pub mod authorization;
pub mod bridge;
pub mod config;
pub mod context;
pub mod error;
pub mod handlers;
pub mod jwt;
pub mod models;
pub mod storage;
pub mod telemetry;

pub use authorization::{Authorization, BitmaskAuthorization};
pub use bridge::axum::{AxumBridge, PermissionGuard, require_permissions};
pub use bridge::{RequestAccessor, WebBridge};
pub use config::{Config, StorageKind, StorageParams, configure};
pub use context::{Context, default_context};
pub use error::{AuthError, ErrorCode, ErrorMessage, Result};
pub use models::{AggregationPolicy, Claims, Consumer, JwtUser, PermissionDefinition};
pub use storage::{FileSource, HttpSource, MemorySource, PermissionCatalog, PermissionSource};
