use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use strum::{AsRefStr, EnumString};

use crate::context::{Context, DEFAULT_CONTEXT};
use crate::error::Result;
use crate::storage::{
    DEFAULT_REQUEST_TIMEOUT, FileSource, HttpSource, PermissionCatalog, PermissionSource,
};

pub const DEFAULT_LOGGER_NAME: &str = "web_auth";
pub const DEFAULT_PERMISSION_FILE: &str = "usr/etc/permissions.json";
pub const DEFAULT_TTL_SECS: u64 = 60;

/// Which [`PermissionSource`] backs the catalog.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, AsRefStr, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum StorageKind {
    #[default]
    File,
    Http,
}

#[derive(Debug, Clone)]
pub struct StorageParams {
    pub permission_file_path: PathBuf,
    /// Equivalent endpoints, tried in order
    pub permission_urls: Vec<String>,
    /// Catalog cache lifetime in seconds (0 = reload on every read)
    pub ttl: u64,
    pub request_timeout: Duration,
}

impl Default for StorageParams {
    fn default() -> Self {
        Self {
            permission_file_path: PathBuf::from(DEFAULT_PERMISSION_FILE),
            permission_urls: Vec::new(),
            ttl: DEFAULT_TTL_SECS,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub logger_name: String,
    pub storage: StorageKind,
    pub storage_params: StorageParams,
    /// Demo server bind host
    pub host: String,
    /// Demo server bind port
    pub port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            logger_name: DEFAULT_LOGGER_NAME.to_string(),
            storage: StorageKind::default(),
            storage_params: StorageParams::default(),
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let defaults = Self::default();

        let storage = env::var("WEB_AUTH_STORAGE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.storage);

        // Negative TTLs are read as their magnitude.
        let ttl = env::var("WEB_AUTH_TTL")
            .ok()
            .and_then(|v| v.trim().parse::<i64>().ok())
            .map(i64::unsigned_abs)
            .unwrap_or(DEFAULT_TTL_SECS);

        let permission_urls = env::var("WEB_AUTH_PERMISSION_URLS")
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        let request_timeout = env::var("WEB_AUTH_REQUEST_TIMEOUT")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT);

        Self {
            logger_name: env::var("WEB_AUTH_LOGGER").unwrap_or(defaults.logger_name),
            storage,
            storage_params: StorageParams {
                permission_file_path: env::var("WEB_AUTH_PERMISSION_FILE")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.storage_params.permission_file_path),
                permission_urls,
                ttl,
                request_timeout,
            },
            host: env::var("HOST").unwrap_or(defaults.host),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
        }
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn build_source(&self) -> Result<Box<dyn PermissionSource>> {
        let params = &self.storage_params;
        Ok(match self.storage {
            StorageKind::File => Box::new(FileSource::new(&params.permission_file_path)),
            StorageKind::Http => Box::new(HttpSource::new(
                params.permission_urls.clone(),
                params.request_timeout,
            )?),
        })
    }

    /// Build a context with an eagerly loaded catalog.
    ///
    /// With `StorageKind::Http` this blocks the calling thread on the first
    /// fetch (at most the request timeout per URL).
    pub fn build_context(&self) -> Result<Context> {
        if self.storage == StorageKind::File
            && self.storage_params.permission_file_path == PathBuf::from(DEFAULT_PERMISSION_FILE)
        {
            tracing::debug!("Assumed to use the default permission file `{DEFAULT_PERMISSION_FILE}`");
        }

        let catalog = PermissionCatalog::from_boxed(self.build_source()?, self.storage_params.ttl)?;
        Ok(Context::new(catalog, self.logger_name.clone()))
    }
}

/// Install the process-wide default context. Only the first successful call
/// builds anything; later calls return the context already installed.
pub fn configure(config: Config) -> Result<Arc<Context>> {
    if let Some(context) = DEFAULT_CONTEXT.get() {
        return Ok(context.clone());
    }

    let built = Arc::new(config.build_context()?);
    Ok(DEFAULT_CONTEXT.get_or_init(|| built).clone())
}
