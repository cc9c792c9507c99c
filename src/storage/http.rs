use std::thread;
use std::time::Duration;

use reqwest::blocking::Client;

use crate::error::{AuthError, Result};
use crate::models::PermissionDefinition;

use super::PermissionSource;

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Fetches permission definitions from a list of equivalent endpoints.
///
/// URLs are tried in order and the first one answering with a valid JSON
/// array wins. A load blocks the calling thread. Called from inside a tokio
/// runtime, the fetch moves to a scoped worker thread so the blocking client
/// is never built, used or dropped on an async thread.
#[derive(Debug, Clone)]
pub struct HttpSource {
    urls: Vec<String>,
    timeout: Duration,
}

impl HttpSource {
    pub fn new(urls: Vec<String>, timeout: Duration) -> Result<Self> {
        if urls.is_empty() {
            return Err(AuthError::storage("No permission URLs configured"));
        }

        Ok(Self { urls, timeout })
    }

    pub fn urls(&self) -> &[String] {
        &self.urls
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn fetch_first(&self) -> Result<Vec<PermissionDefinition>> {
        let client = Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| AuthError::storage(format!("Failed to build HTTP client: {e}")))?;

        let mut last_error = None;
        for url in &self.urls {
            let fetched: reqwest::Result<Vec<PermissionDefinition>> = client
                .get(url)
                .send()
                .and_then(|response| response.error_for_status())
                .and_then(|response| response.json());

            match fetched {
                Ok(definitions) => return Ok(definitions),
                Err(e) => {
                    tracing::warn!("Permission endpoint {} unavailable: {}", url, e);
                    last_error = Some(e);
                }
            }
        }

        Err(AuthError::storage(match last_error {
            Some(e) => format!("All permission endpoints failed, last error: {e}"),
            None => "No permission URLs configured".to_string(),
        }))
    }
}

impl PermissionSource for HttpSource {
    fn load(&self) -> Result<Vec<PermissionDefinition>> {
        if tokio::runtime::Handle::try_current().is_err() {
            return self.fetch_first();
        }

        thread::scope(|scope| scope.spawn(|| self.fetch_first()).join())
            .map_err(|_| AuthError::storage("Permission fetch thread panicked"))?
    }
}
