//! Permission catalog and the sources it loads from.
//!
//! The catalog keeps an immutable snapshot of every [`PermissionDefinition`]
//! and reloads it lazily: the first read after the TTL has elapsed pulls a
//! fresh list from the source and publishes it as a new snapshot. Snapshots
//! already handed out are never mutated.

mod file;
mod http;
mod memory;

pub use file::*;
pub use http::*;
pub use memory::*;

use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Duration, Utc};

use crate::error::{AuthError, Result};
use crate::models::PermissionDefinition;

/// Backing store for permission definitions.
pub trait PermissionSource: Send + Sync + fmt::Debug {
    /// Load the complete definition list.
    fn load(&self) -> Result<Vec<PermissionDefinition>>;
}

struct Snapshot {
    definitions: Arc<[PermissionDefinition]>,
    expires_at: DateTime<Utc>,
}

pub struct PermissionCatalog {
    source: Box<dyn PermissionSource>,
    ttl: Duration,
    snapshot: RwLock<Snapshot>,
}

impl PermissionCatalog {
    /// Create a catalog and load it once. A TTL of zero reloads on every read.
    pub fn new(source: impl PermissionSource + 'static, ttl_secs: u64) -> Result<Self> {
        Self::from_boxed(Box::new(source), ttl_secs)
    }

    pub fn from_boxed(source: Box<dyn PermissionSource>, ttl_secs: u64) -> Result<Self> {
        let ttl = i64::try_from(ttl_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .unwrap_or(Duration::MAX);
        let definitions = load_checked(source.as_ref())?;
        let expires_at = expiry(Utc::now(), ttl);
        tracing::debug!(count = definitions.len(), %expires_at, "Loaded permission cache");

        Ok(Self {
            source,
            ttl,
            snapshot: RwLock::new(Snapshot {
                definitions,
                expires_at,
            }),
        })
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Current snapshot of the whole catalog, refreshed first if expired.
    pub fn snapshot(&self) -> Result<Arc<[PermissionDefinition]>> {
        self.snapshot_at(Utc::now())
    }

    /// Definitions whose codename is in `codenames`, or the whole catalog
    /// when `codenames` is `None` or empty.
    pub fn get_permissions(
        &self,
        codenames: Option<&BTreeSet<String>>,
    ) -> Result<Vec<PermissionDefinition>> {
        let snapshot = self.snapshot()?;
        Ok(filter(&snapshot, codenames))
    }

    /// Every codename in the current snapshot.
    pub fn codenames(&self) -> Result<BTreeSet<String>> {
        Ok(self
            .snapshot()?
            .iter()
            .map(|p| p.codename.clone())
            .collect())
    }

    fn snapshot_at(&self, now: DateTime<Utc>) -> Result<Arc<[PermissionDefinition]>> {
        {
            let current = self.snapshot.read().unwrap_or_else(PoisonError::into_inner);
            if now < current.expires_at {
                return Ok(current.definitions.clone());
            }
        }

        // Load outside the lock; two racing refreshes both publish a complete list.
        let definitions = load_checked(self.source.as_ref())?;
        let expires_at = expiry(now, self.ttl);
        {
            let mut current = self.snapshot.write().unwrap_or_else(PoisonError::into_inner);
            *current = Snapshot {
                definitions: definitions.clone(),
                expires_at,
            };
        }
        tracing::debug!(
            count = definitions.len(),
            "Refreshed permission cache, next time at {expires_at}"
        );

        Ok(definitions)
    }
}

impl fmt::Debug for PermissionCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PermissionCatalog")
            .field("source", &self.source)
            .field("ttl", &self.ttl)
            .finish()
    }
}

fn expiry(now: DateTime<Utc>, ttl: Duration) -> DateTime<Utc> {
    now.checked_add_signed(ttl).unwrap_or(DateTime::<Utc>::MAX_UTC)
}

fn filter(
    definitions: &[PermissionDefinition],
    codenames: Option<&BTreeSet<String>>,
) -> Vec<PermissionDefinition> {
    match codenames {
        Some(wanted) if !wanted.is_empty() => definitions
            .iter()
            .filter(|p| wanted.contains(&p.codename))
            .cloned()
            .collect(),
        _ => definitions.to_vec(),
    }
}

fn load_checked(source: &dyn PermissionSource) -> Result<Arc<[PermissionDefinition]>> {
    let definitions = source.load()?;
    let mut seen = HashSet::with_capacity(definitions.len());
    for definition in &definitions {
        if !seen.insert(definition.codename.as_str()) {
            return Err(AuthError::storage(format!(
                "Duplicate permission codename `{}` in {:?}",
                definition.codename, source
            )));
        }
    }
    Ok(definitions.into())
}
