use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use crate::error::{AuthError, Result};
use crate::models::PermissionDefinition;

use super::PermissionSource;

/// In-memory source. Clones share state, so a test can keep a handle to
/// swap the definitions and count loads after handing a clone to a catalog.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    inner: Arc<MemoryInner>,
}

#[derive(Debug)]
struct MemoryInner {
    definitions: RwLock<std::result::Result<Vec<PermissionDefinition>, String>>,
    loads: AtomicUsize,
}

impl Default for MemoryInner {
    fn default() -> Self {
        Self {
            definitions: RwLock::new(Ok(Vec::new())),
            loads: AtomicUsize::new(0),
        }
    }
}

impl MemorySource {
    pub fn new(definitions: Vec<PermissionDefinition>) -> Self {
        let source = Self::default();
        source.replace(definitions);
        source
    }

    pub fn replace(&self, definitions: Vec<PermissionDefinition>) {
        *self
            .inner
            .definitions
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Ok(definitions);
    }

    /// Make subsequent loads fail until the next [`MemorySource::replace`].
    pub fn fail_with(&self, message: impl Into<String>) {
        *self
            .inner
            .definitions
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Err(message.into());
    }

    pub fn load_count(&self) -> usize {
        self.inner.loads.load(Ordering::SeqCst)
    }
}

impl PermissionSource for MemorySource {
    fn load(&self) -> Result<Vec<PermissionDefinition>> {
        self.inner.loads.fetch_add(1, Ordering::SeqCst);
        self.inner
            .definitions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .map_err(AuthError::storage)
    }
}
