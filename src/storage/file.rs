use std::path::{Path, PathBuf};

use crate::error::{AuthError, Result};
use crate::models::PermissionDefinition;

use super::PermissionSource;

/// Reads a JSON array of permission definitions from disk on every load.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PermissionSource for FileSource {
    fn load(&self) -> Result<Vec<PermissionDefinition>> {
        let contents = std::fs::read_to_string(&self.path).map_err(|e| {
            AuthError::storage(format!(
                "Failed to read permission file `{}`: {e}",
                self.path.display()
            ))
        })?;

        serde_json::from_str(&contents).map_err(|e| {
            AuthError::storage(format!(
                "Malformed permission file `{}`: {e}",
                self.path.display()
            ))
        })
    }
}
