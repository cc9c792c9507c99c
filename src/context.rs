use std::collections::BTreeSet;
use std::sync::{Arc, OnceLock};

use crate::authorization::{Authorization, BitmaskAuthorization};
use crate::config::Config;
use crate::error::Result;
use crate::storage::PermissionCatalog;

pub(crate) static DEFAULT_CONTEXT: OnceLock<Arc<Context>> = OnceLock::new();

/// Everything a bridge needs to make access-control decisions.
pub struct Context {
    catalog: PermissionCatalog,
    authorization: Box<dyn Authorization>,
    logger_name: String,
}

impl Context {
    pub fn new(catalog: PermissionCatalog, logger_name: impl Into<String>) -> Self {
        Self {
            catalog,
            authorization: Box::new(BitmaskAuthorization),
            logger_name: logger_name.into(),
        }
    }

    /// Replace the default bitmask authorization.
    pub fn with_authorization(mut self, authorization: impl Authorization + 'static) -> Self {
        self.authorization = Box::new(authorization);
        self
    }

    pub fn catalog(&self) -> &PermissionCatalog {
        &self.catalog
    }

    pub fn authorization(&self) -> &dyn Authorization {
        self.authorization.as_ref()
    }

    pub fn logger_name(&self) -> &str {
        &self.logger_name
    }

    /// Collect `required` into a set and log when any of them is unknown to
    /// the catalog. Unknown codenames are kept: they fail with `BadBitmask`
    /// when a request reaches them.
    pub fn validate_required_permissions<I, S>(&self, required: I) -> BTreeSet<String>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let permissions: BTreeSet<String> = required.into_iter().map(Into::into).collect();

        match self.catalog.codenames() {
            Ok(known) if !permissions.is_subset(&known) => {
                let unknown: Vec<&String> = permissions.difference(&known).collect();
                tracing::error!(
                    logger = %self.logger_name,
                    ?unknown,
                    "Invalid required permissions, it should be a subset of {:?}",
                    known
                );
            }
            Ok(_) => {}
            Err(e) => {
                tracing::error!(logger = %self.logger_name, "Unable to validate required permissions: {}", e);
            }
        }

        permissions
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("catalog", &self.catalog)
            .field("logger_name", &self.logger_name)
            .finish()
    }
}

/// The process-wide context installed by [`crate::configure`], or one built
/// from the environment on first use.
pub fn default_context() -> Result<Arc<Context>> {
    if let Some(context) = DEFAULT_CONTEXT.get() {
        return Ok(context.clone());
    }

    let built = Arc::new(Config::from_env().build_context()?);
    Ok(DEFAULT_CONTEXT.get_or_init(|| built).clone())
}
