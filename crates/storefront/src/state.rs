//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::StorefrontConfig;
use crate::db::ProductRepository;
use crate::services::catalog::Catalog;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// the configuration, the product repository and the catalog cache.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    repo: Arc<dyn ProductRepository>,
    catalog: Catalog,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(config: StorefrontConfig, repo: Arc<dyn ProductRepository>) -> Self {
        let catalog = Catalog::new(Arc::clone(&repo), config.catalog_cache_ttl);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                repo,
                catalog,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get the product and user repository.
    #[must_use]
    pub fn repo(&self) -> &dyn ProductRepository {
        self.inner.repo.as_ref()
    }

    /// Get the cached catalog.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.inner.catalog
    }
}
