//! Category listings with a short-lived cache.
//!
//! Listings are cached per style using `moka`. Stock shown on category
//! pages may therefore lag by up to the TTL; cart and checkout always ask
//! the repository directly.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use tracing::{debug, instrument};

use tity_core::{CartItem, Product, Style};

use crate::db::{ProductRepository, RepositoryError};

/// Cached view over [`ProductRepository::list_products`].
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct Catalog {
    repo: Arc<dyn ProductRepository>,
    cache: Cache<Style, Arc<Vec<Product>>>,
}

impl Catalog {
    /// Create a catalog whose listings live for `ttl`.
    #[must_use]
    pub fn new(repo: Arc<dyn ProductRepository>, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(Style::ALL.len() as u64)
            .time_to_live(ttl)
            .build();

        Self { repo, cache }
    }

    /// Products of one style.
    ///
    /// Failed lookups are not cached.
    ///
    /// # Errors
    ///
    /// Returns the repository error if the listing cannot be loaded.
    #[instrument(skip(self))]
    pub async fn products(&self, style: Style) -> Result<Arc<Vec<Product>>, RepositoryError> {
        if let Some(products) = self.cache.get(&style).await {
            debug!("Cache hit for category");
            return Ok(products);
        }

        let products = Arc::new(self.repo.list_products(style).await?);
        self.cache.insert(style, Arc::clone(&products)).await;
        Ok(products)
    }

    /// Find one product of a style by name.
    ///
    /// # Errors
    ///
    /// Returns the repository error if the listing cannot be loaded.
    pub async fn find(&self, style: Style, name: &str) -> Result<Option<Product>, RepositoryError> {
        Ok(self
            .products(style)
            .await?
            .iter()
            .find(|p| p.name == name)
            .cloned())
    }

    /// Drop the cached listing of one style.
    pub async fn invalidate(&self, style: Style) {
        self.cache.invalidate(&style).await;
    }

    /// Drop the listings whose stock a purchase changed.
    pub async fn invalidate_purchased(&self, items: &[CartItem]) {
        let mut styles: Vec<Style> = items.iter().filter_map(|item| item.style).collect();
        styles.sort_unstable();
        styles.dedup();

        for style in styles {
            self.invalidate(style).await;
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::memory::MemoryProductRepository;

    #[tokio::test]
    async fn test_listing_is_cached() {
        let repo = Arc::new(MemoryProductRepository::with_demo_catalog());
        let catalog = Catalog::new(repo.clone(), Duration::from_secs(60));

        let first = catalog.products(Style::Hippie).await.unwrap();
        assert_eq!(first[0].stock, 10);

        repo.set_stock(Style::Hippie, "Blusa hippie", 1).await;
        let cached = catalog.products(Style::Hippie).await.unwrap();
        assert_eq!(cached[0].stock, 10);

        catalog.invalidate(Style::Hippie).await;
        let fresh = catalog.products(Style::Hippie).await.unwrap();
        assert_eq!(fresh[0].stock, 1);
    }

    #[tokio::test]
    async fn test_purchase_refreshes_only_bought_styles() {
        let repo = Arc::new(MemoryProductRepository::with_demo_catalog());
        let catalog = Catalog::new(repo.clone(), Duration::from_secs(60));
        catalog.products(Style::Hippie).await.unwrap();
        catalog.products(Style::Gotico).await.unwrap();

        repo.set_stock(Style::Hippie, "Blusa hippie", 8).await;
        repo.set_stock(Style::Gotico, "Cadenas", 3).await;

        let bought = CartItem {
            name: "Blusa hippie".to_owned(),
            unit_price: tity_core::Price::from_cents(25_500),
            quantity: 2,
            style: Some(Style::Hippie),
            image: None,
        };
        catalog.invalidate_purchased(&[bought.clone(), bought]).await;

        assert_eq!(catalog.products(Style::Hippie).await.unwrap()[0].stock, 8);
        assert_eq!(catalog.products(Style::Gotico).await.unwrap()[0].stock, 15);
    }

    #[tokio::test]
    async fn test_errors_are_not_cached() {
        let repo = Arc::new(MemoryProductRepository::with_demo_catalog());
        let catalog = Catalog::new(repo.clone(), Duration::from_secs(60));

        repo.set_unavailable(true);
        assert!(catalog.products(Style::Gotico).await.is_err());

        repo.set_unavailable(false);
        assert_eq!(catalog.products(Style::Gotico).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_find_by_name() {
        let repo = Arc::new(MemoryProductRepository::with_demo_catalog());
        let catalog = Catalog::new(repo, Duration::from_secs(60));

        let product = catalog.find(Style::Colorido, "Chamarra").await.unwrap().unwrap();
        assert_eq!(product.price.to_string(), "$370.00");
        assert!(catalog.find(Style::Colorido, "Cadenas").await.unwrap().is_none());
    }
}
