//! In-memory repository.
//!
//! Used when neither Firestore nor `PostgreSQL` is configured (local
//! development) and by the test suites. It can be switched into an
//! "unavailable" mode to exercise the degraded code paths.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::instrument;

use tity_core::{Price, Product, Style, UserId, Username};

use super::{ProductRepository, RepositoryError, StockChange};
use crate::models::user::{StoredUser, User};

/// The starter catalog: one product per style.
///
/// Also inserted into `PostgreSQL` by `tity-cli seed`.
#[must_use]
pub fn demo_catalog() -> Vec<Product> {
    let product = |name: &str, cents: i64, stock: u32, image: &str, style: Style| Product {
        name: name.to_owned(),
        price: Price::from_cents(cents),
        stock,
        image: Some(image.to_owned()),
        style,
        description: None,
    };

    vec![
        product("Blusa hippie", 25_500, 10, "/img/blusa.jpg", Style::Hippie),
        product("Cadenas", 12_000, 15, "/img/cadenas.jpg", Style::Gotico),
        product("Chamarra", 37_000, 5, "/img/chamarra.jpg", Style::Colorido),
        product("Collares", 5_000, 20, "/img/collares.jpg", Style::Minimalista),
    ]
}

/// Repository backed by process memory.
#[derive(Debug, Default)]
pub struct MemoryProductRepository {
    products: RwLock<Vec<Product>>,
    users: RwLock<Vec<StoredUser>>,
    next_user_id: AtomicU32,
    unavailable: AtomicBool,
}

impl MemoryProductRepository {
    /// Create a repository holding the given products.
    #[must_use]
    pub fn new(products: Vec<Product>) -> Self {
        Self {
            products: RwLock::new(products),
            ..Self::default()
        }
    }

    /// Create a repository seeded with [`demo_catalog`].
    #[must_use]
    pub fn with_demo_catalog() -> Self {
        Self::new(demo_catalog())
    }

    /// Make every subsequent call fail with `RepositoryError::Unavailable`
    /// (or succeed again when `false`).
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Overwrite the stock of a product, inserting nothing if it is absent.
    pub async fn set_stock(&self, style: Style, name: &str, stock: u32) {
        let mut products = self.products.write().await;
        if let Some(product) = products
            .iter_mut()
            .find(|p| p.style == style && p.name == name)
        {
            product.stock = stock;
        }
    }

    /// Read the stock of a product, ignoring the unavailable switch.
    pub async fn stock_of(&self, style: Style, name: &str) -> Option<u32> {
        self.products
            .read()
            .await
            .iter()
            .find(|p| p.style == style && p.name == name)
            .map(|p| p.stock)
    }

    fn ensure_available(&self) -> Result<(), RepositoryError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(RepositoryError::Unavailable(
                "in-memory backend switched off".to_owned(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl ProductRepository for MemoryProductRepository {
    fn backend(&self) -> &'static str {
        "memory"
    }

    #[instrument(skip(self))]
    async fn list_products(&self, style: Style) -> Result<Vec<Product>, RepositoryError> {
        self.ensure_available()?;
        Ok(self
            .products
            .read()
            .await
            .iter()
            .filter(|p| p.style == style)
            .cloned()
            .collect())
    }

    #[instrument(skip(self))]
    async fn get_stock(&self, style: Style, name: &str) -> Result<u32, RepositoryError> {
        self.ensure_available()?;
        Ok(self.stock_of(style, name).await.unwrap_or(0))
    }

    #[instrument(skip(self))]
    async fn decrement_stock(
        &self,
        style: Style,
        name: &str,
        quantity: u32,
    ) -> Result<StockChange, RepositoryError> {
        self.ensure_available()?;
        let mut products = self.products.write().await;
        let product = products
            .iter_mut()
            .find(|p| p.style == style && p.name == name)
            .ok_or(RepositoryError::NotFound)?;

        let change = StockChange::apply(product.stock, quantity);
        product.stock = change.remaining;
        Ok(change)
    }

    async fn find_user(&self, username: &Username) -> Result<Option<StoredUser>, RepositoryError> {
        self.ensure_available()?;
        Ok(self
            .users
            .read()
            .await
            .iter()
            .find(|u| &u.user.username == username)
            .cloned())
    }

    async fn create_user(
        &self,
        username: &Username,
        password_hash: &str,
    ) -> Result<User, RepositoryError> {
        self.ensure_available()?;
        let mut users = self.users.write().await;
        if users.iter().any(|u| &u.user.username == username) {
            return Err(RepositoryError::Conflict("username already exists".to_owned()));
        }

        let id = self.next_user_id.fetch_add(1, Ordering::SeqCst) + 1;
        let user = User {
            id: UserId::new(id.to_string()),
            username: username.clone(),
            created_at: Utc::now(),
        };
        users.push(StoredUser {
            user: user.clone(),
            password_hash: password_hash.to_owned(),
        });
        Ok(user)
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        self.ensure_available()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_list_products_filters_by_style() {
        let repo = MemoryProductRepository::with_demo_catalog();
        let gothic = repo.list_products(Style::Gotico).await.unwrap();
        assert_eq!(gothic.len(), 1);
        assert_eq!(gothic[0].name, "Cadenas");
    }

    #[tokio::test]
    async fn test_missing_product_has_zero_stock() {
        let repo = MemoryProductRepository::with_demo_catalog();
        assert_eq!(repo.get_stock(Style::Hippie, "Cadenas").await.unwrap(), 0);
        assert_eq!(repo.get_stock(Style::Hippie, "Blusa hippie").await.unwrap(), 10);
    }

    #[tokio::test]
    async fn test_decrement_floors_at_zero() {
        let repo = MemoryProductRepository::with_demo_catalog();
        let change = repo
            .decrement_stock(Style::Colorido, "Chamarra", 8)
            .await
            .unwrap();
        assert_eq!(change.previous, 5);
        assert_eq!(change.remaining, 0);
        assert_eq!(repo.stock_of(Style::Colorido, "Chamarra").await, Some(0));
    }

    #[tokio::test]
    async fn test_decrement_unknown_product() {
        let repo = MemoryProductRepository::with_demo_catalog();
        let result = repo.decrement_stock(Style::Gotico, "Nada", 1).await;
        assert!(matches!(result, Err(RepositoryError::NotFound)));
    }

    #[tokio::test]
    async fn test_unavailable_switch() {
        let repo = MemoryProductRepository::with_demo_catalog();
        repo.set_unavailable(true);
        assert!(repo.get_stock(Style::Hippie, "Blusa hippie").await.unwrap_err().is_unavailable());
        assert!(repo.ping().await.is_err());

        repo.set_unavailable(false);
        assert!(repo.ping().await.is_ok());
    }

    #[tokio::test]
    async fn test_create_user_rejects_duplicates() {
        let repo = MemoryProductRepository::default();
        let name = Username::parse("ana").unwrap();

        let user = repo.create_user(&name, "hash").await.unwrap();
        assert_eq!(user.id.as_str(), "1");

        let again = repo.create_user(&name, "hash").await;
        assert!(matches!(again, Err(RepositoryError::Conflict(_))));

        let stored = repo.find_user(&name).await.unwrap().unwrap();
        assert_eq!(stored.password_hash, "hash");
    }
}
