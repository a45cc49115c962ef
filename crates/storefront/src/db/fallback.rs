//! Primary repository with an automatic fallback.
//!
//! Every call goes to the primary first. When the primary answers with
//! `RepositoryError::Unavailable`, the same call is repeated on the
//! fallback; any other outcome (including `NotFound` and `Conflict`) is
//! returned as-is.

use std::sync::Arc;

use async_trait::async_trait;

use tity_core::{Product, Style, Username};

use super::{ProductRepository, RepositoryError, StockChange};
use crate::models::user::{StoredUser, User};

/// Chains two repositories.
pub struct FallbackRepository {
    primary: Arc<dyn ProductRepository>,
    fallback: Arc<dyn ProductRepository>,
}

impl FallbackRepository {
    #[must_use]
    pub fn new(primary: Arc<dyn ProductRepository>, fallback: Arc<dyn ProductRepository>) -> Self {
        Self { primary, fallback }
    }

    fn note_fallback(&self, operation: &str, err: &RepositoryError) {
        tracing::warn!(
            primary = self.primary.backend(),
            fallback = self.fallback.backend(),
            operation,
            error = %err,
            "Primary backend unavailable, using fallback"
        );
    }
}

/// Run `$call` on the primary, retrying on the fallback when the primary is
/// unavailable.
macro_rules! with_fallback {
    ($self:ident, $op:literal, |$repo:ident| $call:expr) => {{
        let $repo = &$self.primary;
        match $call.await {
            Err(err) if err.is_unavailable() => {
                $self.note_fallback($op, &err);
                let $repo = &$self.fallback;
                $call.await
            }
            other => other,
        }
    }};
}

#[async_trait]
impl ProductRepository for FallbackRepository {
    fn backend(&self) -> &'static str {
        "fallback"
    }

    async fn list_products(&self, style: Style) -> Result<Vec<Product>, RepositoryError> {
        with_fallback!(self, "list_products", |repo| repo.list_products(style))
    }

    async fn get_stock(&self, style: Style, name: &str) -> Result<u32, RepositoryError> {
        with_fallback!(self, "get_stock", |repo| repo.get_stock(style, name))
    }

    async fn decrement_stock(
        &self,
        style: Style,
        name: &str,
        quantity: u32,
    ) -> Result<StockChange, RepositoryError> {
        with_fallback!(self, "decrement_stock", |repo| repo
            .decrement_stock(style, name, quantity))
    }

    async fn find_user(&self, username: &Username) -> Result<Option<StoredUser>, RepositoryError> {
        with_fallback!(self, "find_user", |repo| repo.find_user(username))
    }

    async fn create_user(
        &self,
        username: &Username,
        password_hash: &str,
    ) -> Result<User, RepositoryError> {
        with_fallback!(self, "create_user", |repo| repo
            .create_user(username, password_hash))
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        with_fallback!(self, "ping", |repo| repo.ping())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::memory::MemoryProductRepository;

    fn repos() -> (Arc<MemoryProductRepository>, Arc<MemoryProductRepository>) {
        (
            Arc::new(MemoryProductRepository::with_demo_catalog()),
            Arc::new(MemoryProductRepository::with_demo_catalog()),
        )
    }

    #[tokio::test]
    async fn test_uses_primary_when_available() {
        let (primary, fallback) = repos();
        primary.set_stock(Style::Hippie, "Blusa hippie", 3).await;
        let repo = FallbackRepository::new(primary, fallback);

        assert_eq!(repo.get_stock(Style::Hippie, "Blusa hippie").await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_switches_to_fallback_when_unavailable() {
        let (primary, fallback) = repos();
        primary.set_unavailable(true);
        let repo = FallbackRepository::new(primary.clone(), fallback.clone());

        let change = repo
            .decrement_stock(Style::Hippie, "Blusa hippie", 2)
            .await
            .unwrap();
        assert_eq!(change.remaining, 8);
        assert_eq!(fallback.stock_of(Style::Hippie, "Blusa hippie").await, Some(8));
        assert_eq!(primary.stock_of(Style::Hippie, "Blusa hippie").await, Some(10));
    }

    #[tokio::test]
    async fn test_not_found_is_not_retried() {
        let (primary, fallback) = repos();
        let repo = FallbackRepository::new(primary, fallback.clone());

        let result = repo.decrement_stock(Style::Gotico, "Nada", 1).await;
        assert!(matches!(result, Err(RepositoryError::NotFound)));
    }

    #[tokio::test]
    async fn test_both_unavailable() {
        let (primary, fallback) = repos();
        primary.set_unavailable(true);
        fallback.set_unavailable(true);
        let repo = FallbackRepository::new(primary, fallback);

        assert!(repo.ping().await.unwrap_err().is_unavailable());
    }
}
