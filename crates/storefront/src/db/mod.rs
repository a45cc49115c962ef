//! Product and user persistence.
//!
//! Handlers never talk to a backend directly; they go through the
//! [`ProductRepository`] trait so the document store, the relational
//! fallback and the in-memory demo catalog are interchangeable.
//!
//! # Backends
//!
//! - [`crate::firestore::FirestoreRepository`] - Firestore REST API (primary)
//! - [`postgres::PgProductRepository`] - `PostgreSQL` relational fallback
//! - [`memory::MemoryProductRepository`] - seeded in-memory catalog (dev, tests)
//! - [`fallback::FallbackRepository`] - primary with automatic fallback
//!
//! # Migrations
//!
//! Relational migrations live in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p tity-cli -- migrate
//! ```

pub mod fallback;
pub mod memory;
pub mod postgres;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use tity_core::{Product, Style, Username};

use crate::models::user::{StoredUser, User};

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The backend could not be reached or answered with a transport error.
    ///
    /// This is the "degraded" case: callers decide which default applies
    /// (zero stock, best-effort cart update, fallback backend).
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., duplicate username).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// Data in the backend is corrupted or has an unexpected shape.
    #[error("data corruption: {0}")]
    DataCorruption(String),
}

impl RepositoryError {
    /// Whether this error means the backend itself is unreachable.
    #[must_use]
    pub const fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Self::NotFound,
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                Self::Conflict(db_err.message().to_owned())
            }
            ref decode @ (sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_)) => {
                Self::DataCorruption(decode.to_string())
            }
            other => Self::Unavailable(other.to_string()),
        }
    }
}

/// Stock levels before and after a decrement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockChange {
    pub previous: u32,
    pub remaining: u32,
}

impl StockChange {
    /// Apply a purchase of `quantity` units to `previous`, flooring at zero.
    #[must_use]
    pub const fn apply(previous: u32, quantity: u32) -> Self {
        Self {
            previous,
            remaining: previous.saturating_sub(quantity),
        }
    }
}

/// Narrow interface over the product/stock and user stores.
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Short backend name for logs and health output.
    fn backend(&self) -> &'static str;

    /// List every product of a style.
    async fn list_products(&self, style: Style) -> Result<Vec<Product>, RepositoryError>;

    /// Current stock for a product. A product missing from the store has
    /// zero stock.
    async fn get_stock(&self, style: Style, name: &str) -> Result<u32, RepositoryError>;

    /// Subtract a purchased quantity from the stock, flooring at zero.
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    async fn decrement_stock(
        &self,
        style: Style,
        name: &str,
        quantity: u32,
    ) -> Result<StockChange, RepositoryError>;

    /// Look up a user together with their stored password hash.
    async fn find_user(&self, username: &Username) -> Result<Option<StoredUser>, RepositoryError>;

    /// Create a user. Returns `RepositoryError::Conflict` if the username
    /// is taken.
    async fn create_user(
        &self,
        username: &Username,
        password_hash: &str,
    ) -> Result<User, RepositoryError>;

    /// Cheap connectivity check used by the readiness probe.
    async fn ping(&self) -> Result<(), RepositoryError>;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
