//! `PostgreSQL` repository (relational fallback).
//!
//! # Tables
//!
//! - `storefront.product` - catalog and stock, unique on `(style, name)`
//! - `storefront.app_user` - login names and password hashes
//!
//! Queries are checked at runtime (`query_as`) so the crate builds without
//! a live database.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::instrument;

use tity_core::{Price, Product, Style, UserId, Username};

use super::{ProductRepository, RepositoryError, StockChange};
use crate::models::user::{StoredUser, User};

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    name: String,
    price: Decimal,
    stock: i32,
    image: Option<String>,
    style: String,
    description: Option<String>,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let style = row.style.parse::<Style>().map_err(|e| {
            RepositoryError::DataCorruption(format!("product {}: {e}", row.name))
        })?;

        Ok(Self {
            stock: stock_from_column(row.stock)?,
            price: Price::new(row.price),
            name: row.name,
            image: row.image,
            style,
            description: row.description,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i32,
    username: String,
    password_hash: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for StoredUser {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let username = Username::parse(&row.username).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid username in database: {e}"))
        })?;

        Ok(Self {
            user: User {
                id: UserId::from(row.id),
                username,
                created_at: row.created_at,
            },
            password_hash: row.password_hash,
        })
    }
}

fn stock_from_column(stock: i32) -> Result<u32, RepositoryError> {
    u32::try_from(stock)
        .map_err(|_| RepositoryError::DataCorruption(format!("negative stock in database: {stock}")))
}

/// Repository for the relational store.
#[derive(Clone)]
pub struct PgProductRepository {
    pool: PgPool,
}

impl PgProductRepository {
    /// Create a new repository over an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert products that do not exist yet, leaving existing rows (and
    /// their stock) untouched. Returns the number of rows inserted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if any insert fails.
    pub async fn seed(&self, products: &[Product]) -> Result<u64, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let mut inserted = 0;

        for product in products {
            let result = sqlx::query(
                r"
                INSERT INTO storefront.product (name, price, stock, image, style, description)
                VALUES ($1, $2, $3, $4, $5, $6)
                ON CONFLICT (style, name) DO NOTHING
                ",
            )
            .bind(&product.name)
            .bind(product.price.amount())
            .bind(i32::try_from(product.stock).unwrap_or(i32::MAX))
            .bind(product.image.as_deref())
            .bind(product.style.slug())
            .bind(product.description.as_deref())
            .execute(&mut *tx)
            .await?;
            inserted += result.rows_affected();
        }

        tx.commit().await?;
        Ok(inserted)
    }
}

#[async_trait]
impl ProductRepository for PgProductRepository {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    #[instrument(skip(self))]
    async fn list_products(&self, style: Style) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT name, price, stock, image, style, description
            FROM storefront.product
            WHERE style = $1
            ORDER BY id DESC
            ",
        )
        .bind(style.slug())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Product::try_from).collect()
    }

    #[instrument(skip(self))]
    async fn get_stock(&self, style: Style, name: &str) -> Result<u32, RepositoryError> {
        let stock = sqlx::query_scalar::<_, i32>(
            "SELECT stock FROM storefront.product WHERE style = $1 AND name = $2",
        )
        .bind(style.slug())
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        stock.map_or(Ok(0), stock_from_column)
    }

    #[instrument(skip(self))]
    async fn decrement_stock(
        &self,
        style: Style,
        name: &str,
        quantity: u32,
    ) -> Result<StockChange, RepositoryError> {
        let row = sqlx::query_as::<_, (i32, i32)>(
            r"
            UPDATE storefront.product AS p
            SET stock = GREATEST(p.stock - $3, 0)
            FROM (
                SELECT id, stock
                FROM storefront.product
                WHERE style = $1 AND name = $2
                FOR UPDATE
            ) AS prev
            WHERE p.id = prev.id
            RETURNING prev.stock, p.stock
            ",
        )
        .bind(style.slug())
        .bind(name)
        .bind(i32::try_from(quantity).unwrap_or(i32::MAX))
        .fetch_optional(&self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        Ok(StockChange {
            previous: stock_from_column(row.0)?,
            remaining: stock_from_column(row.1)?,
        })
    }

    #[instrument(skip(self))]
    async fn find_user(&self, username: &Username) -> Result<Option<StoredUser>, RepositoryError> {
        sqlx::query_as::<_, UserRow>(
            r"
            SELECT id, username, password_hash, created_at
            FROM storefront.app_user
            WHERE username = $1
            ",
        )
        .bind(username.as_str())
        .fetch_optional(&self.pool)
        .await?
        .map(StoredUser::try_from)
        .transpose()
    }

    #[instrument(skip(self, password_hash))]
    async fn create_user(
        &self,
        username: &Username,
        password_hash: &str,
    ) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            INSERT INTO storefront.app_user (username, password_hash)
            VALUES ($1, $2)
            RETURNING id, username, password_hash, created_at
            ",
        )
        .bind(username.as_str())
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match RepositoryError::from(e) {
            RepositoryError::Conflict(_) => {
                RepositoryError::Conflict("username already exists".to_owned())
            }
            other => other,
        })?;

        Ok(StoredUser::try_from(row)?.user)
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_product_row_conversion() {
        let row = ProductRow {
            name: "Cadenas".to_owned(),
            price: Decimal::new(12000, 2),
            stock: 15,
            image: Some("/img/cadenas.jpg".to_owned()),
            style: "gotico".to_owned(),
            description: None,
        };
        let product = Product::try_from(row).unwrap();
        assert_eq!(product.style, Style::Gotico);
        assert_eq!(product.price.to_string(), "$120.00");
        assert_eq!(product.stock, 15);
    }

    #[test]
    fn test_product_row_rejects_bad_data() {
        let row = ProductRow {
            name: "Cadenas".to_owned(),
            price: Decimal::ONE,
            stock: -1,
            image: None,
            style: "gotico".to_owned(),
            description: None,
        };
        assert!(matches!(
            Product::try_from(row),
            Err(RepositoryError::DataCorruption(_))
        ));

        let row = ProductRow {
            name: "Cadenas".to_owned(),
            price: Decimal::ONE,
            stock: 1,
            image: None,
            style: "punk".to_owned(),
            description: None,
        };
        assert!(matches!(
            Product::try_from(row),
            Err(RepositoryError::DataCorruption(_))
        ));
    }
}
