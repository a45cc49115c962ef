//! Seed the relational catalog.
//!
//! The YAML file is a list of products:
//!
//! ```yaml
//! - name: Blusa hippie
//!   price: "255.00"
//!   stock: 10
//!   image: /img/blusa.jpg
//!   style: hippie
//! ```

use std::path::Path;

use tity_core::Product;
use tity_storefront::db::memory::demo_catalog;
use tity_storefront::db::postgres::PgProductRepository;

use super::{CommandError, connect};

/// Insert the products from `file` (or the demo catalog).
pub async fn catalog(file: Option<&Path>) -> Result<(), CommandError> {
    let products = match file {
        Some(path) => load(path).await?,
        None => demo_catalog(),
    };
    tracing::info!(products = products.len(), "Loaded catalog");

    let repo = PgProductRepository::new(connect().await?);
    let inserted = repo.seed(&products).await?;

    tracing::info!(
        inserted,
        skipped = products.len() as u64 - inserted,
        "Seeding complete"
    );
    Ok(())
}

async fn load(path: &Path) -> Result<Vec<Product>, CommandError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| CommandError::Io {
            path: path.display().to_string(),
            source,
        })?;
    Ok(serde_yaml::from_str(&content)?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tity_core::{Price, Style};

    use super::*;

    #[test]
    fn test_parse_catalog_yaml() {
        let yaml = r#"
- name: Blusa hippie
  price: "255.00"
  stock: 10
  image: /img/blusa.jpg
  style: hippie
  description: null
- name: Cadenas
  price: "120.00"
  stock: 0
  image: null
  style: gotico
  description: Acero
"#;
        let products: Vec<Product> = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(products.len(), 2);
        assert_eq!(products[0].price, Price::from_cents(25_500));
        assert_eq!(products[1].style, Style::Gotico);
        assert!(!products[1].in_stock());
    }

    #[test]
    fn test_unknown_style_is_rejected() {
        let yaml = r#"
- name: Gorra
  price: "80.00"
  stock: 3
  image: null
  style: vaquero
  description: null
"#;
        assert!(serde_yaml::from_str::<Vec<Product>>(yaml).is_err());
    }
}
