//! Catalog product.

use serde::{Deserialize, Serialize};

use super::{Price, Style};

/// A product as listed on a style page.
///
/// The name is unique within a style and is the key used for stock lookups
/// and cart entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub name: String,
    pub price: Price,
    pub stock: u32,
    pub image: Option<String>,
    pub style: Style,
    pub description: Option<String>,
}

impl Product {
    /// Whether the product can currently be added to a cart.
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock > 0
    }
}
