//! Session cart model.
//!
//! A [`Cart`] is an ordered list of [`CartItem`]s keyed by product name. It
//! is serialized into the user's session, so it only holds what the cart
//! page and the receipt need; live stock is always fetched separately.

use serde::{Deserialize, Serialize};

use crate::types::{Price, Style};

/// One line of a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    /// Product name, unique within the cart.
    pub name: String,
    pub unit_price: Price,
    pub quantity: u32,
    /// Style the product belongs to. Items without a style are never
    /// checked against (or deducted from) the stock store.
    pub style: Option<Style>,
    pub image: Option<String>,
}

impl CartItem {
    /// `unit_price × quantity`.
    #[must_use]
    pub fn subtotal(&self) -> Price {
        self.unit_price.times(self.quantity)
    }
}

/// An ordered, name-unique collection of cart items.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    #[serde(default)]
    items: Vec<CartItem>,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Create a cart holding exactly one item (the "buy now" cart).
    #[must_use]
    pub fn single(item: CartItem) -> Self {
        Self { items: vec![item] }
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&CartItem> {
        self.items.iter().find(|item| item.name == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut CartItem> {
        self.items.iter_mut().find(|item| item.name == name)
    }

    /// Remove an item by name, returning it if it was present.
    pub fn remove(&mut self, name: &str) -> Option<CartItem> {
        let index = self.items.iter().position(|item| item.name == name)?;
        Some(self.items.remove(index))
    }

    /// Insert an item, replacing any existing item with the same name in
    /// place. New names are appended at the end.
    pub fn upsert(&mut self, item: CartItem) {
        match self.get_mut(&item.name) {
            Some(existing) => *existing = item,
            None => self.items.push(item),
        }
    }

    /// Fold another cart into this one with [`Cart::upsert`] semantics.
    pub fn merge(&mut self, other: Self) {
        for item in other.items {
            self.upsert(item);
        }
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Sum of all line subtotals.
    #[must_use]
    pub fn total(&self) -> Price {
        self.items.iter().map(CartItem::subtotal).sum()
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items
            .iter()
            .fold(0u32, |count, item| count.saturating_add(item.quantity))
    }
}

/// Coerce a submitted quantity to an integer ≥ 1.
///
/// Missing, unparsable, zero or negative input becomes 1.
///
/// ```
/// use tity_core::coerce_quantity;
///
/// assert_eq!(coerce_quantity(Some("3")), 3);
/// assert_eq!(coerce_quantity(Some("-2")), 1);
/// assert_eq!(coerce_quantity(Some("abc")), 1);
/// assert_eq!(coerce_quantity(None), 1);
/// ```
#[must_use]
pub fn coerce_quantity(raw: Option<&str>) -> u32 {
    raw.and_then(|s| s.trim().parse::<i64>().ok())
        .filter(|&q| q >= 1)
        .map_or(1, |q| u32::try_from(q).unwrap_or(u32::MAX))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn item(name: &str, cents: i64, quantity: u32) -> CartItem {
        CartItem {
            name: name.to_owned(),
            unit_price: Price::from_cents(cents),
            quantity,
            style: Some(Style::Hippie),
            image: None,
        }
    }

    #[test]
    fn test_upsert_replaces_in_place() {
        let mut cart = Cart::new();
        cart.upsert(item("Blusa hippie", 25500, 1));
        cart.upsert(item("Collares", 5000, 1));
        cart.upsert(item("Blusa hippie", 25500, 4));

        assert_eq!(cart.items().len(), 2);
        assert_eq!(cart.items()[0].name, "Blusa hippie");
        assert_eq!(cart.items()[0].quantity, 4);
    }

    #[test]
    fn test_remove() {
        let mut cart = Cart::single(item("Cadenas", 12000, 2));
        assert!(cart.remove("Nope").is_none());
        assert_eq!(cart.remove("Cadenas").unwrap().quantity, 2);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_total_matches_subtotals() {
        let mut cart = Cart::new();
        cart.upsert(item("Blusa hippie", 25500, 2));
        cart.upsert(item("Collares", 5000, 1));

        let subtotals: Price = cart.items().iter().map(CartItem::subtotal).sum();
        assert_eq!(cart.total(), subtotals);
        assert_eq!(cart.total().to_string(), "$560.00");
        assert_eq!(cart.item_count(), 3);
    }

    #[test]
    fn test_merge_keeps_order_and_replaces_duplicates() {
        let mut persistent = Cart::new();
        persistent.upsert(item("Chamarra", 37000, 1));
        persistent.upsert(item("Collares", 5000, 3));

        persistent.merge(Cart::single(item("Collares", 5000, 1)));
        persistent.merge(Cart::single(item("Cadenas", 12000, 2)));

        let names: Vec<_> = persistent.items().iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, ["Chamarra", "Collares", "Cadenas"]);
        assert_eq!(persistent.get("Collares").unwrap().quantity, 1);
    }

    #[test]
    fn test_session_serialization_roundtrip() {
        let cart = Cart::single(item("Blusa hippie", 25500, 2));
        let json = serde_json::to_string(&cart).unwrap();
        let back: Cart = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cart);

        let empty: Cart = serde_json::from_str("{}").unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn test_coerce_quantity() {
        assert_eq!(coerce_quantity(Some(" 8 ")), 8);
        assert_eq!(coerce_quantity(Some("0")), 1);
        assert_eq!(coerce_quantity(Some("2.5")), 1);
        assert_eq!(coerce_quantity(Some("")), 1);
        assert_eq!(coerce_quantity(Some("99999999999")), u32::MAX);
    }
}
