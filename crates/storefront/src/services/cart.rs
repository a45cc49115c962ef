//! Stock-aware cart mutations.
//!
//! Every quantity change is reconciled against the live stock count:
//!
//! | stock lookup       | effect on the item          | message  |
//! |--------------------|-----------------------------|----------|
//! | `Ok(0)`            | removed (or never added)    | error    |
//! | `Ok(s)`, `q > s`   | quantity clamped to `s`     | warning  |
//! | `Ok(s)`, `q <= s`  | quantity set to `q`         | success  |
//! | `Err(_)`           | quantity set to `q` anyway  | info     |
//!
//! The returned [`FlashMessage`] replaces whatever message was pending.

use tracing::instrument;

use tity_core::{Cart, CartItem, FlashMessage, Price, Style};

use crate::db::{ProductRepository, RepositoryError};

/// Result of checking a wanted quantity against a stock lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockCheck {
    /// Nothing left.
    OutOfStock,
    /// Only this many units are available.
    Clamped(u32),
    /// The full quantity is available.
    Available,
    /// Stock could not be read; quantity applied unverified.
    Unverified,
}

impl StockCheck {
    /// Compare `wanted` units against a stock lookup.
    #[must_use]
    pub fn evaluate(wanted: u32, lookup: &Result<u32, RepositoryError>) -> Self {
        match *lookup {
            Ok(0) => Self::OutOfStock,
            Ok(stock) if wanted > stock => Self::Clamped(stock),
            Ok(_) => Self::Available,
            Err(_) => Self::Unverified,
        }
    }

    /// Quantity to keep in the cart, `None` when the item must go.
    #[must_use]
    pub const fn quantity(self, wanted: u32) -> Option<u32> {
        match self {
            Self::OutOfStock => None,
            Self::Clamped(stock) => Some(stock),
            Self::Available | Self::Unverified => Some(wanted),
        }
    }
}

/// What the shopper picked on a product card.
#[derive(Debug, Clone)]
pub struct ProductChoice {
    pub name: String,
    pub unit_price: Price,
    pub style: Option<Style>,
    pub image: Option<String>,
}

impl ProductChoice {
    fn into_item(self, quantity: u32) -> CartItem {
        CartItem {
            name: self.name,
            unit_price: self.unit_price,
            quantity,
            style: self.style,
            image: self.image,
        }
    }
}

/// Cart reconciler.
pub struct CartService<'a> {
    repo: &'a dyn ProductRepository,
}

impl<'a> CartService<'a> {
    #[must_use]
    pub const fn new(repo: &'a dyn ProductRepository) -> Self {
        Self { repo }
    }

    /// Live stock of a styled item. Unstyled items have no stock record.
    async fn lookup(&self, style: Option<Style>, name: &str) -> Option<Result<u32, RepositoryError>> {
        let style = style?;
        let result = self.repo.get_stock(style, name).await;
        if let Err(e) = &result {
            tracing::error!(style = %style, product = name, error = %e, "Stock lookup failed");
        }
        Some(result)
    }

    /// Set the quantity of a cart line.
    ///
    /// Returns `None` (and leaves the cart alone) if the item is not in the
    /// cart.
    #[instrument(skip(self, cart))]
    pub async fn update_quantity(
        &self,
        cart: &mut Cart,
        name: &str,
        requested: u32,
    ) -> Option<FlashMessage> {
        let style = cart.get(name)?.style;
        let requested = requested.max(1);

        let check = match self.lookup(style, name).await {
            Some(lookup) => StockCheck::evaluate(requested, &lookup),
            None => StockCheck::Available,
        };

        let Some(quantity) = check.quantity(requested) else {
            cart.remove(name);
            return Some(FlashMessage::error(format!(
                "«{name}» ya no tiene stock y se eliminó del carrito"
            )));
        };

        if let Some(item) = cart.get_mut(name) {
            item.quantity = quantity;
        }

        Some(match check {
            StockCheck::Clamped(stock) => FlashMessage::warning(format!(
                "Solo hay {stock} unidades de «{name}»; la cantidad se ajustó al límite de stock"
            )),
            StockCheck::Unverified => FlashMessage::info(format!(
                "Cantidad de «{name}» actualizada (no se pudo verificar el stock)"
            )),
            StockCheck::Available | StockCheck::OutOfStock => {
                FlashMessage::success(format!("Cantidad de «{name}» actualizada"))
            }
        })
    }

    /// Add units of a product, merging with an existing line.
    #[instrument(skip(self, cart, choice), fields(product = %choice.name))]
    pub async fn add(&self, cart: &mut Cart, choice: ProductChoice, requested: u32) -> FlashMessage {
        let name = choice.name.clone();
        let wanted = cart
            .get(&name)
            .map_or(0, |item| item.quantity)
            .saturating_add(requested.max(1));

        let check = match self.lookup(choice.style, &name).await {
            Some(lookup) => StockCheck::evaluate(wanted, &lookup),
            None => StockCheck::Available,
        };

        let Some(quantity) = check.quantity(wanted) else {
            cart.remove(&name);
            return FlashMessage::error(format!("«{name}» no tiene stock disponible"));
        };

        cart.upsert(choice.into_item(quantity));

        match check {
            StockCheck::Clamped(stock) => FlashMessage::warning(format!(
                "Solo hay {stock} unidades de «{name}»; la cantidad se ajustó al límite de stock"
            )),
            StockCheck::Unverified => FlashMessage::info(format!(
                "«{name}» agregado al carrito (no se pudo verificar el stock)"
            )),
            StockCheck::Available | StockCheck::OutOfStock => {
                FlashMessage::success(format!("«{name}» agregado al carrito"))
            }
        }
    }

    /// Build the single-item cart used by "buy now".
    ///
    /// The returned cart is empty when the product is out of stock.
    pub async fn buy_now(&self, choice: ProductChoice, requested: u32) -> (Cart, FlashMessage) {
        let mut cart = Cart::new();
        let message = self.add(&mut cart, choice, requested).await;
        (cart, message)
    }
}

/// Remove a line by name.
///
/// Returns `None` if the item was not in the cart.
pub fn remove_item(cart: &mut Cart, name: &str) -> Option<FlashMessage> {
    cart.remove(name)
        .map(|item| FlashMessage::info(format!("«{}» se eliminó del carrito", item.name)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tity_core::Severity;

    use super::*;
    use crate::db::memory::MemoryProductRepository;

    fn blusa() -> ProductChoice {
        ProductChoice {
            name: "Blusa hippie".to_owned(),
            unit_price: Price::from_cents(25_500),
            style: Some(Style::Hippie),
            image: Some("/img/blusa.jpg".to_owned()),
        }
    }

    fn cart_with_blusa(quantity: u32) -> Cart {
        Cart::single(blusa().into_item(quantity))
    }

    #[test]
    fn test_stock_check_matrix() {
        assert_eq!(StockCheck::evaluate(3, &Ok(0)), StockCheck::OutOfStock);
        assert_eq!(StockCheck::evaluate(8, &Ok(5)), StockCheck::Clamped(5));
        assert_eq!(StockCheck::evaluate(5, &Ok(5)), StockCheck::Available);
        assert_eq!(
            StockCheck::evaluate(5, &Err(RepositoryError::Unavailable("down".into()))),
            StockCheck::Unverified
        );
    }

    #[test]
    fn test_update_result_is_min_of_request_and_stock() {
        for stock in 0..6_u32 {
            for requested in 1..9_u32 {
                let kept = StockCheck::evaluate(requested, &Ok(stock)).quantity(requested);
                if stock == 0 {
                    assert_eq!(kept, None);
                } else {
                    assert_eq!(kept, Some(requested.min(stock)));
                }
            }
        }
    }

    #[tokio::test]
    async fn test_update_clamps_to_stock() {
        let repo = MemoryProductRepository::with_demo_catalog();
        repo.set_stock(Style::Hippie, "Blusa hippie", 5).await;
        let mut cart = cart_with_blusa(1);

        let message = CartService::new(&repo)
            .update_quantity(&mut cart, "Blusa hippie", 8)
            .await
            .unwrap();

        assert_eq!(message.severity, Severity::Warning);
        assert_eq!(cart.get("Blusa hippie").unwrap().quantity, 5);
    }

    #[tokio::test]
    async fn test_update_removes_out_of_stock_item() {
        let repo = MemoryProductRepository::with_demo_catalog();
        repo.set_stock(Style::Hippie, "Blusa hippie", 0).await;
        let mut cart = cart_with_blusa(2);

        let message = CartService::new(&repo)
            .update_quantity(&mut cart, "Blusa hippie", 1)
            .await
            .unwrap();

        assert_eq!(message.severity, Severity::Error);
        assert!(cart.is_empty());
    }

    #[tokio::test]
    async fn test_update_within_stock() {
        let repo = MemoryProductRepository::with_demo_catalog();
        let mut cart = cart_with_blusa(1);

        let message = CartService::new(&repo)
            .update_quantity(&mut cart, "Blusa hippie", 4)
            .await
            .unwrap();

        assert_eq!(message.severity, Severity::Success);
        assert_eq!(cart.get("Blusa hippie").unwrap().quantity, 4);
    }

    #[tokio::test]
    async fn test_update_applies_request_when_lookup_fails() {
        let repo = MemoryProductRepository::with_demo_catalog();
        repo.set_unavailable(true);
        let mut cart = cart_with_blusa(1);

        let message = CartService::new(&repo)
            .update_quantity(&mut cart, "Blusa hippie", 40)
            .await
            .unwrap();

        assert_eq!(message.severity, Severity::Info);
        assert_eq!(cart.get("Blusa hippie").unwrap().quantity, 40);
    }

    #[tokio::test]
    async fn test_update_missing_item_is_noop() {
        let repo = MemoryProductRepository::with_demo_catalog();
        let mut cart = cart_with_blusa(1);

        let message = CartService::new(&repo)
            .update_quantity(&mut cart, "Cadenas", 3)
            .await;

        assert!(message.is_none());
        assert_eq!(cart, cart_with_blusa(1));
    }

    #[tokio::test]
    async fn test_add_merges_and_clamps() {
        let repo = MemoryProductRepository::with_demo_catalog();
        let service = CartService::new(&repo);
        let mut cart = Cart::new();

        let message = service.add(&mut cart, blusa(), 6).await;
        assert_eq!(message.severity, Severity::Success);

        let message = service.add(&mut cart, blusa(), 6).await;
        assert_eq!(message.severity, Severity::Warning);
        assert_eq!(cart.get("Blusa hippie").unwrap().quantity, 10);
        assert_eq!(cart.items().len(), 1);
    }

    #[tokio::test]
    async fn test_add_out_of_stock_leaves_cart_unchanged() {
        let repo = MemoryProductRepository::with_demo_catalog();
        repo.set_stock(Style::Hippie, "Blusa hippie", 0).await;
        let mut cart = Cart::new();

        let message = CartService::new(&repo).add(&mut cart, blusa(), 1).await;

        assert_eq!(message.severity, Severity::Error);
        assert!(cart.is_empty());
    }

    #[tokio::test]
    async fn test_buy_now_builds_single_item_cart() {
        let repo = MemoryProductRepository::with_demo_catalog();
        let (cart, message) = CartService::new(&repo).buy_now(blusa(), 2).await;

        assert_eq!(message.severity, Severity::Success);
        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.total(), Price::from_cents(51_000));
    }

    #[test]
    fn test_remove_item() {
        let mut cart = cart_with_blusa(1);
        assert!(remove_item(&mut cart, "Cadenas").is_none());

        let message = remove_item(&mut cart, "Blusa hippie").unwrap();
        assert_eq!(message.severity, Severity::Info);
        assert!(cart.is_empty());
    }
}
