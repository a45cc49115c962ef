//! Checkout: final stock validation, stock decrement, receipt.
//!
//! # Flow
//!
//! 1. Pick the active cart: the "buy now" cart when present, otherwise the
//!    persistent cart.
//! 2. Re-read live stock for every styled item. The first item that cannot
//!    be fully served is removed (no stock) or clamped, and checkout stops.
//!    A failed lookup counts as no stock.
//! 3. Otherwise decrement stock item by item. There is no rollback: a
//!    failed decrement is logged and the remaining items are still processed.
//! 4. Issue a [`Receipt`] and clear the cart that was used.
//!
//! Nothing here locks stock between validation and decrement, so two
//! shoppers buying the last unit at the same time can both succeed.

use chrono::{DateTime, FixedOffset};
use tracing::instrument;

use tity_core::{Cart, FlashMessage, Username};

use super::receipt::Receipt;
use crate::db::{ProductRepository, RepositoryError};

/// The two carts a session can hold.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionCarts {
    /// Persistent multi-item cart.
    pub cart: Cart,
    /// Single-item "buy now" cart.
    pub temp: Option<Cart>,
}

impl SessionCarts {
    /// Whether checkout will use the "buy now" cart.
    #[must_use]
    pub fn uses_temp(&self) -> bool {
        self.temp.as_ref().is_some_and(|c| !c.is_empty())
    }

    /// The cart checkout operates on.
    #[must_use]
    pub fn active(&self) -> &Cart {
        match &self.temp {
            Some(temp) if !temp.is_empty() => temp,
            _ => &self.cart,
        }
    }

    fn active_mut(&mut self) -> &mut Cart {
        match &mut self.temp {
            Some(temp) if !temp.is_empty() => temp,
            _ => &mut self.cart,
        }
    }

    /// Fold the "buy now" cart into the persistent cart and drop it.
    pub fn absorb_temp(&mut self) {
        if let Some(temp) = self.temp.take() {
            self.cart.merge(temp);
        }
    }

    /// Empty whichever cart was active, leaving the other untouched.
    pub fn clear_active(&mut self) {
        if self.uses_temp() {
            self.temp = None;
        } else {
            self.cart.clear();
        }
    }
}

/// Outcome of the validation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    /// Every styled item is fully in stock.
    Ready,
    /// An item was removed or clamped; the shopper must review the cart.
    Adjusted(FlashMessage),
}

/// A stock decrement that did not go through.
#[derive(Debug)]
pub struct DecrementFailure {
    pub product: String,
    pub error: RepositoryError,
}

/// Outcome of a confirmed checkout.
#[derive(Debug)]
pub enum CheckoutOutcome {
    /// Nothing to buy.
    EmptyCart(FlashMessage),
    /// Validation changed the cart; nothing was charged or decremented.
    Adjusted(FlashMessage),
    /// Purchase recorded.
    Completed {
        receipt: Receipt,
        failures: Vec<DecrementFailure>,
    },
}

/// Checkout service.
pub struct CheckoutService<'a> {
    repo: &'a dyn ProductRepository,
}

impl<'a> CheckoutService<'a> {
    #[must_use]
    pub const fn new(repo: &'a dyn ProductRepository) -> Self {
        Self { repo }
    }

    /// Re-check every styled item against live stock.
    ///
    /// Only the first under-stocked item is adjusted.
    #[instrument(skip(self, cart))]
    pub async fn validate(&self, cart: &mut Cart) -> Validation {
        let styled: Vec<_> = cart
            .items()
            .iter()
            .filter_map(|item| item.style.map(|style| (style, item.name.clone(), item.quantity)))
            .collect();

        for (style, name, quantity) in styled {
            let stock = match self.repo.get_stock(style, &name).await {
                Ok(stock) => stock,
                Err(e) => {
                    tracing::error!(style = %style, product = %name, error = %e, "Stock lookup failed at checkout");
                    0
                }
            };

            if stock >= quantity {
                continue;
            }

            tracing::info!(style = %style, product = %name, stock, quantity, "Checkout stopped on short stock");

            if stock == 0 {
                cart.remove(&name);
                return Validation::Adjusted(FlashMessage::error(format!(
                    "«{name}» ya no tiene stock y se eliminó del carrito"
                )));
            }

            if let Some(item) = cart.get_mut(&name) {
                item.quantity = stock;
            }
            return Validation::Adjusted(FlashMessage::warning(format!(
                "Solo quedan {stock} unidades de «{name}»; ajustamos tu carrito, revísalo antes de pagar"
            )));
        }

        Validation::Ready
    }

    /// Decrement stock for every styled item, in cart order.
    #[instrument(skip(self, cart))]
    pub async fn decrement_all(&self, cart: &Cart) -> Vec<DecrementFailure> {
        let mut failures = Vec::new();

        for item in cart.items() {
            let Some(style) = item.style else { continue };

            if let Err(error) = self.repo.decrement_stock(style, &item.name, item.quantity).await {
                tracing::error!(
                    style = %style,
                    product = %item.name,
                    quantity = item.quantity,
                    error = %error,
                    "Stock decrement failed; continuing without rollback"
                );
                failures.push(DecrementFailure {
                    product: item.name.clone(),
                    error,
                });
            }
        }

        failures
    }

    /// Run the whole checkout on the session carts.
    #[instrument(skip(self, carts, issued_at), fields(customer = %customer))]
    pub async fn confirm(
        &self,
        carts: &mut SessionCarts,
        customer: &Username,
        issued_at: DateTime<FixedOffset>,
    ) -> CheckoutOutcome {
        if carts.active().is_empty() {
            carts.temp = None;
            return CheckoutOutcome::EmptyCart(FlashMessage::info("Tu carrito está vacío"));
        }

        if let Validation::Adjusted(message) = self.validate(carts.active_mut()).await {
            carts.absorb_temp();
            return CheckoutOutcome::Adjusted(message);
        }

        let failures = self.decrement_all(carts.active()).await;
        let receipt = Receipt::new(customer.as_str(), carts.active(), issued_at);
        carts.clear_active();

        tracing::info!(
            total = %receipt.total(),
            items = receipt.items().len(),
            failed_decrements = failures.len(),
            "Checkout completed"
        );

        CheckoutOutcome::Completed { receipt, failures }
    }
}
