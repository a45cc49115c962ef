//! Plain-text purchase receipt.

use std::fmt::{self, Write as _};

use chrono::{DateTime, FixedOffset};

use tity_core::{Cart, CartItem, Price};

const RULE: &str = "========================================";

/// Date format printed on receipts (`19/10/2026, 14:05:09`).
pub const DATE_FORMAT: &str = "%d/%m/%Y, %H:%M:%S";

/// A completed purchase, ready to download.
#[derive(Debug, Clone)]
pub struct Receipt {
    issued_at: DateTime<FixedOffset>,
    customer: String,
    items: Vec<CartItem>,
    total: Price,
}

impl Receipt {
    #[must_use]
    pub fn new(customer: impl Into<String>, cart: &Cart, issued_at: DateTime<FixedOffset>) -> Self {
        Self {
            issued_at,
            customer: customer.into(),
            items: cart.items().to_vec(),
            total: cart.total(),
        }
    }

    #[must_use]
    pub const fn total(&self) -> Price {
        self.total
    }

    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Download name, `comprobante_<epoch-ms>.txt`.
    #[must_use]
    pub fn filename(&self) -> String {
        format!("comprobante_{}.txt", self.issued_at.timestamp_millis())
    }

    #[must_use]
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Receipt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        writeln!(out, "{RULE}")?;
        writeln!(out, "         TITY CREATIONS")?;
        writeln!(out, "{RULE}")?;
        writeln!(out, "Fecha: {}", self.issued_at.format(DATE_FORMAT))?;
        writeln!(out, "Cliente: {}", self.customer)?;
        writeln!(out, "{RULE}")?;
        writeln!(out)?;
        writeln!(out, "PRODUCTOS:")?;
        writeln!(out)?;

        for (index, item) in self.items.iter().enumerate() {
            writeln!(out, "{}. {}", index + 1, item.name)?;
            writeln!(out, "   Precio unitario: {}", item.unit_price)?;
            writeln!(out, "   Cantidad: {}", item.quantity)?;
            writeln!(out, "   Subtotal: {}", item.subtotal())?;
            writeln!(out)?;
        }

        writeln!(out, "{RULE}")?;
        writeln!(out, "TOTAL: {}", self.total)?;
        writeln!(out, "{RULE}")?;
        writeln!(out)?;
        write!(out, "¡Gracias por su compra!")?;

        f.write_str(&out)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;
    use tity_core::Style;

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

    fn issued_at() -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339("2025-03-04T05:06:07-06:00").unwrap()
    }

    #[test]
    fn test_render_two_items() {
        let mut cart = Cart::new();
        cart.upsert(item("Blusa hippie", 25_500, 2));
        cart.upsert(item("Collares", 5_000, 1));

        let receipt = Receipt::new("ana", &cart, issued_at());
        let expected = "\
========================================
         TITY CREATIONS
========================================
Fecha: 04/03/2025, 05:06:07
Cliente: ana
========================================

PRODUCTOS:

1. Blusa hippie
   Precio unitario: $255.00
   Cantidad: 2
   Subtotal: $510.00

2. Collares
   Precio unitario: $50.00
   Cantidad: 1
   Subtotal: $50.00

========================================
TOTAL: $560.00
========================================

¡Gracias por su compra!";

        assert_eq!(receipt.render(), expected);
        assert_eq!(receipt.total(), Price::from_cents(56_000));
    }

    #[test]
    fn test_subtotals_sum_to_total() {
        let mut cart = Cart::new();
        cart.upsert(item("a", 1_999, 3));
        cart.upsert(item("b", 1, 7));
        cart.upsert(item("c", 33_333, 11));

        let receipt = Receipt::new("ana", &cart, issued_at());
        let summed: Decimal = receipt.items().iter().map(|i| i.subtotal().amount()).sum();
        assert_eq!(summed, receipt.total().amount());
    }

    #[test]
    fn test_filename_uses_epoch_millis() {
        let receipt = Receipt::new("ana", &Cart::new(), issued_at());
        assert_eq!(receipt.filename(), "comprobante_1741086367000.txt");
    }
}
