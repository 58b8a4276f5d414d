//! The canonical cart model.
//!
//! A canonical cart is replaced wholesale on every successful mutation
//! response - never incrementally merged - so local state can never
//! diverge from whatever source produced it.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::{CartId, LineId, ProductId, VariantId};

/// One entry in a cart.
///
/// `unit_price` is captured at the moment of insertion and is never
/// silently recomputed from a live catalog lookup; price changes require an
/// explicit cart refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    /// Backend line ID, for carts sourced from the backend.
    pub line_id: Option<LineId>,
    /// Product this line refers to.
    pub product_id: ProductId,
    /// Selected variant, if any.
    pub variant_id: Option<VariantId>,
    /// Product display name.
    pub name: String,
    /// Variant display name, if the variant is not the default one.
    pub variant_name: Option<String>,
    /// Quantity, always >= 1.
    pub quantity: u32,
    /// Unit price captured at insertion.
    pub unit_price: Decimal,
}

impl CartItem {
    /// Price for the whole line.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// The four derived totals of a cart.
///
/// All four are recomputed atomically inside every cart-mutating
/// operation; partial updates are never applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CartTotals {
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub shipping: Decimal,
    pub total: Decimal,
}

impl CartTotals {
    /// Whether `total == subtotal + tax + shipping` holds.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.total == self.subtotal + self.tax + self.shipping
    }
}

/// A shopping cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Cart {
    /// Backend cart ID; `None` for carts sourced from a local catalog.
    pub id: Option<CartId>,
    /// Checkout URL, for backend-sourced carts.
    pub checkout_url: Option<String>,
    /// Line items.
    pub items: Vec<CartItem>,
    /// Derived totals.
    pub totals: CartTotals,
    /// Total unit quantity across all lines.
    pub total_quantity: u32,
}

impl Cart {
    /// An empty cart with zeroed totals.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether the cart holds no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Find a line by product and optional variant.
    #[must_use]
    pub fn find_line(
        &self,
        product_id: &ProductId,
        variant_id: Option<&VariantId>,
    ) -> Option<&CartItem> {
        self.items
            .iter()
            .find(|item| &item.product_id == product_id && item.variant_id.as_ref() == variant_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn item(product: &str, quantity: u32, unit_price: Decimal) -> CartItem {
        CartItem {
            line_id: None,
            product_id: ProductId::new(product),
            variant_id: None,
            name: product.to_string(),
            variant_name: None,
            quantity,
            unit_price,
        }
    }

    #[test]
    fn line_total_multiplies_price_by_quantity() {
        let line = item("p1", 3, dec!(24.99));
        assert_eq!(line.line_total(), dec!(74.97));
    }

    #[test]
    fn totals_consistency_check() {
        let good = CartTotals {
            subtotal: dec!(94.97),
            tax: dec!(7.60),
            shipping: Decimal::ZERO,
            total: dec!(102.57),
        };
        assert!(good.is_consistent());

        let bad = CartTotals {
            total: dec!(100.00),
            ..good
        };
        assert!(!bad.is_consistent());
    }

    #[test]
    fn empty_cart_has_zeroed_totals() {
        let cart = Cart::empty();
        assert!(cart.is_empty());
        assert_eq!(cart.totals.subtotal, Decimal::ZERO);
        assert_eq!(cart.totals.total, Decimal::ZERO);
        assert!(cart.totals.is_consistent());
    }

    #[test]
    fn find_line_distinguishes_variants() {
        let mut cart = Cart::empty();
        let mut with_variant = item("p1", 1, dec!(10.00));
        with_variant.variant_id = Some(VariantId::new("v1"));
        cart.items.push(with_variant);
        cart.items.push(item("p1", 2, dec!(10.00)));

        let v1 = VariantId::new("v1");
        let found = cart
            .find_line(&ProductId::new("p1"), Some(&v1))
            .expect("variant line");
        assert_eq!(found.quantity, 1);

        let plain = cart
            .find_line(&ProductId::new("p1"), None)
            .expect("plain line");
        assert_eq!(plain.quantity, 2);
    }
}
