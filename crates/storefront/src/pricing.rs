//! Local pricing engine.
//!
//! For carts sourced from a local catalog rather than the backend, this
//! engine owns all four derived totals. Backend-sourced carts take their
//! totals from the mutation response instead (see [`crate::cart`]); there
//! is exactly one pricing implementation, parameterized by
//! [`PricingConfig`].
//!
//! Everything here is pure and synchronous. Quantity clamping happens
//! inside the engine so no caller can push an out-of-range cart into
//! storage.

use fernhollow_core::{Cart, CartItem, CartTotals, Product, ProductId, VariantId};
use rust_decimal::{Decimal, RoundingStrategy};

/// Pricing knobs, loaded from configuration (see [`crate::config`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricingConfig {
    /// Tax rate applied to the subtotal.
    pub tax_rate: Decimal,
    /// Subtotal at or above which shipping is free.
    pub free_shipping_threshold: Decimal,
    /// Flat shipping charge below the threshold.
    pub flat_shipping_rate: Decimal,
    /// Minimum quantity per line.
    pub min_quantity: u32,
    /// Maximum quantity per line.
    pub max_quantity: u32,
}

impl Default for PricingConfig {
    /// The observed store defaults: 8% tax, free shipping at $50.00,
    /// $5.99 flat shipping, quantities 1-10.
    fn default() -> Self {
        Self {
            tax_rate: Decimal::new(8, 2),
            free_shipping_threshold: Decimal::new(50_00, 2),
            flat_shipping_rate: Decimal::new(5_99, 2),
            min_quantity: 1,
            max_quantity: 10,
        }
    }
}

impl PricingConfig {
    /// Clamp a requested quantity into the configured range.
    #[must_use]
    pub fn clamp_quantity(&self, quantity: u32) -> u32 {
        quantity.clamp(self.min_quantity, self.max_quantity)
    }

    /// Recompute all four derived totals from a line set.
    ///
    /// `tax` rounds to two decimal places, midpoints away from zero.
    /// An empty line set has nothing to ship, so all four totals are zero.
    #[must_use]
    pub fn totals(&self, items: &[CartItem]) -> CartTotals {
        if items.is_empty() {
            return CartTotals::default();
        }
        let subtotal: Decimal = items.iter().map(CartItem::line_total).sum();
        let tax = (subtotal * self.tax_rate)
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        let shipping = if subtotal >= self.free_shipping_threshold {
            Decimal::ZERO
        } else {
            self.flat_shipping_rate
        };
        CartTotals {
            subtotal,
            tax,
            shipping,
            total: subtotal + tax + shipping,
        }
    }
}

/// A cart backed by a local catalog.
///
/// All four totals are recomputed atomically inside every mutation;
/// there is no path that changes the line set without refreshing them.
#[derive(Debug, Clone, Default)]
pub struct LocalCart {
    config: PricingConfig,
    cart: Cart,
}

impl LocalCart {
    /// Create an empty local cart.
    #[must_use]
    pub fn new(config: PricingConfig) -> Self {
        Self {
            config,
            cart: Cart::empty(),
        }
    }

    /// The canonical cart view.
    #[must_use]
    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    /// Add `quantity` units of a product (optionally a specific variant).
    ///
    /// The unit price is captured now, from the product's current
    /// (sale-aware, variant-override-aware) price, and is never silently
    /// recomputed afterwards. An existing matching line has its quantity
    /// increased instead of a duplicate line being added.
    pub fn add_item(&mut self, product: &Product, variant_id: Option<&VariantId>, quantity: u32) {
        let quantity = self.config.clamp_quantity(quantity);
        if let Some(line) = self
            .cart
            .items
            .iter_mut()
            .find(|i| i.product_id == product.id && i.variant_id.as_ref() == variant_id)
        {
            line.quantity = self.config.clamp_quantity(line.quantity + quantity);
        } else {
            let variant = variant_id.and_then(|id| product.variants.iter().find(|v| &v.id == id));
            self.cart.items.push(CartItem {
                line_id: None,
                product_id: product.id.clone(),
                variant_id: variant_id.cloned(),
                name: product.name.clone(),
                variant_name: variant.map(|v| v.name.clone()),
                quantity,
                unit_price: product.unit_price_for(variant_id),
            });
        }
        self.recompute();
    }

    /// Set a line's quantity. A requested quantity of zero or below
    /// removes the line; anything else is clamped into range.
    pub fn set_quantity(
        &mut self,
        product_id: &ProductId,
        variant_id: Option<&VariantId>,
        quantity: i64,
    ) {
        if quantity <= 0 {
            self.remove_item(product_id, variant_id);
            return;
        }
        let clamped = self
            .config
            .clamp_quantity(u32::try_from(quantity).unwrap_or(u32::MAX));
        if let Some(line) = self
            .cart
            .items
            .iter_mut()
            .find(|i| &i.product_id == product_id && i.variant_id.as_ref() == variant_id)
        {
            line.quantity = clamped;
            self.recompute();
        }
    }

    /// Remove a line entirely.
    pub fn remove_item(&mut self, product_id: &ProductId, variant_id: Option<&VariantId>) {
        self.cart
            .items
            .retain(|i| !(&i.product_id == product_id && i.variant_id.as_ref() == variant_id));
        self.recompute();
    }

    /// Remove all lines.
    pub fn clear(&mut self) {
        self.cart.items.clear();
        self.recompute();
    }

    fn recompute(&mut self) {
        self.cart.totals = self.config.totals(&self.cart.items);
        self.cart.total_quantity = self.cart.items.iter().map(|i| i.quantity).sum();
    }
}
