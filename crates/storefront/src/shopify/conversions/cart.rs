//! Cart conversion functions.
//!
//! Backend cart responses are always converted wholesale - the canonical
//! cart is replaced, never merged, so local state cannot diverge from the
//! backend.

use fernhollow_core::{Cart, CartId, CartItem, CartTotals, LineId, ProductId, VariantId};
use rust_decimal::Decimal;
use tracing::warn;

use crate::shopify::queries::{CartLineNode, CartNode};

/// Shopify's title for the implicit variant of a single-variant product.
const DEFAULT_VARIANT_TITLE: &str = "Default Title";

/// Convert a wire cart to the canonical cart.
///
/// The backend reports subtotal, total, and (optionally) tax; shipping is
/// derived locally as `total - subtotal - tax`, kept raw so the four
/// totals always reconcile. An externally applied discount makes the
/// derived value negative; that is logged, not hidden. Tax defaults to
/// zero when the backend omits it.
#[must_use]
pub fn convert_cart(node: CartNode) -> Cart {
    let subtotal = parse_decimal(&node.cost.subtotal_amount.amount);
    let total = parse_decimal(&node.cost.total_amount.amount);
    let tax = node
        .cost
        .total_tax_amount
        .as_ref()
        .map_or(Decimal::ZERO, |m| parse_decimal(&m.amount));
    let shipping = total - subtotal - tax;
    if shipping < Decimal::ZERO {
        warn!(
            cart = %node.id,
            %shipping,
            "backend total is below subtotal plus tax; keeping the raw derived shipping"
        );
    }

    Cart {
        id: Some(CartId::new(node.id)),
        checkout_url: Some(node.checkout_url),
        items: node.lines.nodes.into_iter().map(convert_line).collect(),
        totals: CartTotals {
            subtotal,
            tax,
            shipping,
            total,
        },
        total_quantity: clamp_quantity(node.total_quantity),
    }
}

fn convert_line(node: CartLineNode) -> CartItem {
    let variant_name = (node.merchandise.title != DEFAULT_VARIANT_TITLE)
        .then(|| node.merchandise.title.clone());
    CartItem {
        line_id: Some(LineId::new(node.id)),
        product_id: ProductId::new(node.merchandise.product.id),
        variant_id: Some(VariantId::new(node.merchandise.id)),
        name: node.merchandise.product.title,
        variant_name,
        quantity: clamp_quantity(node.quantity),
        unit_price: parse_decimal(&node.cost.amount_per_quantity.amount),
    }
}

fn clamp_quantity(quantity: i64) -> u32 {
    u32::try_from(quantity.max(0)).unwrap_or(u32::MAX)
}

fn parse_decimal(amount: &str) -> Decimal {
    amount.parse().unwrap_or(Decimal::ZERO)
}
