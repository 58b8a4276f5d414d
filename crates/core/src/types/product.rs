//! The canonical product model.
//!
//! These types provide a clean, ergonomic API separate from any backend's
//! raw schema. Canonical products are recreated on every catalog fetch;
//! nothing patches them incrementally.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::category::Category;
use super::id::{ImageId, ProductId, VariantId};

/// A product image with explicit ordering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductImage {
    /// Backend image ID, if one was reported.
    pub id: Option<ImageId>,
    /// Image URL.
    pub url: String,
    /// Alt text for accessibility.
    pub alt_text: Option<String>,
    /// Position in the product's image list (0-based).
    pub order: usize,
    /// Whether this is the product's main image.
    pub is_main: bool,
}

/// Variant type tag, derived from the backend's option name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum VariantKind {
    Size,
    Color,
    #[default]
    Style,
    Material,
}

impl VariantKind {
    /// Display label for grouping headers.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Size => "Size",
            Self::Color => "Color",
            Self::Style => "Style",
            Self::Material => "Material",
        }
    }
}

/// A product variant (a specific purchasable combination).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variant {
    /// Variant ID (pass to cart mutations as the merchandise id).
    pub id: VariantId,
    /// Display name (e.g., "Large", "Forest Green").
    pub name: String,
    /// Variant type tag.
    pub kind: VariantKind,
    /// Price override; `None` means the product base price applies.
    pub price: Option<Decimal>,
    /// Stock count, if inventory tracking is enabled.
    pub stock: Option<u32>,
    /// SKU code.
    pub sku: Option<String>,
    /// Whether this variant is available for sale.
    pub is_available: bool,
}

/// Optional physical attributes carried for product detail views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PhysicalAttributes {
    /// Weight description (e.g., "12 oz").
    pub weight: Option<String>,
    /// Dimensions description (e.g., "10 x 8 in").
    pub dimensions: Option<String>,
    /// Materials list.
    pub materials: Vec<String>,
    /// Care instructions.
    pub care: Option<String>,
}

/// A product in the canonical catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Product ID.
    pub id: ProductId,
    /// URL handle.
    pub handle: String,
    /// Display name.
    pub name: String,
    /// Long description (plain text).
    pub description: String,
    /// Short description for list views.
    pub short_description: String,
    /// Canonical category.
    pub category: Category,
    /// Base price.
    pub price: Decimal,
    /// Sale price; always strictly less than `price` when present.
    pub sale_price: Option<Decimal>,
    /// Ordered image list.
    pub images: Vec<ProductImage>,
    /// Flat variant list - the source of truth. Grouping by kind is a
    /// derived view and is never written back here.
    pub variants: Vec<Variant>,
    /// Whether any variant is purchasable.
    pub in_stock: bool,
    /// Aggregate stock across variants.
    pub stock_count: u32,
    /// Whether the product is featured (derived from tag membership).
    pub featured: bool,
    /// Product tags.
    pub tags: Vec<String>,
    /// Physical attributes, when the backend supplies them.
    pub attributes: Option<PhysicalAttributes>,
    /// Creation timestamp.
    pub created_at: Option<DateTime<Utc>>,
    /// Last update timestamp.
    pub updated_at: Option<DateTime<Utc>>,
    /// Handles of collections that own this product.
    pub collections: Vec<String>,
    /// Vendor name.
    pub vendor: String,
    /// The backend's raw product-type string (pre-mapping).
    pub product_type: String,
}

impl Product {
    /// The effective price a buyer pays right now.
    #[must_use]
    pub fn current_price(&self) -> Decimal {
        self.sale_price.unwrap_or(self.price)
    }

    /// Whether the product is currently on sale.
    #[must_use]
    pub const fn is_on_sale(&self) -> bool {
        self.sale_price.is_some()
    }

    /// The main image, when the product has one.
    #[must_use]
    pub fn main_image(&self) -> Option<&ProductImage> {
        self.images
            .iter()
            .find(|i| i.is_main)
            .or_else(|| self.images.first())
    }

    /// Check the catalog consistency invariants.
    ///
    /// Returns `false` when the product claims to be out of stock while
    /// exposing an available variant, or carries a sale price that is not
    /// strictly below the base price. Inconsistent products are flagged by
    /// the adapter, never silently trusted.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        if !self.in_stock && self.variants.iter().any(|v| v.is_available) {
            return false;
        }
        if let Some(sale) = self.sale_price
            && sale >= self.price
        {
            return false;
        }
        true
    }

    /// Resolve the unit price for a variant of this product.
    ///
    /// A variant price override wins; otherwise the product's current
    /// (sale-aware) price applies.
    #[must_use]
    pub fn unit_price_for(&self, variant_id: Option<&VariantId>) -> Decimal {
        variant_id
            .and_then(|id| self.variants.iter().find(|v| &v.id == id))
            .and_then(|v| v.price)
            .unwrap_or_else(|| self.current_price())
    }
}
