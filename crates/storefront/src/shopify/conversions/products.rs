//! Product and collection conversion functions.

use chrono::{DateTime, Utc};
use fernhollow_core::{
    Category, ImageId, Product, ProductId, ProductImage, Variant, VariantId, VariantKind,
};
use rust_decimal::Decimal;
use tracing::warn;

use crate::catalog::Collection;
use crate::pagination::CatalogPage;
use crate::shopify::queries::{
    CollectionNode, ImageNode, ProductConnection, ProductNode, VariantNode,
};

/// Maximum length of the derived short description.
const SHORT_DESCRIPTION_LEN: usize = 140;

/// Keyword table mapping the backend's free-form product-type strings to
/// the closed category enumeration. First matching keyword wins; the
/// match is case-insensitive on substrings. Unmatched types fall back to
/// [`Category::Gifts`] - a documented approximation, not ground truth.
const CATEGORY_KEYWORDS: &[(&str, Category)] = &[
    ("hoodie", Category::Apparel),
    ("shirt", Category::Apparel),
    ("tee", Category::Apparel),
    ("sweatshirt", Category::Apparel),
    ("apparel", Category::Apparel),
    ("sock", Category::Apparel),
    ("hat", Category::Accessories),
    ("tote", Category::Accessories),
    ("bag", Category::Accessories),
    ("pin", Category::Accessories),
    ("sticker", Category::Accessories),
    ("accessor", Category::Accessories),
    ("book", Category::Books),
    ("journal", Category::Books),
    ("calendar", Category::Books),
    ("ornament", Category::Seasonal),
    ("holiday", Category::Seasonal),
    ("seasonal", Category::Seasonal),
];

/// Map a raw product-type string to a canonical category.
#[must_use]
pub fn category_for_product_type(product_type: &str) -> Category {
    let lowered = product_type.to_lowercase();
    CATEGORY_KEYWORDS
        .iter()
        .find(|(keyword, _)| lowered.contains(keyword))
        .map_or(Category::Gifts, |(_, category)| *category)
}

/// Convert a wire product node to a canonical product.
///
/// Total: a malformed field degrades that field, never the product. An
/// inconsistent result (out-of-stock with an available variant, sale
/// price at or above base) is flagged with a warning and kept.
#[must_use]
pub fn convert_product(node: ProductNode) -> Product {
    let (price, sale_price) = derive_prices(&node.variants.nodes);
    // Variant overrides are measured against what the product currently
    // charges, which is the sale price while one is active.
    let current_price = sale_price.unwrap_or(price);
    let images = convert_images(&node.images.nodes, node.featured_image.as_ref());
    let variants: Vec<Variant> = node
        .variants
        .nodes
        .iter()
        .map(|v| convert_variant(v, current_price))
        .collect();
    let stock_count: u32 = node
        .variants
        .nodes
        .iter()
        .filter_map(|v| v.quantity_available)
        .filter(|q| *q > 0)
        .map(|q| u32::try_from(q).unwrap_or(u32::MAX))
        .sum();
    let featured = node.tags.iter().any(|t| t.eq_ignore_ascii_case("featured"));

    let product = Product {
        id: ProductId::new(node.id),
        handle: node.handle,
        name: node.title,
        short_description: short_description_of(&node.description),
        description: node.description,
        category: category_for_product_type(&node.product_type),
        price,
        sale_price,
        images,
        variants,
        in_stock: node.available_for_sale,
        stock_count,
        featured,
        tags: node.tags,
        attributes: None,
        created_at: parse_timestamp(node.created_at.as_deref()),
        updated_at: parse_timestamp(node.updated_at.as_deref()),
        collections: node
            .collections
            .nodes
            .into_iter()
            .map(|c| c.handle)
            .collect(),
        vendor: node.vendor,
        product_type: node.product_type,
    };

    if !product.is_consistent() {
        warn!(
            product = %product.handle,
            "catalog reported an inconsistent product; keeping flagged data"
        );
    }

    product
}

/// Convert a top-level product connection to a catalog page.
#[must_use]
pub fn convert_page(connection: ProductConnection) -> CatalogPage {
    CatalogPage {
        products: connection
            .edges
            .into_iter()
            .map(|edge| convert_product(edge.node))
            .collect(),
        has_next_page: connection.page_info.has_next_page,
        end_cursor: connection.page_info.end_cursor,
    }
}

/// Convert a wire collection node to a canonical collection.
#[must_use]
pub fn convert_collection(node: CollectionNode) -> Collection {
    Collection {
        handle: node.handle,
        name: node.title,
        description: node.description,
        image_url: node.image.map(|i| i.url),
        products: node
            .products
            .map(|connection| convert_page(connection).products)
            .unwrap_or_default(),
    }
}

/// Derive base and sale price from the variant list.
///
/// Shopify reports the currently charged price per variant plus an
/// optional `compareAtPrice`; when the compare-at is strictly above the
/// charged price, the compare-at is the base and the charged price the
/// sale. A sale price that is not strictly below base is dropped.
fn derive_prices(variants: &[VariantNode]) -> (Decimal, Option<Decimal>) {
    let Some(first) = variants.first() else {
        return (Decimal::ZERO, None);
    };
    let current = parse_decimal(&first.price.amount);
    let compare_at = first
        .compare_at_price
        .as_ref()
        .map(|m| parse_decimal(&m.amount));
    match compare_at {
        Some(base) if current < base => (base, Some(current)),
        _ => (current, None),
    }
}

fn convert_variant(node: &VariantNode, current_price: Decimal) -> Variant {
    let kind = node
        .selected_options
        .first()
        .map_or(VariantKind::Style, |opt| match opt.name.to_lowercase() {
            n if n.contains("size") => VariantKind::Size,
            n if n.contains("color") || n.contains("colour") => VariantKind::Color,
            n if n.contains("material") => VariantKind::Material,
            _ => VariantKind::Style,
        });
    let price = parse_decimal(&node.price.amount);
    Variant {
        id: VariantId::new(node.id.clone()),
        name: node.title.clone(),
        kind,
        // An override is only meaningful when it differs from what the
        // product currently charges.
        price: (price != current_price).then_some(price),
        stock: node
            .quantity_available
            .filter(|q| *q >= 0)
            .map(|q| u32::try_from(q).unwrap_or(u32::MAX)),
        sku: node.sku.clone(),
        is_available: node.available_for_sale,
    }
}

fn convert_images(images: &[ImageNode], featured: Option<&ImageNode>) -> Vec<ProductImage> {
    let featured_id = featured.and_then(|f| f.id.as_deref());
    let source: Vec<&ImageNode> = if images.is_empty() {
        featured.into_iter().collect()
    } else {
        images.iter().collect()
    };
    let main_index = featured_id
        .and_then(|id| source.iter().position(|i| i.id.as_deref() == Some(id)))
        .unwrap_or(0);
    source
        .into_iter()
        .enumerate()
        .map(|(order, image)| ProductImage {
            id: image.id.clone().map(ImageId::new),
            url: image.url.clone(),
            alt_text: image.alt_text.clone(),
            order,
            is_main: order == main_index,
        })
        .collect()
}

/// Parse a wire decimal string, defaulting to zero on garbage.
fn parse_decimal(amount: &str) -> Decimal {
    amount.parse().unwrap_or(Decimal::ZERO)
}

fn parse_timestamp(value: Option<&str>) -> Option<DateTime<Utc>> {
    value
        .and_then(|v| DateTime::parse_from_rfc3339(v).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

/// Cut a short description at a word boundary.
fn short_description_of(description: &str) -> String {
    let trimmed = description.trim();
    if trimmed.chars().count() <= SHORT_DESCRIPTION_LEN {
        return trimmed.to_string();
    }
    let mut out = String::new();
    for word in trimmed.split_whitespace() {
        if out.chars().count() + word.chars().count() + 1 > SHORT_DESCRIPTION_LEN {
            break;
        }
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    out.push('…');
    out
}
