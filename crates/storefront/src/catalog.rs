//! Derived catalog views: category facets and variant grouping.
//!
//! Both are recomputed from whatever product set is currently loaded and
//! never written back into the canonical model.

use std::collections::HashMap;

use fernhollow_core::{Category, CategoryData, Product, Variant, VariantKind};
use serde::{Deserialize, Serialize};

/// A canonical collection: a named, curated product grouping sourced from
/// the backend. Used for facet sourcing and landing views.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    /// URL handle.
    pub handle: String,
    /// Display name.
    pub name: String,
    /// Plain-text description.
    pub description: String,
    /// Cover image URL, when one is set.
    pub image_url: Option<String>,
    /// Canonical products in the collection (paginated; the loaded view).
    pub products: Vec<Product>,
}

/// Recompute category facet data from the loaded product set.
///
/// Counts come from `products` only - with cursor pagination in effect
/// that is usually a partial view of the catalog, so the counts are an
/// approximation, never backend-reported totals. All five categories are
/// returned in display order, including those with a zero count.
#[must_use]
pub fn aggregate_categories(products: &[Product]) -> Vec<CategoryData> {
    let mut counts: HashMap<Category, usize> = HashMap::new();
    for product in products {
        *counts.entry(product.category).or_insert(0) += 1;
    }
    Category::ALL
        .into_iter()
        .map(|category| {
            CategoryData::with_count(category, counts.get(&category).copied().unwrap_or(0))
        })
        .collect()
}

/// Group a product's variants by kind for presentation.
///
/// The flat variant list on the product stays the source of truth; this
/// is a borrowed, derived view. Groups appear in the order their kind is
/// first encountered, and variants keep their original order within a
/// group.
#[must_use]
pub fn group_variants(variants: &[Variant]) -> Vec<(VariantKind, Vec<&Variant>)> {
    let mut groups: Vec<(VariantKind, Vec<&Variant>)> = Vec::new();
    for variant in variants {
        if let Some((_, members)) = groups.iter_mut().find(|(kind, _)| *kind == variant.kind) {
            members.push(variant);
        } else {
            groups.push((variant.kind, vec![variant]));
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use fernhollow_core::{ProductId, VariantId};
    use rust_decimal_macros::dec;

    fn product(id: &str, category: Category) -> Product {
        Product {
            id: ProductId::new(id),
            handle: id.to_string(),
            name: id.to_string(),
            description: String::new(),
            short_description: String::new(),
            category,
            price: dec!(10.00),
            sale_price: None,
            images: vec![],
            variants: vec![],
            in_stock: true,
            stock_count: 1,
            featured: false,
            tags: vec![],
            attributes: None,
            created_at: None,
            updated_at: None,
            collections: vec![],
            vendor: String::new(),
            product_type: String::new(),
        }
    }

    fn variant(id: &str, kind: VariantKind) -> Variant {
        Variant {
            id: VariantId::new(id),
            name: id.to_string(),
            kind,
            price: None,
            stock: None,
            sku: None,
            is_available: true,
        }
    }

    #[test]
    fn facets_count_loaded_products_per_category() {
        let products = vec![
            product("a", Category::Apparel),
            product("b", Category::Apparel),
            product("c", Category::Books),
        ];
        let facets = aggregate_categories(&products);
        assert_eq!(facets.len(), Category::ALL.len());
        let by_category: HashMap<Category, usize> = facets
            .iter()
            .map(|f| (f.category, f.product_count))
            .collect();
        assert_eq!(by_category[&Category::Apparel], 2);
        assert_eq!(by_category[&Category::Books], 1);
        assert_eq!(by_category[&Category::Seasonal], 0);
    }

    #[test]
    fn facets_follow_display_order() {
        let facets = aggregate_categories(&[]);
        let order: Vec<Category> = facets.iter().map(|f| f.category).collect();
        assert_eq!(order, Category::ALL.to_vec());
    }

    #[test]
    fn grouping_preserves_encounter_and_member_order() {
        let variants = vec![
            variant("s", VariantKind::Size),
            variant("c1", VariantKind::Color),
            variant("m", VariantKind::Size),
            variant("c2", VariantKind::Color),
        ];
        let groups = group_variants(&variants);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0, VariantKind::Size);
        assert_eq!(groups[0].1.len(), 2);
        assert_eq!(groups[1].0, VariantKind::Color);
        assert_eq!(groups[1].1[0].id.as_str(), "c1");
        assert_eq!(groups[1].1[1].id.as_str(), "c2");
    }
}
