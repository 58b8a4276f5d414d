//! Compiles structured filter/sort/search state into the Storefront API
//! query grammar.
//!
//! The grammar is fixed: space-joined predicates combined with `AND`,
//! multi-valued predicates of one filter dimension combined with `OR` and
//! parenthesized. Recognized predicate forms: `tag:<v>`, `product_type:<v>`,
//! `available:true`, `variants.price:>=<n>`, `variants.price:<=<n>`,
//! `compare_at_price:>0`.
//!
//! Compilation is pure and synchronous; nothing here suspends.

use fernhollow_core::{Category, PriceRange, ProductFilters, ProductSortKey, SortOption};
use rust_decimal::Decimal;

/// The full query state a catalog fetch is built from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QuerySelection {
    /// Structured filters.
    pub filters: ProductFilters,
    /// Free-text search, conjoined with the compiled filter clause.
    pub search: Option<String>,
    /// Sort option.
    pub sort: SortOption,
}

/// A compiled backend query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledQuery {
    /// The query string, or `None` when no filter or search text is active.
    pub query: Option<String>,
    /// Backend sort key.
    pub sort_key: ProductSortKey,
    /// Whether the sort is reversed.
    pub reverse: bool,
}

/// Compile a selection into the backend grammar.
///
/// An empty filter set with empty search text compiles to `query: None`,
/// never to an empty string or a dangling operator.
#[must_use]
pub fn compile(selection: &QuerySelection) -> CompiledQuery {
    let (sort_key, reverse) = selection.sort.sort_key();
    CompiledQuery {
        query: compile_query_string(&selection.filters, selection.search.as_deref()),
        sort_key,
        reverse,
    }
}

fn compile_query_string(filters: &ProductFilters, search: Option<&str>) -> Option<String> {
    let mut clauses: Vec<String> = Vec::new();

    if let Some(clause) = or_group(filters.categories.iter().map(|c| category_predicates(*c))) {
        clauses.push(clause);
    }

    if let Some(clause) = or_group(
        filters
            .tags
            .iter()
            .filter(|t| !t.trim().is_empty())
            .map(|t| vec![format!("tag:{t}")]),
    ) {
        clauses.push(clause);
    }

    let range = &filters.price_range;
    if range.min > Decimal::ZERO {
        clauses.push(format!("variants.price:>={}", range.min));
    }
    if range.max != PriceRange::MAX_PRICE {
        clauses.push(format!("variants.price:<={}", range.max));
    }

    if filters.in_stock_only {
        clauses.push("available:true".to_string());
    }
    if filters.featured_only {
        clauses.push("tag:featured".to_string());
    }
    if filters.on_sale_only {
        clauses.push("compare_at_price:>0".to_string());
    }

    // Free text is conjoined with the filter clause, never OR'd.
    if let Some(text) = search {
        let text = text.trim();
        if !text.is_empty() {
            clauses.push(text.to_string());
        }
    }

    if clauses.is_empty() {
        None
    } else {
        Some(clauses.join(" AND "))
    }
}

/// Each category matches on its product-type label or its tag.
fn category_predicates(category: Category) -> Vec<String> {
    let slug = category.slug();
    vec![format!("product_type:{slug}"), format!("tag:{slug}")]
}

/// Combine one filter dimension's predicates into an OR group.
///
/// A single predicate is emitted bare; two or more are parenthesized.
fn or_group(dimensions: impl Iterator<Item = Vec<String>>) -> Option<String> {
    let predicates: Vec<String> = dimensions.flatten().collect();
    match predicates.len() {
        0 => None,
        1 => Some(predicates.into_iter().next()?),
        _ => Some(format!("({})", predicates.join(" OR "))),
    }
}
