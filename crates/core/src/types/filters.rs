//! Structured filter and sort state.
//!
//! This is the UI-facing half of the query pipeline: views mutate a
//! [`ProductFilters`] / [`SortOption`] pair, and the storefront crate
//! compiles it into the backend's query grammar.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::category::Category;

/// An inclusive price range filter.
///
/// The unbounded upper end is represented by the explicit sentinel
/// [`PriceRange::MAX_PRICE`], not by omission, so "no maximum" and
/// "maximum accidentally missing" cannot be confused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: Decimal,
    pub max: Decimal,
}

impl PriceRange {
    /// Sentinel for "no upper bound".
    pub const MAX_PRICE: Decimal = Decimal::MAX;

    /// The catalog-wide default: everything from zero, unbounded above.
    #[must_use]
    pub const fn unbounded() -> Self {
        Self {
            min: Decimal::ZERO,
            max: Self::MAX_PRICE,
        }
    }

    /// Whether this range differs from the catalog-wide default.
    #[must_use]
    pub fn is_constrained(&self) -> bool {
        self.min > Decimal::ZERO || self.max != Self::MAX_PRICE
    }
}

impl Default for PriceRange {
    fn default() -> Self {
        Self::unbounded()
    }
}

/// Structured product filter state.
///
/// Categories are OR-combined within the set; distinct filter dimensions
/// combine with AND when compiled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ProductFilters {
    /// Selected categories (OR within the set).
    pub categories: Vec<Category>,
    /// Price bounds.
    pub price_range: PriceRange,
    /// Only show purchasable products.
    pub in_stock_only: bool,
    /// Only show featured products.
    pub featured_only: bool,
    /// Only show products with an active sale price.
    pub on_sale_only: bool,
    /// Free-form tag filters (OR within the set).
    pub tags: Vec<String>,
}

impl ProductFilters {
    /// Whether no filter dimension is active.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
            && !self.price_range.is_constrained()
            && !self.in_stock_only
            && !self.featured_only
            && !self.on_sale_only
            && self.tags.is_empty()
    }
}

/// Backend sort keys for product queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductSortKey {
    Title,
    Price,
    CreatedAt,
    UpdatedAt,
    BestSelling,
}

impl ProductSortKey {
    /// Wire representation for GraphQL enum values.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Title => "TITLE",
            Self::Price => "PRICE",
            Self::CreatedAt => "CREATED_AT",
            Self::UpdatedAt => "UPDATED_AT",
            Self::BestSelling => "BEST_SELLING",
        }
    }
}

/// User-facing sort options.
///
/// Each option maps deterministically to one backend sort key plus a
/// reverse flag; the table in [`SortOption::sort_key`] is fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum SortOption {
    PriceAsc,
    PriceDesc,
    NameAsc,
    NameDesc,
    #[default]
    Newest,
    Popular,
    Featured,
}

impl SortOption {
    /// The fixed mapping to the backend's `(sortKey, reverse)` pair.
    #[must_use]
    pub const fn sort_key(self) -> (ProductSortKey, bool) {
        match self {
            Self::PriceAsc => (ProductSortKey::Price, false),
            Self::PriceDesc => (ProductSortKey::Price, true),
            Self::NameAsc => (ProductSortKey::Title, false),
            Self::NameDesc => (ProductSortKey::Title, true),
            Self::Newest => (ProductSortKey::CreatedAt, true),
            Self::Popular => (ProductSortKey::BestSelling, true),
            Self::Featured => (ProductSortKey::UpdatedAt, true),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn default_filters_are_empty() {
        assert!(ProductFilters::default().is_empty());
    }

    #[test]
    fn any_dimension_makes_filters_non_empty() {
        let filters = ProductFilters {
            in_stock_only: true,
            ..Default::default()
        };
        assert!(!filters.is_empty());

        let filters = ProductFilters {
            price_range: PriceRange {
                min: dec!(10),
                max: PriceRange::MAX_PRICE,
            },
            ..Default::default()
        };
        assert!(!filters.is_empty());
    }

    #[test]
    fn unbounded_range_is_not_constrained() {
        assert!(!PriceRange::unbounded().is_constrained());
        let capped = PriceRange {
            min: Decimal::ZERO,
            max: dec!(100),
        };
        assert!(capped.is_constrained());
    }

    #[test]
    fn sort_table_is_reproduced_exactly() {
        use ProductSortKey as K;
        use SortOption as S;

        let expected = [
            (S::PriceAsc, K::Price, false),
            (S::PriceDesc, K::Price, true),
            (S::NameAsc, K::Title, false),
            (S::NameDesc, K::Title, true),
            (S::Newest, K::CreatedAt, true),
            (S::Popular, K::BestSelling, true),
            (S::Featured, K::UpdatedAt, true),
        ];
        for (option, key, reverse) in expected {
            assert_eq!(option.sort_key(), (key, reverse), "{option:?}");
        }
    }

    #[test]
    fn sort_key_wire_values_are_screaming_snake() {
        assert_eq!(ProductSortKey::CreatedAt.as_str(), "CREATED_AT");
        assert_eq!(ProductSortKey::BestSelling.as_str(), "BEST_SELLING");
        let json = serde_json::to_string(&ProductSortKey::BestSelling).expect("serialize");
        assert_eq!(json, "\"BEST_SELLING\"");
    }
}
