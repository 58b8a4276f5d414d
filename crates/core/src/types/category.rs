//! The closed category enumeration and derived facet data.

use serde::{Deserialize, Serialize};

/// Product category.
///
/// A closed enumeration: the backend's free-form product-type strings are
/// mapped onto these five values by the catalog adapter. Unmatched types
/// fall back to [`Category::Gifts`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Apparel,
    Accessories,
    Books,
    #[default]
    Gifts,
    Seasonal,
}

impl Category {
    /// All categories in display order.
    pub const ALL: [Self; 5] = [
        Self::Apparel,
        Self::Accessories,
        Self::Books,
        Self::Gifts,
        Self::Seasonal,
    ];

    /// Human-readable display name.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Apparel => "Apparel",
            Self::Accessories => "Accessories",
            Self::Books => "Books",
            Self::Gifts => "Gifts",
            Self::Seasonal => "Seasonal",
        }
    }

    /// URL slug, also the label used in compiled backend queries.
    #[must_use]
    pub const fn slug(self) -> &'static str {
        match self {
            Self::Apparel => "apparel",
            Self::Accessories => "accessories",
            Self::Books => "books",
            Self::Gifts => "gifts",
            Self::Seasonal => "seasonal",
        }
    }

    /// Short description for category landing tiles.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Apparel => "Tees, hoodies, and sweatshirts from the sanctuary",
            Self::Accessories => "Totes, pins, stickers, and everyday carry",
            Self::Books => "Books and journals about the residents",
            Self::Gifts => "Gifts, plush, and cards for animal lovers",
            Self::Seasonal => "Holiday and limited seasonal items",
        }
    }

    /// Icon reference for filter UI.
    #[must_use]
    pub const fn icon(self) -> &'static str {
        match self {
            Self::Apparel => "shirt",
            Self::Accessories => "tote",
            Self::Books => "book",
            Self::Gifts => "gift",
            Self::Seasonal => "snowflake",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.slug())
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "apparel" => Ok(Self::Apparel),
            "accessories" => Ok(Self::Accessories),
            "books" => Ok(Self::Books),
            "gifts" => Ok(Self::Gifts),
            "seasonal" => Ok(Self::Seasonal),
            _ => Err(format!("invalid category: {s}")),
        }
    }
}

/// Category facet for filter UI.
///
/// `product_count` is recomputed from whatever product set is currently
/// loaded - with cursor pagination in effect that is usually a partial
/// view, so the count is an approximation of the catalog, never
/// backend-reported inventory. Consumers must treat it as such.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryData {
    /// The category this facet describes.
    pub category: Category,
    /// Display name.
    pub name: String,
    /// URL slug.
    pub slug: String,
    /// Short description.
    pub description: String,
    /// Icon reference.
    pub icon: String,
    /// Count of matching products in the currently loaded set (approximate).
    pub product_count: usize,
}

impl CategoryData {
    /// Build facet data for a category with a derived count.
    #[must_use]
    pub fn with_count(category: Category, product_count: usize) -> Self {
        Self {
            category,
            name: category.display_name().to_string(),
            slug: category.slug().to_string(),
            description: category.description().to_string(),
            icon: category.icon().to_string(),
            product_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn slug_round_trips() {
        for category in Category::ALL {
            assert_eq!(Category::from_str(category.slug()), Ok(category));
        }
    }

    #[test]
    fn unknown_slug_is_rejected() {
        assert!(Category::from_str("widgets").is_err());
    }

    #[test]
    fn serde_uses_snake_case() {
        let json = serde_json::to_string(&Category::Apparel).expect("serialize");
        assert_eq!(json, "\"apparel\"");
    }
}
