//! Canonical types for Fern Hollow.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod cart;
pub mod category;
pub mod filters;
pub mod id;
pub mod product;

pub use cart::{Cart, CartItem, CartTotals};
pub use category::{Category, CategoryData};
pub use filters::{PriceRange, ProductFilters, ProductSortKey, SortOption};
pub use id::*;
pub use product::{PhysicalAttributes, Product, ProductImage, Variant, VariantKind};
