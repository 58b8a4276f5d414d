//! Cache values for Storefront API catalog reads.

use fernhollow_core::Product;

use crate::catalog::Collection;
use crate::pagination::CatalogPage;

/// Cached value types. Only catalog reads are cached; carts never are.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Product(Box<Product>),
    Page(CatalogPage),
    Collection(Box<Collection>),
    Collections(Vec<Collection>),
}
