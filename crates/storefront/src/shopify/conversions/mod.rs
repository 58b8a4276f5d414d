//! Adapters from Storefront API wire nodes to the canonical model.
//!
//! Every function here is total: malformed or partially-populated nodes
//! degrade to best-effort canonical values instead of failing the page.

mod cart;
mod products;

pub use cart::convert_cart;
pub use products::{
    category_for_product_type, convert_collection, convert_page, convert_product,
};
