//! Fern Hollow Storefront commerce core.
//!
//! This crate is the layer between the canonical commerce model in
//! `fernhollow-core` and the external Shopify Storefront API:
//!
//! - [`query`] compiles structured filter/sort/search state into the
//!   backend's query grammar
//! - [`pagination`] manages forward-only cursor pagination with
//!   append-vs-replace semantics
//! - [`shopify`] holds the API client and the adapters from wire nodes to
//!   canonical products, collections, and carts
//! - [`cart`] serializes cart mutations through a per-cart FIFO queue and
//!   keeps the canonical cart authoritative
//! - [`pricing`] derives subtotal/tax/shipping/total for locally sourced
//!   carts
//! - [`search`] provides debounced suggestions and recent-query memory
//! - [`store`] is the injectable key-value store for the little durable
//!   state this core keeps (cart id, recent searches)

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod config;
pub mod error;
pub mod pagination;
pub mod pricing;
pub mod query;
pub mod search;
pub mod shopify;
pub mod store;
