//! Fern Hollow Core - Canonical commerce model.
//!
//! This crate defines the single internal shape every view consumes:
//! products, variants, carts, filters, sort options, and category facets.
//! External backend schemas never leak past the adapters in the
//! `storefront` crate; everything downstream works with these types.
//!
//! # Architecture
//!
//! The core crate contains only types and pure derivations - no I/O, no
//! HTTP clients, no async. This keeps it lightweight and allows it to be
//! used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, the canonical product/cart model, filter and
//!   sort state, and category facet data

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
