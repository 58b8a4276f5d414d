//! Crate-level error taxonomy.
//!
//! Three failure families exist: transport/backend failures
//! ([`ShopifyError`]), durable-state failures ([`StoreError`]), and
//! configuration failures ([`ConfigError`]). All of them unify into
//! [`CommerceError`], and before anything reaches view code it is
//! normalized further into the single [`ErrorMessage`] shape - raw
//! transport or backend error objects never cross that boundary.

use serde::Serialize;
use thiserror::Error;

use crate::config::ConfigError;
use crate::shopify::ShopifyError;
use crate::store::StoreError;

/// Any failure the commerce core can produce.
#[derive(Debug, Error)]
pub enum CommerceError {
    /// A Shopify API call failed.
    #[error(transparent)]
    Shopify(#[from] ShopifyError),

    /// The durable state store failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// The single error shape exposed to view code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorMessage {
    /// Human-readable description of what failed.
    pub message: String,
}

impl From<&CommerceError> for ErrorMessage {
    fn from(err: &CommerceError) -> Self {
        Self {
            message: err.to_string(),
        }
    }
}

impl From<CommerceError> for ErrorMessage {
    fn from(err: CommerceError) -> Self {
        Self::from(&err)
    }
}

impl std::fmt::Display for ErrorMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}
