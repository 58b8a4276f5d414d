//! Shopify Storefront API client.
//!
//! Hand-rolled GraphQL over `reqwest` 0.13. Catalog reads (products,
//! collections) are cached with `moka` for five minutes; cart operations
//! are mutable state and never cached.

use std::sync::Arc;
use std::time::Duration;

use fernhollow_core::{Cart, CartId, LineId, Product};
use moka::future::Cache;
use secrecy::ExposeSecret;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use crate::cart::{CartBackend, NewLine};
use crate::catalog::Collection;
use crate::config::ShopifyStorefrontConfig;
use crate::pagination::{CatalogPage, CatalogSource, PageRequest};
use crate::shopify::cache::CacheValue;
use crate::shopify::conversions::{convert_cart, convert_collection, convert_page, convert_product};
use crate::shopify::queries::{
    self, CartCreateData, CartData, CartInput, CartLineInput, CartLineUpdateInput,
    CartLinesAddData, CartLinesAddVariables, CartLinesRemoveData, CartLinesRemoveVariables,
    CartLinesUpdateData, CartLinesUpdateVariables, CartMutationPayload, CartVariables,
    CollectionByHandleData, CollectionByHandleVariables, CollectionsData, CollectionsVariables,
    GraphQLRequest, GraphQLResponse, ProductByHandleData, ProductByHandleVariables, ProductsData,
    ProductsVariables,
};
use crate::shopify::{GraphQLError, GraphQLErrorLocation, ShopifyError};

const CACHE_TTL: Duration = Duration::from_secs(300);
const CACHE_CAPACITY: u64 = 1000;

/// Client for the Shopify Storefront API.
///
/// Cheap to clone; all state lives behind an `Arc`.
#[derive(Clone)]
pub struct StorefrontClient {
    inner: Arc<StorefrontClientInner>,
}

struct StorefrontClientInner {
    client: reqwest::Client,
    endpoint: String,
    access_token: String,
    cache: Cache<String, CacheValue>,
}

impl StorefrontClient {
    /// Create a new Storefront API client.
    #[must_use]
    pub fn new(config: &ShopifyStorefrontConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(CACHE_CAPACITY)
            .time_to_live(CACHE_TTL)
            .build();

        let endpoint = format!(
            "https://{}/api/{}/graphql.json",
            config.store, config.api_version
        );

        Self {
            inner: Arc::new(StorefrontClientInner {
                client: reqwest::Client::new(),
                endpoint,
                access_token: config.storefront_private_token.expose_secret().to_string(),
                cache,
            }),
        }
    }

    /// Execute one GraphQL operation.
    async fn execute<V: Serialize, T: DeserializeOwned>(
        &self,
        document: &'static str,
        variables: V,
    ) -> Result<T, ShopifyError> {
        let body = GraphQLRequest {
            query: document,
            variables,
        };

        let response = self
            .inner
            .client
            .post(&self.inner.endpoint)
            // Private access tokens use a different header than public tokens
            .header("Shopify-Storefront-Private-Token", &self.inner.access_token)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(ShopifyError::RateLimited(retry_after));
        }

        // Take the body as text first for better error diagnostics
        let response_text = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %response_text.chars().take(500).collect::<String>(),
                "Shopify API returned non-success status"
            );
            return Err(ShopifyError::graphql_message(format!(
                "HTTP {status}: {}",
                response_text.chars().take(200).collect::<String>()
            )));
        }

        let GraphQLResponse { data, errors } = match serde_json::from_str::<GraphQLResponse<T>>(&response_text) {
            Ok(r) => r,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    body = %response_text.chars().take(500).collect::<String>(),
                    "Failed to parse Shopify GraphQL response"
                );
                return Err(ShopifyError::Parse(e));
            }
        };

        if let Some(errors) = errors
            && !errors.is_empty()
        {
            tracing::debug!(count = errors.len(), "GraphQL errors in response");
            return Err(ShopifyError::GraphQL(
                errors
                    .into_iter()
                    .map(|e| GraphQLError {
                        message: e.message,
                        locations: e.locations.map_or_else(Vec::new, |locs| {
                            locs.into_iter()
                                .map(|l| GraphQLErrorLocation {
                                    line: l.line,
                                    column: l.column,
                                })
                                .collect()
                        }),
                        path: e.path.unwrap_or_default(),
                    })
                    .collect(),
            ));
        }

        data.ok_or_else(|| {
            tracing::error!(
                body = %response_text.chars().take(500).collect::<String>(),
                "Shopify GraphQL response has no data and no errors"
            );
            ShopifyError::graphql_message("No data in response")
        })
    }

    // =========================================================================
    // Catalog Methods
    // =========================================================================

    /// Get a product by its handle.
    ///
    /// # Errors
    ///
    /// Returns an error if the product is not found or the API request fails.
    #[instrument(skip(self), fields(handle = %handle))]
    pub async fn get_product_by_handle(&self, handle: &str) -> Result<Product, ShopifyError> {
        let cache_key = format!("product:{handle}");

        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let data: ProductByHandleData = self
            .execute(
                queries::GET_PRODUCT_BY_HANDLE,
                ProductByHandleVariables {
                    handle: handle.to_string(),
                },
            )
            .await?;

        let node = data
            .product
            .ok_or_else(|| ShopifyError::NotFound(format!("Product not found: {handle}")))?;
        let product = convert_product(node);

        self.inner
            .cache
            .insert(cache_key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }

    /// Get one catalog page of products.
    ///
    /// Pages without a compiled query string are cached; search results
    /// are not.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, request))]
    pub async fn get_products(&self, request: &PageRequest) -> Result<CatalogPage, ShopifyError> {
        let cache_key = products_cache_key(request);

        if request.query.is_none()
            && let Some(CacheValue::Page(page)) = self.inner.cache.get(&cache_key).await
        {
            debug!("Cache hit for products");
            return Ok(page);
        }

        let data: ProductsData = self
            .execute(
                queries::GET_PRODUCTS,
                ProductsVariables {
                    first: request.page_size,
                    after: request.after.clone(),
                    query: request.query.clone(),
                    sort_key: request.sort_key,
                    reverse: request.reverse,
                },
            )
            .await?;

        let page = convert_page(data.products);

        if request.query.is_none() {
            self.inner
                .cache
                .insert(cache_key, CacheValue::Page(page.clone()))
                .await;
        }

        Ok(page)
    }

    /// Get a collection by its handle, with one page of its products.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection is not found or the API request fails.
    #[instrument(skip(self), fields(handle = %handle))]
    pub async fn get_collection_by_handle(
        &self,
        handle: &str,
        product_count: i64,
    ) -> Result<Collection, ShopifyError> {
        let cache_key = format!("collection:{handle}");

        if let Some(CacheValue::Collection(collection)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for collection");
            return Ok(*collection);
        }

        let data: CollectionByHandleData = self
            .execute(
                queries::GET_COLLECTION_BY_HANDLE,
                CollectionByHandleVariables {
                    handle: handle.to_string(),
                    first: product_count,
                },
            )
            .await?;

        let node = data
            .collection
            .ok_or_else(|| ShopifyError::NotFound(format!("Collection not found: {handle}")))?;
        let collection = convert_collection(node);

        self.inner
            .cache
            .insert(
                cache_key,
                CacheValue::Collection(Box::new(collection.clone())),
            )
            .await;

        Ok(collection)
    }

    /// Get the store's collections.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn get_collections(
        &self,
        first: i64,
        after: Option<String>,
    ) -> Result<Vec<Collection>, ShopifyError> {
        let cache_key = format!("collections:{first}:{}", after.as_deref().unwrap_or(""));

        if let Some(CacheValue::Collections(collections)) = self.inner.cache.get(&cache_key).await
        {
            debug!("Cache hit for collections");
            return Ok(collections);
        }

        let data: CollectionsData = self
            .execute(
                queries::GET_COLLECTIONS,
                CollectionsVariables { first, after },
            )
            .await?;

        let collections: Vec<Collection> = data
            .collections
            .edges
            .into_iter()
            .map(|edge| convert_collection(edge.node))
            .collect();

        self.inner
            .cache
            .insert(cache_key, CacheValue::Collections(collections.clone()))
            .await;

        Ok(collections)
    }

    // =========================================================================
    // Cache Management
    // =========================================================================

    /// Invalidate a cached product.
    pub async fn invalidate_product(&self, handle: &str) {
        self.inner
            .cache
            .invalidate(&format!("product:{handle}"))
            .await;
    }

    /// Invalidate all cached data.
    pub async fn invalidate_all(&self) {
        self.inner.cache.invalidate_all();
        self.inner.cache.run_pending_tasks().await;
    }

    fn cart_from_payload(
        payload: Option<CartMutationPayload>,
        action: &str,
    ) -> Result<Cart, ShopifyError> {
        let Some(payload) = payload else {
            return Err(ShopifyError::graphql_message(format!("Failed to {action}")));
        };
        if !payload.user_errors.is_empty() {
            return Err(ShopifyError::UserError(
                payload
                    .user_errors
                    .into_iter()
                    .map(|e| e.message)
                    .collect::<Vec<_>>()
                    .join("; "),
            ));
        }
        payload
            .cart
            .map(convert_cart)
            .ok_or_else(|| ShopifyError::graphql_message(format!("Failed to {action}")))
    }
}

impl CatalogSource for StorefrontClient {
    async fn fetch_page(&self, request: &PageRequest) -> Result<CatalogPage, ShopifyError> {
        self.get_products(request).await
    }
}

// Cart operations are not cached - mutable state.
impl CartBackend for StorefrontClient {
    #[instrument(skip(self))]
    async fn create_cart(&self) -> Result<Cart, ShopifyError> {
        let data: CartCreateData = self
            .execute(
                queries::CART_CREATE,
                queries::CartCreateVariables {
                    input: CartInput::default(),
                },
            )
            .await?;
        Self::cart_from_payload(data.cart_create, "create cart")
    }

    #[instrument(skip(self), fields(cart_id = %cart_id))]
    async fn get_cart(&self, cart_id: &CartId) -> Result<Cart, ShopifyError> {
        let data: CartData = self
            .execute(
                queries::GET_CART,
                CartVariables {
                    cart_id: cart_id.as_str().to_string(),
                },
            )
            .await?;
        data.cart
            .map(convert_cart)
            .ok_or_else(|| ShopifyError::NotFound(format!("Cart not found: {cart_id}")))
    }

    #[instrument(skip(self, lines), fields(cart_id = %cart_id))]
    async fn add_lines(&self, cart_id: &CartId, lines: Vec<NewLine>) -> Result<Cart, ShopifyError> {
        let data: CartLinesAddData = self
            .execute(
                queries::CART_LINES_ADD,
                CartLinesAddVariables {
                    cart_id: cart_id.as_str().to_string(),
                    lines: lines
                        .into_iter()
                        .map(|line| CartLineInput {
                            merchandise_id: line.merchandise_id.into_inner(),
                            quantity: i64::from(line.quantity),
                        })
                        .collect(),
                },
            )
            .await?;
        Self::cart_from_payload(data.cart_lines_add, "add to cart")
    }

    #[instrument(skip(self), fields(cart_id = %cart_id, line = %line_id))]
    async fn update_line(
        &self,
        cart_id: &CartId,
        line_id: &LineId,
        quantity: u32,
    ) -> Result<Cart, ShopifyError> {
        let data: CartLinesUpdateData = self
            .execute(
                queries::CART_LINES_UPDATE,
                CartLinesUpdateVariables {
                    cart_id: cart_id.as_str().to_string(),
                    lines: vec![CartLineUpdateInput {
                        id: line_id.as_str().to_string(),
                        quantity: i64::from(quantity),
                    }],
                },
            )
            .await?;
        Self::cart_from_payload(data.cart_lines_update, "update cart")
    }

    #[instrument(skip(self, line_ids), fields(cart_id = %cart_id))]
    async fn remove_lines(
        &self,
        cart_id: &CartId,
        line_ids: Vec<LineId>,
    ) -> Result<Cart, ShopifyError> {
        let data: CartLinesRemoveData = self
            .execute(
                queries::CART_LINES_REMOVE,
                CartLinesRemoveVariables {
                    cart_id: cart_id.as_str().to_string(),
                    line_ids: line_ids
                        .into_iter()
                        .map(fernhollow_core::LineId::into_inner)
                        .collect(),
                },
            )
            .await?;
        Self::cart_from_payload(data.cart_lines_remove, "remove from cart")
    }
}

/// Cache key for one products page. Every request field that changes the
/// response participates, including the page size.
fn products_cache_key(request: &PageRequest) -> String {
    format!(
        "products:{}:{}:{}:{}",
        request.page_size,
        request.after.as_deref().unwrap_or(""),
        request.sort_key.as_str(),
        request.reverse,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use fernhollow_core::ProductSortKey;

    fn request(page_size: i64, after: Option<&str>) -> PageRequest {
        PageRequest {
            page_size,
            after: after.map(str::to_string),
            query: None,
            sort_key: ProductSortKey::CreatedAt,
            reverse: true,
        }
    }

    #[test]
    fn products_cache_key_distinguishes_page_sizes() {
        let small = products_cache_key(&request(10, None));
        let large = products_cache_key(&request(20, None));
        assert_ne!(small, large);
    }

    #[test]
    fn products_cache_key_distinguishes_cursors() {
        let first = products_cache_key(&request(20, None));
        let second = products_cache_key(&request(20, Some("c1")));
        assert_ne!(first, second);
    }
}
