//! GraphQL documents and wire types for the Storefront API.
//!
//! The documents are hand-written `const` strings; the matching response
//! shapes are serde structs renamed to the API's camelCase. Monetary
//! amounts and timestamps arrive as strings and stay strings here - the
//! adapters in [`super::conversions`] own all parsing, so a malformed
//! field degrades one product, never a whole page.

use fernhollow_core::ProductSortKey;
use serde::{Deserialize, Serialize};

// =============================================================================
// Request / response envelopes
// =============================================================================

/// The POST body of every GraphQL call.
#[derive(Debug, Serialize)]
pub struct GraphQLRequest<'a, V: Serialize> {
    /// The query document.
    pub query: &'a str,
    /// Operation variables.
    pub variables: V,
}

/// The `{ data, errors }` envelope every response arrives in.
#[derive(Debug, Deserialize)]
pub struct GraphQLResponse<T> {
    /// Operation payload; absent when the request failed outright.
    pub data: Option<T>,
    /// Top-level GraphQL errors.
    pub errors: Option<Vec<WireError>>,
}

/// A GraphQL error as it appears on the wire.
#[derive(Debug, Clone, Deserialize)]
pub struct WireError {
    pub message: String,
    #[serde(default)]
    pub locations: Option<Vec<WireErrorLocation>>,
    #[serde(default)]
    pub path: Option<Vec<serde_json::Value>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireErrorLocation {
    pub line: i64,
    pub column: i64,
}

// =============================================================================
// Shared wire nodes
// =============================================================================

/// Monetary amount with currency code. The amount stays a string to
/// preserve precision until the adapter parses it.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoneyNode {
    pub amount: String,
    pub currency_code: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageNode {
    #[serde(default)]
    pub id: Option<String>,
    pub url: String,
    #[serde(default)]
    pub alt_text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedOptionNode {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfoNode {
    pub has_next_page: bool,
    pub has_previous_page: bool,
    #[serde(default)]
    pub end_cursor: Option<String>,
}

// =============================================================================
// Product wire nodes
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantNode {
    pub id: String,
    pub title: String,
    pub available_for_sale: bool,
    #[serde(default)]
    pub quantity_available: Option<i64>,
    #[serde(default)]
    pub sku: Option<String>,
    pub price: MoneyNode,
    #[serde(default)]
    pub compare_at_price: Option<MoneyNode>,
    #[serde(default)]
    pub selected_options: Vec<SelectedOptionNode>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductNode {
    pub id: String,
    pub handle: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub product_type: String,
    #[serde(default)]
    pub vendor: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub available_for_sale: bool,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub featured_image: Option<ImageNode>,
    #[serde(default)]
    pub images: Nodes<ImageNode>,
    #[serde(default)]
    pub variants: Nodes<VariantNode>,
    #[serde(default)]
    pub collections: Nodes<HandleNode>,
}

/// A nested connection fetched via `nodes { ... }`.
#[derive(Debug, Clone, Deserialize)]
pub struct Nodes<T> {
    pub nodes: Vec<T>,
}

impl<T> Default for Nodes<T> {
    fn default() -> Self {
        Self { nodes: Vec::new() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HandleNode {
    pub handle: String,
}

/// A top-level paginated connection: ordered `{ node, cursor }` pairs
/// plus page info.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductConnection {
    pub edges: Vec<ProductEdge>,
    pub page_info: PageInfoNode,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProductEdge {
    pub cursor: String,
    pub node: ProductNode,
}

// =============================================================================
// Collection wire nodes
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionNode {
    pub id: String,
    pub handle: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: Option<ImageNode>,
    #[serde(default)]
    pub products: Option<ProductConnection>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionConnection {
    pub edges: Vec<CollectionEdge>,
    pub page_info: PageInfoNode,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CollectionEdge {
    pub cursor: String,
    pub node: CollectionNode,
}

// =============================================================================
// Cart wire nodes
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartNode {
    pub id: String,
    pub checkout_url: String,
    pub total_quantity: i64,
    pub cost: CartCostNode,
    pub lines: Nodes<CartLineNode>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartCostNode {
    pub subtotal_amount: MoneyNode,
    pub total_amount: MoneyNode,
    #[serde(default)]
    pub total_tax_amount: Option<MoneyNode>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineNode {
    pub id: String,
    pub quantity: i64,
    pub cost: CartLineCostNode,
    pub merchandise: MerchandiseNode,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineCostNode {
    pub amount_per_quantity: MoneyNode,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MerchandiseNode {
    pub id: String,
    pub title: String,
    pub product: MerchandiseProductNode,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MerchandiseProductNode {
    pub id: String,
    pub title: String,
}

/// User error from cart mutations (validation failures alongside a
/// successful HTTP response).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartUserErrorNode {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub field: Option<Vec<String>>,
    pub message: String,
}

/// The `{ cart, userErrors }` payload shared by all cart mutations.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartMutationPayload {
    #[serde(default)]
    pub cart: Option<CartNode>,
    #[serde(default)]
    pub user_errors: Vec<CartUserErrorNode>,
}

// =============================================================================
// Operation data envelopes
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct ProductsData {
    pub products: ProductConnection,
}

#[derive(Debug, Deserialize)]
pub struct ProductByHandleData {
    pub product: Option<ProductNode>,
}

#[derive(Debug, Deserialize)]
pub struct CollectionsData {
    pub collections: CollectionConnection,
}

#[derive(Debug, Deserialize)]
pub struct CollectionByHandleData {
    pub collection: Option<CollectionNode>,
}

#[derive(Debug, Deserialize)]
pub struct CartData {
    pub cart: Option<CartNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartCreateData {
    pub cart_create: Option<CartMutationPayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLinesAddData {
    pub cart_lines_add: Option<CartMutationPayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLinesUpdateData {
    pub cart_lines_update: Option<CartMutationPayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLinesRemoveData {
    pub cart_lines_remove: Option<CartMutationPayload>,
}

// =============================================================================
// Operation variables
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductsVariables {
    pub first: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    pub sort_key: ProductSortKey,
    pub reverse: bool,
}

#[derive(Debug, Serialize)]
pub struct ProductByHandleVariables {
    pub handle: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionsVariables {
    pub first: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionByHandleVariables {
    pub handle: String,
    pub first: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartVariables {
    pub cart_id: String,
}

#[derive(Debug, Serialize)]
pub struct CartCreateVariables {
    pub input: CartInput,
}

#[derive(Debug, Default, Serialize)]
pub struct CartInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lines: Option<Vec<CartLineInput>>,
}

/// Input for adding a line to a cart.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineInput {
    /// Product variant ID.
    pub merchandise_id: String,
    /// Quantity to add.
    pub quantity: i64,
}

/// Input for updating a cart line.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineUpdateInput {
    /// Cart line ID.
    pub id: String,
    /// New quantity.
    pub quantity: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLinesAddVariables {
    pub cart_id: String,
    pub lines: Vec<CartLineInput>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLinesUpdateVariables {
    pub cart_id: String,
    pub lines: Vec<CartLineUpdateInput>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLinesRemoveVariables {
    pub cart_id: String,
    pub line_ids: Vec<String>,
}

// =============================================================================
// Documents
// =============================================================================

macro_rules! product_fields {
    () => {
        r"fragment ProductFields on Product {
  id
  handle
  title
  description
  productType
  vendor
  tags
  availableForSale
  createdAt
  updatedAt
  featuredImage {
    id
    url
    altText
  }
  images(first: 10) {
    nodes {
      id
      url
      altText
    }
  }
  variants(first: 50) {
    nodes {
      id
      title
      availableForSale
      quantityAvailable
      sku
      price {
        amount
        currencyCode
      }
      compareAtPrice {
        amount
        currencyCode
      }
      selectedOptions {
        name
        value
      }
    }
  }
  collections(first: 10) {
    nodes {
      handle
    }
  }
}"
    };
}

macro_rules! cart_fields {
    () => {
        r"fragment CartFields on Cart {
  id
  checkoutUrl
  totalQuantity
  cost {
    subtotalAmount {
      amount
      currencyCode
    }
    totalAmount {
      amount
      currencyCode
    }
    totalTaxAmount {
      amount
      currencyCode
    }
  }
  lines(first: 100) {
    nodes {
      id
      quantity
      cost {
        amountPerQuantity {
          amount
          currencyCode
        }
      }
      merchandise {
        ... on ProductVariant {
          id
          title
          product {
            id
            title
          }
        }
      }
    }
  }
}"
    };
}

pub const GET_PRODUCTS: &str = concat!(
    r"query GetProducts($first: Int!, $after: String, $query: String, $sortKey: ProductSortKeys, $reverse: Boolean) {
  products(first: $first, after: $after, query: $query, sortKey: $sortKey, reverse: $reverse) {
    edges {
      cursor
      node {
        ...ProductFields
      }
    }
    pageInfo {
      hasNextPage
      hasPreviousPage
      endCursor
    }
  }
}
",
    product_fields!()
);

pub const GET_PRODUCT_BY_HANDLE: &str = concat!(
    r"query GetProductByHandle($handle: String!) {
  product(handle: $handle) {
    ...ProductFields
  }
}
",
    product_fields!()
);

pub const GET_COLLECTIONS: &str = r"query GetCollections($first: Int!, $after: String) {
  collections(first: $first, after: $after) {
    edges {
      cursor
      node {
        id
        handle
        title
        description
        image {
          id
          url
          altText
        }
      }
    }
    pageInfo {
      hasNextPage
      hasPreviousPage
      endCursor
    }
  }
}
";

pub const GET_COLLECTION_BY_HANDLE: &str = concat!(
    r"query GetCollectionByHandle($handle: String!, $first: Int!) {
  collection(handle: $handle) {
    id
    handle
    title
    description
    image {
      id
      url
      altText
    }
    products(first: $first) {
      edges {
        cursor
        node {
          ...ProductFields
        }
      }
      pageInfo {
        hasNextPage
        hasPreviousPage
        endCursor
      }
    }
  }
}
",
    product_fields!()
);

pub const GET_CART: &str = concat!(
    r"query GetCart($cartId: ID!) {
  cart(id: $cartId) {
    ...CartFields
  }
}
",
    cart_fields!()
);

pub const CART_CREATE: &str = concat!(
    r"mutation CartCreate($input: CartInput!) {
  cartCreate(input: $input) {
    cart {
      ...CartFields
    }
    userErrors {
      code
      field
      message
    }
  }
}
",
    cart_fields!()
);

pub const CART_LINES_ADD: &str = concat!(
    r"mutation CartLinesAdd($cartId: ID!, $lines: [CartLineInput!]!) {
  cartLinesAdd(cartId: $cartId, lines: $lines) {
    cart {
      ...CartFields
    }
    userErrors {
      code
      field
      message
    }
  }
}
",
    cart_fields!()
);

pub const CART_LINES_UPDATE: &str = concat!(
    r"mutation CartLinesUpdate($cartId: ID!, $lines: [CartLineUpdateInput!]!) {
  cartLinesUpdate(cartId: $cartId, lines: $lines) {
    cart {
      ...CartFields
    }
    userErrors {
      code
      field
      message
    }
  }
}
",
    cart_fields!()
);

pub const CART_LINES_REMOVE: &str = concat!(
    r"mutation CartLinesRemove($cartId: ID!, $lineIds: [ID!]!) {
  cartLinesRemove(cartId: $cartId, lineIds: $lineIds) {
    cart {
      ...CartFields
    }
    userErrors {
      code
      field
      message
    }
  }
}
",
    cart_fields!()
);
