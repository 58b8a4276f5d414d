//! Forward-only cursor pagination over the product catalog.
//!
//! [`ProductPager`] tracks the end cursor and `hasNextPage` flag from the
//! backend and gives exactly two load shapes: a first-page fetch that
//! replaces the product list wholesale, and a load-more that appends in
//! cursor order. Pages are never reordered or merged.
//!
//! Two guards keep concurrent calls honest: an atomic in-flight flag makes
//! overlapping `load_more` calls a no-op, and a generation counter makes a
//! superseded first-page response land in the void instead of overwriting
//! a newer one.

use std::future::Future;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use fernhollow_core::Product;
use tracing::{debug, instrument};

use crate::query::{self, QuerySelection};
use crate::shopify::ShopifyError;

/// One catalog page request, in the backend's terms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    /// Page size.
    pub page_size: i64,
    /// Cursor to resume after, `None` for the first page.
    pub after: Option<String>,
    /// Compiled query string.
    pub query: Option<String>,
    /// Backend sort key.
    pub sort_key: fernhollow_core::ProductSortKey,
    /// Whether the sort is reversed.
    pub reverse: bool,
}

/// One adapted catalog page.
#[derive(Debug, Clone, Default)]
pub struct CatalogPage {
    /// Canonical products in backend order.
    pub products: Vec<Product>,
    /// Whether more pages follow.
    pub has_next_page: bool,
    /// Cursor of the last item, to resume from.
    pub end_cursor: Option<String>,
}

/// Anything that can serve catalog pages.
///
/// Implemented by [`crate::shopify::StorefrontClient`] and by in-memory
/// fakes in tests.
pub trait CatalogSource: Send + Sync {
    /// Fetch one page.
    fn fetch_page(
        &self,
        request: &PageRequest,
    ) -> impl Future<Output = Result<CatalogPage, ShopifyError>> + Send;
}

/// Outcome of a [`ProductPager::load_more`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadMore {
    /// A page was fetched and appended; carries the number of new products.
    Appended(usize),
    /// Nothing happened: no cursor, no next page, a load already in
    /// flight, or the response arrived after a newer first-page fetch.
    Skipped,
}

#[derive(Debug, Default)]
struct PagerState {
    products: Vec<Product>,
    end_cursor: Option<String>,
    has_next_page: bool,
    selection: QuerySelection,
    /// Generation of the first-page fetch that installed this snapshot.
    generation: u64,
}

/// Cursor pagination manager.
pub struct ProductPager<S: CatalogSource> {
    source: S,
    page_size: i64,
    state: Mutex<PagerState>,
    generation: AtomicU64,
    load_in_flight: AtomicBool,
}

impl<S: CatalogSource> ProductPager<S> {
    /// Create a pager over `source`.
    pub fn new(source: S, page_size: i64) -> Self {
        Self {
            source,
            page_size,
            state: Mutex::new(PagerState::default()),
            generation: AtomicU64::new(0),
            load_in_flight: AtomicBool::new(false),
        }
    }

    /// Fetch the first page for a new selection, replacing the product
    /// list wholesale and discarding any held cursor.
    ///
    /// If another first-page fetch starts while this one is in flight,
    /// this one's response is discarded when it arrives - the newer
    /// request wins.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fetch fails; held state is left
    /// untouched in that case.
    #[instrument(skip(self, selection))]
    pub async fn fetch_first(&self, selection: QuerySelection) -> Result<(), ShopifyError> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let request = self.request_for(&selection, None);

        let page = self.source.fetch_page(&request).await?;

        if self.generation.load(Ordering::SeqCst) != generation {
            debug!(generation, "discarding superseded first-page response");
            return Ok(());
        }

        let mut state = self.lock_state();
        state.products = page.products;
        state.end_cursor = page.end_cursor;
        state.has_next_page = page.has_next_page;
        state.selection = selection;
        state.generation = generation;
        Ok(())
    }

    /// Append the next page, if there is one and nothing else is loading.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fetch fails; held state is left
    /// untouched in that case.
    #[instrument(skip(self))]
    pub async fn load_more(&self) -> Result<LoadMore, ShopifyError> {
        let (request, generation) = {
            let state = self.lock_state();
            if !state.has_next_page {
                return Ok(LoadMore::Skipped);
            }
            let Some(cursor) = state.end_cursor.clone() else {
                return Ok(LoadMore::Skipped);
            };
            if self.load_in_flight.swap(true, Ordering::SeqCst) {
                return Ok(LoadMore::Skipped);
            }
            // Tie this load to the snapshot it read, not the live counter:
            // a first-page fetch for a newer selection may already be in
            // flight and have bumped the counter past this snapshot.
            (
                self.request_for(&state.selection, Some(cursor)),
                state.generation,
            )
        };

        let result = self.source.fetch_page(&request).await;
        let page = match result {
            Ok(page) => page,
            Err(e) => {
                self.load_in_flight.store(false, Ordering::SeqCst);
                return Err(e);
            }
        };

        let mut state = self.lock_state();
        self.load_in_flight.store(false, Ordering::SeqCst);
        if self.generation.load(Ordering::SeqCst) != generation {
            debug!("discarding load-more response from a superseded selection");
            return Ok(LoadMore::Skipped);
        }

        let appended = page.products.len();
        state.products.extend(page.products);
        state.end_cursor = page.end_cursor;
        state.has_next_page = page.has_next_page;
        Ok(LoadMore::Appended(appended))
    }

    /// Clear the cursor and re-run a first-page fetch under the current
    /// selection.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fetch fails.
    pub async fn refetch(&self) -> Result<(), ShopifyError> {
        let selection = self.lock_state().selection.clone();
        self.fetch_first(selection).await
    }

    /// The currently loaded products, in load order.
    #[must_use]
    pub fn products(&self) -> Vec<Product> {
        self.lock_state().products.clone()
    }

    /// Whether the backend reported more pages.
    #[must_use]
    pub fn has_next_page(&self) -> bool {
        self.lock_state().has_next_page
    }

    fn request_for(&self, selection: &QuerySelection, after: Option<String>) -> PageRequest {
        let compiled = query::compile(selection);
        PageRequest {
            page_size: self.page_size,
            after,
            query: compiled.query,
            sort_key: compiled.sort_key,
            reverse: compiled.reverse,
        }
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, PagerState> {
        // A panic while holding the lock is unrecoverable anyway; take
        // the data as it was.
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
