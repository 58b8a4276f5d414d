//! Debounced product search and suggestions.
//!
//! Matching is a case-insensitive substring scan over name, description,
//! and tags. Calls are debounced with a generation counter: each call bumps
//! the generation, sleeps, and only computes if no newer call arrived in
//! the meantime. A superseded call returns `None` without computing.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use fernhollow_core::Product;
use tracing::{debug, instrument, warn};

use crate::store::{RECENT_SEARCHES_KEY, StateStore, StoreError};

/// Delay before a query is executed.
pub const DEBOUNCE: Duration = Duration::from_millis(300);

/// Maximum number of suggestions returned.
pub const SUGGESTION_LIMIT: usize = 5;

/// Maximum number of recent queries remembered.
pub const RECENT_LIMIT: usize = 5;

/// Search over an in-memory product set, with debouncing and a bounded
/// recent-query memory persisted through the state store.
pub struct SearchEngine {
    products: Vec<Product>,
    store: Arc<dyn StateStore>,
    generation: AtomicU64,
    recent: Mutex<Vec<String>>,
    results: Mutex<Vec<Product>>,
    suggestions: Mutex<Vec<String>>,
}

impl SearchEngine {
    /// Create an engine over a product set, restoring recent queries from
    /// the store. A missing or corrupt stored list starts empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub fn new(products: Vec<Product>, store: Arc<dyn StateStore>) -> Result<Self, StoreError> {
        let recent = match store.get(RECENT_SEARCHES_KEY)? {
            Some(raw) => match serde_json::from_str::<Vec<String>>(&raw) {
                Ok(list) => list,
                Err(error) => {
                    warn!(%error, "Stored recent searches are corrupt, starting empty");
                    Vec::new()
                }
            },
            None => Vec::new(),
        };

        Ok(Self {
            products,
            store,
            generation: AtomicU64::new(0),
            recent: Mutex::new(recent),
            results: Mutex::new(Vec::new()),
            suggestions: Mutex::new(Vec::new()),
        })
    }

    /// Suggest up to [`SUGGESTION_LIMIT`] product names matching the query.
    ///
    /// Returns `None` when a newer call superseded this one during the
    /// debounce window.
    #[instrument(skip(self))]
    pub async fn suggest(&self, query: &str) -> Option<Vec<String>> {
        self.debounced(query).await?;

        let suggestions: Vec<String> = self
            .matches(query)
            .map(|p| p.name.clone())
            .take(SUGGESTION_LIMIT)
            .collect();

        *lock(&self.suggestions) = suggestions.clone();
        Some(suggestions)
    }

    /// Run a full search, returning every matching product.
    ///
    /// Returns `None` when a newer call superseded this one during the
    /// debounce window.
    #[instrument(skip(self))]
    pub async fn search(&self, query: &str) -> Option<Vec<Product>> {
        self.debounced(query).await?;

        let results: Vec<Product> = self.matches(query).cloned().collect();

        *lock(&self.results) = results.clone();
        Some(results)
    }

    /// The last computed result set.
    #[must_use]
    pub fn results(&self) -> Vec<Product> {
        lock(&self.results).clone()
    }

    /// The last computed suggestions.
    #[must_use]
    pub fn suggestions(&self) -> Vec<String> {
        lock(&self.suggestions).clone()
    }

    /// Record a submitted query in the recent list: distinct entries,
    /// most recent first, capped at [`RECENT_LIMIT`], persisted through
    /// the store. Blank queries are not recorded.
    ///
    /// # Errors
    ///
    /// Returns an error if persisting the list fails.
    pub fn record_query(&self, query: &str) -> Result<(), StoreError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(());
        }

        let encoded = {
            let mut recent = lock(&self.recent);
            recent.retain(|q| q != query);
            recent.insert(0, query.to_string());
            recent.truncate(RECENT_LIMIT);
            serde_json::to_string(&*recent)?
        };

        self.store.set(RECENT_SEARCHES_KEY, &encoded)
    }

    /// Recent queries, most recent first.
    #[must_use]
    pub fn recent_queries(&self) -> Vec<String> {
        lock(&self.recent).clone()
    }

    /// Cancel any pending debounced call and drop derived state. Recent
    /// queries are kept.
    pub fn clear(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        lock(&self.results).clear();
        lock(&self.suggestions).clear();
    }

    /// Sleep out the debounce window. Returns `None` if a newer call
    /// arrived while sleeping.
    async fn debounced(&self, query: &str) -> Option<()> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        tokio::time::sleep(DEBOUNCE).await;
        if self.generation.load(Ordering::SeqCst) != generation {
            debug!(query, "Superseded during debounce, skipping");
            return None;
        }
        Some(())
    }

    fn matches<'a>(&'a self, query: &str) -> impl Iterator<Item = &'a Product> {
        let needle = query.trim().to_lowercase();
        self.products.iter().filter(move |product| {
            !needle.is_empty()
                && (product.name.to_lowercase().contains(&needle)
                    || product.description.to_lowercase().contains(&needle)
                    || product
                        .tags
                        .iter()
                        .any(|tag| tag.to_lowercase().contains(&needle)))
        })
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use fernhollow_core::{Category, Product, ProductId};
    use rust_decimal_macros::dec;

    fn product(id: &str, name: &str, description: &str, tags: &[&str]) -> Product {
        Product {
            id: ProductId::new(id),
            handle: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            short_description: String::new(),
            category: Category::Gifts,
            price: dec!(10.00),
            sale_price: None,
            images: vec![],
            variants: vec![],
            in_stock: true,
            stock_count: 5,
            featured: false,
            tags: tags.iter().map(ToString::to_string).collect(),
            attributes: None,
            created_at: None,
            updated_at: None,
            collections: vec![],
            vendor: "Fern Hollow".to_string(),
            product_type: "Gift".to_string(),
        }
    }

    fn catalog() -> Vec<Product> {
        vec![
            product("1", "Graphic Hoodie", "A warm hoodie.", &["apparel"]),
            product("2", "Resident Plush", "Soft plush goat.", &["plush", "gifts"]),
            product("3", "Sanctuary Calendar", "Twelve months of goats.", &["books"]),
            product("4", "Goat Socks", "Cozy socks.", &["apparel"]),
            product("5", "Barn Tote", "Canvas tote.", &["accessories"]),
            product("6", "Goat Pin", "Enamel pin.", &["accessories"]),
            product("7", "Goat Journal", "Lined journal.", &["books"]),
        ]
    }

    fn engine() -> Arc<SearchEngine> {
        let store = Arc::new(MemoryStore::new());
        Arc::new(SearchEngine::new(catalog(), store).expect("engine"))
    }

    #[tokio::test(start_paused = true)]
    async fn matching_is_case_insensitive_across_fields() {
        let engine = engine();

        let by_name = engine.search("HOODIE").await.expect("not superseded");
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].name, "Graphic Hoodie");

        let by_description = engine.search("goats").await.expect("not superseded");
        assert_eq!(by_description.len(), 1);
        assert_eq!(by_description[0].name, "Sanctuary Calendar");

        let by_tag = engine.search("plush").await.expect("not superseded");
        assert_eq!(by_tag.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn suggestions_are_capped() {
        let engine = engine();
        let suggestions = engine.suggest("goat").await.expect("not superseded");
        assert!(suggestions.len() <= SUGGESTION_LIMIT);
        assert!(suggestions.contains(&"Goat Socks".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn superseded_call_returns_none() {
        let engine = engine();

        let first = {
            let engine = Arc::clone(&engine);
            tokio::spawn(async move { engine.suggest("hoo").await })
        };
        tokio::task::yield_now().await;

        let second = engine.suggest("hoodie").await;

        assert_eq!(first.await.expect("join"), None);
        let suggestions = second.expect("not superseded");
        assert_eq!(suggestions, vec!["Graphic Hoodie".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn clear_cancels_pending_and_drops_derived_state() {
        let engine = engine();

        engine.search("goat").await.expect("not superseded");
        assert!(!engine.results().is_empty());

        let pending = {
            let engine = Arc::clone(&engine);
            tokio::spawn(async move { engine.search("hoodie").await })
        };
        tokio::task::yield_now().await;

        engine.clear();
        assert!(engine.results().is_empty());
        assert!(engine.suggestions().is_empty());
        assert_eq!(pending.await.expect("join"), None);
    }

    #[tokio::test(start_paused = true)]
    async fn blank_search_matches_nothing() {
        let engine = engine();
        let results = engine.search("   ").await.expect("not superseded");
        assert!(results.is_empty());
    }

    #[test]
    fn recent_queries_stay_distinct_capped_and_mru_first() {
        let store = Arc::new(MemoryStore::new());
        let engine =
            SearchEngine::new(catalog(), Arc::clone(&store) as Arc<dyn StateStore>).expect("engine");

        for query in ["hoodie", "plush", "socks", "tote", "pin", "journal"] {
            engine.record_query(query).expect("record");
        }
        engine.record_query("plush").expect("record");
        engine.record_query("  ").expect("record");

        assert_eq!(
            engine.recent_queries(),
            vec!["plush", "journal", "pin", "tote", "socks"]
        );

        // A fresh engine over the same store restores the list.
        let reopened =
            SearchEngine::new(catalog(), Arc::clone(&store) as Arc<dyn StateStore>).expect("engine");
        assert_eq!(
            reopened.recent_queries(),
            vec!["plush", "journal", "pin", "tote", "socks"]
        );
    }

    #[test]
    fn corrupt_stored_recent_list_starts_empty() {
        let store = Arc::new(MemoryStore::new());
        store.set(RECENT_SEARCHES_KEY, "not json").expect("set");
        let engine =
            SearchEngine::new(catalog(), Arc::clone(&store) as Arc<dyn StateStore>).expect("engine");
        assert!(engine.recent_queries().is_empty());
    }
}
