//! Injectable key-value store for durable local state.
//!
//! The core keeps exactly two durable values: the active cart identifier
//! and the recent-search list. Rather than ambient global state, both go
//! through a [`StateStore`] injected at construction time - in-memory for
//! tests, a JSON file for production.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use thiserror::Error;

/// Durable key for the active cart identifier.
pub const CART_ID_KEY: &str = "fernhollow.cart_id";

/// Durable key for the recent-search list (JSON-encoded array).
pub const RECENT_SEARCHES_KEY: &str = "fernhollow.recent_searches";

/// Errors from the state store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing the backing file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The backing file holds invalid JSON.
    #[error("corrupt store: {0}")]
    Corrupt(#[from] serde_json::Error),

    /// An internal lock was poisoned.
    #[error("store lock poisoned")]
    Poisoned,
}

/// A process-wide store for small string values.
///
/// Implementations must be safe to share across tasks; callers read once
/// at startup and write on the rare state transition (cart created,
/// search recorded), so contention is not a concern.
pub trait StateStore: Send + Sync {
    /// Read a value.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write a value.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Remove a value. Removing an absent key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be written.
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// In-memory store for tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    /// Create an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let values = self.values.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut values = self.values.lock().map_err(|_| StoreError::Poisoned)?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut values = self.values.lock().map_err(|_| StoreError::Poisoned)?;
        values.remove(key);
        Ok(())
    }
}

/// File-backed store holding one JSON object.
///
/// Writes go through a temp file and an atomic rename so a crash mid-write
/// never corrupts the previous state.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    values: Mutex<HashMap<String, String>>,
}

impl JsonFileStore {
    /// Open a store at `path`, loading existing state if the file exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let values = match std::fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self {
            path,
            values: Mutex::new(values),
        })
    }

    fn persist(&self, values: &HashMap<String, String>) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(values)?;
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl StateStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let values = self.values.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut values = self.values.lock().map_err(|_| StoreError::Poisoned)?;
        values.insert(key.to_string(), value.to_string());
        self.persist(&values)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut values = self.values.lock().map_err(|_| StoreError::Poisoned)?;
        if values.remove(key).is_some() {
            self.persist(&values)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_round_trip() {
        let store = MemoryStore::new();
        assert_eq!(store.get(CART_ID_KEY).expect("get"), None);

        store.set(CART_ID_KEY, "gid://shopify/Cart/1").expect("set");
        assert_eq!(
            store.get(CART_ID_KEY).expect("get"),
            Some("gid://shopify/Cart/1".to_string())
        );

        store.remove(CART_ID_KEY).expect("remove");
        assert_eq!(store.get(CART_ID_KEY).expect("get"), None);
        // removing again is fine
        store.remove(CART_ID_KEY).expect("remove absent");
    }

    #[test]
    fn json_file_store_survives_reopen() {
        let path = std::env::temp_dir().join(format!(
            "fernhollow-store-test-{}.json",
            std::process::id()
        ));
        let _ = std::fs::remove_file(&path);

        {
            let store = JsonFileStore::open(&path).expect("open fresh");
            store.set(RECENT_SEARCHES_KEY, "[\"hoodie\"]").expect("set");
        }

        let reopened = JsonFileStore::open(&path).expect("reopen");
        assert_eq!(
            reopened.get(RECENT_SEARCHES_KEY).expect("get"),
            Some("[\"hoodie\"]".to_string())
        );

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn json_file_store_rejects_corrupt_file() {
        let path = std::env::temp_dir().join(format!(
            "fernhollow-store-corrupt-{}.json",
            std::process::id()
        ));
        std::fs::write(&path, "not json").expect("write");
        assert!(matches!(
            JsonFileStore::open(&path),
            Err(StoreError::Corrupt(_))
        ));
        let _ = std::fs::remove_file(&path);
    }
}
