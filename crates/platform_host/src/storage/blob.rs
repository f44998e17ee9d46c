//! Key-value blob storage contracts and adapters.

use std::{cell::RefCell, collections::HashMap, future::Future, pin::Pin, rc::Rc};

use serde::{de::DeserializeOwned, Serialize};

/// Object-safe boxed future used by [`KvStore`] async methods.
pub type KvStoreFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Host service for string blobs stored per key (JSON text by convention).
pub trait KvStore {
    /// Loads the raw blob stored under `key`.
    fn load_blob<'a>(&'a self, key: &'a str) -> KvStoreFuture<'a, Result<Option<String>, String>>;

    /// Replaces the blob stored under `key`.
    fn save_blob<'a>(&'a self, key: &'a str, raw: &'a str)
        -> KvStoreFuture<'a, Result<(), String>>;

    /// Deletes the blob stored under `key`.
    fn delete_blob<'a>(&'a self, key: &'a str) -> KvStoreFuture<'a, Result<(), String>>;
}

#[derive(Debug, Clone, Copy, Default)]
/// Store that keeps nothing, for hosts without persistence.
pub struct NoopKvStore;

impl KvStore for NoopKvStore {
    fn load_blob<'a>(&'a self, _key: &'a str) -> KvStoreFuture<'a, Result<Option<String>, String>> {
        Box::pin(async { Ok(None) })
    }

    fn save_blob<'a>(
        &'a self,
        _key: &'a str,
        _raw: &'a str,
    ) -> KvStoreFuture<'a, Result<(), String>> {
        Box::pin(async { Ok(()) })
    }

    fn delete_blob<'a>(&'a self, _key: &'a str) -> KvStoreFuture<'a, Result<(), String>> {
        Box::pin(async { Ok(()) })
    }
}

#[derive(Debug, Default)]
struct MemoryKvInner {
    blobs: HashMap<String, String>,
    writes: HashMap<String, usize>,
}

#[derive(Debug, Clone, Default)]
/// In-memory store keyed by string. Clones share the same backing map.
pub struct MemoryKvStore {
    inner: Rc<RefCell<MemoryKvInner>>,
}

impl MemoryKvStore {
    /// Returns the blob currently stored under `key` without going through the async API.
    pub fn peek(&self, key: &str) -> Option<String> {
        self.inner.borrow().blobs.get(key).cloned()
    }

    /// Seeds `key` with `raw` without counting it as a write.
    pub fn seed(&self, key: impl Into<String>, raw: impl Into<String>) {
        self.inner.borrow_mut().blobs.insert(key.into(), raw.into());
    }

    /// Number of successful `save_blob` calls made for `key`.
    pub fn write_count(&self, key: &str) -> usize {
        self.inner.borrow().writes.get(key).copied().unwrap_or(0)
    }

    /// Total number of `save_blob` calls across all keys.
    pub fn total_writes(&self) -> usize {
        self.inner.borrow().writes.values().sum()
    }

    /// Sorted list of keys currently holding a blob.
    pub fn keys(&self) -> Vec<String> {
        let mut keys = self.inner.borrow().blobs.keys().cloned().collect::<Vec<_>>();
        keys.sort();
        keys
    }
}

impl KvStore for MemoryKvStore {
    fn load_blob<'a>(&'a self, key: &'a str) -> KvStoreFuture<'a, Result<Option<String>, String>> {
        Box::pin(async move { Ok(self.peek(key)) })
    }

    fn save_blob<'a>(
        &'a self,
        key: &'a str,
        raw: &'a str,
    ) -> KvStoreFuture<'a, Result<(), String>> {
        Box::pin(async move {
            let mut inner = self.inner.borrow_mut();
            inner.blobs.insert(key.to_string(), raw.to_string());
            *inner.writes.entry(key.to_string()).or_insert(0) += 1;
            Ok(())
        })
    }

    fn delete_blob<'a>(&'a self, key: &'a str) -> KvStoreFuture<'a, Result<(), String>> {
        Box::pin(async move {
            self.inner.borrow_mut().blobs.remove(key);
            Ok(())
        })
    }
}

/// Loads and deserializes a typed value through a [`KvStore`] implementation.
///
/// # Errors
///
/// Returns an error when the store read or JSON deserialization fails.
pub async fn load_typed_with<S: KvStore + ?Sized, T: DeserializeOwned>(
    store: &S,
    key: &str,
) -> Result<Option<T>, String> {
    let Some(raw) = store.load_blob(key).await? else {
        return Ok(None);
    };
    let value = serde_json::from_str(&raw).map_err(|e| e.to_string())?;
    Ok(Some(value))
}

/// Serializes and saves a typed value through a [`KvStore`] implementation.
///
/// # Errors
///
/// Returns an error when serialization or the store write fails.
pub async fn save_typed_with<S: KvStore + ?Sized, T: Serialize + ?Sized>(
    store: &S,
    key: &str,
    value: &T,
) -> Result<(), String> {
    let raw = serde_json::to_string(value).map_err(|e| e.to_string())?;
    store.save_blob(key, &raw).await
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;
    use serde::{Deserialize, Serialize};

    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Layout {
        windows: Vec<String>,
    }

    #[test]
    fn memory_store_round_trip_counts_writes() {
        let store = MemoryKvStore::default();
        let store_obj: &dyn KvStore = &store;

        block_on(store_obj.save_blob("desk", "{\"windows\":[]}")).expect("save");
        block_on(store_obj.save_blob("desk", "{\"windows\":[\"a\"]}")).expect("save");
        assert_eq!(
            block_on(store_obj.load_blob("desk")).expect("load"),
            Some("{\"windows\":[\"a\"]}".to_string())
        );
        assert_eq!(store.write_count("desk"), 2);
        assert_eq!(store.write_count("other"), 0);

        block_on(store_obj.delete_blob("desk")).expect("delete");
        assert_eq!(block_on(store_obj.load_blob("desk")).expect("load"), None);
    }

    #[test]
    fn clones_share_backing_map() {
        let store = MemoryKvStore::default();
        let clone = store.clone();
        store.seed("identity", "\"ada\"");
        assert_eq!(clone.peek("identity"), Some("\"ada\"".to_string()));
        assert_eq!(clone.total_writes(), 0);
        assert_eq!(clone.keys(), vec!["identity".to_string()]);
    }

    #[test]
    fn typed_helpers_round_trip_and_report_decode_errors() {
        let store = MemoryKvStore::default();
        block_on(save_typed_with(
            &store,
            "layout",
            &Layout {
                windows: vec!["w1".to_string()],
            },
        ))
        .expect("save typed");
        let loaded: Option<Layout> = block_on(load_typed_with(&store, "layout")).expect("load");
        assert_eq!(
            loaded,
            Some(Layout {
                windows: vec!["w1".to_string()]
            })
        );

        store.seed("broken", "{not json");
        let broken: Result<Option<Layout>, String> = block_on(load_typed_with(&store, "broken"));
        assert!(broken.is_err());
    }

    #[test]
    fn noop_store_is_empty_and_successful() {
        let store = NoopKvStore;
        assert_eq!(block_on(store.load_blob("k")).expect("load"), None);
        block_on(store.save_blob("k", "{}")).expect("save");
        block_on(store.delete_blob("k")).expect("delete");
    }
}
