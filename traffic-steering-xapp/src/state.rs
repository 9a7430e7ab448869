use crate::models::{A1Policy, CellMetrics};
use dashmap::DashMap;
use std::collections::BTreeMap;

/// Last-value store keyed by string id. Sharded, so writers only contend
/// with readers of the same shard.
pub struct KeyedStore<V> {
    entries: DashMap<String, V>,
}

impl<V> Default for KeyedStore<V> {
    fn default() -> Self {
        Self { entries: DashMap::new() }
    }
}

impl<V: Clone> KeyedStore<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces; returns the previous value.
    pub fn upsert(&self, key: String, value: V) -> Option<V> {
        self.entries.insert(key, value)
    }

    pub fn get(&self, key: &str) -> Option<V> {
        self.entries.get(key).map(|e| e.value().clone())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Ordered copy of the whole store.
    pub fn snapshot(&self) -> BTreeMap<String, V> {
        self.entries
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect()
    }
}

pub type MetricsStore = KeyedStore<CellMetrics>;
pub type PolicyStore = KeyedStore<A1Policy>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upsert_overwrites() {
        let store: KeyedStore<u32> = KeyedStore::new();
        assert!(store.is_empty());
        assert_eq!(store.upsert("a".into(), 1), None);
        assert_eq!(store.upsert("a".into(), 2), Some(1));
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("a"), Some(2));
        assert_eq!(store.get("b"), None);
    }

    #[test]
    fn test_concurrent_writers_snapshot_in_key_order() {
        let store: KeyedStore<u32> = KeyedStore::new();
        std::thread::scope(|s| {
            for t in 0..4u32 {
                let store = &store;
                s.spawn(move || {
                    for i in 0..25u32 {
                        store.upsert(format!("cell-{:03}", t * 25 + i), t);
                    }
                });
            }
        });
        let keys: Vec<_> = store.snapshot().into_keys().collect();
        assert_eq!(keys.len(), 100);
        assert_eq!(keys.first().map(String::as_str), Some("cell-000"));
        assert_eq!(keys.last().map(String::as_str), Some("cell-099"));
        assert!(keys.windows(2).all(|w| w[0] < w[1]));
    }
}
