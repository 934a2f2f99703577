//! Keyed query store shared by the two phases of one preprocessor instance.

use std::collections::HashMap;

use crate::extract::QueryMap;

/// Document identity key → the document's queries.
///
/// Entries are overwritten on every markup pass and are never purged on their
/// own; hosts that rebuild incrementally call [`QueryStore::evict`] when a
/// document disappears.
#[derive(Debug, Clone, Default)]
pub struct QueryStore {
    entries: HashMap<String, QueryMap>,
}

impl QueryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: String, queries: QueryMap) -> Option<QueryMap> {
        self.entries.insert(key, queries)
    }

    pub fn get(&self, key: &str) -> Option<&QueryMap> {
        self.entries.get(key)
    }

    pub fn evict(&mut self, key: &str) -> Option<QueryMap> {
        self.entries.remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, &str)]) -> QueryMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_insert_overwrites() {
        let mut store = QueryStore::new();
        assert!(store.insert("k".to_string(), map(&[("a", "select 1")])).is_none());
        let previous = store.insert("k".to_string(), map(&[("b", "select 2")]));
        assert_eq!(previous, Some(map(&[("a", "select 1")])));
        assert_eq!(store.get("k"), Some(&map(&[("b", "select 2")])));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_evict() {
        let mut store = QueryStore::new();
        store.insert("k".to_string(), QueryMap::new());
        assert!(store.contains("k"));
        assert!(store.evict("k").is_some());
        assert!(store.is_empty());
        assert!(store.get("k").is_none());
    }
}
