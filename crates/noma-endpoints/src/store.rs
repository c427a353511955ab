//! In-memory record storage.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::{Map, Value};

/// A stored resource: a JSON object whose `id` is its key.
pub type Record = Map<String, Value>;

/// Shared, id-ordered record storage for one endpoint.
///
/// Cloning shares the underlying map.
#[derive(Debug, Clone, Default)]
pub struct ResourceStore {
    records: Arc<RwLock<BTreeMap<String, Record>>>,
}

impl ResourceStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding `records`, keyed by their `id` field.
    ///
    /// Records without a string `id` are skipped.
    pub fn seeded(records: impl IntoIterator<Item = Record>) -> Self {
        let store = Self::new();
        {
            let mut map = store.records.write();
            for record in records {
                let Some(id) = record.get("id").and_then(Value::as_str).map(str::to_string) else {
                    continue;
                };
                map.insert(id, record);
            }
        }
        store
    }

    /// Returns every record matching `filter`, ordered by id.
    pub fn list(&self, filter: impl Fn(&Record) -> bool) -> Vec<Record> {
        self.records
            .read()
            .values()
            .filter(|record| filter(record))
            .cloned()
            .collect()
    }

    /// Returns the record with `id`.
    pub fn get(&self, id: &str) -> Option<Record> {
        self.records.read().get(id).cloned()
    }

    /// Inserts `record` unless `id` is taken. Returns whether it was inserted.
    pub fn insert_new(&self, id: &str, record: Record) -> bool {
        let mut map = self.records.write();
        if map.contains_key(id) {
            return false;
        }
        map.insert(id.to_string(), record);
        true
    }

    /// Stores `record` under `id`. Returns whether an existing record was replaced.
    pub fn upsert(&self, id: &str, record: Record) -> bool {
        self.records.write().insert(id.to_string(), record).is_some()
    }

    /// Removes the record with `id`. Returns whether it existed.
    pub fn remove(&self, id: &str) -> bool {
        self.records.write().remove(id).is_some()
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(id: &str, name: &str) -> Record {
        match json!({ "id": id, "name": name }) {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_list_is_ordered_by_id() {
        let store = ResourceStore::seeded([record("b", "second"), record("a", "first")]);
        let ids: Vec<_> = store
            .list(|_| true)
            .into_iter()
            .map(|r| r["id"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_insert_new_refuses_duplicates() {
        let store = ResourceStore::new();
        assert!(store.insert_new("a", record("a", "x")));
        assert!(!store.insert_new("a", record("a", "y")));
        assert_eq!(store.get("a").unwrap()["name"], "x");
    }

    #[test]
    fn test_upsert_and_remove() {
        let store = ResourceStore::new();
        assert!(!store.upsert("a", record("a", "x")));
        assert!(store.upsert("a", record("a", "y")));
        assert_eq!(store.len(), 1);
        assert!(store.remove("a"));
        assert!(!store.remove("a"));
        assert!(store.is_empty());
    }

    #[test]
    fn test_clones_share_records() {
        let store = ResourceStore::new();
        let other = store.clone();
        store.upsert("a", record("a", "x"));
        assert!(other.get("a").is_some());
    }

    #[test]
    fn test_seeded_skips_records_without_id() {
        let mut no_id = record("a", "x");
        no_id.remove("id");
        let store = ResourceStore::seeded([no_id]);
        assert!(store.is_empty());
    }
}
