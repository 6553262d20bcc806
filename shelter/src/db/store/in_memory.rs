//! In-memory document store.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{DocumentStore, Inserted, Selector};
use crate::{
    db::{collection::Collection, errors::Result},
    types::{DocumentId, Record, matches_filter},
};

#[derive(Debug, Clone)]
struct StoredDocument {
    native_id: DocumentId,
    body: Record,
}

impl StoredDocument {
    fn selected_by(&self, selector: &Selector) -> bool {
        match selector {
            Selector::Native(id) => self.native_id == *id,
            Selector::Fields(filter) => matches_filter(&self.body, filter),
        }
    }
}

#[derive(Debug, Default)]
struct State {
    collections: HashMap<Collection, Vec<StoredDocument>>,
    last_created_at: Option<DateTime<Utc>>,
}

impl State {
    /// Creation timestamps are strictly increasing, even when the clock is not.
    fn next_created_at(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let created_at = match self.last_created_at {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        };
        self.last_created_at = Some(created_at);
        created_at
    }
}

/// Documents kept in insertion order per collection. Data does not survive a restart.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: RwLock<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents held in `collection`
    pub async fn len(&self, collection: Collection) -> usize {
        self.state.read().await.collections.get(&collection).map_or(0, Vec::len)
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn find(&self, collection: Collection, selector: &Selector, limit: i64) -> Result<Vec<Record>> {
        let state = self.state.read().await;
        let limit = usize::try_from(limit).unwrap_or(0);
        Ok(state
            .collections
            .get(&collection)
            .map(|documents| {
                documents
                    .iter()
                    .filter(|document| document.selected_by(selector))
                    .take(limit)
                    .map(|document| document.body.clone())
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn insert(&self, collection: Collection, record: Record) -> Result<Inserted> {
        let mut state = self.state.write().await;
        let created_at = state.next_created_at();
        let native_id = Uuid::new_v4();
        state
            .collections
            .entry(collection)
            .or_default()
            .push(StoredDocument { native_id, body: record });
        Ok(Inserted { native_id, created_at })
    }

    async fn update_one(&self, collection: Collection, selector: &Selector, values: &Record) -> Result<u64> {
        let mut state = self.state.write().await;
        let Some(document) = state
            .collections
            .get_mut(&collection)
            .and_then(|documents| documents.iter_mut().find(|document| document.selected_by(selector)))
        else {
            return Ok(0);
        };
        for (key, value) in values {
            document.body.insert(key.clone(), value.clone());
        }
        Ok(1)
    }

    async fn delete_one(&self, collection: Collection, selector: &Selector) -> Result<u64> {
        let mut state = self.state.write().await;
        let Some(documents) = state.collections.get_mut(&collection) else {
            return Ok(0);
        };
        match documents.iter().position(|document| document.selected_by(selector)) {
            Some(index) => {
                documents.remove(index);
                Ok(1)
            }
            None => Ok(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: serde_json::Value) -> Record {
        match value {
            serde_json::Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    #[tokio::test]
    async fn test_find_respects_order_and_limit() {
        let store = InMemoryStore::new();
        for name in ["Zeus", "Hera", "Ares"] {
            store.insert(Collection::Dogs, record(json!({"name": name, "is_adopted": false}))).await.unwrap();
        }

        let all = store.find(Collection::Dogs, &Selector::Fields(Record::new()), 10).await.unwrap();
        let names: Vec<_> = all.iter().map(|r| r["name"].as_str().unwrap()).collect();
        assert_eq!(names, vec!["Zeus", "Hera", "Ares"]);

        let two = store.find(Collection::Dogs, &Selector::Fields(Record::new()), 2).await.unwrap();
        assert_eq!(two.len(), 2);
    }

    #[tokio::test]
    async fn test_collections_are_isolated() {
        let store = InMemoryStore::new();
        store.insert(Collection::Dogs, record(json!({"name": "Zeus"}))).await.unwrap();

        let users = store.find(Collection::Users, &Selector::Fields(Record::new()), 10).await.unwrap();
        assert!(users.is_empty());
        assert_eq!(store.len(Collection::Dogs).await, 1);
    }

    #[tokio::test]
    async fn test_created_at_strictly_increases() {
        let store = InMemoryStore::new();
        let mut previous = None;
        for _ in 0..50 {
            let inserted = store.insert(Collection::Dogs, record(json!({"name": "Zeus"}))).await.unwrap();
            if let Some(previous) = previous {
                assert!(inserted.created_at > previous);
            }
            previous = Some(inserted.created_at);
        }
    }

    #[tokio::test]
    async fn test_update_one_touches_first_match_only() {
        let store = InMemoryStore::new();
        let first = store.insert(Collection::Dogs, record(json!({"name": "Zeus"}))).await.unwrap();
        let second = store.insert(Collection::Dogs, record(json!({"name": "Zeus"}))).await.unwrap();

        let filter = record(json!({"name": "Zeus"}));
        let matched = store
            .update_one(Collection::Dogs, &Selector::Fields(filter), &record(json!({"is_adopted": true})))
            .await
            .unwrap();
        assert_eq!(matched, 1);

        let first = store.find(Collection::Dogs, &Selector::Native(first.native_id), 1).await.unwrap();
        let second = store.find(Collection::Dogs, &Selector::Native(second.native_id), 1).await.unwrap();
        assert_eq!(first[0]["is_adopted"], json!(true));
        assert!(second[0].get("is_adopted").is_none());
    }

    #[tokio::test]
    async fn test_update_and_delete_report_zero_when_nothing_matches() {
        let store = InMemoryStore::new();
        let selector = Selector::Fields(record(json!({"name": "nobody"})));
        assert_eq!(store.update_one(Collection::Users, &selector, &record(json!({"name": "x"}))).await.unwrap(), 0);
        assert_eq!(store.delete_one(Collection::Users, &selector).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_delete_one_removes_single_document() {
        let store = InMemoryStore::new();
        store.insert(Collection::Users, record(json!({"name": "Luis"}))).await.unwrap();
        store.insert(Collection::Users, record(json!({"name": "Luis"}))).await.unwrap();

        let selector = Selector::Fields(record(json!({"name": "Luis"})));
        assert_eq!(store.delete_one(Collection::Users, &selector).await.unwrap(), 1);
        assert_eq!(store.len(Collection::Users).await, 1);
    }
}
