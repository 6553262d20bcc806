//! Generic document manager.
//!
//! One [`DocumentManager`] serves one [`Collection`]. Every operation normalizes its
//! [`QueryFilter`] for that collection and then talks to the injected store, so no
//! operation branches on which collection it serves.
//!
//! Creation is two-phase: the store assigns a native id on insert, the public `ID` (and
//! `created_date` for collections that stamp creation) is then patched onto the document,
//! and the canonical record is re-read by `ID`. Each phase completes before the next.

use serde_json::Value;
use std::{sync::Arc, time::Duration};
use tokio_util::task::TaskTracker;
use tracing::{debug, error, instrument};

use crate::{
    db::{
        collection::{CREATED_DATE_FIELD, Collection, ID_FIELD},
        errors::DbError,
        query::QueryFilter,
        store::{DocumentStore, Selector},
    },
    errors::{Error, Result},
    queue::{Job, TaskQueue},
    types::{Filter, Record, abbrev_uuid},
};

pub const UPDATE_NOT_FOUND: &str = "Item not found while updating.";
pub const DELETE_NOT_FOUND: &str = "Item not found while deleting.";

/// Insert `record` and return the canonical record carrying its public `ID`.
#[instrument(skip(store, record), fields(collection = %collection), err)]
pub async fn insert_document(store: &dyn DocumentStore, collection: Collection, record: Record) -> Result<Record> {
    let inserted = store.insert(collection, record).await?;
    let id = inserted.native_id.to_string();

    let mut stamps = Record::new();
    stamps.insert(ID_FIELD.to_string(), Value::String(id.clone()));
    if collection.stamps_creation() {
        let created_date = inserted.created_at.to_rfc3339_opts(chrono::SecondsFormat::Micros, true);
        stamps.insert(CREATED_DATE_FIELD.to_string(), Value::String(created_date));
    }

    let vanished = || DbError::Vanished {
        collection,
        id: id.clone(),
    };

    if store.update_one(collection, &Selector::Native(inserted.native_id), &stamps).await? == 0 {
        return Err(vanished().into());
    }

    let mut by_id = Filter::new();
    by_id.insert(ID_FIELD.to_string(), Value::String(id.clone()));
    let record = store
        .find(collection, &Selector::Fields(by_id), 1)
        .await?
        .into_iter()
        .next()
        .ok_or_else(vanished)?;

    debug!(id = %abbrev_uuid(&inserted.native_id), "Document created");
    Ok(record)
}

#[derive(Clone)]
pub struct DocumentManager {
    collection: Collection,
    store: Arc<dyn DocumentStore>,
    background: TaskTracker,
    max_limit: i64,
}

impl std::fmt::Debug for DocumentManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentManager")
            .field("collection", &self.collection)
            .field("max_limit", &self.max_limit)
            .finish_non_exhaustive()
    }
}

impl DocumentManager {
    /// Best-effort background writes are spawned on `background`.
    pub fn new(collection: Collection, store: Arc<dyn DocumentStore>, background: TaskTracker) -> Self {
        Self {
            collection,
            store,
            background,
            max_limit: i64::MAX,
        }
    }

    /// Cap every listing at `max_limit` records, whatever the caller asks for.
    pub fn with_max_limit(mut self, max_limit: u64) -> Self {
        self.max_limit = i64::try_from(max_limit).unwrap_or(i64::MAX);
        self
    }

    /// List records matching the query, at most `limit` of them, in store order.
    #[instrument(skip_all, fields(collection = %self.collection), err)]
    pub async fn get_documents(&self, query: &QueryFilter) -> Result<Vec<Record>> {
        let limit = query.limit()?.min(self.max_limit);
        let filter = query.normalize(self.collection);
        let records = self.store.find(self.collection, &Selector::Fields(filter), limit).await?;
        debug!(count = records.len(), limit, "Listed documents");
        Ok(records)
    }

    /// Validate and insert a new record.
    #[instrument(skip_all, fields(collection = %self.collection), err)]
    pub async fn add_document(&self, payload: Value) -> Result<Record> {
        let record = self.collection.creation_record(payload)?;
        insert_document(self.store.as_ref(), self.collection, record).await
    }

    /// Validate a new record and create it through `queue`, waiting up to `timeout` for the result.
    #[instrument(skip_all, fields(collection = %self.collection), err)]
    pub async fn add_document_via_queue(&self, queue: &dyn TaskQueue, payload: Value, timeout: Duration) -> Result<Record> {
        let record = self.collection.creation_record(payload)?;
        let handle = queue
            .submit(Job::AddDocument {
                collection: self.collection,
                record,
            })
            .await?;
        debug!(task_id = %abbrev_uuid(&handle.task_id), "Waiting for queued create");
        Ok(handle.wait(timeout).await?)
    }

    /// Apply the payload's non-null fields to the first record matching the query.
    #[instrument(skip_all, fields(collection = %self.collection), err)]
    pub async fn update_document(&self, query: &QueryFilter, payload: Value) -> Result<Record> {
        let values = self.collection.update_values(payload)?;
        let mut filter = query.normalize(self.collection);

        let matched = self
            .store
            .update_one(self.collection, &Selector::Fields(filter.clone()), &values)
            .await?;
        if matched == 0 {
            return Err(Error::NotFound {
                message: UPDATE_NOT_FOUND.to_string(),
            });
        }

        // The updated record now holds the new values, so they narrow the re-read
        filter.extend(values);
        self.store
            .find(self.collection, &Selector::Fields(filter), 1)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::NotFound {
                message: UPDATE_NOT_FOUND.to_string(),
            })
    }

    /// Return the first record matching the query and delete it in the background.
    ///
    /// The background delete is narrowed to the returned record's `ID`, so a later request
    /// with the same filter can never remove a record nobody was handed.
    #[instrument(skip_all, fields(collection = %self.collection), err)]
    pub async fn delete_document(&self, query: &QueryFilter) -> Result<Record> {
        let mut filter = query.normalize(self.collection);
        let record = self
            .store
            .find(self.collection, &Selector::Fields(filter.clone()), 1)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::NotFound {
                message: DELETE_NOT_FOUND.to_string(),
            })?;

        let id = record
            .get(ID_FIELD)
            .cloned()
            .ok_or_else(|| DbError::Malformed {
                collection: self.collection,
                message: format!("no {ID_FIELD} field"),
            })?;
        filter.insert(ID_FIELD.to_string(), id);

        let store = self.store.clone();
        let collection = self.collection;
        self.background.spawn(async move {
            match store.delete_one(collection, &Selector::Fields(filter)).await {
                Ok(0) => debug!(collection = %collection, "Background delete matched nothing"),
                Ok(_) => debug!(collection = %collection, "Background delete completed"),
                Err(e) => error!(collection = %collection, error = %e, "Background delete failed"),
            }
        });

        Ok(record)
    }

    /// Wait for every outstanding background write to finish.
    pub async fn settle(&self) {
        self.background.close();
        self.background.wait().await;
        self.background.reopen();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::QueueConfig,
        db::store::InMemoryStore,
        queue::{LocalTaskQueue, QueueError},
        test_utils::FailingStore,
    };
    use serde_json::json;
    use tokio_util::sync::CancellationToken;

    fn manager(collection: Collection) -> DocumentManager {
        DocumentManager::new(collection, Arc::new(InMemoryStore::new()), TaskTracker::new())
    }

    fn all(limit: i64) -> QueryFilter {
        QueryFilter {
            limit: Some(limit),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_add_dog_assigns_id_and_created_date() {
        let dogs = manager(Collection::Dogs);
        let record = dogs
            .add_document(json!({"name": "Zeus", "is_adopted": false, "extra": "ignored"}))
            .await
            .unwrap();

        let id = record[ID_FIELD].as_str().unwrap();
        assert!(uuid::Uuid::parse_str(id).is_ok());
        let created = record[CREATED_DATE_FIELD].as_str().unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(created).is_ok());
        assert!(!record.contains_key("extra"));
        assert_eq!(record["picture"], Value::Null);

        let listed = dogs.get_documents(&QueryFilter::by_id(id)).await.unwrap();
        assert_eq!(listed, vec![record]);
    }

    #[tokio::test]
    async fn test_add_user_has_no_created_date() {
        let users = manager(Collection::Users);
        let record = users.add_document(json!({"name": "Luis", "last_name": "Papiernik"})).await.unwrap();
        assert!(record.contains_key(ID_FIELD));
        assert!(!record.contains_key(CREATED_DATE_FIELD));
        assert_eq!(record["email"], Value::Null);
    }

    #[tokio::test]
    async fn test_created_dates_increase() {
        let dogs = manager(Collection::Dogs);
        let first = dogs.add_document(json!({"name": "Zeus"})).await.unwrap();
        let second = dogs.add_document(json!({"name": "Hera"})).await.unwrap();
        let first = chrono::DateTime::parse_from_rfc3339(first[CREATED_DATE_FIELD].as_str().unwrap()).unwrap();
        let second = chrono::DateTime::parse_from_rfc3339(second[CREATED_DATE_FIELD].as_str().unwrap()).unwrap();
        assert!(second > first);
    }

    #[tokio::test]
    async fn test_same_payload_twice_creates_distinct_records() {
        let store = Arc::new(InMemoryStore::new());
        let dogs = DocumentManager::new(Collection::Dogs, store.clone(), TaskTracker::new());
        let payload = json!({"name": "Zeus", "is_adopted": false});

        let first = dogs.add_document(payload.clone()).await.unwrap();
        let second = dogs.add_document(payload).await.unwrap();

        assert_ne!(first[ID_FIELD], second[ID_FIELD]);
        assert_ne!(first[CREATED_DATE_FIELD], second[CREATED_DATE_FIELD]);
        assert_eq!(store.len(Collection::Dogs).await, 2);
    }

    #[tokio::test]
    async fn test_invalid_payload_touches_nothing() {
        let store = Arc::new(InMemoryStore::new());
        let users = DocumentManager::new(Collection::Users, store.clone(), TaskTracker::new());
        let err = users.add_document(json!({"email": 3.141592})).await.unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
        assert_eq!(store.len(Collection::Users).await, 0);
    }

    #[tokio::test]
    async fn test_get_documents_defaults_to_one() {
        let dogs = manager(Collection::Dogs);
        for name in ["Zeus", "Hera", "Ares"] {
            dogs.add_document(json!({"name": name})).await.unwrap();
        }
        assert_eq!(dogs.get_documents(&QueryFilter::default()).await.unwrap().len(), 1);
        assert_eq!(dogs.get_documents(&all(10)).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_get_documents_caps_at_max_limit() {
        let dogs = manager(Collection::Dogs).with_max_limit(2);
        for name in ["Zeus", "Hera", "Ares"] {
            dogs.add_document(json!({"name": name})).await.unwrap();
        }
        assert_eq!(dogs.get_documents(&all(100)).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_get_documents_rejects_non_positive_limit() {
        let dogs = manager(Collection::Dogs);
        let err = dogs.get_documents(&all(0)).await.unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
    }

    #[tokio::test]
    async fn test_get_documents_filters_by_applicable_fields() {
        let dogs = manager(Collection::Dogs);
        dogs.add_document(json!({"name": "Zeus", "is_adopted": true})).await.unwrap();
        dogs.add_document(json!({"name": "Hera", "is_adopted": false})).await.unwrap();

        let query = QueryFilter {
            limit: Some(10),
            is_adopted: Some(false),
            // not a dog field, so it must not narrow the result
            last_name: Some("Papiernik".to_string()),
            ..Default::default()
        };
        let records = dogs.get_documents(&query).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["name"], json!("Hera"));
    }

    #[tokio::test]
    async fn test_unknown_id_lists_nothing() {
        let dogs = manager(Collection::Dogs);
        dogs.add_document(json!({"name": "Zeus"})).await.unwrap();
        assert!(dogs.get_documents(&QueryFilter::by_id("no_existe")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_document_merges_and_keeps_id() {
        let users = manager(Collection::Users);
        let created = users.add_document(json!({"name": "Luis", "last_name": "Papiernik"})).await.unwrap();
        let id = created[ID_FIELD].as_str().unwrap();

        let updated = users
            .update_document(&QueryFilter::by_id(id), json!({"email": "luis@guane.com.co", "ID": "forged", "name": null}))
            .await
            .unwrap();

        assert_eq!(updated[ID_FIELD], json!(id));
        assert_eq!(updated["name"], json!("Luis"));
        assert_eq!(updated["email"], json!("luis@guane.com.co"));
    }

    #[tokio::test]
    async fn test_update_document_not_found() {
        let users = manager(Collection::Users);
        let err = users
            .update_document(&QueryFilter::by_id("no_existe"), json!({"name": "Luis"}))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound { ref message } if message == UPDATE_NOT_FOUND));
    }

    #[tokio::test]
    async fn test_update_document_rejects_empty_values() {
        let users = manager(Collection::Users);
        users.add_document(json!({"name": "Luis"})).await.unwrap();
        let err = users.update_document(&QueryFilter::default(), json!({})).await.unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
    }

    #[tokio::test]
    async fn test_delete_document_returns_record_then_removes_it() {
        let dogs = manager(Collection::Dogs);
        let created = dogs.add_document(json!({"name": "Zeus"})).await.unwrap();
        let id = created[ID_FIELD].as_str().unwrap().to_string();

        let deleted = dogs.delete_document(&QueryFilter::by_id(&id)).await.unwrap();
        assert_eq!(deleted, created);

        dogs.settle().await;
        assert!(dogs.get_documents(&QueryFilter::by_id(&id)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_document_not_found() {
        let dogs = manager(Collection::Dogs);
        let err = dogs.delete_document(&QueryFilter::by_id("no_existe")).await.unwrap_err();
        assert!(matches!(err, Error::NotFound { ref message } if message == DELETE_NOT_FOUND));
    }

    #[tokio::test]
    async fn test_delete_document_no_match_leaves_store_unchanged() {
        let store = Arc::new(InMemoryStore::new());
        let dogs = DocumentManager::new(Collection::Dogs, store.clone(), TaskTracker::new());
        dogs.add_document(json!({"name": "Zeus"})).await.unwrap();
        dogs.add_document(json!({"name": "Hera"})).await.unwrap();

        let query = QueryFilter {
            name: Some("Ares".to_string()),
            ..Default::default()
        };
        let err = dogs.delete_document(&query).await.unwrap_err();
        assert!(matches!(err, Error::NotFound { ref message } if message == DELETE_NOT_FOUND));

        dogs.settle().await;
        assert_eq!(store.len(Collection::Dogs).await, 2);
    }

    #[tokio::test]
    async fn test_repeated_delete_only_removes_returned_records() {
        let store = Arc::new(InMemoryStore::new());
        let dogs = DocumentManager::new(Collection::Dogs, store.clone(), TaskTracker::new());
        let first = dogs.add_document(json!({"name": "Zeus"})).await.unwrap();
        let second = dogs.add_document(json!({"name": "Zeus"})).await.unwrap();
        let query = QueryFilter {
            name: Some("Zeus".to_string()),
            ..Default::default()
        };

        // Back to back: neither background delete has run, so both calls see the same record
        let a = dogs.delete_document(&query).await.unwrap();
        let b = dogs.delete_document(&query).await.unwrap();
        assert_eq!(a, first);
        assert_eq!(b, first);

        dogs.settle().await;
        assert_eq!(store.len(Collection::Dogs).await, 1);
        let remaining = dogs.get_documents(&QueryFilter::by_id(second[ID_FIELD].as_str().unwrap())).await.unwrap();
        assert_eq!(remaining, vec![second.clone()]);

        // Once settled, the next delete hands out the other record and removes it
        let c = dogs.delete_document(&query).await.unwrap();
        assert_eq!(c, second);
        assert_ne!(a[ID_FIELD], c[ID_FIELD]);
        dogs.settle().await;
        assert_eq!(store.len(Collection::Dogs).await, 0);
    }

    #[tokio::test]
    async fn test_settle_can_run_repeatedly() {
        let dogs = manager(Collection::Dogs);
        for _ in 0..2 {
            let created = dogs.add_document(json!({"name": "Zeus"})).await.unwrap();
            dogs.delete_document(&QueryFilter::by_id(created[ID_FIELD].as_str().unwrap())).await.unwrap();
            dogs.settle().await;
        }
        assert!(dogs.get_documents(&all(10)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        let dogs = DocumentManager::new(Collection::Dogs, Arc::new(FailingStore), TaskTracker::new());
        let err = dogs.get_documents(&QueryFilter::default()).await.unwrap_err();
        assert!(matches!(err, Error::Database(_)));
        let err = dogs.add_document(json!({"name": "Zeus"})).await.unwrap_err();
        assert!(matches!(err, Error::Database(_)));
    }

    #[tokio::test]
    async fn test_add_document_via_queue() {
        let store: Arc<dyn DocumentStore> = Arc::new(InMemoryStore::new());
        let shutdown = CancellationToken::new();
        let queue = LocalTaskQueue::spawn(store.clone(), &QueueConfig::default(), TaskTracker::new(), shutdown.clone());
        let dogs = DocumentManager::new(Collection::Dogs, store, TaskTracker::new());

        let record = dogs
            .add_document_via_queue(&queue, json!({"name": "Zeus"}), Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(record["name"], json!("Zeus"));

        let listed = dogs.get_documents(&QueryFilter::by_id(record[ID_FIELD].as_str().unwrap())).await.unwrap();
        assert_eq!(listed, vec![record]);
        shutdown.cancel();
    }

    #[tokio::test]
    async fn test_add_document_via_queue_surfaces_failure() {
        let shutdown = CancellationToken::new();
        let queue = LocalTaskQueue::spawn(Arc::new(FailingStore), &QueueConfig::default(), TaskTracker::new(), shutdown.clone());
        let dogs = manager(Collection::Dogs);

        let err = dogs
            .add_document_via_queue(&queue, json!({"name": "Zeus"}), Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Queue(QueueError::TaskFailed { .. })));
        shutdown.cancel();
    }

    #[tokio::test]
    async fn test_add_document_via_queue_validates_before_submitting() {
        let shutdown = CancellationToken::new();
        let store = Arc::new(InMemoryStore::new());
        let queue = LocalTaskQueue::spawn(store.clone(), &QueueConfig::default(), TaskTracker::new(), shutdown.clone());
        let dogs = manager(Collection::Dogs);

        let err = dogs
            .add_document_via_queue(&queue, json!({}), Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
        assert_eq!(store.len(Collection::Dogs).await, 0);
        shutdown.cancel();
    }
}
