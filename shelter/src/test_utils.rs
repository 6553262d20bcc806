//! Test utilities shared by unit and handler tests.

use async_trait::async_trait;
use axum_test::TestServer;
use std::sync::Arc;
use tokio_util::{sync::CancellationToken, task::TaskTracker};

use crate::{
    AppState,
    auth::{
        credentials::{Credential, CredentialStore},
        password::{self, Argon2Params},
        session::TokenService,
    },
    config::Config,
    db::{
        Collection, DocumentManager, InMemoryStore,
        errors::{DbError, Result as DbResult},
        store::{DocumentStore, Inserted, Selector},
    },
    queue::LocalTaskQueue,
    types::Record,
};

// Hashing with production parameters makes every login test take a noticeable amount of time
const FAST_HASH: Argon2Params = Argon2Params {
    memory_kib: 128,
    iterations: 1,
    parallelism: 1,
};

pub fn create_test_config() -> Config {
    Config {
        secret_key: Some("test-secret-key-for-testing-only".to_string()),
        ..Default::default()
    }
}

pub fn test_credential(username: &str, password: &str, disabled: bool) -> Credential {
    Credential {
        username: username.to_string(),
        full_name: None,
        email: Some(format!("{username}@example.com")),
        hashed_password: password::hash_with(password, FAST_HASH).expect("Failed to hash password"),
        disabled,
    }
}

/// State over an empty in-memory store, with `johndoe`/`secret` active and `alice`/`secret2`
/// disabled. Must be called inside a Tokio runtime.
pub fn create_test_state() -> AppState {
    let config = create_test_config();
    let store: Arc<dyn DocumentStore> = Arc::new(InMemoryStore::new());
    let writes = TaskTracker::new();

    let credentials = CredentialStore::new([
        test_credential("johndoe", "secret", false),
        test_credential("alice", "secret2", true),
    ]);
    let queue = LocalTaskQueue::spawn(store.clone(), &config.queue, TaskTracker::new(), CancellationToken::new());

    AppState::builder()
        .dogs(DocumentManager::new(Collection::Dogs, store.clone(), writes.clone()).with_max_limit(config.max_list_length))
        .users(DocumentManager::new(Collection::Users, store, writes).with_max_limit(config.max_list_length))
        .tokens(TokenService::from_config(&config).expect("Failed to create token service"))
        .credentials(Arc::new(credentials))
        .queue(Arc::new(queue))
        .config(config)
        .build()
}

pub fn create_test_server(state: AppState) -> TestServer {
    TestServer::new(crate::build_router(state)).expect("Failed to create test server")
}

pub fn token_for(state: &AppState, username: &str) -> String {
    state.tokens.issue(username).expect("Failed to issue token")
}

/// Store whose every operation fails.
pub struct FailingStore;

fn unavailable() -> DbError {
    DbError::Other(anyhow::anyhow!("store unavailable"))
}

#[async_trait]
impl DocumentStore for FailingStore {
    async fn find(&self, _collection: Collection, _selector: &Selector, _limit: i64) -> DbResult<Vec<Record>> {
        Err(unavailable())
    }

    async fn insert(&self, _collection: Collection, _record: Record) -> DbResult<Inserted> {
        Err(unavailable())
    }

    async fn update_one(&self, _collection: Collection, _selector: &Selector, _values: &Record) -> DbResult<u64> {
        Err(unavailable())
    }

    async fn delete_one(&self, _collection: Collection, _selector: &Selector) -> DbResult<u64> {
        Err(unavailable())
    }
}
