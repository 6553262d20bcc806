//! # shelter: dog and user records over HTTP
//!
//! `shelter` is a small CRUD service for an animal shelter. It keeps two collections of
//! schemaless documents, dogs and users, and exposes them over a JSON HTTP API. Writes that
//! create or update records require a bearer token obtained from `POST /token`.
//!
//! ## Architecture
//!
//! The application is built on [Axum](https://github.com/tokio-rs/axum) for the HTTP layer.
//! Documents live in a [`db::DocumentStore`]: either process memory (the default, useful for
//! development and tests) or PostgreSQL with one JSONB row per document.
//!
//! ### Request Flow
//!
//! A request reaches a handler in [`api::handlers`]. Create and update handlers first resolve the
//! [`auth::current_user::CurrentUser`] extractor, which verifies the bearer token and looks the
//! subject up in the configured credential store. The handler then parses the query string into a
//! [`db::QueryFilter`] and hands it, with the JSON body, to the collection's
//! [`db::DocumentManager`]. The manager validates the body against the collection schema, talks
//! to the store and returns the stored record, which is rendered back as JSON.
//!
//! Deletes answer as soon as the target record has been read; the removal itself runs in the
//! background on a [`TaskTracker`] that is drained on shutdown.
//!
//! ### Queued Writes
//!
//! `POST /concurrently/{collection}/` routes the insert through a [`queue::TaskQueue`]: a bounded
//! channel feeding a fixed pool of workers. The request waits for the job result up to
//! `queue.result_timeout`.
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use shelter::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = shelter::config::Args::parse();
//!     let config = Config::load(&args)?;
//!     shelter::telemetry::init_telemetry()?;
//!
//!     let app = Application::new(config).await?;
//!     app.serve(async {
//!         let _ = tokio::signal::ctrl_c().await;
//!     })
//!     .await
//! }
//! ```
//!
//! ## Configuration
//!
//! See the [`config`] module for configuration options.
pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
mod openapi;
pub mod queue;
pub mod telemetry;
pub mod types;

#[cfg(test)]
pub mod test_utils;

use axum::{
    Json, Router,
    routing::{get, post},
};
use bon::Builder;
pub use config::Config;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::{sync::CancellationToken, task::TaskTracker};
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::{Level, info, instrument};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use crate::{
    auth::{credentials::CredentialStore, session::TokenService},
    config::DatabaseConfig,
    db::{Collection, DocumentManager, DocumentStore, InMemoryStore, PostgresStore},
    openapi::ApiDoc,
    queue::{LocalTaskQueue, TaskQueue},
};

/// Application state shared across all request handlers.
///
/// # Example
///
/// ```ignore
/// let state = AppState::builder()
///     .config(config)
///     .dogs(dogs)
///     .users(users)
///     .tokens(tokens)
///     .credentials(Arc::new(credentials))
///     .queue(Arc::new(queue))
///     .build();
/// ```
#[derive(Clone, Builder)]
pub struct AppState {
    pub config: Config,
    pub dogs: DocumentManager,
    pub users: DocumentManager,
    pub tokens: TokenService,
    pub credentials: Arc<CredentialStore>,
    pub queue: Arc<dyn TaskQueue>,
}

/// Build the application router.
///
/// Collection routes answer both with and without the trailing slash.
#[instrument(skip_all)]
pub fn build_router(state: AppState) -> Router {
    use api::handlers::{auth, dogs, root, users};

    let dog_routes = get(dogs::list_dogs)
        .post(dogs::create_dog)
        .put(dogs::update_dog)
        .delete(dogs::delete_dog);
    let user_routes = get(users::list_users)
        .post(users::create_user)
        .put(users::update_user)
        .delete(users::delete_user);

    let router = Router::new()
        .route("/", get(root::root))
        .route("/healthz", get(root::healthz))
        .route("/token", post(auth::login))
        .route("/dogs/", dog_routes.clone())
        .route("/dogs", dog_routes)
        .route("/users/", user_routes.clone())
        .route("/users", user_routes)
        .route("/concurrently/dogs/", post(dogs::create_dog_concurrently))
        .route("/concurrently/dogs", post(dogs::create_dog_concurrently))
        .route("/concurrently/users/", post(users::create_user_concurrently))
        .route("/concurrently/users", post(users::create_user_concurrently))
        .with_state(state)
        .route("/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()));

    router.layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    )
}

/// Open the configured document store, running migrations for PostgreSQL.
async fn setup_store(config: &Config) -> anyhow::Result<Arc<dyn DocumentStore>> {
    match &config.database {
        DatabaseConfig::Memory => {
            info!("Using in-memory document store");
            Ok(Arc::new(InMemoryStore::new()))
        }
        DatabaseConfig::Postgres { url, pool } => Ok(Arc::new(PostgresStore::connect(url, pool).await?)),
    }
}

/// Background work that outlives individual requests: the task queue dispatcher and
/// best-effort deletes.
///
/// When dropped, the `drop_guard` cancels the shutdown token, stopping the dispatcher.
pub struct BackgroundServices {
    shutdown_token: CancellationToken,
    jobs: TaskTracker,
    writes: TaskTracker,
    // Pub so that we can disarm it if we want to
    pub drop_guard: Option<tokio_util::sync::DropGuard>,
}

impl BackgroundServices {
    fn new() -> Self {
        let shutdown_token = CancellationToken::new();
        let drop_guard = shutdown_token.clone().drop_guard();
        Self {
            shutdown_token,
            jobs: TaskTracker::new(),
            writes: TaskTracker::new(),
            drop_guard: Some(drop_guard),
        }
    }

    /// Stop the task queue and wait for outstanding background work.
    ///
    /// Jobs already queued still run. Queued jobs settle before background deletes are
    /// awaited, and both before this returns.
    pub async fn shutdown(self) {
        self.shutdown_token.cancel();
        self.jobs.close();
        info!(pending = self.jobs.len(), "Waiting for queued jobs");
        self.jobs.wait().await;

        self.writes.close();
        info!(pending = self.writes.len(), "Waiting for background writes");
        self.writes.wait().await;
    }
}

/// Main application struct that owns all resources and lifecycle.
///
/// # Lifecycle
///
/// 1. **Create**: [`Application::new`] opens the store, builds credentials and the token
///    service, and starts the task queue
/// 2. **Serve**: [`Application::serve`] binds to a TCP port and starts handling requests
/// 3. **Shutdown**: When the shutdown signal is received, drains background work and closes
///    the store
pub struct Application {
    router: Router,
    config: Config,
    store: Arc<dyn DocumentStore>,
    bg_services: BackgroundServices,
}

impl Application {
    /// Create a new application instance with all resources initialized
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = setup_store(&config).await?;
        Self::with_store(config, store)
    }

    /// Create an application over an already opened store.
    pub fn with_store(config: Config, store: Arc<dyn DocumentStore>) -> anyhow::Result<Self> {
        let bg_services = BackgroundServices::new();

        let tokens = TokenService::from_config(&config)?;
        let credentials = CredentialStore::from_config(&config.auth)?;
        if credentials.is_empty() {
            tracing::warn!("No accounts configured: create and update routes will reject every request");
        }

        let queue = LocalTaskQueue::spawn(
            store.clone(),
            &config.queue,
            bg_services.jobs.clone(),
            bg_services.shutdown_token.clone(),
        );
        let manager = |collection: Collection| {
            DocumentManager::new(collection, store.clone(), bg_services.writes.clone()).with_max_limit(config.max_list_length)
        };

        let app_state = AppState::builder()
            .config(config.clone())
            .dogs(manager(Collection::Dogs))
            .users(manager(Collection::Users))
            .tokens(tokens)
            .credentials(Arc::new(credentials))
            .queue(Arc::new(queue) as Arc<dyn TaskQueue>)
            .build();

        let router = build_router(app_state);

        Ok(Self {
            router,
            config,
            store,
            bg_services,
        })
    }

    /// Convert application into a test server (for tests)
    #[cfg(test)]
    pub fn into_test_server(self) -> (axum_test::TestServer, BackgroundServices) {
        let server = axum_test::TestServer::new(self.router).expect("Failed to create test server");
        (server, self.bg_services)
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            "Shelter listening on http://{}, available at http://localhost:{}",
            bind_addr, self.config.port
        );

        axum::serve(listener, self.router).with_graceful_shutdown(shutdown).await?;

        // Drain background writes before the store goes away
        self.bg_services.shutdown().await;

        info!("Closing document store...");
        self.store.close().await;

        Ok(())
    }
}
