//! PostgreSQL document store.
//!
//! Documents live in a single `documents` table:
//!
//! ```text
//! id          UUID PRIMARY KEY      store-native id
//! collection  TEXT                  "dogs" | "users"
//! body        JSONB                 the record
//! created_at  TIMESTAMPTZ           assigned by the database at insert
//! ```
//!
//! Equality filters are expressed as JSONB containment (`body @> filter`), which a GIN index
//! on `body` serves. Single-document updates and deletes pick the first match through a
//! `LIMIT 1` subquery.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{PgPool, Row, postgres::PgPoolOptions, types::Json};
use std::time::Duration;
use tracing::{info, instrument};

use super::{DocumentStore, Inserted, Selector};
use crate::{
    config::PoolSettings,
    db::{
        collection::Collection,
        errors::{DbError, Result},
    },
    types::{DocumentId, Record},
};

pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Wrap an existing pool. Migrations are assumed to have run.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect with the given pool settings and bring the schema up to date.
    pub async fn connect(url: &str, settings: &PoolSettings) -> Result<Self> {
        let mut options = PgPoolOptions::new()
            .max_connections(settings.max_connections)
            .min_connections(settings.min_connections)
            .acquire_timeout(Duration::from_secs(settings.acquire_timeout_secs));
        if settings.idle_timeout_secs > 0 {
            options = options.idle_timeout(Duration::from_secs(settings.idle_timeout_secs));
        }
        if settings.max_lifetime_secs > 0 {
            options = options.max_lifetime(Duration::from_secs(settings.max_lifetime_secs));
        }

        let pool = options.connect(url).await?;
        migrator().run(&pool).await?;
        info!(max_connections = settings.max_connections, "Connected to document database");

        Ok(Self { pool })
    }
}

fn decode_body(collection: Collection, body: Value) -> Result<Record> {
    match body {
        Value::Object(record) => Ok(record),
        other => Err(DbError::Malformed {
            collection,
            message: format!("expected a JSON object, found {other}"),
        }),
    }
}

#[async_trait]
impl DocumentStore for PostgresStore {
    #[instrument(skip(self, selector), fields(collection = %collection), err)]
    async fn find(&self, collection: Collection, selector: &Selector, limit: i64) -> Result<Vec<Record>> {
        let rows = match selector {
            Selector::Native(id) => {
                sqlx::query("SELECT body FROM documents WHERE collection = $1 AND id = $2 LIMIT $3")
                    .bind(collection.name())
                    .bind(id)
                    .bind(limit)
                    .fetch_all(&self.pool)
                    .await?
            }
            Selector::Fields(filter) => {
                sqlx::query("SELECT body FROM documents WHERE collection = $1 AND body @> $2 ORDER BY created_at, id LIMIT $3")
                    .bind(collection.name())
                    .bind(Json(filter))
                    .bind(limit)
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        rows.into_iter()
            .map(|row| {
                let Json(body): Json<Value> = row.try_get("body")?;
                decode_body(collection, body)
            })
            .collect()
    }

    #[instrument(skip(self, record), fields(collection = %collection), err)]
    async fn insert(&self, collection: Collection, record: Record) -> Result<Inserted> {
        let row = sqlx::query("INSERT INTO documents (collection, body) VALUES ($1, $2) RETURNING id, created_at")
            .bind(collection.name())
            .bind(Json(&record))
            .fetch_one(&self.pool)
            .await?;

        Ok(Inserted {
            native_id: row.try_get::<DocumentId, _>("id")?,
            created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
        })
    }

    #[instrument(skip(self, selector, values), fields(collection = %collection), err)]
    async fn update_one(&self, collection: Collection, selector: &Selector, values: &Record) -> Result<u64> {
        let result = match selector {
            Selector::Native(id) => {
                sqlx::query("UPDATE documents SET body = body || $3 WHERE collection = $1 AND id = $2")
                    .bind(collection.name())
                    .bind(id)
                    .bind(Json(values))
                    .execute(&self.pool)
                    .await?
            }
            Selector::Fields(filter) => {
                sqlx::query(
                    r#"
                    UPDATE documents SET body = body || $3
                    WHERE id = (SELECT id FROM documents WHERE collection = $1 AND body @> $2 ORDER BY created_at, id LIMIT 1)
                    "#,
                )
                .bind(collection.name())
                .bind(Json(filter))
                .bind(Json(values))
                .execute(&self.pool)
                .await?
            }
        };
        Ok(result.rows_affected())
    }

    #[instrument(skip(self, selector), fields(collection = %collection), err)]
    async fn delete_one(&self, collection: Collection, selector: &Selector) -> Result<u64> {
        let result = match selector {
            Selector::Native(id) => {
                sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
                    .bind(collection.name())
                    .bind(id)
                    .execute(&self.pool)
                    .await?
            }
            Selector::Fields(filter) => {
                sqlx::query("DELETE FROM documents WHERE id = (SELECT id FROM documents WHERE collection = $1 AND body @> $2 ORDER BY created_at, id LIMIT 1)")
                    .bind(collection.name())
                    .bind(Json(filter))
                    .execute(&self.pool)
                    .await?
            }
        };
        Ok(result.rows_affected())
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
