//! Task queue for the asynchronous write path.
//!
//! A caller submits a [`Job`] and receives a [`TaskHandle`]. The handle resolves to the
//! canonical record once a worker has run the job, or to a [`QueueError`] when the job
//! failed, the queue went away, or the caller's timeout elapsed. Nothing is retried here.
//!
//! ```text
//! handler ── submit(Job) ──► LocalTaskQueue ── mpsc ──► dispatcher
//!    │                                                   ├─ acquire worker permit
//!    │                                                   └─ spawn: run job against the store
//!    └── handle.wait(timeout) ◄──────── oneshot ─────────────────┘
//! ```

use futures::future::BoxFuture;
use std::{fmt, sync::Arc, time::Duration};
use thiserror::Error;
use uuid::Uuid;

use crate::{
    db::{collection::Collection, handlers::documents::insert_document, store::DocumentStore},
    types::Record,
};

pub mod local;

pub use local::LocalTaskQueue;

pub type TaskId = Uuid;

/// Work that can be run by a queue worker.
#[derive(Debug, Clone, PartialEq)]
pub enum Job {
    /// Insert an already validated record into a collection and return the canonical record
    AddDocument { collection: Collection, record: Record },
}

impl Job {
    pub fn name(&self) -> &'static str {
        match self {
            Job::AddDocument { .. } => "add_document",
        }
    }

    /// Run the job against the store.
    pub async fn run(self, store: &dyn DocumentStore) -> crate::errors::Result<Record> {
        match self {
            Job::AddDocument { collection, record } => insert_document(store, collection, record).await,
        }
    }
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Job::AddDocument { collection, .. } => write!(f, "{}({collection})", self.name()),
        }
    }
}

#[derive(Error, Debug)]
pub enum QueueError {
    /// The queue no longer accepts work
    #[error("Task queue is closed")]
    Closed,

    /// The worker went away without reporting a result
    #[error("Task {task_id} was dropped before completing")]
    Abandoned { task_id: TaskId },

    /// The job ran and failed
    #[error("Task {task_id} failed: {message}")]
    TaskFailed { task_id: TaskId, message: String },

    /// No result arrived in time
    #[error("Task {task_id} did not complete within {timeout:?}")]
    Timeout { task_id: TaskId, timeout: Duration },
}

/// Pending result of a submitted job.
pub struct TaskHandle {
    pub task_id: TaskId,
    outcome: BoxFuture<'static, Result<Record, QueueError>>,
}

impl TaskHandle {
    pub fn new(task_id: TaskId, outcome: BoxFuture<'static, Result<Record, QueueError>>) -> Self {
        Self { task_id, outcome }
    }

    /// Block until the job completes, fails, or `timeout` elapses.
    pub async fn wait(self, timeout: Duration) -> Result<Record, QueueError> {
        let task_id = self.task_id;
        tokio::time::timeout(timeout, self.outcome)
            .await
            .map_err(|_| QueueError::Timeout { task_id, timeout })?
    }
}

impl fmt::Debug for TaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskHandle").field("task_id", &self.task_id).finish_non_exhaustive()
    }
}

#[async_trait::async_trait]
pub trait TaskQueue: Send + Sync + 'static {
    /// Enqueue a job. Waits for capacity when the queue is full.
    async fn submit(&self, job: Job) -> Result<TaskHandle, QueueError>;
}

#[async_trait::async_trait]
impl<Q: TaskQueue + ?Sized> TaskQueue for Arc<Q> {
    async fn submit(&self, job: Job) -> Result<TaskHandle, QueueError> {
        (**self).submit(job).await
    }
}
