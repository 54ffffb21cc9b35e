//! Asynchronous build task coordination.
//!
//! The HTTP layer never runs a build synchronously: it enqueues a
//! [`BuildTask`] and returns the record immediately. Each task executes as
//! one tokio task holding a semaphore permit, so builds run as parallel
//! workers with bounded concurrency. Task records live in a [`DashMap`]
//! and only ever move forward through their lifecycle:
//! PENDING -> PROCESSING -> SUCCESS | ERROR.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::{Mutex, Semaphore};
use uuid::Uuid;

use crate::service::GraphService;

/// Lifecycle state of a build task. Transitions are forward-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    /// Created and queued; no worker has picked it up yet.
    Pending,
    /// A worker is executing the build.
    Processing,
    /// Terminal: the build finished and `result_graph_id` is set.
    Success,
    /// Terminal: the build failed and `error` carries the cause.
    Error,
}

/// One asynchronous build job.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildTask {
    /// Task identifier, handed back to the requester for polling.
    pub id: Uuid,
    /// The root record the graph is built from.
    pub root_id: String,
    /// The account that requested the build.
    pub owner: String,
    /// Current lifecycle state.
    pub status: TaskStatus,
    /// When the task was enqueued.
    pub created_at: DateTime<Utc>,
    /// When a worker picked the task up.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    /// When the task reached a terminal state.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    /// The persisted graph id, on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_graph_id: Option<String>,
    /// The failure cause, on error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Degraded-success note (e.g. a back-link that could not be written).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Registry and scheduler for build tasks.
pub struct TaskCoordinator {
    tasks: DashMap<Uuid, BuildTask>,
    permits: Arc<Semaphore>,
}

impl TaskCoordinator {
    /// Creates a coordinator allowing at most `max_concurrent_builds`
    /// builds to execute simultaneously.
    pub fn new(max_concurrent_builds: usize) -> Self {
        TaskCoordinator {
            tasks: DashMap::new(),
            permits: Arc::new(Semaphore::new(max_concurrent_builds)),
        }
    }

    /// Looks up a task record by id.
    pub fn get(&self, id: Uuid) -> Option<BuildTask> {
        self.tasks.get(&id).map(|task| task.clone())
    }

    /// Records an already-satisfied request as a completed task.
    ///
    /// Used when the root already links to a persisted graph: the caller
    /// gets a terminal task without a build ever running.
    pub fn record_completed(&self, root_id: &str, owner: &str, graph_id: &str) -> BuildTask {
        let now = Utc::now();
        let task = BuildTask {
            id: Uuid::new_v4(),
            root_id: root_id.to_string(),
            owner: owner.to_string(),
            status: TaskStatus::Success,
            created_at: now,
            started_at: Some(now),
            finished_at: Some(now),
            result_graph_id: Some(graph_id.to_string()),
            error: None,
            detail: Some("evidence graph already built; returning existing artifact".to_string()),
        };
        self.tasks.insert(task.id, task.clone());
        task
    }

    /// Enqueues a build and spawns its worker.
    ///
    /// Returns the PENDING record immediately; the worker advances it.
    pub fn enqueue(
        self: &Arc<Self>,
        service: Arc<Mutex<GraphService>>,
        root_id: String,
        owner: String,
    ) -> BuildTask {
        let task = BuildTask {
            id: Uuid::new_v4(),
            root_id: root_id.clone(),
            owner: owner.clone(),
            status: TaskStatus::Pending,
            created_at: Utc::now(),
            started_at: None,
            finished_at: None,
            result_graph_id: None,
            error: None,
            detail: None,
        };
        self.tasks.insert(task.id, task.clone());

        let coordinator = Arc::clone(self);
        let task_id = task.id;
        tokio::spawn(async move {
            coordinator.run(service, task_id, root_id, owner).await;
        });

        task
    }

    /// Worker entry point: executes one queued build to a terminal state.
    async fn run(
        &self,
        service: Arc<Mutex<GraphService>>,
        task_id: Uuid,
        root_id: String,
        owner: String,
    ) {
        let permit = self.permits.acquire().await;
        if permit.is_err() {
            self.update(task_id, |task| {
                task.status = TaskStatus::Error;
                task.finished_at = Some(Utc::now());
                task.error = Some("build queue shut down".to_string());
            });
            return;
        }

        self.update(task_id, |task| {
            task.status = TaskStatus::Processing;
            task.started_at = Some(Utc::now());
        });
        tracing::info!(%task_id, root = %root_id, "build started");

        let result = {
            let mut service = service.lock().await;
            service.get_or_build(&root_id, &owner)
        };

        match result {
            Ok(outcome) => {
                tracing::info!(
                    %task_id,
                    graph = %outcome.graph.id,
                    reused = outcome.reused,
                    "build finished"
                );
                self.update(task_id, |task| {
                    task.status = TaskStatus::Success;
                    task.finished_at = Some(Utc::now());
                    task.result_graph_id = Some(outcome.graph.id.clone());
                    task.detail = outcome.warning.clone();
                });
            }
            Err(err) => {
                tracing::error!(%task_id, root = %root_id, error = %err, "build failed");
                self.update(task_id, |task| {
                    task.status = TaskStatus::Error;
                    task.finished_at = Some(Utc::now());
                    task.error = Some(err.to_string());
                });
            }
        }
    }

    /// Applies a mutation to a task record, if it still exists.
    fn update<F: FnOnce(&mut BuildTask)>(&self, id: Uuid, mutate: F) {
        if let Some(mut task) = self.tasks.get_mut(&id) {
            mutate(&mut task);
        }
    }
}
