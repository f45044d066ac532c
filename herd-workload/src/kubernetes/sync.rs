//! Change event dispatch
//!
//! Turns per-kind change notifications into calls of one kind-agnostic
//! workload handler.

use crate::kubernetes::error::WorkloadResult;
use crate::kubernetes::types::Workload;
use crate::kubernetes::workloads::{WorkloadManager, WorkloadObject};
use async_trait::async_trait;
use futures::{Stream, StreamExt};
use herd_common::{WorkloadId, ALL_WORKLOADS};
use k8s_openapi::api::apps::v1::{DaemonSet, Deployment, ReplicaSet, StatefulSet};
use k8s_openapi::api::batch::v1::{CronJob, Job};
use k8s_openapi::api::core::v1::ReplicationController;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error};

/// Receives normalized workloads
///
/// Called with `workload == None` only for the `_all_workloads_` key.
/// Calls for the same workload never overlap; calls for different
/// workloads may run concurrently.
#[async_trait]
pub trait WorkloadHandler: Send + Sync {
    async fn sync(&self, key: &str, workload: Option<&Workload>) -> WorkloadResult<()>;
}

/// Routes change events of every kind to a [`WorkloadHandler`]
pub struct SyncDispatcher {
    workloads: WorkloadManager,
    handler: Arc<dyn WorkloadHandler>,
}

impl SyncDispatcher {
    pub fn new(workloads: WorkloadManager, handler: Arc<dyn WorkloadHandler>) -> Self {
        Self { workloads, handler }
    }

    pub fn workloads(&self) -> &WorkloadManager {
        &self.workloads
    }

    pub async fn sync_deployment(&self, key: &str, object: Option<&Deployment>) -> WorkloadResult<()> {
        self.dispatch(key, object).await
    }

    pub async fn sync_replication_controller(
        &self,
        key: &str,
        object: Option<&ReplicationController>,
    ) -> WorkloadResult<()> {
        self.dispatch(key, object).await
    }

    pub async fn sync_replica_set(&self, key: &str, object: Option<&ReplicaSet>) -> WorkloadResult<()> {
        self.dispatch(key, object).await
    }

    pub async fn sync_daemon_set(&self, key: &str, object: Option<&DaemonSet>) -> WorkloadResult<()> {
        self.dispatch(key, object).await
    }

    pub async fn sync_stateful_set(&self, key: &str, object: Option<&StatefulSet>) -> WorkloadResult<()> {
        self.dispatch(key, object).await
    }

    pub async fn sync_job(&self, key: &str, object: Option<&Job>) -> WorkloadResult<()> {
        self.dispatch(key, object).await
    }

    pub async fn sync_cron_job(&self, key: &str, object: Option<&CronJob>) -> WorkloadResult<()> {
        self.dispatch(key, object).await
    }

    /// Handle one change event for a resource keyed `<namespace>/<name>`
    ///
    /// Absent and deleting resources are treated as handled. The workload
    /// is re-read through the repository before the handler sees it.
    pub async fn dispatch<K: WorkloadObject>(&self, key: &str, object: Option<&K>) -> WorkloadResult<()> {
        match object {
            Some(object) if !object.is_being_deleted() => {}
            _ => {
                debug!(kind = %K::WORKLOAD_KIND, key, "resource absent or deleting, skipping");
                return Ok(());
            }
        }

        if key == ALL_WORKLOADS {
            return self.handler.sync(key, None).await;
        }

        let (namespace, name) = split_key(key);
        let id = WorkloadId::new(K::WORKLOAD_KIND, namespace, name);
        match self.workloads.get_workload(&id).await? {
            Some(workload) => self.handler.sync(key, Some(&workload)).await,
            None => Ok(()),
        }
    }
}

/// Split a `<namespace>/<name>` queue key; keys without a namespace have none
pub fn split_key(key: &str) -> (&str, &str) {
    key.split_once('/').unwrap_or(("", key))
}

/// Registered event loops, cancelled when dropped
#[derive(Default)]
pub struct Subscription {
    tasks: Vec<JoinHandle<()>>,
}

impl Subscription {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, task: JoinHandle<()>) {
        self.tasks.push(task);
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Whether every event loop has stopped
    pub fn is_finished(&self) -> bool {
        self.tasks.iter().all(|t| t.is_finished())
    }

    /// Stop every event loop
    pub fn cancel(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }

    /// Wait until every event stream ends
    pub async fn join(mut self) {
        for task in std::mem::take(&mut self.tasks) {
            if let Err(e) = task.await {
                if !e.is_cancelled() {
                    error!("workload event loop panicked: {}", e);
                }
            }
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Feed a stream of `(key, resource)` change events for one kind into the
/// dispatcher, one event at a time.
///
/// Handler failures are logged and the loop moves on; retrying is up to
/// whoever produces the events.
pub fn spawn_event_loop<K, S>(events: S, dispatcher: Arc<SyncDispatcher>) -> JoinHandle<()>
where
    K: WorkloadObject,
    S: Stream<Item = (String, Option<K>)> + Send + 'static,
{
    tokio::spawn(async move {
        let mut events = Box::pin(events);
        while let Some((key, object)) = events.next().await {
            if let Err(e) = dispatcher.dispatch(&key, object.as_ref()).await {
                error!(kind = %K::WORKLOAD_KIND, key = %key, error = %e, "failed to sync workload");
            }
        }
        debug!(kind = %K::WORKLOAD_KIND, "event stream closed");
    })
}
