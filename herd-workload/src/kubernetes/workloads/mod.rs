//! Workload management
//!
//! Handles Deployments, ReplicationControllers, ReplicaSets, DaemonSets,
//! StatefulSets, Jobs and CronJobs through one canonical workload view.

pub mod mutator;
pub mod normalize;
pub mod repository;
pub mod selector;

pub use normalize::{normalize, WorkloadObject};

use crate::kubernetes::error::{PartialListError, WorkloadResult};
use crate::kubernetes::types::Workload;
use async_trait::async_trait;
use herd_common::WorkloadId;
use k8s_openapi::api::apps::v1::{DaemonSet, Deployment, ReplicaSet, StatefulSet};
use k8s_openapi::api::batch::v1::{CronJob, Job};
use k8s_openapi::api::core::v1::ReplicationController;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Cached reads of one resource kind
#[async_trait]
pub trait ResourceReader<K: Send + 'static>: Send + Sync {
    /// Fetch a resource, `None` when it does not exist
    async fn get(&self, namespace: &str, name: &str) -> WorkloadResult<Option<K>>;

    /// List resources in a namespace (`""` for all namespaces)
    async fn list(&self, namespace: &str, label_selector: Option<&str>) -> WorkloadResult<Vec<K>>;
}

/// Writes of one resource kind
#[async_trait]
pub trait ResourceWriter<K: Send + 'static>: Send + Sync {
    async fn update(&self, resource: K) -> WorkloadResult<K>;
}

/// Re-delivery of a resource to its change handler
pub trait WorkQueue: Send + Sync {
    fn enqueue(&self, namespace: &str, name: &str);
}

/// Read, write and enqueue handles for one kind
pub struct KindClients<K: Send + 'static> {
    pub reader: Arc<dyn ResourceReader<K>>,
    pub writer: Arc<dyn ResourceWriter<K>>,
    pub queue: Arc<dyn WorkQueue>,
}

impl<K: Send + 'static> KindClients<K> {
    pub fn new(
        reader: Arc<dyn ResourceReader<K>>,
        writer: Arc<dyn ResourceWriter<K>>,
        queue: Arc<dyn WorkQueue>,
    ) -> Self {
        Self {
            reader,
            writer,
            queue,
        }
    }

    /// Use one object for all three roles
    pub fn from_store<S>(store: Arc<S>) -> Self
    where
        S: ResourceReader<K> + ResourceWriter<K> + WorkQueue + 'static,
    {
        Self {
            reader: store.clone(),
            writer: store.clone(),
            queue: store,
        }
    }
}

impl<K: Send + 'static> Clone for KindClients<K> {
    fn clone(&self) -> Self {
        Self {
            reader: self.reader.clone(),
            writer: self.writer.clone(),
            queue: self.queue.clone(),
        }
    }
}

/// Collaborators for every workload kind
#[derive(Clone)]
pub struct Collaborators {
    pub deployments: KindClients<Deployment>,
    pub replication_controllers: KindClients<ReplicationController>,
    pub replica_sets: KindClients<ReplicaSet>,
    pub daemon_sets: KindClients<DaemonSet>,
    pub stateful_sets: KindClients<StatefulSet>,
    pub jobs: KindClients<Job>,
    pub cron_jobs: KindClients<CronJob>,
}

/// Workload manager aggregating all workload operations
#[derive(Clone)]
pub struct WorkloadManager {
    clients: Arc<Collaborators>,
}

impl WorkloadManager {
    pub fn new(clients: Collaborators) -> Self {
        Self {
            clients: Arc::new(clients),
        }
    }

    pub fn clients(&self) -> &Collaborators {
        &self.clients
    }

    // Lookups
    pub async fn get_by_identifier(&self, id: &str) -> WorkloadResult<Option<Workload>> {
        let id = WorkloadId::decode(id)?;
        repository::get_workload(&self.clients, &id).await
    }

    pub async fn get_workload(&self, id: &WorkloadId) -> WorkloadResult<Option<Workload>> {
        repository::get_workload(&self.clients, id).await
    }

    pub async fn list_all(&self, namespace: &str) -> Result<Vec<Workload>, PartialListError> {
        repository::list_all(&self.clients, namespace).await
    }

    // Selector matching
    pub async fn matching_labels(
        &self,
        namespace: &str,
        target_labels: &BTreeMap<String, String>,
    ) -> WorkloadResult<Vec<Workload>> {
        selector::matching_labels(&self.clients, namespace, target_labels).await
    }

    pub async fn matching_selector(
        &self,
        namespace: &str,
        selector_labels: &BTreeMap<String, String>,
    ) -> WorkloadResult<Vec<Workload>> {
        selector::matching_selector(&self.clients, namespace, selector_labels).await
    }

    // Mutations
    pub async fn update_annotations(&self, workload: &Workload) -> WorkloadResult<()> {
        mutator::update_annotations(&self.clients, workload).await
    }

    pub fn requeue(&self, workload: &Workload) {
        mutator::requeue(&self.clients, workload)
    }

    pub async fn requeue_all(&self, namespace: &str) -> WorkloadResult<()> {
        mutator::requeue_all(&self.clients, namespace).await
    }
}
