//! Kubernetes client backed collaborators
//!
//! Implements the workload read, write and enqueue seams on top of the
//! kube-rs API client.

use crate::kubernetes::error::WorkloadResult;
use crate::kubernetes::workloads::{
    Collaborators, KindClients, ResourceReader, ResourceWriter, WorkQueue, WorkloadObject,
};
use async_trait::async_trait;
use k8s_openapi::api::apps::v1::{DaemonSet, Deployment, ReplicaSet, StatefulSet};
use k8s_openapi::api::batch::v1::{CronJob, Job};
use k8s_openapi::api::core::v1::ReplicationController;
use k8s_openapi::NamespaceResourceScope;
use kube::api::{Api, ListParams, PostParams};
use kube::{Client, ResourceExt};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Workload resource the kube client can read and write
pub trait KubeWorkload:
    WorkloadObject
    + kube::Resource<DynamicType = (), Scope = NamespaceResourceScope>
    + DeserializeOwned
    + Serialize
{
}

impl<K> KubeWorkload for K where
    K: WorkloadObject
        + kube::Resource<DynamicType = (), Scope = NamespaceResourceScope>
        + DeserializeOwned
        + Serialize
{
}

/// Reads and writes one workload kind straight from the API server
pub struct KubeStore<K> {
    client: Client,
    _kind: PhantomData<fn() -> K>,
}

impl<K: KubeWorkload> KubeStore<K> {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            _kind: PhantomData,
        }
    }

    /// API handle for a namespace, cluster wide for `""`
    fn api(&self, namespace: &str) -> Api<K> {
        if namespace.is_empty() {
            Api::all(self.client.clone())
        } else {
            Api::namespaced(self.client.clone(), namespace)
        }
    }
}

#[async_trait]
impl<K: KubeWorkload> ResourceReader<K> for KubeStore<K> {
    async fn get(&self, namespace: &str, name: &str) -> WorkloadResult<Option<K>> {
        Ok(self.api(namespace).get_opt(name).await?)
    }

    async fn list(&self, namespace: &str, label_selector: Option<&str>) -> WorkloadResult<Vec<K>> {
        let mut params = ListParams::default();
        if let Some(selector) = label_selector {
            params = params.labels(selector);
        }

        let list = self.api(namespace).list(&params).await?;
        debug!(kind = %K::WORKLOAD_KIND, namespace, count = list.items.len(), "listed resources");
        Ok(list.items)
    }
}

#[async_trait]
impl<K: KubeWorkload> ResourceWriter<K> for KubeStore<K> {
    async fn update(&self, resource: K) -> WorkloadResult<K> {
        let namespace = resource.namespace().unwrap_or_default();
        let name = resource.name_any();

        let updated = self
            .api(&namespace)
            .replace(&name, &PostParams::default(), &resource)
            .await?;
        Ok(updated)
    }
}

/// Sends `(namespace, name)` pairs back into a kind's event loop
#[derive(Clone)]
pub struct RequeueSender(mpsc::UnboundedSender<(String, String)>);

impl WorkQueue for RequeueSender {
    fn enqueue(&self, namespace: &str, name: &str) {
        if self
            .0
            .send((namespace.to_string(), name.to_string()))
            .is_err()
        {
            warn!(namespace, name, "requeue dropped, event loop not running");
        }
    }
}

pub type RequeueReceiver = mpsc::UnboundedReceiver<(String, String)>;

/// Create a requeue channel for one kind
pub fn requeue_channel() -> (RequeueSender, RequeueReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (RequeueSender(tx), rx)
}

/// Receiving ends of every kind's requeue channel
pub struct RequeueReceivers {
    pub deployments: RequeueReceiver,
    pub replication_controllers: RequeueReceiver,
    pub replica_sets: RequeueReceiver,
    pub daemon_sets: RequeueReceiver,
    pub stateful_sets: RequeueReceiver,
    pub jobs: RequeueReceiver,
    pub cron_jobs: RequeueReceiver,
}

fn kind_clients<K: KubeWorkload>(client: &Client) -> (KindClients<K>, RequeueReceiver) {
    let store = Arc::new(KubeStore::<K>::new(client.clone()));
    let (sender, receiver) = requeue_channel();
    (
        KindClients::new(store.clone(), store, Arc::new(sender)),
        receiver,
    )
}

/// Collaborators for all seven kinds on one client
///
/// Requeued workloads come out of the returned receivers; hand them to
/// [`crate::kubernetes::watch::subscribe`].
pub fn kube_collaborators(client: Client) -> (Collaborators, RequeueReceivers) {
    let (deployments, deployments_rx) = kind_clients::<Deployment>(&client);
    let (replication_controllers, replication_controllers_rx) =
        kind_clients::<ReplicationController>(&client);
    let (replica_sets, replica_sets_rx) = kind_clients::<ReplicaSet>(&client);
    let (daemon_sets, daemon_sets_rx) = kind_clients::<DaemonSet>(&client);
    let (stateful_sets, stateful_sets_rx) = kind_clients::<StatefulSet>(&client);
    let (jobs, jobs_rx) = kind_clients::<Job>(&client);
    let (cron_jobs, cron_jobs_rx) = kind_clients::<CronJob>(&client);

    (
        Collaborators {
            deployments,
            replication_controllers,
            replica_sets,
            daemon_sets,
            stateful_sets,
            jobs,
            cron_jobs,
        },
        RequeueReceivers {
            deployments: deployments_rx,
            replication_controllers: replication_controllers_rx,
            replica_sets: replica_sets_rx,
            daemon_sets: daemon_sets_rx,
            stateful_sets: stateful_sets_rx,
            jobs: jobs_rx,
            cron_jobs: cron_jobs_rx,
        },
    )
}
