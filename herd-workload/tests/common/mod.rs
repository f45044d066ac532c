//! Common test utilities and helpers
//!
//! In-memory stand-ins for the per-kind read, write and enqueue
//! collaborators, plus resource fixtures.

#![allow(dead_code)]

use async_trait::async_trait;
use herd_workload::kubernetes::{
    Collaborators, KindClients, ResourceReader, ResourceWriter, WorkQueue, WorkloadError,
    WorkloadHandler, WorkloadManager, WorkloadObject, WorkloadResult, Workload,
};
use k8s_openapi::api::apps::v1::{
    DaemonSet, DaemonSetSpec, Deployment, DeploymentSpec, ReplicaSet, ReplicaSetSpec, StatefulSet,
    StatefulSetSpec,
};
use k8s_openapi::api::batch::v1::{CronJob, CronJobSpec, Job, JobSpec, JobTemplateSpec};
use k8s_openapi::api::core::v1::{
    Container, ContainerPort, PodSpec, PodTemplateSpec, ReplicationController,
    ReplicationControllerSpec,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta, Time};
use k8s_openapi::Metadata;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};

/// How a fake update should fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateFailure {
    NotFound,
    Conflict,
}

/// Fake read, write and enqueue collaborator for one kind
pub struct FakeStore<K> {
    objects: Mutex<BTreeMap<(String, String), K>>,
    hidden: Mutex<BTreeSet<(String, String)>>,
    updates: Mutex<Vec<K>>,
    enqueued: Mutex<Vec<(String, String)>>,
    list_error: Mutex<Option<String>>,
    get_error: Mutex<Option<String>>,
    update_failure: Mutex<Option<UpdateFailure>>,
    list_calls: Mutex<usize>,
}

impl<K: WorkloadObject> Default for FakeStore<K> {
    fn default() -> Self {
        Self {
            objects: Mutex::new(BTreeMap::new()),
            hidden: Mutex::new(BTreeSet::new()),
            updates: Mutex::new(Vec::new()),
            enqueued: Mutex::new(Vec::new()),
            list_error: Mutex::new(None),
            get_error: Mutex::new(None),
            update_failure: Mutex::new(None),
            list_calls: Mutex::new(0),
        }
    }
}

fn object_key<K: WorkloadObject>(object: &K) -> (String, String) {
    let meta = object.metadata();
    (
        meta.namespace.clone().unwrap_or_default(),
        meta.name.clone().unwrap_or_default(),
    )
}

impl<K: WorkloadObject> FakeStore<K> {
    pub fn insert(&self, object: K) {
        self.objects
            .lock()
            .unwrap()
            .insert(object_key(&object), object);
    }

    /// Keep listing the resource but answer `None` when it is fetched
    pub fn hide_on_get(&self, namespace: &str, name: &str) {
        self.hidden
            .lock()
            .unwrap()
            .insert((namespace.to_string(), name.to_string()));
    }

    pub fn fail_list(&self, message: &str) {
        *self.list_error.lock().unwrap() = Some(message.to_string());
    }

    pub fn fail_get(&self, message: &str) {
        *self.get_error.lock().unwrap() = Some(message.to_string());
    }

    pub fn fail_update(&self, failure: UpdateFailure) {
        *self.update_failure.lock().unwrap() = Some(failure);
    }

    pub fn stored(&self, namespace: &str, name: &str) -> Option<K> {
        self.objects
            .lock()
            .unwrap()
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
    }

    pub fn updates(&self) -> Vec<K> {
        self.updates.lock().unwrap().clone()
    }

    pub fn enqueued(&self) -> Vec<(String, String)> {
        self.enqueued.lock().unwrap().clone()
    }

    pub fn list_calls(&self) -> usize {
        *self.list_calls.lock().unwrap()
    }
}

#[async_trait]
impl<K: WorkloadObject> ResourceReader<K> for FakeStore<K> {
    async fn get(&self, namespace: &str, name: &str) -> WorkloadResult<Option<K>> {
        if let Some(message) = self.get_error.lock().unwrap().clone() {
            return Err(WorkloadError::Collaborator(message));
        }

        let key = (namespace.to_string(), name.to_string());
        if self.hidden.lock().unwrap().contains(&key) {
            return Ok(None);
        }

        Ok(self.objects.lock().unwrap().get(&key).cloned())
    }

    async fn list(&self, namespace: &str, _label_selector: Option<&str>) -> WorkloadResult<Vec<K>> {
        *self.list_calls.lock().unwrap() += 1;

        if let Some(message) = self.list_error.lock().unwrap().clone() {
            return Err(WorkloadError::Collaborator(message));
        }

        Ok(self
            .objects
            .lock()
            .unwrap()
            .iter()
            .filter(|((ns, _), _)| namespace.is_empty() || ns == namespace)
            .map(|(_, object)| object.clone())
            .collect())
    }
}

#[async_trait]
impl<K: WorkloadObject> ResourceWriter<K> for FakeStore<K> {
    async fn update(&self, resource: K) -> WorkloadResult<K> {
        self.updates.lock().unwrap().push(resource.clone());

        let (namespace, name) = object_key(&resource);
        match *self.update_failure.lock().unwrap() {
            Some(UpdateFailure::NotFound) => {
                return Err(WorkloadError::NotFound {
                    kind: K::WORKLOAD_KIND,
                    namespace,
                    name,
                })
            }
            Some(UpdateFailure::Conflict) => {
                return Err(WorkloadError::Collaborator(format!(
                    "conflict updating {}/{}",
                    namespace, name
                )))
            }
            None => {}
        }

        self.objects
            .lock()
            .unwrap()
            .insert((namespace, name), resource.clone());
        Ok(resource)
    }
}

impl<K: WorkloadObject> WorkQueue for FakeStore<K> {
    fn enqueue(&self, namespace: &str, name: &str) {
        self.enqueued
            .lock()
            .unwrap()
            .push((namespace.to_string(), name.to_string()));
    }
}

/// One fake store per workload kind
#[derive(Default)]
pub struct Fakes {
    pub deployments: Arc<FakeStore<Deployment>>,
    pub replication_controllers: Arc<FakeStore<ReplicationController>>,
    pub replica_sets: Arc<FakeStore<ReplicaSet>>,
    pub daemon_sets: Arc<FakeStore<DaemonSet>>,
    pub stateful_sets: Arc<FakeStore<StatefulSet>>,
    pub jobs: Arc<FakeStore<Job>>,
    pub cron_jobs: Arc<FakeStore<CronJob>>,
}

impl Fakes {
    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            deployments: KindClients::from_store(self.deployments.clone()),
            replication_controllers: KindClients::from_store(self.replication_controllers.clone()),
            replica_sets: KindClients::from_store(self.replica_sets.clone()),
            daemon_sets: KindClients::from_store(self.daemon_sets.clone()),
            stateful_sets: KindClients::from_store(self.stateful_sets.clone()),
            jobs: KindClients::from_store(self.jobs.clone()),
            cron_jobs: KindClients::from_store(self.cron_jobs.clone()),
        }
    }

    pub fn manager(&self) -> WorkloadManager {
        WorkloadManager::new(self.collaborators())
    }

    /// Every enqueue across all kinds
    pub fn all_enqueued(&self) -> Vec<(String, String)> {
        let mut all = Vec::new();
        all.extend(self.deployments.enqueued());
        all.extend(self.replication_controllers.enqueued());
        all.extend(self.replica_sets.enqueued());
        all.extend(self.daemon_sets.enqueued());
        all.extend(self.stateful_sets.enqueued());
        all.extend(self.jobs.enqueued());
        all.extend(self.cron_jobs.enqueued());
        all
    }
}

/// Records every handler invocation
#[derive(Default)]
pub struct RecordingHandler {
    calls: Mutex<Vec<(String, Option<Workload>)>>,
    fail_with: Mutex<Option<String>>,
}

impl RecordingHandler {
    pub fn fail_with(&self, message: &str) {
        *self.fail_with.lock().unwrap() = Some(message.to_string());
    }

    pub fn calls(&self) -> Vec<(String, Option<Workload>)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl WorkloadHandler for RecordingHandler {
    async fn sync(&self, key: &str, workload: Option<&Workload>) -> WorkloadResult<()> {
        self.calls
            .lock()
            .unwrap()
            .push((key.to_string(), workload.cloned()));

        match self.fail_with.lock().unwrap().clone() {
            Some(message) => Err(WorkloadError::Handler(message)),
            None => Ok(()),
        }
    }
}

// ============== Fixtures ==============

pub fn labels(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

pub fn meta(namespace: &str, name: &str) -> ObjectMeta {
    ObjectMeta {
        name: Some(name.to_string()),
        namespace: Some(namespace.to_string()),
        uid: Some(format!("uid-{}-{}", namespace, name)),
        ..Default::default()
    }
}

pub fn with_labels<K: WorkloadObject>(mut object: K, pairs: &[(&str, &str)]) -> K {
    object.metadata_mut().labels = Some(labels(pairs));
    object
}

pub fn with_annotations<K: WorkloadObject>(mut object: K, pairs: &[(&str, &str)]) -> K {
    object.metadata_mut().annotations = Some(labels(pairs));
    object
}

pub fn deleting<K: WorkloadObject>(mut object: K) -> K {
    object.metadata_mut().deletion_timestamp = Some(Time(chrono::Utc::now()));
    object
}

pub fn selector(pairs: &[(&str, &str)]) -> LabelSelector {
    LabelSelector {
        match_labels: Some(labels(pairs)),
        match_expressions: None,
    }
}

pub fn pod_template(ports: &[i32]) -> PodTemplateSpec {
    PodTemplateSpec {
        metadata: None,
        spec: Some(PodSpec {
            containers: vec![Container {
                name: "app".to_string(),
                ports: Some(
                    ports
                        .iter()
                        .map(|port| ContainerPort {
                            container_port: *port,
                            protocol: Some("TCP".to_string()),
                            ..Default::default()
                        })
                        .collect(),
                ),
                ..Default::default()
            }],
            ..Default::default()
        }),
    }
}

pub fn deployment(namespace: &str, name: &str, sel: &[(&str, &str)]) -> Deployment {
    Deployment {
        metadata: meta(namespace, name),
        spec: Some(DeploymentSpec {
            selector: selector(sel),
            template: pod_template(&[8080]),
            ..Default::default()
        }),
        ..Default::default()
    }
}

pub fn replication_controller(
    namespace: &str,
    name: &str,
    sel: &[(&str, &str)],
) -> ReplicationController {
    ReplicationController {
        metadata: meta(namespace, name),
        spec: Some(ReplicationControllerSpec {
            selector: Some(labels(sel)),
            template: Some(pod_template(&[80])),
            ..Default::default()
        }),
        ..Default::default()
    }
}

pub fn replica_set(namespace: &str, name: &str, sel: &[(&str, &str)]) -> ReplicaSet {
    ReplicaSet {
        metadata: meta(namespace, name),
        spec: Some(ReplicaSetSpec {
            selector: selector(sel),
            template: Some(pod_template(&[80])),
            ..Default::default()
        }),
        ..Default::default()
    }
}

pub fn daemon_set(namespace: &str, name: &str, sel: &[(&str, &str)]) -> DaemonSet {
    DaemonSet {
        metadata: meta(namespace, name),
        spec: Some(DaemonSetSpec {
            selector: selector(sel),
            template: pod_template(&[9100]),
            ..Default::default()
        }),
        ..Default::default()
    }
}

pub fn stateful_set(namespace: &str, name: &str, sel: &[(&str, &str)]) -> StatefulSet {
    StatefulSet {
        metadata: meta(namespace, name),
        spec: Some(StatefulSetSpec {
            selector: selector(sel),
            template: pod_template(&[5432]),
            ..Default::default()
        }),
        ..Default::default()
    }
}

pub fn job(namespace: &str, name: &str, sel: &[(&str, &str)]) -> Job {
    Job {
        metadata: meta(namespace, name),
        spec: Some(JobSpec {
            selector: Some(selector(sel)),
            template: pod_template(&[]),
            ..Default::default()
        }),
        ..Default::default()
    }
}

pub fn cron_job(namespace: &str, name: &str, sel: &[(&str, &str)]) -> CronJob {
    CronJob {
        metadata: meta(namespace, name),
        spec: Some(CronJobSpec {
            schedule: "*/5 * * * *".to_string(),
            job_template: JobTemplateSpec {
                metadata: None,
                spec: Some(JobSpec {
                    selector: Some(selector(sel)),
                    template: pod_template(&[]),
                    ..Default::default()
                }),
            },
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// One workload of every kind in `default`, named after its kind
pub fn populated() -> Fakes {
    let fakes = Fakes::default();
    fakes
        .deployments
        .insert(deployment("default", "web", &[("app", "web")]));
    fakes
        .replication_controllers
        .insert(replication_controller("default", "legacy", &[("app", "legacy")]));
    fakes
        .replica_sets
        .insert(replica_set("default", "web-5d9f", &[("app", "web")]));
    fakes
        .daemon_sets
        .insert(daemon_set("default", "node-exporter", &[("app", "node-exporter")]));
    fakes
        .stateful_sets
        .insert(stateful_set("default", "db", &[("app", "db")]));
    fakes
        .jobs
        .insert(job("default", "migrate", &[("job", "migrate")]));
    fakes
        .cron_jobs
        .insert(cron_job("default", "backup", &[("job", "backup")]));
    fakes
}
