//! Workload types
//!
//! Kind-agnostic views built from the seven workload resource kinds.

use herd_common::{WorkloadId, WorkloadKind};
use k8s_openapi::api::apps::v1::{DaemonSet, Deployment, ReplicaSet, StatefulSet};
use k8s_openapi::api::batch::v1::{CronJob, Job};
use k8s_openapi::api::core::v1::{PodTemplateSpec, ReplicationController, ServicePort};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use std::collections::BTreeMap;

/// Canonical view of a workload resource
///
/// Rebuilt from the backing resource on every lookup and never cached.
#[derive(Debug, Clone, PartialEq)]
pub struct Workload {
    pub name: String,
    pub namespace: String,
    /// UID of the backing resource
    pub uid: String,
    pub kind: WorkloadKind,
    pub api_version: String,
    /// `None` when the backing resource has no selector
    pub selector_labels: Option<BTreeMap<String, String>>,
    pub annotations: BTreeMap<String, String>,
    pub labels: BTreeMap<String, String>,
    pub template_spec: Option<PodTemplateSpec>,
    pub owner_references: Vec<OwnerReference>,
    /// `<namespace>/<name>`, not unique across kinds
    pub key: String,
}

impl Workload {
    /// Identifier that is unique across kinds
    pub fn id(&self) -> WorkloadId {
        WorkloadId::new(self.kind, &self.namespace, &self.name)
    }

    /// Owner reference for objects created on behalf of this workload
    pub fn owner_reference(&self) -> OwnerReference {
        OwnerReference {
            api_version: self.api_version.clone(),
            kind: self.kind.api_kind().to_string(),
            name: self.name.clone(),
            uid: self.uid.clone(),
            controller: Some(true),
            block_owner_deletion: Some(true),
        }
    }

    /// Raw value of the ports annotation, if set
    pub fn ports_annotation(&self) -> Option<&str> {
        self.annotations
            .get(herd_common::PORTS_ANNOTATION)
            .map(String::as_str)
    }
}

/// Backing resource of a workload, one variant per kind
#[derive(Debug, Clone, PartialEq)]
pub enum WorkloadResource {
    Deployment(Deployment),
    ReplicationController(ReplicationController),
    ReplicaSet(ReplicaSet),
    DaemonSet(DaemonSet),
    StatefulSet(StatefulSet),
    Job(Job),
    CronJob(CronJob),
}

impl WorkloadResource {
    pub fn kind(&self) -> WorkloadKind {
        match self {
            Self::Deployment(_) => WorkloadKind::Deployment,
            Self::ReplicationController(_) => WorkloadKind::ReplicationController,
            Self::ReplicaSet(_) => WorkloadKind::ReplicaSet,
            Self::DaemonSet(_) => WorkloadKind::DaemonSet,
            Self::StatefulSet(_) => WorkloadKind::StatefulSet,
            Self::Job(_) => WorkloadKind::Job,
            Self::CronJob(_) => WorkloadKind::CronJob,
        }
    }
}

/// Service type tag
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ServiceType {
    #[default]
    ClusterIP,
    NodePort,
    LoadBalancer,
    ExternalName,
    /// Any other tag found in a ports annotation, kept verbatim
    Other(String),
}

impl ServiceType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::ClusterIP => "ClusterIP",
            Self::NodePort => "NodePort",
            Self::LoadBalancer => "LoadBalancer",
            Self::ExternalName => "ExternalName",
            Self::Other(tag) => tag,
        }
    }
}

impl From<&str> for ServiceType {
    fn from(tag: &str) -> Self {
        match tag {
            "ClusterIP" => Self::ClusterIP,
            "NodePort" => Self::NodePort,
            "LoadBalancer" => Self::LoadBalancer,
            "ExternalName" => Self::ExternalName,
            other => Self::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for ServiceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Service descriptor derived from a workload
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkloadService {
    pub service_type: ServiceType,
    /// `Some("None")` for headless services, unset when assigned by the cluster
    pub cluster_ip: Option<String>,
    pub service_ports: Vec<ServicePort>,
}

impl WorkloadService {
    pub fn is_headless(&self) -> bool {
        self.cluster_ip.as_deref() == Some(herd_common::HEADLESS_CLUSTER_IP)
    }
}
