//! Common types and constants shared between herd-workload and its consumers

pub mod id;
pub mod ports;

pub use id::WorkloadId;
pub use ports::ContainerPort;

use serde::{Deserialize, Serialize};

/// API version shared by deployments, replication controllers and the apps family
pub const APP_VERSION: &str = "apps/v1beta2";
/// API version of jobs
pub const BATCH_VERSION: &str = "batch/v1";
/// API version of cron jobs
pub const BATCH_BETA_VERSION: &str = "batch/v1beta1";

/// Annotation naming the workload identifiers a resource targets
pub const WORKLOAD_ANNOTATION: &str = "field.cattle.io/targetWorkloadIds";
/// Annotation carrying the JSON encoded port list of a workload
pub const PORTS_ANNOTATION: &str = "field.cattle.io/ports";
/// Label marking resources produced on behalf of a workload
pub const WORKLOAD_LABEL: &str = "workload.user.cattle.io/workload";

/// Reserved key signalling a namespace wide tick rather than a single resource
pub const ALL_WORKLOADS: &str = "_all_workloads_";

/// Service type assigned to services derived from container ports
pub const CLUSTER_IP_SERVICE_TYPE: &str = "ClusterIP";
/// Port kind excluded from service derivation
pub const HOST_PORT_KIND: &str = "HostPort";
/// Cluster IP value of a headless service
pub const HEADLESS_CLUSTER_IP: &str = "None";

/// The seven resource families normalized into a workload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkloadKind {
    Deployment,
    ReplicationController,
    ReplicaSet,
    DaemonSet,
    StatefulSet,
    Job,
    CronJob,
}

impl WorkloadKind {
    /// All kinds, in the order they are listed when collecting a namespace
    pub const ALL: [WorkloadKind; 7] = [
        WorkloadKind::Deployment,
        WorkloadKind::ReplicationController,
        WorkloadKind::ReplicaSet,
        WorkloadKind::DaemonSet,
        WorkloadKind::StatefulSet,
        WorkloadKind::Job,
        WorkloadKind::CronJob,
    ];

    /// Lower-case tag used in workload identifiers
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Deployment => "deployment",
            Self::ReplicationController => "replicationcontroller",
            Self::ReplicaSet => "replicaset",
            Self::DaemonSet => "daemonset",
            Self::StatefulSet => "statefulset",
            Self::Job => "job",
            Self::CronJob => "cronjob",
        }
    }

    /// Kind as it appears in the `kind` field of the API object
    pub fn api_kind(&self) -> &'static str {
        match self {
            Self::Deployment => "Deployment",
            Self::ReplicationController => "ReplicationController",
            Self::ReplicaSet => "ReplicaSet",
            Self::DaemonSet => "DaemonSet",
            Self::StatefulSet => "StatefulSet",
            Self::Job => "Job",
            Self::CronJob => "CronJob",
        }
    }

    pub fn api_version(&self) -> &'static str {
        match self {
            Self::Job => BATCH_VERSION,
            Self::CronJob => BATCH_BETA_VERSION,
            _ => APP_VERSION,
        }
    }

    /// Look up a kind by identifier tag, ignoring case
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.tag().eq_ignore_ascii_case(tag))
    }

    /// Resolve an identifier tag, falling back to deployments for anything
    /// unrecognized (including the `_all_workloads_` sentinel).
    pub fn resolve(tag: &str) -> Self {
        Self::from_tag(tag).unwrap_or(Self::Deployment)
    }
}

impl std::fmt::Display for WorkloadKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

/// Whether `kind` (as found in an owner reference or object) is a workload kind
pub fn is_workload_kind(kind: &str) -> bool {
    WorkloadKind::ALL.iter().any(|k| k.api_kind() == kind)
}

/// Errors shared by workload consumers
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("workload name [{0}] is invalid")]
    InvalidIdentifier(String),
}

pub type Result<T> = std::result::Result<T, Error>;
