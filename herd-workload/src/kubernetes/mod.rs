//! Kubernetes workload integration
//!
//! Provides one canonical view over the seven Kubernetes workload kinds:
//! - Normalization of Deployments, ReplicationControllers, ReplicaSets,
//!   DaemonSets, StatefulSets, Jobs and CronJobs into a `Workload`
//! - Lookup, listing and selector matching across kinds
//! - Annotation write-back and re-queueing
//! - Change event dispatch to a single workload handler
//! - Service derivation from container ports

pub mod error;
pub mod networking;
pub mod sync;
pub mod types;
pub mod workloads;

#[cfg(feature = "kubernetes")]
pub mod client;
#[cfg(feature = "kubernetes")]
pub mod watch;

pub use error::{PartialListError, WorkloadError, WorkloadResult};
pub use sync::{SyncDispatcher, Subscription, WorkloadHandler};
pub use types::{ServiceType, Workload, WorkloadResource, WorkloadService};
pub use workloads::{
    Collaborators, KindClients, ResourceReader, ResourceWriter, WorkQueue, WorkloadManager,
    WorkloadObject,
};
