//! Workload lookups
//!
//! Resolves identifiers and namespaces into canonical workloads through the
//! per-kind read collaborators.

use super::normalize::{normalize, WorkloadObject};
use super::{Collaborators, KindClients};
use crate::kubernetes::error::{PartialListError, WorkloadResult};
use crate::kubernetes::types::Workload;
use herd_common::{WorkloadId, WorkloadKind};
use tracing::debug;

/// Look up a workload by identifier
///
/// Missing and soft-deleted resources resolve to `None`. Unknown kind tags
/// are looked up as deployments.
pub async fn get_workload(
    clients: &Collaborators,
    id: &WorkloadId,
) -> WorkloadResult<Option<Workload>> {
    let (namespace, name) = (id.namespace.as_str(), id.name.as_str());

    match id.workload_kind() {
        WorkloadKind::ReplicationController => {
            fetch(&clients.replication_controllers, namespace, name).await
        }
        WorkloadKind::ReplicaSet => fetch(&clients.replica_sets, namespace, name).await,
        WorkloadKind::DaemonSet => fetch(&clients.daemon_sets, namespace, name).await,
        WorkloadKind::StatefulSet => fetch(&clients.stateful_sets, namespace, name).await,
        WorkloadKind::Job => fetch(&clients.jobs, namespace, name).await,
        WorkloadKind::CronJob => fetch(&clients.cron_jobs, namespace, name).await,
        WorkloadKind::Deployment => fetch(&clients.deployments, namespace, name).await,
    }
}

async fn fetch<K: WorkloadObject>(
    clients: &KindClients<K>,
    namespace: &str,
    name: &str,
) -> WorkloadResult<Option<Workload>> {
    match clients.reader.get(namespace, name).await? {
        Some(object) => Ok(normalize(object)),
        None => Ok(None),
    }
}

/// List every workload in a namespace (`""` for all namespaces)
///
/// Kinds are read one after another without a shared snapshot. The first
/// failure stops the listing and is returned together with the workloads
/// collected so far.
pub async fn list_all(
    clients: &Collaborators,
    namespace: &str,
) -> Result<Vec<Workload>, PartialListError> {
    let mut workloads = Vec::new();

    for kind in WorkloadKind::ALL {
        let listed = match kind {
            WorkloadKind::Deployment => list_names(&clients.deployments, namespace).await,
            WorkloadKind::ReplicationController => {
                list_names(&clients.replication_controllers, namespace).await
            }
            WorkloadKind::ReplicaSet => list_names(&clients.replica_sets, namespace).await,
            WorkloadKind::DaemonSet => list_names(&clients.daemon_sets, namespace).await,
            WorkloadKind::StatefulSet => list_names(&clients.stateful_sets, namespace).await,
            WorkloadKind::Job => list_names(&clients.jobs, namespace).await,
            WorkloadKind::CronJob => list_names(&clients.cron_jobs, namespace).await,
        };

        let names = match listed {
            Ok(names) => names,
            Err(source) => return Err(PartialListError { workloads, source }),
        };

        for (object_namespace, name) in names {
            let id = WorkloadId::new(kind, object_namespace, name);
            match get_workload(clients, &id).await {
                Ok(Some(workload)) => workloads.push(workload),
                Ok(None) => debug!(workload = %id, "workload vanished while listing"),
                Err(source) => return Err(PartialListError { workloads, source }),
            }
        }
    }

    Ok(workloads)
}

async fn list_names<K: WorkloadObject>(
    clients: &KindClients<K>,
    namespace: &str,
) -> WorkloadResult<Vec<(String, String)>> {
    let objects = clients.reader.list(namespace, None).await?;

    Ok(objects
        .iter()
        .map(|object| {
            let meta = object.metadata();
            (
                meta.namespace.clone().unwrap_or_else(|| namespace.to_string()),
                meta.name.clone().unwrap_or_default(),
            )
        })
        .collect())
}
