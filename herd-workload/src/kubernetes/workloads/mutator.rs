//! Workload mutations
//!
//! Annotation updates and re-queueing, routed back to the backing resource.

use super::normalize::WorkloadObject;
use super::repository;
use super::{Collaborators, KindClients};
use crate::kubernetes::error::WorkloadResult;
use crate::kubernetes::types::Workload;
use herd_common::WorkloadKind;
use tracing::{debug, warn};

/// Write the workload's annotations back onto its backing resource
///
/// Only annotations are copied. A resource that no longer exists is left
/// alone.
pub async fn update_annotations(clients: &Collaborators, workload: &Workload) -> WorkloadResult<()> {
    match workload.kind {
        WorkloadKind::Deployment => replace_annotations(&clients.deployments, workload).await,
        WorkloadKind::ReplicationController => {
            replace_annotations(&clients.replication_controllers, workload).await
        }
        WorkloadKind::ReplicaSet => replace_annotations(&clients.replica_sets, workload).await,
        WorkloadKind::DaemonSet => replace_annotations(&clients.daemon_sets, workload).await,
        WorkloadKind::StatefulSet => replace_annotations(&clients.stateful_sets, workload).await,
        WorkloadKind::Job => replace_annotations(&clients.jobs, workload).await,
        WorkloadKind::CronJob => replace_annotations(&clients.cron_jobs, workload).await,
    }
}

async fn replace_annotations<K: WorkloadObject>(
    clients: &KindClients<K>,
    workload: &Workload,
) -> WorkloadResult<()> {
    let Some(mut to_update) = clients
        .reader
        .get(&workload.namespace, &workload.name)
        .await?
    else {
        debug!(workload = %workload.id(), "backing resource gone, skipping annotation update");
        return Ok(());
    };

    to_update.metadata_mut().annotations = if workload.annotations.is_empty() {
        None
    } else {
        Some(workload.annotations.clone())
    };

    match clients.writer.update(to_update).await {
        Ok(_) => {
            debug!(workload = %workload.id(), "updated workload annotations");
            Ok(())
        }
        Err(e) if e.is_not_found() => {
            warn!(workload = %workload.id(), "backing resource deleted during annotation update");
            Ok(())
        }
        Err(e) => Err(e),
    }
}

/// Re-enqueue a workload on its kind's queue
pub fn requeue(clients: &Collaborators, workload: &Workload) {
    let (namespace, name) = (workload.namespace.as_str(), workload.name.as_str());

    match workload.kind {
        WorkloadKind::Deployment => clients.deployments.queue.enqueue(namespace, name),
        WorkloadKind::ReplicationController => {
            clients.replication_controllers.queue.enqueue(namespace, name)
        }
        WorkloadKind::ReplicaSet => clients.replica_sets.queue.enqueue(namespace, name),
        WorkloadKind::DaemonSet => clients.daemon_sets.queue.enqueue(namespace, name),
        WorkloadKind::StatefulSet => clients.stateful_sets.queue.enqueue(namespace, name),
        WorkloadKind::Job => clients.jobs.queue.enqueue(namespace, name),
        WorkloadKind::CronJob => clients.cron_jobs.queue.enqueue(namespace, name),
    }
}

/// Re-enqueue every workload in a namespace
pub async fn requeue_all(clients: &Collaborators, namespace: &str) -> WorkloadResult<()> {
    let workloads = repository::list_all(clients, namespace).await?;

    debug!(namespace, count = workloads.len(), "requeueing workloads");
    for workload in &workloads {
        requeue(clients, workload);
    }

    Ok(())
}
