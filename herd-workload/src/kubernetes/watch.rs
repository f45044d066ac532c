//! Workload resource watching
//!
//! One kube-rs watcher per workload kind, merged with that kind's requeue
//! channel and fed to the sync dispatcher.

use crate::kubernetes::client::{KubeWorkload, RequeueReceiver, RequeueReceivers};
use crate::kubernetes::sync::{spawn_event_loop, Subscription, SyncDispatcher};
use crate::kubernetes::workloads::ResourceReader;
use futures::{stream, Stream, StreamExt};
use k8s_openapi::api::apps::v1::{DaemonSet, Deployment, ReplicaSet, StatefulSet};
use k8s_openapi::api::batch::v1::{CronJob, Job};
use k8s_openapi::api::core::v1::ReplicationController;
use kube::api::Api;
use kube::runtime::watcher::Event;
use kube::runtime::{watcher, WatchStreamExt};
use kube::{Client, ResourceExt};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Watch every workload kind in a namespace (`""` for all namespaces)
///
/// Dropping or cancelling the returned subscription stops all watchers.
pub fn subscribe(
    client: Client,
    namespace: &str,
    dispatcher: Arc<SyncDispatcher>,
    requeues: RequeueReceivers,
) -> Subscription {
    let clients = dispatcher.workloads().clients().clone();
    let mut subscription = Subscription::new();

    subscription.push(watch_kind::<Deployment>(
        &client,
        namespace,
        clients.deployments.reader,
        requeues.deployments,
        dispatcher.clone(),
    ));
    subscription.push(watch_kind::<ReplicationController>(
        &client,
        namespace,
        clients.replication_controllers.reader,
        requeues.replication_controllers,
        dispatcher.clone(),
    ));
    subscription.push(watch_kind::<ReplicaSet>(
        &client,
        namespace,
        clients.replica_sets.reader,
        requeues.replica_sets,
        dispatcher.clone(),
    ));
    subscription.push(watch_kind::<DaemonSet>(
        &client,
        namespace,
        clients.daemon_sets.reader,
        requeues.daemon_sets,
        dispatcher.clone(),
    ));
    subscription.push(watch_kind::<StatefulSet>(
        &client,
        namespace,
        clients.stateful_sets.reader,
        requeues.stateful_sets,
        dispatcher.clone(),
    ));
    subscription.push(watch_kind::<Job>(
        &client,
        namespace,
        clients.jobs.reader,
        requeues.jobs,
        dispatcher.clone(),
    ));
    subscription.push(watch_kind::<CronJob>(
        &client,
        namespace,
        clients.cron_jobs.reader,
        requeues.cron_jobs,
        dispatcher,
    ));

    info!(namespace, watchers = subscription.len(), "watching workloads");
    subscription
}

fn watch_kind<K: KubeWorkload>(
    client: &Client,
    namespace: &str,
    reader: Arc<dyn ResourceReader<K>>,
    requeues: RequeueReceiver,
    dispatcher: Arc<SyncDispatcher>,
) -> JoinHandle<()> {
    let api: Api<K> = if namespace.is_empty() {
        Api::all(client.clone())
    } else {
        Api::namespaced(client.clone(), namespace)
    };

    let changes = watcher(api, watcher::Config::default())
        .default_backoff()
        .filter_map(|event| async move {
            match event {
                Ok(Event::Apply(object)) | Ok(Event::InitApply(object)) => {
                    Some((object_key(&object), Some(object)))
                }
                Ok(Event::Delete(object)) => Some((object_key(&object), None)),
                Ok(Event::Init) | Ok(Event::InitDone) => None,
                Err(e) => {
                    warn!(kind = %K::WORKLOAD_KIND, error = %e, "workload watch error");
                    None
                }
            }
        });

    spawn_event_loop(stream::select(changes, requeued(requeues, reader)), dispatcher)
}

/// Re-read each requeued resource so it is dispatched like a change event
fn requeued<K: KubeWorkload>(
    receiver: RequeueReceiver,
    reader: Arc<dyn ResourceReader<K>>,
) -> impl Stream<Item = (String, Option<K>)> + Send + 'static {
    stream::unfold((receiver, reader), |(mut receiver, reader)| async move {
        let (namespace, name) = receiver.recv().await?;
        let object = match reader.get(&namespace, &name).await {
            Ok(object) => object,
            Err(e) => {
                warn!(kind = %K::WORKLOAD_KIND, namespace = %namespace, name = %name, error = %e, "failed to read requeued workload");
                None
            }
        };
        Some(((queue_key(&namespace, &name), object), (receiver, reader)))
    })
}

fn object_key<K: KubeWorkload>(object: &K) -> String {
    queue_key(&object.namespace().unwrap_or_default(), &object.name_any())
}

/// `<namespace>/<name>`, or just the name outside a namespace
pub fn queue_key(namespace: &str, name: &str) -> String {
    if namespace.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", namespace, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kubernetes::sync::split_key;

    #[test]
    fn test_queue_key() {
        assert_eq!(queue_key("default", "web"), "default/web");
        assert_eq!(queue_key("", "web"), "web");
    }

    #[test]
    fn test_queue_key_splits_back() {
        assert_eq!(split_key(&queue_key("default", "web")), ("default", "web"));
        assert_eq!(split_key(&queue_key("", "web")), ("", "web"));
    }
}
