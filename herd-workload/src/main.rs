//! Herd workload controller
//!
//! Watches every workload kind and reports each workload with the services
//! derived for it.

use anyhow::Context;
use async_trait::async_trait;
use herd_workload::config::HerdConfig;
use herd_workload::kubernetes::client::kube_collaborators;
use herd_workload::kubernetes::watch;
use herd_workload::kubernetes::{
    SyncDispatcher, Workload, WorkloadHandler, WorkloadManager, WorkloadResult,
};
use std::sync::Arc;
use tracing::{info, warn};

/// Logs each synced workload and the services it would expose
struct ServiceReporter {
    name: String,
    namespace: String,
    workloads: WorkloadManager,
}

#[async_trait]
impl WorkloadHandler for ServiceReporter {
    async fn sync(&self, key: &str, workload: Option<&Workload>) -> WorkloadResult<()> {
        let Some(workload) = workload else {
            info!(handler = %self.name, key, "namespace tick, requeueing workloads");
            return self.workloads.requeue_all(&self.namespace).await;
        };

        match workload.derive_services() {
            Ok(services) => {
                for service in &services {
                    let ports: Vec<i32> = service.service_ports.iter().map(|p| p.port).collect();
                    info!(
                        handler = %self.name,
                        workload = %workload.id(),
                        service_type = %service.service_type,
                        headless = service.is_headless(),
                        ports = ?ports,
                        "derived service"
                    );
                }
            }
            Err(e) => {
                warn!(handler = %self.name, workload = %workload.id(), error = %e, "cannot derive services");
            }
        }

        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = HerdConfig::load().context("failed to load configuration")?;

    let _log_guard = config
        .logging
        .to_logging()
        .init()
        .map_err(|e| anyhow::anyhow!("failed to initialize logging: {}", e))?;
    info!("Configuration loaded successfully");

    let client = kube::Client::try_default()
        .await
        .context("failed to connect to Kubernetes")?;
    info!("Connected to Kubernetes API server");

    let (collaborators, requeues) = kube_collaborators(client.clone());
    let workloads = WorkloadManager::new(collaborators);
    let handler = Arc::new(ServiceReporter {
        name: config.controller.handler_name.clone(),
        namespace: config.controller.namespace.clone(),
        workloads: workloads.clone(),
    });
    let dispatcher = Arc::new(SyncDispatcher::new(workloads.clone(), handler));

    let namespace = config.controller.namespace.as_str();
    let mut subscription = watch::subscribe(client, namespace, dispatcher, requeues);

    if config.controller.requeue_on_start {
        match workloads.requeue_all(namespace).await {
            Ok(()) => info!(namespace, "requeued all workloads"),
            Err(e) => warn!(namespace, error = %e, "initial requeue failed"),
        }
    }

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;

    info!("Shutting down workload watchers");
    subscription.cancel();

    Ok(())
}
