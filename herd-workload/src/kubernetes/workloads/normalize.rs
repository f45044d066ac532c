//! Workload normalization
//!
//! Per-kind extraction of selector labels and pod template from the seven
//! workload resource kinds.

use crate::kubernetes::types::{Workload, WorkloadResource};
use herd_common::WorkloadKind;
use k8s_openapi::api::apps::v1::{DaemonSet, Deployment, ReplicaSet, StatefulSet};
use k8s_openapi::api::batch::v1::{CronJob, Job};
use k8s_openapi::api::core::v1::{PodTemplateSpec, ReplicationController};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};
use std::collections::BTreeMap;

/// A resource type backing one workload kind
pub trait WorkloadObject:
    k8s_openapi::Metadata<Ty = ObjectMeta> + Clone + std::fmt::Debug + Send + Sync + 'static
{
    const WORKLOAD_KIND: WorkloadKind;

    fn into_resource(self) -> WorkloadResource;

    /// Whether the resource carries a deletion timestamp
    fn is_being_deleted(&self) -> bool {
        self.metadata().deletion_timestamp.is_some()
    }
}

impl WorkloadObject for Deployment {
    const WORKLOAD_KIND: WorkloadKind = WorkloadKind::Deployment;

    fn into_resource(self) -> WorkloadResource {
        WorkloadResource::Deployment(self)
    }
}

impl WorkloadObject for ReplicationController {
    const WORKLOAD_KIND: WorkloadKind = WorkloadKind::ReplicationController;

    fn into_resource(self) -> WorkloadResource {
        WorkloadResource::ReplicationController(self)
    }
}

impl WorkloadObject for ReplicaSet {
    const WORKLOAD_KIND: WorkloadKind = WorkloadKind::ReplicaSet;

    fn into_resource(self) -> WorkloadResource {
        WorkloadResource::ReplicaSet(self)
    }
}

impl WorkloadObject for DaemonSet {
    const WORKLOAD_KIND: WorkloadKind = WorkloadKind::DaemonSet;

    fn into_resource(self) -> WorkloadResource {
        WorkloadResource::DaemonSet(self)
    }
}

impl WorkloadObject for StatefulSet {
    const WORKLOAD_KIND: WorkloadKind = WorkloadKind::StatefulSet;

    fn into_resource(self) -> WorkloadResource {
        WorkloadResource::StatefulSet(self)
    }
}

impl WorkloadObject for Job {
    const WORKLOAD_KIND: WorkloadKind = WorkloadKind::Job;

    fn into_resource(self) -> WorkloadResource {
        WorkloadResource::Job(self)
    }
}

impl WorkloadObject for CronJob {
    const WORKLOAD_KIND: WorkloadKind = WorkloadKind::CronJob;

    fn into_resource(self) -> WorkloadResource {
        WorkloadResource::CronJob(self)
    }
}

/// Normalize any workload object
pub fn normalize<K: WorkloadObject>(object: K) -> Option<Workload> {
    Workload::from_resource(&object.into_resource())
}

impl Workload {
    /// Build the canonical view of a resource.
    ///
    /// Returns `None` for resources that are being deleted.
    pub fn from_resource(resource: &WorkloadResource) -> Option<Workload> {
        let (metadata, selector, template) = match resource {
            WorkloadResource::ReplicationController(o) => {
                let spec = o.spec.as_ref();
                let selector = LabelSelector {
                    match_labels: spec.and_then(|s| s.selector.clone()),
                    ..Default::default()
                };
                (
                    &o.metadata,
                    Some(selector),
                    spec.and_then(|s| s.template.clone()),
                )
            }
            WorkloadResource::ReplicaSet(o) => {
                let spec = o.spec.as_ref();
                (
                    &o.metadata,
                    spec.map(|s| s.selector.clone()),
                    spec.and_then(|s| s.template.clone()),
                )
            }
            WorkloadResource::DaemonSet(o) => {
                let spec = o.spec.as_ref();
                (
                    &o.metadata,
                    spec.map(|s| s.selector.clone()),
                    spec.map(|s| s.template.clone()),
                )
            }
            WorkloadResource::StatefulSet(o) => {
                let spec = o.spec.as_ref();
                (
                    &o.metadata,
                    spec.map(|s| s.selector.clone()),
                    spec.map(|s| s.template.clone()),
                )
            }
            WorkloadResource::Job(o) => {
                let spec = o.spec.as_ref();
                (
                    &o.metadata,
                    spec.and_then(|s| s.selector.as_ref()).map(match_labels_only),
                    spec.map(|s| s.template.clone()),
                )
            }
            WorkloadResource::CronJob(o) => {
                let job_spec = o.spec.as_ref().and_then(|s| s.job_template.spec.as_ref());
                (
                    &o.metadata,
                    job_spec
                        .and_then(|s| s.selector.as_ref())
                        .map(match_labels_only),
                    job_spec.map(|s| s.template.clone()),
                )
            }
            WorkloadResource::Deployment(o) => {
                let spec = o.spec.as_ref();
                (
                    &o.metadata,
                    spec.map(|s| s.selector.clone()),
                    spec.map(|s| s.template.clone()),
                )
            }
        };

        if metadata.deletion_timestamp.is_some() {
            return None;
        }

        Some(build(resource.kind(), metadata, selector.as_ref(), template))
    }
}

/// Keep only the `matchLabels` part of a selector
fn match_labels_only(selector: &LabelSelector) -> LabelSelector {
    LabelSelector {
        match_labels: selector.match_labels.clone(),
        match_expressions: None,
    }
}

fn selector_labels(selector: Option<&LabelSelector>) -> Option<BTreeMap<String, String>> {
    selector.map(|s| s.match_labels.clone().unwrap_or_default())
}

fn build(
    kind: WorkloadKind,
    metadata: &ObjectMeta,
    selector: Option<&LabelSelector>,
    template: Option<PodTemplateSpec>,
) -> Workload {
    let name = metadata.name.clone().unwrap_or_default();
    let namespace = metadata.namespace.clone().unwrap_or_default();

    Workload {
        key: format!("{}/{}", namespace, name),
        name,
        namespace,
        uid: metadata.uid.clone().unwrap_or_default(),
        kind,
        api_version: kind.api_version().to_string(),
        selector_labels: selector_labels(selector),
        annotations: metadata.annotations.clone().unwrap_or_default(),
        labels: metadata.labels.clone().unwrap_or_default(),
        template_spec: template,
        owner_references: metadata.owner_references.clone().unwrap_or_default(),
    }
}
