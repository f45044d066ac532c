//! Label selector matching between workloads and label sets

use super::repository;
use super::Collaborators;
use crate::kubernetes::error::WorkloadResult;
use crate::kubernetes::types::Workload;
use std::collections::BTreeMap;

/// Whether `labels` satisfies an equality selector.
///
/// An empty or absent selector matches nothing.
pub fn selector_matches(
    selector: Option<&BTreeMap<String, String>>,
    labels: &BTreeMap<String, String>,
) -> bool {
    match selector {
        Some(selector) if !selector.is_empty() => selector
            .iter()
            .all(|(key, value)| labels.get(key) == Some(value)),
        _ => false,
    }
}

/// Workloads whose own selector is satisfied by `target_labels`
pub async fn matching_labels(
    clients: &Collaborators,
    namespace: &str,
    target_labels: &BTreeMap<String, String>,
) -> WorkloadResult<Vec<Workload>> {
    let workloads = repository::list_all(clients, namespace).await?;

    Ok(workloads
        .into_iter()
        .filter(|w| selector_matches(w.selector_labels.as_ref(), target_labels))
        .collect())
}

/// Workloads whose labels satisfy `selector_labels`
pub async fn matching_selector(
    clients: &Collaborators,
    namespace: &str,
    selector_labels: &BTreeMap<String, String>,
) -> WorkloadResult<Vec<Workload>> {
    let workloads = repository::list_all(clients, namespace).await?;

    Ok(workloads
        .into_iter()
        .filter(|w| selector_matches(Some(selector_labels), &w.labels))
        .collect())
}
