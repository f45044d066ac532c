//! Service derivation
//!
//! Builds service descriptors for a workload from its pod template's
//! container ports or from the ports annotation.

use crate::kubernetes::error::{WorkloadError, WorkloadResult};
use crate::kubernetes::types::{ServiceType, Workload, WorkloadService};
use herd_common::{ContainerPort, HEADLESS_CLUSTER_IP};
use k8s_openapi::api::core::v1::ServicePort;
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use std::collections::BTreeMap;

/// One headless cluster-local service covering every declared container port
///
/// Ports are named `<port name or number>-<container name>`.
pub fn from_containers(workload: &Workload) -> WorkloadService {
    let containers = workload
        .template_spec
        .as_ref()
        .and_then(|t| t.spec.as_ref())
        .map(|s| s.containers.as_slice())
        .unwrap_or_default();

    let service_ports = containers
        .iter()
        .flat_map(|container| {
            container
                .ports
                .iter()
                .flatten()
                .map(move |port| {
                    let prefix = match port.name.as_deref() {
                        Some(name) if !name.is_empty() => name.to_string(),
                        _ => port.container_port.to_string(),
                    };

                    ServicePort {
                        name: Some(format!("{}-{}", prefix, container.name)),
                        port: port.container_port,
                        target_port: Some(parse_target_port(&port.container_port.to_string())),
                        protocol: port.protocol.clone(),
                        ..Default::default()
                    }
                })
        })
        .collect();

    WorkloadService {
        service_type: ServiceType::ClusterIP,
        cluster_ip: Some(HEADLESS_CLUSTER_IP.to_string()),
        service_ports,
    }
}

/// One service per service type named in the ports annotation
///
/// `HostPort` entries are skipped. The cluster IP is left for the cluster
/// to assign.
pub fn from_ports_annotation(annotation: &str) -> WorkloadResult<Vec<WorkloadService>> {
    let ports = ContainerPort::parse_list(annotation).map_err(WorkloadError::MalformedAnnotation)?;

    let mut by_type: BTreeMap<ServiceType, Vec<ServicePort>> = BTreeMap::new();
    for port in ports.iter().filter(|p| !p.is_host_port()) {
        by_type
            .entry(ServiceType::from(port.kind.as_str()))
            .or_default()
            .push(ServicePort {
                name: non_empty(&port.name),
                port: port.container_port,
                target_port: Some(parse_target_port(&port.container_port.to_string())),
                protocol: non_empty(&port.protocol),
                ..Default::default()
            });
    }

    Ok(by_type
        .into_iter()
        .map(|(service_type, service_ports)| WorkloadService {
            service_type,
            cluster_ip: None,
            service_ports,
        })
        .collect())
}

impl Workload {
    /// Services for this workload, preferring the ports annotation when set
    pub fn derive_services(&self) -> WorkloadResult<Vec<WorkloadService>> {
        match self.ports_annotation() {
            Some(annotation) => from_ports_annotation(annotation),
            None => Ok(vec![from_containers(self)]),
        }
    }
}

/// Numeric or named port reference
fn parse_target_port(value: &str) -> IntOrString {
    if let Ok(port_num) = value.parse::<i32>() {
        IntOrString::Int(port_num)
    } else {
        IntOrString::String(value.to_string())
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
