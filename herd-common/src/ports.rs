//! Ports annotation records

use serde::{Deserialize, Serialize};

/// One entry of the ports annotation
///
/// Every field may be omitted. `kind` names the service type the port
/// should be exposed through, or `HostPort` to keep it off services.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerPort {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub source_port: i32,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub dns_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub protocol: String,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub container_port: i32,
}

fn is_zero(value: &i32) -> bool {
    *value == 0
}

impl ContainerPort {
    /// Whether this port is excluded from service derivation
    pub fn is_host_port(&self) -> bool {
        self.kind == crate::HOST_PORT_KIND
    }

    /// Parse the JSON array stored in the ports annotation
    ///
    /// `null` is how an empty port list gets serialized and parses as no ports.
    pub fn parse_list(annotation: &str) -> serde_json::Result<Vec<ContainerPort>> {
        let ports: Option<Vec<ContainerPort>> = serde_json::from_str(annotation)?;
        Ok(ports.unwrap_or_default())
    }
}
