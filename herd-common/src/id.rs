//! Workload identifiers
//!
//! A workload is identified by `<kind>:<namespace>:<name>`. Unlike the
//! `<namespace>/<name>` queue key, the identifier stays unique when two
//! kinds share a name inside a namespace.

use crate::{Error, Result, WorkloadKind};
use std::fmt;
use std::str::FromStr;

/// Decoded workload identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WorkloadId {
    /// Lower-cased kind tag, not necessarily a known kind
    pub kind: String,
    pub namespace: String,
    pub name: String,
}

impl WorkloadId {
    pub fn new(kind: WorkloadKind, namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: kind.tag().to_string(),
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Encode an identifier string without validating its parts
    pub fn encode(kind: &str, namespace: &str, name: &str) -> String {
        format!("{}:{}:{}", kind, namespace, name)
    }

    /// Split an identifier into its three segments, lower-casing the kind
    pub fn decode(id: &str) -> Result<Self> {
        let segments: Vec<&str> = id.split(':').collect();
        match segments.as_slice() {
            [kind, namespace, name] => Ok(Self {
                kind: kind.to_lowercase(),
                namespace: namespace.to_string(),
                name: name.to_string(),
            }),
            _ => Err(Error::InvalidIdentifier(id.to_string())),
        }
    }

    /// Kind used for dispatch; unknown tags fall back to deployments
    pub fn workload_kind(&self) -> WorkloadKind {
        WorkloadKind::resolve(&self.kind)
    }
}

impl fmt::Display for WorkloadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.kind, self.namespace, self.name)
    }
}

impl FromStr for WorkloadId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::decode(s)
    }
}
