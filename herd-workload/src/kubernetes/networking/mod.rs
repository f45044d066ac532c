//! Kubernetes networking
//!
//! Derives Services for workloads.

pub mod services;

pub use services::{from_containers, from_ports_annotation};
