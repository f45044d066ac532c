//! Herd workload controller library
//!
//! Exposes the workload abstraction and its configuration and logging
//! setup so the controller binary and integration tests share one crate.

pub mod config;
pub mod kubernetes;
pub mod logging;
