//! Crusoe cloud controller: resolves Kubernetes nodes to Crusoe instances and
//! reports their addresses, type, metadata and liveness.

pub mod api;
pub mod config;
pub mod directory;
pub mod error;
pub mod instances;
pub mod types;

pub use error::{Error, Result};
