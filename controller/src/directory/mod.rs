//! Access to the Crusoe instance inventory.
//!
//! The resolver only talks to [`InstanceDirectory`]. [`CrusoeApiClient`] is the
//! REST implementation used by the binary; tests substitute a fake.

mod auth;
mod http_client;

#[cfg(test)]
pub(crate) mod fake;

use async_trait::async_trait;
use reqwest::StatusCode;
use thiserror::Error;

use crate::types::{InstanceRecord, PartitionRecord};

pub use auth::RequestSigner;
pub use http_client::CrusoeApiClient;

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("{resource} not found")]
    NotFound { resource: String },

    #[error("Crusoe API returned {status}: {message}")]
    Api { status: StatusCode, message: String },

    #[error("request to Crusoe API failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("failed to decode Crusoe API response: {0}")]
    Decode(String),

    #[error("failed to sign request: {0}")]
    Signing(String),

    #[error("invalid request path: {0}")]
    InvalidPath(String),
}

impl DirectoryError {
    /// Upstream HTTP status, when the failure carried one
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::NotFound { .. } => Some(StatusCode::NOT_FOUND),
            Self::Api { status, .. } => Some(*status),
            Self::Transport(e) => e.status(),
            Self::Config(_) | Self::Decode(_) | Self::Signing(_) | Self::InvalidPath(_) => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND)
    }
}

/// Lookups the resolver needs from the inventory.
///
/// Name and ID lookups return exactly one record or `NotFound`.
#[async_trait]
pub trait InstanceDirectory: Send + Sync {
    async fn instance_by_name(&self, name: &str) -> Result<InstanceRecord, DirectoryError>;

    async fn instance_by_id(&self, instance_id: &str) -> Result<InstanceRecord, DirectoryError>;

    async fn network_partition(
        &self,
        project_id: &str,
        partition_id: &str,
    ) -> Result<PartitionRecord, DirectoryError>;
}
