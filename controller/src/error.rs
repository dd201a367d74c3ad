use axum::http::StatusCode;
use thiserror::Error;

use crate::directory::DirectoryError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors returned by the instance resolver
#[derive(Debug, Error)]
pub enum Error {
    /// Required process configuration is missing or invalid
    #[error("configuration error: {0}")]
    Config(String),

    /// The directory has no instance for the name or ID
    #[error("{operation} {target}: not found")]
    InstanceNotFound {
        operation: &'static str,
        target: String,
    },

    #[error("invalid provider ID {0:?}: expected prefix crusoe://")]
    InvalidProviderId(String),

    /// Any other directory failure. Never read as absence.
    #[error("{operation} {target}: {source}")]
    Directory {
        operation: &'static str,
        target: String,
        #[source]
        source: DirectoryError,
    },

    /// The instance record carries no usable address pair
    #[error("instance {instance_id} has no network address: {reason}")]
    MissingAddress {
        instance_id: String,
        reason: &'static str,
    },

    #[error("{0} is not implemented by the crusoe provider")]
    Unsupported(&'static str),
}

impl Error {
    /// Wrap a directory failure with the operation and identifier it concerns
    pub fn lookup(operation: &'static str, target: impl Into<String>, source: DirectoryError) -> Self {
        let target = target.into();
        match source {
            DirectoryError::Config(msg) => Self::Config(msg),
            source if source.is_not_found() => Self::InstanceNotFound { operation, target },
            source => Self::Directory {
                operation,
                target,
                source,
            },
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::InstanceNotFound { .. })
    }

    /// HTTP status the provider API answers with for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::InstanceNotFound { .. } => StatusCode::NOT_FOUND,
            Self::InvalidProviderId(_) => StatusCode::BAD_REQUEST,
            Self::Directory { .. } => StatusCode::BAD_GATEWAY,
            Self::MissingAddress { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Unsupported(_) => StatusCode::NOT_IMPLEMENTED,
        }
    }
}
