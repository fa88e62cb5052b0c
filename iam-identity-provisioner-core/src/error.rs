//! Error types for identity provisioning.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while resolving, loading, rendering or provisioning identities.
#[derive(Debug, Error)]
pub enum ProvisionError {
    /// A referenced document does not exist.
    #[error("Path not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// A document exists but does not parse or does not have the expected shape.
    #[error("Malformed document {}: {reason}", path.display())]
    MalformedDocument { path: PathBuf, reason: String },

    /// A document exists but could not be read.
    #[error("File system error during {operation} on {}: {source}", path.display())]
    FileSystem {
        operation: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The IAM service rejected a call.
    #[error("IAM operation {operation} failed for '{target}': {message}")]
    ServiceOperationFailed {
        operation: &'static str,
        target: String,
        message: String,
    },

    /// An identity kind or template name outside the known set.
    #[error("Unknown {selector} '{value}'")]
    UnknownSelector {
        selector: &'static str,
        value: String,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type ProvisionResult<T> = Result<T, ProvisionError>;

impl ProvisionError {
    pub fn not_found(path: impl AsRef<Path>) -> Self {
        Self::NotFound {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn malformed(path: impl AsRef<Path>, reason: impl Into<String>) -> Self {
        Self::MalformedDocument {
            path: path.as_ref().to_path_buf(),
            reason: reason.into(),
        }
    }

    /// Map an I/O failure, keeping absence distinguishable from other read failures.
    pub fn file_system(
        operation: impl Into<String>,
        path: impl AsRef<Path>,
        source: std::io::Error,
    ) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            return Self::not_found(path);
        }
        Self::FileSystem {
            operation: operation.into(),
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub fn service(
        operation: &'static str,
        target: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::ServiceOperationFailed {
            operation,
            target: target.into(),
            message: message.into(),
        }
    }

    pub fn unknown_selector(selector: &'static str, value: impl Into<String>) -> Self {
        Self::UnknownSelector {
            selector,
            value: value.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
