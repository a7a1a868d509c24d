//! Error types for the discovery module.
//!
//! A missing node or module is not an error: point queries answer it with
//! [`NodeInfoReply::NOT_FOUND`](crate::NodeInfoReply::NOT_FOUND).

use thiserror::Error;

/// Errors surfaced by discovery entry points
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// Module type name did not match any known module
    #[error("Unknown module type: {0}")]
    UnknownModuleType(String),

    /// Request/reply exchange exceeded the caller's deadline
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// The serving side of a request channel has shut down
    #[error("Discovery service stopped")]
    ServiceStopped,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl DiscoveryError {
    /// Returns true if this error should be retried
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}
