//! Unified error type definition

use serde::Serialize;
use thiserror::Error;

/// Core layer error type
#[derive(Error, Debug, Serialize)]
#[serde(tag = "code", content = "details")]
pub enum CoreError {
    /// Destination not found in the registry
    #[error("Destination not found: {0}")]
    DestinationNotFound(String),

    /// Provisional resolution requested for a concrete destination
    #[error("Destination is not provisional: {0}")]
    NotProvisional(String),

    /// A resolution for this destination is already running
    #[error("Resolution already in progress: {0}")]
    ResolutionInProgress(String),

    /// Local printer setup failed
    #[error("Configuration failed for {destination_id}: {message}")]
    ConfigurationFailed {
        destination_id: String,
        message: String,
    },

    /// Provisional handshake failed
    #[error("Provisional resolution failed for {destination_id}: {message}")]
    ProvisionalResolutionFailed {
        destination_id: String,
        message: String,
    },

    /// Destination registry failure
    #[error("Registry error: {0}")]
    RegistryError(String),

    /// Print server registry failure
    #[error("Print server error: {0}")]
    PrintServerError(String),

    /// No EULA for this destination
    #[error("EULA unavailable for: {0}")]
    EulaUnavailable(String),

    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Operation needs registry subscriptions that are not wired
    #[error("Dialog is not connected")]
    DialogNotConnected,
}

impl CoreError {
    /// Whether it is expected behavior (user-recoverable failure, missing resource) for log classification.
    ///
    /// Level `warn` should be used when returning `true` and level `error` when returning `false`.
    /// **Please update this method simultaneously when new variants are added. **
    #[must_use]
    pub fn is_expected(&self) -> bool {
        match self {
            Self::DestinationNotFound(_)
            | Self::NotProvisional(_)
            | Self::ResolutionInProgress(_)
            | Self::ConfigurationFailed { .. }
            | Self::ProvisionalResolutionFailed { .. }
            | Self::EulaUnavailable(_)
            | Self::ValidationError(_) => true,
            Self::RegistryError(_)
            | Self::PrintServerError(_)
            | Self::SerializationError(_)
            | Self::DialogNotConnected => false,
        }
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        Self::SerializationError(e.to_string())
    }
}

/// Core layer Result type alias
pub type CoreResult<T> = std::result::Result<T, CoreError>;
