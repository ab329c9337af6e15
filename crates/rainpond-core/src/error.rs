//! Error types for the rainpond simulator.

use thiserror::Error;

/// Result type for rainpond operations.
pub type Result<T> = std::result::Result<T, RainpondError>;

/// Errors that can occur while configuring or driving a simulation.
///
/// Steady-state stepping is a total function over fixed-size buffers and
/// never fails; errors surface at construction, reconfiguration, and GPU
/// transfer boundaries.
#[derive(Error, Debug)]
pub enum RainpondError {
    /// A configuration value was rejected by its validity range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The requested execution backend is not available.
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    /// The execution backend failed while setting up or dispatching work.
    #[error("Backend error: {0}")]
    BackendError(String),

    /// A host/device transfer failed.
    #[error("Transfer failed: {0}")]
    TransferFailed(String),
}

impl RainpondError {
    /// Create an invalid configuration error.
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create a backend unavailable error.
    pub fn backend_unavailable(msg: impl Into<String>) -> Self {
        Self::BackendUnavailable(msg.into())
    }

    /// Create a backend error.
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::BackendError(msg.into())
    }

    /// Create a transfer error.
    pub fn transfer(msg: impl Into<String>) -> Self {
        Self::TransferFailed(msg.into())
    }
}
