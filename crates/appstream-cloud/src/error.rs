//! Cloud provider error types

use crate::lifecycle::FleetState;
use thiserror::Error;

/// Cloud provider errors
#[derive(Error, Debug)]
pub enum CloudError {
    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    #[error("Resource already exists: {0}")]
    ResourceAlreadyExists(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Transition of {resource} rejected: {source}")]
    TransitionRejected {
        resource: String,
        #[source]
        source: Box<CloudError>,
    },

    #[error("Observation of {resource} failed: {source}")]
    ObservationFailed {
        resource: String,
        #[source]
        source: Box<CloudError>,
    },

    #[error("Unsupported target state {state} for {resource} (expected RUNNING or STOPPED)")]
    UnsupportedState { resource: String, state: FleetState },

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Cancelled: {0}")]
    Cancelled(String),

    #[error("State file error: {0}")]
    StateError(String),

    #[error("Lock acquisition failed: {0}")]
    LockError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CloudError {
    /// Whether the error means the remote resource does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, CloudError::ResourceNotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, CloudError>;
