//! AWS provider error types

use appstream_cloud::CloudError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AwsError {
    #[error("AppStream {operation} failed: {message}")]
    Sdk { operation: String, message: String },

    #[error("AppStream resource not found: {0}")]
    NotFound(String),

    #[error("AppStream resource already exists: {0}")]
    AlreadyExists(String),

    #[error("AppStream returned an incomplete response for {0}")]
    IncompleteResponse(String),
}

impl From<AwsError> for CloudError {
    fn from(err: AwsError) -> Self {
        match err {
            AwsError::NotFound(name) => CloudError::ResourceNotFound(name),
            AwsError::AlreadyExists(name) => CloudError::ResourceAlreadyExists(name),
            other => CloudError::ApiError(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, AwsError>;
