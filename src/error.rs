use tonic::Status;

use crate::users::repo::RepoError;

/// Errors surfaced to gRPC callers. Everything collapses into one of two
/// status codes.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{0}")]
    InvalidArgument(String),
    #[error("{0}")]
    Internal(String),
}

impl ServiceError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }
}

impl From<RepoError> for ServiceError {
    fn from(e: RepoError) -> Self {
        Self::Internal(e.to_string())
    }
}

impl From<ServiceError> for Status {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::InvalidArgument(msg) => Status::invalid_argument(msg),
            ServiceError::Internal(msg) => Status::internal(msg),
        }
    }
}
