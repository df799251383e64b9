use thiserror::Error;

use issuetrack_auth::AuthzError;
use issuetrack_core::{DomainError, IssueId, StoreError};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IssueError {
    #[error("issue {0} not found")]
    NotFound(IssueId),

    #[error(transparent)]
    Forbidden(#[from] AuthzError),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<DomainError> for IssueError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::Validation(msg) | DomainError::InvalidId(msg) => IssueError::Validation(msg),
        }
    }
}
