//! One error type for every operation, classified for transports.

use serde_json::{Value as JsonValue, json};
use thiserror::Error;

use issuetrack_auth::{AuthError, AuthzError, HashError};
use issuetrack_core::{DomainError, StoreError};
use issuetrack_issues::IssueError;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("could not validate credentials")]
    Unauthenticated,

    #[error("incorrect username or password")]
    InvalidCredentials,

    #[error("email already registered")]
    DuplicateIdentity,

    #[error(transparent)]
    Forbidden(AuthzError),

    #[error("{0}")]
    NotFound(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error(transparent)]
    Store(StoreError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::Unauthenticated => "unauthenticated",
            ServiceError::InvalidCredentials => "invalid_credentials",
            ServiceError::DuplicateIdentity => "duplicate_identity",
            ServiceError::Forbidden(_) => "forbidden",
            ServiceError::NotFound(_) => "not_found",
            ServiceError::Validation(_) => "validation_error",
            ServiceError::Store(_) => "store_error",
            ServiceError::Internal(_) => "internal_error",
        }
    }

    /// HTTP status a transport should answer with.
    pub fn status(&self) -> u16 {
        match self {
            ServiceError::Unauthenticated | ServiceError::InvalidCredentials => 401,
            ServiceError::DuplicateIdentity => 400,
            ServiceError::Forbidden(_) => 403,
            ServiceError::NotFound(_) => 404,
            ServiceError::Validation(_) => 422,
            ServiceError::Store(StoreError::Conflict(_)) => 409,
            ServiceError::Store(StoreError::Unavailable(_)) => 503,
            ServiceError::Internal(_) => 500,
        }
    }

    /// `{"error": code, "message": text}`
    pub fn body(&self) -> JsonValue {
        json!({
            "error": self.code(),
            "message": self.to_string(),
        })
    }
}

impl From<AuthError> for ServiceError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::Unauthenticated => ServiceError::Unauthenticated,
            AuthError::InvalidCredentials => ServiceError::InvalidCredentials,
            AuthError::DuplicateIdentity => ServiceError::DuplicateIdentity,
            AuthError::Forbidden(e) => ServiceError::Forbidden(e),
            AuthError::NotFound => ServiceError::NotFound("user not found".to_string()),
            AuthError::Validation(msg) => ServiceError::Validation(msg),
            AuthError::Store(e) => ServiceError::Store(e),
            AuthError::Hash(e) => ServiceError::Internal(e.to_string()),
            AuthError::Token(e) => ServiceError::Internal(e.to_string()),
        }
    }
}

impl From<IssueError> for ServiceError {
    fn from(e: IssueError) -> Self {
        match e {
            IssueError::NotFound(_) => ServiceError::NotFound("issue not found".to_string()),
            IssueError::Forbidden(e) => ServiceError::Forbidden(e),
            IssueError::Validation(msg) => ServiceError::Validation(msg),
            IssueError::Store(e) => ServiceError::Store(e),
        }
    }
}

impl From<DomainError> for ServiceError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::Validation(msg) | DomainError::InvalidId(msg) => ServiceError::Validation(msg),
        }
    }
}

impl From<HashError> for ServiceError {
    fn from(e: HashError) -> Self {
        ServiceError::Internal(e.to_string())
    }
}
