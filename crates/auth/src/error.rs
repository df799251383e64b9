use thiserror::Error;

use issuetrack_core::{DomainError, StoreError};

use crate::{AuthzError, HashError, TokenError};

/// Failures of the identity operations (register, login, token resolution,
/// role changes).
///
/// `Unauthenticated` and `InvalidCredentials` deliberately carry no detail:
/// the caller learns that the attempt failed, never why.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("could not validate credentials")]
    Unauthenticated,

    #[error("incorrect username or password")]
    InvalidCredentials,

    #[error("email already registered")]
    DuplicateIdentity,

    #[error(transparent)]
    Forbidden(#[from] AuthzError),

    #[error("user not found")]
    NotFound,

    #[error("validation failed: {0}")]
    Validation(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Hash(#[from] HashError),

    /// Signing a fresh token failed. Decode failures map to `Unauthenticated`.
    #[error(transparent)]
    Token(TokenError),
}

impl From<DomainError> for AuthError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::Validation(msg) | DomainError::InvalidId(msg) => AuthError::Validation(msg),
        }
    }
}
