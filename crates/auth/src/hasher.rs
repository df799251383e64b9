//! Password hashing (Argon2id, PHC string format).

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HashError {
    #[error("invalid hashing parameters: {0}")]
    InvalidParams(String),

    #[error("password hashing failed: {0}")]
    Hashing(String),
}

/// One-way credential hashing.
///
/// `verify` never fails loudly: a malformed stored hash is simply a mismatch.
pub trait CredentialHasher: Send + Sync {
    fn hash(&self, plaintext: &str) -> Result<String, HashError>;

    fn verify(&self, plaintext: &str, hash: &str) -> bool;
}

impl<H> CredentialHasher for std::sync::Arc<H>
where
    H: CredentialHasher + ?Sized,
{
    fn hash(&self, plaintext: &str) -> Result<String, HashError> {
        (**self).hash(plaintext)
    }

    fn verify(&self, plaintext: &str, hash: &str) -> bool {
        (**self).verify(plaintext, hash)
    }
}

/// Argon2id with a fresh random salt per hash.
///
/// Verification reads the parameters embedded in the stored hash, so raising
/// the memory cost later does not invalidate existing credentials.
#[derive(Debug, Clone)]
pub struct Argon2Hasher {
    params: Params,
}

impl Argon2Hasher {
    /// OWASP-recommended defaults (19 MiB, 2 passes, 1 lane).
    pub fn new() -> Self {
        Self {
            params: Params::default(),
        }
    }

    /// Custom memory cost in KiB, keeping the default pass and lane counts.
    pub fn with_memory_kib(memory_kib: u32) -> Result<Self, HashError> {
        let params = Params::new(
            memory_kib,
            Params::DEFAULT_T_COST,
            Params::DEFAULT_P_COST,
            None,
        )
        .map_err(|e| HashError::InvalidParams(e.to_string()))?;
        Ok(Self { params })
    }

    pub fn memory_kib(&self) -> u32 {
        self.params.m_cost()
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }
}

impl Default for Argon2Hasher {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialHasher for Argon2Hasher {
    fn hash(&self, plaintext: &str) -> Result<String, HashError> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2()
            .hash_password(plaintext.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| HashError::Hashing(e.to_string()))
    }

    fn verify(&self, plaintext: &str, hash: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(hash) else {
            return false;
        };
        self.argon2()
            .verify_password(plaintext.as_bytes(), &parsed)
            .is_ok()
    }
}
