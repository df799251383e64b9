//! `issuetrack-auth`: authentication and authorization boundary.
//!
//! This crate is intentionally decoupled from HTTP and storage: identities
//! live behind [`UserStore`], time comes from a [`issuetrack_core::Clock`].

pub mod authorize;
pub mod claims;
pub mod error;
pub mod hasher;
pub mod identity;
pub mod jwt;
pub mod permissions;
pub mod principal;
pub mod resolver;
pub mod roles;

pub use authorize::{
    AuthorizationExplanation, AuthzError, RoleGuard, Scope, check, explain, require,
};
pub use claims::{JwtClaims, TokenValidationError, validate_claims};
pub use error::AuthError;
pub use hasher::{Argon2Hasher, CredentialHasher, HashError};
pub use identity::{Identity, IdentitySummary, NewIdentity, UserStore};
pub use jwt::{Hs256TokenCodec, SessionToken, TokenCodec, TokenError};
pub use permissions::Action;
pub use principal::Principal;
pub use resolver::{IdentityResolver, ResolverConfig, RoleFreshness, normalize_email};
pub use roles::Role;
