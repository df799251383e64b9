use serde::{Deserialize, Serialize};

use issuetrack_core::{StoreError, UserId};

use crate::{Principal, Role};

/// A registered user.
///
/// `credential` is the stored password hash. Identities created through
/// federated login have none and can never authenticate with a password.
#[derive(Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: UserId,
    pub email: String,
    pub role: Role,
    pub credential: Option<String>,
}

impl Identity {
    pub fn summary(&self) -> IdentitySummary {
        IdentitySummary {
            id: self.id,
            email: self.email.clone(),
            role: self.role,
        }
    }

    pub fn principal(&self) -> Principal {
        Principal::new(self.id, self.role)
    }

    pub fn has_password(&self) -> bool {
        self.credential.is_some()
    }
}

impl core::fmt::Debug for Identity {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Identity")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("role", &self.role)
            .field("credential", &self.credential.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Public view of an identity (current-identity lookup, role change result).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentitySummary {
    pub id: UserId,
    pub email: String,
    pub role: Role,
}

/// Insert payload; the store assigns the id.
#[derive(Clone, PartialEq, Eq)]
pub struct NewIdentity {
    pub email: String,
    pub role: Role,
    pub credential: Option<String>,
}

impl core::fmt::Debug for NewIdentity {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("NewIdentity")
            .field("email", &self.email)
            .field("role", &self.role)
            .field("credential", &self.credential.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Identity persistence consumed by the resolver.
///
/// Emails are stored already normalised; `create` must reject an email that is
/// already present with [`StoreError::Conflict`].
pub trait UserStore: Send + Sync {
    fn by_id(&self, id: UserId) -> Result<Option<Identity>, StoreError>;

    fn by_email(&self, email: &str) -> Result<Option<Identity>, StoreError>;

    fn create(&self, new: NewIdentity) -> Result<Identity, StoreError>;

    /// Returns `None` when no identity has that id.
    fn update_role(&self, id: UserId, role: Role) -> Result<Option<Identity>, StoreError>;
}

impl<S> UserStore for std::sync::Arc<S>
where
    S: UserStore + ?Sized,
{
    fn by_id(&self, id: UserId) -> Result<Option<Identity>, StoreError> {
        (**self).by_id(id)
    }

    fn by_email(&self, email: &str) -> Result<Option<Identity>, StoreError> {
        (**self).by_email(email)
    }

    fn create(&self, new: NewIdentity) -> Result<Identity, StoreError> {
        (**self).create(new)
    }

    fn update_role(&self, id: UserId, role: Role) -> Result<Option<Identity>, StoreError> {
        (**self).update_role(id, role)
    }
}
