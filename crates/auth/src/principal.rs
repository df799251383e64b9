use serde::{Deserialize, Serialize};

use issuetrack_core::UserId;

use crate::{Action, AuthzError, Role, Scope, authorize};

/// The acting identity for one operation: who, and with which role.
///
/// Built by the identity resolver from a session token; which role it carries
/// (stored or token snapshot) is decided by [`crate::RoleFreshness`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Principal {
    pub id: UserId,
    pub role: Role,
}

impl Principal {
    pub fn new(id: UserId, role: Role) -> Self {
        Self { id, role }
    }

    /// Policy check for the principal's role.
    pub fn authorize(&self, action: Action) -> Result<Scope, AuthzError> {
        authorize::check(self.role, action)
    }
}
