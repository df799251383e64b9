use std::sync::RwLock;

use issuetrack_auth::{Identity, NewIdentity, Role, UserStore};
use issuetrack_core::{StoreError, UserId};

use super::{Table, read, write};

const TABLE: &str = "users";

/// Identities keyed by id, with email uniqueness enforced on insert.
#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    table: RwLock<Table<Identity>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        read(&self.table, TABLE).map(|t| t.rows.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl UserStore for InMemoryUserStore {
    fn by_id(&self, id: UserId) -> Result<Option<Identity>, StoreError> {
        Ok(read(&self.table, TABLE)?.rows.get(&id.get()).cloned())
    }

    fn by_email(&self, email: &str) -> Result<Option<Identity>, StoreError> {
        let table = read(&self.table, TABLE)?;
        Ok(table.rows.values().find(|i| i.email == email).cloned())
    }

    fn create(&self, new: NewIdentity) -> Result<Identity, StoreError> {
        let mut table = write(&self.table, TABLE)?;
        if table.rows.values().any(|i| i.email == new.email) {
            return Err(StoreError::conflict("users.email"));
        }

        let id = table.next_id();
        let identity = Identity {
            id: UserId::new(id),
            email: new.email,
            role: new.role,
            credential: new.credential,
        };
        table.rows.insert(id, identity.clone());
        Ok(identity)
    }

    fn update_role(&self, id: UserId, role: Role) -> Result<Option<Identity>, StoreError> {
        let mut table = write(&self.table, TABLE)?;
        Ok(table.rows.get_mut(&id.get()).map(|identity| {
            identity.role = role;
            identity.clone()
        }))
    }
}
