//! In-memory stores.
//!
//! Each store is a single `RwLock` around its table, so every call is atomic
//! on its own. Ids are assigned from a per-table counter starting at 1 and are
//! never reused.

mod attachments;
mod issues;
mod users;

pub use attachments::InMemoryAttachmentStore;
pub use issues::InMemoryIssueStore;
pub use users::InMemoryUserStore;

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use issuetrack_core::StoreError;

#[derive(Debug)]
pub(crate) struct Table<T> {
    pub(crate) rows: BTreeMap<i64, T>,
    last_id: i64,
}

impl<T> Table<T> {
    pub(crate) fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
            last_id: 0,
        }
    }
}

pub(crate) fn read<'a, T>(lock: &'a RwLock<Table<T>>, table: &str) -> Result<RwLockReadGuard<'a, Table<T>>, StoreError> {
    lock.read().map_err(|_| poisoned(table))
}

pub(crate) fn write<'a, T>(lock: &'a RwLock<Table<T>>, table: &str) -> Result<RwLockWriteGuard<'a, Table<T>>, StoreError> {
    lock.write().map_err(|_| poisoned(table))
}

fn poisoned(table: &str) -> StoreError {
    tracing::error!(table, "store lock poisoned");
    StoreError::unavailable(format!("{table}: lock poisoned"))
}
