use std::sync::RwLock;

use issuetrack_core::{AttachmentId, IssueId, StoreError};
use issuetrack_issues::{Attachment, AttachmentStore, NewAttachment};

use super::{Table, read, write};

const TABLE: &str = "attachments";

#[derive(Debug, Default)]
pub struct InMemoryAttachmentStore {
    table: RwLock<Table<Attachment>>,
}

impl InMemoryAttachmentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AttachmentStore for InMemoryAttachmentStore {
    fn create(&self, new: NewAttachment) -> Result<Attachment, StoreError> {
        let mut table = write(&self.table, TABLE)?;
        let id = table.next_id();
        let attachment = Attachment {
            id: AttachmentId::new(id),
            issue_id: new.issue_id,
            filename: new.filename,
            storage_path: new.storage_path,
        };
        table.rows.insert(id, attachment.clone());
        Ok(attachment)
    }

    fn latest_for_issue(&self, issue_id: IssueId) -> Result<Option<Attachment>, StoreError> {
        let table = read(&self.table, TABLE)?;
        // Rows are keyed by id, so the last match is the most recent.
        Ok(table.rows.values().rev().find(|a| a.issue_id == issue_id).cloned())
    }

    fn delete_for_issue(&self, issue_id: IssueId) -> Result<usize, StoreError> {
        let mut table = write(&self.table, TABLE)?;
        let before = table.rows.len();
        table.rows.retain(|_, a| a.issue_id != issue_id);
        Ok(before - table.rows.len())
    }
}
