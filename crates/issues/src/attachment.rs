use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

use issuetrack_core::{AttachmentId, IssueId, StoreError};

/// Reference to a stored file. The bytes live with the storage collaborator;
/// only the name and path are tracked here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub id: AttachmentId,
    pub issue_id: IssueId,
    pub filename: String,
    pub storage_path: String,
}

impl Attachment {
    /// Public URL: the storage path rooted at `/`, with `\` separators
    /// normalised to `/`.
    pub fn url(&self) -> String {
        let normalized = self.storage_path.replace('\\', "/");
        format!("/{}", normalized.trim_start_matches('/'))
    }
}

impl Serialize for Attachment {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("Attachment", 5)?;
        s.serialize_field("id", &self.id)?;
        s.serialize_field("issue_id", &self.issue_id)?;
        s.serialize_field("filename", &self.filename)?;
        s.serialize_field("filepath", &self.storage_path)?;
        s.serialize_field("url", &self.url())?;
        s.end()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAttachment {
    pub issue_id: IssueId,
    pub filename: String,
    pub storage_path: String,
}

/// Attachment persistence. Several rows may exist per issue; readers only see
/// the most recent one (highest id).
pub trait AttachmentStore: Send + Sync {
    fn create(&self, new: NewAttachment) -> Result<Attachment, StoreError>;

    fn latest_for_issue(&self, issue_id: IssueId) -> Result<Option<Attachment>, StoreError>;

    /// Remove every attachment of `issue_id`, returning how many were removed.
    fn delete_for_issue(&self, issue_id: IssueId) -> Result<usize, StoreError>;
}

impl<S> AttachmentStore for std::sync::Arc<S>
where
    S: AttachmentStore + ?Sized,
{
    fn create(&self, new: NewAttachment) -> Result<Attachment, StoreError> {
        (**self).create(new)
    }

    fn latest_for_issue(&self, issue_id: IssueId) -> Result<Option<Attachment>, StoreError> {
        (**self).latest_for_issue(issue_id)
    }

    fn delete_for_issue(&self, issue_id: IssueId) -> Result<usize, StoreError> {
        (**self).delete_for_issue(issue_id)
    }
}
