use issuetrack_core::{IssueId, StoreError, UserId};

use crate::{Issue, NewIssue, Status};

/// Query for [`IssueStore::list`]. Unset fields match everything.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct IssueFilter {
    pub reporter: Option<UserId>,
    pub status: Option<Status>,
}

impl IssueFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn reported_by(mut self, reporter: Option<UserId>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn with_status(mut self, status: Status) -> Self {
        self.status = Some(status);
        self
    }

    pub fn matches(&self, issue: &Issue) -> bool {
        self.reporter.is_none_or(|r| issue.reporter_id == r)
            && self.status.is_none_or(|s| issue.status == s)
    }
}

/// Issue persistence consumed by the lifecycle engine.
///
/// Each call is one transaction. Rows come back without their attachment;
/// the engine joins that in.
pub trait IssueStore: Send + Sync {
    fn insert(&self, new: NewIssue) -> Result<Issue, StoreError>;

    fn get(&self, id: IssueId) -> Result<Option<Issue>, StoreError>;

    /// Matching issues, most recently created first (ties broken by id,
    /// highest first).
    fn list(&self, filter: &IssueFilter) -> Result<Vec<Issue>, StoreError>;

    /// Overwrite the mutable fields of an existing row. `None` when the row is
    /// gone.
    fn update(&self, issue: &Issue) -> Result<Option<Issue>, StoreError>;

    /// `false` when there was nothing to delete.
    fn delete(&self, id: IssueId) -> Result<bool, StoreError>;
}

impl<S> IssueStore for std::sync::Arc<S>
where
    S: IssueStore + ?Sized,
{
    fn insert(&self, new: NewIssue) -> Result<Issue, StoreError> {
        (**self).insert(new)
    }

    fn get(&self, id: IssueId) -> Result<Option<Issue>, StoreError> {
        (**self).get(id)
    }

    fn list(&self, filter: &IssueFilter) -> Result<Vec<Issue>, StoreError> {
        (**self).list(filter)
    }

    fn update(&self, issue: &Issue) -> Result<Option<Issue>, StoreError> {
        (**self).update(issue)
    }

    fn delete(&self, id: IssueId) -> Result<bool, StoreError> {
        (**self).delete(id)
    }
}

/// Newest first, then highest id first.
pub fn newest_first(a: &Issue, b: &Issue) -> core::cmp::Ordering {
    b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id))
}
