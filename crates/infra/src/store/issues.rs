use std::sync::RwLock;

use issuetrack_core::{IssueId, StoreError};
use issuetrack_issues::store::newest_first;
use issuetrack_issues::{Issue, IssueFilter, IssueStore, NewIssue};

use super::{Table, read, write};

const TABLE: &str = "issues";

/// Issue rows keyed by id. Attachments are not stored here.
#[derive(Debug, Default)]
pub struct InMemoryIssueStore {
    table: RwLock<Table<Issue>>,
}

impl InMemoryIssueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IssueStore for InMemoryIssueStore {
    fn insert(&self, new: NewIssue) -> Result<Issue, StoreError> {
        let mut table = write(&self.table, TABLE)?;
        let id = table.next_id();
        let issue = new.into_issue(IssueId::new(id));
        table.rows.insert(id, issue.clone());
        Ok(issue)
    }

    fn get(&self, id: IssueId) -> Result<Option<Issue>, StoreError> {
        Ok(read(&self.table, TABLE)?.rows.get(&id.get()).cloned())
    }

    fn list(&self, filter: &IssueFilter) -> Result<Vec<Issue>, StoreError> {
        let table = read(&self.table, TABLE)?;
        let mut issues: Vec<Issue> = table.rows.values().filter(|i| filter.matches(i)).cloned().collect();
        issues.sort_by(newest_first);
        Ok(issues)
    }

    fn update(&self, issue: &Issue) -> Result<Option<Issue>, StoreError> {
        let mut table = write(&self.table, TABLE)?;
        let Some(row) = table.rows.get_mut(&issue.id.get()) else {
            return Ok(None);
        };

        // Identity columns stay as first written.
        row.title = issue.title.clone();
        row.description = issue.description.clone();
        row.severity = issue.severity;
        row.status = issue.status;
        row.updated_at = issue.updated_at;
        Ok(Some(row.clone()))
    }

    fn delete(&self, id: IssueId) -> Result<bool, StoreError> {
        Ok(write(&self.table, TABLE)?.rows.remove(&id.get()).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::{Duration, Utc};
    use issuetrack_core::UserId;
    use issuetrack_issues::{Severity, Status};

    fn new_issue(reporter: i64, at: chrono::DateTime<Utc>) -> NewIssue {
        NewIssue {
            title: "t".into(),
            description: "d".into(),
            severity: Severity::Low,
            status: Status::Open,
            reporter_id: UserId::new(reporter),
            created_at: at,
        }
    }

    #[test]
    fn lists_newest_first_with_id_tiebreak() {
        let store = InMemoryIssueStore::new();
        let t0 = Utc::now();
        let a = store.insert(new_issue(1, t0)).unwrap();
        let b = store.insert(new_issue(1, t0)).unwrap();
        let c = store.insert(new_issue(2, t0 - Duration::hours(1))).unwrap();

        let ids: Vec<_> = store.list(&IssueFilter::all()).unwrap().into_iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![b.id, a.id, c.id]);

        let only_two = store.list(&IssueFilter::all().reported_by(Some(UserId::new(2)))).unwrap();
        assert_eq!(only_two.len(), 1);
    }

    #[test]
    fn update_never_rewrites_the_reporter() {
        let store = InMemoryIssueStore::new();
        let mut issue = store.insert(new_issue(1, Utc::now())).unwrap();
        issue.reporter_id = UserId::new(9);
        issue.status = Status::Triaged;

        let saved = store.update(&issue).unwrap().unwrap();
        assert_eq!(saved.reporter_id, UserId::new(1));
        assert_eq!(saved.status, Status::Triaged);
    }

    #[test]
    fn delete_and_update_report_missing_rows() {
        let store = InMemoryIssueStore::new();
        let issue = store.insert(new_issue(1, Utc::now())).unwrap();
        assert!(store.delete(issue.id).unwrap());
        assert!(!store.delete(issue.id).unwrap());
        assert_eq!(store.update(&issue).unwrap(), None);
        assert_eq!(store.get(issue.id).unwrap(), None);
    }

    #[test]
    fn ids_are_not_reused_after_delete() {
        let store = InMemoryIssueStore::new();
        let first = store.insert(new_issue(1, Utc::now())).unwrap();
        store.delete(first.id).unwrap();
        let second = store.insert(new_issue(1, Utc::now())).unwrap();
        assert!(second.id > first.id);
    }
}
