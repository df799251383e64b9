//! Minimal collaborators for the engine's unit tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use issuetrack_core::{AttachmentId, IssueId, StoreError};
use issuetrack_events::{EventSink, IssueNotification};

use crate::store::newest_first;
use crate::{Attachment, AttachmentStore, Issue, IssueFilter, IssueStore, NewAttachment, NewIssue};

#[derive(Default)]
pub struct VecIssues {
    rows: Mutex<Vec<Issue>>,
    vanish_on_update: AtomicBool,
}

impl VecIssues {
    /// Make the next `update` behave as if a concurrent delete won the race.
    pub fn vanish_on_next_update(&self) {
        self.vanish_on_update.store(true, Ordering::SeqCst);
    }
}

impl IssueStore for VecIssues {
    fn insert(&self, new: NewIssue) -> Result<Issue, StoreError> {
        let mut rows = self.rows.lock().unwrap();
        let issue = new.into_issue(IssueId::new(rows.len() as i64 + 1));
        rows.push(issue.clone());
        Ok(issue)
    }

    fn get(&self, id: IssueId) -> Result<Option<Issue>, StoreError> {
        Ok(self.rows.lock().unwrap().iter().find(|i| i.id == id).cloned())
    }

    fn list(&self, filter: &IssueFilter) -> Result<Vec<Issue>, StoreError> {
        let mut out: Vec<Issue> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|i| filter.matches(i))
            .cloned()
            .collect();
        out.sort_by(newest_first);
        Ok(out)
    }

    fn update(&self, issue: &Issue) -> Result<Option<Issue>, StoreError> {
        let mut rows = self.rows.lock().unwrap();
        if self.vanish_on_update.swap(false, Ordering::SeqCst) {
            rows.retain(|i| i.id != issue.id);
            return Ok(None);
        }
        Ok(rows.iter_mut().find(|i| i.id == issue.id).map(|row| {
            *row = Issue {
                attachment: None,
                ..issue.clone()
            };
            row.clone()
        }))
    }

    fn delete(&self, id: IssueId) -> Result<bool, StoreError> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|i| i.id != id);
        Ok(rows.len() != before)
    }
}

#[derive(Default)]
pub struct VecAttachments {
    rows: Mutex<Vec<Attachment>>,
    next: Mutex<i64>,
}

impl AttachmentStore for VecAttachments {
    fn create(&self, new: NewAttachment) -> Result<Attachment, StoreError> {
        let mut next = self.next.lock().unwrap();
        *next += 1;
        let attachment = Attachment {
            id: AttachmentId::new(*next),
            issue_id: new.issue_id,
            filename: new.filename,
            storage_path: new.storage_path,
        };
        self.rows.lock().unwrap().push(attachment.clone());
        Ok(attachment)
    }

    fn latest_for_issue(&self, issue_id: IssueId) -> Result<Option<Attachment>, StoreError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|a| a.issue_id == issue_id)
            .max_by_key(|a| a.id)
            .cloned())
    }

    fn delete_for_issue(&self, issue_id: IssueId) -> Result<usize, StoreError> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|a| a.issue_id != issue_id);
        Ok(before - rows.len())
    }
}

#[derive(Default)]
pub struct RecordingSink {
    pub events: Mutex<Vec<IssueNotification>>,
}

impl RecordingSink {
    pub fn types(&self) -> Vec<&'static str> {
        use issuetrack_events::Event;
        self.events.lock().unwrap().iter().map(|e| e.event_type()).collect()
    }
}

impl EventSink<IssueNotification> for RecordingSink {
    fn emit(&self, event: IssueNotification) {
        self.events.lock().unwrap().push(event);
    }
}
