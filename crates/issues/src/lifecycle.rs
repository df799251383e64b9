//! Issue lifecycle engine.
//!
//! Every operation follows the same order: role check against the access
//! policy, then existence, then ownership. So a reporter asking for a missing
//! issue gets `NotFound`, and for someone else's issue gets `Forbidden`.
//!
//! Status moves are unrestricted: an authorized caller may set any status in
//! one step. Concurrent updates are last-write-wins.

use std::collections::BTreeMap;

use serde_json::Value as JsonValue;

use issuetrack_auth::{Action, Principal, Scope};
use issuetrack_core::{Clock, IssueId, SystemClock};
use issuetrack_events::{EventSink, IssueNotification};

use crate::issue::validate_title;
use crate::{
    AttachmentStore, Issue, IssueError, IssueFilter, IssueStore, NewAttachment, NewIssue, Severity,
    Status,
};

/// Issue count per severity. Severities with no issues are absent.
pub type SeverityCounts = BTreeMap<Severity, u64>;

pub struct IssueLifecycleEngine<S, A, E, C = SystemClock> {
    issues: S,
    attachments: A,
    events: E,
    clock: C,
}

impl<S, A, E, C> IssueLifecycleEngine<S, A, E, C>
where
    S: IssueStore,
    A: AttachmentStore,
    E: EventSink<IssueNotification>,
    C: Clock,
{
    pub fn new(issues: S, attachments: A, events: E, clock: C) -> Self {
        Self {
            issues,
            attachments,
            events,
            clock,
        }
    }

    pub fn issues(&self) -> &S {
        &self.issues
    }

    pub fn attachments(&self) -> &A {
        &self.attachments
    }

    /// Open a new issue reported by `actor`.
    pub fn create(
        &self,
        actor: &Principal,
        title: &str,
        description: &str,
        severity: Severity,
    ) -> Result<Issue, IssueError> {
        self.authorize(actor, Action::CreateIssue)?;
        let title = validate_title(title)?;

        let issue = self.issues.insert(NewIssue {
            title,
            description: description.to_string(),
            severity,
            status: Status::Open,
            reporter_id: actor.id,
            created_at: self.clock.now(),
        })?;

        tracing::info!(issue_id = %issue.id, reporter = %actor.id, %severity, "issue created");
        self.emit_issue(&issue, |issue| IssueNotification::IssueCreated { issue });
        Ok(issue)
    }

    /// Newest first. Reporters only see what they reported.
    pub fn list(&self, actor: &Principal) -> Result<Vec<Issue>, IssueError> {
        let scope = self.authorize(actor, Action::ListIssues)?;
        let filter = IssueFilter::all().reported_by(scope.owner_filter(actor.id));

        self.issues
            .list(&filter)?
            .into_iter()
            .map(|issue| self.with_attachment(issue))
            .collect()
    }

    pub fn get(&self, actor: &Principal, id: IssueId) -> Result<Issue, IssueError> {
        let scope = self.authorize(actor, Action::ReadIssue)?;
        let issue = self.load(id)?;
        self.ensure_owner(scope, Action::ReadIssue, actor, &issue)?;
        self.with_attachment(issue)
    }

    /// Triage: set status and severity together.
    pub fn update_status(
        &self,
        actor: &Principal,
        id: IssueId,
        status: Status,
        severity: Severity,
    ) -> Result<Issue, IssueError> {
        let scope = self.authorize(actor, Action::ChangeIssueStatus)?;
        let mut issue = self.load(id)?;
        self.ensure_owner(scope, Action::ChangeIssueStatus, actor, &issue)?;

        let previous = issue.status;
        issue.status = status;
        issue.severity = severity;
        issue.updated_at = self.clock.now();
        let issue = self.save(issue)?;

        tracing::info!(issue_id = %id, actor = %actor.id, from = %previous, to = %status, %severity, "issue status changed");
        self.emit_issue(&issue, |issue| IssueNotification::IssueUpdated { issue });
        Ok(issue)
    }

    /// Rewrite title, description and severity. Reporters may only edit their
    /// own issues.
    pub fn update_details(
        &self,
        actor: &Principal,
        id: IssueId,
        title: &str,
        description: &str,
        severity: Severity,
    ) -> Result<Issue, IssueError> {
        let scope = self.authorize(actor, Action::EditIssue)?;
        let title = validate_title(title)?;
        let mut issue = self.load(id)?;
        self.ensure_owner(scope, Action::EditIssue, actor, &issue)?;

        issue.title = title;
        issue.description = description.to_string();
        issue.severity = severity;
        issue.updated_at = self.clock.now();
        let issue = self.save(issue)?;

        tracing::info!(issue_id = %id, actor = %actor.id, "issue details edited");
        self.emit_issue(&issue, |issue| IssueNotification::IssueUpdated { issue });
        Ok(issue)
    }

    /// Remove an issue and every attachment recorded for it.
    pub fn delete(&self, actor: &Principal, id: IssueId) -> Result<(), IssueError> {
        let scope = self.authorize(actor, Action::DeleteIssue)?;
        let issue = self.load(id)?;
        self.ensure_owner(scope, Action::DeleteIssue, actor, &issue)?;

        if !self.issues.delete(id)? {
            return Err(IssueError::NotFound(id));
        }
        let removed_attachments = self.attachments.delete_for_issue(id)?;

        tracing::info!(issue_id = %id, actor = %actor.id, removed_attachments, "issue deleted");
        self.events.emit(IssueNotification::IssueDeleted { issue_id: id });
        Ok(())
    }

    /// Record a stored file against an issue; it becomes the issue's current
    /// attachment.
    pub fn attach(
        &self,
        actor: &Principal,
        id: IssueId,
        filename: &str,
        storage_path: &str,
    ) -> Result<Issue, IssueError> {
        let scope = self.authorize(actor, Action::AttachFile)?;
        if filename.trim().is_empty() || storage_path.trim().is_empty() {
            return Err(IssueError::Validation(
                "attachment filename and path must not be empty".to_string(),
            ));
        }
        let mut issue = self.load(id)?;
        self.ensure_owner(scope, Action::AttachFile, actor, &issue)?;

        let attachment = self.attachments.create(NewAttachment {
            issue_id: id,
            filename: filename.to_string(),
            storage_path: storage_path.to_string(),
        })?;

        issue.updated_at = self.clock.now();
        let issue = match self.save(issue) {
            Err(IssueError::NotFound(_)) => {
                // Deleted between load and insert; drop the row we just wrote.
                self.attachments.delete_for_issue(id)?;
                tracing::warn!(issue_id = %id, attachment_id = %attachment.id, "issue vanished while attaching");
                return Err(IssueError::NotFound(id));
            }
            saved => saved?,
        };

        tracing::info!(issue_id = %id, attachment_id = %attachment.id, "attachment recorded");
        self.emit_issue(&issue, |issue| IssueNotification::IssueUpdated { issue });
        Ok(issue)
    }

    /// Count issues in `status` per severity. Reporters only count their own.
    pub fn aggregate_counts(&self, actor: &Principal, status: Status) -> Result<SeverityCounts, IssueError> {
        let scope = self.authorize(actor, Action::ViewSeverityCounts)?;
        let filter = IssueFilter::all()
            .reported_by(scope.owner_filter(actor.id))
            .with_status(status);

        let mut counts = SeverityCounts::new();
        for issue in self.issues.list(&filter)? {
            *counts.entry(issue.severity).or_insert(0) += 1;
        }
        Ok(counts)
    }

    fn authorize(&self, actor: &Principal, action: Action) -> Result<Scope, IssueError> {
        actor.authorize(action).map_err(|e| {
            tracing::warn!(actor = %actor.id, role = %actor.role, %action, "denied: {e}");
            IssueError::Forbidden(e)
        })
    }

    fn ensure_owner(&self, scope: Scope, action: Action, actor: &Principal, issue: &Issue) -> Result<(), IssueError> {
        scope.ensure(action, actor.id, issue.reporter_id).map_err(|e| {
            tracing::warn!(actor = %actor.id, issue_id = %issue.id, %action, "denied: {e}");
            IssueError::Forbidden(e)
        })
    }

    fn load(&self, id: IssueId) -> Result<Issue, IssueError> {
        self.issues.get(id)?.ok_or(IssueError::NotFound(id))
    }

    fn save(&self, issue: Issue) -> Result<Issue, IssueError> {
        let id = issue.id;
        let saved = self.issues.update(&issue)?.ok_or(IssueError::NotFound(id))?;
        self.with_attachment(saved)
    }

    fn with_attachment(&self, mut issue: Issue) -> Result<Issue, IssueError> {
        issue.attachment = self.attachments.latest_for_issue(issue.id)?;
        Ok(issue)
    }

    fn emit_issue(&self, issue: &Issue, notification: impl FnOnce(JsonValue) -> IssueNotification) {
        match serde_json::to_value(issue) {
            Ok(payload) => self.events.emit(notification(payload)),
            Err(e) => tracing::warn!(issue_id = %issue.id, "dropping notification, serialization failed: {e}"),
        }
    }
}
