use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use issuetrack_core::{DomainError, IssueId, UserId};

use crate::Attachment;

/// Longest accepted issue title, in characters.
pub const MAX_TITLE_CHARS: usize = 200;

/// Impact classification. Ordered from least to most severe.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    #[default]
    Low,
    Medium,
    High,
}

impl Severity {
    pub const ALL: [Severity; 3] = [Severity::Low, Severity::Medium, Severity::High];

    pub const fn as_str(self) -> &'static str {
        match self {
            Severity::Low => "LOW",
            Severity::Medium => "MEDIUM",
            Severity::High => "HIGH",
        }
    }
}

/// Lifecycle stage.
///
/// Stages are listed in their usual order, but any authorized caller may move
/// an issue to any stage in one step.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    #[default]
    Open,
    Triaged,
    InProgress,
    Done,
}

impl Status {
    pub const ALL: [Status; 4] = [Status::Open, Status::Triaged, Status::InProgress, Status::Done];

    pub const fn as_str(self) -> &'static str {
        match self {
            Status::Open => "OPEN",
            Status::Triaged => "TRIAGED",
            Status::InProgress => "IN_PROGRESS",
            Status::Done => "DONE",
        }
    }
}

macro_rules! impl_label_enum {
    ($t:ty, $what:literal) => {
        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                <$t>::ALL
                    .into_iter()
                    .find(|v| v.as_str().eq_ignore_ascii_case(s.trim()))
                    .ok_or_else(|| DomainError::validation(format!("unknown {} '{}'", $what, s)))
            }
        }
    };
}

impl_label_enum!(Severity, "severity");
impl_label_enum!(Status, "status");

/// A tracked report.
///
/// `reporter_id` is fixed at creation; nothing in the engine rewrites it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    pub id: IssueId,
    pub title: String,
    pub description: String,
    pub severity: Severity,
    pub status: Status,
    pub reporter_id: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Most recent attachment, if any.
    pub attachment: Option<Attachment>,
}

impl Issue {
    pub fn is_reported_by(&self, user: UserId) -> bool {
        self.reporter_id == user
    }
}

/// Insert payload; the store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewIssue {
    pub title: String,
    pub description: String,
    pub severity: Severity,
    pub status: Status,
    pub reporter_id: UserId,
    pub created_at: DateTime<Utc>,
}

impl NewIssue {
    /// Materialize the row a store persists under `id`.
    pub fn into_issue(self, id: IssueId) -> Issue {
        Issue {
            id,
            title: self.title,
            description: self.description,
            severity: self.severity,
            status: self.status,
            reporter_id: self.reporter_id,
            created_at: self.created_at,
            updated_at: self.created_at,
            attachment: None,
        }
    }
}

/// Trimmed, non-empty, at most [`MAX_TITLE_CHARS`] characters.
pub fn validate_title(title: &str) -> Result<String, DomainError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(DomainError::validation("title must not be empty"));
    }
    if title.chars().count() > MAX_TITLE_CHARS {
        return Err(DomainError::validation(format!(
            "title must be at most {MAX_TITLE_CHARS} characters"
        )));
    }
    Ok(title.to_string())
}
