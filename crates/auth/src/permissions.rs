use serde::{Deserialize, Serialize};

use crate::Role;

/// Operations subject to authorization.
///
/// Unlike an open permission-string model, the action set is fixed: every
/// operation the core exposes has exactly one entry here.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    CreateIssue,
    ListIssues,
    ReadIssue,
    ChangeIssueStatus,
    EditIssue,
    DeleteIssue,
    AttachFile,
    ViewSeverityCounts,
    ChangeUserRole,
}

impl Action {
    pub const ALL: [Action; 9] = [
        Action::CreateIssue,
        Action::ListIssues,
        Action::ReadIssue,
        Action::ChangeIssueStatus,
        Action::EditIssue,
        Action::DeleteIssue,
        Action::AttachFile,
        Action::ViewSeverityCounts,
        Action::ChangeUserRole,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Action::CreateIssue => "issues.create",
            Action::ListIssues => "issues.list",
            Action::ReadIssue => "issues.read",
            Action::ChangeIssueStatus => "issues.change_status",
            Action::EditIssue => "issues.edit",
            Action::DeleteIssue => "issues.delete",
            Action::AttachFile => "issues.attach",
            Action::ViewSeverityCounts => "dashboard.severity_counts",
            Action::ChangeUserRole => "users.change_role",
        }
    }

    /// Roles that may perform this action at all.
    pub const fn allowed_roles(self) -> &'static [Role] {
        match self {
            Action::CreateIssue | Action::EditIssue | Action::DeleteIssue | Action::AttachFile => {
                &[Role::Reporter, Role::Admin]
            }
            Action::ListIssues | Action::ReadIssue | Action::ViewSeverityCounts => {
                &[Role::Reporter, Role::Maintainer, Role::Admin]
            }
            Action::ChangeIssueStatus => &[Role::Maintainer, Role::Admin],
            Action::ChangeUserRole => &[Role::Admin],
        }
    }

    /// Roles whose grant only covers resources they reported themselves.
    pub const fn owner_limited_roles(self) -> &'static [Role] {
        match self {
            Action::ListIssues
            | Action::ReadIssue
            | Action::EditIssue
            | Action::DeleteIssue
            | Action::AttachFile
            | Action::ViewSeverityCounts => &[Role::Reporter],
            Action::CreateIssue | Action::ChangeIssueStatus | Action::ChangeUserRole => &[],
        }
    }
}

impl core::fmt::Display for Action {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
