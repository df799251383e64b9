//! Issues domain: the issue model, its storage seams and the lifecycle engine
//! that gates every mutation on the access policy.
//!
//! No IO lives here. Stores and the notification sink are collaborators
//! supplied by the caller (see `issuetrack-infra` for in-memory versions).

pub mod attachment;
pub mod error;
pub mod issue;
pub mod lifecycle;
pub mod store;

#[cfg(test)]
mod testing;

pub use attachment::{Attachment, AttachmentStore, NewAttachment};
pub use error::IssueError;
pub use issue::{Issue, NewIssue, Severity, Status};
pub use lifecycle::{IssueLifecycleEngine, SeverityCounts};
pub use store::{IssueFilter, IssueStore};
