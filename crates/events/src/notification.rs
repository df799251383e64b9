//! Issue lifecycle notifications (the payload contract for live updates).
//!
//! Wire shape, one JSON object per notification:
//!
//! ```text
//! {"type": "issue_created", "issue": { ...serialized issue... }}
//! {"type": "issue_updated", "issue": { ...serialized issue... }}
//! {"type": "issue_deleted", "issue_id": 17}
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use issuetrack_core::IssueId;

use crate::event::Event;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IssueNotification {
    IssueCreated { issue: JsonValue },
    IssueUpdated { issue: JsonValue },
    IssueDeleted { issue_id: IssueId },
}

impl IssueNotification {
    /// The issue this notification is about, when the payload carries one.
    pub fn issue_id(&self) -> Option<IssueId> {
        match self {
            IssueNotification::IssueCreated { issue } | IssueNotification::IssueUpdated { issue } => issue
                .get("id")
                .and_then(JsonValue::as_i64)
                .map(IssueId::new),
            IssueNotification::IssueDeleted { issue_id } => Some(*issue_id),
        }
    }
}

impl Event for IssueNotification {
    fn event_type(&self) -> &'static str {
        match self {
            IssueNotification::IssueCreated { .. } => "issue_created",
            IssueNotification::IssueUpdated { .. } => "issue_updated",
            IssueNotification::IssueDeleted { .. } => "issue_deleted",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deleted_notification_carries_only_the_id() {
        let n = IssueNotification::IssueDeleted {
            issue_id: IssueId::new(17),
        };
        assert_eq!(
            serde_json::to_value(&n).unwrap(),
            json!({ "type": "issue_deleted", "issue_id": 17 })
        );
        assert_eq!(n.event_type(), "issue_deleted");
    }

    #[test]
    fn created_notification_embeds_the_issue_payload() {
        let n = IssueNotification::IssueCreated {
            issue: json!({ "id": 3, "title": "Crash on save" }),
        };
        let v = serde_json::to_value(&n).unwrap();
        assert_eq!(v["type"], "issue_created");
        assert_eq!(v["issue"]["title"], "Crash on save");
        assert_eq!(n.issue_id(), Some(IssueId::new(3)));
    }
}
