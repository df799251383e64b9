//! Access policy: the fixed `(role, action)` decision table.
//!
//! - No IO
//! - No panics
//! - No business logic beyond the table itself
//!
//! Ownership is the one thing the table cannot decide alone: for some roles an
//! action is granted only on resources they reported. [`check`] reports that as
//! [`Scope::Own`], and the caller resolves it against the resource's owner with
//! [`Scope::ensure`].

use serde::Serialize;
use thiserror::Error;

use issuetrack_core::UserId;

use crate::{Action, Principal, Role};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden: role {role} may not perform '{action}'")]
    Forbidden { role: Role, action: Action },

    #[error("forbidden: '{action}' is limited to the issue's reporter")]
    NotOwner { action: Action },

    #[error("forbidden: requires one of {required:?}")]
    RoleRequired { required: &'static [Role] },

    #[error("forbidden: cannot change your own role")]
    SelfRoleChange,
}

/// How far a granted action reaches.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    /// Any resource.
    Any,
    /// Only resources whose reporter is the actor.
    Own,
}

impl Scope {
    pub fn permits(self, actor: UserId, owner: UserId) -> bool {
        match self {
            Scope::Any => true,
            Scope::Own => actor == owner,
        }
    }

    pub fn ensure(self, action: Action, actor: UserId, owner: UserId) -> Result<(), AuthzError> {
        if self.permits(actor, owner) {
            Ok(())
        } else {
            Err(AuthzError::NotOwner { action })
        }
    }

    /// Owner filter to apply to collection queries (`None` means everything).
    pub fn owner_filter(self, actor: UserId) -> Option<UserId> {
        match self {
            Scope::Any => None,
            Scope::Own => Some(actor),
        }
    }
}

/// Role gate for an operation, composed explicitly at the call site.
///
/// ```ignore
/// require(&[Role::Admin]).check(&actor)?;
/// ```
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RoleGuard {
    roles: &'static [Role],
}

pub const fn require(roles: &'static [Role]) -> RoleGuard {
    RoleGuard { roles }
}

impl RoleGuard {
    pub fn permits(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    pub fn roles(&self) -> &'static [Role] {
        self.roles
    }

    pub fn check(&self, principal: &Principal) -> Result<(), AuthzError> {
        if self.permits(principal.role) {
            Ok(())
        } else {
            Err(AuthzError::RoleRequired { required: self.roles })
        }
    }
}

/// Decide whether `role` may perform `action`, and with which reach.
pub fn check(role: Role, action: Action) -> Result<Scope, AuthzError> {
    if !require(action.allowed_roles()).permits(role) {
        return Err(AuthzError::Forbidden { role, action });
    }

    if action.owner_limited_roles().contains(&role) {
        Ok(Scope::Own)
    } else {
        Ok(Scope::Any)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Authorization Explanation (Audit Trail)
// ─────────────────────────────────────────────────────────────────────────────

/// Why a `(role, action)` pair was allowed or denied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorizationExplanation {
    pub action: Action,
    pub role: Role,
    pub granted: bool,
    pub scope: Option<Scope>,
    pub reason: String,
    /// Roles that would be granted this action (for denial messages).
    pub granting_roles: Vec<Role>,
}

pub fn explain(role: Role, action: Action) -> AuthorizationExplanation {
    let granting_roles = action.allowed_roles().to_vec();

    match check(role, action) {
        Ok(Scope::Any) => AuthorizationExplanation {
            action,
            role,
            granted: true,
            scope: Some(Scope::Any),
            reason: format!("{role} may perform '{action}' on any issue"),
            granting_roles,
        },
        Ok(Scope::Own) => AuthorizationExplanation {
            action,
            role,
            granted: true,
            scope: Some(Scope::Own),
            reason: format!("{role} may perform '{action}' only on issues they reported"),
            granting_roles,
        },
        Err(_) => AuthorizationExplanation {
            action,
            role,
            granted: false,
            scope: None,
            reason: format!(
                "{role} lacks '{action}'; granted to {}",
                granting_roles
                    .iter()
                    .map(|r| r.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            granting_roles,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    use Action::*;
    use Role::*;

    const Y: Option<Scope> = Some(Scope::Any);
    const OWN: Option<Scope> = Some(Scope::Own);
    const N: Option<Scope> = None;

    /// (action, reporter, maintainer, admin)
    const MATRIX: [(Action, Option<Scope>, Option<Scope>, Option<Scope>); 9] = [
        (CreateIssue, Y, N, Y),
        (ListIssues, OWN, Y, Y),
        (ReadIssue, OWN, Y, Y),
        (ChangeIssueStatus, N, Y, Y),
        (EditIssue, OWN, N, Y),
        (DeleteIssue, OWN, N, Y),
        (AttachFile, OWN, N, Y),
        (ViewSeverityCounts, OWN, Y, Y),
        (ChangeUserRole, N, N, Y),
    ];

    #[test]
    fn decision_table_matches_the_matrix() {
        for (action, reporter, maintainer, admin) in MATRIX {
            for (role, expected) in [(Reporter, reporter), (Maintainer, maintainer), (Admin, admin)] {
                let got = check(role, action).ok();
                assert_eq!(got, expected, "role={role} action={action}");
            }
        }
    }

    #[test]
    fn matrix_covers_every_action() {
        for action in Action::ALL {
            assert!(MATRIX.iter().any(|(a, ..)| *a == action), "missing {action}");
        }
    }

    #[test]
    fn denial_names_role_and_action() {
        let err = check(Maintainer, CreateIssue).unwrap_err();
        assert_eq!(
            err,
            AuthzError::Forbidden {
                role: Maintainer,
                action: CreateIssue
            }
        );
    }

    #[test]
    fn own_scope_rejects_other_owners() {
        let me = UserId::new(1);
        let other = UserId::new(2);
        assert!(Scope::Own.ensure(EditIssue, me, me).is_ok());
        assert_eq!(
            Scope::Own.ensure(EditIssue, me, other),
            Err(AuthzError::NotOwner { action: EditIssue })
        );
        assert!(Scope::Any.ensure(EditIssue, me, other).is_ok());
        assert_eq!(Scope::Own.owner_filter(me), Some(me));
        assert_eq!(Scope::Any.owner_filter(me), None);
    }

    #[test]
    fn role_guard_checks_membership() {
        let admin = Principal::new(UserId::new(1), Admin);
        let reporter = Principal::new(UserId::new(2), Reporter);
        let guard = require(&[Admin]);
        assert!(guard.check(&admin).is_ok());
        assert!(matches!(
            guard.check(&reporter),
            Err(AuthzError::RoleRequired { .. })
        ));
    }

    #[test]
    fn explanation_lists_granting_roles_on_denial() {
        let e = explain(Reporter, ChangeIssueStatus);
        assert!(!e.granted);
        assert_eq!(e.granting_roles, vec![Maintainer, Admin]);
        assert!(e.reason.contains("MAINTAINER, ADMIN"));

        let e = explain(Reporter, EditIssue);
        assert!(e.granted);
        assert_eq!(e.scope, Some(Scope::Own));
    }

    fn any_role() -> impl Strategy<Value = Role> {
        prop::sample::select(Role::ALL.to_vec())
    }

    fn any_action() -> impl Strategy<Value = Action> {
        prop::sample::select(Action::ALL.to_vec())
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 128,
            ..ProptestConfig::default()
        })]

        /// Property: the decision depends on nothing but (role, action).
        #[test]
        fn check_is_deterministic(role in any_role(), action in any_action()) {
            prop_assert_eq!(check(role, action), check(role, action));
        }

        /// Property: admins are never denied.
        #[test]
        fn admin_is_never_denied(action in any_action()) {
            prop_assert_eq!(check(Admin, action), Ok(Scope::Any));
        }

        /// Property: a granted scope is always consistent with the explanation.
        #[test]
        fn explanation_agrees_with_check(role in any_role(), action in any_action()) {
            let e = explain(role, action);
            prop_assert_eq!(e.granted, check(role, action).is_ok());
            prop_assert_eq!(e.scope, check(role, action).ok());
        }
    }
}
