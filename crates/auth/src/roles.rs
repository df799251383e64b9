use core::str::FromStr;

use serde::{Deserialize, Serialize};

use issuetrack_core::DomainError;

/// Role identifier used for RBAC.
///
/// The set is closed: every identity holds exactly one of these at a time.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// New identities start as reporters.
    #[default]
    Reporter,
    Maintainer,
    Admin,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Reporter, Role::Maintainer, Role::Admin];

    pub const fn as_str(self) -> &'static str {
        match self {
            Role::Reporter => "REPORTER",
            Role::Maintainer => "MAINTAINER",
            Role::Admin => "ADMIN",
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|r| r.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                DomainError::validation(format!(
                    "unknown role '{s}' (expected one of REPORTER, MAINTAINER, ADMIN)"
                ))
            })
    }
}
