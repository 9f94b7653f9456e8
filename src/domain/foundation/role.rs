//! Staff roles and the broadcast authorization policy tied to them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ValidationError;

/// Role of an authenticated user.
///
/// Roles double as relay room names: every authenticated connection joins
/// the room named after its role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Staff,
    Pathologist,
}

impl Role {
    /// Returns the lowercase wire name of the role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Staff => "staff",
            Role::Pathologist => "pathologist",
        }
    }

    /// Whether this role may publish domain-mutation broadcasts
    /// (body, storage, task, autopsy and release updates).
    ///
    /// One uniform gate for all five event kinds; pathologists consume
    /// updates but do not publish them.
    pub fn can_publish_updates(&self) -> bool {
        matches!(self, Role::Admin | Role::Staff)
    }

    /// Whether this role may issue emergency alerts and maintenance notices.
    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "staff" => Ok(Role::Staff),
            "pathologist" => Ok(Role::Pathologist),
            other => Err(ValidationError::invalid_format(
                "role",
                format!("unknown role '{other}'"),
            )),
        }
    }
}
