//! Room names used as broadcast scopes on the relay.
//!
//! Rooms exist implicitly while at least one connection is joined; they are
//! never created or destroyed explicitly. The well-known rooms are each
//! user's personal room (named by user id), one room per role, and the
//! `admin` room that receives presence traffic. Arbitrary caller-named
//! rooms carry ephemeral features such as typing indicators.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{Role, UserId};

/// Name of a broadcast room.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomName(String);

impl RoomName {
    /// The personal room of a user, used for cross-device fan-out.
    pub fn user(id: &UserId) -> Self {
        Self(id.as_str().to_string())
    }

    /// The shared room of all connections with a given role.
    pub fn role(role: Role) -> Self {
        Self(role.as_str().to_string())
    }

    /// The room that receives presence updates.
    pub fn admin() -> Self {
        Self::role(Role::Admin)
    }

    /// An arbitrary caller-named room.
    pub fn named(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the room name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_room_is_named_by_user_id() {
        let id = UserId::new("u1").unwrap();
        assert_eq!(RoomName::user(&id).as_str(), "u1");
    }

    #[test]
    fn role_room_uses_wire_name() {
        assert_eq!(RoomName::role(Role::Pathologist).as_str(), "pathologist");
    }

    #[test]
    fn admin_room_equals_admin_role_room() {
        assert_eq!(RoomName::admin(), RoomName::role(Role::Admin));
    }
}
