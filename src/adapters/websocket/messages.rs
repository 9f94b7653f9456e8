//! Wire protocol between the relay and connected clients.
//!
//! Messages are JSON envelopes tagged by a `type` field. Domain-update
//! payloads are deliberately opaque (`data` is free-form JSON): the relay
//! routes them, it does not interpret them. Malformed envelopes are
//! dropped by the caller without a reply.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::foundation::Role;

// ============================================
// Client → Server Messages
// ============================================

/// All message types that can be received from a client.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMessage {
    /// In-band handshake carrying the REST bearer token.
    Authenticate { token: String },

    /// Join an arbitrary named room (ephemeral features such as typing).
    JoinRoom { room: String },

    /// Tell the user's other connections a notification was read.
    #[serde(rename_all = "camelCase")]
    MarkNotificationRead { notification_id: String },

    /// Typing indicator, scoped to `room` or the default room.
    #[serde(rename_all = "camelCase")]
    Typing {
        #[serde(default)]
        room: Option<String>,
        is_typing: bool,
    },

    /// Body status changed (admin/staff only).
    BodyStatusUpdate {
        #[serde(default)]
        data: Value,
    },

    /// Storage assignment changed (admin/staff only).
    StorageUpdate {
        #[serde(default)]
        data: Value,
    },

    /// Task changed (admin/staff only).
    TaskUpdate {
        #[serde(default)]
        data: Value,
    },

    /// Autopsy record changed (admin/staff only).
    AutopsyUpdate {
        #[serde(default)]
        data: Value,
    },

    /// Release record changed (admin/staff only).
    ReleaseUpdate {
        #[serde(default)]
        data: Value,
    },

    /// Presence status change, relayed to the admin room.
    UpdatePresence { status: String },

    /// Emergency alert (admin only), broadcast to everyone.
    EmergencyAlert {
        #[serde(default)]
        data: Value,
    },

    /// Maintenance notice (admin only), broadcast to everyone.
    SystemMaintenance {
        #[serde(default)]
        data: Value,
    },
}

// ============================================
// Server → Client Messages
// ============================================

/// All message types that can be sent to a client.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMessage {
    /// Handshake acknowledgment with the verified identity.
    #[serde(rename_all = "camelCase")]
    Authenticated {
        message: String,
        user_id: String,
        role: Role,
    },

    /// A notification was read on another of the user's connections.
    NotificationRead { id: String },

    /// Someone is typing in a shared room.
    #[serde(rename_all = "camelCase")]
    UserTyping { user_id: String, is_typing: bool },

    /// Body status changed.
    BodyUpdated { data: Value },

    /// Storage assignment changed.
    StorageUpdated { data: Value },

    /// Task changed.
    TaskUpdated { data: Value },

    /// Autopsy record changed.
    AutopsyUpdated { data: Value },

    /// Release record changed.
    ReleaseUpdated { data: Value },

    /// Presence update, delivered to the admin room.
    #[serde(rename_all = "camelCase")]
    UserPresenceUpdate {
        user_id: String,
        status: String,
        timestamp: String,
    },

    /// Emergency alert with server-stamped time and origin.
    EmergencyAlert {
        data: Value,
        timestamp: String,
        from: String,
    },

    /// Maintenance notice with server-stamped time.
    SystemMaintenance { data: Value, timestamp: String },

    /// Periodic liveness broadcast.
    #[serde(rename_all = "camelCase")]
    SystemHeartbeat {
        timestamp: String,
        status: String,
        connected_users: usize,
    },

    /// Generic transport-fault notice to the originating connection.
    Error { message: String },
}
