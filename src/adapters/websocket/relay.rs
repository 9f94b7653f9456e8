//! Relay message dispatch and authorization policy.
//!
//! Every inbound message is handled to completion on the connection's own
//! task; the registry is the only shared state. Authorization failures and
//! malformed payloads are silent no-ops by contract: the relay never
//! replies with an error and never closes a connection over invalid input.
//! A connection moves `anonymous → authenticated` exactly once per
//! successful handshake and never back.

use std::sync::Arc;

use serde_json::Value;
use tokio::task::JoinHandle;

use crate::config::RealtimeConfig;
use crate::domain::foundation::{ConnectionId, RoomName, Timestamp};
use crate::ports::TokenVerifier;

use super::messages::{ClientMessage, ServerMessage};
use super::registry::{ConnectionRegistry, OutboundSender};

/// Heartbeat status reported while the relay is up.
const HEARTBEAT_STATUS: &str = "healthy";

/// The real-time relay.
///
/// Owns the connection registry and the authorization policy; the
/// WebSocket handler feeds it parsed client messages.
pub struct Relay {
    registry: Arc<ConnectionRegistry>,
    verifier: Arc<dyn TokenVerifier>,
    config: RealtimeConfig,
}

/// Which domain-mutation event an update message maps to.
enum UpdateKind {
    Body,
    Storage,
    Task,
    Autopsy,
    Release,
}

impl UpdateKind {
    fn outbound(&self, data: Value) -> ServerMessage {
        match self {
            UpdateKind::Body => ServerMessage::BodyUpdated { data },
            UpdateKind::Storage => ServerMessage::StorageUpdated { data },
            UpdateKind::Task => ServerMessage::TaskUpdated { data },
            UpdateKind::Autopsy => ServerMessage::AutopsyUpdated { data },
            UpdateKind::Release => ServerMessage::ReleaseUpdated { data },
        }
    }

    fn name(&self) -> &'static str {
        match self {
            UpdateKind::Body => "bodyStatusUpdate",
            UpdateKind::Storage => "storageUpdate",
            UpdateKind::Task => "taskUpdate",
            UpdateKind::Autopsy => "autopsyUpdate",
            UpdateKind::Release => "releaseUpdate",
        }
    }
}

impl Relay {
    /// Creates a relay over the given registry and token verifier.
    pub fn new(
        registry: Arc<ConnectionRegistry>,
        verifier: Arc<dyn TokenVerifier>,
        config: RealtimeConfig,
    ) -> Self {
        Self {
            registry,
            verifier,
            config,
        }
    }

    /// The registry backing this relay.
    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// Registers a new anonymous connection.
    pub async fn connect(&self, sender: OutboundSender) -> ConnectionId {
        let connection_id = self.registry.register(sender).await;
        tracing::debug!(connection_id = %connection_id, "Connection registered");
        connection_id
    }

    /// Handles one inbound message from a connection.
    pub async fn handle_message(&self, connection_id: ConnectionId, message: ClientMessage) {
        match message {
            ClientMessage::Authenticate { token } => {
                self.handle_authenticate(connection_id, token).await;
            }
            ClientMessage::JoinRoom { room } => {
                if self.registry.identity(connection_id).await.is_some() {
                    self.registry
                        .join_room(connection_id, RoomName::named(room))
                        .await;
                } else {
                    tracing::debug!(
                        connection_id = %connection_id,
                        "Dropping joinRoom from anonymous connection"
                    );
                }
            }
            ClientMessage::MarkNotificationRead { notification_id } => {
                let Some(user) = self.registry.identity(connection_id).await else {
                    tracing::debug!(
                        connection_id = %connection_id,
                        "Dropping markNotificationRead from anonymous connection"
                    );
                    return;
                };
                self.registry
                    .broadcast_room(
                        &RoomName::user(&user.id),
                        ServerMessage::NotificationRead {
                            id: notification_id,
                        },
                        Some(connection_id),
                    )
                    .await;
            }
            ClientMessage::Typing { room, is_typing } => {
                let Some(user) = self.registry.identity(connection_id).await else {
                    return;
                };
                let room = room
                    .map(RoomName::named)
                    .unwrap_or_else(|| RoomName::named(&self.config.default_typing_room));
                self.registry
                    .broadcast_room(
                        &room,
                        ServerMessage::UserTyping {
                            user_id: user.id.to_string(),
                            is_typing,
                        },
                        Some(connection_id),
                    )
                    .await;
            }
            ClientMessage::BodyStatusUpdate { data } => {
                self.handle_update(connection_id, UpdateKind::Body, data).await;
            }
            ClientMessage::StorageUpdate { data } => {
                self.handle_update(connection_id, UpdateKind::Storage, data).await;
            }
            ClientMessage::TaskUpdate { data } => {
                self.handle_update(connection_id, UpdateKind::Task, data).await;
            }
            ClientMessage::AutopsyUpdate { data } => {
                self.handle_update(connection_id, UpdateKind::Autopsy, data).await;
            }
            ClientMessage::ReleaseUpdate { data } => {
                self.handle_update(connection_id, UpdateKind::Release, data).await;
            }
            ClientMessage::UpdatePresence { status } => {
                let Some(user) = self.registry.identity(connection_id).await else {
                    return;
                };
                self.registry
                    .broadcast_room(
                        &RoomName::admin(),
                        ServerMessage::UserPresenceUpdate {
                            user_id: user.id.to_string(),
                            status,
                            timestamp: Timestamp::now().to_rfc3339(),
                        },
                        None,
                    )
                    .await;
            }
            ClientMessage::EmergencyAlert { data } => {
                let Some(user) = self.registry.identity(connection_id).await else {
                    return;
                };
                if !user.role.is_admin() {
                    tracing::debug!(
                        connection_id = %connection_id,
                        role = %user.role,
                        "Dropping emergencyAlert from non-admin"
                    );
                    return;
                }
                self.registry
                    .broadcast_all(ServerMessage::EmergencyAlert {
                        data,
                        timestamp: Timestamp::now().to_rfc3339(),
                        from: user.id.to_string(),
                    })
                    .await;
            }
            ClientMessage::SystemMaintenance { data } => {
                let Some(user) = self.registry.identity(connection_id).await else {
                    return;
                };
                if !user.role.is_admin() {
                    tracing::debug!(
                        connection_id = %connection_id,
                        role = %user.role,
                        "Dropping systemMaintenance from non-admin"
                    );
                    return;
                }
                self.registry
                    .broadcast_all(ServerMessage::SystemMaintenance {
                        data,
                        timestamp: Timestamp::now().to_rfc3339(),
                    })
                    .await;
            }
        }
    }

    /// Handles transport disconnect: removes the connection and, if it was
    /// authenticated, tells the admin room the user went offline.
    pub async fn handle_disconnect(&self, connection_id: ConnectionId) {
        let identity = self.registry.remove(connection_id).await;
        tracing::debug!(connection_id = %connection_id, "Connection removed");

        if let Some(user) = identity {
            self.registry
                .broadcast_room(
                    &RoomName::admin(),
                    ServerMessage::UserPresenceUpdate {
                        user_id: user.id.to_string(),
                        status: "offline".to_string(),
                        timestamp: Timestamp::now().to_rfc3339(),
                    },
                    None,
                )
                .await;
        }
    }

    /// Spawns the heartbeat task: one `systemHeartbeat` broadcast per
    /// interval, for the life of the process.
    pub fn spawn_heartbeat(self: Arc<Self>) -> JoinHandle<()> {
        let interval = self.config.heartbeat_interval();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick completes immediately; consume it so each
            // broadcast lands one full interval apart.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let connected_users = self.registry.connection_count().await;
                self.registry
                    .broadcast_all(ServerMessage::SystemHeartbeat {
                        timestamp: Timestamp::now().to_rfc3339(),
                        status: HEARTBEAT_STATUS.to_string(),
                        connected_users,
                    })
                    .await;
            }
        })
    }

    async fn handle_authenticate(&self, connection_id: ConnectionId, token: String) {
        match self.verifier.verify(&token).await {
            Ok(user) => {
                self.registry.attach_identity(connection_id, user.clone()).await;
                tracing::info!(
                    connection_id = %connection_id,
                    user_id = %user.id,
                    role = %user.role,
                    "Connection authenticated"
                );
                self.registry
                    .send_to(
                        connection_id,
                        ServerMessage::Authenticated {
                            message: "Authentication successful".to_string(),
                            user_id: user.id.to_string(),
                            role: user.role,
                        },
                    )
                    .await;
            }
            Err(e) => {
                // Silent no-op toward the client; the connection stays open
                // and anonymous.
                tracing::debug!(
                    connection_id = %connection_id,
                    error = %e,
                    "Rejected relay handshake"
                );
            }
        }
    }

    async fn handle_update(&self, connection_id: ConnectionId, kind: UpdateKind, data: Value) {
        let Some(user) = self.registry.identity(connection_id).await else {
            tracing::debug!(
                connection_id = %connection_id,
                event = kind.name(),
                "Dropping update from anonymous connection"
            );
            return;
        };
        if !user.role.can_publish_updates() {
            tracing::debug!(
                connection_id = %connection_id,
                event = kind.name(),
                role = %user.role,
                "Dropping update from unauthorized role"
            );
            return;
        }
        self.registry.broadcast_all(kind.outbound(data)).await;
    }
}
