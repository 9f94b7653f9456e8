//! Connection registry: live connections, their identities and room
//! memberships.
//!
//! The registry is the relay's only shared mutable state. It is owned by
//! the relay (no process-wide singleton) and lives for the relay's own
//! lifetime. Each connection holds an unbounded outbound channel; fan-out
//! writes into those channels and never waits for delivery.
//!
//! # Architecture
//!
//! ```text
//! Room: u1 (user)     Room: staff (role)   Room: admin
//! ├── conn-a          ├── conn-a           └── conn-c
//! └── conn-b          └── conn-b
//! ```
//!
//! Rooms exist implicitly while at least one connection is joined; empty
//! rooms are dropped from the index.

use std::collections::{HashMap, HashSet};

use tokio::sync::{mpsc, RwLock};

use crate::domain::foundation::{AuthenticatedUser, ConnectionId, RoomName};

use super::messages::ServerMessage;

/// Outbound channel half handed to the registry at connect time.
pub type OutboundSender = mpsc::UnboundedSender<ServerMessage>;

struct ConnectionEntry {
    sender: OutboundSender,
    identity: Option<AuthenticatedUser>,
    rooms: HashSet<RoomName>,
}

#[derive(Default)]
struct Inner {
    connections: HashMap<ConnectionId, ConnectionEntry>,
    rooms: HashMap<RoomName, HashSet<ConnectionId>>,
}

impl Inner {
    fn join(&mut self, connection_id: ConnectionId, room: RoomName) {
        if let Some(entry) = self.connections.get_mut(&connection_id) {
            entry.rooms.insert(room.clone());
            self.rooms.entry(room).or_default().insert(connection_id);
        }
    }

    fn leave_all(&mut self, connection_id: ConnectionId) {
        let Some(entry) = self.connections.get_mut(&connection_id) else {
            return;
        };
        for room in entry.rooms.drain() {
            if let Some(members) = self.rooms.get_mut(&room) {
                members.remove(&connection_id);
                if members.is_empty() {
                    self.rooms.remove(&room);
                }
            }
        }
    }
}

/// Registry of live relay connections.
///
/// Broadcast is a read-only fan-out over the connections' outbound
/// channels; a dropped receiver simply loses the event.
#[derive(Default)]
pub struct ConnectionRegistry {
    inner: RwLock<Inner>,
}

impl ConnectionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new anonymous connection and returns its id.
    pub async fn register(&self, sender: OutboundSender) -> ConnectionId {
        let connection_id = ConnectionId::new();
        let mut inner = self.inner.write().await;
        inner.connections.insert(
            connection_id,
            ConnectionEntry {
                sender,
                identity: None,
                rooms: HashSet::new(),
            },
        );
        connection_id
    }

    /// Attaches a verified identity to a connection.
    ///
    /// Leaves all previously joined rooms first, then joins the user's
    /// personal room and the role room. Re-authentication therefore
    /// overwrites the prior identity and membership: the second call wins.
    pub async fn attach_identity(&self, connection_id: ConnectionId, user: AuthenticatedUser) {
        let mut inner = self.inner.write().await;
        if !inner.connections.contains_key(&connection_id) {
            return;
        }
        inner.leave_all(connection_id);
        inner.join(connection_id, RoomName::user(&user.id));
        inner.join(connection_id, RoomName::role(user.role));
        if let Some(entry) = inner.connections.get_mut(&connection_id) {
            entry.identity = Some(user);
        }
    }

    /// Joins a connection to an arbitrary named room.
    pub async fn join_room(&self, connection_id: ConnectionId, room: RoomName) {
        self.inner.write().await.join(connection_id, room);
    }

    /// Returns the identity attached to a connection, if any.
    pub async fn identity(&self, connection_id: ConnectionId) -> Option<AuthenticatedUser> {
        self.inner
            .read()
            .await
            .connections
            .get(&connection_id)
            .and_then(|entry| entry.identity.clone())
    }

    /// Removes a connection, returning its identity for the offline
    /// presence notice. Cleans up any rooms left empty.
    pub async fn remove(&self, connection_id: ConnectionId) -> Option<AuthenticatedUser> {
        let mut inner = self.inner.write().await;
        inner.leave_all(connection_id);
        inner
            .connections
            .remove(&connection_id)
            .and_then(|entry| entry.identity)
    }

    /// Sends a message to one connection. Fire-and-forget: a closed
    /// channel means the connection is going away and the event is lost.
    pub async fn send_to(&self, connection_id: ConnectionId, message: ServerMessage) {
        let inner = self.inner.read().await;
        if let Some(entry) = inner.connections.get(&connection_id) {
            let _ = entry.sender.send(message);
        }
    }

    /// Broadcasts a message to every live connection, sender included.
    pub async fn broadcast_all(&self, message: ServerMessage) {
        let inner = self.inner.read().await;
        for entry in inner.connections.values() {
            let _ = entry.sender.send(message.clone());
        }
    }

    /// Broadcasts a message to every member of a room, optionally
    /// excluding one connection (the sender).
    pub async fn broadcast_room(
        &self,
        room: &RoomName,
        message: ServerMessage,
        exclude: Option<ConnectionId>,
    ) {
        let inner = self.inner.read().await;
        let Some(members) = inner.rooms.get(room) else {
            return;
        };
        for member in members {
            if Some(*member) == exclude {
                continue;
            }
            if let Some(entry) = inner.connections.get(member) {
                let _ = entry.sender.send(message.clone());
            }
        }
    }

    /// Number of live connections.
    pub async fn connection_count(&self) -> usize {
        self.inner.read().await.connections.len()
    }

    /// All rooms with at least one member (for monitoring/debugging).
    pub async fn active_rooms(&self) -> Vec<RoomName> {
        self.inner.read().await.rooms.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{Role, UserId};

    fn user(id: &str, role: Role) -> AuthenticatedUser {
        AuthenticatedUser::new(UserId::new(id).unwrap(), role, None)
    }

    async fn connect(
        registry: &ConnectionRegistry,
    ) -> (ConnectionId, mpsc::UnboundedReceiver<ServerMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (registry.register(tx).await, rx)
    }

    fn heartbeat() -> ServerMessage {
        ServerMessage::SystemHeartbeat {
            timestamp: "t".to_string(),
            status: "healthy".to_string(),
            connected_users: 0,
        }
    }

    #[tokio::test]
    async fn register_starts_anonymous() {
        let registry = ConnectionRegistry::new();
        let (conn, _rx) = connect(&registry).await;

        assert!(registry.identity(conn).await.is_none());
        assert_eq!(registry.connection_count().await, 1);
        assert!(registry.active_rooms().await.is_empty());
    }

    #[tokio::test]
    async fn attach_identity_joins_user_and_role_rooms() {
        let registry = ConnectionRegistry::new();
        let (conn, _rx) = connect(&registry).await;

        registry.attach_identity(conn, user("u1", Role::Staff)).await;

        let rooms = registry.active_rooms().await;
        assert_eq!(rooms.len(), 2);
        assert!(rooms.contains(&RoomName::named("u1")));
        assert!(rooms.contains(&RoomName::role(Role::Staff)));
    }

    #[tokio::test]
    async fn reattach_overwrites_identity_and_rooms() {
        let registry = ConnectionRegistry::new();
        let (conn, _rx) = connect(&registry).await;

        registry.attach_identity(conn, user("u1", Role::Staff)).await;
        registry.attach_identity(conn, user("u2", Role::Admin)).await;

        let identity = registry.identity(conn).await.unwrap();
        assert_eq!(identity.id.as_str(), "u2");
        assert_eq!(identity.role, Role::Admin);

        let rooms = registry.active_rooms().await;
        assert_eq!(rooms.len(), 2);
        assert!(rooms.contains(&RoomName::named("u2")));
        assert!(rooms.contains(&RoomName::admin()));
        assert!(!rooms.contains(&RoomName::named("u1")));
    }

    #[tokio::test]
    async fn broadcast_room_excludes_sender() {
        let registry = ConnectionRegistry::new();
        let (conn_a, mut rx_a) = connect(&registry).await;
        let (conn_b, mut rx_b) = connect(&registry).await;

        registry.attach_identity(conn_a, user("u1", Role::Staff)).await;
        registry.attach_identity(conn_b, user("u1", Role::Staff)).await;

        registry
            .broadcast_room(&RoomName::named("u1"), heartbeat(), Some(conn_a))
            .await;

        assert!(rx_a.try_recv().is_err());
        assert!(rx_b.try_recv().is_ok());
    }

    #[tokio::test]
    async fn broadcast_room_to_unknown_room_is_noop() {
        let registry = ConnectionRegistry::new();
        let (_conn, mut rx) = connect(&registry).await;

        registry
            .broadcast_room(&RoomName::named("nowhere"), heartbeat(), None)
            .await;

        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn broadcast_all_reaches_anonymous_connections() {
        let registry = ConnectionRegistry::new();
        let (conn_a, mut rx_a) = connect(&registry).await;
        let (_conn_b, mut rx_b) = connect(&registry).await;

        registry.attach_identity(conn_a, user("u1", Role::Admin)).await;
        registry.broadcast_all(heartbeat()).await;

        assert!(rx_a.try_recv().is_ok());
        assert!(rx_b.try_recv().is_ok());
    }

    #[tokio::test]
    async fn remove_returns_identity_and_cleans_rooms() {
        let registry = ConnectionRegistry::new();
        let (conn, _rx) = connect(&registry).await;
        registry.attach_identity(conn, user("u1", Role::Staff)).await;

        let identity = registry.remove(conn).await.unwrap();
        assert_eq!(identity.id.as_str(), "u1");
        assert_eq!(registry.connection_count().await, 0);
        assert!(registry.active_rooms().await.is_empty());
    }

    #[tokio::test]
    async fn remove_anonymous_returns_none() {
        let registry = ConnectionRegistry::new();
        let (conn, _rx) = connect(&registry).await;

        assert!(registry.remove(conn).await.is_none());
    }

    #[tokio::test]
    async fn join_room_adds_arbitrary_membership() {
        let registry = ConnectionRegistry::new();
        let (conn_a, _rx_a) = connect(&registry).await;
        let (_conn_b, mut rx_b) = connect(&registry).await;
        let (conn_c, mut rx_c) = connect(&registry).await;

        registry.join_room(conn_a, RoomName::named("prep-room-3")).await;
        registry.join_room(conn_c, RoomName::named("prep-room-3")).await;

        registry
            .broadcast_room(&RoomName::named("prep-room-3"), heartbeat(), Some(conn_a))
            .await;

        assert!(rx_b.try_recv().is_err());
        assert!(rx_c.try_recv().is_ok());
    }

    #[tokio::test]
    async fn send_to_closed_channel_is_ignored() {
        let registry = ConnectionRegistry::new();
        let (conn, rx) = connect(&registry).await;
        drop(rx);

        // Must not panic or error
        registry.send_to(conn, heartbeat()).await;
        registry.broadcast_all(heartbeat()).await;
    }
}
