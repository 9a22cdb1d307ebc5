//! Fan-out of server messages to every WebSocket connection plus the
//! spectator SSE stream.

use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
    dto::ws::ServerMessage,
    state::{
        SseHub,
        policy::{Identity, can_view_answers},
    },
};

/// Identifier of one live connection.
pub type ConnectionId = Uuid;

/// Handle used to push messages to a connected client.
#[derive(Debug, Clone)]
pub struct ClientConnection {
    tx: mpsc::UnboundedSender<ServerMessage>,
    identity: Option<Identity>,
}

/// Registry of live connections. Each connection owns an unbounded FIFO
/// queue drained by its writer task.
pub struct BroadcastGateway {
    connections: DashMap<ConnectionId, ClientConnection>,
    public_sse: SseHub,
}

impl BroadcastGateway {
    /// Create an empty gateway whose SSE mirror buffers `sse_capacity` events.
    pub fn new(sse_capacity: usize) -> Self {
        Self {
            connections: DashMap::new(),
            public_sse: SseHub::new(sse_capacity),
        }
    }

    /// Spectator stream mirroring every public broadcast.
    pub fn public_sse(&self) -> &SseHub {
        &self.public_sse
    }

    /// Register a new anonymous connection.
    pub fn register(&self) -> (ConnectionId, mpsc::UnboundedReceiver<ServerMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = Uuid::new_v4();
        self.connections.insert(id, ClientConnection { tx, identity: None });
        debug!(connection = %id, "connection registered");
        (id, rx)
    }

    /// Forget a connection.
    pub fn unregister(&self, id: ConnectionId) {
        self.connections.remove(&id);
    }

    /// Number of live connections.
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Attach (or clear) the identity of a connection.
    pub fn set_identity(&self, id: ConnectionId, identity: Option<Identity>) {
        if let Some(mut connection) = self.connections.get_mut(&id) {
            connection.identity = identity;
        }
    }

    /// Identity currently attached to a connection.
    pub fn identity(&self, id: ConnectionId) -> Option<Identity> {
        self.connections
            .get(&id)
            .and_then(|connection| connection.identity.clone())
    }

    /// Log out every connection of `username`.
    pub fn revoke_user(&self, username: &str) {
        for mut connection in self.connections.iter_mut() {
            if connection
                .identity
                .as_ref()
                .is_some_and(|identity| identity.username == username)
            {
                connection.identity = None;
            }
        }
    }

    /// Deliver a message to one connection. Returns `false` when it is gone.
    pub fn send_to(&self, id: ConnectionId, message: ServerMessage) -> bool {
        let delivered = self
            .connections
            .get(&id)
            .is_some_and(|connection| connection.tx.send(message).is_ok());
        if !delivered {
            self.connections.remove(&id);
        }
        delivered
    }

    /// Deliver the same message to every connection and spectator.
    pub fn broadcast(&self, message: ServerMessage) {
        self.mirror(&message);
        self.fan_out(|_| message.clone());
    }

    /// Deliver `privileged` to admins and editors and `public` to everyone
    /// else, including spectators.
    pub fn broadcast_tailored(&self, public: ServerMessage, privileged: ServerMessage) {
        self.mirror(&public);
        self.fan_out(|identity| {
            if identity.is_some_and(|identity| can_view_answers(identity.role)) {
                privileged.clone()
            } else {
                public.clone()
            }
        });
    }

    fn fan_out(&self, select: impl Fn(Option<&Identity>) -> ServerMessage) {
        let mut dead = Vec::new();
        for connection in self.connections.iter() {
            let message = select(connection.identity.as_ref());
            if connection.tx.send(message).is_err() {
                dead.push(*connection.key());
            }
        }
        for id in dead {
            debug!(connection = %id, "pruning closed connection");
            self.connections.remove(&id);
        }
    }

    fn mirror(&self, message: &ServerMessage) {
        match message.to_sse_event() {
            Ok(event) => self.public_sse.broadcast(event),
            Err(err) => warn!(
                event = message.event_name(),
                error = %err,
                "failed to serialize public SSE payload"
            ),
        }
    }
}
