// crates/server/src/connections.rs
//! Live WebSocket connection registry.
//!
//! Holds the outbound sender for every connected session so any part of
//! the daemon can push a [`ServerFrame`] without touching the socket task.
//! The registry is the population gauge too: `count()` over `limit()` is
//! what the dashboard shows as sessions.

use std::time::Instant;

use dashmap::DashMap;
use tokio::sync::mpsc::UnboundedSender;

use crate::protocol::{ServerFrame, SessionId};

#[derive(Debug, thiserror::Error)]
pub enum ConnectError {
    #[error("session limit reached ({limit} active)")]
    PopulationFull { limit: usize },
}

struct ConnectionHandle {
    tx: UnboundedSender<ServerFrame>,
    connected_at: Instant,
}

/// Concurrent map from session id to its outbound frame channel.
pub struct ConnectionRegistry {
    connections: DashMap<SessionId, ConnectionHandle>,
    limit: usize,
}

impl ConnectionRegistry {
    pub fn new(limit: usize) -> Self {
        Self {
            connections: DashMap::new(),
            limit,
        }
    }

    /// Register a connection. A reconnect for an already-registered session
    /// replaces the old sender and does not count against the limit.
    pub fn register(
        &self,
        session: SessionId,
        tx: UnboundedSender<ServerFrame>,
    ) -> Result<(), ConnectError> {
        if !self.connections.contains_key(&session) && self.connections.len() >= self.limit {
            return Err(ConnectError::PopulationFull { limit: self.limit });
        }
        self.connections.insert(
            session,
            ConnectionHandle {
                tx,
                connected_at: Instant::now(),
            },
        );
        Ok(())
    }

    /// Drop a connection, but only while the registered sender is still the
    /// caller's channel. A socket that was replaced by a reconnect gets false
    /// back and the replacement stays registered.
    pub fn remove(&self, session: &SessionId, tx: &UnboundedSender<ServerFrame>) -> bool {
        self.connections
            .remove_if(session, |_, handle| handle.tx.same_channel(tx))
            .is_some()
    }

    pub fn is_connected(&self, session: &SessionId) -> bool {
        self.connections.contains_key(session)
    }

    /// Push a frame to one session. Returns false when the session is not
    /// connected or its socket task has shut down.
    pub fn send_to(&self, session: &SessionId, frame: ServerFrame) -> bool {
        match self.connections.get(session) {
            Some(handle) => handle.tx.send(frame).is_ok(),
            None => false,
        }
    }

    /// Seconds the session has been on this connection, if connected.
    pub fn connected_secs(&self, session: &SessionId) -> Option<u64> {
        self.connections
            .get(session)
            .map(|h| h.connected_at.elapsed().as_secs())
    }

    pub fn count(&self) -> usize {
        self.connections.len()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }
}
