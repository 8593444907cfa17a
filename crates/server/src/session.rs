// crates/server/src/session.rs
//! Per-session display state.
//!
//! The store is a plain `HashMap` on purpose: it is owned by the single
//! controller task and never crosses a thread, so the concurrent-map
//! machinery the connection registry needs would be dead weight here.

use std::collections::HashMap;

use hostdeck_core::{DisplayMode, LayoutSize};

use crate::protocol::SessionId;

/// What a session's surface currently shows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionState {
    pub layout_size: LayoutSize,
    pub mode: DisplayMode,
    /// Latched when the greeting goes out so a session is welcomed once,
    /// not on every reopen.
    pub first_interaction_seen: bool,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            layout_size: LayoutSize::default(),
            mode: DisplayMode::default(),
            first_interaction_seen: false,
        }
    }
}

/// Display state for every session the controller has seen and not yet
/// torn down.
#[derive(Default)]
pub struct SessionStore {
    sessions: HashMap<SessionId, SessionState>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the session's state, creating the default (full-size
    /// dashboard) on first sight.
    pub fn get_or_create(&mut self, session: &SessionId) -> &mut SessionState {
        self.sessions.entry(session.clone()).or_default()
    }

    pub fn get(&self, session: &SessionId) -> Option<&SessionState> {
        self.sessions.get(session)
    }

    pub fn get_mut(&mut self, session: &SessionId) -> Option<&mut SessionState> {
        self.sessions.get_mut(session)
    }

    /// Forget a session entirely. Returns false if it was never there.
    pub fn remove(&mut self, session: &SessionId) -> bool {
        self.sessions.remove(session).is_some()
    }

    pub fn contains(&self, session: &SessionId) -> bool {
        self.sessions.contains_key(session)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SessionId, &SessionState)> {
        self.sessions.iter()
    }
}
