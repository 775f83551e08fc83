//! Multiplayer cursor presence.
//!
//! Wire messages exchanged with the relay, and the overlay of remote
//! cursors they feed. Remote cursors are ephemeral: they never enter the
//! store or its history.

use crate::time::{Duration, Instant};
use kurbo::Point;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Remote cursors not heard from for this long are dropped.
pub const CURSOR_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum PresenceError {
    #[error("Invalid presence message: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Display identity of a participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    pub name: String,
    /// CSS color string.
    pub color: String,
}

/// Messages sent to the relay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Join { room: String, user: UserInfo },
    Leave,
    /// Cursor position in world coordinates.
    Cursor { x: f64, y: f64 },
}

/// Messages received from the relay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Joined {
        room: String,
        user_id: String,
        peer_count: usize,
    },
    PeerJoined {
        user_id: String,
        user: UserInfo,
    },
    PeerLeft {
        user_id: String,
    },
    Cursor {
        user_id: String,
        x: f64,
        y: f64,
        name: String,
        color: String,
    },
    Error {
        message: String,
    },
}

pub fn encode<T: Serialize>(message: &T) -> Result<String, PresenceError> {
    Ok(serde_json::to_string(message)?)
}

pub fn decode_server(text: &str) -> Result<ServerMessage, PresenceError> {
    Ok(serde_json::from_str(text)?)
}

pub fn decode_client(text: &str) -> Result<ClientMessage, PresenceError> {
    Ok(serde_json::from_str(text)?)
}

/// Connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Error,
}

/// A remote participant's cursor.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteCursor {
    pub user_id: String,
    /// World-space position.
    pub position: Point,
    pub name: String,
    pub color: String,
    pub last_seen: Instant,
}

/// Live remote cursors for the overlay.
#[derive(Debug, Clone)]
pub struct PresenceOverlay {
    cursors: HashMap<String, RemoteCursor>,
    timeout: Duration,
    state: ConnectionState,
    /// Our own id once the relay confirmed the join.
    self_id: Option<String>,
}

impl Default for PresenceOverlay {
    fn default() -> Self {
        Self::new(CURSOR_TIMEOUT)
    }
}

impl PresenceOverlay {
    pub fn new(timeout: Duration) -> Self {
        Self {
            cursors: HashMap::new(),
            timeout,
            state: ConnectionState::Disconnected,
            self_id: None,
        }
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.state
    }

    pub fn set_connection_state(&mut self, state: ConnectionState) {
        if state == ConnectionState::Disconnected {
            self.cursors.clear();
            self.self_id = None;
        }
        self.state = state;
    }

    /// Apply a relay message. Returns `true` when visible cursors changed.
    pub fn apply(&mut self, message: ServerMessage, now: Instant) -> bool {
        match message {
            ServerMessage::Joined {
                room,
                user_id,
                peer_count,
            } => {
                log::info!("Joined room {} as {} ({} peers)", room, user_id, peer_count);
                self.self_id = Some(user_id);
                self.state = ConnectionState::Connected;
                false
            }
            ServerMessage::PeerJoined { user_id, user } => {
                log::debug!("Peer {} ({}) joined", user_id, user.name);
                false
            }
            ServerMessage::PeerLeft { user_id } => self.cursors.remove(&user_id).is_some(),
            ServerMessage::Cursor {
                user_id,
                x,
                y,
                name,
                color,
            } => {
                if self.self_id.as_deref() == Some(user_id.as_str()) {
                    return false;
                }
                self.cursors.insert(
                    user_id.clone(),
                    RemoteCursor {
                        user_id,
                        position: Point::new(x, y),
                        name,
                        color,
                        last_seen: now,
                    },
                );
                true
            }
            ServerMessage::Error { message } => {
                log::warn!("Relay error: {}", message);
                false
            }
        }
    }

    /// Drop stale cursors. Returns the removed user ids.
    pub fn expire(&mut self, now: Instant) -> Vec<String> {
        let timeout = self.timeout;
        let stale: Vec<String> = self
            .cursors
            .values()
            .filter(|c| now.duration_since(c.last_seen) >= timeout)
            .map(|c| c.user_id.clone())
            .collect();
        for id in &stale {
            self.cursors.remove(id);
        }
        stale
    }

    /// Cursors ordered by user id.
    pub fn cursors(&self) -> Vec<&RemoteCursor> {
        let mut cursors: Vec<_> = self.cursors.values().collect();
        cursors.sort_by(|a, b| a.user_id.cmp(&b.user_id));
        cursors
    }

    pub fn len(&self) -> usize {
        self.cursors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cursors.is_empty()
    }
}
