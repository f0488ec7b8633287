//! Players and their seats in a match

use crate::types::Color;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Stable identity of a player across connections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub Uuid);

impl PlayerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PlayerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A registered player
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
}

impl Player {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: PlayerId::new(),
            name: name.into(),
        }
    }
}

/// A player seated in a particular match
///
/// Colour is fixed at seating time. `disconnected_at` is set when the player
/// drops and cleared again on reconnect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GamePlayer {
    pub player: Player,
    pub color: Color,
    pub is_online: bool,
    pub disconnected_at: Option<DateTime<Utc>>,
}

impl GamePlayer {
    pub fn new(player: Player, color: Color) -> Self {
        Self {
            player,
            color,
            is_online: true,
            disconnected_at: None,
        }
    }

    #[inline]
    pub fn id(&self) -> PlayerId {
        self.player.id
    }

    /// Record a connection change, stamping the time of a disconnect
    pub fn set_online(&mut self, online: bool) {
        self.is_online = online;
        self.disconnected_at = if online { None } else { Some(Utc::now()) };
    }
}
