//! Collaborators the session layer depends on
//!
//! - [`PlayerDirectory`] resolves durable player identities. The session
//!   layer never invents identities of its own.
//! - [`MatchArchive`] persists finished matches. Called once per finished
//!   match, best effort: failures are logged by the caller and never reach
//!   gameplay.
//!
//! In-memory implementations back the binary and the tests.

use async_trait::async_trait;
use chess_rules::{Color, EndReason, GameId, GameStatus, Player, PlayerId};
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;

#[async_trait]
pub trait PlayerDirectory: Send + Sync {
    async fn get_player(&self, id: PlayerId) -> Option<Player>;
}

/// Everything stored about a finished match
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchRecord {
    pub game_id: GameId,
    pub white: Player,
    pub black: Player,
    pub winner: Option<Color>,
    pub reason: EndReason,
    pub status: GameStatus,
    pub pgn: String,
    pub finished_at: DateTime<Utc>,
}

#[async_trait]
pub trait MatchArchive: Send + Sync {
    async fn save_match(&self, record: MatchRecord) -> anyhow::Result<()>;
}

/// Player directory held in memory
#[derive(Debug, Default)]
pub struct InMemoryPlayers {
    players: RwLock<HashMap<PlayerId, Player>>,
}

impl InMemoryPlayers {
    /// Create and store a player with a fresh id
    pub fn register(&self, name: impl Into<String>) -> Player {
        let player = Player::new(name);
        self.players.write().insert(player.id, player.clone());
        player
    }

    pub fn insert(&self, player: Player) {
        self.players.write().insert(player.id, player);
    }
}

#[async_trait]
impl PlayerDirectory for InMemoryPlayers {
    async fn get_player(&self, id: PlayerId) -> Option<Player> {
        self.players.read().get(&id).cloned()
    }
}

/// Archive that keeps finished matches in memory
#[derive(Debug, Default)]
pub struct MemoryArchive {
    records: Mutex<Vec<MatchRecord>>,
}

impl MemoryArchive {
    pub fn records(&self) -> Vec<MatchRecord> {
        self.records.lock().clone()
    }
}

#[async_trait]
impl MatchArchive for MemoryArchive {
    async fn save_match(&self, record: MatchRecord) -> anyhow::Result<()> {
        self.records.lock().push(record);
        Ok(())
    }
}
