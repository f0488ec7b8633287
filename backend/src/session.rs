//! Per-match state owned by the registry
//!
//! A [`MatchHandle`] bundles a game with its clock, its background timers and
//! its event channel. The handle's lock is the match's single serialization
//! point: every mutation takes the write half, read-only queries the read
//! half. Timer tasks are owned here and aborted when the match finishes, so a
//! timer never outlives the match it was armed for.

use crate::clock::ChessClock;
use crate::config::SessionConfig;
use chess_rules::{Game, GameId, GameStatus};
use shared::SessionEvent;
use tokio::sync::{broadcast, RwLock};
use tokio::task::JoinHandle;

/// Buffered events per match before slow subscribers start lagging
const EVENT_CAPACITY: usize = 64;

/// Mutable state of one match
#[derive(Debug)]
pub struct MatchState {
    pub game: Game,
    pub clock: ChessClock,
    /// Reconnection grace timer; at most one per match
    pub(crate) grace_timer: Option<JoinHandle<()>>,
    /// Clock ticker, spawned with the first move
    pub(crate) ticker: Option<JoinHandle<()>>,
}

impl MatchState {
    pub fn new(game: Game, config: &SessionConfig) -> Self {
        Self {
            game,
            clock: ChessClock::new(config.clock(), config.increment()),
            grace_timer: None,
            ticker: None,
        }
    }

    pub fn has_grace_timer(&self) -> bool {
        self.grace_timer.is_some()
    }

    /// Whether the grace timer should be armed in the current state
    ///
    /// Paused games need one. So does a waiting game whose seated players
    /// have all gone, so it does not linger forever.
    pub(crate) fn needs_grace_timer(&self) -> bool {
        let participants = self.game.participants();
        match self.game.status() {
            GameStatus::PausedReconnect => true,
            GameStatus::Waiting => {
                !participants.is_empty() && participants.iter().all(|p| !p.is_online)
            }
            _ => false,
        }
    }

    pub(crate) fn cancel_grace_timer(&mut self) -> bool {
        match self.grace_timer.take() {
            Some(timer) => {
                timer.abort();
                true
            }
            None => false,
        }
    }

    /// Abort every background task owned by this match
    pub(crate) fn cancel_timers(&mut self) {
        self.cancel_grace_timer();
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
    }
}

/// Shared handle to one match
#[derive(Debug)]
pub struct MatchHandle {
    pub id: GameId,
    pub(crate) state: RwLock<MatchState>,
    events: broadcast::Sender<SessionEvent>,
}

impl MatchHandle {
    pub fn new(game: Game, config: &SessionConfig) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            id: game.id(),
            state: RwLock::new(MatchState::new(game, config)),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Fan an event out to current subscribers; nobody listening is fine
    pub(crate) fn emit(&self, event: SessionEvent) {
        let _ = self.events.send(event);
    }
}
