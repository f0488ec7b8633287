//! Live match registry
//!
//! Owns every in-progress match, keyed by [`GameId`]. All calls for one match
//! serialize on that match's lock; different matches proceed independently.
//!
//! Two kinds of background task hang off a match:
//!
//! - the **grace timer**, armed when a participant disconnects mid-game (or
//!   when every seated player leaves a waiting game) and cancelled once
//!   everyone is back. On expiry the match is abandoned.
//! - the **ticker**, spawned with the first move, which spends the active
//!   colour's clock while the game is `playing` and ends it on a flag fall.
//!
//! Timers hold only a weak reference to the registry and re-resolve the match
//! by id when they fire, so a finished or removed match is never touched.

use crate::config::SessionConfig;
use crate::directory::{MatchArchive, MatchRecord, PlayerDirectory};
use crate::error::{SessionError, SessionResult};
use crate::session::{MatchHandle, MatchState};
use chess_rules::{
    Color, EndReason, Game, GameId, GameOutcome, GamePlayer, GameStatus, LegalMoves, MoveError,
    MoveRejection, PieceKind, PlayerId, Position, PresenceChange, SerializedBoard,
};
use chrono::Utc;
use parking_lot::RwLock;
use shared::{ClockSnapshot, MoveResponse, SessionEvent};
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

struct Inner {
    config: SessionConfig,
    matches: RwLock<HashMap<GameId, Arc<MatchHandle>>>,
    players: Arc<dyn PlayerDirectory>,
    archive: Arc<dyn MatchArchive>,
}

/// Result of seating (or re-seating) a player
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinOutcome {
    pub color: Color,
    /// The player already held this seat and was marked online again
    pub reconnected: bool,
}

/// Cheaply clonable handle to the set of live matches
#[derive(Clone)]
pub struct MatchRegistry {
    inner: Arc<Inner>,
}

impl MatchRegistry {
    pub fn new(
        config: SessionConfig,
        players: Arc<dyn PlayerDirectory>,
        archive: Arc<dyn MatchArchive>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                matches: RwLock::new(HashMap::new()),
                players,
                archive,
            }),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    fn handle(&self, id: GameId) -> SessionResult<Arc<MatchHandle>> {
        self.inner
            .matches
            .read()
            .get(&id)
            .cloned()
            .ok_or(SessionError::GameNotFound(id))
    }

    pub fn contains(&self, id: GameId) -> bool {
        self.inner.matches.read().contains_key(&id)
    }

    /// Number of live matches
    pub fn len(&self) -> usize {
        self.inner.matches.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Open a new match in `waiting` with the standard starting position
    pub fn create_game(&self) -> GameId {
        self.insert_game(Game::new())
    }

    /// Register an already constructed game (e.g. set up from FEN)
    pub fn insert_game(&self, mut game: Game) -> GameId {
        let headers = game.headers_mut();
        headers.event = self.inner.config.event.clone();
        headers.site = self.inner.config.site.clone();
        let id = game.id();
        let handle = Arc::new(MatchHandle::new(game, &self.inner.config));
        self.inner.matches.write().insert(id, handle);
        info!(game_id = %id, "game created");
        id
    }

    /// Receive every event broadcast for this match from now on
    pub fn subscribe(&self, id: GameId) -> SessionResult<broadcast::Receiver<SessionEvent>> {
        Ok(self.handle(id)?.subscribe())
    }

    /// Seat a player, or mark an already seated player online again
    ///
    /// The identity is resolved through the player directory. The first new
    /// player gets White, the second Black; a third is refused with
    /// [`SessionError::GameFull`].
    pub async fn add_participant(
        &self,
        id: GameId,
        player_id: PlayerId,
    ) -> SessionResult<JoinOutcome> {
        let player = self
            .inner
            .players
            .get_player(player_id)
            .await
            .ok_or(SessionError::PlayerNotFound(player_id))?;
        let handle = self.handle(id)?;
        let mut state = handle.state.write().await;

        if let Some(seat) = state.game.participant(player_id) {
            let color = seat.color;
            self.apply_presence(&handle, &mut state, player_id, true)?;
            return Ok(JoinOutcome {
                color,
                reconnected: true,
            });
        }

        let seat = state.game.add_participant(player)?;
        handle.emit(SessionEvent::PlayerJoined {
            game_id: id,
            player_id,
            name: seat.player.name.clone(),
            color: seat.color,
        });
        if state.game.status() == GameStatus::FirstMovement {
            emit_started(&handle, &state);
        }
        self.sync_grace_timer(&handle, &mut state);

        Ok(JoinOutcome {
            color: seat.color,
            reconnected: false,
        })
    }

    /// Report a participant's transport connecting or dropping
    ///
    /// Drives the pause state machine and arms or cancels the grace timer.
    /// Duplicate events return [`PresenceChange::Unchanged`] and never arm a
    /// second timer.
    pub async fn set_participant_online(
        &self,
        id: GameId,
        player_id: PlayerId,
        online: bool,
    ) -> SessionResult<PresenceChange> {
        let handle = self.handle(id)?;
        let mut state = handle.state.write().await;
        self.apply_presence(&handle, &mut state, player_id, online)
    }

    fn apply_presence(
        &self,
        handle: &Arc<MatchHandle>,
        state: &mut MatchState,
        player_id: PlayerId,
        online: bool,
    ) -> SessionResult<PresenceChange> {
        let change = state
            .game
            .set_participant_online(player_id, online)
            .ok_or(SessionError::NotParticipant)?;

        match change {
            PresenceChange::Paused => {
                state.clock.pause();
                let name = state
                    .game
                    .participant(player_id)
                    .map(|p| p.player.name.clone())
                    .unwrap_or_default();
                handle.emit(SessionEvent::GamePaused {
                    game_id: handle.id,
                    player_id,
                    grace_secs: self.inner.config.grace_secs,
                    message: format!(
                        "{name} disconnected. Waiting {}s for them to reconnect.",
                        self.inner.config.grace_secs
                    ),
                });
            }
            PresenceChange::Resumed => {
                state.clock.resume();
                handle.emit(SessionEvent::GameResumed {
                    game_id: handle.id,
                    status: state.game.status(),
                });
            }
            PresenceChange::Started => emit_started(handle, state),
            PresenceChange::Unchanged => {}
        }

        self.sync_grace_timer(handle, state);
        Ok(change)
    }

    // ------------------------------------------------------------------
    // Gameplay
    // ------------------------------------------------------------------

    /// Validate and apply a move for a seated player
    ///
    /// A refused move returns [`SessionError::Rejected`] and leaves the match
    /// untouched. A corrupted board ends the match without a winner and
    /// returns [`SessionError::Corrupted`].
    pub async fn apply_move(
        &self,
        id: GameId,
        player_id: PlayerId,
        from: Position,
        to: Position,
        promotion: Option<PieceKind>,
    ) -> SessionResult<MoveResponse> {
        let handle = self.handle(id)?;
        let mut state = handle.state.write().await;
        let seat = self.seat(&state, player_id)?;

        match state.game.apply_move(&seat, from, to, promotion) {
            Ok(outcome) => {
                state.clock.complete_move(seat.color);
                if state.ticker.is_none() && outcome.outcome.is_none() {
                    state.ticker = Some(self.spawn_ticker(id));
                }

                let response = MoveResponse::from(&outcome);
                handle.emit(SessionEvent::BoardUpdate {
                    game_id: id,
                    result: response.clone(),
                    clocks: state.clock.snapshot(),
                });
                if outcome.outcome.is_some() {
                    self.finalize(&handle, &mut state);
                }
                Ok(response)
            }
            Err(MoveError::Rejected(rejection)) => Err(rejection.into()),
            Err(MoveError::Corrupted(violation)) => {
                error!(game_id = %id, error = %violation, "aborting match with corrupted board");
                if state.game.finish(GameOutcome::draw(EndReason::Corrupted)) {
                    self.finalize(&handle, &mut state);
                }
                Err(violation.into())
            }
        }
    }

    /// Legal destinations for UI hints
    ///
    /// Empty unless the game accepts moves, it is the requester's turn and the
    /// piece on `from` is theirs.
    pub async fn legal_moves(
        &self,
        id: GameId,
        player_id: PlayerId,
        from: Position,
    ) -> SessionResult<LegalMoves> {
        let handle = self.handle(id)?;
        let state = handle.state.read().await;
        let seat = self.seat(&state, player_id)?;
        let game = &state.game;

        if !game.status().accepts_moves()
            || game.turn() != seat.color
            || game.board().color_at(from) != Some(seat.color)
        {
            return Ok(LegalMoves::default());
        }
        Ok(game.legal_moves(from)?)
    }

    pub async fn resign(&self, id: GameId, player_id: PlayerId) -> SessionResult<GameOutcome> {
        let handle = self.handle(id)?;
        let mut state = handle.state.write().await;
        self.seat(&state, player_id)?;

        match state.game.resign(player_id) {
            Some(outcome) => {
                self.finalize(&handle, &mut state);
                Ok(outcome)
            }
            None => Err(MoveRejection::GameNotActive(state.game.status()).into()),
        }
    }

    fn seat(&self, state: &MatchState, player_id: PlayerId) -> SessionResult<GamePlayer> {
        state
            .game
            .participant(player_id)
            .cloned()
            .ok_or(SessionError::NotParticipant)
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub async fn status(&self, id: GameId) -> SessionResult<GameStatus> {
        let handle = self.handle(id)?;
        let state = handle.state.read().await;
        Ok(state.game.status())
    }

    pub async fn board(&self, id: GameId) -> SessionResult<SerializedBoard> {
        let handle = self.handle(id)?;
        let state = handle.state.read().await;
        Ok(state.game.serialize_board())
    }

    pub async fn fen(&self, id: GameId) -> SessionResult<String> {
        let handle = self.handle(id)?;
        let state = handle.state.read().await;
        Ok(state.game.fen())
    }

    pub async fn pgn(&self, id: GameId) -> SessionResult<String> {
        let handle = self.handle(id)?;
        let state = handle.state.read().await;
        Ok(state.game.pgn())
    }

    pub async fn clocks(&self, id: GameId) -> SessionResult<ClockSnapshot> {
        let handle = self.handle(id)?;
        let state = handle.state.read().await;
        Ok(state.clock.snapshot())
    }

    pub async fn participants(&self, id: GameId) -> SessionResult<Vec<GamePlayer>> {
        let handle = self.handle(id)?;
        let state = handle.state.read().await;
        Ok(state.game.participants().to_vec())
    }

    pub async fn has_grace_timer(&self, id: GameId) -> SessionResult<bool> {
        let handle = self.handle(id)?;
        let state = handle.state.read().await;
        Ok(state.has_grace_timer())
    }

    // ------------------------------------------------------------------
    // Timers
    // ------------------------------------------------------------------

    /// Arm or cancel the grace timer to match the current state
    fn sync_grace_timer(&self, handle: &Arc<MatchHandle>, state: &mut MatchState) {
        if state.needs_grace_timer() {
            if state.grace_timer.is_none() {
                state.grace_timer = Some(self.spawn_grace_timer(handle.id));
                info!(
                    game_id = %handle.id,
                    grace_secs = self.inner.config.grace_secs,
                    "grace timer armed"
                );
            }
        } else if state.cancel_grace_timer() {
            info!(game_id = %handle.id, "all participants back, grace timer cancelled");
        }
    }

    fn spawn_grace_timer(&self, id: GameId) -> JoinHandle<()> {
        let registry = Arc::downgrade(&self.inner);
        let grace = self.inner.config.grace();
        tokio::spawn(async move {
            time::sleep(grace).await;
            if let Some(registry) = upgrade(&registry) {
                registry.on_grace_expired(id).await;
            }
        })
    }

    async fn on_grace_expired(&self, id: GameId) {
        let Ok(handle) = self.handle(id) else {
            debug!(game_id = %id, "grace timer fired for a removed game");
            return;
        };
        let mut state = handle.state.write().await;
        // This task is the timer; release it without aborting ourselves
        state.grace_timer = None;

        match state.game.status() {
            GameStatus::PausedReconnect => {
                let online: Vec<Color> = state
                    .game
                    .participants()
                    .iter()
                    .filter(|p| p.is_online)
                    .map(|p| p.color)
                    .collect();
                let outcome = match online.as_slice() {
                    [winner] => GameOutcome::win(*winner, EndReason::Abandonment),
                    _ => GameOutcome::draw(EndReason::Abandonment),
                };
                info!(game_id = %id, winner = ?outcome.winner, "grace period expired");
                if state.game.finish(outcome) {
                    self.finalize(&handle, &mut state);
                }
            }
            GameStatus::Waiting if state.needs_grace_timer() => {
                info!(game_id = %id, "waiting game left by every player, removing");
                state.cancel_timers();
                self.remove(&handle);
            }
            status => debug!(game_id = %id, %status, "stale grace timer ignored"),
        }
    }

    fn spawn_ticker(&self, id: GameId) -> JoinHandle<()> {
        let registry = Arc::downgrade(&self.inner);
        let period = self.inner.config.tick();
        tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                let Some(registry) = upgrade(&registry) else {
                    break;
                };
                if !registry.on_tick(id).await {
                    break;
                }
            }
        })
    }

    /// Spend one tick from the active clock; `false` stops the ticker
    async fn on_tick(&self, id: GameId) -> bool {
        let Ok(handle) = self.handle(id) else {
            return false;
        };
        let mut state = handle.state.write().await;
        match state.game.status() {
            GameStatus::Playing => {}
            status if status.is_terminal() => return false,
            _ => return true,
        }

        let Some(flagged) = state.clock.tick(self.inner.config.tick()) else {
            return true;
        };
        info!(game_id = %id, color = %flagged, "flag fell");
        state.ticker = None;
        if state
            .game
            .finish(GameOutcome::win(flagged.opponent(), EndReason::Timeout))
        {
            self.finalize(&handle, &mut state);
        }
        false
    }

    // ------------------------------------------------------------------
    // Completion
    // ------------------------------------------------------------------

    /// Tear down a match that just reached a terminal status
    ///
    /// Stops its timers, drops it from the registry, broadcasts the result and
    /// hands a record to the archive in the background.
    fn finalize(&self, handle: &Arc<MatchHandle>, state: &mut MatchState) {
        state.cancel_timers();
        state.clock.pause();
        let Some(outcome) = state.game.outcome() else {
            warn!(game_id = %handle.id, "finalize called on an unfinished game");
            return;
        };

        self.remove(handle);
        handle.emit(SessionEvent::GameOver {
            game_id: handle.id,
            status: state.game.status(),
            winner: outcome.winner,
            reason: outcome.reason,
            message: outcome.message(),
        });
        self.archive(&state.game);
    }

    fn remove(&self, handle: &Arc<MatchHandle>) {
        let mut matches = self.inner.matches.write();
        if matches
            .get(&handle.id)
            .is_some_and(|live| Arc::ptr_eq(live, handle))
        {
            matches.remove(&handle.id);
            debug!(game_id = %handle.id, remaining = matches.len(), "match removed");
        }
    }

    fn archive(&self, game: &Game) {
        let (Some(white), Some(black)) = (
            game.participant_by_color(Color::White),
            game.participant_by_color(Color::Black),
        ) else {
            debug!(game_id = %game.id(), "match never had two players, not archiving");
            return;
        };
        let Some(outcome) = game.outcome() else {
            return;
        };

        let record = MatchRecord {
            game_id: game.id(),
            white: white.player.clone(),
            black: black.player.clone(),
            winner: outcome.winner,
            reason: outcome.reason,
            status: game.status(),
            pgn: game.pgn(),
            finished_at: Utc::now(),
        };
        let archive = Arc::clone(&self.inner.archive);
        tokio::spawn(async move {
            let game_id = record.game_id;
            match archive.save_match(record).await {
                Ok(()) => debug!(%game_id, "match archived"),
                Err(e) => warn!(%game_id, error = %e, "failed to archive match"),
            }
        });
    }
}

fn upgrade(inner: &Weak<Inner>) -> Option<MatchRegistry> {
    inner.upgrade().map(|inner| MatchRegistry { inner })
}

fn emit_started(handle: &MatchHandle, state: &MatchState) {
    handle.emit(SessionEvent::GameStarted {
        game_id: handle.id,
        board: state.game.serialize_board(),
        turn: state.game.turn(),
    });
}
