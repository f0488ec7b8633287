//! Move orchestrator and per-match game state
//!
//! [`Game`] owns everything one match needs to judge moves: the board, whose
//! turn it is, the en-passant target, the move counters, the seated players
//! and the move history. It is the trust boundary for move requests, so every
//! precondition is re-checked here even if a transport layer already did.
//!
//! # Move Sequence
//!
//! [`Game::apply_move`] runs these steps, stopping at the first failure with
//! the game exactly as it was before the call:
//!
//! 1. Status accepts moves, mover is seated, mover holds the turn, mover owns the piece
//! 2. Classify the move against the untouched board ([`plan_move`])
//! 3. Compute the SAN disambiguation prefix (needs the pre-move board)
//! 4. Apply; if the mover's own king is now attacked, revert and reject
//! 5. Update counters and en-passant target, switch the turn
//! 6. Evaluate the side to move: checkmate, stalemate, fifty-move rule, repetition
//! 7. Record the move in SAN
//!
//! # Concurrency
//!
//! `Game` is plain data with `&mut self` mutation. Callers that share a game
//! across tasks serialize access to it (the session layer keeps each game
//! behind its own lock).

use crate::board::{Board, SerializedBoard};
use crate::error::{JoinError, MoveError, MoveRejection, MoveResult, RulesResult};
use crate::history::{MoveHistory, MoveRecord};
use crate::moves::MoveKind;
use crate::notation::fen::{self, FenError, FenSnapshot};
use crate::notation::{san, PgnHeaders};
use crate::player::{GamePlayer, Player, PlayerId};
use crate::rules::check::legal_destinations;
use crate::rules::{has_legal_move, is_in_check, plan_move, MoveContext};
use crate::status::{EndReason, GameOutcome, GameStatus};
use crate::types::{Color, PieceKind, Position};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, error, info};
use uuid::Uuid;

/// Halfmove clock value at which the fifty-move rule draws the game
pub const FIFTY_MOVE_LIMIT: u32 = 100;

/// Number of occurrences of one position that draws the game
pub const REPETITION_LIMIT: u8 = 3;

/// Identity of one match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameId(pub Uuid);

impl GameId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for GameId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Destinations a piece can legally reach, split for UI hinting
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegalMoves {
    pub normal: Vec<Position>,
    pub captures: Vec<Position>,
}

/// What a successful [`Game::apply_move`] produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveOutcome {
    pub record: MoveRecord,
    pub board: SerializedBoard,
    /// Side to move after this move
    pub turn: Color,
    pub status: GameStatus,
    /// Set when this move ended the game
    pub outcome: Option<GameOutcome>,
    /// Whether the side to move is now in check
    pub is_check: bool,
}

impl MoveOutcome {
    pub fn san(&self) -> &str {
        &self.record.san
    }

    pub fn winner(&self) -> Option<Color> {
        self.outcome.and_then(|o| o.winner)
    }
}

/// Effect of a participant's connection change on the match
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresenceChange {
    /// Nothing about the match changed (duplicate event, terminal game, ...)
    Unchanged,
    /// Both participants are now online; the game moved to `first_movement`
    Started,
    /// A participant dropped mid-game; the game is `paused_reconnect`
    Paused,
    /// Everyone is back; the game returned to the status it was paused from
    Resumed,
}

#[derive(Debug, Clone)]
pub struct Game {
    id: GameId,
    board: Board,
    turn: Color,
    status: GameStatus,
    /// Status to return to when a paused game resumes
    paused_from: Option<GameStatus>,
    en_passant: Option<Position>,
    halfmove_clock: u32,
    fullmove_number: u32,
    outcome: Option<GameOutcome>,
    participants: Vec<GamePlayer>,
    history: MoveHistory,
    /// Occurrences of each position key, for threefold repetition
    repetitions: HashMap<String, u8>,
    headers: PgnHeaders,
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

impl Game {
    /// New game in the standard starting position, waiting for players
    pub fn new() -> Self {
        Self::with_position(
            Board::standard(),
            FenSnapshot {
                turn: Color::White,
                en_passant: None,
                halfmove_clock: 0,
                fullmove_number: 1,
            },
        )
    }

    /// New game starting from a FEN position
    pub fn from_fen(fen: &str) -> Result<Self, FenError> {
        let position = fen::parse_fen(fen)?;
        Ok(Self::with_position(position.board, position.snapshot))
    }

    fn with_position(board: Board, snapshot: FenSnapshot) -> Self {
        let mut game = Self {
            id: GameId::new(),
            board,
            turn: snapshot.turn,
            status: GameStatus::Waiting,
            paused_from: None,
            en_passant: snapshot.en_passant,
            halfmove_clock: snapshot.halfmove_clock,
            fullmove_number: snapshot.fullmove_number,
            outcome: None,
            participants: Vec::with_capacity(2),
            history: MoveHistory::default(),
            repetitions: HashMap::new(),
            headers: PgnHeaders::default(),
        };
        game.record_position();
        game
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn id(&self) -> GameId {
        self.id
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn turn(&self) -> Color {
        self.turn
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn outcome(&self) -> Option<GameOutcome> {
        self.outcome
    }

    pub fn en_passant(&self) -> Option<Position> {
        self.en_passant
    }

    pub fn halfmove_clock(&self) -> u32 {
        self.halfmove_clock
    }

    pub fn fullmove_number(&self) -> u32 {
        self.fullmove_number
    }

    pub fn history(&self) -> &MoveHistory {
        &self.history
    }

    pub fn participants(&self) -> &[GamePlayer] {
        &self.participants
    }

    pub fn participant(&self, id: PlayerId) -> Option<&GamePlayer> {
        self.participants.iter().find(|p| p.id() == id)
    }

    pub fn participant_by_color(&self, color: Color) -> Option<&GamePlayer> {
        self.participants.iter().find(|p| p.color == color)
    }

    pub fn headers_mut(&mut self) -> &mut PgnHeaders {
        &mut self.headers
    }

    // ------------------------------------------------------------------
    // Participants
    // ------------------------------------------------------------------

    /// Seat a player: the first gets White, the second Black
    ///
    /// Seating the second player while both are online starts the game
    /// (`waiting` -> `first_movement`).
    pub fn add_participant(&mut self, player: Player) -> Result<GamePlayer, JoinError> {
        if self.participant(player.id).is_some() {
            return Err(JoinError::AlreadyJoined);
        }
        let color = match self.participants.len() {
            0 => Color::White,
            1 => Color::Black,
            _ => return Err(JoinError::GameFull),
        };

        match color {
            Color::White => self.headers.white = player.name.clone(),
            Color::Black => self.headers.black = player.name.clone(),
        }
        let seat = GamePlayer::new(player, color);
        info!(game_id = %self.id, player_id = %seat.id(), %color, "participant seated");
        self.participants.push(seat.clone());
        self.try_start();
        Ok(seat)
    }

    fn all_online(&self) -> bool {
        self.participants.len() == 2 && self.participants.iter().all(|p| p.is_online)
    }

    fn try_start(&mut self) -> bool {
        if self.status == GameStatus::Waiting && self.all_online() {
            self.status = GameStatus::FirstMovement;
            info!(game_id = %self.id, "both participants online, game started");
            return true;
        }
        false
    }

    /// Record a participant's connection change and drive the pause state machine
    ///
    /// Returns `None` if `id` is not seated here. Repeated events with the same
    /// value are reported as [`PresenceChange::Unchanged`].
    pub fn set_participant_online(&mut self, id: PlayerId, online: bool) -> Option<PresenceChange> {
        let seat = self.participants.iter_mut().find(|p| p.id() == id)?;
        if seat.is_online == online {
            return Some(PresenceChange::Unchanged);
        }
        seat.set_online(online);
        let color = seat.color;

        if self.status.is_terminal() {
            return Some(PresenceChange::Unchanged);
        }

        if !online {
            if self.status.accepts_moves() {
                self.paused_from = Some(self.status);
                self.status = GameStatus::PausedReconnect;
                info!(game_id = %self.id, %color, "participant disconnected, game paused");
                return Some(PresenceChange::Paused);
            }
            return Some(PresenceChange::Unchanged);
        }

        if self.status == GameStatus::PausedReconnect && self.all_online() {
            self.status = self.paused_from.take().unwrap_or(GameStatus::Playing);
            info!(game_id = %self.id, %color, status = %self.status, "participant reconnected, game resumed");
            return Some(PresenceChange::Resumed);
        }

        if self.try_start() {
            return Some(PresenceChange::Started);
        }
        Some(PresenceChange::Unchanged)
    }

    // ------------------------------------------------------------------
    // Termination
    // ------------------------------------------------------------------

    /// Move the game into the terminal status for `outcome`
    ///
    /// Returns `false` (and changes nothing) if the game already finished.
    pub fn finish(&mut self, outcome: GameOutcome) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.status = outcome.reason.status();
        self.outcome = Some(outcome);
        self.paused_from = None;
        info!(
            game_id = %self.id,
            status = %self.status,
            reason = ?outcome.reason,
            winner = ?outcome.winner,
            "game over"
        );
        true
    }

    /// Resign on behalf of a seated player; the opponent wins
    pub fn resign(&mut self, id: PlayerId) -> Option<GameOutcome> {
        let color = self.participant(id)?.color;
        if self.status == GameStatus::Waiting {
            return None;
        }
        let outcome = GameOutcome::win(color.opponent(), EndReason::Resignation);
        self.finish(outcome).then_some(outcome)
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    fn context(&self) -> MoveContext {
        MoveContext::with_en_passant(self.en_passant)
    }

    /// Legal destinations of the piece on `from`, split into quiet moves and captures
    ///
    /// Works on a copy of the board so concurrent readers never observe a
    /// probe in progress.
    pub fn legal_moves(&self, from: Position) -> RulesResult<LegalMoves> {
        let mut scratch = self.board.clone();
        let ctx = self.context();
        let mut moves = LegalMoves::default();
        for to in legal_destinations(&mut scratch, from, ctx)? {
            let capture = plan_move(&scratch, from, to, Some(PieceKind::Queen), ctx)
                .map(|plan| plan.is_capture())
                .unwrap_or(false);
            if capture {
                moves.captures.push(to);
            } else {
                moves.normal.push(to);
            }
        }
        Ok(moves)
    }

    pub fn serialize_board(&self) -> SerializedBoard {
        self.board.serialize()
    }

    fn snapshot(&self) -> FenSnapshot {
        FenSnapshot {
            turn: self.turn,
            en_passant: self.en_passant,
            halfmove_clock: self.halfmove_clock,
            fullmove_number: self.fullmove_number,
        }
    }

    pub fn fen(&self) -> String {
        fen::to_fen(&self.board, &self.snapshot())
    }

    /// PGN result token: `*` while the game is running
    pub fn pgn_result(&self) -> &'static str {
        self.outcome.map_or("*", |o| o.pgn_result())
    }

    pub fn pgn(&self) -> String {
        self.headers.render(&self.history, self.pgn_result())
    }

    fn record_position(&mut self) -> u8 {
        let key = fen::position_key(&self.board, self.turn, self.en_passant);
        let count = self.repetitions.entry(key).or_insert(0);
        *count += 1;
        *count
    }

    // ------------------------------------------------------------------
    // Moves
    // ------------------------------------------------------------------

    /// Validate and execute a move for a seated player
    ///
    /// # Arguments
    ///
    /// * `mover` - The player requesting the move; matched against the seats by id
    /// * `from` / `to` - Source and destination squares
    /// * `promotion` - Piece to promote to when a pawn reaches the far rank
    ///
    /// # Errors
    ///
    /// [`MoveError::Rejected`](crate::MoveError::Rejected) for any refused
    /// request, with the game unchanged. [`MoveError::Corrupted`](crate::MoveError::Corrupted)
    /// when the board breaks an invariant; the match should be aborted.
    pub fn apply_move(
        &mut self,
        mover: &GamePlayer,
        from: Position,
        to: Position,
        promotion: Option<PieceKind>,
    ) -> MoveResult<MoveOutcome> {
        let result = self.try_apply_move(mover, from, to, promotion);
        match &result {
            Ok(outcome) => debug!(
                game_id = %self.id,
                player_id = %mover.id(),
                san = %outcome.record.san,
                status = %outcome.status,
                "move applied"
            ),
            Err(MoveError::Rejected(reason)) => debug!(
                game_id = %self.id,
                player_id = %mover.id(),
                %from,
                %to,
                %reason,
                "move rejected"
            ),
            Err(MoveError::Corrupted(violation)) => error!(
                game_id = %self.id,
                %violation,
                "invariant violated while applying move"
            ),
        }
        result
    }

    fn try_apply_move(
        &mut self,
        mover: &GamePlayer,
        from: Position,
        to: Position,
        promotion: Option<PieceKind>,
    ) -> MoveResult<MoveOutcome> {
        if !self.status.accepts_moves() {
            return Err(MoveRejection::GameNotActive(self.status).into());
        }
        let color = self
            .participant(mover.id())
            .map(|seat| seat.color)
            .ok_or(MoveRejection::UnknownParticipant)?;
        if color != self.turn {
            return Err(MoveRejection::NotYourTurn.into());
        }
        for square in [from, to] {
            if !square.is_on_board() {
                return Err(MoveRejection::OutOfBounds(square).into());
            }
        }
        let piece = *self
            .board
            .get(from)
            .ok_or(MoveRejection::NoPieceAtSource(from))?;
        if piece.color != color {
            return Err(MoveRejection::NotYourPiece(from).into());
        }
        self.board.verify()?;

        let ctx = self.context();
        let plan = plan_move(&self.board, from, to, promotion, ctx)?;
        let prefix = san::disambiguation(&mut self.board, &plan, ctx)?;

        let undo = self.board.apply(&plan);
        match is_in_check(&self.board, color) {
            Ok(false) => undo.commit(),
            Ok(true) => {
                self.board.revert(undo);
                return Err(MoveRejection::LeavesKingInCheck.into());
            }
            Err(violation) => {
                self.board.revert(undo);
                return Err(violation.into());
            }
        }

        if piece.kind == PieceKind::Pawn || plan.is_capture() {
            self.halfmove_clock = 0;
            // Irreversible move: no earlier position can come back
            self.repetitions.clear();
        } else {
            self.halfmove_clock += 1;
        }
        if color == Color::Black {
            self.fullmove_number += 1;
        }
        self.en_passant = match plan.kind {
            MoveKind::DoublePush => Some(Position::new((from.row + to.row) / 2, from.col)),
            _ => None,
        };
        self.turn = color.opponent();
        if self.status == GameStatus::FirstMovement {
            self.status = GameStatus::Playing;
        }

        let is_check = is_in_check(&self.board, self.turn)?;
        let ctx = self.context();
        let can_move = has_legal_move(&mut self.board, self.turn, ctx)?;
        let is_checkmate = is_check && !can_move;
        let occurrences = self.record_position();

        let outcome = if is_checkmate {
            Some(GameOutcome::win(color, EndReason::Checkmate))
        } else if !can_move {
            Some(GameOutcome::draw(EndReason::Stalemate))
        } else if self.halfmove_clock >= FIFTY_MOVE_LIMIT {
            Some(GameOutcome::draw(EndReason::FiftyMoveRule))
        } else if occurrences >= REPETITION_LIMIT {
            Some(GameOutcome::draw(EndReason::ThreefoldRepetition))
        } else {
            None
        };
        if let Some(outcome) = outcome {
            self.finish(outcome);
        }

        let record = MoveRecord {
            piece: piece.kind,
            color,
            from,
            to,
            captured: plan.captured,
            promotion: plan.promotion(),
            is_castling: plan.is_castle(),
            is_en_passant: plan.is_en_passant(),
            is_check,
            is_checkmate,
            san: san::format_san(piece.kind, &plan, &prefix, is_check, is_checkmate),
        };
        self.history.add_move(record.clone());

        Ok(MoveOutcome {
            record,
            board: self.board.serialize(),
            turn: self.turn,
            status: self.status,
            outcome: self.outcome,
            is_check,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(name: &str) -> Position {
        name.parse().unwrap()
    }

    fn seated() -> (Game, GamePlayer, GamePlayer) {
        let mut game = Game::new();
        let white = game.add_participant(Player::new("white")).unwrap();
        let black = game.add_participant(Player::new("black")).unwrap();
        (game, white, black)
    }

    #[test]
    fn test_seating_assigns_colours_and_starts_game() {
        let mut game = Game::new();
        let white = game.add_participant(Player::new("a")).unwrap();
        assert_eq!(white.color, Color::White);
        assert_eq!(game.status(), GameStatus::Waiting);

        let black = game.add_participant(Player::new("b")).unwrap();
        assert_eq!(black.color, Color::Black);
        assert_eq!(game.status(), GameStatus::FirstMovement);

        assert_eq!(
            game.add_participant(Player::new("c")),
            Err(JoinError::GameFull)
        );
        assert_eq!(
            game.add_participant(white.player.clone()),
            Err(JoinError::AlreadyJoined)
        );
    }

    #[test]
    fn test_moves_rejected_before_game_starts() {
        let mut game = Game::new();
        let white = game.add_participant(Player::new("a")).unwrap();
        let err = game.apply_move(&white, sq("e2"), sq("e4"), None).unwrap_err();
        assert_eq!(
            err.rejection(),
            Some(&MoveRejection::GameNotActive(GameStatus::Waiting))
        );
    }

    #[test]
    fn test_first_move_switches_to_playing() {
        let (mut game, white, _) = seated();
        let outcome = game.apply_move(&white, sq("e2"), sq("e4"), None).unwrap();
        assert_eq!(outcome.status, GameStatus::Playing);
        assert_eq!(outcome.turn, Color::Black);
        assert_eq!(outcome.san(), "e4");
        assert_eq!(game.en_passant(), Some(sq("e3")));
    }

    #[test]
    fn test_turn_and_ownership_enforced() {
        let (mut game, white, black) = seated();

        let err = game.apply_move(&black, sq("e7"), sq("e5"), None).unwrap_err();
        assert_eq!(err.rejection(), Some(&MoveRejection::NotYourTurn));

        let err = game.apply_move(&white, sq("e7"), sq("e5"), None).unwrap_err();
        assert_eq!(err.rejection(), Some(&MoveRejection::NotYourPiece(sq("e7"))));

        let err = game.apply_move(&white, sq("e4"), sq("e5"), None).unwrap_err();
        assert_eq!(err.rejection(), Some(&MoveRejection::NoPieceAtSource(sq("e4"))));

        let stranger = GamePlayer::new(Player::new("x"), Color::White);
        let err = game.apply_move(&stranger, sq("e2"), sq("e4"), None).unwrap_err();
        assert_eq!(err.rejection(), Some(&MoveRejection::UnknownParticipant));
    }

    #[test]
    fn test_spoofed_colour_uses_seat_colour() {
        let (mut game, _, black) = seated();
        let mut spoofed = black.clone();
        spoofed.color = Color::White;
        let err = game.apply_move(&spoofed, sq("e2"), sq("e4"), None).unwrap_err();
        assert_eq!(err.rejection(), Some(&MoveRejection::NotYourTurn));
    }

    #[test]
    fn test_disconnect_pauses_and_reconnect_resumes_previous_status() {
        let (mut game, white, black) = seated();
        assert_eq!(
            game.set_participant_online(black.id(), false),
            Some(PresenceChange::Paused)
        );
        assert_eq!(game.status(), GameStatus::PausedReconnect);
        assert_eq!(
            game.set_participant_online(black.id(), false),
            Some(PresenceChange::Unchanged)
        );
        assert!(game.apply_move(&white, sq("e2"), sq("e4"), None).is_err());

        assert_eq!(
            game.set_participant_online(black.id(), true),
            Some(PresenceChange::Resumed)
        );
        assert_eq!(game.status(), GameStatus::FirstMovement);
        assert_eq!(game.set_participant_online(PlayerId::new(), true), None);
    }

    #[test]
    fn test_resign_awards_opponent() {
        let (mut game, white, _) = seated();
        let outcome = game.resign(white.id()).unwrap();
        assert_eq!(outcome.winner, Some(Color::Black));
        assert_eq!(game.status(), GameStatus::Ended);
        assert_eq!(game.resign(white.id()), None, "second resign is a no-op");
    }

    #[test]
    fn test_finish_is_idempotent() {
        let (mut game, _, _) = seated();
        assert!(game.finish(GameOutcome::win(Color::White, EndReason::Timeout)));
        assert!(!game.finish(GameOutcome::draw(EndReason::Stalemate)));
        assert_eq!(game.outcome().map(|o| o.reason), Some(EndReason::Timeout));
    }

    #[test]
    fn test_legal_moves_split_captures() {
        let (mut game, white, black) = seated();
        game.apply_move(&white, sq("e2"), sq("e4"), None).unwrap();
        game.apply_move(&black, sq("d7"), sq("d5"), None).unwrap();

        let moves = game.legal_moves(sq("e4")).unwrap();
        assert_eq!(moves.normal, vec![sq("e5")]);
        assert_eq!(moves.captures, vec![sq("d5")]);
        assert_eq!(game.legal_moves(sq("e5")).unwrap(), LegalMoves::default());
    }

    #[test]
    fn test_irreversible_move_forgets_earlier_positions() {
        let (mut game, white, black) = seated();
        game.apply_move(&white, sq("g1"), sq("f3"), None).unwrap();
        game.apply_move(&black, sq("g8"), sq("f6"), None).unwrap();
        assert_eq!(game.repetitions.len(), 3);

        game.apply_move(&white, sq("e2"), sq("e4"), None).unwrap();
        assert_eq!(game.halfmove_clock(), 0);
        assert_eq!(game.repetitions.len(), 1, "Only the position after the pawn move remains");
    }
}
