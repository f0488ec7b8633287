//! Authoritative chess rules for two-player matches
//!
//! Board model, move validation, check/checkmate/stalemate detection, the
//! move orchestrator ([`Game`]) and SAN/FEN/PGN notation. Everything here is
//! synchronous in-memory computation with no I/O.

pub mod board;
pub mod error;
pub mod game;
pub mod history;
pub mod moves;
pub mod notation;
pub mod player;
pub mod rules;
pub mod status;
pub mod types;

pub use board::{Board, PieceView, SerializedBoard};
pub use error::{
    InvariantViolation, JoinError, MoveError, MoveRejection, MoveResult, RulesResult,
};
pub use game::{Game, GameId, LegalMoves, MoveOutcome, PresenceChange};
pub use history::{MoveHistory, MoveRecord};
pub use moves::{MoveKind, MovePlan};
pub use notation::{FenError, PgnHeaders};
pub use player::{GamePlayer, Player, PlayerId};
pub use status::{EndReason, GameOutcome, GameStatus};
pub use types::{Color, Piece, PieceKind, Position};
