//! Error types for chess rules
//!
//! Three failure classes are kept apart so callers can react to each one
//! differently:
//!
//! - [`MoveRejection`] - an untrusted move request was refused. Expected and
//!   frequent; the game state is untouched.
//! - [`JoinError`] - a participant could not be seated.
//! - [`InvariantViolation`] - the board is corrupted (e.g. a king is missing).
//!   The match cannot safely continue.

use crate::status::GameStatus;
use crate::types::{Color, PieceKind, Position};
use thiserror::Error;

/// A move request that was refused without changing the game
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MoveRejection {
    /// Moves are only accepted while the game is live
    #[error("Game is not accepting moves (status: {0})")]
    GameNotActive(GameStatus),

    /// The requesting player is not seated in this game
    #[error("Player is not a participant in this game")]
    UnknownParticipant,

    /// The mover's colour does not hold the turn
    #[error("Not your turn")]
    NotYourTurn,

    /// Source or destination lies outside the 8x8 board
    #[error("Square {0:?} is off the board")]
    OutOfBounds(Position),

    /// Nothing stands on the source square
    #[error("No piece at source square {0}")]
    NoPieceAtSource(Position),

    /// The piece on the source square belongs to the opponent
    #[error("Piece at {0} is not yours")]
    NotYourPiece(Position),

    /// The piece's movement rules do not allow this move
    #[error("Invalid move: {from} to {to}")]
    IllegalMove { from: Position, to: Position },

    /// A pawn cannot promote to the requested kind
    #[error("Cannot promote to {0:?}")]
    InvalidPromotion(PieceKind),

    /// The move is geometrically legal but exposes the mover's own king
    #[error("Move leaves your King in check")]
    LeavesKingInCheck,
}

/// The board no longer satisfies a structural invariant
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    #[error("No {0} king on the board")]
    KingMissing(Color),

    #[error("More than one {0} king on the board")]
    DuplicateKing(Color),

    #[error("Piece on {cell} believes it stands on {recorded}")]
    PieceOutOfPlace { cell: Position, recorded: Position },
}

/// Failure of [`crate::Game::apply_move`]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MoveError {
    #[error(transparent)]
    Rejected(#[from] MoveRejection),

    #[error("Corrupted game state: {0}")]
    Corrupted(#[from] InvariantViolation),
}

impl MoveError {
    /// The rejection, if this is an ordinary refused move
    pub fn rejection(&self) -> Option<&MoveRejection> {
        match self {
            MoveError::Rejected(r) => Some(r),
            MoveError::Corrupted(_) => None,
        }
    }
}

/// Failure to seat a participant
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JoinError {
    #[error("Game is full")]
    GameFull,

    #[error("Player already joined this game")]
    AlreadyJoined,
}

/// Result type alias for operations that may hit a corrupted board
pub type RulesResult<T> = Result<T, InvariantViolation>;

/// Result type alias for move application
pub type MoveResult<T> = Result<T, MoveError>;
