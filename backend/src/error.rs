//! Session-level error types

use chess_rules::{GameId, InvariantViolation, JoinError, MoveRejection, PlayerId};
use shared::ErrorCode;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Game {0} not found")]
    GameNotFound(GameId),

    #[error("Player {0} not found")]
    PlayerNotFound(PlayerId),

    #[error("Game is full")]
    GameFull,

    #[error("Player already joined this game")]
    AlreadyJoined,

    #[error("Player is not a participant in this game")]
    NotParticipant,

    #[error("Request needs a player_id")]
    MissingIdentity,

    /// An ordinary refused move; the game is unchanged
    #[error(transparent)]
    Rejected(#[from] MoveRejection),

    /// The board broke an invariant and the match was aborted
    #[error("Game aborted: {0}")]
    Corrupted(#[from] InvariantViolation),
}

impl SessionError {
    /// Protocol error category for this failure
    pub fn code(&self) -> ErrorCode {
        match self {
            SessionError::GameNotFound(_) => ErrorCode::GameNotFound,
            SessionError::PlayerNotFound(_) => ErrorCode::PlayerNotFound,
            SessionError::GameFull => ErrorCode::GameFull,
            SessionError::AlreadyJoined => ErrorCode::BadRequest,
            SessionError::NotParticipant => ErrorCode::NotParticipant,
            SessionError::MissingIdentity => ErrorCode::BadRequest,
            SessionError::Rejected(_) => ErrorCode::MoveRejected,
            SessionError::Corrupted(_) => ErrorCode::Corrupted,
        }
    }
}

impl From<JoinError> for SessionError {
    fn from(err: JoinError) -> Self {
        match err {
            JoinError::GameFull => SessionError::GameFull,
            JoinError::AlreadyJoined => SessionError::AlreadyJoined,
        }
    }
}

pub type SessionResult<T> = Result<T, SessionError>;
