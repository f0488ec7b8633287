//! Match status state machine and end-of-game results
//!
//! # State Transitions
//!
//! ```text
//! waiting ──(2 players online)──> first_movement ──(first move)──> playing
//!                                        │                           │
//!                                        └──────(disconnect)─────────┤
//!                                                                    v
//!                         playing / first_movement <──(reconnect)── paused_reconnect
//!                                                                    │
//!                                                   (grace expired) ─┴─> abandoned
//!
//! first_movement / playing ──> checkmate | draw | ended
//! ```
//!
//! `checkmate`, `draw`, `ended` and `abandoned` are terminal: no further moves
//! are accepted and the match is eligible for archival.

use crate::types::Color;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    /// Fewer than two participants connected
    #[default]
    Waiting,
    /// Both participants connected, board active, clocks not started
    FirstMovement,
    /// Normal turn exchange with live clocks
    Playing,
    /// A participant disconnected mid-game; the grace timer is running
    PausedReconnect,
    /// The side to move was checkmated
    Checkmate,
    /// Stalemate, fifty-move rule or threefold repetition
    Draw,
    /// Finished by timeout, resignation or a corrupted board
    Ended,
    /// A participant did not return before the grace period elapsed
    Abandoned,
}

impl GameStatus {
    /// Whether the match can never change again
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            GameStatus::Checkmate | GameStatus::Draw | GameStatus::Ended | GameStatus::Abandoned
        )
    }

    /// Whether `apply_move` may run in this status
    pub fn accepts_moves(self) -> bool {
        matches!(self, GameStatus::FirstMovement | GameStatus::Playing)
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            GameStatus::Waiting => "waiting",
            GameStatus::FirstMovement => "first_movement",
            GameStatus::Playing => "playing",
            GameStatus::PausedReconnect => "paused_reconnect",
            GameStatus::Checkmate => "checkmate",
            GameStatus::Draw => "draw",
            GameStatus::Ended => "ended",
            GameStatus::Abandoned => "abandoned",
        };
        f.write_str(s)
    }
}

/// Why a match finished
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    Checkmate,
    Stalemate,
    FiftyMoveRule,
    ThreefoldRepetition,
    Timeout,
    Resignation,
    Abandonment,
    /// The board violated an invariant and the match was aborted
    Corrupted,
}

impl EndReason {
    /// Terminal status a match enters for this reason
    pub fn status(self) -> GameStatus {
        match self {
            EndReason::Checkmate => GameStatus::Checkmate,
            EndReason::Stalemate | EndReason::FiftyMoveRule | EndReason::ThreefoldRepetition => {
                GameStatus::Draw
            }
            EndReason::Timeout | EndReason::Resignation | EndReason::Corrupted => GameStatus::Ended,
            EndReason::Abandonment => GameStatus::Abandoned,
        }
    }
}

/// Final result of a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameOutcome {
    pub winner: Option<Color>,
    pub reason: EndReason,
}

impl GameOutcome {
    pub fn win(winner: Color, reason: EndReason) -> Self {
        Self {
            winner: Some(winner),
            reason,
        }
    }

    pub fn draw(reason: EndReason) -> Self {
        Self {
            winner: None,
            reason,
        }
    }

    /// PGN result token
    pub fn pgn_result(&self) -> &'static str {
        match self.winner {
            Some(Color::White) => "1-0",
            Some(Color::Black) => "0-1",
            None => "1/2-1/2",
        }
    }

    /// Human-readable description suitable for broadcasting to players
    pub fn message(&self) -> String {
        let side = |c: Color| match c {
            Color::White => "White",
            Color::Black => "Black",
        };
        match (self.reason, self.winner) {
            (EndReason::Checkmate, Some(w)) => format!("{} wins by checkmate!", side(w)),
            (EndReason::Timeout, Some(w)) => format!("{} wins on time!", side(w)),
            (EndReason::Resignation, Some(w)) => format!("{} wins by resignation", side(w)),
            (EndReason::Abandonment, Some(w)) => {
                format!("{} wins: opponent did not reconnect in time", side(w))
            }
            (EndReason::Abandonment, None) => "Game abandoned".to_string(),
            (EndReason::Stalemate, _) => "Draw by stalemate".to_string(),
            (EndReason::FiftyMoveRule, _) => "Draw by the fifty-move rule".to_string(),
            (EndReason::ThreefoldRepetition, _) => "Draw by threefold repetition".to_string(),
            (EndReason::Corrupted, _) => "Game aborted: corrupted state".to_string(),
            (_, None) => "Game over".to_string(),
        }
    }
}
