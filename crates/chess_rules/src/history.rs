//! Move history tracking
//!
//! Keeps a chronological record of every completed move in a match. The
//! history feeds PGN export and lets clients review the game afterwards.
//!
//! # Architecture
//!
//! [`MoveHistory`] stores a `Vec<MoveRecord>` where each record contains:
//! - Piece moved (kind and colour)
//! - From/to squares
//! - Special move flags (castling, en passant, check, checkmate)
//! - Captured piece and promotion kind, if any
//! - The move's SAN text, computed when the move was played

use crate::types::{Color, PieceKind, Position};
use serde::{Deserialize, Serialize};

/// One completed move
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRecord {
    pub piece: PieceKind,
    pub color: Color,
    pub from: Position,
    pub to: Position,
    pub captured: Option<PieceKind>,
    pub promotion: Option<PieceKind>,
    pub is_castling: bool,
    pub is_en_passant: bool,
    pub is_check: bool,
    pub is_checkmate: bool,
    /// Standard Algebraic Notation, e.g. `Nbd7`, `exd6`, `O-O`, `e8=Q#`
    pub san: String,
}

/// Complete move history for one match
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveHistory {
    /// Chronological list of all moves made in the game
    ///
    /// Index 0 = Move 1 (White's first move)
    /// Index 1 = Move 1 (Black's response)
    /// Index 2 = Move 2 (White's move)
    /// etc.
    moves: Vec<MoveRecord>,
}

impl MoveHistory {
    /// Append a move; called once the move has been committed to the board
    pub fn add_move(&mut self, record: MoveRecord) {
        self.moves.push(record);
    }

    /// Most recent move, `None` before the first move
    pub fn last_move(&self) -> Option<&MoveRecord> {
        self.moves.last()
    }

    /// Number of half-moves (ply) made
    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    /// Move at ply `index` (0-based)
    pub fn get_move(&self, index: usize) -> Option<&MoveRecord> {
        self.moves.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &MoveRecord> {
        self.moves.iter()
    }

    /// SAN of every move in order
    pub fn san_moves(&self) -> impl Iterator<Item = &str> {
        self.moves.iter().map(|m| m.san.as_str())
    }
}
