//! Chess rules module - pure game logic without session coupling
//!
//! Implements move validation, check detection and move classification as
//! pure functions over a [`Board`](crate::Board).
//!
//! # Module Structure
//!
//! - `piece_moves` - Movement rules for each piece type, including castling and en passant
//! - `attack` - Attack-only queries used by check detection
//! - `plan` - Classifies a requested move before the board is mutated
//! - `check` - Check, checkmate, stalemate and legal move enumeration

pub mod attack;
pub mod check;
pub mod piece_moves;
pub mod plan;


use crate::types::Position;

/// The one piece of information a move pattern needs that the board does not hold
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MoveContext {
    /// Square a pawn skipped on the previous move, capturable en passant
    pub en_passant: Option<Position>,
}

impl MoveContext {
    pub fn with_en_passant(en_passant: Option<Position>) -> Self {
        Self { en_passant }
    }
}

// Re-export commonly used items
pub use attack::{can_attack_square, is_square_attacked};
pub use check::{has_legal_move, is_checkmate, is_in_check, is_stalemate, legal_destinations};
pub use piece_moves::is_valid_move;
pub use plan::plan_move;
