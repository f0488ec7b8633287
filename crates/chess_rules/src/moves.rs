//! Classified moves ready to be applied to a board
//!
//! A [`MovePlan`] is built by [`crate::rules::plan_move`] *before* the board is
//! touched, because the information it carries (what gets captured, whether the
//! rook travels with the king) is lost once the pieces have moved.

use crate::types::{PieceKind, Position};

/// How a planned move mutates the board
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveKind {
    /// Ordinary move, capturing whatever stands on the destination
    Normal,
    /// Pawn advancing two squares from its starting rank
    DoublePush,
    /// Pawn capturing en passant; the captured pawn is not on the destination
    EnPassant { captured: Position },
    /// King moving two squares with the rook jumping over it
    Castle { rook_from: Position, rook_to: Position },
    /// Pawn reaching the far rank and being replaced
    Promotion(PieceKind),
}

/// A move whose legality by geometry has already been established
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MovePlan {
    pub from: Position,
    pub to: Position,
    pub kind: MoveKind,
    /// Kind of the piece this move removes from the board, if any
    pub captured: Option<PieceKind>,
}

impl MovePlan {
    pub fn is_capture(&self) -> bool {
        self.captured.is_some()
    }

    pub fn is_castle(&self) -> bool {
        matches!(self.kind, MoveKind::Castle { .. })
    }

    pub fn is_en_passant(&self) -> bool {
        matches!(self.kind, MoveKind::EnPassant { .. })
    }

    pub fn promotion(&self) -> Option<PieceKind> {
        match self.kind {
            MoveKind::Promotion(kind) => Some(kind),
            _ => None,
        }
    }
}
