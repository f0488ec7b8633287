//! Attack detection and square checking
//!
//! Provides functions to check if squares are under attack. This is the
//! attack-only variant of the movement rules: it never looks at castling and
//! never asks whether the attacker's own king would be safe, so it can be used
//! from inside king move validation without recursing.
//!
//! ## Algorithm
//!
//! To check if a square is attacked, we iterate through all 64 squares and for
//! every opposing piece verify whether it can reach the target. O(64) per
//! query, which is fine for per-move validation.

use crate::board::Board;
use crate::types::{Color, PieceKind, Position};

/// Check if the piece on `from` attacks `target`
///
/// Geometry only. Pawns attack the two forward diagonals whether or not the
/// square is occupied; kings attack the eight adjacent squares.
pub fn can_attack_square(board: &Board, from: Position, target: Position) -> bool {
    let Some(piece) = board.get(from) else {
        return false;
    };
    if from == target || !target.is_on_board() {
        return false;
    }

    let d_row = target.row as i8 - from.row as i8;
    let d_col = target.col as i8 - from.col as i8;

    match piece.kind {
        PieceKind::Pawn => d_row == piece.color.pawn_direction() && d_col.abs() == 1,
        PieceKind::Knight => {
            let (dr, dc) = (d_row.abs(), d_col.abs());
            (dr == 2 && dc == 1) || (dr == 1 && dc == 2)
        }
        PieceKind::Bishop => d_row.abs() == d_col.abs() && is_path_clear(from, target, board),
        PieceKind::Rook => (d_row == 0 || d_col == 0) && is_path_clear(from, target, board),
        PieceKind::Queen => {
            (d_row == 0 || d_col == 0 || d_row.abs() == d_col.abs())
                && is_path_clear(from, target, board)
        }
        PieceKind::King => d_row.abs() <= 1 && d_col.abs() <= 1,
    }
}

/// Check if any piece of `by_color` attacks `square`
pub fn is_square_attacked(board: &Board, square: Position, by_color: Color) -> bool {
    board
        .pieces_of(by_color)
        .any(|p| can_attack_square(board, p.position, square))
}

/// Every square strictly between `from` and `to` is empty
///
/// Only meaningful for straight or diagonal lines; callers check the
/// geometry first.
pub fn is_path_clear(from: Position, to: Position, board: &Board) -> bool {
    let dr = (to.row as i8 - from.row as i8).signum();
    let dc = (to.col as i8 - from.col as i8).signum();

    let mut current = from;
    loop {
        let Some(next) = current.offset(dr, dc) else {
            return false;
        };
        if next == to {
            return true;
        }
        if !board.is_empty(next) {
            return false;
        }
        current = next;
    }
}
