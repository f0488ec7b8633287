//! Chess piece movement rules
//!
//! Contains the rules for how each chess piece can move. Pure functions with no
//! side effects: they answer "does this piece's geometry allow `from -> to` on
//! this board", ignoring whose turn it is and whether the move would leave the
//! mover's own king in check.

use super::attack::{is_path_clear, is_square_attacked};
use super::MoveContext;
use crate::board::Board;
use crate::types::{Piece, PieceKind, Position};

/// Check if a move is valid for the piece standing on `from`
///
/// Rejects no-op moves, off-board squares, empty sources and captures of
/// friendly pieces once, then dispatches on the piece kind.
pub fn is_valid_move(board: &Board, from: Position, to: Position, ctx: MoveContext) -> bool {
    // Can't move to the same square
    if from == to {
        return false;
    }

    // Can't move off the board
    if !from.is_on_board() || !to.is_on_board() {
        return false;
    }

    let Some(piece) = board.get(from) else {
        return false;
    };

    // Can't capture your own pieces
    if board.color_at(to) == Some(piece.color) {
        return false;
    }

    match piece.kind {
        PieceKind::Pawn => is_valid_pawn_move(piece, from, to, board, ctx),
        PieceKind::Knight => is_valid_knight_move(from, to),
        PieceKind::Bishop => is_valid_bishop_move(from, to, board),
        PieceKind::Rook => is_valid_rook_move(from, to, board),
        PieceKind::Queen => is_valid_queen_move(from, to, board),
        PieceKind::King => is_valid_king_move(piece, from, to, board),
    }
}

/// Square of the pawn an en passant capture onto `to` would remove
///
/// The victim stands beside the capturing pawn, one rank behind the
/// destination from the capturer's point of view.
pub fn en_passant_victim(from: Position, to: Position) -> Position {
    Position::new(from.row, to.col)
}

fn is_valid_pawn_move(
    piece: &Piece,
    from: Position,
    to: Position,
    board: &Board,
    ctx: MoveContext,
) -> bool {
    let direction = piece.color.pawn_direction();
    let d_row = to.row as i8 - from.row as i8;
    let d_col = to.col as i8 - from.col as i8;

    // Forward move
    if d_col == 0 && d_row == direction {
        return board.is_empty(to);
    }

    // Double move from starting position
    if d_col == 0
        && d_row == 2 * direction
        && !piece.has_moved
        && from.row == piece.color.pawn_start_row()
    {
        let intermediate = Position::new((from.row as i8 + direction) as u8, from.col);
        return board.is_empty(intermediate) && board.is_empty(to);
    }

    // Capture diagonally
    if d_col.abs() == 1 && d_row == direction {
        if let Some(target_color) = board.color_at(to) {
            return target_color != piece.color;
        }
        if ctx.en_passant == Some(to) {
            let victim = board.get(en_passant_victim(from, to));
            return victim
                .is_some_and(|v| v.kind == PieceKind::Pawn && v.color != piece.color);
        }
    }

    false
}

fn is_valid_knight_move(from: Position, to: Position) -> bool {
    let dr = (to.row as i8 - from.row as i8).abs();
    let dc = (to.col as i8 - from.col as i8).abs();
    (dr == 2 && dc == 1) || (dr == 1 && dc == 2)
}

fn is_valid_bishop_move(from: Position, to: Position, board: &Board) -> bool {
    let dr = (to.row as i8 - from.row as i8).abs();
    let dc = (to.col as i8 - from.col as i8).abs();

    // Must move diagonally
    if dr != dc {
        return false;
    }

    is_path_clear(from, to, board)
}

fn is_valid_rook_move(from: Position, to: Position, board: &Board) -> bool {
    // Must move horizontally or vertically
    if from.row != to.row && from.col != to.col {
        return false;
    }

    is_path_clear(from, to, board)
}

fn is_valid_queen_move(from: Position, to: Position, board: &Board) -> bool {
    is_valid_rook_move(from, to, board) || is_valid_bishop_move(from, to, board)
}

fn is_valid_king_move(piece: &Piece, from: Position, to: Position, board: &Board) -> bool {
    let dr = (to.row as i8 - from.row as i8).abs();
    let dc = (to.col as i8 - from.col as i8).abs();

    // King moves one square in any direction
    if dr <= 1 && dc <= 1 {
        return true;
    }

    dr == 0 && dc == 2 && is_valid_castle(piece, from, to, board)
}

/// Castling rook squares for a king moving from `from` to `to`: `(rook_from, rook_to)`
pub fn castle_rook_squares(from: Position, to: Position) -> (Position, Position) {
    if to.col > from.col {
        (Position::new(from.row, 7), Position::new(from.row, 5))
    } else {
        (Position::new(from.row, 0), Position::new(from.row, 3))
    }
}

/// Castling: king and rook unmoved, nothing in between, king not in check and
/// never crossing or landing on an attacked square
fn is_valid_castle(king: &Piece, from: Position, to: Position, board: &Board) -> bool {
    if king.has_moved || from != Position::new(king.color.back_row(), 4) {
        return false;
    }

    let (rook_from, _) = castle_rook_squares(from, to);
    let rook_ready = board.get(rook_from).is_some_and(|rook| {
        rook.kind == PieceKind::Rook && rook.color == king.color && !rook.has_moved
    });
    if !rook_ready {
        return false;
    }

    let (between, transit): (&[u8], &[u8]) = if to.col > from.col {
        (&[5, 6], &[5, 6])
    } else {
        (&[1, 2, 3], &[3, 2])
    };

    if between
        .iter()
        .any(|&col| !board.is_empty(Position::new(from.row, col)))
    {
        return false;
    }

    let enemy = king.color.opponent();
    if is_square_attacked(board, from, enemy) {
        return false;
    }

    !transit
        .iter()
        .any(|&col| is_square_attacked(board, Position::new(from.row, col), enemy))
}
