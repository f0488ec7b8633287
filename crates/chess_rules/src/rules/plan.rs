//! Turning a `from -> to` request into a [`MovePlan`]
//!
//! Classification happens against the untouched board: whether the move is a
//! capture (including en passant, where the victim is not on the destination),
//! a castle, a double step or a promotion.

use super::piece_moves::{castle_rook_squares, en_passant_victim, is_valid_move};
use super::MoveContext;
use crate::board::Board;
use crate::error::MoveRejection;
use crate::moves::{MoveKind, MovePlan};
use crate::types::{PieceKind, Position};

/// Validate the geometry of a move and classify it
///
/// A pawn reaching the far rank is a promotion attempt and needs a
/// `promotion` kind; without one the request is rejected like any other
/// illegal move. For every other move `promotion` is ignored.
///
/// # Errors
///
/// - [`MoveRejection::OutOfBounds`] for squares off the board
/// - [`MoveRejection::NoPieceAtSource`] when `from` is empty
/// - [`MoveRejection::InvalidPromotion`] for a pawn or king promotion
/// - [`MoveRejection::IllegalMove`] when the piece cannot move that way
pub fn plan_move(
    board: &Board,
    from: Position,
    to: Position,
    promotion: Option<PieceKind>,
    ctx: MoveContext,
) -> Result<MovePlan, MoveRejection> {
    for square in [from, to] {
        if !square.is_on_board() {
            return Err(MoveRejection::OutOfBounds(square));
        }
    }

    let piece = *board
        .get(from)
        .ok_or(MoveRejection::NoPieceAtSource(from))?;
    let illegal = MoveRejection::IllegalMove { from, to };

    let d_row = to.row as i8 - from.row as i8;
    let d_col = to.col as i8 - from.col as i8;
    let diagonal_onto_empty =
        piece.kind == PieceKind::Pawn && d_col != 0 && board.is_empty(to);

    let captured = if diagonal_onto_empty {
        board
            .get(en_passant_victim(from, to))
            .filter(|_| ctx.en_passant == Some(to))
            .map(|p| p.kind)
    } else {
        board.get(to).map(|p| p.kind)
    };

    if piece.kind == PieceKind::Pawn && to.row == piece.color.promotion_row() {
        let kind = promotion.ok_or(illegal.clone())?;
        if !kind.is_promotion_target() {
            return Err(MoveRejection::InvalidPromotion(kind));
        }
        if !is_valid_move(board, from, to, ctx) {
            return Err(illegal);
        }
        return Ok(MovePlan {
            from,
            to,
            kind: MoveKind::Promotion(kind),
            captured,
        });
    }

    if !is_valid_move(board, from, to, ctx) {
        return Err(illegal);
    }

    let kind = match piece.kind {
        PieceKind::King if d_col.abs() == 2 => {
            let (rook_from, rook_to) = castle_rook_squares(from, to);
            MoveKind::Castle { rook_from, rook_to }
        }
        PieceKind::Pawn if d_row.abs() == 2 => MoveKind::DoublePush,
        PieceKind::Pawn if diagonal_onto_empty => MoveKind::EnPassant {
            captured: en_passant_victim(from, to),
        },
        _ => MoveKind::Normal,
    };

    Ok(MovePlan {
        from,
        to,
        kind,
        captured,
    })
}
