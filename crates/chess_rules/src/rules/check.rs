//! Check, checkmate and stalemate detection
//!
//! Every legality question here is answered by simulating the move on the
//! live board with [`Board::simulate`], which reverts unconditionally. A board
//! handed to any of these functions is identical before and after the call.

use super::attack::is_square_attacked;
use super::plan::plan_move;
use super::MoveContext;
use crate::board::Board;
use crate::error::RulesResult;
use crate::moves::MovePlan;
use crate::types::{Color, PieceKind, Position};

/// Whether `color`'s king is attacked by any opposing piece
///
/// # Errors
///
/// [`crate::InvariantViolation::KingMissing`] if `color` has no king.
pub fn is_in_check(board: &Board, color: Color) -> RulesResult<bool> {
    let king = board.find_king(color)?;
    Ok(is_square_attacked(board, king, color.opponent()))
}

/// Whether executing `plan` would leave `color`'s king attacked
pub fn leaves_king_in_check(board: &mut Board, plan: &MovePlan, color: Color) -> RulesResult<bool> {
    board.simulate(plan, |after| is_in_check(after, color))
}

/// Plan a move for enumeration purposes
///
/// Promotion kind does not change legality, so probes always ask for a queen.
fn probe_plan(board: &Board, from: Position, to: Position, ctx: MoveContext) -> Option<MovePlan> {
    plan_move(board, from, to, Some(PieceKind::Queen), ctx).ok()
}

/// Every destination the piece on `from` can legally reach
///
/// Legal means the piece's geometry allows it *and* its own king is not in
/// check afterwards. Returns an empty list for an empty square.
pub fn legal_destinations(
    board: &mut Board,
    from: Position,
    ctx: MoveContext,
) -> RulesResult<Vec<Position>> {
    let Some(piece) = board.get(from).copied() else {
        return Ok(Vec::new());
    };

    let mut destinations = Vec::new();
    for to in Position::all() {
        if let Some(plan) = probe_plan(board, from, to, ctx) {
            if !leaves_king_in_check(board, &plan, piece.color)? {
                destinations.push(to);
            }
        }
    }
    Ok(destinations)
}

/// Whether `color` has at least one legal move
///
/// Walks every piece of that colour against all 64 destination squares,
/// simulating each geometrically valid move and stopping at the first one
/// that leaves the king safe.
pub fn has_legal_move(board: &mut Board, color: Color, ctx: MoveContext) -> RulesResult<bool> {
    let origins: Vec<Position> = board.pieces_of(color).map(|p| p.position).collect();

    for from in origins {
        for to in Position::all() {
            if let Some(plan) = probe_plan(board, from, to, ctx) {
                if !leaves_king_in_check(board, &plan, color)? {
                    return Ok(true);
                }
            }
        }
    }
    Ok(false)
}

/// Whether `color` is checkmated: in check with no legal escape
pub fn is_checkmate(board: &mut Board, color: Color, ctx: MoveContext) -> RulesResult<bool> {
    // Not in check can never be checkmate
    if !is_in_check(board, color)? {
        return Ok(false);
    }
    Ok(!has_legal_move(board, color, ctx)?)
}

/// Whether `color` is stalemated: not in check but without a legal move
pub fn is_stalemate(board: &mut Board, color: Color, ctx: MoveContext) -> RulesResult<bool> {
    if is_in_check(board, color)? {
        return Ok(false);
    }
    Ok(!has_legal_move(board, color, ctx)?)
}
