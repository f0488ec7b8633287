//! Standard Algebraic Notation
//!
//! SAN is built in two halves. The disambiguation prefix depends on which
//! *other* pieces could have reached the destination, so it is computed against
//! the board before the move. The rest (capture marker, promotion suffix, check
//! marker) is assembled afterwards from the [`MovePlan`] and the detector
//! results.

use crate::board::Board;
use crate::error::RulesResult;
use crate::moves::MovePlan;
use crate::rules::check::leaves_king_in_check;
use crate::rules::{plan_move, MoveContext};
use crate::types::{PieceKind, Position};

/// Origin file and/or rank needed to tell this move apart from a rival's
///
/// Empty for pawns and kings, and whenever no other piece of the same kind
/// and colour can legally move to the same square. Otherwise the file is
/// preferred, then the rank, then both.
pub fn disambiguation(board: &mut Board, plan: &MovePlan, ctx: MoveContext) -> RulesResult<String> {
    let Some(piece) = board.get(plan.from).copied() else {
        return Ok(String::new());
    };
    if matches!(piece.kind, PieceKind::Pawn | PieceKind::King) {
        return Ok(String::new());
    }

    let candidates: Vec<Position> = board
        .pieces_of(piece.color)
        .filter(|p| p.kind == piece.kind && p.position != plan.from)
        .map(|p| p.position)
        .collect();

    let mut rivals = Vec::new();
    for from in candidates {
        if let Ok(rival) = plan_move(board, from, plan.to, None, ctx) {
            if !leaves_king_in_check(board, &rival, piece.color)? {
                rivals.push(from);
            }
        }
    }

    if rivals.is_empty() {
        return Ok(String::new());
    }
    let from = plan.from;
    let shares_file = rivals.iter().any(|r| r.col == from.col);
    let shares_rank = rivals.iter().any(|r| r.row == from.row);

    Ok(match (shares_file, shares_rank) {
        (false, _) => from.file_char().to_string(),
        (true, false) => from.rank_char().to_string(),
        (true, true) => from.to_string(),
    })
}

/// Assemble the SAN string for a completed move
///
/// `checkmate` wins over `check`; only one marker is ever appended.
pub fn format_san(
    piece: PieceKind,
    plan: &MovePlan,
    disambiguation: &str,
    check: bool,
    checkmate: bool,
) -> String {
    let mut san = String::new();

    if piece == PieceKind::King && plan.is_castle() {
        san.push_str(if plan.to.col > plan.from.col {
            "O-O"
        } else {
            "O-O-O"
        });
    } else {
        if let Some(letter) = piece.san_letter() {
            san.push(letter);
        }
        san.push_str(disambiguation);
        if plan.is_capture() {
            if piece == PieceKind::Pawn {
                san.push(plan.from.file_char());
            }
            san.push('x');
        }
        san.push_str(&plan.to.to_string());
        if let Some(kind) = plan.promotion() {
            san.push('=');
            if let Some(letter) = kind.san_letter() {
                san.push(letter);
            }
        }
    }

    if checkmate {
        san.push('#');
    } else if check {
        san.push('+');
    }
    san
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moves::MoveKind;
    use crate::types::Color;

    fn sq(name: &str) -> Position {
        name.parse().unwrap()
    }

    fn plan(from: &str, to: &str, kind: MoveKind, captured: Option<PieceKind>) -> MovePlan {
        MovePlan {
            from: sq(from),
            to: sq(to),
            kind,
            captured,
        }
    }

    #[test]
    fn test_san_piece_moves_and_captures() {
        let quiet = plan("g1", "f3", MoveKind::Normal, None);
        assert_eq!(format_san(PieceKind::Knight, &quiet, "", false, false), "Nf3");

        let capture = plan("d1", "h5", MoveKind::Normal, Some(PieceKind::Pawn));
        assert_eq!(format_san(PieceKind::Queen, &capture, "", true, false), "Qxh5+");
    }

    #[test]
    fn test_san_pawn_capture_names_origin_file() {
        let ep = plan(
            "e5",
            "d6",
            MoveKind::EnPassant { captured: sq("d5") },
            Some(PieceKind::Pawn),
        );
        assert_eq!(format_san(PieceKind::Pawn, &ep, "", false, false), "exd6");
    }

    #[test]
    fn test_san_castling_and_promotion() {
        let short = plan(
            "e1",
            "g1",
            MoveKind::Castle {
                rook_from: sq("h1"),
                rook_to: sq("f1"),
            },
            None,
        );
        assert_eq!(format_san(PieceKind::King, &short, "", false, false), "O-O");

        let long = plan(
            "e8",
            "c8",
            MoveKind::Castle {
                rook_from: sq("a8"),
                rook_to: sq("d8"),
            },
            None,
        );
        assert_eq!(format_san(PieceKind::King, &long, "", true, false), "O-O-O+");

        let promo = plan(
            "e7",
            "f8",
            MoveKind::Promotion(PieceKind::Queen),
            Some(PieceKind::Rook),
        );
        assert_eq!(format_san(PieceKind::Pawn, &promo, "", true, true), "exf8=Q#");
    }

    #[test]
    fn test_disambiguation_prefers_file_then_rank() {
        let mut board = Board::from_pieces(&[
            (PieceKind::King, Color::White, sq("e1")),
            (PieceKind::King, Color::Black, sq("h8")),
            (PieceKind::Knight, Color::White, sq("b1")),
            (PieceKind::Knight, Color::White, sq("f3")),
            (PieceKind::Rook, Color::White, sq("a1")),
            (PieceKind::Rook, Color::White, sq("a5")),
        ]);
        let ctx = MoveContext::default();

        let knight = plan("b1", "d2", MoveKind::Normal, None);
        assert_eq!(disambiguation(&mut board, &knight, ctx), Ok("b".to_string()));

        let rook = plan("a1", "a3", MoveKind::Normal, None);
        assert_eq!(disambiguation(&mut board, &rook, ctx), Ok("1".to_string()));

        let lone = plan("b1", "c3", MoveKind::Normal, None);
        assert_eq!(disambiguation(&mut board, &lone, ctx), Ok(String::new()));
    }

    #[test]
    fn test_disambiguation_ignores_pinned_rival() {
        let mut board = Board::from_pieces(&[
            (PieceKind::King, Color::White, sq("e1")),
            (PieceKind::Knight, Color::White, sq("e2")),
            (PieceKind::Knight, Color::White, sq("b1")),
            (PieceKind::Rook, Color::Black, sq("e8")),
            (PieceKind::King, Color::Black, sq("h8")),
        ]);

        let knight = plan("b1", "c3", MoveKind::Normal, None);
        assert_eq!(
            disambiguation(&mut board, &knight, MoveContext::default()),
            Ok(String::new()),
            "The e2 knight is pinned and cannot reach c3"
        );
    }
}
