//! Board representation and reversible mutation
//!
//! The board is an 8x8 grid of optional [`Piece`]s. Every rule query reads it,
//! and the only ways to change it are [`Board::apply`] / [`Board::revert`] (used
//! by the move orchestrator) and [`Board::place`] / [`Board::take`] (used to set
//! up positions).
//!
//! # Reversible Moves
//!
//! Legality checks have to *try* a move and look at the result. Instead of deep
//! copying the board for every probe, [`Board::apply`] records the prior
//! contents of the handful of cells it touches (at most four, for castling and
//! en passant) in an [`Undo`], and [`Board::revert`] writes them back. Because
//! pieces are plain values, restoring a cell restores the exact piece record,
//! including `position` and `has_moved`.
//!
//! [`Board::simulate`] wraps the pair so a probe can never forget the revert.

use crate::error::{InvariantViolation, RulesResult};
use crate::moves::{MoveKind, MovePlan};
use crate::types::{Color, Piece, PieceKind, Position};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Board cell as sent to clients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PieceView {
    #[serde(rename = "type")]
    pub kind: PieceKind,
    pub color: Color,
    pub position: Position,
}

/// Wire format for board broadcasts: `board[row][col]`, `null` for empty cells
pub type SerializedBoard = [[Option<PieceView>; 8]; 8];

/// Prior contents of the cells touched by one [`Board::apply`]
#[derive(Debug, Clone, Default)]
#[must_use = "an applied move must be reverted or committed explicitly"]
pub struct Undo {
    cells: SmallVec<[(Position, Option<Piece>); 4]>,
}

impl Undo {
    fn record(&mut self, board: &Board, pos: Position) {
        self.cells.push((pos, board.cells[pos.row as usize][pos.col as usize]));
    }

    /// Keep the applied move
    pub fn commit(self) {}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    cells: [[Option<Piece>; 8]; 8],
}

impl Default for Board {
    fn default() -> Self {
        Self::standard()
    }
}

const BACK_RANK: [PieceKind; 8] = [
    PieceKind::Rook,
    PieceKind::Knight,
    PieceKind::Bishop,
    PieceKind::Queen,
    PieceKind::King,
    PieceKind::Bishop,
    PieceKind::Knight,
    PieceKind::Rook,
];

impl Board {
    /// Board with no pieces on it
    pub fn empty() -> Self {
        Self {
            cells: [[None; 8]; 8],
        }
    }

    /// Standard starting position
    pub fn standard() -> Self {
        let mut board = Self::empty();
        for color in [Color::White, Color::Black] {
            for (col, kind) in BACK_RANK.iter().enumerate() {
                board.place(Piece::new(*kind, color, Position::new(color.back_row(), col as u8)));
            }
            for col in 0..8 {
                board.place(Piece::new(
                    PieceKind::Pawn,
                    color,
                    Position::new(color.pawn_start_row(), col),
                ));
            }
        }
        board
    }

    /// Build a board from `(kind, colour, square)` triples
    ///
    /// Pieces are unmoved unless they stand off their starting square in a way
    /// that matters: pawns away from their start row are marked as moved so
    /// they cannot double step. Use [`Board::place`] for full control.
    pub fn from_pieces(pieces: &[(PieceKind, Color, Position)]) -> Self {
        let mut board = Self::empty();
        for &(kind, color, pos) in pieces {
            let mut piece = Piece::new(kind, color, pos);
            if kind == PieceKind::Pawn && pos.row != color.pawn_start_row() {
                piece.has_moved = true;
            }
            board.place(piece);
        }
        board
    }

    /// Piece on `pos`, if any
    #[inline]
    pub fn get(&self, pos: Position) -> Option<&Piece> {
        if !pos.is_on_board() {
            return None;
        }
        self.cells[pos.row as usize][pos.col as usize].as_ref()
    }

    #[inline]
    pub fn is_empty(&self, pos: Position) -> bool {
        self.get(pos).is_none()
    }

    #[inline]
    pub fn color_at(&self, pos: Position) -> Option<Color> {
        self.get(pos).map(|p| p.color)
    }

    /// Put a piece on the square recorded in its `position`, replacing whatever was there
    pub fn place(&mut self, piece: Piece) {
        let pos = piece.position;
        self.cells[pos.row as usize][pos.col as usize] = Some(piece);
    }

    /// Remove and return the piece on `pos`
    pub fn take(&mut self, pos: Position) -> Option<Piece> {
        self.cells[pos.row as usize][pos.col as usize].take()
    }

    /// All pieces in row-major order
    pub fn pieces(&self) -> impl Iterator<Item = &Piece> {
        self.cells.iter().flatten().flatten()
    }

    pub fn pieces_of(&self, color: Color) -> impl Iterator<Item = &Piece> {
        self.pieces().filter(move |p| p.color == color)
    }

    /// Square of `color`'s king
    pub fn find_king(&self, color: Color) -> RulesResult<Position> {
        self.pieces_of(color)
            .find(|p| p.kind == PieceKind::King)
            .map(|p| p.position)
            .ok_or(InvariantViolation::KingMissing(color))
    }

    /// Check the structural invariants: one king per colour and every piece
    /// recording the cell it stands on
    pub fn verify(&self) -> RulesResult<()> {
        for color in [Color::White, Color::Black] {
            match self
                .pieces_of(color)
                .filter(|p| p.kind == PieceKind::King)
                .count()
            {
                0 => return Err(InvariantViolation::KingMissing(color)),
                1 => {}
                _ => return Err(InvariantViolation::DuplicateKing(color)),
            }
        }
        for cell in Position::all() {
            if let Some(piece) = self.get(cell) {
                if piece.position != cell {
                    return Err(InvariantViolation::PieceOutOfPlace {
                        cell,
                        recorded: piece.position,
                    });
                }
            }
        }
        Ok(())
    }

    /// Execute a planned move, returning what is needed to take it back
    ///
    /// The moving piece gets its `position` updated and `has_moved` set. For
    /// promotions a freshly constructed piece of the requested kind replaces
    /// the pawn; for castling the rook is relocated as well.
    pub fn apply(&mut self, plan: &MovePlan) -> Undo {
        let mut undo = Undo::default();
        undo.record(self, plan.from);
        undo.record(self, plan.to);
        match plan.kind {
            MoveKind::EnPassant { captured } => undo.record(self, captured),
            MoveKind::Castle { rook_from, rook_to } => {
                undo.record(self, rook_from);
                undo.record(self, rook_to);
            }
            _ => {}
        }

        let Some(mut piece) = self.take(plan.from) else {
            return undo;
        };

        piece.position = plan.to;
        piece.has_moved = true;
        if let MoveKind::Promotion(kind) = plan.kind {
            piece = Piece {
                has_moved: true,
                ..Piece::new(kind, piece.color, plan.to)
            };
        }
        self.place(piece);

        match plan.kind {
            MoveKind::EnPassant { captured } => {
                self.take(captured);
            }
            MoveKind::Castle { rook_from, rook_to } => {
                if let Some(mut rook) = self.take(rook_from) {
                    rook.position = rook_to;
                    rook.has_moved = true;
                    self.place(rook);
                }
            }
            _ => {}
        }

        undo
    }

    /// Restore every cell recorded in `undo`
    pub fn revert(&mut self, undo: Undo) {
        for (pos, prior) in undo.cells.into_iter().rev() {
            self.cells[pos.row as usize][pos.col as usize] = prior;
        }
    }

    /// Apply `plan`, run `probe` against the resulting board, then revert
    ///
    /// The revert happens regardless of what the probe returns.
    pub fn simulate<R>(&mut self, plan: &MovePlan, probe: impl FnOnce(&Board) -> R) -> R {
        let undo = self.apply(plan);
        let result = probe(self);
        self.revert(undo);
        result
    }

    /// Board in its wire format
    pub fn serialize(&self) -> SerializedBoard {
        let mut out: SerializedBoard = [[None; 8]; 8];
        for piece in self.pieces() {
            out[piece.position.row as usize][piece.position.col as usize] = Some(PieceView {
                kind: piece.kind,
                color: piece.color,
                position: piece.position,
            });
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(name: &str) -> Position {
        name.parse().unwrap()
    }

    #[test]
    fn test_standard_board_layout() {
        let board = Board::standard();
        assert_eq!(board.pieces().count(), 32);
        assert_eq!(board.get(sq("e1")).map(|p| p.kind), Some(PieceKind::King));
        assert_eq!(board.color_at(sq("e1")), Some(Color::White));
        assert_eq!(board.get(sq("d8")).map(|p| p.kind), Some(PieceKind::Queen));
        assert_eq!(board.color_at(sq("a7")), Some(Color::Black));
        assert!(board.is_empty(sq("e4")));
        assert!(board.verify().is_ok());
    }

    #[test]
    fn test_apply_then_revert_restores_exact_pieces() {
        let mut board = Board::standard();
        let before = board.clone();
        let plan = MovePlan {
            from: sq("g1"),
            to: sq("f3"),
            kind: MoveKind::Normal,
            captured: None,
        };

        let undo = board.apply(&plan);
        let knight = board.get(sq("f3")).copied().unwrap();
        assert_eq!(knight.position, sq("f3"));
        assert!(knight.has_moved);
        assert!(board.is_empty(sq("g1")));

        board.revert(undo);
        assert_eq!(board, before);
        assert!(!board.get(sq("g1")).unwrap().has_moved);
    }

    #[test]
    fn test_castle_moves_rook_and_reverts_both() {
        let mut board = Board::from_pieces(&[
            (PieceKind::King, Color::White, sq("e1")),
            (PieceKind::Rook, Color::White, sq("h1")),
            (PieceKind::King, Color::Black, sq("e8")),
        ]);
        let before = board.clone();
        let plan = MovePlan {
            from: sq("e1"),
            to: sq("g1"),
            kind: MoveKind::Castle {
                rook_from: sq("h1"),
                rook_to: sq("f1"),
            },
            captured: None,
        };

        board.simulate(&plan, |b| {
            assert_eq!(b.get(sq("g1")).map(|p| p.kind), Some(PieceKind::King));
            assert_eq!(b.get(sq("f1")).map(|p| p.kind), Some(PieceKind::Rook));
            assert!(b.get(sq("f1")).unwrap().has_moved);
            assert!(b.is_empty(sq("h1")));
        });

        assert_eq!(board, before);
    }

    #[test]
    fn test_en_passant_removes_the_bypassing_pawn() {
        let mut board = Board::from_pieces(&[
            (PieceKind::King, Color::White, sq("e1")),
            (PieceKind::King, Color::Black, sq("e8")),
            (PieceKind::Pawn, Color::White, sq("e5")),
            (PieceKind::Pawn, Color::Black, sq("d5")),
        ]);
        let plan = MovePlan {
            from: sq("e5"),
            to: sq("d6"),
            kind: MoveKind::EnPassant { captured: sq("d5") },
            captured: Some(PieceKind::Pawn),
        };

        board.apply(&plan).commit();
        assert!(board.is_empty(sq("d5")));
        assert_eq!(board.color_at(sq("d6")), Some(Color::White));
    }

    #[test]
    fn test_promotion_replaces_pawn() {
        let mut board = Board::from_pieces(&[
            (PieceKind::King, Color::White, sq("e1")),
            (PieceKind::King, Color::Black, sq("e8")),
            (PieceKind::Pawn, Color::White, sq("a7")),
        ]);
        let plan = MovePlan {
            from: sq("a7"),
            to: sq("a8"),
            kind: MoveKind::Promotion(PieceKind::Knight),
            captured: None,
        };

        board.apply(&plan).commit();
        let promoted = board.get(sq("a8")).copied().unwrap();
        assert_eq!(promoted.kind, PieceKind::Knight);
        assert_eq!(promoted.position, sq("a8"));
        assert!(board.is_empty(sq("a7")));
    }

    #[test]
    fn test_verify_reports_missing_king() {
        let board = Board::from_pieces(&[(PieceKind::King, Color::White, sq("e1"))]);
        assert_eq!(
            board.verify(),
            Err(InvariantViolation::KingMissing(Color::Black))
        );
    }

    #[test]
    fn test_serialize_uses_type_field_and_nulls() {
        let board = Board::standard();
        let json = serde_json::to_value(board.serialize()).unwrap();
        assert!(json[4][4].is_null());
        assert_eq!(json[7][4]["type"], "king");
        assert_eq!(json[7][4]["color"], "white");
        assert_eq!(json[7][4]["position"]["row"], 7);
        assert_eq!(json[7][4]["position"]["col"], 4);
    }
}
