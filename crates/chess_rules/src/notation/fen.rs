//! Forsyth-Edwards Notation
//!
//! Export builds all six fields from live state: castling rights in particular
//! are read off the kings' and rooks' `has_moved` flags every time, because the
//! loss of a right is irreversible and must never be served from a stale cache.
//!
//! Import ([`parse_fen`]) is used to set up arbitrary positions. Kings and rooks
//! on their home squares are marked unmoved only when the castling field grants
//! the matching right.

use crate::board::Board;
use crate::types::{Color, Piece, PieceKind, Position};
use std::fmt::Write as _;
use thiserror::Error;

/// The parts of a game FEN needs beyond the board
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FenSnapshot {
    pub turn: Color,
    pub en_passant: Option<Position>,
    pub halfmove_clock: u32,
    pub fullmove_number: u32,
}

/// A position read from a FEN string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FenPosition {
    pub board: Board,
    pub snapshot: FenSnapshot,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FenError {
    #[error("FEN must have 6 fields, found {0}")]
    FieldCount(usize),

    #[error("Invalid piece placement: {0}")]
    Placement(String),

    #[error("Invalid side to move: {0}")]
    Turn(String),

    #[error("Invalid castling field: {0}")]
    Castling(String),

    #[error("Invalid en passant square: {0}")]
    EnPassant(String),

    #[error("Invalid move counter: {0}")]
    Counter(String),
}

/// Piece placement field, rank 8 first
pub fn placement(board: &Board) -> String {
    let mut out = String::new();
    for row in 0..8u8 {
        let mut empty = 0;
        for col in 0..8u8 {
            match board.get(Position::new(row, col)) {
                Some(piece) => {
                    if empty > 0 {
                        let _ = write!(out, "{empty}");
                        empty = 0;
                    }
                    out.push(piece.kind.fen_char(piece.color));
                }
                None => empty += 1,
            }
        }
        if empty > 0 {
            let _ = write!(out, "{empty}");
        }
        if row < 7 {
            out.push('/');
        }
    }
    out
}

fn unmoved(board: &Board, pos: Position, kind: PieceKind, color: Color) -> bool {
    board
        .get(pos)
        .is_some_and(|p| p.kind == kind && p.color == color && !p.has_moved)
}

/// Castling availability (`KQkq` subset, or `-`)
pub fn castling_rights(board: &Board) -> String {
    let mut rights = String::new();
    for color in [Color::White, Color::Black] {
        let row = color.back_row();
        if !unmoved(board, Position::new(row, 4), PieceKind::King, color) {
            continue;
        }
        for (rook_col, letter) in [(7, 'k'), (0, 'q')] {
            if unmoved(board, Position::new(row, rook_col), PieceKind::Rook, color) {
                rights.push(match color {
                    Color::White => letter.to_ascii_uppercase(),
                    Color::Black => letter,
                });
            }
        }
    }
    if rights.is_empty() {
        rights.push('-');
    }
    rights
}

fn en_passant_field(en_passant: Option<Position>) -> String {
    en_passant.map_or_else(|| "-".to_string(), |sq| sq.to_string())
}

/// Full six-field FEN
pub fn to_fen(board: &Board, snapshot: &FenSnapshot) -> String {
    format!(
        "{} {} {}",
        position_key(board, snapshot.turn, snapshot.en_passant),
        snapshot.halfmove_clock,
        snapshot.fullmove_number,
    )
}

/// The first four FEN fields
///
/// Two positions with the same key are the same position for repetition
/// purposes: same placement, side to move, castling rights and en-passant
/// square.
pub fn position_key(board: &Board, turn: Color, en_passant: Option<Position>) -> String {
    format!(
        "{} {} {} {}",
        placement(board),
        turn.fen_char(),
        castling_rights(board),
        en_passant_field(en_passant)
    )
}

/// Read a six-field FEN string
pub fn parse_fen(fen: &str) -> Result<FenPosition, FenError> {
    let fields: Vec<&str> = fen.split_whitespace().collect();
    if fields.len() != 6 {
        return Err(FenError::FieldCount(fields.len()));
    }

    let mut pieces = Vec::new();
    let ranks: Vec<&str> = fields[0].split('/').collect();
    if ranks.len() != 8 {
        return Err(FenError::Placement(fields[0].to_string()));
    }
    for (row, rank) in ranks.iter().enumerate() {
        let mut col = 0u8;
        for c in rank.chars() {
            if let Some(skip) = c.to_digit(10) {
                if skip == 0 || col as u32 + skip > 8 {
                    return Err(FenError::Placement(fields[0].to_string()));
                }
                col += skip as u8;
                continue;
            }
            let kind =
                PieceKind::from_char(c).ok_or_else(|| FenError::Placement(fields[0].to_string()))?;
            let color = if c.is_ascii_uppercase() {
                Color::White
            } else {
                Color::Black
            };
            if col >= 8 {
                return Err(FenError::Placement(fields[0].to_string()));
            }
            pieces.push((kind, color, Position::new(row as u8, col)));
            col += 1;
        }
        if col != 8 {
            return Err(FenError::Placement(fields[0].to_string()));
        }
    }

    let turn = match fields[1] {
        "w" => Color::White,
        "b" => Color::Black,
        other => return Err(FenError::Turn(other.to_string())),
    };

    let castling = fields[2];
    if castling != "-" && !castling.chars().all(|c| "KQkq".contains(c)) {
        return Err(FenError::Castling(castling.to_string()));
    }

    let en_passant = match fields[3] {
        "-" => None,
        sq => Some(
            sq.parse::<Position>()
                .map_err(|_| FenError::EnPassant(sq.to_string()))?,
        ),
    };

    let halfmove_clock = fields[4]
        .parse()
        .map_err(|_| FenError::Counter(fields[4].to_string()))?;
    let fullmove_number = fields[5]
        .parse()
        .map_err(|_| FenError::Counter(fields[5].to_string()))?;

    let mut board = Board::from_pieces(&pieces);
    mark_castling_pieces(&mut board, castling);

    Ok(FenPosition {
        board,
        snapshot: FenSnapshot {
            turn,
            en_passant,
            halfmove_clock,
            fullmove_number,
        },
    })
}

/// Kings and rooks count as moved unless a castling right keeps them fresh
fn mark_castling_pieces(board: &mut Board, castling: &str) {
    let movers: Vec<Piece> = board
        .pieces()
        .filter(|p| matches!(p.kind, PieceKind::King | PieceKind::Rook))
        .copied()
        .collect();

    for mut piece in movers {
        let home = piece.color.back_row();
        let rights: Vec<char> = castling
            .chars()
            .filter(|c| match piece.color {
                Color::White => c.is_ascii_uppercase(),
                Color::Black => c.is_ascii_lowercase(),
            })
            .map(|c| c.to_ascii_lowercase())
            .collect();

        let fresh = piece.position.row == home
            && match (piece.kind, piece.position.col) {
                (PieceKind::King, 4) => !rights.is_empty(),
                (PieceKind::Rook, 7) => rights.contains(&'k'),
                (PieceKind::Rook, 0) => rights.contains(&'q'),
                _ => false,
            };
        if !fresh {
            piece.has_moved = true;
            board.place(piece);
        }
    }
}
