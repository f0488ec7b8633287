//! Core value types for chess rules
//!
//! Provides the small copyable types every other module is written against:
//! colours, piece kinds, board coordinates and the piece record itself.
//!
//! # Coordinate System
//!
//! Positions are `(row, col)` pairs in `0..8`. Row 0 is rank 8 (Black's back
//! rank) and row 7 is rank 1 (White's back rank); column 0 is file `a`.
//! White pawns therefore advance towards row 0, Black pawns towards row 7.
//!
//! ```text
//!        a  b  c  d  e  f  g  h
//! row 0  r  n  b  q  k  b  n  r   rank 8
//! row 1  p  p  p  p  p  p  p  p   rank 7
//!   ...
//! row 6  P  P  P  P  P  P  P  P   rank 2
//! row 7  R  N  B  Q  K  B  N  R   rank 1
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Side of the board a piece (or player) belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    White,
    Black,
}

impl Color {
    /// The other side
    pub fn opponent(self) -> Self {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    /// Row delta of a single pawn step for this colour
    pub fn pawn_direction(self) -> i8 {
        match self {
            Color::White => -1,
            Color::Black => 1,
        }
    }

    /// Row this colour's pawns start on (eligible for the double step)
    pub fn pawn_start_row(self) -> u8 {
        match self {
            Color::White => 6,
            Color::Black => 1,
        }
    }

    /// Row on which this colour's pawns promote
    pub fn promotion_row(self) -> u8 {
        match self {
            Color::White => 0,
            Color::Black => 7,
        }
    }

    /// Row holding this colour's king and rooks at the start of the game
    pub fn back_row(self) -> u8 {
        match self {
            Color::White => 7,
            Color::Black => 0,
        }
    }

    /// FEN side-to-move letter
    pub fn fen_char(self) -> char {
        match self {
            Color::White => 'w',
            Color::Black => 'b',
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::White => f.write_str("white"),
            Color::Black => f.write_str("black"),
        }
    }
}

/// The six chess piece kinds
///
/// This is a closed set: every rule in [`crate::rules`] matches on it
/// exhaustively, so adding a kind is a compile error until all rules handle it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PieceKind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl PieceKind {
    /// SAN piece letter (`None` for pawns, which are written without one)
    pub fn san_letter(self) -> Option<char> {
        match self {
            PieceKind::Pawn => None,
            PieceKind::Knight => Some('N'),
            PieceKind::Bishop => Some('B'),
            PieceKind::Rook => Some('R'),
            PieceKind::Queen => Some('Q'),
            PieceKind::King => Some('K'),
        }
    }

    /// FEN letter: uppercase for White, lowercase for Black
    pub fn fen_char(self, color: Color) -> char {
        let c = match self {
            PieceKind::Pawn => 'p',
            PieceKind::Knight => 'n',
            PieceKind::Bishop => 'b',
            PieceKind::Rook => 'r',
            PieceKind::Queen => 'q',
            PieceKind::King => 'k',
        };
        match color {
            Color::White => c.to_ascii_uppercase(),
            Color::Black => c,
        }
    }

    /// Parse a piece letter in either case (`q`, `N`, ...)
    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_lowercase() {
            'p' => Some(PieceKind::Pawn),
            'n' => Some(PieceKind::Knight),
            'b' => Some(PieceKind::Bishop),
            'r' => Some(PieceKind::Rook),
            'q' => Some(PieceKind::Queen),
            'k' => Some(PieceKind::King),
            _ => None,
        }
    }

    /// Whether a pawn may promote to this kind
    pub fn is_promotion_target(self) -> bool {
        matches!(
            self,
            PieceKind::Knight | PieceKind::Bishop | PieceKind::Rook | PieceKind::Queen
        )
    }
}

/// A square on the board
///
/// Pure value type. Deserialized positions are not range-checked; callers at
/// the trust boundary use [`Position::is_on_board`] before indexing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub row: u8,
    pub col: u8,
}

impl Position {
    pub const fn new(row: u8, col: u8) -> Self {
        Self { row, col }
    }

    pub fn is_on_board(self) -> bool {
        self.row < 8 && self.col < 8
    }

    /// Step by a signed row/column delta, `None` if that leaves the board
    pub fn offset(self, d_row: i8, d_col: i8) -> Option<Self> {
        let row = self.row as i8 + d_row;
        let col = self.col as i8 + d_col;
        if (0..8).contains(&row) && (0..8).contains(&col) {
            Some(Self::new(row as u8, col as u8))
        } else {
            None
        }
    }

    /// File letter (`a`..=`h`); only meaningful on the board
    pub fn file_char(self) -> char {
        (b'a' + self.col) as char
    }

    /// Rank digit (`1`..=`8`); only meaningful on the board
    pub fn rank_char(self) -> char {
        (b'8' - self.row) as char
    }

    /// All 64 squares in row-major order
    pub fn all() -> impl Iterator<Item = Position> {
        (0..8u8).flat_map(|row| (0..8u8).map(move |col| Position::new(row, col)))
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.is_on_board() {
            return write!(f, "({},{})", self.row, self.col);
        }
        write!(f, "{}{}", self.file_char(), self.rank_char())
    }
}

/// Error returned when parsing a square name such as `e4`
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid square name: {0:?}")]
pub struct ParseSquareError(pub String);

impl FromStr for Position {
    type Err = ParseSquareError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        if bytes.len() != 2 {
            return Err(ParseSquareError(s.to_string()));
        }
        let (file, rank) = (bytes[0], bytes[1]);
        if !(b'a'..=b'h').contains(&file) || !(b'1'..=b'8').contains(&rank) {
            return Err(ParseSquareError(s.to_string()));
        }
        Ok(Position::new(b'8' - rank, file - b'a'))
    }
}

/// A piece standing on the board
///
/// Owned by exactly one board cell. `position` always equals the coordinates
/// of the owning cell and `has_moved` flips to `true` exactly once, on the
/// piece's first completed move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Piece {
    pub kind: PieceKind,
    pub color: Color,
    pub position: Position,
    pub has_moved: bool,
}

impl Piece {
    pub fn new(kind: PieceKind, color: Color, position: Position) -> Self {
        Self {
            kind,
            color,
            position,
            has_moved: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_square_names_round_trip_through_coordinates() {
        let e4: Position = "e4".parse().unwrap();
        assert_eq!(e4, Position::new(4, 4));
        assert_eq!(e4.to_string(), "e4");

        let a8: Position = "a8".parse().unwrap();
        assert_eq!(a8, Position::new(0, 0));

        let h1: Position = "h1".parse().unwrap();
        assert_eq!(h1, Position::new(7, 7));
    }

    #[test]
    fn test_invalid_square_names_are_rejected() {
        assert!("i1".parse::<Position>().is_err());
        assert!("a9".parse::<Position>().is_err());
        assert!("e".parse::<Position>().is_err());
        assert!("e44".parse::<Position>().is_err());
    }

    #[test]
    fn test_off_board_squares_display_as_coordinates() {
        assert_eq!(Position::new(8, 0).to_string(), "(8,0)");
        assert_eq!(Position::new(200, 200).to_string(), "(200,200)");
        assert_eq!(Position::new(0, 255).to_string(), "(0,255)");
    }

    #[test]
    fn test_offset_stays_on_board() {
        let a1 = Position::new(7, 0);
        assert_eq!(a1.offset(-1, 1), Some(Position::new(6, 1)));
        assert_eq!(a1.offset(1, 0), None);
        assert_eq!(a1.offset(0, -1), None);
    }

    #[test]
    fn test_colour_geometry() {
        assert_eq!(Color::White.opponent(), Color::Black);
        assert_eq!(Color::White.pawn_direction(), -1);
        assert_eq!(Color::Black.pawn_direction(), 1);
        assert_eq!(Color::White.promotion_row(), 0);
        assert_eq!(Color::Black.back_row(), 0);
    }

    #[test]
    fn test_piece_letters() {
        assert_eq!(PieceKind::Knight.fen_char(Color::White), 'N');
        assert_eq!(PieceKind::Knight.fen_char(Color::Black), 'n');
        assert_eq!(PieceKind::Pawn.san_letter(), None);
        assert_eq!(PieceKind::from_char('q'), Some(PieceKind::Queen));
        assert!(!PieceKind::King.is_promotion_target());
        assert!(PieceKind::Knight.is_promotion_target());
    }
}
