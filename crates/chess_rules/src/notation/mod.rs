//! Chess notation: SAN for single moves, FEN snapshots and PGN game records
//!
//! # Module Structure
//!
//! - `san` - Standard Algebraic Notation for the move just made, with disambiguation
//! - `fen` - Forsyth-Edwards Notation export and import, plus the repetition key
//! - `pgn` - Portable Game Notation with the Seven Tag Roster

pub mod fen;
pub mod pgn;
pub mod san;

pub use fen::{castling_rights, parse_fen, position_key, to_fen, FenError, FenPosition, FenSnapshot};
pub use pgn::PgnHeaders;
pub use san::{disambiguation, format_san};
