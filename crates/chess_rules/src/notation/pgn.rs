//! Portable Game Notation export
//!
//! Renders the Seven Tag Roster followed by numbered movetext and the result
//! token. Ongoing games carry `*` as their result.

use crate::history::MoveHistory;
use chrono::{NaiveDate, Utc};
use std::fmt::Write as _;

/// Seven Tag Roster values, minus `Result` which comes from the game
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PgnHeaders {
    pub event: String,
    pub site: String,
    pub date: NaiveDate,
    pub round: String,
    pub white: String,
    pub black: String,
}

impl Default for PgnHeaders {
    fn default() -> Self {
        Self {
            event: "Casual Game".to_string(),
            site: "Online".to_string(),
            date: Utc::now().date_naive(),
            round: "1".to_string(),
            white: "Player 1".to_string(),
            black: "Player 2".to_string(),
        }
    }
}

fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

impl PgnHeaders {
    /// Render a complete PGN record
    ///
    /// `result` is `1-0`, `0-1`, `1/2-1/2`, or `*` while the game is running.
    pub fn render(&self, history: &MoveHistory, result: &str) -> String {
        let mut pgn = String::new();
        let tags = [
            ("Event", escape(&self.event)),
            ("Site", escape(&self.site)),
            ("Date", self.date.format("%Y.%m.%d").to_string()),
            ("Round", escape(&self.round)),
            ("White", escape(&self.white)),
            ("Black", escape(&self.black)),
            ("Result", result.to_string()),
        ];
        for (name, value) in tags {
            let _ = writeln!(pgn, "[{name} \"{value}\"]");
        }
        pgn.push('\n');

        let mut movetext = Vec::with_capacity(history.len() + history.len() / 2 + 1);
        for (ply, san) in history.san_moves().enumerate() {
            if ply % 2 == 0 {
                movetext.push(format!("{}.", ply / 2 + 1));
            }
            movetext.push(san.to_string());
        }
        movetext.push(result.to_string());
        pgn.push_str(&movetext.join(" "));
        pgn
    }
}
