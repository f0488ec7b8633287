//! Per-colour chess clock with Fischer increment support
//!
//! Each player starts with a base time and receives an increment after each
//! completed move. Only the colour holding the turn loses time, and only while
//! the clock is running: it starts with the first move and stops while the
//! match is paused for a reconnect.
//!
//! Example: 10+5 means 10 minutes base time with 5 second increment per move.

use chess_rules::Color;
use shared::ClockSnapshot;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChessClock {
    white_left: Duration,
    black_left: Duration,
    increment: Duration,
    /// Colour whose time is being spent, `None` until the first move
    active: Option<Color>,
    is_running: bool,
}

impl ChessClock {
    pub fn new(initial: Duration, increment: Duration) -> Self {
        Self {
            white_left: initial,
            black_left: initial,
            increment,
            active: None,
            is_running: false,
        }
    }

    pub fn remaining(&self, color: Color) -> Duration {
        match color {
            Color::White => self.white_left,
            Color::Black => self.black_left,
        }
    }

    fn remaining_mut(&mut self, color: Color) -> &mut Duration {
        match color {
            Color::White => &mut self.white_left,
            Color::Black => &mut self.black_left,
        }
    }

    pub fn is_running(&self) -> bool {
        self.is_running
    }

    pub fn active(&self) -> Option<Color> {
        self.active
    }

    /// Apply Fischer increment to the player who just moved
    pub fn apply_increment(&mut self, color: Color) {
        if !self.increment.is_zero() {
            let increment = self.increment;
            *self.remaining_mut(color) += increment;
        }
    }

    /// Hand the turn over after `mover` completed a move
    ///
    /// Credits the mover's increment and starts the opponent's time. The first
    /// call starts the clock.
    pub fn complete_move(&mut self, mover: Color) {
        self.apply_increment(mover);
        self.active = Some(mover.opponent());
        self.is_running = true;
    }

    pub fn pause(&mut self) {
        self.is_running = false;
    }

    /// Restart after a pause; a clock that never started stays stopped
    pub fn resume(&mut self) {
        self.is_running = self.active.is_some();
    }

    /// Spend `elapsed` from the active colour
    ///
    /// Returns the colour whose time just ran out, at which point the clock
    /// stops for good.
    pub fn tick(&mut self, elapsed: Duration) -> Option<Color> {
        if !self.is_running {
            return None;
        }
        let color = self.active?;
        let left = self.remaining_mut(color);
        *left = left.saturating_sub(elapsed);
        if left.is_zero() {
            self.is_running = false;
            return Some(color);
        }
        None
    }

    pub fn snapshot(&self) -> ClockSnapshot {
        ClockSnapshot {
            white_ms: self.white_left.as_millis() as u64,
            black_ms: self.black_left.as_millis() as u64,
            running: self.active.filter(|_| self.is_running),
        }
    }
}
