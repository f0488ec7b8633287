//! Session server configuration
//!
//! Every setting can come from a command-line flag or an environment
//! variable; a `.env` file in the working directory is loaded first.

use clap::Parser;
use std::time::Duration;
use tracing::warn;

/// Time control and reconnection settings for every match on this server
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "backend", about = "Chess session server speaking JSON lines over stdio")]
pub struct SessionConfig {
    /// Starting time on each player's clock, in seconds
    #[arg(long, env = "CHESS_CLOCK_SECS", default_value_t = 600)]
    pub clock_secs: u64,

    /// Fischer increment added after each completed move, in seconds
    #[arg(long, env = "CHESS_INCREMENT_SECS", default_value_t = 0)]
    pub increment_secs: u64,

    /// How long a disconnected player has to come back, in seconds
    #[arg(long, env = "CHESS_GRACE_SECS", default_value_t = 60)]
    pub grace_secs: u64,

    /// Clock decrement interval, in milliseconds
    #[arg(long, env = "CHESS_TICK_MILLIS", default_value_t = 1000)]
    pub tick_millis: u64,

    /// PGN `Event` tag for games hosted here
    #[arg(long, env = "CHESS_EVENT", default_value = "Casual Game")]
    pub event: String,

    /// PGN `Site` tag for games hosted here
    #[arg(long, env = "CHESS_SITE", default_value = "Online")]
    pub site: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            clock_secs: 600,
            increment_secs: 0,
            grace_secs: 60,
            tick_millis: 1000,
            event: "Casual Game".to_string(),
            site: "Online".to_string(),
        }
    }
}

impl SessionConfig {
    /// Load `.env`, then parse flags and environment
    pub fn load() -> Self {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                warn!(error = %e, "ignoring unreadable .env file");
            }
        }
        Self::parse()
    }

    pub fn clock(&self) -> Duration {
        Duration::from_secs(self.clock_secs)
    }

    pub fn increment(&self) -> Duration {
        Duration::from_secs(self.increment_secs)
    }

    pub fn grace(&self) -> Duration {
        Duration::from_secs(self.grace_secs)
    }

    /// Never zero, so the ticker cannot spin
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_millis.max(1))
    }
}
