//! Chess session server
//!
//! Hosts live matches on top of `chess_rules`: seating, turn-by-turn move
//! handling, chess clocks and the reconnection grace period. Finished matches
//! are handed to a [`MatchArchive`]; identities come from a [`PlayerDirectory`].

pub mod clock;
pub mod config;
pub mod directory;
pub mod dispatch;
pub mod error;
pub mod forward;
pub mod registry;
pub mod session;

pub use clock::ChessClock;
pub use config::SessionConfig;
pub use directory::{InMemoryPlayers, MatchArchive, MatchRecord, MemoryArchive, PlayerDirectory};
pub use dispatch::Dispatcher;
pub use error::{SessionError, SessionResult};
pub use forward::EventForwarders;
pub use registry::{JoinOutcome, MatchRegistry};
