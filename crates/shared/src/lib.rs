//! Wire protocol for chess sessions
//!
//! Message types exchanged between the session server and its clients. All
//! types are plain `serde` data; the transport decides the encoding (the
//! bundled server speaks newline-delimited JSON).

pub mod protocol;

pub use protocol::{
    ClientEnvelope, ClientMessage, ClockSnapshot, ErrorCode, MoveResponse, ServerFrame,
    ServerMessage, SessionEvent,
};
