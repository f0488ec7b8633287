//! Session server speaking newline-delimited JSON over stdio
//!
//! Each stdin line is a `ClientEnvelope`; each stdout line is a `ServerFrame`.
//! Logs go to stderr, filtered by `RUST_LOG`.

use anyhow::Context;
use backend::{
    Dispatcher, EventForwarders, InMemoryPlayers, MatchRegistry, MemoryArchive, SessionConfig,
};
use shared::{ClientEnvelope, ErrorCode, ServerFrame, ServerMessage};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let config = SessionConfig::load();
    info!(?config, "starting session server on stdio");

    let players = Arc::new(InMemoryPlayers::default());
    let registry = MatchRegistry::new(config, players.clone(), Arc::new(MemoryArchive::default()));
    let dispatcher = Dispatcher::new(registry.clone(), players);

    let (tx, rx) = mpsc::unbounded_channel();
    let writer = tokio::spawn(write_frames(rx));
    let mut forwarders = EventForwarders::new(tx.clone());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("reading stdin")? {
        if line.trim().is_empty() {
            continue;
        }

        let reply = match serde_json::from_str::<ClientEnvelope>(&line) {
            Ok(envelope) => {
                // Subscribe before dispatching so events caused by this request are seen
                if let Some(game_id) = envelope.message.game_id() {
                    forwarders.watch(&registry, game_id);
                }
                dispatcher.dispatch(envelope).await
            }
            Err(e) => ServerMessage::Error {
                code: ErrorCode::BadRequest,
                message: format!("invalid request: {e}"),
            },
        };

        if let ServerMessage::GameCreated { game_id } = reply {
            forwarders.watch(&registry, game_id);
        }
        if tx.send(ServerFrame::Reply(reply)).is_err() {
            break;
        }
    }

    info!(live_matches = registry.len(), "stdin closed, shutting down");
    forwarders.shutdown();
    drop(tx);
    writer.await.context("writer task panicked")?
}

async fn write_frames(mut rx: mpsc::UnboundedReceiver<ServerFrame>) -> anyhow::Result<()> {
    let mut stdout = tokio::io::stdout();
    while let Some(frame) = rx.recv().await {
        let mut line = serde_json::to_vec(&frame).context("encoding frame")?;
        line.push(b'\n');
        stdout.write_all(&line).await?;
        stdout.flush().await?;
    }
    Ok(())
}
