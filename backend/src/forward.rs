//! Per-game event forwarding for a single output stream
//!
//! The stdio transport relays every watched game's [`SessionEvent`]s into one
//! frame channel. Each game gets one forwarder task, which ends when the game
//! finishes and its channel closes.

use crate::registry::MatchRegistry;
use chess_rules::GameId;
use shared::ServerFrame;
use std::collections::HashMap;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

pub struct EventForwarders {
    tx: mpsc::UnboundedSender<ServerFrame>,
    tasks: HashMap<GameId, JoinHandle<()>>,
}

impl EventForwarders {
    pub fn new(tx: mpsc::UnboundedSender<ServerFrame>) -> Self {
        Self {
            tx,
            tasks: HashMap::new(),
        }
    }

    /// Start relaying a game's events, once per game
    ///
    /// Unknown or already finished games are ignored. Forwarders whose game
    /// has ended are dropped first.
    pub fn watch(&mut self, registry: &MatchRegistry, game_id: GameId) {
        self.sweep();
        if self.tasks.contains_key(&game_id) {
            return;
        }
        let Ok(mut events) = registry.subscribe(game_id) else {
            return;
        };

        let tx = self.tx.clone();
        let task = tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => {
                        if tx.send(ServerFrame::Event(event)).is_err() {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(%game_id, skipped, "event forwarder lagged");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            debug!(%game_id, "event forwarder finished");
        });
        self.tasks.insert(game_id, task);
    }

    /// Forget forwarders whose game has ended
    pub fn sweep(&mut self) {
        self.tasks.retain(|_, task| !task.is_finished());
    }

    /// Number of games currently tracked
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Stop every forwarder and release the frame sender
    pub fn shutdown(self) {
        for task in self.tasks.into_values() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionConfig;
    use crate::directory::{InMemoryPlayers, MemoryArchive};
    use shared::SessionEvent;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_finished_games_are_swept() {
        let players = Arc::new(InMemoryPlayers::default());
        let registry = MatchRegistry::new(
            SessionConfig::default(),
            players.clone(),
            Arc::new(MemoryArchive::default()),
        );
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut forwarders = EventForwarders::new(tx);

        let finished = registry.create_game();
        forwarders.watch(&registry, finished);
        forwarders.watch(&registry, finished);
        assert_eq!(forwarders.len(), 1, "One forwarder per game");

        let alice = players.register("Alice").id;
        let bob = players.register("Bob").id;
        registry.add_participant(finished, alice).await.unwrap();
        registry.add_participant(finished, bob).await.unwrap();
        registry.resign(finished, bob).await.unwrap();
        tokio::time::sleep(Duration::from_millis(1)).await;

        let mut saw_game_over = false;
        while let Ok(frame) = rx.try_recv() {
            if let ServerFrame::Event(SessionEvent::GameOver { .. }) = frame {
                saw_game_over = true;
            }
        }
        assert!(saw_game_over);

        let live = registry.create_game();
        forwarders.watch(&registry, live);
        assert_eq!(forwarders.len(), 1, "Only the live game is still tracked");

        forwarders.watch(&registry, GameId::new());
        assert_eq!(forwarders.len(), 1);
        forwarders.shutdown();
    }
}
