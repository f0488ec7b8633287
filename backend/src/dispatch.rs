//! Maps protocol requests onto registry calls
//!
//! Transport-agnostic: the binary feeds it decoded JSON lines, tests call it
//! directly. Every failure becomes a [`ServerMessage::Error`] carrying the
//! error's [`ErrorCode`](shared::ErrorCode), except refused moves, which are
//! answered with an unsuccessful [`MoveResponse`] so clients can show the
//! reason in place.

use crate::directory::InMemoryPlayers;
use crate::error::{SessionError, SessionResult};
use crate::registry::MatchRegistry;
use chess_rules::{GameId, PlayerId};
use shared::{ClientEnvelope, ClientMessage, MoveResponse, ServerMessage};
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Clone)]
pub struct Dispatcher {
    registry: MatchRegistry,
    players: Arc<InMemoryPlayers>,
}

impl Dispatcher {
    pub fn new(registry: MatchRegistry, players: Arc<InMemoryPlayers>) -> Self {
        Self { registry, players }
    }

    pub fn registry(&self) -> &MatchRegistry {
        &self.registry
    }

    /// Handle one request and produce the reply for its sender
    pub async fn dispatch(&self, envelope: ClientEnvelope) -> ServerMessage {
        let ClientEnvelope { player_id, message } = envelope;
        match self.handle(player_id, message).await {
            Ok(reply) => reply,
            Err(e) => {
                if let SessionError::Rejected(_) = e {
                    debug!(?player_id, error = %e, "request refused");
                } else {
                    warn!(?player_id, error = %e, "request failed");
                }
                ServerMessage::Error {
                    code: e.code(),
                    message: e.to_string(),
                }
            }
        }
    }

    async fn handle(
        &self,
        player_id: Option<PlayerId>,
        message: ClientMessage,
    ) -> SessionResult<ServerMessage> {
        let registry = &self.registry;
        let me = || player_id.ok_or(SessionError::MissingIdentity);

        let reply = match message {
            ClientMessage::Register { name } => {
                let player = self.players.register(name);
                debug!(player_id = %player.id, name = %player.name, "player registered");
                ServerMessage::Registered { player }
            }
            ClientMessage::CreateGame => {
                me()?;
                ServerMessage::GameCreated {
                    game_id: registry.create_game(),
                }
            }
            ClientMessage::JoinGame { game_id } | ClientMessage::Reconnect { game_id } => {
                let joined = registry.add_participant(game_id, me()?).await?;
                ServerMessage::Joined {
                    game_id,
                    color: joined.color,
                    reconnected: joined.reconnected,
                }
            }
            ClientMessage::MakeMove {
                game_id,
                from,
                to,
                promotion,
            } => {
                let result = match registry
                    .apply_move(game_id, me()?, from, to, promotion)
                    .await
                {
                    Ok(response) => response,
                    Err(SessionError::Rejected(rejection)) => {
                        debug!(%game_id, reason = %rejection, "move rejected");
                        MoveResponse::rejected(rejection.to_string())
                    }
                    Err(e) => return Err(e),
                };
                ServerMessage::MoveResult { game_id, result }
            }
            ClientMessage::RequestLegalMoves { game_id, from } => {
                let moves = registry.legal_moves(game_id, me()?, from).await?;
                ServerMessage::LegalMoves {
                    game_id,
                    from,
                    normal: moves.normal,
                    captures: moves.captures,
                }
            }
            ClientMessage::Resign { game_id } => {
                let outcome = registry.resign(game_id, me()?).await?;
                ServerMessage::Resigned {
                    game_id,
                    winner: outcome.winner,
                }
            }
            ClientMessage::RequestPosition { game_id } => self.position(game_id).await?,
            ClientMessage::Disconnect { game_id } => {
                registry
                    .set_participant_online(game_id, me()?, false)
                    .await?;
                ServerMessage::Disconnected { game_id }
            }
        };
        Ok(reply)
    }

    async fn position(&self, game_id: GameId) -> SessionResult<ServerMessage> {
        Ok(ServerMessage::Position {
            game_id,
            fen: self.registry.fen(game_id).await?,
            pgn: self.registry.pgn(game_id).await?,
            clocks: self.registry.clocks(game_id).await?,
        })
    }
}
