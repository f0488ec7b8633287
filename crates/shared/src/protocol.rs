use chess_rules::{
    Color, EndReason, GameId, GameStatus, MoveOutcome, PieceKind, Player, PlayerId, Position,
    SerializedBoard,
};
use serde::{Deserialize, Serialize};

/// Requests a client can send
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    // Identity
    Register {
        name: String,
    },

    // Lobby
    CreateGame,
    JoinGame {
        game_id: GameId,
    },

    // In-game
    MakeMove {
        game_id: GameId,
        from: Position,
        to: Position,
        #[serde(default)]
        promotion: Option<PieceKind>,
    },
    RequestLegalMoves {
        game_id: GameId,
        from: Position,
    },
    Resign {
        game_id: GameId,
    },
    RequestPosition {
        game_id: GameId,
    },

    // Connection liveness, reported by the transport
    Disconnect {
        game_id: GameId,
    },
    Reconnect {
        game_id: GameId,
    },
}

impl ClientMessage {
    /// The game this request targets, if any
    pub fn game_id(&self) -> Option<GameId> {
        match self {
            ClientMessage::Register { .. } | ClientMessage::CreateGame => None,
            ClientMessage::JoinGame { game_id }
            | ClientMessage::MakeMove { game_id, .. }
            | ClientMessage::RequestLegalMoves { game_id, .. }
            | ClientMessage::Resign { game_id }
            | ClientMessage::RequestPosition { game_id }
            | ClientMessage::Disconnect { game_id }
            | ClientMessage::Reconnect { game_id } => Some(*game_id),
        }
    }
}

/// A client message with the sender's identity attached
///
/// `player_id` is absent only for [`ClientMessage::Register`].
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ClientEnvelope {
    #[serde(default)]
    pub player_id: Option<PlayerId>,
    #[serde(flatten)]
    pub message: ClientMessage,
}

/// Remaining time on both clocks
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ClockSnapshot {
    pub white_ms: u64,
    pub black_ms: u64,
    /// Colour whose clock is running, `None` before the first move and while paused
    pub running: Option<Color>,
}

/// Structured result of a move request, broadcast verbatim to both players
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct MoveResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub board: Option<SerializedBoard>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub turn: Option<Color>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub status: Option<GameStatus>,
    #[serde(default)]
    pub winner: Option<Color>,
    #[serde(default)]
    pub is_check: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub san: Option<String>,
}

impl MoveResponse {
    /// Failure result carrying only the reason
    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            board: None,
            turn: None,
            status: None,
            winner: None,
            is_check: false,
            san: None,
        }
    }
}

impl From<&MoveOutcome> for MoveResponse {
    fn from(outcome: &MoveOutcome) -> Self {
        Self {
            success: true,
            message: None,
            board: Some(outcome.board),
            turn: Some(outcome.turn),
            status: Some(outcome.status),
            winner: outcome.winner(),
            is_check: outcome.is_check,
            san: Some(outcome.record.san.clone()),
        }
    }
}

/// Error categories a transport maps to distinct responses
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    GameNotFound,
    PlayerNotFound,
    GameFull,
    NotParticipant,
    MoveRejected,
    Corrupted,
    BadRequest,
}

/// Direct replies to the requesting client
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Registered {
        player: Player,
    },
    GameCreated {
        game_id: GameId,
    },
    Joined {
        game_id: GameId,
        color: Color,
        /// The player was already seated and has been marked online again
        reconnected: bool,
    },
    MoveResult {
        game_id: GameId,
        result: MoveResponse,
    },
    LegalMoves {
        game_id: GameId,
        from: Position,
        normal: Vec<Position>,
        captures: Vec<Position>,
    },
    Position {
        game_id: GameId,
        fen: String,
        pgn: String,
        clocks: ClockSnapshot,
    },
    Resigned {
        game_id: GameId,
        winner: Option<Color>,
    },
    /// The sender was marked offline in this game
    Disconnected {
        game_id: GameId,
    },
    Error {
        code: ErrorCode,
        message: String,
    },
}

/// Events fanned out to everyone watching a game
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    PlayerJoined {
        game_id: GameId,
        player_id: PlayerId,
        name: String,
        color: Color,
    },
    GameStarted {
        game_id: GameId,
        board: SerializedBoard,
        turn: Color,
    },
    BoardUpdate {
        game_id: GameId,
        result: MoveResponse,
        clocks: ClockSnapshot,
    },
    GamePaused {
        game_id: GameId,
        player_id: PlayerId,
        grace_secs: u64,
        message: String,
    },
    GameResumed {
        game_id: GameId,
        status: GameStatus,
    },
    GameOver {
        game_id: GameId,
        status: GameStatus,
        winner: Option<Color>,
        reason: EndReason,
        message: String,
    },
}

impl SessionEvent {
    pub fn game_id(&self) -> GameId {
        match self {
            SessionEvent::PlayerJoined { game_id, .. }
            | SessionEvent::GameStarted { game_id, .. }
            | SessionEvent::BoardUpdate { game_id, .. }
            | SessionEvent::GamePaused { game_id, .. }
            | SessionEvent::GameResumed { game_id, .. }
            | SessionEvent::GameOver { game_id, .. } => *game_id,
        }
    }
}

/// One line of server output: a reply to the requester or a broadcast event
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum ServerFrame {
    Reply(ServerMessage),
    Event(SessionEvent),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_make_move_envelope_from_json() {
        let player_id = PlayerId::new();
        let game_id = GameId::new();
        let raw = json!({
            "player_id": player_id,
            "type": "make_move",
            "game_id": game_id,
            "from": {"row": 6, "col": 4},
            "to": {"row": 4, "col": 4}
        });

        let envelope: ClientEnvelope = serde_json::from_value(raw).expect("Should deserialize");

        assert_eq!(envelope.player_id, Some(player_id));
        assert_eq!(
            envelope.message,
            ClientMessage::MakeMove {
                game_id,
                from: Position::new(6, 4),
                to: Position::new(4, 4),
                promotion: None,
            }
        );
    }

    #[test]
    fn test_promotion_uses_lowercase_piece_names() {
        let raw = json!({
            "type": "make_move",
            "game_id": GameId::new(),
            "from": {"row": 1, "col": 0},
            "to": {"row": 0, "col": 0},
            "promotion": "knight"
        });
        let message: ClientMessage = serde_json::from_value(raw).expect("Should deserialize");

        match message {
            ClientMessage::MakeMove { promotion, .. } => {
                assert_eq!(promotion, Some(PieceKind::Knight))
            }
            _ => panic!("Wrong message type"),
        }
    }

    #[test]
    fn test_register_needs_no_player_id() {
        let envelope: ClientEnvelope =
            serde_json::from_str(r#"{"type":"register","name":"alice"}"#).expect("Should deserialize");
        assert_eq!(envelope.player_id, None);
        assert_eq!(
            envelope.message,
            ClientMessage::Register {
                name: "alice".to_string()
            }
        );
    }

    #[test]
    fn test_rejected_move_response_shape() {
        let value = serde_json::to_value(MoveResponse::rejected("Not your turn")).unwrap();
        assert_eq!(value["success"], false);
        assert_eq!(value["message"], "Not your turn");
        assert!(value.get("board").is_none());
        assert!(value["winner"].is_null());
    }

    #[test]
    fn test_events_and_frames_are_tagged() {
        let game_id = GameId::new();
        let frame = ServerFrame::Event(SessionEvent::GameResumed {
            game_id,
            status: GameStatus::Playing,
        });
        let value = serde_json::to_value(&frame).unwrap();

        assert_eq!(value["event"]["event"], "game_resumed");
        assert_eq!(value["event"]["status"], "playing");

        let decoded: ServerFrame = serde_json::from_value(value).unwrap();
        assert_eq!(decoded, frame);
        match decoded {
            ServerFrame::Event(event) => assert_eq!(event.game_id(), game_id),
            _ => panic!("Wrong frame type"),
        }
    }

    #[test]
    fn test_error_reply_uses_snake_case_code() {
        let reply = ServerMessage::Error {
            code: ErrorCode::GameFull,
            message: "Game is full".to_string(),
        };
        let value = serde_json::to_value(&reply).unwrap();
        assert_eq!(value["type"], "error");
        assert_eq!(value["code"], "game_full");
    }
}
