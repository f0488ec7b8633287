//! Game Flow Integration Tests
//!
//! Full games played through [`Game::apply_move`]:
//! - Checkmate, stalemate and draw detection
//! - Rollback of rejected moves
//! - En passant window, promotion and castling through the orchestrator
//! - FEN and PGN output

use chess_rules::{
    Color, EndReason, Game, GamePlayer, GameStatus, InvariantViolation, MoveError,
    MoveOutcome, MoveRejection, MoveResult, PieceKind, Player, Position,
};

fn sq(name: &str) -> Position {
    name.parse().unwrap()
}

/// A game with both seats filled
struct Table {
    game: Game,
    white: GamePlayer,
    black: GamePlayer,
}

impl Table {
    fn new(mut game: Game) -> Self {
        let white = game.add_participant(Player::new("Alice")).unwrap();
        let black = game.add_participant(Player::new("Bob")).unwrap();
        Self { game, white, black }
    }

    fn from_fen(fen: &str) -> Self {
        Self::new(Game::from_fen(fen).unwrap())
    }

    fn side_to_move(&self) -> GamePlayer {
        match self.game.turn() {
            Color::White => self.white.clone(),
            Color::Black => self.black.clone(),
        }
    }

    fn try_play(&mut self, from: &str, to: &str) -> MoveResult<MoveOutcome> {
        let mover = self.side_to_move();
        self.game.apply_move(&mover, sq(from), sq(to), None)
    }

    fn play(&mut self, from: &str, to: &str) -> MoveOutcome {
        self.try_play(from, to)
            .unwrap_or_else(|e| panic!("{from}-{to} should be legal: {e}"))
    }

    fn promote(&mut self, from: &str, to: &str, kind: PieceKind) -> MoveResult<MoveOutcome> {
        let mover = self.side_to_move();
        self.game.apply_move(&mover, sq(from), sq(to), Some(kind))
    }
}

fn rejection(result: MoveResult<MoveOutcome>) -> MoveRejection {
    match result {
        Err(MoveError::Rejected(r)) => r,
        other => panic!("expected a rejection, got {other:?}"),
    }
}

// ============================================================================
// Game End Tests
// ============================================================================

#[test]
fn test_fools_mate() {
    let mut table = Table::new(Game::new());

    table.play("f2", "f3");
    table.play("e7", "e5");
    table.play("g2", "g4");
    let mate = table.play("d8", "h4");

    assert_eq!(mate.san(), "Qh4#");
    assert_eq!(mate.status, GameStatus::Checkmate);
    assert_eq!(mate.winner(), Some(Color::Black));
    assert!(mate.is_check);
    assert!(mate.record.is_checkmate);
    assert_eq!(table.game.status(), GameStatus::Checkmate);

    assert_eq!(
        rejection(table.try_play("e2", "e4")),
        MoveRejection::GameNotActive(GameStatus::Checkmate)
    );
    assert!(table.game.pgn().ends_with("1. f3 e5 2. g4 Qh4# 0-1"));
}

#[test]
fn test_stalemate_is_a_draw() {
    let mut table = Table::from_fen("7k/5K2/8/6Q1/8/8/8/8 w - - 0 1");

    let result = table.play("g5", "g6");

    assert_eq!(result.status, GameStatus::Draw);
    assert!(!result.is_check);
    assert_eq!(result.outcome.map(|o| o.reason), Some(EndReason::Stalemate));
    assert_eq!(result.winner(), None);
    assert_eq!(table.game.pgn_result(), "1/2-1/2");
}

#[test]
fn test_fifty_move_rule_draws_automatically() {
    let mut table = Table::from_fen("4k3/8/8/8/8/8/8/4K2R w - - 99 60");

    let result = table.play("h1", "h2");

    assert_eq!(table.game.halfmove_clock(), 100);
    assert_eq!(result.status, GameStatus::Draw);
    assert_eq!(
        result.outcome.map(|o| o.reason),
        Some(EndReason::FiftyMoveRule)
    );
}

#[test]
fn test_threefold_repetition_draws() {
    let mut table = Table::new(Game::new());
    let shuffle = [("g1", "f3"), ("g8", "f6"), ("f3", "g1"), ("f6", "g8")];

    for (from, to) in shuffle {
        table.play(from, to);
    }
    assert_eq!(table.game.status(), GameStatus::Playing, "Start position seen twice");

    for (from, to) in &shuffle[..3] {
        table.play(from, to);
    }
    let last = table.play("f6", "g8");

    assert_eq!(last.status, GameStatus::Draw);
    assert_eq!(
        last.outcome.map(|o| o.reason),
        Some(EndReason::ThreefoldRepetition)
    );
}

// ============================================================================
// Rollback Tests
// ============================================================================

#[test]
fn test_self_check_rolls_back_everything() {
    let mut table = Table::from_fen("4r2k/8/8/8/8/8/4N3/4K3 w - - 7 30");
    let board_before = table.game.board().clone();
    let fen_before = table.game.fen();

    assert_eq!(
        rejection(table.try_play("e2", "c3")),
        MoveRejection::LeavesKingInCheck
    );

    assert_eq!(table.game.board(), &board_before);
    assert_eq!(table.game.fen(), fen_before);
    assert_eq!(table.game.turn(), Color::White);
    assert!(table.game.history().is_empty());
}

#[test]
fn test_illegal_move_is_distinct_from_self_check() {
    let mut table = Table::new(Game::new());
    table.play("e2", "e4");
    let board_before = table.game.board().clone();
    let fen_before = table.game.fen();

    assert_eq!(
        rejection(table.try_play("b8", "b6")),
        MoveRejection::IllegalMove {
            from: sq("b8"),
            to: sq("b6")
        }
    );
    assert_eq!(table.game.board(), &board_before);
    assert_eq!(table.game.fen(), fen_before);
    assert_eq!(table.game.en_passant(), Some(sq("e3")));
}

#[test]
fn test_off_board_squares_are_rejected() {
    // Debug output formats the rejected squares, so it must cope with any coordinates
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let mut table = Table::new(Game::new());
    let fen_before = table.game.fen();
    let white = table.white.clone();

    for (from, to, bad) in [
        (sq("e2"), Position::new(8, 0), Position::new(8, 0)),
        (sq("e2"), Position::new(200, 200), Position::new(200, 200)),
        (Position::new(255, 4), sq("e4"), Position::new(255, 4)),
    ] {
        let result = table.game.apply_move(&white, from, to, None);
        assert_eq!(rejection(result), MoveRejection::OutOfBounds(bad));
    }

    assert_eq!(table.game.fen(), fen_before);
    assert_eq!(table.game.turn(), Color::White);
    assert!(table.game.history().is_empty());
    assert!(table.game.legal_moves(Position::new(200, 200)).unwrap().normal.is_empty());
}

#[test]
fn test_missing_king_reports_corruption() {
    let mut table = Table::from_fen("8/8/8/8/8/8/4P3/4K3 w - - 0 1");

    assert_eq!(
        table.try_play("e2", "e4"),
        Err(MoveError::Corrupted(InvariantViolation::KingMissing(
            Color::Black
        )))
    );
}

// ============================================================================
// Special Move Tests
// ============================================================================

#[test]
fn test_en_passant_on_the_next_move() {
    let mut table = Table::new(Game::new());
    table.play("e2", "e4");
    table.play("a7", "a6");
    table.play("e4", "e5");
    table.play("d7", "d5");
    assert_eq!(table.game.en_passant(), Some(sq("d6")));

    let capture = table.play("e5", "d6");

    assert_eq!(capture.san(), "exd6");
    assert!(capture.record.is_en_passant);
    assert_eq!(capture.record.captured, Some(PieceKind::Pawn));
    assert!(table.game.board().is_empty(sq("d5")));
    assert_eq!(table.game.en_passant(), None);
}

#[test]
fn test_en_passant_expires_after_one_move() {
    let mut table = Table::new(Game::new());
    table.play("e2", "e4");
    table.play("a7", "a6");
    table.play("e4", "e5");
    table.play("d7", "d5");
    table.play("h2", "h3");
    assert_eq!(table.game.en_passant(), None, "Any other move clears the target");
    table.play("h7", "h6");

    assert_eq!(
        rejection(table.try_play("e5", "d6")),
        MoveRejection::IllegalMove {
            from: sq("e5"),
            to: sq("d6")
        }
    );
}

#[test]
fn test_promotion_through_game() {
    let mut table = Table::from_fen("8/P6k/8/8/8/8/8/K7 w - - 0 1");

    assert_eq!(
        rejection(table.try_play("a7", "a8")),
        MoveRejection::IllegalMove {
            from: sq("a7"),
            to: sq("a8")
        }
    );
    assert_eq!(
        rejection(table.promote("a7", "a8", PieceKind::King)),
        MoveRejection::InvalidPromotion(PieceKind::King)
    );

    let promoted = table.promote("a7", "a8", PieceKind::Queen).unwrap();
    assert_eq!(promoted.san(), "a8=Q");
    assert_eq!(promoted.record.promotion, Some(PieceKind::Queen));

    let board = table.game.board();
    assert!(board.is_empty(sq("a7")));
    let queen = board.get(sq("a8")).unwrap();
    assert_eq!(queen.kind, PieceKind::Queen);
    assert_eq!(queen.color, Color::White);
}

#[test]
fn test_castling_through_game_updates_rights() {
    let mut table = Table::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1");

    let short = table.play("e1", "g1");
    assert_eq!(short.san(), "O-O");
    assert!(short.record.is_castling);
    assert_eq!(
        table.game.board().get(sq("f1")).map(|p| p.kind),
        Some(PieceKind::Rook)
    );
    assert!(table.game.fen().contains(" b kq - 1 1"));

    let long = table.play("e8", "c8");
    assert_eq!(long.san(), "O-O-O");
    assert_eq!(
        table.game.board().get(sq("d8")).map(|p| p.kind),
        Some(PieceKind::Rook)
    );
    assert!(table.game.fen().contains(" w - - 2 2"));
}

#[test]
fn test_disambiguated_san() {
    let mut table = Table::from_fen("4k3/8/8/8/8/5N2/8/1N2K3 w - - 0 1");
    assert_eq!(table.play("b1", "d2").san(), "Nbd2");
}

// ============================================================================
// Notation Tests
// ============================================================================

#[test]
fn test_fen_tracks_counters_and_en_passant() {
    let mut table = Table::new(Game::new());
    table.play("e2", "e4");
    assert_eq!(
        table.game.fen(),
        "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1"
    );

    table.play("g8", "f6");
    assert_eq!(
        table.game.fen(),
        "rnbqkb1r/pppppppp/5n2/8/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 1 2"
    );
}

#[test]
fn test_pgn_uses_player_names_and_ongoing_result() {
    let mut table = Table::new(Game::new());
    table.play("e2", "e4");
    table.play("e7", "e5");

    let pgn = table.game.pgn();
    assert!(pgn.contains("[White \"Alice\"]"));
    assert!(pgn.contains("[Black \"Bob\"]"));
    assert!(pgn.contains("[Result \"*\"]"));
    assert!(pgn.ends_with("1. e4 e5 *"));
}
