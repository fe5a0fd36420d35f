//! Transition tests for the session state machine.

use crossline::protocol::{ClientMessage, QuickGameResponse, ServerMessage};
use crossline::session::{INVALID_MOVE_WARNING, PARSE_WARNING, SessionDescriptor};
use crossline::transport::http::quick_game_descriptor;
use crossline::{
    ChannelEvent, Effect, GameResult, Mode, Phase, SessionError, SessionEvent, SessionMachine,
    Timings, TurnOwner, UserIntent,
};
use crossline_board::{Cell, Mark, Position};
use serde_json::json;

const PLAYER: u64 = 7;
const OPPONENT: u64 = 8;
const GAME: u64 = 100;

fn machine() -> SessionMachine {
    SessionMachine::with_seed(Timings::default(), 11)
}

fn intent(intent: UserIntent) -> SessionEvent {
    SessionEvent::Intent(intent)
}

fn frame(value: serde_json::Value) -> SessionEvent {
    let msg = ServerMessage::decode(&value.to_string()).unwrap();
    SessionEvent::Channel(ChannelEvent::Message(msg))
}

fn game_start(role: &str) -> SessionEvent {
    frame(json!({
        "type": "game_start",
        "gameID": GAME,
        "role": role,
        "player1": PLAYER,
        "player2": OPPONENT,
        "opponentNickname": "Red Owl",
    }))
}

fn snapshot(board: [[&str; 3]; 3], turn: &str, status: &str) -> SessionEvent {
    frame(json!({ "type": "move", "board": board, "turn": turn, "status": status }))
}

fn sends(effects: &[Effect]) -> Vec<ClientMessage> {
    effects
        .iter()
        .filter_map(|e| match e {
            Effect::Send(msg) => Some(msg.clone()),
            _ => None,
        })
        .collect()
}

/// Descriptor the HTTP adapter builds from a `/quick-game` body.
fn quick_game(body: serde_json::Value) -> SessionDescriptor {
    let body: QuickGameResponse = serde_json::from_value(body).unwrap();
    quick_game_descriptor(body).unwrap()
}

fn started(descriptor: SessionDescriptor) -> (SessionMachine, Vec<Effect>) {
    let mut m = machine();
    m.handle(intent(UserIntent::StartOnline));
    let effects = m.handle(SessionEvent::SessionStarted {
        ticket: 1,
        descriptor,
    });
    (m, effects)
}

/// Online session that has requested a game and been queued.
fn queued() -> SessionMachine {
    let (m, _) = started(quick_game(json!({
        "status": "waiting",
        "playerID": PLAYER,
        "nickname": "Blue Fox",
    })));
    m
}

/// Online game in progress with the given local role.
fn playing(role: &str) -> SessionMachine {
    let mut m = queued();
    m.handle(game_start(role));
    m
}

#[test]
fn test_online_start_waits_for_game_start() {
    let mut m = machine();
    let effects = m.handle(intent(UserIntent::StartOnline));
    assert_eq!(
        effects,
        vec![Effect::RequestSession {
            mode: Mode::Online,
            ticket: 1
        }]
    );
    assert_eq!(m.phase(), Phase::AwaitingOpponent);

    let effects = m.handle(SessionEvent::SessionStarted {
        ticket: 1,
        descriptor: SessionDescriptor::new(PLAYER, None, None, None, None),
    });
    assert_eq!(
        effects,
        vec![Effect::OpenChannel {
            player_id: PLAYER,
            game_id: None
        }]
    );
    assert_eq!(m.phase(), Phase::AwaitingOpponent);
    assert_eq!(m.view().status, "Waiting for opponent...");
    assert!(!m.view().input_enabled);

    m.handle(game_start("X"));
    let view = m.view();
    assert_eq!(view.phase, Phase::Active);
    assert_eq!(view.local_mark, Some(Mark::X));
    assert_eq!(view.turn, Some(TurnOwner::Local));
    assert_eq!(view.status, "Your turn (X)");
    assert_eq!(view.opponent_nickname.as_deref(), Some("Red Owl"));
    assert!(view.input_enabled);
    assert!(!view.menu_visible);
}

#[test]
fn test_matched_without_game_id_waits_for_game_start() {
    let (mut m, _) = started(quick_game(json!({
        "status": "started",
        "playerID": PLAYER,
        "opponentID": OPPONENT,
        "isFirstPlayer": true,
    })));
    let view = m.view();
    assert_eq!(view.phase, Phase::AwaitingOpponent);
    assert_eq!(view.status, "Matched, waiting for game...");
    assert!(!view.input_enabled);
    assert!(m.handle(intent(UserIntent::LocalMove(Position::Center))).is_empty());

    m.handle(game_start("X"));
    assert!(m.view().input_enabled);
    let effects = m.handle(intent(UserIntent::LocalMove(Position::Center)));
    assert_eq!(sends(&effects), vec![ClientMessage::move_at(GAME, PLAYER, Position::Center)]);
}

#[test]
fn test_matched_first_player_with_game_id_can_move() {
    let (mut m, effects) = started(quick_game(json!({
        "status": "started",
        "playerID": PLAYER,
        "opponentID": OPPONENT,
        "gameID": GAME,
        "isFirstPlayer": true,
    })));
    assert_eq!(
        effects,
        vec![Effect::OpenChannel {
            player_id: PLAYER,
            game_id: Some(GAME)
        }]
    );
    let view = m.view();
    assert_eq!(view.phase, Phase::Active);
    assert_eq!(view.status, "Your turn (X)");
    assert!(view.input_enabled);

    let effects = m.handle(intent(UserIntent::LocalMove(Position::Center)));
    assert_eq!(sends(&effects), vec![ClientMessage::move_at(GAME, PLAYER, Position::Center)]);
}

#[test]
fn test_matched_second_player_with_game_id_waits_turn() {
    let (m, _) = started(quick_game(json!({
        "status": "started",
        "playerID": PLAYER,
        "opponentID": OPPONENT,
        "gameID": GAME,
        "isFirstPlayer": false,
    })));
    let view = m.view();
    assert_eq!(view.phase, Phase::Active);
    assert_eq!(view.local_mark, Some(Mark::O));
    assert_eq!(view.status, "Opponent's turn (X)");
    assert!(!view.input_enabled);
}

#[test]
fn test_missing_role_is_fatal() {
    let mut m = queued();
    let effects = m.handle(game_start(""));
    assert_eq!(effects, vec![Effect::CloseChannel]);
    assert_eq!(m.fatal(), Some(&SessionError::MissingRoleAssignment));

    let view = m.view();
    assert!(!view.input_enabled);
    assert!(view.menu_visible);
    assert!(!view.play_again_visible);
    assert_eq!(view.status, "Server did not assign a role");

    assert!(m.handle(intent(UserIntent::LocalMove(Position::Center))).is_empty());
    assert!(m.handle(intent(UserIntent::RequestRematch)).is_empty());

    // Channel already closed, so nothing left to close.
    assert!(m.handle(intent(UserIntent::ReturnToMenu)).is_empty());
    assert_eq!(m.phase(), Phase::Idle);
    assert!(m.fatal().is_none());
}

#[test]
fn test_local_move_waits_for_echo() {
    let mut m = playing("X");
    let effects = m.handle(intent(UserIntent::LocalMove(Position::MiddleRight)));
    assert_eq!(
        sends(&effects),
        vec![ClientMessage::Move {
            game_id: GAME,
            player_id: PLAYER,
            x: 1,
            y: 2
        }]
    );
    assert!(m.board().is_empty(Position::MiddleRight));
    assert!(m.pending().is_some());
    assert!(!m.view().input_enabled);

    // One outstanding move at a time.
    assert!(m.handle(intent(UserIntent::LocalMove(Position::Center))).is_empty());

    m.handle(snapshot([["", "", ""], ["", "", "X"], ["", "", ""]], "O", "active"));
    assert_eq!(m.board().cell(Position::MiddleRight), Cell::Marked(Mark::X));
    assert!(m.pending().is_none());
    assert_eq!(m.view().turn, Some(TurnOwner::Remote));

    m.handle(snapshot([["O", "", ""], ["", "", "X"], ["", "", ""]], "X", "active"));
    assert!(m.view().input_enabled);
}

#[test]
fn test_move_never_sent_out_of_turn() {
    let mut waiting = queued();
    let mut second = playing("O");
    let mut occupied = playing("X");
    occupied.handle(snapshot([["", "", ""], ["", "O", ""], ["", "", ""]], "X", "active"));

    for pos in Position::ALL {
        assert!(waiting.handle(intent(UserIntent::LocalMove(pos))).is_empty());
        assert!(second.handle(intent(UserIntent::LocalMove(pos))).is_empty());
    }
    assert!(occupied.handle(intent(UserIntent::LocalMove(Position::Center))).is_empty());
    assert!(machine().handle(intent(UserIntent::LocalMove(Position::Center))).is_empty());
}

#[test]
fn test_invalid_move_restores_turn() {
    let mut m = playing("X");
    m.handle(intent(UserIntent::LocalMove(Position::TopLeft)));
    m.handle(frame(json!({ "type": "invalid_move", "message": "cell taken" })));

    let view = m.view();
    assert!(m.pending().is_none());
    assert_eq!(view.turn, Some(TurnOwner::Local));
    assert_eq!(view.warning.as_deref(), Some(INVALID_MOVE_WARNING));
    assert!(view.input_enabled);
    assert!(m.board().is_empty(Position::TopLeft));
}

#[test]
fn test_error_frame_releases_pending_move() {
    let mut m = playing("X");
    m.handle(intent(UserIntent::LocalMove(Position::TopLeft)));
    m.handle(frame(json!({ "type": "error", "message": "Invalid move coordinates or game ID" })));
    assert!(m.pending().is_none());
    assert!(m.view().input_enabled);
    assert_eq!(
        m.view().warning.as_deref(),
        Some("Error: Invalid move coordinates or game ID")
    );
}

#[test]
fn test_finished_snapshot_with_full_board_is_draw() {
    let mut m = playing("O");
    let effects = m.handle(snapshot(
        [["X", "O", "X"], ["X", "O", "O"], ["O", "X", "X"]],
        "O",
        "finished",
    ));
    assert!(effects.is_empty());

    let view = m.view();
    assert_eq!(view.phase, Phase::Finished);
    assert_eq!(view.result, Some(GameResult::Draw));
    assert_eq!(view.status, "Draw!");
    assert!(view.play_again_visible);
    assert!(view.menu_visible);
    assert!(!view.input_enabled);
}

#[test]
fn test_result_is_derived_from_board() {
    let line = [["X", "X", "X"], ["O", "O", ""], ["", "", ""]];

    let mut winner = playing("X");
    winner.handle(snapshot(line, "O", "finished"));
    assert_eq!(winner.view().status, "You win!");

    let mut loser = playing("O");
    loser.handle(snapshot(line, "O", "finished"));
    assert_eq!(loser.view().status, "Opponent wins!");
}

#[test]
fn test_opponent_left_ends_game() {
    let mut m = playing("X");
    m.handle(frame(json!({ "type": "opponent_left" })));
    let view = m.view();
    assert_eq!(view.phase, Phase::Finished);
    assert_eq!(view.result, Some(GameResult::OpponentLeft));
    assert_eq!(view.status, "Opponent disconnected");
    assert!(!view.play_again_visible);
}

#[test]
fn test_channel_loss_mid_game_is_disconnect() {
    let mut m = playing("X");
    m.handle(intent(UserIntent::LocalMove(Position::Center)));
    let effects = m.handle(SessionEvent::Channel(ChannelEvent::Closed));
    assert!(!effects.contains(&Effect::CloseChannel));

    let view = m.view();
    assert_eq!(view.phase, Phase::Finished);
    assert_eq!(view.result, Some(GameResult::Disconnected));
    assert!(!view.input_enabled);
    assert!(!view.play_again_visible);
    assert!(m.pending().is_none());
}

#[test]
fn test_channel_loss_while_waiting_returns_to_menu() {
    let mut m = queued();
    m.handle(SessionEvent::Channel(ChannelEvent::Closed));
    assert_eq!(m.phase(), Phase::Idle);
    assert!(m.session().is_none());
    assert_eq!(m.view().status, "Disconnected from server");
}

#[test]
fn test_malformed_frame_only_warns() {
    let mut m = playing("X");
    m.handle(SessionEvent::Channel(ChannelEvent::Malformed("eof".into())));
    let view = m.view();
    assert_eq!(view.phase, Phase::Active);
    assert_eq!(view.warning.as_deref(), Some(PARSE_WARNING));
    assert!(view.input_enabled);
}

#[test]
fn test_unknown_frame_ignored() {
    let mut m = playing("X");
    let before = m.view();
    assert!(m.handle(frame(json!({ "type": "chat", "text": "hi" }))).is_empty());
    assert_eq!(m.view(), before);
}

#[test]
fn test_stale_session_response_dropped() {
    let mut m = machine();
    m.handle(intent(UserIntent::StartOnline));
    m.handle(intent(UserIntent::ReturnToMenu));
    let effects = m.handle(SessionEvent::SessionStarted {
        ticket: 1,
        descriptor: SessionDescriptor::new(PLAYER, None, None, None, None),
    });
    assert!(effects.is_empty());
    assert_eq!(m.phase(), Phase::Idle);
    assert!(m.session().is_none());
}

#[test]
fn test_failed_start_reports_and_stays_idle() {
    let mut m = machine();
    m.handle(intent(UserIntent::StartOffline));
    m.handle(SessionEvent::SessionFailed {
        ticket: 1,
        error: SessionError::ServiceUnavailable("connection refused".into()),
    });
    let view = m.view();
    assert_eq!(view.phase, Phase::Idle);
    assert_eq!(view.status, "Failed to start game. Please try again.");
    assert!(view.menu_visible);

    // A fresh attempt is allowed.
    let effects = m.handle(intent(UserIntent::StartOffline));
    assert_eq!(
        effects,
        vec![Effect::RequestSession {
            mode: Mode::Offline,
            ticket: 2
        }]
    );
}

#[test]
fn test_role_preference_held_until_game_id_known() {
    let mut m = machine();
    m.handle(intent(UserIntent::StartOnline));
    assert!(m.handle(intent(UserIntent::SelectRole(Mark::O))).is_empty());

    let effects = m.handle(SessionEvent::SessionStarted {
        ticket: 1,
        descriptor: quick_game(json!({
            "status": "waiting",
            "playerID": PLAYER,
            "gameID": GAME,
        })),
    });
    assert_eq!(
        effects,
        vec![
            Effect::OpenChannel {
                player_id: PLAYER,
                game_id: Some(GAME)
            },
            Effect::Send(ClientMessage::SelectRole {
                game_id: GAME,
                player_id: PLAYER,
                role: Mark::O
            }),
        ]
    );
    assert!(m.handle(intent(UserIntent::SelectRole(Mark::X))).is_empty());
}

#[test]
fn test_role_preference_sent_while_awaiting_rematch() {
    let mut m = playing("X");
    m.handle(snapshot(
        [["X", "X", "X"], ["O", "O", ""], ["", "", ""]],
        "O",
        "finished",
    ));
    m.handle(intent(UserIntent::RequestRematch));
    assert_eq!(m.phase(), Phase::AwaitingRematch);

    let effects = m.handle(intent(UserIntent::SelectRole(Mark::O)));
    assert_eq!(
        sends(&effects),
        vec![ClientMessage::SelectRole {
            game_id: GAME,
            player_id: PLAYER,
            role: Mark::O
        }]
    );
    assert!(m.handle(intent(UserIntent::SelectRole(Mark::X))).is_empty());
}

#[test]
fn test_role_preference_ignored_mid_game() {
    let mut m = playing("X");
    assert!(m.handle(intent(UserIntent::SelectRole(Mark::O))).is_empty());
}

#[test]
fn test_return_to_menu_closes_channel_once() {
    let mut m = playing("X");
    assert_eq!(m.handle(intent(UserIntent::ReturnToMenu)), vec![Effect::CloseChannel]);
    assert!(m.handle(intent(UserIntent::ReturnToMenu)).is_empty());
    let view = m.view();
    assert_eq!(view.phase, Phase::Idle);
    assert!(view.cells.iter().all(|c| *c == Cell::Empty));
}
