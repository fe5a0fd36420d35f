//! Keyboard handling.

use crate::session::{Phase, SessionView, UserIntent};
use crossline_board::{Mark, Position};
use crossterm::event::KeyCode;

/// What a key press means in the current view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    /// Forward to the session driver.
    Intent(UserIntent),
    /// Move the board cursor.
    Cursor(Position),
    /// Leave the program.
    Quit,
    /// Nothing to do.
    Ignore,
}

/// Moves cursor based on arrow keys.
pub fn move_cursor(cursor: Position, key: KeyCode) -> Position {
    let (row, col) = (cursor.row(), cursor.col());
    let target = match key {
        KeyCode::Left => Position::from_row_col(row, col.wrapping_sub(1)),
        KeyCode::Right => Position::from_row_col(row, col + 1),
        KeyCode::Up => Position::from_row_col(row.wrapping_sub(1), col),
        KeyCode::Down => Position::from_row_col(row + 1, col),
        _ => None,
    };
    target.unwrap_or(cursor)
}

/// Maps a key press to an action for the current view.
pub fn map_key(key: KeyCode, view: &SessionView, cursor: Position) -> KeyAction {
    match key {
        KeyCode::Char('q') => return KeyAction::Quit,
        KeyCode::Esc | KeyCode::Char('m') if view.phase != Phase::Idle => {
            return KeyAction::Intent(UserIntent::ReturnToMenu);
        }
        _ => {}
    }

    match view.phase {
        Phase::Idle => menu_key(key),
        Phase::AwaitingOpponent => match key {
            KeyCode::Char('x') => KeyAction::Intent(UserIntent::SelectRole(Mark::X)),
            KeyCode::Char('o') => KeyAction::Intent(UserIntent::SelectRole(Mark::O)),
            _ => KeyAction::Ignore,
        },
        Phase::Active => match key {
            KeyCode::Left | KeyCode::Right | KeyCode::Up | KeyCode::Down => {
                KeyAction::Cursor(move_cursor(cursor, key))
            }
            KeyCode::Enter | KeyCode::Char(' ') => KeyAction::Intent(UserIntent::LocalMove(cursor)),
            KeyCode::Char(c) => match Position::from_digit(c) {
                Some(pos) => KeyAction::Intent(UserIntent::LocalMove(pos)),
                None => KeyAction::Ignore,
            },
            _ => KeyAction::Ignore,
        },
        Phase::Finished => match key {
            KeyCode::Char('r') if view.play_again_visible => {
                KeyAction::Intent(UserIntent::RequestRematch)
            }
            _ => menu_key(key),
        },
        Phase::AwaitingRematch => match key {
            KeyCode::Char('y') if view.rematch_prompt => {
                KeyAction::Intent(UserIntent::AcceptRematch)
            }
            KeyCode::Char('n') => KeyAction::Intent(UserIntent::DeclineRematch),
            KeyCode::Char('x') => KeyAction::Intent(UserIntent::SelectRole(Mark::X)),
            KeyCode::Char('o') => KeyAction::Intent(UserIntent::SelectRole(Mark::O)),
            _ => KeyAction::Ignore,
        },
    }
}

fn menu_key(key: KeyCode) -> KeyAction {
    match key {
        KeyCode::Char('o') => KeyAction::Intent(UserIntent::StartOnline),
        KeyCode::Char('f') => KeyAction::Intent(UserIntent::StartOffline),
        _ => KeyAction::Ignore,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_stops_at_edges() {
        assert_eq!(move_cursor(Position::TopLeft, KeyCode::Left), Position::TopLeft);
        assert_eq!(move_cursor(Position::TopLeft, KeyCode::Up), Position::TopLeft);
        assert_eq!(move_cursor(Position::TopLeft, KeyCode::Right), Position::TopCenter);
        assert_eq!(move_cursor(Position::Center, KeyCode::Down), Position::BottomCenter);
        assert_eq!(move_cursor(Position::BottomRight, KeyCode::Down), Position::BottomRight);
    }

    #[test]
    fn test_digits_play_in_active_game() {
        let view = SessionView {
            phase: Phase::Active,
            ..SessionView::default()
        };
        assert_eq!(
            map_key(KeyCode::Char('5'), &view, Position::TopLeft),
            KeyAction::Intent(UserIntent::LocalMove(Position::Center))
        );
        assert_eq!(
            map_key(KeyCode::Enter, &view, Position::TopLeft),
            KeyAction::Intent(UserIntent::LocalMove(Position::TopLeft))
        );
    }

    #[test]
    fn test_menu_keys() {
        let view = SessionView::default();
        assert_eq!(
            map_key(KeyCode::Char('f'), &view, Position::Center),
            KeyAction::Intent(UserIntent::StartOffline)
        );
        assert_eq!(map_key(KeyCode::Esc, &view, Position::Center), KeyAction::Ignore);
        assert_eq!(map_key(KeyCode::Char('q'), &view, Position::Center), KeyAction::Quit);
    }

    #[test]
    fn test_rematch_keys_respect_visibility() {
        let finished = SessionView {
            phase: Phase::Finished,
            ..SessionView::default()
        };
        assert_eq!(map_key(KeyCode::Char('r'), &finished, Position::Center), KeyAction::Ignore);

        let prompted = SessionView {
            phase: Phase::AwaitingRematch,
            rematch_prompt: true,
            ..SessionView::default()
        };
        assert_eq!(
            map_key(KeyCode::Char('y'), &prompted, Position::Center),
            KeyAction::Intent(UserIntent::AcceptRematch)
        );
        assert_eq!(
            map_key(KeyCode::Char('o'), &prompted, Position::Center),
            KeyAction::Intent(UserIntent::SelectRole(Mark::O))
        );
    }
}
