//! Game rules for tic-tac-toe.
//!
//! Pure functions evaluating a board. Both the session state machine and
//! the bot go through [`evaluate`], so there is exactly one notion of a
//! finished game.

pub mod draw;
pub mod win;

pub use draw::{is_draw, is_full};
pub use win::{LINES, check_winner};

use crate::{Board, Outcome};
use tracing::instrument;

/// Evaluates the board: a completed line wins, a full board draws.
#[instrument(skip(board))]
pub fn evaluate(board: &Board) -> Outcome {
    if let Some(mark) = check_winner(board) {
        return Outcome::Win(mark);
    }
    if is_full(board) {
        return Outcome::Draw;
    }
    Outcome::InProgress
}
