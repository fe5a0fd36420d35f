//! Scripted local opponent.
//!
//! A greedy one-ply policy: win if possible, otherwise block, otherwise
//! prefer the center, then a random corner, then the first free cell.
//! It is beatable, and that is fine.

use crate::{Board, Mark, Outcome, Position};
use rand::Rng;
use rand::seq::SliceRandom;
use tracing::{debug, instrument};

/// The bot playing one mark.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bot {
    mark: Mark,
}

impl Bot {
    /// Creates a bot playing `mark`.
    pub fn new(mark: Mark) -> Self {
        Self { mark }
    }

    /// The bot's mark.
    pub fn mark(&self) -> Mark {
        self.mark
    }

    /// Picks a move for the current board.
    ///
    /// Returns `None` when the game is already over or no cell is free.
    /// `rng` is only consulted when choosing between free corners.
    #[instrument(skip(self, board, rng), fields(mark = %self.mark))]
    pub fn choose_move<R: Rng + ?Sized>(&self, board: &Board, rng: &mut R) -> Option<Position> {
        if board.evaluate().is_terminal() {
            debug!("Board already decided, no move");
            return None;
        }

        if let Some(pos) = winning_cell(board, self.mark) {
            debug!(position = %pos, "Completing own line");
            return Some(pos);
        }

        if let Some(pos) = winning_cell(board, self.mark.opponent()) {
            debug!(position = %pos, "Blocking opponent line");
            return Some(pos);
        }

        if board.is_empty(Position::Center) {
            return Some(Position::Center);
        }

        let corners: Vec<Position> = Position::CORNERS
            .iter()
            .copied()
            .filter(|pos| board.is_empty(*pos))
            .collect();
        if let Some(pos) = corners.choose(rng) {
            debug!(position = %pos, "Taking a corner");
            return Some(*pos);
        }

        board.empty_positions().first().copied()
    }
}

/// First empty cell (row-major) where `mark` would complete a line.
fn winning_cell(board: &Board, mark: Mark) -> Option<Position> {
    board.empty_positions().into_iter().find(|pos| {
        let mut lookahead = board.clone();
        lookahead.place_at(*pos, mark).is_ok() && lookahead.evaluate() == Outcome::Win(mark)
    })
}
