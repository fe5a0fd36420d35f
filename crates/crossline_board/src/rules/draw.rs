//! Draw detection logic for tic-tac-toe.

use super::win::check_winner;
use crate::Board;
use tracing::instrument;

/// Checks if the board is full (all cells occupied).
#[instrument(skip(board))]
pub fn is_full(board: &Board) -> bool {
    board.cells().iter().all(|c| !c.is_empty())
}

/// A full board with no winner.
#[instrument(skip(board))]
pub fn is_draw(board: &Board) -> bool {
    is_full(board) && check_winner(board).is_none()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Mark, Position};

    #[test]
    fn test_empty_board_not_full() {
        assert!(!is_full(&Board::new()));
    }

    #[test]
    fn test_draw_detection() {
        // X O X / O X X / O X O
        let board = Board::from_symbols([
            ["X", "O", "X"],
            ["O", "X", "X"],
            ["O", "X", "O"],
        ])
        .unwrap();
        assert!(is_draw(&board));
    }

    #[test]
    fn test_full_board_with_winner_is_not_draw() {
        let mut board = Board::from_symbols([
            ["X", "O", "X"],
            ["O", "X", "O"],
            ["O", "X", ""],
        ])
        .unwrap();
        board.place_at(Position::BottomRight, Mark::X).unwrap();
        assert!(is_full(&board));
        assert!(!is_draw(&board));
    }
}
