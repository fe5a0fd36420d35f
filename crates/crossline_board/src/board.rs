//! The 3x3 board model.

use crate::{BoardError, Cell, Mark, Outcome, Position, rules};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// 3x3 tic-tac-toe board.
///
/// Holds cells only. Turn order is the caller's business, which keeps the
/// board usable for hypothetical placements during bot lookahead.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Board {
    /// Cells in row-major order (0-8).
    cells: [Cell; 9],
}

impl Board {
    /// Creates a new empty board.
    pub fn new() -> Self {
        Self {
            cells: [Cell::Empty; 9],
        }
    }

    /// Creates a board from cells in row-major order.
    pub fn from_cells(cells: [Cell; 9]) -> Self {
        Self { cells }
    }

    /// Builds a board from a nested grid of wire symbols (`"X"`, `"O"`, `""`).
    ///
    /// Returns `None` if any symbol is unrecognised.
    #[instrument]
    pub fn from_symbols(rows: [[&str; 3]; 3]) -> Option<Self> {
        let mut cells = [Cell::Empty; 9];
        for (r, row) in rows.iter().enumerate() {
            for (c, symbol) in row.iter().enumerate() {
                cells[r * 3 + c] = Cell::from_symbol(symbol)?;
            }
        }
        Some(Self { cells })
    }

    /// Returns the nested grid of wire symbols.
    pub fn to_symbols(&self) -> [[&'static str; 3]; 3] {
        let mut rows = [[""; 3]; 3];
        for pos in Position::ALL {
            rows[pos.row()][pos.col()] = self.cell(pos).symbol();
        }
        rows
    }

    /// Gets the cell at a position.
    pub fn cell(&self, pos: Position) -> Cell {
        self.cells[pos.to_index()]
    }

    /// Returns all cells in row-major order.
    pub fn cells(&self) -> &[Cell; 9] {
        &self.cells
    }

    /// Checks if the cell at a position is empty.
    pub fn is_empty(&self, pos: Position) -> bool {
        self.cell(pos).is_empty()
    }

    /// Places `mark` at `(row, col)`.
    ///
    /// Fails without touching the board if the coordinates are off the grid
    /// or the cell is taken.
    #[instrument(skip(self))]
    pub fn place(&mut self, row: usize, col: usize, mark: Mark) -> Result<(), BoardError> {
        let pos = Position::from_row_col(row, col).ok_or(BoardError::OutOfBounds { row, col })?;
        self.place_at(pos, mark)
    }

    /// Places `mark` at a named position.
    #[instrument(skip(self))]
    pub fn place_at(&mut self, pos: Position, mark: Mark) -> Result<(), BoardError> {
        if !self.is_empty(pos) {
            debug!(position = %pos, "Rejected placement on occupied cell");
            return Err(BoardError::CellOccupied(pos));
        }
        self.cells[pos.to_index()] = Cell::Marked(mark);
        Ok(())
    }

    /// Evaluates the board for a win or draw.
    pub fn evaluate(&self) -> Outcome {
        rules::evaluate(self)
    }

    /// Empty positions in row-major order.
    pub fn empty_positions(&self) -> Vec<Position> {
        Position::ALL
            .iter()
            .copied()
            .filter(|pos| self.is_empty(*pos))
            .collect()
    }

    /// Number of cells holding `mark`.
    pub fn count(&self, mark: Mark) -> usize {
        self.cells
            .iter()
            .filter(|c| c.mark() == Some(mark))
            .count()
    }

    /// Formats the board as a human-readable string, empty cells shown
    /// by their keypad digit.
    pub fn display(&self) -> String {
        let mut result = String::new();
        for pos in Position::ALL {
            let symbol = match self.cell(pos) {
                Cell::Empty => (pos.to_index() + 1).to_string(),
                Cell::Marked(mark) => mark.to_string(),
            };
            result.push_str(&symbol);
            if pos.col() < 2 {
                result.push('|');
            } else if pos.row() < 2 {
                result.push_str("\n-+-+-\n");
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_place_marks_cell() {
        let mut board = Board::new();
        board.place(1, 2, Mark::O).unwrap();
        assert_eq!(board.cell(Position::MiddleRight), Cell::Marked(Mark::O));
        assert_eq!(board.count(Mark::O), 1);
    }

    #[test]
    fn test_place_rejects_occupied_without_mutation() {
        let mut board = Board::new();
        board.place(0, 0, Mark::X).unwrap();
        let before = board.clone();

        let err = board.place(0, 0, Mark::O).unwrap_err();
        assert_eq!(err, BoardError::CellOccupied(Position::TopLeft));
        assert_eq!(board, before);
    }

    #[test]
    fn test_place_rejects_out_of_bounds() {
        let mut board = Board::new();
        assert_eq!(
            board.place(3, 1, Mark::X),
            Err(BoardError::OutOfBounds { row: 3, col: 1 })
        );
        assert_eq!(board, Board::new());
    }

    #[test]
    fn test_clone_is_independent() {
        let board = Board::new();
        let mut lookahead = board.clone();
        lookahead.place_at(Position::Center, Mark::X).unwrap();
        assert!(board.is_empty(Position::Center));
    }

    #[test]
    fn test_symbols_round_trip() {
        let rows = [["X", "", "O"], ["", "X", ""], ["O", "", ""]];
        let board = Board::from_symbols(rows).unwrap();
        assert_eq!(board.to_symbols(), rows);
        assert!(Board::from_symbols([["Z", "", ""], ["", "", ""], ["", "", ""]]).is_none());
    }

    #[test]
    fn test_display() {
        let mut board = Board::new();
        board.place_at(Position::Center, Mark::X).unwrap();
        assert_eq!(board.display(), "1|2|3\n-+-+-\n4|X|6\n-+-+-\n7|8|9");
    }
}
