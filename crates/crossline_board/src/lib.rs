//! Pure tic-tac-toe logic for Crossline.
//!
//! - [`Board`]: the 3x3 grid, placement and [`Board::evaluate`]
//! - [`rules`]: line and draw detection shared by every caller
//! - [`Bot`]: the scripted opponent used in offline play
//!
//! Nothing here performs I/O.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod board;
mod bot;
mod error;
mod position;
pub mod rules;
mod types;

pub use board::Board;
pub use bot::Bot;
pub use error::BoardError;
pub use position::Position;
pub use types::{Cell, Mark, Outcome};
