//! Session error taxonomy.

use crossline_board::Position;
use derive_more::{Display, Error};

/// Everything that can go wrong with a game session.
///
/// Only [`SessionError::MissingRoleAssignment`] ends a session on its own;
/// the rest are surfaced, logged or mapped to a phase change by the state
/// machine.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum SessionError {
    /// A session-start or stats request failed.
    #[display("Service unavailable: {}", _0)]
    ServiceUnavailable(#[error(not(source))] String),

    /// A frame or body could not be decoded.
    #[display("Could not parse message: {}", _0)]
    MessageParse(#[error(not(source))] String),

    /// `game_start` arrived without a usable role.
    #[display("Server did not assign a role")]
    MissingRoleAssignment,

    /// Local attempt to play on a taken cell.
    #[display("Cell {} is already taken", _0)]
    CellOccupied(#[error(not(source))] Position),

    /// The authority rejected our move.
    #[display("Move rejected: {}", _0)]
    InvalidMove(#[error(not(source))] String),

    /// The channel closed without being asked to.
    #[display("Connection to server lost")]
    ChannelClosed,

    /// The opponent left mid-session.
    #[display("Opponent left the game")]
    OpponentLeft,
}
