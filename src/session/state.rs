//! Session data owned by the state machine.

use crate::protocol::{GameId, PlayerId};
use crossline_board::{Mark, Outcome, Position};
use derive_getters::Getters;
use derive_more::Display;

/// Lifecycle phase of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display)]
pub enum Phase {
    /// In the menu, no session.
    #[default]
    Idle,
    /// Session requested or queued, no opponent yet.
    AwaitingOpponent,
    /// A game is being played.
    Active,
    /// The game ended.
    Finished,
    /// A rematch offer is open.
    AwaitingRematch,
}

/// Who the local player is playing against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Mode {
    /// A remote opponent through the authority.
    Online,
    /// The local bot.
    Offline,
}

/// Whose move it is, from the local player's side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum TurnOwner {
    /// The local player.
    Local,
    /// The opponent, the bot or the authority.
    Remote,
}

/// A local move sent to the authority and not yet confirmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingMove {
    /// Target cell.
    pub position: Position,
}

/// How a finished game ended for the local player.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum GameResult {
    /// We completed a line.
    #[display("You win!")]
    Win,
    /// The opponent completed a line.
    #[display("Opponent wins!")]
    Loss,
    /// Full board, no line.
    #[display("Draw!")]
    Draw,
    /// The opponent disconnected.
    #[display("Opponent disconnected")]
    OpponentLeft,
    /// Our channel dropped mid-game.
    #[display("Disconnected from server")]
    Disconnected,
    /// Declared finished but no line and free cells remain.
    #[display("Game over")]
    Unresolved,
}

impl GameResult {
    /// Derives the result from a board outcome.
    pub fn from_outcome(outcome: Outcome, local_mark: Mark) -> Self {
        match outcome {
            Outcome::Win(mark) if mark == local_mark => GameResult::Win,
            Outcome::Win(_) => GameResult::Loss,
            Outcome::Draw => GameResult::Draw,
            Outcome::InProgress => GameResult::Unresolved,
        }
    }
}

/// The current session.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct Session {
    /// Our id, issued at session start.
    pub(crate) player_id: PlayerId,
    /// Known once `game_start` arrives (online) or at start (offline).
    pub(crate) game_id: Option<GameId>,
    /// The other player, when the authority has told us.
    pub(crate) opponent_id: Option<PlayerId>,
    /// Our display name.
    pub(crate) nickname: Option<String>,
    /// Opponent's display name.
    pub(crate) opponent_nickname: Option<String>,
    /// Online or offline.
    pub(crate) mode: Mode,
    /// Assigned mark; `None` until the role is known.
    pub(crate) local_mark: Option<Mark>,
    /// Whose move it is.
    pub(crate) turn: TurnOwner,
    /// Whether a role preference was already sent.
    pub(crate) role_selected: bool,
}

impl Session {
    pub(crate) fn new(player_id: PlayerId, mode: Mode) -> Self {
        Self {
            player_id,
            game_id: None,
            opponent_id: None,
            nickname: None,
            opponent_nickname: None,
            mode,
            local_mark: None,
            turn: TurnOwner::Remote,
            role_selected: false,
        }
    }

    /// Turn owner for the mark that moves next.
    pub(crate) fn owner_of(&self, to_move: Mark) -> TurnOwner {
        if self.local_mark == Some(to_move) {
            TurnOwner::Local
        } else {
            TurnOwner::Remote
        }
    }
}
