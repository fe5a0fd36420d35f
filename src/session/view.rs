//! Snapshot handed to the presentation layer after every transition.

use crate::protocol::{OfflineStats, ServerStats};
use crate::session::{GameResult, Mode, Phase, TurnOwner};
use crossline_board::{Cell, Mark};

/// Everything a front-end needs to draw the session.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionView {
    /// Board cells in row-major order.
    pub cells: [Cell; 9],
    /// Lifecycle phase.
    pub phase: Phase,
    /// Online or offline, while a session exists.
    pub mode: Option<Mode>,
    /// Whose move it is, while a session exists.
    pub turn: Option<TurnOwner>,
    /// Our mark, once assigned.
    pub local_mark: Option<Mark>,
    /// Main status line.
    pub status: String,
    /// Transient notice, cleared by the next meaningful transition.
    pub warning: Option<String>,
    /// Result of the last finished game.
    pub result: Option<GameResult>,
    /// Whether clicking a cell does anything.
    pub input_enabled: bool,
    /// Whether the play-again affordance is shown.
    pub play_again_visible: bool,
    /// Whether the accept/decline prompt is shown.
    pub rematch_prompt: bool,
    /// Whether the return-to-menu affordance is shown.
    pub menu_visible: bool,
    /// Our display name.
    pub nickname: Option<String>,
    /// Opponent's display name.
    pub opponent_nickname: Option<String>,
    /// Latest server counters.
    pub stats: Option<ServerStats>,
    /// Latest bot record.
    pub offline_stats: Option<OfflineStats>,
}

/// Receives a fresh view after every transition.
pub trait PresentationSink: Send {
    /// Replaces whatever is on screen with `view`.
    fn present(&mut self, view: SessionView);
}
