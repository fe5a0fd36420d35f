//! Inputs to and outputs from the session state machine.

use crate::protocol::{ClientMessage, GameId, OfflineStats, PlayerId, ServerMessage, ServerStats};
use crate::session::Mode;
use crate::SessionError;
use crossline_board::{Mark, Position};
use derive_new::new;
use std::time::Duration;

/// Identifies one session-start request so late completions can be dropped.
pub type Ticket = u64;

/// What the user can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserIntent {
    /// Find a remote opponent.
    StartOnline,
    /// Play the bot.
    StartOffline,
    /// Play at a cell.
    LocalMove(Position),
    /// Ask for a mark while waiting for an opponent.
    SelectRole(Mark),
    /// Offer to play again.
    RequestRematch,
    /// Accept the opponent's offer.
    AcceptRematch,
    /// Decline the opponent's offer.
    DeclineRematch,
    /// Abandon everything and go back to the menu.
    ReturnToMenu,
}

/// Notifications from the duplex channel, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    /// The socket is open (and `register` went out if the game was known).
    Opened,
    /// A decoded frame.
    Message(ServerMessage),
    /// A frame that did not decode.
    Malformed(String),
    /// The channel closed without being asked to. Reported once.
    Closed,
}

/// Result of a session-start request.
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct SessionDescriptor {
    /// Our id.
    pub player_id: PlayerId,
    /// The game, when already known.
    pub game_id: Option<GameId>,
    /// The opponent, when already matched.
    pub opponent_id: Option<PlayerId>,
    /// Whether we move first, when the authority said so up front.
    pub is_first_player: Option<bool>,
    /// Our display name.
    pub nickname: Option<String>,
}

/// Everything the state machine reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// User input.
    Intent(UserIntent),
    /// A session-start request succeeded.
    SessionStarted {
        /// Request this answers.
        ticket: Ticket,
        /// What the authority returned.
        descriptor: SessionDescriptor,
    },
    /// A session-start request failed.
    SessionFailed {
        /// Request this answers.
        ticket: Ticket,
        /// Why.
        error: SessionError,
    },
    /// Something happened on the channel.
    Channel(ChannelEvent),
    /// The bot's thinking delay elapsed.
    BotTurnDue {
        /// Bot round the timer was armed for.
        round: u64,
    },
    /// The rematch offer expired.
    RematchDeadline {
        /// Offer the timer was armed for.
        ticket: u64,
    },
    /// Fresh server counters.
    StatsUpdated(ServerStats),
    /// Fresh bot record for the current player.
    OfflineStatsUpdated(OfflineStats),
}

/// Work the state machine asks its driver to perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Call `/quick-game` or `/offline-game`.
    RequestSession {
        /// Which endpoint.
        mode: Mode,
        /// Echoed back in the completion event.
        ticket: Ticket,
    },
    /// Open the duplex channel, replacing any open one.
    OpenChannel {
        /// Our id.
        player_id: PlayerId,
        /// Registered on open when known.
        game_id: Option<GameId>,
    },
    /// Send a frame on the open channel.
    Send(ClientMessage),
    /// Close the channel. No `Closed` event follows.
    CloseChannel,
    /// Fire [`SessionEvent::BotTurnDue`] after a delay.
    ScheduleBotMove {
        /// Delay.
        after: Duration,
        /// Round to echo.
        round: u64,
    },
    /// Fire [`SessionEvent::RematchDeadline`] after a delay.
    ScheduleRematchDeadline {
        /// Delay.
        after: Duration,
        /// Offer to echo.
        ticket: u64,
    },
    /// Refresh the player's bot record.
    FetchOfflineStats {
        /// Whose record.
        player_id: PlayerId,
    },
}
