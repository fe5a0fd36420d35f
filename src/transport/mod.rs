//! Transport adapter.
//!
//! Two seams keep the session machine away from the network:
//! [`SessionService`] for request/response calls and [`ChannelConnector`]
//! for the duplex channel. Production implementations live in [`http`] and
//! [`ws`]; tests substitute in-memory ones.

pub mod http;
pub mod ws;

use crate::SessionError;
use crate::protocol::{ClientMessage, GameId, OfflineStats, PlayerId, ServerStats};
use crate::session::{ChannelEvent, Mode, SessionDescriptor};
use async_trait::async_trait;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tracing::debug;

pub use http::HttpSessionService;
pub use ws::WsConnector;

/// Request/response side of the authority.
#[async_trait]
pub trait SessionService: Send + Sync {
    /// Starts an online or offline session.
    ///
    /// Every failure, including a refusal in the body, is
    /// [`SessionError::ServiceUnavailable`].
    async fn request_session(&self, mode: Mode) -> Result<SessionDescriptor, SessionError>;

    /// Samples the server-wide counters.
    async fn fetch_stats(&self) -> Result<ServerStats, SessionError>;

    /// Fetches a player's record against the bot.
    async fn fetch_offline_stats(&self, player_id: PlayerId) -> Result<OfflineStats, SessionError>;
}

/// Opens duplex channels.
pub trait ChannelConnector: Send {
    /// Starts connecting and returns at once. Connection failures arrive on
    /// the handle as [`ChannelEvent::Closed`].
    fn open(&self, player_id: PlayerId, game_id: Option<GameId>) -> ChannelHandle;
}

/// The driver's end of an open channel.
///
/// Dropping the handle closes the channel; no [`ChannelEvent::Closed`] is
/// reported for a close the driver asked for.
#[derive(Debug)]
pub struct ChannelHandle {
    commands: UnboundedSender<ClientMessage>,
    events: UnboundedReceiver<ChannelEvent>,
}

impl ChannelHandle {
    /// Wraps the two halves of a channel pump.
    pub fn new(
        commands: UnboundedSender<ClientMessage>,
        events: UnboundedReceiver<ChannelEvent>,
    ) -> Self {
        Self { commands, events }
    }

    /// Queues a frame. Returns false if the pump is gone.
    pub fn send(&self, msg: ClientMessage) -> bool {
        match self.commands.send(msg) {
            Ok(()) => true,
            Err(e) => {
                debug!(frame = ?e.0, "Channel pump gone, frame dropped");
                false
            }
        }
    }

    /// Next event, or `None` once the pump has stopped.
    pub async fn recv(&mut self) -> Option<ChannelEvent> {
        self.events.recv().await
    }
}
