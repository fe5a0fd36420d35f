//! WebSocket channel pump.
//!
//! One spawned task per channel bridges the socket and two tokio channels:
//! frames queued on the handle go out as text, text frames coming in are
//! decoded and forwarded in arrival order.

use crate::protocol::{ClientMessage, GameId, PlayerId, ServerMessage};
use crate::session::ChannelEvent;
use crate::transport::{ChannelConnector, ChannelHandle};
use crate::ClientConfig;
use futures::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{Instrument, debug, info, info_span, warn};

/// [`ChannelConnector`] backed by tokio-tungstenite.
#[derive(Debug, Clone)]
pub struct WsConnector {
    ws_url: String,
    connect_timeout: Duration,
}

impl WsConnector {
    /// Creates a connector for `ws_url`.
    pub fn new(ws_url: impl Into<String>, connect_timeout: Duration) -> Self {
        Self {
            ws_url: ws_url.into(),
            connect_timeout,
        }
    }

    /// Creates a connector from configuration.
    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.ws_url().clone(), config.request_timeout())
    }

    /// Address for a player's channel.
    pub fn channel_url(&self, player_id: PlayerId) -> String {
        format!("{}?playerID={}", self.ws_url, player_id)
    }
}

impl ChannelConnector for WsConnector {
    fn open(&self, player_id: PlayerId, game_id: Option<GameId>) -> ChannelHandle {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let url = self.channel_url(player_id);
        let span = info_span!("channel", player_id, ?game_id);
        tokio::spawn(
            pump(
                url,
                player_id,
                game_id,
                self.connect_timeout,
                command_rx,
                event_tx,
            )
            .instrument(span),
        );
        ChannelHandle::new(command_tx, event_rx)
    }
}

/// Decodes one text frame into a channel event.
pub fn decode_frame(text: &str) -> ChannelEvent {
    match ServerMessage::decode(text) {
        Ok(msg) => ChannelEvent::Message(msg),
        Err(e) => ChannelEvent::Malformed(e.to_string()),
    }
}

async fn pump(
    url: String,
    player_id: PlayerId,
    game_id: Option<GameId>,
    connect_timeout: Duration,
    mut commands: UnboundedReceiver<ClientMessage>,
    events: UnboundedSender<ChannelEvent>,
) {
    debug!(%url, "Connecting");
    let stream = match tokio::time::timeout(connect_timeout, connect_async(url.as_str())).await {
        Ok(Ok((stream, _response))) => stream,
        Ok(Err(e)) => {
            warn!(error = %e, "Connect failed");
            let _ = events.send(ChannelEvent::Closed);
            return;
        }
        Err(_) => {
            warn!("Connect timed out");
            let _ = events.send(ChannelEvent::Closed);
            return;
        }
    };
    let (mut sink, mut source) = stream.split();

    if let Some(game_id) = game_id {
        let register = ClientMessage::Register { player_id, game_id };
        let sent = match register.encode() {
            Ok(text) => sink.send(Message::Text(text)).await.is_ok(),
            Err(e) => {
                warn!(error = %e, "Could not encode register");
                true
            }
        };
        if !sent {
            let _ = events.send(ChannelEvent::Closed);
            return;
        }
    }
    info!("Channel open");
    if events.send(ChannelEvent::Opened).is_err() {
        return;
    }

    'channel: loop {
        tokio::select! {
            biased;
            cmd = commands.recv() => match cmd {
                Some(msg) => {
                    let text = match msg.encode() {
                        Ok(text) => text,
                        Err(e) => {
                            warn!(error = %e, "Dropping unencodable frame");
                            continue 'channel;
                        }
                    };
                    debug!(%text, "Sending frame");
                    if sink.send(Message::Text(text)).await.is_err() {
                        let _ = events.send(ChannelEvent::Closed);
                        break 'channel;
                    }
                }
                None => {
                    debug!("Closed locally");
                    let _ = sink.send(Message::Close(None)).await;
                    break 'channel;
                }
            },
            frame = source.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    if events.send(decode_frame(&text)).is_err() {
                        break 'channel;
                    }
                }
                Some(Ok(Message::Close(_))) | None => {
                    info!("Closed by server");
                    let _ = events.send(ChannelEvent::Closed);
                    break 'channel;
                }
                Some(Ok(_)) => continue 'channel,
                Some(Err(e)) => {
                    warn!(error = %e, "Channel error");
                    let _ = events.send(ChannelEvent::Closed);
                    break 'channel;
                }
            },
        }
    }
}
