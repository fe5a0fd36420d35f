//! Crossline - a tic-tac-toe session client.
//!
//! Plays networked games through a remote game authority (HTTP plus a
//! WebSocket channel) and local games against a scripted bot.
//!
//! - [`session`]: the pure session state machine and its view
//! - [`rematch`]: the play-again handshake
//! - [`protocol`]: wire formats
//! - [`transport`]: reqwest and tokio-tungstenite adapters
//! - [`driver`]: the tokio event loop that owns the machine
//! - [`tui`]: ratatui front-end

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
pub mod driver;
mod error;
pub mod protocol;
pub mod rematch;
pub mod session;
pub mod transport;
pub mod tui;

pub use config::{ClientConfig, ConfigError, SERVER_URL_ENV, WS_URL_ENV};
pub use driver::SessionDriver;
pub use error::SessionError;
pub use session::{
    ChannelEvent, Effect, GameResult, Mode, Phase, PresentationSink, SessionEvent,
    SessionMachine, SessionView, Timings, TurnOwner, UserIntent,
};
