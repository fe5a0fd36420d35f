//! Game session lifecycle.
//!
//! - [`SessionMachine`]: the pure transition function
//! - [`SessionEvent`] / [`Effect`]: what goes in and what comes out
//! - [`SessionView`] / [`PresentationSink`]: what the front-end sees

mod event;
mod machine;
mod state;
mod view;

pub use event::{ChannelEvent, Effect, SessionDescriptor, SessionEvent, Ticket, UserIntent};
pub use machine::{INVALID_MOVE_WARNING, PARSE_WARNING, SessionMachine, Timings};
pub use state::{GameResult, Mode, PendingMove, Phase, Session, TurnOwner};
pub use view::{PresentationSink, SessionView};
