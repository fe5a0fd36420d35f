//! Presentation sink feeding the terminal through a watch channel.

use crate::session::{PresentationSink, SessionView};
use tokio::sync::watch;

/// Publishes every view; the render loop reads the latest one.
#[derive(Debug)]
pub struct WatchSink {
    tx: watch::Sender<SessionView>,
}

impl WatchSink {
    /// Wraps a watch sender.
    pub fn new(tx: watch::Sender<SessionView>) -> Self {
        Self { tx }
    }
}

impl PresentationSink for WatchSink {
    fn present(&mut self, view: SessionView) {
        self.tx.send_replace(view);
    }
}
