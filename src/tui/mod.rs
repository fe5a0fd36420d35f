//! Terminal front-end for Crossline.

mod input;
mod sink;
mod ui;

pub use input::{KeyAction, map_key, move_cursor};
pub use sink::WatchSink;

use crate::driver::SessionDriver;
use crate::session::{SessionView, Timings, UserIntent};
use crate::transport::{HttpSessionService, WsConnector};
use crate::ClientConfig;
use anyhow::Result;
use crossline_board::Position;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use std::io;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::{error, info, instrument};

/// Runs the TUI until the user quits.
#[instrument(skip_all, fields(server_url = %config.server_url()))]
pub async fn run_tui(config: ClientConfig) -> Result<()> {
    info!("Starting Crossline TUI");

    let (intent_tx, intent_rx) = mpsc::unbounded_channel();
    let (view_tx, view_rx) = watch::channel(SessionView::default());
    let driver = SessionDriver::new(
        HttpSessionService::from_config(&config),
        WsConnector::from_config(&config),
        WatchSink::new(view_tx),
        Timings::from(&config),
        config.stats_interval(),
    );
    let driver_task = tokio::spawn(driver.run(intent_rx));

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = event_loop(&mut terminal, view_rx, intent_tx).await;

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(e) = driver_task.await {
        error!(error = %e, "Session driver panicked");
    }
    if let Err(err) = &res {
        error!(error = ?err, "TUI loop error");
    }
    res
}

/// Draws the latest view and forwards key presses as intents.
async fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    views: watch::Receiver<SessionView>,
    intents: mpsc::UnboundedSender<UserIntent>,
) -> Result<()> {
    let mut cursor = Position::Center;
    loop {
        let view = views.borrow().clone();
        terminal.draw(|f| ui::draw(f, &view, cursor))?;

        if event::poll(Duration::from_millis(50))?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            match map_key(key.code, &view, cursor) {
                KeyAction::Quit => {
                    info!("User quit");
                    return Ok(());
                }
                KeyAction::Cursor(pos) => cursor = pos,
                KeyAction::Intent(intent) => {
                    if intents.send(intent).is_err() {
                        error!("Session driver gone");
                        return Ok(());
                    }
                }
                KeyAction::Ignore => {}
            }
        }
        tokio::task::yield_now().await;
    }
}
