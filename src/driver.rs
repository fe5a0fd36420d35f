//! Async driver around the session machine.
//!
//! The driver is the single owner of [`SessionMachine`]. It turns user
//! intents, channel events, request completions, timers and the stats tick
//! into one ordered stream of [`SessionEvent`]s, runs the effects each
//! transition returns and pushes the resulting view to the sink.

use crate::protocol::PlayerId;
use crate::session::{
    ChannelEvent, Effect, Mode, PresentationSink, SessionEvent, SessionMachine, Ticket, Timings,
    UserIntent,
};
use crate::transport::{ChannelConnector, ChannelHandle, SessionService};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, instrument, warn};

/// Runs one client session loop.
pub struct SessionDriver<S, C, P> {
    machine: SessionMachine,
    service: Arc<S>,
    connector: C,
    sink: P,
    channel: Option<ChannelHandle>,
    events_tx: UnboundedSender<SessionEvent>,
    events_rx: UnboundedReceiver<SessionEvent>,
    stats_interval: Duration,
}

impl<S, C, P> SessionDriver<S, C, P>
where
    S: SessionService + 'static,
    C: ChannelConnector,
    P: PresentationSink,
{
    /// Creates a driver with an entropy-seeded bot.
    pub fn new(service: S, connector: C, sink: P, timings: Timings, stats_interval: Duration) -> Self {
        Self::with_machine(
            SessionMachine::new(timings),
            service,
            connector,
            sink,
            stats_interval,
        )
    }

    /// Creates a driver around an existing machine.
    pub fn with_machine(
        machine: SessionMachine,
        service: S,
        connector: C,
        sink: P,
        stats_interval: Duration,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            machine,
            service: Arc::new(service),
            connector,
            sink,
            channel: None,
            events_tx,
            events_rx,
            stats_interval,
        }
    }

    /// Processes events until `intents` closes.
    #[instrument(skip_all)]
    pub async fn run(mut self, mut intents: UnboundedReceiver<UserIntent>) {
        info!("Session driver started");
        self.sink.present(self.machine.view());

        let mut stats_tick = tokio::time::interval(self.stats_interval);
        stats_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let event = tokio::select! {
                intent = intents.recv() => match intent {
                    Some(intent) => SessionEvent::Intent(intent),
                    None => break,
                },
                event = next_channel_event(&mut self.channel) => {
                    let event = event.unwrap_or(ChannelEvent::Closed);
                    if event == ChannelEvent::Closed {
                        self.channel = None;
                    }
                    SessionEvent::Channel(event)
                },
                Some(event) = self.events_rx.recv() => event,
                _ = stats_tick.tick() => {
                    self.spawn_stats_fetch();
                    continue;
                }
            };
            self.dispatch(event);
        }

        self.channel = None;
        info!("Session driver stopped");
    }

    /// Feeds one event through the machine and presents the result.
    pub fn dispatch(&mut self, event: SessionEvent) {
        let effects = self.machine.handle(event);
        for effect in effects {
            self.execute(effect);
        }
        self.sink.present(self.machine.view());
    }

    fn execute(&mut self, effect: Effect) {
        debug!(?effect, "Executing effect");
        match effect {
            Effect::RequestSession { mode, ticket } => self.spawn_session_request(mode, ticket),
            Effect::OpenChannel { player_id, game_id } => {
                self.channel = Some(self.connector.open(player_id, game_id));
            }
            Effect::Send(msg) => match &self.channel {
                Some(channel) => {
                    channel.send(msg);
                }
                None => warn!(frame = ?msg, "No channel, frame dropped"),
            },
            Effect::CloseChannel => {
                if self.channel.take().is_some() {
                    debug!("Channel closed locally");
                }
            }
            Effect::ScheduleBotMove { after, round } => {
                self.schedule(after, SessionEvent::BotTurnDue { round });
            }
            Effect::ScheduleRematchDeadline { after, ticket } => {
                self.schedule(after, SessionEvent::RematchDeadline { ticket });
            }
            Effect::FetchOfflineStats { player_id } => self.spawn_offline_stats_fetch(player_id),
        }
    }

    fn spawn_session_request(&self, mode: Mode, ticket: Ticket) {
        let service = Arc::clone(&self.service);
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let event = match service.request_session(mode).await {
                Ok(descriptor) => SessionEvent::SessionStarted { ticket, descriptor },
                Err(error) => SessionEvent::SessionFailed { ticket, error },
            };
            let _ = tx.send(event);
        });
    }

    fn spawn_stats_fetch(&self) {
        let service = Arc::clone(&self.service);
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            match service.fetch_stats().await {
                Ok(stats) => {
                    let _ = tx.send(SessionEvent::StatsUpdated(stats));
                }
                Err(e) => debug!(error = %e, "Stats poll failed"),
            }
        });
    }

    fn spawn_offline_stats_fetch(&self, player_id: PlayerId) {
        let service = Arc::clone(&self.service);
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            match service.fetch_offline_stats(player_id).await {
                Ok(stats) => {
                    let _ = tx.send(SessionEvent::OfflineStatsUpdated(stats));
                }
                Err(e) => debug!(error = %e, "Offline stats fetch failed"),
            }
        });
    }

    fn schedule(&self, after: Duration, event: SessionEvent) {
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(after).await;
            let _ = tx.send(event);
        });
    }
}

async fn next_channel_event(channel: &mut Option<ChannelHandle>) -> Option<ChannelEvent> {
    match channel {
        Some(handle) => handle.recv().await,
        None => std::future::pending().await,
    }
}
