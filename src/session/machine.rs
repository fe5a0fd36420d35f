//! The session state machine.
//!
//! [`SessionMachine::handle`] is the only way session state changes. It
//! takes one [`SessionEvent`], updates phase, board and session, and returns
//! the [`Effect`]s the driver must carry out. It performs no I/O.

use crate::protocol::{ClientMessage, GameStartPayload, OfflineStats, ServerMessage, ServerStats};
use crate::protocol::{BoardUpdate, GameStatus, WireBoard};
use crate::rematch::{RematchCoordinator, RematchStep};
use crate::session::{
    ChannelEvent, Effect, GameResult, Mode, PendingMove, Phase, Session, SessionDescriptor,
    SessionEvent, SessionView, Ticket, TurnOwner, UserIntent,
};
use crate::{ClientConfig, SessionError};
use crossline_board::{Board, Bot, Mark, Position};
use derive_new::new;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

/// Shown when the authority rejects a move.
pub const INVALID_MOVE_WARNING: &str = "Invalid move. Please try again.";

/// Shown when a frame cannot be decoded.
pub const PARSE_WARNING: &str = "Error processing game update";

/// Delays the machine asks the driver to schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, new)]
pub struct Timings {
    /// Pause before the bot replies.
    pub bot_delay: Duration,
    /// Lifetime of a rematch offer.
    pub rematch_timeout: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self::new(Duration::from_millis(500), Duration::from_secs(30))
    }
}

impl From<&ClientConfig> for Timings {
    fn from(config: &ClientConfig) -> Self {
        Self::new(config.bot_delay(), config.rematch_timeout())
    }
}

/// Owns the board, the session and the rematch offer.
#[derive(Debug)]
pub struct SessionMachine {
    timings: Timings,
    phase: Phase,
    session: Option<Session>,
    board: Board,
    pending: Option<PendingMove>,
    result: Option<GameResult>,
    fatal: Option<SessionError>,
    warning: Option<String>,
    notice: Option<String>,
    rematch: Option<RematchCoordinator>,
    rematch_available: bool,
    role_preference: Option<Mark>,
    starting: Option<(Ticket, Mode)>,
    next_ticket: Ticket,
    bot_round: u64,
    rematch_ticket: u64,
    channel_open: bool,
    stats: Option<ServerStats>,
    offline_stats: Option<OfflineStats>,
    rng: StdRng,
}

impl SessionMachine {
    /// Creates an idle machine with an entropy-seeded bot.
    pub fn new(timings: Timings) -> Self {
        Self::with_rng(timings, StdRng::from_entropy())
    }

    /// Creates an idle machine whose bot uses a fixed seed.
    pub fn with_seed(timings: Timings, seed: u64) -> Self {
        Self::with_rng(timings, StdRng::seed_from_u64(seed))
    }

    fn with_rng(timings: Timings, rng: StdRng) -> Self {
        Self {
            timings,
            phase: Phase::Idle,
            session: None,
            board: Board::new(),
            pending: None,
            result: None,
            fatal: None,
            warning: None,
            notice: None,
            rematch: None,
            rematch_available: false,
            role_preference: None,
            starting: None,
            next_ticket: 0,
            bot_round: 0,
            rematch_ticket: 0,
            channel_open: false,
            stats: None,
            offline_stats: None,
            rng,
        }
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Current session, if any.
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Current board.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Move awaiting confirmation.
    pub fn pending(&self) -> Option<PendingMove> {
        self.pending
    }

    /// Result of the last finished game.
    pub fn result(&self) -> Option<&GameResult> {
        self.result.as_ref()
    }

    /// Error that ended the session, if any.
    pub fn fatal(&self) -> Option<&SessionError> {
        self.fatal.as_ref()
    }

    /// Open rematch handshake, if any.
    pub fn rematch(&self) -> Option<&RematchCoordinator> {
        self.rematch.as_ref()
    }

    /// Applies one event and returns the work it implies.
    #[instrument(skip(self, event), fields(phase = %self.phase))]
    pub fn handle(&mut self, event: SessionEvent) -> Vec<Effect> {
        debug!(?event, "Handling session event");
        match event {
            SessionEvent::Intent(intent) => self.on_intent(intent),
            SessionEvent::SessionStarted { ticket, descriptor } => {
                self.on_session_started(ticket, descriptor)
            }
            SessionEvent::SessionFailed { ticket, error } => self.on_session_failed(ticket, error),
            SessionEvent::Channel(event) => self.on_channel(event),
            SessionEvent::BotTurnDue { round } => self.on_bot_turn(round),
            SessionEvent::RematchDeadline { ticket } => self.on_rematch_deadline(ticket),
            SessionEvent::StatsUpdated(stats) => {
                self.stats = Some(stats);
                Vec::new()
            }
            SessionEvent::OfflineStatsUpdated(stats) => {
                self.offline_stats = Some(stats);
                Vec::new()
            }
        }
    }

    fn on_intent(&mut self, intent: UserIntent) -> Vec<Effect> {
        match intent {
            UserIntent::StartOnline => self.start(Mode::Online),
            UserIntent::StartOffline => self.start(Mode::Offline),
            UserIntent::ReturnToMenu => {
                info!("Returning to menu");
                self.reset()
            }
            _ if self.fatal.is_some() => {
                debug!(?intent, "Session failed, only the menu is available");
                Vec::new()
            }
            UserIntent::LocalMove(pos) => self.local_move(pos),
            UserIntent::SelectRole(mark) => self.select_role(mark),
            UserIntent::RequestRematch => self.request_rematch(),
            UserIntent::AcceptRematch => self.answer_rematch(true),
            UserIntent::DeclineRematch => self.answer_rematch(false),
        }
    }

    /// Back to the menu: closes the channel and invalidates every ticket.
    fn reset(&mut self) -> Vec<Effect> {
        let mut effects = Vec::new();
        if self.channel_open {
            self.channel_open = false;
            effects.push(Effect::CloseChannel);
        }
        self.phase = Phase::Idle;
        self.session = None;
        self.board = Board::new();
        self.pending = None;
        self.result = None;
        self.fatal = None;
        self.warning = None;
        self.notice = None;
        self.rematch = None;
        self.rematch_available = false;
        self.role_preference = None;
        self.starting = None;
        self.bot_round += 1;
        self.rematch_ticket += 1;
        effects
    }

    #[instrument(skip(self))]
    fn start(&mut self, mode: Mode) -> Vec<Effect> {
        if self.starting.is_some() {
            debug!("Session start already in flight");
            return Vec::new();
        }
        let busy = matches!(
            self.phase,
            Phase::AwaitingOpponent | Phase::Active | Phase::AwaitingRematch
        );
        if busy && self.fatal.is_none() {
            debug!("Session in progress, start ignored");
            return Vec::new();
        }

        let mut effects = self.reset();
        self.next_ticket += 1;
        let ticket = self.next_ticket;
        self.starting = Some((ticket, mode));
        if mode == Mode::Online {
            self.phase = Phase::AwaitingOpponent;
            self.notice = Some("Searching for an opponent...".to_string());
        }
        info!(ticket, "Requesting session");
        effects.push(Effect::RequestSession { mode, ticket });
        effects
    }

    #[instrument(skip(self, descriptor), fields(player_id = descriptor.player_id))]
    fn on_session_started(&mut self, ticket: Ticket, descriptor: SessionDescriptor) -> Vec<Effect> {
        let Some((expected, mode)) = self.starting else {
            debug!("No start in flight, dropping response");
            return Vec::new();
        };
        if ticket != expected {
            debug!(expected, "Stale session response");
            return Vec::new();
        }
        self.starting = None;

        let mut session = Session::new(descriptor.player_id, mode);
        session.game_id = descriptor.game_id;
        session.opponent_id = descriptor.opponent_id;
        session.nickname = descriptor.nickname;
        let player_id = session.player_id;
        self.session = Some(session);

        match mode {
            Mode::Online => {
                self.phase = Phase::AwaitingOpponent;
                self.channel_open = true;
                let mut effects = vec![Effect::OpenChannel {
                    player_id,
                    game_id: descriptor.game_id,
                }];
                let matched = descriptor.opponent_id.is_some();
                match (descriptor.is_first_player, descriptor.game_id) {
                    (Some(first), Some(_)) if matched => {
                        let mark = if first { Mark::X } else { Mark::O };
                        info!(%mark, "Matched at start");
                        self.begin_game(mark, Board::new());
                    }
                    _ if matched => {
                        // Moves need a game id, which only game_start can supply here.
                        info!("Matched, game id pending");
                        self.notice = Some("Matched, waiting for game...".to_string());
                    }
                    _ => self.notice = Some("Waiting for opponent...".to_string()),
                }
                effects.extend(self.send_role_preference());
                effects
            }
            Mode::Offline => {
                info!("Offline game against the bot");
                self.begin_game(Mark::X, Board::new());
                vec![Effect::FetchOfflineStats { player_id }]
            }
        }
    }

    fn on_session_failed(&mut self, ticket: Ticket, error: SessionError) -> Vec<Effect> {
        if self.starting.map(|(t, _)| t) != Some(ticket) {
            debug!(ticket, "Stale session failure");
            return Vec::new();
        }
        warn!(error = %error, "Session start failed");
        self.starting = None;
        self.session = None;
        self.phase = Phase::Idle;
        self.notice = Some("Failed to start game. Please try again.".to_string());
        self.warning = Some(error.to_string());
        Vec::new()
    }

    /// Installs a fresh game with `mark` as the local side.
    fn begin_game(&mut self, mark: Mark, board: Board) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let to_move = if board.count(Mark::X) > board.count(Mark::O) {
            Mark::O
        } else {
            Mark::X
        };
        session.local_mark = Some(mark);
        session.turn = session.owner_of(to_move);
        self.board = board;
        self.phase = Phase::Active;
        self.pending = None;
        self.result = None;
        self.warning = None;
        self.notice = None;
        self.rematch = None;
        self.rematch_available = false;
        self.bot_round += 1;
        self.rematch_ticket += 1;
    }

    #[instrument(skip(self))]
    fn local_move(&mut self, pos: Position) -> Vec<Effect> {
        if self.phase != Phase::Active || self.pending.is_some() {
            debug!("Move ignored outside an open turn");
            return Vec::new();
        }
        let Some(session) = self.session.as_ref() else {
            return Vec::new();
        };
        let (mode, player_id, game_id) = (session.mode, session.player_id, session.game_id);
        let Some(mark) = session.local_mark else {
            return Vec::new();
        };
        if session.turn != TurnOwner::Local {
            debug!("Not our turn");
            return Vec::new();
        }
        if !self.board.is_empty(pos) {
            debug!(error = %SessionError::CellOccupied(pos), "Move ignored");
            return Vec::new();
        }

        self.warning = None;
        match mode {
            Mode::Online => {
                let Some(game_id) = game_id else {
                    warn!("Game id unknown, cannot send move");
                    return Vec::new();
                };
                self.pending = Some(PendingMove { position: pos });
                self.set_turn(TurnOwner::Remote);
                vec![Effect::Send(ClientMessage::move_at(game_id, player_id, pos))]
            }
            Mode::Offline => {
                if let Err(e) = self.board.place_at(pos, mark) {
                    debug!(error = %e, "Placement refused");
                    return Vec::new();
                }
                self.after_offline_placement(mark)
            }
        }
    }

    fn set_turn(&mut self, turn: TurnOwner) {
        if let Some(session) = self.session.as_mut() {
            session.turn = turn;
        }
    }

    /// Hands the turn over after `played` moved, finishing the game or
    /// arming the bot as needed.
    fn after_offline_placement(&mut self, played: Mark) -> Vec<Effect> {
        if self.board.evaluate().is_terminal() {
            self.finish_from_board();
            return Vec::new();
        }
        let Some(session) = self.session.as_mut() else {
            return Vec::new();
        };
        session.turn = session.owner_of(played.opponent());
        if session.turn == TurnOwner::Remote {
            self.bot_round += 1;
            vec![Effect::ScheduleBotMove {
                after: self.timings.bot_delay,
                round: self.bot_round,
            }]
        } else {
            Vec::new()
        }
    }

    #[instrument(skip(self))]
    fn on_bot_turn(&mut self, round: u64) -> Vec<Effect> {
        if round != self.bot_round || self.phase != Phase::Active {
            debug!("Stale bot timer");
            return Vec::new();
        }
        let Some(session) = self.session.as_ref() else {
            return Vec::new();
        };
        if session.mode != Mode::Offline || session.turn != TurnOwner::Remote {
            return Vec::new();
        }
        let Some(local) = session.local_mark else {
            return Vec::new();
        };

        let bot = Bot::new(local.opponent());
        let Some(pos) = bot.choose_move(&self.board, &mut self.rng) else {
            return Vec::new();
        };
        if let Err(e) = self.board.place_at(pos, bot.mark()) {
            error!(error = %e, "Bot chose an occupied cell");
            return Vec::new();
        }
        debug!(position = %pos, "Bot moved");
        self.after_offline_placement(bot.mark())
    }

    fn finish_from_board(&mut self) {
        let local = self
            .session
            .as_ref()
            .and_then(|s| s.local_mark)
            .unwrap_or(Mark::X);
        self.finish(GameResult::from_outcome(self.board.evaluate(), local))
    }

    fn finish(&mut self, result: GameResult) {
        info!(%result, "Game finished");
        self.phase = Phase::Finished;
        self.pending = None;
        self.result = Some(result);
        self.rematch = None;
        self.rematch_available = true;
        self.bot_round += 1;
    }

    /// Records a preferred mark for the next game and sends it once a game
    /// id is known.
    #[instrument(skip(self))]
    fn select_role(&mut self, mark: Mark) -> Vec<Effect> {
        if !matches!(self.phase, Phase::AwaitingOpponent | Phase::AwaitingRematch) {
            return Vec::new();
        }
        if self.session.as_ref().is_some_and(|s| s.role_selected) {
            debug!("Role preference already sent");
            return Vec::new();
        }
        self.role_preference = Some(mark);
        self.send_role_preference()
    }

    fn send_role_preference(&mut self) -> Vec<Effect> {
        let Some(role) = self.role_preference else {
            return Vec::new();
        };
        let Some(session) = self.session.as_mut() else {
            debug!("Role preference held until the session starts");
            return Vec::new();
        };
        let Some(game_id) = session.game_id else {
            debug!("Role preference held until the game id is known");
            return Vec::new();
        };
        if session.role_selected {
            return Vec::new();
        }
        session.role_selected = true;
        self.role_preference = None;
        vec![Effect::Send(ClientMessage::SelectRole {
            game_id,
            player_id: session.player_id,
            role,
        })]
    }

    fn on_channel(&mut self, event: ChannelEvent) -> Vec<Effect> {
        match event {
            ChannelEvent::Opened => {
                debug!("Channel open");
                Vec::new()
            }
            ChannelEvent::Closed => self.on_channel_closed(),
            _ if self.fatal.is_some() => Vec::new(),
            ChannelEvent::Malformed(detail) => {
                warn!(%detail, "Dropping malformed frame");
                self.warning = Some(PARSE_WARNING.to_string());
                Vec::new()
            }
            ChannelEvent::Message(msg) => self.on_message(msg),
        }
    }

    #[instrument(skip(self))]
    fn on_channel_closed(&mut self) -> Vec<Effect> {
        if !self.channel_open {
            return Vec::new();
        }
        self.channel_open = false;
        warn!(error = %SessionError::ChannelClosed, "Channel closed unexpectedly");
        match self.phase {
            Phase::Active => {
                self.finish(GameResult::Disconnected);
                self.rematch_available = false;
                Vec::new()
            }
            Phase::AwaitingOpponent | Phase::AwaitingRematch => {
                self.phase = Phase::Idle;
                self.session = None;
                self.pending = None;
                self.rematch = None;
                self.rematch_available = false;
                self.rematch_ticket += 1;
                self.notice = Some("Disconnected from server".to_string());
                Vec::new()
            }
            Phase::Finished => {
                self.rematch = None;
                self.rematch_available = false;
                self.warning = Some("Disconnected from server".to_string());
                Vec::new()
            }
            Phase::Idle => Vec::new(),
        }
    }

    fn on_message(&mut self, msg: ServerMessage) -> Vec<Effect> {
        match msg {
            ServerMessage::Connected { message } => {
                debug!(?message, "Server greeting");
                Vec::new()
            }
            ServerMessage::Warning { message } => {
                self.warning = Some(message.unwrap_or_else(|| "Server warning".to_string()));
                Vec::new()
            }
            ServerMessage::GameStart(payload) => self.on_game_start(payload),
            ServerMessage::Move(update) | ServerMessage::AiMove(update) => self.on_snapshot(update),
            ServerMessage::OpponentLeft => self.on_opponent_left(),
            ServerMessage::InvalidMove { message } => {
                if self.phase != Phase::Active {
                    return Vec::new();
                }
                let reason = message.unwrap_or_default();
                info!(error = %SessionError::InvalidMove(reason), "Move rejected");
                self.pending = None;
                self.set_turn(TurnOwner::Local);
                self.warning = Some(INVALID_MOVE_WARNING.to_string());
                Vec::new()
            }
            ServerMessage::RematchRequest => self.on_remote_rematch_request(),
            ServerMessage::RematchResponse { accepted } => {
                self.on_remote_rematch_response(accepted)
            }
            ServerMessage::Error { message } => {
                let message = message.unwrap_or_else(|| "unknown error".to_string());
                warn!(%message, "Server error");
                self.warning = Some(format!("Error: {}", message));
                if self.pending.take().is_some() {
                    self.set_turn(TurnOwner::Local);
                }
                Vec::new()
            }
            ServerMessage::Unknown => {
                warn!("Ignoring frame of unknown type");
                Vec::new()
            }
        }
    }

    #[instrument(skip(self, payload), fields(game_id = payload.game_id))]
    fn on_game_start(&mut self, payload: GameStartPayload) -> Vec<Effect> {
        let startable = matches!(
            self.phase,
            Phase::AwaitingOpponent | Phase::AwaitingRematch | Phase::Active
        );
        if !startable {
            debug!("game_start outside a session, ignored");
            return Vec::new();
        }
        let Some(session) = self.session.as_mut() else {
            return Vec::new();
        };
        if session.mode != Mode::Online {
            return Vec::new();
        }

        session.game_id = Some(payload.game_id);
        if let Some(opponent) = payload.opponent_of(session.player_id) {
            session.opponent_id = Some(opponent);
        }
        if payload.nickname.is_some() {
            session.nickname = payload.nickname.clone();
        }
        if payload.opponent_nickname.is_some() {
            session.opponent_nickname = payload.opponent_nickname.clone();
        }

        let Some(mark) = payload.role else {
            error!(error = %SessionError::MissingRoleAssignment, "Cannot play without a role");
            self.fatal = Some(SessionError::MissingRoleAssignment);
            self.pending = None;
            self.rematch = None;
            self.rematch_available = false;
            self.warning = None;
            if self.channel_open {
                self.channel_open = false;
                return vec![Effect::CloseChannel];
            }
            return Vec::new();
        };

        let board = payload.board.map(WireBoard::into_board).unwrap_or_default();
        info!(%mark, "Game started");
        self.begin_game(mark, board);
        Vec::new()
    }

    fn on_snapshot(&mut self, update: BoardUpdate) -> Vec<Effect> {
        if self.phase != Phase::Active {
            debug!("Snapshot outside an active game, ignored");
            return Vec::new();
        }
        let Some(session) = self.session.as_mut() else {
            return Vec::new();
        };
        session.turn = session.owner_of(update.turn);
        self.board = update.board.into_board();
        self.pending = None;
        self.warning = None;
        if update.status == GameStatus::Finished {
            self.finish_from_board();
        }
        Vec::new()
    }

    fn on_opponent_left(&mut self) -> Vec<Effect> {
        match self.phase {
            Phase::Active => {
                info!(error = %SessionError::OpponentLeft, "Game over");
                self.finish(GameResult::OpponentLeft);
                self.rematch_available = false;
                Vec::new()
            }
            Phase::Finished | Phase::AwaitingRematch => {
                self.phase = Phase::Finished;
                self.rematch = None;
                self.rematch_available = false;
                self.rematch_ticket += 1;
                self.warning = Some("Opponent disconnected".to_string());
                Vec::new()
            }
            Phase::Idle | Phase::AwaitingOpponent => Vec::new(),
        }
    }

    fn can_negotiate_rematch(&self) -> bool {
        let online = self.session.as_ref().is_some_and(|s| s.mode == Mode::Online);
        let open = match self.phase {
            Phase::Finished => self.rematch_available,
            Phase::AwaitingRematch => true,
            _ => false,
        };
        online && open
    }

    #[instrument(skip(self))]
    fn request_rematch(&mut self) -> Vec<Effect> {
        let offline = self.session.as_ref().is_some_and(|s| s.mode == Mode::Offline);
        if offline {
            if self.phase != Phase::Finished {
                return Vec::new();
            }
            info!("New game against the bot");
            self.begin_game(Mark::X, Board::new());
            return Vec::new();
        }
        if !self.can_negotiate_rematch() {
            debug!("Rematch not available");
            return Vec::new();
        }
        let steps = self
            .rematch
            .get_or_insert_with(RematchCoordinator::new)
            .request_local();
        self.apply_rematch_steps(steps)
    }

    fn answer_rematch(&mut self, accept: bool) -> Vec<Effect> {
        if self.phase != Phase::AwaitingRematch {
            return Vec::new();
        }
        let Some(rematch) = self.rematch.as_mut() else {
            return Vec::new();
        };
        let steps = if accept {
            rematch.accept_local()
        } else {
            rematch.decline_local()
        };
        self.apply_rematch_steps(steps)
    }

    fn on_remote_rematch_request(&mut self) -> Vec<Effect> {
        if !self.can_negotiate_rematch() {
            debug!("Rematch request ignored");
            return Vec::new();
        }
        let steps = self
            .rematch
            .get_or_insert_with(RematchCoordinator::new)
            .remote_request();
        self.apply_rematch_steps(steps)
    }

    fn on_remote_rematch_response(&mut self, accepted: bool) -> Vec<Effect> {
        if self.phase != Phase::AwaitingRematch {
            debug!("Rematch response ignored");
            return Vec::new();
        }
        let Some(rematch) = self.rematch.as_mut() else {
            return Vec::new();
        };
        let steps = rematch.remote_response(accepted);
        self.apply_rematch_steps(steps)
    }

    /// Turns coordinator steps into frames and phase changes.
    fn apply_rematch_steps(&mut self, steps: Vec<RematchStep>) -> Vec<Effect> {
        let Some(session) = self.session.as_ref() else {
            return Vec::new();
        };
        let Some(game_id) = session.game_id else {
            warn!("Game id unknown, rematch impossible");
            return Vec::new();
        };
        let (player_id, opponent_id) = (session.player_id, session.opponent_id);

        let mut effects = Vec::new();
        for step in steps {
            match step {
                RematchStep::SendRequest => {
                    effects.push(Effect::Send(ClientMessage::RematchRequest { game_id, player_id }));
                }
                RematchStep::SendResponse(accepted) => {
                    effects.push(Effect::Send(ClientMessage::RematchResponse {
                        game_id,
                        player_id,
                        accepted,
                    }));
                }
                RematchStep::Prompt => debug!("Prompting for rematch"),
                RematchStep::StartRematch => {
                    info!("Both sides agreed to a rematch");
                    effects.push(Effect::Send(ClientMessage::StartRematch {
                        game_id,
                        player_id,
                        opponent_id,
                    }));
                }
                RematchStep::Declined => {
                    info!("Rematch declined");
                    effects.extend(self.reset());
                    self.notice = Some("Rematch declined".to_string());
                    return effects;
                }
            }
        }

        if self.phase == Phase::Finished && self.rematch.is_some() {
            self.phase = Phase::AwaitingRematch;
            self.role_preference = None;
            if let Some(session) = self.session.as_mut() {
                session.role_selected = false;
            }
            self.rematch_ticket += 1;
            effects.push(Effect::ScheduleRematchDeadline {
                after: self.timings.rematch_timeout,
                ticket: self.rematch_ticket,
            });
        }
        effects
    }

    #[instrument(skip(self))]
    fn on_rematch_deadline(&mut self, ticket: u64) -> Vec<Effect> {
        if self.phase != Phase::AwaitingRematch || ticket != self.rematch_ticket {
            return Vec::new();
        }
        info!("Rematch offer expired");
        let steps = self
            .rematch
            .as_mut()
            .map(RematchCoordinator::decline_local)
            .unwrap_or_default();
        let mut effects = self.apply_rematch_steps(steps);
        if self.phase == Phase::AwaitingRematch {
            effects.extend(self.reset());
        }
        self.notice = Some("Rematch offer expired".to_string());
        effects
    }

    /// Builds the presentation snapshot.
    pub fn view(&self) -> SessionView {
        let session = self.session.as_ref();
        let offer = self.rematch.as_ref().and_then(RematchCoordinator::offer);
        SessionView {
            cells: *self.board.cells(),
            phase: self.phase,
            mode: session.map(|s| s.mode),
            turn: session.map(|s| s.turn),
            local_mark: session.and_then(|s| s.local_mark),
            status: self.status_text(),
            warning: self.warning.clone(),
            result: self.result.clone(),
            input_enabled: self.input_enabled(),
            play_again_visible: self.phase == Phase::Finished
                && self.rematch_available
                && self.fatal.is_none(),
            rematch_prompt: self.phase == Phase::AwaitingRematch
                && offer.is_some_and(|o| o.awaiting_local_answer()),
            menu_visible: self.phase != Phase::Active || self.fatal.is_some(),
            nickname: session.and_then(|s| s.nickname.clone()),
            opponent_nickname: session.and_then(|s| s.opponent_nickname.clone()),
            stats: self.stats,
            offline_stats: self.offline_stats,
        }
    }

    fn input_enabled(&self) -> bool {
        self.phase == Phase::Active
            && self.fatal.is_none()
            && self.pending.is_none()
            && self
                .session
                .as_ref()
                .is_some_and(|s| {
                    s.turn == TurnOwner::Local
                        && s.local_mark.is_some()
                        && (s.mode == Mode::Offline || s.game_id.is_some())
                })
    }

    fn status_text(&self) -> String {
        if let Some(err) = &self.fatal {
            return err.to_string();
        }
        match self.phase {
            Phase::Idle => self
                .notice
                .clone()
                .unwrap_or_else(|| "Choose a game mode".to_string()),
            Phase::AwaitingOpponent => self
                .notice
                .clone()
                .unwrap_or_else(|| "Waiting for opponent...".to_string()),
            Phase::Active => {
                let Some(session) = &self.session else {
                    return String::new();
                };
                let Some(mark) = session.local_mark else {
                    return "Game in progress".to_string();
                };
                match (session.turn, session.mode) {
                    (TurnOwner::Local, _) => format!("Your turn ({})", mark),
                    (TurnOwner::Remote, Mode::Offline) => format!("AI's turn ({})", mark.opponent()),
                    (TurnOwner::Remote, Mode::Online) => {
                        format!("Opponent's turn ({})", mark.opponent())
                    }
                }
            }
            Phase::Finished => self
                .result
                .as_ref()
                .map(GameResult::to_string)
                .unwrap_or_else(|| "Game over".to_string()),
            Phase::AwaitingRematch => {
                let offer = self.rematch.as_ref().and_then(RematchCoordinator::offer);
                match offer {
                    Some(o) if o.awaiting_local_answer() => {
                        "Opponent wants a rematch. Accept? (y/n)".to_string()
                    }
                    Some(o) if o.agreed() => "Starting rematch...".to_string(),
                    _ => "Waiting for opponent to accept the rematch...".to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offline_machine() -> SessionMachine {
        let mut machine = SessionMachine::with_seed(Timings::default(), 3);
        machine.handle(SessionEvent::Intent(UserIntent::StartOffline));
        machine.handle(SessionEvent::SessionStarted {
            ticket: 1,
            descriptor: SessionDescriptor::new(9, Some(90), None, None, None),
        });
        machine
    }

    #[test]
    fn test_offline_start_is_local_x_first() {
        let machine = offline_machine();
        let session = machine.session().unwrap();
        assert_eq!(machine.phase(), Phase::Active);
        assert_eq!(session.local_mark, Some(Mark::X));
        assert_eq!(session.turn, TurnOwner::Local);
        assert_eq!(machine.view().status, "Your turn (X)");
    }

    #[test]
    fn test_offline_move_arms_bot() {
        let mut machine = offline_machine();
        let effects = machine.handle(SessionEvent::Intent(UserIntent::LocalMove(Position::TopLeft)));
        let [Effect::ScheduleBotMove { round, .. }] = effects.as_slice() else {
            panic!("expected a bot timer, got {:?}", effects);
        };
        assert_eq!(machine.view().status, "AI's turn (O)");
        assert!(!machine.view().input_enabled);

        machine.handle(SessionEvent::BotTurnDue { round: *round });
        assert_eq!(machine.board().count(Mark::O), 1);
        assert!(machine.view().input_enabled);
    }

    #[test]
    fn test_stale_bot_timer_ignored() {
        let mut machine = offline_machine();
        machine.handle(SessionEvent::Intent(UserIntent::LocalMove(Position::TopLeft)));
        machine.handle(SessionEvent::BotTurnDue { round: 0 });
        assert_eq!(machine.board().count(Mark::O), 0);
    }

    #[test]
    fn test_second_start_ignored_while_in_flight() {
        let mut machine = SessionMachine::with_seed(Timings::default(), 1);
        let first = machine.handle(SessionEvent::Intent(UserIntent::StartOffline));
        assert_eq!(first.len(), 1);
        assert_eq!(machine.phase(), Phase::Idle);
        assert!(machine.handle(SessionEvent::Intent(UserIntent::StartOffline)).is_empty());
        assert!(machine.handle(SessionEvent::Intent(UserIntent::StartOnline)).is_empty());
    }
}
