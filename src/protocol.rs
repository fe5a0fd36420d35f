//! Wire formats spoken with the game authority.
//!
//! HTTP bodies and WebSocket frames are JSON. Frames carry a `type` tag;
//! identifiers keep the authority's camel-case spelling (`playerID`,
//! `gameID`). Boards travel as a nested 3x3 array of `"X"`, `"O"` and `""`.

use crate::SessionError;
use crossline_board::{Board, Cell, Mark, Position};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, instrument};

/// Player identifier issued by the authority.
pub type PlayerId = u64;

/// Game identifier issued by the authority.
pub type GameId = u64;

/// A board as it appears on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<String>>", into = "Vec<Vec<String>>")]
pub struct WireBoard(pub Board);

impl WireBoard {
    /// Unwraps the board.
    pub fn into_board(self) -> Board {
        self.0
    }
}

impl TryFrom<Vec<Vec<String>>> for WireBoard {
    type Error = String;

    fn try_from(rows: Vec<Vec<String>>) -> Result<Self, Self::Error> {
        if rows.len() != 3 || rows.iter().any(|row| row.len() != 3) {
            return Err(format!("board must be 3x3, got {} rows", rows.len()));
        }
        let mut cells = [Cell::Empty; 9];
        for (r, row) in rows.iter().enumerate() {
            for (c, symbol) in row.iter().enumerate() {
                cells[r * 3 + c] = Cell::from_symbol(symbol)
                    .ok_or_else(|| format!("unknown cell symbol {:?}", symbol))?;
            }
        }
        Ok(Self(Board::from_cells(cells)))
    }
}

impl From<WireBoard> for Vec<Vec<String>> {
    fn from(board: WireBoard) -> Self {
        board
            .0
            .to_symbols()
            .iter()
            .map(|row| row.iter().map(|s| s.to_string()).collect())
            .collect()
    }
}

/// Frames sent from the client to the authority.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Binds this connection to a known game.
    Register {
        /// Sender.
        #[serde(rename = "playerID")]
        player_id: PlayerId,
        /// Game to join.
        #[serde(rename = "gameID")]
        game_id: GameId,
    },
    /// A move request. `x` is the row, `y` the column.
    Move {
        /// Game the move belongs to.
        #[serde(rename = "gameID")]
        game_id: GameId,
        /// Sender.
        #[serde(rename = "playerID")]
        player_id: PlayerId,
        /// Row (0-2).
        x: usize,
        /// Column (0-2).
        y: usize,
    },
    /// Preferred mark while waiting for an opponent.
    SelectRole {
        /// Game being set up.
        #[serde(rename = "gameID")]
        game_id: GameId,
        /// Sender.
        #[serde(rename = "playerID")]
        player_id: PlayerId,
        /// Requested mark.
        role: Mark,
    },
    /// Offer to play again.
    RematchRequest {
        /// Finished game.
        #[serde(rename = "gameID")]
        game_id: GameId,
        /// Sender.
        #[serde(rename = "playerID")]
        player_id: PlayerId,
    },
    /// Answer to a rematch offer.
    RematchResponse {
        /// Finished game.
        #[serde(rename = "gameID")]
        game_id: GameId,
        /// Sender.
        #[serde(rename = "playerID")]
        player_id: PlayerId,
        /// Whether the sender agrees.
        accepted: bool,
    },
    /// Both sides agreed; asks the authority to set up the new game.
    StartRematch {
        /// Finished game.
        #[serde(rename = "gameID")]
        game_id: GameId,
        /// Sender.
        #[serde(rename = "playerID")]
        player_id: PlayerId,
        /// The other player, when known.
        #[serde(rename = "opponentID", skip_serializing_if = "Option::is_none", default)]
        opponent_id: Option<PlayerId>,
    },
}

impl ClientMessage {
    /// Serializes the frame to JSON text.
    #[instrument(skip(self))]
    pub fn encode(&self) -> Result<String, SessionError> {
        serde_json::to_string(self).map_err(|e| SessionError::MessageParse(e.to_string()))
    }

    /// Builds a move frame from a board position.
    pub fn move_at(game_id: GameId, player_id: PlayerId, pos: Position) -> Self {
        Self::Move {
            game_id,
            player_id,
            x: pos.row(),
            y: pos.col(),
        }
    }
}

/// Lifecycle status reported alongside board snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    /// Waiting for a second player.
    Waiting,
    /// In progress.
    #[default]
    Active,
    /// Game over.
    Finished,
    /// Anything newer than this client understands.
    #[serde(other)]
    Unknown,
}

/// Authoritative snapshot after a move.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BoardUpdate {
    /// Complete board.
    pub board: WireBoard,
    /// Mark whose turn it is now.
    pub turn: Mark,
    /// Game status.
    #[serde(default)]
    pub status: GameStatus,
    /// Row of the move just played, if reported.
    #[serde(default)]
    pub x: Option<usize>,
    /// Column of the move just played, if reported.
    #[serde(default)]
    pub y: Option<usize>,
}

/// Payload of a `game_start` frame.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GameStartPayload {
    /// Game identifier.
    #[serde(rename = "gameID")]
    pub game_id: GameId,
    /// Initial board; empty when absent.
    #[serde(default)]
    pub board: Option<WireBoard>,
    /// Mark assigned to this client. Absent or empty means none was assigned.
    #[serde(default, deserialize_with = "optional_role")]
    pub role: Option<Mark>,
    /// First player's id.
    #[serde(default)]
    pub player1: Option<PlayerId>,
    /// Second player's id.
    #[serde(default)]
    pub player2: Option<PlayerId>,
    /// This client's display name.
    #[serde(default)]
    pub nickname: Option<String>,
    /// Opponent's display name.
    #[serde(default, rename = "opponentNickname")]
    pub opponent_nickname: Option<String>,
}

impl GameStartPayload {
    /// The other participant, given our own id.
    pub fn opponent_of(&self, player_id: PlayerId) -> Option<PlayerId> {
        [self.player1, self.player2]
            .into_iter()
            .flatten()
            .find(|id| *id != player_id)
    }
}

fn optional_role<'de, D>(deserializer: D) -> Result<Option<Mark>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(Mark::from_symbol))
}

/// Frames pushed by the authority.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Greeting after the socket opens.
    Connected {
        /// Free-form text.
        #[serde(default)]
        message: Option<String>,
    },
    /// Non-fatal notice.
    Warning {
        /// Free-form text.
        #[serde(default)]
        message: Option<String>,
    },
    /// A game (or rematch) begins.
    GameStart(GameStartPayload),
    /// Snapshot after a human move.
    Move(BoardUpdate),
    /// Snapshot after a server-side bot move.
    AiMove(BoardUpdate),
    /// The opponent disconnected.
    OpponentLeft,
    /// Our last move was rejected.
    InvalidMove {
        /// Reason given by the authority.
        #[serde(default)]
        message: Option<String>,
    },
    /// The opponent offers a rematch.
    RematchRequest,
    /// The opponent answered our offer.
    RematchResponse {
        /// Whether they agreed.
        accepted: bool,
    },
    /// Generic failure report.
    Error {
        /// Reason given by the authority.
        #[serde(default)]
        message: Option<String>,
    },
    /// A frame type this client does not know.
    #[serde(other)]
    Unknown,
}

impl ServerMessage {
    /// Parses one frame of JSON text.
    #[instrument(skip(text), fields(len = text.len()))]
    pub fn decode(text: &str) -> Result<Self, SessionError> {
        serde_json::from_str(text).map_err(|e| {
            debug!(error = %e, "Frame did not parse");
            SessionError::MessageParse(e.to_string())
        })
    }
}

/// Start status reported by the session endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StartStatus {
    /// Queued, no opponent yet.
    Waiting,
    /// Matched (online) or created (offline).
    Started,
    /// The authority refused.
    Error,
}

/// Body of `POST /quick-game`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct QuickGameResponse {
    /// Our id.
    #[serde(rename = "playerID")]
    pub player_id: PlayerId,
    /// Matched opponent, if any.
    #[serde(default, rename = "opponentID")]
    pub opponent_id: Option<PlayerId>,
    /// Game id, when the authority assigns one up front.
    #[serde(default, rename = "gameID")]
    pub game_id: Option<GameId>,
    /// Start status.
    pub status: StartStatus,
    /// Whether we move first, when the match is already made.
    #[serde(default, rename = "isFirstPlayer")]
    pub is_first_player: Option<bool>,
    /// Generated display name.
    #[serde(default)]
    pub nickname: Option<String>,
    /// Error detail.
    #[serde(default)]
    pub message: Option<String>,
}

/// Body of `POST /offline-game`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OfflineGameResponse {
    /// Our id.
    #[serde(rename = "playerID")]
    pub player_id: PlayerId,
    /// Game created for us.
    #[serde(rename = "gameID")]
    pub game_id: GameId,
    /// Start status.
    pub status: StartStatus,
    /// Generated display name.
    #[serde(default)]
    pub nickname: Option<String>,
    /// Error detail.
    #[serde(default)]
    pub message: Option<String>,
}

/// Server-wide counters from `GET /stats`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ServerStats {
    /// Connected players.
    pub online: u64,
    /// Games in progress.
    pub games: u64,
    /// Games ever played, if reported.
    #[serde(default, rename = "totalGames", skip_serializing_if = "Option::is_none")]
    pub total_games: Option<u64>,
}

impl ServerStats {
    /// Parses a newline-delimited stats stream. The last non-empty line wins.
    #[instrument(skip(body), fields(len = body.len()))]
    pub fn from_ndjson(body: &str) -> Result<Self, SessionError> {
        let line = body
            .lines()
            .map(str::trim)
            .rev()
            .find(|line| !line.is_empty())
            .ok_or_else(|| SessionError::MessageParse("empty stats response".to_string()))?;
        serde_json::from_str(line).map_err(|e| SessionError::MessageParse(e.to_string()))
    }
}

/// A player's record against the bot, from `GET /offline-stats`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OfflineStats {
    /// Games won.
    pub wins: u64,
    /// Games lost.
    pub losses: u64,
    /// Games drawn.
    pub draws: u64,
}
