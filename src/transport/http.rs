//! HTTP client for the session endpoints.

use crate::protocol::{OfflineGameResponse, OfflineStats, PlayerId, QuickGameResponse};
use crate::protocol::{ServerStats, StartStatus};
use crate::session::{Mode, SessionDescriptor};
use crate::transport::SessionService;
use crate::{ClientConfig, SessionError};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// [`SessionService`] backed by reqwest.
#[derive(Debug, Clone)]
pub struct HttpSessionService {
    client: reqwest::Client,
    base_url: String,
    request_timeout: Duration,
    stats_timeout: Duration,
}

impl HttpSessionService {
    /// Creates a client for `base_url`.
    pub fn new(base_url: impl Into<String>, request_timeout: Duration, stats_timeout: Duration) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client: reqwest::Client::new(),
            base_url,
            request_timeout,
            stats_timeout,
        }
    }

    /// Creates a client from configuration.
    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(
            config.server_url().clone(),
            config.request_timeout(),
            config.stats_timeout(),
        )
    }

    /// Base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, SessionError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "POST");
        let response = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, "application/json")
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(unavailable)?
            .error_for_status()
            .map_err(unavailable)?;
        response.json::<T>().await.map_err(unavailable)
    }
}

fn unavailable(err: reqwest::Error) -> SessionError {
    warn!(error = %err, "Request failed");
    SessionError::ServiceUnavailable(err.to_string())
}

/// Checks the start status of a `/quick-game` body.
#[instrument(skip(body), fields(player_id = body.player_id))]
pub fn quick_game_descriptor(body: QuickGameResponse) -> Result<SessionDescriptor, SessionError> {
    if body.status == StartStatus::Error {
        return Err(SessionError::ServiceUnavailable(
            body.message.unwrap_or_else(|| "quick game refused".to_string()),
        ));
    }
    let opponent_id = match body.status {
        StartStatus::Started => body.opponent_id,
        _ => None,
    };
    Ok(SessionDescriptor::new(
        body.player_id,
        body.game_id,
        opponent_id,
        body.is_first_player,
        body.nickname,
    ))
}

/// Checks the start status of an `/offline-game` body.
#[instrument(skip(body), fields(player_id = body.player_id))]
pub fn offline_game_descriptor(body: OfflineGameResponse) -> Result<SessionDescriptor, SessionError> {
    if body.status == StartStatus::Error {
        return Err(SessionError::ServiceUnavailable(
            body.message.unwrap_or_else(|| "offline game refused".to_string()),
        ));
    }
    Ok(SessionDescriptor::new(
        body.player_id,
        Some(body.game_id),
        None,
        None,
        body.nickname,
    ))
}

#[async_trait]
impl SessionService for HttpSessionService {
    #[instrument(skip(self), fields(base_url = %self.base_url))]
    async fn request_session(&self, mode: Mode) -> Result<SessionDescriptor, SessionError> {
        let descriptor = match mode {
            Mode::Online => quick_game_descriptor(self.post_json("/quick-game").await?)?,
            Mode::Offline => offline_game_descriptor(self.post_json("/offline-game").await?)?,
        };
        info!(player_id = descriptor.player_id, "Session granted");
        Ok(descriptor)
    }

    #[instrument(skip(self), fields(base_url = %self.base_url))]
    async fn fetch_stats(&self) -> Result<ServerStats, SessionError> {
        let url = format!("{}/stats", self.base_url);
        let body = self
            .client
            .get(&url)
            .timeout(self.stats_timeout)
            .send()
            .await
            .map_err(unavailable)?
            .error_for_status()
            .map_err(unavailable)?
            .text()
            .await
            .map_err(unavailable)?;
        ServerStats::from_ndjson(&body)
    }

    #[instrument(skip(self), fields(base_url = %self.base_url))]
    async fn fetch_offline_stats(&self, player_id: PlayerId) -> Result<OfflineStats, SessionError> {
        let url = format!("{}/offline-stats?playerID={}", self.base_url, player_id);
        self.client
            .get(&url)
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(unavailable)?
            .error_for_status()
            .map_err(unavailable)?
            .json::<OfflineStats>()
            .await
            .map_err(unavailable)
    }
}
