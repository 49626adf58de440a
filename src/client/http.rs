use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::{debug, error, instrument};

use super::TrackerClient;
use crate::game::{Game, Round};
use crate::shared::AppError;

/// HTTP implementation of the tracker client over reqwest.
pub struct HttpTrackerClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTrackerClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    fn check_token(bearer_token: &str) -> Result<(), AppError> {
        if bearer_token.is_empty() {
            error!("Bearer token is empty");
            return Err(AppError::Auth("Bearer token is required".to_string()));
        }
        Ok(())
    }

    fn classify_status(status: StatusCode, url: &str) -> AppError {
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                AppError::Auth(format!("Credential rejected by {url}"))
            }
            s if s.is_server_error() => {
                AppError::Transient(format!("{url} returned {s}"))
            }
            s => AppError::Network(format!("{url} returned {s}")),
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        bearer_token: &str,
    ) -> Result<T, AppError> {
        let response = self
            .client
            .get(url)
            .bearer_auth(bearer_token)
            .send()
            .await
            .map_err(|e| AppError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Self::classify_status(status, url));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| AppError::Network(e.to_string()))
    }
}

#[async_trait]
impl TrackerClient for HttpTrackerClient {
    #[instrument(skip(self, bearer_token))]
    async fn list_games(&self, bearer_token: &str) -> Result<Vec<Game>, AppError> {
        Self::check_token(bearer_token)?;

        let url = format!("{}/games?show_all=1", self.base_url);
        let games: Vec<Game> = self.get_json(&url, bearer_token).await?;

        debug!(games = games.len(), "Fetched game list from tracker");
        Ok(games)
    }

    #[instrument(skip(self, bearer_token))]
    async fn list_rounds(
        &self,
        game_id: &str,
        bearer_token: &str,
    ) -> Result<Vec<Round>, AppError> {
        Self::check_token(bearer_token)?;

        let url = format!("{}/games/{}/rounds", self.base_url, game_id);
        let rounds: Vec<Round> = self.get_json(&url, bearer_token).await?;

        debug!(game_id, rounds = rounds.len(), "Fetched rounds from tracker");
        Ok(rounds)
    }
}
