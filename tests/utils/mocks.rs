use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use mahjongstats::client::TrackerClient;
use mahjongstats::game::{Game, Round};
use mahjongstats::shared::AppError;

// ============================================================================
// Mock Infrastructure
// ============================================================================

/// Scripted tracker client. Games and rounds are set up front; per-game
/// failures can be injected to exercise the sync loops' failure
/// isolation. All calls are recorded for assertions.
#[derive(Default)]
pub struct MockTrackerClient {
    games: Mutex<Vec<Game>>,
    rounds: Mutex<HashMap<String, Vec<Round>>>,
    server_error_games: Mutex<Vec<String>>,
    pub round_requests: Mutex<Vec<String>>,
}

impl MockTrackerClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_games(games: Vec<Game>) -> Self {
        let mock = Self::new();
        *mock.games.lock().unwrap() = games;
        mock
    }

    pub fn set_games(&self, games: Vec<Game>) {
        *self.games.lock().unwrap() = games;
    }

    pub fn set_rounds(&self, game_id: &str, rounds: Vec<Round>) {
        self.rounds
            .lock()
            .unwrap()
            .insert(game_id.to_string(), rounds);
    }

    /// Makes round fetches for this game fail with a 5xx-style error
    pub fn fail_rounds_with_server_error(&self, game_id: &str) {
        self.server_error_games
            .lock()
            .unwrap()
            .push(game_id.to_string());
    }

    pub fn round_request_count(&self) -> usize {
        self.round_requests.lock().unwrap().len()
    }
}

#[async_trait]
impl TrackerClient for MockTrackerClient {
    async fn list_games(&self, bearer_token: &str) -> Result<Vec<Game>, AppError> {
        if bearer_token.is_empty() {
            return Err(AppError::Auth("Bearer token is required".to_string()));
        }
        Ok(self.games.lock().unwrap().clone())
    }

    async fn list_rounds(
        &self,
        game_id: &str,
        bearer_token: &str,
    ) -> Result<Vec<Round>, AppError> {
        if bearer_token.is_empty() {
            return Err(AppError::Auth("Bearer token is required".to_string()));
        }

        self.round_requests
            .lock()
            .unwrap()
            .push(game_id.to_string());

        if self
            .server_error_games
            .lock()
            .unwrap()
            .contains(&game_id.to_string())
        {
            return Err(AppError::Transient(format!(
                "games/{game_id}/rounds returned 500"
            )));
        }

        Ok(self
            .rounds
            .lock()
            .unwrap()
            .get(game_id)
            .cloned()
            .unwrap_or_default())
    }
}
