use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{debug, instrument, warn};

use super::GameStore;
use crate::game::{Game, Round};
use crate::shared::AppError;

struct StoredGame {
    game: Game,
    #[allow(dead_code)] // Metadata recorded at persist time
    fetched_at: DateTime<Utc>,
}

/// In-memory implementation of GameStore for development and testing
///
/// This provides a realistic implementation that can be used without a
/// real database connection. Data is stored in memory and will be lost
/// when the application restarts. Both maps are mutated under a single
/// lock ordering (games, then rounds) so multi-step operations stay
/// consistent.
#[derive(Default)]
pub struct InMemoryGameStore {
    games: Mutex<HashMap<String, StoredGame>>,
    rounds: Mutex<HashMap<String, Vec<Round>>>,
}

impl InMemoryGameStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an in-memory store pre-populated with games
    pub fn with_games(games: Vec<Game>) -> Self {
        let store = Self::new();
        {
            let mut map = store.games.lock().unwrap();
            for game in games {
                if game.id.is_empty() {
                    continue;
                }
                map.insert(
                    game.id.clone(),
                    StoredGame {
                        game,
                        fetched_at: Utc::now(),
                    },
                );
            }
        }
        store
    }

    pub fn game_count(&self) -> usize {
        self.games.lock().unwrap().len()
    }
}

#[async_trait]
impl GameStore for InMemoryGameStore {
    async fn game_exists(&self, game_id: &str) -> Result<bool, AppError> {
        Ok(self.games.lock().unwrap().contains_key(game_id))
    }

    #[instrument(skip(self, games))]
    async fn replace_all_games(&self, games: &[Game]) -> Result<(), AppError> {
        if games.is_empty() {
            warn!("No games to save");
            return Ok(());
        }

        let mut game_map = self.games.lock().unwrap();
        let mut round_map = self.rounds.lock().unwrap();
        game_map.clear();
        round_map.clear();

        for game in games {
            if game.id.is_empty() {
                warn!("Skipping game with empty id");
                continue;
            }
            game_map.insert(
                game.id.clone(),
                StoredGame {
                    game: game.clone(),
                    fetched_at: Utc::now(),
                },
            );
        }

        debug!(games = game_map.len(), "Replaced all games in memory");
        Ok(())
    }

    #[instrument(skip(self, games))]
    async fn upsert_games(&self, games: &[Game]) -> Result<(), AppError> {
        if games.is_empty() {
            warn!("No games to save");
            return Ok(());
        }

        let mut game_map = self.games.lock().unwrap();
        let mut round_map = self.rounds.lock().unwrap();

        for game in games {
            if game.id.is_empty() {
                warn!("Skipping game with empty id");
                continue;
            }
            // Replacing a game drops its stored rounds as well
            if game_map.remove(&game.id).is_some() {
                round_map.remove(&game.id);
            }
            game_map.insert(
                game.id.clone(),
                StoredGame {
                    game: game.clone(),
                    fetched_at: Utc::now(),
                },
            );
        }

        Ok(())
    }

    async fn upsert_rounds(&self, game_id: &str, rounds: &[Round]) -> Result<(), AppError> {
        if game_id.is_empty() || rounds.is_empty() {
            return Ok(());
        }
        let map = HashMap::from([(game_id.to_string(), rounds.to_vec())]);
        self.upsert_rounds_bulk(&map).await
    }

    #[instrument(skip(self, rounds_by_game))]
    async fn upsert_rounds_bulk(
        &self,
        rounds_by_game: &HashMap<String, Vec<Round>>,
    ) -> Result<(), AppError> {
        if rounds_by_game.is_empty() {
            warn!("No rounds to save");
            return Ok(());
        }

        let mut round_map = self.rounds.lock().unwrap();
        for (game_id, rounds) in rounds_by_game {
            if game_id.is_empty() || rounds.is_empty() {
                continue;
            }
            let stamped: Vec<Round> = rounds
                .iter()
                .map(|r| {
                    let mut r = r.clone();
                    r.game_id = Some(game_id.clone());
                    r
                })
                .collect();
            round_map.insert(game_id.clone(), stamped);
        }

        Ok(())
    }

    async fn get_game(&self, game_id: &str) -> Result<Option<Game>, AppError> {
        Ok(self
            .games
            .lock()
            .unwrap()
            .get(game_id)
            .map(|s| s.game.clone()))
    }

    async fn get_rounds(&self, game_id: &str) -> Result<Vec<Round>, AppError> {
        Ok(self
            .rounds
            .lock()
            .unwrap()
            .get(game_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_all_rounds(&self) -> Result<HashMap<String, Vec<Round>>, AppError> {
        Ok(self.rounds.lock().unwrap().clone())
    }

    async fn get_all_games(&self) -> Result<Vec<Game>, AppError> {
        Ok(self
            .games
            .lock()
            .unwrap()
            .values()
            .map(|s| s.game.clone())
            .collect())
    }

    async fn get_all_game_ids(&self) -> Result<Vec<String>, AppError> {
        Ok(self.games.lock().unwrap().keys().cloned().collect())
    }

    async fn game_ids_having_rounds(&self) -> Result<Vec<String>, AppError> {
        Ok(self.rounds.lock().unwrap().keys().cloned().collect())
    }

    #[instrument(skip(self))]
    async fn delete_game(&self, game_id: &str) -> Result<(), AppError> {
        let mut game_map = self.games.lock().unwrap();
        let mut round_map = self.rounds.lock().unwrap();
        round_map.remove(game_id);
        game_map.remove(game_id);
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_games_created_after(&self, cutoff: DateTime<Utc>) -> Result<(), AppError> {
        let mut game_map = self.games.lock().unwrap();
        let mut round_map = self.rounds.lock().unwrap();

        let doomed: Vec<String> = game_map
            .values()
            .filter(|s| s.game.created_datetime() > cutoff)
            .map(|s| s.game.id.clone())
            .collect();

        for game_id in &doomed {
            round_map.remove(game_id);
            game_map.remove(game_id);
        }

        debug!(deleted = doomed.len(), "Deleted games created after cutoff");
        Ok(())
    }
}
