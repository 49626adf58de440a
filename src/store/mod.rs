mod memory;
mod postgres;

pub use memory::InMemoryGameStore;
pub use postgres::PostgresGameStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

use crate::game::{Game, Round};
use crate::shared::AppError;

/// Trait for durable game and round storage.
///
/// Games are keyed by their tracker-assigned identifier; rounds belong to
/// exactly one game. Upserts use delete-then-insert semantics per key so a
/// re-fetched record always reflects the latest payload, and every
/// multi-step mutation is all-or-nothing: a failure must not leave rounds
/// referencing deleted games or vice versa.
#[async_trait]
pub trait GameStore: Send + Sync {
    async fn game_exists(&self, game_id: &str) -> Result<bool, AppError>;

    /// Clears all games and all rounds, then inserts the given set.
    /// Games without an identifier are skipped with a warning.
    async fn replace_all_games(&self, games: &[Game]) -> Result<(), AppError>;

    /// Upserts games by identifier. An existing game is deleted together
    /// with its rounds before the new copy is inserted.
    async fn upsert_games(&self, games: &[Game]) -> Result<(), AppError>;

    /// Replaces the stored rounds of one game.
    async fn upsert_rounds(&self, game_id: &str, rounds: &[Round]) -> Result<(), AppError>;

    /// Bulk form of `upsert_rounds`; same delete-then-insert semantics,
    /// scoped per game identifier.
    async fn upsert_rounds_bulk(
        &self,
        rounds_by_game: &HashMap<String, Vec<Round>>,
    ) -> Result<(), AppError>;

    async fn get_game(&self, game_id: &str) -> Result<Option<Game>, AppError>;
    async fn get_rounds(&self, game_id: &str) -> Result<Vec<Round>, AppError>;
    async fn get_all_rounds(&self) -> Result<HashMap<String, Vec<Round>>, AppError>;
    async fn get_all_games(&self) -> Result<Vec<Game>, AppError>;
    async fn get_all_game_ids(&self) -> Result<Vec<String>, AppError>;

    /// Distinct game identifiers that have at least one stored round.
    async fn game_ids_having_rounds(&self) -> Result<Vec<String>, AppError>;

    async fn delete_game(&self, game_id: &str) -> Result<(), AppError>;

    /// Deletes games created strictly after the given instant, cascading
    /// to their rounds first.
    async fn delete_games_created_after(&self, cutoff: DateTime<Utc>) -> Result<(), AppError>;
}
