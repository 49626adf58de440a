use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Row, Transaction};
use std::collections::HashMap;
use tracing::{debug, instrument, warn};

use super::GameStore;
use crate::game::{Game, Player, Round};
use crate::shared::AppError;

/// PostgreSQL implementation of the game store.
///
/// Games are stored as one row per game (players as a comma-joined list,
/// points as JSON); rounds are stored as one JSON row per round keyed by
/// game id. Multi-step mutations run inside a single transaction.
pub struct PostgresGameStore {
    pool: PgPool,
}

impl PostgresGameStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn storage_err(context: &str) -> impl FnOnce(sqlx::Error) -> AppError + '_ {
        move |e| {
            warn!(error = %e, "{context}");
            AppError::Storage(e.to_string())
        }
    }

    async fn insert_game(
        tx: &mut Transaction<'_, Postgres>,
        game: &Game,
    ) -> Result<(), AppError> {
        let players: Vec<String> = game.players.iter().map(|p| p.name.clone()).collect();
        let points_json = serde_json::to_string(&game.points)?;

        sqlx::query(
            "INSERT INTO stored_games (game_id, players, points_json, created_at, fetched_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(&game.id)
        .bind(players.join(","))
        .bind(points_json)
        .bind(game.created_datetime())
        .bind(Utc::now())
        .execute(&mut **tx)
        .await
        .map_err(Self::storage_err("Failed to insert game"))?;

        Ok(())
    }

    async fn delete_games_with_rounds(
        tx: &mut Transaction<'_, Postgres>,
        game_ids: &[String],
    ) -> Result<(), AppError> {
        if game_ids.is_empty() {
            return Ok(());
        }

        // Rounds first so the store never holds rounds for a missing game
        sqlx::query("DELETE FROM stored_rounds WHERE game_id = ANY($1)")
            .bind(game_ids)
            .execute(&mut **tx)
            .await
            .map_err(Self::storage_err("Failed to delete rounds"))?;

        sqlx::query("DELETE FROM stored_games WHERE game_id = ANY($1)")
            .bind(game_ids)
            .execute(&mut **tx)
            .await
            .map_err(Self::storage_err("Failed to delete games"))?;

        Ok(())
    }

    fn game_from_row(row: &sqlx::postgres::PgRow) -> Result<Game, AppError> {
        let game_id: String = row.get("game_id");
        let players_joined: String = row.get("players");
        let points_json: String = row.get("points_json");
        let created_at: DateTime<Utc> = row.get("created_at");

        let points: Vec<Vec<i32>> = serde_json::from_str(&points_json)?;
        let players = players_joined
            .split(',')
            .map(|name| Player {
                name: name.to_string(),
            })
            .collect();

        Ok(Game {
            id: game_id,
            players,
            points,
            created_at: created_at.timestamp(),
            ..Game::default()
        })
    }

    fn round_from_row(row: &sqlx::postgres::PgRow) -> Result<(String, Round), AppError> {
        let game_id: String = row.get("game_id");
        let round_json: String = row.get("round_json");
        let mut round: Round = serde_json::from_str(&round_json)?;
        round.game_id = Some(game_id.clone());
        Ok((game_id, round))
    }
}

#[async_trait]
impl GameStore for PostgresGameStore {
    async fn game_exists(&self, game_id: &str) -> Result<bool, AppError> {
        let row = sqlx::query("SELECT 1 FROM stored_games WHERE game_id = $1")
            .bind(game_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Self::storage_err("Failed to check game existence"))?;
        Ok(row.is_some())
    }

    #[instrument(skip(self, games))]
    async fn replace_all_games(&self, games: &[Game]) -> Result<(), AppError> {
        if games.is_empty() {
            warn!("No games to save");
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM stored_rounds")
            .execute(&mut *tx)
            .await
            .map_err(Self::storage_err("Failed to clear rounds"))?;
        sqlx::query("DELETE FROM stored_games")
            .execute(&mut *tx)
            .await
            .map_err(Self::storage_err("Failed to clear games"))?;

        for game in games {
            if game.id.is_empty() {
                warn!("Skipping game with empty id");
                continue;
            }
            Self::insert_game(&mut tx, game).await?;
        }

        tx.commit().await?;
        debug!(games = games.len(), "Replaced all games in database");
        Ok(())
    }

    #[instrument(skip(self, games))]
    async fn upsert_games(&self, games: &[Game]) -> Result<(), AppError> {
        if games.is_empty() {
            warn!("No games to save");
            return Ok(());
        }

        let incoming: Vec<&Game> = games
            .iter()
            .filter(|g| {
                if g.id.is_empty() {
                    warn!("Skipping game with empty id");
                    false
                } else {
                    true
                }
            })
            .collect();
        if incoming.is_empty() {
            return Ok(());
        }

        let ids: Vec<String> = incoming.iter().map(|g| g.id.clone()).collect();

        let mut tx = self.pool.begin().await?;
        Self::delete_games_with_rounds(&mut tx, &ids).await?;
        for game in incoming {
            Self::insert_game(&mut tx, game).await?;
        }
        tx.commit().await?;

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

        let mut tx = self.pool.begin().await?;

        for (game_id, rounds) in rounds_by_game {
            if game_id.is_empty() || rounds.is_empty() {
                continue;
            }

            sqlx::query("DELETE FROM stored_rounds WHERE game_id = $1")
                .bind(game_id)
                .execute(&mut *tx)
                .await
                .map_err(Self::storage_err("Failed to delete existing rounds"))?;

            for round in rounds {
                let mut stamped = round.clone();
                stamped.game_id = Some(game_id.clone());
                let round_json = serde_json::to_string(&stamped)?;

                sqlx::query(
                    "INSERT INTO stored_rounds (game_id, round_json, created_at) \
                     VALUES ($1, $2, $3)",
                )
                .bind(game_id)
                .bind(round_json)
                .bind(Utc::now())
                .execute(&mut *tx)
                .await
                .map_err(Self::storage_err("Failed to insert round"))?;
            }
        }

        tx.commit().await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_game(&self, game_id: &str) -> Result<Option<Game>, AppError> {
        let row = sqlx::query(
            "SELECT game_id, players, points_json, created_at FROM stored_games \
             WHERE game_id = $1",
        )
        .bind(game_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Self::storage_err("Failed to fetch game"))?;

        row.as_ref().map(Self::game_from_row).transpose()
    }

    #[instrument(skip(self))]
    async fn get_rounds(&self, game_id: &str) -> Result<Vec<Round>, AppError> {
        let rows = sqlx::query(
            "SELECT game_id, round_json FROM stored_rounds WHERE game_id = $1 ORDER BY id",
        )
        .bind(game_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Self::storage_err("Failed to fetch rounds"))?;

        rows.iter()
            .map(|row| Self::round_from_row(row).map(|(_, round)| round))
            .collect()
    }

    async fn get_all_rounds(&self) -> Result<HashMap<String, Vec<Round>>, AppError> {
        let rows = sqlx::query("SELECT game_id, round_json FROM stored_rounds ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(Self::storage_err("Failed to fetch all rounds"))?;

        let mut by_game: HashMap<String, Vec<Round>> = HashMap::new();
        for row in &rows {
            let (game_id, round) = Self::round_from_row(row)?;
            by_game.entry(game_id).or_default().push(round);
        }
        Ok(by_game)
    }

    async fn get_all_games(&self) -> Result<Vec<Game>, AppError> {
        let rows =
            sqlx::query("SELECT game_id, players, points_json, created_at FROM stored_games")
                .fetch_all(&self.pool)
                .await
                .map_err(Self::storage_err("Failed to fetch all games"))?;

        rows.iter().map(Self::game_from_row).collect()
    }

    async fn get_all_game_ids(&self) -> Result<Vec<String>, AppError> {
        let rows = sqlx::query("SELECT game_id FROM stored_games")
            .fetch_all(&self.pool)
            .await
            .map_err(Self::storage_err("Failed to fetch game ids"))?;

        Ok(rows.iter().map(|r| r.get("game_id")).collect())
    }

    async fn game_ids_having_rounds(&self) -> Result<Vec<String>, AppError> {
        let rows = sqlx::query("SELECT DISTINCT game_id FROM stored_rounds")
            .fetch_all(&self.pool)
            .await
            .map_err(Self::storage_err("Failed to fetch game ids with rounds"))?;

        Ok(rows.iter().map(|r| r.get("game_id")).collect())
    }

    #[instrument(skip(self))]
    async fn delete_game(&self, game_id: &str) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;
        Self::delete_games_with_rounds(&mut tx, &[game_id.to_string()]).await?;
        tx.commit().await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_games_created_after(&self, cutoff: DateTime<Utc>) -> Result<(), AppError> {
        let rows = sqlx::query("SELECT game_id FROM stored_games WHERE created_at > $1")
            .bind(cutoff)
            .fetch_all(&self.pool)
            .await
            .map_err(Self::storage_err("Failed to find games after cutoff"))?;

        let doomed: Vec<String> = rows.iter().map(|r| r.get("game_id")).collect();
        if doomed.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;
        Self::delete_games_with_rounds(&mut tx, &doomed).await?;
        tx.commit().await?;

        debug!(deleted = doomed.len(), "Deleted games created after cutoff");
        Ok(())
    }
}
