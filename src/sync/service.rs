use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{info, instrument, warn};

use super::{BackfillOptions, RoundSyncReport, SyncConfig};
use crate::client::TrackerClient;
use crate::game::{Game, Round};
use crate::shared::AppError;
use crate::store::GameStore;

/// Orchestrates reconciliation of the local store against the remote
/// tracker.
///
/// All operations are driven by comparing local identifiers against
/// remote results; there is no session state between calls. Round
/// fetches are strictly sequential and throttled to respect the
/// tracker's rate limits.
pub struct SyncService {
    store: Arc<dyn GameStore + Send + Sync>,
    client: Arc<dyn TrackerClient + Send + Sync>,
    config: SyncConfig,
}

impl SyncService {
    pub fn new(
        store: Arc<dyn GameStore + Send + Sync>,
        client: Arc<dyn TrackerClient + Send + Sync>,
    ) -> Self {
        Self::with_config(store, client, SyncConfig::default())
    }

    pub fn with_config(
        store: Arc<dyn GameStore + Send + Sync>,
        client: Arc<dyn TrackerClient + Send + Sync>,
        config: SyncConfig,
    ) -> Self {
        Self {
            store,
            client,
            config,
        }
    }

    /// Full refresh: fetches all remote games and replaces the local set
    /// wholesale. Rounds referencing the old games are dropped by the
    /// replace; refetch them afterwards if needed.
    #[instrument(skip(self, bearer_token))]
    pub async fn sync_all(&self, bearer_token: &str) -> Result<Vec<Game>, AppError> {
        let games = self.client.list_games(bearer_token).await?;

        if !games.is_empty() {
            self.store.replace_all_games(&games).await?;
        }

        info!(games = games.len(), "Full game sync completed");
        Ok(games)
    }

    /// Incremental discovery: fetches the remote game list and upserts
    /// only games whose identifier is not yet stored. Idempotent; a
    /// re-run with an unchanged remote list is a no-op.
    #[instrument(skip(self, bearer_token))]
    pub async fn fetch_and_sync_new(&self, bearer_token: &str) -> Result<Vec<Game>, AppError> {
        let remote_games = self.client.list_games(bearer_token).await?;
        if remote_games.is_empty() {
            return Ok(Vec::new());
        }

        let existing: HashSet<String> =
            self.store.get_all_game_ids().await?.into_iter().collect();

        let new_games: Vec<Game> = remote_games
            .into_iter()
            .filter(|g| match g.validate() {
                Ok(()) => !existing.contains(&g.id),
                Err(e) => {
                    warn!(error = %e, "Skipping invalid game from tracker");
                    false
                }
            })
            .collect();

        if !new_games.is_empty() {
            self.store.upsert_games(&new_games).await?;
        }

        info!(new_games = new_games.len(), "Incremental game sync completed");
        Ok(new_games)
    }

    /// Date-scoped resync: deletes local games created strictly after
    /// the cutoff, then re-fetches and upserts the remote games created
    /// strictly after it. Both sides use the same strict comparison so
    /// the delete and the filter cannot diverge; a remote game created
    /// exactly at the cutoff is left untouched.
    #[instrument(skip(self, bearer_token))]
    pub async fn sync_from_date(
        &self,
        cutoff: DateTime<Utc>,
        bearer_token: &str,
    ) -> Result<Vec<Game>, AppError> {
        self.store.delete_games_created_after(cutoff).await?;

        let remote_games = self.client.list_games(bearer_token).await?;
        if remote_games.is_empty() {
            return Ok(Vec::new());
        }

        let games_to_sync: Vec<Game> = remote_games
            .into_iter()
            .filter(|g| match g.validate() {
                Ok(()) => g.created_datetime() > cutoff,
                Err(e) => {
                    warn!(error = %e, "Skipping invalid game from tracker");
                    false
                }
            })
            .collect();

        if !games_to_sync.is_empty() {
            self.store.upsert_games(&games_to_sync).await?;
        }

        info!(
            synced = games_to_sync.len(),
            %cutoff,
            "Date-scoped resync completed"
        );
        Ok(games_to_sync)
    }

    /// Game identifiers stored locally that have no rounds yet.
    pub async fn games_needing_rounds(&self) -> Result<Vec<String>, AppError> {
        let all_ids = self.store.get_all_game_ids().await?;
        let with_rounds: HashSet<String> = self
            .store
            .game_ids_having_rounds()
            .await?
            .into_iter()
            .collect();

        Ok(all_ids
            .into_iter()
            .filter(|id| !with_rounds.contains(id))
            .collect())
    }

    /// Fetches and persists the rounds of one game, stamping the owning
    /// game id into each round. A transient upstream failure (5xx) is
    /// treated as "no rounds for this game".
    #[instrument(skip(self, bearer_token))]
    pub async fn fetch_game_rounds(
        &self,
        game_id: &str,
        bearer_token: &str,
    ) -> Result<Vec<Round>, AppError> {
        let mut rounds = match self.client.list_rounds(game_id, bearer_token).await {
            Ok(rounds) => rounds,
            Err(e) if e.is_transient() => {
                warn!(game_id, error = %e, "Tracker returned a server error, skipping this game");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e),
        };

        for round in &mut rounds {
            round.game_id = Some(game_id.to_string());
        }

        if !rounds.is_empty() {
            self.store.upsert_rounds(game_id, &rounds).await?;
        }

        Ok(rounds)
    }

    /// Throttled backfill of all games missing round detail, newest
    /// first so recent games win when the run is interrupted. Per-game
    /// failures are logged and skipped; the loop keeps going.
    #[instrument(skip(self, bearer_token, options))]
    pub async fn sync_missing_rounds(
        &self,
        bearer_token: &str,
        options: BackfillOptions,
    ) -> Result<RoundSyncReport, AppError> {
        if bearer_token.is_empty() {
            return Err(AppError::Auth("Bearer token is required".to_string()));
        }

        let needing: HashSet<String> =
            self.games_needing_rounds().await?.into_iter().collect();
        if needing.is_empty() {
            return Ok(RoundSyncReport::default());
        }

        let mut targets: Vec<Game> = self
            .store
            .get_all_games()
            .await?
            .into_iter()
            .filter(|g| !g.id.is_empty() && needing.contains(&g.id))
            .collect();
        targets.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let delay = options.throttle_delay.unwrap_or(self.config.throttle_delay);
        let total = targets.len();
        info!(total, ?delay, "Starting throttled round backfill");

        let mut report = RoundSyncReport::default();

        for (i, game) in targets.iter().enumerate() {
            if let Some(cancel) = &options.cancel {
                if cancel.is_cancelled() {
                    info!(completed = i, total, "Round backfill cancelled");
                    break;
                }
            }

            match self.fetch_game_rounds(&game.id, bearer_token).await {
                Ok(rounds) => {
                    report.total_rounds += rounds.len();
                    report.game_ids.push(game.id.clone());
                }
                Err(e) => {
                    warn!(game_id = %game.id, error = %e, "Failed to sync rounds, skipping game");
                }
            }

            if let Some(progress) = &options.progress {
                progress(i + 1, total);
            }

            if i + 1 < total {
                tokio::time::sleep(delay).await;
            }
        }

        info!(
            synced = report.game_ids.len(),
            rounds = report.total_rounds,
            "Round backfill completed"
        );
        Ok(report)
    }

    /// Throttled fetch of rounds for an explicit game list, persisting
    /// each game's rounds as they arrive. Same failure isolation and
    /// delay contract as `sync_missing_rounds`.
    #[instrument(skip(self, games, bearer_token, options))]
    pub async fn fetch_rounds_throttled(
        &self,
        games: &[Game],
        bearer_token: &str,
        options: BackfillOptions,
    ) -> Result<HashMap<String, Vec<Round>>, AppError> {
        if bearer_token.is_empty() {
            return Err(AppError::Auth("Bearer token is required".to_string()));
        }

        let mut rounds_by_game = HashMap::new();
        if games.is_empty() {
            return Ok(rounds_by_game);
        }

        let delay = options.throttle_delay.unwrap_or(self.config.throttle_delay);
        let total = games.len();
        info!(total, ?delay, "Fetching rounds for game list");

        for (i, game) in games.iter().enumerate() {
            if game.id.is_empty() {
                continue;
            }

            if let Some(cancel) = &options.cancel {
                if cancel.is_cancelled() {
                    info!(completed = i, total, "Round fetch cancelled");
                    break;
                }
            }

            match self.fetch_game_rounds(&game.id, bearer_token).await {
                Ok(rounds) => {
                    rounds_by_game.insert(game.id.clone(), rounds);
                }
                Err(e) => {
                    warn!(game_id = %game.id, error = %e, "Failed to fetch rounds, skipping game");
                }
            }

            if let Some(progress) = &options.progress {
                progress(i + 1, total);
            }

            if i + 1 < total {
                tokio::time::sleep(delay).await;
            }
        }

        info!(
            games = rounds_by_game.len(),
            "Completed fetching rounds for game list"
        );
        Ok(rounds_by_game)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Player;
    use crate::store::InMemoryGameStore;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;

    /// Scripted tracker client for sync tests
    #[derive(Default)]
    struct ScriptedClient {
        games: Vec<Game>,
        rounds: HashMap<String, Vec<Round>>,
        failing_games: HashMap<String, FailureKind>,
        round_calls: Mutex<Vec<String>>,
    }

    #[derive(Clone, Copy)]
    enum FailureKind {
        Transient,
        Network,
    }

    #[async_trait]
    impl TrackerClient for ScriptedClient {
        async fn list_games(&self, bearer_token: &str) -> Result<Vec<Game>, AppError> {
            if bearer_token.is_empty() {
                return Err(AppError::Auth("Bearer token is required".to_string()));
            }
            Ok(self.games.clone())
        }

        async fn list_rounds(
            &self,
            game_id: &str,
            _bearer_token: &str,
        ) -> Result<Vec<Round>, AppError> {
            self.round_calls.lock().unwrap().push(game_id.to_string());
            match self.failing_games.get(game_id) {
                Some(FailureKind::Transient) => {
                    Err(AppError::Transient("server error".to_string()))
                }
                Some(FailureKind::Network) => Err(AppError::Network("connect".to_string())),
                None => Ok(self.rounds.get(game_id).cloned().unwrap_or_default()),
            }
        }
    }

    fn game(id: &str, created_at: i64) -> Game {
        Game {
            id: id.to_string(),
            created_at,
            players: vec![Player {
                name: "someone".to_string(),
            }],
            points: vec![vec![25000]],
            ..Game::default()
        }
    }

    fn round(label: &str) -> Round {
        Round {
            round: Some(label.to_string()),
            ..Round::default()
        }
    }

    fn service(client: ScriptedClient) -> (Arc<InMemoryGameStore>, SyncService) {
        let store = Arc::new(InMemoryGameStore::new());
        let sync = SyncService::with_config(
            store.clone(),
            Arc::new(client),
            SyncConfig {
                throttle_delay: Duration::ZERO,
            },
        );
        (store, sync)
    }

    #[tokio::test]
    async fn sync_all_replaces_local_store() {
        let client = ScriptedClient {
            games: vec![game("g1", 100), game("g2", 200)],
            ..ScriptedClient::default()
        };
        let (store, sync) = service(client);
        store.upsert_games(&[game("stale", 50)]).await.unwrap();

        let synced = sync.sync_all("token").await.unwrap();

        assert_eq!(synced.len(), 2);
        assert!(!store.game_exists("stale").await.unwrap());
        assert!(store.game_exists("g1").await.unwrap());
    }

    #[tokio::test]
    async fn fetch_and_sync_new_is_idempotent() {
        let client = ScriptedClient {
            games: vec![game("g1", 100), game("g2", 200)],
            ..ScriptedClient::default()
        };
        let (store, sync) = service(client);

        let first = sync.fetch_and_sync_new("token").await.unwrap();
        assert_eq!(first.len(), 2);

        let second = sync.fetch_and_sync_new("token").await.unwrap();
        assert!(second.is_empty());
        assert_eq!(store.game_count(), 2);
    }

    #[tokio::test]
    async fn fetch_and_sync_new_skips_games_without_id() {
        let client = ScriptedClient {
            games: vec![game("", 100), game("g1", 200)],
            ..ScriptedClient::default()
        };
        let (store, sync) = service(client);

        let new_games = sync.fetch_and_sync_new("token").await.unwrap();

        assert_eq!(new_games.len(), 1);
        assert_eq!(store.game_count(), 1);
    }

    #[tokio::test]
    async fn sync_from_date_uses_strict_cutoff_on_both_sides() {
        let client = ScriptedClient {
            games: vec![game("at", 200), game("after", 300)],
            ..ScriptedClient::default()
        };
        let (store, sync) = service(client);
        store
            .upsert_games(&[game("before", 100), game("at", 200), game("stale", 300)])
            .await
            .unwrap();

        let cutoff = game("at", 200).created_datetime();
        let synced = sync.sync_from_date(cutoff, "token").await.unwrap();

        // Only the strictly-newer remote game comes back
        assert_eq!(synced.len(), 1);
        assert_eq!(synced[0].id, "after");

        // Local state: games at or before the cutoff survive, the stale
        // post-cutoff game was replaced by the remote one
        assert!(store.game_exists("before").await.unwrap());
        assert!(store.game_exists("at").await.unwrap());
        assert!(store.game_exists("after").await.unwrap());
        assert!(!store.game_exists("stale").await.unwrap());
    }

    #[tokio::test]
    async fn sync_missing_rounds_fetches_newest_first() {
        let client = ScriptedClient {
            games: vec![],
            rounds: HashMap::from([
                ("old".to_string(), vec![round("E1")]),
                ("new".to_string(), vec![round("E1"), round("E2")]),
            ]),
            ..ScriptedClient::default()
        };
        let (store, sync) = service(client);
        store
            .upsert_games(&[game("old", 100), game("new", 200)])
            .await
            .unwrap();

        let report = sync
            .sync_missing_rounds("token", BackfillOptions::default())
            .await
            .unwrap();

        assert_eq!(report.game_ids, vec!["new".to_string(), "old".to_string()]);
        assert_eq!(report.total_rounds, 3);
        assert_eq!(store.get_rounds("new").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn sync_missing_rounds_skips_games_that_already_have_rounds() {
        let client = ScriptedClient {
            rounds: HashMap::from([("g2".to_string(), vec![round("E1")])]),
            ..ScriptedClient::default()
        };
        let (store, sync) = service(client);
        store
            .upsert_games(&[game("g1", 100), game("g2", 200)])
            .await
            .unwrap();
        store.upsert_rounds("g1", &[round("E1")]).await.unwrap();

        let report = sync
            .sync_missing_rounds("token", BackfillOptions::default())
            .await
            .unwrap();

        assert_eq!(report.game_ids, vec!["g2".to_string()]);
    }

    #[tokio::test]
    async fn transient_round_failure_counts_as_zero_rounds() {
        let client = ScriptedClient {
            rounds: HashMap::from([("ok".to_string(), vec![round("E1")])]),
            failing_games: HashMap::from([("bad".to_string(), FailureKind::Transient)]),
            ..ScriptedClient::default()
        };
        let (store, sync) = service(client);
        store
            .upsert_games(&[game("bad", 200), game("ok", 100)])
            .await
            .unwrap();

        let report = sync
            .sync_missing_rounds("token", BackfillOptions::default())
            .await
            .unwrap();

        // The 5xx game is treated as synced with no rounds
        assert_eq!(report.game_ids, vec!["bad".to_string(), "ok".to_string()]);
        assert_eq!(report.total_rounds, 1);
        assert!(store.get_rounds("bad").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn network_round_failure_is_skipped_without_aborting() {
        let client = ScriptedClient {
            rounds: HashMap::from([("ok".to_string(), vec![round("E1")])]),
            failing_games: HashMap::from([("down".to_string(), FailureKind::Network)]),
            ..ScriptedClient::default()
        };
        let (store, sync) = service(client);
        store
            .upsert_games(&[game("down", 200), game("ok", 100)])
            .await
            .unwrap();

        let report = sync
            .sync_missing_rounds("token", BackfillOptions::default())
            .await
            .unwrap();

        assert_eq!(report.game_ids, vec!["ok".to_string()]);
        assert_eq!(report.total_rounds, 1);
    }

    #[tokio::test]
    async fn reports_progress_after_each_item() {
        let client = ScriptedClient::default();
        let (store, sync) = service(client);
        store
            .upsert_games(&[game("g1", 100), game("g2", 200), game("g3", 300)])
            .await
            .unwrap();

        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_in_cb = seen.clone();
        let options = BackfillOptions {
            progress: Some(Box::new(move |done, total| {
                seen_in_cb.lock().unwrap().push((done, total));
            })),
            ..BackfillOptions::default()
        };

        sync.sync_missing_rounds("token", options).await.unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![(1, 3), (2, 3), (3, 3)]);
    }

    #[tokio::test]
    async fn cancellation_stops_the_loop_between_items() {
        let client = ScriptedClient::default();
        let (store, sync) = service(client);
        store
            .upsert_games(&[game("g1", 100), game("g2", 200), game("g3", 300)])
            .await
            .unwrap();

        let cancel = CancellationToken::new();
        let cancel_after_first = cancel.clone();
        let options = BackfillOptions {
            cancel: Some(cancel.clone()),
            progress: Some(Box::new(move |done, _| {
                if done == 1 {
                    cancel_after_first.cancel();
                }
            })),
            ..BackfillOptions::default()
        };

        let report = sync.sync_missing_rounds("token", options).await.unwrap();
        assert_eq!(report.game_ids.len(), 1);
    }

    #[tokio::test]
    async fn missing_rounds_requires_a_token() {
        let client = ScriptedClient::default();
        let (_, sync) = service(client);

        let result = sync
            .sync_missing_rounds("", BackfillOptions::default())
            .await;
        assert!(matches!(result, Err(AppError::Auth(_))));
    }

    #[tokio::test]
    async fn fetch_rounds_throttled_persists_and_returns_rounds() {
        let client = ScriptedClient {
            rounds: HashMap::from([
                ("g1".to_string(), vec![round("E1")]),
                ("g2".to_string(), vec![round("E1"), round("E2")]),
            ]),
            ..ScriptedClient::default()
        };
        let (store, sync) = service(client);
        let games = vec![game("g1", 100), game("g2", 200)];

        let by_game = sync
            .fetch_rounds_throttled(&games, "token", BackfillOptions::default())
            .await
            .unwrap();

        assert_eq!(by_game.len(), 2);
        assert_eq!(by_game["g2"].len(), 2);
        assert_eq!(store.get_rounds("g2").await.unwrap().len(), 2);
        // Rounds came back stamped with their owning game
        assert_eq!(by_game["g1"][0].game_id.as_deref(), Some("g1"));
    }
}
