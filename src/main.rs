mod client;
mod game;
mod shared;
mod store;
mod sync;

use client::HttpTrackerClient;
use std::sync::Arc;
use store::{InMemoryGameStore, PostgresGameStore};
use sync::{BackfillOptions, SyncService};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mahjongstats=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting mahjong tracker sync");

    let api_url = std::env::var("TRACKER_API_URL").expect("TRACKER_API_URL must be set");
    let bearer_token = std::env::var("TRACKER_TOKEN").expect("TRACKER_TOKEN must be set");

    let client = Arc::new(HttpTrackerClient::new(api_url));

    // Easy to switch between store implementations: Postgres when a
    // DATABASE_URL is configured, in-memory otherwise.
    let store: Arc<dyn store::GameStore + Send + Sync> = match std::env::var("DATABASE_URL") {
        Ok(database_url) => {
            let pool = sqlx::PgPool::connect(&database_url)
                .await
                .expect("Failed to connect to database");
            Arc::new(PostgresGameStore::new(pool))
        }
        Err(_) => Arc::new(InMemoryGameStore::new()),
    };

    let sync_service = SyncService::new(store, client);

    let new_games = sync_service
        .fetch_and_sync_new(&bearer_token)
        .await
        .expect("Failed to sync games");
    info!(new_games = new_games.len(), "Game sync finished");

    let options = BackfillOptions {
        progress: Some(Box::new(|done, total| {
            info!(done, total, "Round backfill progress");
        })),
        ..BackfillOptions::default()
    };
    let report = sync_service
        .sync_missing_rounds(&bearer_token, options)
        .await
        .expect("Failed to sync rounds");
    info!(
        games = report.game_ids.len(),
        rounds = report.total_rounds,
        "Round backfill finished"
    );
}
