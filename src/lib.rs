// Library crate for the mahjong tracker sync and statistics engine
// This file exposes the public API for integration tests

pub mod client;
pub mod filter;
pub mod game;
pub mod shared;
pub mod stats;
pub mod store;
pub mod sync;

// Re-export commonly used types for easier access in tests
pub use client::{HttpTrackerClient, TrackerClient};
pub use filter::filter_games;
pub use game::{Game, Round};
pub use shared::AppError;
pub use stats::{OverallResults, PlayerStats, StatsService};
pub use store::{GameStore, InMemoryGameStore, PostgresGameStore};
pub use sync::{BackfillOptions, RoundSyncReport, SyncConfig, SyncService};
