pub mod models;
pub mod service;
mod tally;

pub use models::{OverallResults, PlayerRankingSummary, PlayerStats};
pub use service::StatsService;
pub use tally::RoundTally;
