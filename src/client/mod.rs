mod http;

pub use http::HttpTrackerClient;

use async_trait::async_trait;

use crate::game::{Game, Round};
use crate::shared::AppError;

/// Read-only boundary to the external score-tracking API.
///
/// Both calls take an opaque bearer credential. Failure modes:
/// `AppError::Auth` for a missing or rejected credential, `Transient` for
/// 5xx responses (callers may skip the item and continue), `Network` for
/// everything else. Round payloads do not carry the owning game id; the
/// caller stamps it in after receipt.
#[async_trait]
pub trait TrackerClient: Send + Sync {
    async fn list_games(&self, bearer_token: &str) -> Result<Vec<Game>, AppError>;
    async fn list_rounds(&self, game_id: &str, bearer_token: &str)
        -> Result<Vec<Round>, AppError>;
}
