use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::game::Game;

/// Narrows a game set by date range and player-name substrings.
///
/// Date window: keep games created at or after `min_date` and at or
/// before `max_date` plus one day, so `max_date` covers its whole
/// calendar day. Player filter: a game is kept only when every supplied
/// substring matches at least one player name in that game
/// (case-insensitive, AND across filters, OR across seats).
pub fn filter_games(
    games: &[Game],
    min_date: Option<DateTime<Utc>>,
    max_date: Option<DateTime<Utc>>,
    player_names: Option<&[String]>,
) -> Vec<Game> {
    if games.is_empty() {
        return Vec::new();
    }

    let mut filtered: Vec<Game> = games.to_vec();

    if min_date.is_some() || max_date.is_some() {
        let max_inclusive = max_date.map(|d| d + Duration::days(1));
        filtered.retain(|g| {
            let game_date = g.created_datetime();
            if let Some(min) = min_date {
                if game_date < min {
                    return false;
                }
            }
            if let Some(max) = max_inclusive {
                if game_date > max {
                    return false;
                }
            }
            true
        });
        debug!(
            ?min_date,
            ?max_date,
            remaining = filtered.len(),
            "Filtered games by date"
        );
    }

    if let Some(player_names) = player_names {
        let needles: Vec<String> = player_names
            .iter()
            .filter(|p| !p.trim().is_empty())
            .map(|p| p.trim().to_lowercase())
            .collect();

        if !needles.is_empty() {
            filtered.retain(|g| {
                let game_players: Vec<String> =
                    g.players.iter().map(|p| p.name.to_lowercase()).collect();
                needles.iter().all(|needle| {
                    game_players.iter().any(|player| player.contains(needle))
                })
            });
            debug!(
                filters = needles.len(),
                remaining = filtered.len(),
                "Filtered games by players"
            );
        }
    }

    filtered
}
