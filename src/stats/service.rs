use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument};

use super::models::{OverallResults, PlayerRankingSummary, PlayerStats};
use super::tally::RoundTally;
use crate::game::Game;
use crate::shared::AppError;
use crate::store::GameStore;

/// Computes per-player statistics and overall rankings from a game set
/// plus its stored rounds.
///
/// Missing data (no matching player, no games, no rounds) is a normal
/// input and degrades to a zeroed result rather than an error; only
/// store failures propagate.
pub struct StatsService {
    store: Arc<dyn GameStore + Send + Sync>,
}

impl StatsService {
    pub fn new(store: Arc<dyn GameStore + Send + Sync>) -> Self {
        Self { store }
    }

    /// Per-player statistics across the games whose seats match
    /// `player_name` (case-insensitive substring).
    #[instrument(skip(self, games))]
    pub async fn compute_stats(
        &self,
        games: &[Game],
        player_name: &str,
    ) -> Result<PlayerStats, AppError> {
        let mut stats = PlayerStats::named(player_name);

        if player_name.trim().is_empty() || games.is_empty() {
            return Ok(stats);
        }

        let matching_games: Vec<&Game> = games
            .iter()
            .filter(|g| g.seat_of_player(player_name).is_some())
            .collect();
        if matching_games.is_empty() {
            return Ok(stats);
        }

        let rounds_by_game = self.store.get_all_rounds().await?;

        stats.games_played = matching_games.len() as u32;

        let mut rank_sum = 0u32;
        let mut points_sum = 0i64;
        let mut yakitori_count = 0u32;
        let mut winning_games = 0u32;
        let mut total_rounds = 0usize;
        let mut tally = RoundTally::default();

        for game in &matching_games {
            let Some(seat) = game.seat_of_player(player_name) else {
                continue;
            };

            let placement = placement(game, seat);
            rank_sum += placement;
            points_sum += i64::from(game.total_points(seat));
            if placement <= 2 {
                winning_games += 1;
            }

            let game_rounds = rounds_by_game
                .get(&game.id)
                .map(Vec::as_slice)
                .unwrap_or_default();
            total_rounds += game_rounds.len();

            let game_tally = RoundTally::for_rounds(game_rounds, seat);
            if !game_tally.had_win {
                yakitori_count += 1;
            }
            tally = tally.merge(game_tally);
        }

        let games_played = f64::from(stats.games_played);
        stats.rounds_played = total_rounds as u32;
        stats.average_rank = f64::from(rank_sum) / games_played;
        stats.average_points = points_sum as f64 / games_played;
        stats.yakitori_rate = percentage(yakitori_count, stats.games_played);
        stats.deal_in_rate = percentage(tally.deal_ins, total_rounds as u32);
        stats.winning_rate = percentage(winning_games, stats.games_played);
        stats.tsumo_rate_on_oya = percentage(tally.dealer_tsumo_suffered, tally.dealer_rounds);
        stats.mangan_plus_tsumo_rate_on_oya =
            percentage(tally.dealer_tsumo_mangan, tally.dealer_tsumo_suffered);
        stats.haneman_plus_tsumo_rate_on_oya =
            percentage(tally.dealer_tsumo_haneman, tally.dealer_tsumo_suffered);
        stats.tsumo_rate =
            percentage(tally.tsumo_wins, tally.tsumo_wins + tally.ron_wins) as i32;

        debug!(
            player = player_name,
            games = stats.games_played,
            rounds = stats.rounds_played,
            "Computed player statistics"
        );
        Ok(stats)
    }

    /// Overall rankings for a roster of named players.
    ///
    /// Every game ranks all four seats by base points descending; seats
    /// tied on base points get distinct sequential ranks in seat order
    /// (stable sort, first seen wins the better rank). A seat's result
    /// accrues to the first roster name its player name contains.
    pub fn compute_overall(&self, games: &[Game], player_names: &[String]) -> OverallResults {
        let mut results = OverallResults::default();

        if games.is_empty() || player_names.is_empty() {
            return results;
        }

        let normalized_names: Vec<String> =
            player_names.iter().map(|p| p.to_uppercase()).collect();

        let mut summaries: HashMap<String, PlayerRankingSummary> = player_names
            .iter()
            .map(|name| (name.to_uppercase(), PlayerRankingSummary::named(name)))
            .collect();

        for game in games {
            let mut standings: Vec<(i32, i32, Option<&String>)> = game
                .players
                .iter()
                .enumerate()
                .map(|(seat, player)| {
                    let seat_name = player.name.to_uppercase();
                    let filter_key = normalized_names
                        .iter()
                        .find(|needle| seat_name.contains(needle.as_str()));
                    (
                        game.base_points(seat).unwrap_or_default(),
                        game.total_points(seat),
                        filter_key,
                    )
                })
                .collect();

            // Stable sort: base-point ties keep seat order
            standings.sort_by(|a, b| b.0.cmp(&a.0));

            for (rank0, (_, total_points, filter_key)) in standings.iter().enumerate() {
                let Some(key) = filter_key else { continue };
                let Some(summary) = summaries.get_mut(*key) else {
                    continue;
                };

                summary.games_played += 1;
                summary.total_points += total_points;
                match rank0 + 1 {
                    1 => summary.first_places += 1,
                    2 => summary.second_places += 1,
                    3 => summary.third_places += 1,
                    _ => summary.fourth_places += 1,
                }
            }
        }

        for summary in summaries.values_mut() {
            if summary.games_played > 0 {
                let rank_points = summary.first_places
                    + summary.second_places * 2
                    + summary.third_places * 3
                    + summary.fourth_places * 4;
                summary.average_rank = f64::from(rank_points) / f64::from(summary.games_played);
            }
        }

        let mut rankings: Vec<PlayerRankingSummary> = summaries.into_values().collect();
        rankings.sort_by(|a, b| b.total_points.cmp(&a.total_points));
        results.player_rankings = rankings;

        results
    }
}

/// Placement of a seat within its game: one plus the number of seats
/// with strictly greater base points. Ties all receive the rank of the
/// best-tied seat.
fn placement(game: &Game, seat: usize) -> u32 {
    let own = game.base_points(seat).unwrap_or_default();
    let better = game
        .points
        .iter()
        .enumerate()
        .filter(|(i, p)| *i != seat && p.first().copied().unwrap_or_default() > own)
        .count();
    better as u32 + 1
}

fn percentage(count: u32, denominator: u32) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        f64::from(count) * 100.0 / f64::from(denominator)
    }
}
