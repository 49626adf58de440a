use serde::{Deserialize, Serialize};

/// Derived, read-only performance snapshot for one player across a
/// filtered game set. All rates are percentages; denominators of zero
/// yield a zero rate, never an error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlayerStats {
    pub player_name: String,
    pub games_played: u32,
    pub rounds_played: u32,
    pub average_rank: f64,
    pub average_points: f64,
    /// Games without a single winning round, per game played.
    pub yakitori_rate: f64,
    /// Deal-ins per round played.
    pub deal_in_rate: f64,
    /// Games placed 1st or 2nd, per game played.
    pub winning_rate: f64,
    /// Dealer rounds lost to an opponent's tsumo, per dealer round.
    pub tsumo_rate_on_oya: f64,
    /// Of the suffered dealer tsumos, share at mangan or better.
    pub mangan_plus_tsumo_rate_on_oya: f64,
    /// Of the suffered dealer tsumos, share at haneman or better.
    pub haneman_plus_tsumo_rate_on_oya: f64,
    /// Tsumo wins as a share of all wins, truncated to a whole percent.
    pub tsumo_rate: i32,
}

impl PlayerStats {
    pub fn named(player_name: impl Into<String>) -> Self {
        Self {
            player_name: player_name.into(),
            ..Self::default()
        }
    }
}

/// League-style ranking table across a roster of named players.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OverallResults {
    /// Sorted by cumulative total points, descending.
    pub player_rankings: Vec<PlayerRankingSummary>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlayerRankingSummary {
    pub player_name: String,
    /// Cumulative total points, including uma/chombo adjustments.
    pub total_points: i32,
    pub first_places: u32,
    pub second_places: u32,
    pub third_places: u32,
    pub fourth_places: u32,
    pub games_played: u32,
    pub average_rank: f64,
}

impl PlayerRankingSummary {
    pub fn named(player_name: impl Into<String>) -> Self {
        Self {
            player_name: player_name.into(),
            ..Self::default()
        }
    }
}
