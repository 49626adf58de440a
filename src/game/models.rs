use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use super::seat::seat_index;

/// A completed game as reported by the remote tracker API.
///
/// `created_at` is epoch seconds and is the authoritative ordering key.
/// `players` and `points` are parallel, one entry per seat; each seat's
/// point list holds the base placement points first, followed by
/// adjustments (uma, chombo).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Game {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub confirmed: bool,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub honba: i32,
    #[serde(default)]
    pub players: Vec<Player>,
    #[serde(default)]
    pub points: Vec<Vec<i32>>,
    #[serde(default)]
    pub riichi: i32,
    #[serde(default)]
    pub round: Option<String>,
    #[serde(default)]
    pub settings: Option<GameSettings>,
}

impl Game {
    pub fn created_datetime(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.created_at, 0)
            .single()
            .unwrap_or_else(|| Utc.timestamp_opt(0, 0).unwrap())
    }

    /// Base placement points for a seat (before uma/chombo).
    pub fn base_points(&self, seat: usize) -> Option<i32> {
        self.points.get(seat).and_then(|p| p.first()).copied()
    }

    /// Total points for a seat, including all adjustments.
    pub fn total_points(&self, seat: usize) -> i32 {
        self.points
            .get(seat)
            .map(|p| p.iter().sum())
            .unwrap_or_default()
    }

    /// Checks the record is usable for sync and stats. Batch callers
    /// skip invalid games with a warning instead of aborting.
    pub fn validate(&self) -> Result<(), crate::shared::AppError> {
        if self.id.is_empty() {
            return Err(crate::shared::AppError::Validation(
                "game has no identifier".to_string(),
            ));
        }
        Ok(())
    }

    /// Index of the first seat whose player name contains the given
    /// needle, case-insensitive.
    pub fn seat_of_player(&self, needle: &str) -> Option<usize> {
        let needle = needle.to_uppercase();
        self.players
            .iter()
            .position(|p| p.name.to_uppercase().contains(&needle))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Player {
    #[serde(default)]
    pub name: String,
}

/// Rule settings attached to a game. Informational only; no stat depends
/// on them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GameSettings {
    #[serde(default)]
    pub chonbo_type: Option<String>,
    #[serde(default)]
    pub initial_points: i32,
    #[serde(default)]
    pub kiriage_mangan: bool,
    #[serde(default)]
    pub yakitori: bool,
}

/// One round of a game. The remote API does not include the owning game
/// id in round payloads; it is stamped in after fetch, before anything
/// is persisted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Round {
    #[serde(default)]
    pub round: Option<String>,
    #[serde(default)]
    pub outcome: Option<String>,
    #[serde(default)]
    pub points: Vec<Vec<i32>>,
    #[serde(default)]
    pub data: Option<RoundData>,
    #[serde(default)]
    pub game_id: Option<String>,
}

impl Round {
    /// Dealer (oya) seat index derived from the round label, e.g.
    /// "E1" -> 0, "S3" -> 2, "E1-2" -> 0. The digit after the wind names
    /// the dealer; anything else means the dealer is indeterminate.
    pub fn dealer_index(&self) -> Option<usize> {
        let label = self.round.as_deref()?;
        let dealer_char = label.chars().nth(1)?;
        match dealer_char.to_digit(10) {
            Some(d @ 1..=4) => Some(d as usize - 1),
            _ => None,
        }
    }

    pub fn outcome_is(&self, tag: &str) -> bool {
        self.outcome
            .as_deref()
            .map(|o| o.eq_ignore_ascii_case(tag))
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoundData {
    #[serde(default)]
    pub riichi: Vec<String>,
    #[serde(default)]
    pub score: Option<ScoreInfo>,
    #[serde(default)]
    pub winner_seat: Option<String>,
    #[serde(default)]
    pub loser_seat: Option<String>,
    #[serde(default)]
    pub winners: Vec<RoundWinner>,
}

impl RoundData {
    pub fn winner_index(&self) -> Option<usize> {
        self.winner_seat.as_deref().and_then(seat_index)
    }

    pub fn loser_index(&self) -> Option<usize> {
        self.loser_seat.as_deref().and_then(seat_index)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScoreInfo {
    #[serde(default)]
    pub fu: Option<i32>,
    #[serde(default)]
    pub han: i32,
}

impl ScoreInfo {
    /// Mangan or better: 5+ han, or 4 han 40+ fu, or 3 han 70+ fu.
    pub fn is_mangan(&self) -> bool {
        let fu = self.fu.unwrap_or(0);
        self.han >= 5 || (self.han == 4 && fu >= 40) || (self.han == 3 && fu >= 70)
    }

    /// Haneman or better: 6+ han.
    pub fn is_haneman(&self) -> bool {
        self.han >= 6
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoundWinner {
    #[serde(default)]
    pub seat: Option<String>,
    #[serde(default)]
    pub score: Option<ScoreInfo>,
}

impl RoundWinner {
    pub fn seat_index(&self) -> Option<usize> {
        self.seat.as_deref().and_then(seat_index)
    }
}
