use mahjongstats::game::{Game, Player, Round, RoundData, RoundWinner, ScoreInfo};

/// Builds a confirmed four-seat game with one base-point entry per seat
pub fn game(id: &str, created_at: i64, names: [&str; 4], base_points: [i32; 4]) -> Game {
    Game {
        id: id.to_string(),
        confirmed: true,
        created_at,
        players: names
            .iter()
            .map(|n| Player {
                name: n.to_string(),
            })
            .collect(),
        points: base_points.iter().map(|p| vec![*p]).collect(),
        ..Game::default()
    }
}

pub fn tsumo_round(label: &str, winner_seat: &str, han: i32, fu: Option<i32>) -> Round {
    Round {
        round: Some(label.to_string()),
        outcome: Some("Tsumo".to_string()),
        data: Some(RoundData {
            winner_seat: Some(winner_seat.to_string()),
            score: Some(ScoreInfo { han, fu }),
            ..RoundData::default()
        }),
        ..Round::default()
    }
}

pub fn ron_round(label: &str, winner_seat: &str, loser_seat: &str) -> Round {
    Round {
        round: Some(label.to_string()),
        outcome: Some("Ron".to_string()),
        data: Some(RoundData {
            loser_seat: Some(loser_seat.to_string()),
            winners: vec![RoundWinner {
                seat: Some(winner_seat.to_string()),
                score: Some(ScoreInfo {
                    han: 2,
                    fu: Some(30),
                }),
            }],
            ..RoundData::default()
        }),
        ..Round::default()
    }
}
