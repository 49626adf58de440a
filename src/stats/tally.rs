use crate::game::Round;

/// Immutable classification of one round from one seat's point of view.
///
/// A tally is produced per round by `classify` and combined across a
/// game with `merge`, which is associative and commutative, so the
/// aggregation order never matters and each round can be tested in
/// isolation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoundTally {
    /// Rounds lost by discarding into a ron.
    pub deal_ins: u32,
    /// Rounds won by ron.
    pub ron_wins: u32,
    /// Rounds won by tsumo.
    pub tsumo_wins: u32,
    /// Rounds where this seat was the dealer.
    pub dealer_rounds: u32,
    /// Dealer rounds lost to another seat's tsumo.
    pub dealer_tsumo_suffered: u32,
    /// Of those, losses at mangan or better.
    pub dealer_tsumo_mangan: u32,
    /// Of those, losses at haneman or better (implies mangan).
    pub dealer_tsumo_haneman: u32,
    /// Whether this seat won the round.
    pub had_win: bool,
}

impl RoundTally {
    /// Classifies a single round for the given seat. Outcomes other
    /// than ron and tsumo contribute nothing; an indeterminate dealer
    /// or seat parse yields no dealer-conditioned counts.
    pub fn classify(round: &Round, seat: usize) -> Self {
        if round.outcome_is("Ron") {
            Self::classify_ron(round, seat)
        } else if round.outcome_is("Tsumo") {
            Self::classify_tsumo(round, seat)
        } else {
            Self::default()
        }
    }

    fn classify_ron(round: &Round, seat: usize) -> Self {
        let mut tally = Self::default();

        if round.dealer_index() == Some(seat) {
            tally.dealer_rounds = 1;
        }

        if let Some(data) = &round.data {
            if data.winners.iter().any(|w| w.seat_index() == Some(seat)) {
                tally.ron_wins = 1;
                tally.had_win = true;
            }
            if data.loser_index() == Some(seat) {
                tally.deal_ins = 1;
            }
        }

        tally
    }

    fn classify_tsumo(round: &Round, seat: usize) -> Self {
        let mut tally = Self::default();
        let winner = round.data.as_ref().and_then(|d| d.winner_index());

        if winner == Some(seat) {
            tally.tsumo_wins = 1;
            tally.had_win = true;
        }

        if round.dealer_index() == Some(seat) {
            tally.dealer_rounds = 1;

            // Tsumo on our oya - it hurts
            if winner != Some(seat) {
                tally.dealer_tsumo_suffered = 1;

                let score = round.data.as_ref().and_then(|d| d.score.as_ref());
                if let Some(score) = score {
                    if score.is_haneman() {
                        tally.dealer_tsumo_mangan = 1;
                        tally.dealer_tsumo_haneman = 1;
                    } else if score.is_mangan() {
                        tally.dealer_tsumo_mangan = 1;
                    }
                }
            }
        }

        tally
    }

    /// Associative combine of two tallies.
    pub fn merge(self, other: Self) -> Self {
        Self {
            deal_ins: self.deal_ins + other.deal_ins,
            ron_wins: self.ron_wins + other.ron_wins,
            tsumo_wins: self.tsumo_wins + other.tsumo_wins,
            dealer_rounds: self.dealer_rounds + other.dealer_rounds,
            dealer_tsumo_suffered: self.dealer_tsumo_suffered + other.dealer_tsumo_suffered,
            dealer_tsumo_mangan: self.dealer_tsumo_mangan + other.dealer_tsumo_mangan,
            dealer_tsumo_haneman: self.dealer_tsumo_haneman + other.dealer_tsumo_haneman,
            had_win: self.had_win || other.had_win,
        }
    }

    /// Folds the tallies of a game's rounds for one seat.
    pub fn for_rounds<'a>(rounds: impl IntoIterator<Item = &'a Round>, seat: usize) -> Self {
        rounds
            .into_iter()
            .fold(Self::default(), |acc, round| {
                acc.merge(Self::classify(round, seat))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{RoundData, RoundWinner, ScoreInfo};
    use rstest::rstest;

    fn ron(label: &str, winner_seat: &str, loser_seat: &str) -> Round {
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

    fn tsumo(label: &str, winner_seat: &str, han: i32, fu: Option<i32>) -> Round {
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

    #[test]
    fn ron_win_and_deal_in_are_attributed_by_seat() {
        let round = ron("E1", "Player2", "Player3");

        let winner = RoundTally::classify(&round, 1);
        assert_eq!(winner.ron_wins, 1);
        assert!(winner.had_win);

        let loser = RoundTally::classify(&round, 2);
        assert_eq!(loser.deal_ins, 1);
        assert!(!loser.had_win);

        let dealer = RoundTally::classify(&round, 0);
        assert_eq!(dealer.dealer_rounds, 1);
        assert_eq!(dealer.deal_ins, 0);
    }

    #[test]
    fn tsumo_win_counts_for_the_winner_only() {
        let round = tsumo("S2", "Player2", 3, Some(30));

        let winner = RoundTally::classify(&round, 1);
        assert_eq!(winner.tsumo_wins, 1);
        assert!(winner.had_win);
        // Winner is also the dealer here; own tsumo is not suffered
        assert_eq!(winner.dealer_rounds, 1);
        assert_eq!(winner.dealer_tsumo_suffered, 0);

        let bystander = RoundTally::classify(&round, 3);
        assert_eq!(bystander, RoundTally::default());
    }

    #[rstest]
    #[case(4, Some(30), 0, 0)] // below mangan
    #[case(5, None, 1, 0)] // mangan by han
    #[case(4, Some(40), 1, 0)] // mangan by han+fu
    #[case(3, Some(70), 1, 0)] // mangan by kiriage-style fu
    #[case(6, None, 1, 1)] // haneman implies mangan
    #[case(13, Some(30), 1, 1)]
    fn dealer_tsumo_severity_tiers(
        #[case] han: i32,
        #[case] fu: Option<i32>,
        #[case] mangan: u32,
        #[case] haneman: u32,
    ) {
        // Seat 0 is dealer ("E1") and seat 1 tsumos against them
        let round = tsumo("E1", "Player2", han, fu);
        let dealer = RoundTally::classify(&round, 0);

        assert_eq!(dealer.dealer_rounds, 1);
        assert_eq!(dealer.dealer_tsumo_suffered, 1);
        assert_eq!(dealer.dealer_tsumo_mangan, mangan);
        assert_eq!(dealer.dealer_tsumo_haneman, haneman);
    }

    #[test]
    fn unknown_winner_seat_still_counts_as_suffered_tsumo() {
        let round = tsumo("E1", "somewhere", 5, None);
        let dealer = RoundTally::classify(&round, 0);

        assert_eq!(dealer.dealer_tsumo_suffered, 1);
        assert_eq!(dealer.tsumo_wins, 0);
    }

    #[test]
    fn unknown_dealer_label_yields_no_dealer_counts() {
        let round = tsumo("??", "Player2", 6, None);
        let tally = RoundTally::classify(&round, 0);

        assert_eq!(tally.dealer_rounds, 0);
        assert_eq!(tally.dealer_tsumo_suffered, 0);
    }

    #[test]
    fn other_outcomes_contribute_nothing() {
        let round = Round {
            round: Some("E1".to_string()),
            outcome: Some("Draw".to_string()),
            ..Round::default()
        };
        assert_eq!(RoundTally::classify(&round, 0), RoundTally::default());
    }

    #[test]
    fn merge_is_associative() {
        let a = RoundTally {
            deal_ins: 1,
            had_win: true,
            ..RoundTally::default()
        };
        let b = RoundTally {
            tsumo_wins: 2,
            dealer_rounds: 1,
            ..RoundTally::default()
        };
        let c = RoundTally {
            ron_wins: 1,
            ..RoundTally::default()
        };

        assert_eq!(a.merge(b).merge(c), a.merge(b.merge(c)));
    }

    #[test]
    fn fold_over_rounds_matches_manual_merge() {
        let rounds = vec![
            ron("E1", "Player1", "Player2"),
            tsumo("E2", "Player3", 6, None),
        ];
        let folded = RoundTally::for_rounds(&rounds, 0);

        let expected = RoundTally::classify(&rounds[0], 0)
            .merge(RoundTally::classify(&rounds[1], 0));
        assert_eq!(folded, expected);
    }
}
