use chrono::NaiveDate;
use proptest::prelude::*;

use matchform::compare::{PredictedOutcome, compare};
use matchform::form::{TeamStats, compute_stats};
use matchform::model::MatchRecord;

/// (home?, team goals, opponent goals, day offset or undated)
fn match_strategy() -> impl Strategy<Value = (bool, i32, i32, Option<u32>)> {
    (
        any::<bool>(),
        0..6i32,
        0..6i32,
        prop::option::of(0..365u32),
    )
}

fn build(team: &str, raw: &[(bool, i32, i32, Option<u32>)]) -> Vec<MatchRecord> {
    let base = NaiveDate::from_ymd_opt(2023, 1, 1).expect("valid date");
    raw.iter()
        .map(|(home, gf, ga, offset)| {
            let date = offset.map(|d| base + chrono::Days::new(d as u64));
            if *home {
                MatchRecord::new(date, team, "Opp", *gf, *ga)
            } else {
                MatchRecord::new(date, "Opp", team, *ga, *gf)
            }
        })
        .collect()
}

fn stats(team: &str, raw: &[(bool, i32, i32, Option<u32>)], window: usize) -> TeamStats {
    compute_stats(team, &build(team, raw), window).expect("valid input")
}

proptest! {
    #[test]
    fn window_and_outcome_counts_line_up(
        raw in prop::collection::vec(match_strategy(), 0..30),
        window in 1..20usize,
    ) {
        let s = stats("Team", &raw, window);
        prop_assert_eq!(s.matches_considered, window.min(raw.len()));
        prop_assert_eq!(s.wins + s.draws + s.losses, s.matches_considered);
        prop_assert_eq!(s.form_sequence.len(), s.matches_considered);

        let home = &s.home_record;
        let away = &s.away_record;
        prop_assert_eq!(
            home.wins + home.draws + home.losses + away.wins + away.draws + away.losses,
            s.matches_considered
        );
        prop_assert_eq!(home.played + away.played, s.matches_considered);
    }

    #[test]
    fn rates_stay_in_unit_interval(
        raw in prop::collection::vec(match_strategy(), 0..30),
        window in 1..20usize,
    ) {
        let s = stats("Team", &raw, window);
        for rate in [
            s.over25_rate,
            s.btts_rate,
            s.home_record.over25_rate,
            s.home_record.btts_rate,
            s.away_record.over25_rate,
            s.away_record.btts_rate,
        ] {
            prop_assert!((0.0..=1.0).contains(&rate));
        }
        prop_assert!(s.goals_for_avg >= 0.0 && s.goals_against_avg >= 0.0);
    }

    #[test]
    fn comparison_mirrors(
        a in prop::collection::vec(match_strategy(), 0..15),
        b in prop::collection::vec(match_strategy(), 0..15),
    ) {
        let sa = stats("A", &a, 10);
        let sb = stats("B", &b, 10);
        let ab = compare(&sa, &sb);
        let ba = compare(&sb, &sa);

        let p = ab.probabilities;
        prop_assert!((p.team1_win + p.draw + p.team2_win - 1.0).abs() < 1e-9);
        prop_assert!(p.team1_win >= 0.0 && p.draw >= 0.0 && p.team2_win >= 0.0);
        prop_assert_eq!(ab.probabilities.draw, ba.probabilities.draw);
        prop_assert_eq!(
            ab.predicted_outcome == PredictedOutcome::Team1Win,
            ba.predicted_outcome == PredictedOutcome::Team2Win
        );
        prop_assert_eq!(
            ab.predicted_outcome == PredictedOutcome::Draw,
            ba.predicted_outcome == PredictedOutcome::Draw
        );
        prop_assert!(ab.confidence <= 100);
        prop_assert!(ab.expected_goals1 >= 0.0 && ab.expected_goals2 >= 0.0);
    }
}
