use serde::Serialize;

use crate::error::AnalysisError;
use crate::model::{MatchRecord, Outcome, newest_first};

/// Aggregates over the home-only or away-only part of the window.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SplitRecord {
    pub played: usize,
    pub wins: usize,
    pub draws: usize,
    pub losses: usize,
    pub goals_for: u32,
    pub goals_against: u32,
    pub goals_for_avg: f64,
    pub goals_against_avg: f64,
    pub over25_rate: f64,
    pub btts_rate: f64,
}

impl SplitRecord {
    pub fn points(&self) -> u32 {
        (self.wins as u32) * 3 + self.draws as u32
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TeamStats {
    pub team: String,
    pub matches_considered: usize,
    pub wins: usize,
    pub draws: usize,
    pub losses: usize,
    /// Most recent first.
    pub form_sequence: Vec<Outcome>,
    pub form_points: u32,
    pub goals_for: u32,
    pub goals_against: u32,
    pub goals_for_avg: f64,
    pub goals_against_avg: f64,
    pub over25_count: usize,
    pub btts_count: usize,
    pub over25_rate: f64,
    pub btts_rate: f64,
    pub home_record: SplitRecord,
    pub away_record: SplitRecord,
    /// The window itself, most recent first.
    pub considered: Vec<MatchRecord>,
}

impl TeamStats {
    pub fn win_rate(&self) -> f64 {
        ratio(self.wins, self.matches_considered)
    }

    pub fn goal_diff_avg(&self) -> f64 {
        self.goals_for_avg - self.goals_against_avg
    }
}

#[derive(Default)]
struct Tally {
    played: usize,
    wins: usize,
    draws: usize,
    losses: usize,
    goals_for: u32,
    goals_against: u32,
    over25: usize,
    btts: usize,
}

impl Tally {
    fn add(&mut self, outcome: Outcome, gf: u32, ga: u32, over25: bool, btts: bool) {
        self.played += 1;
        match outcome {
            Outcome::Win => self.wins += 1,
            Outcome::Draw => self.draws += 1,
            Outcome::Loss => self.losses += 1,
        }
        self.goals_for = self.goals_for.saturating_add(gf);
        self.goals_against = self.goals_against.saturating_add(ga);
        if over25 {
            self.over25 += 1;
        }
        if btts {
            self.btts += 1;
        }
    }

    fn into_split(self) -> SplitRecord {
        SplitRecord {
            played: self.played,
            wins: self.wins,
            draws: self.draws,
            losses: self.losses,
            goals_for: self.goals_for,
            goals_against: self.goals_against,
            goals_for_avg: ratio(self.goals_for as usize, self.played),
            goals_against_avg: ratio(self.goals_against as usize, self.played),
            over25_rate: ratio(self.over25, self.played),
            btts_rate: ratio(self.btts, self.played),
        }
    }
}

/// Form and scoring statistics for `team` over its most recent `window`
/// matches.
///
/// `matches` must already be restricted to fixtures involving `team`; order
/// does not matter, records are stably sorted by date (newest first, undated
/// last) before the window is cut. Fewer than `window` matches is fine and an
/// empty slice yields all-zero stats.
pub fn compute_stats(
    team: &str,
    matches: &[MatchRecord],
    window: usize,
) -> Result<TeamStats, AnalysisError> {
    if window == 0 {
        return Err(AnalysisError::InvalidWindow(window));
    }

    for (index, m) in matches.iter().enumerate() {
        validate_record(team, index, m)?;
    }

    let mut ordered: Vec<&MatchRecord> = matches.iter().collect();
    ordered.sort_by(|a, b| newest_first(a, b));
    ordered.truncate(window);

    let mut total = Tally::default();
    let mut home = Tally::default();
    let mut away = Tally::default();
    let mut form_sequence = Vec::with_capacity(ordered.len());

    for m in &ordered {
        // Validated above; both scores are present and within 0..=MAX_GOALS.
        let hg = m.home_goals.unwrap_or_default() as u32;
        let ag = m.away_goals.unwrap_or_default() as u32;
        let is_home = m.home_team == team;
        let (gf, ga) = if is_home { (hg, ag) } else { (ag, hg) };

        let outcome = Outcome::from_goals(gf as i32, ga as i32);
        let over25 = hg + ag > 2;
        let btts = hg > 0 && ag > 0;

        total.add(outcome, gf, ga, over25, btts);
        if is_home {
            home.add(outcome, gf, ga, over25, btts);
        } else {
            away.add(outcome, gf, ga, over25, btts);
        }
        form_sequence.push(outcome);
    }

    let form_points = form_sequence.iter().map(|o| o.points()).sum();
    let n = total.played;

    Ok(TeamStats {
        team: team.to_string(),
        matches_considered: n,
        wins: total.wins,
        draws: total.draws,
        losses: total.losses,
        form_sequence,
        form_points,
        goals_for: total.goals_for,
        goals_against: total.goals_against,
        goals_for_avg: ratio(total.goals_for as usize, n),
        goals_against_avg: ratio(total.goals_against as usize, n),
        over25_count: total.over25,
        btts_count: total.btts,
        over25_rate: ratio(total.over25, n),
        btts_rate: ratio(total.btts, n),
        home_record: home.into_split(),
        away_record: away.into_split(),
        considered: ordered.into_iter().cloned().collect(),
    })
}

/// Highest per-side score accepted; anything above is treated as corrupt data.
pub const MAX_GOALS: i32 = 99;

fn validate_record(team: &str, index: usize, m: &MatchRecord) -> Result<(), AnalysisError> {
    let malformed = |reason: String| AnalysisError::MalformedRecord { index, reason };
    match (m.home_goals, m.away_goals) {
        (None, _) | (_, None) => {
            return Err(malformed(format!(
                "missing score for {} vs {}",
                m.home_team, m.away_team
            )));
        }
        (Some(h), Some(a)) if h < 0 || a < 0 => {
            return Err(malformed(format!("negative score {h}-{a}")));
        }
        (Some(h), Some(a)) if h > MAX_GOALS || a > MAX_GOALS => {
            return Err(malformed(format!("implausible score {h}-{a}")));
        }
        _ => {}
    }
    if !m.involves(team) {
        return Err(malformed(format!(
            "{} vs {} does not involve {team}",
            m.home_team, m.away_team
        )));
    }
    Ok(())
}

pub(crate) fn ratio(num: usize, denom: usize) -> f64 {
    if denom == 0 {
        0.0
    } else {
        num as f64 / denom as f64
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{MAX_GOALS, compute_stats};
    use crate::error::AnalysisError;
    use crate::model::{MatchRecord, Outcome};

    fn day(d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(2024, 3, d)
    }

    #[test]
    fn zero_window_is_rejected() {
        let err = compute_stats("A", &[], 0).unwrap_err();
        assert_eq!(err, AnalysisError::InvalidWindow(0));
    }

    #[test]
    fn empty_input_is_all_zero() {
        let s = compute_stats("A", &[], 5).expect("empty is valid");
        assert_eq!(s.matches_considered, 0);
        assert!(s.form_sequence.is_empty());
        assert_eq!(s.goals_for_avg, 0.0);
        assert_eq!(s.over25_rate, 0.0);
        assert_eq!(s.home_record.goals_for_avg, 0.0);
        assert_eq!(s.away_record.btts_rate, 0.0);
    }

    #[test]
    fn unsorted_input_is_ordered_newest_first() {
        let matches = vec![
            MatchRecord::new(day(1), "A", "B", 0, 1),
            MatchRecord::new(day(3), "C", "A", 0, 2),
            MatchRecord::new(day(2), "A", "D", 1, 1),
        ];
        let s = compute_stats("A", &matches, 2).expect("valid");
        assert_eq!(s.form_sequence, vec![Outcome::Win, Outcome::Draw]);
        assert_eq!(s.considered[0].date, day(3));
        assert_eq!(s.matches_considered, 2);
    }

    #[test]
    fn undated_records_keep_source_order_after_dated() {
        let matches = vec![
            MatchRecord::new(None, "A", "B", 0, 1),
            MatchRecord::new(None, "A", "C", 2, 2),
            MatchRecord::new(day(9), "A", "D", 3, 0),
        ];
        let s = compute_stats("A", &matches, 3).expect("valid");
        assert_eq!(
            s.form_sequence,
            vec![Outcome::Win, Outcome::Loss, Outcome::Draw]
        );
    }

    #[test]
    fn missing_score_fails_closed() {
        let mut bad = MatchRecord::new(day(1), "A", "B", 1, 0);
        bad.home_goals = None;
        let err = compute_stats("A", &[bad], 3).unwrap_err();
        assert!(matches!(err, AnalysisError::MalformedRecord { index: 0, .. }));
    }

    #[test]
    fn negative_score_fails_closed() {
        let ok = MatchRecord::new(day(2), "A", "B", 1, 0);
        let bad = MatchRecord::new(day(1), "A", "C", -1, 0);
        let err = compute_stats("A", &[ok, bad], 3).unwrap_err();
        assert!(matches!(err, AnalysisError::MalformedRecord { index: 1, .. }));
    }

    #[test]
    fn implausible_score_fails_closed() {
        let ok = MatchRecord::new(day(3), "A", "B", MAX_GOALS, 0);
        assert_eq!(compute_stats("A", &[ok.clone()], 3).expect("valid").goals_for, 99);

        let huge = MatchRecord::new(day(2), "B", "A", 0, i32::MAX);
        let err = compute_stats("A", &[ok, huge.clone(), huge], 3).unwrap_err();
        assert!(matches!(err, AnalysisError::MalformedRecord { index: 1, .. }));
    }

    #[test]
    fn over_and_btts_flags() {
        let matches = vec![
            MatchRecord::new(day(4), "A", "B", 2, 1),
            MatchRecord::new(day(3), "A", "B", 3, 0),
            MatchRecord::new(day(2), "B", "A", 1, 1),
            MatchRecord::new(day(1), "B", "A", 0, 0),
        ];
        let s = compute_stats("A", &matches, 10).expect("valid");
        assert_eq!(s.over25_count, 2);
        assert_eq!(s.btts_count, 2);
        assert!((s.over25_rate - 0.5).abs() < 1e-12);
        assert!((s.btts_rate - 0.5).abs() < 1e-12);
        assert_eq!(s.form_points, 3 + 3 + 1 + 1);
        assert_eq!(s.away_record.draws, 2);
        assert_eq!(s.home_record.points(), 6);
    }
}
