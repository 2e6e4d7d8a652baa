use std::cmp::Ordering;

use rayon::prelude::*;

use crate::error::AnalysisError;
use crate::form::{TeamStats, compute_stats};
use crate::model::MatchRecord;

/// One line of a form table.
#[derive(Debug, Clone)]
pub struct TeamRow {
    pub team: String,
    pub stats: Result<TeamStats, AnalysisError>,
}

impl TeamRow {
    pub fn goal_difference(&self) -> i64 {
        match &self.stats {
            Ok(s) => s.goals_for as i64 - s.goals_against as i64,
            Err(_) => 0,
        }
    }
}

/// Runs the form calculator for every team over one shared match list.
///
/// Failures stay attached to their team. Rows are ordered by form points,
/// then goal difference, then name; failed rows go last.
pub fn analyze_teams(matches: &[MatchRecord], teams: &[String], window: usize) -> Vec<TeamRow> {
    let mut rows = teams
        .par_iter()
        .map(|team| {
            let own = matches
                .iter()
                .filter(|m| m.involves(team))
                .cloned()
                .collect::<Vec<_>>();
            TeamRow {
                team: team.clone(),
                stats: compute_stats(team, &own, window),
            }
        })
        .collect::<Vec<_>>();
    rows.sort_by(table_order);
    rows
}

fn table_order(a: &TeamRow, b: &TeamRow) -> Ordering {
    match (&a.stats, &b.stats) {
        (Ok(sa), Ok(sb)) => sb
            .form_points
            .cmp(&sa.form_points)
            .then_with(|| b.goal_difference().cmp(&a.goal_difference()))
            .then_with(|| a.team.cmp(&b.team)),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.team.cmp(&b.team),
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::analyze_teams;
    use crate::error::AnalysisError;
    use crate::model::MatchRecord;

    fn day(d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(2024, 9, d)
    }

    #[test]
    fn orders_by_points_then_goal_difference_then_name() {
        let matches = vec![
            MatchRecord::new(day(1), "Alpha", "Beta", 3, 0),
            MatchRecord::new(day(2), "Gamma", "Delta", 1, 0),
            MatchRecord::new(day(3), "Beta", "Delta", 1, 1),
        ];
        let teams = ["Delta", "Gamma", "Alpha", "Beta"]
            .iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>();
        let rows = analyze_teams(&matches, &teams, 10);
        let order = rows.iter().map(|r| r.team.as_str()).collect::<Vec<_>>();
        // Alpha and Gamma both have 3 points; Alpha's +3 beats Gamma's +1.
        assert_eq!(order, vec!["Alpha", "Gamma", "Delta", "Beta"]);
        assert_eq!(rows[0].goal_difference(), 3);
    }

    #[test]
    fn errors_are_kept_per_team() {
        let matches = vec![MatchRecord::new(day(1), "Alpha", "Beta", 1, 0)];
        let teams = vec!["Alpha".to_string(), "Nobody".to_string()];
        let rows = analyze_teams(&matches, &teams, 0);
        assert!(
            rows.iter()
                .all(|r| matches!(r.stats, Err(AnalysisError::InvalidWindow(0))))
        );

        let rows = analyze_teams(&matches, &teams, 5);
        assert_eq!(rows[0].team, "Alpha");
        let nobody = rows[1].stats.as_ref().expect("empty stats");
        assert_eq!(nobody.matches_considered, 0);
    }
}
