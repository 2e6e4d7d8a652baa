use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::model::MatchRecord;
use crate::source::{MatchSource, TeamMatches, select_team_matches, sort_newest_first};

/// Expected header: `date,home_team,away_team,home_goals,away_goals`.
#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(default)]
    date: String,
    home_team: String,
    away_team: String,
    home_goals: Option<i32>,
    away_goals: Option<i32>,
}

#[derive(Debug, Clone)]
pub struct CsvSource {
    path: PathBuf,
}

impl CsvSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every completed match in the file, newest first.
    pub fn load_all(&self) -> Result<Vec<MatchRecord>> {
        if !self.path.exists() {
            return Err(anyhow!("csv file not found: {}", self.path.display()));
        }
        let file = std::fs::File::open(&self.path)
            .with_context(|| format!("open csv {}", self.path.display()))?;
        let rows = read_matches(file).with_context(|| format!("read {}", self.path.display()))?;
        tracing::info!(path = %self.path.display(), rows = rows.len(), "loaded csv matches");
        Ok(rows)
    }
}

impl MatchSource for CsvSource {
    fn team_matches(&self, team: &str) -> Result<TeamMatches> {
        let all = self.load_all()?;
        select_team_matches(&all, team)
    }

    fn describe(&self) -> String {
        format!("csv:{}", self.path.display())
    }
}

/// Parses CSV match rows. Rows with an empty score are fixtures that have not
/// been played and are skipped; anything else unparseable is an error.
pub fn read_matches<R: Read>(reader: R) -> Result<Vec<MatchRecord>> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut out = Vec::new();
    let mut skipped = 0usize;
    for (idx, row) in rdr.deserialize::<CsvRow>().enumerate() {
        // Header is line 1.
        let line = idx + 2;
        let row = row.with_context(|| format!("invalid csv row at line {line}"))?;
        let (Some(home_goals), Some(away_goals)) = (row.home_goals, row.away_goals) else {
            skipped += 1;
            continue;
        };
        if home_goals < 0 || away_goals < 0 {
            return Err(anyhow!("negative score at line {line}"));
        }
        let date = parse_date(&row.date)
            .with_context(|| format!("invalid date '{}' at line {line}", row.date))?;
        out.push(MatchRecord {
            date,
            home_team: row.home_team,
            away_team: row.away_team,
            home_goals: Some(home_goals),
            away_goals: Some(away_goals),
        });
    }

    if skipped > 0 {
        tracing::warn!(skipped, "skipped csv rows without a final score");
    }
    sort_newest_first(&mut out);
    Ok(out)
}

/// `YYYY-MM-DD`, or any timestamp starting with one. Empty means undated.
pub fn parse_date(raw: &str) -> Result<Option<NaiveDate>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    let day = raw.get(..10).unwrap_or(raw);
    let date = NaiveDate::parse_from_str(day, "%Y-%m-%d").context("expected YYYY-MM-DD")?;
    Ok(Some(date))
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{parse_date, read_matches};

    #[test]
    fn parse_date_accepts_timestamps() {
        assert_eq!(
            parse_date("2024-08-17T19:00:00+00:00").expect("valid"),
            NaiveDate::from_ymd_opt(2024, 8, 17)
        );
        assert_eq!(parse_date("  ").expect("empty"), None);
        assert!(parse_date("17/08/2024").is_err());
    }

    #[test]
    fn unplayed_rows_are_skipped_and_rest_sorted() {
        let raw = "date,home_team,away_team,home_goals,away_goals\n\
                   2024-01-05,A,B,1,0\n\
                   2024-01-20,C,A,,\n\
                   2024-01-12,A,D,2,2\n";
        let rows = read_matches(raw.as_bytes()).expect("valid csv");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].away_team, "D");
        assert_eq!(rows[1].away_team, "B");
    }

    #[test]
    fn bad_score_reports_line() {
        let raw = "date,home_team,away_team,home_goals,away_goals\n\
                   2024-01-05,A,B,one,0\n";
        let err = read_matches(raw.as_bytes()).unwrap_err();
        assert!(format!("{err:#}").contains("line 2"));
    }
}
