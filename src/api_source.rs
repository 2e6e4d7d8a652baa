use anyhow::{Context, Result, anyhow};

use crate::api_client::{ApiClient, ApiFixture};
use crate::csv_source::parse_date;
use crate::model::MatchRecord;
use crate::source::{MatchSource, TeamMatches};

/// Team fixtures for one league season from API-Football. Teams are
/// addressed by numeric id.
pub struct ApiSource {
    client: ApiClient,
    league_id: u32,
    season: u16,
}

impl ApiSource {
    pub fn new(client: ApiClient, league_id: u32, season: u16) -> Self {
        Self {
            client,
            league_id,
            season,
        }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn fetch_team(&self, team_id: u32) -> Result<TeamMatches> {
        let fixtures = self
            .client
            .team_fixtures(team_id, self.league_id, self.season)
            .with_context(|| format!("team {team_id} fixtures request failed"))?;
        tracing::info!(
            team_id,
            league_id = self.league_id,
            season = self.season,
            fixtures = fixtures.len(),
            "fetched fixtures"
        );

        let team = match team_name_from_fixtures(&fixtures, team_id) {
            Some(name) => name,
            None => self
                .client
                .team_name(team_id)
                .context("team lookup failed")?
                .filter(|name| !name.is_empty())
                .ok_or_else(|| anyhow!("unknown team id {team_id}"))?,
        };

        Ok(TeamMatches {
            team,
            matches: fixtures_to_records(&fixtures),
        })
    }
}

impl MatchSource for ApiSource {
    fn team_matches(&self, team: &str) -> Result<TeamMatches> {
        let team_id = team
            .trim()
            .parse::<u32>()
            .with_context(|| format!("API mode expects a numeric team id, got '{team}'"))?;
        self.fetch_team(team_id)
    }

    fn describe(&self) -> String {
        format!("api-football:league={}:season={}", self.league_id, self.season)
    }
}

/// The fixture payload spells the team the same way on every row, so the
/// engine's home/away attribution lines up with it.
pub fn team_name_from_fixtures(fixtures: &[ApiFixture], team_id: u32) -> Option<String> {
    fixtures.iter().find_map(|f| {
        if f.home_id == Some(team_id) && !f.home_name.is_empty() {
            Some(f.home_name.clone())
        } else if f.away_id == Some(team_id) && !f.away_name.is_empty() {
            Some(f.away_name.clone())
        } else {
            None
        }
    })
}

/// Converts fixtures to match records, newest first. Fixtures without both
/// scores never reach the engine.
pub fn fixtures_to_records(fixtures: &[ApiFixture]) -> Vec<MatchRecord> {
    let mut skipped = 0usize;
    let mut out = Vec::with_capacity(fixtures.len());
    for f in fixtures {
        let (Some(home_goals), Some(away_goals)) = (f.home_goals, f.away_goals) else {
            skipped += 1;
            continue;
        };
        let date = match parse_date(&f.date) {
            Ok(date) => date,
            Err(err) => {
                tracing::warn!(
                    fixture = f.id,
                    date = %f.date,
                    "unparseable fixture date: {err:#}"
                );
                None
            }
        };
        out.push(MatchRecord {
            date,
            home_team: f.home_name.clone(),
            away_team: f.away_name.clone(),
            home_goals: Some(home_goals),
            away_goals: Some(away_goals),
        });
    }
    if skipped > 0 {
        tracing::warn!(skipped, "dropped fixtures without a final score");
    }
    crate::source::sort_newest_first(&mut out);
    out
}
