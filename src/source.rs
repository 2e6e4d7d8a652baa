use anyhow::{Result, anyhow};

use crate::model::{MatchRecord, newest_first};
use crate::team_names::resolve_team_name;

/// Matches involving one team, most recent first.
#[derive(Debug, Clone)]
pub struct TeamMatches {
    /// The team's name as spelled in the data.
    pub team: String,
    pub matches: Vec<MatchRecord>,
}

/// Anything that can hand the engine a materialised list of completed
/// matches for a team: a CSV file, the SQLite store, the remote API.
pub trait MatchSource {
    fn team_matches(&self, team: &str) -> Result<TeamMatches>;

    fn describe(&self) -> String;
}

/// Resolves `query` against every team named in `all` and keeps only the
/// matches involving it. `all` is expected newest first already.
pub fn select_team_matches(all: &[MatchRecord], query: &str) -> Result<TeamMatches> {
    let names = all
        .iter()
        .flat_map(|m| [m.home_team.as_str(), m.away_team.as_str()]);
    let team = resolve_team_name(names, query)
        .ok_or_else(|| anyhow!("team '{query}' not found in match data"))?;
    let matches = all.iter().filter(|m| m.involves(&team)).cloned().collect();
    Ok(TeamMatches { team, matches })
}

/// Sort newest first; undated rows go last in their original order.
pub fn sort_newest_first(matches: &mut [MatchRecord]) {
    matches.sort_by(newest_first);
}
