use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::Client;
use serde_json::Value;
use thiserror::Error;

use crate::http_cache::{TtlCache, cache_key};

pub const DEFAULT_BASE_URL: &str = "https://v3.football.api-sports.io";
const API_KEY_HEADER: &str = "x-apisports-key";
const CACHE_TTL: Duration = Duration::from_secs(60);
const MIN_SEARCH_LEN: usize = 3;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("API did not respond (timeout), try again later")]
    Timeout,
    #[error("could not connect to the API, check your internet connection")]
    Connect,
    #[error("API rate limit exceeded, wait a few minutes and retry")]
    RateLimited,
    #[error("API server error ({0}), try again later")]
    Server(u16),
    #[error("API error: HTTP {0}")]
    Status(u16),
    #[error("API returned invalid JSON")]
    InvalidJson,
    #[error("API error: {0}")]
    Reported(String),
    #[error("request failed: {0}")]
    Request(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeagueRow {
    pub league_id: Option<u32>,
    pub league_name: String,
    pub country: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamRow {
    pub team_id: Option<u32>,
    pub team_name: String,
    pub country: String,
}

/// A finished fixture as reported by `/fixtures`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiFixture {
    pub id: u64,
    /// ISO timestamp, e.g. `2024-08-17T14:00:00+00:00`.
    pub date: String,
    pub home_id: Option<u32>,
    pub home_name: String,
    pub away_id: Option<u32>,
    pub away_name: String,
    pub home_goals: Option<i32>,
    pub away_goals: Option<i32>,
}

/// API-Football v3 client.
pub struct ApiClient {
    http: &'static Client,
    base_url: String,
    api_key: String,
    cache: TtlCache,
}

impl ApiClient {
    pub fn new(
        http: &'static Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            cache: TtlCache::new(CACHE_TTL),
        }
    }

    pub fn leagues(&self) -> Result<Vec<LeagueRow>, ApiError> {
        let items = self.get("leagues", &[], true)?;
        Ok(items.iter().map(parse_league_row).collect())
    }

    /// Name search; queries shorter than three characters return nothing
    /// without hitting the API.
    pub fn search_teams(&self, query: &str) -> Result<Vec<TeamRow>, ApiError> {
        let query = query.trim();
        if query.chars().count() < MIN_SEARCH_LEN {
            return Ok(Vec::new());
        }
        let items = self.get("teams", &[("search", query.to_string())], true)?;
        Ok(items.iter().filter_map(parse_team_row).collect())
    }

    pub fn team_name(&self, team_id: u32) -> Result<Option<String>, ApiError> {
        let items = self.get("teams", &[("id", team_id.to_string())], true)?;
        Ok(items
            .iter()
            .filter_map(parse_team_row)
            .map(|t| t.team_name)
            .next())
    }

    /// Finished fixtures of a team in one league season, newest first.
    pub fn team_fixtures(
        &self,
        team_id: u32,
        league_id: u32,
        season: u16,
    ) -> Result<Vec<ApiFixture>, ApiError> {
        let params = [
            ("team", team_id.to_string()),
            ("league", league_id.to_string()),
            ("season", season.to_string()),
            ("status", "FT".to_string()),
        ];
        let items = self.get("fixtures", &params, false)?;
        let mut out = items.iter().filter_map(parse_fixture).collect::<Vec<_>>();
        // ISO timestamps order correctly as strings.
        out.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(out)
    }

    fn get(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
        use_cache: bool,
    ) -> Result<Vec<Value>, ApiError> {
        let key = cache_key(endpoint, params);
        if use_cache {
            if let Some(body) = self.cache.get(&key) {
                tracing::debug!(%key, "api cache hit");
                return parse_response(&body);
            }
        }

        let url = format!("{}/{}", self.base_url, endpoint);
        tracing::debug!(%url, ?params, "api request");
        let resp = self
            .http
            .get(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .query(params)
            .send()
            .map_err(|err| {
                if err.is_timeout() {
                    ApiError::Timeout
                } else if err.is_connect() {
                    ApiError::Connect
                } else {
                    ApiError::Request(err.to_string())
                }
            })?;

        check_status(resp.status())?;
        let body = resp.text().map_err(|err| ApiError::Request(err.to_string()))?;
        let items = parse_response(&body)?;
        if use_cache {
            self.cache.insert(key, body);
        }
        Ok(items)
    }
}

pub fn check_status(status: StatusCode) -> Result<(), ApiError> {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(ApiError::RateLimited);
    }
    if status.is_server_error() {
        return Err(ApiError::Server(status.as_u16()));
    }
    if status != StatusCode::OK {
        return Err(ApiError::Status(status.as_u16()));
    }
    Ok(())
}

/// Unwraps the `{ "errors": ..., "response": [...] }` envelope.
///
/// `errors` is `[]` on success and an object of messages otherwise.
pub fn parse_response(body: &str) -> Result<Vec<Value>, ApiError> {
    let v: Value = serde_json::from_str(body.trim()).map_err(|_| ApiError::InvalidJson)?;

    if let Some(errors) = v.get("errors") {
        let has_errors = match errors {
            Value::Array(items) => !items.is_empty(),
            Value::Object(map) => !map.is_empty(),
            Value::String(s) => !s.trim().is_empty(),
            _ => false,
        };
        if has_errors {
            let msg = errors
                .get("message")
                .and_then(|m| m.as_str())
                .map(|s| s.to_string())
                .unwrap_or_else(|| error_text(errors));
            let lower = msg.to_lowercase();
            if lower.contains("rate") || lower.contains("limit") {
                return Err(ApiError::RateLimited);
            }
            return Err(ApiError::Reported(msg));
        }
    }

    Ok(v.get("response")
        .and_then(|r| r.as_array())
        .cloned()
        .unwrap_or_default())
}

fn error_text(errors: &Value) -> String {
    match errors {
        Value::Object(map) => map
            .iter()
            .map(|(k, v)| match v.as_str() {
                Some(s) => format!("{k}: {s}"),
                None => format!("{k}: {v}"),
            })
            .collect::<Vec<_>>()
            .join("; "),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Ids outside `u32` are treated as absent rather than wrapped.
fn id_field(value: &Value) -> Option<u32> {
    value.as_u64().and_then(|id| u32::try_from(id).ok())
}

fn parse_league_row(item: &Value) -> LeagueRow {
    let league = item.get("league").filter(|l| l.is_object()).unwrap_or(item);
    let country = item
        .get("country")
        .and_then(|c| c.get("name"))
        .and_then(|x| x.as_str())
        .or_else(|| league.get("country").and_then(|x| x.as_str()))
        .unwrap_or_default()
        .to_string();
    LeagueRow {
        league_id: league.get("id").and_then(id_field),
        league_name: league
            .get("name")
            .and_then(|x| x.as_str())
            .unwrap_or_default()
            .to_string(),
        country,
    }
}

fn parse_team_row(item: &Value) -> Option<TeamRow> {
    let team = item.get("team").unwrap_or(item);
    if !team.is_object() {
        return None;
    }
    Some(TeamRow {
        team_id: team.get("id").and_then(id_field),
        team_name: team
            .get("name")
            .and_then(|x| x.as_str())
            .unwrap_or_default()
            .to_string(),
        country: team
            .get("country")
            .and_then(|x| x.as_str())
            .unwrap_or_default()
            .to_string(),
    })
}

fn parse_fixture(item: &Value) -> Option<ApiFixture> {
    let fixture = item.get("fixture")?;
    let id = fixture.get("id")?.as_u64()?;
    let date = fixture
        .get("date")
        .and_then(|x| x.as_str())
        .unwrap_or_default()
        .to_string();

    let teams = item.get("teams")?;
    let home = teams.get("home")?;
    let away = teams.get("away")?;
    let goals = item.get("goals");
    let goal = |side: &str| {
        goals
            .and_then(|g| g.get(side))
            .and_then(|x| x.as_i64())
            .and_then(|n| i32::try_from(n).ok())
    };

    Some(ApiFixture {
        id,
        date,
        home_id: home.get("id").and_then(id_field),
        home_name: home
            .get("name")
            .and_then(|x| x.as_str())
            .unwrap_or_default()
            .to_string(),
        away_id: away.get("id").and_then(id_field),
        away_name: away
            .get("name")
            .and_then(|x| x.as_str())
            .unwrap_or_default()
            .to_string(),
        home_goals: goal("home"),
        away_goals: goal("away"),
    })
}

/// Parses a full `/fixtures` body; handy for fixtures saved to disk.
pub fn parse_fixtures_json(body: &str) -> Result<Vec<ApiFixture>, ApiError> {
    let items = parse_response(body)?;
    Ok(items.iter().filter_map(parse_fixture).collect())
}

pub fn parse_leagues_json(body: &str) -> Result<Vec<LeagueRow>, ApiError> {
    let items = parse_response(body)?;
    Ok(items.iter().map(parse_league_row).collect())
}

pub fn parse_teams_json(body: &str) -> Result<Vec<TeamRow>, ApiError> {
    let items = parse_response(body)?;
    Ok(items.iter().filter_map(parse_team_row).collect())
}
