//! Command line and environment configuration.

use std::path::PathBuf;

use anyhow::{Result, anyhow};
use clap::builder::RangedU64ValueParser;
use clap::{Args, Parser, Subcommand};

use crate::api_client::{ApiClient, DEFAULT_BASE_URL};
use crate::api_source::ApiSource;
use crate::csv_source::CsvSource;
use crate::http_client::http_client;
use crate::source::MatchSource;
use crate::store::StoreSource;

pub const API_KEY_ENV: &str = "API_FOOTBALL_KEY";
pub const BASE_URL_ENV: &str = "API_FOOTBALL_BASE_URL";
pub const DEFAULT_CSV: &str = "sample_matches.csv";
pub const DEFAULT_WINDOW: usize = 10;

/// Football form analysis: recent results, goal trends and a rough 1X2
/// estimate from historical match data.
///
/// Matches are read from a CSV file (default), a SQLite store built with
/// `ingest`, or API-Football when `--league-id` and `--season` are given.
#[derive(Parser, Debug)]
#[command(name = "matchform")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Disable coloured terminal output (NO_COLOR is honoured too)
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List leagues known to API-Football
    Leagues,
    /// Search API-Football teams by name (at least 3 characters)
    Search {
        query: String,
    },
    /// Form report for one team
    Team {
        /// Team name, or numeric team id in API mode
        team: String,
        #[command(flatten)]
        source: SourceArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Compare two teams and estimate the match outcome
    Compare {
        team1: String,
        team2: String,
        #[command(flatten)]
        source: SourceArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Form table for several teams from one CSV file or store
    Table {
        #[arg(required = true)]
        teams: Vec<String>,
        /// CSV file with match results
        #[arg(long, conflicts_with = "db")]
        csv: Option<PathBuf>,
        /// SQLite match store
        #[arg(long)]
        db: Option<PathBuf>,
        #[command(flatten)]
        window: WindowArgs,
        /// Also write an Excel workbook
        #[arg(long)]
        xlsx: Option<PathBuf>,
    },
    /// Load match results into a SQLite store
    Ingest(IngestArgs),
}

#[derive(Args, Debug, Clone)]
pub struct WindowArgs {
    /// Number of most recent matches to analyse
    #[arg(
        long = "last",
        default_value_t = DEFAULT_WINDOW,
        value_parser = RangedU64ValueParser::<usize>::new().range(1..)
    )]
    pub last: usize,
}

#[derive(Args, Debug, Clone)]
pub struct SourceArgs {
    /// CSV file with match results [default: sample_matches.csv]
    #[arg(long, conflicts_with_all = ["db", "league_id"])]
    pub csv: Option<PathBuf>,

    /// SQLite match store built with `ingest`
    #[arg(long, conflicts_with = "league_id")]
    pub db: Option<PathBuf>,

    /// API-Football league id (enables API mode; teams are numeric ids)
    #[arg(long, requires = "season")]
    pub league_id: Option<u32>,

    /// Season start year for API mode, e.g. 2024
    #[arg(long, requires = "league_id")]
    pub season: Option<u16>,

    #[command(flatten)]
    pub window: WindowArgs,
}

#[derive(Args, Debug, Clone)]
pub struct OutputArgs {
    /// HTML report path
    #[arg(long, default_value = "report.html")]
    pub output: PathBuf,

    /// Also write an Excel workbook
    #[arg(long)]
    pub xlsx: Option<PathBuf>,

    /// Print the analysis as JSON instead of the terminal report
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct IngestArgs {
    /// SQLite store to create or update
    #[arg(long)]
    pub db: PathBuf,

    /// CSV file to load
    #[arg(long, conflicts_with = "team_id", required_unless_present = "team_id")]
    pub csv: Option<PathBuf>,

    /// API-Football team id whose finished fixtures are loaded
    #[arg(long, requires_all = ["league_id", "season"])]
    pub team_id: Option<u32>,

    #[arg(long)]
    pub league_id: Option<u32>,

    #[arg(long)]
    pub season: Option<u16>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceKind {
    Csv(PathBuf),
    Store(PathBuf),
    Api { league_id: u32, season: u16 },
}

impl SourceArgs {
    pub fn kind(&self) -> SourceKind {
        if let (Some(league_id), Some(season)) = (self.league_id, self.season) {
            return SourceKind::Api { league_id, season };
        }
        if let Some(db) = &self.db {
            return SourceKind::Store(db.clone());
        }
        SourceKind::Csv(
            self.csv
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CSV)),
        )
    }

    pub fn build(&self) -> Result<Box<dyn MatchSource>> {
        let source: Box<dyn MatchSource> = match self.kind() {
            SourceKind::Csv(path) => Box::new(CsvSource::new(path)),
            SourceKind::Store(path) => Box::new(StoreSource::new(path)),
            SourceKind::Api { league_id, season } => {
                Box::new(ApiSource::new(api_client()?, league_id, season))
            }
        };
        tracing::debug!(source = %source.describe(), "match source");
        Ok(source)
    }
}

/// Loads `.env.local` then `.env`; variables already set win.
pub fn load_env() {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
}

pub fn api_key() -> Result<String> {
    std::env::var(API_KEY_ENV)
        .ok()
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
        .ok_or_else(|| anyhow!("{API_KEY_ENV} is not set; add it to .env or the environment"))
}

pub fn base_url() -> String {
    std::env::var(BASE_URL_ENV)
        .ok()
        .filter(|u| !u.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
}

pub fn api_client() -> Result<ApiClient> {
    let key = api_key()?;
    Ok(ApiClient::new(http_client()?, base_url(), key))
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use clap::Parser;

    use super::{Cli, Commands, SourceKind};

    #[test]
    fn team_defaults_to_sample_csv() {
        let cli = Cli::try_parse_from(["matchform", "team", "Galatasaray"]).expect("parse");
        let Commands::Team {
            team,
            source,
            output,
        } = cli.command
        else {
            panic!("expected team command");
        };
        assert_eq!(team, "Galatasaray");
        assert_eq!(source.window.last, 10);
        assert_eq!(
            source.kind(),
            SourceKind::Csv(PathBuf::from("sample_matches.csv"))
        );
        assert_eq!(output.output, PathBuf::from("report.html"));
        assert!(output.xlsx.is_none());
        assert!(!output.json);
    }

    #[test]
    fn api_mode_needs_league_and_season() {
        let cli = Cli::try_parse_from([
            "matchform",
            "compare",
            "645",
            "611",
            "--league-id",
            "203",
            "--season",
            "2024",
            "--last",
            "5",
        ])
        .expect("parse");
        let Commands::Compare { source, .. } = cli.command else {
            panic!("expected compare command");
        };
        assert_eq!(
            source.kind(),
            SourceKind::Api {
                league_id: 203,
                season: 2024
            }
        );
        assert_eq!(source.window.last, 5);

        assert!(Cli::try_parse_from(["matchform", "team", "645", "--league-id", "203"]).is_err());
    }

    #[test]
    fn rejects_zero_window_and_conflicting_sources() {
        assert!(Cli::try_parse_from(["matchform", "team", "A", "--last", "0"]).is_err());
        assert!(Cli::try_parse_from(["matchform", "team", "A", "--last", "-3"]).is_err());
        assert!(
            Cli::try_parse_from(["matchform", "team", "A", "--csv", "a.csv", "--db", "m.db"])
                .is_err()
        );
    }

    #[test]
    fn ingest_requires_an_input() {
        assert!(Cli::try_parse_from(["matchform", "ingest", "--db", "m.db"]).is_err());
        assert!(
            Cli::try_parse_from(["matchform", "ingest", "--db", "m.db", "--csv", "x.csv"]).is_ok()
        );
        assert!(
            Cli::try_parse_from(["matchform", "ingest", "--db", "m.db", "--team-id", "645"])
                .is_err()
        );
    }
}
