use anyhow::{Context, Result};
use clap::Parser;

use matchform::api_source::ApiSource;
use matchform::batch::analyze_teams;
use matchform::compare::compare;
use matchform::config::{self, Cli, Commands, IngestArgs, SourceArgs};
use matchform::csv_source::CsvSource;
use matchform::export;
use matchform::form::{TeamStats, compute_stats};
use matchform::logging;
use matchform::model::MatchRecord;
use matchform::report::{self, Palette};
use matchform::source::MatchSource;
use matchform::store::{self, StoreSource};
use matchform::team_names::resolve_team_name;

fn main() {
    config::load_env();
    logging::init();

    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let palette = Palette::from_env(cli.no_color);
    match cli.command {
        Commands::Leagues => list_leagues(),
        Commands::Search { query } => search_teams(&query),
        Commands::Team {
            team,
            source,
            output,
        } => {
            let stats = team_stats(&source, &team)?;
            if output.json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                print!("{}", report::render_team(&stats, palette));
            }
            report::write_atomic(&output.output, &report::html_team(&stats))?;
            status(output.json, format_args!("HTML report: {}", output.output.display()));
            if let Some(path) = &output.xlsx {
                let written = export::export_team(path, &stats)?;
                status(output.json, format_args!("Workbook: {} ({written})", path.display()));
            }
            Ok(())
        }
        Commands::Compare {
            team1,
            team2,
            source,
            output,
        } => {
            let stats1 = team_stats(&source, &team1)?;
            let stats2 = team_stats(&source, &team2)?;
            let cmp = compare(&stats1, &stats2);
            if output.json {
                println!("{}", serde_json::to_string_pretty(&cmp)?);
            } else {
                print!("{}", report::render_comparison(&cmp, palette));
            }
            report::write_atomic(&output.output, &report::html_comparison(&cmp))?;
            status(output.json, format_args!("HTML report: {}", output.output.display()));
            if let Some(path) = &output.xlsx {
                let written = export::export_comparison(path, &cmp)?;
                status(output.json, format_args!("Workbook: {} ({written})", path.display()));
            }
            Ok(())
        }
        Commands::Table {
            teams,
            csv,
            db,
            window,
            xlsx,
        } => {
            let all = match db {
                Some(path) => StoreSource::new(path).load_all()?,
                None => CsvSource::new(csv.unwrap_or_else(|| config::DEFAULT_CSV.into()))
                    .load_all()?,
            };
            let names = resolve_names(&all, &teams);
            let rows = analyze_teams(&all, &names, window.last);
            print!("{}", report::render_table(&rows, window.last, palette));
            if let Some(path) = &xlsx {
                let written = export::export_table(path, &rows)?;
                println!("Workbook: {} ({written})", path.display());
            }
            Ok(())
        }
        Commands::Ingest(args) => ingest(&args),
    }
}

/// Status lines go to stderr under `--json` so stdout stays parseable.
fn status(json: bool, line: std::fmt::Arguments<'_>) {
    if json {
        eprintln!("{line}");
    } else {
        println!("{line}");
    }
}

fn team_stats(source: &SourceArgs, team: &str) -> Result<TeamStats> {
    let matches = source.build()?.team_matches(team)?;
    let stats = compute_stats(&matches.team, &matches.matches, source.window.last)
        .with_context(|| format!("analysing {}", matches.team))?;
    Ok(stats)
}

/// Maps each query to the spelling used in the data; unknown names are kept
/// as typed and show up with no matches.
fn resolve_names(all: &[MatchRecord], queries: &[String]) -> Vec<String> {
    queries
        .iter()
        .map(|query| {
            let known = all
                .iter()
                .flat_map(|m| [m.home_team.as_str(), m.away_team.as_str()]);
            resolve_team_name(known, query).unwrap_or_else(|| {
                tracing::warn!(team = %query, "team not found in match data");
                query.clone()
            })
        })
        .collect()
}

fn list_leagues() -> Result<()> {
    let client = config::api_client()?;
    let leagues = client.leagues()?;
    for row in &leagues {
        let id = row
            .league_id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!("{id:>6}  {} ({})", row.league_name, row.country);
    }
    println!("{} leagues", leagues.len());
    Ok(())
}

fn search_teams(query: &str) -> Result<()> {
    if query.trim().chars().count() < 3 {
        println!("Search needs at least 3 characters.");
        return Ok(());
    }
    let client = config::api_client()?;
    let teams = client.search_teams(query)?;
    if teams.is_empty() {
        println!("No teams match '{query}'.");
    }
    for row in &teams {
        let id = row
            .team_id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!("{id:>6}  {} ({})", row.team_name, row.country);
    }
    Ok(())
}

fn ingest(args: &IngestArgs) -> Result<()> {
    let (label, matches) = match (&args.csv, args.team_id, args.league_id, args.season) {
        (Some(path), _, _, _) => {
            let source = CsvSource::new(path);
            (source.describe(), source.load_all()?)
        }
        (None, Some(team_id), Some(league_id), Some(season)) => {
            let source = ApiSource::new(config::api_client()?, league_id, season);
            let team = source.fetch_team(team_id)?;
            (source.describe(), team.matches)
        }
        _ => anyhow::bail!("ingest needs --csv or --team-id with --league-id and --season"),
    };

    let mut conn = store::open_db(&args.db)?;
    let summary = store::ingest_matches(&mut conn, args.db.clone(), &label, &matches)?;
    print_ingest_summary(&summary);
    Ok(())
}

fn print_ingest_summary(summary: &store::IngestSummary) {
    println!("Ingest complete");
    println!("DB: {}", summary.db_path.display());
    println!("Source: {}", summary.source);
    println!(
        "Rows: {} seen, {} upserted, {} unchanged, {} skipped",
        summary.rows_seen, summary.rows_upserted, summary.rows_unchanged, summary.rows_skipped
    );
    println!("Matches in store: {}", summary.total_matches);
}
