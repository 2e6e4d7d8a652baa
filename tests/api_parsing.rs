use std::fs;
use std::path::PathBuf;

use matchform::api_client::{ApiError, parse_fixtures_json, parse_leagues_json, parse_teams_json};
use matchform::api_source::{fixtures_to_records, team_name_from_fixtures};
use matchform::form::compute_stats;

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

#[test]
fn parses_fixtures_payload() {
    let raw = read_fixture("api_fixtures.json");
    let fixtures = parse_fixtures_json(&raw).expect("fixture should parse");
    assert_eq!(fixtures.len(), 3);
    assert_eq!(fixtures[0].id, 1208001);
    assert_eq!(fixtures[0].home_id, Some(645));
    assert_eq!(fixtures[0].home_goals, Some(2));
    assert_eq!(fixtures[2].home_goals, None);
    assert_eq!(
        team_name_from_fixtures(&fixtures, 549).as_deref(),
        Some("Besiktas")
    );
}

#[test]
fn fixtures_feed_the_form_calculator() {
    let raw = read_fixture("api_fixtures.json");
    let fixtures = parse_fixtures_json(&raw).expect("fixture should parse");
    let records = fixtures_to_records(&fixtures);
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].home_team, "Besiktas");

    let team = team_name_from_fixtures(&fixtures, 645).expect("team name");
    let stats = compute_stats(&team, &records, 10).expect("stats");
    assert_eq!(stats.matches_considered, 2);
    assert_eq!((stats.wins, stats.draws, stats.losses), (1, 1, 0));
    assert_eq!(stats.away_record.played, 1);
}

#[test]
fn parses_leagues_and_teams() {
    let leagues = parse_leagues_json(&read_fixture("api_leagues.json")).expect("leagues");
    assert_eq!(leagues.len(), 2);
    assert_eq!(leagues[0].league_id, Some(203));
    assert_eq!(leagues[0].league_name, "Süper Lig");
    assert_eq!(leagues[0].country, "Turkey");

    let teams = parse_teams_json(&read_fixture("api_teams.json")).expect("teams");
    assert_eq!(teams.len(), 1);
    assert_eq!(teams[0].team_id, Some(645));
    assert_eq!(teams[0].country, "Turkey");
}

#[test]
fn reported_errors_surface() {
    let err = parse_teams_json(&read_fixture("api_error.json")).unwrap_err();
    assert!(matches!(err, ApiError::Reported(ref m) if m.contains("application key")));
}
