use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::{Workbook, Worksheet};

use crate::batch::TeamRow;
use crate::compare::Comparison;
use crate::form::{SplitRecord, TeamStats};
use crate::insight::prediction_summary;

/// What a workbook export wrote, shown next to the file path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportReport {
    pub teams: usize,
    pub matches: usize,
    pub prediction_rows: usize,
}

impl fmt::Display for ExportReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} teams, {} matches", self.teams, self.matches)?;
        if self.prediction_rows > 0 {
            write!(f, ", {} prediction rows", self.prediction_rows)?;
        }
        Ok(())
    }
}

pub fn export_team(path: &Path, stats: &TeamStats) -> Result<ExportReport> {
    export(path, &[stats], None)
}

pub fn export_comparison(path: &Path, cmp: &Comparison<'_>) -> Result<ExportReport> {
    export(path, &[cmp.team1, cmp.team2], Some(prediction_rows(cmp)))
}

/// Form table export; teams whose analysis failed are left out.
pub fn export_table(path: &Path, rows: &[TeamRow]) -> Result<ExportReport> {
    let stats = rows
        .iter()
        .filter_map(|r| r.stats.as_ref().ok())
        .collect::<Vec<_>>();
    export(path, &stats, None)
}

fn export(
    path: &Path,
    teams: &[&TeamStats],
    prediction: Option<Vec<Vec<String>>>,
) -> Result<ExportReport> {
    let teams_rows = team_rows(teams);
    let matches_rows = match_rows(teams);

    let mut workbook = Workbook::new();
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Teams")?;
        write_rows(sheet, &teams_rows)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Matches")?;
        write_rows(sheet, &matches_rows)?;
    }
    let mut prediction_count = 0;
    if let Some(rows) = prediction {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Prediction")?;
        write_rows(sheet, &rows)?;
        prediction_count = rows.len().saturating_sub(1);
    }

    workbook
        .save(path)
        .with_context(|| format!("failed writing workbook to {}", path.display()))?;
    tracing::info!(path = %path.display(), teams = teams.len(), "wrote workbook");

    Ok(ExportReport {
        teams: teams.len(),
        matches: matches_rows.len().saturating_sub(1),
        prediction_rows: prediction_count,
    })
}

/// One row per team per split (Total, Home, Away).
pub fn team_rows(teams: &[&TeamStats]) -> Vec<Vec<String>> {
    let mut rows = vec![
        [
            "Team", "Split", "P", "W", "D", "L", "Pts", "GF", "GA", "GF avg", "GA avg",
            "Over 2.5 %", "BTTS %", "Form",
        ]
        .iter()
        .map(|h| h.to_string())
        .collect::<Vec<_>>(),
    ];
    for stats in teams {
        rows.push(vec![
            stats.team.clone(),
            "Total".to_string(),
            stats.matches_considered.to_string(),
            stats.wins.to_string(),
            stats.draws.to_string(),
            stats.losses.to_string(),
            stats.form_points.to_string(),
            stats.goals_for.to_string(),
            stats.goals_against.to_string(),
            format!("{:.2}", stats.goals_for_avg),
            format!("{:.2}", stats.goals_against_avg),
            format!("{:.1}", stats.over25_rate * 100.0),
            format!("{:.1}", stats.btts_rate * 100.0),
            crate::model::form_string(&stats.form_sequence),
        ]);
        rows.push(split_row(&stats.team, "Home", &stats.home_record));
        rows.push(split_row(&stats.team, "Away", &stats.away_record));
    }
    rows
}

fn split_row(team: &str, label: &str, split: &SplitRecord) -> Vec<String> {
    vec![
        team.to_string(),
        label.to_string(),
        split.played.to_string(),
        split.wins.to_string(),
        split.draws.to_string(),
        split.losses.to_string(),
        split.points().to_string(),
        split.goals_for.to_string(),
        split.goals_against.to_string(),
        format!("{:.2}", split.goals_for_avg),
        format!("{:.2}", split.goals_against_avg),
        format!("{:.1}", split.over25_rate * 100.0),
        format!("{:.1}", split.btts_rate * 100.0),
        String::new(),
    ]
}

/// The window each team was judged on.
pub fn match_rows(teams: &[&TeamStats]) -> Vec<Vec<String>> {
    let mut rows = vec![vec![
        "Team".to_string(),
        "Date".to_string(),
        "Home".to_string(),
        "Away".to_string(),
        "Score".to_string(),
        "Result".to_string(),
    ]];
    for stats in teams {
        for (m, outcome) in stats.considered.iter().zip(&stats.form_sequence) {
            rows.push(vec![
                stats.team.clone(),
                m.date
                    .map(|d| d.format("%Y-%m-%d").to_string())
                    .unwrap_or_default(),
                m.home_team.clone(),
                m.away_team.clone(),
                m.score_str().unwrap_or_default(),
                outcome.symbol().to_string(),
            ]);
        }
    }
    rows
}

pub fn prediction_rows(cmp: &Comparison<'_>) -> Vec<Vec<String>> {
    let p = &cmp.probabilities;
    let summary = prediction_summary(cmp.team1, cmp.team2);
    let mut rows = vec![
        vec!["Item".to_string(), "Value".to_string(), "Note".to_string()],
        vec![
            format!("{} win %", cmp.team1.team),
            format!("{:.1}", p.team1_win * 100.0),
            format!("strength {:.2}", cmp.strength1),
        ],
        vec![
            "Draw %".to_string(),
            format!("{:.1}", p.draw * 100.0),
            String::new(),
        ],
        vec![
            format!("{} win %", cmp.team2.team),
            format!("{:.1}", p.team2_win * 100.0),
            format!("strength {:.2}", cmp.strength2),
        ],
        vec![
            "Expected goals".to_string(),
            format!("{:.2}-{:.2}", cmp.expected_goals1, cmp.expected_goals2),
            String::new(),
        ],
        vec![
            "Most likely".to_string(),
            cmp.predicted_team()
                .map(|t| format!("{t} win"))
                .unwrap_or_else(|| "Draw".to_string()),
            format!("confidence {}/100", cmp.confidence),
        ],
    ];
    for (label, call) in [
        ("BTTS", &summary.btts),
        ("Over 2.5", &summary.over25),
        ("Goal fest", &summary.goal_fest),
    ] {
        rows.push(vec![
            label.to_string(),
            call.level.label().to_string(),
            call.reason.clone(),
        ]);
    }
    rows.push(vec![
        "1X2 trend".to_string(),
        summary.trend_1x2.label().to_string(),
        summary.trend_1x2.reason.clone(),
    ]);
    if let Some(risks) = summary.risk_text() {
        rows.push(vec!["Risks".to_string(), risks, String::new()]);
    }
    rows
}

fn write_rows(worksheet: &mut Worksheet, rows: &[Vec<String>]) -> Result<()> {
    for (row_idx, row) in rows.iter().enumerate() {
        for (col_idx, value) in row.iter().enumerate() {
            worksheet
                .write_string(row_idx as u32, col_idx as u16, value)
                .with_context(|| format!("write cell ({row_idx},{col_idx})"))?;
        }
    }
    Ok(())
}
