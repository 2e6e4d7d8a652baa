use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use crossterm::style::{Color, Stylize, style};

use crate::batch::TeamRow;
use crate::compare::{Comparison, PredictedOutcome};
use crate::form::{SplitRecord, TeamStats};
use crate::insight::{form_verdict, match_comment, prediction_summary};
use crate::model::{MatchRecord, Outcome};

/// Terminal colouring switch. Plain output when disabled.
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    color: bool,
}

impl Palette {
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    pub fn plain() -> Self {
        Self { color: false }
    }

    /// Colour unless `--no-color` was passed or `NO_COLOR` is set.
    pub fn from_env(no_color_flag: bool) -> Self {
        let no_color_env = std::env::var_os("NO_COLOR").is_some_and(|v| !v.is_empty());
        Self::new(!no_color_flag && !no_color_env)
    }

    fn paint(&self, text: &str, color: Color) -> String {
        if self.color {
            style(text).with(color).to_string()
        } else {
            text.to_string()
        }
    }

    fn heading(&self, text: &str) -> String {
        if self.color {
            style(text).bold().to_string()
        } else {
            text.to_string()
        }
    }

    fn outcome(&self, outcome: Outcome) -> String {
        let symbol = outcome.symbol().to_string();
        let color = match outcome {
            Outcome::Win => Color::Green,
            Outcome::Draw => Color::Yellow,
            Outcome::Loss => Color::Red,
        };
        self.paint(&symbol, color)
    }

    fn form(&self, sequence: &[Outcome]) -> String {
        if sequence.is_empty() {
            return "-".to_string();
        }
        sequence.iter().map(|o| self.outcome(*o)).collect()
    }
}

struct Line {
    label: &'static str,
    played: usize,
    wins: usize,
    draws: usize,
    losses: usize,
    points: u32,
    gf_avg: f64,
    ga_avg: f64,
    over25: f64,
    btts: f64,
}

impl Line {
    fn total(stats: &TeamStats) -> Self {
        Line {
            label: "Total",
            played: stats.matches_considered,
            wins: stats.wins,
            draws: stats.draws,
            losses: stats.losses,
            points: stats.form_points,
            gf_avg: stats.goals_for_avg,
            ga_avg: stats.goals_against_avg,
            over25: stats.over25_rate,
            btts: stats.btts_rate,
        }
    }

    fn split(label: &'static str, split: &SplitRecord) -> Self {
        Line {
            label,
            played: split.played,
            wins: split.wins,
            draws: split.draws,
            losses: split.losses,
            points: split.points(),
            gf_avg: split.goals_for_avg,
            ga_avg: split.goals_against_avg,
            over25: split.over25_rate,
            btts: split.btts_rate,
        }
    }

    fn lines(stats: &TeamStats) -> [Line; 3] {
        [
            Line::total(stats),
            Line::split("Home", &stats.home_record),
            Line::split("Away", &stats.away_record),
        ]
    }
}

fn pct(rate: f64) -> String {
    format!("{:.0}%", rate * 100.0)
}

fn match_line(m: &MatchRecord) -> String {
    let date = m
        .date
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "----------".to_string());
    let score = m.score_str().unwrap_or_else(|| "-".to_string());
    format!("{date}  {} {score} {}", m.home_team, m.away_team)
}

pub fn render_team(stats: &TeamStats, palette: Palette) -> String {
    let mut out = String::new();
    out.push_str(&palette.heading(&format!(
        "{} (last {} matches)",
        stats.team, stats.matches_considered
    )));
    out.push('\n');
    out.push_str(&format!(
        "{:<6} {:>3} {:>3} {:>3} {:>3} {:>4} {:>7} {:>7} {:>9} {:>5}\n",
        "", "P", "W", "D", "L", "Pts", "GF avg", "GA avg", "Over 2.5", "BTTS"
    ));
    for line in Line::lines(stats) {
        out.push_str(&format!(
            "{:<6} {:>3} {:>3} {:>3} {:>3} {:>4} {:>7.2} {:>7.2} {:>9} {:>5}\n",
            line.label,
            line.played,
            line.wins,
            line.draws,
            line.losses,
            line.points,
            line.gf_avg,
            line.ga_avg,
            pct(line.over25),
            pct(line.btts),
        ));
    }
    out.push_str(&format!(
        "Form (newest first): {}\n",
        palette.form(&stats.form_sequence)
    ));
    if !stats.considered.is_empty() {
        out.push_str("Recent matches:\n");
        for m in &stats.considered {
            out.push_str(&format!("  {}\n", match_line(m)));
        }
    }
    out
}

pub fn render_comparison(cmp: &Comparison<'_>, palette: Palette) -> String {
    let mut out = String::new();
    out.push_str(&render_team(cmp.team1, palette));
    out.push('\n');
    out.push_str(&render_team(cmp.team2, palette));
    out.push('\n');

    out.push_str(&palette.heading("Comparison"));
    out.push('\n');
    out.push_str(&format!("{}\n", form_verdict(cmp.team1, cmp.team2)));
    out.push_str(&format!(
        "Strength: {} {:.2} / {} {:.2}\n",
        cmp.team1.team, cmp.strength1, cmp.team2.team, cmp.strength2
    ));
    let p = &cmp.probabilities;
    out.push_str(&format!(
        "1X2: {} {} / Draw {} / {} {}\n",
        cmp.team1.team,
        pct(p.team1_win),
        pct(p.draw),
        cmp.team2.team,
        pct(p.team2_win)
    ));
    out.push_str(&format!(
        "Expected goals: {:.2} - {:.2}\n",
        cmp.expected_goals1, cmp.expected_goals2
    ));
    let pick = match cmp.predicted_outcome {
        PredictedOutcome::Draw => "Draw".to_string(),
        _ => format!("{} win", cmp.predicted_team().unwrap_or_default()),
    };
    out.push_str(&format!(
        "Most likely: {} (confidence {}/100)\n",
        palette.paint(&pick, Color::Cyan),
        cmp.confidence
    ));
    out.push_str(&format!(
        "Comment: {}\n",
        match_comment(cmp.team1, cmp.team2)
    ));

    let summary = prediction_summary(cmp.team1, cmp.team2);
    out.push('\n');
    out.push_str(&palette.heading("Prediction summary"));
    out.push('\n');
    for (label, call) in [
        ("BTTS", &summary.btts),
        ("Over 2.5", &summary.over25),
        ("Goal fest", &summary.goal_fest),
    ] {
        out.push_str(&format!(
            "  {:<10} {:<7} {}\n",
            label,
            call.level.label(),
            call.reason
        ));
    }
    out.push_str(&format!(
        "  {:<10} {:<7} {}\n",
        "1X2 trend",
        summary.trend_1x2.label(),
        summary.trend_1x2.reason
    ));
    if let Some(risks) = summary.risk_text() {
        out.push_str(&format!(
            "  {:<10} {}\n",
            "Risks",
            palette.paint(&risks, Color::Red)
        ));
    }
    out
}

pub fn render_table(rows: &[TeamRow], window: usize, palette: Palette) -> String {
    let mut out = String::new();
    out.push_str(&palette.heading(&format!("Form table (last {window} matches)")));
    out.push('\n');
    let width = rows
        .iter()
        .map(|r| r.team.chars().count())
        .max()
        .unwrap_or(4)
        .max(4);
    out.push_str(&format!(
        "{:>3} {:<width$} {:>3} {:>4} {:>4} {:>7} {:>7}  {}\n",
        "#", "Team", "P", "Pts", "GD", "GF avg", "GA avg", "Form"
    ));
    for (idx, row) in rows.iter().enumerate() {
        match &row.stats {
            Ok(s) => out.push_str(&format!(
                "{:>3} {:<width$} {:>3} {:>4} {:>+4} {:>7.2} {:>7.2}  {}\n",
                idx + 1,
                row.team,
                s.matches_considered,
                s.form_points,
                row.goal_difference(),
                s.goals_for_avg,
                s.goals_against_avg,
                palette.form(&s.form_sequence),
            )),
            Err(err) => out.push_str(&format!(
                "{:>3} {:<width$} {}\n",
                "-",
                row.team,
                palette.paint(&format!("error: {err}"), Color::Red),
            )),
        }
    }
    out
}

pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

const HTML_STYLE: &str = "body{font-family:sans-serif;margin:2em;color:#222}\
table{border-collapse:collapse;margin:1em 0}\
th,td{border:1px solid #ccc;padding:4px 8px;text-align:right}\
th:first-child,td:first-child{text-align:left}\
.W{color:#1a7f37}.D{color:#9a6700}.L{color:#cf222e}";

fn html_document(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{}</title>\n<style>{HTML_STYLE}</style>\n</head>\n<body>\n{body}</body>\n</html>\n",
        escape_html(title)
    )
}

fn html_form(sequence: &[Outcome]) -> String {
    sequence
        .iter()
        .map(|o| format!("<span class=\"{0}\">{0}</span>", o.symbol()))
        .collect()
}

fn html_team_section(stats: &TeamStats) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "<h2>{} <small>(last {} matches)</small></h2>\n",
        escape_html(&stats.team),
        stats.matches_considered
    ));
    out.push_str(
        "<table>\n<tr><th></th><th>P</th><th>W</th><th>D</th><th>L</th><th>Pts</th>\
         <th>GF avg</th><th>GA avg</th><th>Over 2.5</th><th>BTTS</th></tr>\n",
    );
    for line in Line::lines(stats) {
        out.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td>\
             <td>{:.2}</td><td>{:.2}</td><td>{}</td><td>{}</td></tr>\n",
            line.label,
            line.played,
            line.wins,
            line.draws,
            line.losses,
            line.points,
            line.gf_avg,
            line.ga_avg,
            pct(line.over25),
            pct(line.btts),
        ));
    }
    out.push_str("</table>\n");
    out.push_str(&format!(
        "<p>Form (newest first): {}</p>\n",
        html_form(&stats.form_sequence)
    ));
    if !stats.considered.is_empty() {
        out.push_str("<ul>\n");
        for m in &stats.considered {
            out.push_str(&format!("<li>{}</li>\n", escape_html(&match_line(m))));
        }
        out.push_str("</ul>\n");
    }
    out
}

pub fn html_team(stats: &TeamStats) -> String {
    let body = html_team_section(stats);
    html_document(&format!("{} form report", stats.team), &body)
}

pub fn html_comparison(cmp: &Comparison<'_>) -> String {
    let mut body = String::new();
    body.push_str(&format!(
        "<h1>{} vs {}</h1>\n",
        escape_html(&cmp.team1.team),
        escape_html(&cmp.team2.team)
    ));
    body.push_str(&html_team_section(cmp.team1));
    body.push_str(&html_team_section(cmp.team2));

    let p = &cmp.probabilities;
    body.push_str("<h2>Comparison</h2>\n");
    body.push_str(&format!(
        "<p>{}</p>\n",
        escape_html(&form_verdict(cmp.team1, cmp.team2).to_string())
    ));
    body.push_str(
        "<table>\n<tr><th></th><th>Strength</th><th>Win</th><th>Expected goals</th></tr>\n",
    );
    body.push_str(&format!(
        "<tr><td>{}</td><td>{:.2}</td><td>{}</td><td>{:.2}</td></tr>\n",
        escape_html(&cmp.team1.team),
        cmp.strength1,
        pct(p.team1_win),
        cmp.expected_goals1
    ));
    body.push_str(&format!(
        "<tr><td>{}</td><td>{:.2}</td><td>{}</td><td>{:.2}</td></tr>\n",
        escape_html(&cmp.team2.team),
        cmp.strength2,
        pct(p.team2_win),
        cmp.expected_goals2
    ));
    body.push_str("</table>\n");
    let pick = match cmp.predicted_team() {
        Some(team) => format!("{team} win"),
        None => "Draw".to_string(),
    };
    body.push_str(&format!(
        "<p>Draw: {}. Most likely: <strong>{}</strong> (confidence {}/100)</p>\n",
        pct(p.draw),
        escape_html(&pick),
        cmp.confidence
    ));
    body.push_str(&format!(
        "<p>{}</p>\n",
        escape_html(&match_comment(cmp.team1, cmp.team2).to_string())
    ));

    let summary = prediction_summary(cmp.team1, cmp.team2);
    body.push_str("<h2>Prediction summary</h2>\n<table>\n");
    for (label, level, reason) in [
        ("BTTS", summary.btts.level.label(), &summary.btts.reason),
        ("Over 2.5", summary.over25.level.label(), &summary.over25.reason),
        ("Goal fest", summary.goal_fest.level.label(), &summary.goal_fest.reason),
        ("1X2 trend", summary.trend_1x2.label(), &summary.trend_1x2.reason),
    ] {
        body.push_str(&format!(
            "<tr><td>{label}</td><td>{}</td><td>{}</td></tr>\n",
            escape_html(level),
            escape_html(reason)
        ));
    }
    body.push_str("</table>\n");
    if let Some(risks) = summary.risk_text() {
        body.push_str(&format!("<p>Risks: {}</p>\n", escape_html(&risks)));
    }

    html_document(
        &format!("{} vs {}", cmp.team1.team, cmp.team2.team),
        &body,
    )
}

/// Writes via a sibling temp file and a rename so readers never see a
/// half-written report.
pub fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("create report dir {}", parent.display()))?;
    }
    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp = path.with_file_name(tmp_name);
    fs::write(&tmp, contents).with_context(|| format!("write {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("swap report {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{Palette, escape_html, html_team, render_team, write_atomic};
    use crate::form::compute_stats;
    use crate::model::MatchRecord;

    #[test]
    fn escapes_markup() {
        assert_eq!(
            escape_html(r#"<b>"Tom" & 'Jerry'</b>"#),
            "&lt;b&gt;&quot;Tom&quot; &amp; &#39;Jerry&#39;&lt;/b&gt;"
        );
    }

    #[test]
    fn plain_palette_has_no_escape_codes() {
        let matches = vec![
            MatchRecord::new(NaiveDate::from_ymd_opt(2024, 5, 2), "A", "B", 2, 1),
            MatchRecord::new(NaiveDate::from_ymd_opt(2024, 5, 1), "C", "A", 1, 1),
        ];
        let stats = compute_stats("A", &matches, 10).expect("stats");
        let text = render_team(&stats, Palette::plain());
        assert!(!text.contains('\u{1b}'));
        assert!(text.contains("Form (newest first): WD"));
        assert!(text.contains("2024-05-02  A 2-1 B"));

        let colored = render_team(&stats, Palette::new(true));
        assert!(colored.contains('\u{1b}'));
    }

    #[test]
    fn html_team_escapes_names() {
        let matches = vec![MatchRecord::new(None, "<A>", "B", 0, 0)];
        let stats = compute_stats("<A>", &matches, 10).expect("stats");
        let html = html_team(&stats);
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("&lt;A&gt;"));
        assert!(!html.contains("<A>"));
    }

    #[test]
    fn atomic_write_replaces_file() {
        let dir = std::env::temp_dir().join(format!("matchform-report-{}", std::process::id()));
        let path = dir.join("report.html");
        write_atomic(&path, "one").expect("first write");
        write_atomic(&path, "two").expect("second write");
        assert_eq!(std::fs::read_to_string(&path).expect("read"), "two");
        assert!(!dir.join("report.html.tmp").exists());
        let _ = std::fs::remove_dir_all(&dir);
    }
}
