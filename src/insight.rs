//! Rule-of-thumb commentary over two teams' window stats.
//!
//! These are the plain threshold rules a pundit would apply to a form table;
//! they sit next to the probabilistic comparison and never feed into it.

use std::fmt;

use serde::Serialize;

use crate::form::TeamStats;

const HIGH_SCORING_AVG: f64 = 1.5;
const BTTS_HIGH: f64 = 0.60;
const BTTS_MEDIUM: f64 = 0.45;
const OVER_TENDENCY: f64 = 0.50;
const OVER_HIGH: f64 = 0.55;
const OVER_MEDIUM: f64 = 0.40;
const GOALS_HIGH: f64 = 2.8;
const GOALS_MEDIUM: f64 = 2.2;
const FORM_GAP_POINTS: i64 = 6;
const FRAGILE_DEFENCE_AVG: f64 = 1.3;
const SMALL_SAMPLE: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MatchTag {
    HighScoring,
    BothTeamsCanScore,
    InFormSideHasEdge,
    OversTendency,
}

impl MatchTag {
    pub fn label(self) -> &'static str {
        match self {
            MatchTag::HighScoring => "High-scoring tendency",
            MatchTag::BothTeamsCanScore => "Both teams can score",
            MatchTag::InFormSideHasEdge => "In-form side has the edge",
            MatchTag::OversTendency => "Overs tendency",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum MatchComment {
    NotEnoughData,
    NoClearTrend,
    Tags(Vec<MatchTag>),
}

impl fmt::Display for MatchComment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchComment::NotEnoughData => f.write_str("Not enough data."),
            MatchComment::NoClearTrend => f.write_str("No clear trend."),
            MatchComment::Tags(tags) => {
                let labels = tags.iter().map(|t| t.label()).collect::<Vec<_>>();
                write!(f, "{}.", labels.join(". "))
            }
        }
    }
}

pub fn match_comment(team1: &TeamStats, team2: &TeamStats) -> MatchComment {
    if team1.matches_considered == 0 || team2.matches_considered == 0 {
        return MatchComment::NotEnoughData;
    }

    let mut tags = Vec::new();
    if team1.goals_for_avg >= HIGH_SCORING_AVG && team2.goals_for_avg >= HIGH_SCORING_AVG {
        tags.push(MatchTag::HighScoring);
    }
    if team1.btts_rate >= BTTS_HIGH && team2.btts_rate >= BTTS_HIGH {
        tags.push(MatchTag::BothTeamsCanScore);
    }
    if form_point_gap(team1, team2).abs() >= FORM_GAP_POINTS {
        tags.push(MatchTag::InFormSideHasEdge);
    }
    if team1.over25_rate >= OVER_TENDENCY && team2.over25_rate >= OVER_TENDENCY {
        tags.push(MatchTag::OversTendency);
    }

    if tags.is_empty() {
        MatchComment::NoClearTrend
    } else {
        MatchComment::Tags(tags)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum FormVerdict {
    NotEnoughData,
    Better { team: String, matches: usize },
    Similar,
}

impl fmt::Display for FormVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormVerdict::NotEnoughData => f.write_str("Not enough data."),
            FormVerdict::Better { team, matches } => {
                write!(f, "On the last {matches} matches {team} looks in better form.")
            }
            FormVerdict::Similar => {
                f.write_str("Both teams are in similar form; expect a balanced game.")
            }
        }
    }
}

/// Head-to-head on four metrics: form points, scoring average, Over 2.5 and
/// BTTS rate. Whoever takes more of them looks in better form.
pub fn form_verdict(team1: &TeamStats, team2: &TeamStats) -> FormVerdict {
    if team1.matches_considered == 0 || team2.matches_considered == 0 {
        return FormVerdict::NotEnoughData;
    }

    let duels = [
        (team1.form_points as f64, team2.form_points as f64),
        (team1.goals_for_avg, team2.goals_for_avg),
        (team1.over25_rate, team2.over25_rate),
        (team1.btts_rate, team2.btts_rate),
    ];
    let mut score1 = 0;
    let mut score2 = 0;
    for (a, b) in duels {
        if a > b {
            score1 += 1;
        } else if b > a {
            score2 += 1;
        }
    }

    if score1 > score2 {
        FormVerdict::Better {
            team: team1.team.clone(),
            matches: team1.matches_considered,
        }
    } else if score2 > score1 {
        FormVerdict::Better {
            team: team2.team.clone(),
            matches: team2.matches_considered,
        }
    } else {
        FormVerdict::Similar
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Level {
    High,
    Medium,
    Low,
    Unknown,
}

impl Level {
    pub fn label(self) -> &'static str {
        match self {
            Level::High => "High",
            Level::Medium => "Medium",
            Level::Low => "Low",
            Level::Unknown => "-",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LevelCall {
    pub level: Level,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Trend {
    Favours(String),
    Balanced,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendCall {
    pub trend: Trend,
    pub reason: String,
}

impl TrendCall {
    pub fn label(&self) -> &str {
        match &self.trend {
            Trend::Favours(team) => team,
            Trend::Balanced => "Balanced",
            Trend::Unknown => "-",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RiskNote {
    FragileDefences,
    SmallSample,
}

impl RiskNote {
    pub fn label(self) -> &'static str {
        match self {
            RiskNote::FragileDefences => "Fragile defences",
            RiskNote::SmallSample => "Small sample, limited data",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionSummary {
    pub btts: LevelCall,
    pub over25: LevelCall,
    pub goal_fest: LevelCall,
    pub trend_1x2: TrendCall,
    pub risks: Vec<RiskNote>,
}

impl PredictionSummary {
    pub fn risk_text(&self) -> Option<String> {
        if self.risks.is_empty() {
            return None;
        }
        Some(
            self.risks
                .iter()
                .map(|r| r.label())
                .collect::<Vec<_>>()
                .join(". "),
        )
    }
}

pub fn prediction_summary(team1: &TeamStats, team2: &TeamStats) -> PredictionSummary {
    if team1.matches_considered == 0 || team2.matches_considered == 0 {
        let unknown = || LevelCall {
            level: Level::Unknown,
            reason: "Not enough data".to_string(),
        };
        return PredictionSummary {
            btts: unknown(),
            over25: unknown(),
            goal_fest: unknown(),
            trend_1x2: TrendCall {
                trend: Trend::Unknown,
                reason: "Not enough data".to_string(),
            },
            risks: vec![RiskNote::SmallSample],
        };
    }

    let btts1 = pct(team1.btts_rate);
    let btts2 = pct(team2.btts_rate);
    let btts_mean = (btts1 + btts2) / 2.0;
    let btts = if team1.btts_rate >= BTTS_HIGH && team2.btts_rate >= BTTS_HIGH {
        LevelCall {
            level: Level::High,
            reason: format!("Both sides have a high BTTS rate ({btts1:.0}%, {btts2:.0}%)"),
        }
    } else if (team1.btts_rate + team2.btts_rate) / 2.0 >= BTTS_MEDIUM {
        LevelCall {
            level: Level::Medium,
            reason: format!("Average BTTS {btts_mean:.0}%"),
        }
    } else {
        LevelCall {
            level: Level::Low,
            reason: format!("Low BTTS tendency ({btts1:.0}%, {btts2:.0}%)"),
        }
    };

    let over_mean = (team1.over25_rate + team2.over25_rate) / 2.0;
    let over25 = if over_mean >= OVER_HIGH {
        LevelCall {
            level: Level::High,
            reason: format!("Average Over 2.5 rate {:.0}%", pct(over_mean)),
        }
    } else if over_mean >= OVER_MEDIUM {
        LevelCall {
            level: Level::Medium,
            reason: format!("Average Over 2.5 {:.0}%", pct(over_mean)),
        }
    } else {
        LevelCall {
            level: Level::Low,
            reason: format!("Low scoring tendency ({:.0}%)", pct(over_mean)),
        }
    };

    let goals_sum = team1.goals_for_avg + team2.goals_for_avg;
    let goal_fest = if goals_sum >= GOALS_HIGH {
        LevelCall {
            level: Level::High,
            reason: format!("Around {goals_sum:.1} goals expected per match"),
        }
    } else if goals_sum >= GOALS_MEDIUM {
        LevelCall {
            level: Level::Medium,
            reason: format!("Combined scoring average {goals_sum:.1}"),
        }
    } else {
        LevelCall {
            level: Level::Low,
            reason: format!("Low goal tendency ({goals_sum:.1})"),
        }
    };

    let gap = form_point_gap(team1, team2);
    let trend_1x2 = if gap >= FORM_GAP_POINTS {
        TrendCall {
            trend: Trend::Favours(team1.team.clone()),
            reason: format!("{} ahead by {gap} points", team1.team),
        }
    } else if gap <= -FORM_GAP_POINTS {
        TrendCall {
            trend: Trend::Favours(team2.team.clone()),
            reason: format!("{} ahead by {} points", team2.team, -gap),
        }
    } else {
        TrendCall {
            trend: Trend::Balanced,
            reason: "Form points are close".to_string(),
        }
    };

    let mut risks = Vec::new();
    if team1.goals_against_avg >= FRAGILE_DEFENCE_AVG
        && team2.goals_against_avg >= FRAGILE_DEFENCE_AVG
    {
        risks.push(RiskNote::FragileDefences);
    }
    if team1.matches_considered < SMALL_SAMPLE || team2.matches_considered < SMALL_SAMPLE {
        risks.push(RiskNote::SmallSample);
    }

    PredictionSummary {
        btts,
        over25,
        goal_fest,
        trend_1x2,
        risks,
    }
}

fn form_point_gap(team1: &TeamStats, team2: &TeamStats) -> i64 {
    team1.form_points as i64 - team2.form_points as i64
}

fn pct(rate: f64) -> f64 {
    rate * 100.0
}
