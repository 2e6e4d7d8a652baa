use std::cmp::Ordering;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One played fixture as handed to the engine by a match source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub date: Option<NaiveDate>,
    pub home_team: String,
    pub away_team: String,
    pub home_goals: Option<i32>,
    pub away_goals: Option<i32>,
}

impl MatchRecord {
    pub fn new(
        date: Option<NaiveDate>,
        home_team: impl Into<String>,
        away_team: impl Into<String>,
        home_goals: i32,
        away_goals: i32,
    ) -> Self {
        Self {
            date,
            home_team: home_team.into(),
            away_team: away_team.into(),
            home_goals: Some(home_goals),
            away_goals: Some(away_goals),
        }
    }

    pub fn involves(&self, team: &str) -> bool {
        self.home_team == team || self.away_team == team
    }

    /// Both scores present and non-negative.
    pub fn is_completed(&self) -> bool {
        matches!(
            (self.home_goals, self.away_goals),
            (Some(h), Some(a)) if h >= 0 && a >= 0
        )
    }

    pub fn score_str(&self) -> Option<String> {
        let (Some(h), Some(a)) = (self.home_goals, self.away_goals) else {
            return None;
        };
        Some(format!("{h}-{a}"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    Win,
    Draw,
    Loss,
}

impl Outcome {
    pub fn from_goals(team_goals: i32, opponent_goals: i32) -> Self {
        if team_goals > opponent_goals {
            Outcome::Win
        } else if team_goals == opponent_goals {
            Outcome::Draw
        } else {
            Outcome::Loss
        }
    }

    pub fn symbol(self) -> char {
        match self {
            Outcome::Win => 'W',
            Outcome::Draw => 'D',
            Outcome::Loss => 'L',
        }
    }

    /// League points: 3 for a win, 1 for a draw.
    pub fn points(self) -> u32 {
        match self {
            Outcome::Win => 3,
            Outcome::Draw => 1,
            Outcome::Loss => 0,
        }
    }
}

/// Newest first; undated records after dated ones. Use with a stable sort so
/// ties keep their source order.
pub fn newest_first(a: &MatchRecord, b: &MatchRecord) -> Ordering {
    match (a.date, b.date) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

pub fn form_string(sequence: &[Outcome]) -> String {
    sequence.iter().map(|o| o.symbol()).collect()
}
