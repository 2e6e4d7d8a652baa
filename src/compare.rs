use serde::Serialize;

use crate::form::TeamStats;
use crate::model::Outcome;

/// Tunable coefficients of the heuristic prediction.
///
/// None of these are fitted; they were picked so the output reads sensibly on
/// typical league data and kept in one place so they can be changed together.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PredictionWeights {
    pub win_rate: f64,
    pub goal_diff: f64,
    pub recent_form: f64,
    /// Per-position decay of the form sequence (index 0 = most recent).
    pub form_decay: f64,
    /// Share of expected goals taken from the team's own scoring average;
    /// the rest comes from the opponent's conceding average.
    pub attack_blend: f64,
    /// Slope of the logistic split between the two win buckets.
    pub steepness: f64,
    /// Draw probability when strengths are equal.
    pub draw_peak: f64,
    /// Strength gap at which the draw share has fallen to `draw_peak / e`.
    pub draw_width: f64,
    /// Sample size at which confidence stops being discounted.
    pub full_sample: usize,
}

impl PredictionWeights {
    pub const DEFAULT: PredictionWeights = PredictionWeights {
        win_rate: 1.0,
        goal_diff: 0.5,
        recent_form: 0.75,
        form_decay: 0.85,
        attack_blend: 0.6,
        steepness: 2.5,
        draw_peak: 0.36,
        draw_width: 1.2,
        full_sample: 10,
    };
}

impl Default for PredictionWeights {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PredictedOutcome {
    Team1Win,
    Draw,
    Team2Win,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OutcomeProbs {
    pub team1_win: f64,
    pub draw: f64,
    pub team2_win: f64,
}

impl OutcomeProbs {
    /// Highest bucket; Draw wins every tie it takes part in, and a tie
    /// between the two win buckets is also called a Draw.
    pub fn most_likely(&self) -> PredictedOutcome {
        if self.draw >= self.team1_win && self.draw >= self.team2_win {
            return PredictedOutcome::Draw;
        }
        if self.team1_win > self.team2_win {
            PredictedOutcome::Team1Win
        } else if self.team2_win > self.team1_win {
            PredictedOutcome::Team2Win
        } else {
            PredictedOutcome::Draw
        }
    }

    pub fn get(&self, outcome: PredictedOutcome) -> f64 {
        match outcome {
            PredictedOutcome::Team1Win => self.team1_win,
            PredictedOutcome::Draw => self.draw,
            PredictedOutcome::Team2Win => self.team2_win,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Comparison<'a> {
    pub team1: &'a TeamStats,
    pub team2: &'a TeamStats,
    pub strength1: f64,
    pub strength2: f64,
    pub probabilities: OutcomeProbs,
    pub predicted_outcome: PredictedOutcome,
    /// 0-95; small samples and near-even probabilities pull it down.
    pub confidence: u8,
    pub expected_goals1: f64,
    pub expected_goals2: f64,
}

impl Comparison<'_> {
    pub fn predicted_team(&self) -> Option<&str> {
        match self.predicted_outcome {
            PredictedOutcome::Team1Win => Some(&self.team1.team),
            PredictedOutcome::Team2Win => Some(&self.team2.team),
            PredictedOutcome::Draw => None,
        }
    }
}

/// A way of turning two teams' stats into a comparison.
pub trait ScoringStrategy {
    fn compare<'a>(&self, team1: &'a TeamStats, team2: &'a TeamStats) -> Comparison<'a>;
}

/// Strength = weighted win rate, goal difference and decayed recent form;
/// the strength gap is squashed into three outcome buckets.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicScorer {
    pub weights: PredictionWeights,
}

impl HeuristicScorer {
    pub fn new(weights: PredictionWeights) -> Self {
        Self { weights }
    }

    pub fn strength(&self, stats: &TeamStats) -> f64 {
        if stats.matches_considered == 0 {
            return 0.0;
        }
        let w = &self.weights;
        w.win_rate * stats.win_rate()
            + w.goal_diff * stats.goal_diff_avg()
            + w.recent_form * decayed_form(&stats.form_sequence, w.form_decay)
    }

    pub fn expected_goals(&self, attack: &TeamStats, defence: &TeamStats) -> f64 {
        let blend = self.weights.attack_blend.clamp(0.0, 1.0);
        (blend * attack.goals_for_avg + (1.0 - blend) * defence.goals_against_avg).max(0.0)
    }

    pub fn probabilities(&self, strength_gap: f64) -> OutcomeProbs {
        let w = &self.weights;
        let width = w.draw_width.max(f64::EPSILON);
        let draw = w.draw_peak.clamp(0.0, 1.0) * (-(strength_gap / width).powi(2)).exp();
        let rest = 1.0 - draw;
        OutcomeProbs {
            team1_win: rest * logistic(w.steepness * strength_gap),
            draw,
            team2_win: rest * logistic(-w.steepness * strength_gap),
        }
    }

    fn confidence(&self, n1: usize, n2: usize, probs: &OutcomeProbs) -> u8 {
        let full = self.weights.full_sample.max(1) as f64;
        let sample = (n1.min(n2) as f64 / full).min(1.0);
        let mut sorted = [probs.team1_win, probs.draw, probs.team2_win];
        sorted.sort_by(|a, b| b.total_cmp(a));
        let margin = sorted[0] - sorted[1];
        let score = 100.0 * sample * (0.45 + margin);
        score.clamp(0.0, 95.0).round() as u8
    }
}

impl ScoringStrategy for HeuristicScorer {
    fn compare<'a>(&self, team1: &'a TeamStats, team2: &'a TeamStats) -> Comparison<'a> {
        let strength1 = self.strength(team1);
        let strength2 = self.strength(team2);
        let probabilities = self.probabilities(strength1 - strength2);
        let confidence = self.confidence(
            team1.matches_considered,
            team2.matches_considered,
            &probabilities,
        );

        Comparison {
            team1,
            team2,
            strength1,
            strength2,
            predicted_outcome: probabilities.most_likely(),
            probabilities,
            confidence,
            expected_goals1: self.expected_goals(team1, team2),
            expected_goals2: self.expected_goals(team2, team1),
        }
    }
}

pub fn compare<'a>(team1: &'a TeamStats, team2: &'a TeamStats) -> Comparison<'a> {
    HeuristicScorer::default().compare(team1, team2)
}

pub fn compare_with<'a, S: ScoringStrategy + ?Sized>(
    strategy: &S,
    team1: &'a TeamStats,
    team2: &'a TeamStats,
) -> Comparison<'a> {
    strategy.compare(team1, team2)
}

/// Weighted mean of the form sequence with W=+1, D=0, L=-1, most recent
/// entry weighted highest.
pub fn decayed_form(sequence: &[Outcome], decay: f64) -> f64 {
    let mut weighted = 0.0;
    let mut weight_sum = 0.0;
    for (k, outcome) in sequence.iter().enumerate() {
        let w = decay.powi(k as i32);
        let v = match outcome {
            Outcome::Win => 1.0,
            Outcome::Draw => 0.0,
            Outcome::Loss => -1.0,
        };
        weighted += w * v;
        weight_sum += w;
    }
    if weight_sum <= 0.0 {
        0.0
    } else {
        weighted / weight_sum
    }
}

fn logistic(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

#[cfg(test)]
mod tests {
    use super::{HeuristicScorer, PredictedOutcome, compare, decayed_form};
    use crate::form::TeamStats;
    use crate::model::Outcome;

    fn stats(name: &str, seq: &[Outcome], gf: f64, ga: f64) -> TeamStats {
        let wins = seq.iter().filter(|o| **o == Outcome::Win).count();
        let draws = seq.iter().filter(|o| **o == Outcome::Draw).count();
        TeamStats {
            team: name.to_string(),
            matches_considered: seq.len(),
            wins,
            draws,
            losses: seq.len() - wins - draws,
            form_sequence: seq.to_vec(),
            goals_for_avg: gf,
            goals_against_avg: ga,
            ..TeamStats::default()
        }
    }

    #[test]
    fn recent_results_weigh_more() {
        let improving = [Outcome::Win, Outcome::Loss];
        let declining = [Outcome::Loss, Outcome::Win];
        assert!(decayed_form(&improving, 0.85) > 0.0);
        assert!(decayed_form(&declining, 0.85) < 0.0);
        assert_eq!(decayed_form(&[], 0.85), 0.0);
    }

    #[test]
    fn probabilities_sum_to_one() {
        let scorer = HeuristicScorer::default();
        for gap in [-3.0, -0.4, 0.0, 0.25, 1.7, 6.0] {
            let p = scorer.probabilities(gap);
            assert!((p.team1_win + p.draw + p.team2_win - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn draw_peaks_at_even_strength() {
        let scorer = HeuristicScorer::default();
        let even = scorer.probabilities(0.0).draw;
        let near = scorer.probabilities(0.3).draw;
        let far = scorer.probabilities(1.5).draw;
        assert!(even > near && near > far);
        assert_eq!(scorer.probabilities(-0.3).draw, near);
    }

    #[test]
    fn stronger_team_is_favoured() {
        let strong = stats("A", &[Outcome::Win; 5], 2.4, 0.6);
        let weak = stats("B", &[Outcome::Loss; 5], 0.4, 2.2);
        let c = compare(&strong, &weak);
        assert_eq!(c.predicted_outcome, PredictedOutcome::Team1Win);
        assert_eq!(c.predicted_team(), Some("A"));
        assert!(c.expected_goals1 > c.expected_goals2);
        assert!(c.confidence > 0);
    }

    #[test]
    fn empty_teams_are_a_low_confidence_draw() {
        let a = TeamStats::default();
        let b = TeamStats::default();
        let c = compare(&a, &b);
        assert_eq!(c.predicted_outcome, PredictedOutcome::Draw);
        assert_eq!(c.expected_goals1, 0.0);
        assert_eq!(c.expected_goals2, 0.0);
        assert_eq!(c.confidence, 0);
    }
}
