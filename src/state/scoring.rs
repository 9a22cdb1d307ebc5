//! Pure scoring rules: no state beyond the inputs.

use serde::Deserialize;

/// How the scored player relates to the buzz race of the current question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Responder {
    /// The player who won the buzz race.
    BuzzWinner,
    /// Any other player, when the policy accepts their answers.
    NonWinner,
}

/// Tunable share of the point value awarded for each outcome, in percent.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ScoringPolicy {
    /// Share for a correct answer by the buzz winner.
    pub winner_correct_percent: i64,
    /// Share for an incorrect answer by the buzz winner.
    pub winner_incorrect_percent: i64,
    /// Share for a correct answer by anyone else.
    pub non_winner_correct_percent: i64,
    /// Share for an incorrect answer by anyone else.
    pub non_winner_incorrect_percent: i64,
    /// Whether answers from players who did not win the buzz are scored at all.
    pub allow_non_winner_answers: bool,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            winner_correct_percent: 100,
            winner_incorrect_percent: -50,
            non_winner_correct_percent: 50,
            non_winner_incorrect_percent: -50,
            allow_non_winner_answers: true,
        }
    }
}

/// Points at stake for a question on a board with the given multiplier.
pub fn points_value(question_value: i64, multiplier: i64) -> i64 {
    question_value.saturating_mul(multiplier)
}

/// Signed score delta for one adjudicated answer.
pub fn score_delta(policy: &ScoringPolicy, points: i64, responder: Responder, correct: bool) -> i64 {
    let percent = match (responder, correct) {
        (Responder::BuzzWinner, true) => policy.winner_correct_percent,
        (Responder::BuzzWinner, false) => policy.winner_incorrect_percent,
        (Responder::NonWinner, true) => policy.non_winner_correct_percent,
        (Responder::NonWinner, false) => policy.non_winner_incorrect_percent,
    };
    points.saturating_mul(percent) / 100
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_matches_board_rules() {
        let policy = ScoringPolicy::default();
        let points = points_value(200, 1);

        assert_eq!(score_delta(&policy, points, Responder::BuzzWinner, true), 200);
        assert_eq!(score_delta(&policy, points, Responder::BuzzWinner, false), -100);
        assert_eq!(score_delta(&policy, points, Responder::NonWinner, true), 100);
        assert_eq!(score_delta(&policy, points, Responder::NonWinner, false), -100);
    }

    #[test]
    fn multiplier_scales_every_outcome() {
        let policy = ScoringPolicy::default();
        let points = points_value(400, 2);
        assert_eq!(points, 800);
        assert_eq!(score_delta(&policy, points, Responder::BuzzWinner, false), -400);
    }

    #[test]
    fn odd_values_truncate_toward_zero() {
        let policy = ScoringPolicy::default();
        assert_eq!(score_delta(&policy, 25, Responder::BuzzWinner, false), -12);
        assert_eq!(score_delta(&policy, 25, Responder::NonWinner, true), 12);
    }

    #[test]
    fn non_winner_penalty_is_tunable() {
        let policy = ScoringPolicy {
            non_winner_incorrect_percent: -100,
            ..ScoringPolicy::default()
        };
        assert_eq!(score_delta(&policy, 300, Responder::NonWinner, false), -300);
    }
}
