//! Score computation from distance, time and configurable weights.

use crate::config::{DEFAULT_DISTANCE_UNIT, DEFAULT_DISTANCE_WEIGHT, DEFAULT_TIME_WEIGHT};

/// Scoring weights, fixed for the lifetime of a simulator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Weights {
    /// Points awarded per `distance_unit` meters.
    pub distance_weight: f64,
    /// Points awarded per second.
    pub time_weight: f64,
    pub distance_unit: f64,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            distance_weight: DEFAULT_DISTANCE_WEIGHT,
            time_weight: DEFAULT_TIME_WEIGHT,
            distance_unit: DEFAULT_DISTANCE_UNIT,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScoreBreakdown {
    pub distance_score: u64,
    pub time_score: u64,
    pub total: u64,
}

/// Compute the score for a distance in meters and an elapsed time in milliseconds.
///
/// Each sub-score is floored on its own before they are summed, so
/// `total` can be lower than `floor(distance part + time part)`.
pub fn compute_score(distance_meters: f64, elapsed_ms: f64, weights: &Weights) -> ScoreBreakdown {
    let distance_score =
        floor_points(distance_meters / weights.distance_unit * weights.distance_weight);
    let time_score = floor_points(elapsed_ms / 1000.0 * weights.time_weight);
    ScoreBreakdown {
        distance_score,
        time_score,
        total: distance_score + time_score,
    }
}

// `as` saturates: NaN and negatives become 0
fn floor_points(raw: f64) -> u64 {
    raw.floor() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_weights_score_reference_run() {
        let score = compute_score(1000.0, 60_000.0, &Weights::default());
        assert_eq!(score.distance_score, 50);
        assert_eq!(score.time_score, 120);
        assert_eq!(score.total, 170);
    }

    #[test]
    fn sub_scores_are_floored_independently() {
        let weights = Weights {
            distance_weight: 1.0,
            time_weight: 1.0,
            distance_unit: 100.0,
        };
        // 0.6 + 0.6 would floor to 1 if summed first
        let score = compute_score(60.0, 600.0, &weights);
        assert_eq!(score.distance_score, 0);
        assert_eq!(score.time_score, 0);
        assert_eq!(score.total, 0);
    }

    #[test]
    fn total_matches_formula_over_a_grid() {
        let weights = Weights {
            distance_weight: 3.5,
            time_weight: 0.75,
            distance_unit: 50.0,
        };
        for distance in [0.0, 1.0, 49.9, 50.0, 123.4, 9_999.9] {
            for elapsed in [0.0, 999.0, 1_000.0, 12_345.0, 600_000.0] {
                let expected = (distance / 50.0 * 3.5_f64).floor() as u64
                    + (elapsed / 1000.0 * 0.75_f64).floor() as u64;
                assert_eq!(compute_score(distance, elapsed, &weights).total, expected);
            }
        }
    }

    #[test]
    fn zero_progress_scores_zero() {
        assert_eq!(
            compute_score(0.0, 0.0, &Weights::default()),
            ScoreBreakdown::default()
        );
    }
}
