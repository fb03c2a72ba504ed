// scoring.rs — Key-result scores, objective aggregates, and score bands.
//
// Every score is on a 0–10 scale. The formulas here are the single source of
// truth; `current_score` fields in the store are caches of these results.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::key_result::{KeyResult, MetricDirection};
use crate::objective::Objective;

pub const MAX_SCORE: f64 = 10.0;

/// Lowest score that counts as on track.
pub const ON_TRACK_FLOOR: f64 = 7.0;

/// Lowest score that counts as at risk.
pub const AT_RISK_FLOOR: f64 = 4.0;

/// Score a key result from its start, target, and current values.
///
/// `(current - start) / (target - start) * 10`, clamped to [0, 10]. When
/// the target is below the start the progress is measured downward, so a
/// falling value raises the score. A flat key result (`target == start`)
/// scores 10 once `current >= target` and 0 otherwise. Non-finite inputs
/// score 0.
pub fn score_key_result(key_result: &KeyResult) -> f64 {
    let (start, target, current) = (
        key_result.start_value,
        key_result.target_value,
        key_result.current_value,
    );
    if !(start.is_finite() && target.is_finite() && current.is_finite()) {
        return 0.0;
    }
    if target == start {
        return if current >= target { MAX_SCORE } else { 0.0 };
    }

    let progress = match key_result.direction() {
        MetricDirection::Increasing => (current - start) / (target - start),
        MetricDirection::Decreasing => (start - current) / (start - target),
    };
    let score = progress * MAX_SCORE;
    if score.is_nan() {
        return 0.0;
    }
    score.clamp(0.0, MAX_SCORE)
}

/// Weighted mean of the scores of the key results belonging to `objective`.
///
/// Key results for other objectives are ignored. Returns `None` when no key
/// results remain: an objective without key results has no score, which is
/// not the same as a score of zero. Non-finite or negative weights count as
/// zero; if every weight is zero the plain mean is used.
pub fn score_objective(objective: &Objective, key_results: &[KeyResult]) -> Option<f64> {
    let owned: Vec<&KeyResult> = key_results
        .iter()
        .filter(|kr| kr.objective_id == objective.id)
        .collect();
    if owned.is_empty() {
        return None;
    }

    let weight = |kr: &KeyResult| {
        if kr.weight.is_finite() && kr.weight > 0.0 {
            kr.weight
        } else {
            0.0
        }
    };
    let total_weight: f64 = owned.iter().map(|&kr| weight(kr)).sum();

    let mean = if total_weight > 0.0 && total_weight.is_finite() {
        owned
            .iter()
            .map(|&kr| kr.score() * (weight(kr) / total_weight))
            .sum::<f64>()
    } else {
        owned.iter().map(|kr| kr.score()).sum::<f64>() / owned.len() as f64
    };

    tracing::debug!(
        objective_id = %objective.id,
        key_results = owned.len(),
        score = mean,
        "scored objective"
    );
    Some(mean.clamp(0.0, MAX_SCORE))
}

/// Health band derived from a 0–10 score.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ScoreBand {
    OnTrack,
    AtRisk,
    OffTrack,
}

impl fmt::Display for ScoreBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoreBand::OnTrack => write!(f, "on_track"),
            ScoreBand::AtRisk => write!(f, "at_risk"),
            ScoreBand::OffTrack => write!(f, "off_track"),
        }
    }
}

/// Classify a score. Lower bounds are inclusive: 7.0 is on track, 4.0 at risk.
///
/// Dashboards and detail views must both go through this function.
pub fn classify(score: f64) -> ScoreBand {
    if score >= ON_TRACK_FLOOR {
        ScoreBand::OnTrack
    } else if score >= AT_RISK_FLOOR {
        ScoreBand::AtRisk
    } else {
        ScoreBand::OffTrack
    }
}

/// Score and band for one key result.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KeyResultScore {
    pub key_result_id: Uuid,
    pub title: String,
    pub score: f64,
    pub band: ScoreBand,
}

/// Scores for an objective and each of its key results.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Scorecard {
    pub objective_id: Uuid,
    pub key_results: Vec<KeyResultScore>,
    pub score: Option<f64>,
    pub band: Option<ScoreBand>,
}

impl Scorecard {
    pub fn build(objective: &Objective, key_results: &[KeyResult]) -> Self {
        let key_results_scored = key_results
            .iter()
            .filter(|kr| kr.objective_id == objective.id)
            .map(|kr| {
                let score = kr.score();
                KeyResultScore {
                    key_result_id: kr.id,
                    title: kr.title.clone(),
                    score,
                    band: classify(score),
                }
            })
            .collect();
        let score = score_objective(objective, key_results);
        Self {
            objective_id: objective.id,
            key_results: key_results_scored,
            score,
            band: score.map(classify),
        }
    }
}

/// Per-band counts across a set of objectives.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BandSummary {
    pub on_track: usize,
    pub at_risk: usize,
    pub off_track: usize,
    /// Objectives without a score; excluded from the bands and the mean.
    pub unscored: usize,
    pub mean_score: Option<f64>,
}

impl BandSummary {
    pub fn from_scores(scores: impl IntoIterator<Item = Option<f64>>) -> Self {
        let mut summary = BandSummary::default();
        let mut total = 0.0;
        let mut scored = 0usize;
        for score in scores {
            let Some(score) = score else {
                summary.unscored += 1;
                continue;
            };
            match classify(score) {
                ScoreBand::OnTrack => summary.on_track += 1,
                ScoreBand::AtRisk => summary.at_risk += 1,
                ScoreBand::OffTrack => summary.off_track += 1,
            }
            total += score;
            scored += 1;
        }
        if scored > 0 {
            summary.mean_score = Some(total / scored as f64);
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objective::ObjectiveLevel;
    use proptest::prelude::*;

    fn objective() -> Objective {
        Objective::new(
            "Delight customers",
            ObjectiveLevel::Company,
            Uuid::new_v4(),
            Uuid::new_v4(),
        )
    }

    fn kr(objective: &Objective, start: f64, target: f64, current: f64) -> KeyResult {
        let mut kr = KeyResult::new(objective.id, "metric", start, target);
        kr.current_value = current;
        kr
    }

    #[test]
    fn increasing_key_result_scores_linearly() {
        let obj = objective();
        assert_eq!(kr(&obj, 0.0, 100.0, 0.0).score(), 0.0);
        assert_eq!(kr(&obj, 0.0, 100.0, 50.0).score(), 5.0);
        assert_eq!(kr(&obj, 0.0, 100.0, 100.0).score(), 10.0);
    }

    #[test]
    fn score_is_clamped() {
        let obj = objective();
        assert_eq!(kr(&obj, 0.0, 100.0, 250.0).score(), 10.0);
        assert_eq!(kr(&obj, 10.0, 20.0, 5.0).score(), 0.0);
    }

    #[test]
    fn decreasing_key_result_is_mirrored() {
        let obj = objective();
        // Churn from 8% down to 4%: reaching 6% is halfway.
        assert_eq!(kr(&obj, 8.0, 4.0, 6.0).score(), 5.0);
        assert_eq!(kr(&obj, 8.0, 4.0, 3.0).score(), 10.0);
        assert_eq!(kr(&obj, 8.0, 4.0, 9.0).score(), 0.0);
    }

    #[test]
    fn flat_key_result_uses_threshold_policy() {
        let obj = objective();
        assert_eq!(kr(&obj, 5.0, 5.0, 5.0).score(), 10.0);
        assert_eq!(kr(&obj, 5.0, 5.0, 6.0).score(), 10.0);
        assert_eq!(kr(&obj, 5.0, 5.0, 4.9).score(), 0.0);
    }

    #[test]
    fn non_finite_values_score_zero() {
        let obj = objective();
        assert_eq!(kr(&obj, 0.0, 10.0, f64::NAN).score(), 0.0);
        assert_eq!(kr(&obj, 0.0, f64::INFINITY, 3.0).score(), 0.0);
    }

    #[test]
    fn empty_objective_has_no_score() {
        let obj = objective();
        assert_eq!(score_objective(&obj, &[]), None);
    }

    #[test]
    fn single_key_result_objective_equals_its_score() {
        let obj = objective();
        let only = kr(&obj, 0.0, 40.0, 30.0);
        assert_eq!(score_objective(&obj, &[only.clone()]), Some(only.score()));
    }

    #[test]
    fn objective_score_is_weighted_mean() {
        let obj = objective();
        let mut heavy = kr(&obj, 0.0, 10.0, 10.0);
        heavy.weight = 3.0;
        let light = kr(&obj, 0.0, 10.0, 2.0);
        // (10 * 3 + 2 * 1) / 4 = 8
        let score = score_objective(&obj, &[heavy, light]).unwrap();
        assert!((score - 8.0).abs() < 1e-9);
    }

    #[test]
    fn zero_weights_fall_back_to_plain_mean() {
        let obj = objective();
        let mut a = kr(&obj, 0.0, 10.0, 10.0);
        let mut b = kr(&obj, 0.0, 10.0, 0.0);
        a.weight = 0.0;
        b.weight = -2.0;
        assert_eq!(score_objective(&obj, &[a, b]), Some(5.0));
    }

    #[test]
    fn foreign_key_results_are_ignored() {
        let obj = objective();
        let other = objective();
        let foreign = kr(&other, 0.0, 10.0, 10.0);
        assert_eq!(score_objective(&obj, &[foreign.clone()]), None);
        let own = kr(&obj, 0.0, 10.0, 4.0);
        assert_eq!(score_objective(&obj, &[own, foreign]), Some(4.0));
    }

    #[test]
    fn band_boundaries_are_exact() {
        assert_eq!(classify(6.9), ScoreBand::AtRisk);
        assert_eq!(classify(7.0), ScoreBand::OnTrack);
        assert_eq!(classify(3.9), ScoreBand::OffTrack);
        assert_eq!(classify(4.0), ScoreBand::AtRisk);
        assert_eq!(classify(10.0), ScoreBand::OnTrack);
        assert_eq!(classify(0.0), ScoreBand::OffTrack);
    }

    #[test]
    fn scorecard_lists_each_key_result() {
        let obj = objective();
        let card = Scorecard::build(
            &obj,
            &[kr(&obj, 0.0, 10.0, 8.0), kr(&obj, 0.0, 10.0, 1.0)],
        );
        assert_eq!(card.key_results.len(), 2);
        assert_eq!(card.key_results[0].band, ScoreBand::OnTrack);
        assert_eq!(card.key_results[1].band, ScoreBand::OffTrack);
        assert_eq!(card.score, Some(4.5));
        assert_eq!(card.band, Some(ScoreBand::AtRisk));

        let empty = Scorecard::build(&obj, &[]);
        assert_eq!(empty.score, None);
        assert_eq!(empty.band, None);
    }

    #[test]
    fn band_summary_skips_unscored_objectives() {
        let summary = BandSummary::from_scores([Some(9.0), Some(5.0), None, Some(1.0), Some(7.0)]);
        assert_eq!(summary.on_track, 2);
        assert_eq!(summary.at_risk, 1);
        assert_eq!(summary.off_track, 1);
        assert_eq!(summary.unscored, 1);
        assert_eq!(summary.mean_score, Some(5.5));

        let none = BandSummary::from_scores([None, None]);
        assert_eq!(none.mean_score, None);
        assert_eq!(none.unscored, 2);
    }

    proptest! {
        #[test]
        fn key_result_score_always_in_range(
            start in proptest::num::f64::ANY,
            target in proptest::num::f64::ANY,
            current in proptest::num::f64::ANY,
        ) {
            let obj = objective();
            let score = kr(&obj, start, target, current).score();
            prop_assert!((0.0..=MAX_SCORE).contains(&score));
        }

        #[test]
        fn flat_key_results_score_zero_or_ten(
            level in -1.0e6f64..1.0e6,
            current in -1.0e6f64..1.0e6,
        ) {
            let obj = objective();
            let score = kr(&obj, level, level, current).score();
            prop_assert!(score == 0.0 || score == MAX_SCORE);
        }

        #[test]
        fn objective_score_stays_in_range(
            values in proptest::collection::vec(
                (-1.0e6f64..1.0e6, -1.0e6f64..1.0e6, -1.0e6f64..1.0e6, 0.0f64..100.0),
                1..12,
            )
        ) {
            let obj = objective();
            let krs: Vec<KeyResult> = values
                .into_iter()
                .map(|(s, t, c, w)| {
                    let mut k = kr(&obj, s, t, c);
                    k.weight = w;
                    k
                })
                .collect();
            let score = score_objective(&obj, &krs);
            prop_assert!(score.is_some());
            prop_assert!((0.0..=MAX_SCORE).contains(&score.unwrap_or(-1.0)));
        }
    }
}
