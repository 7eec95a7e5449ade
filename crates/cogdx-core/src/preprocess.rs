//! Evidence preprocessing: turn raw timings into comparable relative metrics.

use crate::config::EngineConfig;
use crate::model::{CohortStats, CohortTable, StudentResponse, Telemetry};

/// Expected time for the item, falling back to the configured default.
pub fn expected_time_ms(telemetry: &Telemetry, config: &EngineConfig) -> u64 {
    telemetry
        .expected_time_ms
        .filter(|&t| t > 0)
        .unwrap_or(config.default_expected_time_ms)
}

/// Response-time effort: elapsed over expected time, clamped to `[0, 1]`.
///
/// `1.0` means the learner spent at least the expected time on the item.
pub fn response_time_effort(telemetry: &Telemetry, config: &EngineConfig) -> f64 {
    let expected = expected_time_ms(telemetry, config);
    if expected == 0 {
        return 1.0;
    }
    (telemetry.time_ms as f64 / expected as f64).clamp(0.0, 1.0)
}

/// Z-score of elapsed time against cohort statistics; `0.0` without a usable spread.
pub fn z_score(time_ms: u64, stats: Option<&CohortStats>) -> f64 {
    match stats {
        Some(s) if s.std_dev_ms > 0.0 => (time_ms as f64 - s.mean_ms) / s.std_dev_ms,
        _ => 0.0,
    }
}

/// Derive `rte` and `z_score` for every response.
///
/// Original fields are left untouched. Cohort statistics take precedence; a
/// response without them keeps a z-score the client already supplied, or
/// gets `0.0`.
pub fn preprocess(
    responses: &[StudentResponse],
    cohort: Option<&CohortTable>,
    config: &EngineConfig,
) -> Vec<StudentResponse> {
    responses
        .iter()
        .map(|r| {
            let stats = cohort.and_then(|c| c.get(&r.question_id));
            let z = match stats {
                Some(_) => z_score(r.telemetry.time_ms, stats),
                None => r.telemetry.z_score.unwrap_or(0.0),
            };
            let telemetry = Telemetry {
                rte: Some(response_time_effort(&r.telemetry, config)),
                z_score: Some(z),
                ..r.telemetry.clone()
            };
            StudentResponse {
                telemetry,
                ..r.clone()
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Confidence;
    use std::collections::HashMap;

    fn response(question_id: &str, time_ms: u64) -> StudentResponse {
        StudentResponse {
            question_id: question_id.into(),
            selected_option_id: Some("a".into()),
            is_correct: true,
            confidence: Confidence::High,
            telemetry: Telemetry {
                time_ms,
                expected_time_ms: Some(20_000),
                ..Default::default()
            },
        }
    }

    #[test]
    fn rte_is_clamped_ratio() {
        let config = EngineConfig::default();
        assert!((response_time_effort(&response("q", 5_000).telemetry, &config) - 0.25).abs() < 1e-9);
        assert_eq!(response_time_effort(&response("q", 60_000).telemetry, &config), 1.0);
    }

    #[test]
    fn rte_uses_default_expected_time() {
        let config = EngineConfig::default();
        let telemetry = Telemetry {
            time_ms: 5_000,
            ..Default::default()
        };
        assert!((response_time_effort(&telemetry, &config) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn z_score_against_cohort() {
        let stats = CohortStats {
            mean_ms: 10_000.0,
            std_dev_ms: 2_000.0,
        };
        assert!((z_score(16_000, Some(&stats)) - 3.0).abs() < 1e-9);
        assert_eq!(z_score(16_000, None), 0.0);
    }

    #[test]
    fn zero_spread_degrades_to_zero() {
        let stats = CohortStats {
            mean_ms: 10_000.0,
            std_dev_ms: 0.0,
        };
        assert_eq!(z_score(99_000, Some(&stats)), 0.0);
    }

    #[test]
    fn preprocess_fills_derived_fields_only() {
        let config = EngineConfig::default();
        let mut cohort = HashMap::new();
        cohort.insert(
            "q1".to_string(),
            CohortStats {
                mean_ms: 10_000.0,
                std_dev_ms: 5_000.0,
            },
        );
        let raw = vec![response("q1", 20_000), response("q2", 1_000)];

        let out = preprocess(&raw, Some(&cohort), &config);

        assert_eq!(out[0].telemetry.z_score, Some(2.0));
        assert_eq!(out[0].telemetry.rte, Some(1.0));
        assert_eq!(out[1].telemetry.z_score, Some(0.0));
        assert_eq!(out[1].telemetry.time_ms, raw[1].telemetry.time_ms);
        assert!(raw[0].telemetry.rte.is_none());
    }
}
