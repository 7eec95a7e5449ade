//! Evidence quality filter against rapid guessing.

use crate::config::EngineConfig;
use crate::model::StudentResponse;
use crate::preprocess::expected_time_ms;

/// Whether the response looks like a rapid guess.
///
/// Compares raw elapsed time against a fixed fraction of the item's expected
/// time, so the verdict does not depend on how `rte` was clamped.
pub fn is_rapid_guess(response: &StudentResponse, config: &EngineConfig) -> bool {
    let expected = expected_time_ms(&response.telemetry, config) as f64;
    (response.telemetry.time_ms as f64) < expected * config.rapid_guess_fraction
}

/// Whether the response is a genuine attempt and may count as evidence.
pub fn is_evidence_quality_sufficient(response: &StudentResponse, config: &EngineConfig) -> bool {
    !is_rapid_guess(response, config)
}

/// Responses that pass the quality filter.
pub fn valid_responses<'a>(
    responses: &'a [StudentResponse],
    config: &'a EngineConfig,
) -> impl Iterator<Item = &'a StudentResponse> + 'a {
    responses
        .iter()
        .filter(move |r| is_evidence_quality_sufficient(r, config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Confidence, Telemetry};

    fn response(time_ms: u64, expected: Option<u64>) -> StudentResponse {
        StudentResponse {
            question_id: "q1".into(),
            selected_option_id: Some("a".into()),
            is_correct: true,
            confidence: Confidence::High,
            telemetry: Telemetry {
                time_ms,
                expected_time_ms: expected,
                ..Default::default()
            },
        }
    }

    #[test]
    fn fast_response_is_rapid_guess() {
        let config = EngineConfig::default();
        assert!(is_rapid_guess(&response(500, Some(30_000)), &config));
        assert!(!is_evidence_quality_sufficient(&response(500, Some(30_000)), &config));
    }

    #[test]
    fn threshold_is_relative_to_expected_time() {
        let config = EngineConfig::default();
        // 10% of 2s is 200ms
        assert!(is_evidence_quality_sufficient(&response(500, Some(2_000)), &config));
        assert!(is_rapid_guess(&response(150, Some(2_000)), &config));
    }

    #[test]
    fn boundary_counts_as_genuine() {
        let config = EngineConfig::default();
        assert!(is_evidence_quality_sufficient(&response(1_000, Some(10_000)), &config));
    }

    #[test]
    fn missing_expected_time_uses_default() {
        let config = EngineConfig::default();
        assert!(is_rapid_guess(&response(900, None), &config));
        assert!(!is_rapid_guess(&response(1_100, None), &config));
    }

    #[test]
    fn valid_responses_filters() {
        let config = EngineConfig::default();
        let responses = vec![response(100, None), response(5_000, None)];
        assert_eq!(valid_responses(&responses, &config).count(), 1);
    }
}
