//! Session evaluator: one pass from raw responses to a `DiagnosticResult`.
//!
//! Preprocess → calibrate → fold per-competency diagnoses → score → profile.
//! Everything here is synchronous and free of I/O, so evaluations for
//! different attempts can run concurrently without coordination.

use chrono::{DateTime, Utc};

use crate::behavior::profile_behavior;
use crate::calibration::analyze_calibration;
use crate::competency::process_response_evidence;
use crate::config::EngineConfig;
use crate::model::{CohortTable, QMatrix, StudentResponse};
use crate::preprocess::preprocess;
use crate::quality::valid_responses;
use crate::results::{CalibrationStatus, CompetencyDiagnosis, DiagnosticResult};

/// Evaluates learner sessions under one configuration.
#[derive(Debug, Clone, Default)]
pub struct SessionEvaluator {
    config: EngineConfig,
}

impl SessionEvaluator {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Evaluate a session, stamping the result with the current time.
    pub fn evaluate_session(
        &self,
        attempt_id: &str,
        learner_id: &str,
        responses: &[StudentResponse],
        q_matrix: &QMatrix,
        cohort: Option<&CohortTable>,
    ) -> DiagnosticResult {
        self.evaluate_session_at(attempt_id, learner_id, responses, q_matrix, cohort, Utc::now())
    }

    /// Evaluate a session with an explicit timestamp.
    pub fn evaluate_session_at(
        &self,
        attempt_id: &str,
        learner_id: &str,
        responses: &[StudentResponse],
        q_matrix: &QMatrix,
        cohort: Option<&CohortTable>,
        timestamp: DateTime<Utc>,
    ) -> DiagnosticResult {
        let prepared = preprocess(responses, cohort, &self.config);
        let calibration = analyze_calibration(&prepared, &self.config);
        let diagnoses = fold_diagnoses(
            &prepared,
            q_matrix,
            calibration.calibration_status,
            &self.config,
        );
        let overall_score = overall_score(&prepared, &self.config);
        let behavior_profile = profile_behavior(&prepared, &self.config);

        tracing::info!(
            attempt = attempt_id,
            learner = learner_id,
            responses = prepared.len(),
            competencies = diagnoses.len(),
            score = overall_score,
            calibration = %calibration.calibration_status,
            "session evaluated"
        );

        DiagnosticResult {
            attempt_id: attempt_id.to_string(),
            learner_id: learner_id.to_string(),
            overall_score,
            behavior_profile,
            calibration,
            diagnoses,
            timestamp,
        }
    }
}

/// Fold responses, in input order, into per-competency diagnoses.
///
/// Diagnoses keep the order in which their competency was first touched.
/// Responses to questions missing from the Q-matrix contribute nothing.
pub fn fold_diagnoses(
    responses: &[StudentResponse],
    q_matrix: &QMatrix,
    calibration_status: CalibrationStatus,
    config: &EngineConfig,
) -> Vec<CompetencyDiagnosis> {
    responses.iter().fold(Vec::new(), |mut acc, response| {
        let Some(mapping) = q_matrix.get(&response.question_id) else {
            tracing::warn!(question = %response.question_id, "no Q-matrix entry, skipping");
            return acc;
        };
        match acc
            .iter()
            .position(|d: &CompetencyDiagnosis| d.competency_id == mapping.competency_id)
        {
            Some(i) => {
                let existing = acc[i].clone();
                acc[i] = process_response_evidence(
                    response,
                    mapping,
                    calibration_status,
                    Some(existing),
                    config,
                );
            }
            None => acc.push(process_response_evidence(
                response,
                mapping,
                calibration_status,
                None,
                config,
            )),
        }
        acc
    })
}

/// Percentage (0–100) of quality-sufficient responses that are correct.
pub fn overall_score(responses: &[StudentResponse], config: &EngineConfig) -> u32 {
    let (valid, correct) = valid_responses(responses, config)
        .fold((0u32, 0u32), |(n, c), r| (n + 1, c + r.is_correct as u32));
    if valid == 0 {
        return 0;
    }
    (100.0 * correct as f64 / valid as f64).round() as u32
}

/// Evaluate a session with the default configuration.
pub fn evaluate_session(
    attempt_id: &str,
    learner_id: &str,
    responses: &[StudentResponse],
    q_matrix: &QMatrix,
    cohort: Option<&CohortTable>,
) -> DiagnosticResult {
    SessionEvaluator::default().evaluate_session(attempt_id, learner_id, responses, q_matrix, cohort)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CohortStats, Confidence, QMatrixEntry, Telemetry};
    use crate::results::DiagnosisState;
    use std::collections::HashMap;

    fn entry(id: &str, competency: &str) -> QMatrixEntry {
        QMatrixEntry {
            id: id.into(),
            competency_id: competency.into(),
            is_trap: false,
            trap_option_id: None,
            misconception_id: None,
            dont_know_option_id: None,
            remedial_content_ids: vec![],
        }
    }

    fn response(id: &str, correct: bool, confidence: Confidence, time_ms: u64) -> StudentResponse {
        StudentResponse {
            question_id: id.into(),
            selected_option_id: Some("a".into()),
            is_correct: correct,
            confidence,
            telemetry: Telemetry {
                time_ms,
                expected_time_ms: Some(10_000),
                ..Default::default()
            },
        }
    }

    #[test]
    fn unmapped_questions_are_skipped() {
        let q = QMatrix::new(vec![entry("q1", "c1")]);
        let responses = vec![
            response("q1", true, Confidence::High, 8_000),
            response("ghost", false, Confidence::High, 8_000),
        ];
        let result = evaluate_session("a1", "l1", &responses, &q, None);
        assert_eq!(result.diagnoses.len(), 1);
        assert_eq!(result.diagnoses[0].state, DiagnosisState::Mastered);
        // unmapped responses still count toward the score
        assert_eq!(result.overall_score, 50);
    }

    #[test]
    fn diagnoses_follow_first_touch_order() {
        let q = QMatrix::new(vec![entry("q1", "b"), entry("q2", "a"), entry("q3", "b")]);
        let responses = vec![
            response("q1", true, Confidence::High, 8_000),
            response("q2", false, Confidence::High, 8_000),
            response("q3", false, Confidence::Low, 8_000),
        ];
        let result = evaluate_session("a1", "l1", &responses, &q, None);
        let ids: Vec<_> = result.diagnoses.iter().map(|d| d.competency_id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
        assert_eq!(result.diagnoses[0].state, DiagnosisState::Gap);
        assert_eq!(result.diagnoses[0].evidence.source_question_ids, vec!["q1", "q3"]);
    }

    #[test]
    fn score_ignores_rapid_guesses() {
        let q = QMatrix::new(vec![entry("q1", "c"), entry("q2", "c")]);
        let responses = vec![
            response("q1", true, Confidence::High, 8_000),
            response("q2", false, Confidence::High, 100),
        ];
        let result = evaluate_session("a1", "l1", &responses, &q, None);
        assert_eq!(result.overall_score, 100);
        assert!(result.behavior_profile.is_impulsive);
    }

    #[test]
    fn empty_session_scores_zero() {
        let result = evaluate_session("a1", "l1", &[], &QMatrix::default(), None);
        assert_eq!(result.overall_score, 0);
        assert!(result.diagnoses.is_empty());
    }

    #[test]
    fn cohort_stats_drive_toxic_doubt() {
        let q = QMatrix::new(vec![entry("q1", "c")]);
        let mut cohort = HashMap::new();
        cohort.insert(
            "q1".to_string(),
            CohortStats {
                mean_ms: 10_000.0,
                std_dev_ms: 2_000.0,
            },
        );
        let responses = vec![response("q1", true, Confidence::High, 16_000)];
        let result = evaluate_session("a1", "l1", &responses, &q, Some(&cohort));
        assert_eq!(result.diagnoses[0].state, DiagnosisState::Gap);
        assert!(result.behavior_profile.is_anxious);
        assert_eq!(result.calibration.fragile_knowledge, 1);
    }

    #[test]
    fn explicit_timestamp_is_kept() {
        let ts = DateTime::parse_from_rfc3339("2026-01-02T03:04:05Z")
            .unwrap()
            .with_timezone(&Utc);
        let result = SessionEvaluator::default().evaluate_session_at(
            "a1",
            "l1",
            &[],
            &QMatrix::default(),
            None,
            ts,
        );
        assert_eq!(result.timestamp, ts);
    }
}
