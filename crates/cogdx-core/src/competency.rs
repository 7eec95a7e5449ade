//! Differential diagnosis of a single response, folded into a running
//! per-competency diagnosis.
//!
//! Rules are tried in order and the first match wins:
//!
//! 1. explicit "I don't know" → `GAP`
//! 2. trap option chosen with high confidence → `MISCONCEPTION`
//! 3. correct with medium/high confidence → `MASTERED`, unless the answer
//!    cost far more time than the cohort needed ("toxic doubt") → `GAP`
//! 4. anything else → `GAP`
//!
//! Responses that fail the evidence quality filter never change a diagnosis.
//! An explicit don't-know is exempt from that filter: it is a deliberate
//! answer however fast it was given.

use crate::config::EngineConfig;
use crate::model::{Confidence, QMatrixEntry, StudentResponse};
use crate::quality::is_evidence_quality_sufficient;
use crate::results::{CalibrationStatus, CompetencyDiagnosis, DiagnosisState, Evidence};

pub const DONT_KNOW_CONFIDENCE: f64 = 1.0;
pub const MISCONCEPTION_CONFIDENCE: f64 = 0.9;
/// Misconception confidence when the whole session is overconfident.
pub const REINFORCED_MISCONCEPTION_CONFIDENCE: f64 = 0.95;
pub const MASTERY_CONFIDENCE: f64 = 0.85;
pub const TOXIC_DOUBT_CONFIDENCE: f64 = 0.6;
pub const GAP_CONFIDENCE: f64 = 0.7;

pub const DISCARDED_REASON: &str = "discarded: impulsive response";

/// What a single response says about its competency, before folding.
#[derive(Debug, Clone, PartialEq)]
pub struct Finding {
    pub state: DiagnosisState,
    pub confidence: f64,
    pub reason: String,
    pub misconception_id: Option<String>,
}

impl Finding {
    fn new(state: DiagnosisState, confidence: f64, reason: impl Into<String>) -> Self {
        Self {
            state,
            confidence,
            reason: reason.into(),
            misconception_id: None,
        }
    }
}

/// Apply the rule set to one quality-sufficient response.
pub fn diagnose_response(
    response: &StudentResponse,
    mapping: &QMatrixEntry,
    calibration_status: CalibrationStatus,
    config: &EngineConfig,
) -> Finding {
    let confidence = response.declared_confidence();

    if response.selected(mapping.dont_know_option_id.as_deref()) {
        return Finding::new(
            DiagnosisState::Gap,
            DONT_KNOW_CONFIDENCE,
            "explicit don't-know: the learner chose not to answer",
        );
    }

    if mapping.is_trap
        && response.selected(mapping.trap_option_id.as_deref())
        && confidence == Confidence::High
    {
        let reinforced = calibration_status == CalibrationStatus::Overconfident;
        let named = mapping.misconception_id.as_deref().unwrap_or("unnamed");
        let mut reason = format!("misconception '{named}': trap option chosen with high confidence");
        if reinforced {
            reason.push_str("; reinforced by a metacognitive blind spot (chronic overconfidence)");
        }
        return Finding {
            state: DiagnosisState::Misconception,
            confidence: if reinforced {
                REINFORCED_MISCONCEPTION_CONFIDENCE
            } else {
                MISCONCEPTION_CONFIDENCE
            },
            reason,
            misconception_id: mapping.misconception_id.clone(),
        };
    }

    if response.is_correct && matches!(confidence, Confidence::High | Confidence::Medium) {
        let z = response.telemetry.z();
        if z > config.toxic_doubt_z {
            return Finding::new(
                DiagnosisState::Gap,
                TOXIC_DOUBT_CONFIDENCE,
                format!("correct but at excessive cognitive cost (z = {z:.2})"),
            );
        }
        return Finding::new(
            DiagnosisState::Mastered,
            MASTERY_CONFIDENCE,
            format!("correct with {confidence} confidence"),
        );
    }

    let reason = if response.is_correct {
        "correct but low confidence (possible guess)"
    } else {
        "incorrect answer"
    };
    Finding::new(DiagnosisState::Gap, GAP_CONFIDENCE, reason)
}

/// Fold one response into the competency's running diagnosis.
///
/// A new finding overwrites state and evidence only when its precedence is at
/// least that of the current state; the question id is always recorded.
pub fn process_response_evidence(
    response: &StudentResponse,
    mapping: &QMatrixEntry,
    calibration_status: CalibrationStatus,
    existing: Option<CompetencyDiagnosis>,
    config: &EngineConfig,
) -> CompetencyDiagnosis {
    let dont_know = response.selected(mapping.dont_know_option_id.as_deref());
    if !dont_know && !is_evidence_quality_sufficient(response, config) {
        tracing::debug!(
            question = %response.question_id,
            competency = %mapping.competency_id,
            "discarding rapid-guess response"
        );
        return existing.unwrap_or_else(|| CompetencyDiagnosis {
            competency_id: mapping.competency_id.clone(),
            state: DiagnosisState::Unknown,
            evidence: Evidence {
                reason: DISCARDED_REASON.to_string(),
                confidence: 0.0,
                source_question_ids: vec![response.question_id.clone()],
            },
            misconception_id: None,
            remedial_content_ids: Vec::new(),
        });
    }

    let finding = diagnose_response(response, mapping, calibration_status, config);
    let remedial: &[String] = if matches!(
        finding.state,
        DiagnosisState::Gap | DiagnosisState::Misconception
    ) {
        mapping.remedial_content_ids.as_slice()
    } else {
        &[]
    };

    let Some(mut diagnosis) = existing else {
        return CompetencyDiagnosis {
            competency_id: mapping.competency_id.clone(),
            state: finding.state,
            evidence: Evidence {
                reason: finding.reason,
                confidence: finding.confidence,
                source_question_ids: vec![response.question_id.clone()],
            },
            misconception_id: finding.misconception_id,
            remedial_content_ids: remedial.to_vec(),
        };
    };

    if finding.state.overrides(diagnosis.state) {
        if finding.state != diagnosis.state {
            tracing::debug!(
                competency = %diagnosis.competency_id,
                from = %diagnosis.state,
                to = %finding.state,
                "diagnosis overwritten"
            );
        }
        // a discarded guess is not evidence for the finding that replaces it
        if diagnosis.evidence.reason == DISCARDED_REASON {
            diagnosis.evidence.source_question_ids.clear();
        }
        diagnosis.state = finding.state;
        diagnosis.evidence.reason = finding.reason;
        diagnosis.evidence.confidence = finding.confidence;
        diagnosis.misconception_id = finding.misconception_id;
    }
    diagnosis
        .evidence
        .source_question_ids
        .push(response.question_id.clone());
    for id in remedial {
        if !diagnosis.remedial_content_ids.contains(id) {
            diagnosis.remedial_content_ids.push(id.clone());
        }
    }
    diagnosis
}
