//! Output types produced by a session evaluation.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Diagnosis for a competency.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiagnosisState {
    #[default]
    Unknown,
    Gap,
    Misconception,
    Mastered,
}

impl DiagnosisState {
    /// Overwrite precedence: `MISCONCEPTION > GAP > MASTERED > UNKNOWN`.
    ///
    /// A new finding replaces the running diagnosis only when its rank is
    /// greater than or equal to the current one.
    pub const fn precedence(self) -> u8 {
        match self {
            DiagnosisState::Misconception => 3,
            DiagnosisState::Gap => 2,
            DiagnosisState::Mastered => 1,
            DiagnosisState::Unknown => 0,
        }
    }

    /// Whether a finding in state `self` may overwrite `current`.
    pub fn overrides(self, current: DiagnosisState) -> bool {
        self.precedence() >= current.precedence()
    }

    /// Learning-health order used when comparing attempts.
    /// `None` for `UNKNOWN`, which carries no assessment.
    pub fn health(self) -> Option<u8> {
        match self {
            DiagnosisState::Misconception => Some(0),
            DiagnosisState::Gap => Some(1),
            DiagnosisState::Mastered => Some(2),
            DiagnosisState::Unknown => None,
        }
    }
}

impl fmt::Display for DiagnosisState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosisState::Unknown => write!(f, "UNKNOWN"),
            DiagnosisState::Gap => write!(f, "GAP"),
            DiagnosisState::Misconception => write!(f, "MISCONCEPTION"),
            DiagnosisState::Mastered => write!(f, "MASTERED"),
        }
    }
}

/// Why a diagnosis holds, and how strongly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    /// Human-readable reason.
    pub reason: String,
    /// Strength of the evidence, in `[0, 1]`.
    pub confidence: f64,
    /// Questions that contributed, in processing order.
    pub source_question_ids: Vec<String>,
}

/// Running (and finally, settled) diagnosis for one competency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompetencyDiagnosis {
    pub competency_id: String,
    pub state: DiagnosisState,
    pub evidence: Evidence,
    /// Misconception identified by a trap, when the state came from one.
    #[serde(default)]
    pub misconception_id: Option<String>,
    /// Remedial content gathered from the contributing questions.
    #[serde(default)]
    pub remedial_content_ids: Vec<String>,
}

/// Metacognitive calibration verdict.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CalibrationStatus {
    #[default]
    Calibrated,
    Overconfident,
    Underconfident,
}

impl fmt::Display for CalibrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CalibrationStatus::Calibrated => write!(f, "CALIBRATED"),
            CalibrationStatus::Overconfident => write!(f, "OVERCONFIDENT"),
            CalibrationStatus::Underconfident => write!(f, "UNDERCONFIDENT"),
        }
    }
}

/// Confidence-vs-accuracy report for a session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CalibrationResult {
    /// Size-weighted mean declared certainty (0–100).
    pub certainty_average: u32,
    /// Size-weighted mean accuracy (0–100).
    pub accuracy_average: u32,
    /// Expected calibration error (0–100).
    pub ece_score: u32,
    pub calibration_status: CalibrationStatus,
    /// Incorrect answers given with high confidence.
    pub blind_spots: u32,
    /// Correct answers given with low confidence or at excessive cost.
    pub fragile_knowledge: u32,
}

/// Coarse behavioral archetype for the session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BehaviorProfile {
    pub is_impulsive: bool,
    pub is_anxious: bool,
    pub is_consistent: bool,
    /// Responses flagged as rapid guesses.
    #[serde(default)]
    pub rapid_guess_count: u32,
    /// Responses whose temporal entropy crossed the threshold.
    #[serde(default)]
    pub high_entropy_count: u32,
    /// Correct responses produced at an excessive cognitive cost.
    #[serde(default)]
    pub fragile_certainty_count: u32,
}

/// The immutable outcome of evaluating one attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticResult {
    pub attempt_id: String,
    pub learner_id: String,
    /// Percentage of quality-sufficient responses that were correct.
    pub overall_score: u32,
    pub behavior_profile: BehaviorProfile,
    pub calibration: CalibrationResult,
    /// Diagnoses in order of first contact.
    pub diagnoses: Vec<CompetencyDiagnosis>,
    pub timestamp: DateTime<Utc>,
}

impl DiagnosticResult {
    /// Find the diagnosis for a competency.
    pub fn diagnosis(&self, competency_id: &str) -> Option<&CompetencyDiagnosis> {
        self.diagnoses
            .iter()
            .find(|d| d.competency_id == competency_id)
    }

    /// Number of diagnoses in the given state.
    pub fn count_state(&self, state: DiagnosisState) -> usize {
        self.diagnoses.iter().filter(|d| d.state == state).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precedence_is_total_and_strict() {
        use DiagnosisState::*;
        assert!(Misconception.precedence() > Gap.precedence());
        assert!(Gap.precedence() > Mastered.precedence());
        assert!(Mastered.precedence() > Unknown.precedence());
    }

    #[test]
    fn overrides_allows_ties() {
        use DiagnosisState::*;
        assert!(Gap.overrides(Gap));
        assert!(Misconception.overrides(Mastered));
        assert!(!Mastered.overrides(Gap));
        assert!(!Gap.overrides(Misconception));
    }

    #[test]
    fn health_excludes_unknown() {
        assert_eq!(DiagnosisState::Unknown.health(), None);
        assert!(DiagnosisState::Mastered.health() > DiagnosisState::Gap.health());
    }

    #[test]
    fn state_serializes_screaming_case() {
        let json = serde_json::to_string(&DiagnosisState::Misconception).unwrap();
        assert_eq!(json, "\"MISCONCEPTION\"");
        let status: CalibrationStatus = serde_json::from_str("\"OVERCONFIDENT\"").unwrap();
        assert_eq!(status, CalibrationStatus::Overconfident);
    }
}
