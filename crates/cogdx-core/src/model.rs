//! Core input types for cogdx.
//!
//! These are the evidence units the engine consumes: learner responses with
//! their behavioral telemetry, the Q-matrix that maps questions onto
//! competencies and misconceptions, and optional cohort timing statistics.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Confidence a learner declared for an answer.
///
/// Ordered from least to most certain.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    #[default]
    None,
    Low,
    Medium,
    High,
}

impl Confidence {
    /// All levels, in bin order.
    pub const ALL: [Confidence; 4] = [
        Confidence::None,
        Confidence::Low,
        Confidence::Medium,
        Confidence::High,
    ];

    /// Numeric certainty (0–100) used for calibration math.
    pub fn certainty(self) -> f64 {
        match self {
            Confidence::None => 0.0,
            Confidence::Low => 33.0,
            Confidence::Medium => 66.0,
            Confidence::High => 100.0,
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Confidence::None => write!(f, "none"),
            Confidence::Low => write!(f, "low"),
            Confidence::Medium => write!(f, "medium"),
            Confidence::High => write!(f, "high"),
        }
    }
}

impl FromStr for Confidence {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" | "" => Ok(Confidence::None),
            "low" => Ok(Confidence::Low),
            "medium" | "med" => Ok(Confidence::Medium),
            "high" => Ok(Confidence::High),
            other => Err(format!("unknown confidence level: {other}")),
        }
    }
}

/// Behavioral record captured alongside a single response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Telemetry {
    /// Elapsed time on the item in milliseconds.
    pub time_ms: u64,
    /// Number of answer changes before submitting.
    #[serde(default)]
    pub hesitation_count: u32,
    /// Number of times the window lost focus.
    #[serde(default)]
    pub focus_lost_count: u32,
    /// Time until the first interaction with the item.
    #[serde(default)]
    pub time_to_first_interaction_ms: u64,
    /// Time from the last interaction to submitting.
    #[serde(default)]
    pub confirmation_latency_ms: u64,
    /// Confidence as echoed by the client instrumentation.
    #[serde(default)]
    pub confidence: Option<Confidence>,
    /// Elapsed time relative to the cohort, in standard deviations.
    #[serde(default)]
    pub z_score: Option<f64>,
    /// Baseline time a genuine attempt at this item is expected to take.
    #[serde(default)]
    pub expected_time_ms: Option<u64>,
    /// Number of times the learner came back to this item.
    #[serde(default)]
    pub revisit_count: Option<u32>,
    /// Response-time effort, filled in by the preprocessor.
    #[serde(default)]
    pub rte: Option<f64>,
}

impl Telemetry {
    /// Z-score, or `0.0` when it has not been computed.
    pub fn z(&self) -> f64 {
        self.z_score.unwrap_or(0.0)
    }
}

/// One answered question: the unit of evidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentResponse {
    /// Question identifier.
    pub question_id: String,
    /// Option the learner picked; `None` when nothing was selected.
    #[serde(default)]
    pub selected_option_id: Option<String>,
    /// Whether the answer was objectively correct.
    pub is_correct: bool,
    /// Confidence declared for this answer.
    #[serde(default)]
    pub confidence: Confidence,
    /// Behavioral telemetry.
    #[serde(default)]
    pub telemetry: Telemetry,
}

impl StudentResponse {
    /// The confidence used for diagnosis and calibration.
    ///
    /// The response-level value wins; the telemetry echo is consulted only
    /// when the response carries no declaration.
    pub fn declared_confidence(&self) -> Confidence {
        match self.confidence {
            Confidence::None => self.telemetry.confidence.unwrap_or_default(),
            declared => declared,
        }
    }

    /// Whether the learner picked `option_id`.
    pub fn selected(&self, option_id: Option<&str>) -> bool {
        match (self.selected_option_id.as_deref(), option_id) {
            (Some(selected), Some(option)) => selected == option,
            _ => false,
        }
    }
}

/// Q-matrix record for one question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QMatrixEntry {
    /// Question identifier.
    pub id: String,
    /// Competency this question gathers evidence for.
    pub competency_id: String,
    /// Whether one of the options is a designed misconception trap.
    #[serde(default)]
    pub is_trap: bool,
    /// The trap option.
    #[serde(default)]
    pub trap_option_id: Option<String>,
    /// Misconception the trap diagnoses.
    #[serde(default)]
    pub misconception_id: Option<String>,
    /// The explicit "I don't know" option, if the question offers one.
    #[serde(default)]
    pub dont_know_option_id: Option<String>,
    /// Remedial content attached to this question's competency.
    #[serde(default)]
    pub remedial_content_ids: Vec<String>,
}

/// Precomputed question → mapping lookup, built once per session.
#[derive(Debug, Clone, Default)]
pub struct QMatrix {
    entries: HashMap<String, QMatrixEntry>,
}

impl QMatrix {
    /// Build the lookup. Later duplicates replace earlier ones.
    pub fn new(entries: impl IntoIterator<Item = QMatrixEntry>) -> Self {
        Self {
            entries: entries.into_iter().map(|e| (e.id.clone(), e)).collect(),
        }
    }

    pub fn get(&self, question_id: &str) -> Option<&QMatrixEntry> {
        self.entries.get(question_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Cohort timing statistics for one question.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CohortStats {
    pub mean_ms: f64,
    pub std_dev_ms: f64,
}

/// Cohort statistics keyed by question id.
pub type CohortTable = HashMap<String, CohortStats>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confidence_display_and_parse() {
        assert_eq!(Confidence::High.to_string(), "high");
        assert_eq!("MEDIUM".parse::<Confidence>().unwrap(), Confidence::Medium);
        assert_eq!("".parse::<Confidence>().unwrap(), Confidence::None);
        assert!("certain".parse::<Confidence>().is_err());
    }

    #[test]
    fn confidence_is_ordered() {
        assert!(Confidence::None < Confidence::Low);
        assert!(Confidence::Medium < Confidence::High);
        assert_eq!(Confidence::Low.certainty(), 33.0);
        assert_eq!(Confidence::Medium.certainty(), 66.0);
    }

    #[test]
    fn declared_confidence_falls_back_to_telemetry() {
        let mut response = StudentResponse {
            question_id: "q1".into(),
            selected_option_id: Some("a".into()),
            is_correct: true,
            confidence: Confidence::None,
            telemetry: Telemetry {
                confidence: Some(Confidence::Low),
                ..Default::default()
            },
        };
        assert_eq!(response.declared_confidence(), Confidence::Low);

        response.confidence = Confidence::High;
        assert_eq!(response.declared_confidence(), Confidence::High);
    }

    #[test]
    fn selected_requires_both_sides() {
        let response = StudentResponse {
            question_id: "q1".into(),
            selected_option_id: None,
            is_correct: false,
            confidence: Confidence::None,
            telemetry: Telemetry::default(),
        };
        assert!(!response.selected(None));
        assert!(!response.selected(Some("idk")));
    }

    #[test]
    fn response_deserializes_with_defaults() {
        let json = r#"{"question_id":"q1","is_correct":true,"telemetry":{"time_ms":4200}}"#;
        let response: StudentResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.confidence, Confidence::None);
        assert_eq!(response.telemetry.time_ms, 4200);
        assert!(response.telemetry.z_score.is_none());
    }
}
