//! Diagnostic result persistence and attempt-over-attempt comparison.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::results::{DiagnosisState, DiagnosticResult};

impl DiagnosticResult {
    /// Save the result as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize result")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write result to {}", path.display()))?;
        Ok(())
    }

    /// Load a result from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read result from {}", path.display()))?;
        let result: DiagnosticResult =
            serde_json::from_str(&content).context("failed to parse result JSON")?;
        Ok(result)
    }

    /// Compare this attempt against an earlier one.
    ///
    /// Competencies are ranked by learning health
    /// (`MISCONCEPTION < GAP < MASTERED`); `UNKNOWN` counts as unassessed.
    pub fn compare(&self, baseline: &DiagnosticResult) -> ProgressReport {
        let assessed = |result: &DiagnosticResult| -> HashMap<String, DiagnosisState> {
            result
                .diagnoses
                .iter()
                .filter(|d| d.state.health().is_some())
                .map(|d| (d.competency_id.clone(), d.state))
                .collect()
        };

        let before = assessed(baseline);
        let after = assessed(self);

        let mut regressions = Vec::new();
        let mut improvements = Vec::new();
        let mut unchanged = 0usize;
        let mut newly_assessed = 0usize;

        // iterate in current diagnosis order for stable output
        for d in &self.diagnoses {
            let Some(&current) = after.get(&d.competency_id) else {
                continue;
            };
            let Some(&previous) = before.get(&d.competency_id) else {
                newly_assessed += 1;
                continue;
            };
            let transition = Transition {
                competency_id: d.competency_id.clone(),
                baseline_state: previous,
                current_state: current,
            };
            match current.health().cmp(&previous.health()) {
                std::cmp::Ordering::Less => regressions.push(transition),
                std::cmp::Ordering::Greater => improvements.push(transition),
                std::cmp::Ordering::Equal => unchanged += 1,
            }
        }

        let no_longer_assessed = before.keys().filter(|k| !after.contains_key(*k)).count();

        ProgressReport {
            baseline_attempt: baseline.attempt_id.clone(),
            current_attempt: self.attempt_id.clone(),
            score_delta: self.overall_score as i64 - baseline.overall_score as i64,
            ece_delta: self.calibration.ece_score as i64 - baseline.calibration.ece_score as i64,
            regressions,
            improvements,
            unchanged,
            newly_assessed,
            no_longer_assessed,
        }
    }
}

/// How diagnoses moved between two attempts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressReport {
    pub baseline_attempt: String,
    pub current_attempt: String,
    /// Change in overall score, in points.
    pub score_delta: i64,
    /// Change in calibration error, in points. Negative is better.
    pub ece_delta: i64,
    pub regressions: Vec<Transition>,
    pub improvements: Vec<Transition>,
    pub unchanged: usize,
    /// Competencies assessed now but not in the baseline.
    pub newly_assessed: usize,
    /// Competencies assessed in the baseline but not now.
    pub no_longer_assessed: usize,
}

/// A competency whose diagnosis changed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transition {
    pub competency_id: String,
    pub baseline_state: DiagnosisState,
    pub current_state: DiagnosisState,
}

impl ProgressReport {
    /// Format the progress report as markdown.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();

        md.push_str(&format!(
            "**Summary:** {} regressions, {} improvements, {} unchanged (score {:+}, ECE {:+})\n\n",
            self.regressions.len(),
            self.improvements.len(),
            self.unchanged,
            self.score_delta,
            self.ece_delta
        ));

        for (heading, rows) in [
            ("Regressions", &self.regressions),
            ("Improvements", &self.improvements),
        ] {
            if rows.is_empty() {
                continue;
            }
            md.push_str(&format!("### {heading}\n\n"));
            md.push_str("| Competency | Baseline | Current |\n");
            md.push_str("|------------|----------|---------|\n");
            for t in rows {
                md.push_str(&format!(
                    "| {} | {} | {} |\n",
                    t.competency_id, t.baseline_state, t.current_state
                ));
            }
            md.push('\n');
        }

        md
    }

    /// Returns true if any competency got worse.
    pub fn has_regressions(&self) -> bool {
        !self.regressions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::{BehaviorProfile, CalibrationResult, CompetencyDiagnosis, Evidence};
    use chrono::Utc;

    fn make_result(attempt: &str, states: &[(&str, DiagnosisState)]) -> DiagnosticResult {
        DiagnosticResult {
            attempt_id: attempt.into(),
            learner_id: "learner".into(),
            overall_score: 50,
            behavior_profile: BehaviorProfile::default(),
            calibration: CalibrationResult::default(),
            diagnoses: states
                .iter()
                .map(|(id, state)| CompetencyDiagnosis {
                    competency_id: (*id).into(),
                    state: *state,
                    evidence: Evidence {
                        reason: String::new(),
                        confidence: 0.5,
                        source_question_ids: vec![],
                    },
                    misconception_id: None,
                    remedial_content_ids: vec![],
                })
                .collect(),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn compare_identical_results() {
        let r = make_result("a1", &[("c1", DiagnosisState::Gap)]);
        let report = r.compare(&r.clone());
        assert!(report.regressions.is_empty());
        assert!(report.improvements.is_empty());
        assert_eq!(report.unchanged, 1);
    }

    #[test]
    fn compare_detects_regression_and_improvement() {
        let baseline = make_result(
            "a1",
            &[("c1", DiagnosisState::Mastered), ("c2", DiagnosisState::Misconception)],
        );
        let current = make_result(
            "a2",
            &[("c1", DiagnosisState::Gap), ("c2", DiagnosisState::Mastered)],
        );
        let report = current.compare(&baseline);
        assert_eq!(report.regressions.len(), 1);
        assert_eq!(report.regressions[0].competency_id, "c1");
        assert_eq!(report.improvements.len(), 1);
        assert!(report.has_regressions());
    }

    #[test]
    fn unknown_is_unassessed() {
        let baseline = make_result("a1", &[("old", DiagnosisState::Gap), ("c", DiagnosisState::Unknown)]);
        let current = make_result("a2", &[("c", DiagnosisState::Mastered)]);
        let report = current.compare(&baseline);
        assert_eq!(report.newly_assessed, 1);
        assert_eq!(report.no_longer_assessed, 1);
        assert_eq!(report.unchanged, 0);
    }

    #[test]
    fn json_roundtrip() {
        let result = make_result("a1", &[("c1", DiagnosisState::Misconception)]);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("a1.json");

        result.save_json(&path).unwrap();
        let loaded = DiagnosticResult::load_json(&path).unwrap();
        assert_eq!(loaded, result);
    }

    #[test]
    fn markdown_output() {
        let baseline = make_result("a1", &[("c1", DiagnosisState::Mastered)]);
        let current = make_result("a2", &[("c1", DiagnosisState::Misconception)]);
        let md = current.compare(&baseline).to_markdown();
        assert!(md.contains("Regressions"));
        assert!(md.contains("MISCONCEPTION"));
    }
}
