//! Markdown report generator, for pull requests and chat tools.

use anyhow::{Context, Result};
use std::path::Path;

use cogdx_core::results::DiagnosticResult;
use cogdx_core::triage::PathMutation;

/// Table cells cannot hold raw pipes or newlines.
fn cell(s: &str) -> String {
    s.replace('|', "\\|").replace('\n', " ")
}

/// Generate a markdown report for a diagnostic result and its remediation plan.
pub fn generate_markdown(result: &DiagnosticResult, plan: &[PathMutation]) -> String {
    let mut md = String::new();
    let cal = &result.calibration;
    let profile = &result.behavior_profile;

    md.push_str(&format!("## Diagnosis for `{}`\n\n", result.learner_id));
    md.push_str(&format!(
        "Attempt `{}` at {}: **score {}%**\n\n",
        result.attempt_id,
        result.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
        result.overall_score
    ));

    md.push_str(&format!(
        "**Calibration:** {} (certainty {}%, accuracy {}%, ECE {}), {} blind spots, {} fragile\n\n",
        cal.calibration_status,
        cal.certainty_average,
        cal.accuracy_average,
        cal.ece_score,
        cal.blind_spots,
        cal.fragile_knowledge
    ));

    let mut flags = Vec::new();
    if profile.is_impulsive {
        flags.push(format!("impulsive ({} rapid guesses)", profile.rapid_guess_count));
    }
    if profile.is_anxious {
        flags.push(format!("anxious ({} high-entropy answers)", profile.high_entropy_count));
    }
    if !profile.is_consistent {
        flags.push("inconsistent".to_string());
    }
    let behavior = if flags.is_empty() {
        "steady".to_string()
    } else {
        flags.join(", ")
    };
    md.push_str(&format!("**Behavior:** {behavior}\n\n"));

    if !result.diagnoses.is_empty() {
        md.push_str("### Competencies\n\n");
        md.push_str("| Competency | State | Confidence | Evidence |\n");
        md.push_str("|------------|-------|------------|----------|\n");
        for d in &result.diagnoses {
            md.push_str(&format!(
                "| {} | {} | {:.2} | {} |\n",
                cell(&d.competency_id),
                d.state,
                d.evidence.confidence,
                cell(&d.evidence.reason)
            ));
        }
        md.push('\n');
    }

    md.push_str("### Remediation plan\n\n");
    if plan.is_empty() {
        md.push_str("No path changes.\n");
    }
    for (i, m) in plan.iter().enumerate() {
        md.push_str(&format!(
            "{}. `{}` on `{}` → {}",
            i + 1,
            m.action,
            m.target_node_id,
            m.metadata.new_status
        ));
        if let Some(content) = &m.metadata.content_id {
            md.push_str(&format!(" (content `{content}`)"));
        }
        md.push_str(&format!(": {}\n", m.reason));
    }

    md
}

/// Write a markdown report to a file.
pub fn write_markdown_report(
    result: &DiagnosticResult,
    plan: &[PathMutation],
    path: &Path,
) -> Result<()> {
    let md = generate_markdown(result, plan);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, md)
        .with_context(|| format!("failed to write markdown report to {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use cogdx_core::results::{
        BehaviorProfile, CalibrationResult, CompetencyDiagnosis, DiagnosisState, Evidence,
    };
    use cogdx_core::calculate_remediation_plan;

    fn make_result() -> DiagnosticResult {
        DiagnosticResult {
            attempt_id: "a1".into(),
            learner_id: "learner-7".into(),
            overall_score: 50,
            behavior_profile: BehaviorProfile {
                is_impulsive: true,
                rapid_guess_count: 3,
                ..Default::default()
            },
            calibration: CalibrationResult::default(),
            diagnoses: vec![
                CompetencyDiagnosis {
                    competency_id: "fractions".into(),
                    state: DiagnosisState::Gap,
                    evidence: Evidence {
                        reason: "incorrect answer | twice".into(),
                        confidence: 0.7,
                        source_question_ids: vec!["q1".into()],
                    },
                    misconception_id: None,
                    remedial_content_ids: vec!["fraction-bars".into()],
                },
                CompetencyDiagnosis {
                    competency_id: "ratios".into(),
                    state: DiagnosisState::Mastered,
                    evidence: Evidence {
                        reason: "correct with high confidence".into(),
                        confidence: 0.85,
                        source_question_ids: vec!["q2".into()],
                    },
                    misconception_id: None,
                    remedial_content_ids: vec![],
                },
            ],
            timestamp: Utc.with_ymd_and_hms(2026, 3, 1, 9, 30, 0).unwrap(),
        }
    }

    #[test]
    fn markdown_lists_diagnoses_and_plan() {
        let result = make_result();
        let plan = calculate_remediation_plan(&result);
        let md = generate_markdown(&result, &plan);

        assert!(md.contains("## Diagnosis for `learner-7`"));
        assert!(md.contains("2026-03-01 09:30:00 UTC"));
        assert!(md.contains("| fractions | GAP | 0.70 | incorrect answer \\| twice |"));
        assert!(md.contains("impulsive (3 rapid guesses)"));
        assert!(md.contains("1. `INSERT_NODE` on `fractions`"));
        assert!(md.contains("(content `fraction-bars`)"));
        assert!(md.contains("2. `UNLOCK_NEXT` on `ratios`"));
    }

    #[test]
    fn sections_and_plan_items_are_line_separated() {
        let result = make_result();
        let plan = calculate_remediation_plan(&result);
        let md = generate_markdown(&result, &plan);

        assert!(md.starts_with("## Diagnosis for `learner-7`\n\nAttempt `a1`"));
        assert!(md.contains("**Behavior:** impulsive (3 rapid guesses), inconsistent\n\n### Competencies"));
        let items: Vec<&str> = md
            .lines()
            .filter(|l| l.starts_with("1. ") || l.starts_with("2. "))
            .collect();
        assert_eq!(items.len(), 2);
        assert!(items[0].ends_with(&format!(": {}", plan[0].reason)));
        assert!(!items[1].contains("(content"));
        assert!(md.ends_with('\n'));
    }

    #[test]
    fn empty_plan_is_stated() {
        let result = make_result();
        let md = generate_markdown(&result, &[]);
        assert!(md.contains("No path changes."));
    }
}
