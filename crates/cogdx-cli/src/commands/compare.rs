//! The `cogdx compare` command.

use std::path::PathBuf;

use anyhow::Result;

use cogdx_core::results::DiagnosticResult;

pub fn execute(
    baseline_path: PathBuf,
    current_path: PathBuf,
    fail_on_regression: bool,
    format: String,
) -> Result<()> {
    let baseline = DiagnosticResult::load_json(&baseline_path)?;
    let current = DiagnosticResult::load_json(&current_path)?;

    if baseline.learner_id != current.learner_id {
        tracing::warn!(
            baseline = %baseline.learner_id,
            current = %current.learner_id,
            "comparing results of different learners"
        );
    }

    let report = current.compare(&baseline);

    match format.as_str() {
        "markdown" | "md" => {
            println!("{}", report.to_markdown());
        }
        "json" => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        _ => {
            // text format
            println!(
                "Comparison: {} regressions, {} improvements, {} unchanged",
                report.regressions.len(),
                report.improvements.len(),
                report.unchanged
            );
            println!(
                "Score {:+} points, calibration error {:+} points",
                report.score_delta, report.ece_delta
            );

            if !report.regressions.is_empty() {
                println!("\nRegressions:");
                for r in &report.regressions {
                    println!(
                        "  {} {} -> {}",
                        r.competency_id, r.baseline_state, r.current_state
                    );
                }
            }

            if !report.improvements.is_empty() {
                println!("\nImprovements:");
                for i in &report.improvements {
                    println!(
                        "  {} {} -> {}",
                        i.competency_id, i.baseline_state, i.current_state
                    );
                }
            }

            if report.newly_assessed > 0 {
                println!("\n{} newly assessed competency(ies)", report.newly_assessed);
            }
            if report.no_longer_assessed > 0 {
                println!("{} competency(ies) no longer assessed", report.no_longer_assessed);
            }
        }
    }

    if fail_on_regression && report.has_regressions() {
        std::process::exit(1);
    }

    Ok(())
}
