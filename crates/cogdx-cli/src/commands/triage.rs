//! The `cogdx triage` command.

use std::path::PathBuf;

use anyhow::Result;
use serde::Serialize;

use cogdx_core::calculate_remediation_plan;
use cogdx_core::config::load_config_from;
use cogdx_core::graph::{locker_for, ApplyReport, PathExecutor};
use cogdx_core::parser::{self, PathFile};
use cogdx_core::results::DiagnosticResult;
use cogdx_core::triage::PathMutation;
use cogdx_report::markdown::generate_markdown;

#[derive(Serialize)]
struct TriageOutput<'a> {
    attempt_id: &'a str,
    plan: &'a [PathMutation],
    #[serde(skip_serializing_if = "Option::is_none")]
    applied: Option<&'a ApplyReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<&'a PathFile>,
}

pub fn execute(
    result_path: PathBuf,
    learner_path: Option<PathBuf>,
    config_path: Option<PathBuf>,
    format: String,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let result = DiagnosticResult::load_json(&result_path)?;
    let plan = calculate_remediation_plan(&result);

    let applied = match &learner_path {
        Some(p) => {
            let file = parser::parse_learner_path(p)?;
            let mut path = file.learner_path();
            let executor = PathExecutor::new(locker_for(config.locking, file.graph()));
            let report = executor.apply_plan(&mut path, &plan);
            Some((report, file.with_path(&path)))
        }
        None => None,
    };

    match format.as_str() {
        "json" => {
            let output = TriageOutput {
                attempt_id: &result.attempt_id,
                plan: &plan,
                applied: applied.as_ref().map(|(report, _)| report),
                path: applied.as_ref().map(|(_, path)| path),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        "markdown" | "md" => {
            println!("{}", generate_markdown(&result, &plan));
        }
        _ => {
            // text format
            println!(
                "Remediation plan for {} ({} mutations)",
                result.learner_id,
                plan.len()
            );
            for (i, m) in plan.iter().enumerate() {
                println!(
                    "  {}. {} {} -> {}: {}",
                    i + 1,
                    m.action,
                    m.target_node_id,
                    m.metadata.new_status,
                    m.reason
                );
            }

            if let Some((report, file)) = &applied {
                println!(
                    "\nApplied {} of {} mutations",
                    report.applied(),
                    plan.len()
                );
                for s in &report.skipped {
                    println!(
                        "  skipped #{} {} {}: {}",
                        s.index + 1,
                        s.action,
                        s.target_node_id,
                        s.error
                    );
                }
                println!("\nPath:");
                for node in &file.nodes {
                    println!("  {:>6.2}  {:<40} {}", node.order, node.id, node.status);
                }
            }
        }
    }

    Ok(())
}
