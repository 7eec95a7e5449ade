//! The `cogdx evaluate` command.

use std::path::PathBuf;

use anyhow::Result;

use cogdx_core::config::load_config_from;
use cogdx_core::parser;
use cogdx_core::results::DiagnosticResult;
use cogdx_core::{calculate_remediation_plan, SessionEvaluator};
use cogdx_report::html::write_html_report;
use cogdx_report::markdown::write_markdown_report;

pub fn execute(
    session_path: PathBuf,
    config_path: Option<PathBuf>,
    output: PathBuf,
    format: String,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let session = parser::parse_session(&session_path)?;

    for w in parser::validate_session(&session) {
        let prefix = w
            .question_id
            .as_ref()
            .map(|id| format!("[{id}] "))
            .unwrap_or_default();
        eprintln!("Warning: {prefix}{}", w.message);
    }

    let attempt_id = session
        .session
        .attempt_id
        .clone()
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    eprintln!(
        "cogdx v{}: evaluating {} responses against {} questions",
        env!("CARGO_PKG_VERSION"),
        session.responses.len(),
        session.questions.len()
    );

    let evaluator = SessionEvaluator::new(config);
    let result = evaluator.evaluate_session(
        &attempt_id,
        &session.session.learner_id,
        &session.responses,
        &session.q_matrix(),
        session.cohort_table(),
    );
    let plan = calculate_remediation_plan(&result);

    print_summary(&result);

    std::fs::create_dir_all(&output)?;

    let formats: Vec<&str> = if format == "all" {
        vec!["json", "html", "markdown"]
    } else {
        format.split(',').map(str::trim).collect()
    };

    for fmt in &formats {
        match *fmt {
            "json" => {
                let path = output.join(format!("{attempt_id}.json"));
                result.save_json(&path)?;
                eprintln!("Result saved to: {}", path.display());
            }
            "html" => {
                let path = output.join(format!("{attempt_id}.html"));
                write_html_report(&result, &plan, &path)?;
                eprintln!("HTML report: {}", path.display());
            }
            "markdown" | "md" => {
                let path = output.join(format!("{attempt_id}.md"));
                write_markdown_report(&result, &plan, &path)?;
                eprintln!("Markdown report: {}", path.display());
            }
            _ => {
                eprintln!("Unknown format: {fmt}");
            }
        }
    }

    Ok(())
}

fn print_summary(result: &DiagnosticResult) {
    use comfy_table::{Cell, Table};

    let mut table = Table::new();
    table.set_header(vec!["Competency", "State", "Confidence", "Evidence"]);

    for d in &result.diagnoses {
        table.add_row(vec![
            Cell::new(&d.competency_id),
            Cell::new(d.state),
            Cell::new(format!("{:.2}", d.evidence.confidence)),
            Cell::new(&d.evidence.reason),
        ]);
    }

    let cal = &result.calibration;
    let profile = &result.behavior_profile;
    println!(
        "Learner {} scored {}% (attempt {})",
        result.learner_id, result.overall_score, result.attempt_id
    );
    println!(
        "Calibration: {} (certainty {}%, accuracy {}%, ECE {})",
        cal.calibration_status, cal.certainty_average, cal.accuracy_average, cal.ece_score
    );
    println!(
        "Behavior: impulsive={} anxious={} consistent={}",
        profile.is_impulsive, profile.is_anxious, profile.is_consistent
    );
    println!("{table}");
}
