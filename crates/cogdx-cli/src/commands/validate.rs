//! The `cogdx validate` command.

use std::path::PathBuf;

use anyhow::Result;

use cogdx_core::parser;

pub fn execute(session_path: PathBuf) -> Result<()> {
    let sessions = if session_path.is_dir() {
        parser::load_session_directory(&session_path)?
    } else {
        vec![parser::parse_session(&session_path)?]
    };

    let mut total_warnings = 0;

    for session in &sessions {
        println!(
            "Session: {} ({} questions, {} responses)",
            session.session.learner_id,
            session.questions.len(),
            session.responses.len()
        );

        let warnings = parser::validate_session(session);
        for w in &warnings {
            let prefix = w
                .question_id
                .as_ref()
                .map(|id| format!("  [{id}]"))
                .unwrap_or_else(|| "  ".to_string());
            println!("{prefix} WARNING: {}", w.message);
        }
        total_warnings += warnings.len();
    }

    if total_warnings == 0 {
        println!("All sessions valid.");
    } else {
        println!("\n{total_warnings} warning(s) found.");
    }

    Ok(())
}
