//! The `cogdx init` command.

use std::path::Path;

use anyhow::{Context, Result};

pub fn execute() -> Result<()> {
    write_once(Path::new("cogdx.toml"), SAMPLE_CONFIG)?;

    std::fs::create_dir_all("sessions")?;
    write_once(Path::new("sessions/example.toml"), EXAMPLE_SESSION)?;

    std::fs::create_dir_all("paths")?;
    write_once(Path::new("paths/example.toml"), EXAMPLE_PATH)?;

    println!("\nNext steps:");
    println!("  1. Tune the thresholds in cogdx.toml");
    println!("  2. Run: cogdx validate --session sessions/example.toml");
    println!("  3. Run: cogdx evaluate --session sessions/example.toml --output results");
    println!("  4. Run: cogdx triage --result results/example-attempt.json --path paths/example.toml");

    Ok(())
}

fn write_once(path: &Path, content: &str) -> Result<()> {
    if path.exists() {
        println!("{} already exists, skipping.", path.display());
    } else {
        std::fs::write(path, content)
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("Created {}", path.display());
    }
    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# cogdx configuration

# A response faster than this share of its expected time is a rapid guess.
rapid_guess_fraction = 0.10
default_expected_time_ms = 10000

# Calibrated while |certainty - accuracy| stays within this many points.
calibration_margin = 15.0

# Temporal entropy = hesitations * hesitation_weight + revisits * revisit_weight
entropy_threshold = 2.0
hesitation_weight = 0.5
revisit_weight = 1.0

# Correct answers slower than this cohort z-score count as toxic doubt.
toxic_doubt_z = 2.0
consistency_tolerance = 0.2

# graph, linear or auto
locking = "graph"
"#;

const EXAMPLE_SESSION: &str = r#"[session]
attempt_id = "example-attempt"
learner_id = "example-learner"

[[questions]]
id = "q1"
competency_id = "fractions"
is_trap = true
trap_option_id = "q1-b"
misconception_id = "add-denominators"
dont_know_option_id = "q1-idk"
remedial_content_ids = ["fraction-bars"]

[[questions]]
id = "q2"
competency_id = "ratios"
dont_know_option_id = "q2-idk"
remedial_content_ids = ["ratio-tables"]

[[questions]]
id = "q3"
competency_id = "linear-equations"

[cohort.q3]
mean_ms = 15000.0
std_dev_ms = 3000.0

[[responses]]
question_id = "q1"
selected_option_id = "q1-b"
is_correct = false
confidence = "high"

[responses.telemetry]
time_ms = 14000
expected_time_ms = 20000

[[responses]]
question_id = "q2"
selected_option_id = "q2-idk"
is_correct = false
confidence = "none"

[responses.telemetry]
time_ms = 5000

[[responses]]
question_id = "q3"
selected_option_id = "q3-a"
is_correct = true
confidence = "medium"

[responses.telemetry]
time_ms = 13000
hesitation_count = 1
"#;

const EXAMPLE_PATH: &str = r#"[[nodes]]
id = "n-fractions"
competency_id = "fractions"
order = 1.0
status = "available"

[[nodes]]
id = "n-ratios"
competency_id = "ratios"
order = 2.0
status = "available"

[[nodes]]
id = "n-linear-equations"
competency_id = "linear-equations"
order = 3.0
status = "available"

[[nodes]]
id = "n-quadratics"
competency_id = "quadratics"
order = 4.0
status = "locked"

[[edges]]
from = "fractions"
to = "ratios"

[[edges]]
from = "ratios"
to = "linear-equations"
"#;
