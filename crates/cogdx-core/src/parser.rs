//! Session and learner-path file parsing.
//!
//! Sessions are TOML or JSON (picked by extension) holding the Q-matrix,
//! optional cohort statistics and the learner's responses. Learner paths are
//! TOML holding nodes and prerequisite edges.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::graph::{Edge, LearnerPath, PathNode, PrerequisiteGraph};
use crate::model::{CohortStats, CohortTable, QMatrix, QMatrixEntry, StudentResponse};

/// Identifies the attempt and learner a session belongs to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionHeader {
    /// Attempt identifier; callers generate one when absent.
    #[serde(default)]
    pub attempt_id: Option<String>,
    pub learner_id: String,
}

/// A complete evaluation input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionFile {
    pub session: SessionHeader,
    #[serde(default)]
    pub questions: Vec<QMatrixEntry>,
    #[serde(default)]
    pub cohort: HashMap<String, CohortStats>,
    #[serde(default)]
    pub responses: Vec<StudentResponse>,
}

impl SessionFile {
    /// Build the Q-matrix lookup for this session.
    pub fn q_matrix(&self) -> QMatrix {
        QMatrix::new(self.questions.iter().cloned())
    }

    /// Cohort statistics, or `None` when the session carries none.
    pub fn cohort_table(&self) -> Option<&CohortTable> {
        (!self.cohort.is_empty()).then_some(&self.cohort)
    }
}

/// Parse a session file, choosing JSON or TOML by extension.
pub fn parse_session(path: &Path) -> Result<SessionFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read session file: {}", path.display()))?;
    parse_session_str(&content, path)
}

/// Parse session content; `source_path` picks the format and labels errors.
pub fn parse_session_str(content: &str, source_path: &Path) -> Result<SessionFile> {
    if source_path.extension().is_some_and(|ext| ext == "json") {
        serde_json::from_str(content)
            .with_context(|| format!("failed to parse JSON: {}", source_path.display()))
    } else {
        toml::from_str(content)
            .with_context(|| format!("failed to parse TOML: {}", source_path.display()))
    }
}

/// Recursively load every `.toml` and `.json` session file in a directory.
pub fn load_session_directory(dir: &Path) -> Result<Vec<SessionFile>> {
    let mut sessions = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    let mut entries = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
        .collect::<std::io::Result<Vec<_>>>()?;
    entries.sort_by_key(|e| e.path());

    for entry in entries {
        let path = entry.path();
        if path.is_dir() {
            sessions.extend(load_session_directory(&path)?);
        } else if path
            .extension()
            .is_some_and(|ext| ext == "toml" || ext == "json")
        {
            match parse_session(&path) {
                Ok(session) => sessions.push(session),
                Err(e) => {
                    tracing::warn!("skipping {}: {:#}", path.display(), e);
                }
            }
        }
    }

    Ok(sessions)
}

/// A learner path with its prerequisite edges.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PathFile {
    #[serde(default)]
    pub nodes: Vec<PathNode>,
    #[serde(default)]
    pub edges: Vec<Edge>,
}

impl PathFile {
    pub fn learner_path(&self) -> LearnerPath {
        LearnerPath::new(self.nodes.clone())
    }

    pub fn graph(&self) -> PrerequisiteGraph {
        PrerequisiteGraph::new(&self.edges)
    }

    /// Replace the nodes with the (mutated) path, keeping the edges.
    pub fn with_path(&self, path: &LearnerPath) -> PathFile {
        PathFile {
            nodes: path.nodes().to_vec(),
            edges: self.edges.clone(),
        }
    }
}

/// Parse a learner path TOML file.
pub fn parse_learner_path(path: &Path) -> Result<PathFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read path file: {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("failed to parse TOML: {}", path.display()))
}

/// A warning from session validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The question ID (if applicable).
    pub question_id: Option<String>,
    /// Warning message.
    pub message: String,
}

impl ValidationWarning {
    fn question(id: &str, message: impl Into<String>) -> Self {
        Self {
            question_id: Some(id.to_string()),
            message: message.into(),
        }
    }
}

/// Validate a session for common authoring mistakes.
pub fn validate_session(session: &SessionFile) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    let mut seen_ids = HashSet::new();
    for q in &session.questions {
        if !seen_ids.insert(q.id.as_str()) {
            warnings.push(ValidationWarning::question(
                &q.id,
                format!("duplicate question ID: {}", q.id),
            ));
        }
    }

    for q in &session.questions {
        if q.is_trap && q.trap_option_id.is_none() {
            warnings.push(ValidationWarning::question(
                &q.id,
                "is_trap is true but no trap_option_id provided",
            ));
        }
        if q.is_trap && q.misconception_id.is_none() {
            warnings.push(ValidationWarning::question(
                &q.id,
                "trap has no misconception_id; misconceptions will be remediated as gaps",
            ));
        }
        if q.dont_know_option_id.is_some() && q.dont_know_option_id == q.trap_option_id {
            warnings.push(ValidationWarning::question(
                &q.id,
                "dont_know_option_id is the same as trap_option_id",
            ));
        }
    }

    for r in &session.responses {
        if !seen_ids.contains(r.question_id.as_str()) {
            warnings.push(ValidationWarning::question(
                &r.question_id,
                "response references a question missing from the Q-matrix",
            ));
        }
    }

    let mut cohort: Vec<_> = session.cohort.iter().collect();
    cohort.sort_by(|a, b| a.0.cmp(b.0));
    for (id, stats) in cohort {
        if stats.std_dev_ms <= 0.0 {
            warnings.push(ValidationWarning::question(
                id,
                "cohort std_dev_ms is not positive; z-scores will be 0",
            ));
        }
    }

    if session.responses.is_empty() {
        warnings.push(ValidationWarning {
            question_id: None,
            message: "session has no responses".into(),
        });
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Confidence;
    use crate::triage::NodeStatus;
    use std::path::PathBuf;

    const VALID_TOML: &str = r#"
[session]
attempt_id = "attempt-1"
learner_id = "learner-7"

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

[cohort.q1]
mean_ms = 12000.0
std_dev_ms = 3000.0

[[responses]]
question_id = "q1"
selected_option_id = "q1-b"
is_correct = false
confidence = "high"

[responses.telemetry]
time_ms = 9000
hesitation_count = 1
expected_time_ms = 15000

[[responses]]
question_id = "q2"
selected_option_id = "q2-a"
is_correct = true
confidence = "medium"

[responses.telemetry]
time_ms = 7000
"#;

    #[test]
    fn parse_valid_toml() {
        let session = parse_session_str(VALID_TOML, &PathBuf::from("s.toml")).unwrap();
        assert_eq!(session.session.learner_id, "learner-7");
        assert_eq!(session.questions.len(), 2);
        assert_eq!(session.responses.len(), 2);
        assert_eq!(session.responses[0].confidence, Confidence::High);
        assert_eq!(session.responses[0].telemetry.expected_time_ms, Some(15_000));
        assert!(session.cohort_table().is_some());
        assert_eq!(
            session.q_matrix().get("q1").unwrap().misconception_id.as_deref(),
            Some("add-denominators")
        );
        assert!(validate_session(&session).is_empty());
    }

    #[test]
    fn parse_json_by_extension() {
        let json = r#"{
            "session": {"learner_id": "l1"},
            "questions": [{"id": "q1", "competency_id": "c1"}],
            "responses": [{"question_id": "q1", "is_correct": true, "telemetry": {"time_ms": 5000}}]
        }"#;
        let session = parse_session_str(json, &PathBuf::from("s.json")).unwrap();
        assert!(session.session.attempt_id.is_none());
        assert!(session.cohort_table().is_none());
    }

    #[test]
    fn parse_malformed_toml() {
        let result = parse_session_str("this is not [valid toml }{", &PathBuf::from("bad.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn validate_flags_authoring_mistakes() {
        let toml = r#"
[session]
learner_id = "l1"

[[questions]]
id = "q1"
competency_id = "c1"
is_trap = true

[[questions]]
id = "q1"
competency_id = "c2"

[cohort.q1]
mean_ms = 1000.0
std_dev_ms = 0.0

[[responses]]
question_id = "ghost"
is_correct = true

[responses.telemetry]
time_ms = 4000
"#;
        let session = parse_session_str(toml, &PathBuf::from("s.toml")).unwrap();
        let messages: Vec<String> = validate_session(&session)
            .into_iter()
            .map(|w| w.message)
            .collect();
        assert!(messages.iter().any(|m| m.contains("duplicate")));
        assert!(messages.iter().any(|m| m.contains("no trap_option_id")));
        assert!(messages.iter().any(|m| m.contains("no misconception_id")));
        assert!(messages.iter().any(|m| m.contains("missing from the Q-matrix")));
        assert!(messages.iter().any(|m| m.contains("std_dev_ms")));
    }

    #[test]
    fn load_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.toml"), VALID_TOML).unwrap();
        std::fs::write(dir.path().join("broken.toml"), "nope = [").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let sessions = load_session_directory(dir.path()).unwrap();
        assert_eq!(sessions.len(), 1);
    }

    #[test]
    fn parse_path_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("path.toml");
        std::fs::write(
            &file,
            r#"
[[nodes]]
id = "n2"
competency_id = "ratios"
order = 2.0
status = "locked"

[[nodes]]
id = "n1"
competency_id = "fractions"
order = 1.0
status = "available"

[[edges]]
from = "fractions"
to = "ratios"
"#,
        )
        .unwrap();

        let parsed = parse_learner_path(&file).unwrap();
        let path = parsed.learner_path();
        assert_eq!(path.nodes()[0].id, "n1");
        assert_eq!(path.nodes()[1].status, NodeStatus::Locked);
        assert_eq!(parsed.graph().descendants("fractions"), vec!["ratios"]);
    }
}
