//! Triage: map a diagnostic result onto a remediation plan.
//!
//! Policy per diagnosis, in stored order:
//!
//! - `MISCONCEPTION` with a misconception id: insert a disinfection node before
//!   the competency, then quarantine everything downstream of it.
//! - `GAP`: insert a reinforcement node before the competency.
//! - `MASTERED`: complete the competency and unlock its successor.
//! - `UNKNOWN`: nothing.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::results::{CompetencyDiagnosis, DiagnosisState, DiagnosticResult};

/// What a mutation does to the learner path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MutationAction {
    InsertNode,
    LockDownstream,
    UnlockNext,
}

impl fmt::Display for MutationAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MutationAction::InsertNode => write!(f, "INSERT_NODE"),
            MutationAction::LockDownstream => write!(f, "LOCK_DOWNSTREAM"),
            MutationAction::UnlockNext => write!(f, "UNLOCK_NEXT"),
        }
    }
}

/// Where an inserted node goes relative to its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InsertPosition {
    Before,
    After,
}

/// Status of a node in the learner path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    Locked,
    Available,
    Completed,
    Infected,
    Mastered,
}

impl fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeStatus::Locked => write!(f, "locked"),
            NodeStatus::Available => write!(f, "available"),
            NodeStatus::Completed => write!(f, "completed"),
            NodeStatus::Infected => write!(f, "infected"),
            NodeStatus::Mastered => write!(f, "mastered"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MutationMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<InsertPosition>,
    pub new_status: NodeStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// One instruction for the path executor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathMutation {
    pub action: MutationAction,
    /// Competency node the mutation is anchored on.
    pub target_node_id: String,
    pub reason: String,
    pub metadata: MutationMetadata,
}

impl PathMutation {
    fn insert(
        target: &str,
        reason: String,
        status: NodeStatus,
        content_id: String,
        title: String,
    ) -> Self {
        Self {
            action: MutationAction::InsertNode,
            target_node_id: target.to_string(),
            reason,
            metadata: MutationMetadata {
                position: Some(InsertPosition::Before),
                new_status: status,
                content_id: Some(content_id),
                title: Some(title),
            },
        }
    }

    fn status_change(action: MutationAction, target: &str, reason: String, status: NodeStatus) -> Self {
        Self {
            action,
            target_node_id: target.to_string(),
            reason,
            metadata: MutationMetadata {
                position: None,
                new_status: status,
                content_id: None,
                title: None,
            },
        }
    }
}

/// Mutations for a single diagnosis.
pub fn mutations_for(diagnosis: &CompetencyDiagnosis) -> Vec<PathMutation> {
    let target = diagnosis.competency_id.as_str();
    match (diagnosis.state, diagnosis.misconception_id.as_deref()) {
        (DiagnosisState::Misconception, Some(misconception)) => vec![
            PathMutation::insert(
                target,
                format!("misconception '{misconception}' detected: {}", diagnosis.evidence.reason),
                NodeStatus::Infected,
                misconception.to_string(),
                format!("Disinfection protocol: {misconception}"),
            ),
            PathMutation::status_change(
                MutationAction::LockDownstream,
                target,
                format!("cognitive quarantine until '{misconception}' is resolved"),
                NodeStatus::Locked,
            ),
        ],
        (DiagnosisState::Misconception, None) => {
            tracing::warn!(
                competency = target,
                "misconception without an id, planning reinforcement instead"
            );
            vec![reinforcement(diagnosis)]
        }
        (DiagnosisState::Gap, _) => vec![reinforcement(diagnosis)],
        (DiagnosisState::Mastered, _) => vec![PathMutation::status_change(
            MutationAction::UnlockNext,
            target,
            format!("competency mastered: {}", diagnosis.evidence.reason),
            NodeStatus::Mastered,
        )],
        (DiagnosisState::Unknown, _) => Vec::new(),
    }
}

fn reinforcement(diagnosis: &CompetencyDiagnosis) -> PathMutation {
    let target = diagnosis.competency_id.as_str();
    let content = diagnosis
        .remedial_content_ids
        .first()
        .cloned()
        .unwrap_or_else(|| target.to_string());
    PathMutation::insert(
        target,
        format!("knowledge gap: {}", diagnosis.evidence.reason),
        NodeStatus::Available,
        content,
        format!("Reinforcement: {target}"),
    )
}

/// Build the ordered remediation plan for a diagnostic result.
///
/// The plan must be applied serially, in order, for a given learner.
pub fn calculate_remediation_plan(result: &DiagnosticResult) -> Vec<PathMutation> {
    let plan: Vec<PathMutation> = result.diagnoses.iter().flat_map(mutations_for).collect();
    tracing::debug!(
        attempt = %result.attempt_id,
        mutations = plan.len(),
        "remediation plan calculated"
    );
    plan
}
