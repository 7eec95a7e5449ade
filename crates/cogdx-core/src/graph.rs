//! In-memory learner path and a reference executor for remediation plans.
//!
//! Persisted graphs are mutated by an external executor; this one implements
//! the same contract against an in-memory path so plans can be previewed and
//! tested. Mutations for one learner must be applied serially and in order.

use std::collections::{HashMap, HashSet, VecDeque};

use serde::{Deserialize, Serialize};

use crate::config::LockingStrategy;
use crate::error::MutationError;
use crate::triage::{InsertPosition, MutationAction, NodeStatus, PathMutation};

/// A node in the learner's personalized path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathNode {
    pub id: String,
    pub competency_id: String,
    /// Fractional sort key; inserts go between neighbours without renumbering.
    pub order: f64,
    pub status: NodeStatus,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Set on remediation nodes: the node they were inserted for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remediates: Option<String>,
}

/// Prerequisite edge: `to` depends on `from`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub from: String,
    pub to: String,
}

/// Learner path with nodes kept sorted by `order`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LearnerPath {
    nodes: Vec<PathNode>,
}

impl LearnerPath {
    pub fn new(mut nodes: Vec<PathNode>) -> Self {
        nodes.sort_by(|a, b| a.order.total_cmp(&b.order));
        Self { nodes }
    }

    pub fn nodes(&self) -> &[PathNode] {
        &self.nodes
    }

    pub fn node(&self, id: &str) -> Option<&PathNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// The competency's own node, ignoring remediation nodes attached to it.
    pub fn competency_node(&self, competency_id: &str) -> Option<&PathNode> {
        self.nodes
            .iter()
            .find(|n| n.competency_id == competency_id && n.remediates.is_none())
    }

    fn competency_index(&self, competency_id: &str) -> Option<usize> {
        self.nodes
            .iter()
            .position(|n| n.competency_id == competency_id && n.remediates.is_none())
    }

    fn insert(&mut self, node: PathNode) {
        let at = self
            .nodes
            .iter()
            .position(|n| n.order > node.order)
            .unwrap_or(self.nodes.len());
        self.nodes.insert(at, node);
    }

    fn set_status(&mut self, id: &str, status: NodeStatus) {
        if let Some(node) = self.nodes.iter_mut().find(|n| n.id == id) {
            node.status = status;
        }
    }
}

/// Directed prerequisite graph over competencies.
#[derive(Debug, Clone, Default)]
pub struct PrerequisiteGraph {
    dependents: HashMap<String, Vec<String>>,
}

impl PrerequisiteGraph {
    pub fn new<'a>(edges: impl IntoIterator<Item = &'a Edge>) -> Self {
        let mut dependents: HashMap<String, Vec<String>> = HashMap::new();
        for edge in edges {
            dependents
                .entry(edge.from.clone())
                .or_default()
                .push(edge.to.clone());
        }
        Self { dependents }
    }

    pub fn is_empty(&self) -> bool {
        self.dependents.is_empty()
    }

    /// Every competency reachable from `root`, in BFS order, excluding `root`.
    /// Cycles are tolerated.
    pub fn descendants(&self, root: &str) -> Vec<String> {
        let mut seen: HashSet<&str> = HashSet::from([root]);
        let mut queue: VecDeque<&str> = VecDeque::from([root]);
        let mut out = Vec::new();

        while let Some(current) = queue.pop_front() {
            for next in self.dependents.get(current).into_iter().flatten() {
                if seen.insert(next.as_str()) {
                    out.push(next.clone());
                    queue.push_back(next.as_str());
                }
            }
        }
        out
    }
}

/// Decides which path nodes a quarantine on `root` must lock.
pub trait DownstreamLocker: Send + Sync {
    /// Strategy name, for logs.
    fn name(&self) -> &str;

    /// Ids of the nodes downstream of the competency `root`.
    fn downstream_nodes(&self, path: &LearnerPath, root: &str) -> Vec<String>;
}

/// Locks the transitive closure of `root` over prerequisite edges.
#[derive(Debug, Clone, Default)]
pub struct GraphLocker {
    graph: PrerequisiteGraph,
}

impl GraphLocker {
    pub fn new(graph: PrerequisiteGraph) -> Self {
        Self { graph }
    }
}

impl DownstreamLocker for GraphLocker {
    fn name(&self) -> &str {
        "graph"
    }

    fn downstream_nodes(&self, path: &LearnerPath, root: &str) -> Vec<String> {
        let closure: HashSet<String> = self.graph.descendants(root).into_iter().collect();
        path.nodes()
            .iter()
            .filter(|n| closure.contains(&n.competency_id))
            .map(|n| n.id.clone())
            .collect()
    }
}

/// Locks every node positioned strictly after `root`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearLocker;

impl DownstreamLocker for LinearLocker {
    fn name(&self) -> &str {
        "linear"
    }

    fn downstream_nodes(&self, path: &LearnerPath, root: &str) -> Vec<String> {
        let Some(anchor) = path.competency_node(root) else {
            return Vec::new();
        };
        path.nodes()
            .iter()
            .filter(|n| n.order > anchor.order)
            .map(|n| n.id.clone())
            .collect()
    }
}

/// Pick a locker for the configured strategy.
pub fn locker_for(strategy: LockingStrategy, graph: PrerequisiteGraph) -> Box<dyn DownstreamLocker> {
    match strategy {
        LockingStrategy::Graph => Box::new(GraphLocker::new(graph)),
        LockingStrategy::Linear => Box::new(LinearLocker),
        LockingStrategy::Auto if graph.is_empty() => {
            tracing::info!("no prerequisite edges, locking downstream linearly");
            Box::new(LinearLocker)
        }
        LockingStrategy::Auto => Box::new(GraphLocker::new(graph)),
    }
}

/// What applying one mutation changed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MutationOutcome {
    Inserted { node_id: String, order: f64 },
    /// The remediation node was already present; nothing changed.
    AlreadyPresent { node_id: String },
    Locked { node_ids: Vec<String> },
    Unlocked {
        completed: String,
        unlocked: Option<String>,
    },
}

/// A mutation the executor could not apply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedMutation {
    pub index: usize,
    pub action: MutationAction,
    pub target_node_id: String,
    pub error: String,
}

/// Result of applying a whole plan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApplyReport {
    pub outcomes: Vec<MutationOutcome>,
    pub skipped: Vec<SkippedMutation>,
}

impl ApplyReport {
    pub fn applied(&self) -> usize {
        self.outcomes.len()
    }
}

/// Applies path mutations against an in-memory learner path.
pub struct PathExecutor {
    locker: Box<dyn DownstreamLocker>,
}

impl PathExecutor {
    pub fn new(locker: Box<dyn DownstreamLocker>) -> Self {
        Self { locker }
    }

    /// Apply a plan serially and in order. A failing mutation is logged and
    /// skipped; mutations already applied stay applied.
    pub fn apply_plan(&self, path: &mut LearnerPath, plan: &[PathMutation]) -> ApplyReport {
        let mut report = ApplyReport::default();
        for (index, mutation) in plan.iter().enumerate() {
            match self.apply(path, mutation) {
                Ok(outcome) => report.outcomes.push(outcome),
                Err(e) => {
                    tracing::warn!(
                        index,
                        action = %mutation.action,
                        target = %mutation.target_node_id,
                        "skipping mutation: {e}"
                    );
                    report.skipped.push(SkippedMutation {
                        index,
                        action: mutation.action,
                        target_node_id: mutation.target_node_id.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }
        report
    }

    /// Apply a single mutation.
    pub fn apply(
        &self,
        path: &mut LearnerPath,
        mutation: &PathMutation,
    ) -> Result<MutationOutcome, MutationError> {
        let idx = path
            .competency_index(&mutation.target_node_id)
            .ok_or_else(|| MutationError::NodeNotFound(mutation.target_node_id.clone()))?;

        match mutation.action {
            MutationAction::InsertNode => insert_node(path, idx, mutation),
            MutationAction::LockDownstream => {
                let node_ids = self
                    .locker
                    .downstream_nodes(path, &mutation.target_node_id);
                for id in &node_ids {
                    path.set_status(id, mutation.metadata.new_status);
                }
                tracing::debug!(
                    root = %mutation.target_node_id,
                    strategy = self.locker.name(),
                    locked = node_ids.len(),
                    "downstream locked"
                );
                Ok(MutationOutcome::Locked { node_ids })
            }
            MutationAction::UnlockNext => {
                let quarantined = self.quarantined(path);

                let target = &mut path.nodes[idx];
                target.status = mutation.metadata.new_status;
                target.completed = true;
                let completed = target.id.clone();

                // nodes are sorted, so the successor is the next one with a larger key
                let order = path.nodes[idx].order;
                let next = path.nodes[idx + 1..].iter_mut().find(|n| n.order > order);
                let unlocked = match next {
                    Some(n) if quarantined.contains(&n.id) => {
                        tracing::debug!(
                            node = %n.id,
                            "successor stays locked under quarantine"
                        );
                        None
                    }
                    Some(n) if n.status == NodeStatus::Locked => {
                        n.status = NodeStatus::Available;
                        Some(n.id.clone())
                    }
                    _ => None,
                };
                Ok(MutationOutcome::Unlocked { completed, unlocked })
            }
        }
    }

    /// Nodes downstream of an unresolved misconception.
    fn quarantined(&self, path: &LearnerPath) -> HashSet<String> {
        path.nodes()
            .iter()
            .filter(|n| n.status == NodeStatus::Infected && n.remediates.is_some())
            .flat_map(|n| self.locker.downstream_nodes(path, &n.competency_id))
            .collect()
    }
}

fn insert_node(
    path: &mut LearnerPath,
    idx: usize,
    mutation: &PathMutation,
) -> Result<MutationOutcome, MutationError> {
    let content_id = mutation
        .metadata
        .content_id
        .clone()
        .ok_or_else(|| MutationError::MissingContent {
            action: mutation.action,
            target: mutation.target_node_id.clone(),
        })?;
    let target = &path.nodes[idx];
    let node_id = format!("{}::remediation::{}", target.id, content_id);
    if path.node(&node_id).is_some() {
        return Ok(MutationOutcome::AlreadyPresent { node_id });
    }

    // neighbours sharing the target's key cannot bound the new one
    let order = match mutation.metadata.position.unwrap_or(InsertPosition::Before) {
        InsertPosition::Before => {
            let prev = path.nodes[..idx]
                .iter()
                .rev()
                .map(|n| n.order)
                .find(|&o| o < target.order);
            match prev {
                Some(prev) => {
                    let mid = (prev + target.order) / 2.0;
                    if mid < target.order {
                        mid
                    } else {
                        prev
                    }
                }
                None => target.order - 0.5,
            }
        }
        InsertPosition::After => {
            let next = path.nodes[idx + 1..]
                .iter()
                .map(|n| n.order)
                .find(|&o| o > target.order);
            match next {
                Some(next) => {
                    let mid = (target.order + next) / 2.0;
                    if mid > target.order && mid < next {
                        mid
                    } else {
                        target.order
                    }
                }
                None => target.order + 0.5,
            }
        }
    };

    let node = PathNode {
        id: node_id.clone(),
        competency_id: target.competency_id.clone(),
        order,
        status: mutation.metadata.new_status,
        completed: false,
        content_id: Some(content_id),
        title: mutation.metadata.title.clone(),
        remediates: Some(target.id.clone()),
    };
    path.insert(node);
    Ok(MutationOutcome::Inserted { node_id, order })
}
