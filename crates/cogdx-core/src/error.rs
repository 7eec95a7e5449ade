//! Path mutation error types.
//!
//! A failing mutation is logged and skipped by the executor; these errors
//! say why, so callers can tell a stale plan from a malformed one.

use thiserror::Error;

use crate::triage::MutationAction;

/// Errors raised while applying a single path mutation.
#[derive(Debug, Error, PartialEq)]
pub enum MutationError {
    /// No competency node in the learner path matches the target.
    #[error("target node not found: {0}")]
    NodeNotFound(String),

    /// An insertion carried no content to insert.
    #[error("{action} on {target} carries no content id")]
    MissingContent {
        action: MutationAction,
        target: String,
    },
}

impl MutationError {
    /// Returns `true` if retrying the same mutation against the same path cannot succeed.
    pub fn is_permanent(&self) -> bool {
        matches!(self, MutationError::MissingContent { .. })
    }
}
