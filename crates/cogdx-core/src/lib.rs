//! cogdx-core: diagnostic inference and remediation planning.
//!
//! Turns a batch of learner answers with behavioral telemetry into a
//! per-competency diagnosis, a metacognitive calibration report and an
//! ordered plan of mutations for the learner's knowledge-graph path.
//! The evaluation and triage functions are pure and synchronous.

pub mod behavior;
pub mod calibration;
pub mod competency;
pub mod config;
pub mod engine;
pub mod error;
pub mod graph;
pub mod model;
pub mod parser;
pub mod preprocess;
pub mod quality;
pub mod report;
pub mod results;
pub mod triage;

pub use engine::{evaluate_session, SessionEvaluator};
pub use triage::calculate_remediation_plan;
