//! Engine configuration: every threshold the diagnosis pipeline uses.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// How `LOCK_DOWNSTREAM` decides which nodes sit downstream of a competency.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LockingStrategy {
    /// Transitive closure over the prerequisite graph.
    #[default]
    Graph,
    /// Everything positioned after the competency in the learner path.
    Linear,
    /// Graph when prerequisite edges exist, linear otherwise.
    Auto,
}

impl fmt::Display for LockingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LockingStrategy::Graph => write!(f, "graph"),
            LockingStrategy::Linear => write!(f, "linear"),
            LockingStrategy::Auto => write!(f, "auto"),
        }
    }
}

impl FromStr for LockingStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "graph" => Ok(LockingStrategy::Graph),
            "linear" => Ok(LockingStrategy::Linear),
            "auto" => Ok(LockingStrategy::Auto),
            other => Err(format!("unknown locking strategy: {other}")),
        }
    }
}

/// Thresholds for evidence filtering, calibration and profiling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// A response faster than this fraction of the expected time is a rapid guess.
    #[serde(default = "default_rapid_guess_fraction")]
    pub rapid_guess_fraction: f64,
    /// Expected time for items whose telemetry carries none.
    #[serde(default = "default_expected_time_ms")]
    pub default_expected_time_ms: u64,
    /// Points by which certainty and accuracy may differ and still count as calibrated.
    #[serde(default = "default_calibration_margin")]
    pub calibration_margin: f64,
    /// Temporal entropy above which a response signals anxiety.
    #[serde(default = "default_entropy_threshold")]
    pub entropy_threshold: f64,
    #[serde(default = "default_hesitation_weight")]
    pub hesitation_weight: f64,
    #[serde(default = "default_revisit_weight")]
    pub revisit_weight: f64,
    /// Z-score above which a correct answer cost too much to count as mastery.
    #[serde(default = "default_toxic_doubt_z")]
    pub toxic_doubt_z: f64,
    /// Largest share of flagged responses a consistent session may contain.
    #[serde(default = "default_consistency_tolerance")]
    pub consistency_tolerance: f64,
    /// Downstream locking strategy for the path executor.
    #[serde(default)]
    pub locking: LockingStrategy,
}

fn default_rapid_guess_fraction() -> f64 {
    0.10
}
fn default_expected_time_ms() -> u64 {
    10_000
}
fn default_calibration_margin() -> f64 {
    15.0
}
fn default_entropy_threshold() -> f64 {
    2.0
}
fn default_hesitation_weight() -> f64 {
    0.5
}
fn default_revisit_weight() -> f64 {
    1.0
}
fn default_toxic_doubt_z() -> f64 {
    2.0
}
fn default_consistency_tolerance() -> f64 {
    0.2
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            rapid_guess_fraction: default_rapid_guess_fraction(),
            default_expected_time_ms: default_expected_time_ms(),
            calibration_margin: default_calibration_margin(),
            entropy_threshold: default_entropy_threshold(),
            hesitation_weight: default_hesitation_weight(),
            revisit_weight: default_revisit_weight(),
            toxic_doubt_z: default_toxic_doubt_z(),
            consistency_tolerance: default_consistency_tolerance(),
            locking: LockingStrategy::default(),
        }
    }
}

impl EngineConfig {
    /// Reject values the pipeline cannot work with.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            self.rapid_guess_fraction > 0.0 && self.rapid_guess_fraction < 1.0,
            "rapid_guess_fraction must be in (0, 1), got {}",
            self.rapid_guess_fraction
        );
        anyhow::ensure!(
            self.default_expected_time_ms > 0,
            "default_expected_time_ms must be positive"
        );
        anyhow::ensure!(
            self.calibration_margin >= 0.0,
            "calibration_margin must not be negative"
        );
        anyhow::ensure!(
            self.entropy_threshold >= 0.0,
            "entropy_threshold must not be negative"
        );
        anyhow::ensure!(
            (0.0..=1.0).contains(&self.consistency_tolerance),
            "consistency_tolerance must be in [0, 1]"
        );
        Ok(())
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `cogdx.toml` in the current directory
/// 2. `~/.config/cogdx/config.toml`
///
/// Environment variable overrides: `COGDX_RAPID_GUESS_FRACTION`, `COGDX_LOCKING`.
pub fn load_config() -> Result<EngineConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<EngineConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("cogdx.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<EngineConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => EngineConfig::default(),
    };

    if let Ok(raw) = std::env::var("COGDX_RAPID_GUESS_FRACTION") {
        config.rapid_guess_fraction = raw
            .parse()
            .with_context(|| format!("invalid COGDX_RAPID_GUESS_FRACTION: {raw}"))?;
    }

    if let Ok(raw) = std::env::var("COGDX_LOCKING") {
        config.locking = raw.parse().map_err(|e: String| anyhow::anyhow!("{}", e))?;
    }

    config.validate()?;
    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("cogdx"))
}
