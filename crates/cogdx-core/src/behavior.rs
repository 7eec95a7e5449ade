//! Behavioral archetype from session-wide telemetry.

use crate::config::EngineConfig;
use crate::model::StudentResponse;
use crate::quality::is_rapid_guess;
use crate::results::BehaviorProfile;

/// Temporal entropy of a response: weighted hesitations plus revisits.
pub fn temporal_entropy(response: &StudentResponse, config: &EngineConfig) -> f64 {
    let t = &response.telemetry;
    t.hesitation_count as f64 * config.hesitation_weight
        + t.revisit_count.unwrap_or(0) as f64 * config.revisit_weight
}

/// Correct, but far slower than the cohort.
pub fn is_fragile_certainty(response: &StudentResponse, config: &EngineConfig) -> bool {
    response.is_correct && response.telemetry.z() > config.toxic_doubt_z
}

/// Build the behavior profile over every response, filtered or not.
///
/// `is_consistent` holds when the session has responses and the share of
/// responses carrying any impulsive or anxious signal stays within
/// `consistency_tolerance`. A single flagged response can therefore mark the
/// session impulsive or anxious while it still reads as consistent overall.
pub fn profile_behavior(responses: &[StudentResponse], config: &EngineConfig) -> BehaviorProfile {
    let mut profile = BehaviorProfile::default();
    let mut flagged = 0u32;

    for r in responses {
        let rapid = is_rapid_guess(r, config);
        let entropic = temporal_entropy(r, config) > config.entropy_threshold;
        let fragile = is_fragile_certainty(r, config);

        profile.rapid_guess_count += rapid as u32;
        profile.high_entropy_count += entropic as u32;
        profile.fragile_certainty_count += fragile as u32;
        if rapid || entropic || fragile {
            flagged += 1;
        }
    }

    profile.is_impulsive = profile.rapid_guess_count > 0;
    profile.is_anxious = profile.high_entropy_count > 0 || profile.fragile_certainty_count > 0;
    profile.is_consistent = !responses.is_empty()
        && (flagged as f64 / responses.len() as f64) <= config.consistency_tolerance;
    profile
}
