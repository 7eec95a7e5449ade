//! Metacognitive calibration: stated confidence against actual correctness.
//!
//! Implements an Expected Calibration Error over the four confidence bins,
//! plus blind-spot and fragile-knowledge counts.

use crate::config::EngineConfig;
use crate::model::{Confidence, StudentResponse};
use crate::quality::valid_responses;
use crate::results::{CalibrationResult, CalibrationStatus};

/// Per-bin tally for one confidence level.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ConfidenceBin {
    pub count: u32,
    pub correct: u32,
}

impl ConfidenceBin {
    /// Accuracy of the bin in percent.
    pub fn accuracy(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            100.0 * self.correct as f64 / self.count as f64
        }
    }
}

/// Tally valid responses into the four confidence bins, indexed like [`Confidence::ALL`].
pub fn bin_by_confidence<'a>(
    responses: impl IntoIterator<Item = &'a StudentResponse>,
) -> [ConfidenceBin; 4] {
    let mut bins = [ConfidenceBin::default(); 4];
    for r in responses {
        let bin = &mut bins[r.declared_confidence() as usize];
        bin.count += 1;
        if r.is_correct {
            bin.correct += 1;
        }
    }
    bins
}

/// Expected calibration error, before rounding.
///
/// ECE = Σ (bin size / total) × |bin accuracy − bin certainty| over non-empty bins.
pub fn expected_calibration_error(bins: &[ConfidenceBin; 4]) -> f64 {
    let total: u32 = bins.iter().map(|b| b.count).sum();
    if total == 0 {
        return 0.0;
    }
    Confidence::ALL
        .iter()
        .zip(bins)
        .filter(|(_, bin)| bin.count > 0)
        .map(|(level, bin)| {
            let weight = bin.count as f64 / total as f64;
            weight * (bin.accuracy() - level.certainty()).abs()
        })
        .sum()
}

/// Classify the certainty/accuracy gap.
pub fn classify(certainty: f64, accuracy: f64, margin: f64) -> CalibrationStatus {
    if certainty > accuracy + margin {
        CalibrationStatus::Overconfident
    } else if accuracy > certainty + margin {
        CalibrationStatus::Underconfident
    } else {
        CalibrationStatus::Calibrated
    }
}

/// Whether a response is fragile knowledge: correct, but held with low or
/// medium confidence or produced at an excessive cognitive cost.
pub fn is_fragile(response: &StudentResponse, config: &EngineConfig) -> bool {
    response.is_correct
        && (matches!(
            response.declared_confidence(),
            Confidence::Low | Confidence::Medium
        ) || response.telemetry.z() > config.toxic_doubt_z)
}

/// Whether a response is a blind spot: wrong, with high confidence.
pub fn is_blind_spot(response: &StudentResponse) -> bool {
    !response.is_correct && response.declared_confidence() == Confidence::High
}

/// Analyze calibration over a session.
///
/// Only quality-sufficient responses count. With none, the result is the
/// neutral default: calibrated and all zero.
pub fn analyze_calibration(responses: &[StudentResponse], config: &EngineConfig) -> CalibrationResult {
    let valid: Vec<&StudentResponse> = valid_responses(responses, config).collect();
    if valid.is_empty() {
        return CalibrationResult::default();
    }

    let bins = bin_by_confidence(valid.iter().copied());
    let total = valid.len() as f64;

    let (certainty_sum, accuracy_sum) = Confidence::ALL
        .iter()
        .zip(&bins)
        .filter(|(_, bin)| bin.count > 0)
        .fold((0.0, 0.0), |(cert, acc), (level, bin)| {
            (
                cert + level.certainty() * bin.count as f64,
                acc + bin.accuracy() * bin.count as f64,
            )
        });
    let certainty = certainty_sum / total;
    let accuracy = accuracy_sum / total;
    let ece = expected_calibration_error(&bins);

    let blind_spots = valid.iter().filter(|r| is_blind_spot(r)).count() as u32;
    let fragile_knowledge = valid.iter().filter(|r| is_fragile(r, config)).count() as u32;

    let result = CalibrationResult {
        certainty_average: certainty.round() as u32,
        accuracy_average: accuracy.round() as u32,
        ece_score: ece.round() as u32,
        calibration_status: classify(certainty, accuracy, config.calibration_margin),
        blind_spots,
        fragile_knowledge,
    };

    tracing::debug!(
        valid = valid.len(),
        ece = result.ece_score,
        status = %result.calibration_status,
        "calibration analyzed"
    );

    result
}
