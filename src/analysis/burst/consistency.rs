// Consistency-based burst detection
//
// Per-cycle scores, all in [0, 1]:
// - amp_fraction: share of cycles whose volt_amp is <= this cycle's
// - amp_consistency: smallest min/max ratio over the three rise/decay pairs
//   touching the cycle (own rise/decay, own rise vs previous decay, own decay
//   vs next rise)
// - period_consistency: smallest min/max ratio with the previous and next period
// - monotonicity: mean over the two flanks of the share of sample steps with
//   the flank's sign
//
// The first and last cycle lack a neighbour on one side: both consistency
// scores are NaN there and the cycle is never a burst.

use serde::{Deserialize, Serialize};

use super::{prune_short_runs, BurstDiagnostics, BurstLabel};
use crate::analysis::cycles::CycleGeometry;
use crate::error::ConfigError;

/// Thresholds for the `cycles` strategy
///
/// A cycle is a burst candidate when every score is strictly above its threshold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsistencyThresholds {
    pub amp_fraction_threshold: f64,
    pub amp_consistency_threshold: f64,
    pub period_consistency_threshold: f64,
    pub monotonicity_threshold: f64,
    pub n_cycles_min: usize,
}

impl Default for ConsistencyThresholds {
    fn default() -> Self {
        Self {
            amp_fraction_threshold: 0.0,
            amp_consistency_threshold: 0.5,
            period_consistency_threshold: 0.5,
            monotonicity_threshold: 0.8,
            n_cycles_min: 3,
        }
    }
}

impl ConsistencyThresholds {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let named = [
            ("amp_fraction_threshold", self.amp_fraction_threshold),
            ("amp_consistency_threshold", self.amp_consistency_threshold),
            ("period_consistency_threshold", self.period_consistency_threshold),
            ("monotonicity_threshold", self.monotonicity_threshold),
        ];
        for (name, value) in named {
            if !value.is_finite() {
                return Err(ConfigError::InvalidThreshold {
                    name: name.to_string(),
                    value,
                });
            }
        }
        if self.n_cycles_min == 0 {
            return Err(ConfigError::InvalidThreshold {
                name: "n_cycles_min".to_string(),
                value: 0.0,
            });
        }
        Ok(())
    }
}

/// Scores computed for one cycle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConsistencyScores {
    pub amp_fraction: f64,
    pub amp_consistency: f64,
    pub period_consistency: f64,
    pub monotonicity: f64,
}

impl ConsistencyScores {
    fn passes(&self, thresholds: &ConsistencyThresholds) -> bool {
        self.amp_fraction > thresholds.amp_fraction_threshold
            && self.amp_consistency > thresholds.amp_consistency_threshold
            && self.period_consistency > thresholds.period_consistency_threshold
            && self.monotonicity > thresholds.monotonicity_threshold
    }
}

/// Label cycles with the consistency strategy
pub fn detect_bursts_cycles(
    cycles: &[CycleGeometry],
    signal: &[f64],
    thresholds: &ConsistencyThresholds,
) -> Vec<BurstLabel> {
    let scores = consistency_scores(cycles, signal);
    let last = cycles.len().saturating_sub(1);

    let mut is_burst: Vec<bool> = scores
        .iter()
        .enumerate()
        .map(|(i, s)| i != 0 && i != last && s.passes(thresholds))
        .collect();
    prune_short_runs(&mut is_burst, thresholds.n_cycles_min);

    scores
        .into_iter()
        .zip(is_burst)
        .map(|(scores, is_burst)| BurstLabel {
            is_burst,
            diagnostics: BurstDiagnostics::Cycles(scores),
        })
        .collect()
}

/// Compute the four scores for every cycle
pub fn consistency_scores(cycles: &[CycleGeometry], signal: &[f64]) -> Vec<ConsistencyScores> {
    let n = cycles.len();
    let amps: Vec<f64> = cycles.iter().map(|c| c.volt_amp).collect();

    (0..n)
        .map(|i| {
            let cycle = &cycles[i];
            let interior = i > 0 && i + 1 < n;

            let amp_consistency = if interior {
                let (prev, next) = (&cycles[i - 1], &cycles[i + 1]);
                nan_min(
                    ratio(cycle.volt_rise, cycle.volt_decay),
                    nan_min(
                        ratio(cycle.volt_rise, prev.volt_decay),
                        ratio(cycle.volt_decay, next.volt_rise),
                    ),
                )
            } else {
                f64::NAN
            };

            let period_consistency = if interior {
                let period = cycle.period as f64;
                nan_min(
                    ratio(period, cycles[i - 1].period as f64),
                    ratio(period, cycles[i + 1].period as f64),
                )
            } else {
                f64::NAN
            };

            ConsistencyScores {
                amp_fraction: amp_fraction(&amps, cycle.volt_amp),
                amp_consistency,
                period_consistency,
                monotonicity: monotonicity(signal, cycle),
            }
        })
        .collect()
}

/// `min(a, b) / max(a, b)`
fn ratio(a: f64, b: f64) -> f64 {
    a.min(b) / a.max(b)
}

/// Minimum that propagates NaN
fn nan_min(a: f64, b: f64) -> f64 {
    if a.is_nan() || b.is_nan() {
        f64::NAN
    } else {
        a.min(b)
    }
}

/// Share of `amps` that are <= `value`
fn amp_fraction(amps: &[f64], value: f64) -> f64 {
    let at_or_below = amps.iter().filter(|&&a| a <= value).count();
    at_or_below as f64 / amps.len() as f64
}

/// Mean of rising-step share over `[last_trough, peak)` and falling-step
/// share over `[peak, next_trough)`; NaN if a flank has no steps.
fn monotonicity(signal: &[f64], cycle: &CycleGeometry) -> f64 {
    let rise = &signal[cycle.sample_last_trough..cycle.sample_peak];
    let decay = &signal[cycle.sample_peak..cycle.sample_next_trough];

    let rise_mono = step_share(rise, |d| d > 0.0);
    let decay_mono = step_share(decay, |d| d < 0.0);
    (rise_mono + decay_mono) / 2.0
}

fn step_share(segment: &[f64], expected: impl Fn(f64) -> bool) -> f64 {
    if segment.len() < 2 {
        return f64::NAN;
    }
    let matching = segment
        .windows(2)
        .filter(|pair| expected(pair[1] - pair[0]))
        .count();
    matching as f64 / (segment.len() - 1) as f64
}

#[cfg(test)]
#[path = "consistency_tests.rs"]
mod tests;
