// Amplitude-threshold burst detection
//
// 1. Analytic amplitude over `f_range` (filter edges kept), divided by its
//    median (or mean) so thresholds are relative to the recording
// 2. Dual-threshold hysteresis per sample: samples >= high seed a region,
//    regions grow in both directions while samples stay >= low
// 3. Regions shorter than `n_cycles_min` cycles of the lower band edge are dropped
// 4. A cycle is a burst candidate if any sample of its span
//    `[last_trough, next_trough]` is active; runs of candidates shorter than
//    `n_cycles_min` are discarded

use serde::{Deserialize, Serialize};

use super::{prune_short_runs, BurstDiagnostics, BurstLabel};
use crate::analysis::cycles::CycleGeometry;
use crate::config::{FilterLength, FrequencyBand};
use crate::dsp::filter::FilterSpec;
use crate::dsp::hilbert::{AmplitudeEstimator, AmplitudeOptions};
use crate::error::{ConfigError, PipelineError};

/// Reference level the amplitude envelope is divided by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Baseline {
    #[default]
    Median,
    Mean,
}

/// Thresholds for the `amp` strategy
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AmplitudeThresholds {
    /// `(low, high)` on the normalised envelope
    pub amp_threshes: (f64, f64),
    pub n_cycles_min: usize,
    pub baseline: Baseline,
    /// Bandpass length for the envelope estimate
    #[serde(flatten)]
    pub filter: FilterLength,
}

impl Default for AmplitudeThresholds {
    fn default() -> Self {
        Self {
            amp_threshes: (1.0, 2.0),
            n_cycles_min: 3,
            baseline: Baseline::Median,
            filter: FilterLength::default(),
        }
    }
}

impl AmplitudeThresholds {
    pub fn validate(&self, fs: f64, f_range: &FrequencyBand) -> Result<(), ConfigError> {
        let (low, high) = self.amp_threshes;
        if !(low.is_finite() && low >= 0.0) {
            return Err(ConfigError::InvalidThreshold {
                name: "amp_threshes.low".to_string(),
                value: low,
            });
        }
        if !(high.is_finite() && high >= low) {
            return Err(ConfigError::InvalidThreshold {
                name: "amp_threshes.high".to_string(),
                value: high,
            });
        }
        if self.n_cycles_min == 0 {
            return Err(ConfigError::InvalidThreshold {
                name: "n_cycles_min".to_string(),
                value: 0.0,
            });
        }
        FilterSpec::bandpass(*f_range, self.filter).n_taps(fs)?;
        Ok(())
    }

    /// Shortest hysteresis region kept, in samples
    pub fn min_region_samples(&self, fs: f64, f_range: &FrequencyBand) -> usize {
        (self.n_cycles_min as f64 * fs / f_range.low).ceil() as usize
    }
}

/// Label cycles with the amplitude strategy
pub fn detect_bursts_amp<A: AmplitudeEstimator + ?Sized>(
    cycles: &[CycleGeometry],
    signal: &[f64],
    fs: f64,
    f_range: FrequencyBand,
    thresholds: &AmplitudeThresholds,
    estimator: &A,
) -> Result<Vec<BurstLabel>, PipelineError> {
    let options = AmplitudeOptions {
        length: thresholds.filter,
        remove_edges: false,
        increase_n: false,
    };
    let envelope = estimator.amplitude(signal, fs, f_range, &options)?;
    let normalized = normalize(&envelope, thresholds.baseline);

    let (low, high) = thresholds.amp_threshes;
    let mut active = dual_threshold(&normalized, low, high);
    prune_short_runs(&mut active, thresholds.min_region_samples(fs, &f_range));

    let fractions: Vec<f64> = cycles
        .iter()
        .map(|cycle| {
            let span = &active[cycle.sample_last_trough..=cycle.sample_next_trough];
            span.iter().filter(|&&a| a).count() as f64 / span.len() as f64
        })
        .collect();

    let mut is_burst: Vec<bool> = fractions.iter().map(|&f| f > 0.0).collect();
    prune_short_runs(&mut is_burst, thresholds.n_cycles_min);

    tracing::debug!(
        "[BurstDetector] amp: {} of {} samples active",
        active.iter().filter(|&&a| a).count(),
        active.len()
    );

    Ok(fractions
        .into_iter()
        .zip(is_burst)
        .map(|(burst_fraction, is_burst)| BurstLabel {
            is_burst,
            diagnostics: BurstDiagnostics::Amp { burst_fraction },
        })
        .collect())
}

/// Divide by the median or mean of the finite values
pub fn normalize(envelope: &[f64], baseline: Baseline) -> Vec<f64> {
    let mut finite: Vec<f64> = envelope.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() {
        return vec![f64::NAN; envelope.len()];
    }

    let reference = match baseline {
        Baseline::Mean => finite.iter().sum::<f64>() / finite.len() as f64,
        Baseline::Median => {
            finite.sort_by(|a, b| a.total_cmp(b));
            let n = finite.len();
            if n % 2 == 1 {
                finite[n / 2]
            } else {
                (finite[n / 2 - 1] + finite[n / 2]) / 2.0
            }
        }
    };

    envelope.iter().map(|v| v / reference).collect()
}

/// Hysteresis mask: regions seeded at `>= high`, extended while `>= low`
pub fn dual_threshold(values: &[f64], low: f64, high: f64) -> Vec<bool> {
    let mut active = vec![false; values.len()];
    let mut i = 0;
    while i < values.len() {
        if !(values[i] >= low) {
            i += 1;
            continue;
        }
        // Maximal run at or above the low threshold
        let start = i;
        while i < values.len() && values[i] >= low {
            i += 1;
        }
        if values[start..i].iter().any(|&v| v >= high) {
            for flag in &mut active[start..i] {
                *flag = true;
            }
        }
    }
    active
}
