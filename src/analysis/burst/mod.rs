// Burst detection - labels each cycle as part of a sustained oscillation or not
//
// Two strategies, each owning its threshold schema:
// - `cycles`: temporal consistency of neighbouring cycles (amplitude rank,
//   amplitude and period consistency, flank monotonicity)
// - `amp`: dual-threshold hysteresis on the normalised analytic amplitude
//
// Both finish with the same run-length rule: runs of burst cycles shorter
// than `n_cycles_min` are discarded.
//
// Neither strategy has universally valid defaults. When thresholds are
// missing the built-in ones are used and a `MissingBurstConfig` diagnostic
// is recorded.

pub mod amplitude;
pub mod consistency;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use amplitude::{detect_bursts_amp, AmplitudeThresholds, Baseline};
pub use consistency::{detect_bursts_cycles, ConsistencyScores, ConsistencyThresholds};

use crate::analysis::cycles::CycleGeometry;
use crate::config::FrequencyBand;
use crate::dsp::hilbert::AmplitudeEstimator;
use crate::error::{ConfigError, PipelineError};
use crate::telemetry::{DiagnosticEvent, DiagnosticLog};

/// Strategy selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BurstMethod {
    Cycles,
    Amp,
}

impl FromStr for BurstMethod {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cycles" => Ok(BurstMethod::Cycles),
            "amp" => Ok(BurstMethod::Amp),
            other => Err(ConfigError::UnknownBurstMethod {
                name: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for BurstMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BurstMethod::Cycles => write!(f, "cycles"),
            BurstMethod::Amp => write!(f, "amp"),
        }
    }
}

/// Selected strategy with its (optional) thresholds
///
/// JSON: `{"method": "cycles", "thresholds": {...}}`; `thresholds` may be omitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum BurstDetection {
    Cycles {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        thresholds: Option<ConsistencyThresholds>,
    },
    Amp {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        thresholds: Option<AmplitudeThresholds>,
    },
}

impl Default for BurstDetection {
    fn default() -> Self {
        BurstDetection::Cycles { thresholds: None }
    }
}

impl BurstDetection {
    pub fn cycles(thresholds: ConsistencyThresholds) -> Self {
        BurstDetection::Cycles {
            thresholds: Some(thresholds),
        }
    }

    pub fn amp(thresholds: AmplitudeThresholds) -> Self {
        BurstDetection::Amp {
            thresholds: Some(thresholds),
        }
    }

    /// Strategy with no thresholds; running it records a diagnostic
    pub fn unconfigured(method: BurstMethod) -> Self {
        match method {
            BurstMethod::Cycles => BurstDetection::Cycles { thresholds: None },
            BurstMethod::Amp => BurstDetection::Amp { thresholds: None },
        }
    }

    pub fn method(&self) -> BurstMethod {
        match self {
            BurstDetection::Cycles { .. } => BurstMethod::Cycles,
            BurstDetection::Amp { .. } => BurstMethod::Amp,
        }
    }

    pub fn is_unconfigured(&self) -> bool {
        match self {
            BurstDetection::Cycles { thresholds } => thresholds.is_none(),
            BurstDetection::Amp { thresholds } => thresholds.is_none(),
        }
    }

    pub fn validate(&self, fs: f64, f_range: &FrequencyBand) -> Result<(), ConfigError> {
        match self {
            BurstDetection::Cycles { thresholds } => {
                thresholds.unwrap_or_default().validate()
            }
            BurstDetection::Amp { thresholds } => {
                thresholds.unwrap_or_default().validate(fs, f_range)
            }
        }
    }

    /// Label every cycle
    ///
    /// `signal` is the (possibly negated) signal the cycles were measured on.
    pub fn detect<A: AmplitudeEstimator + ?Sized>(
        &self,
        cycles: &[CycleGeometry],
        signal: &[f64],
        fs: f64,
        f_range: FrequencyBand,
        estimator: &A,
        log: &mut DiagnosticLog,
    ) -> Result<Vec<BurstLabel>, PipelineError> {
        if self.is_unconfigured() {
            log.record(DiagnosticEvent::MissingBurstConfig {
                method: self.method(),
            });
        }

        let labels = match self {
            BurstDetection::Cycles { thresholds } => {
                detect_bursts_cycles(cycles, signal, &thresholds.unwrap_or_default())
            }
            BurstDetection::Amp { thresholds } => detect_bursts_amp(
                cycles,
                signal,
                fs,
                f_range,
                &thresholds.unwrap_or_default(),
                estimator,
            )?,
        };

        tracing::debug!(
            "[BurstDetector] method={} bursts={}/{}",
            self.method(),
            labels.iter().filter(|l| l.is_burst).count(),
            labels.len()
        );
        Ok(labels)
    }
}

/// Strategy-specific per-cycle scores
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum BurstDiagnostics {
    Cycles(ConsistencyScores),
    Amp { burst_fraction: f64 },
}

/// Burst result attached to one cycle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BurstLabel {
    pub is_burst: bool,
    pub diagnostics: BurstDiagnostics,
}

/// Clear every run of `true` shorter than `min_len`
pub fn prune_short_runs(flags: &mut [bool], min_len: usize) {
    let mut i = 0;
    while i < flags.len() {
        if !flags[i] {
            i += 1;
            continue;
        }
        let start = i;
        while i < flags.len() && flags[i] {
            i += 1;
        }
        if i - start < min_len {
            for flag in &mut flags[start..i] {
                *flag = false;
            }
        }
    }
}

/// Lengths of the maximal runs of `true`
pub fn run_lengths(flags: &[bool]) -> Vec<usize> {
    let mut runs = Vec::new();
    let mut current = 0;
    for &flag in flags {
        if flag {
            current += 1;
        } else if current > 0 {
            runs.push(current);
            current = 0;
        }
    }
    if current > 0 {
        runs.push(current);
    }
    runs
}
