//! Structured diagnostic events raised while a recording is analysed.
//!
//! Events are non-fatal: the pipeline records them and keeps going. They are
//! attached to the resulting cycle table and serialized alongside it.

use serde::{Deserialize, Serialize};

use crate::analysis::burst::BurstMethod;
use crate::error::Flank;

/// Pipeline stage that raised an event.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Extrema,
    ZeroCrossings,
    Segmentation,
    BurstDetection,
}

/// Non-fatal diagnostics with their context.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum DiagnosticEvent {
    /// Burst detection ran on built-in thresholds the caller never chose.
    MissingBurstConfig { method: BurstMethod },
    /// A flank never crossed its half-amplitude level; the flank centre was used.
    NoZeroCrossing {
        flank: Flank,
        start: usize,
        end: usize,
        fallback: usize,
    },
    /// Extrema dropped because they fell inside the configured boundary.
    ExtremaOutsideBoundary { dropped: usize, boundary: usize },
    /// A cycle had no finite amplitude samples (e.g. inside removed filter edges).
    UndefinedBandAmplitude { cycle: usize },
}

impl DiagnosticEvent {
    pub fn stage(&self) -> Stage {
        match self {
            DiagnosticEvent::MissingBurstConfig { .. } => Stage::BurstDetection,
            DiagnosticEvent::NoZeroCrossing { .. } => Stage::ZeroCrossings,
            DiagnosticEvent::ExtremaOutsideBoundary { .. } => Stage::Extrema,
            DiagnosticEvent::UndefinedBandAmplitude { .. } => Stage::Segmentation,
        }
    }

    /// Whether the event should be surfaced at warn level.
    ///
    /// Boundary trimming and undefined edge amplitudes are expected with the
    /// default settings and only logged at debug level.
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            DiagnosticEvent::MissingBurstConfig { .. } | DiagnosticEvent::NoZeroCrossing { .. }
        )
    }
}
