//! Per-call diagnostics collector.
//!
//! Each `compute_features` call owns one `DiagnosticLog`. Events are
//! mirrored to `tracing` as they are recorded and then handed over to the
//! cycle table, so nothing is shared between calls.

use std::collections::HashMap;

use crate::error::AnalysisError;

pub mod events;

pub use events::{DiagnosticEvent, Stage};

/// Ordered record of the diagnostics raised during one analysis.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct DiagnosticLog {
    events: Vec<DiagnosticEvent>,
}

impl DiagnosticLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an event and emit it through `tracing`.
    pub fn record(&mut self, event: DiagnosticEvent) {
        if event.is_warning() {
            match &event {
                DiagnosticEvent::MissingBurstConfig { method } => tracing::warn!(
                    "[BurstDetector] No burst detection parameters provided for method '{}'. \
                     Default thresholds are likely not suited to this data; \
                     choose thresholds explicitly.",
                    method
                ),
                DiagnosticEvent::NoZeroCrossing {
                    flank,
                    start,
                    fallback,
                    ..
                } => {
                    let err = AnalysisError::NoZeroCrossing {
                        flank: *flank,
                        index: *start,
                    };
                    tracing::warn!(
                        stage = ?event.stage(),
                        "[ZeroCrossingLocalizer] {}; using sample {}",
                        err,
                        fallback
                    )
                }
                other => tracing::warn!(stage = ?other.stage(), "[Diagnostics] {:?}", other),
            }
        } else {
            tracing::debug!(stage = ?event.stage(), "[Diagnostics] {:?}", event);
        }
        self.events.push(event);
    }

    pub fn events(&self) -> &[DiagnosticEvent] {
        &self.events
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Number of recorded events per stage.
    pub fn counts_by_stage(&self) -> HashMap<Stage, usize> {
        let mut counts = HashMap::new();
        for event in &self.events {
            *counts.entry(event.stage()).or_insert(0) += 1;
        }
        counts
    }

    pub fn into_events(self) -> Vec<DiagnosticEvent> {
        self.events
    }
}
