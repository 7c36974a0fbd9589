// Analysis module - cycle-by-cycle oscillation features
//
// Pipeline (one call, no shared state):
//   validate config -> reject empty / non-finite input
//   -> polarity (negate for trough-centred analysis)
//   -> optional lowpass -> extrema -> zero crossings
//   -> analytic amplitude -> cycle segmentation -> burst detection
//   -> CycleTable (trough-centred naming applied at export)
//
// Filtering and amplitude estimation are collaborators behind the
// `NarrowbandFilter` and `AmplitudeEstimator` traits so they can be swapped
// in tests.

pub mod burst;
pub mod cycles;
pub mod extrema;
pub mod table;
pub mod zerox;

pub use burst::{BurstDetection, BurstLabel, BurstMethod};
pub use cycles::CycleGeometry;
pub use extrema::Extrema;
pub use table::{CellValue, Cycle, CycleTable};
pub use zerox::ZeroCrossings;

use crate::config::{AnalysisConfig, Centering};
use crate::dsp::filter::{FilterSpec, FirFilter, NarrowbandFilter};
use crate::dsp::hilbert::{AmplitudeEstimator, AmplitudeOptions, HilbertAmplitude};
use crate::error::{log_analysis_error, log_config_error, AnalysisError, PipelineError};
use crate::telemetry::DiagnosticLog;

/// Feature extraction pipeline with pluggable filter and amplitude estimator
#[derive(Debug, Clone, Default)]
pub struct FeaturePipeline<F = FirFilter, A = HilbertAmplitude> {
    filter: F,
    estimator: A,
}

impl FeaturePipeline {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<F: NarrowbandFilter, A: AmplitudeEstimator> FeaturePipeline<F, A> {
    pub fn with_collaborators(filter: F, estimator: A) -> Self {
        Self { filter, estimator }
    }

    /// Compute the cycle table for `signal` sampled at `fs`
    pub fn compute(
        &self,
        signal: &[f64],
        fs: f64,
        config: &AnalysisConfig,
    ) -> Result<CycleTable, PipelineError> {
        config.validate(fs).map_err(|err| {
            log_config_error(&err, "FeaturePipeline::compute");
            err
        })?;
        check_signal(signal).map_err(|err| {
            log_analysis_error(&err, "FeaturePipeline::compute");
            err
        })?;

        let f_range = config.f_range;
        let mut log = DiagnosticLog::new();

        let mut working: Vec<f64> = match config.center_extrema {
            Centering::Peak => signal.to_vec(),
            Centering::Trough => signal.iter().map(|v| -v).collect(),
        };

        if let Some(pre) = &config.preprocess {
            let spec = FilterSpec::lowpass(pre.cutoff_hz, pre.filter);
            working = self.filter.filter(&working, fs, &spec)?;
        }

        let extrema = extrema::locate_extrema(
            &working,
            fs,
            f_range,
            &config.extrema,
            &self.filter,
            &mut log,
        )?;
        let crossings = zerox::locate_zero_crossings(&working, &extrema, &mut log);

        let options = AmplitudeOptions {
            length: config.amplitude.filter,
            remove_edges: config.amplitude.remove_edges,
            increase_n: config.amplitude.increase_n,
        };
        let amplitude = self.estimator.amplitude(&working, fs, f_range, &options)?;

        let geometry =
            cycles::segment_cycles(&working, &extrema, &crossings, &amplitude, &mut log)?;
        let labels = config.burst.detect(
            &geometry,
            &working,
            fs,
            f_range,
            &self.estimator,
            &mut log,
        )?;

        tracing::debug!(
            "[FeaturePipeline] {} samples @ {} Hz -> {} cycles ({} centred, {} diagnostics)",
            signal.len(),
            fs,
            geometry.len(),
            config.center_extrema,
            log.events().len()
        );

        Ok(CycleTable::new(
            config.center_extrema,
            config.burst.method(),
            geometry,
            labels,
            log.into_events(),
        ))
    }
}

/// Compute cycle features with the default FIR filter and Hilbert amplitude
pub fn compute_features(
    signal: &[f64],
    fs: f64,
    config: &AnalysisConfig,
) -> Result<CycleTable, PipelineError> {
    FeaturePipeline::new().compute(signal, fs, config)
}

fn check_signal(signal: &[f64]) -> Result<(), AnalysisError> {
    if signal.is_empty() {
        return Err(AnalysisError::EmptySignal);
    }
    if let Some(index) = signal.iter().position(|v| !v.is_finite()) {
        return Err(AnalysisError::NonFiniteSignal { index });
    }
    Ok(())
}
