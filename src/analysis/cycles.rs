// Cycle segmentation - one geometry record per peak-centred cycle
//
// With troughs t_0 < p_0 < t_1 < p_1 < ... < p_{n-1} < t_n, cycle i (for
// i = 1..n) spans t_i..t_{i+1} around p_i. The first peak only provides the
// decay crossing that closes the trough segment before cycle 1, so a
// recording with n peaks yields n - 1 cycles.
//
// All durations are in samples. Records are always in the peak-centred
// frame; trough-centred naming is applied when the table is exported.

use serde::{Deserialize, Serialize};

use crate::analysis::extrema::Extrema;
use crate::analysis::zerox::ZeroCrossings;
use crate::error::{AnalysisError, PipelineError};
use crate::telemetry::{DiagnosticEvent, DiagnosticLog};

/// Shape features of a single cycle (peak-centred frame)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CycleGeometry {
    pub sample_peak: usize,
    pub sample_zerox_decay: usize,
    pub sample_zerox_rise: usize,
    pub sample_last_trough: usize,
    pub sample_next_trough: usize,

    pub period: usize,
    pub time_peak: usize,
    /// Trough segment preceding this cycle's peak (from the previous decay crossing)
    pub time_trough: usize,
    pub time_rise: usize,
    pub time_decay: usize,

    pub volt_peak: f64,
    pub volt_trough: f64,
    pub volt_rise: f64,
    pub volt_decay: f64,
    pub volt_amp: f64,

    /// Fraction of the period spent rising
    pub time_rdsym: f64,
    /// Fraction of peak + trough segment time spent in the peak
    pub time_ptsym: f64,

    /// Mean analytic amplitude over the cycle; NaN when undefined
    pub band_amp: f64,
}

/// Build cycle records from extrema, crossings and an amplitude estimate
///
/// `amplitude` holds one value per signal sample; non-finite values (removed
/// filter edges) are ignored when averaging.
pub fn segment_cycles(
    signal: &[f64],
    extrema: &Extrema,
    crossings: &ZeroCrossings,
    amplitude: &[f64],
    log: &mut DiagnosticLog,
) -> Result<Vec<CycleGeometry>, PipelineError> {
    let n_peaks = extrema.peaks.len();
    if n_peaks < 2 {
        return Err(AnalysisError::InsufficientData {
            stage: "cycle segmentation".to_string(),
            required: 2,
            found: n_peaks,
        }
        .into());
    }

    let mut cycles = Vec::with_capacity(n_peaks - 1);
    for i in 1..n_peaks {
        let peak = extrema.peaks[i];
        let last_trough = extrema.troughs[i];
        let next_trough = extrema.troughs[i + 1];
        let zerox_rise = crossings.rises[i];
        let zerox_decay = crossings.decays[i];
        let prev_zerox_decay = crossings.decays[i - 1];

        let period = next_trough - last_trough;
        let time_rise = peak - last_trough;
        let time_decay = next_trough - peak;
        let time_peak = zerox_decay - zerox_rise;
        let time_trough = zerox_rise - prev_zerox_decay;

        let volt_peak = signal[peak];
        let volt_trough = signal[last_trough];
        let volt_rise = volt_peak - signal[last_trough];
        let volt_decay = volt_peak - signal[next_trough];

        let band_amp = finite_mean(&amplitude[last_trough..next_trough]);
        if band_amp.is_nan() {
            log.record(DiagnosticEvent::UndefinedBandAmplitude { cycle: i - 1 });
        }

        cycles.push(CycleGeometry {
            sample_peak: peak,
            sample_zerox_decay: zerox_decay,
            sample_zerox_rise: zerox_rise,
            sample_last_trough: last_trough,
            sample_next_trough: next_trough,
            period,
            time_peak,
            time_trough,
            time_rise,
            time_decay,
            volt_peak,
            volt_trough,
            volt_rise,
            volt_decay,
            volt_amp: (volt_rise + volt_decay) / 2.0,
            time_rdsym: time_rise as f64 / period as f64,
            time_ptsym: time_peak as f64 / (time_peak + time_trough) as f64,
            band_amp,
        });
    }

    tracing::debug!("[CycleSegmenter] {} cycles from {} peaks", cycles.len(), n_peaks);
    Ok(cycles)
}

/// Mean of the finite values, NaN if there are none
pub fn finite_mean(values: &[f64]) -> f64 {
    let (sum, count) = values
        .iter()
        .filter(|v| v.is_finite())
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        f64::NAN
    } else {
        sum / count as f64
    }
}
