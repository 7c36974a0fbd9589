// FIR filtering - windowed-sinc bandpass/lowpass design and zero-phase application
//
// Design:
// 1. Kernel length: duration from `FilterLength` (cycles of the reference
//    frequency or seconds), `ceil(fs * seconds)` taps, bumped to odd
// 2. Ideal response: difference of sinc kernels (bandpass) or a single sinc
//    (lowpass), cutoffs normalised to Nyquist
// 3. Hamming window
// 4. Gain normalisation: unity at the band centre (bandpass) or at DC (lowpass)
//
// Application is a centred ("same") convolution, so a symmetric kernel
// introduces no phase shift. With `remove_edges`, the `ceil(n_taps / 2)`
// samples at either end, where the kernel overhangs the signal, become NaN.

use std::f64::consts::PI;

use crate::config::{FilterLength, FrequencyBand};
use crate::error::{AnalysisError, ConfigError, PipelineError};

/// Pass band of a filter
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FilterKind {
    Bandpass(FrequencyBand),
    Lowpass { cutoff_hz: f64 },
}

impl FilterKind {
    /// Frequency whose period defines a "cycle" for `FilterLength::n_cycles`
    pub fn reference_hz(&self) -> f64 {
        match self {
            FilterKind::Bandpass(band) => band.low,
            FilterKind::Lowpass { cutoff_hz } => *cutoff_hz,
        }
    }
}

/// Everything needed to design and apply one filter
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterSpec {
    pub kind: FilterKind,
    pub length: FilterLength,
    pub remove_edges: bool,
}

impl FilterSpec {
    pub fn bandpass(band: FrequencyBand, length: FilterLength) -> Self {
        Self {
            kind: FilterKind::Bandpass(band),
            length,
            remove_edges: false,
        }
    }

    pub fn lowpass(cutoff_hz: f64, length: FilterLength) -> Self {
        Self {
            kind: FilterKind::Lowpass { cutoff_hz },
            length,
            remove_edges: false,
        }
    }

    pub fn with_remove_edges(mut self, remove_edges: bool) -> Self {
        self.remove_edges = remove_edges;
        self
    }

    /// Number of kernel taps at sampling rate `fs` (always odd)
    pub fn n_taps(&self, fs: f64) -> Result<usize, ConfigError> {
        let stage = match self.kind {
            FilterKind::Bandpass(_) => "bandpass",
            FilterKind::Lowpass { .. } => "lowpass",
        };
        let seconds = self.length.duration_seconds(self.kind.reference_hz(), stage)?;
        let mut n_taps = (fs * seconds).ceil() as usize;
        if n_taps % 2 == 0 {
            n_taps += 1;
        }
        Ok(n_taps.max(1))
    }
}

/// Narrowband/lowpass filter collaborator
///
/// Implementations return a sequence of the same length as the input.
pub trait NarrowbandFilter: Send + Sync {
    fn filter(&self, signal: &[f64], fs: f64, spec: &FilterSpec) -> Result<Vec<f64>, PipelineError>;
}

/// Hamming-windowed sinc FIR filter
#[derive(Debug, Clone, Copy, Default)]
pub struct FirFilter;

impl FirFilter {
    pub fn new() -> Self {
        Self
    }

    /// Design the kernel for `spec` at sampling rate `fs`
    pub fn design(&self, fs: f64, spec: &FilterSpec) -> Result<Vec<f64>, ConfigError> {
        let n_taps = spec.n_taps(fs)?;
        let nyquist = fs / 2.0;
        let window = hamming_window(n_taps);
        let half = (n_taps as f64 - 1.0) / 2.0;

        let mut kernel: Vec<f64> = (0..n_taps)
            .map(|n| {
                let m = n as f64 - half;
                let ideal = match spec.kind {
                    FilterKind::Bandpass(band) => {
                        let lo = band.low / nyquist;
                        let hi = band.high / nyquist;
                        hi * sinc(hi * m) - lo * sinc(lo * m)
                    }
                    FilterKind::Lowpass { cutoff_hz } => {
                        let fc = cutoff_hz / nyquist;
                        fc * sinc(fc * m)
                    }
                };
                ideal * window[n]
            })
            .collect();

        // Unity gain at the centre of the pass band
        let scale_freq = match spec.kind {
            FilterKind::Bandpass(band) => band.center() / nyquist,
            FilterKind::Lowpass { .. } => 0.0,
        };
        let gain: f64 = kernel
            .iter()
            .enumerate()
            .map(|(n, h)| h * (PI * (n as f64 - half) * scale_freq).cos())
            .sum();
        if gain != 0.0 && gain.is_finite() {
            for h in kernel.iter_mut() {
                *h /= gain;
            }
        }

        Ok(kernel)
    }
}

impl NarrowbandFilter for FirFilter {
    fn filter(&self, signal: &[f64], fs: f64, spec: &FilterSpec) -> Result<Vec<f64>, PipelineError> {
        let kernel = self.design(fs, spec)?;
        if kernel.len() > signal.len() {
            return Err(AnalysisError::InsufficientData {
                stage: "filter kernel".to_string(),
                required: kernel.len(),
                found: signal.len(),
            }
            .into());
        }

        let mut filtered = convolve_same(signal, &kernel);
        if spec.remove_edges {
            mark_edges(&mut filtered, kernel.len());
        }

        tracing::trace!(
            "[FirFilter] {:?}: {} taps over {} samples",
            spec.kind,
            kernel.len(),
            signal.len()
        );
        Ok(filtered)
    }
}

/// Hamming window of length `size`
pub fn hamming_window(size: usize) -> Vec<f64> {
    if size <= 1 {
        return vec![1.0; size];
    }
    let denom = (size - 1) as f64;
    (0..size)
        .map(|i| 0.54 - 0.46 * (2.0 * PI * i as f64 / denom).cos())
        .collect()
}

/// Normalised sinc, `sin(pi x) / (pi x)`
fn sinc(x: f64) -> f64 {
    if x == 0.0 {
        1.0
    } else {
        let px = PI * x;
        px.sin() / px
    }
}

/// Centred convolution with zero padding; output has the input's length.
///
/// Assumes an odd kernel length.
pub fn convolve_same(signal: &[f64], kernel: &[f64]) -> Vec<f64> {
    let n = signal.len();
    let k = kernel.len();
    let offset = (k - 1) / 2;
    let mut out = vec![0.0; n];

    for (i, value) in out.iter_mut().enumerate() {
        // Full-convolution index i + offset; signal index j = i + offset - tap
        let full = i + offset;
        let tap_lo = full.saturating_sub(n - 1);
        let tap_hi = full.min(k - 1);
        let mut acc = 0.0;
        for tap in tap_lo..=tap_hi {
            acc += kernel[tap] * signal[full - tap];
        }
        *value = acc;
    }

    out
}

/// Set the samples a kernel of `n_taps` overhangs to NaN
pub fn mark_edges(signal: &mut [f64], n_taps: usize) {
    let n_remove = ((n_taps + 1) / 2).min(signal.len());
    let len = signal.len();
    for value in signal[..n_remove].iter_mut() {
        *value = f64::NAN;
    }
    for value in signal[len - n_remove..].iter_mut() {
        *value = f64::NAN;
    }
}
