// Analytic-signal amplitude via FFT
//
// Algorithm:
// 1. Bandpass the signal over the band of interest (edges kept)
// 2. FFT of the finite span, optionally zero-padded to a power of two
// 3. Keep DC and Nyquist, double positive frequencies, zero negative ones
// 4. Inverse FFT; the magnitude is the instantaneous amplitude
// 5. Optionally mark the filter's edge samples as NaN

use rustfft::{num_complex::Complex, FftPlanner};

use crate::config::{FilterLength, FrequencyBand};
use crate::dsp::filter::{mark_edges, FilterSpec, FirFilter, NarrowbandFilter};
use crate::error::PipelineError;

/// Options for one amplitude estimate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmplitudeOptions {
    pub length: FilterLength,
    pub remove_edges: bool,
    /// Zero-pad to the next power of two before transforming
    pub increase_n: bool,
}

impl Default for AmplitudeOptions {
    fn default() -> Self {
        Self {
            length: FilterLength::default(),
            remove_edges: true,
            increase_n: false,
        }
    }
}

/// Instantaneous-amplitude collaborator
///
/// Returns a sequence with one value per input sample.
pub trait AmplitudeEstimator: Send + Sync {
    fn amplitude(
        &self,
        signal: &[f64],
        fs: f64,
        band: FrequencyBand,
        options: &AmplitudeOptions,
    ) -> Result<Vec<f64>, PipelineError>;
}

/// Bandpass + FFT Hilbert transform amplitude estimator
#[derive(Debug, Clone, Default)]
pub struct HilbertAmplitude<F = FirFilter> {
    filter: F,
}

impl HilbertAmplitude<FirFilter> {
    pub fn new() -> Self {
        Self { filter: FirFilter }
    }
}

impl<F: NarrowbandFilter> HilbertAmplitude<F> {
    pub fn with_filter(filter: F) -> Self {
        Self { filter }
    }
}

impl<F: NarrowbandFilter> AmplitudeEstimator for HilbertAmplitude<F> {
    fn amplitude(
        &self,
        signal: &[f64],
        fs: f64,
        band: FrequencyBand,
        options: &AmplitudeOptions,
    ) -> Result<Vec<f64>, PipelineError> {
        let spec = FilterSpec::bandpass(band, options.length);
        let filtered = self.filter.filter(signal, fs, &spec)?;
        let mut amplitude = analytic_amplitude(&filtered, options.increase_n);
        if options.remove_edges {
            mark_edges(&mut amplitude, spec.n_taps(fs)?);
        }
        Ok(amplitude)
    }
}

/// Analytic signal of `signal` (same length)
///
/// When `increase_n` is set the transform runs on the next power of two and
/// the result is trimmed back.
pub fn analytic_signal(signal: &[f64], increase_n: bool) -> Vec<Complex<f64>> {
    let n = signal.len();
    if n == 0 {
        return Vec::new();
    }
    let n_fft = if increase_n { n.next_power_of_two() } else { n };

    let mut buffer: Vec<Complex<f64>> = signal
        .iter()
        .map(|&x| Complex::new(x, 0.0))
        .chain(std::iter::repeat(Complex::new(0.0, 0.0)))
        .take(n_fft)
        .collect();

    let mut planner = FftPlanner::<f64>::new();
    planner.plan_fft_forward(n_fft).process(&mut buffer);

    // Positive frequencies 1..ceil(n/2) doubled, Nyquist (even n) kept,
    // negative frequencies zeroed
    let positive_end = (n_fft + 1) / 2;
    for bin in buffer.iter_mut().take(positive_end).skip(1) {
        *bin *= 2.0;
    }
    let negative_start = n_fft / 2 + 1;
    for bin in buffer.iter_mut().skip(negative_start) {
        *bin = Complex::new(0.0, 0.0);
    }

    planner.plan_fft_inverse(n_fft).process(&mut buffer);

    let scale = 1.0 / n_fft as f64;
    buffer.truncate(n);
    for value in buffer.iter_mut() {
        *value *= scale;
    }
    buffer
}

/// Magnitude of the analytic signal
///
/// Non-finite samples at either end (e.g. removed filter edges) are left
/// out of the transform and come back as NaN.
pub fn analytic_amplitude(signal: &[f64], increase_n: bool) -> Vec<f64> {
    let mut amplitude = vec![f64::NAN; signal.len()];
    let first = signal.iter().position(|v| v.is_finite());
    let last = signal.iter().rposition(|v| v.is_finite());
    if let (Some(first), Some(last)) = (first, last) {
        let span = &signal[first..=last];
        for (out, z) in amplitude[first..=last]
            .iter_mut()
            .zip(analytic_signal(span, increase_n))
        {
            *out = z.norm();
        }
    }
    amplitude
}
