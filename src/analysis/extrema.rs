// Extrema localization - peaks and troughs bounded by narrowband zero crossings
//
// Algorithm:
// 1. Bandpass the signal over `f_range` (narrowband collaborator)
// 2. Rising/falling zero crossings of the filtered signal
// 3. Between consecutive crossings the filtered signal keeps one sign;
//    the window after a rising crossing holds a peak (argmax of the
//    unfiltered signal), the window after a falling crossing a trough (argmin)
// 4. Drop extrema inside the configured boundary, then trim so the
//    sequence starts and ends on a trough
//
// Output invariant: troughs and peaks alternate, `troughs.len() == peaks.len() + 1`.

use crate::config::{ExtremaConfig, FrequencyBand};
use crate::dsp::filter::{FilterSpec, NarrowbandFilter};
use crate::error::{AnalysisError, PipelineError};
use crate::telemetry::{DiagnosticEvent, DiagnosticLog};

/// Peak and trough sample indices
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Extrema {
    pub peaks: Vec<usize>,
    pub troughs: Vec<usize>,
}

/// Direction of a zero crossing in the filtered signal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Crossing {
    Rise,
    Fall,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Extremum {
    Peak(usize),
    Trough(usize),
}

impl Extremum {
    fn index(self) -> usize {
        match self {
            Extremum::Peak(i) | Extremum::Trough(i) => i,
        }
    }
}

/// Zero crossings of `signal`, in sample order
///
/// A crossing at `i` means the sign changes between samples `i` and `i + 1`.
/// Zero counts as non-positive. Pairs involving a non-finite sample are skipped.
pub fn zero_crossings(signal: &[f64]) -> Vec<(usize, Crossing)> {
    signal
        .windows(2)
        .enumerate()
        .filter_map(|(i, pair)| {
            let (a, b) = (pair[0], pair[1]);
            if !(a.is_finite() && b.is_finite()) {
                return None;
            }
            match (a > 0.0, b > 0.0) {
                (false, true) => Some((i, Crossing::Rise)),
                (true, false) => Some((i, Crossing::Fall)),
                _ => None,
            }
        })
        .collect()
}

/// Locate peaks and troughs of `signal`
pub fn locate_extrema<F: NarrowbandFilter + ?Sized>(
    signal: &[f64],
    fs: f64,
    f_range: FrequencyBand,
    config: &ExtremaConfig,
    filter: &F,
    log: &mut DiagnosticLog,
) -> Result<Extrema, PipelineError> {
    let spec = FilterSpec::bandpass(f_range, config.filter).with_remove_edges(config.remove_edges);
    let filtered = filter.filter(signal, fs, &spec)?;

    let crossings = zero_crossings(&filtered);
    if crossings.len() < 2 {
        return Err(AnalysisError::InsufficientData {
            stage: "zero crossings".to_string(),
            required: 2,
            found: crossings.len(),
        }
        .into());
    }

    // Each window (c_j, c_{j+1}] is one lobe of the filtered signal
    let mut sequence: Vec<Extremum> = crossings
        .windows(2)
        .map(|pair| {
            let (start, kind) = pair[0];
            let window = &signal[start + 1..=pair[1].0];
            match kind {
                Crossing::Rise => Extremum::Peak(start + 1 + argmax(window)),
                Crossing::Fall => Extremum::Trough(start + 1 + argmin(window)),
            }
        })
        .collect();

    let before = sequence.len();
    let boundary = config.boundary;
    sequence.retain(|e| e.index() >= boundary && e.index() + boundary < signal.len());
    if sequence.len() < before {
        log.record(DiagnosticEvent::ExtremaOutsideBoundary {
            dropped: before - sequence.len(),
            boundary,
        });
    }

    // Start and end on a trough
    while matches!(sequence.first(), Some(Extremum::Peak(_))) {
        sequence.remove(0);
    }
    while matches!(sequence.last(), Some(Extremum::Peak(_))) {
        sequence.pop();
    }

    let mut extrema = Extrema::default();
    for extremum in sequence {
        match extremum {
            Extremum::Peak(i) => extrema.peaks.push(i),
            Extremum::Trough(i) => extrema.troughs.push(i),
        }
    }

    if extrema.peaks.is_empty() {
        return Err(AnalysisError::InsufficientData {
            stage: "extrema".to_string(),
            required: 1,
            found: 0,
        }
        .into());
    }

    tracing::debug!(
        "[ExtremaLocalizer] {} crossings -> {} peaks, {} troughs",
        crossings.len(),
        extrema.peaks.len(),
        extrema.troughs.len()
    );

    Ok(extrema)
}

/// Index of the first maximum
fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate().skip(1) {
        if v > values[best] {
            best = i;
        }
    }
    best
}

/// Index of the first minimum
fn argmin(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate().skip(1) {
        if v < values[best] {
            best = i;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FilterLength;
    use crate::dsp::filter::FirFilter;
    use std::f64::consts::PI;

    /// Passes the signal through unchanged
    struct Identity;

    impl NarrowbandFilter for Identity {
        fn filter(
            &self,
            signal: &[f64],
            _fs: f64,
            _spec: &FilterSpec,
        ) -> Result<Vec<f64>, PipelineError> {
            Ok(signal.to_vec())
        }
    }

    fn sine(freq: f64, fs: f64, seconds: f64) -> Vec<f64> {
        let n = (fs * seconds) as usize;
        (0..n)
            .map(|i| (2.0 * PI * freq * i as f64 / fs).sin())
            .collect()
    }

    #[test]
    fn test_zero_crossings_directions() {
        let signal = [-1.0, 1.0, 2.0, 0.0, -1.0, 0.0, 3.0];
        assert_eq!(
            zero_crossings(&signal),
            vec![(0, Crossing::Rise), (2, Crossing::Fall), (5, Crossing::Rise)]
        );
    }

    #[test]
    fn test_zero_crossings_skip_nan() {
        let signal = [f64::NAN, 1.0, -1.0, f64::NAN, 1.0];
        assert_eq!(zero_crossings(&signal), vec![(1, Crossing::Fall)]);
    }

    #[test]
    fn test_extrema_alternate_and_start_end_on_trough() {
        let signal = sine(10.0, 1000.0, 2.0);
        let mut log = DiagnosticLog::new();
        let extrema = locate_extrema(
            &signal,
            1000.0,
            FrequencyBand::new(6.0, 14.0),
            &ExtremaConfig::default(),
            &FirFilter::new(),
            &mut log,
        )
        .unwrap();

        assert_eq!(extrema.troughs.len(), extrema.peaks.len() + 1);
        for (i, &p) in extrema.peaks.iter().enumerate() {
            assert!(extrema.troughs[i] < p && p < extrema.troughs[i + 1]);
        }
        // Away from the filter edges, peaks of sin(2*pi*10*t) at 1 kHz fall
        // on samples 25 mod 100 and troughs on 75 mod 100
        for &p in extrema.peaks.iter().filter(|&&p| (300..1700).contains(&p)) {
            assert_eq!(p % 100, 25);
        }
        for &t in extrema.troughs.iter().filter(|&&t| (300..1700).contains(&t)) {
            assert_eq!(t % 100, 75);
        }
        assert!(extrema.peaks.len() >= 17);
        assert!(log.is_empty());
    }

    #[test]
    fn test_extrema_use_unfiltered_values() {
        // Square lobes with spikes: the spikes must win argmax/argmin
        let mut signal: Vec<f64> = (0..60)
            .map(|i| if (i / 10) % 2 == 0 { 1.0 } else { -1.0 })
            .collect();
        signal[12] = -2.0;
        signal[23] = 5.0;
        signal[35] = -3.0;

        let mut log = DiagnosticLog::new();
        let extrema = locate_extrema(
            &signal,
            1000.0,
            FrequencyBand::new(40.0, 60.0),
            &ExtremaConfig::default(),
            &Identity,
            &mut log,
        )
        .unwrap();

        // Leading partial lobe discarded, trailing peak trimmed
        assert_eq!(extrema.peaks, vec![23]);
        assert_eq!(extrema.troughs, vec![12, 35]);
    }

    #[test]
    fn test_boundary_drops_edge_extrema() {
        let signal = sine(10.0, 1000.0, 2.0);
        let mut log = DiagnosticLog::new();
        let config = ExtremaConfig {
            boundary: 150,
            ..ExtremaConfig::default()
        };
        let extrema = locate_extrema(
            &signal,
            1000.0,
            FrequencyBand::new(6.0, 14.0),
            &config,
            &FirFilter::new(),
            &mut log,
        )
        .unwrap();

        assert!(extrema.troughs[0] >= 150);
        assert!(*extrema.troughs.last().unwrap() + 150 < signal.len());
        assert_eq!(extrema.troughs.len(), extrema.peaks.len() + 1);
        assert!(matches!(
            log.events()[0],
            DiagnosticEvent::ExtremaOutsideBoundary { boundary: 150, .. }
        ));
    }

    #[test]
    fn test_flat_signal_is_insufficient_data() {
        let signal = vec![0.0; 2000];
        let mut log = DiagnosticLog::new();
        let err = locate_extrema(
            &signal,
            1000.0,
            FrequencyBand::new(6.0, 14.0),
            &ExtremaConfig::default(),
            &FirFilter::new(),
            &mut log,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Analysis(AnalysisError::InsufficientData { found: 0, .. })
        ));
    }

    #[test]
    fn test_seconds_length_override() {
        let signal = sine(10.0, 1000.0, 2.0);
        let mut log = DiagnosticLog::new();
        let config = ExtremaConfig {
            filter: FilterLength::seconds(0.5),
            ..ExtremaConfig::default()
        };
        let extrema = locate_extrema(
            &signal,
            1000.0,
            FrequencyBand::new(6.0, 14.0),
            &config,
            &FirFilter::new(),
            &mut log,
        )
        .unwrap();
        assert!(extrema.peaks.len() >= 15);
    }
}
