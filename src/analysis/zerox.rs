// Half-amplitude crossings of each rise and decay flank
//
// For a flank bounded by samples `a < b`, the crossing level is
// `(signal[a] + signal[b]) / 2`. Every sample `j` in `[a, b)` where the
// signal passes the level in the flank's direction is a candidate; the
// median candidate is reported. On noisy flanks this sits near the middle
// of the ambiguous stretch instead of at its first sample.
//
// A flank with no candidate (degenerate: its end point does not lie beyond
// the level) is recorded as a diagnostic and reported at its centre sample.

use crate::analysis::extrema::Extrema;
use crate::error::Flank;
use crate::telemetry::{DiagnosticEvent, DiagnosticLog};

/// One crossing per flank
///
/// `rises[i]` lies on the flank `troughs[i] -> peaks[i]`,
/// `decays[i]` on the flank `peaks[i] -> troughs[i + 1]`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ZeroCrossings {
    pub rises: Vec<usize>,
    pub decays: Vec<usize>,
}

/// Locate the rise and decay crossings for every flank of `extrema`
pub fn locate_zero_crossings(
    signal: &[f64],
    extrema: &Extrema,
    log: &mut DiagnosticLog,
) -> ZeroCrossings {
    let mut crossings = ZeroCrossings {
        rises: Vec::with_capacity(extrema.peaks.len()),
        decays: Vec::with_capacity(extrema.peaks.len()),
    };

    for (i, &peak) in extrema.peaks.iter().enumerate() {
        let last_trough = extrema.troughs[i];
        let next_trough = extrema.troughs[i + 1];
        crossings
            .rises
            .push(flank_crossing(signal, last_trough, peak, Flank::Rise, log));
        crossings
            .decays
            .push(flank_crossing(signal, peak, next_trough, Flank::Decay, log));
    }

    tracing::debug!(
        "[ZeroCrossingLocalizer] {} rise / {} decay crossings",
        crossings.rises.len(),
        crossings.decays.len()
    );

    crossings
}

/// Median half-amplitude crossing between samples `start` and `end`
pub fn flank_crossing(
    signal: &[f64],
    start: usize,
    end: usize,
    flank: Flank,
    log: &mut DiagnosticLog,
) -> usize {
    let level = (signal[start] + signal[end]) / 2.0;

    let candidates: Vec<usize> = (start..end)
        .filter(|&j| {
            let (here, next) = (signal[j] > level, signal[j + 1] > level);
            match flank {
                Flank::Rise => !here && next,
                Flank::Decay => here && !next,
            }
        })
        .collect();

    match median_index(&candidates) {
        Some(index) => index,
        None => {
            let fallback = start + (end - start) / 2;
            log.record(DiagnosticEvent::NoZeroCrossing {
                flank,
                start,
                end,
                fallback,
            });
            fallback
        }
    }
}

/// Median of sorted indices; with an even count, the floor of the two
/// central values' mean
fn median_index(sorted: &[usize]) -> Option<usize> {
    let n = sorted.len();
    match n {
        0 => None,
        _ if n % 2 == 1 => Some(sorted[n / 2]),
        _ => Some((sorted[n / 2 - 1] + sorted[n / 2]) / 2),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_flank_single_crossing() {
        let signal = [0.0, 1.0, 2.0, 3.0, 4.0];
        let mut log = DiagnosticLog::new();
        // level = 2.0; 2.0 is not above the level, 3.0 is -> crossing at 2
        assert_eq!(flank_crossing(&signal, 0, 4, Flank::Rise, &mut log), 2);

        let signal = [4.0, 3.0, 2.0, 1.0, 0.0];
        assert_eq!(flank_crossing(&signal, 0, 4, Flank::Decay, &mut log), 1);
        assert!(log.is_empty());
    }

    #[test]
    fn test_noisy_flank_picks_median_candidate() {
        // Level 5.0 is crossed upwards at j = 1, 3 and 7
        let signal = [0.0, 4.0, 6.0, 4.0, 6.0, 6.5, 4.0, 4.5, 6.0, 10.0];
        let mut log = DiagnosticLog::new();
        assert_eq!(flank_crossing(&signal, 0, 9, Flank::Rise, &mut log), 3);
    }

    #[test]
    fn test_even_candidate_count_floors_mean() {
        // Upward crossings of level 5.0 at j = 1 and 4
        let signal = [0.0, 4.0, 6.0, 4.0, 4.5, 6.0, 10.0];
        let mut log = DiagnosticLog::new();
        assert_eq!(flank_crossing(&signal, 0, 6, Flank::Rise, &mut log), 2);
    }

    #[test]
    fn test_degenerate_flank_falls_back_and_records() {
        // Flat flank never rises above its level
        let signal = [1.0, 1.0, 1.0, 1.0, 1.0];
        let mut log = DiagnosticLog::new();
        assert_eq!(flank_crossing(&signal, 0, 4, Flank::Rise, &mut log), 2);
        assert_eq!(
            log.events(),
            &[DiagnosticEvent::NoZeroCrossing {
                flank: Flank::Rise,
                start: 0,
                end: 4,
                fallback: 2,
            }]
        );
    }

    #[test]
    fn test_one_crossing_per_flank() {
        let signal = [-1.0, 0.0, 1.0, 0.0, -1.0, 0.0, 1.0, 0.0, -1.0];
        let extrema = Extrema {
            peaks: vec![2, 6],
            troughs: vec![0, 4, 8],
        };
        let mut log = DiagnosticLog::new();
        let crossings = locate_zero_crossings(&signal, &extrema, &mut log);
        assert_eq!(crossings.rises, vec![1, 5]);
        assert_eq!(crossings.decays, vec![2, 6]);
        for (i, &p) in extrema.peaks.iter().enumerate() {
            assert!(extrema.troughs[i] <= crossings.rises[i] && crossings.rises[i] < p);
            assert!(p <= crossings.decays[i] && crossings.decays[i] < extrema.troughs[i + 1]);
        }
    }
}
