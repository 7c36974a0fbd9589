use super::*;
use crate::analysis::burst::run_lengths;
use crate::analysis::cycles::segment_cycles;
use crate::analysis::extrema::Extrema;
use crate::analysis::zerox::locate_zero_crossings;
use crate::telemetry::DiagnosticLog;

/// Linear interpolation through (index, value) knots
fn piecewise(knots: &[(usize, f64)]) -> Vec<f64> {
    let mut signal = Vec::new();
    for pair in knots.windows(2) {
        let ((i0, v0), (i1, v1)) = (pair[0], pair[1]);
        for i in i0..i1 {
            let t = (i - i0) as f64 / (i1 - i0) as f64;
            signal.push(v0 + t * (v1 - v0));
        }
    }
    if let Some(&(_, v)) = knots.last() {
        signal.push(v);
    }
    signal
}

/// Triangle cycles: trough, peak at +4, next trough at +period.
/// `shape` gives (period, peak value) per cycle; troughs sit at -1.
fn build(shape: &[(usize, f64)]) -> (Vec<f64>, Vec<CycleGeometry>) {
    let mut knots = Vec::new();
    let mut extrema = Extrema::default();
    let mut t = 0;
    for &(period, peak_value) in shape {
        knots.push((t, -1.0));
        knots.push((t + 4, peak_value));
        extrema.troughs.push(t);
        extrema.peaks.push(t + 4);
        t += period;
    }
    knots.push((t, -1.0));
    extrema.troughs.push(t);

    let signal = piecewise(&knots);
    let mut log = DiagnosticLog::new();
    let crossings = locate_zero_crossings(&signal, &extrema, &mut log);
    let amplitude = vec![1.0; signal.len()];
    let cycles = segment_cycles(&signal, &extrema, &crossings, &amplitude, &mut log).unwrap();
    (signal, cycles)
}

fn flags(labels: &[BurstLabel]) -> Vec<bool> {
    labels.iter().map(|l| l.is_burst).collect()
}

fn scores(labels: &[BurstLabel]) -> Vec<ConsistencyScores> {
    labels
        .iter()
        .map(|l| match l.diagnostics {
            BurstDiagnostics::Cycles(scores) => scores,
            other => panic!("unexpected diagnostics {:?}", other),
        })
        .collect()
}

#[test]
fn test_regular_oscillation_is_one_burst() {
    let (signal, cycles) = build(&[(10, 1.0); 10]);
    assert_eq!(cycles.len(), 9);

    let labels = detect_bursts_cycles(&cycles, &signal, &ConsistencyThresholds::default());
    assert_eq!(
        flags(&labels),
        vec![false, true, true, true, true, true, true, true, false]
    );

    let scores = scores(&labels);
    for s in &scores[1..8] {
        assert_eq!(s.amp_consistency, 1.0);
        assert_eq!(s.period_consistency, 1.0);
        assert_eq!(s.monotonicity, 1.0);
        assert_eq!(s.amp_fraction, 1.0);
    }
}

#[test]
fn test_edge_cycles_have_undefined_consistency() {
    let (signal, cycles) = build(&[(10, 1.0); 6]);
    let labels = detect_bursts_cycles(&cycles, &signal, &ConsistencyThresholds::default());
    let scores = scores(&labels);

    for edge in [0, scores.len() - 1] {
        assert!(scores[edge].amp_consistency.is_nan());
        assert!(scores[edge].period_consistency.is_nan());
        assert!(!labels[edge].is_burst);
        // Monotonicity and rank are still defined at the edges
        assert_eq!(scores[edge].monotonicity, 1.0);
        assert_eq!(scores[edge].amp_fraction, 1.0);
    }
}

#[test]
fn test_amplitude_dip_breaks_consistency_of_neighbours() {
    let mut shape = vec![(10, 1.0); 10];
    // Peak of the cycle anchoring row 4 (peak index 5) dips to -0.2
    shape[5] = (10, -0.2);
    let (signal, cycles) = build(&shape);

    let thresholds = ConsistencyThresholds {
        n_cycles_min: 2,
        ..ConsistencyThresholds::default()
    };
    let labels = detect_bursts_cycles(&cycles, &signal, &thresholds);
    let scores = scores(&labels);

    // Rise/decay of 0.8 next to neighbours' 2.0 -> ratio 0.4
    assert!((scores[4].amp_consistency - 0.4).abs() < 1e-9);
    assert!((scores[3].amp_consistency - 0.4).abs() < 1e-9);
    assert!((scores[5].amp_consistency - 0.4).abs() < 1e-9);
    assert!((scores[4].amp_fraction - 1.0 / 9.0).abs() < 1e-12);

    assert_eq!(
        flags(&labels),
        vec![false, true, true, false, false, false, true, true, false]
    );

    // The same table with the default minimum of 3 cycles has no burst left
    let labels = detect_bursts_cycles(&cycles, &signal, &ConsistencyThresholds::default());
    assert!(flags(&labels).iter().all(|&b| !b));
}

#[test]
fn test_period_jump_breaks_period_consistency() {
    let mut shape = vec![(10, 1.0); 12];
    shape[6] = (20, 1.0);
    let (signal, cycles) = build(&shape);
    let labels = detect_bursts_cycles(&cycles, &signal, &ConsistencyThresholds::default());
    let scores = scores(&labels);

    // Row 5 is the 20-sample cycle; it and both neighbours see a 0.5 ratio
    assert_eq!(cycles[5].period, 20);
    for row in 4..=6 {
        assert_eq!(scores[row].period_consistency, 0.5);
        assert!(!labels[row].is_burst);
    }
    assert!(labels[1].is_burst && labels[3].is_burst);
    assert!(labels[7].is_burst && labels[9].is_burst);
}

#[test]
fn test_non_monotonic_flank_lowers_monotonicity() {
    let (mut signal, cycles) = build(&[(10, 1.0); 8]);
    // Put a bump into the rise flank of row 3 (trough 40, peak 44)
    assert_eq!(cycles[3].sample_last_trough, 40);
    signal[42] = -0.9;

    let scores = consistency_scores(&cycles, &signal);
    // Rise steps: -1 -> -0.5 (up), -0.5 -> -0.9 (down), -0.9 -> 0.5 (up): 2/3
    assert!((scores[3].monotonicity - (2.0 / 3.0 + 1.0) / 2.0).abs() < 1e-12);
}

#[test]
fn test_scores_are_bounded_and_runs_respect_minimum() {
    let shape: Vec<(usize, f64)> = (0..30)
        .map(|i| {
            let period = if i % 7 == 3 { 17 } else { 10 };
            let peak = if i % 5 == 2 { 0.1 } else { 1.0 + 0.05 * (i % 3) as f64 };
            (period, peak)
        })
        .collect();
    let (signal, cycles) = build(&shape);
    let thresholds = ConsistencyThresholds::default();
    let labels = detect_bursts_cycles(&cycles, &signal, &thresholds);

    for s in scores(&labels) {
        for value in [s.amp_consistency, s.period_consistency, s.monotonicity, s.amp_fraction] {
            assert!(value.is_nan() || (0.0..=1.0).contains(&value));
        }
    }
    for run in run_lengths(&flags(&labels)) {
        assert!(run >= thresholds.n_cycles_min);
    }
}

#[test]
fn test_validate_rejects_zero_run_length() {
    let thresholds = ConsistencyThresholds {
        n_cycles_min: 0,
        ..ConsistencyThresholds::default()
    };
    assert!(thresholds.validate().is_err());
    assert!(ConsistencyThresholds::default().validate().is_ok());
}
