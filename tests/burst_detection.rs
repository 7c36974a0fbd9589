//! Burst detection properties on synthetic recordings
//!
//! - bursting signals are neither all-burst nor burst-free
//! - runs of burst cycles respect `n_cycles_min` for both strategies
//! - consistency scores stay within [0, 1]
//! - the amplitude strategy tracks an amplified segment

use cyclewise::analysis::burst::{
    run_lengths, AmplitudeThresholds, BurstDetection, BurstDiagnostics, ConsistencyThresholds,
};
use cyclewise::config::{AnalysisConfig, FrequencyBand};
use cyclewise::testing::{amplitude_step, bursty, BurstySpec, StepSpec};
use cyclewise::compute_features;

const FS: f64 = 1000.0;

fn config(burst: BurstDetection) -> AnalysisConfig {
    AnalysisConfig {
        f_range: FrequencyBand::new(6.0, 14.0),
        burst,
        ..AnalysisConfig::default()
    }
}

#[test]
fn test_bursting_signal_has_partial_burst_fraction() {
    for seed in 1..=3 {
        let signal = bursty(&BurstySpec::default(), seed);
        let table =
            compute_features(&signal, FS, &config(BurstDetection::cycles(ConsistencyThresholds::default())))
                .unwrap();
        let flags = table.is_burst();
        let n_burst = flags.iter().filter(|&&b| b).count();
        assert!(
            n_burst > 0 && n_burst < flags.len(),
            "seed {seed}: {n_burst} of {} cycles in burst",
            flags.len()
        );
    }
}

#[test]
fn test_run_lengths_respect_minimum_for_both_strategies() {
    let signal = bursty(&BurstySpec::default(), 5);
    for n_cycles_min in [2, 3, 5] {
        let cycles = BurstDetection::cycles(ConsistencyThresholds {
            n_cycles_min,
            ..ConsistencyThresholds::default()
        });
        let amp = BurstDetection::amp(AmplitudeThresholds {
            n_cycles_min,
            ..AmplitudeThresholds::default()
        });
        for detection in [cycles, amp] {
            let method = detection.method();
            let table = compute_features(&signal, FS, &config(detection)).unwrap();
            for run in run_lengths(&table.is_burst()) {
                assert!(run >= n_cycles_min, "{method}: run {run} < {n_cycles_min}");
            }
        }
    }
}

#[test]
fn test_consistency_scores_are_bounded() {
    let signal = bursty(&BurstySpec::default(), 9);
    let table =
        compute_features(&signal, FS, &config(BurstDetection::cycles(ConsistencyThresholds::default())))
            .unwrap();
    for cycle in table.cycles() {
        let BurstDiagnostics::Cycles(scores) = cycle.burst.diagnostics else {
            panic!("expected consistency diagnostics");
        };
        for value in [
            scores.amp_fraction,
            scores.amp_consistency,
            scores.period_consistency,
            scores.monotonicity,
        ] {
            assert!(value.is_nan() || (0.0..=1.0).contains(&value), "score {value}");
        }
        assert!(scores.amp_fraction > 0.0);
    }
    let names = table.column_names();
    for name in ["amp_fraction", "amp_consistency", "period_consistency", "monotonicity", "is_burst"] {
        assert!(names.contains(&name), "missing {name}");
    }
}

#[test]
fn test_amplified_segment_is_detected_by_amp_strategy() {
    // Noise for 3 s with a 10 Hz oscillation at 3x the noise level in the middle second
    let signal = amplitude_step(&StepSpec::default(), 42);
    let thresholds = AmplitudeThresholds {
        amp_threshes: (1.0, 2.0),
        ..AmplitudeThresholds::default()
    };
    let table = compute_features(&signal, FS, &config(BurstDetection::amp(thresholds))).unwrap();

    let mut inside = 0;
    for cycle in table.cycles() {
        let g = &cycle.geometry;
        if g.sample_last_trough >= 1100 && g.sample_next_trough <= 1900 {
            inside += 1;
            assert!(cycle.burst.is_burst, "cycle at {} should be a burst", g.sample_peak);
        }
        if g.sample_next_trough <= 500 || g.sample_last_trough >= 2500 {
            assert!(!cycle.burst.is_burst, "cycle at {} should not be a burst", g.sample_peak);
        }
    }
    assert!(inside >= 6, "only {inside} cycles inside the amplified segment");

    let names = table.column_names();
    assert!(names.contains(&"burst_fraction"));
    assert!(!names.contains(&"amp_consistency"));
}
