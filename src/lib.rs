// Cyclewise - cycle-by-cycle analysis of neural oscillations
// Extrema/zero-crossing segmentation, per-cycle shape features and burst detection

// Module declarations
pub mod analysis;
pub mod config;
pub mod dsp;
pub mod error;
pub mod fixtures;
pub mod telemetry;
pub mod testing;

// Re-exports for convenience
pub use analysis::{compute_features, CycleTable, FeaturePipeline};
pub use config::{AnalysisConfig, Centering, FrequencyBand};
pub use error::{AnalysisError, ConfigError, ErrorCode, PipelineError};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_entry_point() {
        let signal = testing::sine(10.0, 1000.0, 2.0, 1.0);
        let config = AnalysisConfig {
            f_range: FrequencyBand::new(6.0, 14.0),
            ..AnalysisConfig::default()
        };
        let table = compute_features(&signal, 1000.0, &config).unwrap();
        assert!(!table.is_empty());
    }
}
