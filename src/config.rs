//! Configuration for cycle-by-cycle analysis
//!
//! This module provides the analysis parameters as a serde document so a
//! batch of recordings can be processed with one JSON file and parameters
//! can be tuned without recompilation. Every field is optional in the JSON;
//! missing fields take the documented defaults, except burst thresholds,
//! whose absence is reported as a diagnostic when the pipeline runs.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::analysis::burst::{BurstDetection, BurstMethod};
use crate::error::ConfigError;

/// Default filter length, in cycles of the reference frequency
pub const DEFAULT_FILTER_CYCLES: f64 = 3.0;

/// Frequency band of interest `(low, high)` in Hz
///
/// Serialized as a two-element array, e.g. `[8.0, 12.0]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "(f64, f64)", into = "(f64, f64)")]
pub struct FrequencyBand {
    pub low: f64,
    pub high: f64,
}

impl FrequencyBand {
    pub fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    pub fn center(&self) -> f64 {
        (self.low + self.high) / 2.0
    }

    /// Check `0 < low < high < fs / 2`
    pub fn validate(&self, fs: f64) -> Result<(), ConfigError> {
        validate_sampling_rate(fs)?;
        let ok = self.low.is_finite()
            && self.high.is_finite()
            && self.low > 0.0
            && self.low < self.high
            && self.high < fs / 2.0;
        if ok {
            Ok(())
        } else {
            Err(ConfigError::InvalidFrequencyBand {
                low: self.low,
                high: self.high,
                fs,
            })
        }
    }
}

impl From<(f64, f64)> for FrequencyBand {
    fn from((low, high): (f64, f64)) -> Self {
        Self { low, high }
    }
}

impl From<FrequencyBand> for (f64, f64) {
    fn from(band: FrequencyBand) -> Self {
        (band.low, band.high)
    }
}

pub fn validate_sampling_rate(fs: f64) -> Result<(), ConfigError> {
    if fs.is_finite() && fs > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidSamplingRate { fs })
    }
}

/// Which extremum sits at the center of each analysed cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Centering {
    /// Trough-to-trough cycles centred on a peak
    #[default]
    #[serde(alias = "P")]
    Peak,
    /// Peak-to-peak cycles centred on a trough
    #[serde(alias = "T")]
    Trough,
}

impl FromStr for Centering {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "P" | "peak" | "Peak" => Ok(Centering::Peak),
            "T" | "trough" | "Trough" => Ok(Centering::Trough),
            other => Err(ConfigError::InvalidCenterExtrema {
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for Centering {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Centering::Peak => write!(f, "peak"),
            Centering::Trough => write!(f, "trough"),
        }
    }
}

/// FIR kernel length, given in cycles of a reference frequency or in seconds
///
/// Leaving both unset means `DEFAULT_FILTER_CYCLES` cycles.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FilterLength {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n_cycles: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n_seconds: Option<f64>,
}

impl FilterLength {
    pub fn cycles(n_cycles: f64) -> Self {
        Self {
            n_cycles: Some(n_cycles),
            n_seconds: None,
        }
    }

    pub fn seconds(n_seconds: f64) -> Self {
        Self {
            n_cycles: None,
            n_seconds: Some(n_seconds),
        }
    }

    /// Kernel duration in seconds for a filter whose reference frequency
    /// (lower band edge or lowpass cutoff) is `reference_hz`.
    pub fn duration_seconds(&self, reference_hz: f64, stage: &str) -> Result<f64, ConfigError> {
        let seconds = match (self.n_cycles, self.n_seconds) {
            (Some(_), Some(_)) => {
                return Err(ConfigError::ConflictingFilterLength {
                    stage: stage.to_string(),
                })
            }
            (Some(cycles), None) => cycles / reference_hz,
            (None, Some(seconds)) => seconds,
            (None, None) => DEFAULT_FILTER_CYCLES / reference_hz,
        };
        if seconds.is_finite() && seconds > 0.0 {
            Ok(seconds)
        } else {
            Err(ConfigError::InvalidThreshold {
                name: format!("{} filter length", stage),
                value: seconds,
            })
        }
    }
}

/// Extrema localization settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtremaConfig {
    /// Narrowband filter length used to bound the extrema search windows
    #[serde(flatten)]
    pub filter: FilterLength,
    /// Mark the filter's edge samples invalid instead of keeping them
    pub remove_edges: bool,
    /// Drop extrema within this many samples of either end of the signal
    pub boundary: usize,
}

impl Default for ExtremaConfig {
    fn default() -> Self {
        Self {
            filter: FilterLength::cycles(DEFAULT_FILTER_CYCLES),
            remove_edges: false,
            boundary: 0,
        }
    }
}

/// Analytic amplitude settings for the per-cycle `band_amp` estimate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AmplitudeConfig {
    #[serde(flatten)]
    pub filter: FilterLength,
    pub remove_edges: bool,
    /// Zero-pad to the next power of two before the FFT
    pub increase_n: bool,
}

impl Default for AmplitudeConfig {
    fn default() -> Self {
        Self {
            filter: FilterLength::cycles(DEFAULT_FILTER_CYCLES),
            remove_edges: true,
            increase_n: false,
        }
    }
}

/// Optional lowpass applied to the signal before extrema localization
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PreprocessConfig {
    pub cutoff_hz: f64,
    #[serde(flatten)]
    pub filter: FilterLength,
}

/// Complete analysis configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub f_range: FrequencyBand,
    pub center_extrema: Centering,
    pub burst: BurstDetection,
    pub extrema: ExtremaConfig,
    pub amplitude: AmplitudeConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preprocess: Option<PreprocessConfig>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            f_range: FrequencyBand::new(8.0, 12.0),
            center_extrema: Centering::Peak,
            burst: BurstDetection::default(),
            extrema: ExtremaConfig::default(),
            amplitude: AmplitudeConfig::default(),
            preprocess: None,
        }
    }
}

impl AnalysisConfig {
    /// Parse a JSON document strictly
    ///
    /// Unknown centering values and burst method names are reported with
    /// their dedicated error codes; any other schema mismatch is `Malformed`.
    pub fn from_json_str(contents: &str) -> Result<Self, ConfigError> {
        let value: serde_json::Value =
            serde_json::from_str(contents).map_err(|err| ConfigError::Malformed {
                reason: err.to_string(),
            })?;

        if let Some(center) = value.get("center_extrema").and_then(|v| v.as_str()) {
            Centering::from_str(center)?;
        }
        if let Some(method) = value
            .get("burst")
            .and_then(|b| b.get("method"))
            .and_then(|m| m.as_str())
        {
            BurstMethod::from_str(method)?;
        }

        serde_json::from_value(value).map_err(|err| ConfigError::Malformed {
            reason: err.to_string(),
        })
    }

    /// Load configuration from a JSON file
    ///
    /// If the file doesn't exist or can't be parsed, returns the default
    /// configuration and logs a warning.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match Self::from_json_str(&contents) {
                Ok(config) => {
                    log::info!("[Config] Loaded configuration from {:?}", path.as_ref());
                    config
                }
                Err(err) => {
                    log::warn!(
                        "[Config] Failed to parse JSON from {:?}: {}. Using defaults.",
                        path.as_ref(),
                        err
                    );
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!(
                    "[Config] Failed to read config file {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        }
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Validate everything that can be checked without a signal
    pub fn validate(&self, fs: f64) -> Result<(), ConfigError> {
        self.f_range.validate(fs)?;
        self.extrema
            .filter
            .duration_seconds(self.f_range.low, "extrema")?;
        self.amplitude
            .filter
            .duration_seconds(self.f_range.low, "amplitude")?;
        if let Some(pre) = &self.preprocess {
            if !(pre.cutoff_hz.is_finite() && pre.cutoff_hz > 0.0 && pre.cutoff_hz < fs / 2.0) {
                return Err(ConfigError::InvalidThreshold {
                    name: "preprocess cutoff_hz".to_string(),
                    value: pre.cutoff_hz,
                });
            }
            pre.filter.duration_seconds(pre.cutoff_hz, "preprocess")?;
        }
        self.burst.validate(fs, &self.f_range)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::burst::ConsistencyThresholds;

    #[test]
    fn test_default_config() {
        let config = AnalysisConfig::default();
        assert_eq!(config.center_extrema, Centering::Peak);
        assert_eq!(config.extrema.filter.n_cycles, Some(3.0));
        assert!(!config.extrema.remove_edges);
        assert!(config.amplitude.remove_edges);
        assert!(!config.amplitude.increase_n);
        assert!(config.preprocess.is_none());
        assert!(config.burst.is_unconfigured());
    }

    #[test]
    fn test_centering_parsing() {
        assert_eq!("P".parse::<Centering>().unwrap(), Centering::Peak);
        assert_eq!("trough".parse::<Centering>().unwrap(), Centering::Trough);
        let err = "X".parse::<Centering>().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidCenterExtrema { .. }));
    }

    #[test]
    fn test_frequency_band_validation() {
        assert!(FrequencyBand::new(6.0, 14.0).validate(1000.0).is_ok());
        assert!(FrequencyBand::new(14.0, 6.0).validate(1000.0).is_err());
        assert!(FrequencyBand::new(0.0, 6.0).validate(1000.0).is_err());
        assert!(FrequencyBand::new(100.0, 600.0).validate(1000.0).is_err());
        assert!(matches!(
            FrequencyBand::new(6.0, 14.0).validate(0.0),
            Err(ConfigError::InvalidSamplingRate { .. })
        ));
    }

    #[test]
    fn test_filter_length_resolution() {
        let length = FilterLength::default();
        assert!((length.duration_seconds(10.0, "extrema").unwrap() - 0.3).abs() < 1e-12);

        let length = FilterLength::seconds(0.5);
        assert_eq!(length.duration_seconds(10.0, "extrema").unwrap(), 0.5);

        let both = FilterLength {
            n_cycles: Some(3.0),
            n_seconds: Some(0.5),
        };
        assert!(matches!(
            both.duration_seconds(10.0, "extrema"),
            Err(ConfigError::ConflictingFilterLength { .. })
        ));
    }

    #[test]
    fn test_json_round_trip() {
        let mut config = AnalysisConfig::default();
        config.f_range = FrequencyBand::new(4.0, 10.0);
        config.center_extrema = Centering::Trough;
        config.burst = BurstDetection::Cycles {
            thresholds: Some(ConsistencyThresholds::default()),
        };

        let json = config.to_json_pretty().unwrap();
        let parsed = AnalysisConfig::from_json_str(&json).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{
            "f_range": [6, 14],
            "center_extrema": "T",
            "extrema": {"n_seconds": 0.5},
            "burst": {"method": "amp"}
        }"#;
        let config = AnalysisConfig::from_json_str(json).unwrap();
        assert_eq!(config.f_range, FrequencyBand::new(6.0, 14.0));
        assert_eq!(config.center_extrema, Centering::Trough);
        assert_eq!(config.extrema.filter.n_seconds, Some(0.5));
        assert_eq!(config.extrema.filter.n_cycles, None);
        assert_eq!(config.burst.method(), BurstMethod::Amp);
        assert!(config.burst.is_unconfigured());
    }

    #[test]
    fn test_json_errors_map_to_config_codes() {
        let err = AnalysisConfig::from_json_str(r#"{"center_extrema": "middle"}"#).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidCenterExtrema { .. }));

        let err =
            AnalysisConfig::from_json_str(r#"{"burst": {"method": "wavelet"}}"#).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownBurstMethod { .. }));

        let err = AnalysisConfig::from_json_str("{not json").unwrap_err();
        assert!(matches!(err, ConfigError::Malformed { .. }));
    }

    #[test]
    fn test_conflicting_extrema_filter_rejected_by_validate() {
        let mut config = AnalysisConfig::default();
        config.extrema.filter = FilterLength {
            n_cycles: Some(3.0),
            n_seconds: Some(0.3),
        };
        assert!(matches!(
            config.validate(1000.0),
            Err(ConfigError::ConflictingFilterLength { .. })
        ));
    }

    #[test]
    fn test_load_missing_file_falls_back_to_defaults() {
        let config = AnalysisConfig::load_from_file("/nonexistent/cyclewise.json");
        assert_eq!(config, AnalysisConfig::default());
    }
}
