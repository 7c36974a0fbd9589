// Configuration error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Configuration error code constants
///
/// Error code range: 1001-1007
pub struct ConfigErrorCodes {}

impl ConfigErrorCodes {
    /// `center_extrema` was neither peak nor trough
    pub const INVALID_CENTER_EXTREMA: i32 = 1001;

    /// Burst strategy name not recognised
    pub const UNKNOWN_BURST_METHOD: i32 = 1002;

    /// Filter length given both in cycles and in seconds
    pub const CONFLICTING_FILTER_LENGTH: i32 = 1003;

    /// Frequency band outside `0 < low < high < fs / 2`
    pub const INVALID_FREQUENCY_BAND: i32 = 1004;

    /// Sampling rate not strictly positive and finite
    pub const INVALID_SAMPLING_RATE: i32 = 1005;

    /// Threshold or run length outside its valid range
    pub const INVALID_THRESHOLD: i32 = 1006;

    /// Configuration document could not be parsed
    pub const MALFORMED: i32 = 1007;
}

/// Log a configuration error with structured context
pub fn log_config_error(err: &ConfigError, context: &str) {
    error!(
        "Configuration error in {}: code={}, component=AnalysisConfig, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Configuration errors
///
/// These are fatal and surfaced immediately; nothing is retried.
///
/// Error code range: 1001-1007
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// `center_extrema` value not one of peak/trough
    InvalidCenterExtrema { value: String },

    /// Burst strategy name not one of cycles/amp
    UnknownBurstMethod { name: String },

    /// Both `n_cycles` and `n_seconds` set for the same filter
    ConflictingFilterLength { stage: String },

    /// Frequency band does not satisfy `0 < low < high < fs / 2`
    InvalidFrequencyBand { low: f64, high: f64, fs: f64 },

    /// Sampling rate must be finite and > 0
    InvalidSamplingRate { fs: f64 },

    /// Threshold parameter out of range
    InvalidThreshold { name: String, value: f64 },

    /// JSON document did not match the configuration schema
    Malformed { reason: String },
}

impl ErrorCode for ConfigError {
    fn code(&self) -> i32 {
        match self {
            ConfigError::InvalidCenterExtrema { .. } => ConfigErrorCodes::INVALID_CENTER_EXTREMA,
            ConfigError::UnknownBurstMethod { .. } => ConfigErrorCodes::UNKNOWN_BURST_METHOD,
            ConfigError::ConflictingFilterLength { .. } => {
                ConfigErrorCodes::CONFLICTING_FILTER_LENGTH
            }
            ConfigError::InvalidFrequencyBand { .. } => ConfigErrorCodes::INVALID_FREQUENCY_BAND,
            ConfigError::InvalidSamplingRate { .. } => ConfigErrorCodes::INVALID_SAMPLING_RATE,
            ConfigError::InvalidThreshold { .. } => ConfigErrorCodes::INVALID_THRESHOLD,
            ConfigError::Malformed { .. } => ConfigErrorCodes::MALFORMED,
        }
    }

    fn message(&self) -> String {
        match self {
            ConfigError::InvalidCenterExtrema { value } => {
                format!(
                    "Invalid center_extrema '{}': expected 'peak' or 'trough'",
                    value
                )
            }
            ConfigError::UnknownBurstMethod { name } => {
                format!(
                    "Unknown burst detection method '{}': expected 'cycles' or 'amp'",
                    name
                )
            }
            ConfigError::ConflictingFilterLength { stage } => {
                format!(
                    "Conflicting filter length for {}: set either n_cycles or n_seconds, not both",
                    stage
                )
            }
            ConfigError::InvalidFrequencyBand { low, high, fs } => {
                format!(
                    "Invalid frequency band ({}, {}) Hz for fs={} Hz: need 0 < low < high < fs/2",
                    low, high, fs
                )
            }
            ConfigError::InvalidSamplingRate { fs } => {
                format!("Invalid sampling rate {} Hz: must be finite and > 0", fs)
            }
            ConfigError::InvalidThreshold { name, value } => {
                format!("Invalid value {} for threshold '{}'", value, name)
            }
            ConfigError::Malformed { reason } => {
                format!("Malformed configuration: {}", reason)
            }
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ConfigError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for ConfigError {}
