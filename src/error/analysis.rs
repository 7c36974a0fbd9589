// Analysis error types and constants

use crate::error::ErrorCode;
use log::error;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Analysis error code constants
///
/// Error code range: 2001-2004
pub struct AnalysisErrorCodes {}

impl AnalysisErrorCodes {
    /// Too few extrema or crossings to segment a single cycle
    pub const INSUFFICIENT_DATA: i32 = 2001;

    /// A flank never crossed its half-amplitude threshold
    pub const NO_ZERO_CROSSING: i32 = 2002;

    /// Input contained NaN or infinite samples
    pub const NON_FINITE_SIGNAL: i32 = 2003;

    /// Input had no samples
    pub const EMPTY_SIGNAL: i32 = 2004;
}

/// Which half of a cycle a flank belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Flank {
    /// Trough to following peak
    Rise,
    /// Peak to following trough
    Decay,
}

impl fmt::Display for Flank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Flank::Rise => write!(f, "rise"),
            Flank::Decay => write!(f, "decay"),
        }
    }
}

/// Log an analysis error with structured context
pub fn log_analysis_error(err: &AnalysisError, context: &str) {
    error!(
        "Analysis error in {}: code={}, component=FeaturePipeline, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Signal analysis errors
///
/// `InsufficientData` carries how far localization got so the caller can
/// tell a flat recording from a too-short one.
///
/// Error code range: 2001-2004
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisError {
    /// Not enough extrema/crossings for the named stage
    InsufficientData {
        stage: String,
        required: usize,
        found: usize,
    },

    /// Flank with no half-amplitude crossing
    NoZeroCrossing { flank: Flank, index: usize },

    /// NaN or infinity at the given sample
    NonFiniteSignal { index: usize },

    /// Zero-length signal
    EmptySignal,
}

impl ErrorCode for AnalysisError {
    fn code(&self) -> i32 {
        match self {
            AnalysisError::InsufficientData { .. } => AnalysisErrorCodes::INSUFFICIENT_DATA,
            AnalysisError::NoZeroCrossing { .. } => AnalysisErrorCodes::NO_ZERO_CROSSING,
            AnalysisError::NonFiniteSignal { .. } => AnalysisErrorCodes::NON_FINITE_SIGNAL,
            AnalysisError::EmptySignal => AnalysisErrorCodes::EMPTY_SIGNAL,
        }
    }

    fn message(&self) -> String {
        match self {
            AnalysisError::InsufficientData {
                stage,
                required,
                found,
            } => {
                format!(
                    "Insufficient data for {}: need at least {}, found {}",
                    stage, required, found
                )
            }
            AnalysisError::NoZeroCrossing { flank, index } => {
                format!(
                    "No half-amplitude crossing on {} flank starting at sample {}",
                    flank, index
                )
            }
            AnalysisError::NonFiniteSignal { index } => {
                format!("Signal contains a non-finite sample at index {}", index)
            }
            AnalysisError::EmptySignal => "Signal is empty".to_string(),
        }
    }
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AnalysisError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for AnalysisError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analysis_error_codes() {
        assert_eq!(
            AnalysisError::InsufficientData {
                stage: "zero crossings".to_string(),
                required: 2,
                found: 1
            }
            .code(),
            AnalysisErrorCodes::INSUFFICIENT_DATA
        );
        assert_eq!(
            AnalysisError::NoZeroCrossing {
                flank: Flank::Rise,
                index: 10
            }
            .code(),
            AnalysisErrorCodes::NO_ZERO_CROSSING
        );
        assert_eq!(
            AnalysisError::NonFiniteSignal { index: 0 }.code(),
            AnalysisErrorCodes::NON_FINITE_SIGNAL
        );
        assert_eq!(AnalysisError::EmptySignal.code(), 2004);
    }

    #[test]
    fn test_analysis_error_messages() {
        let err = AnalysisError::InsufficientData {
            stage: "zero crossings".to_string(),
            required: 2,
            found: 1,
        };
        assert_eq!(
            err.message(),
            "Insufficient data for zero crossings: need at least 2, found 1"
        );

        let err = AnalysisError::NoZeroCrossing {
            flank: Flank::Decay,
            index: 120,
        };
        assert!(err.message().contains("decay flank"));
        assert!(err.message().contains("120"));
    }
}
