// Error types for the cycle-by-cycle analysis pipeline
//
// This module defines the error taxonomy for configuration validation and
// signal analysis, with numeric error codes so callers (CLI, batch drivers)
// can branch on failures without matching message strings.
//
// Code ranges:
// - 1001-1099: configuration errors (fatal, surfaced before any analysis)
// - 2001-2099: analysis errors (fatal for the signal being analysed)

mod analysis;
mod config;

use std::fmt;

pub use analysis::{log_analysis_error, AnalysisError, AnalysisErrorCodes, Flank};
pub use config::{log_config_error, ConfigError, ConfigErrorCodes};

/// Error codes for structured error reporting
///
/// This trait provides a standard way to get error codes and messages
/// from custom error types, enabling consistent reporting from the
/// library, the CLI and batch callers.
pub trait ErrorCode {
    /// Get the numeric error code
    fn code(&self) -> i32;

    /// Get the human-readable error message
    fn message(&self) -> String;
}

/// Any failure surfaced by `compute_features`
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineError {
    Config(ConfigError),
    Analysis(AnalysisError),
}

impl ErrorCode for PipelineError {
    fn code(&self) -> i32 {
        match self {
            PipelineError::Config(err) => err.code(),
            PipelineError::Analysis(err) => err.code(),
        }
    }

    fn message(&self) -> String {
        match self {
            PipelineError::Config(err) => err.message(),
            PipelineError::Analysis(err) => err.message(),
        }
    }
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::Config(err) => err.fmt(f),
            PipelineError::Analysis(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PipelineError::Config(err) => Some(err),
            PipelineError::Analysis(err) => Some(err),
        }
    }
}

impl From<ConfigError> for PipelineError {
    fn from(err: ConfigError) -> Self {
        PipelineError::Config(err)
    }
}

impl From<AnalysisError> for PipelineError {
    fn from(err: AnalysisError) -> Self {
        PipelineError::Analysis(err)
    }
}
