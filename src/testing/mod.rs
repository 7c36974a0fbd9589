//! Testability harness utilities.
//!
//! Synthetic recordings used by unit tests, integration tests and the CLI
//! `simulate` / `--synthetic` paths.

pub mod synthetic;

pub use synthetic::{
    amplitude_step, bursty, sine, white_noise, BurstySpec, StepSpec, SyntheticPattern,
    SyntheticSpec,
};
