// Signal-processing collaborators used by the cycle analysis
//
// - filter: windowed-sinc FIR design and zero-phase application
// - hilbert: analytic-signal amplitude

pub mod filter;
pub mod hilbert;

pub use filter::{FilterKind, FilterSpec, FirFilter, NarrowbandFilter};
pub use hilbert::{AmplitudeEstimator, AmplitudeOptions, HilbertAmplitude};
