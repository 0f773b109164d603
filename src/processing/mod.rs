//! Signal processing: spectral, wavelet and statistical analysis of one axis
//! of a sample window.
//!
//! Each analyzer is a pure function of an owned value slice. They share no
//! state, so [`analyze_window`] runs them in parallel.

mod fft;
mod report;
mod statistics;
mod wavelet;

pub use fft::*;
pub use report::{analyze_window, AnalysisReport, AnalysisSettings, PanelResult, SpectralPeak};
pub use statistics::analyze_stats;
pub use wavelet::{analyze_dwt, max_decomposition_level, WaveletFamily};

use thiserror::Error;

/// Errors in signal processing
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    /// The window is unsuitable for the requested analysis.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl AnalysisError {
    pub(crate) fn insufficient(needed: usize, available: usize, what: &str) -> Self {
        AnalysisError::InvalidInput(format!(
            "{what} needs at least {needed} samples, have {available}"
        ))
    }
}
