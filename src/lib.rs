//! Vibrascope: triaxial vibration collection and analysis
//!
//! Sensor producers stream samples to a collector, which keeps the most
//! recent ones in a bounded window. A window snapshot is then analyzed in
//! three independent domains.
//!
//! ## Architecture
//!
//! - **Acquisition**: wire decoding and the window fetcher client
//! - **Pipeline**: ingestion service, window buffer and sample feed
//! - **Processing**: FFT spectrum, discrete wavelet transform, statistics
//! - **API**: JSON over HTTP for dashboards and scripts

pub mod acquisition;
pub mod api;
pub mod config;
pub mod pipeline;
pub mod processing;
pub mod types;

// Re-export configuration
pub use config::VibrascopeConfig;

// Re-export commonly used types
pub use types::{
    Axis, IncompleteReason, SampleTimestamp, Spectrum, StatisticalSummary, VibrationSample,
    WaveletDecomposition, Window, WindowStatus,
};

// Re-export the acquisition surface
pub use acquisition::{decode, encode, DecodeError, FetchError, FetchedWindow, WindowFetcher};

// Re-export pipeline components
pub use pipeline::{IngestionService, SampleFeed, WindowBuffer};

// Re-export analyzers
pub use processing::{
    analyze_dwt, analyze_fft, analyze_stats, analyze_window, AnalysisError, AnalysisReport,
    AnalysisSettings,
};
