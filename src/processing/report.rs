//! Combined analysis of one axis of a window.

use serde::{Deserialize, Serialize};

use super::{analyze_dwt, analyze_fft, analyze_stats, AnalysisError};
use crate::config::defaults;
use crate::types::{
    Axis, Spectrum, StatisticalSummary, WaveletDecomposition, Window, WindowStatus,
};

/// Parameters shared by the analyzers of one report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSettings {
    pub sampling_rate: f64,
    pub wavelet: String,
    pub levels: usize,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            sampling_rate: defaults::SAMPLING_RATE_HZ,
            wavelet: defaults::WAVELET.to_string(),
            levels: defaults::DECOMPOSITION_LEVELS,
        }
    }
}

/// Outcome of one analyzer, serialized as `{"ok": ...}` or `{"error": "..."}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PanelResult<T> {
    Ok(T),
    Error(String),
}

impl<T> PanelResult<T> {
    pub fn as_ok(&self) -> Option<&T> {
        match self {
            PanelResult::Ok(v) => Some(v),
            PanelResult::Error(_) => None,
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, PanelResult::Ok(_))
    }
}

impl<T> From<Result<T, AnalysisError>> for PanelResult<T> {
    fn from(result: Result<T, AnalysisError>) -> Self {
        match result {
            Ok(v) => PanelResult::Ok(v),
            Err(e) => PanelResult::Error(e.to_string()),
        }
    }
}

/// Strongest non-DC spectral component.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpectralPeak {
    pub frequency: f64,
    pub magnitude: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub axis: Axis,
    pub sample_count: usize,
    pub window: WindowStatus,
    pub settings: AnalysisSettings,
    pub spectrum: PanelResult<Spectrum>,
    pub wavelet: PanelResult<WaveletDecomposition>,
    pub statistics: PanelResult<StatisticalSummary>,
    pub peak: Option<SpectralPeak>,
}

impl AnalysisReport {
    /// True when every panel produced a result.
    pub fn all_panels_ok(&self) -> bool {
        self.spectrum.is_ok() && self.wavelet.is_ok() && self.statistics.is_ok()
    }
}

/// Run the spectral, wavelet and statistical analyzers on `axis` of `window`.
///
/// Analyzers run in parallel and fail independently; a failed panel is
/// recorded in its own [`PanelResult`].
pub fn analyze_window(
    window: &Window,
    axis: Axis,
    status: WindowStatus,
    settings: &AnalysisSettings,
) -> AnalysisReport {
    let values = window.axis_values(axis);

    let (spectrum, (wavelet, statistics)) = rayon::join(
        || analyze_fft(&values, settings.sampling_rate),
        || {
            rayon::join(
                || analyze_dwt(&values, &settings.wavelet, settings.levels),
                || analyze_stats(&values),
            )
        },
    );

    let peak = spectrum
        .as_ref()
        .ok()
        .and_then(Spectrum::peak)
        .map(|(frequency, magnitude)| SpectralPeak {
            frequency,
            magnitude,
        });

    AnalysisReport {
        axis,
        sample_count: window.len(),
        window: status,
        settings: settings.clone(),
        spectrum: spectrum.into(),
        wavelet: wavelet.into(),
        statistics: statistics.into(),
        peak,
    }
}
