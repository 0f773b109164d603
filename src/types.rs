//! Core data types for vibration collection and analysis
//!
//! Samples arrive from producers, accumulate in the window buffer, and are
//! handed to the analyzers as owned [`Window`] snapshots. The analyzer outputs
//! ([`Spectrum`], [`WaveletDecomposition`], [`StatisticalSummary`]) are plain
//! data for the presentation layer.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Samples
// ============================================================================

/// Producer-supplied timestamp. Sensors differ: some send Unix seconds, some
/// send an ISO string. Both are carried through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SampleTimestamp {
    /// Seconds since the Unix epoch (fractional allowed)
    Unix(f64),
    /// Free-form text timestamp
    Text(String),
}

/// One triaxial vibration reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VibrationSample {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<SampleTimestamp>,
}

impl VibrationSample {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self {
            x,
            y,
            z,
            timestamp: None,
        }
    }

    pub fn with_timestamp(mut self, timestamp: SampleTimestamp) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Value on a single axis.
    pub fn axis(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        }
    }
}

/// Accelerometer axis selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    #[default]
    X,
    Y,
    Z,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::X => write!(f, "x"),
            Axis::Y => write!(f, "y"),
            Axis::Z => write!(f, "z"),
        }
    }
}

impl FromStr for Axis {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "x" => Ok(Axis::X),
            "y" => Ok(Axis::Y),
            "z" => Ok(Axis::Z),
            other => Err(format!("unknown axis '{}', expected x, y or z", other)),
        }
    }
}

// ============================================================================
// Window
// ============================================================================

/// Ordered snapshot of samples, oldest first.
///
/// A `Window` is always an owned copy. Nothing hands out mutable access, so a
/// snapshot never changes after the buffer it came from moves on.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Window {
    samples: Vec<VibrationSample>,
}

impl Window {
    pub fn new(samples: Vec<VibrationSample>) -> Self {
        Self { samples }
    }

    pub fn samples(&self) -> &[VibrationSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Extract one axis as a value sequence in arrival order.
    pub fn axis_values(&self, axis: Axis) -> Vec<f64> {
        self.samples.iter().map(|s| s.axis(axis)).collect()
    }

    pub fn into_samples(self) -> Vec<VibrationSample> {
        self.samples
    }
}

impl FromIterator<VibrationSample> for Window {
    fn from_iter<I: IntoIterator<Item = VibrationSample>>(iter: I) -> Self {
        Self {
            samples: iter.into_iter().collect(),
        }
    }
}

/// Whether a fetched window reached its target size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum WindowStatus {
    /// Exactly the requested number of samples was collected.
    Complete,
    /// Collection stopped early; the window holds what arrived before that.
    Incomplete { reason: IncompleteReason },
}

impl WindowStatus {
    pub fn is_complete(&self) -> bool {
        matches!(self, WindowStatus::Complete)
    }
}

/// Why a fetch ended before reaching its target count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncompleteReason {
    /// The fetch deadline expired.
    TimedOut,
    /// The remote side closed the connection cleanly.
    ConnectionClosed,
    /// The connection failed mid-stream.
    ConnectionLost(String),
    /// A buffer snapshot held fewer samples than requested.
    InsufficientData,
}

impl fmt::Display for IncompleteReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IncompleteReason::TimedOut => write!(f, "timed out"),
            IncompleteReason::ConnectionClosed => write!(f, "connection closed by remote"),
            IncompleteReason::ConnectionLost(e) => write!(f, "connection lost: {}", e),
            IncompleteReason::InsufficientData => write!(f, "fewer samples buffered than requested"),
        }
    }
}

// ============================================================================
// Analyzer outputs
// ============================================================================

/// One-sided magnitude spectrum of a real signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spectrum {
    /// Frequency bins (Hz), ascending from 0
    pub frequencies: Vec<f64>,
    /// |X[k]| for each bin, unnormalized
    pub magnitudes: Vec<f64>,
    /// Sampling rate the bins were computed for
    pub sample_rate: f64,
}

impl Spectrum {
    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }

    /// Frequency spacing between bins (Hz).
    pub fn resolution(&self) -> f64 {
        self.frequencies.get(1).copied().unwrap_or(0.0)
    }
}

/// Multi-level DWT coefficients.
///
/// `coefficients[0]` is the level-`levels` approximation; the remaining
/// entries are detail bands from coarsest to finest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaveletDecomposition {
    pub wavelet: String,
    pub levels: usize,
    pub coefficients: Vec<Vec<f64>>,
}

impl WaveletDecomposition {
    pub fn approximation(&self) -> &[f64] {
        self.coefficients.first().map_or(&[], Vec::as_slice)
    }

    /// Detail bands, coarsest first.
    pub fn details(&self) -> &[Vec<f64>] {
        self.coefficients.get(1..).unwrap_or(&[])
    }

    /// Sum of squared coefficients per band, in `coefficients` order.
    pub fn energy_per_band(&self) -> Vec<f64> {
        self.coefficients
            .iter()
            .map(|band| band.iter().map(|c| c * c).sum())
            .collect()
    }
}

/// Descriptive statistics of one axis.
///
/// `skewness` and `kurtosis` are `None` when the input has zero variance
/// (including a single sample), where both are undefined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticalSummary {
    pub mean: f64,
    pub std_dev: f64,
    pub skewness: Option<f64>,
    /// Excess (Fisher) kurtosis
    pub kurtosis: Option<f64>,
    pub max: f64,
    pub min: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_axis_parse_and_display() {
        assert_eq!("x".parse::<Axis>().unwrap(), Axis::X);
        assert_eq!(" Y ".parse::<Axis>().unwrap(), Axis::Y);
        assert!("w".parse::<Axis>().is_err());
        assert_eq!(Axis::Z.to_string(), "z");
    }

    #[test]
    fn test_window_axis_values_preserve_order() {
        let window: Window = (0..4)
            .map(|i| VibrationSample::new(i as f64, -(i as f64), 10.0))
            .collect();
        assert_eq!(window.axis_values(Axis::X), vec![0.0, 1.0, 2.0, 3.0]);
        assert_eq!(window.axis_values(Axis::Y), vec![0.0, -1.0, -2.0, -3.0]);
        assert_eq!(window.axis_values(Axis::Z), vec![10.0; 4]);
    }

    #[test]
    fn test_window_status_serialization() {
        let json = serde_json::to_value(WindowStatus::Incomplete {
            reason: IncompleteReason::TimedOut,
        })
        .unwrap();
        assert_eq!(json["status"], "incomplete");
        assert_eq!(json["reason"], "timed_out");

        let json = serde_json::to_value(WindowStatus::Complete).unwrap();
        assert_eq!(json["status"], "complete");
    }

    #[test]
    fn test_wavelet_accessors() {
        let dec = WaveletDecomposition {
            wavelet: "haar".to_string(),
            levels: 2,
            coefficients: vec![vec![2.0], vec![1.0], vec![0.5, 0.5]],
        };
        assert_eq!(dec.approximation(), &[2.0]);
        assert_eq!(dec.details().len(), 2);
        assert_eq!(dec.energy_per_band(), vec![4.0, 1.0, 0.5]);
    }
}
