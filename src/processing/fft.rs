//! FFT computation using rustfft
//!
//! One-sided magnitude spectrum of a real vibration signal.
//!
//! The transform runs over the full window (no zero padding, no windowing
//! function) and keeps bins `0..n/2`: a real signal's spectrum is conjugate
//! symmetric, so the upper half carries no extra information. Magnitudes are
//! raw `|X[k]|` without amplitude scaling.
//!
//! # Example
//!
//! ```
//! use vibrascope::processing::{analyze_fft, find_dominant_frequencies};
//!
//! let rate = 1000.0;
//! let samples: Vec<f64> = (0..1000)
//!     .map(|i| (2.0 * std::f64::consts::PI * 50.0 * i as f64 / rate).sin())
//!     .collect();
//! let spectrum = analyze_fft(&samples, rate).unwrap();
//! let (peak_hz, _) = find_dominant_frequencies(&spectrum, 1)[0];
//! assert!((peak_hz - 50.0).abs() < 1.0);
//! ```

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use std::sync::Arc;

use super::AnalysisError;
use crate::types::Spectrum;

// ============================================================================
// Standalone FFT Functions
// ============================================================================

/// Compute the one-sided magnitude spectrum of `values`.
///
/// Bin `i` sits at `i * sampling_rate / n` for `i` in `0..n/2`.
///
/// # Errors
/// [`AnalysisError::InvalidInput`] when fewer than 2 values are given or the
/// sampling rate is not a positive finite number.
pub fn analyze_fft(values: &[f64], sampling_rate: f64) -> Result<Spectrum, AnalysisError> {
    if values.len() < 2 {
        return Err(AnalysisError::insufficient(2, values.len(), "FFT"));
    }
    FftProcessor::new(values.len(), sampling_rate)?.compute(values)
}

/// Largest-magnitude bin excluding DC, as `(frequency, magnitude)`.
pub fn spectral_peak(spectrum: &Spectrum) -> Option<(f64, f64)> {
    spectrum
        .frequencies
        .iter()
        .zip(spectrum.magnitudes.iter())
        .skip(1)
        .max_by(|(_, a), (_, b)| a.total_cmp(b))
        .map(|(&f, &m)| (f, m))
}

/// Find dominant frequencies in a spectrum using true peak detection.
///
/// Identifies local maxima (peaks) where the amplitude is higher than
/// both neighboring bins, then returns the top N by amplitude.
///
/// # Returns
/// Vector of (frequency, magnitude) tuples sorted by magnitude descending
pub fn find_dominant_frequencies(spectrum: &Spectrum, n_peaks: usize) -> Vec<(f64, f64)> {
    let mags = &spectrum.magnitudes;
    if mags.len() < 3 {
        let mut all: Vec<(f64, f64)> = spectrum
            .frequencies
            .iter()
            .zip(mags.iter())
            .map(|(&f, &m)| (f, m))
            .collect();
        all.sort_by(|a, b| b.1.total_cmp(&a.1));
        all.truncate(n_peaks);
        return all;
    }

    let mut peaks: Vec<(f64, f64)> = mags
        .windows(3)
        .enumerate()
        .filter(|(_, w)| w[1] > w[0] && w[1] > w[2])
        .map(|(i, w)| (spectrum.frequencies[i + 1], w[1]))
        .collect();

    peaks.sort_by(|a, b| b.1.total_cmp(&a.1));
    peaks.truncate(n_peaks);
    peaks
}

impl Spectrum {
    /// See [`spectral_peak`].
    pub fn peak(&self) -> Option<(f64, f64)> {
        spectral_peak(self)
    }

    /// See [`find_dominant_frequencies`].
    pub fn dominant_frequencies(&self, n_peaks: usize) -> Vec<(f64, f64)> {
        find_dominant_frequencies(self, n_peaks)
    }
}

// ============================================================================
// FFT Processor (Pre-planned for repeated use)
// ============================================================================

/// FFT processor with a pre-planned transform of one fixed length.
///
/// Use this when analyzing many windows of the same size.
pub struct FftProcessor {
    fft: Arc<dyn Fft<f64>>,
    size: usize,
    sampling_rate: f64,
}

impl FftProcessor {
    /// Plan a forward transform of exactly `size` points.
    pub fn new(size: usize, sampling_rate: f64) -> Result<Self, AnalysisError> {
        if !(sampling_rate.is_finite() && sampling_rate > 0.0) {
            return Err(AnalysisError::InvalidInput(format!(
                "sampling rate must be positive, got {sampling_rate}"
            )));
        }
        if size < 2 {
            return Err(AnalysisError::insufficient(2, size, "FFT"));
        }

        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(size);

        Ok(Self {
            fft,
            size,
            sampling_rate,
        })
    }

    /// Transform `signal`, which must have exactly the planned length.
    pub fn compute(&self, signal: &[f64]) -> Result<Spectrum, AnalysisError> {
        if signal.len() != self.size {
            return Err(AnalysisError::InvalidInput(format!(
                "FFT planned for {} samples, got {}",
                self.size,
                signal.len()
            )));
        }

        let mut buffer: Vec<Complex<f64>> = signal.iter().map(|&x| Complex::new(x, 0.0)).collect();
        self.fft.process(&mut buffer);

        let n_positive = self.size / 2;
        let magnitudes: Vec<f64> = buffer.iter().take(n_positive).map(|c| c.norm()).collect();

        Ok(Spectrum {
            frequencies: self.frequency_bins(),
            magnitudes,
            sample_rate: self.sampling_rate,
        })
    }

    /// Frequency bins for this FFT configuration
    pub fn frequency_bins(&self) -> Vec<f64> {
        let resolution = self.frequency_resolution();
        (0..self.size / 2).map(|i| i as f64 * resolution).collect()
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Hz per bin
    pub fn frequency_resolution(&self) -> f64 {
        self.sampling_rate / self.size as f64
    }
}

// ============================================================================
// Tests
// ============================================================================
