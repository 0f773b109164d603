//! Discrete wavelet transform
//!
//! Multi-level orthogonal DWT for time-frequency inspection of a window.
//!
//! Each level convolves the current approximation with the decomposition
//! low-pass and high-pass filters and keeps every second output. The signal is
//! extended at both edges by half-sample symmetric reflection
//! (`... x1 x0 | x0 x1 ... xn-1 | xn-1 xn-2 ...`), so a level with input
//! length `n` and filter length `F` yields `floor((n + F - 1) / 2)`
//! coefficients per band.
//!
//! ## Supported Wavelets
//!
//! - `haar` / `db1`: 2 taps, good for step detection
//! - `db2`, `db3`, `db4`: Daubechies with 4, 6 and 8 taps
//! - `sym4`: near-symmetric 8-tap variant of Daubechies

use super::AnalysisError;
use crate::types::WaveletDecomposition;

/// Wavelet family selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaveletFamily {
    /// Haar wavelet (db1).
    Haar,
    Db2,
    Db3,
    /// Daubechies 4 vanishing moments, 8 taps.
    Db4,
    /// Symlet 4, 8 taps.
    Sym4,
}

impl WaveletFamily {
    /// Accepted configuration names.
    pub const NAMES: [&'static str; 6] = ["haar", "db1", "db2", "db3", "db4", "sym4"];

    /// Look up a family by (case-insensitive) name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "haar" | "db1" => Some(Self::Haar),
            "db2" => Some(Self::Db2),
            "db3" => Some(Self::Db3),
            "db4" => Some(Self::Db4),
            "sym4" => Some(Self::Sym4),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Haar => "haar",
            Self::Db2 => "db2",
            Self::Db3 => "db3",
            Self::Db4 => "db4",
            Self::Sym4 => "sym4",
        }
    }

    /// Decomposition low-pass filter, in convolution order.
    pub fn dec_lo(self) -> &'static [f64] {
        match self {
            Self::Haar => &[std::f64::consts::FRAC_1_SQRT_2, std::f64::consts::FRAC_1_SQRT_2],
            Self::Db2 => &[
                -0.129_409_522_551_260_37,
                0.224_143_868_042_013_4,
                0.836_516_303_737_807_9,
                0.482_962_913_144_534_16,
            ],
            Self::Db3 => &[
                0.035_226_291_882_100_656,
                -0.085_441_273_882_241_49,
                -0.135_011_020_010_390_84,
                0.459_877_502_119_331_3,
                0.806_891_509_313_338_8,
                0.332_670_552_950_956_9,
            ],
            Self::Db4 => &[
                -0.010_597_401_785_069_032,
                0.032_883_011_666_885_2,
                0.030_841_381_835_560_764,
                -0.187_034_811_719_093_09,
                -0.027_983_769_416_859_85,
                0.630_880_767_929_858_7,
                0.714_846_570_552_915_4,
                0.230_377_813_308_896_4,
            ],
            Self::Sym4 => &[
                -0.075_765_714_789_273_33,
                -0.029_635_527_645_998_51,
                0.497_618_667_632_015_45,
                0.803_738_751_805_916_1,
                0.297_857_795_605_277_36,
                -0.099_219_543_576_847_22,
                -0.012_603_967_262_037_833,
                0.032_223_100_604_042_7,
            ],
        }
    }

    /// Decomposition high-pass filter from the quadrature mirror relation
    /// `hi[k] = (-1)^(k+1) * lo[F-1-k]`.
    pub fn dec_hi(self) -> Vec<f64> {
        let lo = self.dec_lo();
        let n = lo.len();
        (0..n)
            .map(|k| {
                let sign = if k % 2 == 0 { -1.0 } else { 1.0 };
                sign * lo[n - 1 - k]
            })
            .collect()
    }

    pub fn filter_len(self) -> usize {
        self.dec_lo().len()
    }
}

impl std::fmt::Display for WaveletFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Deepest useful decomposition for a signal of `data_len` samples:
/// the largest `L` with `(F - 1) * 2^L <= data_len`.
pub fn max_decomposition_level(data_len: usize, filter_len: usize) -> usize {
    if filter_len < 2 || data_len < filter_len - 1 {
        return 0;
    }
    let step = filter_len - 1;
    let mut level = 0;
    while step
        .checked_mul(1usize << (level + 1))
        .is_some_and(|needed| needed <= data_len)
    {
        level += 1;
    }
    level
}

/// Multi-level DWT of `values`.
///
/// Returns `levels + 1` coefficient arrays: the coarsest approximation first,
/// then detail bands from coarsest to finest.
///
/// # Errors
/// [`AnalysisError::InvalidInput`] for an unknown wavelet name, `levels == 0`,
/// or a signal too short for the requested depth.
pub fn analyze_dwt(
    values: &[f64],
    wavelet_family: &str,
    levels: usize,
) -> Result<WaveletDecomposition, AnalysisError> {
    let family = WaveletFamily::from_name(wavelet_family).ok_or_else(|| {
        AnalysisError::InvalidInput(format!(
            "unknown wavelet '{}' (supported: {})",
            wavelet_family,
            WaveletFamily::NAMES.join(", ")
        ))
    })?;

    if levels == 0 {
        return Err(AnalysisError::InvalidInput(
            "wavelet decomposition needs at least 1 level".to_string(),
        ));
    }

    let filter_len = family.filter_len();
    let max_level = max_decomposition_level(values.len(), filter_len);
    if levels > max_level {
        let needed = (filter_len - 1).saturating_mul(1usize << levels.min(usize::BITS as usize - 1));
        return Err(AnalysisError::InvalidInput(format!(
            "{levels}-level {family} decomposition needs at least {needed} samples, have {} (max level {max_level})",
            values.len()
        )));
    }

    let lo = family.dec_lo();
    let hi = family.dec_hi();

    let mut approx = values.to_vec();
    let mut details = Vec::with_capacity(levels);
    for _ in 0..levels {
        let (a, d) = single_level(&approx, lo, &hi);
        details.push(d);
        approx = a;
    }

    let mut coefficients = Vec::with_capacity(levels + 1);
    coefficients.push(approx);
    coefficients.extend(details.into_iter().rev());

    Ok(WaveletDecomposition {
        wavelet: family.name().to_string(),
        levels,
        coefficients,
    })
}

/// One analysis step: filter, downsample by 2.
fn single_level(input: &[f64], lo: &[f64], hi: &[f64]) -> (Vec<f64>, Vec<f64>) {
    let n = input.len();
    let f = lo.len();
    let out_len = (n + f - 1) / 2;

    let mut approx = Vec::with_capacity(out_len);
    let mut detail = Vec::with_capacity(out_len);

    for o in 0..out_len {
        // Full-convolution output index 2o+1
        let center = (2 * o + 1) as isize;
        let mut lo_sum = 0.0;
        let mut hi_sum = 0.0;
        for (j, (&l, &h)) in lo.iter().zip(hi.iter()).enumerate() {
            let x = input[symmetric_index(center - j as isize, n)];
            lo_sum += l * x;
            hi_sum += h * x;
        }
        approx.push(lo_sum);
        detail.push(hi_sum);
    }

    (approx, detail)
}

/// Map an out-of-range index into `0..n` by half-sample symmetric reflection.
fn symmetric_index(idx: isize, n: usize) -> usize {
    let period = 2 * n as isize;
    let m = idx.rem_euclid(period);
    if m < n as isize {
        m as usize
    } else {
        (period - 1 - m) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_1_SQRT_2, PI};

    #[test]
    fn test_filters_are_orthonormal() {
        for name in ["haar", "db2", "db3", "db4", "sym4"] {
            let family = WaveletFamily::from_name(name).unwrap();
            let lo = family.dec_lo();
            let hi = family.dec_hi();

            let lo_sum: f64 = lo.iter().sum();
            let hi_sum: f64 = hi.iter().sum();
            let lo_energy: f64 = lo.iter().map(|c| c * c).sum();
            assert!((lo_sum - 2f64.sqrt()).abs() < 1e-9, "{name} lo sum {lo_sum}");
            assert!(hi_sum.abs() < 1e-9, "{name} hi sum {hi_sum}");
            assert!((lo_energy - 1.0).abs() < 1e-9, "{name} lo energy {lo_energy}");
        }
    }

    #[test]
    fn test_haar_single_level_values() {
        let dec = analyze_dwt(&[1.0, 2.0, 3.0, 5.0], "haar", 1).unwrap();
        assert_eq!(dec.coefficients.len(), 2);
        let approx = &dec.coefficients[0];
        let detail = &dec.coefficients[1];
        assert!((approx[0] - 3.0 * FRAC_1_SQRT_2).abs() < 1e-12);
        assert!((approx[1] - 8.0 * FRAC_1_SQRT_2).abs() < 1e-12);
        assert!((detail[0] - (-1.0 * FRAC_1_SQRT_2)).abs() < 1e-12);
        assert!((detail[1] - (-2.0 * FRAC_1_SQRT_2)).abs() < 1e-12);
    }

    #[test]
    fn test_level_count_and_lengths() {
        let signal: Vec<f64> = (0..500).map(|i| (2.0 * PI * i as f64 / 37.0).sin()).collect();
        for levels in 1..=6 {
            let dec = analyze_dwt(&signal, "db4", levels).unwrap();
            assert_eq!(dec.coefficients.len(), levels + 1);
            assert_eq!(dec.levels, levels);
        }

        // db4, n = 500: finest detail floor(507/2) = 253, next floor(260/2) = 130, ...
        let dec = analyze_dwt(&signal, "db4", 4).unwrap();
        let lens: Vec<usize> = dec.coefficients.iter().map(Vec::len).collect();
        assert_eq!(lens, vec![37, 37, 68, 130, 253]);
    }

    #[test]
    fn test_constant_signal_has_zero_details() {
        let signal = vec![3.0; 128];
        for name in WaveletFamily::NAMES {
            let dec = analyze_dwt(&signal, name, 3).unwrap();
            for band in dec.details() {
                assert!(band.iter().all(|c| c.abs() < 1e-9), "{name}: {band:?}");
            }
            // Each level scales a constant by sqrt(2)
            let expected = 3.0 * 2f64.sqrt().powi(3);
            assert!(dec
                .approximation()
                .iter()
                .all(|c| (c - expected).abs() < 1e-9));
        }
    }

    #[test]
    fn test_max_decomposition_level() {
        assert_eq!(max_decomposition_level(500, 8), 6);
        assert_eq!(max_decomposition_level(500, 2), 8);
        assert_eq!(max_decomposition_level(7, 8), 0);
        assert_eq!(max_decomposition_level(14, 8), 1);
        assert_eq!(max_decomposition_level(0, 2), 0);
    }

    #[test]
    fn test_too_short_for_depth() {
        let signal = vec![1.0; 20];
        // db4: max level for 20 samples is floor(log2(20/7)) = 1
        assert!(analyze_dwt(&signal, "db4", 1).is_ok());
        let err = analyze_dwt(&signal, "db4", 2).unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidInput(_)));
        assert!(analyze_dwt(&[], "haar", 1).is_err());
    }

    #[test]
    fn test_invalid_parameters() {
        let signal = vec![0.0; 64];
        assert!(analyze_dwt(&signal, "morlet", 2).is_err());
        assert!(analyze_dwt(&signal, "db4", 0).is_err());
        assert!(analyze_dwt(&signal, "DB4", 2).is_ok());
    }

    #[test]
    fn test_symmetric_index() {
        assert_eq!(symmetric_index(-1, 4), 0);
        assert_eq!(symmetric_index(-2, 4), 1);
        assert_eq!(symmetric_index(4, 4), 3);
        assert_eq!(symmetric_index(5, 4), 2);
        assert_eq!(symmetric_index(2, 4), 2);
    }
}
