//! Raised-cosine frequency taper.
//!
//! ```text
//!  1 |          ___________
//!    |         /           \
//!  0 |________/             \________
//!        lowCut lowPass  highPass highCut
//! ```

use crate::error::{DspError, DspResult};
use crate::spectrum::Spectrum;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Four-corner band-limiting taper, validated on construction.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FreqTaper {
    low_cut: f64,
    low_pass: f64,
    high_pass: f64,
    high_cut: f64,
}

impl FreqTaper {
    /// Requires `low_cut <= low_pass <= high_pass <= high_cut`.
    pub fn new(low_cut: f64, low_pass: f64, high_pass: f64, high_cut: f64) -> DspResult<Self> {
        if !(low_cut <= low_pass && low_pass <= high_pass && high_pass <= high_cut) {
            return Err(DspError::InvalidCorners {
                low_cut,
                low_pass,
                high_pass,
                high_cut,
            });
        }
        Ok(Self {
            low_cut,
            low_pass,
            high_pass,
            high_cut,
        })
    }

    pub fn corners(&self) -> (f64, f64, f64, f64) {
        (self.low_cut, self.low_pass, self.high_pass, self.high_cut)
    }

    /// Taper weight at `freq`, in `[0, 1]`.
    pub fn at(&self, freq: f64) -> f64 {
        if freq <= self.low_cut || freq >= self.high_cut {
            return 0.0;
        }
        if freq >= self.low_pass && freq <= self.high_pass {
            return 1.0;
        }
        if freq < self.low_pass {
            return 0.5 * (1.0 + (PI * (freq - self.low_pass) / (self.low_cut - self.low_pass)).cos());
        }
        0.5 * (1.0 - (PI * (freq - self.high_cut) / (self.high_pass - self.high_cut)).cos())
    }
}

/// Taper weight for one frequency, validating the corners on every call.
pub fn calc_freq_taper(
    freq: f64,
    low_cut: f64,
    low_pass: f64,
    high_pass: f64,
    high_cut: f64,
) -> DspResult<f64> {
    Ok(FreqTaper::new(low_cut, low_pass, high_pass, high_cut)?.at(freq))
}

/// Scale the amplitude of every bin by the taper, keeping phases. DC is
/// forced to zero.
pub fn apply_freq_taper(spectrum: &Spectrum, taper: &FreqTaper) -> DspResult<Spectrum> {
    let df = spectrum.fundamental_frequency();
    let (amp, phase) = spectrum.as_amp_phase();
    let tapered: Vec<f64> = amp
        .iter()
        .enumerate()
        .map(|(i, a)| if i == 0 { 0.0 } else { a * taper.at(i as f64 * df) })
        .collect();
    Spectrum::from_amp_phase(&tapered, &phase, spectrum.orig_length(), spectrum.sample_rate())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fft::FftEngine;
    use lib_types::Hertz;

    #[test]
    fn test_taper_shape() {
        let taper = |f| calc_freq_taper(f, 1.0, 2.0, 8.0, 10.0).unwrap();

        assert_eq!(taper(0.5), 0.0);
        assert_eq!(taper(1.0), 0.0);
        assert_eq!(taper(11.0), 0.0);
        assert_eq!(taper(5.0), 1.0);
        assert_eq!(taper(2.0), 1.0);
        assert_eq!(taper(8.0), 1.0);

        let low = taper(1.5);
        assert!(low > 0.0 && low < 1.0);
        assert!((low - 0.5).abs() < 1e-12);
        assert!(taper(1.25) < low && low < taper(1.75));

        let high = taper(9.0);
        assert!(high > 0.0 && high < 1.0);
        assert!((high - 0.5).abs() < 1e-12);
        assert!(taper(8.5) > high && high > taper(9.5));
    }

    #[test]
    fn test_corner_order_enforced() {
        assert!(matches!(
            calc_freq_taper(5.0, 2.0, 1.0, 8.0, 10.0),
            Err(DspError::InvalidCorners { .. })
        ));
        assert!(FreqTaper::new(1.0, 2.0, 11.0, 10.0).is_err());
        assert!(FreqTaper::new(0.0, 0.0, 10.0, 10.0).is_ok());
    }

    #[test]
    fn test_apply_freq_taper() {
        let mut engine = FftEngine::new();
        let signal: Vec<f64> = (0..64).map(|i| 1.0 + (i as f64 * 0.3).sin()).collect();
        let spec = Spectrum::forward(&mut engine, &signal, Hertz(64.0)).unwrap();

        // Bin spacing is 1 Hz; pass 5..20 Hz only.
        let taper = FreqTaper::new(4.0, 5.0, 20.0, 21.0).unwrap();
        let tapered = apply_freq_taper(&spec, &taper).unwrap();

        let amp = tapered.amplitudes();
        let orig = spec.amplitudes();
        assert_eq!(amp[0], 0.0);
        assert!(amp[3].abs() < 1e-9);
        assert!((amp[10] - orig[10]).abs() < 1e-9);
        assert!(amp[25].abs() < 1e-9);

        let phase = tapered.phases();
        assert!((phase[10] - spec.phases()[10]).abs() < 1e-9);
    }
}
