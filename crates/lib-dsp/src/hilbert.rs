//! FIR Hilbert transform and envelope.

use crate::design::FirDesign;
use crate::error::{DspError, DspResult};
use crate::window::{apply_window, WindowType};
use lib_types::Seismogram;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

pub const DEFAULT_HALF_LENGTH: usize = 10;
pub const DEFAULT_LOW_EDGE: f64 = 0.05;
pub const DEFAULT_HIGH_EDGE: f64 = 0.95;

/// Centered, odd-symmetric Hilbert transformer of `2·half_length + 1` taps.
///
/// Edges are normalized so that 1.0 is the Nyquist frequency. The ideal
/// response is `-j·sign(ω)` on `[low_edge, high_edge]` and zero elsewhere.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct HilbertDesign {
    pub half_length: usize,
    pub low_edge: f64,
    pub high_edge: f64,
    #[serde(default)]
    pub window: WindowType,
}

impl Default for HilbertDesign {
    fn default() -> Self {
        Self::new(DEFAULT_HALF_LENGTH, DEFAULT_LOW_EDGE, DEFAULT_HIGH_EDGE)
    }
}

impl HilbertDesign {
    pub fn new(half_length: usize, low_edge: f64, high_edge: f64) -> Self {
        Self {
            half_length,
            low_edge,
            high_edge,
            window: WindowType::Hamming,
        }
    }

    pub fn with_window(mut self, window: WindowType) -> Self {
        self.window = window;
        self
    }

    fn validate(&self) -> DspResult<()> {
        if self.half_length == 0 {
            return Err(DspError::InvalidFilterDesign(
                "Hilbert transformer needs at least one tap each side".into(),
            ));
        }
        if !(0.0 <= self.low_edge && self.low_edge < self.high_edge && self.high_edge <= 1.0) {
            return Err(DspError::InvalidFilterDesign(format!(
                "Hilbert band edges must satisfy 0 <= low < high <= 1, got {} and {}",
                self.low_edge, self.high_edge
            )));
        }
        Ok(())
    }
}

impl FirDesign for HilbertDesign {
    fn coefficients(&self) -> DspResult<Vec<f64>> {
        self.validate()?;

        let a = PI * self.low_edge;
        let b = PI * self.high_edge;
        let n = self.half_length as i64;
        let mut taps: Vec<f64> = (-n..=n)
            .map(|k| {
                if k == 0 {
                    0.0
                } else {
                    let k = k as f64;
                    ((a * k).cos() - (b * k).cos()) / (PI * k)
                }
            })
            .collect();
        apply_window(&mut taps, self.window);

        if taps.iter().any(|c| c.is_nan()) {
            return Err(DspError::InvalidFilterDesign(format!(
                "Hilbert FIR coefficients include NaN: {:?}",
                taps
            )));
        }
        Ok(taps)
    }
}

/// Convolve with centered taps, treating samples outside the input as zero.
/// The output has the same length as the input.
fn centered_convolve(samples: &[f64], taps: &[f64]) -> Vec<f64> {
    let half = taps.len() / 2;
    let len = samples.len();
    (0..len)
        .map(|i| {
            taps.iter()
                .enumerate()
                .filter_map(|(j, h)| {
                    // tap j sits at lag j - half
                    let idx = (i + half).checked_sub(j)?;
                    samples.get(idx).map(|x| h * x)
                })
                .sum()
        })
        .collect()
}

/// Hilbert transform of a contiguous seismogram.
///
/// The output is aligned with the input and has the same length. A streaming
/// FIR would also emit the `2·half_length` samples of its tail; those are
/// dropped here on purpose.
pub fn hilbert(
    seismogram: &Seismogram,
    half_length: usize,
    low_edge: f64,
    high_edge: f64,
) -> DspResult<Seismogram> {
    hilbert_with(seismogram, &HilbertDesign::new(half_length, low_edge, high_edge))
}

/// Hilbert transform using an explicit design.
pub fn hilbert_with<D: FirDesign + ?Sized>(seismogram: &Seismogram, design: &D) -> DspResult<Seismogram> {
    let merged = seismogram
        .merged()
        .ok_or(DspError::NotContiguous("Cannot take hilbert of non-contiguous seismogram"))?;
    let taps = design.coefficients()?;
    let transformed = centered_convolve(&merged.samples, &taps);
    Ok(Seismogram::from_waveform(merged.clone_with_new_data(transformed)))
}

/// Instantaneous amplitude, `sqrt(y² + H[y]²)`, with the default transformer.
pub fn envelope(seismogram: &Seismogram) -> DspResult<Seismogram> {
    envelope_with(seismogram, &HilbertDesign::default())
}

/// Envelope using an explicit Hilbert design.
pub fn envelope_with<D: FirDesign + ?Sized>(seismogram: &Seismogram, design: &D) -> DspResult<Seismogram> {
    let merged = seismogram
        .merged()
        .ok_or(DspError::NotContiguous("Cannot take envelope of non-contiguous seismogram"))?;
    let taps = design.coefficients()?;
    let transformed = centered_convolve(&merged.samples, &taps);
    let amplitude = merged
        .samples
        .iter()
        .zip(&transformed)
        .map(|(y, h)| (y * y + h * h).sqrt())
        .collect();
    Ok(Seismogram::from_waveform(merged.clone_with_new_data(amplitude)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use lib_types::{Seconds, Unit, Waveform};

    fn sine_seismogram(n: usize, cycles_per_sample: f64) -> Seismogram {
        let samples = (0..n)
            .map(|i| (2.0 * PI * cycles_per_sample * i as f64).sin())
            .collect();
        Seismogram::from_waveform(Waveform::new(samples, Seconds(0.05), Seconds(3.0), Unit::METER_PER_SECOND))
    }

    #[test]
    fn test_coefficients_odd_symmetric() {
        let taps = HilbertDesign::default().coefficients().unwrap();
        assert_eq!(taps.len(), 21);
        assert_eq!(taps[10], 0.0);
        for k in 1..=10 {
            assert!((taps[10 + k] + taps[10 - k]).abs() < 1e-15);
        }
        // Symmetric band: even lags vanish.
        assert!(taps[12].abs() < 1e-12);
        assert!(taps[11] > 0.0);
    }

    #[test]
    fn test_window_choice() {
        let hamming = HilbertDesign::default().coefficients().unwrap();
        let rectangular = HilbertDesign::default()
            .with_window(WindowType::Rectangular)
            .coefficients()
            .unwrap();
        // Same center taps; Hamming only attenuates toward the ends.
        assert!((rectangular[11] - 2.0 / PI * (0.05 * PI).cos()).abs() < 1e-12);
        assert!(hamming[11].abs() < rectangular[11].abs());
        assert!(hamming[19].abs() < 0.2 * rectangular[19].abs());
    }

    #[test]
    fn test_invalid_edges() {
        let bad = |d: HilbertDesign| matches!(d.coefficients(), Err(DspError::InvalidFilterDesign(_)));
        assert!(bad(HilbertDesign::new(10, 0.6, 0.4)));
        assert!(bad(HilbertDesign::new(10, 0.05, 1.5)));
        assert!(bad(HilbertDesign::new(10, f64::NAN, 0.95)));
        assert!(bad(HilbertDesign::new(0, 0.05, 0.95)));
    }

    #[test]
    fn test_hilbert_shifts_sine_to_negative_cosine() {
        let f = 0.125;
        let out = hilbert(&sine_seismogram(200, f), 10, 0.05, 0.95).unwrap();
        let y = &out.segments[0].samples;
        assert_eq!(y.len(), 200);
        for i in 20..180 {
            let expected = -(2.0 * PI * f * i as f64).cos();
            assert!((y[i] - expected).abs() < 0.02, "i={}: {} vs {}", i, y[i], expected);
        }
        assert_eq!(out.segments[0].unit, Unit::METER_PER_SECOND);
        assert_eq!(out.segments[0].t_start, Seconds(3.0));
    }

    #[test]
    fn test_envelope_of_sine_is_flat() {
        let out = envelope(&sine_seismogram(300, 0.1)).unwrap();
        let y = &out.segments[0].samples;
        assert_eq!(y.len(), 300);
        assert!(y.iter().all(|v| *v >= 0.0));
        for v in &y[20..280] {
            assert!((v - 1.0).abs() < 0.03, "{}", v);
        }
    }

    #[test]
    fn test_requires_contiguous() {
        let seg = |t: f64| Waveform::new(vec![1.0; 50], Seconds(0.05), Seconds(t), Unit::METER);
        let gappy = Seismogram::new(vec![seg(0.0), seg(10.0)]);
        assert!(matches!(hilbert(&gappy, 10, 0.05, 0.95), Err(DspError::NotContiguous(_))));
        assert!(matches!(envelope(&gappy), Err(DspError::NotContiguous(_))));
        assert!(matches!(envelope(&Seismogram::new(vec![])), Err(DspError::NotContiguous(_))));
    }

    #[test]
    fn test_mixed_rates_are_rejected() {
        let first = Waveform::new(vec![1.0; 50], Seconds(0.05), Seconds(0.0), Unit::METER);
        let second = Waveform::new(vec![1.0; 50], Seconds(0.025), Seconds(2.5), Unit::METER);
        let seis = Seismogram::new(vec![first, second]);
        assert!(matches!(envelope(&seis), Err(DspError::NotContiguous(_))));
    }

    #[test]
    fn test_contiguous_segments_are_merged() {
        let first = Waveform::new(vec![1.0; 50], Seconds(0.05), Seconds(0.0), Unit::METER);
        let second = Waveform::new(vec![1.0; 50], Seconds(0.05), Seconds(2.5), Unit::METER);
        let out = hilbert(&Seismogram::new(vec![first, second]), 10, 0.05, 0.95).unwrap();
        assert_eq!(out.segments.len(), 1);
        assert_eq!(out.num_points(), 100);
    }
}
