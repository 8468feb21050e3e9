//! Spectrum of a real timeseries held in the packed layout.

use crate::error::{DspError, DspResult};
use crate::fft::{find_power_two, inverse_dft, pack, unpack, FftEngine};
use lib_types::{Hertz, Seismogram};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

/// Packed real spectrum plus the metadata needed to interpret it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Spectrum {
    packed: Vec<f64>,
    orig_length: usize,
    sample_rate: Hertz,
}

impl Spectrum {
    /// Wrap a packed array. Its length must be a power of two (at least 16)
    /// and not shorter than the timeseries it came from.
    pub fn from_packed(packed: Vec<f64>, orig_length: usize, sample_rate: Hertz) -> DspResult<Self> {
        let n = packed.len();
        if find_power_two(n) != n {
            return Err(DspError::InvalidFftSize(n));
        }
        if n < orig_length {
            return Err(DspError::InsufficientPoints {
                len: n,
                requested: orig_length,
            });
        }
        Ok(Self {
            packed,
            orig_length,
            sample_rate,
        })
    }

    /// Build from the `N/2 + 1` unique bins. Imaginary parts of the first and
    /// last bins are dropped.
    pub fn from_complex(bins: &[Complex64], orig_length: usize, sample_rate: Hertz) -> DspResult<Self> {
        Self::from_packed(pack(bins), orig_length, sample_rate)
    }

    /// Build from amplitude and phase of the `N/2 + 1` unique bins.
    pub fn from_amp_phase(
        amp: &[f64],
        phase: &[f64],
        orig_length: usize,
        sample_rate: Hertz,
    ) -> DspResult<Self> {
        if amp.len() != phase.len() {
            return Err(DspError::LengthMismatch {
                expected: amp.len(),
                actual: phase.len(),
            });
        }
        let bins: Vec<Complex64> = amp
            .iter()
            .zip(phase)
            .map(|(&a, &p)| Complex64::from_polar(a, p))
            .collect();
        Self::from_complex(&bins, orig_length, sample_rate)
    }

    /// Forward transform of a timeseries.
    pub fn forward(engine: &mut FftEngine, timeseries: &[f64], sample_rate: Hertz) -> DspResult<Self> {
        let packed = engine.forward_packed(timeseries)?;
        Self::from_packed(packed, timeseries.len(), sample_rate)
    }

    pub fn packed(&self) -> &[f64] {
        &self.packed
    }

    /// Number of points in the transform (N).
    pub fn num_points(&self) -> usize {
        self.packed.len()
    }

    /// Length of the timeseries before padding.
    pub fn orig_length(&self) -> usize {
        self.orig_length
    }

    pub fn sample_rate(&self) -> Hertz {
        self.sample_rate
    }

    /// Index of the Nyquist bin (N/2).
    pub fn nyquist_index(&self) -> usize {
        self.packed.len() / 2
    }

    /// Real part of bin `i`, `0 <= i <= N/2`.
    pub fn real(&self, i: usize) -> f64 {
        self.packed[i]
    }

    /// Imaginary part of bin `i`; zero for DC and Nyquist.
    pub fn imag(&self, i: usize) -> f64 {
        if i == 0 || i == self.nyquist_index() {
            0.0
        } else {
            self.packed[self.packed.len() - i]
        }
    }

    pub fn bin(&self, i: usize) -> Complex64 {
        Complex64::new(self.real(i), self.imag(i))
    }

    /// Store bin `i`. The imaginary part is dropped for DC and Nyquist.
    pub fn set_bin(&mut self, i: usize, value: Complex64) {
        let n = self.packed.len();
        self.packed[i] = value.re;
        if i != 0 && i != n / 2 {
            self.packed[n - i] = value.im;
        }
    }

    /// The `N/2 + 1` unique bins.
    pub fn as_complex(&self) -> Vec<Complex64> {
        unpack(&self.packed)
    }

    /// Amplitude and phase of every unique bin.
    pub fn as_amp_phase(&self) -> (Vec<f64>, Vec<f64>) {
        self.as_complex().iter().map(|c| (c.norm(), c.arg())).unzip()
    }

    pub fn amplitudes(&self) -> Vec<f64> {
        self.as_complex().iter().map(|c| c.norm()).collect()
    }

    pub fn phases(&self) -> Vec<f64> {
        self.as_complex().iter().map(|c| c.arg()).collect()
    }

    /// Spacing between bins: `sample_rate / N`.
    pub fn fundamental_frequency(&self) -> f64 {
        self.sample_rate.0 / self.packed.len() as f64
    }

    /// Frequency of every unique bin, DC to Nyquist.
    pub fn frequencies(&self) -> Vec<f64> {
        let df = self.fundamental_frequency();
        (0..self.num_frequencies()).map(|i| i as f64 * df).collect()
    }

    pub fn num_frequencies(&self) -> usize {
        self.packed.len() / 2 + 1
    }

    pub fn min_frequency(&self) -> f64 {
        self.fundamental_frequency()
    }

    pub fn max_frequency(&self) -> f64 {
        self.sample_rate.nyquist().0
    }

    /// Inverse transform back to `orig_length` samples.
    pub fn inverse(&self) -> DspResult<Vec<f64>> {
        inverse_dft(&self.packed, self.orig_length)
    }
}

/// Spectrum of a gap-free seismogram.
pub fn fft_forward(seismogram: &Seismogram) -> DspResult<Spectrum> {
    if seismogram.segments.is_empty() {
        return Err(DspError::EmptyData("FFT"));
    }
    let merged = seismogram.merged().ok_or(DspError::NotContiguous("FFT"))?;
    let mut engine = FftEngine::new();
    Spectrum::forward(&mut engine, &merged.samples, merged.sample_rate())
}
