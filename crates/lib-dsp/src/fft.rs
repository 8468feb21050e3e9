//! Real-input FFT with a packed spectrum layout, using realfft.
//!
//! The packed layout stores the `N/2 + 1` unique bins of a real transform of
//! length `N` in exactly `N` reals:
//!
//! ```text
//! packed[0]       = Re X[0]          (DC, imaginary part is zero)
//! packed[i]       = Re X[i]          1 <= i < N/2
//! packed[N - i]   = Im X[i]          1 <= i < N/2
//! packed[N/2]     = Re X[N/2]        (Nyquist, imaginary part is zero)
//! ```
//!
//! Transform sizes are powers of two and never smaller than [`MIN_FFT_SIZE`].

use crate::error::{DspError, DspResult};
use num_complex::Complex64;
use realfft::RealFftPlanner;

/// Smallest transform size used for any input.
pub const MIN_FFT_SIZE: usize = 16;

/// Smallest power of two `>= n`, floored at [`MIN_FFT_SIZE`].
pub fn find_power_two(n: usize) -> usize {
    n.next_power_of_two().max(MIN_FFT_SIZE)
}

/// FFT engine with a cached real planner.
pub struct FftEngine {
    real_planner: RealFftPlanner<f64>,
}

impl FftEngine {
    /// Create a new FFT engine.
    pub fn new() -> Self {
        Self {
            real_planner: RealFftPlanner::new(),
        }
    }

    /// Perform forward real-to-complex FFT.
    ///
    /// Input: N real samples
    /// Output: N/2 + 1 complex samples, unnormalized
    pub fn rfft(&mut self, data: &[f64]) -> DspResult<Vec<Complex64>> {
        let len = data.len();
        if !len.is_power_of_two() {
            return Err(DspError::InvalidFftSize(len));
        }

        let r2c = self.real_planner.plan_fft_forward(len);
        let mut input = data.to_vec();
        let mut output = r2c.make_output_vec();

        r2c.process(&mut input, &mut output)
            .map_err(|e| DspError::NumericalInstability(e.to_string()))?;

        Ok(output)
    }

    /// Perform inverse complex-to-real FFT, normalized by 1/N.
    ///
    /// Input: N/2 + 1 complex samples
    /// Output: N real samples
    pub fn irfft(&mut self, data: &[Complex64], output_len: usize) -> DspResult<Vec<f64>> {
        if !output_len.is_power_of_two() {
            return Err(DspError::InvalidFftSize(output_len));
        }

        let expected_input_len = output_len / 2 + 1;
        if data.len() != expected_input_len {
            return Err(DspError::LengthMismatch {
                expected: expected_input_len,
                actual: data.len(),
            });
        }

        let c2r = self.real_planner.plan_fft_inverse(output_len);
        let mut input = data.to_vec();
        // DC and Nyquist of a real signal have no imaginary part.
        input[0].im = 0.0;
        input[expected_input_len - 1].im = 0.0;
        let mut output = c2r.make_output_vec();

        c2r.process(&mut input, &mut output)
            .map_err(|e| DspError::NumericalInstability(e.to_string()))?;

        let scale = 1.0 / output_len as f64;
        for x in output.iter_mut() {
            *x *= scale;
        }

        Ok(output)
    }

    /// Forward transform of a timeseries into the packed layout.
    ///
    /// The input is zero-padded to [`find_power_two`] of its length.
    pub fn forward_packed(&mut self, timeseries: &[f64]) -> DspResult<Vec<f64>> {
        let n = find_power_two(timeseries.len());
        let padded = zero_pad(timeseries, n);
        let bins = self.rfft(&padded)?;
        Ok(pack(&bins))
    }

    /// Inverse of a packed spectrum, truncated to the first `num_points`
    /// samples.
    pub fn inverse_packed(&mut self, packed: &[f64], num_points: usize) -> DspResult<Vec<f64>> {
        if num_points > packed.len() {
            return Err(DspError::InsufficientPoints {
                len: packed.len(),
                requested: num_points,
            });
        }
        if find_power_two(packed.len()) != packed.len() {
            return Err(DspError::InvalidFftSize(packed.len()));
        }

        let bins = unpack(packed);
        let mut out = self.irfft(&bins, packed.len())?;
        out.truncate(num_points);
        Ok(out)
    }
}

impl Default for FftEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Forward DFT into the packed layout with a fresh engine.
pub fn calc_dft(timeseries: &[f64]) -> DspResult<Vec<f64>> {
    FftEngine::new().forward_packed(timeseries)
}

/// Inverse DFT of a packed spectrum with a fresh engine.
pub fn inverse_dft(packed: &[f64], num_points: usize) -> DspResult<Vec<f64>> {
    FftEngine::new().inverse_packed(packed, num_points)
}

/// Pack `N/2 + 1` complex bins into `N` reals.
pub fn pack(bins: &[Complex64]) -> Vec<f64> {
    if bins.is_empty() {
        return Vec::new();
    }
    let n = 2 * (bins.len() - 1);
    let mut packed = vec![0.0; n.max(1)];
    packed[0] = bins[0].re;
    for i in 1..n / 2 {
        packed[i] = bins[i].re;
        packed[n - i] = bins[i].im;
    }
    if n > 0 {
        packed[n / 2] = bins[n / 2].re;
    }
    packed
}

/// Unpack `N` reals into `N/2 + 1` complex bins.
pub fn unpack(packed: &[f64]) -> Vec<Complex64> {
    let n = packed.len();
    if n < 2 {
        return packed.iter().map(|&re| Complex64::new(re, 0.0)).collect();
    }
    let mut bins = Vec::with_capacity(n / 2 + 1);
    bins.push(Complex64::new(packed[0], 0.0));
    for i in 1..n / 2 {
        bins.push(Complex64::new(packed[i], packed[n - i]));
    }
    bins.push(Complex64::new(packed[n / 2], 0.0));
    bins
}

/// Zero-pad a signal to a specific length.
pub fn zero_pad(signal: &[f64], new_len: usize) -> Vec<f64> {
    let mut result = signal.to_vec();
    if new_len > signal.len() {
        result.resize(new_len, 0.0);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    // Deterministic pseudo-random samples.
    fn noise(n: usize) -> Vec<f64> {
        let mut state: u32 = 0x2545_f491;
        (0..n)
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 17;
                state ^= state << 5;
                state as f64 / u32::MAX as f64 - 0.5
            })
            .collect()
    }

    #[test]
    fn test_find_power_two() {
        assert_eq!(find_power_two(0), 16);
        assert_eq!(find_power_two(1), 16);
        assert_eq!(find_power_two(10), 16);
        assert_eq!(find_power_two(16), 16);
        assert_eq!(find_power_two(17), 32);
        assert_eq!(find_power_two(1000), 1024);
    }

    #[test]
    fn test_rfft_irfft_roundtrip() {
        let mut engine = FftEngine::new();

        let n = 64;
        let signal: Vec<f64> = (0..n)
            .map(|i| {
                let t = i as f64 / n as f64;
                (2.0 * PI * 4.0 * t).sin()
            })
            .collect();

        let spectrum = engine.rfft(&signal).unwrap();
        let recovered = engine.irfft(&spectrum, n).unwrap();

        for (orig, rec) in signal.iter().zip(recovered.iter()) {
            assert!((orig - rec).abs() < 1e-10);
        }
    }

    #[test]
    fn test_packed_roundtrip_random() {
        let signal = noise(64);
        let packed = calc_dft(&signal).unwrap();
        assert_eq!(packed.len(), 64);

        let recovered = inverse_dft(&packed, signal.len()).unwrap();
        assert_eq!(recovered.len(), 64);
        for (orig, rec) in signal.iter().zip(recovered.iter()) {
            assert!((orig - rec).abs() <= 1e-4 * orig.abs().max(1e-3));
        }
    }

    #[test]
    fn test_padded_samples_discarded() {
        let signal = noise(10);
        let packed = calc_dft(&signal).unwrap();
        assert_eq!(packed.len(), 16);

        let recovered = inverse_dft(&packed, 10).unwrap();
        assert_eq!(recovered.len(), 10);
        for (orig, rec) in signal.iter().zip(recovered.iter()) {
            assert!((orig - rec).abs() < 1e-10);
        }
    }

    #[test]
    fn test_packed_layout() {
        // Cosine at bin 2 and sine at bin 3 of a 16 point transform.
        let n = 16;
        let signal: Vec<f64> = (0..n)
            .map(|i| {
                let t = i as f64 / n as f64;
                (2.0 * PI * 2.0 * t).cos() + (2.0 * PI * 3.0 * t).sin()
            })
            .collect();
        let packed = calc_dft(&signal).unwrap();

        assert!(packed[0].abs() < 1e-10);
        assert!((packed[2] - 8.0).abs() < 1e-10);
        assert!(packed[n - 2].abs() < 1e-10);
        assert!(packed[3].abs() < 1e-10);
        // e^{-jwt} convention: sin -> -j N/2.
        assert!((packed[n - 3] + 8.0).abs() < 1e-10);
    }

    #[test]
    fn test_pack_unpack_inverse() {
        let bins = vec![
            Complex64::new(1.0, 0.0),
            Complex64::new(2.0, 3.0),
            Complex64::new(4.0, 5.0),
            Complex64::new(6.0, 7.0),
            Complex64::new(8.0, 0.0),
        ];
        let packed = pack(&bins);
        assert_eq!(packed, vec![1.0, 2.0, 4.0, 6.0, 8.0, 7.0, 5.0, 3.0]);
        assert_eq!(unpack(&packed), bins);
    }

    #[test]
    fn test_inverse_rejects_bad_sizes() {
        let packed = vec![0.0; 24];
        assert!(matches!(inverse_dft(&packed, 10), Err(DspError::InvalidFftSize(24))));

        let packed = vec![0.0; 8];
        assert!(matches!(inverse_dft(&packed, 8), Err(DspError::InvalidFftSize(8))));

        let packed = vec![0.0; 16];
        assert!(matches!(
            inverse_dft(&packed, 17),
            Err(DspError::InsufficientPoints { len: 16, requested: 17 })
        ));
    }

    #[test]
    fn test_invalid_fft_size() {
        let mut engine = FftEngine::new();
        let data = vec![1.0; 100];

        let result = engine.rfft(&data);
        assert!(matches!(result, Err(DspError::InvalidFftSize(100))));
    }
}
