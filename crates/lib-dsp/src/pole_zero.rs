//! Canonical SAC-style pole-zero response.
//!
//! A [`SacPoleZero`] describes an analog response in angular frequency:
//!
//! ```text
//!            Π (s - z_k)
//! H(s) = C · -----------,   s = j·2π·f
//!            Π (s - p_k)
//! ```
//!
//! Instrument correction divides by `H`, so the primary evaluation is the
//! inverse, which stays finite where `H` has a zero.

use crate::error::{DspError, DspResult};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;

/// Poles, zeros and overall gain constant of an analog response.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SacPoleZero {
    pub poles: Vec<Complex64>,
    pub zeros: Vec<Complex64>,
    pub constant: f64,

    /// Zero-valued zeros appended to convert to displacement.
    #[serde(default)]
    pub gamma: Option<usize>,
    /// 2π for poles/zeros given in Hz, 1 for rad/s.
    #[serde(default = "unity")]
    pub angular_scale_factor: f64,
    /// Sensitivity after the gamma scaling.
    #[serde(default = "unity")]
    pub scaled_sensitivity: f64,
    /// Normalization factor after the gamma scaling.
    #[serde(default = "unity")]
    pub normalization_at_ref_freq: f64,
}

fn unity() -> f64 {
    1.0
}

impl SacPoleZero {
    pub fn new(poles: Vec<Complex64>, zeros: Vec<Complex64>, constant: f64) -> Self {
        Self {
            poles,
            zeros,
            constant,
            gamma: None,
            angular_scale_factor: 1.0,
            scaled_sensitivity: 1.0,
            normalization_at_ref_freq: 1.0,
        }
    }

    /// `1 / H(j·2π·freq)`, or `(0, 0)` when `s` sits exactly on a zero.
    pub fn eval_inverse(&self, freq: f64) -> Complex64 {
        let s = Complex64::new(0.0, 2.0 * PI * freq);

        let pole_product = self
            .poles
            .iter()
            .fold(Complex64::new(1.0, 0.0), |acc, p| acc * (s - *p));

        let mut zero_product = Complex64::new(1.0, 0.0);
        for z in &self.zeros {
            if s == *z {
                return Complex64::new(0.0, 0.0);
            }
            zero_product *= s - *z;
        }

        pole_product / zero_product / self.constant
    }

    /// `H(j·2π·freq)`; `(0, 0)` where the inverse is `(0, 0)`.
    pub fn eval(&self, freq: f64) -> Complex64 {
        let inverse = self.eval_inverse(freq);
        if inverse == Complex64::new(0.0, 0.0) {
            inverse
        } else {
            inverse.inv()
        }
    }

    /// Response at each of the given frequencies.
    pub fn calc_for_display(&self, freqs: &[f64]) -> Vec<Complex64> {
        freqs.iter().map(|&f| self.eval(f)).collect()
    }

    /// Remove the `gamma` trailing zeros added for displacement conversion.
    ///
    /// Fails, leaving `self` untouched, unless the last `gamma` zeros are all
    /// exactly `(0, 0)`.
    pub fn trim_zeros(&mut self, gamma: usize) -> DspResult<()> {
        if self.zeros.len() < gamma {
            return Err(DspError::TrimZeros {
                gamma,
                reason: format!("only {} zeros present", self.zeros.len()),
            });
        }
        let keep = self.zeros.len() - gamma;
        if let Some(z) = self.zeros[keep..].iter().find(|z| z.re != 0.0 || z.im != 0.0) {
            return Err(DspError::TrimZeros {
                gamma,
                reason: format!("zero isn't 0+i0: {}", z),
            });
        }
        self.zeros.truncate(keep);
        Ok(())
    }

    /// SAC pole-zero text (ZEROS / POLES / CONSTANT).
    pub fn to_text(&self) -> String {
        let mut lines = Vec::with_capacity(self.zeros.len() + self.poles.len() + 3);
        lines.push(format!("ZEROS {}", self.zeros.len()));
        for z in &self.zeros {
            lines.push(format!("    {} {}", z.re, z.im));
        }
        lines.push(format!("POLES {}", self.poles.len()));
        for p in &self.poles {
            lines.push(format!("    {} {}", p.re, p.im));
        }
        lines.push(format!("CONSTANT {}", self.constant));
        lines.join("\n")
    }
}

impl fmt::Display for SacPoleZero {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "sacPoleZero:")?;
        write!(f, "{}", self.to_text())?;
        if let Some(gamma) = self.gamma {
            write!(f, "\n*    gamma: {}", gamma)?;
            write!(f, "\n*    angular scale factor: {}", self.angular_scale_factor)?;
            write!(f, "\n*    scaled sensitivity: {}", self.scaled_sensitivity)?;
            write!(f, "\n*    normalization: {}", self.normalization_at_ref_freq)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sts2_like() -> SacPoleZero {
        SacPoleZero::new(
            vec![
                Complex64::new(-0.037, 0.037),
                Complex64::new(-0.037, -0.037),
                Complex64::new(-251.3, 0.0),
            ],
            vec![Complex64::new(0.0, 0.0), Complex64::new(0.0, 0.0)],
            2.5e10,
        )
    }

    #[test]
    fn test_eval_inverse_at_zero_frequency() {
        let pz = SacPoleZero::new(vec![], vec![Complex64::new(0.0, 2.0 * PI * 3.0)], 1.0);
        assert_eq!(pz.eval_inverse(3.0), Complex64::new(0.0, 0.0));
        assert_eq!(pz.eval(3.0), Complex64::new(0.0, 0.0));

        // DC sits on the (0, 0) zeros.
        assert_eq!(sts2_like().eval_inverse(0.0), Complex64::new(0.0, 0.0));
    }

    #[test]
    fn test_eval_is_reciprocal_of_inverse() {
        let pz = sts2_like();
        for f in [0.01, 0.1, 1.0, 10.0] {
            let product = pz.eval(f) * pz.eval_inverse(f);
            assert!((product.re - 1.0).abs() < 1e-9, "f={}", f);
            assert!(product.im.abs() < 1e-9, "f={}", f);
        }
    }

    #[test]
    fn test_single_pole_magnitude() {
        // H(s) = 10 / (s + 2π): |H| at 1 Hz is 10 / (2π·√2).
        let pz = SacPoleZero::new(vec![Complex64::new(-2.0 * PI, 0.0)], vec![], 10.0);
        let expected = 10.0 / (2.0 * PI * 2.0_f64.sqrt());
        assert!((pz.eval(1.0).norm() - expected).abs() < 1e-12);
        assert!((pz.eval(1.0).arg() + PI / 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_trim_zeros() {
        let mut pz = sts2_like();
        pz.trim_zeros(1).unwrap();
        assert_eq!(pz.zeros.len(), 1);
        pz.trim_zeros(0).unwrap();
        assert_eq!(pz.zeros.len(), 1);

        let err = pz.trim_zeros(2).unwrap_err();
        assert!(matches!(err, DspError::TrimZeros { gamma: 2, .. }));
        assert_eq!(pz.zeros.len(), 1);
    }

    #[test]
    fn test_trim_zeros_rejects_nonzero() {
        let mut pz = SacPoleZero::new(vec![], vec![Complex64::new(0.0, 0.0), Complex64::new(-1.0, 0.0)], 1.0);
        assert!(matches!(pz.trim_zeros(1), Err(DspError::TrimZeros { .. })));
        assert_eq!(pz.zeros.len(), 2);
    }

    #[test]
    fn test_to_text() {
        let pz = SacPoleZero::new(
            vec![Complex64::new(-1.5, 2.0)],
            vec![Complex64::new(0.0, 0.0)],
            42.0,
        );
        assert_eq!(pz.to_text(), "ZEROS 1\n    0 0\nPOLES 1\n    -1.5 2\nCONSTANT 42");

        let mut debug = pz.clone();
        debug.gamma = Some(1);
        let shown = debug.to_string();
        assert!(shown.starts_with("sacPoleZero:\nZEROS 1"));
        assert!(shown.contains("*    gamma: 1"));
        assert!(!pz.to_string().contains("gamma"));
    }

    #[test]
    fn test_calc_for_display_length() {
        let pz = sts2_like();
        let out = pz.calc_for_display(&[0.1, 1.0, 5.0]);
        assert_eq!(out.len(), 3);
        assert!((out[1] - pz.eval(1.0)).norm() < 1e-12);
    }
}
