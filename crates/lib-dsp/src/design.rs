//! Filter design seams.
//!
//! Recursive filters are built from an analog lowpass prototype supplied by
//! an [`IirDesign`]; the band transformation and discretization are shared.
//! Non-recursive filters only need to supply their taps through
//! [`FirDesign`].

use crate::error::DspResult;
use num_complex::Complex64;

/// Zeros, poles and gain of a rational transfer function.
#[derive(Clone, Debug, PartialEq)]
pub struct Zpk {
    pub zeros: Vec<Complex64>,
    pub poles: Vec<Complex64>,
    pub gain: f64,
}

impl Zpk {
    pub fn new(zeros: Vec<Complex64>, poles: Vec<Complex64>, gain: f64) -> Self {
        Self { zeros, poles, gain }
    }

    /// Excess of poles over zeros.
    pub fn relative_degree(&self) -> usize {
        self.poles.len().saturating_sub(self.zeros.len())
    }

    /// Value of the analog transfer function at `s`.
    pub fn eval_s(&self, s: Complex64) -> Complex64 {
        let one = Complex64::new(1.0, 0.0);
        let num = self.zeros.iter().fold(one, |acc, z| acc * (s - *z));
        let den = self.poles.iter().fold(one, |acc, p| acc * (s - *p));
        num / den * self.gain
    }
}

/// Provider of an analog lowpass prototype with its corner at 1 rad/s.
pub trait IirDesign {
    /// Check prototype parameters before any design work.
    fn validate(&self) -> DspResult<()> {
        Ok(())
    }

    /// Prototype of the given order.
    fn analog_prototype(&self, order: usize) -> Zpk;
}

/// Provider of FIR filter coefficients.
pub trait FirDesign {
    fn coefficients(&self) -> DspResult<Vec<f64>>;
}
