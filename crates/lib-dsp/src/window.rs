//! Tapering windows for FIR filter design.
//!
//! Truncating an ideal impulse response to a finite number of taps causes
//! Gibbs ripple in the passband; weighting the taps with a smooth window
//! trades transition width for lower ripple.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Window function types for FIR tap weighting.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowType {
    /// No weighting.
    Rectangular,

    /// Raised cosine, zero at both ends.
    Hann,

    /// Raised cosine on a 0.08 pedestal.
    #[default]
    Hamming,

    /// Three-term cosine, lowest sidelobes of the set.
    Blackman,
}

/// Generate window coefficients for a given window type and length.
///
/// The window is symmetric; for odd lengths the center value is 1.0.
pub fn generate_window(window_type: WindowType, length: usize) -> Vec<f64> {
    if length == 0 {
        return Vec::new();
    }
    if length == 1 {
        return vec![1.0];
    }

    let span = (length - 1) as f64;
    (0..length)
        .map(|i| {
            let x = 2.0 * PI * i as f64 / span;
            match window_type {
                WindowType::Rectangular => 1.0,
                WindowType::Hann => 0.5 - 0.5 * x.cos(),
                WindowType::Hamming => 0.54 - 0.46 * x.cos(),
                WindowType::Blackman => 0.42 - 0.5 * x.cos() + 0.08 * (2.0 * x).cos(),
            }
        })
        .collect()
}

/// Multiply `taps` by a window of the same length.
pub fn apply_window(taps: &mut [f64], window_type: WindowType) {
    let window = generate_window(window_type, taps.len());
    for (tap, w) in taps.iter_mut().zip(window) {
        *tap *= w;
    }
}
