//! Conversion of a raw pole-zero stage to a canonical [`SacPoleZero`].
//!
//! The result is in rad/s, carries the overall sensitivity in its constant,
//! and has `gamma` extra zeros at the origin so that dividing by it yields
//! displacement regardless of the sensor's input motion.

use crate::error::{DspError, DspResult};
use crate::pole_zero::SacPoleZero;
use lib_types::{InstrumentSensitivity, PhysicalUnit, PolesZeros, Response, TransferFunctionType};
use num_complex::Complex64;
use std::f64::consts::PI;

/// `|Π(f0 - p) / Π(f0 - z)|` at `f0 = j·2π·ref_freq`.
///
/// The reciprocal of the pole-zero factor's magnitude at the reference
/// frequency, i.e. the normalization that makes it unity there.
pub fn calc_a0(poles: &[Complex64], zeros: &[Complex64], ref_freq: f64) -> f64 {
    let f0 = Complex64::new(0.0, 2.0 * PI * ref_freq);
    let one = Complex64::new(1.0, 0.0);
    let denom = zeros.iter().fold(one, |acc, z| acc * (f0 - *z));
    let numer = poles.iter().fold(one, |acc, p| acc * (f0 - *p));
    (numer / denom).norm()
}

/// Build the canonical response from a pole-zero stage and the overall
/// sensitivity (counts per SI unit of input motion).
pub fn convert_pole_zero_to_sac_style(
    polezeros: &PolesZeros,
    sensitivity: f64,
    sensitivity_frequency: f64,
    gamma: usize,
) -> DspResult<SacPoleZero> {
    let angular_scale_factor = match polezeros.transfer_function_type {
        TransferFunctionType::LaplaceRadians => 1.0,
        TransferFunctionType::LaplaceHertz => 2.0 * PI,
        TransferFunctionType::DigitalZ => {
            return Err(DspError::UnsupportedTransferFunction(
                TransferFunctionType::DigitalZ.as_stationxml().to_string(),
            ))
        }
    };

    let mut zeros: Vec<Complex64> = polezeros.zeros.iter().map(|z| *z * angular_scale_factor).collect();
    zeros.extend(std::iter::repeat(Complex64::new(0.0, 0.0)).take(gamma));
    let poles: Vec<Complex64> = polezeros.poles.iter().map(|p| *p * angular_scale_factor).collect();

    let scaled_sensitivity = sensitivity * (2.0 * PI * sensitivity_frequency).powi(gamma as i32);

    let mut normalization_at_ref_freq = polezeros.normalization_factor
        / (2.0 * PI * polezeros.normalization_frequency).powi(gamma as i32);
    if polezeros.transfer_function_type == TransferFunctionType::LaplaceHertz {
        let excess = polezeros.poles.len() as i32 - polezeros.zeros.len() as i32;
        normalization_at_ref_freq *= (2.0 * PI).powi(excess);
    }

    let constant = if poles.is_empty() && zeros.is_empty() {
        scaled_sensitivity * normalization_at_ref_freq
    } else {
        scaled_sensitivity * calc_a0(&poles, &zeros, sensitivity_frequency)
    };

    tracing::debug!(
        gamma,
        angular_scale_factor,
        scaled_sensitivity,
        normalization_at_ref_freq,
        constant,
        "converted pole-zero stage to SAC style"
    );

    Ok(SacPoleZero {
        poles,
        zeros,
        constant,
        gamma: Some(gamma),
        angular_scale_factor,
        scaled_sensitivity,
        normalization_at_ref_freq,
    })
}

fn instrument_sensitivity(response: &Response) -> DspResult<&InstrumentSensitivity> {
    response
        .instrument_sensitivity
        .as_ref()
        .ok_or_else(|| DspError::InvalidResponse("instrument sensitivity missing".into()))
}

/// Ground-motion unit the response expects as input.
pub fn response_input_unit(response: &Response) -> DspResult<PhysicalUnit> {
    let sensitivity = instrument_sensitivity(response)?;
    Ok(PhysicalUnit::parse(&sensitivity.input_units)?)
}

/// Canonical response of a full channel response: first-stage poles and
/// zeros plus the overall instrument sensitivity.
pub fn convert_to_sac_pole_zero(response: &Response) -> DspResult<SacPoleZero> {
    let polezeros = response
        .first_poles_zeros()
        .ok_or_else(|| DspError::InvalidResponse("first stage is not a pole-zero stage".into()))?;
    let sensitivity = instrument_sensitivity(response)?;
    let unit = PhysicalUnit::parse(&sensitivity.input_units)?;

    let si_sensitivity = sensitivity.sensitivity / unit.scale_to_si;
    convert_pole_zero_to_sac_style(polezeros, si_sensitivity, sensitivity.frequency, unit.motion.gamma())
}
