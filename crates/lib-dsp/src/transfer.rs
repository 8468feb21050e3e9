//! Frequency-domain instrument correction.
//!
//! Reproduces SAC `transfer from polezero to none`: each segment is
//! transformed, divided by the canonical response with a band-limiting taper,
//! and transformed back to displacement in meters.
//!
//! # Normalization
//!
//! Samples are divided by the sample rate before the forward transform and
//! the result is multiplied by the transform length after the inverse. Each
//! bin is additionally scaled by the bin spacing. The three factors cancel to
//! a plain deconvolution; they are kept to stay numerically identical to SAC.

use crate::convert::{convert_to_sac_pole_zero, response_input_unit};
use crate::error::{DspError, DspResult};
use crate::fft::FftEngine;
use crate::pole_zero::SacPoleZero;
use crate::spectrum::Spectrum;
use crate::taper::FreqTaper;
use lib_types::{Hertz, PhysicalUnit, Response, Seismogram, Unit, Waveform};
use num_complex::Complex64;
use rayon::prelude::*;

/// Bins where the response is exactly zero store this instead.
pub const ZERO_RESPONSE_FLOOR: f64 = 1e-10;

/// Instrument correction for one channel response.
///
/// Resolves the input unit and the canonical response once, then corrects
/// any number of seismograms.
#[derive(Clone, Debug)]
pub struct TransferEngine {
    sac_pole_zero: SacPoleZero,
    input_unit: Option<PhysicalUnit>,
}

impl TransferEngine {
    /// Build from a full channel response.
    pub fn from_response(response: &Response) -> DspResult<Self> {
        let input_unit = response_input_unit(response)?;
        let sac_pole_zero = convert_to_sac_pole_zero(response)?;
        tracing::debug!(
            gamma = input_unit.motion.gamma(),
            scale_to_si = input_unit.scale_to_si,
            constant = sac_pole_zero.constant,
            "TransferEngine: canonical response ready"
        );
        Ok(Self {
            sac_pole_zero,
            input_unit: Some(input_unit),
        })
    }

    /// Build from an already canonical response, e.g. read from a SAC PZ file.
    pub fn from_sac_pole_zero(sac_pole_zero: SacPoleZero) -> Self {
        Self {
            sac_pole_zero,
            input_unit: None,
        }
    }

    pub fn sac_pole_zero(&self) -> &SacPoleZero {
        &self.sac_pole_zero
    }

    /// Input unit of the response, when built from a full response.
    pub fn input_unit(&self) -> Option<PhysicalUnit> {
        self.input_unit
    }

    /// Correct every segment of a seismogram. Segments are independent and
    /// processed in parallel.
    pub fn correct(&self, seismogram: &Seismogram, taper: &FreqTaper) -> DspResult<Seismogram> {
        if let Some(rate) = seismogram.sample_rate() {
            let (_, _, _, high_cut) = taper.corners();
            if high_cut > rate.nyquist().0 {
                tracing::warn!(
                    high_cut,
                    nyquist = rate.nyquist().0,
                    "Taper extends above Nyquist"
                );
            }
        }

        let segments = seismogram
            .segments
            .par_iter()
            .map(|segment| transfer_sac_pz_segment(segment, &self.sac_pole_zero, taper))
            .collect::<DspResult<Vec<_>>>()?;

        Ok(Seismogram::new(segments))
    }
}

/// Correct a seismogram for a full channel response.
pub fn transfer(
    seismogram: &Seismogram,
    response: &Response,
    low_cut: f64,
    low_pass: f64,
    high_pass: f64,
    high_cut: f64,
) -> DspResult<Seismogram> {
    let taper = FreqTaper::new(low_cut, low_pass, high_pass, high_cut)?;
    TransferEngine::from_response(response)?.correct(seismogram, &taper)
}

/// Correct a seismogram for a canonical response.
pub fn transfer_sac_pz(
    seismogram: &Seismogram,
    sac_pole_zero: &SacPoleZero,
    low_cut: f64,
    low_pass: f64,
    high_pass: f64,
    high_cut: f64,
) -> DspResult<Seismogram> {
    let taper = FreqTaper::new(low_cut, low_pass, high_pass, high_cut)?;
    TransferEngine::from_sac_pole_zero(sac_pole_zero.clone()).correct(seismogram, &taper)
}

/// Correct a single segment. The result is displacement in meters.
pub fn transfer_sac_pz_segment(
    segment: &Waveform,
    sac_pole_zero: &SacPoleZero,
    taper: &FreqTaper,
) -> DspResult<Waveform> {
    let sample_rate = segment.sample_rate();
    let scaled: Vec<f64> = segment.samples.iter().map(|v| v / sample_rate.0).collect();

    let mut engine = FftEngine::new();
    let mut spectrum = Spectrum::forward(&mut engine, &scaled, sample_rate)?;
    combine(&mut spectrum, sac_pole_zero, taper);

    let n = spectrum.num_points() as f64;
    let mut out = engine.inverse_packed(spectrum.packed(), segment.len())?;
    for v in out.iter_mut() {
        *v *= n;
    }

    let mut corrected = segment.clone_with_new_data(out);
    corrected.unit = Unit::METER;
    Ok(corrected)
}

/// Multiply every bin by `deltaF · taper(f) / H(f)`.
///
/// DC is set to zero. The Nyquist bin keeps only the real part of the
/// product.
pub fn combine(spectrum: &mut Spectrum, sac_pole_zero: &SacPoleZero, taper: &FreqTaper) {
    let delta_f = spectrum.fundamental_frequency();
    let nyquist_index = spectrum.nyquist_index();

    spectrum.set_bin(0, Complex64::new(0.0, 0.0));

    let factor = |freq: f64| sac_pole_zero.eval_inverse(freq) * (delta_f * taper.at(freq));

    let nyquist = spectrum.sample_rate().nyquist().0;
    let value = spectrum.bin(nyquist_index) * factor(nyquist);
    spectrum.set_bin(nyquist_index, Complex64::new(value.re, 0.0));

    for i in 1..nyquist_index {
        let value = spectrum.bin(i) * factor(i as f64 * delta_f);
        spectrum.set_bin(i, value);
    }
}

/// Response of a channel as a spectrum, with the gamma zeros for `unit`
/// removed so the response maps `unit` to counts.
pub fn calc_response(
    response: &Response,
    num_points: usize,
    sample_rate: Hertz,
    unit: &str,
) -> DspResult<Spectrum> {
    let mut sac_pole_zero = convert_to_sac_pole_zero(response)?;
    let unit = PhysicalUnit::parse(unit)?;
    sac_pole_zero.trim_zeros(unit.motion.gamma())?;
    calc_response_from_sac_pole_zero(&sac_pole_zero, num_points, sample_rate)
}

/// Evaluate a canonical response on the bins of a `num_points` transform.
pub fn calc_response_from_sac_pole_zero(
    sac_pole_zero: &SacPoleZero,
    num_points: usize,
    sample_rate: Hertz,
) -> DspResult<Spectrum> {
    if num_points == 0 || !num_points.is_power_of_two() {
        return Err(DspError::InvalidFftSize(num_points));
    }
    let delta_f = sample_rate.0 / num_points as f64;
    let half = num_points / 2;
    let mut packed = vec![0.0; num_points];

    packed[0] = sac_pole_zero.eval(0.0).re;
    packed[half] = sac_pole_zero.eval(sample_rate.nyquist().0).re;

    for i in 1..half {
        let resp = sac_pole_zero.eval(i as f64 * delta_f);
        if resp == Complex64::new(0.0, 0.0) {
            packed[i] = ZERO_RESPONSE_FLOOR;
        } else {
            packed[i] = resp.re;
            packed[num_points - i] = resp.im;
        }
    }

    Spectrum::from_packed(packed, num_points, sample_rate)
}
