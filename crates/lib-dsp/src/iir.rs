//! Recursive (IIR) filter design and application.
//!
//! Design follows the classical route:
//!
//! 1. analog lowpass prototype with its corner at 1 rad/s ([`IirDesign`]),
//! 2. corners prewarped for the bilinear transform (`2·fs·tan(π·f/fs)`),
//! 3. lowpass/highpass/bandpass transformation of zeros, poles and gain,
//! 4. bilinear transform to the z-plane,
//! 5. grouping into second-order sections.
//!
//! Filtering runs the sections in cascade, Direct Form II Transposed. Filter
//! state lives only for the duration of one call, so every segment starts
//! from rest.

use crate::design::{IirDesign, Zpk};
use crate::error::{DspError, DspResult};
use lib_types::{Seconds, Seismogram};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Relative tolerance between filter and data sample intervals.
pub const SAMPLE_INTERVAL_TOLERANCE: f64 = 0.001;

/// Analog prototype family.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Prototype {
    /// Maximally flat; corners are -3 dB points.
    Butterworth,
    /// Equiripple passband; `|H|^2 = 1/(1+epsilon^2)` at the corners.
    ChebyshevI { epsilon: f64 },
    /// Equiripple stopband; gain `epsilon/sqrt(1+epsilon^2)` at the corners.
    ChebyshevII { epsilon: f64 },
}

/// Which band the filter passes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Passband {
    /// Uses the high corner.
    Lowpass,
    /// Uses both corners.
    Bandpass,
    /// Uses the low corner.
    Highpass,
}

/// Odd integers `-(n-1), -(n-3), ..., n-1`.
fn symmetric_indices(n: usize) -> impl Iterator<Item = f64> {
    (0..n).map(move |k| 2.0 * k as f64 - (n as f64 - 1.0))
}

impl IirDesign for Prototype {
    fn validate(&self) -> DspResult<()> {
        match self {
            Self::Butterworth => Ok(()),
            Self::ChebyshevI { epsilon } | Self::ChebyshevII { epsilon } => {
                if epsilon.is_finite() && *epsilon > 0.0 {
                    Ok(())
                } else {
                    Err(DspError::InvalidFilterDesign(format!(
                        "Chebyshev epsilon must be positive, got {}",
                        epsilon
                    )))
                }
            }
        }
    }

    fn analog_prototype(&self, order: usize) -> Zpk {
        let n = order as f64;
        match *self {
            Self::Butterworth => {
                let poles = symmetric_indices(order)
                    .map(|m| -Complex64::new(0.0, PI * m / (2.0 * n)).exp())
                    .collect();
                Zpk::new(Vec::new(), poles, 1.0)
            }
            Self::ChebyshevI { epsilon } => {
                let mu = (1.0 / epsilon).asinh() / n;
                let poles: Vec<Complex64> = symmetric_indices(order)
                    .map(|m| -Complex64::new(mu, PI * m / (2.0 * n)).sinh())
                    .collect();
                let mut gain = poles.iter().fold(Complex64::new(1.0, 0.0), |acc, p| acc * -*p).re;
                if order % 2 == 0 {
                    gain /= (1.0 + epsilon * epsilon).sqrt();
                }
                Zpk::new(Vec::new(), poles, gain)
            }
            Self::ChebyshevII { epsilon } => {
                let mu = (1.0 / epsilon).asinh() / n;
                let zeros: Vec<Complex64> = symmetric_indices(order)
                    .filter(|m| *m != 0.0)
                    .map(|m| Complex64::new(0.0, 1.0 / (PI * m / (2.0 * n)).sin()))
                    .collect();
                let poles: Vec<Complex64> = symmetric_indices(order)
                    .map(|m| {
                        let base = -Complex64::new(0.0, PI * m / (2.0 * n)).exp();
                        Complex64::new(mu.sinh() * base.re, mu.cosh() * base.im).inv()
                    })
                    .collect();
                let one = Complex64::new(1.0, 0.0);
                let pole_product = poles.iter().fold(one, |acc, p| acc * -*p);
                let zero_product = zeros.iter().fold(one, |acc, z| acc * -*z);
                Zpk::new(zeros, poles, (pole_product / zero_product).re)
            }
        }
    }
}

/// Lowpass prototype to lowpass at `wo` rad/s.
fn lp_to_lp(proto: &Zpk, wo: f64) -> Zpk {
    let degree = proto.relative_degree() as i32;
    Zpk::new(
        proto.zeros.iter().map(|z| *z * wo).collect(),
        proto.poles.iter().map(|p| *p * wo).collect(),
        proto.gain * wo.powi(degree),
    )
}

/// Lowpass prototype to highpass at `wo` rad/s.
fn lp_to_hp(proto: &Zpk, wo: f64) -> Zpk {
    let one = Complex64::new(1.0, 0.0);
    let zero_product = proto.zeros.iter().fold(one, |acc, z| acc * -*z);
    let pole_product = proto.poles.iter().fold(one, |acc, p| acc * -*p);

    let mut zeros: Vec<Complex64> = proto.zeros.iter().map(|z| wo / *z).collect();
    zeros.extend(std::iter::repeat(Complex64::new(0.0, 0.0)).take(proto.relative_degree()));
    let poles = proto.poles.iter().map(|p| wo / *p).collect();

    Zpk::new(zeros, poles, proto.gain * (zero_product / pole_product).re)
}

/// Lowpass prototype to bandpass centered at `wo` with width `bw` rad/s.
fn lp_to_bp(proto: &Zpk, wo: f64, bw: f64) -> Zpk {
    let split = |roots: &[Complex64]| -> Vec<Complex64> {
        let scaled: Vec<Complex64> = roots.iter().map(|r| *r * (bw / 2.0)).collect();
        let offsets: Vec<Complex64> = scaled.iter().map(|r| (*r * *r - wo * wo).sqrt()).collect();
        scaled
            .iter()
            .zip(&offsets)
            .map(|(r, d)| *r + *d)
            .chain(scaled.iter().zip(&offsets).map(|(r, d)| *r - *d))
            .collect()
    };

    let degree = proto.relative_degree();
    let mut zeros = split(&proto.zeros);
    zeros.extend(std::iter::repeat(Complex64::new(0.0, 0.0)).take(degree));
    let poles = split(&proto.poles);

    Zpk::new(zeros, poles, proto.gain * bw.powi(degree as i32))
}

/// Bilinear transform of an analog filter for sample rate `fs`.
fn bilinear(analog: &Zpk, fs: f64) -> Zpk {
    let fs2 = Complex64::new(2.0 * fs, 0.0);
    let one = Complex64::new(1.0, 0.0);

    let mut zeros: Vec<Complex64> = analog.zeros.iter().map(|z| (fs2 + *z) / (fs2 - *z)).collect();
    zeros.extend(std::iter::repeat(Complex64::new(-1.0, 0.0)).take(analog.relative_degree()));
    let poles = analog.poles.iter().map(|p| (fs2 + *p) / (fs2 - *p)).collect();

    let zero_product = analog.zeros.iter().fold(one, |acc, z| acc * (fs2 - *z));
    let pole_product = analog.poles.iter().fold(one, |acc, p| acc * (fs2 - *p));

    Zpk::new(zeros, poles, analog.gain * (zero_product / pole_product).re)
}

/// Polynomials in `z^-1` of degree two (`[1, c1, c2]`) whose roots are the
/// given roots. Complex roots are assumed to come in conjugate pairs.
fn quadratic_factors(roots: &[Complex64]) -> Vec<[f64; 3]> {
    let mut factors = Vec::new();
    let mut reals = Vec::new();

    for r in roots {
        if r.im.abs() <= 1e-10 * r.norm().max(1.0) {
            reals.push(r.re);
        } else if r.im > 0.0 {
            factors.push([1.0, -2.0 * r.re, r.norm_sqr()]);
        }
    }

    for pair in reals.chunks(2) {
        match pair {
            [a, b] => factors.push([1.0, -(a + b), a * b]),
            [a] => factors.push([1.0, -a, 0.0]),
            _ => {}
        }
    }
    factors
}

/// One second-order section, `a0` normalized to 1.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Biquad {
    /// Numerator `[b0, b1, b2]`.
    pub b: [f64; 3],
    /// Denominator `[a1, a2]`.
    pub a: [f64; 2],
}

impl Biquad {
    /// Run the section over `samples` from rest.
    fn process(&self, samples: &mut [f64]) {
        let [b0, b1, b2] = self.b;
        let [a1, a2] = self.a;
        let (mut s1, mut s2) = (0.0, 0.0);
        for x in samples.iter_mut() {
            let input = *x;
            let output = b0 * input + s1;
            s1 = b1 * input - a1 * output + s2;
            s2 = b2 * input - a2 * output;
            *x = output;
        }
    }

    /// Transfer function at `z^-1 = z_inv`.
    fn response(&self, z_inv: Complex64) -> Complex64 {
        let z2 = z_inv * z_inv;
        let num = z_inv * self.b[1] + z2 * self.b[2] + self.b[0];
        let den = z_inv * self.a[0] + z2 * self.a[1] + 1.0;
        num / den
    }

    /// Poles strictly inside the unit circle.
    pub fn is_stable(&self) -> bool {
        self.a[1].abs() < 1.0 && self.a[0].abs() < 1.0 + self.a[1]
    }
}

/// Digital IIR filter as a cascade of second-order sections.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IirFilter {
    sections: Vec<Biquad>,
    sample_interval: Seconds,
}

impl IirFilter {
    /// Sample interval the filter was designed for.
    pub fn sample_interval(&self) -> Seconds {
        self.sample_interval
    }

    pub fn sections(&self) -> &[Biquad] {
        &self.sections
    }

    pub fn is_stable(&self) -> bool {
        self.sections.iter().all(Biquad::is_stable)
    }

    /// Filter samples in place, starting from rest.
    pub fn filter_in_place(&self, samples: &mut [f64]) {
        for section in &self.sections {
            section.process(samples);
        }
    }

    /// Filtered copy of `samples`.
    pub fn filter(&self, samples: &[f64]) -> Vec<f64> {
        let mut out = samples.to_vec();
        self.filter_in_place(&mut out);
        out
    }

    /// Complex response at `freq` Hz.
    pub fn frequency_response(&self, freq: f64) -> Complex64 {
        let omega = 2.0 * PI * freq * self.sample_interval.0;
        let z_inv = Complex64::new(0.0, -omega).exp();
        self.sections
            .iter()
            .fold(Complex64::new(1.0, 0.0), |acc, s| acc * s.response(z_inv))
    }
}

fn check_corner(name: &str, corner: f64, nyquist: f64) -> DspResult<()> {
    if corner.is_finite() && corner > 0.0 && corner < nyquist {
        Ok(())
    } else {
        Err(DspError::InvalidFilterDesign(format!(
            "{} corner {} Hz must be between 0 and Nyquist {} Hz",
            name, corner, nyquist
        )))
    }
}

/// Design a digital filter from an analog prototype.
///
/// `num_poles` is the prototype order; a bandpass filter has twice as many
/// poles.
pub fn design<D: IirDesign + ?Sized>(
    prototype: &D,
    num_poles: usize,
    passband: Passband,
    low_corner: f64,
    high_corner: f64,
    sample_interval: Seconds,
) -> DspResult<IirFilter> {
    prototype.validate()?;
    if num_poles == 0 {
        return Err(DspError::InvalidFilterDesign("number of poles must be at least 1".into()));
    }
    if !(sample_interval.0.is_finite() && sample_interval.0 > 0.0) {
        return Err(DspError::InvalidFilterDesign(format!(
            "sample interval must be positive, got {}",
            sample_interval.0
        )));
    }

    let fs = 1.0 / sample_interval.0;
    let nyquist = fs / 2.0;
    let warp = |f: f64| 2.0 * fs * (PI * f / fs).tan();

    let proto = prototype.analog_prototype(num_poles);
    let analog = match passband {
        Passband::Lowpass => {
            check_corner("high", high_corner, nyquist)?;
            lp_to_lp(&proto, warp(high_corner))
        }
        Passband::Highpass => {
            check_corner("low", low_corner, nyquist)?;
            lp_to_hp(&proto, warp(low_corner))
        }
        Passband::Bandpass => {
            check_corner("low", low_corner, nyquist)?;
            check_corner("high", high_corner, nyquist)?;
            if low_corner >= high_corner {
                return Err(DspError::InvalidFilterDesign(format!(
                    "bandpass low corner {} must be below high corner {}",
                    low_corner, high_corner
                )));
            }
            let (w1, w2) = (warp(low_corner), warp(high_corner));
            lp_to_bp(&proto, (w1 * w2).sqrt(), w2 - w1)
        }
    };

    let digital = bilinear(&analog, fs);

    let zero_factors = quadratic_factors(&digital.zeros);
    let pole_factors = quadratic_factors(&digital.poles);
    let count = zero_factors.len().max(pole_factors.len()).max(1);
    let identity = [1.0, 0.0, 0.0];

    let mut sections: Vec<Biquad> = (0..count)
        .map(|i| {
            let b = zero_factors.get(i).copied().unwrap_or(identity);
            let a = pole_factors.get(i).copied().unwrap_or(identity);
            Biquad { b, a: [a[1], a[2]] }
        })
        .collect();
    for coeff in sections[0].b.iter_mut() {
        *coeff *= digital.gain;
    }

    tracing::debug!(
        ?passband,
        num_poles,
        low_corner,
        high_corner,
        sections = sections.len(),
        "Designed IIR filter"
    );

    Ok(IirFilter {
        sections,
        sample_interval,
    })
}

pub fn create_butterworth(
    num_poles: usize,
    passband: Passband,
    low_corner: f64,
    high_corner: f64,
    sample_interval: Seconds,
) -> DspResult<IirFilter> {
    design(&Prototype::Butterworth, num_poles, passband, low_corner, high_corner, sample_interval)
}

pub fn create_chebyshev_i(
    num_poles: usize,
    epsilon: f64,
    passband: Passband,
    low_corner: f64,
    high_corner: f64,
    sample_interval: Seconds,
) -> DspResult<IirFilter> {
    design(
        &Prototype::ChebyshevI { epsilon },
        num_poles,
        passband,
        low_corner,
        high_corner,
        sample_interval,
    )
}

pub fn create_chebyshev_ii(
    num_poles: usize,
    epsilon: f64,
    passband: Passband,
    low_corner: f64,
    high_corner: f64,
    sample_interval: Seconds,
) -> DspResult<IirFilter> {
    design(
        &Prototype::ChebyshevII { epsilon },
        num_poles,
        passband,
        low_corner,
        high_corner,
        sample_interval,
    )
}

/// Filter every segment of a seismogram independently.
///
/// The filter's sample interval must match each segment's sample period to
/// within 0.1%.
pub fn apply_filter(filter: &IirFilter, seismogram: &Seismogram) -> DspResult<Seismogram> {
    let delta = filter.sample_interval().0;
    for segment in &seismogram.segments {
        let period = segment.sample_period().0;
        if (delta - period).abs() / period > SAMPLE_INTERVAL_TOLERANCE {
            return Err(DspError::SampleIntervalMismatch {
                filter: delta,
                data: period,
            });
        }
    }

    Ok(seismogram.map_segments(|segment| segment.clone_with_new_data(filter.filter(&segment.samples))))
}
