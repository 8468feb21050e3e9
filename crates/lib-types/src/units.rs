//! Physical units with type safety.
//!
//! Time and frequency are newtypes so sample periods and sample rates cannot be
//! mixed up. Amplitude units of a seismogram are a closed enum: unit strings
//! coming from metadata (`"M/S"`, `"nm/s**2"`, ...) are resolved once, at the
//! boundary, into a [`PhysicalUnit`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Div, Mul, Sub};
use std::str::FromStr;
use thiserror::Error;

/// Time in seconds.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct Seconds(pub f64);

impl Seconds {
    pub const ZERO: Self = Self(0.0);

    #[inline]
    pub fn as_ms(&self) -> f64 {
        self.0 * 1e3
    }

    /// Convert to frequency (reciprocal).
    #[inline]
    pub fn to_frequency(&self) -> Hertz {
        Hertz(1.0 / self.0)
    }
}

impl Add for Seconds {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Seconds {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl Mul<f64> for Seconds {
    type Output = Self;
    fn mul(self, rhs: f64) -> Self {
        Self(self.0 * rhs)
    }
}

impl Div<f64> for Seconds {
    type Output = Self;
    fn div(self, rhs: f64) -> Self {
        Self(self.0 / rhs)
    }
}

impl Div<Seconds> for Seconds {
    type Output = f64;
    fn div(self, rhs: Seconds) -> f64 {
        self.0 / rhs.0
    }
}

/// Frequency in Hertz.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct Hertz(pub f64);

impl Hertz {
    /// Convert to period (reciprocal).
    #[inline]
    pub fn to_period(&self) -> Seconds {
        Seconds(1.0 / self.0)
    }

    /// Nyquist frequency of a sample rate given in Hertz.
    #[inline]
    pub fn nyquist(&self) -> Hertz {
        Hertz(self.0 / 2.0)
    }
}

impl Mul<f64> for Hertz {
    type Output = Self;
    fn mul(self, rhs: f64) -> Self {
        Self(self.0 * rhs)
    }
}

impl Div<f64> for Hertz {
    type Output = Self;
    fn div(self, rhs: f64) -> Self {
        Self(self.0 / rhs)
    }
}

/// Errors resolving a unit string.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum UnitError {
    /// The string does not name a unit this crate knows about.
    #[error("unknown response unit: {0}")]
    Unknown(String),

    /// The unit is known but is not displacement, velocity or acceleration.
    #[error("response unit is not displacement (m), velocity (m/s) or acceleration (m/s^2): {0}")]
    NotGroundMotion(String),
}

/// Kind of ground motion a seismogram or a sensor input measures.
///
/// The discriminant is the "gamma" of SAC: the number of zero-valued zeros that
/// must be appended to a pole-zero model to convert it to displacement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroundMotion {
    Displacement,
    Velocity,
    Acceleration,
}

impl GroundMotion {
    /// Order of time derivative relative to displacement (0, 1 or 2).
    #[inline]
    pub fn gamma(&self) -> usize {
        match self {
            Self::Displacement => 0,
            Self::Velocity => 1,
            Self::Acceleration => 2,
        }
    }

    /// Inverse of [`gamma`](Self::gamma).
    pub fn from_gamma(gamma: usize) -> Option<Self> {
        match gamma {
            0 => Some(Self::Displacement),
            1 => Some(Self::Velocity),
            2 => Some(Self::Acceleration),
            _ => None,
        }
    }

    /// The motion one time derivative further along, if any.
    pub fn differentiated(&self) -> Option<Self> {
        Self::from_gamma(self.gamma() + 1)
    }

    /// SI symbol of this motion kind.
    pub fn si_symbol(&self) -> &'static str {
        match self {
            Self::Displacement => "m",
            Self::Velocity => "m/s",
            Self::Acceleration => "m/s2",
        }
    }
}

/// A ground-motion unit with its scale relative to SI.
///
/// `nm/s` resolves to `Velocity` with `scale_to_si == 1e-9`: one `nm/s` is
/// `1e-9` `m/s`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PhysicalUnit {
    pub motion: GroundMotion,
    pub scale_to_si: f64,
}

impl PhysicalUnit {
    /// The SI unit of a motion kind.
    pub fn si(motion: GroundMotion) -> Self {
        Self { motion, scale_to_si: 1.0 }
    }

    /// Resolve a unit string as found in station metadata.
    ///
    /// Case-insensitive; `**` exponent markers and `^` are ignored, `sec` is
    /// accepted for `s`.
    pub fn parse(unit: &str) -> Result<Self, UnitError> {
        let normalized: String = unit
            .trim()
            .to_ascii_lowercase()
            .replace("**", "")
            .replace('^', "")
            .replace("sec", "s");

        let (numerator, denominator) = match normalized.split_once('/') {
            Some((num, den)) => (num.trim(), Some(den.trim())),
            None => (normalized.as_str(), None),
        };

        let scale_to_si = match numerator {
            "m" => 1.0,
            "km" => 1e3,
            "cm" => 1e-2,
            "mm" => 1e-3,
            "um" | "micron" | "microns" => 1e-6,
            "nm" => 1e-9,
            _ => {
                return Err(match denominator {
                    None if is_known_non_motion(numerator) => {
                        UnitError::NotGroundMotion(unit.to_string())
                    }
                    _ => UnitError::Unknown(unit.to_string()),
                })
            }
        };

        let motion = match denominator {
            None => GroundMotion::Displacement,
            Some("s") => GroundMotion::Velocity,
            Some("s2") | Some("s/s") => GroundMotion::Acceleration,
            Some(_) => return Err(UnitError::Unknown(unit.to_string())),
        };

        Ok(Self { motion, scale_to_si })
    }
}

impl FromStr for PhysicalUnit {
    type Err = UnitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn is_known_non_motion(unit: &str) -> bool {
    matches!(unit, "v" | "volts" | "count" | "counts" | "pa" | "c" | "k" | "deg")
}

/// Amplitude unit tag carried by every waveform.
#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    /// Raw digitizer counts.
    #[default]
    Counts,

    /// Ground motion in SI units.
    Motion(GroundMotion),

    /// Anything else, kept verbatim.
    Other(String),
}

impl Unit {
    pub const METER: Self = Self::Motion(GroundMotion::Displacement);
    pub const METER_PER_SECOND: Self = Self::Motion(GroundMotion::Velocity);
    pub const METER_PER_SECOND_PER_SECOND: Self = Self::Motion(GroundMotion::Acceleration);

    /// Tag for a metadata unit string; SI ground-motion units become `Motion`.
    pub fn from_metadata(unit: &str) -> Self {
        match PhysicalUnit::parse(unit) {
            Ok(pu) if pu.scale_to_si == 1.0 => Self::Motion(pu.motion),
            _ if unit.eq_ignore_ascii_case("counts") || unit.eq_ignore_ascii_case("count") => {
                Self::Counts
            }
            _ => Self::Other(unit.to_string()),
        }
    }

    /// Unit of the time derivative of data in this unit.
    pub fn per_second(&self) -> Self {
        match self {
            Self::Motion(m) => match m.differentiated() {
                Some(d) => Self::Motion(d),
                None => Self::Other(format!("{}/s", m.si_symbol())),
            },
            other => Self::Other(format!("{}/s", other)),
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Counts => write!(f, "count"),
            Self::Motion(m) => write!(f, "{}", m.si_symbol()),
            Self::Other(s) => write!(f, "{}", s),
        }
    }
}
