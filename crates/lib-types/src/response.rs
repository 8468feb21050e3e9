//! Instrument response data model.
//!
//! Mirrors the FDSN StationXML `Response` element closely enough that a
//! metadata reader can populate it field by field. Nothing here evaluates a
//! response; see `lib_dsp::pole_zero` for that.

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

/// Overall gain of a channel, from ground-motion input to digitizer counts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InstrumentSensitivity {
    pub sensitivity: f64,
    pub frequency: f64,
    pub input_units: String,
    pub output_units: String,
}

impl InstrumentSensitivity {
    pub fn new(
        sensitivity: f64,
        frequency: f64,
        input_units: impl Into<String>,
        output_units: impl Into<String>,
    ) -> Self {
        Self {
            sensitivity,
            frequency,
            input_units: input_units.into(),
            output_units: output_units.into(),
        }
    }
}

/// Full response of a channel: overall sensitivity plus ordered stages.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub instrument_sensitivity: Option<InstrumentSensitivity>,
    #[serde(default)]
    pub stages: Vec<Stage>,
}

impl Response {
    pub fn new(instrument_sensitivity: Option<InstrumentSensitivity>, stages: Vec<Stage>) -> Self {
        Self {
            instrument_sensitivity,
            stages,
        }
    }

    /// Pole-zero filter of the first stage, if it is one.
    pub fn first_poles_zeros(&self) -> Option<&PolesZeros> {
        match self.stages.first().map(|s| &s.filter) {
            Some(StageFilter::PolesZeros(pz)) => Some(pz),
            _ => None,
        }
    }
}

/// One stage of a response.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    pub filter: StageFilter,
    #[serde(default)]
    pub decimation: Option<Decimation>,
    pub gain: Gain,
}

/// Filter carried by a stage.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StageFilter {
    PolesZeros(PolesZeros),
    Fir(Fir),
    Coefficients(Coefficients),
    /// Stage that only contributes gain.
    GainOnly,
}

/// How poles and zeros of a stage are to be interpreted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferFunctionType {
    /// Laplace transform, angular frequency in rad/s.
    LaplaceRadians,
    /// Laplace transform, frequency in Hz.
    LaplaceHertz,
    /// Digital z-transform.
    DigitalZ,
}

impl TransferFunctionType {
    /// Parse the StationXML `PzTransferFunctionType` string.
    pub fn from_stationxml(s: &str) -> Option<Self> {
        match s.trim() {
            "LAPLACE (RADIANS/SECOND)" => Some(Self::LaplaceRadians),
            "LAPLACE (HERTZ)" => Some(Self::LaplaceHertz),
            "DIGITAL (Z-TRANSFORM)" => Some(Self::DigitalZ),
            _ => None,
        }
    }

    pub fn as_stationxml(&self) -> &'static str {
        match self {
            Self::LaplaceRadians => "LAPLACE (RADIANS/SECOND)",
            Self::LaplaceHertz => "LAPLACE (HERTZ)",
            Self::DigitalZ => "DIGITAL (Z-TRANSFORM)",
        }
    }
}

/// Analog or digital pole-zero filter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PolesZeros {
    pub input_units: String,
    pub output_units: String,
    pub transfer_function_type: TransferFunctionType,
    pub normalization_factor: f64,
    pub normalization_frequency: f64,
    #[serde(default)]
    pub zeros: Vec<Complex64>,
    #[serde(default)]
    pub poles: Vec<Complex64>,
}

impl PolesZeros {
    /// Empty Laplace (rad/s) filter with unit normalization.
    pub fn new(input_units: impl Into<String>, output_units: impl Into<String>) -> Self {
        Self {
            input_units: input_units.into(),
            output_units: output_units.into(),
            transfer_function_type: TransferFunctionType::LaplaceRadians,
            normalization_factor: 1.0,
            normalization_frequency: 0.0,
            zeros: Vec::new(),
            poles: Vec::new(),
        }
    }
}

/// FIR filter stage.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Fir {
    pub input_units: String,
    pub output_units: String,
    pub symmetry: String,
    pub numerator: Vec<f64>,
}

/// Rational coefficient filter stage.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coefficients {
    pub input_units: String,
    pub output_units: String,
    pub transfer_function_type: TransferFunctionType,
    pub numerator: Vec<f64>,
    pub denominator: Vec<f64>,
}

/// Decimation applied by a stage.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Decimation {
    pub input_sample_rate: f64,
    pub factor: u32,
    #[serde(default)]
    pub offset: Option<u32>,
    #[serde(default)]
    pub delay: Option<f64>,
    #[serde(default)]
    pub correction: Option<f64>,
}

/// Gain of a single stage at a reference frequency.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Gain {
    pub value: f64,
    pub frequency: f64,
}

impl Gain {
    pub fn new(value: f64, frequency: f64) -> Self {
        Self { value, frequency }
    }
}
