//! Error types for DSP operations.

use lib_types::UnitError;
use thiserror::Error;

/// Errors that can occur during DSP operations.
#[derive(Debug, Error)]
pub enum DspError {
    /// FFT size is not a power of 2.
    #[error("FFT size must be power of 2, got {0}")]
    InvalidFftSize(usize),

    /// Input length mismatch.
    #[error("Input length mismatch: expected {expected}, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    /// Packed spectrum too short for the requested output.
    #[error("Packed spectrum of length {len} cannot produce {requested} samples")]
    InsufficientPoints { len: usize, requested: usize },

    /// Taper corners not in ascending order.
    #[error(
        "Taper corners must satisfy lowCut <= lowPass <= highPass <= highCut, \
         got {low_cut} {low_pass} {high_pass} {high_cut}"
    )]
    InvalidCorners {
        low_cut: f64,
        low_pass: f64,
        high_pass: f64,
        high_cut: f64,
    },

    /// Unit string could not be resolved to a ground-motion unit.
    #[error(transparent)]
    Unit(#[from] UnitError),

    /// Pole-zero transfer function type that cannot be corrected for.
    #[error("Unsupported pole-zero transfer function type: {0}")]
    UnsupportedTransferFunction(String),

    /// Response metadata unusable for correction.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Filter designed for a different sample interval than the data.
    #[error("Filter sample interval {filter}s does not match data sample period {data}s")]
    SampleIntervalMismatch { filter: f64, data: f64 },

    /// Filter design parameters out of range.
    #[error("Invalid filter design: {0}")]
    InvalidFilterDesign(String),

    /// Data has gaps where contiguous data is required.
    #[error("Data must be contiguous for {0}")]
    NotContiguous(&'static str),

    /// Fewer trailing zero-valued zeros than requested for removal.
    #[error("Cannot trim {gamma} zeros: {reason}")]
    TrimZeros { gamma: usize, reason: String },

    /// Operation needs samples but got none.
    #[error("No data for {0}")]
    EmptyData(&'static str),

    /// Numerical failure inside a transform.
    #[error("Numerical instability: {0}")]
    NumericalInstability(String),
}

/// Broad classification of a [`DspError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Caller asked for something that can never work with these parameters.
    Configuration,
    /// Parameters are fine but the data does not fit them.
    Data,
}

impl DspError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotContiguous(_)
            | Self::TrimZeros { .. }
            | Self::EmptyData(_)
            | Self::NumericalInstability(_) => ErrorKind::Data,
            Self::InvalidFftSize(_)
            | Self::LengthMismatch { .. }
            | Self::InsufficientPoints { .. }
            | Self::InvalidCorners { .. }
            | Self::Unit(_)
            | Self::UnsupportedTransferFunction(_)
            | Self::InvalidResponse(_)
            | Self::SampleIntervalMismatch { .. }
            | Self::InvalidFilterDesign(_) => ErrorKind::Configuration,
        }
    }
}

/// Result type for DSP operations.
pub type DspResult<T> = Result<T, DspError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(DspError::InvalidFftSize(100).kind(), ErrorKind::Configuration);
        assert_eq!(
            DspError::Unit(UnitError::Unknown("furlong".into())).kind(),
            ErrorKind::Configuration
        );
        assert_eq!(DspError::NotContiguous("hilbert").kind(), ErrorKind::Data);
        assert_eq!(
            DspError::TrimZeros { gamma: 2, reason: "only 1 zero".into() }.kind(),
            ErrorKind::Data
        );
    }

    #[test]
    fn test_messages_carry_values() {
        let err = DspError::InvalidCorners {
            low_cut: 2.0,
            low_pass: 1.0,
            high_pass: 8.0,
            high_cut: 10.0,
        };
        assert!(err.to_string().contains("2 1 8 10"));

        let err = DspError::SampleIntervalMismatch { filter: 0.01, data: 0.02 };
        assert!(err.to_string().contains("0.01"));
        assert!(err.to_string().contains("0.02"));
    }
}
