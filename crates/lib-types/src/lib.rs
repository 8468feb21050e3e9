//! # lib-types
//!
//! Core type definitions for seismic response correction.
//!
//! This crate provides foundational types used throughout the workspace:
//! - Time/frequency newtypes and ground-motion unit resolution
//! - Waveform segments and multi-segment seismograms
//! - The instrument response data model

pub mod response;
pub mod units;
pub mod waveform;

pub use response::*;
pub use units::*;
pub use waveform::*;

/// Re-export num_complex for convenience
pub use num_complex::Complex64;

/// Complex value used for poles, zeros and spectral bins.
pub type ComplexValue = Complex64;
