//! # lib-dsp
//!
//! Instrument correction and digital filtering for seismograms.
//!
//! - **FFT / Spectrum**: power-of-two real transforms with a packed spectrum
//! - **Pole-zero response**: SAC-style canonical response and its evaluation
//! - **Conversion**: raw pole-zero stage plus sensitivity to canonical form
//! - **Transfer**: frequency-domain deconvolution with a raised-cosine taper
//! - **IIR filters**: Butterworth and Chebyshev I/II, low/band/high-pass
//! - **Hilbert**: FIR Hilbert transform and envelope
//! - **Conditioning**: mean/trend removal, gain correction, differentiation

pub mod convert;
pub mod design;
pub mod error;
pub mod fft;
pub mod hilbert;
pub mod iir;
pub mod pole_zero;
pub mod process;
pub mod spacing;
pub mod spectrum;
pub mod taper;
pub mod transfer;
pub mod window;

pub use convert::{convert_pole_zero_to_sac_style, convert_to_sac_pole_zero};
pub use design::{FirDesign, IirDesign, Zpk};
pub use error::{DspError, DspResult, ErrorKind};
pub use fft::{find_power_two, FftEngine};
pub use hilbert::{envelope, envelope_with, hilbert, hilbert_with, HilbertDesign};
pub use iir::{apply_filter, design, IirFilter, Passband, Prototype};
pub use pole_zero::SacPoleZero;
pub use process::{differentiate, gain_correct, line_fit, remove_trend, rmean, LineFit};
pub use spectrum::{fft_forward, Spectrum};
pub use taper::{apply_freq_taper, calc_freq_taper, FreqTaper};
pub use transfer::{calc_response, transfer, TransferEngine};
