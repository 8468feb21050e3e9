//! # lib-sacpz
//!
//! Reader and writer for SAC pole-zero files.
//!
//! The format is line oriented: `*` starts a comment, `ZEROS n` and
//! `POLES n` open a section followed by up to `n` lines of `real imag`, and
//! `CONSTANT c` gives the overall gain. Entries a section declares but does
//! not list are zeros at the origin.
//!
//! The parser is built with `nom`.

pub mod error;
pub mod sacpz;

pub use error::ParseError;
pub use sacpz::{parse_sacpz, parse_sacpz_file, write_sacpz, SacPzFile};
