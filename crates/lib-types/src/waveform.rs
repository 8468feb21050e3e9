//! Time-domain waveform representation.
//!
//! A [`Waveform`] is one contiguous run of uniformly sampled values; a
//! [`Seismogram`] is an ordered list of such runs from the same channel, which
//! may contain gaps.
//!
//! # Sample Semantics
//!
//! Samples are **point measurements** at discrete time instants:
//!
//! ```text
//! t[i] = t_start + i * dt,  for i = 0, 1, ..., N-1
//! ```
//!
//! `t_end()` is the time of the last sample, so the next segment of a gap-free
//! recording starts at `t_end() + dt`.

use crate::units::{Hertz, Seconds, Unit};
use serde::{Deserialize, Serialize};

/// A uniformly-sampled time-domain waveform segment.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Waveform {
    /// Sample values.
    pub samples: Vec<f64>,

    /// Time step between consecutive samples.
    pub dt: Seconds,

    /// Time of the first sample.
    pub t_start: Seconds,

    /// Amplitude unit of the samples.
    #[serde(default)]
    pub unit: Unit,
}

impl Waveform {
    /// Create a new waveform from samples.
    pub fn new(samples: Vec<f64>, dt: Seconds, t_start: Seconds, unit: Unit) -> Self {
        Self { samples, dt, t_start, unit }
    }

    /// Create a zero-valued waveform of specified length, in counts.
    pub fn zeros(len: usize, dt: Seconds) -> Self {
        Self {
            samples: vec![0.0; len],
            dt,
            t_start: Seconds::ZERO,
            unit: Unit::Counts,
        }
    }

    /// New segment with the same timing and unit but different samples.
    pub fn clone_with_new_data(&self, samples: Vec<f64>) -> Self {
        Self {
            samples,
            dt: self.dt,
            t_start: self.t_start,
            unit: self.unit.clone(),
        }
    }

    /// Number of samples in the waveform.
    #[inline]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Check if the waveform is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Total duration (`N * dt`).
    #[inline]
    pub fn duration(&self) -> Seconds {
        Seconds(self.samples.len() as f64 * self.dt.0)
    }

    /// Time of the last sample, or `t_start` when empty.
    #[inline]
    pub fn t_end(&self) -> Seconds {
        if self.samples.is_empty() {
            return self.t_start;
        }
        Seconds(self.t_start.0 + (self.samples.len() - 1) as f64 * self.dt.0)
    }

    /// Time of a given sample index.
    #[inline]
    pub fn time_at(&self, index: usize) -> Seconds {
        Seconds(self.t_start.0 + index as f64 * self.dt.0)
    }

    /// Sample rate (reciprocal of dt).
    #[inline]
    pub fn sample_rate(&self) -> Hertz {
        self.dt.to_frequency()
    }

    /// Sample period.
    #[inline]
    pub fn sample_period(&self) -> Seconds {
        self.dt
    }

    /// Peak-to-peak amplitude.
    pub fn peak_to_peak(&self) -> f64 {
        let (min, max) = self.samples.iter().fold((f64::MAX, f64::MIN), |(min, max), &v| {
            (min.min(v), max.max(v))
        });
        max - min
    }

    /// Maximum absolute value.
    pub fn max_abs(&self) -> f64 {
        self.samples.iter().map(|v| v.abs()).fold(0.0, f64::max)
    }

    /// Root mean square value.
    pub fn rms(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let sum_sq: f64 = self.samples.iter().map(|v| v * v).sum();
        (sum_sq / self.samples.len() as f64).sqrt()
    }
}

/// Relative sample-period difference below which two segments count as the
/// same rate.
const SAME_RATE_TOLERANCE: f64 = 1e-6;

/// An ordered list of waveform segments from one channel.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Seismogram {
    pub segments: Vec<Waveform>,
}

impl Seismogram {
    pub fn new(segments: Vec<Waveform>) -> Self {
        Self { segments }
    }

    /// Seismogram made of a single segment.
    pub fn from_waveform(waveform: Waveform) -> Self {
        Self { segments: vec![waveform] }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.segments.iter().all(Waveform::is_empty)
    }

    /// Total number of samples over all segments.
    pub fn num_points(&self) -> usize {
        self.segments.iter().map(Waveform::len).sum()
    }

    /// Sample period of the first segment.
    pub fn sample_period(&self) -> Option<Seconds> {
        self.segments.first().map(|s| s.dt)
    }

    /// Sample rate of the first segment.
    pub fn sample_rate(&self) -> Option<Hertz> {
        self.segments.first().map(Waveform::sample_rate)
    }

    /// Unit of the first segment.
    pub fn unit(&self) -> Option<&Unit> {
        self.segments.first().map(|s| &s.unit)
    }

    pub fn start_time(&self) -> Option<Seconds> {
        self.segments.first().map(|s| s.t_start)
    }

    /// True when each segment starts one sample period after the previous one
    /// ends, within half a sample period, with the same sample period and unit.
    pub fn is_contiguous(&self) -> bool {
        self.segments.windows(2).all(|pair| {
            let (prev, next) = (&pair[0], &pair[1]);
            if prev.unit != next.unit || (next.dt.0 - prev.dt.0).abs() > prev.dt.0 * SAME_RATE_TOLERANCE {
                return false;
            }
            let expected = prev.t_end() + prev.dt;
            (next.t_start.0 - expected.0).abs() <= prev.dt.0 / 2.0
        })
    }

    /// All samples of all segments, concatenated in order.
    pub fn samples(&self) -> Vec<f64> {
        self.segments.iter().flat_map(|s| s.samples.iter().copied()).collect()
    }

    /// Mean over every sample of every segment; 0 when empty.
    pub fn mean(&self) -> f64 {
        let n = self.num_points();
        if n == 0 {
            return 0.0;
        }
        let sum: f64 = self.segments.iter().flat_map(|s| s.samples.iter()).sum();
        sum / n as f64
    }

    /// Contiguous seismogram as a single segment; `None` if there are gaps or
    /// no segments.
    pub fn merged(&self) -> Option<Waveform> {
        let first = self.segments.first()?;
        if !self.is_contiguous() {
            return None;
        }
        Some(first.clone_with_new_data(self.samples()))
    }

    /// New seismogram with each segment mapped through `f`.
    pub fn map_segments<F>(&self, f: F) -> Self
    where
        F: FnMut(&Waveform) -> Waveform,
    {
        Self {
            segments: self.segments.iter().map(f).collect(),
        }
    }
}

impl From<Waveform> for Seismogram {
    fn from(waveform: Waveform) -> Self {
        Self::from_waveform(waveform)
    }
}
