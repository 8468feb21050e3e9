//! Time-domain conditioning: mean and trend removal, gain correction and
//! first differences.

use crate::error::{DspError, DspResult};
use lib_types::{InstrumentSensitivity, Seconds, Seismogram, Unit};
use serde::Serialize;

/// Remove the seismogram-wide mean from every sample.
pub fn rmean(seismogram: &Seismogram) -> Seismogram {
    let mean = seismogram.mean();
    seismogram.map_segments(|s| s.clone_with_new_data(s.samples.iter().map(|y| y - mean).collect()))
}

/// Least-squares straight line `y = slope·(t - reference_time) + intercept`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct LineFit {
    pub slope: f64,
    pub intercept: f64,
    pub reference_time: Seconds,
    /// Standard deviation of the data about the line.
    pub sigma: f64,
    /// Standard error of the slope.
    pub sigma_a: f64,
    /// Standard error of the intercept.
    pub sigma_b: f64,
    /// Absolute correlation between data and model.
    pub correlation: f64,
}

impl LineFit {
    pub fn value_at(&self, t: Seconds) -> f64 {
        self.slope * (t - self.reference_time).0 + self.intercept
    }
}

/// Fit a line through every sample of every segment.
///
/// Time is measured from `reference_time`, or from the seismogram start when
/// `None`.
pub fn line_fit(seismogram: &Seismogram, reference_time: Option<Seconds>) -> DspResult<LineFit> {
    let start = seismogram
        .start_time()
        .ok_or(DspError::EmptyData("cannot fit a line to a seismogram with no segments"))?;
    let reference_time = reference_time.unwrap_or(start);

    let (mut sum_x, mut sum_y, mut sum_xy, mut sum_x2, mut sum_y2) = (0.0, 0.0, 0.0, 0.0, 0.0);
    let mut count = 0usize;
    for segment in &seismogram.segments {
        let offset = (segment.t_start - reference_time).0;
        let dt = segment.dt.0;
        for (i, y) in segment.samples.iter().enumerate() {
            let x = offset + dt * i as f64;
            sum_x += x;
            sum_y += y;
            sum_xy += x * y;
            sum_x2 += x * x;
            sum_y2 += y * y;
        }
        count += segment.len();
    }

    if count < 2 {
        return Err(DspError::NumericalInstability(format!(
            "line fit needs at least two samples, got {}",
            count
        )));
    }

    let n = count as f64;
    let d = n * sum_x2 - sum_x * sum_x;
    if d == 0.0 {
        return Err(DspError::NumericalInstability("line fit over a single instant".into()));
    }
    let intercept = (sum_x2 * sum_y - sum_x * sum_xy) / d;
    let slope = (n * sum_xy - sum_x * sum_y) / d;

    let sig2 = (sum_y2 + n * intercept * intercept + slope * slope * sum_x2
        - 2.0 * intercept * sum_y
        - 2.0 * slope * sum_xy
        + 2.0 * intercept * slope * sum_x)
        / (n - 2.0);
    // rounding can leave a tiny negative residual for an exact fit
    let sig2 = sig2.max(0.0);

    let correlation = ((n * sum_xy - sum_x * sum_y) / (d * (n * sum_y2 - sum_y * sum_y)).sqrt()).abs();

    Ok(LineFit {
        slope,
        intercept,
        reference_time,
        sigma: sig2.sqrt(),
        sigma_a: (n * sig2 / d).sqrt(),
        sigma_b: (sig2 * sum_x2 / d).sqrt(),
        correlation,
    })
}

/// Subtract the best-fit line.
pub fn remove_trend(seismogram: &Seismogram) -> DspResult<Seismogram> {
    let fit = line_fit(seismogram, None)?;
    Ok(seismogram.map_segments(|s| {
        let detrended = s
            .samples
            .iter()
            .enumerate()
            .map(|(i, y)| y - fit.value_at(s.time_at(i)))
            .collect();
        s.clone_with_new_data(detrended)
    }))
}

/// Divide by the overall sensitivity and tag the result with its input units.
pub fn gain_correct(seismogram: &Seismogram, sensitivity: &InstrumentSensitivity) -> Seismogram {
    let gain = sensitivity.sensitivity;
    let unit = Unit::from_metadata(&sensitivity.input_units);
    seismogram.map_segments(|s| {
        let mut out = s.clone_with_new_data(s.samples.iter().map(|y| y / gain).collect());
        out.unit = unit.clone();
        out
    })
}

/// First difference scaled by the sample rate.
///
/// Each output sample sits midway between its two inputs, so segment start
/// times move half a sample later and every segment loses one sample.
pub fn differentiate(seismogram: &Seismogram) -> Seismogram {
    seismogram.map_segments(|s| {
        let rate = s.sample_rate().0;
        let diff = s.samples.windows(2).map(|w| (w[1] - w[0]) * rate).collect();
        let mut out = s.clone_with_new_data(diff);
        out.t_start = s.t_start + s.dt / 2.0;
        out.unit = s.unit.per_second();
        out
    })
}
