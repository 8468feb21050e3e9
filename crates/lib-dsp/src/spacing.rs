//! Frequency grids for response display.

/// `num` evenly spaced values from `start` to `stop` inclusive.
pub fn linspace(start: f64, stop: f64, num: usize) -> Vec<f64> {
    match num {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (num - 1) as f64;
            (0..num)
                .map(|i| if i == num - 1 { stop } else { start + i as f64 * step })
                .collect()
        }
    }
}

/// `num` values from `10^start` to `10^stop`, evenly spaced in log10.
pub fn logspace(start: f64, stop: f64, num: usize) -> Vec<f64> {
    linspace(start, stop, num).into_iter().map(|e| 10f64.powf(e)).collect()
}

/// `num` values from `start` to `stop` with a constant ratio; `None` unless
/// both ends are positive.
pub fn geomspace(start: f64, stop: f64, num: usize) -> Option<Vec<f64>> {
    if !(start > 0.0 && stop > 0.0) {
        return None;
    }
    let mut out = logspace(start.log10(), stop.log10(), num);
    // pin the endpoints against log/pow rounding
    if let Some(first) = out.first_mut() {
        *first = start;
    }
    if num > 1 {
        if let Some(last) = out.last_mut() {
            *last = stop;
        }
    }
    Some(out)
}
