//! Result output formatting and writing.

use crate::OutputFormat;
use anyhow::Result;
use lib_types::{Complex64, Seismogram};
use std::io::Write;
use std::path::Path;

/// Write a seismogram to `path`, or to stdout when `None`.
pub fn write_seismogram(seis: &Seismogram, path: Option<&Path>, format: OutputFormat) -> Result<()> {
    match path {
        Some(p) => {
            let mut f = std::io::BufWriter::new(std::fs::File::create(p)?);
            render_seismogram(seis, format, &mut f)?;
            f.flush()?;
            tracing::info!("Wrote {} samples to {:?}", seis.num_points(), p);
        }
        None => render_seismogram(seis, format, &mut std::io::stdout().lock())?,
    }
    Ok(())
}

/// Render a seismogram in the requested format.
pub fn render_seismogram<W: Write>(seis: &Seismogram, format: OutputFormat, w: &mut W) -> Result<()> {
    match format {
        OutputFormat::Text => {
            writeln!(w, "Seismogram")?;
            writeln!(w, "==========")?;
            writeln!(w, "Segments:  {}", seis.segments.len())?;
            writeln!(w, "Samples:   {}", seis.num_points())?;
            if let Some(unit) = seis.unit() {
                writeln!(w, "Unit:      {}", unit)?;
            }
            if let Some(rate) = seis.sample_rate() {
                writeln!(w, "Rate:      {} sps", rate.0)?;
            }
            for (i, seg) in seis.segments.iter().enumerate() {
                writeln!(
                    w,
                    "  [{}] start {:.3} s, {} samples, peak {:.6e}, rms {:.6e}",
                    i,
                    seg.t_start.0,
                    seg.len(),
                    seg.max_abs(),
                    seg.rms()
                )?;
            }
        }
        OutputFormat::Json => {
            writeln!(w, "{}", serde_json::to_string_pretty(seis)?)?;
        }
        OutputFormat::Csv => {
            writeln!(w, "time,value")?;
            for seg in &seis.segments {
                for (i, v) in seg.samples.iter().enumerate() {
                    writeln!(w, "{},{}", seg.time_at(i).0, v)?;
                }
            }
        }
    }
    Ok(())
}

/// Render a response evaluated at `freqs`.
pub fn render_response<W: Write>(freqs: &[f64], values: &[Complex64], format: OutputFormat, w: &mut W) -> Result<()> {
    match format {
        OutputFormat::Text => {
            writeln!(w, "{:>14} {:>14} {:>10}", "freq_hz", "amplitude", "phase_deg")?;
            for (f, v) in freqs.iter().zip(values) {
                writeln!(w, "{:>14.6e} {:>14.6e} {:>10.3}", f, v.norm(), v.arg().to_degrees())?;
            }
        }
        OutputFormat::Json => {
            let rows: Vec<_> = freqs
                .iter()
                .zip(values)
                .map(|(f, v)| {
                    serde_json::json!({
                        "frequency": f,
                        "real": v.re,
                        "imag": v.im,
                        "amplitude": v.norm(),
                        "phase": v.arg(),
                    })
                })
                .collect();
            writeln!(w, "{}", serde_json::to_string_pretty(&rows)?)?;
        }
        OutputFormat::Csv => {
            writeln!(w, "frequency,real,imag,amplitude,phase")?;
            for (f, v) in freqs.iter().zip(values) {
                writeln!(w, "{},{},{},{},{}", f, v.re, v.im, v.norm(), v.arg())?;
            }
        }
    }
    Ok(())
}
