//! Processing pipeline orchestration.

use crate::config::{ResponseConfig, ResponseSource, RunConfig};
use anyhow::{Context, Result};
use lib_dsp::hilbert::envelope_with;
use lib_dsp::{apply_filter, design, process, TransferEngine};
use lib_types::{Response, Seconds, Seismogram, Unit, Waveform};
use std::path::Path;

/// Read a single-column ASCII waveform. Blank lines and `#` comments are
/// skipped; several whitespace-separated values on one line are accepted.
pub fn load_ascii_waveform(path: &Path, dt: Seconds, t_start: Seconds, unit: Unit) -> Result<Waveform> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read waveform file: {:?}", path))?;

    let mut samples = Vec::new();
    for (index, line) in content.lines().enumerate() {
        let data = line.split('#').next().unwrap_or_default();
        for token in data.split_whitespace() {
            let value: f64 = token
                .parse()
                .with_context(|| format!("Invalid sample {:?} at line {} of {:?}", token, index + 1, path))?;
            samples.push(value);
        }
    }

    if samples.is_empty() {
        anyhow::bail!("No samples found in {:?}", path);
    }

    tracing::info!("Loaded {} samples from {:?}", samples.len(), path);
    Ok(Waveform::new(samples, dt, t_start, unit))
}

/// Read a channel response document.
pub fn load_response_json(path: &Path) -> Result<Response> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read response file: {:?}", path))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse response JSON: {:?}", path))
}

/// Pipeline driver.
pub struct Orchestrator {
    config: RunConfig,
}

impl Orchestrator {
    pub fn new(config: RunConfig) -> Self {
        Self { config }
    }

    /// Load the input and run every configured stage.
    pub fn run(&self) -> Result<Seismogram> {
        let input = &self.config.input;
        let waveform = load_ascii_waveform(&input.path, input.dt(), Seconds(input.start_time), input.unit())?;
        self.process(Seismogram::from_waveform(waveform))
    }

    /// Conditioning, then correction, filtering and envelope as configured.
    pub fn process(&self, seismogram: Seismogram) -> Result<Seismogram> {
        tracing::info!("Starting run: {}", self.config.name);

        let mut seis = seismogram;
        if self.config.conditioning.rmean {
            seis = process::rmean(&seis);
        }
        if self.config.conditioning.remove_trend {
            seis = process::remove_trend(&seis).context("Failed to remove trend")?;
        }

        if let Some(ref response) = self.config.response {
            seis = self.correct(&seis, response)?;
        }

        if let Some(ref filter) = self.config.filter {
            let dt = seis
                .sample_period()
                .context("Cannot filter an empty seismogram")?;
            let iir = design(
                &filter.prototype,
                filter.num_poles,
                filter.passband,
                filter.low_corner,
                filter.high_corner,
                dt,
            )
            .context("Failed to design filter")?;
            seis = apply_filter(&iir, &seis).context("Failed to apply filter")?;
        }

        if let Some(ref envelope) = self.config.envelope {
            seis = envelope_with(&seis, &envelope.design()).context("Failed to compute envelope")?;
        }

        tracing::info!("Run complete: {} samples, unit {}", seis.num_points(), unit_label(&seis));
        Ok(seis)
    }

    fn correct(&self, seis: &Seismogram, response: &ResponseConfig) -> Result<Seismogram> {
        let taper = response.taper.to_taper()?;
        let corrected = match &response.source {
            ResponseSource::SacPz { path } => {
                let pz = lib_sacpz::parse_sacpz_file(path)
                    .with_context(|| format!("Failed to parse SAC pole-zero file: {:?}", path))?
                    .into_pole_zero();
                TransferEngine::from_sac_pole_zero(pz).correct(seis, &taper)
            }
            ResponseSource::Json { path } => {
                let resp = load_response_json(path)?;
                TransferEngine::from_response(&resp)
                    .context("Failed to build canonical response")?
                    .correct(seis, &taper)
            }
        };
        corrected.context("Instrument correction failed")
    }
}

fn unit_label(seis: &Seismogram) -> String {
    seis.unit().map(ToString::to_string).unwrap_or_else(|| "-".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConditioningConfig, EnvelopeConfig, InputConfig, TaperConfig};
    use std::io::Write;

    fn write_file(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        std::fs::File::create(&path).unwrap().write_all(content.as_bytes()).unwrap();
        path
    }

    fn config_for(path: std::path::PathBuf) -> RunConfig {
        RunConfig {
            name: "unit".into(),
            input: InputConfig {
                path,
                sample_interval: 0.05,
                start_time: 0.0,
                unit: "count".into(),
            },
            conditioning: ConditioningConfig {
                rmean: true,
                remove_trend: false,
            },
            response: None,
            filter: None,
            envelope: None,
        }
    }

    #[test]
    fn test_load_ascii_waveform() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "w.txt", "# header\n1.5\n\n2.5 3.5 # trailing\n-4e-1\n");
        let wf = load_ascii_waveform(&path, Seconds(0.1), Seconds(5.0), Unit::Counts).unwrap();
        assert_eq!(wf.samples, vec![1.5, 2.5, 3.5, -0.4]);
        assert_eq!(wf.t_start, Seconds(5.0));

        let bad = write_file(dir.path(), "bad.txt", "1.0\nabc\n");
        let err = load_ascii_waveform(&bad, Seconds(0.1), Seconds(0.0), Unit::Counts).unwrap_err();
        assert!(err.to_string().contains("line 2"));

        let empty = write_file(dir.path(), "empty.txt", "# nothing\n");
        assert!(load_ascii_waveform(&empty, Seconds(0.1), Seconds(0.0), Unit::Counts).is_err());
    }

    #[test]
    fn test_pipeline_with_sacpz_correction() {
        let dir = tempfile::tempdir().unwrap();
        let samples: Vec<String> = (0..512)
            .map(|i| format!("{}", (2.0 * std::f64::consts::PI * 1.0 * i as f64 * 0.05).sin()))
            .collect();
        let data = write_file(dir.path(), "data.txt", &samples.join("\n"));
        // Flat displacement response with unit gain.
        let pz = write_file(dir.path(), "flat.pz", "ZEROS 0\nPOLES 0\nCONSTANT 1.0\n");

        let mut config = config_for(data);
        config.response = Some(ResponseConfig {
            source: ResponseSource::SacPz { path: pz },
            taper: TaperConfig {
                low_cut: 0.01,
                low_pass: 0.02,
                high_pass: 8.0,
                high_cut: 9.0,
            },
        });

        let out = Orchestrator::new(config).run().unwrap();
        assert_eq!(out.num_points(), 512);
        assert_eq!(out.unit(), Some(&Unit::METER));
        let peak = out.segments[0].max_abs();
        assert!((peak - 1.0).abs() < 0.05, "peak {}", peak);
    }

    #[test]
    fn test_pipeline_envelope() {
        let dir = tempfile::tempdir().unwrap();
        let samples: Vec<String> = (0..400)
            .map(|i| format!("{}", 2.0 * (2.0 * std::f64::consts::PI * 0.1 * i as f64).sin()))
            .collect();
        let data = write_file(dir.path(), "data.txt", &samples.join("\n"));

        let mut config = config_for(data);
        config.envelope = Some(EnvelopeConfig::default());

        let out = Orchestrator::new(config).run().unwrap();
        let y = &out.segments[0].samples;
        for v in &y[30..370] {
            assert!((v - 2.0).abs() < 0.1, "{}", v);
        }
    }

    #[test]
    fn test_response_json_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let response = Response::new(None, vec![]);
        let path = write_file(dir.path(), "resp.json", &serde_json::to_string(&response).unwrap());
        let loaded = load_response_json(&path).unwrap();
        assert_eq!(loaded, response);
    }
}
