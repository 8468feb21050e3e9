//! Run configuration loading and validation.

use anyhow::{Context, Result};
use lib_dsp::hilbert::{DEFAULT_HALF_LENGTH, DEFAULT_HIGH_EDGE, DEFAULT_LOW_EDGE};
use lib_dsp::{FreqTaper, HilbertDesign, Passband, Prototype};
use lib_types::{Seconds, Unit};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level run configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunConfig {
    /// Run name/description.
    #[serde(default)]
    pub name: String,

    /// Waveform to process.
    pub input: InputConfig,

    /// Mean and trend removal before correction.
    #[serde(default)]
    pub conditioning: ConditioningConfig,

    /// Instrument correction.
    pub response: Option<ResponseConfig>,

    /// Recursive filter applied after correction.
    pub filter: Option<FilterConfig>,

    /// Replace the output by its envelope.
    pub envelope: Option<EnvelopeConfig>,
}

/// Single-column ASCII waveform.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InputConfig {
    pub path: PathBuf,

    /// Sample period in seconds.
    pub sample_interval: f64,

    /// Start time in seconds.
    #[serde(default)]
    pub start_time: f64,

    /// Unit of the samples, e.g. "count" or "m/s".
    #[serde(default = "default_unit")]
    pub unit: String,
}

fn default_unit() -> String {
    "count".to_string()
}

impl InputConfig {
    pub fn dt(&self) -> Seconds {
        Seconds(self.sample_interval)
    }

    pub fn unit(&self) -> Unit {
        Unit::from_metadata(&self.unit)
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct ConditioningConfig {
    #[serde(default = "default_true")]
    pub rmean: bool,

    #[serde(default = "default_true")]
    pub remove_trend: bool,
}

fn default_true() -> bool {
    true
}

impl Default for ConditioningConfig {
    fn default() -> Self {
        Self {
            rmean: true,
            remove_trend: true,
        }
    }
}

/// Where the instrument response comes from.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponseSource {
    /// SAC pole-zero file, already in displacement.
    SacPz { path: PathBuf },
    /// JSON document of the full channel response.
    Json { path: PathBuf },
}

impl ResponseSource {
    pub fn path(&self) -> &Path {
        match self {
            Self::SacPz { path } | Self::Json { path } => path,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ResponseConfig {
    pub source: ResponseSource,
    pub taper: TaperConfig,
}

/// Frequency taper corners in Hz.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct TaperConfig {
    pub low_cut: f64,
    pub low_pass: f64,
    pub high_pass: f64,
    pub high_cut: f64,
}

impl TaperConfig {
    pub fn to_taper(&self) -> Result<FreqTaper> {
        FreqTaper::new(self.low_cut, self.low_pass, self.high_pass, self.high_cut)
            .context("Invalid taper corners")
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct FilterConfig {
    #[serde(default = "default_prototype")]
    pub prototype: Prototype,

    pub passband: Passband,

    #[serde(default = "default_num_poles")]
    pub num_poles: usize,

    #[serde(default)]
    pub low_corner: f64,

    #[serde(default)]
    pub high_corner: f64,
}

fn default_prototype() -> Prototype {
    Prototype::Butterworth
}

fn default_num_poles() -> usize {
    2
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct EnvelopeConfig {
    #[serde(default = "default_half_length")]
    pub half_length: usize,

    #[serde(default = "default_low_edge")]
    pub low_edge: f64,

    #[serde(default = "default_high_edge")]
    pub high_edge: f64,
}

fn default_half_length() -> usize {
    DEFAULT_HALF_LENGTH
}

fn default_low_edge() -> f64 {
    DEFAULT_LOW_EDGE
}

fn default_high_edge() -> f64 {
    DEFAULT_HIGH_EDGE
}

impl Default for EnvelopeConfig {
    fn default() -> Self {
        Self {
            half_length: default_half_length(),
            low_edge: default_low_edge(),
            high_edge: default_high_edge(),
        }
    }
}

impl EnvelopeConfig {
    pub fn design(&self) -> HilbertDesign {
        HilbertDesign::new(self.half_length, self.low_edge, self.high_edge)
    }
}

/// Load configuration from a file; JSON when the extension is `.json`, TOML
/// otherwise.
pub fn load_config(path: &Path) -> Result<RunConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: RunConfig = if path.extension().map_or(false, |e| e == "json") {
        serde_json::from_str(&content).with_context(|| "Failed to parse config as JSON")?
    } else {
        toml::from_str(&content).with_context(|| "Failed to parse config as TOML")?
    };

    validate_config(&config)?;

    Ok(config)
}

/// Validate configuration.
pub fn validate_config(config: &RunConfig) -> Result<()> {
    if !config.input.path.exists() {
        anyhow::bail!("Input waveform not found: {:?}", config.input.path);
    }

    if !(config.input.sample_interval.is_finite() && config.input.sample_interval > 0.0) {
        anyhow::bail!(
            "Sample interval must be positive, got {}",
            config.input.sample_interval
        );
    }

    if let Some(ref response) = config.response {
        if !response.source.path().exists() {
            anyhow::bail!("Response file not found: {:?}", response.source.path());
        }
        response.taper.to_taper()?;
    }

    if let Some(ref filter) = config.filter {
        if filter.num_poles == 0 {
            anyhow::bail!("Filter needs at least one pole");
        }
        let nyquist = 0.5 / config.input.sample_interval;
        let (needs_low, needs_high) = match filter.passband {
            Passband::Lowpass => (false, true),
            Passband::Highpass => (true, false),
            Passband::Bandpass => (true, true),
        };
        if needs_low && !(filter.low_corner > 0.0 && filter.low_corner < nyquist) {
            anyhow::bail!(
                "Low corner {} Hz must be between 0 and Nyquist {} Hz",
                filter.low_corner,
                nyquist
            );
        }
        if needs_high && !(filter.high_corner > 0.0 && filter.high_corner < nyquist) {
            anyhow::bail!(
                "High corner {} Hz must be between 0 and Nyquist {} Hz",
                filter.high_corner,
                nyquist
            );
        }
        if needs_low && needs_high && filter.low_corner >= filter.high_corner {
            anyhow::bail!(
                "Bandpass low corner {} must be below high corner {}",
                filter.low_corner,
                filter.high_corner
            );
        }
    }

    if let Some(ref envelope) = config.envelope {
        if !(0.0 <= envelope.low_edge && envelope.low_edge < envelope.high_edge && envelope.high_edge <= 1.0) {
            anyhow::bail!(
                "Envelope edges must satisfy 0 <= low < high <= 1, got {} and {}",
                envelope.low_edge,
                envelope.high_edge
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_load_toml_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let data = write_file(dir.path(), "data.txt", "1\n2\n3\n");
        let pz = write_file(dir.path(), "resp.pz", "POLES 1\n-1 0\nCONSTANT 1\n");
        let config_text = format!(
            r#"
name = "test run"

[input]
path = {:?}
sample_interval = 0.025

[response]
source = {{ type = "sac_pz", path = {:?} }}
taper = {{ low_cut = 0.005, low_pass = 0.01, high_pass = 8.0, high_cut = 10.0 }}

[filter]
passband = "bandpass"
low_corner = 0.5
high_corner = 5.0

[envelope]
"#,
            data, pz
        );
        let config_path = write_file(dir.path(), "run.toml", &config_text);

        let config = load_config(&config_path).unwrap();
        assert_eq!(config.name, "test run");
        assert_eq!(config.input.unit(), Unit::Counts);
        assert!(config.conditioning.rmean && config.conditioning.remove_trend);

        let filter = config.filter.unwrap();
        assert_eq!(filter.prototype, Prototype::Butterworth);
        assert_eq!(filter.num_poles, 2);

        let envelope = config.envelope.unwrap();
        assert_eq!(envelope.half_length, 10);
        assert_eq!(envelope.low_edge, 0.05);
    }

    #[test]
    fn test_load_json() {
        let dir = tempfile::tempdir().unwrap();
        let data = write_file(dir.path(), "data.txt", "1\n2\n");
        let config_text = serde_json::json!({
            "input": { "path": data, "sample_interval": 0.01, "unit": "m/s" },
            "conditioning": { "remove_trend": false },
            "filter": {
                "prototype": { "type": "chebyshev_i", "epsilon": 0.5 },
                "passband": "lowpass",
                "num_poles": 4,
                "high_corner": 10.0
            }
        })
        .to_string();
        let config_path = write_file(dir.path(), "run.json", &config_text);

        let config = load_config(&config_path).unwrap();
        assert_eq!(config.input.unit(), Unit::METER_PER_SECOND);
        assert!(config.conditioning.rmean);
        assert!(!config.conditioning.remove_trend);
        assert!(config.response.is_none());
        assert_eq!(
            config.filter.unwrap().prototype,
            Prototype::ChebyshevI { epsilon: 0.5 }
        );
    }

    #[test]
    fn test_validation_failures() {
        let dir = tempfile::tempdir().unwrap();
        let data = write_file(dir.path(), "data.txt", "1\n2\n");
        let base = RunConfig {
            name: String::new(),
            input: InputConfig {
                path: data,
                sample_interval: 0.01,
                start_time: 0.0,
                unit: default_unit(),
            },
            conditioning: ConditioningConfig::default(),
            response: None,
            filter: None,
            envelope: None,
        };
        assert!(validate_config(&base).is_ok());

        let mut missing = base.clone();
        missing.input.path = dir.path().join("nope.txt");
        assert!(validate_config(&missing).is_err());

        let mut bad_filter = base.clone();
        bad_filter.filter = Some(FilterConfig {
            prototype: Prototype::Butterworth,
            passband: Passband::Lowpass,
            num_poles: 2,
            low_corner: 0.0,
            high_corner: 60.0,
        });
        assert!(validate_config(&bad_filter).is_err());

        let mut bad_taper = base.clone();
        bad_taper.response = Some(ResponseConfig {
            source: ResponseSource::SacPz {
                path: base.input.path.clone(),
            },
            taper: TaperConfig {
                low_cut: 1.0,
                low_pass: 0.5,
                high_pass: 8.0,
                high_cut: 10.0,
            },
        });
        assert!(validate_config(&bad_taper).is_err());

        let mut bad_envelope = base;
        bad_envelope.envelope = Some(EnvelopeConfig {
            low_edge: 0.9,
            high_edge: 0.1,
            ..Default::default()
        });
        assert!(validate_config(&bad_envelope).is_err());
    }
}
