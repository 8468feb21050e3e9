//! seisresp: instrument response correction and filtering of seismograms.

mod config;
mod orchestrator;
mod output;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use lib_dsp::spacing::geomspace;
use lib_dsp::{apply_filter, convert_to_sac_pole_zero, design, envelope, Passband, Prototype, SacPoleZero};
use lib_types::{PhysicalUnit, Seconds, Seismogram, Unit};
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "seisresp")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Output format
    #[arg(short, long, default_value = "text")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Csv,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
enum PrototypeArg {
    Butterworth,
    ChebyshevI,
    ChebyshevIi,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
enum PassbandArg {
    Lowpass,
    Bandpass,
    Highpass,
}

impl From<PassbandArg> for Passband {
    fn from(arg: PassbandArg) -> Self {
        match arg {
            PassbandArg::Lowpass => Passband::Lowpass,
            PassbandArg::Bandpass => Passband::Bandpass,
            PassbandArg::Highpass => Passband::Highpass,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run a processing pipeline described by a configuration file
    Transfer {
        /// Path to the run configuration (TOML or JSON)
        #[arg(short, long)]
        config: PathBuf,

        /// Output file; stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Apply a recursive filter to an ASCII waveform
    Filter {
        /// Single-column ASCII waveform
        input: PathBuf,

        /// Sample period in seconds
        #[arg(long)]
        sample_interval: f64,

        /// Analog prototype
        #[arg(long, default_value = "butterworth")]
        prototype: PrototypeArg,

        /// Ripple parameter for the Chebyshev prototypes
        #[arg(long, default_value = "0.5")]
        epsilon: f64,

        /// Band to pass
        #[arg(long, default_value = "bandpass")]
        passband: PassbandArg,

        /// Number of poles
        #[arg(long, default_value = "2")]
        poles: usize,

        /// Low corner in Hz
        #[arg(long, default_value = "0")]
        low: f64,

        /// High corner in Hz
        #[arg(long, default_value = "0")]
        high: f64,

        /// Output file; stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Compute the envelope of an ASCII waveform
    Envelope {
        /// Single-column ASCII waveform
        input: PathBuf,

        /// Sample period in seconds
        #[arg(long)]
        sample_interval: f64,

        /// Output file; stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Evaluate a response over a log-spaced frequency range
    Response {
        /// SAC pole-zero file, or a `.json` channel response
        file: PathBuf,

        /// Lowest frequency in Hz
        #[arg(long, default_value = "0.001")]
        min_freq: f64,

        /// Highest frequency in Hz
        #[arg(long, default_value = "50")]
        max_freq: f64,

        /// Number of frequencies
        #[arg(short, long, default_value = "100")]
        num: usize,

        /// Ground-motion unit the response should map to counts, e.g. "m/s"
        #[arg(long)]
        unit: Option<String>,
    },

    /// Parse and validate a SAC pole-zero file
    ParseSacpz {
        /// Path to the pole-zero file
        file: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    match cli.command {
        Commands::Transfer { config, output } => {
            run_transfer(&config, output.as_deref(), cli.format)?;
        }
        Commands::Filter {
            input,
            sample_interval,
            prototype,
            epsilon,
            passband,
            poles,
            low,
            high,
            output,
        } => {
            let prototype = match prototype {
                PrototypeArg::Butterworth => Prototype::Butterworth,
                PrototypeArg::ChebyshevI => Prototype::ChebyshevI { epsilon },
                PrototypeArg::ChebyshevIi => Prototype::ChebyshevII { epsilon },
            };
            run_filter(
                &input,
                Seconds(sample_interval),
                prototype,
                passband.into(),
                poles,
                (low, high),
                output.as_deref(),
                cli.format,
            )?;
        }
        Commands::Envelope { input, sample_interval, output } => {
            run_envelope(&input, Seconds(sample_interval), output.as_deref(), cli.format)?;
        }
        Commands::Response { file, min_freq, max_freq, num, unit } => {
            show_response(&file, min_freq, max_freq, num, unit.as_deref(), cli.format)?;
        }
        Commands::ParseSacpz { file } => {
            parse_sacpz(&file)?;
        }
    }

    Ok(())
}

fn run_transfer(config_path: &Path, output: Option<&Path>, format: OutputFormat) -> Result<()> {
    tracing::info!("Loading configuration from {:?}", config_path);

    let config = config::load_config(config_path)?;
    if config.response.is_none() {
        anyhow::bail!("Configuration {:?} has no [response] section", config_path);
    }

    let seis = orchestrator::Orchestrator::new(config).run()?;
    output::write_seismogram(&seis, output, format)
}

fn load_input(input: &Path, dt: Seconds) -> Result<Seismogram> {
    if !(dt.0.is_finite() && dt.0 > 0.0) {
        anyhow::bail!("Sample interval must be positive, got {}", dt.0);
    }
    let waveform = orchestrator::load_ascii_waveform(input, dt, Seconds(0.0), Unit::Counts)?;
    Ok(Seismogram::from_waveform(waveform))
}

#[allow(clippy::too_many_arguments)]
fn run_filter(
    input: &Path,
    dt: Seconds,
    prototype: Prototype,
    passband: Passband,
    num_poles: usize,
    (low_corner, high_corner): (f64, f64),
    output: Option<&Path>,
    format: OutputFormat,
) -> Result<()> {
    let seis = load_input(input, dt)?;
    let filter = design(&prototype, num_poles, passband, low_corner, high_corner, dt)
        .context("Failed to design filter")?;
    tracing::info!(
        "Designed {:?} {:?} filter with {} sections",
        prototype,
        passband,
        filter.sections().len()
    );
    let filtered = apply_filter(&filter, &seis)?;
    output::write_seismogram(&filtered, output, format)
}

fn run_envelope(input: &Path, dt: Seconds, output: Option<&Path>, format: OutputFormat) -> Result<()> {
    let seis = load_input(input, dt)?;
    let env = envelope(&seis)?;
    output::write_seismogram(&env, output, format)
}

fn load_pole_zero(file: &Path) -> Result<SacPoleZero> {
    if file.extension().map_or(false, |e| e == "json") {
        let response = orchestrator::load_response_json(file)?;
        Ok(convert_to_sac_pole_zero(&response)?)
    } else {
        Ok(lib_sacpz::parse_sacpz_file(file)?.into_pole_zero())
    }
}

fn show_response(
    file: &Path,
    min_freq: f64,
    max_freq: f64,
    num: usize,
    unit: Option<&str>,
    format: OutputFormat,
) -> Result<()> {
    tracing::info!("Evaluating response from {:?}", file);

    let mut pole_zero = load_pole_zero(file)?;
    if let Some(unit) = unit {
        let unit = PhysicalUnit::parse(unit)?;
        pole_zero.trim_zeros(unit.motion.gamma())?;
    }

    let freqs = geomspace(min_freq, max_freq, num)
        .with_context(|| format!("Frequency range must be positive, got {} to {}", min_freq, max_freq))?;
    let values = pole_zero.calc_for_display(&freqs);
    output::render_response(&freqs, &values, format, &mut std::io::stdout().lock())
}

fn parse_sacpz(file: &Path) -> Result<()> {
    tracing::info!("Parsing SAC pole-zero file: {:?}", file);

    let pz = lib_sacpz::parse_sacpz_file(file)?;

    println!("SAC Pole-Zero File");
    for key in ["NETWORK", "STATION", "LOCATION", "CHANNEL", "INPUT UNIT"] {
        if let Some(value) = pz.header(key) {
            println!("  {}: {}", key, value);
        }
    }
    println!("  Zeros: {}", pz.pole_zero.zeros.len());
    println!("  Poles: {}", pz.pole_zero.poles.len());
    println!("  Constant: {:e}", pz.pole_zero.constant);

    let stable = pz.pole_zero.poles.iter().all(|p| p.re < 0.0);
    if stable {
        println!("  Stable: Yes");
    } else {
        println!("  Stable: No (pole on or right of the imaginary axis)");
    }

    Ok(())
}
