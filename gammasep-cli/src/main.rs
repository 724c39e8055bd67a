//! gammasep: prompt-gamma versus 511 keV separation study.
//!
//! Reads simulated hit records, assembles events, fills the energy
//! histograms, derives purity/efficiency/ROC curves and writes them out.
#![allow(clippy::cast_precision_loss)]

use clap::{Parser, ValueEnum};
use gammasep_analysis::{process_hits, AccumulatorConfig, AnalysisResult, ThresholdGrid};
use gammasep_io::{ChartRenderer, HitFileFormat, HitFileReader, ResultsWriter, RunMetadata};
use log::{info, warn};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;
use thiserror::Error;

/// Result type for CLI operations.
type Result<T> = std::result::Result<T, CliError>;

/// CLI error types.
#[derive(Error, Debug)]
enum CliError {
    #[error("{0}")]
    GammasepIo(#[from] gammasep_io::Error),

    #[error("{0}")]
    Core(#[from] gammasep_core::Error),
}

impl CliError {
    /// Process exit code; 2 is left to clap for usage errors.
    fn exit_code(&self) -> u8 {
        match self {
            Self::GammasepIo(gammasep_io::Error::Open { .. }) => 3,
            Self::GammasepIo(gammasep_io::Error::CoreError(e)) | Self::Core(e)
                if e.is_invariant_violation() =>
            {
                4
            }
            _ => 1,
        }
    }
}

/// Input file layout.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum InputFormat {
    /// Binary for .bin/.dat, text otherwise
    Auto,
    /// Little-endian fixed-size records
    Binary,
    /// Whitespace or comma separated columns
    Text,
}

/// Prompt-gamma versus annihilation-gamma separation from simulated hits.
#[derive(Parser)]
#[command(name = "gammasep")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input hit file
    input: PathBuf,

    /// Source emission energy label (recorded with the results only)
    emission_energy: String,

    /// Directory for result files and charts
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Input file layout
    #[arg(long, value_enum, default_value = "auto")]
    format: InputFormat,

    /// Apply Gaussian energy-resolution smearing
    #[arg(long)]
    smear: bool,

    /// Resolution coefficient at 1 MeV
    #[arg(long, default_value = "0.0444")]
    resolution: f64,

    /// Fixed seed for smearing (default: seeded from the OS)
    #[arg(long)]
    seed: Option<u64>,

    /// Drop channels below the low-energy threshold
    #[arg(long)]
    low_energy_cut: bool,

    /// Low-energy threshold (keV)
    #[arg(long, default_value = "100.0")]
    low_energy_threshold: f64,

    /// Skip chart rendering
    #[arg(long)]
    no_plots: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn accumulator_config(&self) -> AccumulatorConfig {
        AccumulatorConfig {
            smearing_enabled: self.smear,
            low_energy_cut_enabled: self.low_energy_cut,
            low_energy_threshold_kev: self.low_energy_threshold,
            resolution_coefficient: self.resolution,
            seed: self.seed,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(e.exit_code())
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let start = Instant::now();
    let config = cli.accumulator_config();
    let grid = ThresholdGrid::default();

    let format = match cli.format {
        InputFormat::Auto => HitFileFormat::Auto,
        InputFormat::Binary => HitFileFormat::Binary,
        InputFormat::Text => HitFileFormat::Text,
    };
    let reader = HitFileReader::open_with_format(&cli.input, format)?;
    info!("reading {} ({:?})", cli.input.display(), reader.format());
    info!(
        "emission energy label '{}' is recorded but not used",
        cli.emission_energy
    );
    if cli.smear && cli.seed.is_none() {
        warn!("smearing without --seed; results are not reproducible");
    }

    // Nothing is written unless the whole pass succeeds.
    let result = process_hits(reader, &config, grid)?;

    let writer = ResultsWriter::create(&cli.output_dir)?;
    let metadata = RunMetadata {
        input: cli.input.display().to_string(),
        emission_energy_label: cli.emission_energy.clone(),
        accumulator: config,
        threshold_grid: grid,
        tool_version: env!("CARGO_PKG_VERSION").to_string(),
    };
    let mut written = vec![writer.write_json(&result, &metadata)?];
    written.extend(writer.write_csv(&result)?);
    if !cli.no_plots {
        written.extend(ChartRenderer::new(writer.dir()).render_all(&result)?);
    }

    print_summary(&result, written.len(), start.elapsed().as_secs_f64());
    Ok(())
}

fn print_summary(result: &AnalysisResult, files: usize, elapsed: f64) {
    let stats = &result.statistics;
    println!("Processed {} hits in {:.2}s", stats.hits_read, elapsed);
    println!("Hits ignored: {}", stats.hits_ignored);
    println!("Events: {}", stats.events);
    for h in result.histograms.all() {
        println!("{:<20} {:>10} entries", h.name(), h.entries());
    }
    println!("Files written: {files}");
}
