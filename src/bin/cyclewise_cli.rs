use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use cyclewise::analysis::burst::{BurstDetection, BurstMethod};
use cyclewise::config::{AnalysisConfig, Centering, FrequencyBand};
use cyclewise::fixtures::{read_wav, write_wav, ExpectationDiff, ReferenceTable};
use cyclewise::testing::{SyntheticPattern, SyntheticSpec};
use cyclewise::{compute_features, CycleTable};
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(
    name = "cyclewise_cli",
    about = "Cycle-by-cycle oscillation features and burst detection"
)]
struct Cli {
    /// Emit per-stage debug logs on stderr
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compute the cycle table for a recording
    Features(FeaturesArgs),
    /// Compute the cycle table and compare it with a reference table
    Check(CheckArgs),
    /// Write a synthetic recording to a WAV file
    Simulate(SimulateArgs),
}

#[derive(Args, Debug)]
struct SourceArgs {
    /// Mono WAV recording
    #[arg(long, conflicts_with = "synthetic", required_unless_present = "synthetic")]
    input: Option<PathBuf>,
    /// Generate a synthetic recording instead of reading one
    #[arg(long, value_enum)]
    synthetic: Option<PatternArg>,
    /// Sampling rate (Hz); overrides the WAV header
    #[arg(long)]
    fs: Option<f64>,
    /// Synthetic recording length in seconds
    #[arg(long)]
    seconds: Option<f64>,
    #[arg(long, default_value_t = 0)]
    seed: u64,
}

#[derive(Args, Debug)]
struct AnalysisArgs {
    /// JSON analysis configuration
    #[arg(long)]
    config: Option<PathBuf>,
    /// Frequency band of interest
    #[arg(long, num_args = 2, value_names = ["LO", "HI"])]
    band: Option<Vec<f64>>,
    /// Cycle centering: peak, trough, P or T
    #[arg(long)]
    center: Option<String>,
    /// Burst detection method: cycles or amp
    #[arg(long)]
    burst: Option<String>,
}

#[derive(Args, Debug)]
struct FeaturesArgs {
    #[command(flatten)]
    source: SourceArgs,
    #[command(flatten)]
    analysis: AnalysisArgs,
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct CheckArgs {
    #[command(flatten)]
    source: SourceArgs,
    #[command(flatten)]
    analysis: AnalysisArgs,
    /// Reference table JSON
    #[arg(long)]
    expect: PathBuf,
    /// Overwrite the reference with the computed table instead of comparing
    #[arg(long)]
    update: bool,
    #[arg(long, default_value_t = 1e-6)]
    tolerance: f64,
}

#[derive(Args, Debug)]
struct SimulateArgs {
    #[arg(long, value_enum)]
    pattern: PatternArg,
    #[arg(long)]
    output: PathBuf,
    #[arg(long, default_value_t = 1000)]
    fs: u32,
    #[arg(long)]
    seconds: Option<f64>,
    #[arg(long, default_value_t = 10.0)]
    freq: f64,
    #[arg(long, default_value_t = 0)]
    seed: u64,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum PatternArg {
    Sine,
    Bursty,
    Step,
}

impl PatternArg {
    fn pattern(self) -> SyntheticPattern {
        match self {
            PatternArg::Sine => SyntheticPattern::Sine,
            PatternArg::Bursty => SyntheticPattern::Bursty,
            PatternArg::Step => SyntheticPattern::Step,
        }
    }

    fn default_seconds(self) -> f64 {
        match self {
            PatternArg::Sine => 2.0,
            PatternArg::Bursty => 10.0,
            PatternArg::Step => 3.0,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    Json,
    Csv,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match run(cli.command) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn init_tracing(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .init();
}

fn run(command: Commands) -> Result<ExitCode> {
    match command {
        Commands::Features(args) => run_features(args),
        Commands::Check(args) => run_check(args),
        Commands::Simulate(args) => run_simulate(args),
    }
}

/// Loaded or generated input signal
struct Source {
    name: String,
    fs: f64,
    samples: Vec<f64>,
}

impl SourceArgs {
    fn load(&self) -> Result<Source> {
        if let Some(path) = &self.input {
            let recording = read_wav(path)?;
            return Ok(Source {
                name: path.display().to_string(),
                fs: self.fs.unwrap_or(recording.fs),
                samples: recording.samples,
            });
        }
        let Some(pattern) = self.synthetic else {
            bail!("either --input or --synthetic is required");
        };
        let spec = SyntheticSpec {
            pattern: pattern.pattern(),
            fs: self.fs.unwrap_or(1000.0),
            n_seconds: self.seconds.unwrap_or_else(|| pattern.default_seconds()),
            seed: self.seed,
            ..SyntheticSpec::default()
        };
        Ok(Source {
            name: format!("synthetic:{:?}", spec.pattern).to_lowercase(),
            fs: spec.fs,
            samples: spec.generate(),
        })
    }
}

impl AnalysisArgs {
    fn resolve(&self) -> Result<AnalysisConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let json = fs::read_to_string(path)
                    .with_context(|| format!("reading config {}", path.display()))?;
                AnalysisConfig::from_json_str(&json)
                    .with_context(|| format!("parsing config {}", path.display()))?
            }
            None => AnalysisConfig::default(),
        };

        if let Some(band) = &self.band {
            config.f_range = FrequencyBand::new(band[0], band[1]);
        }
        if let Some(center) = &self.center {
            config.center_extrema = Centering::from_str(center)?;
        }
        if let Some(burst) = &self.burst {
            let method = BurstMethod::from_str(burst)?;
            if method != config.burst.method() {
                config.burst = BurstDetection::unconfigured(method);
            }
        }
        Ok(config)
    }
}

fn analyse(source: &SourceArgs, analysis: &AnalysisArgs) -> Result<(Source, CycleTable)> {
    let source = source.load()?;
    let config = analysis.resolve()?;
    let table = compute_features(&source.samples, source.fs, &config)
        .with_context(|| format!("analysing {}", source.name))?;
    Ok((source, table))
}

fn run_features(args: FeaturesArgs) -> Result<ExitCode> {
    let (source, table) = analyse(&args.source, &args.analysis)?;
    let body = match args.format {
        OutputFormat::Json => {
            let report = FeatureReportPayload {
                source: &source.name,
                fs: source.fs,
                n_samples: source.samples.len(),
                table: table.to_json(),
            };
            serde_json::to_string_pretty(&report)?
        }
        OutputFormat::Csv => table.to_csv(),
    };
    emit(&body, args.output.as_deref())?;
    Ok(ExitCode::from(0))
}

fn run_check(args: CheckArgs) -> Result<ExitCode> {
    let (_, table) = analyse(&args.source, &args.analysis)?;

    if args.update {
        let reference = ReferenceTable::from_table(&table, args.tolerance);
        let json = serde_json::to_string_pretty(&reference)?;
        fs::write(&args.expect, json)
            .with_context(|| format!("writing {}", args.expect.display()))?;
        return Ok(ExitCode::from(0));
    }

    let reference = ReferenceTable::load(&args.expect)?;
    match reference.verify(&table) {
        Ok(()) => {
            println!("{} cycles match {}", table.len(), args.expect.display());
            Ok(ExitCode::from(0))
        }
        Err(diff) => {
            emit_diff(&diff)?;
            Ok(ExitCode::from(2))
        }
    }
}

fn run_simulate(args: SimulateArgs) -> Result<ExitCode> {
    if args.fs == 0 {
        bail!("--fs must be positive");
    }
    let spec = SyntheticSpec {
        pattern: args.pattern.pattern(),
        fs: f64::from(args.fs),
        n_seconds: args.seconds.unwrap_or_else(|| args.pattern.default_seconds()),
        freq_hz: args.freq,
        seed: args.seed,
    };
    let samples = spec.generate();
    write_wav(&args.output, &samples, args.fs)?;
    println!(
        "wrote {} samples @ {} Hz to {}",
        samples.len(),
        args.fs,
        args.output.display()
    );
    Ok(ExitCode::from(0))
}

fn emit(body: &str, output_path: Option<&Path>) -> Result<()> {
    if let Some(path) = output_path {
        fs::write(path, body).with_context(|| format!("writing {}", path.display()))?;
    } else {
        println!("{body}");
    }
    Ok(())
}

fn emit_diff(diff: &ExpectationDiff) -> Result<()> {
    let json = serde_json::to_string_pretty(&diff.to_json())?;
    eprintln!("{json}");
    Ok(())
}

#[derive(Serialize)]
struct FeatureReportPayload<'a> {
    source: &'a str,
    fs: f64,
    n_samples: usize,
    #[serde(flatten)]
    table: serde_json::Value,
}
