//! Aria Metrics CLI
//!
//! Commands:
//! - analyze: Compute metrics for one recording
//! - batch: Analyze every recording in a directory in parallel
//! - validate: Check a recording without computing metrics
//! - config: Print the default configuration

use clap::{Parser, Subcommand, ValueEnum};
use log::warn;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use aria_metrics::adapter::Severity;
use aria_metrics::{
    analyze_batch, render_text, AnalysisError, BatchInput, BatchOutcome, MetricsCalculator,
    MetricsConfig, Recording, RecordingAdapter, ReportEncoder, SessionReport, VERSION,
};

/// Aria Metrics - training-performance metrics for head-worn camera recordings
#[derive(Parser)]
#[command(name = "aria-metrics")]
#[command(version = VERSION)]
#[command(about = "Compute training metrics from extracted recordings", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute metrics for a single recording
    Analyze {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "json")]
        input_format: InputFormat,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Output format
        #[arg(long, default_value = "json-pretty")]
        output_format: OutputFormat,

        /// Metrics configuration file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Session name (defaults to the recording's name or the file stem)
        #[arg(long)]
        session_name: Option<String>,
    },

    /// Analyze every *.json recording in a directory
    Batch {
        /// Directory of recording documents
        #[arg(long)]
        input_dir: PathBuf,

        /// Directory for reports and the batch summary
        #[arg(long)]
        output_dir: PathBuf,

        /// Worker threads (defaults to the number of CPUs)
        #[arg(long)]
        jobs: Option<usize>,

        /// Metrics configuration file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Validate a recording without computing metrics
    Validate {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "json")]
        input_format: InputFormat,

        /// Metrics configuration file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the default metrics configuration
    Config,
}

#[derive(Clone, ValueEnum)]
enum InputFormat {
    /// Recording document with samples and optional tracking streams
    Json,
    /// Newline-delimited head-pose samples
    Ndjson,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Compact JSON report
    Json,
    /// Pretty-printed JSON report
    JsonPretty,
    /// Human-readable summary
    Text,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e)).unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), AriaCliError> {
    match cli.command {
        Commands::Analyze {
            input,
            input_format,
            output,
            output_format,
            config,
            session_name,
        } => cmd_analyze(
            &input,
            input_format,
            &output,
            output_format,
            config.as_deref(),
            session_name,
        ),

        Commands::Batch {
            input_dir,
            output_dir,
            jobs,
            config,
        } => cmd_batch(&input_dir, &output_dir, jobs, config.as_deref()),

        Commands::Validate {
            input,
            input_format,
            config,
            json,
        } => cmd_validate(&input, input_format, config.as_deref(), json),

        Commands::Config => {
            println!("{}", MetricsConfig::default().to_json()?);
            Ok(())
        }
    }
}

fn cmd_analyze(
    input: &Path,
    input_format: InputFormat,
    output: &Path,
    output_format: OutputFormat,
    config: Option<&Path>,
    session_name: Option<String>,
) -> Result<(), AriaCliError> {
    let calculator = MetricsCalculator::new(load_config(config)?)?;
    let mut recording = read_recording(input, input_format)?;
    if let Some(name) = session_name {
        recording.session_name = name;
    }
    let analysis = calculator.calculate_recording(&recording)?;
    let report = ReportEncoder::new().encode_recording(&recording, &analysis);
    let output_data = format_output(&report, &output_format)?;

    if output.to_string_lossy() == "-" {
        print!("{}", output_data);
    } else {
        fs::write(output, output_data)?;
    }

    Ok(())
}

fn cmd_batch(
    input_dir: &Path,
    output_dir: &Path,
    jobs: Option<usize>,
    config: Option<&Path>,
) -> Result<(), AriaCliError> {
    let calculator = MetricsCalculator::new(load_config(config)?)?;

    let inputs = collect_batch_inputs(input_dir)?;
    if inputs.is_empty() {
        return Err(AriaCliError::NoInputs(input_dir.display().to_string()));
    }

    let summary = analyze_batch(&inputs, &calculator, jobs)?;

    fs::create_dir_all(output_dir)?;
    for entry in &summary.entries {
        match &entry.outcome {
            BatchOutcome::Success { report } => {
                let path = output_dir.join(format!("{}.report.json", entry.name));
                fs::write(path, serde_json::to_string_pretty(report)?)?;
            }
            BatchOutcome::Failure { code, message } => {
                eprintln!("  [FAIL] {}: {} ({})", entry.name, message, code);
            }
        }
    }
    fs::write(
        output_dir.join("batch_summary.json"),
        serde_json::to_string_pretty(&summary)?,
    )?;

    println!(
        "Analyzed {} recordings: {} succeeded, {} failed (mean score {})",
        summary.total,
        summary.succeeded,
        summary.failed,
        summary.mean_overall_score.display(1)
    );

    if summary.failed > 0 {
        Err(AriaCliError::BatchFailed(summary.failed))
    } else {
        Ok(())
    }
}

fn cmd_validate(
    input: &Path,
    input_format: InputFormat,
    config: Option<&Path>,
    json: bool,
) -> Result<(), AriaCliError> {
    let config = load_config(config)?;
    let recording = read_recording(input, input_format)?;
    let report = RecordingAdapter::validate(&recording, &config);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report: {}", report.session_name);
        println!("=================");
        println!("Total samples:      {}", report.total_samples);
        println!("Heart-rate samples: {}", report.heart_rate_samples);
        println!("Hand frames:        {}", report.hand_frames);
        println!("Gaze samples:       {}", report.gaze_samples);

        if !report.problems.is_empty() {
            println!("\nProblems:");
            for problem in &report.problems {
                let level = match problem.severity {
                    Severity::Fatal => "[ERR]",
                    Severity::Warning => "[WARN]",
                };
                match problem.index {
                    Some(i) => println!("  {} sample {}: {}", level, i, problem.message),
                    None => println!("  {} {}", level, problem.message),
                }
            }
        }
        if let Some(error) = &report.fatal_error {
            println!("\nAnalysis would fail: {}", error);
        }
    }

    match report.fatal_error {
        Some(message) => Err(AriaCliError::ValidationFailed(message)),
        None => Ok(()),
    }
}

// Helper functions

/// Read every `*.json` file in `dir`, sorted by path
///
/// Files or directory entries that cannot be read become unreadable inputs,
/// so they show up as failures in the batch summary.
fn collect_batch_inputs(dir: &Path) -> io::Result<Vec<BatchInput>> {
    let mut paths = Vec::new();
    let mut unreadable = Vec::new();
    for (i, entry) in fs::read_dir(dir)?.enumerate() {
        match entry {
            Ok(entry) => {
                let path = entry.path();
                if path.extension().is_some_and(|ext| ext == "json") {
                    paths.push(path);
                }
            }
            Err(e) => {
                warn!("Skipping unreadable entry {} in {}: {}", i, dir.display(), e);
                unreadable.push(BatchInput::unreadable(format!("unreadable-entry-{i}"), e));
            }
        }
    }
    paths.sort();

    let mut inputs: Vec<BatchInput> = paths
        .iter()
        .map(|path| match fs::read_to_string(path) {
            Ok(json) => BatchInput::new(file_stem(path), json),
            Err(e) => BatchInput::unreadable(file_stem(path), e),
        })
        .collect();
    inputs.extend(unreadable);
    Ok(inputs)
}

fn load_config(path: Option<&Path>) -> Result<MetricsConfig, AriaCliError> {
    match path {
        Some(path) => Ok(MetricsConfig::from_json(&fs::read_to_string(path)?)?),
        None => Ok(MetricsConfig::default()),
    }
}

fn read_input(input: &Path) -> Result<String, AriaCliError> {
    if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn read_recording(input: &Path, format: InputFormat) -> Result<Recording, AriaCliError> {
    let data = read_input(input)?;
    let recording = match format {
        InputFormat::Json => RecordingAdapter::parse_recording(&data)?,
        InputFormat::Ndjson => {
            Recording::new(file_stem(input), RecordingAdapter::parse_ndjson_samples(&data)?)
        }
    };
    Ok(recording)
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| s != "-")
        .unwrap_or_else(|| "session".to_string())
}

fn format_output(report: &SessionReport, format: &OutputFormat) -> Result<String, AriaCliError> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string(report)? + "\n"),
        OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(report)? + "\n"),
        OutputFormat::Text => Ok(render_text(report)),
    }
}

// Error types

#[derive(Debug)]
enum AriaCliError {
    Io(io::Error),
    Analysis(AnalysisError),
    Json(serde_json::Error),
    NoInputs(String),
    ValidationFailed(String),
    BatchFailed(usize),
}

impl From<io::Error> for AriaCliError {
    fn from(e: io::Error) -> Self {
        AriaCliError::Io(e)
    }
}

impl From<AnalysisError> for AriaCliError {
    fn from(e: AnalysisError) -> Self {
        AriaCliError::Analysis(e)
    }
}

impl From<serde_json::Error> for AriaCliError {
    fn from(e: serde_json::Error) -> Self {
        AriaCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<AriaCliError> for CliError {
    fn from(e: AriaCliError) -> Self {
        match e {
            AriaCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            AriaCliError::Analysis(e) => {
                let hint = match &e {
                    AnalysisError::InsufficientData { .. } => "Record a longer session",
                    AnalysisError::InvalidSession(_) => {
                        "Run 'aria-metrics validate' to locate the offending samples"
                    }
                    AnalysisError::InvalidConfig(_) => {
                        "Run 'aria-metrics config' for a valid starting point"
                    }
                    AnalysisError::ParseError(_) | AnalysisError::JsonError(_) => {
                        "Check --input-format and the input syntax"
                    }
                };
                CliError {
                    code: e.code().to_string(),
                    message: e.to_string(),
                    hint: Some(hint.to_string()),
                }
            }
            AriaCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            AriaCliError::NoInputs(dir) => CliError {
                code: "NO_INPUTS".to_string(),
                message: format!("No *.json recordings in {}", dir),
                hint: None,
            },
            AriaCliError::ValidationFailed(message) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message,
                hint: Some("Fix validation errors and retry".to_string()),
            },
            AriaCliError::BatchFailed(count) => CliError {
                code: "BATCH_FAILED".to_string(),
                message: format!("{} recordings failed analysis", count),
                hint: Some("See batch_summary.json for per-recording errors".to_string()),
            },
        }
    }
}
