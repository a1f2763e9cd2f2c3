//! Focus CLI - Command-line interface for Synheart Focus
//!
//! Commands:
//! - replay: Replay a recorded landmark stream into frame reports (batch mode)
//! - run: Process a landmark stream from stdin (streaming mode)
//! - validate: Validate landmark frame schema
//! - config: Print the default engine configuration
//! - doctor: Diagnose configuration and environment

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use synheart_focus::config::EngineConfig;
use synheart_focus::mailbox::UiEvents;
use synheart_focus::pipeline::FocusProcessor;
use synheart_focus::record::UserRecord;
use synheart_focus::runner::{SessionOutcome, SessionRunner};
use synheart_focus::schema::{FrameAdapter, NdjsonSource, RawFrame, ReplaySource, SCHEMA_VERSION};
use synheart_focus::types::FrameReport;
use synheart_focus::{FocusError, FOCUS_VERSION, PRODUCER_NAME};
use tracing_subscriber::EnvFilter;

/// Focus - On-device focus and habit tracking from face and hand landmarks
#[derive(Parser)]
#[command(name = "focus")]
#[command(author = "Synheart AI Inc")]
#[command(version = FOCUS_VERSION)]
#[command(about = "Track focus and face-touching habits from landmark streams", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a recorded landmark stream (batch mode)
    Replay {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Frame report output path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Input format
        #[arg(long, default_value = "ndjson")]
        input_format: InputFormat,

        /// Engine configuration (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Write the session record to this file
        #[arg(long)]
        record: Option<PathBuf>,

        /// Fold the session into this lifetime user record (created if missing)
        #[arg(long)]
        user_record: Option<PathBuf>,

        /// Suppress per-frame reports
        #[arg(long)]
        quiet: bool,
    },

    /// Process a landmark stream from stdin (streaming mode)
    Run {
        /// Engine configuration (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Write the session record to this file on exit
        #[arg(long)]
        record: Option<PathBuf>,

        /// Buffer output instead of flushing after each report
        #[arg(long)]
        no_flush: bool,
    },

    /// Validate landmark frame schema
    Validate {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "ndjson")]
        input_format: InputFormat,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the default engine configuration as TOML
    Config,

    /// Diagnose configuration and environment
    Doctor {
        /// Check a configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum InputFormat {
    /// Newline-delimited JSON (one frame per line)
    Ndjson,
    /// JSON array of frames
    Json,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), FocusCliError> {
    match cli.command {
        Commands::Replay {
            input,
            output,
            input_format,
            config,
            record,
            user_record,
            quiet,
        } => cmd_replay(
            &input,
            &output,
            input_format,
            config.as_deref(),
            record.as_deref(),
            user_record.as_deref(),
            quiet,
        ),

        Commands::Run {
            config,
            record,
            no_flush,
        } => cmd_run(config.as_deref(), record.as_deref(), !no_flush),

        Commands::Validate {
            input,
            input_format,
            json,
        } => cmd_validate(&input, input_format, json),

        Commands::Config => cmd_config(),

        Commands::Doctor { config, json } => cmd_doctor(config.as_deref(), json),
    }
}

fn cmd_replay(
    input: &Path,
    output: &Path,
    input_format: InputFormat,
    config: Option<&Path>,
    record: Option<&Path>,
    user_record: Option<&Path>,
    quiet: bool,
) -> Result<(), FocusCliError> {
    let frames = read_frames(input, &input_format)?;
    if frames.is_empty() {
        return Err(FocusCliError::NoFrames);
    }
    FrameAdapter::check_frames(&frames)?;

    let processor = FocusProcessor::new(load_config(config)?)?;
    let events = UiEvents::new();
    let mut source = ReplaySource::new(frames, events.clone());
    let mut runner = SessionRunner::new(processor, events);

    let mut writer: Box<dyn Write> = if output.to_string_lossy() == "-" {
        Box::new(BufWriter::new(io::stdout()))
    } else {
        Box::new(BufWriter::new(fs::File::create(output)?))
    };

    let mut sink = ReportSink::new(&mut writer, false, quiet);
    let outcome = runner.run(&mut source, &mut |report: &FrameReport| sink.write(report))?;
    sink.finish()?;
    writer.flush()?;

    write_records(&outcome, record, user_record)
}

fn cmd_run(
    config: Option<&Path>,
    record: Option<&Path>,
    flush: bool,
) -> Result<(), FocusCliError> {
    let processor = FocusProcessor::new(load_config(config)?)?;
    let events = UiEvents::new();
    let stdin = io::stdin();
    let mut source = NdjsonSource::new(stdin.lock(), events.clone());
    let mut runner = SessionRunner::new(processor, events);

    let mut stdout = io::stdout();
    let mut sink = ReportSink::new(&mut stdout, flush, false);
    let result = runner.run(&mut source, &mut |report: &FrameReport| sink.write(report));
    sink.finish()?;

    match result {
        Ok(outcome) => write_records(&outcome, record, None),
        Err(e) => {
            // Keep what was tracked before the stream broke
            if let Some(path) = record {
                fs::write(path, runner.processor().finish().to_json()?)?;
            }
            Err(e.into())
        }
    }
}

fn cmd_validate(input: &Path, input_format: InputFormat, json: bool) -> Result<(), FocusCliError> {
    let frames = read_frames(input, &input_format)?;
    let results = FrameAdapter::validate_frames(&frames);

    let report = ValidationReport {
        total_frames: frames.len(),
        valid_frames: frames.len() - results.len(),
        invalid_frames: results.len(),
        errors: results
            .iter()
            .map(|r| ValidationErrorDetail {
                index: r.index,
                frame_id: r.frame_id.clone(),
                error: r.result.as_ref().map(|e| e.to_string()).unwrap_or_default(),
            })
            .collect(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("Total frames:   {}", report.total_frames);
        println!("Valid frames:   {}", report.valid_frames);
        println!("Invalid frames: {}", report.invalid_frames);

        if !report.errors.is_empty() {
            println!("\nErrors:");
            for err in &report.errors {
                println!(
                    "  - Frame {} (index {}): {}",
                    err.frame_id.as_deref().unwrap_or("unknown"),
                    err.index,
                    err.error
                );
            }
        }
    }

    if report.invalid_frames > 0 {
        Err(FocusCliError::ValidationFailed(report.invalid_frames))
    } else {
        Ok(())
    }
}

fn cmd_config() -> Result<(), FocusCliError> {
    print!("{}", EngineConfig::default().to_toml_string()?);
    Ok(())
}

fn cmd_doctor(config: Option<&Path>, json: bool) -> Result<(), FocusCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "focus_version".to_string(),
        status: CheckStatus::Ok,
        message: format!("Focus version {}", FOCUS_VERSION),
    });

    checks.push(DoctorCheck {
        name: "schema_version".to_string(),
        status: CheckStatus::Ok,
        message: format!("Input schema: {}", SCHEMA_VERSION),
    });

    if let Some(config_path) = config {
        let check = if !config_path.exists() {
            DoctorCheck {
                name: "config".to_string(),
                status: CheckStatus::Warning,
                message: "Config file does not exist, defaults will be used".to_string(),
            }
        } else {
            match EngineConfig::load(config_path) {
                Ok(loaded) => DoctorCheck {
                    name: "config".to_string(),
                    status: CheckStatus::Ok,
                    message: format!(
                        "Config valid (pause after {}s, {}s calibration)",
                        loaded.focus.pause_after_secs, loaded.calibration.window_secs
                    ),
                },
                Err(e) => DoctorCheck {
                    name: "config".to_string(),
                    status: CheckStatus::Error,
                    message: e.to_string(),
                },
            }
        };
        checks.push(check);
    }

    let stdin_check = if atty::is(atty::Stream::Stdin) {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a TTY (interactive mode)".to_string(),
        }
    } else {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a pipe (streaming mode ready)".to_string(),
        }
    };
    checks.push(stdin_check);

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: FOCUS_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Focus Doctor Report");
        println!("===================");
        println!("Producer: {}", report.producer);
        println!("Version:  {}", report.version);
        println!("\nChecks:");

        for check in &report.checks {
            let status_icon = match check.status {
                CheckStatus::Ok => "[OK]",
                CheckStatus::Warning => "[WARN]",
                CheckStatus::Error => "[ERR]",
            };
            println!("  {} {}: {}", status_icon, check.name, check.message);
        }
    }

    let has_errors = report
        .checks
        .iter()
        .any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(FocusCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

// Helper functions

fn read_input(input: &Path) -> Result<String, FocusCliError> {
    if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn read_frames(input: &Path, input_format: &InputFormat) -> Result<Vec<RawFrame>, FocusCliError> {
    let input_data = read_input(input)?;
    let frames = match input_format {
        InputFormat::Ndjson => FrameAdapter::parse_ndjson(&input_data)?,
        InputFormat::Json => FrameAdapter::parse_array(&input_data)?,
    };
    Ok(frames)
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig, FocusCliError> {
    match path {
        Some(path) => Ok(EngineConfig::load(path)?),
        None => Ok(EngineConfig::default()),
    }
}

fn write_records(
    outcome: &SessionOutcome,
    record: Option<&Path>,
    user_record: Option<&Path>,
) -> Result<(), FocusCliError> {
    if let Some(path) = record {
        fs::write(path, outcome.record.to_json()?)?;
    }

    if let Some(path) = user_record {
        let mut user = if path.exists() {
            UserRecord::from_json(&fs::read_to_string(path)?)?
        } else {
            UserRecord::default()
        };
        user.absorb(&outcome.record);
        fs::write(path, user.to_json()?)?;
    }

    Ok(())
}

/// Writes one NDJSON line per frame report. The observer callback cannot
/// return errors, so the first write failure is held until `finish`.
struct ReportSink<'a, W: Write + ?Sized> {
    writer: &'a mut W,
    flush: bool,
    quiet: bool,
    error: Option<io::Error>,
}

impl<'a, W: Write + ?Sized> ReportSink<'a, W> {
    fn new(writer: &'a mut W, flush: bool, quiet: bool) -> Self {
        Self {
            writer,
            flush,
            quiet,
            error: None,
        }
    }

    fn write(&mut self, report: &FrameReport) {
        if self.quiet || self.error.is_some() {
            return;
        }
        let result = serde_json::to_string(report)
            .map_err(io::Error::from)
            .and_then(|line| writeln!(self.writer, "{}", line))
            .and_then(|()| {
                if self.flush {
                    self.writer.flush()
                } else {
                    Ok(())
                }
            });
        if let Err(e) = result {
            self.error = Some(e);
        }
    }

    fn finish(self) -> Result<(), FocusCliError> {
        match self.error {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }
}

// Error types

#[derive(Debug)]
enum FocusCliError {
    Io(io::Error),
    Focus(FocusError),
    Json(serde_json::Error),
    NoFrames,
    ValidationFailed(usize),
    DoctorFailed,
}

impl From<io::Error> for FocusCliError {
    fn from(e: io::Error) -> Self {
        FocusCliError::Io(e)
    }
}

impl From<FocusError> for FocusCliError {
    fn from(e: FocusError) -> Self {
        FocusCliError::Focus(e)
    }
}

impl From<serde_json::Error> for FocusCliError {
    fn from(e: serde_json::Error) -> Self {
        FocusCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<FocusCliError> for CliError {
    fn from(e: FocusCliError) -> Self {
        match e {
            FocusCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            FocusCliError::Focus(e) => focus_error(e),
            FocusCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            FocusCliError::NoFrames => CliError {
                code: "NO_FRAMES".to_string(),
                message: "No frames found in input".to_string(),
                hint: Some("Ensure input file is not empty".to_string()),
            },
            FocusCliError::ValidationFailed(count) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{} frames failed validation", count),
                hint: Some("Fix validation errors and retry".to_string()),
            },
            FocusCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
        }
    }
}

fn focus_error(e: FocusError) -> CliError {
    let (code, hint) = match &e {
        FocusError::ParseError(_) | FocusError::JsonError(_) => (
            "PARSE_ERROR",
            "Ensure input matches focus.landmark_frame.v1 schema",
        ),
        FocusError::InvalidFrame(_) => ("VALIDATION_ERROR", "Run 'focus validate' for details"),
        FocusError::TomlError(_) | FocusError::TomlSerializeError(_) | FocusError::ConfigError(_) => (
            "CONFIG_ERROR",
            "Run 'focus config' for a valid starting configuration",
        ),
        FocusError::SourceFailed(_) => ("SOURCE_FAILED", "Check the landmark stream producer"),
        FocusError::Io(_) => ("IO_ERROR", "Check file paths and permissions"),
    };
    CliError {
        code: code.to_string(),
        message: e.to_string(),
        hint: Some(hint.to_string()),
    }
}

// Report types

#[derive(serde::Serialize)]
struct ValidationReport {
    total_frames: usize,
    valid_frames: usize,
    invalid_frames: usize,
    errors: Vec<ValidationErrorDetail>,
}

#[derive(serde::Serialize)]
struct ValidationErrorDetail {
    index: usize,
    frame_id: Option<String>,
    error: String,
}

#[derive(serde::Serialize)]
struct DoctorReport {
    producer: String,
    version: String,
    checks: Vec<DoctorCheck>,
}

#[derive(serde::Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(serde::Serialize)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}
