//! Wire-level parity check
//!
//! Runs the reference and candidate implementations and compares the frames
//! they log.
//!
//! Exit status: 0 when both directions match, 1 when frame sequences differ,
//! 2 when the comparison could not be made at all.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use parity_harness::parity_trace::{FrameSequence, TraceFormat};
use parity_harness::{AcceptPolicy, HarnessConfig, ParityHarness, ParityReport};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Debug, Parser)]
#[command(name = "wire-parity", version, about = "Compare wire frames of two implementations")]
struct Cli {
    /// YAML configuration file (defaults to $PARITY_CONFIG or the built-in profile)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Kill any invocation running longer than this many seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// How frames are encoded in the captured output
    #[arg(long, value_enum)]
    format: Option<FormatArg>,

    /// What makes a candidate's output acceptable during discovery
    #[arg(long, value_enum)]
    accept: Option<AcceptArg>,

    /// Reject candidates that exit with a non-zero status
    #[arg(long)]
    require_success: bool,

    /// Print every extracted frame for both sides
    #[arg(long)]
    show_frames: bool,

    /// Debug logging (RUST_LOG takes precedence)
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    Markers,
    Records,
}

impl From<FormatArg> for TraceFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Markers => TraceFormat::Markers,
            FormatArg::Records => TraceFormat::Records,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum AcceptArg {
    MarkerSubstring,
    ExtractedFrames,
}

impl From<AcceptArg> for AcceptPolicy {
    fn from(arg: AcceptArg) -> Self {
        match arg {
            AcceptArg::MarkerSubstring => AcceptPolicy::MarkerSubstring,
            AcceptArg::ExtractedFrames => AcceptPolicy::ExtractedFrames,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_tracing(cli.verbose) {
        eprintln!("failed to initialize logging: {e}");
        return ExitCode::from(2);
    }

    match run(&cli).await {
        Ok(report) if report.passed() => ExitCode::SUCCESS,
        Ok(_) => ExitCode::from(1),
        Err(e) => {
            error!("{:#}", e);
            ExitCode::from(2)
        }
    }
}

fn init_tracing(verbose: bool) -> Result<()> {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn load_config(cli: &Cli) -> Result<HarnessConfig> {
    let mut config = match &cli.config {
        Some(path) => HarnessConfig::load(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => HarnessConfig::from_env().context("loading configuration from environment")?,
    };

    if let Some(secs) = cli.timeout_secs {
        config.timeout_secs = Some(secs);
    }
    if let Some(format) = cli.format {
        config.format = format.into();
    }
    if let Some(accept) = cli.accept {
        config.discovery.accept = accept.into();
    }
    if cli.require_success {
        config.discovery.require_success = true;
    }

    config.validate()?;
    Ok(config)
}

async fn run(cli: &Cli) -> Result<ParityReport> {
    let config = load_config(cli)?;
    info!(
        "Comparing '{}' against {} candidate invocation(s)",
        config.reference.label(),
        config.candidates.len()
    );

    let report = ParityHarness::new(config).run().await?;

    if cli.show_frames {
        print_frames("Reference", &report.reference);
        print_frames("Candidate", &report.candidate);
    }
    report.print_summary();

    Ok(report)
}

fn print_frames(side: &str, frames: &FrameSequence) {
    println!("\n--- {} frames ({}) ---", side, frames.len());
    for frame in frames {
        println!("{}", frame);
    }
}
