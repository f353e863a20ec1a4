// Linewatch CLI - Console driver for the Linewatch SPC engine
//
// Licensed under AGPL-3.0.
// See LICENSE file for details.

//! # Linewatch
//!
//! Console driver for the Linewatch statistical process control engine.
//!
//! ## Usage
//!
//! ```bash
//! # Interactive: one simulated hour per ENTER, 'q' to stop
//! linewatch
//!
//! # Simulate drift on a custom catalog for 24 hours
//! linewatch --config lines.json --sigma 0.2 --ticks 24
//!
//! # JSON lines plus CSV history and a metrics snapshot
//! linewatch --ticks 100 --format json --history-csv history.csv --metrics-out run.prom
//! ```

mod error;
mod metrics;
mod output;
mod signal;

use chrono::Local;
use clap::Parser;
use error::Result;
use linewatch::{ControlSignal, Monitor, RunSummary, SpcConfig, TickBudget};
use metrics::{encode_metrics, MetricsRecorder};
use output::{write_history_csv, ConsoleReporter, Fanout, OutputFormat};
use signal::PromptSignal;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

/// Statistical process control monitor for simulated production lines
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON configuration file (default catalog if absent)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Live variability (0.03 in control, 0.10 medium, 0.20 high, 0.30 very high)
    #[arg(short, long)]
    sigma: Option<f64>,

    /// RNG seed for a reproducible run
    #[arg(long)]
    seed: Option<u64>,

    /// Warm-up ticks used to freeze the control limits
    #[arg(long)]
    warmup: Option<usize>,

    /// Run this many hours without prompting
    #[arg(short, long)]
    ticks: Option<u64>,

    /// Per-tick output format
    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Write the rate history with control limits to this CSV file on exit
    #[arg(long)]
    history_csv: Option<PathBuf>,

    /// Write a Prometheus text-format snapshot to this file on exit
    #[arg(long)]
    metrics_out: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> ExitCode {
    let args = Args::parse();

    init_tracing(&args.log_level);

    match run(&args) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Install the stderr subscriber; `RUST_LOG` wins over `--log-level`.
fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = match log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        };
        EnvFilter::from_default_env().add_directive(level.into())
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Load the configuration file (or defaults) and apply command line overrides.
fn build_config(args: &Args) -> Result<SpcConfig> {
    let mut config = match &args.config {
        Some(path) => {
            info!("Loading configuration from {}", path.display());
            SpcConfig::from_file(path)?
        }
        None => SpcConfig::default(),
    };

    if let Some(sigma) = args.sigma {
        config = config.with_live_sigma(sigma);
    }
    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }
    if let Some(warmup) = args.warmup {
        config = config.with_warmup_ticks(warmup);
    }

    config.validate()?;
    Ok(config)
}

fn run(args: &Args) -> Result<RunSummary> {
    let started = Local::now();
    let config = build_config(args)?;

    info!(
        "Linewatch v{}: {} lines, live sigma {}, warm-up {} ticks",
        linewatch::VERSION,
        config.lines.len(),
        config.monitor.sigma,
        config.baseline.warmup_ticks
    );

    if args.format == OutputFormat::Text {
        println!(
            "Linewatch v{} - run started {}",
            linewatch::VERSION,
            started.format("%Y-%m-%d %H:%M:%S")
        );
    }

    let mut monitor = Monitor::from_config(&config)?;

    let summary = match args.ticks {
        Some(ticks) => drive(&mut monitor, TickBudget(ticks), args.format)?,
        None => {
            // Keep stdout clean for JSON lines.
            let prompt_out: Box<dyn Write> = match args.format {
                OutputFormat::Text => Box::new(io::stdout()),
                OutputFormat::Json => Box::new(io::stderr()),
            };
            let signal = PromptSignal::new(io::stdin().lock(), prompt_out);
            drive(&mut monitor, signal, args.format)?
        }
    };

    if let Some(path) = &args.history_csv {
        let rows = write_history_csv(path, monitor.lines())?;
        info!("Wrote {} history rows to {}", rows, path.display());
    }

    if let Some(path) = &args.metrics_out {
        std::fs::write(path, encode_metrics()?)?;
        info!("Wrote metrics snapshot to {}", path.display());
    }

    Ok(summary)
}

/// Run the monitor to completion, rendering to stdout and recording metrics.
fn drive<S: ControlSignal>(
    monitor: &mut Monitor,
    signal: S,
    format: OutputFormat,
) -> Result<RunSummary> {
    let mut observer = Fanout(ConsoleReporter::new(io::stdout(), format), MetricsRecorder);
    let summary = monitor.run(signal, &mut observer)?;

    let Fanout(mut console, _) = observer;
    console.summary(&summary, Local::now());
    console.finish()?;

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_defaults() {
        let args = Args::parse_from(["linewatch"]);
        assert!(args.config.is_none());
        assert!(args.ticks.is_none());
        assert_eq!(args.format, OutputFormat::Text);
        assert_eq!(args.log_level, "info");
    }

    #[test]
    fn test_overrides_applied() {
        let args = Args::parse_from([
            "linewatch", "-s", "0.2", "--seed", "7", "--warmup", "20", "-t", "5", "--format",
            "json",
        ]);
        let config = build_config(&args).unwrap();
        assert_eq!(config.monitor.sigma, 0.2);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.baseline.warmup_ticks, 20);
        assert_eq!(args.ticks, Some(5));
        assert_eq!(args.format, OutputFormat::Json);
    }

    #[test]
    fn test_invalid_override_rejected() {
        let args = Args::try_parse_from(["linewatch", "--sigma=-1"]).unwrap();
        assert!(build_config(&args).is_err());

        assert!(Args::try_parse_from(["linewatch", "--format", "xml"]).is_err());
    }

    #[test]
    fn test_config_file_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lines.json");
        std::fs::write(
            &path,
            r#"{"lines":[{"name":"Toothpaste","monthly_production":400000,"monthly_defects":3000}]}"#,
        )
        .unwrap();

        let args = Args::parse_from(["linewatch", "--config", path.to_str().unwrap()]);
        let config = build_config(&args).unwrap();
        assert_eq!(config.lines.len(), 1);
        assert_eq!(config.lines[0].name, "Toothpaste");
    }
}
