//! foresight-replay - Predictive Prefetch Scenario Replay
//!
//! Entry point for the replay binary.

use anyhow::{Context, Result};
use clap::Parser;
use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use foresight::config::{Config, TriggerMode};
use foresight::replay::{replay, ReplayReport, Scenario};

/// Command-line arguments for foresight-replay
#[derive(Parser, Debug)]
#[command(name = "foresight-replay")]
#[command(version, about = "Replay a pointer trace through the foresight prefetch engine", long_about = None)]
struct Args {
    /// Configuration file path (defaults are used when omitted)
    #[arg(short, long, env = "FORESIGHT_CONFIG")]
    config: Option<PathBuf>,

    /// Scenario file (JSON targets and pointer samples)
    #[arg(short, long)]
    scenario: PathBuf,

    /// Trigger radius override
    #[arg(short, long)]
    radius: Option<f64>,

    /// Debounce interval override (ms)
    #[arg(long)]
    debounce_ms: Option<u64>,

    /// Trigger mode override (single|multiple)
    #[arg(short, long)]
    mode: Option<TriggerMode>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Verbose logging (can be specified multiple times)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Log format (json|pretty|compact)
    #[arg(long, default_value = "pretty")]
    log_format: String,

    /// Write logs to file (in addition to stderr)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args)?;

    info!("foresight-replay v{}", env!("CARGO_PKG_VERSION"));

    match run(&args).await {
        Ok(report) => {
            print_report(&report, args.json)?;
            Ok(())
        }
        Err(e) => {
            eprintln!("{}", foresight::utils::format_user_error(&e));
            Err(e)
        }
    }
}

async fn run(args: &Args) -> Result<ReplayReport> {
    let config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default_config(),
    };

    let mut config = config.with_overrides(args.radius, args.debounce_ms);
    if let Some(mode) = args.mode {
        config.foresight.mode = mode;
    }
    config.validate()?;

    info!(
        "Configuration: radius={}, debounce={}ms, mode={}, geometry={}",
        config.foresight.radius,
        config.foresight.debounce_ms,
        config.foresight.mode,
        config.foresight.geometry
    );
    tracing::debug!("Config: {:?}", config);

    let scenario = Scenario::load(&args.scenario)?;
    let report = replay(&config.foresight, &scenario)
        .await
        .context("Replay failed")?;

    info!(
        "Replay finished: {} emission(s), {} prefetch(es) started",
        report.emissions.len(),
        report.fetched.len()
    );
    Ok(report)
}

fn print_report(report: &ReplayReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    println!("Emissions:");
    for (i, keys) in report.emissions.iter().enumerate() {
        println!("  #{:<3} [{}]", i + 1, keys.join(", "));
    }

    println!();
    println!("Prefetched: [{}]", report.fetched.join(", "));

    println!();
    println!("Slots:");
    for slot in &report.slots {
        println!(
            "  {:<24} {:<8} {}",
            slot.key,
            slot.state.to_string(),
            slot.value.as_deref().unwrap_or("-")
        );
    }

    let stats = &report.stats;
    println!();
    println!(
        "Stats: {} pointer update(s), {} emission(s), {} triggered, {} completed, {} failed",
        stats.pointer_updates, stats.emissions, stats.triggered, stats.completed, stats.failed
    );
    Ok(())
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// One fmt layer in the requested format ("json", "compact", else pretty)
fn fmt_layer<W>(format: &str, writer: W, ansi: bool) -> BoxedLayer
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(ansi);

    match format {
        "json" => layer.json().boxed(),
        "compact" => layer.compact().boxed(),
        _ => layer.pretty().boxed(),
    }
}

fn init_logging(args: &Args) -> Result<()> {
    let log_level = match args.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "foresight={level},foresight_replay={level},warn",
            level = log_level
        ))
    });

    // stderr always, plus an un-coloured copy in the log file if requested
    let mut layers = vec![fmt_layer(&args.log_format, std::io::stderr, true)];
    if let Some(log_file_path) = &args.log_file {
        let file = File::create(log_file_path)
            .context(format!("Failed to create log file: {}", log_file_path.display()))?;
        layers.push(fmt_layer(&args.log_format, Arc::new(file), false));
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(env_filter)
        .init();

    if let Some(log_file_path) = &args.log_file {
        info!("Logging to file: {}", log_file_path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_parse() {
        let args = Args::try_parse_from([
            "foresight-replay",
            "-s",
            "trace.json",
            "-vv",
            "--log-format",
            "json",
            "--mode",
            "single",
        ])
        .unwrap();

        assert_eq!(args.scenario, PathBuf::from("trace.json"));
        assert_eq!(args.verbose, 2);
        assert_eq!(args.log_format, "json");
        assert_eq!(args.mode, Some(TriggerMode::Single));
        assert!(args.log_file.is_none());
    }

    #[test]
    fn test_fmt_layer_every_format() {
        let dir = tempfile::tempdir().unwrap();
        let file = Arc::new(File::create(dir.path().join("replay.log")).unwrap());

        for format in ["json", "compact", "pretty", "unknown"] {
            let layers = vec![
                fmt_layer(format, std::io::stderr, true),
                fmt_layer(format, Arc::clone(&file), false),
            ];
            let subscriber = tracing_subscriber::registry().with(layers);
            tracing::subscriber::with_default(subscriber, || info!("format {}", format));
        }

        let written = std::fs::read_to_string(dir.path().join("replay.log")).unwrap();
        assert!(written.contains("format json"));
        assert!(written.contains("format unknown"));
    }
}
