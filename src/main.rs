use clap::Parser;
use gcpause::scan::scan_file;
use gcpause::status::StatusFile;
use gcpause::{Monitor, MonitorConfig};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

/// Tail a GC log and report recent stop-the-world pause time.
#[derive(Parser, Debug)]
#[command(name = "gcpause", version, about)]
pub struct Cli {
    /// Config file path
    #[arg(short, long, default_value = "gcpause.toml")]
    config: PathBuf,

    /// GC log to tail (overrides config)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Poll interval in milliseconds (overrides config)
    #[arg(long)]
    poll_interval_ms: Option<u64>,

    /// Seconds between status reports
    #[arg(long, default_value_t = 5)]
    report_secs: u64,

    /// Write each status report as JSON to this file
    #[arg(long)]
    status_file: Option<PathBuf>,

    /// Parse a complete log file, print its pauses, and exit
    #[arg(long, value_name = "FILE")]
    scan: Option<PathBuf>,

    /// Print the resolved config and exit
    #[arg(long)]
    dry_run: bool,

    /// Emit reports as JSON on stdout
    #[arg(long)]
    json: bool,

    /// Debug logging (poll failures, rotation)
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "gcpause=debug"
    } else {
        "gcpause=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .with_target(false)
        .init();

    tracing::debug!(?cli, "parsed CLI arguments");

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let mut config = MonitorConfig::load(&cli.config)?;
    if let Some(log_file) = cli.log_file {
        config.log_file = log_file;
    }
    if let Some(ms) = cli.poll_interval_ms {
        config.poll_interval_ms = ms;
    }

    if let Some(path) = cli.scan {
        let report = scan_file(&path)?;
        if cli.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            for event in &report.events {
                println!(
                    "{:>12.3}s  {:>10.3}ms",
                    event.time() as f64 / 1e9,
                    event.duration() as f64 / 1e6
                );
            }
            println!(
                "{} pauses in {} lines, {:.3}ms total",
                report.events.len(),
                report.lines,
                report.total_pause_ns as f64 / 1e6
            );
            if let Some(longest) = report.longest() {
                println!(
                    "longest {:.3}ms at {:.3}s",
                    longest.duration() as f64 / 1e6,
                    longest.time() as f64 / 1e9
                );
            }
        }
        return Ok(ExitCode::SUCCESS);
    }

    if cli.dry_run {
        println!("log_file = {}", config.log_file.display());
        println!("poll_interval_ms = {}", config.poll_interval_ms);
        println!("retention_window_secs = {}", config.retention_window_secs);
        match config.process_start_ns {
            Some(ns) => println!("process_start_ns = {ns}"),
            None => println!("process_start_ns = <process start>"),
        }
        return Ok(ExitCode::SUCCESS);
    }

    let monitor = Monitor::start(config)?;
    let status_file = cli.status_file.map(StatusFile::new);

    let mut ticker = tokio::time::interval(Duration::from_secs(cli.report_secs.max(1)));
    ticker.tick().await;

    let faulted = loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("interrupted, shutting down");
                break false;
            }
            _ = ticker.tick() => {
                let status = monitor.status();
                if cli.json {
                    println!("{}", serde_json::to_string(&status)?);
                } else {
                    tracing::info!("{status}");
                }
                if let Some(file) = &status_file {
                    if let Err(e) = file.write(&status) {
                        tracing::warn!(error = %e, "failed to write status file");
                    }
                }
                if status.is_faulted() {
                    break true;
                }
            }
        }
    };

    if faulted {
        return Ok(ExitCode::FAILURE);
    }
    if let Some(file) = &status_file {
        file.remove();
    }
    Ok(ExitCode::SUCCESS)
}
