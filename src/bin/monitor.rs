use anyhow::{Context, Result, bail};
use clap::Parser;
use clap_verbosity_flag::{InfoLevel, Verbosity};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;
use tokio::{signal, task};
use tracing::{error, info, warn};

use thinkgear_lib::{CommitPolicy, Headset, HeadsetConfig};
use thinkgear_rs::device::{ByteSource, DEFAULT_BAUD, list_ports, pump};
use thinkgear_rs::logging::setup_logging;
use thinkgear_rs::output::{Format, format_reading};

/// Decode telemetry from one or more ThinkGear EEG headsets.
///
/// Each source gets its own headset, named A, B, ... in the order given
/// (serial ports first, then capture files).
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Serial ports the headsets are wired to (e.g. /dev/ttyUSB0).
    #[arg(value_name = "PORT")]
    ports: Vec<String>,
    /// Raw capture files to replay instead of (or alongside) serial ports.
    #[arg(short, long, value_name = "FILE")]
    file: Vec<PathBuf>,
    /// Serial baud rate.
    #[arg(short, long, default_value_t = DEFAULT_BAUD)]
    baud: u32,
    /// Samples in the attention rolling average.
    #[arg(short = 'n', long, default_value_t = 5)]
    averaging_length: usize,
    /// Only apply a payload once every row in it has decoded.
    #[arg(long)]
    atomic: bool,
    /// Output format for each fresh packet.
    #[arg(long, value_enum, default_value_t = Format::Pretty)]
    format: Format,
    /// Optional path to a file to write logs to, in addition to the console.
    #[arg(short, long)]
    log_file: Option<PathBuf>,
    #[command(flatten)]
    verbose: Verbosity<InfoLevel>,
}

fn headset_name(index: usize) -> String {
    match u8::try_from(index).ok().filter(|i| *i < 26) {
        Some(i) => char::from(b'A' + i).to_string(),
        None => format!("H{}", index),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _guard = setup_logging(cli.log_file.clone(), &cli.verbose)?;

    if let Err(e) = run(cli).await {
        error!("Monitor failed: {:?}", e);
        process::exit(1);
    }
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    let sources: Vec<ByteSource> = cli
        .ports
        .iter()
        .map(|path| ByteSource::Serial {
            path: path.clone(),
            baud: cli.baud,
        })
        .chain(cli.file.iter().cloned().map(ByteSource::File))
        .collect();
    if sources.is_empty() {
        bail!(
            "No sources given. Pass a serial port or --file <capture>. Available ports: {:?}",
            list_ports()
        );
    }

    let policy = if cli.atomic {
        CommitPolicy::Atomic
    } else {
        CommitPolicy::Eager
    };
    let config = HeadsetConfig::default()
        .with_averaging_length(cli.averaging_length)
        .with_commit_policy(policy);
    info!(sources = sources.len(), averaging = cli.averaging_length, %policy, "Starting monitor");

    let stop = Arc::new(AtomicBool::new(false));
    let (tx, mut rx) = mpsc::channel(64);
    let mut workers = Vec::with_capacity(sources.len());
    for (i, source) in sources.into_iter().enumerate() {
        let headset = Headset::with_config(headset_name(i), config);
        let tx = tx.clone();
        let stop = stop.clone();
        workers.push(task::spawn_blocking(move || pump(source, headset, tx, stop)));
    }
    // Readers hold the only senders; the channel closes once they all finish.
    drop(tx);

    loop {
        tokio::select! {
            reading = rx.recv() => {
                let Some(reading) = reading else { break };
                println!("{}", format_reading(&reading, cli.format)?);
            }
            _ = signal::ctrl_c() => {
                info!("Ctrl+C received, shutting down gracefully.");
                stop.store(true, Ordering::Relaxed);
                break;
            }
        }
    }
    // Unblock any reader waiting on a full channel.
    rx.close();

    for worker in workers {
        match worker.await.context("Reader task panicked")? {
            Ok(headset) => {
                let stats = headset.stats();
                info!(
                    headset = headset.name(),
                    packets = stats.packets,
                    checksum_errors = stats.checksum_errors,
                    too_long = stats.too_long,
                    parse_errors = stats.parse_errors,
                    "Link summary"
                );
            }
            Err(e) => warn!("Reader failed: {}", e),
        }
    }
    Ok(())
}
