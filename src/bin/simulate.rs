use anyhow::{Context, Result};
use bytes::{BufMut, Bytes, BytesMut};
use clap::Parser;
use clap_verbosity_flag::{InfoLevel, Verbosity};
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, info};

use thinkgear_lib::framer::encode_frame;
use thinkgear_rs::logging::setup_logging;

/// Generate a synthetic ThinkGear byte stream, e.g. to replay with `monitor --file`.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Number of packets to emit.
    #[arg(short, long, default_value_t = 60)]
    count: u32,
    /// Delay between packets in milliseconds (the headset sends one per second).
    #[arg(short, long, default_value_t = 0)]
    interval_ms: u64,
    /// Signal quality to report; 1..54 triggers the attention estimate.
    #[arg(long, default_value_t = 0)]
    quality: u8,
    /// Corrupt the checksum of every Nth packet (0 = never).
    #[arg(long, default_value_t = 0)]
    corrupt_every: u32,
    /// Write hex text instead of raw bytes.
    #[arg(long)]
    hex: bool,
    /// Output file; stdout when omitted.
    #[arg(short, long)]
    output: Option<PathBuf>,
    #[command(flatten)]
    verbose: Verbosity<InfoLevel>,
}

/// The 32-byte payload a MindFlex-style headset sends once a second.
fn synthetic_payload(tick: u32, quality: u8) -> Bytes {
    let phase = tick as f32 * 0.3;
    let swing = |base: f32, amp: f32, shift: f32| (base + amp * (phase + shift).sin()).max(0.0) as u32;
    let bands = [
        swing(600_000.0, 200_000.0, 0.0),
        swing(200_000.0, 80_000.0, 1.0),
        swing(15_000.0, 6_000.0, 2.0),
        swing(10_000.0, 4_000.0, 2.5),
        swing(8_000.0, 5_000.0, 3.0),
        swing(5_000.0, 3_000.0, 3.5),
        swing(2_000.0, 1_000.0, 4.0),
        swing(3_000.0, 1_500.0, 4.5),
    ];

    let mut payload = BytesMut::with_capacity(32);
    payload.put_u8(0x02);
    payload.put_u8(quality);
    payload.put_u8(0x83);
    payload.put_u8(0x18);
    for band in bands {
        payload.put_uint(u64::from(band.min(0xFF_FFFF)), 3);
    }
    payload.put_u8(0x04);
    payload.put_u8((50.0 + 40.0 * phase.sin()) as u8);
    payload.put_u8(0x05);
    payload.put_u8((50.0 + 40.0 * phase.cos()) as u8);
    payload.freeze()
}

async fn emit<W: AsyncWrite + Unpin>(out: &mut W, cli: &Cli) -> Result<()> {
    for tick in 0..cli.count {
        let mut frame = encode_frame(&synthetic_payload(tick, cli.quality))?.to_vec();
        if cli.corrupt_every != 0 && (tick + 1) % cli.corrupt_every == 0 {
            if let Some(last) = frame.last_mut() {
                *last = last.wrapping_add(1);
            }
            debug!(tick, "Corrupted checksum");
        }

        if cli.hex {
            out.write_all(format!("{}\n", hex::encode(&frame)).as_bytes()).await?;
        } else {
            out.write_all(&frame).await?;
        }
        out.flush().await?;

        if cli.interval_ms > 0 {
            tokio::time::sleep(Duration::from_millis(cli.interval_ms)).await;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _guard = setup_logging(None, &cli.verbose)?;

    match &cli.output {
        Some(path) => {
            let mut file = tokio::fs::File::create(path)
                .await
                .with_context(|| format!("Failed to create {:?}", path))?;
            emit(&mut file, &cli).await?;
            info!(packets = cli.count, "Wrote {:?}", path);
        }
        None => emit(&mut tokio::io::stdout(), &cli).await?,
    }
    Ok(())
}
