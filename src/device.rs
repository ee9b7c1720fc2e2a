// src/device.rs

use crate::error::Error;
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use thinkgear_lib::{Headset, Telemetry};
use tokio::sync::mpsc::Sender;
use tracing::{debug, info, warn};

/// Baud rate of the headset's serial link
pub const DEFAULT_BAUD: u32 = 9600;

const READ_TIMEOUT: Duration = Duration::from_millis(100);
const READ_CHUNK: usize = 64;

/// Where a headset's bytes come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ByteSource {
    /// A serial port, 8N1 at the given baud rate
    Serial { path: String, baud: u32 },
    /// A raw capture of the serial stream
    File(PathBuf),
}

impl std::fmt::Display for ByteSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ByteSource::Serial { path, baud } => write!(f, "{} @ {} baud", path, baud),
            ByteSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

impl ByteSource {
    pub fn open(&self) -> Result<Box<dyn Read + Send>, Error> {
        match self {
            ByteSource::Serial { path, baud } => {
                let port = serialport::new(path, *baud)
                    .data_bits(serialport::DataBits::Eight)
                    .parity(serialport::Parity::None)
                    .stop_bits(serialport::StopBits::One)
                    .timeout(READ_TIMEOUT)
                    .open()
                    .map_err(|e| match e.kind {
                        serialport::ErrorKind::NoDevice => Error::PortNotFound(path.clone()),
                        _ => Error::Serial(e),
                    })?;
                Ok(Box::new(port))
            }
            ByteSource::File(path) => Ok(Box::new(File::open(path)?)),
        }
    }

    fn is_stream(&self) -> bool {
        matches!(self, ByteSource::Serial { .. })
    }
}

/// Names of the serial ports currently present
pub fn list_ports() -> Vec<String> {
    serialport::available_ports()
        .map(|ports| ports.into_iter().map(|p| p.port_name).collect())
        .unwrap_or_default()
}

/// A fresh packet from one headset.
#[derive(Debug, Clone)]
pub struct Reading {
    pub headset: String,
    pub telemetry: Telemetry,
}

/// Pump bytes from `source` into `headset` until the source ends or `stop`
/// is raised, forwarding a [`Reading`] for every fresh packet.
///
/// Blocking; run it on its own thread. Returns the headset so the caller can
/// report its link statistics.
pub fn pump(
    source: ByteSource,
    mut headset: Headset,
    readings: Sender<Reading>,
    stop: Arc<AtomicBool>,
) -> Result<Headset, Error> {
    info!(headset = headset.name(), %source, "Opening source");
    let mut reader = source.open()?;
    let mut buf = [0u8; READ_CHUNK];

    while !stop.load(Ordering::Relaxed) {
        let n = match reader.read(&mut buf) {
            Ok(0) if source.is_stream() => continue,
            Ok(0) => {
                debug!(headset = headset.name(), "End of capture");
                break;
            }
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::TimedOut || e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };

        for byte in &buf[..n] {
            if !headset.update(*byte) {
                continue;
            }
            let reading = Reading {
                headset: headset.name().to_string(),
                telemetry: headset.telemetry(),
            };
            if readings.blocking_send(reading).is_err() {
                warn!(headset = headset.name(), "Receiver gone, stopping");
                return Ok(headset);
            }
        }
    }
    Ok(headset)
}
