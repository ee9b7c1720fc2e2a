// src/error.rs

use thiserror::Error;

/// Errors raised while talking to a headset's byte source.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Serial port {0} not found. Is the headset receiver plugged in?")]
    PortNotFound(String),

    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
