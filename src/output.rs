// src/output.rs

use crate::device::Reading;
use clap::ValueEnum;
use serde::Serialize;
use std::fmt::Write;
use thinkgear_lib::Telemetry;
use thinkgear_lib::packet::Band;

/// How `monitor` prints each fresh packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Format {
    /// One human-readable line per packet
    #[default]
    Pretty,
    /// headset,quality,attention,meditation[,delta..mid_gamma]
    Csv,
    /// One JSON object per line
    Json,
}

#[derive(Serialize)]
struct Record<'a> {
    headset: &'a str,
    #[serde(flatten)]
    telemetry: &'a Telemetry,
}

pub fn format_reading(reading: &Reading, format: Format) -> serde_json::Result<String> {
    match format {
        Format::Pretty => Ok(pretty(reading)),
        Format::Csv => Ok(csv(reading)),
        Format::Json => serde_json::to_string(&Record {
            headset: &reading.headset,
            telemetry: &reading.telemetry,
        }),
    }
}

fn csv(reading: &Reading) -> String {
    let t = &reading.telemetry;
    let mut line = format!("{},{},{},{}", reading.headset, t.signal_quality, t.attention, t.meditation);
    // Power columns only appear for packets that carried them.
    if t.has_power {
        for value in t.eeg_power.as_array() {
            let _ = write!(line, ",{}", value);
        }
    }
    line
}

fn pretty(reading: &Reading) -> String {
    let t = &reading.telemetry;
    let mut line = format!(
        "[{}] Q:{:>3} (raw {:>3})  attn:{:>3}  med:{:>3}  avg:{:>5.1}",
        reading.headset, t.signal_quality, t.signal_quality_raw, t.attention, t.meditation, t.attention_average
    );
    if t.has_power {
        for band in Band::ALL {
            let _ = write!(line, "  {}:{}", band, t.eeg_power.get(band));
        }
    }
    line
}
