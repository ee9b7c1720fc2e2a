use serde::Serialize;
use strum_macros::Display;
use tracing::{debug, trace, warn};

use crate::constants::{DEFAULT_AVERAGING_LENGTH, EEG_POWER_BANDS, SIGNAL_NO_CONTACT, SIGNAL_NOT_CONNECTED};
use crate::error::TGError;
use crate::estimator::{EstimatorParams, approximate_attention};
use crate::framer::PacketFramer;
use crate::packet::{DataRow, EegPower, Rows};
use crate::rolling::RollingAverage;

/// What happens to fields decoded before a payload turns out to be malformed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, Serialize)]
pub enum CommitPolicy {
    /// Apply each row as it is decoded; a bad row leaves earlier rows applied
    #[default]
    #[strum(to_string = "eager")]
    Eager,
    /// Apply a payload only once every row has decoded
    #[strum(to_string = "atomic")]
    Atomic,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeadsetConfig {
    /// Samples in the attention rolling average
    pub averaging_length: usize,
    pub estimator: EstimatorParams,
    pub commit_policy: CommitPolicy,
}

impl Default for HeadsetConfig {
    fn default() -> Self {
        Self {
            averaging_length: DEFAULT_AVERAGING_LENGTH,
            estimator: EstimatorParams::default(),
            commit_policy: CommitPolicy::default(),
        }
    }
}

impl HeadsetConfig {
    pub fn with_averaging_length(mut self, len: usize) -> Self {
        self.averaging_length = len;
        self
    }

    pub fn with_estimator(mut self, estimator: EstimatorParams) -> Self {
        self.estimator = estimator;
        self
    }

    pub fn with_commit_policy(mut self, policy: CommitPolicy) -> Self {
        self.commit_policy = policy;
        self
    }
}

/// Counters for everything the link has delivered so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct LinkStats {
    pub packets: u64,
    pub checksum_errors: u64,
    pub too_long: u64,
    pub parse_errors: u64,
}

impl LinkStats {
    fn record(&mut self, err: &TGError) {
        match err {
            TGError::ChecksumMismatch { .. } => self.checksum_errors += 1,
            TGError::PacketTooLong(_) | TGError::PayloadTooLarge(_) => self.too_long += 1,
            TGError::UnknownOpcode { .. } | TGError::Truncated { .. } => self.parse_errors += 1,
        }
    }

    pub fn errors(&self) -> u64 {
        self.checksum_errors + self.too_long + self.parse_errors
    }
}

/// Read-only snapshot of a headset's telemetry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Telemetry {
    pub signal_quality: u8,
    pub signal_quality_raw: u8,
    pub attention: u8,
    pub attention_raw: u8,
    pub meditation: u8,
    pub attention_average: f64,
    pub has_power: bool,
    pub eeg_power: EegPower,
    pub raw_value: Option<i16>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Readings {
    signal_quality: u8,
    signal_quality_raw: u8,
    attention: u8,
    attention_raw: u8,
    meditation: u8,
    eeg_power: EegPower,
    has_power: bool,
    raw_value: Option<i16>,
}

impl Default for Readings {
    fn default() -> Self {
        Self {
            signal_quality: SIGNAL_NOT_CONNECTED,
            signal_quality_raw: SIGNAL_NOT_CONNECTED,
            attention: 0,
            attention_raw: 0,
            meditation: 0,
            eeg_power: EegPower::default(),
            has_power: false,
            raw_value: None,
        }
    }
}

impl Readings {
    fn decode(&mut self, payload: &[u8], policy: CommitPolicy) -> Result<(), TGError> {
        match policy {
            CommitPolicy::Eager => self.apply_payload(payload),
            CommitPolicy::Atomic => {
                let mut staged = *self;
                staged.apply_payload(payload)?;
                *self = staged;
                Ok(())
            }
        }
    }

    fn apply_payload(&mut self, payload: &[u8]) -> Result<(), TGError> {
        // A payload without a power row must not report the previous one.
        self.eeg_power.clear();
        self.has_power = false;
        self.raw_value = None;

        for row in Rows::new(payload) {
            self.apply(row?);
        }
        Ok(())
    }

    fn apply(&mut self, row: DataRow) {
        match row {
            DataRow::PoorSignal(q) => self.signal_quality = q,
            DataRow::Attention(a) => {
                self.attention = a;
                self.attention_raw = a;
            }
            DataRow::Meditation(m) => self.meditation = m,
            DataRow::RawWave(v) => self.raw_value = Some(v),
            DataRow::EegPower(power) => {
                self.eeg_power = power;
                self.has_power = true;
            }
        }
    }
}

/// One physical headset: framer, decoded telemetry and attention smoothing.
///
/// Feed it the raw serial stream one byte at a time with [`Headset::update`].
/// Instances share nothing, so two headsets can be driven from two threads.
#[derive(Debug, Clone)]
pub struct Headset {
    name: String,
    config: HeadsetConfig,
    framer: PacketFramer,
    readings: Readings,
    rolling_attention: RollingAverage,
    stats: LinkStats,
}

impl Headset {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_config(name, HeadsetConfig::default())
    }

    pub fn with_config(name: impl Into<String>, config: HeadsetConfig) -> Self {
        Self {
            name: name.into(),
            framer: PacketFramer::new(),
            readings: Readings::default(),
            rolling_attention: RollingAverage::new(config.averaging_length),
            stats: LinkStats::default(),
            config,
        }
    }

    /// Feed one byte from the headset.
    ///
    /// Returns true exactly when this byte completed a frame that passed the
    /// checksum and decoded cleanly.
    pub fn update(&mut self, byte: u8) -> bool {
        let decoded = match self.framer.push(byte) {
            Ok(None) => return false,
            Ok(Some(payload)) => {
                trace!(headset = %self.name, len = payload.len(), "frame complete");
                self.readings.decode(payload, self.config.commit_policy)
            }
            Err(e) => Err(e),
        };

        match decoded {
            Ok(()) => {
                self.stats.packets += 1;
                self.estimate_attention();
                debug!(
                    headset = %self.name,
                    quality = self.readings.signal_quality_raw,
                    attention = self.readings.attention,
                    meditation = self.readings.meditation,
                    has_power = self.readings.has_power,
                    "packet"
                );
                true
            }
            Err(e) => {
                self.stats.record(&e);
                if e.is_framing() {
                    warn!(headset = %self.name, "Dropped frame: {}", e);
                } else {
                    warn!(headset = %self.name, "Could not parse payload: {}", e);
                }
                false
            }
        }
    }

    /// Feed a chunk of bytes, returning how many fresh packets it completed
    pub fn update_slice(&mut self, bytes: &[u8]) -> usize {
        bytes.iter().filter(|b| self.update(**b)).count()
    }

    fn estimate_attention(&mut self) {
        let r = &mut self.readings;
        r.signal_quality_raw = r.signal_quality;

        if r.signal_quality > 0 && r.signal_quality < SIGNAL_NO_CONTACT {
            r.attention = approximate_attention(&r.eeg_power, r.signal_quality, &self.config.estimator);
            debug!(
                headset = %self.name,
                quality = r.signal_quality,
                attention = r.attention,
                "estimated attention"
            );
            self.rolling_attention.add(r.attention);
            // The estimate stands in for the headset's own value this frame.
            r.signal_quality = 0;
        }
        if r.signal_quality >= SIGNAL_NO_CONTACT {
            r.attention = 0;
            self.rolling_attention.clear();
        }
    }

    /// Forget the partial frame, readings and attention history.
    pub fn reset(&mut self) {
        self.framer.reset();
        self.readings = Readings::default();
        self.rolling_attention.clear();
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &HeadsetConfig {
        &self.config
    }

    /// Signal quality after estimation (0 when the estimate was used)
    pub fn signal_quality(&self) -> u8 {
        self.readings.signal_quality
    }

    /// Signal quality as the headset reported it
    pub fn signal_quality_raw(&self) -> u8 {
        self.readings.signal_quality_raw
    }

    /// Attention after estimation and the contact gate
    pub fn attention(&self) -> u8 {
        self.readings.attention
    }

    /// Attention as the headset last reported it, before estimation
    pub fn attention_raw(&self) -> u8 {
        self.readings.attention_raw
    }

    pub fn meditation(&self) -> u8 {
        self.readings.meditation
    }

    pub fn attention_average(&self) -> f64 {
        self.rolling_attention.average()
    }

    pub fn attention_average_rounded(&self) -> u8 {
        self.rolling_attention.rounded()
    }

    pub fn rolling_attention(&self) -> &RollingAverage {
        &self.rolling_attention
    }

    pub fn has_power(&self) -> bool {
        self.readings.has_power
    }

    pub fn eeg_power(&self) -> &EegPower {
        &self.readings.eeg_power
    }

    pub fn power_array(&self) -> &[u32; EEG_POWER_BANDS] {
        self.readings.eeg_power.as_array()
    }

    pub fn raw_value(&self) -> Option<i16> {
        self.readings.raw_value
    }

    pub fn delta(&self) -> u32 {
        self.readings.eeg_power.delta()
    }

    pub fn theta(&self) -> u32 {
        self.readings.eeg_power.theta()
    }

    pub fn low_alpha(&self) -> u32 {
        self.readings.eeg_power.low_alpha()
    }

    pub fn high_alpha(&self) -> u32 {
        self.readings.eeg_power.high_alpha()
    }

    pub fn low_beta(&self) -> u32 {
        self.readings.eeg_power.low_beta()
    }

    pub fn high_beta(&self) -> u32 {
        self.readings.eeg_power.high_beta()
    }

    pub fn low_gamma(&self) -> u32 {
        self.readings.eeg_power.low_gamma()
    }

    pub fn mid_gamma(&self) -> u32 {
        self.readings.eeg_power.mid_gamma()
    }

    /// True while someone is wearing the headset
    pub fn is_connected(&self) -> bool {
        self.readings.signal_quality < SIGNAL_NO_CONTACT
    }

    pub fn stats(&self) -> &LinkStats {
        &self.stats
    }

    pub fn telemetry(&self) -> Telemetry {
        let r = &self.readings;
        Telemetry {
            signal_quality: r.signal_quality,
            signal_quality_raw: r.signal_quality_raw,
            attention: r.attention,
            attention_raw: r.attention_raw,
            meditation: r.meditation,
            attention_average: self.rolling_attention.average(),
            has_power: r.has_power,
            eeg_power: r.eeg_power,
            raw_value: r.raw_value,
        }
    }
}
