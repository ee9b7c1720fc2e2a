// Protocol constants for the ThinkGear serial stream

/// Sync byte; two in a row open a frame
pub const SYNC: u8 = 0xAA;

/// Largest payload the framer will buffer (bytes)
pub const MAX_PAYLOAD_LEN: usize = 32;

/// Number of EEG power bands in an ASIC_EEG_POWER row
pub const EEG_POWER_BANDS: usize = 8;

/// Size of a single band value on the wire (24-bit big-endian)
pub const EEG_BAND_SIZE: usize = 3;

/// Operand size of the ASIC_EEG_POWER row, excluding its length byte
pub const EEG_POWER_SIZE: usize = EEG_POWER_BANDS * EEG_BAND_SIZE;

/// Operand size of the raw wave row, excluding its length byte
pub const RAW_WAVE_SIZE: usize = 2;

/// Signal quality reported before the first packet arrives
pub const SIGNAL_NOT_CONNECTED: u8 = 200;

/// Signal quality at or above which nobody is wearing the headset
pub const SIGNAL_NO_CONTACT: u8 = 55;

/// Samples kept by the attention rolling average unless configured otherwise
pub const DEFAULT_AVERAGING_LENGTH: usize = 5;

/// Logistic slope of the attention estimate
pub const ESTIMATE_SLOPE: f32 = 6.0;

/// Engagement index mapped to an attention of 50
pub const ESTIMATE_CENTER: f32 = 0.5;

/// Guard added to the engagement index denominator
pub const ESTIMATE_EPSILON: f32 = 1e-9;
