//! Common test utilities and shared imports

// Allow unused imports and dead code since this is a shared module
// used across multiple test files - not all items are used in every test file
#[allow(unused_imports)]
pub use thinkgear_lib::error::TGError;
#[allow(unused_imports)]
pub use thinkgear_lib::framer::{PacketFramer, checksum, encode_frame};
#[allow(unused_imports)]
pub use thinkgear_lib::packet::{Band, DataRow, EegPower, parse_rows};
#[allow(unused_imports)]
pub use thinkgear_lib::{CommitPolicy, Headset, HeadsetConfig};

/// Route library logs through the test harness; later calls are no-ops
#[allow(dead_code)]
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Decode hex string to bytes for testing
#[allow(dead_code)]
pub fn hex_to_bytes(hex_data: &str) -> Vec<u8> {
    hex::decode(hex_data).expect("Failed to decode hex")
}

/// Reference frame: quality 100, attention 50
#[allow(dead_code)]
pub const REFERENCE_FRAME: &str = "aaaa040264043263";

/// Typical once-a-second MindFlex payload: quality, power block, attention, meditation
#[allow(dead_code)]
pub const FULL_PAYLOAD: &str = "021a83180b4e0a0326a8003a6b0027e90019fa0012480007c1000b820403053d";

/// Build an ASIC_EEG_POWER row from band values
#[allow(dead_code)]
pub fn power_row(bands: [u32; 8]) -> Vec<u8> {
    let mut row = vec![0x83, 0x18];
    for b in bands {
        row.extend_from_slice(&[(b >> 16) as u8, (b >> 8) as u8, b as u8]);
    }
    row
}

/// Feed a byte stream, collecting the per-byte "fresh packet" flags
#[allow(dead_code)]
pub fn feed_all(headset: &mut Headset, bytes: &[u8]) -> Vec<bool> {
    bytes.iter().map(|b| headset.update(*b)).collect()
}
