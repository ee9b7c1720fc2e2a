use thiserror::Error;

use crate::constants::MAX_PAYLOAD_LEN;

/// The primary error type for the `thinkgear-lib` library.
///
/// None of these are fatal: the framer drops the offending packet and goes
/// back to hunting for the next sync pair.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TGError {
    #[error("Packet too long: declared {0} bytes, limit is {MAX_PAYLOAD_LEN}")]
    PacketTooLong(u8),

    #[error("Checksum mismatch: expected {expected:#04x}, got {actual:#04x}")]
    ChecksumMismatch { expected: u8, actual: u8 },

    #[error("Unknown opcode {opcode:#04x} at offset {offset}")]
    UnknownOpcode { opcode: u8, offset: usize },

    #[error("Truncated row {opcode:#04x}: expected {expected} operand bytes, got {actual}")]
    Truncated { opcode: u8, expected: usize, actual: usize },

    #[error("Payload of {0} bytes does not fit in a frame")]
    PayloadTooLarge(usize),
}

impl TGError {
    /// True for errors raised while framing, before any payload is decoded
    pub fn is_framing(&self) -> bool {
        matches!(
            self,
            TGError::PacketTooLong(_) | TGError::PayloadTooLarge(_) | TGError::ChecksumMismatch { .. }
        )
    }
}
