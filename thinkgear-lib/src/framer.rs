//! Byte-at-a-time framing of the ThinkGear serial stream.
//!
//! A frame on the wire looks like
//!
//! ```text
//! 0xAA 0xAA <len:1> <payload:len> <checksum:1>
//! ```
//!
//! where `checksum = 255 - (sum(payload) mod 256)`. [`PacketFramer`] hunts for
//! the sync pair, buffers up to [`MAX_PAYLOAD_LEN`] payload bytes and hands the
//! payload out once the trailing checksum matches.

use bytes::{BufMut, Bytes, BytesMut};
use strum_macros::Display;
use tracing::trace;

use crate::constants::{MAX_PAYLOAD_LEN, SYNC};
use crate::error::TGError;

/// Where the framer is inside the current frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display)]
pub enum FramerState {
    /// Looking for two consecutive sync bytes
    #[default]
    Scanning,
    /// Sync seen, next byte is the payload length
    ReadLength,
    /// Storing payload bytes
    ReadPayload,
    /// All payload bytes stored, next byte is the checksum
    ReadChecksum,
}

/// Fixed-capacity payload storage with its checksum accumulator.
#[derive(Debug, Clone)]
pub struct PacketBuffer {
    data: [u8; MAX_PAYLOAD_LEN],
    filled: usize,
    declared: usize,
    accumulator: u8,
}

impl PacketBuffer {
    fn new() -> Self {
        Self {
            data: [0; MAX_PAYLOAD_LEN],
            filled: 0,
            declared: 0,
            accumulator: 0,
        }
    }

    fn rewind(&mut self) {
        self.filled = 0;
        self.accumulator = 0;
    }

    fn declare(&mut self, len: u8) -> Result<(), TGError> {
        if usize::from(len) > MAX_PAYLOAD_LEN {
            return Err(TGError::PacketTooLong(len));
        }
        self.declared = usize::from(len);
        Ok(())
    }

    fn store(&mut self, byte: u8) {
        // The framer leaves ReadPayload as soon as `filled == declared`.
        debug_assert!(self.filled < self.declared);
        self.data[self.filled] = byte;
        self.filled += 1;
        self.accumulator = self.accumulator.wrapping_add(byte);
    }

    fn is_complete(&self) -> bool {
        self.filled == self.declared
    }

    /// Checksum the trailing byte must carry for the bytes stored so far
    fn expected_checksum(&self) -> u8 {
        255 - self.accumulator
    }

    fn payload(&self) -> &[u8] {
        &self.data[..self.declared]
    }
}

/// Checksum of a payload: one's complement of the byte sum.
pub fn checksum(payload: &[u8]) -> u8 {
    255 - payload.iter().fold(0u8, |acc, b| acc.wrapping_add(*b))
}

/// Sync-hunting frame assembler.
#[derive(Debug, Clone)]
pub struct PacketFramer {
    state: FramerState,
    buffer: PacketBuffer,
    last_byte: u8,
}

enum Step {
    Pending,
    Complete,
    Failed(TGError),
}

impl PacketFramer {
    pub fn new() -> Self {
        Self {
            state: FramerState::Scanning,
            buffer: PacketBuffer::new(),
            last_byte: 0,
        }
    }

    pub fn state(&self) -> FramerState {
        self.state
    }

    /// Drop any partial frame and go back to hunting for sync.
    pub fn reset(&mut self) {
        self.state = FramerState::Scanning;
        self.buffer.rewind();
        self.last_byte = 0;
    }

    /// Feed a single byte.
    ///
    /// Returns `Ok(Some(payload))` on the checksum byte of a valid frame,
    /// `Err` when the current frame is abandoned, and `Ok(None)` otherwise.
    /// The returned slice stays valid until the next call.
    pub fn push(&mut self, byte: u8) -> Result<Option<&[u8]>, TGError> {
        let step = match self.state {
            FramerState::Scanning => Step::Pending,
            FramerState::ReadLength => match self.buffer.declare(byte) {
                Ok(()) if byte == 0 => {
                    self.state = FramerState::ReadChecksum;
                    Step::Pending
                }
                Ok(()) => {
                    self.state = FramerState::ReadPayload;
                    Step::Pending
                }
                Err(e) => {
                    self.state = FramerState::Scanning;
                    Step::Failed(e)
                }
            },
            FramerState::ReadPayload => {
                self.buffer.store(byte);
                if self.buffer.is_complete() {
                    self.state = FramerState::ReadChecksum;
                }
                Step::Pending
            }
            FramerState::ReadChecksum => {
                self.state = FramerState::Scanning;
                let expected = self.buffer.expected_checksum();
                if byte == expected {
                    Step::Complete
                } else {
                    Step::Failed(TGError::ChecksumMismatch {
                        expected,
                        actual: byte,
                    })
                }
            }
        };

        // A byte that ends or aborts a frame can still complete the next sync pair.
        if self.state == FramerState::Scanning && byte == SYNC && self.last_byte == SYNC {
            trace!("sync pair found");
            self.state = FramerState::ReadLength;
            self.buffer.rewind();
        }
        self.last_byte = byte;

        match step {
            Step::Pending => Ok(None),
            Step::Complete => Ok(Some(self.buffer.payload())),
            Step::Failed(e) => Err(e),
        }
    }
}

impl Default for PacketFramer {
    fn default() -> Self {
        Self::new()
    }
}

/// Wrap a payload in sync bytes, length and checksum.
pub fn encode_frame(payload: &[u8]) -> Result<Bytes, TGError> {
    if payload.len() > MAX_PAYLOAD_LEN {
        return Err(TGError::PayloadTooLarge(payload.len()));
    }
    let mut frame = BytesMut::with_capacity(payload.len() + 4);
    frame.put_u8(SYNC);
    frame.put_u8(SYNC);
    frame.put_u8(payload.len() as u8);
    frame.put_slice(payload);
    frame.put_u8(checksum(payload));
    Ok(frame.freeze())
}
