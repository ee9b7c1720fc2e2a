//! Payload decoding.
//!
//! A validated payload is a sequence of rows, each an opcode followed by an
//! operand whose shape is fixed per opcode. Rows are consumed strictly in
//! order; the first unknown opcode or short operand ends the decode.

use byteorder::{BigEndian, ByteOrder};
use bytes::Buf;
use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::Serialize;
use strum_macros::Display;

use crate::constants::{EEG_BAND_SIZE, EEG_POWER_BANDS, EEG_POWER_SIZE, RAW_WAVE_SIZE};
use crate::error::TGError;

/// How many operand bytes follow an opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandShape {
    /// Exactly this many bytes
    Fixed(usize),
    /// A length byte (not trusted, skipped) followed by this many bytes
    LengthPrefixed(usize),
}

impl OperandShape {
    /// Bytes consumed after the opcode, length byte included
    pub fn wire_len(&self) -> usize {
        match self {
            OperandShape::Fixed(n) => *n,
            OperandShape::LengthPrefixed(n) => n + 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive, Display)]
#[repr(u8)]
pub enum Opcode {
    PoorSignal = 0x02,
    Attention = 0x04,
    Meditation = 0x05,
    RawWave = 0x80,
    AsicEegPower = 0x83,
}

impl Opcode {
    pub fn shape(&self) -> OperandShape {
        match self {
            Opcode::PoorSignal | Opcode::Attention | Opcode::Meditation => OperandShape::Fixed(1),
            Opcode::RawWave => OperandShape::LengthPrefixed(RAW_WAVE_SIZE),
            Opcode::AsicEegPower => OperandShape::LengthPrefixed(EEG_POWER_SIZE),
        }
    }
}

/// EEG power bands, in wire order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum Band {
    #[strum(to_string = "Delta")]
    Delta = 0,
    #[strum(to_string = "Theta")]
    Theta = 1,
    #[strum(to_string = "Low Alpha")]
    LowAlpha = 2,
    #[strum(to_string = "High Alpha")]
    HighAlpha = 3,
    #[strum(to_string = "Low Beta")]
    LowBeta = 4,
    #[strum(to_string = "High Beta")]
    HighBeta = 5,
    #[strum(to_string = "Low Gamma")]
    LowGamma = 6,
    #[strum(to_string = "Mid Gamma")]
    MidGamma = 7,
}

impl Band {
    pub const ALL: [Band; EEG_POWER_BANDS] = [
        Band::Delta,
        Band::Theta,
        Band::LowAlpha,
        Band::HighAlpha,
        Band::LowBeta,
        Band::HighBeta,
        Band::LowGamma,
        Band::MidGamma,
    ];

    pub fn index(&self) -> usize {
        usize::from(u8::from(*self))
    }
}

/// Eight 24-bit band magnitudes from an ASIC_EEG_POWER row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct EegPower {
    bands: [u32; EEG_POWER_BANDS],
}

impl EegPower {
    pub fn new(bands: [u32; EEG_POWER_BANDS]) -> Self {
        Self { bands }
    }

    /// Decode eight big-endian 24-bit values
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TGError> {
        if bytes.len() < EEG_POWER_SIZE {
            return Err(TGError::Truncated {
                opcode: Opcode::AsicEegPower.into(),
                expected: EEG_POWER_SIZE,
                actual: bytes.len(),
            });
        }
        let mut bands = [0u32; EEG_POWER_BANDS];
        for (band, chunk) in bands.iter_mut().zip(bytes.chunks_exact(EEG_BAND_SIZE)) {
            *band = BigEndian::read_u24(chunk);
        }
        Ok(Self { bands })
    }

    pub fn get(&self, band: Band) -> u32 {
        self.bands[band.index()]
    }

    pub fn as_array(&self) -> &[u32; EEG_POWER_BANDS] {
        &self.bands
    }

    pub fn clear(&mut self) {
        self.bands = [0; EEG_POWER_BANDS];
    }

    pub fn is_zero(&self) -> bool {
        self.bands.iter().all(|b| *b == 0)
    }

    pub fn delta(&self) -> u32 {
        self.get(Band::Delta)
    }

    pub fn theta(&self) -> u32 {
        self.get(Band::Theta)
    }

    pub fn low_alpha(&self) -> u32 {
        self.get(Band::LowAlpha)
    }

    pub fn high_alpha(&self) -> u32 {
        self.get(Band::HighAlpha)
    }

    pub fn low_beta(&self) -> u32 {
        self.get(Band::LowBeta)
    }

    pub fn high_beta(&self) -> u32 {
        self.get(Band::HighBeta)
    }

    pub fn low_gamma(&self) -> u32 {
        self.get(Band::LowGamma)
    }

    pub fn mid_gamma(&self) -> u32 {
        self.get(Band::MidGamma)
    }
}

/// One decoded payload row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DataRow {
    PoorSignal(u8),
    Attention(u8),
    Meditation(u8),
    /// Raw ADC sample; decoded but not used for telemetry
    RawWave(i16),
    EegPower(EegPower),
}

impl DataRow {
    fn decode(opcode: Opcode, operand: &[u8]) -> Result<Self, TGError> {
        let row = match opcode {
            Opcode::PoorSignal => DataRow::PoorSignal(operand[0]),
            Opcode::Attention => DataRow::Attention(operand[0]),
            Opcode::Meditation => DataRow::Meditation(operand[0]),
            Opcode::RawWave => DataRow::RawWave(BigEndian::read_i16(operand)),
            Opcode::AsicEegPower => DataRow::EegPower(EegPower::from_bytes(operand)?),
        };
        Ok(row)
    }
}

/// Iterator over the rows of a payload.
///
/// Yields `Err` at most once; it is fused after the first error.
pub struct Rows<'a> {
    payload: &'a [u8],
    cursor: &'a [u8],
    failed: bool,
}

impl<'a> Rows<'a> {
    pub fn new(payload: &'a [u8]) -> Self {
        Self {
            payload,
            cursor: payload,
            failed: false,
        }
    }

    fn offset(&self) -> usize {
        self.payload.len() - self.cursor.remaining()
    }

    fn next_row(&mut self) -> Result<DataRow, TGError> {
        let offset = self.offset();
        let code = self.cursor.get_u8();
        let opcode = Opcode::try_from(code).map_err(|_| TGError::UnknownOpcode { opcode: code, offset })?;

        let shape = opcode.shape();
        if self.cursor.remaining() < shape.wire_len() {
            return Err(TGError::Truncated {
                opcode: code,
                expected: shape.wire_len(),
                actual: self.cursor.remaining(),
            });
        }
        if let OperandShape::LengthPrefixed(_) = shape {
            // The declared row length is fixed by the opcode; skip it.
            self.cursor.advance(1);
        }
        let len = match shape {
            OperandShape::Fixed(n) | OperandShape::LengthPrefixed(n) => n,
        };
        let (operand, rest) = self.cursor.split_at(len);
        self.cursor = rest;
        DataRow::decode(opcode, operand)
    }
}

impl Iterator for Rows<'_> {
    type Item = Result<DataRow, TGError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || !self.cursor.has_remaining() {
            return None;
        }
        let row = self.next_row();
        self.failed = row.is_err();
        Some(row)
    }
}

impl std::iter::FusedIterator for Rows<'_> {}

/// Decode every row of a payload, failing on the first bad one
pub fn parse_rows(payload: &[u8]) -> Result<Vec<DataRow>, TGError> {
    Rows::new(payload).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shapes() {
        assert_eq!(Opcode::PoorSignal.shape().wire_len(), 1);
        assert_eq!(Opcode::RawWave.shape().wire_len(), 3);
        assert_eq!(Opcode::AsicEegPower.shape().wire_len(), 25);
    }

    #[test]
    fn test_opcode_from_byte() {
        assert_eq!(Opcode::try_from(0x83u8).unwrap(), Opcode::AsicEegPower);
        assert!(Opcode::try_from(0x16u8).is_err());
    }

    #[test]
    fn test_single_byte_rows() {
        let rows = parse_rows(&[0x02, 0x64, 0x04, 0x32, 0x05, 0x11]).unwrap();
        assert_eq!(
            rows,
            vec![DataRow::PoorSignal(100), DataRow::Attention(50), DataRow::Meditation(17)]
        );
    }

    #[test]
    fn test_raw_wave_is_signed_big_endian() {
        let rows = parse_rows(&[0x80, 0x02, 0xFF, 0x38]).unwrap();
        assert_eq!(rows, vec![DataRow::RawWave(-200)]);
    }

    #[test]
    fn test_power_row() {
        let mut payload = vec![0x83, 0x18];
        for band in 0..8u32 {
            let v = (band + 1) * 0x010203;
            payload.extend_from_slice(&[(v >> 16) as u8, (v >> 8) as u8, v as u8]);
        }
        let rows = parse_rows(&payload).unwrap();
        let DataRow::EegPower(power) = rows[0] else {
            panic!("expected power row, got {:?}", rows[0]);
        };
        assert_eq!(power.delta(), 0x010203);
        assert_eq!(power.mid_gamma(), 8 * 0x010203);
        assert_eq!(power.get(Band::LowBeta), 5 * 0x010203);
    }

    #[test]
    fn test_power_length_byte_is_ignored() {
        let mut payload = vec![0x83, 0x00];
        payload.extend_from_slice(&[0xFF; 24]);
        let rows = parse_rows(&payload).unwrap();
        assert_eq!(rows, vec![DataRow::EegPower(EegPower::new([0xFF_FFFF; 8]))]);
    }

    #[test]
    fn test_unknown_opcode_reports_offset() {
        let mut rows = Rows::new(&[0x04, 0x20, 0x16, 0x01]);
        assert_eq!(rows.next(), Some(Ok(DataRow::Attention(0x20))));
        assert_eq!(
            rows.next(),
            Some(Err(TGError::UnknownOpcode { opcode: 0x16, offset: 2 }))
        );
        assert_eq!(rows.next(), None);
    }

    #[test]
    fn test_truncated_operand() {
        assert_eq!(
            parse_rows(&[0x02]),
            Err(TGError::Truncated {
                opcode: 0x02,
                expected: 1,
                actual: 0
            })
        );
        assert_eq!(
            parse_rows(&[0x83, 0x18, 0x00, 0x01]),
            Err(TGError::Truncated {
                opcode: 0x83,
                expected: 25,
                actual: 3
            })
        );
    }

    #[test]
    fn test_empty_payload_has_no_rows() {
        assert_eq!(parse_rows(&[]), Ok(vec![]));
    }

    #[test]
    fn test_band_names() {
        assert_eq!(Band::LowAlpha.to_string(), "Low Alpha");
        assert_eq!(Band::ALL.iter().map(Band::index).collect::<Vec<_>>(), (0..8).collect::<Vec<_>>());
    }
}
