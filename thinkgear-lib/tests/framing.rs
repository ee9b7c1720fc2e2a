//! Tests for frame synchronization, length limits and checksum rejection

mod common;

use common::*;

#[test]
fn test_reference_frame_completes_on_last_byte() {
    init_tracing();
    let mut headset = Headset::new("A");
    let flags = feed_all(&mut headset, &hex_to_bytes(REFERENCE_FRAME));
    assert_eq!(flags.iter().filter(|f| **f).count(), 1);
    assert_eq!(flags.last(), Some(&true));
}

#[test]
fn test_every_payload_length_frames_once() {
    for len in 0..=32usize {
        let payload: Vec<u8> = (0..len).map(|i| (i as u8).wrapping_mul(37)).collect();
        let frame = encode_frame(&payload).unwrap();
        assert_eq!(frame.len(), len + 4);

        let mut framer = PacketFramer::new();
        let mut completed = Vec::new();
        for (i, byte) in frame.iter().enumerate() {
            if let Some(p) = framer.push(*byte).unwrap() {
                completed.push((i, p.to_vec()));
            }
        }
        assert_eq!(completed, vec![(frame.len() - 1, payload)], "payload length {}", len);
    }
}

#[test]
fn test_single_byte_flip_is_rejected() {
    init_tracing();
    let payload = hex_to_bytes(FULL_PAYLOAD);
    let frame = encode_frame(&payload).unwrap();

    for pos in 3..frame.len() - 1 {
        for bit in 0..8 {
            let mut corrupt = frame.to_vec();
            corrupt[pos] ^= 1 << bit;

            let mut headset = Headset::new("A");
            let flags = feed_all(&mut headset, &corrupt);
            assert!(flags.iter().all(|f| !f), "flip at {} bit {} was accepted", pos, bit);
            assert_eq!(headset.signal_quality(), 200);
            assert_eq!(headset.meditation(), 0);
            assert!(!headset.has_power());
            assert_eq!(headset.stats().checksum_errors, 1);
        }
    }
}

#[test]
fn test_too_long_recovers_on_next_sync() {
    init_tracing();
    let mut stream = vec![0xAA, 0xAA, 0x40];
    // leftovers of the oversized frame, none of them a sync pair
    stream.extend_from_slice(&[0x02, 0x00, 0x04, 0x10, 0x55]);
    stream.extend_from_slice(&encode_frame(&[0x02, 0x00, 0x04, 0x2A]).unwrap());

    let mut headset = Headset::new("A");
    let flags = feed_all(&mut headset, &stream);
    assert_eq!(flags.iter().filter(|f| **f).count(), 1);
    assert_eq!(flags.last(), Some(&true));
    assert_eq!(headset.attention(), 42);
    assert_eq!(headset.stats().too_long, 1);
}

#[test]
fn test_too_long_stores_nothing() {
    let mut framer = PacketFramer::new();
    framer.push(0xAA).unwrap();
    framer.push(0xAA).unwrap();
    assert_eq!(framer.push(0xFF), Err(TGError::PacketTooLong(0xFF)));
    // would-be payload bytes are ignored while scanning
    for b in 0..32u8 {
        assert_eq!(framer.push(b), Ok(None));
    }
}

#[test]
fn test_garbage_before_sync_is_skipped() {
    let mut stream = hex_to_bytes("00ff12aa34aa");
    stream.extend_from_slice(&hex_to_bytes(REFERENCE_FRAME));
    let mut headset = Headset::new("A");
    assert_eq!(headset.update_slice(&stream), 1);
    assert_eq!(headset.signal_quality_raw(), 100);
}

#[test]
fn test_back_to_back_frames() {
    let mut stream = Vec::new();
    for attention in [10u8, 20, 30] {
        stream.extend_from_slice(&encode_frame(&[0x02, 0x00, 0x04, attention]).unwrap());
    }
    let mut headset = Headset::new("A");
    let flags = feed_all(&mut headset, &stream);
    let positions: Vec<usize> = flags.iter().enumerate().filter(|(_, f)| **f).map(|(i, _)| i).collect();
    assert_eq!(positions, vec![7, 15, 23]);
    assert_eq!(headset.attention(), 30);
    assert_eq!(headset.stats().packets, 3);
}

#[test]
fn test_truncated_frame_then_valid_frame() {
    // A frame cut short mid-payload swallows bytes of the next one; the stream
    // heals once a sync pair appears while scanning.
    let mut stream = vec![0xAA, 0xAA, 0x04, 0x02, 0x00];
    let good = encode_frame(&[0x05, 0x33]).unwrap();
    stream.extend_from_slice(&good);
    stream.extend_from_slice(&good);

    let mut headset = Headset::new("A");
    let fresh = headset.update_slice(&stream);
    assert_eq!(fresh, 1);
    assert_eq!(headset.meditation(), 0x33);
    assert_eq!(headset.stats().checksum_errors, 1);
}
