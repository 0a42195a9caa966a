//! Property tests for the ReadRandom codec

use proptest::prelude::*;
use std::collections::HashSet;
use voltage_slmp::codec::{bytes_to_hex, hex_to_bytes};
use voltage_slmp::{
    BitExpansionUtility, DeviceCode, DeviceSpecification, DwordDevice, FrameBuilder, FrameKind,
    FrameVersion, PseudoDwordSplitter, ResponseParser, SequenceNumberManager,
};

fn word_device() -> impl Strategy<Value = DeviceSpecification> {
    (
        prop_oneof![
            Just(DeviceCode::D),
            Just(DeviceCode::W),
            Just(DeviceCode::R),
            Just(DeviceCode::M),
            Just(DeviceCode::X),
            Just(DeviceCode::TN),
        ],
        0u32..=0xFFFF,
    )
        .prop_map(|(code, address)| DeviceSpecification::new(code, address))
}

fn frame_kind() -> impl Strategy<Value = FrameKind> {
    prop_oneof![
        Just(FrameKind::ThreeEBinary),
        Just(FrameKind::ThreeEAscii),
        Just(FrameKind::FourEBinary),
        Just(FrameKind::FourEAscii),
    ]
}

proptest! {
    #[test]
    fn dword_split_then_combine_is_identity(value in any::<u32>(), address in 0u32..=65534) {
        let dwords = [DwordDevice::new(DeviceCode::D, address, value)];
        let pairs = PseudoDwordSplitter::split_dword_to_word_pairs(&dwords).unwrap();
        prop_assert_eq!(pairs[0].low.address, address);
        prop_assert_eq!(pairs[0].high.address, address + 1);

        let combined = PseudoDwordSplitter::combine_word_pairs_to_dword(&pairs).unwrap();
        prop_assert_eq!(combined[0], dwords[0]);
    }

    #[test]
    fn dword_above_boundary_is_rejected(address in 65535u32..=0xFF_FFFF) {
        let dwords = [DwordDevice::new(DeviceCode::D, address, 0)];
        let err = PseudoDwordSplitter::split_dword_to_word_pairs(&dwords).unwrap_err();
        prop_assert_eq!(err.validation_errors().len(), 1);
    }

    #[test]
    fn bits_reconstruct_word(word in any::<u16>()) {
        let bits = BitExpansionUtility::expand_word_to_bits(word);
        for (i, bit) in bits.iter().enumerate() {
            prop_assert_eq!(*bit, (word >> i) & 1 == 1);
        }
        prop_assert_eq!(BitExpansionUtility::combine_bits_to_word(&bits), word);
    }

    #[test]
    fn ascii_request_is_hex_of_binary(
        devices in prop::collection::vec(word_device(), 1..=255),
        sequence in any::<u16>(),
        four_e in any::<bool>(),
    ) {
        let (binary_kind, ascii_kind) = if four_e {
            (FrameKind::FourEBinary, FrameKind::FourEAscii)
        } else {
            (FrameKind::ThreeEBinary, FrameKind::ThreeEAscii)
        };
        let binary = FrameBuilder::new(binary_kind)
            .sequence(sequence)
            .devices(devices.iter().copied())
            .build_read_random()
            .unwrap();
        let ascii = FrameBuilder::new(ascii_kind)
            .sequence(sequence)
            .devices(devices.iter().copied())
            .build_read_random()
            .unwrap();

        let wire = ascii.to_wire();
        let expected_hex = bytes_to_hex(binary.as_bytes());
        prop_assert_eq!(&wire[..], expected_hex.as_bytes());
        prop_assert!(wire.iter().all(|b| !b.is_ascii_lowercase()));
    }

    #[test]
    fn data_length_counts_trailing_bytes(
        devices in prop::collection::vec(word_device(), 1..=255),
        kind in frame_kind(),
    ) {
        let frame = FrameBuilder::new(kind)
            .devices(devices.iter().copied())
            .build_read_random()
            .unwrap();
        let offset = kind.data_length_offset();
        prop_assert_eq!(frame.data_length() as usize, frame.len() - offset - 2);
        prop_assert_eq!(frame.data_length() as usize, 2 + 8 + 4 * devices.len());
    }

    #[test]
    fn hex_round_trip(data in prop::collection::vec(any::<u8>(), 0..64)) {
        prop_assert_eq!(hex_to_bytes(&bytes_to_hex(&data)).unwrap(), data);
    }

    #[test]
    fn parser_never_panics(raw in prop::collection::vec(any::<u8>(), 0..128), kind in frame_kind()) {
        let _ = ResponseParser::parse(&raw, kind);
        let _ = ResponseParser::parse_auto(&raw);
    }

    #[test]
    fn parser_never_panics_on_ascii_shaped_input(
        body in "[0-9A-F]{0,80}",
        four_e in any::<bool>(),
    ) {
        let prefix = if four_e { "D4" } else { "D0" };
        let raw = format!("{}{}", prefix, body);
        let _ = ResponseParser::parse_auto(raw.as_bytes());
    }
}

#[test]
fn sequence_numbers_unique_within_window() {
    let manager = SequenceNumberManager::new();
    let window: HashSet<u16> = (0..256)
        .map(|_| manager.get_next(FrameVersion::FourE))
        .collect();
    assert_eq!(window.len(), 256);
    assert!(window.iter().all(|&s| s < 256));
    assert_eq!(manager.get_next(FrameVersion::FourE), 0);
}

#[test]
fn three_e_sequence_is_always_zero() {
    let manager = SequenceNumberManager::new();
    for _ in 0..10 {
        assert_eq!(manager.get_next(FrameVersion::ThreeE), 0);
    }
    assert_eq!(manager.get_current(), 0);
}

#[tokio::test]
async fn concurrent_sequence_numbers_are_unique() {
    use std::sync::Arc;

    let manager = Arc::new(SequenceNumberManager::new());
    let mut handles = Vec::new();
    for _ in 0..8 {
        let manager = Arc::clone(&manager);
        handles.push(tokio::spawn(async move {
            (0..32)
                .map(|_| manager.get_next(FrameVersion::FourE))
                .collect::<Vec<_>>()
        }));
    }

    let mut seen = HashSet::new();
    for handle in handles {
        for seq in handle.await.unwrap() {
            assert!(seen.insert(seq), "duplicate sequence {}", seq);
        }
    }
    assert_eq!(seen.len(), 256);
}
