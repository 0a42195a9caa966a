#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use voltage_slmp::codec::bytes_to_hex;
use voltage_slmp::{DeviceCode, DeviceSpecification, FrameBuilder, FrameKind, NetworkRoute};

#[derive(Debug, Arbitrary)]
struct Input {
    four_e: bool,
    sequence: u16,
    timer: u16,
    network: u8,
    station: u8,
    devices: Vec<(u8, u32)>,
}

fuzz_target!(|input: Input| {
    let devices: Vec<DeviceSpecification> = input
        .devices
        .iter()
        .map(|&(idx, address)| {
            let code = DeviceCode::ALL[idx as usize % DeviceCode::ALL.len()];
            DeviceSpecification::new(code, address)
        })
        .collect();

    let (binary_kind, ascii_kind) = if input.four_e {
        (FrameKind::FourEBinary, FrameKind::FourEAscii)
    } else {
        (FrameKind::ThreeEBinary, FrameKind::ThreeEAscii)
    };
    let route = NetworkRoute::new()
        .with_network(input.network)
        .with_station(input.station);

    let build = |kind| {
        FrameBuilder::new(kind)
            .route(route)
            .monitoring_timer(input.timer)
            .sequence(input.sequence)
            .devices(devices.iter().copied())
            .build_read_random()
    };

    match (build(binary_kind), build(ascii_kind)) {
        (Ok(binary), Ok(ascii)) => {
            assert_eq!(binary.device_count(), devices.len());
            let offset = binary_kind.data_length_offset();
            assert_eq!(binary.data_length() as usize, binary.len() - offset - 2);
            assert_eq!(&ascii.to_wire()[..], bytes_to_hex(binary.as_bytes()).as_bytes());
        }
        (Err(_), Err(_)) => {}
        _ => panic!("binary and ASCII builders disagree"),
    }
});
