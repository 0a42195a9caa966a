#![no_main]

use libfuzzer_sys::fuzz_target;
use voltage_slmp::{FrameKind, ResponseParser};

fuzz_target!(|data: &[u8]| {
    for kind in FrameKind::ALL {
        if let Ok(frame) = ResponseParser::parse(data, kind) {
            assert_eq!(frame.kind, kind);
            if frame.is_success() {
                assert!(frame.error_info.is_none());
            } else {
                assert!(frame.payload().is_empty());
            }
        }

        if let Ok(total) = ResponseParser::expected_frame_len(data, kind) {
            assert!(total >= kind.response_prefix_len());
        }
    }

    let _ = ResponseParser::parse_auto(data);
});
