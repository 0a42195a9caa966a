//! Response frame parsing
//!
//! Header sizes before the payload:
//!
//! | Kind | Header | Sequence | Data length | End code |
//! |------|--------|----------|-------------|----------|
//! | 3E Binary | 11 bytes | - | bytes 7..9 (LE) | bytes 9..11 (LE) |
//! | 4E Binary | 15 bytes | bytes 2..4 (LE) | bytes 11..13 (LE) | bytes 13..15 (LE) |
//! | 3E ASCII | 22 chars | - | chars 14..18 | chars 18..22 |
//! | 4E ASCII | 30 chars | chars 4..8 | chars 22..26 | chars 26..30 |
//!
//! ASCII header fields are hex text with the most significant digit first.
//! ASCII payload words (4 characters each) are converted to little-endian byte
//! pairs so both encodings yield the same payload bytes.
//!
//! The data-length field counts everything after itself, end code included,
//! in wire units (bytes for binary, characters for ASCII).

use std::fmt;

use bytes::Bytes;
use tracing::{debug, warn};

use crate::codec::parse_ascii_hex;
use crate::constants::*;
use crate::error::{SlmpError, SlmpResult};
use crate::protocol::{EndCode, Encoding, FrameKind, FrameVersion};

/// Routing and command echo returned together with a non-zero end code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorInformation {
    pub network: u8,
    pub station: u8,
    pub io_number: u16,
    pub multidrop: u8,
    pub command: u16,
    pub subcommand: u16,
}

impl ErrorInformation {
    fn from_binary(data: &[u8]) -> Option<Self> {
        if data.len() < ERROR_INFO_LEN {
            return None;
        }
        Some(Self {
            network: data[0],
            station: data[1],
            io_number: u16::from_le_bytes([data[2], data[3]]),
            multidrop: data[4],
            command: u16::from_le_bytes([data[5], data[6]]),
            subcommand: u16::from_le_bytes([data[7], data[8]]),
        })
    }

    fn from_ascii(text: &str) -> Option<Self> {
        if text.len() < ERROR_INFO_LEN * 2 {
            return None;
        }
        Some(Self {
            network: parse_ascii_hex(text, 0, 2).ok()? as u8,
            station: parse_ascii_hex(text, 2, 2).ok()? as u8,
            io_number: parse_ascii_hex(text, 4, 4).ok()? as u16,
            multidrop: parse_ascii_hex(text, 8, 2).ok()? as u8,
            command: parse_ascii_hex(text, 10, 4).ok()? as u16,
            subcommand: parse_ascii_hex(text, 14, 4).ok()? as u16,
        })
    }
}

impl fmt::Display for ErrorInformation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "network={:02X} station={:02X} io={:04X} multidrop={:02X} command={:04X} subcommand={:04X}",
            self.network, self.station, self.io_number, self.multidrop, self.command, self.subcommand
        )
    }
}

/// A parsed response.
///
/// A non-zero end code is not an `Err` at this level; the raw code is kept
/// and [`ResponseFrame::into_result`] turns it into [`SlmpError::PlcError`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseFrame {
    pub kind: FrameKind,
    /// Echoed sequence number (4E only)
    pub sequence: Option<u16>,
    /// Raw data-length field
    pub data_length: u16,
    pub end_code: EndCode,
    /// Device data as little-endian bytes; empty on error
    pub payload: Bytes,
    /// Present when the PLC returned an error block
    pub error_info: Option<ErrorInformation>,
}

impl ResponseFrame {
    #[inline]
    pub fn is_success(&self) -> bool {
        self.end_code.is_success()
    }

    /// Payload as a slice.
    #[inline]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Number of complete 16-bit words in the payload.
    #[inline]
    pub fn word_count(&self) -> usize {
        self.payload.len() / 2
    }

    /// Succeed only for end code `0x0000`.
    pub fn into_result(self) -> SlmpResult<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            if let Some(info) = &self.error_info {
                warn!("PLC error {} ({})", self.end_code, info);
            } else {
                warn!("PLC error {}", self.end_code);
            }
            Err(SlmpError::plc_error(self.end_code))
        }
    }
}

/// Stateless response parser.
///
/// # Example
///
/// ```rust
/// use voltage_slmp::{FrameKind, ResponseParser};
///
/// let raw = [
///     0xD0, 0x00, 0x00, 0xFF, 0xFF, 0x03, 0x00, 0x06, 0x00, 0x00, 0x00, 0x01, 0x02, 0x03, 0x04,
/// ];
/// let frame = ResponseParser::parse(&raw, FrameKind::ThreeEBinary).unwrap();
/// assert!(frame.is_success());
/// assert_eq!(frame.payload(), &[0x01, 0x02, 0x03, 0x04]);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseParser;

impl ResponseParser {
    /// Parse a complete response of a known kind.
    pub fn parse(raw: &[u8], kind: FrameKind) -> SlmpResult<ResponseFrame> {
        let frame = match kind.encoding() {
            Encoding::Binary => Self::parse_binary(raw, kind)?,
            Encoding::Ascii => Self::parse_ascii(raw, kind)?,
        };
        debug!(
            "Response parsed: kind={}, seq={:?}, end_code={}, payload_len={}",
            frame.kind,
            frame.sequence,
            frame.end_code,
            frame.payload.len()
        );
        Ok(frame)
    }

    /// Detect the frame kind from the first two bytes.
    ///
    /// Binary subheaders are checked before ASCII prefixes.
    pub fn detect_frame_kind(raw: &[u8]) -> SlmpResult<FrameKind> {
        if raw.len() < 2 {
            return Err(SlmpError::malformed_frame(format!(
                "cannot detect frame kind from {} byte(s)",
                raw.len()
            )));
        }
        match (raw[0], raw[1]) {
            (0xD0, 0x00) => Ok(FrameKind::ThreeEBinary),
            (0xD4, 0x00) => Ok(FrameKind::FourEBinary),
            (b'D', b'0') => Ok(FrameKind::ThreeEAscii),
            (b'D', b'4') => Ok(FrameKind::FourEAscii),
            (a, b) => Err(SlmpError::malformed_frame(format!(
                "unrecognised response subheader {:02X} {:02X}",
                a, b
            ))),
        }
    }

    /// Detect the kind and parse.
    pub fn parse_auto(raw: &[u8]) -> SlmpResult<ResponseFrame> {
        let kind = Self::detect_frame_kind(raw)?;
        Self::parse(raw, kind)
    }

    /// Total response length in wire units, from a prefix that covers at least
    /// [`FrameKind::response_prefix_len`].
    pub fn expected_frame_len(prefix: &[u8], kind: FrameKind) -> SlmpResult<usize> {
        let needed = kind.response_prefix_len();
        if prefix.len() < needed {
            return Err(SlmpError::malformed_frame(format!(
                "{} response prefix too short: {} of {}",
                kind,
                prefix.len(),
                needed
            )));
        }
        let data_length = Self::read_data_length(prefix, kind)?;
        Ok(needed + data_length as usize)
    }

    fn read_data_length(raw: &[u8], kind: FrameKind) -> SlmpResult<u16> {
        let offset = kind.data_length_offset();
        match kind.encoding() {
            Encoding::Binary => Ok(u16::from_le_bytes([raw[offset], raw[offset + 1]])),
            Encoding::Ascii => {
                let text = ascii_text(raw)?;
                Ok(parse_ascii_hex(text, offset * 2, 4).map_err(header_error)? as u16)
            }
        }
    }

    fn check_length(raw_len: usize, kind: FrameKind) -> SlmpResult<()> {
        let minimum = kind.response_header_len();
        if raw_len < minimum {
            let unit = if kind.is_ascii() { "characters" } else { "bytes" };
            return Err(SlmpError::malformed_frame(format!(
                "{} response too short: {} {}, minimum {}",
                kind, raw_len, unit, minimum
            )));
        }
        Ok(())
    }

    /// Bound the body by the data-length field. Returns the body end offset.
    fn body_end(raw_len: usize, kind: FrameKind, data_length: u16) -> SlmpResult<usize> {
        let prefix = kind.response_prefix_len();
        let end_code_width = kind.wire_width(END_CODE_LEN);
        let declared = data_length as usize;
        if declared < end_code_width {
            return Err(SlmpError::malformed_frame(format!(
                "{} data length {} smaller than end code",
                kind, declared
            )));
        }
        let end = prefix + declared;
        if end > raw_len {
            return Err(SlmpError::malformed_frame(format!(
                "{} response truncated: data length declares {}, {} available",
                kind,
                declared,
                raw_len - prefix
            )));
        }
        if end < raw_len {
            debug!("Ignoring {} trailing unit(s) after {} response", raw_len - end, kind);
        }
        Ok(end)
    }

    fn parse_binary(raw: &[u8], kind: FrameKind) -> SlmpResult<ResponseFrame> {
        Self::check_length(raw.len(), kind)?;

        let expected = kind.response_subheader();
        if raw[0..2] != expected {
            return Err(SlmpError::malformed_frame(format!(
                "{} subheader mismatch: expected {:02X} {:02X}, got {:02X} {:02X}",
                kind, expected[0], expected[1], raw[0], raw[1]
            )));
        }

        let sequence = match kind.version() {
            FrameVersion::ThreeE => None,
            FrameVersion::FourE => Some(u16::from_le_bytes([raw[2], raw[3]])),
        };
        let data_length = Self::read_data_length(raw, kind)?;
        let header = kind.response_header_len();
        let end_code = EndCode(u16::from_le_bytes([raw[header - 2], raw[header - 1]]));
        let end = Self::body_end(raw.len(), kind, data_length)?;
        let body = &raw[header..end];

        if !end_code.is_success() {
            return Ok(ResponseFrame {
                kind,
                sequence,
                data_length,
                end_code,
                payload: Bytes::new(),
                error_info: ErrorInformation::from_binary(body),
            });
        }

        Ok(ResponseFrame {
            kind,
            sequence,
            data_length,
            end_code,
            payload: Bytes::copy_from_slice(body),
            error_info: None,
        })
    }

    fn parse_ascii(raw: &[u8], kind: FrameKind) -> SlmpResult<ResponseFrame> {
        Self::check_length(raw.len(), kind)?;
        let text = ascii_text(raw)?;

        let prefix = kind.response_ascii_prefix();
        if !text.starts_with(prefix) {
            return Err(SlmpError::malformed_frame(format!(
                "{} subheader mismatch: expected {}, got {}",
                kind,
                prefix,
                &text[0..2]
            )));
        }

        let sequence = match kind.version() {
            FrameVersion::ThreeE => None,
            FrameVersion::FourE => Some(parse_ascii_hex(text, 4, 4).map_err(header_error)? as u16),
        };
        let data_length = Self::read_data_length(raw, kind)?;
        let header = kind.response_header_len();
        let end_code = EndCode(parse_ascii_hex(text, header - 4, 4).map_err(header_error)? as u16);
        let end = Self::body_end(raw.len(), kind, data_length)?;
        let body = &text[header..end];

        if !end_code.is_success() {
            return Ok(ResponseFrame {
                kind,
                sequence,
                data_length,
                end_code,
                payload: Bytes::new(),
                error_info: ErrorInformation::from_ascii(body),
            });
        }

        Ok(ResponseFrame {
            kind,
            sequence,
            data_length,
            end_code,
            payload: Bytes::from(ascii_words_to_le_bytes(body)?),
            error_info: None,
        })
    }
}

/// Parse a complete response of a known kind.
#[inline]
pub fn parse_response(raw: &[u8], kind: FrameKind) -> SlmpResult<ResponseFrame> {
    ResponseParser::parse(raw, kind)
}

fn ascii_text(raw: &[u8]) -> SlmpResult<&str> {
    if !raw.is_ascii() {
        return Err(SlmpError::malformed_frame("ASCII response contains non-ASCII bytes"));
    }
    std::str::from_utf8(raw)
        .map_err(|_| SlmpError::malformed_frame("ASCII response is not valid text"))
}

fn header_error(err: SlmpError) -> SlmpError {
    SlmpError::malformed_frame(format!("invalid ASCII header field: {}", err))
}

/// `"1234ABCD"` becomes `[0x34, 0x12, 0xCD, 0xAB]`.
fn ascii_words_to_le_bytes(text: &str) -> SlmpResult<Vec<u8>> {
    if text.len() % 4 != 0 {
        return Err(SlmpError::malformed_frame(format!(
            "ASCII payload of {} characters is not a whole number of words",
            text.len()
        )));
    }
    let mut bytes = Vec::with_capacity(text.len() / 2);
    for start in (0..text.len()).step_by(4) {
        let word = parse_ascii_hex(text, start, 4).map_err(|e| {
            SlmpError::malformed_frame(format!("invalid ASCII payload word at {}: {}", start, e))
        })? as u16;
        bytes.extend_from_slice(&word.to_le_bytes());
    }
    Ok(bytes)
}
