//! # Device Data Codec
//!
//! Maps ReadRandom payload bytes back onto the requested device list and
//! provides the byte / hex / BCD / bit primitives shared by the rest of the
//! crate.
//!
//! ## Payload Layout
//!
//! | Offset | Content |
//! |--------|---------|
//! | 0..2 | first requested device (u16, LE) |
//! | 2..4 | second requested device (u16, LE) |
//! | ... | one word per device, request order |
//!
//! ## Primitives
//!
//! | Function | Direction |
//! |----------|-----------|
//! | [`hex_to_bytes`] / [`bytes_to_hex`] | `"0A1B"` <-> `[0x0A, 0x1B]` |
//! | [`decode_bcd`] / [`encode_bcd`] | `0x12` <-> `[1, 2]` |
//! | [`unpack_bits`] / [`pack_bits`] | `0x05` <-> `[true, false, true, ...]` |
//! | [`parse_ascii_hex`] | fixed-width hex field inside ASCII text |

use hex::FromHexError;
use tracing::debug;

use crate::device::DeviceSpecification;
use crate::error::{SlmpError, SlmpResult};
use crate::value::{DeviceValue, DeviceValueMap};

/// Maps payload words onto device keys.
pub struct DeviceDataExtractor;

// ============================================================================
// Extraction
// ============================================================================

impl DeviceDataExtractor {
    /// Map a ReadRandom payload onto `devices`, in request order.
    ///
    /// Keys follow [`DeviceSpecification::key`], so `X` at `0x1F` becomes
    /// `"X31"`. Extra payload bytes are ignored.
    ///
    /// # Example
    ///
    /// ```rust
    /// use voltage_slmp::{DeviceCode, DeviceDataExtractor, DeviceSpecification, DeviceValue};
    ///
    /// let devices = [
    ///     DeviceSpecification::new(DeviceCode::D, 100),
    ///     DeviceSpecification::new(DeviceCode::X, 0x1F),
    /// ];
    /// let values = DeviceDataExtractor::extract(&[0x34, 0x12, 0x01, 0x00], &devices).unwrap();
    ///
    /// assert_eq!(values.get("D100"), Some(&DeviceValue::Word(0x1234)));
    /// assert_eq!(values.get("X31"), Some(&DeviceValue::Word(1)));
    /// ```
    pub fn extract(payload: &[u8], devices: &[DeviceSpecification]) -> SlmpResult<DeviceValueMap> {
        let words = Self::extract_words(payload, devices.len())?;
        let mut values = DeviceValueMap::with_capacity(devices.len());
        for (device, word) in devices.iter().zip(words) {
            values.insert(device.key(), DeviceValue::Word(word));
        }
        debug!("Extracted {} device value(s)", values.len());
        Ok(values)
    }

    /// Read `count` little-endian words from the start of `payload`.
    pub fn extract_words(payload: &[u8], count: usize) -> SlmpResult<Vec<u16>> {
        let required = count * 2;
        if payload.len() < required {
            return Err(SlmpError::insufficient_payload(required, payload.len()));
        }
        Ok(parse_binary_word_data(&payload[..required]))
    }
}

// ============================================================================
// Hex
// ============================================================================

/// Decode hex text into bytes. Accepts either case.
///
/// ```rust
/// use voltage_slmp::codec::hex_to_bytes;
///
/// assert_eq!(hex_to_bytes("D0ff").unwrap(), vec![0xD0, 0xFF]);
/// assert!(hex_to_bytes("ABC").is_err());
/// ```
pub fn hex_to_bytes(text: &str) -> SlmpResult<Vec<u8>> {
    hex::decode(text).map_err(|e| match e {
        FromHexError::OddLength => SlmpError::OddLengthHexString { length: text.len() },
        FromHexError::InvalidHexCharacter { c, index } => {
            SlmpError::invalid_data(format!("invalid hex digit '{}' at index {}", c, index))
        }
        other => SlmpError::invalid_data(other.to_string()),
    })
}

/// Uppercase hex with no separators.
#[inline]
pub fn bytes_to_hex(data: &[u8]) -> String {
    hex::encode_upper(data)
}

/// Parse `len` hex characters of `text` starting at `start`.
///
/// Fields wider than eight characters do not fit a `u32` and are rejected.
pub fn parse_ascii_hex(text: &str, start: usize, len: usize) -> SlmpResult<u32> {
    if len == 0 || len > 8 {
        return Err(SlmpError::invalid_parameter(
            "len",
            format!("hex field width {} outside 1..=8", len),
        ));
    }
    let end = start
        .checked_add(len)
        .filter(|&end| end <= text.len())
        .ok_or_else(|| {
            SlmpError::invalid_parameter(
                "start",
                format!(
                    "field {}..{} outside text of {} characters",
                    start,
                    start.saturating_add(len),
                    text.len()
                ),
            )
        })?;
    let field = text
        .get(start..end)
        .filter(|f| f.bytes().all(|c| c.is_ascii_hexdigit()))
        .ok_or_else(|| {
            SlmpError::invalid_data(format!(
                "invalid hex field at {}..{}: {:?}",
                start,
                end,
                String::from_utf8_lossy(&text.as_bytes()[start..end])
            ))
        })?;
    u32::from_str_radix(field, 16).map_err(|e| SlmpError::invalid_data(e.to_string()))
}

// ============================================================================
// BCD
// ============================================================================

/// Split each byte into its two nibbles, high nibble first.
pub fn decode_bcd(data: &[u8]) -> Vec<u8> {
    data.iter().flat_map(|&b| [b >> 4, b & 0x0F]).collect()
}

/// Pack nibble values two per byte, high nibble first.
///
/// An odd count pads the last low nibble with `0`.
pub fn encode_bcd(nibbles: &[u8]) -> SlmpResult<Vec<u8>> {
    if let Some(bad) = nibbles.iter().find(|&&n| n > 0x0F) {
        return Err(SlmpError::invalid_data(format!(
            "BCD nibble {} out of range 0-15",
            bad
        )));
    }
    Ok(nibbles
        .chunks(2)
        .map(|pair| (pair[0] << 4) | pair.get(1).copied().unwrap_or(0))
        .collect())
}

// ============================================================================
// Bits
// ============================================================================

/// Expand bytes to bits, LSB of each byte first.
pub fn unpack_bits(data: &[u8]) -> Vec<bool> {
    data.iter()
        .flat_map(|&b| (0..8).map(move |i| (b >> i) & 1 != 0))
        .collect()
}

/// Inverse of [`unpack_bits`]; a trailing partial byte is zero-filled.
pub fn pack_bits(bits: &[bool]) -> Vec<u8> {
    bits.chunks(8)
        .map(|chunk| {
            chunk
                .iter()
                .enumerate()
                .fold(0u8, |acc, (i, &bit)| acc | (u8::from(bit) << i))
        })
        .collect()
}

// ============================================================================
// Typed payload helpers
// ============================================================================

/// Little-endian words; a trailing odd byte is ignored.
pub fn parse_binary_word_data(data: &[u8]) -> Vec<u16> {
    data.chunks_exact(2)
        .map(|w| u16::from_le_bytes([w[0], w[1]]))
        .collect()
}

/// Bit-unit payload: one device per nibble, high nibble first.
///
/// `count` trims the padding nibble of an odd device count.
pub fn parse_binary_bit_data(data: &[u8], count: usize) -> Vec<bool> {
    decode_bcd(data)
        .into_iter()
        .take(count)
        .map(|n| n == 1)
        .collect()
}

/// Four hex characters per word, most significant digit first.
pub fn parse_ascii_word_data(text: &str) -> SlmpResult<Vec<u16>> {
    if text.len() % 4 != 0 {
        return Err(SlmpError::invalid_data(format!(
            "ASCII word data length {} is not a multiple of 4",
            text.len()
        )));
    }
    (0..text.len())
        .step_by(4)
        .map(|start| parse_ascii_hex(text, start, 4).map(|v| v as u16))
        .collect()
}

/// One character per bit; only `'1'` is set.
pub fn parse_ascii_bit_data(text: &str) -> Vec<bool> {
    text.chars().map(|c| c == '1').collect()
}
