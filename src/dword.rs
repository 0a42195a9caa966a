//! Pseudo-DWord splitting and recombination
//!
//! ReadRandom in word units has no native 32-bit access, so a 32-bit value at
//! `(code, n)` is read as two word devices:
//!
//! | Word | Address | Value |
//! |------|---------|-------|
//! | low | `n` | `v & 0xFFFF` |
//! | high | `n + 1` | `v >> 16` |
//!
//! Both directions validate every item and report all failures together in
//! one [`SlmpError::DetailedValidation`]. Nothing here holds state.

use std::fmt;

use tracing::debug;

use crate::device::{DeviceCode, DeviceSpecification};
use crate::error::{SlmpError, SlmpResult, ValidationError, ValidationErrorKind};

/// Highest low-word address: `address + 1` must stay in the 16-bit space.
pub const MAX_DWORD_LOW_ADDRESS: u32 = 65534;

/// Split a `u32` into `(low, high)` words.
#[inline]
pub fn split_u32(value: u32) -> (u16, u16) {
    ((value & 0xFFFF) as u16, (value >> 16) as u16)
}

/// Combine `(low, high)` words into a `u32`.
#[inline]
pub fn combine_u32(low: u16, high: u16) -> u32 {
    u32::from(low) | (u32::from(high) << 16)
}

/// One word device and its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WordDevice {
    pub code: DeviceCode,
    pub address: u32,
    pub value: u16,
}

impl WordDevice {
    pub fn new(code: DeviceCode, address: u32, value: u16) -> Self {
        Self {
            code,
            address,
            value,
        }
    }

    pub fn spec(&self) -> DeviceSpecification {
        DeviceSpecification::new(self.code, self.address)
    }
}

/// A 32-bit device and its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DwordDevice {
    pub code: DeviceCode,
    /// Address of the low word
    pub address: u32,
    pub value: u32,
}

impl DwordDevice {
    pub fn new(code: DeviceCode, address: u32, value: u32) -> Self {
        Self {
            code,
            address,
            value,
        }
    }

    pub fn spec(&self) -> DeviceSpecification {
        DeviceSpecification::new(self.code, self.address)
    }
}

impl fmt::Display for DwordDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.spec(), self.value)
    }
}

/// Two word devices carrying one 32-bit value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WordPair {
    pub low: WordDevice,
    pub high: WordDevice,
}

impl WordPair {
    pub fn new(low: WordDevice, high: WordDevice) -> Self {
        Self { low, high }
    }

    /// Low and high device specifications, in request order.
    pub fn specs(&self) -> [DeviceSpecification; 2] {
        [self.low.spec(), self.high.spec()]
    }

    fn check(&self, errors: &mut Vec<ValidationError>) -> bool {
        let before = errors.len();
        let expected = self.low.address.wrapping_add(1);
        if self.high.address != expected {
            errors.push(ValidationError::new(
                ValidationErrorKind::AddressMismatch,
                self.low.code,
                self.low.address,
                format!(
                    "Address mismatch - LowWord address: {}, HighWord address: {}, expected {}",
                    self.low.address, self.high.address, expected
                ),
            ));
        }
        if self.high.code != self.low.code {
            errors.push(ValidationError::new(
                ValidationErrorKind::DeviceCodeMismatch,
                self.low.code,
                self.low.address,
                format!(
                    "Device code mismatch - different device codes: {} vs {}",
                    self.low.code, self.high.code
                ),
            ));
        }
        errors.len() == before
    }
}

fn boundary_error(code: DeviceCode, address: u32) -> Option<ValidationError> {
    if address <= MAX_DWORD_LOW_ADDRESS {
        return None;
    }
    Some(ValidationError::new(
        ValidationErrorKind::BoundaryViolation,
        code,
        address,
        format!(
            "Device {} at address {}: address + 1 exceeds the 16-bit device space (max {})",
            code, address, MAX_DWORD_LOW_ADDRESS
        ),
    ))
}

/// Splits 32-bit devices into word pairs and back.
///
/// # Example
///
/// ```rust
/// use voltage_slmp::{DeviceCode, DwordDevice, PseudoDwordSplitter};
///
/// let pairs = PseudoDwordSplitter::split_dword_to_word_pairs(&[
///     DwordDevice::new(DeviceCode::D, 100, 0xDEAD_BEEF),
/// ])
/// .unwrap();
/// assert_eq!(pairs[0].low.value, 0xBEEF);
/// assert_eq!(pairs[0].high.address, 101);
///
/// let back = PseudoDwordSplitter::combine_word_pairs_to_dword(&pairs).unwrap();
/// assert_eq!(back[0].value, 0xDEAD_BEEF);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct PseudoDwordSplitter;

impl PseudoDwordSplitter {
    /// Split each device into a low/high word pair.
    ///
    /// Fails if any low address is above [`MAX_DWORD_LOW_ADDRESS`]; every
    /// offending device is listed.
    pub fn split_dword_to_word_pairs(devices: &[DwordDevice]) -> SlmpResult<Vec<WordPair>> {
        let errors: Vec<_> = devices
            .iter()
            .filter_map(|d| boundary_error(d.code, d.address))
            .collect();
        if !errors.is_empty() {
            return Err(SlmpError::validation(errors));
        }

        let pairs: Vec<_> = devices
            .iter()
            .map(|d| {
                let (low, high) = split_u32(d.value);
                WordPair::new(
                    WordDevice::new(d.code, d.address, low),
                    WordDevice::new(d.code, d.address + 1, high),
                )
            })
            .collect();
        debug!("Split {} dword(s) into word pairs", pairs.len());
        Ok(pairs)
    }

    /// Recombine word pairs. Every pair is checked before failing.
    pub fn combine_word_pairs_to_dword(pairs: &[WordPair]) -> SlmpResult<Vec<DwordDevice>> {
        let mut errors = Vec::new();
        let mut out = Vec::with_capacity(pairs.len());
        for pair in pairs {
            if pair.check(&mut errors) {
                out.push(DwordDevice::new(
                    pair.low.code,
                    pair.low.address,
                    combine_u32(pair.low.value, pair.high.value),
                ));
            }
        }
        if !errors.is_empty() {
            return Err(SlmpError::validation(errors));
        }
        Ok(out)
    }

    /// Request-side split: each 32-bit device becomes its low and high word
    /// specifications, in order.
    pub fn split_specs(devices: &[DeviceSpecification]) -> SlmpResult<Vec<DeviceSpecification>> {
        let errors: Vec<_> = devices
            .iter()
            .filter_map(|d| boundary_error(d.code, d.address))
            .collect();
        if !errors.is_empty() {
            return Err(SlmpError::validation(errors));
        }
        Ok(devices
            .iter()
            .flat_map(|d| {
                [
                    *d,
                    DeviceSpecification::new(d.code, d.address + 1)
                        .with_hex_address(d.is_hex_address),
                ]
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(low: (DeviceCode, u32, u16), high: (DeviceCode, u32, u16)) -> WordPair {
        WordPair::new(
            WordDevice::new(low.0, low.1, low.2),
            WordDevice::new(high.0, high.1, high.2),
        )
    }

    #[test]
    fn test_split_basic() {
        let pairs = PseudoDwordSplitter::split_dword_to_word_pairs(&[DwordDevice::new(
            DeviceCode::D,
            100,
            0xDEAD_BEEF,
        )])
        .unwrap();
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].low, WordDevice::new(DeviceCode::D, 100, 0xBEEF));
        assert_eq!(pairs[0].high, WordDevice::new(DeviceCode::D, 101, 0xDEAD));
    }

    #[test]
    fn test_split_empty() {
        assert!(PseudoDwordSplitter::split_dword_to_word_pairs(&[])
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_split_boundary_reports_every_device() {
        let devices = [
            DwordDevice::new(DeviceCode::D, 65535, 1),
            DwordDevice::new(DeviceCode::D, 10, 1),
            DwordDevice::new(DeviceCode::W, 70000, 1),
        ];
        let err = PseudoDwordSplitter::split_dword_to_word_pairs(&devices).unwrap_err();
        let errors = err.validation_errors();
        assert_eq!(errors.len(), 2);
        assert!(errors
            .iter()
            .all(|e| e.kind == ValidationErrorKind::BoundaryViolation));
        assert_eq!(errors[0].address, 65535);
        assert_eq!(errors[1].device, DeviceCode::W);
    }

    #[test]
    fn test_split_highest_valid_address() {
        let pairs = PseudoDwordSplitter::split_dword_to_word_pairs(&[DwordDevice::new(
            DeviceCode::D,
            65534,
            0x0001_0002,
        )])
        .unwrap();
        assert_eq!(pairs[0].high.address, 65535);
    }

    #[test]
    fn test_combine_basic() {
        let pairs = [pair((DeviceCode::D, 100, 0xBEEF), (DeviceCode::D, 101, 0xDEAD))];
        let out = PseudoDwordSplitter::combine_word_pairs_to_dword(&pairs).unwrap();
        assert_eq!(out, vec![DwordDevice::new(DeviceCode::D, 100, 0xDEAD_BEEF)]);
    }

    #[test]
    fn test_combine_address_mismatch_message() {
        let pairs = [pair((DeviceCode::D, 100, 0), (DeviceCode::D, 105, 0))];
        let err = PseudoDwordSplitter::combine_word_pairs_to_dword(&pairs).unwrap_err();
        assert!(err.to_string().contains("expected 101"));
        assert_eq!(
            err.validation_errors()[0].kind,
            ValidationErrorKind::AddressMismatch
        );
    }

    #[test]
    fn test_combine_aggregates_all_failures() {
        let pairs = [
            pair((DeviceCode::D, 100, 0), (DeviceCode::W, 101, 0)),
            pair((DeviceCode::D, 200, 1), (DeviceCode::D, 201, 2)),
            pair((DeviceCode::D, 300, 0), (DeviceCode::R, 302, 0)),
        ];
        let err = PseudoDwordSplitter::combine_word_pairs_to_dword(&pairs).unwrap_err();
        let kinds: Vec<_> = err.validation_errors().iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ValidationErrorKind::DeviceCodeMismatch,
                ValidationErrorKind::AddressMismatch,
                ValidationErrorKind::DeviceCodeMismatch,
            ]
        );
        assert!(err.to_string().contains("D vs W"));
    }

    #[test]
    fn test_round_trip_edges() {
        for v in [0u32, 0xFFFF_FFFF, 0x8000_0000, 0x0000_FFFF, 0xFFFF_0000] {
            let pairs =
                PseudoDwordSplitter::split_dword_to_word_pairs(&[DwordDevice::new(DeviceCode::ZR, 0, v)])
                    .unwrap();
            let back = PseudoDwordSplitter::combine_word_pairs_to_dword(&pairs).unwrap();
            assert_eq!(back[0].value, v);
        }
        assert_eq!(combine_u32(0xBEEF, 0xDEAD), 0xDEAD_BEEF);
        assert_eq!(split_u32(0xDEAD_BEEF), (0xBEEF, 0xDEAD));
    }

    #[test]
    fn test_split_specs() {
        let specs = PseudoDwordSplitter::split_specs(&[
            DeviceSpecification::new(DeviceCode::D, 10),
            DeviceSpecification::new(DeviceCode::W, 0x20),
        ])
        .unwrap();
        let keys: Vec<_> = specs.iter().map(|s| s.key()).collect();
        assert_eq!(keys, vec!["D10", "D11", "W32", "W33"]);
        assert!(specs[3].is_hex_address);

        assert!(PseudoDwordSplitter::split_specs(&[DeviceSpecification::new(DeviceCode::D, 65535)])
            .is_err());
    }
}
