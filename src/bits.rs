//! Word to bit expansion
//!
//! Bit `i` of a word is `(word >> i) & 1`, so index 0 is the least
//! significant bit. A word read from bit device `M16` therefore holds `M16`
//! in bit 0 through `M31` in bit 15; a word register's bits are `D100.0`
//! through `D100.F`.

use crate::device::DeviceSpecification;
use crate::error::{SlmpError, SlmpResult};

/// Bits per word device.
pub const BITS_PER_WORD: usize = 16;

/// One entry of a mixed expansion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ExpandedValue {
    Bit(bool),
    Value(f64),
}

impl ExpandedValue {
    pub fn as_bit(&self) -> Option<bool> {
        match self {
            ExpandedValue::Bit(b) => Some(*b),
            ExpandedValue::Value(_) => None,
        }
    }

    pub fn as_value(&self) -> Option<f64> {
        match self {
            ExpandedValue::Value(v) => Some(*v),
            ExpandedValue::Bit(_) => None,
        }
    }
}

/// Stateless bit expansion helpers.
pub struct BitExpansionUtility;

impl BitExpansionUtility {
    /// LSB-first bits of `word`.
    ///
    /// ```rust
    /// use voltage_slmp::BitExpansionUtility;
    ///
    /// let bits = BitExpansionUtility::expand_word_to_bits(0x0003);
    /// assert!(bits[0] && bits[1]);
    /// assert!(bits[2..].iter().all(|b| !b));
    /// ```
    #[inline]
    pub fn expand_word_to_bits(word: u16) -> [bool; BITS_PER_WORD] {
        std::array::from_fn(|i| (word >> i) & 1 != 0)
    }

    /// Concatenated expansion of every word.
    pub fn expand_multiple_words_to_bits(words: &[u16]) -> Vec<bool> {
        words
            .iter()
            .flat_map(|&w| Self::expand_word_to_bits(w))
            .collect()
    }

    /// Inverse of [`Self::expand_word_to_bits`]. Bits past 16 are ignored,
    /// missing bits count as clear.
    pub fn combine_bits_to_word(bits: &[bool]) -> u16 {
        bits.iter()
            .take(BITS_PER_WORD)
            .enumerate()
            .fold(0u16, |acc, (i, &bit)| acc | (u16::from(bit) << i))
    }

    /// Expand only the words selected by `mask`, scaling first.
    ///
    /// For each index the scaled value is `words[i] * factors[i]` (factor
    /// `1.0` when `factors` is `None`). A masked entry emits the 16 bits of
    /// the scaled value truncated to `u16`; an unmasked entry emits the scaled
    /// value itself.
    pub fn expand_with_selection_mask(
        words: &[u16],
        mask: &[bool],
        factors: Option<&[f64]>,
    ) -> SlmpResult<Vec<ExpandedValue>> {
        if words.len() != mask.len() {
            return Err(SlmpError::invalid_parameter(
                "mask",
                format!(
                    "Array length mismatch: words={}, mask={}",
                    words.len(),
                    mask.len()
                ),
            ));
        }
        if let Some(factors) = factors {
            if factors.len() != words.len() {
                return Err(SlmpError::invalid_parameter(
                    "factors",
                    format!(
                        "Array length mismatch: words={}, factors={}",
                        words.len(),
                        factors.len()
                    ),
                ));
            }
        }

        let expanded = mask.iter().filter(|&&m| m).count();
        let mut out = Vec::with_capacity(words.len() - expanded + expanded * BITS_PER_WORD);
        for (i, (&word, &expand)) in words.iter().zip(mask).enumerate() {
            let factor = factors.map_or(1.0, |f| f[i]);
            let scaled = f64::from(word) * factor;
            if expand {
                out.extend(
                    Self::expand_word_to_bits(scaled as u16)
                        .into_iter()
                        .map(ExpandedValue::Bit),
                );
            } else {
                out.push(ExpandedValue::Value(scaled));
            }
        }
        Ok(out)
    }

    /// Key each bit of a word read from `device`.
    ///
    /// Bit devices name bit `i` after the device at `address + i` (`M16` ..
    /// `M31`). Word devices use MELSEC bit notation `D100.0` .. `D100.F`, so
    /// the keys never alias neighbouring registers.
    ///
    /// ```rust
    /// use voltage_slmp::{BitExpansionUtility, DeviceCode, DeviceSpecification};
    ///
    /// let m = BitExpansionUtility::expand_device(&DeviceSpecification::new(DeviceCode::M, 16), 1);
    /// assert_eq!(m[15].0, "M31");
    ///
    /// let d = BitExpansionUtility::expand_device(&DeviceSpecification::new(DeviceCode::D, 100), 1);
    /// assert_eq!((d[0].0.as_str(), d[0].1), ("D100.0", true));
    /// assert_eq!(d[15].0, "D100.F");
    /// ```
    pub fn expand_device(device: &DeviceSpecification, word: u16) -> Vec<(String, bool)> {
        Self::expand_word_to_bits(word)
            .into_iter()
            .enumerate()
            .map(|(i, bit)| (Self::bit_key(device, i), bit))
            .collect()
    }

    fn bit_key(device: &DeviceSpecification, index: usize) -> String {
        let offset = device
            .address
            .checked_add(index as u32)
            .filter(|_| device.code.is_bit_device());
        match offset {
            Some(address) => DeviceSpecification::new(device.code, address).key(),
            None => format!("{}.{:X}", device.key(), index),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::DeviceCode;

    #[test]
    fn test_expand_word() {
        let bits = BitExpansionUtility::expand_word_to_bits(0x0003);
        let mut expected = [false; 16];
        expected[0] = true;
        expected[1] = true;
        assert_eq!(bits, expected);

        assert!(BitExpansionUtility::expand_word_to_bits(0xFFFF).iter().all(|&b| b));
        assert!(BitExpansionUtility::expand_word_to_bits(0x8000)[15]);
    }

    #[test]
    fn test_combine_bits() {
        for w in [0u16, 1, 0x8000, 0xA5A5, 0xFFFF] {
            let bits = BitExpansionUtility::expand_word_to_bits(w);
            assert_eq!(BitExpansionUtility::combine_bits_to_word(&bits), w);
        }
        assert_eq!(BitExpansionUtility::combine_bits_to_word(&[true, false, true]), 5);
    }

    #[test]
    fn test_expand_multiple() {
        let bits = BitExpansionUtility::expand_multiple_words_to_bits(&[0x0001, 0x8000]);
        assert_eq!(bits.len(), 32);
        assert!(bits[0]);
        assert!(bits[31]);
        assert_eq!(bits.iter().filter(|&&b| b).count(), 2);
    }

    #[test]
    fn test_selection_mask_mixed_output() {
        let out = BitExpansionUtility::expand_with_selection_mask(
            &[100, 0x0005, 7],
            &[false, true, false],
            None,
        )
        .unwrap();
        assert_eq!(out.len(), 1 + 16 + 1);
        assert_eq!(out[0], ExpandedValue::Value(100.0));
        assert_eq!(out[1], ExpandedValue::Bit(true));
        assert_eq!(out[2], ExpandedValue::Bit(false));
        assert_eq!(out[3], ExpandedValue::Bit(true));
        assert_eq!(out[17].as_value(), Some(7.0));
    }

    #[test]
    fn test_selection_mask_scales_before_expanding() {
        let out = BitExpansionUtility::expand_with_selection_mask(
            &[3, 10],
            &[true, false],
            Some(&[2.0, 0.1]),
        )
        .unwrap();
        // 3 * 2 = 6 = 0b110
        assert_eq!(out[0].as_bit(), Some(false));
        assert_eq!(out[1].as_bit(), Some(true));
        assert_eq!(out[2].as_bit(), Some(true));
        let scaled = out[16].as_value().unwrap();
        assert!((scaled - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_selection_mask_length_mismatch() {
        let err =
            BitExpansionUtility::expand_with_selection_mask(&[1, 2], &[true], None).unwrap_err();
        assert!(matches!(err, SlmpError::InvalidParameter { .. }));

        let err = BitExpansionUtility::expand_with_selection_mask(&[1], &[true], Some(&[1.0, 2.0]))
            .unwrap_err();
        assert!(err.to_string().contains("factors=2"));
    }

    #[test]
    fn test_expand_device_names_bits() {
        let named = BitExpansionUtility::expand_device(&DeviceSpecification::new(DeviceCode::M, 16), 0x0002);
        assert_eq!(named.len(), 16);
        assert_eq!(named[0].0, "M16");
        assert_eq!(named[15].0, "M31");
        assert!(!named[0].1);
        assert!(named[1].1);
    }

    #[test]
    fn test_expand_word_device_uses_dotted_keys() {
        let named = BitExpansionUtility::expand_device(&DeviceSpecification::new(DeviceCode::D, 100), 0x8001);
        let keys: Vec<_> = named.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys[0], "D100.0");
        assert_eq!(keys[10], "D100.A");
        assert_eq!(keys[15], "D100.F");
        assert!(!keys.contains(&"D101"));
        assert!(named[0].1 && named[15].1);
    }

    #[test]
    fn test_expand_device_address_overflow() {
        let named = BitExpansionUtility::expand_device(&DeviceSpecification::new(DeviceCode::M, u32::MAX), 0xFFFF);
        assert_eq!(named.len(), 16);
        assert_eq!(named[0].0, format!("M{}", u32::MAX));
        assert_eq!(named[1].0, format!("M{}.1", u32::MAX));
    }
}
