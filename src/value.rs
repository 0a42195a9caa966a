//! # Device Value Types
//!
//! Values produced by a ReadRandom cycle, keyed by device.
//!
//! | Variant | Source | Words on the wire |
//! |---------|--------|-------------------|
//! | Word | one word device | 1 |
//! | Bit | one bit of an expanded word | 0 (shares its word) |
//! | Dword | recombined word pair | 2 |

use std::collections::HashMap;
use std::fmt;

/// One acquired device value.
///
/// # Example
///
/// ```rust
/// use voltage_slmp::DeviceValue;
///
/// let v = DeviceValue::Dword(0xDEAD_BEEF);
/// assert_eq!(v.word_count(), 2);
/// assert_eq!(v.as_u32(), 0xDEAD_BEEF);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceValue {
    /// 16-bit word device
    Word(u16),
    /// Single bit
    Bit(bool),
    /// 32-bit value from two consecutive words
    Dword(u32),
}

impl DeviceValue {
    #[inline]
    pub fn as_f64(&self) -> f64 {
        match self {
            DeviceValue::Word(v) => f64::from(*v),
            DeviceValue::Bit(b) => f64::from(u8::from(*b)),
            DeviceValue::Dword(v) => f64::from(*v),
        }
    }

    /// Widen to `u32`. Bits become `0` / `1`.
    #[inline]
    pub fn as_u32(&self) -> u32 {
        match self {
            DeviceValue::Word(v) => u32::from(*v),
            DeviceValue::Bit(b) => u32::from(*b),
            DeviceValue::Dword(v) => *v,
        }
    }

    /// Word value, if this is a word.
    #[inline]
    pub fn as_word(&self) -> Option<u16> {
        match self {
            DeviceValue::Word(v) => Some(*v),
            _ => None,
        }
    }

    /// Bit value, if this is a bit.
    #[inline]
    pub fn as_bit(&self) -> Option<bool> {
        match self {
            DeviceValue::Bit(b) => Some(*b),
            _ => None,
        }
    }

    /// Words this value occupies in a ReadRandom payload.
    #[inline]
    pub fn word_count(&self) -> usize {
        match self {
            DeviceValue::Word(_) => 1,
            DeviceValue::Bit(_) => 0,
            DeviceValue::Dword(_) => 2,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            DeviceValue::Word(_) => "word",
            DeviceValue::Bit(_) => "bit",
            DeviceValue::Dword(_) => "dword",
        }
    }
}

impl fmt::Display for DeviceValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceValue::Word(v) => write!(f, "{}", v),
            DeviceValue::Bit(b) => write!(f, "{}", u8::from(*b)),
            DeviceValue::Dword(v) => write!(f, "{}", v),
        }
    }
}

impl From<u16> for DeviceValue {
    fn from(v: u16) -> Self {
        DeviceValue::Word(v)
    }
}

impl From<bool> for DeviceValue {
    fn from(v: bool) -> Self {
        DeviceValue::Bit(v)
    }
}

impl From<u32> for DeviceValue {
    fn from(v: u32) -> Self {
        DeviceValue::Dword(v)
    }
}

// ============================================================================
// Ordered map
// ============================================================================

/// Insertion-ordered `{device key: value}` map.
///
/// Inserting an existing key replaces its value in place. Lookups go through
/// a key index into `entries`.
#[derive(Debug, Clone, Default)]
pub struct DeviceValueMap {
    entries: Vec<(String, DeviceValue)>,
    index: HashMap<String, usize>,
}

impl DeviceValueMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
        }
    }

    /// Insert or replace. Returns the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: DeviceValue) -> Option<DeviceValue> {
        let key = key.into();
        if let Some(&slot) = self.index.get(&key) {
            return Some(std::mem::replace(&mut self.entries[slot].1, value));
        }
        self.index.insert(key.clone(), self.entries.len());
        self.entries.push((key, value));
        None
    }

    pub fn get(&self, key: &str) -> Option<&DeviceValue> {
        self.index.get(key).map(|&slot| &self.entries[slot].1)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &DeviceValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Append every entry of `other`, replacing shared keys.
    pub fn extend(&mut self, other: DeviceValueMap) {
        for (key, value) in other.entries {
            self.insert(key, value);
        }
    }
}

impl PartialEq for DeviceValueMap {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl IntoIterator for DeviceValueMap {
    type Item = (String, DeviceValue);
    type IntoIter = std::vec::IntoIter<(String, DeviceValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl FromIterator<(String, DeviceValue)> for DeviceValueMap {
    fn from_iter<I: IntoIterator<Item = (String, DeviceValue)>>(iter: I) -> Self {
        let mut map = DeviceValueMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}
