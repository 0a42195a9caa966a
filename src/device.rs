//! PLC device codes and device specifications
//!
//! A device is addressed by a code (`D`, `M`, `X`, ...) and a numeric
//! address. On the wire every ReadRandom entry is four bytes:
//!
//! | Bytes | Content |
//! |-------|---------|
//! | 0..3 | Device number, 24-bit little-endian |
//! | 3 | Device code |
//!
//! Whether an address is written in hex (`X1F`) or decimal (`D100`) is a
//! display convention only; the wire format is always binary.

use std::fmt;
use std::str::FromStr;

use crate::constants::{CMD_READ_RANDOM, MAX_DEVICE_NUMBER};
use crate::error::{SlmpError, SlmpResult};

/// SLMP device codes (binary code byte as discriminant).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum DeviceCode {
    /// Special relay
    SM = 0x91,
    /// Special register
    SD = 0xA9,
    /// Input
    X = 0x9C,
    /// Output
    Y = 0x9D,
    /// Internal relay
    M = 0x90,
    /// Latch relay
    L = 0x92,
    /// Annunciator
    F = 0x93,
    /// Edge relay
    V = 0x94,
    /// Link relay
    B = 0xA0,
    /// Data register
    D = 0xA8,
    /// Link register
    W = 0xB4,
    /// Timer contact
    TS = 0xC1,
    /// Timer coil
    TC = 0xC0,
    /// Timer current value
    TN = 0xC2,
    /// Retentive timer contact (STS)
    SS = 0xC7,
    /// Retentive timer coil (STC)
    SC = 0xC6,
    /// Retentive timer current value (STN)
    SN = 0xC8,
    /// Counter contact
    CS = 0xC4,
    /// Counter coil
    CC = 0xC3,
    /// Counter current value
    CN = 0xC5,
    /// Link special relay
    SB = 0xA1,
    /// Link special register
    SW = 0xB5,
    /// Direct input
    DX = 0xA2,
    /// Direct output
    DY = 0xA3,
    /// Index register
    Z = 0xCC,
    /// Long index register
    LZ = 0x62,
    /// File register (block switching)
    R = 0xAF,
    /// File register (serial number)
    ZR = 0xB0,
    /// Refresh data register
    RD = 0x2C,
    /// Long timer contact
    LTS = 0x51,
    /// Long timer coil
    LTC = 0x50,
    /// Long timer current value
    LTN = 0x52,
    /// Long counter contact
    LCS = 0x55,
    /// Long counter coil
    LCC = 0x54,
    /// Long counter current value
    LCN = 0x56,
}

impl DeviceCode {
    /// Every known device code.
    pub const ALL: [DeviceCode; 35] = [
        DeviceCode::SM,
        DeviceCode::SD,
        DeviceCode::X,
        DeviceCode::Y,
        DeviceCode::M,
        DeviceCode::L,
        DeviceCode::F,
        DeviceCode::V,
        DeviceCode::B,
        DeviceCode::D,
        DeviceCode::W,
        DeviceCode::TS,
        DeviceCode::TC,
        DeviceCode::TN,
        DeviceCode::SS,
        DeviceCode::SC,
        DeviceCode::SN,
        DeviceCode::CS,
        DeviceCode::CC,
        DeviceCode::CN,
        DeviceCode::SB,
        DeviceCode::SW,
        DeviceCode::DX,
        DeviceCode::DY,
        DeviceCode::Z,
        DeviceCode::LZ,
        DeviceCode::R,
        DeviceCode::ZR,
        DeviceCode::RD,
        DeviceCode::LTS,
        DeviceCode::LTC,
        DeviceCode::LTN,
        DeviceCode::LCS,
        DeviceCode::LCC,
        DeviceCode::LCN,
    ];

    /// Binary device code byte.
    #[inline]
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Look up a device by its code byte.
    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.iter().copied().find(|d| d.code() == code)
    }

    /// Canonical mnemonic (`"D"`, `"SM"`, `"LTN"`, ...).
    pub fn mnemonic(&self) -> &'static str {
        match self {
            DeviceCode::SM => "SM",
            DeviceCode::SD => "SD",
            DeviceCode::X => "X",
            DeviceCode::Y => "Y",
            DeviceCode::M => "M",
            DeviceCode::L => "L",
            DeviceCode::F => "F",
            DeviceCode::V => "V",
            DeviceCode::B => "B",
            DeviceCode::D => "D",
            DeviceCode::W => "W",
            DeviceCode::TS => "TS",
            DeviceCode::TC => "TC",
            DeviceCode::TN => "TN",
            DeviceCode::SS => "SS",
            DeviceCode::SC => "SC",
            DeviceCode::SN => "SN",
            DeviceCode::CS => "CS",
            DeviceCode::CC => "CC",
            DeviceCode::CN => "CN",
            DeviceCode::SB => "SB",
            DeviceCode::SW => "SW",
            DeviceCode::DX => "DX",
            DeviceCode::DY => "DY",
            DeviceCode::Z => "Z",
            DeviceCode::LZ => "LZ",
            DeviceCode::R => "R",
            DeviceCode::ZR => "ZR",
            DeviceCode::RD => "RD",
            DeviceCode::LTS => "LTS",
            DeviceCode::LTC => "LTC",
            DeviceCode::LTN => "LTN",
            DeviceCode::LCS => "LCS",
            DeviceCode::LCC => "LCC",
            DeviceCode::LCN => "LCN",
        }
    }

    /// Look up a device by mnemonic, case-insensitive.
    ///
    /// Accepts the `STS` / `STC` / `STN` spellings for retentive timers.
    pub fn from_mnemonic(mnemonic: &str) -> Option<Self> {
        let upper = mnemonic.trim().to_ascii_uppercase();
        match upper.as_str() {
            "STS" => return Some(DeviceCode::SS),
            "STC" => return Some(DeviceCode::SC),
            "STN" => return Some(DeviceCode::SN),
            _ => {}
        }
        Self::ALL.iter().copied().find(|d| d.mnemonic() == upper)
    }

    /// Devices conventionally written with hexadecimal addresses.
    pub fn is_hex_address(&self) -> bool {
        matches!(
            self,
            DeviceCode::X
                | DeviceCode::Y
                | DeviceCode::B
                | DeviceCode::W
                | DeviceCode::SB
                | DeviceCode::SW
                | DeviceCode::DX
                | DeviceCode::DY
                | DeviceCode::ZR
        )
    }

    /// Bit devices (16 points make one word).
    pub fn is_bit_device(&self) -> bool {
        matches!(
            self,
            DeviceCode::SM
                | DeviceCode::X
                | DeviceCode::Y
                | DeviceCode::M
                | DeviceCode::L
                | DeviceCode::F
                | DeviceCode::V
                | DeviceCode::B
                | DeviceCode::TS
                | DeviceCode::TC
                | DeviceCode::SS
                | DeviceCode::SC
                | DeviceCode::CS
                | DeviceCode::CC
                | DeviceCode::SB
                | DeviceCode::DX
                | DeviceCode::DY
                | DeviceCode::LTS
                | DeviceCode::LTC
                | DeviceCode::LCS
                | DeviceCode::LCC
        )
    }

    /// Timer/counter contacts and coils cannot be addressed by ReadRandom.
    pub fn is_read_random_supported(&self) -> bool {
        !matches!(
            self,
            DeviceCode::TS | DeviceCode::TC | DeviceCode::CS | DeviceCode::CC
        )
    }
}

impl fmt::Display for DeviceCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

impl FromStr for DeviceCode {
    type Err = SlmpError;

    fn from_str(s: &str) -> SlmpResult<Self> {
        Self::from_mnemonic(s).ok_or_else(|| SlmpError::unknown_device_code(s))
    }
}

impl TryFrom<u8> for DeviceCode {
    type Error = SlmpError;

    fn try_from(code: u8) -> SlmpResult<Self> {
        Self::from_code(code).ok_or_else(|| SlmpError::unknown_device_code(format!("0x{:02X}", code)))
    }
}

// ============================================================================
// DeviceSpecification
// ============================================================================

/// One PLC memory location.
///
/// # Example
///
/// ```rust
/// use voltage_slmp::{DeviceCode, DeviceSpecification};
///
/// let d100: DeviceSpecification = "D100".parse().unwrap();
/// assert_eq!(d100, DeviceSpecification::new(DeviceCode::D, 100));
/// assert_eq!(d100.to_device_spec_bytes(), [0x64, 0x00, 0x00, 0xA8]);
///
/// let x1f: DeviceSpecification = "X1F".parse().unwrap();
/// assert_eq!(x1f.address, 0x1F);
/// assert!(x1f.is_hex_address);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct DeviceSpecification {
    pub code: DeviceCode,
    pub address: u32,
    /// Display hint only; does not affect encoding
    pub is_hex_address: bool,
}

impl DeviceSpecification {
    /// Create a specification, inferring the address notation from the code.
    #[inline]
    pub fn new(code: DeviceCode, address: u32) -> Self {
        Self {
            code,
            address,
            is_hex_address: code.is_hex_address(),
        }
    }

    /// Override the address notation.
    pub fn with_hex_address(mut self, is_hex_address: bool) -> Self {
        self.is_hex_address = is_hex_address;
        self
    }

    /// Create a specification from a hex address string such as `"1F"`.
    pub fn from_hex_str(code: DeviceCode, hex: &str) -> SlmpResult<Self> {
        let hex = hex.trim();
        if hex.is_empty() {
            return Err(SlmpError::invalid_parameter("hex", "empty hex address"));
        }
        let digits = hex
            .strip_prefix("0x")
            .or_else(|| hex.strip_prefix("0X"))
            .unwrap_or(hex);
        let address = u32::from_str_radix(digits, 16)
            .map_err(|_| SlmpError::invalid_data(format!("invalid hex address '{}'", hex)))?;
        let spec = Self::new(code, address).with_hex_address(true);
        spec.validate_address()?;
        Ok(spec)
    }

    /// Address must fit the 24-bit device-number field.
    pub fn validate_address(&self) -> SlmpResult<()> {
        if self.address > MAX_DEVICE_NUMBER {
            return Err(SlmpError::invalid_parameter(
                "address",
                format!(
                    "device number {} out of range (0..={})",
                    self.address, MAX_DEVICE_NUMBER
                ),
            ));
        }
        Ok(())
    }

    /// Reject devices that ReadRandom cannot address.
    pub fn validate_for_read_random(&self) -> SlmpResult<()> {
        if !self.code.is_read_random_supported() {
            return Err(SlmpError::unsupported_device(self.code, CMD_READ_RANDOM));
        }
        self.validate_address()
    }

    /// 24-bit little-endian device number.
    #[inline]
    pub fn to_device_number_bytes(&self) -> [u8; 3] {
        let b = self.address.to_le_bytes();
        [b[0], b[1], b[2]]
    }

    /// Wire entry: 3-byte address followed by the code byte.
    #[inline]
    pub fn to_device_spec_bytes(&self) -> [u8; 4] {
        let n = self.to_device_number_bytes();
        [n[0], n[1], n[2], self.code.code()]
    }

    /// Map key: mnemonic plus decimal address, regardless of notation.
    pub fn key(&self) -> String {
        format!("{}{}", self.code, self.address)
    }
}

impl PartialEq for DeviceSpecification {
    fn eq(&self, other: &Self) -> bool {
        self.code == other.code && self.address == other.address
    }
}

impl Eq for DeviceSpecification {}

impl std::hash::Hash for DeviceSpecification {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.code.hash(state);
        self.address.hash(state);
    }
}

impl fmt::Display for DeviceSpecification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_hex_address {
            write!(f, "{}{:X}", self.code, self.address)
        } else {
            write!(f, "{}{}", self.code, self.address)
        }
    }
}

impl FromStr for DeviceSpecification {
    type Err = SlmpError;

    /// Parse `"D100"`, `"X1F"`, `"ZR0"`, `"STN5"`.
    ///
    /// The longest matching mnemonic wins, so `"DX10"` is direct input 0x10
    /// rather than data register `X10`.
    fn from_str(s: &str) -> SlmpResult<Self> {
        let text = s.trim().to_ascii_uppercase();
        if !text.is_ascii() || text.len() < 2 {
            return Err(SlmpError::unknown_device_code(s));
        }

        for len in (1..=(text.len() - 1).min(3)).rev() {
            let (mnemonic, rest) = text.split_at(len);
            let Some(code) = DeviceCode::from_mnemonic(mnemonic) else {
                continue;
            };
            let parsed = if code.is_hex_address() {
                let digits = rest.strip_prefix("0X").unwrap_or(rest);
                u32::from_str_radix(digits, 16).ok()
            } else {
                rest.parse::<u32>().ok()
            };
            if let Some(address) = parsed {
                let spec = Self::new(code, address);
                spec.validate_address()?;
                return Ok(spec);
            }
        }
        Err(SlmpError::unknown_device_code(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_bytes() {
        assert_eq!(DeviceCode::D.code(), 0xA8);
        assert_eq!(DeviceCode::M.code(), 0x90);
        assert_eq!(DeviceCode::X.code(), 0x9C);
        assert_eq!(DeviceCode::ZR.code(), 0xB0);
        assert_eq!(DeviceCode::LZ.code(), 0x62);
        assert_eq!(DeviceCode::RD.code(), 0x2C);
    }

    #[test]
    fn test_from_code_roundtrip() {
        for code in DeviceCode::ALL {
            assert_eq!(DeviceCode::from_code(code.code()), Some(code));
            assert_eq!(DeviceCode::from_mnemonic(code.mnemonic()), Some(code));
        }
        assert_eq!(DeviceCode::from_code(0x00), None);
        assert!(DeviceCode::try_from(0x00u8).is_err());
    }

    #[test]
    fn test_mnemonic_aliases() {
        assert_eq!(DeviceCode::from_mnemonic("sts"), Some(DeviceCode::SS));
        assert_eq!(DeviceCode::from_mnemonic("STC"), Some(DeviceCode::SC));
        assert_eq!(DeviceCode::from_mnemonic("STN"), Some(DeviceCode::SN));
        assert!("Q".parse::<DeviceCode>().is_err());
    }

    #[test]
    fn test_read_random_support() {
        for code in [DeviceCode::TS, DeviceCode::TC, DeviceCode::CS, DeviceCode::CC] {
            assert!(!code.is_read_random_supported());
        }
        assert!(DeviceCode::TN.is_read_random_supported());
        assert!(DeviceCode::D.is_read_random_supported());
    }

    #[test]
    fn test_hex_and_bit_classification() {
        assert!(DeviceCode::X.is_hex_address());
        assert!(DeviceCode::B.is_hex_address());
        assert!(!DeviceCode::D.is_hex_address());
        assert!(DeviceCode::M.is_bit_device());
        assert!(!DeviceCode::D.is_bit_device());
    }

    #[test]
    fn test_device_spec_bytes() {
        let spec = DeviceSpecification::new(DeviceCode::D, 0x123456);
        assert_eq!(spec.to_device_spec_bytes(), [0x56, 0x34, 0x12, 0xA8]);
    }

    #[test]
    fn test_key_uses_decimal_address() {
        let spec = DeviceSpecification::new(DeviceCode::X, 0x1F);
        assert!(spec.is_hex_address);
        assert_eq!(spec.key(), "X31");
        assert_eq!(spec.to_string(), "X1F");
        assert_eq!(DeviceSpecification::new(DeviceCode::D, 100).key(), "D100");
    }

    #[test]
    fn test_from_hex_str() {
        let spec = DeviceSpecification::from_hex_str(DeviceCode::W, "0x1A0").unwrap();
        assert_eq!(spec.address, 0x1A0);
        assert!(spec.is_hex_address);

        assert!(DeviceSpecification::from_hex_str(DeviceCode::W, "").is_err());
        assert!(DeviceSpecification::from_hex_str(DeviceCode::W, "XYZ").is_err());
        assert!(DeviceSpecification::from_hex_str(DeviceCode::W, "1000000").is_err());
    }

    #[test]
    fn test_parse_device_strings() {
        assert_eq!(
            "D100".parse::<DeviceSpecification>().unwrap(),
            DeviceSpecification::new(DeviceCode::D, 100)
        );
        assert_eq!(
            "x1f".parse::<DeviceSpecification>().unwrap(),
            DeviceSpecification::new(DeviceCode::X, 0x1F)
        );
        assert_eq!(
            "SD10".parse::<DeviceSpecification>().unwrap(),
            DeviceSpecification::new(DeviceCode::SD, 10)
        );
        assert_eq!(
            "ZR200".parse::<DeviceSpecification>().unwrap(),
            DeviceSpecification::new(DeviceCode::ZR, 0x200)
        );
        assert_eq!(
            "DX10".parse::<DeviceSpecification>().unwrap(),
            DeviceSpecification::new(DeviceCode::DX, 0x10)
        );
        assert_eq!(
            "STN5".parse::<DeviceSpecification>().unwrap(),
            DeviceSpecification::new(DeviceCode::SN, 5)
        );
        assert_eq!(
            "LTN7".parse::<DeviceSpecification>().unwrap(),
            DeviceSpecification::new(DeviceCode::LTN, 7)
        );
        assert_eq!(
            "BA".parse::<DeviceSpecification>().unwrap(),
            DeviceSpecification::new(DeviceCode::B, 0xA)
        );
    }

    #[test]
    fn test_parse_device_strings_invalid() {
        assert!("".parse::<DeviceSpecification>().is_err());
        assert!("D".parse::<DeviceSpecification>().is_err());
        assert!("Q100".parse::<DeviceSpecification>().is_err());
        assert!("D1A".parse::<DeviceSpecification>().is_err());
    }

    #[test]
    fn test_validate_for_read_random() {
        let ts = DeviceSpecification::new(DeviceCode::TS, 0);
        let err = ts.validate_for_read_random().unwrap_err();
        assert!(matches!(
            err,
            SlmpError::UnsupportedDeviceForCommand {
                device: DeviceCode::TS,
                command: 0x0403
            }
        ));
        assert!(DeviceSpecification::new(DeviceCode::D, 0)
            .validate_for_read_random()
            .is_ok());
    }

    #[test]
    fn test_equality_ignores_notation() {
        let a = DeviceSpecification::new(DeviceCode::W, 16);
        let b = a.with_hex_address(false);
        assert_eq!(a, b);
    }
}
