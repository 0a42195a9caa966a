//! SLMP frame variants, end codes and command catalogue
//!
//! ## Frame variants
//!
//! | Kind | Request subheader | Response subheader | Response header |
//! |------|-------------------|--------------------|-----------------|
//! | 3E Binary | `50 00` | `D0 00` | 11 bytes |
//! | 3E ASCII | `"5000"` | `"D000"` | 22 chars |
//! | 4E Binary | `54 00` + seq + `00 00` | `D4 00` + seq + `00 00` | 15 bytes |
//! | 4E ASCII | `"5400"` + seq + `"0000"` | `"D400"` + seq + `"0000"` | 30 chars |
//!
//! Every offset the builder and parser need is selected by a single match on
//! [`FrameKind`].

use std::fmt;
use std::str::FromStr;

use crate::constants::*;
use crate::error::{SlmpError, SlmpResult};

// ============================================================================
// Frame version / encoding
// ============================================================================

/// Header layout generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameVersion {
    /// 3E frame, no sequence number
    ThreeE,
    /// 4E frame, carries a 2-byte sequence number for correlation
    FourE,
}

impl FrameVersion {
    /// Short name used in configuration and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            FrameVersion::ThreeE => "3E",
            FrameVersion::FourE => "4E",
        }
    }
}

impl FromStr for FrameVersion {
    type Err = SlmpError;

    fn from_str(s: &str) -> SlmpResult<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "3E" => Ok(FrameVersion::ThreeE),
            "4E" => Ok(FrameVersion::FourE),
            _ => Err(SlmpError::unsupported_frame_version(s)),
        }
    }
}

impl fmt::Display for FrameVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Wire encoding of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Encoding {
    /// Raw bytes
    #[default]
    Binary,
    /// Uppercase hexadecimal text, two characters per byte
    Ascii,
}

impl Encoding {
    pub fn as_str(&self) -> &'static str {
        match self {
            Encoding::Binary => "Binary",
            Encoding::Ascii => "ASCII",
        }
    }
}

impl FromStr for Encoding {
    type Err = SlmpError;

    fn from_str(s: &str) -> SlmpResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "binary" | "bin" => Ok(Encoding::Binary),
            "ascii" => Ok(Encoding::Ascii),
            _ => Err(SlmpError::invalid_parameter(
                "encoding",
                format!("unknown encoding '{}'", s),
            )),
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Closed set of supported frame formats.
///
/// # Example
///
/// ```rust
/// use voltage_slmp::{Encoding, FrameKind, FrameVersion};
///
/// let kind = FrameKind::new(FrameVersion::FourE, Encoding::Ascii);
/// assert_eq!(kind, FrameKind::FourEAscii);
/// assert_eq!(kind.response_header_len(), 30);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FrameKind {
    #[default]
    ThreeEBinary,
    ThreeEAscii,
    FourEBinary,
    FourEAscii,
}

impl FrameKind {
    /// All four variants, in declaration order.
    pub const ALL: [FrameKind; 4] = [
        FrameKind::ThreeEBinary,
        FrameKind::ThreeEAscii,
        FrameKind::FourEBinary,
        FrameKind::FourEAscii,
    ];

    /// Combine a version and an encoding.
    #[inline]
    pub fn new(version: FrameVersion, encoding: Encoding) -> Self {
        match (version, encoding) {
            (FrameVersion::ThreeE, Encoding::Binary) => FrameKind::ThreeEBinary,
            (FrameVersion::ThreeE, Encoding::Ascii) => FrameKind::ThreeEAscii,
            (FrameVersion::FourE, Encoding::Binary) => FrameKind::FourEBinary,
            (FrameVersion::FourE, Encoding::Ascii) => FrameKind::FourEAscii,
        }
    }

    /// Parse a version string such as `"4E"` together with an encoding.
    ///
    /// Unknown versions (`"1E"`, `"5E"`, ...) fail with
    /// [`SlmpError::UnsupportedFrameVersion`].
    pub fn parse(version: &str, encoding: Encoding) -> SlmpResult<Self> {
        Ok(Self::new(version.parse()?, encoding))
    }

    #[inline]
    pub fn version(&self) -> FrameVersion {
        match self {
            FrameKind::ThreeEBinary | FrameKind::ThreeEAscii => FrameVersion::ThreeE,
            FrameKind::FourEBinary | FrameKind::FourEAscii => FrameVersion::FourE,
        }
    }

    #[inline]
    pub fn encoding(&self) -> Encoding {
        match self {
            FrameKind::ThreeEBinary | FrameKind::FourEBinary => Encoding::Binary,
            FrameKind::ThreeEAscii | FrameKind::FourEAscii => Encoding::Ascii,
        }
    }

    #[inline]
    pub fn is_ascii(&self) -> bool {
        self.encoding() == Encoding::Ascii
    }

    #[inline]
    pub fn is_four_e(&self) -> bool {
        self.version() == FrameVersion::FourE
    }

    /// Request subheader bytes.
    pub fn request_subheader(&self) -> [u8; 2] {
        match self.version() {
            FrameVersion::ThreeE => SUBHEADER_3E_REQUEST,
            FrameVersion::FourE => SUBHEADER_4E_REQUEST,
        }
    }

    /// Response subheader bytes.
    pub fn response_subheader(&self) -> [u8; 2] {
        match self.version() {
            FrameVersion::ThreeE => SUBHEADER_3E_RESPONSE,
            FrameVersion::FourE => SUBHEADER_4E_RESPONSE,
        }
    }

    /// ASCII prefix a response of this version starts with.
    pub fn response_ascii_prefix(&self) -> &'static str {
        match self.version() {
            FrameVersion::ThreeE => ASCII_PREFIX_3E_RESPONSE,
            FrameVersion::FourE => ASCII_PREFIX_4E_RESPONSE,
        }
    }

    /// Offset of the data-length field in a binary frame (request or response).
    pub fn data_length_offset(&self) -> usize {
        match self.version() {
            FrameVersion::ThreeE => REQUEST_3E_DATA_LENGTH_OFFSET,
            FrameVersion::FourE => REQUEST_4E_DATA_LENGTH_OFFSET,
        }
    }

    /// Response header length in wire units (bytes for binary, characters for ASCII).
    pub fn response_header_len(&self) -> usize {
        match self {
            FrameKind::ThreeEBinary => RESPONSE_3E_BINARY_HEADER_LEN,
            FrameKind::FourEBinary => RESPONSE_4E_BINARY_HEADER_LEN,
            FrameKind::ThreeEAscii => RESPONSE_3E_ASCII_HEADER_LEN,
            FrameKind::FourEAscii => RESPONSE_4E_ASCII_HEADER_LEN,
        }
    }

    /// Response bytes/characters up to and including the data-length field.
    ///
    /// A stream reader needs exactly this much before it knows the frame size.
    pub fn response_prefix_len(&self) -> usize {
        self.response_header_len() - self.wire_width(END_CODE_LEN)
    }

    /// Convert a binary byte count into wire units for this encoding.
    #[inline]
    pub fn wire_width(&self, binary_len: usize) -> usize {
        match self.encoding() {
            Encoding::Binary => binary_len,
            Encoding::Ascii => binary_len * 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FrameKind::ThreeEBinary => "3E/Binary",
            FrameKind::ThreeEAscii => "3E/ASCII",
            FrameKind::FourEBinary => "4E/Binary",
            FrameKind::FourEAscii => "4E/ASCII",
        }
    }
}

impl fmt::Display for FrameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

// ============================================================================
// Network route
// ============================================================================

/// Addressing fields shared by every request header.
///
/// Defaults address the directly connected CPU: network `00`, station `FF`,
/// I/O `03FF`, multidrop `00`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NetworkRoute {
    pub network: u8,
    pub station: u8,
    pub io_number: u16,
    pub multidrop: u8,
}

impl Default for NetworkRoute {
    fn default() -> Self {
        Self {
            network: DEFAULT_NETWORK,
            station: DEFAULT_STATION,
            io_number: DEFAULT_IO_NUMBER,
            multidrop: DEFAULT_MULTIDROP,
        }
    }
}

impl NetworkRoute {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_network(mut self, network: u8) -> Self {
        self.network = network;
        self
    }

    pub fn with_station(mut self, station: u8) -> Self {
        self.station = station;
        self
    }

    pub fn with_io_number(mut self, io_number: u16) -> Self {
        self.io_number = io_number;
        self
    }

    pub fn with_multidrop(mut self, multidrop: u8) -> Self {
        self.multidrop = multidrop;
        self
    }

    /// The five route bytes as they appear on the wire.
    pub fn to_bytes(&self) -> [u8; 5] {
        let io = self.io_number.to_le_bytes();
        [self.network, self.station, io[0], io[1], self.multidrop]
    }
}

// ============================================================================
// End codes
// ============================================================================

/// Status code carried by every SLMP response.
///
/// `0x0000` is success; anything else is a PLC-reported error. The raw value
/// is always preserved, known codes additionally carry a description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct EndCode(pub u16);

impl EndCode {
    pub const SUCCESS: EndCode = EndCode(0x0000);
    pub const WRONG_COMMAND: EndCode = EndCode(0xC059);
    pub const WRONG_FORMAT: EndCode = EndCode(0xC05C);
    pub const WRONG_METHOD: EndCode = EndCode(0xC05F);
    pub const SAME_DATA: EndCode = EndCode(0xC060);
    pub const WRONG_LENGTH: EndCode = EndCode(0xC061);
    pub const BUSY: EndCode = EndCode(0xCEE0);
    pub const EXCEED_REQUEST_LENGTH: EndCode = EndCode(0xCEE1);
    pub const EXCEED_RESPONSE_LENGTH: EndCode = EndCode(0xCEE2);
    pub const OTHER_NETWORK_ERROR: EndCode = EndCode(0xCF00);
    pub const SERVER_NOT_FOUND: EndCode = EndCode(0xCF10);
    pub const WRONG_CONFIG_ITEM: EndCode = EndCode(0xCF20);
    pub const PARAMETER_ID_NOT_FOUND: EndCode = EndCode(0xCF30);
    pub const EXCLUSIVE_WRITE_NOT_STARTED: EndCode = EndCode(0xCF31);
    pub const RELAY_FAILURE: EndCode = EndCode(0xCF70);
    pub const TIMEOUT: EndCode = EndCode(0xCF71);

    #[inline]
    pub fn value(&self) -> u16 {
        self.0
    }

    #[inline]
    pub fn is_success(&self) -> bool {
        self.0 == END_CODE_SUCCESS
    }

    /// PLC-side conditions that typically clear on their own.
    pub fn is_retryable(&self) -> bool {
        matches!(
            *self,
            EndCode::BUSY | EndCode::TIMEOUT | EndCode::RELAY_FAILURE | EndCode::SERVER_NOT_FOUND
        )
    }

    /// Human-readable description for known codes.
    pub fn description(&self) -> Option<&'static str> {
        let text = match self.0 {
            0x0000 => "success",
            0xC059 => "wrong command or subcommand",
            0xC05C => "wrong request format",
            0xC05F => "request not executable for the target",
            0xC060 => "same data",
            0xC061 => "request data length mismatch",
            0xCCC7 => "CAN application: read not permitted",
            0xCCC8 => "CAN application: write-only object",
            0xCCC9 => "CAN application: read-only object",
            0xCCCA => "CAN application: undefined object access",
            0xCCCB => "CAN application: PDO mapping not permitted",
            0xCCCC => "CAN application: PDO mapping exceeded",
            0xCCD3 => "CAN application: sub index does not exist",
            0xCCD4 => "CAN application: wrong parameter",
            0xCCD5 => "CAN application: parameter above range",
            0xCCD6 => "CAN application: parameter below range",
            0xCCDA => "CAN application: transfer or store error",
            0xCCFF => "CAN application: other error",
            0xCEE0 => "busy",
            0xCEE1 => "request length exceeded",
            0xCEE2 => "response length exceeded",
            0xCF00 => "other network error",
            0xCF10 => "server not found",
            0xCF20 => "wrong configuration item",
            0xCF30 => "parameter id not found",
            0xCF31 => "exclusive write not started",
            0xCF40 => "data fragment shortage",
            0xCF41 => "duplicate data fragment",
            0xCF43 => "data fragment lost",
            0xCF44 => "data fragment not supported",
            0xCF70 => "relay failure",
            0xCF71 => "timeout",
            _ => return None,
        };
        Some(text)
    }
}

impl From<u16> for EndCode {
    fn from(value: u16) -> Self {
        EndCode(value)
    }
}

impl fmt::Display for EndCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.description() {
            Some(desc) => write!(f, "0x{:04X} ({})", self.0, desc),
            None => write!(f, "0x{:04X}", self.0),
        }
    }
}

// ============================================================================
// Commands
// ============================================================================

/// SLMP command codes.
///
/// Only [`SlmpCommand::ReadRandom`] is built by this crate; the rest are
/// available for logging and error-information decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum SlmpCommand {
    Read = 0x0401,
    Write = 0x1401,
    ReadRandom = 0x0403,
    WriteRandom = 0x1402,
    EntryMonitorDevice = 0x0801,
    ExecuteMonitor = 0x0802,
    ReadBlock = 0x0406,
    WriteBlock = 0x1406,
    MemoryRead = 0x0613,
    MemoryWrite = 0x1613,
    RemoteRun = 0x1001,
    RemoteStop = 0x1002,
    RemotePause = 0x1003,
    RemoteLatchClear = 0x1005,
    RemoteReset = 0x1006,
    ReadTypeName = 0x0101,
}

impl SlmpCommand {
    #[inline]
    pub fn code(self) -> u16 {
        self as u16
    }

    pub fn from_code(code: u16) -> Option<Self> {
        let cmd = match code {
            0x0401 => SlmpCommand::Read,
            0x1401 => SlmpCommand::Write,
            0x0403 => SlmpCommand::ReadRandom,
            0x1402 => SlmpCommand::WriteRandom,
            0x0801 => SlmpCommand::EntryMonitorDevice,
            0x0802 => SlmpCommand::ExecuteMonitor,
            0x0406 => SlmpCommand::ReadBlock,
            0x1406 => SlmpCommand::WriteBlock,
            0x0613 => SlmpCommand::MemoryRead,
            0x1613 => SlmpCommand::MemoryWrite,
            0x1001 => SlmpCommand::RemoteRun,
            0x1002 => SlmpCommand::RemoteStop,
            0x1003 => SlmpCommand::RemotePause,
            0x1005 => SlmpCommand::RemoteLatchClear,
            0x1006 => SlmpCommand::RemoteReset,
            0x0101 => SlmpCommand::ReadTypeName,
            _ => return None,
        };
        Some(cmd)
    }

    pub fn name(&self) -> &'static str {
        match self {
            SlmpCommand::Read => "Read",
            SlmpCommand::Write => "Write",
            SlmpCommand::ReadRandom => "ReadRandom",
            SlmpCommand::WriteRandom => "WriteRandom",
            SlmpCommand::EntryMonitorDevice => "EntryMonitorDevice",
            SlmpCommand::ExecuteMonitor => "ExecuteMonitor",
            SlmpCommand::ReadBlock => "ReadBlock",
            SlmpCommand::WriteBlock => "WriteBlock",
            SlmpCommand::MemoryRead => "MemoryRead",
            SlmpCommand::MemoryWrite => "MemoryWrite",
            SlmpCommand::RemoteRun => "RemoteRun",
            SlmpCommand::RemoteStop => "RemoteStop",
            SlmpCommand::RemotePause => "RemotePause",
            SlmpCommand::RemoteLatchClear => "RemoteLatchClear",
            SlmpCommand::RemoteReset => "RemoteReset",
            SlmpCommand::ReadTypeName => "ReadTypeName",
        }
    }
}

impl fmt::Display for SlmpCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (0x{:04X})", self.name(), self.code())
    }
}
