//! SLMP protocol constants
//!
//! Byte layouts below follow the SLMP (MELSEC communication protocol) frame
//! structure for 3E and 4E frames. All multi-byte binary fields are
//! little-endian.

// ============================================================================
// Subheaders
// ============================================================================

/// 3E request subheader (`50 00` on the wire)
pub const SUBHEADER_3E_REQUEST: [u8; 2] = [0x50, 0x00];

/// 4E request subheader (`54 00` on the wire)
pub const SUBHEADER_4E_REQUEST: [u8; 2] = [0x54, 0x00];

/// 3E response subheader (`D0 00` on the wire)
pub const SUBHEADER_3E_RESPONSE: [u8; 2] = [0xD0, 0x00];

/// 4E response subheader (`D4 00` on the wire)
pub const SUBHEADER_4E_RESPONSE: [u8; 2] = [0xD4, 0x00];

/// ASCII prefix of a 3E response
pub const ASCII_PREFIX_3E_RESPONSE: &str = "D0";

/// ASCII prefix of a 4E response
pub const ASCII_PREFIX_4E_RESPONSE: &str = "D4";

// ============================================================================
// Commands
// ============================================================================

/// ReadRandom command
pub const CMD_READ_RANDOM: u16 = 0x0403;

/// ReadRandom subcommand for word units
pub const SUBCMD_WORD_UNIT: u16 = 0x0000;

// ============================================================================
// Request Layout
// ============================================================================

/// Bytes before the data-length field of a 3E request.
///
/// Subheader(2) + Network(1) + Station(1) + I/O(2) + Multidrop(1) = 7
pub const REQUEST_3E_DATA_LENGTH_OFFSET: usize = 7;

/// Bytes before the data-length field of a 4E request.
///
/// Subheader(2) + Sequence(2) + Reserved(2) + Network(1) + Station(1) + I/O(2) + Multidrop(1) = 11
pub const REQUEST_4E_DATA_LENGTH_OFFSET: usize = 11;

/// Monitoring timer(2) + Command(2) + Subcommand(2) + Word count(1) + Dword count(1)
pub const READ_RANDOM_COMMAND_SECTION_LEN: usize = 8;

/// One device entry: 3-byte address + 1-byte device code
pub const DEVICE_SPEC_LEN: usize = 4;

/// Width of the device-number field inside a device entry
pub const DEVICE_NUMBER_LEN: usize = 3;

/// Largest device number expressible in the 3-byte field
pub const MAX_DEVICE_NUMBER: u32 = 0x00FF_FFFF;

/// Word count is a single byte, so one frame carries at most 255 devices
pub const MAX_READ_RANDOM_DEVICES: usize = 255;

/// Largest frame the builder will produce
pub const MAX_FRAME_LENGTH: usize = 8194;

// ============================================================================
// Response Layout
// ============================================================================

/// Binary 3E response header: Subheader(2) + Network(1) + Station(1) + I/O(2)
/// + Multidrop(1) + Data length(2) + End code(2)
pub const RESPONSE_3E_BINARY_HEADER_LEN: usize = 11;

/// Binary 4E response header: adds Sequence(2) + Reserved(2) to the 3E header
pub const RESPONSE_4E_BINARY_HEADER_LEN: usize = 15;

/// ASCII 3E response header, two characters per binary byte
pub const RESPONSE_3E_ASCII_HEADER_LEN: usize = 22;

/// ASCII 4E response header, two characters per binary byte
pub const RESPONSE_4E_ASCII_HEADER_LEN: usize = 30;

/// End code occupies the last two bytes (four ASCII characters) of a header
pub const END_CODE_LEN: usize = 2;

/// Data-length field width in bytes
pub const DATA_LENGTH_FIELD_LEN: usize = 2;

/// Error information block returned with a non-zero end code:
/// Network(1) + Station(1) + I/O(2) + Multidrop(1) + Command(2) + Subcommand(2)
pub const ERROR_INFO_LEN: usize = 9;

/// Success end code
pub const END_CODE_SUCCESS: u16 = 0x0000;

// ============================================================================
// Defaults
// ============================================================================

/// Default network number (own network)
pub const DEFAULT_NETWORK: u8 = 0x00;

/// Default PC / station number (own station)
pub const DEFAULT_STATION: u8 = 0xFF;

/// Default request destination module I/O number (own CPU)
pub const DEFAULT_IO_NUMBER: u16 = 0x03FF;

/// Default multidrop station number
pub const DEFAULT_MULTIDROP: u8 = 0x00;

/// Default monitoring timer in 250 ms units (8 seconds)
pub const DEFAULT_MONITORING_TIMER: u16 = 32;

/// Default SLMP TCP port used by MELSEC Ethernet modules
pub const DEFAULT_SLMP_PORT: u16 = 5007;

/// Sequence numbers wrap at this modulus
pub const SEQUENCE_MODULUS: u16 = 256;

/// Receive buffer upper bound for a single response
pub const SLMP_RESPONSE_BUFFER_SIZE: usize = 8192;
