//! # Voltage SLMP - MELSEC SLMP ReadRandom Codec
//!
//! An async implementation of the Mitsubishi SLMP (Seamless Message Protocol)
//! ReadRandom command (0x0403) for MELSEC PLCs: request framing, response
//! parsing, device value extraction, pseudo-dword splitting and bit expansion.
//!
//! ## Features
//!
//! - **All four frame kinds**: 3E/4E over binary or ASCII encoding
//! - **Stateless codec**: frame building and parsing are pure functions over bytes
//! - **Per-client sequencing**: 4E sequence numbers are checked against the echo
//! - **Dword and bit views**: 32-bit values over word pairs, LSB-first bit expansion
//! - **Device limits**: automatic chunking of large ReadRandom sets
//!
//! ## Supported Frame Kinds
//!
//! | Kind | Request subheader | Response header | Sequence |
//! |------|-------------------|-----------------|----------|
//! | 3E Binary | `50 00` | 11 bytes | - |
//! | 4E Binary | `54 00` | 15 bytes | ✅ |
//! | 3E ASCII | `"5000"` | 22 chars | - |
//! | 4E ASCII | `"5400"` | 30 chars | ✅ |
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use voltage_slmp::{ClientConfig, DeviceSpecification, SlmpClient, SlmpResult, SlmpTcpClient};
//!
//! #[tokio::main]
//! async fn main() -> SlmpResult<()> {
//!     let mut client = SlmpTcpClient::from_address("192.168.3.39:5007", ClientConfig::new()).await?;
//!
//!     let devices: Vec<DeviceSpecification> = vec!["D100".parse()?, "W1A".parse()?];
//!     let values = client.read_random(&devices).await?;
//!     println!("D100 = {:?}", values.get("D100"));
//!
//!     client.close().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Codec Without I/O
//!
//! ```rust
//! use voltage_slmp::{DeviceCode, DeviceSpecification, FrameBuilder, FrameKind, ResponseParser};
//!
//! let request = FrameBuilder::new(FrameKind::ThreeEBinary)
//!     .device(DeviceSpecification::new(DeviceCode::D, 100))
//!     .build_read_random()
//!     .unwrap();
//! assert_eq!(request.len(), 21);
//!
//! let raw = [0xD0, 0x00, 0x00, 0xFF, 0xFF, 0x03, 0x00, 0x04, 0x00, 0x00, 0x00, 0x34, 0x12];
//! let response = ResponseParser::parse(&raw, FrameKind::ThreeEBinary).unwrap();
//! assert_eq!(response.payload(), &[0x34, 0x12]);
//! ```

// ============================================================================
// Core modules
// ============================================================================

/// Core error types and result handling
pub mod error;

/// SLMP protocol constants
pub mod constants;

/// Frame kinds, routing and end codes
pub mod protocol;

/// Device codes and device specifications
pub mod device;

/// 4E sequence number allocation
pub mod sequence;

/// ReadRandom request framing
pub mod frame;

/// Response frame parsing
pub mod parser;

/// Network transport layer
pub mod transport;

/// SLMP client implementations
pub mod client;

/// Logging system for the library
pub mod logging;

// ============================================================================
// Data modules
// ============================================================================

/// Device value types
pub mod value;

/// Payload extraction and hex / BCD / bit helpers
pub mod codec;

/// Pseudo-dword splitting over word pairs
pub mod dword;

/// Word to bit expansion
pub mod bits;

/// Device-specific protocol limits configuration
pub mod device_limits;

// ============================================================================
// Re-exports for convenience
// ============================================================================

// === Async runtime (users can use voltage_slmp::tokio) ===
pub use tokio;

// === Core client API ===
pub use client::{ClientConfig, DeviceRequest, GenericSlmpClient, SlmpClient, SlmpTcpClient};

// === Error handling ===
pub use error::{SlmpError, SlmpResult, ValidationError, ValidationErrorKind};

// === Core types ===
pub use device::{DeviceCode, DeviceSpecification};
pub use protocol::{Encoding, EndCode, FrameKind, FrameVersion, NetworkRoute, SlmpCommand};
pub use sequence::SequenceNumberManager;
pub use value::{DeviceValue, DeviceValueMap};

// === Codec ===
pub use bits::{BitExpansionUtility, ExpandedValue};
pub use codec::DeviceDataExtractor;
pub use dword::{DwordDevice, PseudoDwordSplitter, WordDevice, WordPair};
pub use frame::{FrameBuilder, RequestFrame};
pub use parser::{ErrorInformation, ResponseFrame, ResponseParser};

// === Limits ===
pub use device_limits::DeviceLimits;

// === Monitoring ===
pub use transport::{SlmpTransport, TcpTransport, TransportStats};

// === Protocol limits (commonly needed constants) ===
pub use constants::{DEFAULT_SLMP_PORT, MAX_READ_RANDOM_DEVICES};
pub use dword::MAX_DWORD_LOW_ADDRESS;

// === Logging ===
pub use logging::{CallbackLogger, LogCallback, LogLevel, LoggingMode};

// === Hidden but preserved (flat helper functions) ===
#[doc(hidden)]
pub use frame::{build_read_random_request, build_read_random_request_ascii};
#[doc(hidden)]
pub use parser::parse_response;

/// Default timeout for operations (5 seconds)
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get library information
pub fn info() -> String {
    format!("Voltage SLMP v{} - MELSEC SLMP ReadRandom library", VERSION)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_info() {
        assert!(info().contains(VERSION));
        assert!(info().starts_with("Voltage SLMP"));
    }
}
