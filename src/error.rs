//! Error types for SLMP communication
//!
//! # Error Categories
//!
//! ```text
//! SlmpError
//! ├── Frame shape     - MalformedFrame, OddLengthHexString, InsufficientPayload
//! ├── PLC reported    - PlcError (raw end code preserved)
//! ├── Consistency     - DetailedValidation (every offending item, never just the first)
//! ├── Precondition    - InvalidParameter, UnsupportedFrameVersion,
//! │                     UnsupportedDeviceForCommand, TooManyDevices, UnknownDeviceCode
//! └── Transport       - Timeout, Connection, Io, SequenceMismatch
//! ```
//!
//! Nothing in the codec retries on its own. The classification helpers
//! ([`SlmpError::is_retryable`] and friends) exist so the caller's retry
//! policy can decide.

use std::fmt;
use std::io;

use thiserror::Error;

use crate::device::DeviceCode;
use crate::protocol::EndCode;

/// Result type alias for SLMP operations.
pub type SlmpResult<T> = std::result::Result<T, SlmpError>;

/// Errors that can occur while building, parsing or exchanging SLMP frames.
#[derive(Debug, Error)]
pub enum SlmpError {
    /// Response too short or subheader mismatch.
    #[error("Malformed frame: {reason}")]
    MalformedFrame { reason: String },

    /// Frame version other than 3E / 4E.
    #[error("Unsupported frame version: {version}")]
    UnsupportedFrameVersion { version: String },

    /// Device type that the command cannot address.
    #[error("Device {device} is not supported by command 0x{command:04X}")]
    UnsupportedDeviceForCommand { device: DeviceCode, command: u16 },

    /// Payload shorter than the requested device list needs.
    #[error("Insufficient payload: {required} bytes required, {actual} available")]
    InsufficientPayload { required: usize, actual: usize },

    /// Aggregated addressing / consistency failures.
    #[error("Validation failed with {} error(s): {}", .errors.len(), join_messages(.errors))]
    DetailedValidation { errors: Vec<ValidationError> },

    /// Hex text with an odd number of characters.
    #[error("Hex string has odd length {length}")]
    OddLengthHexString { length: usize },

    /// Invalid argument supplied by the caller.
    #[error("Invalid parameter '{parameter}': {reason}")]
    InvalidParameter { parameter: String, reason: String },

    /// Data that cannot be converted (bad hex digit, BCD nibble out of range).
    #[error("Invalid data: {message}")]
    InvalidData { message: String },

    /// More devices than one frame or the configured limit allows.
    #[error("Too many devices: {count} (max {max})")]
    TooManyDevices { count: usize, max: usize },

    /// Unrecognised device mnemonic or code byte.
    #[error("Unknown device code: {code}")]
    UnknownDeviceCode { code: String },

    /// Non-zero end code reported by the PLC.
    #[error("PLC returned end code {end_code}")]
    PlcError { end_code: EndCode },

    /// 4E response echoed a different sequence number.
    #[error("Sequence mismatch: expected {expected}, received {received}")]
    SequenceMismatch { expected: u16, received: u16 },

    /// Operation did not complete in time.
    #[error("Timeout during {operation} after {timeout_ms} ms")]
    Timeout { operation: String, timeout_ms: u64 },

    /// Connection could not be established or was lost.
    #[error("Connection error: {message}")]
    Connection { message: String },

    /// Socket level failure.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

fn join_messages(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

impl SlmpError {
    pub fn malformed_frame(reason: impl Into<String>) -> Self {
        Self::MalformedFrame {
            reason: reason.into(),
        }
    }

    pub fn unsupported_frame_version(version: impl Into<String>) -> Self {
        Self::UnsupportedFrameVersion {
            version: version.into(),
        }
    }

    pub fn unsupported_device(device: DeviceCode, command: u16) -> Self {
        Self::UnsupportedDeviceForCommand { device, command }
    }

    pub fn insufficient_payload(required: usize, actual: usize) -> Self {
        Self::InsufficientPayload { required, actual }
    }

    pub fn validation(errors: Vec<ValidationError>) -> Self {
        Self::DetailedValidation { errors }
    }

    pub fn invalid_parameter(parameter: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            parameter: parameter.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::InvalidData {
            message: message.into(),
        }
    }

    pub fn unknown_device_code(code: impl Into<String>) -> Self {
        Self::UnknownDeviceCode { code: code.into() }
    }

    pub fn plc_error(end_code: impl Into<EndCode>) -> Self {
        Self::PlcError {
            end_code: end_code.into(),
        }
    }

    pub fn timeout(operation: impl Into<String>, timeout_ms: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            timeout_ms,
        }
    }

    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Frame-shape failures, fatal to the current parse.
    pub fn is_frame_error(&self) -> bool {
        matches!(
            self,
            Self::MalformedFrame { .. }
                | Self::OddLengthHexString { .. }
                | Self::InsufficientPayload { .. }
        )
    }

    /// Errors reported by the PLC through a non-zero end code.
    pub fn is_plc_error(&self) -> bool {
        matches!(self, Self::PlcError { .. })
    }

    pub fn is_validation_error(&self) -> bool {
        matches!(self, Self::DetailedValidation { .. })
    }

    /// Errors raised before any byte was emitted or parsed.
    pub fn is_precondition_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidParameter { .. }
                | Self::UnsupportedFrameVersion { .. }
                | Self::UnsupportedDeviceForCommand { .. }
                | Self::TooManyDevices { .. }
                | Self::UnknownDeviceCode { .. }
                | Self::InvalidData { .. }
        )
    }

    /// Whether repeating the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout { .. } | Self::Connection { .. } | Self::Io(_) => true,
            Self::PlcError { end_code } => end_code.is_retryable(),
            _ => false,
        }
    }

    /// Raw end code, when the PLC reported one.
    pub fn end_code(&self) -> Option<EndCode> {
        match self {
            Self::PlcError { end_code } => Some(*end_code),
            _ => None,
        }
    }

    /// Individual validation failures, empty for other variants.
    pub fn validation_errors(&self) -> &[ValidationError] {
        match self {
            Self::DetailedValidation { errors } => errors,
            _ => &[],
        }
    }
}

// ============================================================================
// Validation errors
// ============================================================================

/// Which consistency check failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidationErrorKind {
    /// `address + 1` would leave the 16-bit address space.
    BoundaryViolation,
    /// High word is not at `low.address + 1`.
    AddressMismatch,
    /// Low and high words use different device codes.
    DeviceCodeMismatch,
}

impl ValidationErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationErrorKind::BoundaryViolation => "BOUNDARY_VIOLATION",
            ValidationErrorKind::AddressMismatch => "ADDRESS_MISMATCH",
            ValidationErrorKind::DeviceCodeMismatch => "DEVICE_CODE_MISMATCH",
        }
    }
}

impl fmt::Display for ValidationErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One addressing or consistency failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub kind: ValidationErrorKind,
    /// Device code of the offending item (low word for pairs)
    pub device: DeviceCode,
    /// Address of the offending item (low word for pairs)
    pub address: u32,
    pub message: String,
}

impl ValidationError {
    pub fn new(
        kind: ValidationErrorKind,
        device: DeviceCode,
        address: u32,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            device,
            address,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_frame_display() {
        let err = SlmpError::malformed_frame("frame too short");
        assert_eq!(err.to_string(), "Malformed frame: frame too short");
        assert!(err.is_frame_error());
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_unsupported_device_display() {
        let err = SlmpError::unsupported_device(DeviceCode::TS, 0x0403);
        assert_eq!(err.to_string(), "Device TS is not supported by command 0x0403");
        assert!(err.is_precondition_error());
    }

    #[test]
    fn test_plc_error_carries_end_code() {
        let err = SlmpError::plc_error(0xC059);
        assert!(err.is_plc_error());
        assert_eq!(err.end_code(), Some(EndCode(0xC059)));
        assert!(err.to_string().contains("0xC059"));
        assert!(!err.is_retryable());

        let busy = SlmpError::plc_error(EndCode::BUSY);
        assert!(busy.is_retryable());
    }

    #[test]
    fn test_detailed_validation_lists_all_errors() {
        let err = SlmpError::validation(vec![
            ValidationError::new(
                ValidationErrorKind::AddressMismatch,
                DeviceCode::D,
                100,
                "expected 101",
            ),
            ValidationError::new(
                ValidationErrorKind::DeviceCodeMismatch,
                DeviceCode::D,
                200,
                "D vs W",
            ),
        ]);
        let text = err.to_string();
        assert!(text.contains("2 error(s)"));
        assert!(text.contains("expected 101"));
        assert!(text.contains("D vs W"));
        assert_eq!(err.validation_errors().len(), 2);
        assert!(err.is_validation_error());
    }

    #[test]
    fn test_transport_errors_are_retryable() {
        assert!(SlmpError::timeout("receive", 1000).is_retryable());
        assert!(SlmpError::connection("refused").is_retryable());
        let io_err: SlmpError = io::Error::new(io::ErrorKind::BrokenPipe, "pipe").into();
        assert!(io_err.is_retryable());
    }

    #[test]
    fn test_validation_kind_codes() {
        assert_eq!(ValidationErrorKind::BoundaryViolation.as_str(), "BOUNDARY_VIOLATION");
        assert_eq!(ValidationErrorKind::AddressMismatch.to_string(), "ADDRESS_MISMATCH");
    }
}
