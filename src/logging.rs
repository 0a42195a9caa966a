//! Logging system for the library
//!
//! Library internals always log through `tracing`. [`CallbackLogger`] adds an
//! application-facing channel for request / response packet logs:
//!
//! | Mode | Destination |
//! |------|-------------|
//! | `Tracing` | `tracing::info!` / `debug!` (default) |
//! | `Callback` | user closure, one formatted line per event |
//! | `Disabled` | nowhere |

use std::fmt;
use std::sync::Arc;

use chrono::Local;
use tracing::{debug, error, info, trace, warn};

use crate::protocol::{EndCode, FrameKind};

/// Severity, most severe first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warn => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
            LogLevel::Trace => "TRACE",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User log sink.
pub type LogCallback = Arc<dyn Fn(LogLevel, &str) + Send + Sync>;

/// Where [`CallbackLogger`] sends its lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoggingMode {
    Disabled,
    #[default]
    Tracing,
    Callback,
}

/// Packet logger handed to a client.
///
/// ```rust
/// use std::sync::{Arc, Mutex};
/// use voltage_slmp::{CallbackLogger, LogLevel};
///
/// let lines = Arc::new(Mutex::new(Vec::new()));
/// let sink = Arc::clone(&lines);
/// let logger = CallbackLogger::new(move |_level, line| sink.lock().unwrap().push(line.to_string()))
///     .with_min_level(LogLevel::Info);
///
/// logger.log(LogLevel::Info, "hello");
/// logger.log(LogLevel::Debug, "dropped");
/// assert_eq!(lines.lock().unwrap().len(), 1);
/// ```
#[derive(Clone)]
pub struct CallbackLogger {
    mode: LoggingMode,
    min_level: LogLevel,
    callback: Option<LogCallback>,
}

impl CallbackLogger {
    /// Route lines to `callback`.
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(LogLevel, &str) + Send + Sync + 'static,
    {
        Self {
            mode: LoggingMode::Callback,
            min_level: LogLevel::Info,
            callback: Some(Arc::new(callback)),
        }
    }

    /// Route lines to `tracing`.
    pub fn tracing() -> Self {
        Self {
            mode: LoggingMode::Tracing,
            min_level: LogLevel::Info,
            callback: None,
        }
    }

    pub fn disabled() -> Self {
        Self {
            mode: LoggingMode::Disabled,
            min_level: LogLevel::Error,
            callback: None,
        }
    }

    pub fn with_min_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }

    #[inline]
    pub fn mode(&self) -> LoggingMode {
        self.mode
    }

    #[inline]
    pub fn is_enabled(&self, level: LogLevel) -> bool {
        self.mode != LoggingMode::Disabled && level <= self.min_level
    }

    pub fn log(&self, level: LogLevel, message: &str) {
        if !self.is_enabled(level) {
            return;
        }
        match self.mode {
            LoggingMode::Disabled => {}
            LoggingMode::Tracing => match level {
                LogLevel::Error => error!("{}", message),
                LogLevel::Warn => warn!("{}", message),
                LogLevel::Info => info!("{}", message),
                LogLevel::Debug => debug!("{}", message),
                LogLevel::Trace => trace!("{}", message),
            },
            LoggingMode::Callback => {
                if let Some(callback) = &self.callback {
                    let line = format!(
                        "{} [{}] {}",
                        Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                        level,
                        message
                    );
                    callback(level, &line);
                }
            }
        }
    }

    /// Log an outgoing request frame.
    pub fn log_request(&self, kind: FrameKind, sequence: u16, device_count: usize, frame: &[u8]) {
        if !self.is_enabled(LogLevel::Info) {
            return;
        }
        self.log(
            LogLevel::Info,
            &format!(
                "[SLMP-{}] send seq:{} devices:{} {}",
                kind,
                sequence,
                device_count,
                format_wire_packet(kind, frame)
            ),
        );
    }

    /// Log a parsed response.
    pub fn log_response(&self, kind: FrameKind, sequence: Option<u16>, end_code: EndCode, payload: &[u8]) {
        let level = if end_code.is_success() {
            LogLevel::Info
        } else {
            LogLevel::Warn
        };
        if !self.is_enabled(level) {
            return;
        }
        let seq = sequence.map_or_else(|| "-".to_string(), |s| s.to_string());
        self.log(
            level,
            &format!(
                "[SLMP-{}] recv seq:{} end:{} {}",
                kind,
                seq,
                end_code,
                format_hex_packet(payload)
            ),
        );
    }
}

impl Default for CallbackLogger {
    fn default() -> Self {
        Self::tracing()
    }
}

impl fmt::Debug for CallbackLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackLogger")
            .field("mode", &self.mode)
            .field("min_level", &self.min_level)
            .field("has_callback", &self.callback.is_some())
            .finish()
    }
}

/// `50 00 00 FF` style rendering.
pub fn format_hex_packet(data: &[u8]) -> String {
    data.iter()
        .map(|b| hex::encode_upper([*b]))
        .collect::<Vec<_>>()
        .join(" ")
}

/// ASCII frames are logged as text, binary frames as spaced hex.
pub fn format_wire_packet(kind: FrameKind, data: &[u8]) -> String {
    if kind.is_ascii() && data.is_ascii() {
        String::from_utf8_lossy(data).into_owned()
    } else {
        format_hex_packet(data)
    }
}

/// Transport-level packet log line.
pub(crate) fn log_packet(direction: &str, kind: FrameKind, data: &[u8]) {
    info!(
        "[SLMP-TCP] {} {} ({} bytes) {}",
        direction,
        kind,
        data.len(),
        format_wire_packet(kind, data)
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn capture(min: LogLevel) -> (CallbackLogger, Arc<Mutex<Vec<(LogLevel, String)>>>) {
        let lines = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&lines);
        let logger = CallbackLogger::new(move |level, line| {
            sink.lock().unwrap().push((level, line.to_string()));
        })
        .with_min_level(min);
        (logger, lines)
    }

    #[test]
    fn test_format_hex_packet() {
        assert_eq!(format_hex_packet(&[0x50, 0x00, 0xFF]), "50 00 FF");
        assert_eq!(format_hex_packet(&[]), "");
    }

    #[test]
    fn test_format_wire_packet() {
        assert_eq!(format_wire_packet(FrameKind::ThreeEAscii, b"5000"), "5000");
        assert_eq!(format_wire_packet(FrameKind::ThreeEBinary, b"5000"), "35 30 30 30");
    }

    #[test]
    fn test_level_filtering() {
        let (logger, lines) = capture(LogLevel::Warn);
        logger.log(LogLevel::Error, "e");
        logger.log(LogLevel::Warn, "w");
        logger.log(LogLevel::Info, "i");
        let lines = lines.lock().unwrap();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].1.ends_with("[ERROR] e"));
    }

    #[test]
    fn test_request_and_response_lines() {
        let (logger, lines) = capture(LogLevel::Info);
        logger.log_request(FrameKind::FourEBinary, 7, 1, &[0x54, 0x00]);
        logger.log_response(FrameKind::FourEBinary, Some(7), EndCode::SUCCESS, &[0x01, 0x00]);
        logger.log_response(FrameKind::ThreeEBinary, None, EndCode::BUSY, &[]);

        let lines = lines.lock().unwrap();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].1.contains("[SLMP-4E/Binary] send seq:7 devices:1 54 00"));
        assert!(lines[1].1.contains("recv seq:7 end:0x0000"));
        assert_eq!(lines[2].0, LogLevel::Warn);
        assert!(lines[2].1.contains("seq:-"));
    }

    #[test]
    fn test_disabled_logger() {
        let logger = CallbackLogger::disabled();
        assert!(!logger.is_enabled(LogLevel::Error));
        logger.log(LogLevel::Error, "ignored");
        assert_eq!(logger.mode(), LoggingMode::Disabled);
    }

    #[test]
    fn test_default_is_tracing() {
        let logger = CallbackLogger::default();
        assert_eq!(logger.mode(), LoggingMode::Tracing);
        assert!(logger.is_enabled(LogLevel::Info));
        assert!(!logger.is_enabled(LogLevel::Debug));
    }
}
