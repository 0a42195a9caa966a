//! # Device Limits Configuration
//!
//! Per-PLC limits on how many devices one request may carry.
//!
//! ## SLMP Limits
//!
//! - **ReadRandom (0x0403)**: word + dword points per request; the wire field
//!   allows 255, MELSEC CPUs accept 192
//! - **Batch word access**: 960 words per request
//! - **Batch dword access**: 480 dwords per request
//! - **Batch bit access**: 7168 bits per request
//!
//! Older or remote-routed stations may need lower values or a pause between
//! requests.

use crate::constants::MAX_READ_RANDOM_DEVICES;
use crate::error::{SlmpError, SlmpResult};

/// Default ReadRandom points per request.
pub const DEFAULT_MAX_RANDOM_DEVICES: usize = 192;

/// Default words per batch request.
pub const DEFAULT_MAX_WORD_DEVICES: usize = 960;

/// Default dwords per batch request.
pub const DEFAULT_MAX_DWORD_DEVICES: usize = 480;

/// Default bits per batch request.
pub const DEFAULT_MAX_BIT_DEVICES: usize = 7168;

/// Default inter-request delay in milliseconds.
pub const DEFAULT_INTER_REQUEST_DELAY_MS: u64 = 0;

/// Device-specific SLMP limits.
///
/// # Example
///
/// ```rust
/// use voltage_slmp::DeviceLimits;
///
/// let limits = DeviceLimits::new()
///     .with_max_random_devices(64)
///     .with_inter_request_delay_ms(10);
///
/// assert_eq!(limits.random_request_count(130), 3);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceLimits {
    /// Maximum ReadRandom points per request.
    pub max_random_devices: usize,
    /// Maximum words per batch request.
    pub max_word_devices: usize,
    /// Maximum dwords per batch request.
    pub max_dword_devices: usize,
    /// Maximum bits per batch request.
    pub max_bit_devices: usize,
    /// Minimum delay between requests (milliseconds).
    pub inter_request_delay_ms: u64,
}

impl DeviceLimits {
    pub fn new() -> Self {
        Self::default()
    }

    /// Limits for slow or heavily routed stations:
    /// - 64 ReadRandom points
    /// - 480 words, 240 dwords, 3584 bits
    /// - 20ms inter-request delay
    pub fn conservative() -> Self {
        Self {
            max_random_devices: 64,
            max_word_devices: 480,
            max_dword_devices: 240,
            max_bit_devices: 3584,
            inter_request_delay_ms: 20,
        }
    }

    pub fn with_max_random_devices(mut self, count: usize) -> Self {
        self.max_random_devices = count;
        self
    }

    pub fn with_max_word_devices(mut self, count: usize) -> Self {
        self.max_word_devices = count;
        self
    }

    pub fn with_max_dword_devices(mut self, count: usize) -> Self {
        self.max_dword_devices = count;
        self
    }

    pub fn with_max_bit_devices(mut self, count: usize) -> Self {
        self.max_bit_devices = count;
        self
    }

    pub fn with_inter_request_delay_ms(mut self, delay_ms: u64) -> Self {
        self.inter_request_delay_ms = delay_ms;
        self
    }

    /// Effective ReadRandom chunk size, never above the wire ceiling.
    pub fn random_chunk_size(&self) -> usize {
        self.max_random_devices.clamp(1, MAX_READ_RANDOM_DEVICES)
    }

    /// Number of ReadRandom requests needed for `total` points.
    pub fn random_request_count(&self, total: usize) -> usize {
        if total == 0 {
            return 0;
        }
        total.div_ceil(self.random_chunk_size())
    }

    pub fn is_random_within_limits(&self, count: usize) -> bool {
        count <= self.random_chunk_size()
    }

    /// Reject a single-request point count above the configured limit.
    pub fn check_random(&self, count: usize) -> SlmpResult<()> {
        if !self.is_random_within_limits(count) {
            return Err(SlmpError::TooManyDevices {
                count,
                max: self.random_chunk_size(),
            });
        }
        Ok(())
    }

    /// Check word / dword / bit counts against the batch limits.
    pub fn check_batch(&self, words: usize, dwords: usize, bits: usize) -> SlmpResult<()> {
        for (count, max) in [
            (words, self.max_word_devices),
            (dwords, self.max_dword_devices),
            (bits, self.max_bit_devices),
        ] {
            if count > max {
                return Err(SlmpError::TooManyDevices { count, max });
            }
        }
        Ok(())
    }
}

impl Default for DeviceLimits {
    fn default() -> Self {
        Self {
            max_random_devices: DEFAULT_MAX_RANDOM_DEVICES,
            max_word_devices: DEFAULT_MAX_WORD_DEVICES,
            max_dword_devices: DEFAULT_MAX_DWORD_DEVICES,
            max_bit_devices: DEFAULT_MAX_BIT_DEVICES,
            inter_request_delay_ms: DEFAULT_INTER_REQUEST_DELAY_MS,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
