//! 4E frame sequence numbers
//!
//! 3E frames carry no correlation id and always use `0`. 4E frames take the
//! current counter value and advance it modulo 256 in one atomic step, so
//! concurrent callers never observe the same value inside a 256-request
//! window.
//!
//! Each client owns its own manager; two clients talking to two PLCs never
//! share a sequence space.

use std::sync::atomic::{AtomicU16, Ordering};

use tracing::debug;

use crate::constants::SEQUENCE_MODULUS;
use crate::protocol::FrameVersion;

/// Thread-safe rolling sequence counter.
#[derive(Debug, Default)]
pub struct SequenceNumberManager {
    counter: AtomicU16,
}

impl SequenceNumberManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the next sequence number for a frame of the given version.
    ///
    /// For 3E this is always `0` and leaves the counter untouched.
    pub fn get_next(&self, version: FrameVersion) -> u16 {
        match version {
            FrameVersion::ThreeE => 0,
            FrameVersion::FourE => {
                let taken = self
                    .counter
                    .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                        Some((current + 1) % SEQUENCE_MODULUS)
                    })
                    .unwrap_or_else(|current| current);
                debug!("Sequence number taken: {}", taken);
                taken
            }
        }
    }

    /// Value the next 4E call will return.
    #[inline]
    pub fn get_current(&self) -> u16 {
        self.counter.load(Ordering::Acquire)
    }

    /// Restart at `0`. Intended for client (re)initialisation.
    pub fn reset(&self) {
        self.counter.store(0, Ordering::Release);
    }
}
