//! # Decode Logging Utilities
//!
//! Logging patterns for the uplink decoder: rate limiting for repetitive
//! "unrecognized payload" warnings (a misconfigured device can send the same bad
//! frame every few minutes for weeks) and hex dumps of payloads.
//!
//! ## Usage
//!
//! ```rust
//! use sigfox_rs::util::logging::{log_payload_hex, LogThrottle};
//!
//! let mut throttle = LogThrottle::new(60_000, 5); // 5 messages per minute
//! if throttle.allow() {
//!     log::warn!("unrecognized payload");
//! }
//! log_payload_hex("uplink", &[0x2f, 0xa3]);
//! ```

use std::collections::HashMap;
use std::time::Instant;

/// Throttling structure for rate-limiting log messages
#[derive(Debug)]
pub struct LogThrottle {
    /// Time window for throttling (in milliseconds)
    window_ms: u64,
    /// Maximum messages allowed per window
    cap: u32,
    /// Current message count in window
    count: u32,
    /// Messages refused since the window opened
    suppressed: u32,
    /// Start time of current window
    t0: Instant,
}

impl LogThrottle {
    /// Create new throttle with time window and message cap
    pub fn new(window_ms: u64, cap: u32) -> Self {
        Self {
            window_ms,
            cap,
            count: 0,
            suppressed: 0,
            t0: Instant::now(),
        }
    }

    /// Check if logging is allowed (resets counter after window expires)
    pub fn allow(&mut self) -> bool {
        let now = Instant::now();
        let elapsed_ms = now.duration_since(self.t0).as_millis() as u64;

        if elapsed_ms > self.window_ms {
            if self.suppressed > 0 {
                log::debug!("{} log message(s) suppressed by throttle", self.suppressed);
            }
            self.t0 = now;
            self.count = 0;
            self.suppressed = 0;
        }

        self.count += 1;
        let allowed = self.count <= self.cap;
        if !allowed {
            self.suppressed += 1;
        }
        allowed
    }

    /// Number of messages refused in the current window
    pub fn suppressed(&self) -> u32 {
        self.suppressed
    }

    /// Reset the throttle (start new window immediately)
    pub fn reset(&mut self) {
        self.t0 = Instant::now();
        self.count = 0;
        self.suppressed = 0;
    }
}

/// Throttles keyed by category (typically `family/device`).
#[derive(Debug, Default)]
pub struct ThrottleManager {
    throttles: HashMap<String, LogThrottle>,
}

impl ThrottleManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if logging is allowed for a specific category
    pub fn allow(&mut self, category: &str, window_ms: u64, cap: u32) -> bool {
        self.throttles
            .entry(category.to_string())
            .or_insert_with(|| LogThrottle::new(window_ms, cap))
            .allow()
    }

    /// Reset all throttles
    pub fn reset_all(&mut self) {
        for throttle in self.throttles.values_mut() {
            throttle.reset();
        }
    }
}

/// Log payload bytes in hex at debug level.
pub fn log_payload_hex(prefix: &str, data: &[u8]) {
    if log::log_enabled!(log::Level::Debug) {
        let hex_str = crate::util::hex::format_hex_compact(data);
        log::debug!("{prefix}: {hex_str} ({} bytes)", data.len());
    }
}
