//! # Utility Modules
//!
//! Common utility functions used throughout the sigfox-rs crate: hex
//! encoding/decoding of uplink payloads, fixed-offset bit-field extraction, and
//! logging helpers.

pub mod bits;
pub mod hex;
pub mod logging;

// Re-export commonly used types and functions
pub use bits::{bits, mask, read_be_uint, FrameReader};
pub use hex::{decode_payload, encode_hex, format_hex_compact, HexError};
pub use logging::{log_payload_hex, LogThrottle, ThrottleManager};
