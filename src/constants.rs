//! Sigfox Frame Constants
//!
//! Frame lengths shared by several families. Family-specific frame tables live
//! next to their decoders.

/// Largest uplink a Sigfox device can send, in bytes.
pub const SIGFOX_MAX_PAYLOAD: usize = 12;

/// Startup frame length (also the action log frame on home monitors).
pub const STARTUP_FRAME_LEN: usize = 8;

/// Board monitoring frame length (weather stations, asset trackers).
pub const MONITORING_FRAME_LEN: usize = 7;

/// Geolocation frame length.
pub const GEOLOC_FRAME_LEN: usize = 11;

/// Geolocation timeout, oldest format: duration only.
pub const GEOLOC_TIMEOUT_V1_LEN: usize = 1;

/// Geolocation timeout with an 8-bit error code.
pub const GEOLOC_TIMEOUT_V2_LEN: usize = 2;

/// Geolocation timeout with a 16-bit error code.
pub const GEOLOC_TIMEOUT_V3_LEN: usize = 3;

/// Size of one error-stack slot, in bytes.
pub const ERROR_SLOT_LEN: usize = 2;

/// Tag value used when a device or node is not in the registry.
pub const UNKNOWN_TAG: &str = "unknown";

/// Weather firmware from which the rainfall byte uses the dynamic-unit encoding.
pub const DEFAULT_DYNAMIC_RAINFALL_SINCE: (u8, u8) = (1, 4);

/// Low-nibble marker of byte 7 that turns an 8-byte home-monitor frame into an action log.
pub const ACTION_LOG_MARKER: u8 = 0xA;
