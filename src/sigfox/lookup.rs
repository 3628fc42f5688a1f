//! Side-channel lookups issued while decoding.
//!
//! Weather frames need two facts the payload does not carry: the station altitude
//! (from its last geolocation) for the sea-level pressure, and its firmware
//! version (from its last startup frame) to pick the rainfall encoding. Both are
//! read from the time-series store in production. A miss only removes the derived
//! field; it is never an error.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Firmware `major.minor`, ordered lexicographically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FirmwareVersion {
    pub major: u8,
    pub minor: u8,
}

impl FirmwareVersion {
    pub const fn new(major: u8, minor: u8) -> Self {
        Self { major, minor }
    }
}

impl From<(u8, u8)> for FirmwareVersion {
    fn from((major, minor): (u8, u8)) -> Self {
        Self::new(major, minor)
    }
}

impl fmt::Display for FirmwareVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Read access to the last known state of a device.
pub trait SideChannel: Send + Sync {
    /// Altitude in meters from the device's last geolocation record.
    fn last_altitude(&self, device_id: &str) -> Option<i32>;

    /// Firmware version from the device's last startup record.
    fn last_firmware_version(&self, device_id: &str) -> Option<FirmwareVersion>;
}

/// Side channel that never knows anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLookups;

impl SideChannel for NoLookups {
    fn last_altitude(&self, _device_id: &str) -> Option<i32> {
        None
    }

    fn last_firmware_version(&self, _device_id: &str) -> Option<FirmwareVersion> {
        None
    }
}
