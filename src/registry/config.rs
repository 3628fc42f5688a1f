//! Decoder configuration.
//!
//! A single JSON document describes the device registry, the decoder settings and,
//! optionally, static side-channel data for offline decoding:
//!
//! ```json
//! {
//!   "devices": [
//!     { "id": "1A2B3C", "family": "power_supply", "tags": { "rack": "R12", "system": "core" } },
//!     { "id": "BEEF01", "family": "env_sensor", "hardware_revision": "v3", "tags": { "asset": "cold-room" } },
//!     { "id": "D10001", "family": "distributed_io", "tags": { "system": "pumps" }, "nodes": { "3": "valves" } }
//!   ],
//!   "settings": { "dynamic_rainfall_since": { "major": 1, "minor": 4 } },
//!   "lookups": {
//!     "altitudes": { "WS0001": 420 },
//!     "firmware_versions": { "WS0001": { "major": 1, "minor": 5 } }
//!   }
//! }
//! ```

use crate::constants::DEFAULT_DYNAMIC_RAINFALL_SINCE;
use crate::error::DecodeError;
use crate::registry::{normalize_device_id, DeviceEntry, DeviceRegistry};
use crate::sigfox::lookup::{FirmwareVersion, SideChannel};
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Settings that change how frames are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DecoderSettings {
    /// First weather-station firmware emitting the dynamic-unit rainfall byte.
    pub dynamic_rainfall_since: FirmwareVersion,
}

impl Default for DecoderSettings {
    fn default() -> Self {
        let (major, minor) = DEFAULT_DYNAMIC_RAINFALL_SINCE;
        Self {
            dynamic_rainfall_since: FirmwareVersion::new(major, minor),
        }
    }
}

/// Side-channel answers known ahead of time, keyed by device ID.
///
/// Used when no time-series store is reachable (offline replay, tests).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StaticLookups {
    pub altitudes: HashMap<String, i32>,
    pub firmware_versions: HashMap<String, FirmwareVersion>,
}

impl StaticLookups {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_altitude(mut self, device_id: &str, meters: i32) -> Self {
        self.altitudes.insert(normalize_device_id(device_id), meters);
        self
    }

    pub fn with_firmware(mut self, device_id: &str, major: u8, minor: u8) -> Self {
        self.firmware_versions
            .insert(normalize_device_id(device_id), FirmwareVersion::new(major, minor));
        self
    }

    /// Re-key both tables with normalized device IDs.
    fn normalized(self) -> Self {
        Self {
            altitudes: self
                .altitudes
                .into_iter()
                .map(|(id, meters)| (normalize_device_id(&id), meters))
                .collect(),
            firmware_versions: self
                .firmware_versions
                .into_iter()
                .map(|(id, version)| (normalize_device_id(&id), version))
                .collect(),
        }
    }
}

impl SideChannel for StaticLookups {
    fn last_altitude(&self, device_id: &str) -> Option<i32> {
        self.altitudes.get(&normalize_device_id(device_id)).copied()
    }

    fn last_firmware_version(&self, device_id: &str) -> Option<FirmwareVersion> {
        self.firmware_versions
            .get(&normalize_device_id(device_id))
            .copied()
    }
}

/// Complete decoder configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DecoderConfig {
    pub devices: Vec<DeviceEntry>,
    pub settings: DecoderSettings,
    pub lookups: StaticLookups,
}

impl DecoderConfig {
    pub fn from_json_str(json: &str) -> Result<Self, DecodeError> {
        let mut config: DecoderConfig = serde_json::from_str(json)?;
        config.lookups = config.lookups.normalized();
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, DecodeError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&json)?;
        info!(
            "loaded {} device(s) from {}",
            config.devices.len(),
            path.display()
        );
        Ok(config)
    }

    /// Build the read-only registry; fails on duplicate device IDs.
    pub fn build_registry(&self) -> Result<DeviceRegistry, DecodeError> {
        DeviceRegistry::from_entries(self.devices.iter().cloned())
    }
}
