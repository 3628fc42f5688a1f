//! Device identity and tag resolution.
//!
//! The registry maps a Sigfox device ID to its family and to the descriptive tags
//! (site, rack, asset, ...) attached to every record decoded for it. It is built
//! once at startup from configuration and only read afterwards.
//!
//! Unknown devices are not an error: their records carry the placeholder tag value
//! [`UNKNOWN_TAG`] so that the uplink is still stored.

pub mod config;

use crate::constants::UNKNOWN_TAG;
use crate::error::DecodeError;
use crate::payload::record::Tags;
use crate::sigfox::decoders::decoder_for;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

pub use config::{DecoderConfig, DecoderSettings, StaticLookups};

/// Device product line with its own payload layouts and tag schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Family {
    Weather,
    PowerSupply,
    EnvSensor,
    AssetTracker,
    DistributedIo,
    HomeMonitor,
    PowerMeter,
    ClockBeacon,
}

impl Family {
    pub const ALL: [Family; 8] = [
        Family::Weather,
        Family::PowerSupply,
        Family::EnvSensor,
        Family::AssetTracker,
        Family::DistributedIo,
        Family::HomeMonitor,
        Family::PowerMeter,
        Family::ClockBeacon,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Family::Weather => "weather",
            Family::PowerSupply => "power_supply",
            Family::EnvSensor => "env_sensor",
            Family::AssetTracker => "asset_tracker",
            Family::DistributedIo => "distributed_io",
            Family::HomeMonitor => "home_monitor",
            Family::PowerMeter => "power_meter",
            Family::ClockBeacon => "clock_beacon",
        }
    }

    /// Registry-provided tags every record of this family carries.
    pub fn tag_keys(&self) -> &'static [&'static str] {
        match self {
            Family::Weather | Family::HomeMonitor | Family::ClockBeacon => &["site"],
            Family::PowerSupply => &["rack", "system"],
            Family::EnvSensor => &["asset", "hw_revision"],
            Family::AssetTracker => &["asset"],
            Family::DistributedIo => &["system", "node"],
            Family::PowerMeter => &["site", "asset"],
        }
    }

    /// Storage partition the persistence layer writes this family's records to.
    pub fn database(&self) -> String {
        format!("sigfox_{}", self.as_str())
    }

    /// Payload lengths the family dispatches on; empty for distributed I/O,
    /// whose frames depend on the board type.
    pub fn frame_lengths(&self) -> &'static [usize] {
        decoder_for(*self).frame_lengths()
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Family {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        Family::ALL
            .iter()
            .copied()
            .find(|family| family.as_str() == wanted)
            .ok_or_else(|| DecodeError::UnknownFamily(s.to_string()))
    }
}

/// Environmental sensor hardware revision; selects the sensor frame bit packing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HardwareRevision {
    V2,
    V3,
}

impl HardwareRevision {
    pub fn as_str(&self) -> &'static str {
        match self {
            HardwareRevision::V2 => "v2",
            HardwareRevision::V3 => "v3",
        }
    }
}

/// One registered device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeviceEntry {
    pub id: String,
    pub family: Family,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
    #[serde(default)]
    pub hardware_revision: Option<HardwareRevision>,
    /// Distributed I/O node names by node address.
    #[serde(default)]
    pub nodes: BTreeMap<u8, String>,
}

impl DeviceEntry {
    pub fn new(id: &str, family: Family) -> Self {
        Self {
            id: id.to_string(),
            family,
            tags: BTreeMap::new(),
            hardware_revision: None,
            nodes: BTreeMap::new(),
        }
    }

    pub fn with_tag(mut self, key: &str, value: &str) -> Self {
        self.tags.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_revision(mut self, revision: HardwareRevision) -> Self {
        self.hardware_revision = Some(revision);
        self
    }

    pub fn with_node(mut self, address: u8, name: &str) -> Self {
        self.nodes.insert(address, name.to_string());
        self
    }
}

/// Sigfox device IDs are hex strings; they are compared case-insensitively.
pub fn normalize_device_id(device_id: &str) -> String {
    device_id.trim().to_ascii_uppercase()
}

/// Read-only device table.
#[derive(Debug, Clone, Default)]
pub struct DeviceRegistry {
    devices: HashMap<String, DeviceEntry>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry, rejecting duplicate IDs.
    pub fn from_entries(entries: impl IntoIterator<Item = DeviceEntry>) -> Result<Self, DecodeError> {
        let mut registry = Self::new();
        for entry in entries {
            registry.register(entry)?;
        }
        Ok(registry)
    }

    pub fn register(&mut self, mut entry: DeviceEntry) -> Result<(), DecodeError> {
        let id = normalize_device_id(&entry.id);
        if id.is_empty() {
            return Err(DecodeError::Config("device entry with an empty id".to_string()));
        }
        if self.devices.contains_key(&id) {
            return Err(DecodeError::Config(format!("device {id} registered twice")));
        }
        entry.id = id.clone();
        self.devices.insert(id, entry);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn get(&self, device_id: &str) -> Option<&DeviceEntry> {
        self.devices.get(&normalize_device_id(device_id))
    }

    pub fn family_of(&self, device_id: &str) -> Option<Family> {
        self.get(device_id).map(|entry| entry.family)
    }

    pub fn hardware_revision(&self, device_id: &str) -> Option<HardwareRevision> {
        self.get(device_id).and_then(|entry| entry.hardware_revision)
    }

    /// Tags for a record of `family` produced by `device_id`.
    ///
    /// Always contains `device_id` and every key of [`Family::tag_keys`]; keys the
    /// registry cannot answer get [`UNKNOWN_TAG`]. For distributed I/O nodes, pass the
    /// node address to resolve the `node` name and add `node_address`.
    pub fn tags_for(&self, family: Family, device_id: &str, node_address: Option<u8>) -> Tags {
        let id = normalize_device_id(device_id);
        let entry = match self.devices.get(&id) {
            Some(entry) if entry.family == family => Some(entry),
            Some(entry) => {
                warn!(
                    "device {id} is registered as {} but sent a {family} uplink; using placeholder tags",
                    entry.family
                );
                None
            }
            None => {
                debug!("device {id} is not registered; using placeholder tags");
                None
            }
        };

        let mut tags = Tags::new();
        tags.insert("device_id".to_string(), id);

        for key in family.tag_keys() {
            let value = match (*key, entry) {
                ("hw_revision", Some(entry)) => entry
                    .hardware_revision
                    .map(|rev| rev.as_str().to_string()),
                ("node", Some(entry)) => {
                    node_address.and_then(|address| entry.nodes.get(&address).cloned())
                }
                (key, Some(entry)) => entry.tags.get(key).cloned(),
                (_, None) => None,
            };
            tags.insert(key.to_string(), value.unwrap_or_else(|| UNKNOWN_TAG.to_string()));
        }

        if let Some(address) = node_address {
            tags.insert("node_address".to_string(), address.to_string());
        }

        tags
    }
}
