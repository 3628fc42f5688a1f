//! Sigfox uplink decoding.
//!
//! [`UplinkDecoder`] is the entry point: it takes one callback (family, timestamp,
//! device ID, hex payload), resolves tags, dispatches to the family decoder and
//! returns the records to persist. Decoding is request-scoped: the decoder only
//! borrows the registry, the side channel, the energy tracker and (optionally) the
//! warning throttle, which the caller owns for the process lifetime. A decoder
//! built without [`UplinkDecoder::with_log_throttle`] throttles warnings only for
//! its own lifetime.

pub mod decoders;
pub mod energy;
pub mod lookup;

use crate::error::DecodeError;
use crate::payload::record::{DecodedRecord, Measurement, Tags};
use crate::registry::{normalize_device_id, DecoderSettings, DeviceRegistry, Family};
use crate::util::hex::decode_payload;
use crate::util::logging::{log_payload_hex, ThrottleManager};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

/// Window and cap for "unrecognized payload" warnings, per family and device.
const UNRECOGNIZED_LOG_WINDOW_MS: u64 = 60_000;
const UNRECOGNIZED_LOG_CAP: u32 = 3;

pub use energy::{ChannelKey, EnergyResetTracker};
pub use lookup::{FirmwareVersion, NoLookups, SideChannel};

/// Body of a Sigfox data callback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Uplink {
    /// Device ID as sent by the backend (hex).
    pub device: String,
    /// Reception time, seconds since the epoch.
    pub time: i64,
    /// Payload as ASCII hex.
    pub data: String,
    /// Family named by the callback route; resolved from the registry when absent.
    #[serde(default)]
    pub family: Option<Family>,
}

/// Outcome of one decode call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Decoded {
    pub records: Vec<DecodedRecord>,
    /// `false` when no frame kind of the family matches the payload.
    pub recognized: bool,
}

impl Decoded {
    pub fn recognized(records: Vec<DecodedRecord>) -> Self {
        Self {
            records,
            recognized: true,
        }
    }

    pub fn unrecognized() -> Self {
        Self::default()
    }
}

/// Everything a family decoder may consult while decoding one frame.
pub struct FrameContext<'a> {
    pub family: Family,
    pub timestamp: i64,
    /// Normalized (uppercase) device ID.
    pub device_id: String,
    pub registry: &'a DeviceRegistry,
    pub lookups: &'a dyn SideChannel,
    pub energy: &'a EnergyResetTracker,
    pub settings: &'a DecoderSettings,
}

impl FrameContext<'_> {
    /// Device-level tags.
    pub fn tags(&self) -> Tags {
        self.registry.tags_for(self.family, &self.device_id, None)
    }

    /// Tags of one distributed I/O node.
    pub fn node_tags(&self, node_address: u8) -> Tags {
        self.registry
            .tags_for(self.family, &self.device_id, Some(node_address))
    }

    /// Empty record at the uplink timestamp.
    pub fn record(&self, measurement: Measurement, tags: &Tags) -> DecodedRecord {
        DecodedRecord::new(measurement, self.timestamp, tags.clone())
    }

    /// The `metadata.last_communication` record every data frame emits.
    pub fn last_communication(&self, tags: &Tags) -> DecodedRecord {
        self.record(Measurement::Metadata, tags)
            .with_field("last_communication", self.timestamp)
    }
}

/// Request-scoped decoder.
pub struct UplinkDecoder<'a> {
    registry: &'a DeviceRegistry,
    lookups: &'a dyn SideChannel,
    energy: &'a EnergyResetTracker,
    settings: DecoderSettings,
    shared_log: Option<&'a Mutex<ThrottleManager>>,
    local_log: Mutex<ThrottleManager>,
}

impl<'a> UplinkDecoder<'a> {
    pub fn new(
        registry: &'a DeviceRegistry,
        lookups: &'a dyn SideChannel,
        energy: &'a EnergyResetTracker,
        settings: DecoderSettings,
    ) -> Self {
        Self {
            registry,
            lookups,
            energy,
            settings,
            shared_log: None,
            local_log: Mutex::new(ThrottleManager::new()),
        }
    }

    /// Throttle "unrecognized payload" warnings with a caller-owned manager, so
    /// the cap holds across decoders.
    pub fn with_log_throttle(mut self, throttle: &'a Mutex<ThrottleManager>) -> Self {
        self.shared_log = Some(throttle);
        self
    }

    /// Decode one payload of a known family.
    ///
    /// Returns an error only for malformed hex. A payload whose length matches no
    /// frame kind yields `recognized == false` and no records.
    pub fn decode(
        &self,
        family: Family,
        timestamp: i64,
        device_id: &str,
        payload_hex: &str,
    ) -> Result<Decoded, DecodeError> {
        let payload = decode_payload(payload_hex)?;
        let device_id = normalize_device_id(device_id);
        log_payload_hex(&format!("{family} uplink from {device_id}"), &payload);

        let ctx = FrameContext {
            family,
            timestamp,
            device_id,
            registry: self.registry,
            lookups: self.lookups,
            energy: self.energy,
            settings: &self.settings,
        };

        match decoders::decode_frame(&ctx, &payload)? {
            Some(records) => {
                debug!(
                    "{family} uplink from {} decoded into {} record(s)",
                    ctx.device_id,
                    records.len()
                );
                Ok(Decoded::recognized(records))
            }
            None => {
                let message = format!(
                    "unrecognized {family} payload from {}: {} byte(s) {payload_hex}",
                    ctx.device_id,
                    payload.len()
                );
                if self.allow_unrecognized_log(family, &ctx.device_id) {
                    warn!("{message}");
                } else {
                    debug!("{message}");
                }
                Ok(Decoded::unrecognized())
            }
        }
    }

    fn allow_unrecognized_log(&self, family: Family, device_id: &str) -> bool {
        self.shared_log
            .unwrap_or(&self.local_log)
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .allow(
                &format!("{family}/{device_id}"),
                UNRECOGNIZED_LOG_WINDOW_MS,
                UNRECOGNIZED_LOG_CAP,
            )
    }

    /// Decode a callback body, resolving the family from the registry if needed.
    pub fn decode_uplink(&self, uplink: &Uplink) -> Result<Decoded, DecodeError> {
        let family = self.resolve_family(uplink)?;
        self.decode(family, uplink.time, &uplink.device, &uplink.data)
    }

    pub fn resolve_family(&self, uplink: &Uplink) -> Result<Family, DecodeError> {
        uplink
            .family
            .or_else(|| self.registry.family_of(&uplink.device))
            .ok_or_else(|| {
                DecodeError::UnknownFamily(format!(
                    "device {} is not registered and the callback names no family",
                    uplink.device
                ))
            })
    }
}
