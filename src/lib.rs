//! # sigfox-rs - A Rust Crate for Decoding Sigfox Uplink Callbacks
//!
//! The sigfox-rs crate turns the hex payloads that Sigfox end-points send through
//! the backend's data callbacks into time-series records, tagged with the device's
//! identity and deployment metadata.
//!
//! ## Features
//!
//! - Fixed-layout frame decoders for eight device families (weather stations,
//!   power-supply monitors, environmental sensors, asset trackers, distributed I/O
//!   nodes, home monitors, power meters and clock beacons)
//! - Shared startup, error-stack, monitoring and geolocation frames
//! - Numeric codecs for one's complement temperatures, unit-scaled voltage,
//!   current, power and energy, power factor, coordinates and sea-level pressure
//! - A uniform "not measured" sentinel policy: all-ones raw values never reach a codec
//! - Device registry with placeholder tags for unregistered devices
//! - Daily energy counter baselines for distributed I/O AC meters
//! - Line protocol and JSON-lines output
//!
//! ## Usage
//!
//! ```rust
//! use sigfox_rs::{
//!     DecoderSettings, DeviceEntry, DeviceRegistry, EnergyResetTracker, Family,
//!     NoLookups, UplinkDecoder,
//! };
//!
//! let registry = DeviceRegistry::from_entries([DeviceEntry::new("1A2B3C", Family::PowerSupply)
//!     .with_tag("rack", "R12")
//!     .with_tag("system", "core")])
//! .unwrap();
//! let energy = EnergyResetTracker::new();
//! let decoder = UplinkDecoder::new(&registry, &NoLookups, &energy, DecoderSettings::default());
//!
//! let decoded = decoder
//!     .decode(Family::PowerSupply, 1_700_000_000, "1A2B3C", "2fa302063bad0d5f1d")
//!     .unwrap();
//! assert!(decoded.recognized);
//! assert_eq!(decoded.records.len(), 2);
//! ```

pub mod constants;
pub mod error;
pub mod logging;
pub mod payload;
pub mod registry;
pub mod sigfox;
pub mod sink;
pub mod util;

pub use crate::error::DecodeError;
pub use crate::logging::{init_logger, log_info};

// Record model
pub use payload::{DecodedRecord, FieldValue, Measurement, Tags};

// Registry and configuration
pub use registry::{
    DecoderConfig, DecoderSettings, DeviceEntry, DeviceRegistry, Family, HardwareRevision,
    StaticLookups,
};

// Decoding
pub use sigfox::decoders::{decoder_for, BoardType, FamilyDecoder};
pub use sigfox::{
    ChannelKey, Decoded, EnergyResetTracker, FirmwareVersion, NoLookups, SideChannel, Uplink,
    UplinkDecoder,
};

// Output
pub use sink::{JsonLinesSink, LineProtocolSink, MemorySink, RecordSink};
