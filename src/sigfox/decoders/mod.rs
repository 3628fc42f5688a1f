//! Per-family frame decoders.
//!
//! Every family dispatches on the exact payload length; within one family no two
//! frame kinds share a length, and a length outside the table is reported as
//! unrecognized rather than guessed. Distributed I/O nodes add a second level:
//! a 2-byte header names the board type, whose own table selects the frame.

pub mod asset_tracker;
pub mod clock_beacon;
pub mod common;
pub mod distributed_io;
pub mod env_sensor;
pub mod home_monitor;
pub mod power_meter;
pub mod power_supply;
pub mod weather;

use crate::error::DecodeError;
use crate::payload::record::DecodedRecord;
use crate::registry::Family;
use crate::sigfox::FrameContext;

pub use asset_tracker::AssetTrackerDecoder;
pub use clock_beacon::ClockBeaconDecoder;
pub use distributed_io::{BoardType, DistributedIoDecoder};
pub use env_sensor::EnvSensorDecoder;
pub use home_monitor::HomeMonitorDecoder;
pub use power_meter::PowerMeterDecoder;
pub use power_supply::PowerSupplyDecoder;
pub use weather::WeatherDecoder;

/// Trait implemented by each family decoder.
pub trait FamilyDecoder {
    /// Payload lengths this family dispatches on, ascending.
    ///
    /// Empty for distributed I/O, whose table depends on the board type
    /// (see [`BoardType::body_lengths`]).
    fn frame_lengths(&self) -> &'static [usize];

    /// Decode one payload; `Ok(None)` when no frame kind matches.
    fn decode(
        &self,
        ctx: &FrameContext<'_>,
        payload: &[u8],
    ) -> Result<Option<Vec<DecodedRecord>>, DecodeError>;
}

/// Decoder of a family.
pub fn decoder_for(family: Family) -> &'static dyn FamilyDecoder {
    match family {
        Family::Weather => &WeatherDecoder,
        Family::PowerSupply => &PowerSupplyDecoder,
        Family::EnvSensor => &EnvSensorDecoder,
        Family::AssetTracker => &AssetTrackerDecoder,
        Family::DistributedIo => &DistributedIoDecoder,
        Family::HomeMonitor => &HomeMonitorDecoder,
        Family::PowerMeter => &PowerMeterDecoder,
        Family::ClockBeacon => &ClockBeaconDecoder,
    }
}

/// Decode a payload with the decoder of `ctx.family`.
pub fn decode_frame(
    ctx: &FrameContext<'_>,
    payload: &[u8],
) -> Result<Option<Vec<DecodedRecord>>, DecodeError> {
    if payload.is_empty() {
        return Ok(None);
    }
    decoder_for(ctx.family).decode(ctx, payload)
}
