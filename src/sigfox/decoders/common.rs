//! Frames shared by several families.
//!
//! Each function decodes one frame of an already length-checked payload and
//! returns its records. Tags are passed in because distributed I/O nodes tag their
//! records per node rather than per device.

use crate::constants::{
    ERROR_SLOT_LEN, GEOLOC_TIMEOUT_V1_LEN, GEOLOC_TIMEOUT_V2_LEN, GEOLOC_TIMEOUT_V3_LEN,
};
use crate::error::DecodeError;
use crate::payload::codec::{coordinate_from_word, one_complement_to_signed, scaled_voltage};
use crate::payload::record::{DecodedRecord, Measurement, RecordBatch, Tags};
use crate::payload::sentinel::{measured_u16, measured_u32, measured_u8};
use crate::sigfox::FrameContext;
use crate::util::bits::FrameReader;
use bitflags::bitflags;
use log::debug;
use nom::{multi::count, number::complete::be_u16, IResult};

bitflags! {
    /// Reset causes reported in byte 0 of the startup frame.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ResetFlags: u8 {
        const POWER_ON = 0x01;
        const BROWN_OUT = 0x02;
        const WATCHDOG = 0x04;
        const SOFTWARE = 0x08;
        const EXTERNAL_PIN = 0x10;
        const LOCKUP = 0x20;
    }
}

impl ResetFlags {
    /// `"power_on|watchdog"`, or `"none"` when no known flag is set.
    pub fn describe(&self) -> String {
        let names: Vec<&str> = self
            .iter_names()
            .map(|(name, _)| name)
            .collect();
        if names.is_empty() {
            "none".to_string()
        } else {
            names.join("|").to_ascii_lowercase()
        }
    }
}

/// One's complement 8-bit temperature, `None` on the 0xFF sentinel.
pub fn temperature_u8(raw: u8) -> Option<i32> {
    measured_u8(raw).map(|raw| one_complement_to_signed(raw as u32, 7))
}

/// Scaled voltage in mV, `None` on the 0xFFFF sentinel.
pub fn voltage_u16(raw: u16) -> Option<u32> {
    measured_u16(raw).map(scaled_voltage)
}

/// Semantic version string of a startup frame.
pub fn sw_version(major: u8, minor: u8, commit_index: u8, dirty: bool) -> String {
    let mut version = format!("sw{major}.{minor}.{commit_index}");
    if dirty {
        version.push_str(".dev");
    }
    version
}

/// Startup frame (8 bytes).
///
/// ```text
/// b0      reset flags
/// b1 b2   major, minor
/// b3      commit index
/// b4..b7  commit id (upper 28 bits), dirty flag (low nibble of b7)
/// ```
pub fn decode_startup(
    ctx: &FrameContext<'_>,
    payload: &[u8],
    tags: &Tags,
) -> Result<Vec<DecodedRecord>, DecodeError> {
    let reader = FrameReader::new(payload);
    let reset_flags = reader.u8(0)?;
    let major = reader.u8(1)?;
    let minor = reader.u8(2)?;
    let commit_index = reader.u8(3)?;
    let tail = reader.u32(4)?;
    let commit_id = tail >> 4;
    let dirty = tail & 0x0F != 0;

    let cause = ResetFlags::from_bits_truncate(reset_flags);
    debug!(
        "{} startup: reset {} firmware {major}.{minor}.{commit_index}",
        ctx.device_id,
        cause.describe()
    );

    let record = ctx
        .record(Measurement::Metadata, tags)
        .with_field("reset_flags", reset_flags)
        .with_field("reset_cause", cause.describe())
        .with_field("sw_major", major)
        .with_field("sw_minor", minor)
        .with_field("sw_commit_index", commit_index)
        .with_field("sw_commit_id", format!("{commit_id:07x}"))
        .with_field("sw_dirty", dirty as u8)
        .with_field("sw_version", sw_version(major, minor, commit_index, dirty))
        .with_field("last_startup", ctx.timestamp);

    Ok(vec![record])
}

fn error_slots(input: &[u8], slots: usize) -> IResult<&[u8], Vec<u16>> {
    count(be_u16, slots)(input)
}

/// Error-stack frame: `slots` big-endian u16 codes, most recent first.
///
/// Every non-zero code becomes its own record at `timestamp + slot`, which keeps
/// the stack order in a store keyed by time. Zero slots are empty, as are slots
/// whose timestamp would overflow.
pub fn decode_error_stack(
    ctx: &FrameContext<'_>,
    payload: &[u8],
    slots: usize,
    tags: &Tags,
) -> Result<Vec<DecodedRecord>, DecodeError> {
    if payload.len() != slots * ERROR_SLOT_LEN {
        return Err(DecodeError::Truncated {
            offset: 0,
            size: slots * ERROR_SLOT_LEN,
            actual: payload.len(),
        });
    }

    let (_, codes) = error_slots(payload, slots)?;

    let records = codes
        .iter()
        .enumerate()
        .filter(|(_, code)| **code != 0)
        .filter_map(|(slot, code)| {
            let timestamp = ctx.timestamp.checked_add(slot as i64)?;
            let record = DecodedRecord::new(Measurement::Metadata, timestamp, tags.clone());
            Some(record.with_field("error", *code))
        })
        .collect();

    Ok(records)
}

/// Board monitoring frame (7 bytes), shared by weather stations and asset trackers.
pub fn decode_monitoring(
    ctx: &FrameContext<'_>,
    payload: &[u8],
    tags: &Tags,
) -> Result<Vec<DecodedRecord>, DecodeError> {
    let reader = FrameReader::new(payload);

    let mut record = ctx.record(Measurement::Monitoring, tags);
    record.insert_opt("mcu_temperature", temperature_u8(reader.u8(0)?));
    record.insert_opt("board_humidity", measured_u8(reader.u8(1)?));
    record.insert_opt("source_voltage", voltage_u16(reader.u16(2)?));
    record.insert_opt("storage_voltage", voltage_u16(reader.u16(4)?));
    record.insert_opt("status", measured_u8(reader.u8(6)?));

    let mut batch = RecordBatch::new();
    batch.push(record);
    batch.push(ctx.last_communication(tags));
    Ok(batch.into_records())
}

/// Geolocation frame (11 bytes): latitude word, longitude word, altitude, duration.
pub fn decode_geolocation(
    ctx: &FrameContext<'_>,
    payload: &[u8],
    tags: &Tags,
) -> Result<Vec<DecodedRecord>, DecodeError> {
    let reader = FrameReader::new(payload);

    let mut record = ctx.record(Measurement::Geolocation, tags);
    record.insert_opt("latitude", measured_u32(reader.u32(0)?).map(coordinate_from_word));
    record.insert_opt("longitude", measured_u32(reader.u32(4)?).map(coordinate_from_word));
    record.insert_opt("altitude", measured_u16(reader.u16(8)?));
    record.insert_opt("acquisition_duration", measured_u8(reader.u8(10)?));

    let mut batch = RecordBatch::new();
    batch.push(record);
    batch.push(ctx.last_communication(tags));
    Ok(batch.into_records())
}

/// Geolocation timeout, in any of its three historical formats.
///
/// | bytes | layout |
/// |---|---|
/// | 1 | duration |
/// | 2 | 8-bit error, duration |
/// | 3 | 16-bit error, duration |
///
/// The oldest format has no error code; it is stored as 0.
pub fn decode_geoloc_timeout(
    ctx: &FrameContext<'_>,
    payload: &[u8],
    tags: &Tags,
) -> Result<Vec<DecodedRecord>, DecodeError> {
    let reader = FrameReader::new(payload);

    let (error, duration) = match payload.len() {
        GEOLOC_TIMEOUT_V1_LEN => (Some(0u16), reader.u8(0)?),
        GEOLOC_TIMEOUT_V2_LEN => (measured_u8(reader.u8(0)?).map(u16::from), reader.u8(1)?),
        GEOLOC_TIMEOUT_V3_LEN => (measured_u16(reader.u16(0)?), reader.u8(2)?),
        other => {
            return Err(DecodeError::Truncated {
                offset: 0,
                size: GEOLOC_TIMEOUT_V3_LEN,
                actual: other,
            })
        }
    };

    let mut record = ctx.record(Measurement::Geolocation, tags);
    record.insert_opt("timeout_duration", measured_u8(duration));
    record.insert_opt("timeout_error", error);

    let mut batch = RecordBatch::new();
    batch.push(record);
    batch.push(ctx.last_communication(tags));
    Ok(batch.into_records())
}
