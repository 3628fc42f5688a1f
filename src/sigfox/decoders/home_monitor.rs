//! Home/site monitor decoder.
//!
//! An 8-byte uplink is either the shared startup frame or an action log entry;
//! action logs end with the marker 0xA in the low nibble of the last byte.

use crate::constants::{ACTION_LOG_MARKER, STARTUP_FRAME_LEN};
use crate::error::DecodeError;
use crate::payload::record::{DecodedRecord, Measurement, RecordBatch, Tags};
use crate::payload::sentinel::{measured, measured_u16, measured_u32, measured_u8};
use crate::sigfox::decoders::common::{decode_error_stack, decode_startup};
use crate::sigfox::decoders::FamilyDecoder;
use crate::sigfox::FrameContext;
use crate::util::bits::{bits, FrameReader};

pub const MOTION_FRAME_LEN: usize = 1;
pub const AIR_QUALITY_FRAME_LEN: usize = 7;
pub const ERROR_SLOTS: usize = 2;

const FRAME_LENGTHS: &[usize] = &[1, 4, 7, 8];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HomeMonitorFrame {
    Motion,
    ErrorStack,
    AirQuality,
    /// Startup or action log, told apart by the marker nibble.
    Extended,
}

impl HomeMonitorFrame {
    pub fn classify(len: usize) -> Option<Self> {
        match len {
            MOTION_FRAME_LEN => Some(Self::Motion),
            len if len == ERROR_SLOTS * 2 => Some(Self::ErrorStack),
            AIR_QUALITY_FRAME_LEN => Some(Self::AirQuality),
            STARTUP_FRAME_LEN => Some(Self::Extended),
            _ => None,
        }
    }
}

/// Accelerometer event codes.
pub fn event_name(code: u64) -> &'static str {
    match code {
        1 => "motion",
        2 => "shock",
        3 => "free_fall",
        4 => "tilt",
        _ => "unknown",
    }
}

fn decode_motion(ctx: &FrameContext<'_>, raw: u8, tags: &Tags) -> Vec<DecodedRecord> {
    let raw = raw as u64;
    let event = measured(bits(raw, 4, 4), 4);

    let mut record = ctx.record(Measurement::Motion, tags);
    record.insert_opt("event", event);
    record.insert_opt("event_name", event.map(event_name));
    record.insert_opt("intensity", measured(bits(raw, 0, 4), 4));

    let mut batch = RecordBatch::new();
    batch.push(record);
    batch.push(ctx.last_communication(tags));
    batch.into_records()
}

/// Air quality frame (7 bytes).
///
/// ```text
/// b0..b1  TVOC ppb
/// b2..b3  eCO2 ppm
/// b4..b5  AQI UBA (bits 15..13) | AQI-S (bits 12..3) | mode (bits 2..1) | status (bit 0)
/// b6      acquisition duration s
/// ```
fn decode_air_quality(
    ctx: &FrameContext<'_>,
    payload: &[u8],
    tags: &Tags,
) -> Result<Vec<DecodedRecord>, DecodeError> {
    let reader = FrameReader::new(payload);
    let index = reader.u16(4)? as u64;

    let mut record = ctx.record(Measurement::AirQuality, tags);
    record.insert_opt("tvoc", measured_u16(reader.u16(0)?));
    record.insert_opt("eco2", measured_u16(reader.u16(2)?));
    record.insert_opt("aqi_uba", measured(bits(index, 13, 3), 3));
    record.insert_opt("aqi_s", measured(bits(index, 3, 10), 10));
    record.insert("acquisition_mode", bits(index, 1, 2));
    record.insert("acquisition_status", bits(index, 0, 1));
    record.insert_opt("acquisition_duration", measured_u8(reader.u8(6)?));

    let mut batch = RecordBatch::new();
    batch.push(record);
    batch.push(ctx.last_communication(tags));
    Ok(batch.into_records())
}

/// Action log entry (8 bytes).
///
/// ```text
/// b0      action code
/// b1      source
/// b2..b5  argument
/// b6      result
/// b7      sequence (high nibble) | 0xA
/// ```
fn decode_action_log(
    ctx: &FrameContext<'_>,
    payload: &[u8],
    tags: &Tags,
) -> Result<Vec<DecodedRecord>, DecodeError> {
    let reader = FrameReader::new(payload);

    let mut record = ctx.record(Measurement::Metadata, tags);
    record.insert("action_code", reader.u8(0)?);
    record.insert("action_source", reader.u8(1)?);
    record.insert_opt("action_argument", measured_u32(reader.u32(2)?));
    record.insert_opt("action_result", measured_u8(reader.u8(6)?));
    record.insert("action_sequence", reader.u8(7)? >> 4);
    record.insert("last_action", ctx.timestamp);
    Ok(vec![record])
}

fn is_action_log(payload: &[u8]) -> bool {
    payload
        .last()
        .is_some_and(|last| last & 0x0F == ACTION_LOG_MARKER)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct HomeMonitorDecoder;

impl FamilyDecoder for HomeMonitorDecoder {
    fn frame_lengths(&self) -> &'static [usize] {
        FRAME_LENGTHS
    }

    fn decode(
        &self,
        ctx: &FrameContext<'_>,
        payload: &[u8],
    ) -> Result<Option<Vec<DecodedRecord>>, DecodeError> {
        let Some(frame) = HomeMonitorFrame::classify(payload.len()) else {
            return Ok(None);
        };
        let tags = ctx.tags();

        let records = match frame {
            HomeMonitorFrame::Motion => decode_motion(ctx, payload[0], &tags),
            HomeMonitorFrame::ErrorStack => decode_error_stack(ctx, payload, ERROR_SLOTS, &tags)?,
            HomeMonitorFrame::AirQuality => decode_air_quality(ctx, payload, &tags)?,
            HomeMonitorFrame::Extended if is_action_log(payload) => {
                decode_action_log(ctx, payload, &tags)?
            }
            HomeMonitorFrame::Extended => decode_startup(ctx, payload, &tags)?,
        };
        Ok(Some(records))
    }
}
