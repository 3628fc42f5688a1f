//! Clock beacon decoder.
//!
//! Beacons keep a local clock disciplined by downlinks. They acknowledge each
//! downlink and periodically report their time so the drift against the
//! network timestamp can be tracked.

use crate::constants::STARTUP_FRAME_LEN;
use crate::error::DecodeError;
use crate::payload::codec::one_complement_to_signed;
use crate::payload::record::{DecodedRecord, Measurement, RecordBatch, Tags};
use crate::payload::sentinel::{measured_u16, measured_u32, measured_u8};
use crate::sigfox::decoders::common::{decode_error_stack, decode_startup};
use crate::sigfox::decoders::FamilyDecoder;
use crate::sigfox::FrameContext;
use crate::util::bits::FrameReader;

pub const DOWNLINK_ACK_FRAME_LEN: usize = 3;
pub const SYNCHRO_FRAME_LEN: usize = 5;
pub const ERROR_SLOTS: usize = 1;

const FRAME_LENGTHS: &[usize] = &[2, 3, 5, 8];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockBeaconFrame {
    ErrorStack,
    DownlinkAck,
    Synchro,
    Startup,
}

impl ClockBeaconFrame {
    pub fn classify(len: usize) -> Option<Self> {
        match len {
            len if len == ERROR_SLOTS * 2 => Some(Self::ErrorStack),
            DOWNLINK_ACK_FRAME_LEN => Some(Self::DownlinkAck),
            SYNCHRO_FRAME_LEN => Some(Self::Synchro),
            STARTUP_FRAME_LEN => Some(Self::Startup),
            _ => None,
        }
    }
}

fn decode_downlink_ack(
    ctx: &FrameContext<'_>,
    payload: &[u8],
    tags: &Tags,
) -> Result<Vec<DecodedRecord>, DecodeError> {
    let reader = FrameReader::new(payload);
    let mut record = ctx.record(Measurement::Downlink, tags);
    record.insert_opt("downlink_sequence", measured_u16(reader.u16(0)?));
    record.insert_opt("downlink_status", measured_u8(reader.u8(2)?));

    let mut batch = RecordBatch::new();
    batch.push(record);
    batch.push(ctx.last_communication(tags));
    Ok(batch.into_records())
}

/// Synchro frame: device clock (u32, epoch seconds) and the last applied
/// correction in seconds (8-bit one's complement).
fn decode_synchro(
    ctx: &FrameContext<'_>,
    payload: &[u8],
    tags: &Tags,
) -> Result<Vec<DecodedRecord>, DecodeError> {
    let reader = FrameReader::new(payload);
    let device_time = measured_u32(reader.u32(0)?);

    let mut record = ctx.record(Measurement::Synchro, tags);
    record.insert_opt("device_time", device_time);
    record.insert_opt(
        "applied_correction",
        measured_u8(reader.u8(4)?).map(|raw| one_complement_to_signed(raw as u32, 7)),
    );
    record.insert_opt(
        "clock_offset",
        device_time.and_then(|time| (time as i64).checked_sub(ctx.timestamp)),
    );

    let mut batch = RecordBatch::new();
    batch.push(record);
    batch.push(ctx.last_communication(tags));
    Ok(batch.into_records())
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ClockBeaconDecoder;

impl FamilyDecoder for ClockBeaconDecoder {
    fn frame_lengths(&self) -> &'static [usize] {
        FRAME_LENGTHS
    }

    fn decode(
        &self,
        ctx: &FrameContext<'_>,
        payload: &[u8],
    ) -> Result<Option<Vec<DecodedRecord>>, DecodeError> {
        let Some(frame) = ClockBeaconFrame::classify(payload.len()) else {
            return Ok(None);
        };
        let tags = ctx.tags();

        let records = match frame {
            ClockBeaconFrame::ErrorStack => decode_error_stack(ctx, payload, ERROR_SLOTS, &tags)?,
            ClockBeaconFrame::DownlinkAck => decode_downlink_ack(ctx, payload, &tags)?,
            ClockBeaconFrame::Synchro => decode_synchro(ctx, payload, &tags)?,
            ClockBeaconFrame::Startup => decode_startup(ctx, payload, &tags)?,
        };
        Ok(Some(records))
    }
}
