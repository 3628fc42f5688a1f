//! Power meter decoder.
//!
//! Single-phase meters send cumulative energy counters and instantaneous
//! electrical readings. Unlike the distributed I/O AC meter board, energy
//! counters here are never re-baselined.

use crate::constants::STARTUP_FRAME_LEN;
use crate::error::DecodeError;
use crate::payload::codec::{power_factor, scaled_current, scaled_energy, scaled_power};
use crate::payload::record::{DecodedRecord, Measurement, RecordBatch, Tags};
use crate::payload::sentinel::{measured_u16, measured_u8};
use crate::sigfox::decoders::common::{decode_error_stack, decode_startup, voltage_u16};
use crate::sigfox::decoders::FamilyDecoder;
use crate::sigfox::FrameContext;
use crate::util::bits::FrameReader;

pub const ENERGY_FRAME_LEN: usize = 4;
pub const ELECTRICAL_FRAME_LEN: usize = 10;
pub const ERROR_SLOTS: usize = 3;

const FRAME_LENGTHS: &[usize] = &[4, 6, 8, 10];

/// Lowest reportable mains frequency, Hz.
const FREQUENCY_BASE_HZ: f64 = 45.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerMeterFrame {
    Energy,
    ErrorStack,
    Startup,
    Electrical,
}

impl PowerMeterFrame {
    pub fn classify(len: usize) -> Option<Self> {
        match len {
            ENERGY_FRAME_LEN => Some(Self::Energy),
            len if len == ERROR_SLOTS * 2 => Some(Self::ErrorStack),
            STARTUP_FRAME_LEN => Some(Self::Startup),
            ELECTRICAL_FRAME_LEN => Some(Self::Electrical),
            _ => None,
        }
    }
}

/// Mains frequency from its 0.1 Hz offset above 45 Hz.
pub fn frequency_hz(raw: u8) -> f64 {
    FREQUENCY_BASE_HZ + raw as f64 / 10.0
}

fn finish(ctx: &FrameContext<'_>, record: DecodedRecord, tags: &Tags) -> Vec<DecodedRecord> {
    let mut batch = RecordBatch::new();
    batch.push(record);
    batch.push(ctx.last_communication(tags));
    batch.into_records()
}

fn decode_energy(
    ctx: &FrameContext<'_>,
    payload: &[u8],
    tags: &Tags,
) -> Result<Vec<DecodedRecord>, DecodeError> {
    let reader = FrameReader::new(payload);
    let mut record = ctx.record(Measurement::Electrical, tags);
    record.insert_opt("eact", measured_u16(reader.u16(0)?).map(scaled_energy));
    record.insert_opt("eapp", measured_u16(reader.u16(2)?).map(scaled_energy));
    Ok(finish(ctx, record, tags))
}

fn decode_electrical(
    ctx: &FrameContext<'_>,
    payload: &[u8],
    tags: &Tags,
) -> Result<Vec<DecodedRecord>, DecodeError> {
    let reader = FrameReader::new(payload);
    let mut record = ctx.record(Measurement::Electrical, tags);
    record.insert_opt("voltage", voltage_u16(reader.u16(0)?));
    record.insert_opt("current", measured_u16(reader.u16(2)?).map(scaled_current));
    record.insert_opt("active_power", measured_u16(reader.u16(4)?).map(scaled_power));
    record.insert_opt("apparent_power", measured_u16(reader.u16(6)?).map(scaled_power));
    record.insert_opt("power_factor", measured_u8(reader.u8(8)?).map(power_factor));
    record.insert_opt("frequency", measured_u8(reader.u8(9)?).map(frequency_hz));
    Ok(finish(ctx, record, tags))
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PowerMeterDecoder;

impl FamilyDecoder for PowerMeterDecoder {
    fn frame_lengths(&self) -> &'static [usize] {
        FRAME_LENGTHS
    }

    fn decode(
        &self,
        ctx: &FrameContext<'_>,
        payload: &[u8],
    ) -> Result<Option<Vec<DecodedRecord>>, DecodeError> {
        let Some(frame) = PowerMeterFrame::classify(payload.len()) else {
            return Ok(None);
        };
        let tags = ctx.tags();

        let records = match frame {
            PowerMeterFrame::Energy => decode_energy(ctx, payload, &tags)?,
            PowerMeterFrame::ErrorStack => decode_error_stack(ctx, payload, ERROR_SLOTS, &tags)?,
            PowerMeterFrame::Startup => decode_startup(ctx, payload, &tags)?,
            PowerMeterFrame::Electrical => decode_electrical(ctx, payload, &tags)?,
        };
        Ok(Some(records))
    }
}
