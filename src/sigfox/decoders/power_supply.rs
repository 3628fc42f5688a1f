//! Power-supply monitor decoder.

use crate::error::DecodeError;
use crate::payload::record::{DecodedRecord, Measurement, RecordBatch, Tags};
use crate::payload::sentinel::{measured, measured_u16, measured_u24, measured_u8};
use crate::sigfox::decoders::common::{decode_error_stack, temperature_u8};
use crate::sigfox::decoders::FamilyDecoder;
use crate::sigfox::FrameContext;
use crate::util::bits::{bits, FrameReader};
use log::warn;

pub const START_STOP_FRAME_LEN: usize = 1;
pub const MONITORING_FRAME_LEN: usize = 9;
pub const ERROR_SLOTS: usize = 4;

const FRAME_LENGTHS: &[usize] = &[1, 8, 9];

const EVENT_SHUTDOWN: u8 = 0x00;
const EVENT_STARTUP: u8 = 0x01;

/// Frame kinds of a power-supply monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerSupplyFrame {
    StartStop,
    ErrorStack,
    Monitoring,
}

impl PowerSupplyFrame {
    pub fn classify(len: usize) -> Option<Self> {
        match len {
            START_STOP_FRAME_LEN => Some(Self::StartStop),
            len if len == ERROR_SLOTS * 2 => Some(Self::ErrorStack),
            MONITORING_FRAME_LEN => Some(Self::Monitoring),
            _ => None,
        }
    }
}

/// Output power in nW from mV and µA.
pub fn output_power(voltage_mv: u64, current_ua: u64) -> u64 {
    voltage_mv * current_ua
}

fn decode_start_stop(
    ctx: &FrameContext<'_>,
    event: u8,
    tags: &Tags,
) -> Option<Vec<DecodedRecord>> {
    let field = match event {
        EVENT_SHUTDOWN => "last_shutdown",
        EVENT_STARTUP => "last_startup",
        other => {
            warn!("{}: unknown start/stop event 0x{other:02x}", ctx.device_id);
            return None;
        }
    };
    Some(vec![ctx
        .record(Measurement::Metadata, tags)
        .with_field(field, ctx.timestamp)])
}

/// Monitoring frame (9 bytes).
///
/// ```text
/// b0..b1  current sense range (bits 15..14) | output voltage mV (bits 13..0)
/// b2      output status
/// b3..b5  output current µA
/// b6..b7  MCU voltage mV
/// b8      MCU temperature, one's complement °C
/// ```
fn decode_monitoring(
    ctx: &FrameContext<'_>,
    payload: &[u8],
    tags: &Tags,
) -> Result<Vec<DecodedRecord>, DecodeError> {
    let reader = FrameReader::new(payload);
    let word = reader.u16(0)? as u64;
    let voltage = measured(bits(word, 0, 14), 14);
    let current = measured_u24(reader.u24(3)?).map(u64::from);

    let mut record = ctx.record(Measurement::Monitoring, tags);
    record.insert_opt("output_voltage", voltage);
    record.insert("current_sense_range", bits(word, 14, 2));
    record.insert_opt("output_status", measured_u8(reader.u8(2)?));
    record.insert_opt("output_current", current);
    record.insert_opt("mcu_voltage", measured_u16(reader.u16(6)?));
    record.insert_opt("mcu_temperature", temperature_u8(reader.u8(8)?));
    if let (Some(voltage), Some(current)) = (voltage, current) {
        record.insert("output_power", output_power(voltage, current));
    }

    let mut batch = RecordBatch::new();
    batch.push(record);
    batch.push(ctx.last_communication(tags));
    Ok(batch.into_records())
}

/// Power-supply monitor family decoder.
#[derive(Debug, Clone, Copy, Default)]
pub struct PowerSupplyDecoder;

impl FamilyDecoder for PowerSupplyDecoder {
    fn frame_lengths(&self) -> &'static [usize] {
        FRAME_LENGTHS
    }

    fn decode(
        &self,
        ctx: &FrameContext<'_>,
        payload: &[u8],
    ) -> Result<Option<Vec<DecodedRecord>>, DecodeError> {
        let Some(frame) = PowerSupplyFrame::classify(payload.len()) else {
            return Ok(None);
        };
        let tags = ctx.tags();

        match frame {
            PowerSupplyFrame::StartStop => Ok(decode_start_stop(ctx, payload[0], &tags)),
            PowerSupplyFrame::ErrorStack => {
                decode_error_stack(ctx, payload, ERROR_SLOTS, &tags).map(Some)
            }
            PowerSupplyFrame::Monitoring => decode_monitoring(ctx, payload, &tags).map(Some),
        }
    }
}
