//! Environmental sensor decoder.
//!
//! The 5-byte sensor frame is packed differently by the two hardware revisions,
//! so the revision registered for the device selects the layout:
//!
//! ```text
//! v2: b0..b1 battery mV | b2 temperature (°C, 8-bit one's complement)
//! v3: b0..b2 battery mV (bits 23..12) | temperature 0.1 °C (bits 11..0, sign bit 11)
//! both: b3 humidity % | b4 status
//! ```

use crate::constants::STARTUP_FRAME_LEN;
use crate::error::DecodeError;
use crate::payload::codec::one_complement_to_signed;
use crate::payload::record::{DecodedRecord, Measurement, RecordBatch, Tags};
use crate::payload::sentinel::{decode_field, measured, measured_u16, measured_u8};
use crate::registry::HardwareRevision;
use crate::sigfox::decoders::common::{decode_error_stack, decode_startup, temperature_u8};
use crate::sigfox::decoders::FamilyDecoder;
use crate::sigfox::FrameContext;
use crate::util::bits::{bits, FrameReader};
use log::warn;

pub const SENSOR_FRAME_LEN: usize = 5;
pub const ERROR_SLOTS: usize = 3;

const FRAME_LENGTHS: &[usize] = &[5, 6, 8];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvSensorFrame {
    Sensor,
    ErrorStack,
    Startup,
}

impl EnvSensorFrame {
    pub fn classify(len: usize) -> Option<Self> {
        match len {
            SENSOR_FRAME_LEN => Some(Self::Sensor),
            len if len == ERROR_SLOTS * 2 => Some(Self::ErrorStack),
            STARTUP_FRAME_LEN => Some(Self::Startup),
            _ => None,
        }
    }
}

fn decode_sensor(
    ctx: &FrameContext<'_>,
    payload: &[u8],
    revision: HardwareRevision,
    tags: &Tags,
) -> Result<Vec<DecodedRecord>, DecodeError> {
    let reader = FrameReader::new(payload);
    let mut record = ctx.record(Measurement::Sensor, tags);

    match revision {
        HardwareRevision::V2 => {
            record.insert_opt("battery_voltage", measured_u16(reader.u16(0)?));
            record.insert_opt("temperature", temperature_u8(reader.u8(2)?));
        }
        HardwareRevision::V3 => {
            let word = reader.u24(0)? as u64;
            record.insert_opt("battery_voltage", measured(bits(word, 12, 12), 12));
            record.insert_opt(
                "temperature",
                decode_field(bits(word, 0, 12), 12, |raw| {
                    one_complement_to_signed(raw as u32, 11) as f64 / 10.0
                }),
            );
        }
    }
    record.insert_opt("humidity", measured_u8(reader.u8(3)?));
    record.insert_opt("status", measured_u8(reader.u8(4)?));

    let mut batch = RecordBatch::new();
    batch.push(record);
    batch.push(ctx.last_communication(tags));
    Ok(batch.into_records())
}

/// Environmental sensor family decoder.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvSensorDecoder;

impl FamilyDecoder for EnvSensorDecoder {
    fn frame_lengths(&self) -> &'static [usize] {
        FRAME_LENGTHS
    }

    fn decode(
        &self,
        ctx: &FrameContext<'_>,
        payload: &[u8],
    ) -> Result<Option<Vec<DecodedRecord>>, DecodeError> {
        let Some(frame) = EnvSensorFrame::classify(payload.len()) else {
            return Ok(None);
        };
        let tags = ctx.tags();

        let records = match frame {
            EnvSensorFrame::Sensor => {
                let Some(revision) = ctx.registry.hardware_revision(&ctx.device_id) else {
                    warn!(
                        "{}: hardware revision unknown, cannot decode sensor frame",
                        ctx.device_id
                    );
                    return Ok(None);
                };
                decode_sensor(ctx, payload, revision, &tags)?
            }
            EnvSensorFrame::ErrorStack => decode_error_stack(ctx, payload, ERROR_SLOTS, &tags)?,
            EnvSensorFrame::Startup => decode_startup(ctx, payload, &tags)?,
        };
        Ok(Some(records))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::record::FieldValue;
    use crate::registry::{DeviceEntry, DeviceRegistry, Family, StaticLookups};
    use crate::sigfox::decoders::testing::{
        assert_only_last_communication, decode, decode_with, find,
    };

    fn registry() -> DeviceRegistry {
        DeviceRegistry::from_entries([
            DeviceEntry::new("E20001", Family::EnvSensor)
                .with_tag("asset", "cold-room")
                .with_revision(HardwareRevision::V2),
            DeviceEntry::new("E30001", Family::EnvSensor)
                .with_tag("asset", "server-room")
                .with_revision(HardwareRevision::V3),
            DeviceEntry::new("E00001", Family::EnvSensor).with_tag("asset", "attic"),
        ])
        .unwrap()
    }

    fn decode_for(device_id: &str, hex: &str) -> crate::sigfox::Decoded {
        decode_with(Family::EnvSensor, &registry(), &StaticLookups::new(), device_id, hex)
    }

    #[test]
    fn test_v2_sensor_frame() {
        let decoded = decode_for("E20001", "0bb8963201");
        let sensor = find(&decoded.records, Measurement::Sensor);
        assert_eq!(sensor.tag("hw_revision"), Some("v2"));
        assert_eq!(sensor.tag("asset"), Some("cold-room"));
        assert_eq!(sensor.field("battery_voltage"), Some(&FieldValue::Int(3000)));
        assert_eq!(sensor.field("temperature"), Some(&FieldValue::Int(-22)));
        assert_eq!(sensor.field("humidity"), Some(&FieldValue::Int(50)));
        assert_eq!(sensor.field("status"), Some(&FieldValue::Int(1)));
    }

    #[test]
    fn test_v3_sensor_frame() {
        // 3600 mV, -12.5 °C
        let decoded = decode_for("E30001", "e1087d3200");
        let sensor = find(&decoded.records, Measurement::Sensor);
        assert_eq!(sensor.tag("hw_revision"), Some("v3"));
        assert_eq!(sensor.field("battery_voltage"), Some(&FieldValue::Int(3600)));
        assert_eq!(sensor.field("temperature"), Some(&FieldValue::Float(-12.5)));
        assert_eq!(sensor.field("humidity"), Some(&FieldValue::Int(50)));
        assert_eq!(sensor.field("status"), Some(&FieldValue::Int(0)));
    }

    #[test]
    fn test_same_bytes_differ_per_revision() {
        let v2 = decode_for("E20001", "0e10fa3200");
        let v3 = decode_for("E30001", "0e10fa3200");
        let v2 = find(&v2.records, Measurement::Sensor);
        let v3 = find(&v3.records, Measurement::Sensor);
        assert_eq!(v2.field("battery_voltage"), Some(&FieldValue::Int(3600)));
        assert_eq!(v3.field("battery_voltage"), Some(&FieldValue::Int(225)));
    }

    #[test]
    fn test_sentinels_per_revision() {
        assert_only_last_communication(&decode_for("E20001", "ffffffffff"));
        assert_only_last_communication(&decode_for("E30001", "ffffffffff"));
    }

    #[test]
    fn test_unknown_revision() {
        let decoded = decode_for("E00001", "0bb8963201");
        assert!(!decoded.recognized);
        assert!(decoded.records.is_empty());

        // Unregistered devices cannot be decoded either, but startup still works.
        assert!(!decode(Family::EnvSensor, "0bb8963201").recognized);
        assert!(decode_for("E00001", "0102030400000010").recognized);
    }

    #[test]
    fn test_error_stack_three_slots() {
        let decoded = decode_for("E20001", "000000000007");
        assert_eq!(decoded.records.len(), 1);
        assert_eq!(decoded.records[0].timestamp, crate::sigfox::decoders::testing::T0 + 2);
    }
}
