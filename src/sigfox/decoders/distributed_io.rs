//! Distributed I/O node decoder.
//!
//! A node is a bus of I/O boards behind one Sigfox modem. Every uplink starts
//! with a 2-byte header naming the sending board:
//!
//! ```text
//! b0  node address
//! b1  board type
//! b2  body ...
//! ```
//!
//! The body length then selects the frame within that board type. Records carry
//! the node's tags plus `board_id`, and per-channel readings add `channel`.
//!
//! AC meter energy frames drive the daily counter reset held by
//! [`EnergyResetTracker`](crate::sigfox::EnergyResetTracker).

use crate::error::DecodeError;
use crate::payload::codec::{
    one_complement_to_signed, power_factor, scaled_current, scaled_energy, scaled_power,
};
use crate::payload::record::{DecodedRecord, FieldValue, Measurement, RecordBatch, Tags};
use crate::payload::sentinel::{decode_field, measured_u16, measured_u32, measured_u8};
use crate::sigfox::decoders::common::{
    decode_error_stack, decode_startup, temperature_u8, voltage_u16,
};
use crate::sigfox::decoders::FamilyDecoder;
use crate::sigfox::{ChannelKey, FrameContext};
use crate::util::bits::{bits, FrameReader};
use log::{debug, warn};
use nom::{number::complete::be_u8, sequence::tuple, IResult};
use std::fmt;

pub const HEADER_LEN: usize = 2;
pub const CONTROLLER_ERROR_SLOTS: usize = 5;

const RELAY_COUNT: u32 = 4;
const DIGITAL_INPUT_COUNT: u32 = 6;

/// Board types that can sit on a distributed I/O node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoardType {
    Controller,
    Relay,
    DigitalInput,
    AnalogInput,
    AnalogOutput,
    DcMeter,
    AcMeter,
    Temperature,
    Environment,
    Battery,
    PulseCounter,
}

impl BoardType {
    pub const ALL: [BoardType; 11] = [
        BoardType::Controller,
        BoardType::Relay,
        BoardType::DigitalInput,
        BoardType::AnalogInput,
        BoardType::AnalogOutput,
        BoardType::DcMeter,
        BoardType::AcMeter,
        BoardType::Temperature,
        BoardType::Environment,
        BoardType::Battery,
        BoardType::PulseCounter,
    ];

    pub fn from_id(id: u8) -> Option<Self> {
        Self::ALL.iter().copied().find(|board| board.id() == id)
    }

    /// Board type byte of the header.
    pub fn id(&self) -> u8 {
        match self {
            BoardType::Controller => 0x01,
            BoardType::Relay => 0x02,
            BoardType::DigitalInput => 0x03,
            BoardType::AnalogInput => 0x04,
            BoardType::AnalogOutput => 0x05,
            BoardType::DcMeter => 0x06,
            BoardType::AcMeter => 0x07,
            BoardType::Temperature => 0x08,
            BoardType::Environment => 0x09,
            BoardType::Battery => 0x0A,
            BoardType::PulseCounter => 0x0B,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            BoardType::Controller => "controller",
            BoardType::Relay => "relay",
            BoardType::DigitalInput => "digital_input",
            BoardType::AnalogInput => "analog_input",
            BoardType::AnalogOutput => "analog_output",
            BoardType::DcMeter => "dc_meter",
            BoardType::AcMeter => "ac_meter",
            BoardType::Temperature => "temperature",
            BoardType::Environment => "environment",
            BoardType::Battery => "battery",
            BoardType::PulseCounter => "pulse_counter",
        }
    }

    /// Body lengths (after the header) this board type sends, ascending.
    pub fn body_lengths(&self) -> &'static [usize] {
        match self {
            BoardType::Controller => &[5, 8, 10],
            BoardType::Relay => &[1, 3],
            BoardType::DigitalInput => &[1, 8],
            BoardType::AnalogInput => &[8],
            BoardType::AnalogOutput => &[4],
            BoardType::DcMeter => &[6],
            BoardType::AcMeter => &[5, 9],
            BoardType::Temperature => &[4, 8],
            BoardType::Environment => &[5, 7],
            BoardType::Battery => &[6],
            BoardType::PulseCounter => &[8],
        }
    }

    /// Frame of this board type carried by a body of `len` bytes.
    pub fn classify(&self, len: usize) -> Option<BoardFrame> {
        let frame = match (self, len) {
            (BoardType::Controller, 5) => BoardFrame::ControllerMonitoring,
            (BoardType::Controller, 8) => BoardFrame::ControllerStartup,
            (BoardType::Controller, 10) => BoardFrame::ControllerErrors,
            (BoardType::Relay, 1) => BoardFrame::RelayStatus,
            (BoardType::Relay, 3) => BoardFrame::RelayMonitoring,
            (BoardType::DigitalInput, 1) => BoardFrame::InputStatus,
            (BoardType::DigitalInput, 8) => BoardFrame::InputCounters,
            (BoardType::AnalogInput, 8) => BoardFrame::AnalogCurrents,
            (BoardType::AnalogOutput, 4) => BoardFrame::AnalogOutputs,
            (BoardType::DcMeter, 6) => BoardFrame::DcElectrical,
            (BoardType::AcMeter, 5) => BoardFrame::AcEnergy,
            (BoardType::AcMeter, 9) => BoardFrame::AcElectrical,
            (BoardType::Temperature, 4) => BoardFrame::Temperatures,
            (BoardType::Temperature, 8) => BoardFrame::FineTemperatures,
            (BoardType::Environment, 5) => BoardFrame::Environment,
            (BoardType::Environment, 7) => BoardFrame::EnvironmentCo2,
            (BoardType::Battery, 6) => BoardFrame::Battery,
            (BoardType::PulseCounter, 8) => BoardFrame::PulseCounters,
            _ => return None,
        };
        Some(frame)
    }
}

impl fmt::Display for BoardType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Every frame a board can send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardFrame {
    ControllerMonitoring,
    ControllerStartup,
    ControllerErrors,
    RelayStatus,
    RelayMonitoring,
    InputStatus,
    InputCounters,
    AnalogCurrents,
    AnalogOutputs,
    DcElectrical,
    AcEnergy,
    AcElectrical,
    Temperatures,
    FineTemperatures,
    Environment,
    EnvironmentCo2,
    Battery,
    PulseCounters,
}

fn header(input: &[u8]) -> IResult<&[u8], (u8, u8)> {
    tuple((be_u8, be_u8))(input)
}

/// Decoding state of one node frame.
struct NodeFrame<'c, 'a> {
    ctx: &'c FrameContext<'a>,
    node_address: u8,
    tags: Tags,
    batch: RecordBatch,
}

impl NodeFrame<'_, '_> {
    fn record(&self, measurement: Measurement) -> DecodedRecord {
        self.ctx.record(measurement, &self.tags)
    }

    fn channel_record(&self, measurement: Measurement, channel: u8) -> DecodedRecord {
        self.record(measurement)
            .with_tag("channel", channel.to_string())
    }

    /// One record per channel holding `field`; sentinel channels are dropped.
    fn per_channel<V: Into<FieldValue>>(
        &mut self,
        measurement: Measurement,
        field: &str,
        values: impl IntoIterator<Item = Option<V>>,
    ) {
        for (channel, value) in values.into_iter().enumerate() {
            let mut record = self.channel_record(measurement, channel as u8);
            record.insert_opt(field, value);
            self.batch.push(record);
        }
    }

    /// Records of a data frame followed by `last_communication`.
    fn finish(mut self) -> Vec<DecodedRecord> {
        let last = self.ctx.last_communication(&self.tags);
        self.batch.push(last);
        self.batch.into_records()
    }

    fn decode(mut self, frame: BoardFrame, body: &[u8]) -> Result<Vec<DecodedRecord>, DecodeError> {
        let reader = FrameReader::new(body);

        match frame {
            BoardFrame::ControllerStartup => return decode_startup(self.ctx, body, &self.tags),
            BoardFrame::ControllerErrors => {
                return decode_error_stack(self.ctx, body, CONTROLLER_ERROR_SLOTS, &self.tags)
            }
            BoardFrame::ControllerMonitoring => {
                let mut record = self.record(Measurement::Monitoring);
                record.insert_opt("mcu_temperature", temperature_u8(reader.u8(0)?));
                record.insert_opt("supply_voltage", voltage_u16(reader.u16(1)?));
                record.insert_opt("status", measured_u8(reader.u8(3)?));
                record.insert_opt("uptime_days", measured_u8(reader.u8(4)?));
                self.batch.push(record);
            }
            BoardFrame::RelayStatus => {
                let mut record = self.record(Measurement::Monitoring);
                if let Some(states) = measured_u8(reader.u8(0)?) {
                    for relay in 0..RELAY_COUNT {
                        record.insert(
                            &format!("relay_{}", relay + 1),
                            bits(states as u64, relay, 1),
                        );
                    }
                }
                self.batch.push(record);
            }
            BoardFrame::RelayMonitoring => {
                let mut record = self.record(Measurement::Monitoring);
                record.insert_opt("coil_voltage", voltage_u16(reader.u16(0)?));
                record.insert_opt("board_temperature", temperature_u8(reader.u8(2)?));
                self.batch.push(record);
            }
            BoardFrame::InputStatus => {
                let mut record = self.record(Measurement::Monitoring);
                if let Some(states) = measured_u8(reader.u8(0)?) {
                    for input in 0..DIGITAL_INPUT_COUNT {
                        record.insert(
                            &format!("input_{}", input + 1),
                            bits(states as u64, input, 1),
                        );
                    }
                }
                self.batch.push(record);
            }
            BoardFrame::InputCounters => {
                let counts = (0..4)
                    .map(|channel| reader.u16(channel * 2).map(measured_u16))
                    .collect::<Result<Vec<_>, _>>()?;
                self.per_channel(Measurement::Sensor, "pulse_count", counts);
            }
            BoardFrame::AnalogCurrents => {
                let currents = (0..4)
                    .map(|channel| {
                        reader
                            .u16(channel * 2)
                            .map(|raw| measured_u16(raw).map(scaled_current))
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                self.per_channel(Measurement::Sensor, "current", currents);
            }
            BoardFrame::AnalogOutputs => {
                let voltages = (0..2)
                    .map(|channel| reader.u16(channel * 2).map(voltage_u16))
                    .collect::<Result<Vec<_>, _>>()?;
                self.per_channel(Measurement::Monitoring, "output_voltage", voltages);
            }
            BoardFrame::DcElectrical => {
                let mut record = self.record(Measurement::Electrical);
                record.insert_opt("voltage", voltage_u16(reader.u16(0)?));
                record.insert_opt("current", measured_u16(reader.u16(2)?).map(scaled_current));
                record.insert_opt("power", measured_u16(reader.u16(4)?).map(scaled_power));
                self.batch.push(record);
            }
            BoardFrame::AcElectrical => {
                let mut record = self.record(Measurement::Electrical);
                record.insert_opt("voltage", voltage_u16(reader.u16(0)?));
                record.insert_opt("current", measured_u16(reader.u16(2)?).map(scaled_current));
                record.insert_opt("active_power", measured_u16(reader.u16(4)?).map(scaled_power));
                record.insert_opt(
                    "apparent_power",
                    measured_u16(reader.u16(6)?).map(scaled_power),
                );
                record.insert_opt("power_factor", measured_u8(reader.u8(8)?).map(power_factor));
                self.batch.push(record);
            }
            BoardFrame::AcEnergy => self.decode_energy(&reader)?,
            BoardFrame::Temperatures => {
                let temperatures = (0..4)
                    .map(|channel| reader.u8(channel).map(temperature_u8))
                    .collect::<Result<Vec<_>, _>>()?;
                self.per_channel(Measurement::Sensor, "temperature", temperatures);
            }
            BoardFrame::FineTemperatures => {
                let temperatures = (0..4)
                    .map(|channel| {
                        reader.u16(channel * 2).map(|raw| {
                            decode_field(raw as u64, 16, |raw| {
                                one_complement_to_signed(raw as u32, 15) as f64 / 100.0
                            })
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                self.per_channel(Measurement::Sensor, "temperature", temperatures);
            }
            BoardFrame::Environment | BoardFrame::EnvironmentCo2 => {
                let mut record = self.record(Measurement::Sensor);
                record.insert_opt("temperature", temperature_u8(reader.u8(0)?));
                record.insert_opt("humidity", measured_u8(reader.u8(1)?));
                record.insert_opt(
                    "pressure",
                    measured_u16(reader.u16(2)?).map(|raw| raw as f64 / 10.0),
                );
                if frame == BoardFrame::EnvironmentCo2 {
                    record.insert_opt("co2", measured_u16(reader.u16(4)?));
                }
                self.batch.push(record);
            }
            BoardFrame::Battery => {
                let mut record = self.record(Measurement::Electrical);
                record.insert_opt("battery_voltage", voltage_u16(reader.u16(0)?));
                record.insert_opt(
                    "battery_power",
                    measured_u16(reader.u16(2)?).map(scaled_power),
                );
                record.insert_opt("state_of_charge", measured_u8(reader.u8(4)?));
                record.insert_opt("battery_temperature", temperature_u8(reader.u8(5)?));
                self.batch.push(record);
            }
            BoardFrame::PulseCounters => {
                let counts = (0..2)
                    .map(|channel| reader.u32(channel * 4).map(measured_u32))
                    .collect::<Result<Vec<_>, _>>()?;
                self.per_channel(Measurement::Sensor, "pulse_count", counts);
            }
        }

        Ok(self.finish())
    }

    /// AC meter energy counters, preceded by a zero baseline on the first
    /// reading of each UTC day.
    fn decode_energy(&mut self, reader: &FrameReader<'_>) -> Result<(), DecodeError> {
        let channel = reader.u8(0)?;
        let eact = measured_u16(reader.u16(1)?).map(scaled_energy);
        let eapp = measured_u16(reader.u16(3)?).map(scaled_energy);

        if eact.is_some() || eapp.is_some() {
            let key = ChannelKey::new(&self.ctx.device_id, self.node_address, channel);
            let new_day = self.ctx.energy.observe(&key, self.ctx.timestamp);
            if let Some(baseline_at) = self.ctx.timestamp.checked_sub(1).filter(|_| new_day) {
                let mut baseline = self.channel_record(Measurement::Electrical, channel);
                baseline.timestamp = baseline_at;
                baseline.insert("eact", 0i64);
                baseline.insert("eapp", 0i64);
                self.batch.push(baseline);
            }
        }

        let mut record = self.channel_record(Measurement::Electrical, channel);
        record.insert_opt("eact", eact);
        record.insert_opt("eapp", eapp);
        self.batch.push(record);
        Ok(())
    }
}

/// Distributed I/O family decoder.
#[derive(Debug, Clone, Copy, Default)]
pub struct DistributedIoDecoder;

impl FamilyDecoder for DistributedIoDecoder {
    fn frame_lengths(&self) -> &'static [usize] {
        &[]
    }

    fn decode(
        &self,
        ctx: &FrameContext<'_>,
        payload: &[u8],
    ) -> Result<Option<Vec<DecodedRecord>>, DecodeError> {
        if payload.len() <= HEADER_LEN {
            debug!("{}: node frame without a body", ctx.device_id);
            return Ok(None);
        }
        let (body, (node_address, board_id)) = header(payload)?;

        let Some(board) = BoardType::from_id(board_id) else {
            warn!(
                "{}: node {node_address} sent unknown board type 0x{board_id:02x}",
                ctx.device_id
            );
            return Ok(None);
        };
        let Some(frame) = board.classify(body.len()) else {
            return Ok(None);
        };

        let mut tags = ctx.node_tags(node_address);
        tags.insert("board_id".to_string(), board.name().to_string());

        let node = NodeFrame {
            ctx,
            node_address,
            tags,
            batch: RecordBatch::new(),
        };
        node.decode(frame, body).map(Some)
    }
}
