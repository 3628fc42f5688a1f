//! Weather station decoder.
//!
//! Besides the shared frames, stations send ambient readings in one of two
//! shapes: "intermittent" (6 bytes: temperature, humidity, light, UV, pressure)
//! and "continuous" (10 bytes: the same plus wind and rainfall).
//!
//! ```text
//! b0      temperature, one's complement °C
//! b1      humidity %
//! b2..b3  light (bits 15..4, 25 lux steps) | UV index (bits 3..0)
//! b4..b5  absolute pressure, 0.1 hPa
//! -- continuous only --
//! b6      wind speed, 0.5 m/s
//! b7      wind direction, 2° steps
//! b8      rainfall (encoding depends on firmware)
//! b9      wind gust, 0.5 m/s
//! ```

use crate::constants::{
    GEOLOC_FRAME_LEN, GEOLOC_TIMEOUT_V1_LEN, GEOLOC_TIMEOUT_V2_LEN, GEOLOC_TIMEOUT_V3_LEN,
    MONITORING_FRAME_LEN, STARTUP_FRAME_LEN,
};
use crate::error::DecodeError;
use crate::payload::codec::sea_level_pressure;
use crate::payload::record::{DecodedRecord, Measurement, RecordBatch, Tags};
use crate::payload::sentinel::{decode_field, measured, measured_u16, measured_u8};
use crate::sigfox::decoders::common::{
    decode_error_stack, decode_geoloc_timeout, decode_geolocation, decode_monitoring,
    decode_startup, temperature_u8,
};
use crate::sigfox::decoders::FamilyDecoder;
use crate::sigfox::lookup::FirmwareVersion;
use crate::sigfox::FrameContext;
use crate::util::bits::{bits, FrameReader};
use log::debug;

pub const INTERMITTENT_FRAME_LEN: usize = 6;
pub const CONTINUOUS_FRAME_LEN: usize = 10;
pub const ERROR_SLOTS: usize = 6;

const LIGHT_LUX_PER_STEP: u64 = 25;

const FRAME_LENGTHS: &[usize] = &[1, 2, 3, 6, 7, 8, 10, 11, 12];

/// Frame kinds of a weather station.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeatherFrame {
    GeolocTimeout,
    Intermittent,
    Monitoring,
    Startup,
    Continuous,
    Geolocation,
    ErrorStack,
}

impl WeatherFrame {
    pub fn classify(len: usize) -> Option<Self> {
        match len {
            GEOLOC_TIMEOUT_V1_LEN | GEOLOC_TIMEOUT_V2_LEN | GEOLOC_TIMEOUT_V3_LEN => {
                Some(Self::GeolocTimeout)
            }
            INTERMITTENT_FRAME_LEN => Some(Self::Intermittent),
            MONITORING_FRAME_LEN => Some(Self::Monitoring),
            STARTUP_FRAME_LEN => Some(Self::Startup),
            CONTINUOUS_FRAME_LEN => Some(Self::Continuous),
            GEOLOC_FRAME_LEN => Some(Self::Geolocation),
            len if len == ERROR_SLOTS * 2 => Some(Self::ErrorStack),
            _ => None,
        }
    }
}

/// Rainfall in mm from the rainfall byte.
///
/// Firmware older than `dynamic_since` sends whole millimetres. Newer firmware
/// uses bit 7 as a scale bit (0: 0.1 mm steps, 1: 1 mm steps) over a 7-bit
/// magnitude. 0xFF is the sentinel in both encodings.
pub fn rainfall_mm(raw: u8, firmware: FirmwareVersion, dynamic_since: FirmwareVersion) -> Option<f64> {
    let raw = measured_u8(raw)?;
    if firmware < dynamic_since {
        return Some(raw as f64);
    }
    let magnitude = (raw & 0x7F) as f64;
    if raw & 0x80 != 0 {
        Some(magnitude)
    } else {
        Some(magnitude / 10.0)
    }
}

fn half_steps(raw: u8) -> Option<f64> {
    measured_u8(raw).map(|raw| raw as f64 * 0.5)
}

fn decode_ambient(
    ctx: &FrameContext<'_>,
    payload: &[u8],
    tags: &Tags,
    continuous: bool,
) -> Result<Vec<DecodedRecord>, DecodeError> {
    let reader = FrameReader::new(payload);

    let temperature = temperature_u8(reader.u8(0)?);
    let optical = reader.u16(2)? as u64;
    let pressure = measured_u16(reader.u16(4)?).map(|raw| raw as f64 / 10.0);

    let mut record = ctx.record(Measurement::Weather, tags);
    record.insert_opt("temperature", temperature);
    record.insert_opt("humidity", measured_u8(reader.u8(1)?));
    record.insert_opt(
        "light",
        decode_field(bits(optical, 4, 12), 12, |raw| raw * LIGHT_LUX_PER_STEP),
    );
    record.insert_opt("uv_index", measured(bits(optical, 0, 4), 4));
    record.insert_opt("pressure", pressure);

    if let (Some(pressure), Some(temperature)) = (pressure, temperature) {
        match ctx.lookups.last_altitude(&ctx.device_id) {
            Some(altitude) => record.insert(
                "pressure_sea_level",
                sea_level_pressure(pressure, altitude, temperature as f64),
            ),
            None => debug!("no known altitude for {}; sea-level pressure omitted", ctx.device_id),
        }
    }

    if continuous {
        record.insert_opt("wind_speed", half_steps(reader.u8(6)?));
        record.insert_opt(
            "wind_direction",
            measured_u8(reader.u8(7)?).map(|raw| raw as u16 * 2),
        );
        match ctx.lookups.last_firmware_version(&ctx.device_id) {
            Some(firmware) => record.insert_opt(
                "rainfall",
                rainfall_mm(reader.u8(8)?, firmware, ctx.settings.dynamic_rainfall_since),
            ),
            None => debug!("no known firmware for {}; rainfall omitted", ctx.device_id),
        }
        record.insert_opt("wind_gust", half_steps(reader.u8(9)?));
    }

    let mut batch = RecordBatch::new();
    batch.push(record);
    batch.push(ctx.last_communication(tags));
    Ok(batch.into_records())
}

/// Weather station family decoder.
#[derive(Debug, Clone, Copy, Default)]
pub struct WeatherDecoder;

impl FamilyDecoder for WeatherDecoder {
    fn frame_lengths(&self) -> &'static [usize] {
        FRAME_LENGTHS
    }

    fn decode(
        &self,
        ctx: &FrameContext<'_>,
        payload: &[u8],
    ) -> Result<Option<Vec<DecodedRecord>>, DecodeError> {
        let Some(frame) = WeatherFrame::classify(payload.len()) else {
            return Ok(None);
        };
        let tags = ctx.tags();

        let records = match frame {
            WeatherFrame::GeolocTimeout => decode_geoloc_timeout(ctx, payload, &tags)?,
            WeatherFrame::Intermittent => decode_ambient(ctx, payload, &tags, false)?,
            WeatherFrame::Monitoring => decode_monitoring(ctx, payload, &tags)?,
            WeatherFrame::Startup => decode_startup(ctx, payload, &tags)?,
            WeatherFrame::Continuous => decode_ambient(ctx, payload, &tags, true)?,
            WeatherFrame::Geolocation => decode_geolocation(ctx, payload, &tags)?,
            WeatherFrame::ErrorStack => decode_error_stack(ctx, payload, ERROR_SLOTS, &tags)?,
        };
        Ok(Some(records))
    }
}
