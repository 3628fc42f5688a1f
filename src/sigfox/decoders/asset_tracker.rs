//! Asset tracker decoder. Trackers only send shared frames.

use crate::constants::{
    GEOLOC_FRAME_LEN, GEOLOC_TIMEOUT_V1_LEN, GEOLOC_TIMEOUT_V2_LEN, GEOLOC_TIMEOUT_V3_LEN,
    MONITORING_FRAME_LEN, STARTUP_FRAME_LEN,
};
use crate::error::DecodeError;
use crate::payload::record::DecodedRecord;
use crate::sigfox::decoders::common::{
    decode_error_stack, decode_geoloc_timeout, decode_geolocation, decode_monitoring,
    decode_startup,
};
use crate::sigfox::decoders::FamilyDecoder;
use crate::sigfox::FrameContext;

pub const ERROR_SLOTS: usize = 2;

const FRAME_LENGTHS: &[usize] = &[1, 2, 3, 4, 7, 8, 11];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetTrackerFrame {
    GeolocTimeout,
    ErrorStack,
    Monitoring,
    Startup,
    Geolocation,
}

impl AssetTrackerFrame {
    pub fn classify(len: usize) -> Option<Self> {
        match len {
            GEOLOC_TIMEOUT_V1_LEN | GEOLOC_TIMEOUT_V2_LEN | GEOLOC_TIMEOUT_V3_LEN => {
                Some(Self::GeolocTimeout)
            }
            len if len == ERROR_SLOTS * 2 => Some(Self::ErrorStack),
            MONITORING_FRAME_LEN => Some(Self::Monitoring),
            STARTUP_FRAME_LEN => Some(Self::Startup),
            GEOLOC_FRAME_LEN => Some(Self::Geolocation),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AssetTrackerDecoder;

impl FamilyDecoder for AssetTrackerDecoder {
    fn frame_lengths(&self) -> &'static [usize] {
        FRAME_LENGTHS
    }

    fn decode(
        &self,
        ctx: &FrameContext<'_>,
        payload: &[u8],
    ) -> Result<Option<Vec<DecodedRecord>>, DecodeError> {
        let Some(frame) = AssetTrackerFrame::classify(payload.len()) else {
            return Ok(None);
        };
        let tags = ctx.tags();

        let records = match frame {
            AssetTrackerFrame::GeolocTimeout => decode_geoloc_timeout(ctx, payload, &tags)?,
            AssetTrackerFrame::ErrorStack => decode_error_stack(ctx, payload, ERROR_SLOTS, &tags)?,
            AssetTrackerFrame::Monitoring => decode_monitoring(ctx, payload, &tags)?,
            AssetTrackerFrame::Startup => decode_startup(ctx, payload, &tags)?,
            AssetTrackerFrame::Geolocation => decode_geolocation(ctx, payload, &tags)?,
        };
        Ok(Some(records))
    }
}
