//! Error-sentinel policy.
//!
//! Every field reserves its all-ones raw pattern for "not measured / sensor fault".
//! The comparison happens on the raw integer, before any codec runs: a one's
//! complement 0xFF would otherwise decode to a believable -127 °C.

use crate::util::bits::mask;

/// Raw value of a field of `width` bits, or `None` if it is the sentinel.
pub fn measured(raw: u64, width: u32) -> Option<u64> {
    if raw == mask(width) {
        None
    } else {
        Some(raw)
    }
}

/// Apply `codec` to the raw value unless it is the sentinel for `width` bits.
pub fn decode_field<T>(raw: u64, width: u32, codec: impl FnOnce(u64) -> T) -> Option<T> {
    measured(raw, width).map(codec)
}

pub fn measured_u8(raw: u8) -> Option<u8> {
    measured(raw as u64, 8).map(|v| v as u8)
}

pub fn measured_u16(raw: u16) -> Option<u16> {
    measured(raw as u64, 16).map(|v| v as u16)
}

pub fn measured_u24(raw: u32) -> Option<u32> {
    measured(raw as u64, 24).map(|v| v as u32)
}

pub fn measured_u32(raw: u32) -> Option<u32> {
    measured(raw as u64, 32).map(|v| v as u32)
}
