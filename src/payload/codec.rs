//! Numeric codecs.
//!
//! Pure conversions from raw integers, already extracted from the payload and
//! already checked against their sentinel, to physical units. None of these
//! functions knows about sentinels; see [`crate::payload::sentinel`].

/// Unit multipliers selected by the 2-bit unit field of current readings (µA).
pub const CURRENT_UNITS: [u64; 4] = [1, 100, 1_000, 100_000];

/// Unit multipliers selected by the 2-bit unit field of power and energy readings.
pub const POWER_UNITS: [i64; 4] = [1, 100, 1_000, 100_000];

/// Barometric exponent of the sea-level correction.
const BAROMETRIC_EXPONENT: f64 = 5.255;

/// Standard temperature lapse rate, K/m.
const LAPSE_RATE: f64 = 0.0065;

const KELVIN_OFFSET: f64 = 273.15;

/// One's complement sign/magnitude value with the sign at `sign_bit`.
///
/// `one_complement_to_signed(0x81, 7) == -1`
pub fn one_complement_to_signed(raw: u32, sign_bit: u32) -> i32 {
    let magnitude = (raw & ((1u32 << sign_bit) - 1)) as i32;
    if raw & (1u32 << sign_bit) != 0 {
        -magnitude
    } else {
        magnitude
    }
}

/// Voltage in mV: bit 15 selects ×100, bits 0..14 carry the magnitude.
pub fn scaled_voltage(raw: u16) -> u32 {
    let magnitude = (raw & 0x7FFF) as u32;
    if raw & 0x8000 != 0 {
        magnitude * 100
    } else {
        magnitude
    }
}

/// Current in µA: bits 14..15 select the unit, bits 0..13 carry the magnitude.
pub fn scaled_current(raw: u16) -> u64 {
    let unit = CURRENT_UNITS[(raw >> 14) as usize];
    (raw & 0x3FFF) as u64 * unit
}

/// Signed power (mW or mVA): bit 15 sign, bits 13..14 unit, bits 0..12 magnitude.
pub fn scaled_power(raw: u16) -> i64 {
    let unit = POWER_UNITS[((raw >> 13) & 0x3) as usize];
    let magnitude = (raw & 0x1FFF) as i64 * unit;
    if raw & 0x8000 != 0 {
        -magnitude
    } else {
        magnitude
    }
}

/// Signed energy (mWh or mVAh); same bit layout as [`scaled_power`].
pub fn scaled_energy(raw: u16) -> i64 {
    scaled_power(raw)
}

/// Power factor: bit 7 sign, bits 0..6 hundredths.
pub fn power_factor(raw: u8) -> f64 {
    one_complement_to_signed(raw as u32, 7) as f64 / 100.0
}

/// Pressure reduced to sea level with the barometric formula.
///
/// `P0 = P · exp(-5.255 · ln(T / (T + 0.0065 · h)))`, T in kelvin.
pub fn sea_level_pressure(absolute_hpa: f64, altitude_m: i32, temp_celsius: f64) -> f64 {
    let tk = temp_celsius + KELVIN_OFFSET;
    let ratio = tk / (tk + LAPSE_RATE * altitude_m as f64);
    absolute_hpa * (-BAROMETRIC_EXPONENT * ratio.ln()).exp()
}

/// Decimal degrees from a sexagesimal reading; `seconds_thousandths` is in 1/1000 s.
pub fn sexagesimal_coordinate(
    degrees: u32,
    minutes: u32,
    seconds_thousandths: u32,
    south_or_west: bool,
) -> f64 {
    let value = degrees as f64
        + minutes as f64 / 60.0
        + seconds_thousandths as f64 / 1000.0 / 3600.0;
    if south_or_west {
        -value
    } else {
        value
    }
}

/// Decode a packed coordinate word.
///
/// ```text
/// bit 31      hemisphere (1 = south / west)
/// bits 30..23 degrees
/// bits 22..17 minutes
/// bits 16..0  seconds, thousandths
/// ```
pub fn coordinate_from_word(word: u32) -> f64 {
    sexagesimal_coordinate(
        (word >> 23) & 0xFF,
        (word >> 17) & 0x3F,
        word & 0x1_FFFF,
        word & 0x8000_0000 != 0,
    )
}

/// Pack a coordinate word; the inverse of [`coordinate_from_word`].
pub fn pack_coordinate(
    degrees: u32,
    minutes: u32,
    seconds_thousandths: u32,
    south_or_west: bool,
) -> u32 {
    ((south_or_west as u32) << 31)
        | ((degrees & 0xFF) << 23)
        | ((minutes & 0x3F) << 17)
        | (seconds_thousandths & 0x1_FFFF)
}
