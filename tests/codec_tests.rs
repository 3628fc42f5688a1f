//! Tests for the numeric codecs and the sentinel policy.

use proptest::prelude::*;
use sigfox_rs::payload::codec::{
    coordinate_from_word, one_complement_to_signed, pack_coordinate, power_factor,
    scaled_current, scaled_energy, scaled_power, scaled_voltage, sea_level_pressure,
};
use sigfox_rs::payload::sentinel::{decode_field, measured};
use sigfox_rs::util::bits::{bits, read_be_uint, FrameReader};
use sigfox_rs::util::hex::decode_payload;

#[test]
fn test_one_complement() {
    assert_eq!(one_complement_to_signed(0x1D, 7), 29);
    assert_eq!(one_complement_to_signed(0x96, 7), -22);
    assert_eq!(one_complement_to_signed(0x80, 7), 0);
    assert_eq!(one_complement_to_signed(0x87D, 11), -125);
    assert_eq!(one_complement_to_signed(0x8271, 15), -625);
}

#[test]
fn test_scaled_units() {
    assert_eq!(scaled_voltage(0x0CE4), 3300);
    assert_eq!(scaled_voltage(0x88FC), 230_000);
    assert_eq!(scaled_current(0x0064), 100);
    assert_eq!(scaled_current(0x4064), 10_000);
    assert_eq!(scaled_current(0x9388), 5_000_000);
    assert_eq!(scaled_current(0xC001), 100_000);
    assert_eq!(scaled_power(0x447E), 1_150_000);
    assert_eq!(scaled_power(0xC47E), -1_150_000);
    assert_eq!(scaled_power(0x6001), 100_000);
    assert_eq!(scaled_energy(0x03E8), 1000);
    assert_eq!(power_factor(0x60), 0.96);
    assert_eq!(power_factor(0xE0), -0.96);
}

#[test]
fn test_sea_level_pressure_at_sea_level() {
    assert_eq!(sea_level_pressure(1013.25, 0, 15.0), 1013.25);
    assert!(sea_level_pressure(900.0, 1000, 10.0) > 1000.0);
}

#[test]
fn test_sentinel_precedes_codec() {
    assert_eq!(decode_field(0xFFFF, 16, |raw| scaled_voltage(raw as u16)), None);
    assert_eq!(decode_field(0x7FFF, 16, |raw| scaled_voltage(raw as u16)), Some(32_767));
    assert_eq!(measured(0xF, 4), None);
    assert_eq!(measured(0xE, 4), Some(0xE));
}

#[test]
fn test_frame_reader() {
    let payload = decode_payload("2fa302063bad0d5f1d").unwrap();
    let reader = FrameReader::new(&payload);
    assert_eq!(reader.len(), 9);
    assert_eq!(reader.u16(0).unwrap(), 0x2FA3);
    assert_eq!(reader.u24(3).unwrap(), 0x063BAD);
    assert_eq!(reader.u32(5).unwrap(), 0xAD0D5F1D);
    assert!(reader.u16(8).is_err());
    assert_eq!(read_be_uint(&payload, 6, 2).unwrap(), 0x0D5F);
    assert_eq!(bits(0x2FA3, 14, 2), 0);
    assert_eq!(bits(0x2FA3, 0, 14), 12195);
}

proptest! {
    #[test]
    fn prop_coordinate_round_trip(
        degrees in 0u32..=180,
        minutes in 0u32..60,
        thousandths in 0u32..60_000,
        south_or_west in any::<bool>(),
    ) {
        let word = pack_coordinate(degrees, minutes, thousandths, south_or_west);
        let value = coordinate_from_word(word);
        let expected = degrees as f64 + minutes as f64 / 60.0 + thousandths as f64 / 3_600_000.0;
        prop_assert!((value.abs() - expected).abs() < 1e-9);
        prop_assert_eq!(value < 0.0, south_or_west && expected > 0.0);
    }

    #[test]
    fn prop_one_complement_magnitude(raw in 0u32..=0xFF) {
        let value = one_complement_to_signed(raw, 7);
        prop_assert_eq!(value.unsigned_abs(), raw & 0x7F);
        prop_assert_eq!(value < 0, raw & 0x80 != 0 && raw & 0x7F != 0);
    }

    #[test]
    fn prop_power_sign_is_symmetric(raw in 0u16..0x8000) {
        prop_assert_eq!(scaled_power(raw | 0x8000), -scaled_power(raw));
    }

    #[test]
    fn prop_non_sentinel_values_pass(raw in 0u64..0xFFFF) {
        prop_assert_eq!(measured(raw, 16), Some(raw));
    }
}
