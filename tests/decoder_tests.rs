//! End-to-end decoding of uplink callbacks through the public API.

use sigfox_rs::constants::UNKNOWN_TAG;
use sigfox_rs::{
    BoardType, Decoded, DecodeError, DecoderSettings, DeviceEntry, DeviceRegistry,
    EnergyResetTracker, Family, FieldValue, HardwareRevision, Measurement, MemorySink, NoLookups,
    RecordSink, StaticLookups, Uplink, UplinkDecoder,
};

const T0: i64 = 1_700_000_000;

fn registry() -> DeviceRegistry {
    DeviceRegistry::from_entries([
        DeviceEntry::new("1A2B3C", Family::PowerSupply)
            .with_tag("rack", "R12")
            .with_tag("system", "core"),
        DeviceEntry::new("WS0001", Family::Weather).with_tag("site", "ridge-top"),
        DeviceEntry::new("BEEF01", Family::EnvSensor)
            .with_tag("asset", "cold-room")
            .with_revision(HardwareRevision::V3),
        DeviceEntry::new("D10001", Family::DistributedIo)
            .with_tag("system", "pumps")
            .with_node(3, "valves"),
    ])
    .unwrap()
}

fn decode(family: Family, device_id: &str, hex: &str) -> Decoded {
    let registry = registry();
    let energy = EnergyResetTracker::new();
    UplinkDecoder::new(&registry, &NoLookups, &energy, DecoderSettings::default())
        .decode(family, T0, device_id, hex)
        .unwrap()
}

fn field<'d>(decoded: &'d Decoded, measurement: Measurement, name: &str) -> Option<&'d FieldValue> {
    decoded
        .records
        .iter()
        .find(|record| record.measurement == measurement)
        .and_then(|record| record.field(name))
}

/// Tests the reference power-supply monitoring frame.
#[test]
fn test_power_supply_monitoring_fixture() {
    let decoded = decode(Family::PowerSupply, "1A2B3C", "2fa302063bad0d5f1d");
    assert!(decoded.recognized);
    assert_eq!(decoded.records.len(), 2);

    let expect = [
        ("output_voltage", 12195),
        ("current_sense_range", 0),
        ("output_status", 2),
        ("output_current", 408_493),
        ("mcu_voltage", 3423),
        ("mcu_temperature", 29),
        ("output_power", 4_981_572_135),
    ];
    for (name, value) in expect {
        assert_eq!(
            field(&decoded, Measurement::Monitoring, name),
            Some(&FieldValue::Int(value)),
            "{name}"
        );
    }
    assert_eq!(
        field(&decoded, Measurement::Metadata, "last_communication"),
        Some(&FieldValue::Int(T0))
    );
    for record in &decoded.records {
        assert_eq!(record.tag("device_id"), Some("1A2B3C"));
        assert_eq!(record.tag("rack"), Some("R12"));
        assert_eq!(record.tag("system"), Some("core"));
    }
}

/// Tests that a missing current reading suppresses the derived power.
#[test]
fn test_power_supply_current_sentinel() {
    let decoded = decode(Family::PowerSupply, "1A2B3C", "0d9903ffffff0d611e");
    assert_eq!(
        field(&decoded, Measurement::Monitoring, "output_voltage"),
        Some(&FieldValue::Int(3481))
    );
    assert!(field(&decoded, Measurement::Monitoring, "output_current").is_none());
    assert!(field(&decoded, Measurement::Monitoring, "output_power").is_none());
}

/// Tests that only non-zero error slots are stored, offset by their slot index.
#[test]
fn test_error_stack_slots() {
    let decoded = decode(Family::EnvSensor, "BEEF01", "001a0000002b");
    assert!(decoded.recognized);
    let errors: Vec<(i64, i64)> = decoded
        .records
        .iter()
        .map(|record| {
            (
                record.timestamp,
                record.field("error").and_then(FieldValue::as_i64).unwrap(),
            )
        })
        .collect();
    assert_eq!(errors, vec![(T0, 0x1A), (T0 + 2, 0x2B)]);
}

/// Tests that an all-zero error stack is recognized but stores nothing.
#[test]
fn test_empty_error_stack() {
    let decoded = decode(Family::EnvSensor, "BEEF01", "000000000000");
    assert!(decoded.recognized);
    assert!(decoded.records.is_empty());
}

/// Tests the startup frame shared by every family that sends one.
#[test]
fn test_startup_frame_in_every_family() {
    for family in [
        Family::Weather,
        Family::EnvSensor,
        Family::AssetTracker,
        Family::HomeMonitor,
        Family::PowerMeter,
        Family::ClockBeacon,
    ] {
        let decoded = decode(family, "00C0FFEE", "01010203abcdef15");
        assert!(decoded.recognized, "{family}");
        assert_eq!(decoded.records.len(), 1, "{family}");
        let startup = &decoded.records[0];
        assert_eq!(startup.field("sw_version"), Some(&FieldValue::from("sw1.2.3.dev")));
        assert_eq!(startup.field("sw_commit_id"), Some(&FieldValue::from("abcdef1")));
        assert_eq!(startup.field("reset_cause"), Some(&FieldValue::from("power_on")));
        assert_eq!(startup.field("last_startup"), Some(&FieldValue::Int(T0)));
    }
}

/// Tests that lengths outside each family's table are reported, not guessed.
#[test]
fn test_unrecognized_lengths() {
    let payload = "00".repeat(12);
    for family in Family::ALL {
        let lengths = family.frame_lengths();
        for len in 1..=12usize {
            if family == Family::DistributedIo || lengths.contains(&len) {
                continue;
            }
            let decoded = decode(family, "00C0FFEE", &payload[..len * 2]);
            assert!(!decoded.recognized, "{family} {len}");
            assert!(decoded.records.is_empty(), "{family} {len}");
        }
    }
}

/// Tests that malformed hex is the only decode error.
#[test]
fn test_malformed_hex() {
    let registry = registry();
    let energy = EnergyResetTracker::new();
    let decoder = UplinkDecoder::new(&registry, &NoLookups, &energy, DecoderSettings::default());

    for bad in ["2fa", "2g", "2f a3"] {
        let result = decoder.decode(Family::PowerSupply, T0, "1A2B3C", bad);
        assert!(matches!(result, Err(DecodeError::InvalidHex(_))), "{bad}");
    }
    assert!(decoder.decode(Family::PowerSupply, T0, "1A2B3C", "2FA302063BAD0D5F1D").is_ok());
}

/// Tests that unknown devices still decode with placeholder tags.
#[test]
fn test_unknown_device_placeholder_tags() {
    let decoded = decode(Family::PowerSupply, "c0ffee", "2fa302063bad0d5f1d");
    assert!(decoded.recognized);
    for record in &decoded.records {
        assert_eq!(record.tag("device_id"), Some("C0FFEE"));
        assert_eq!(record.tag("rack"), Some(UNKNOWN_TAG));
        assert_eq!(record.tag("system"), Some(UNKNOWN_TAG));
    }
}

/// Tests that a device decoded under the wrong family gets placeholder tags.
#[test]
fn test_family_mismatch_placeholder_tags() {
    let decoded = decode(Family::Weather, "1A2B3C", "153719032794");
    assert!(decoded.recognized);
    assert_eq!(decoded.records[0].tag("site"), Some(UNKNOWN_TAG));
}

/// Tests that the weather side channel feeds the derived fields.
#[test]
fn test_weather_side_channel() {
    let registry = registry();
    let energy = EnergyResetTracker::new();
    let lookups = StaticLookups::new()
        .with_altitude("WS0001", 420)
        .with_firmware("WS0001", 1, 5);
    let decoder = UplinkDecoder::new(&registry, &lookups, &energy, DecoderSettings::default());

    let decoded = decoder
        .decode(Family::Weather, T0, "WS0001", "1537190327940c870a13")
        .unwrap();
    assert!(field(&decoded, Measurement::Weather, "pressure_sea_level").is_some());
    assert_eq!(
        field(&decoded, Measurement::Weather, "rainfall"),
        Some(&FieldValue::Float(1.0))
    );

    let without = decode(Family::Weather, "WS0001", "1537190327940c870a13");
    assert!(field(&without, Measurement::Weather, "pressure_sea_level").is_none());
    assert!(field(&without, Measurement::Weather, "rainfall").is_none());
    assert!(field(&without, Measurement::Weather, "wind_gust").is_some());
}

/// Tests the v3 environmental sensor packing through the registry revision.
#[test]
fn test_env_sensor_revision_from_registry() {
    let decoded = decode(Family::EnvSensor, "BEEF01", "e1087d3200");
    assert_eq!(
        field(&decoded, Measurement::Sensor, "temperature"),
        Some(&FieldValue::Float(-12.5))
    );
    assert_eq!(decoded.records[0].tag("hw_revision"), Some("v3"));
}

/// Tests the daily energy baseline across several uplinks sharing one tracker.
#[test]
fn test_energy_reset_across_uplinks() {
    // 2024-03-10 23:59:59 UTC and the following midnight.
    const LATE: i64 = 1_710_115_199;
    const MIDNIGHT: i64 = 1_710_115_200;

    let registry = registry();
    let energy = EnergyResetTracker::new();
    let decoder = UplinkDecoder::new(&registry, &NoLookups, &energy, DecoderSettings::default());

    let synthetic = |decoded: &Decoded| {
        decoded
            .records
            .iter()
            .filter(|record| record.field("eact") == Some(&FieldValue::Int(0)))
            .map(|record| record.timestamp)
            .collect::<Vec<_>>()
    };

    let day_one = decoder.decode(Family::DistributedIo, LATE, "D10001", "03070103e804b0").unwrap();
    assert_eq!(synthetic(&day_one), vec![LATE - 1]);

    let again = decoder.decode(Family::DistributedIo, LATE, "D10001", "03070103e804b0").unwrap();
    assert!(synthetic(&again).is_empty());

    let day_two = decoder
        .decode(Family::DistributedIo, MIDNIGHT, "D10001", "03070103e804b0")
        .unwrap();
    assert_eq!(synthetic(&day_two), vec![MIDNIGHT - 1]);
    assert_eq!(day_two.records[1].tag("node"), Some("valves"));
    assert_eq!(day_two.records[1].tag("channel"), Some("1"));

    energy.clear();
    let after_clear = decoder
        .decode(Family::DistributedIo, MIDNIGHT, "D10001", "03070103e804b0")
        .unwrap();
    assert_eq!(synthetic(&after_clear), vec![MIDNIGHT - 1]);
}

/// Tests callback bodies, with and without a family, written through a sink.
#[test]
fn test_callbacks_into_sink() {
    let registry = registry();
    let energy = EnergyResetTracker::new();
    let decoder = UplinkDecoder::new(&registry, &NoLookups, &energy, DecoderSettings::default());
    let mut sink = MemorySink::new();

    let bodies = [
        r#"{"device":"1A2B3C","time":1700000000,"data":"2fa302063bad0d5f1d"}"#,
        r#"{"device":"00AA00","time":1700000060,"data":"27","family":"home_monitor"}"#,
    ];
    for body in bodies {
        let uplink: Uplink = serde_json::from_str(body).unwrap();
        let family = decoder.resolve_family(&uplink).unwrap();
        let decoded = decoder.decode_uplink(&uplink).unwrap();
        sink.write_batch(family, &decoded.records).unwrap();
    }

    let databases: Vec<&str> = sink.batches.iter().map(|(db, _)| db.as_str()).collect();
    assert_eq!(databases, vec!["sigfox_power_supply", "sigfox_home_monitor"]);
    assert_eq!(sink.records().count(), 4);
}

/// Tests that decoding is a pure function of its inputs for stateless families.
#[test]
fn test_decoding_is_deterministic() {
    let first = decode(Family::PowerSupply, "1A2B3C", "2fa302063bad0d5f1d");
    let second = decode(Family::PowerSupply, "1a2b3c", "2FA302063BAD0D5F1D");
    assert_eq!(first, second);
}

fn decode_at(family: Family, timestamp: i64, device_id: &str, hex: &str) -> Decoded {
    let registry = registry();
    let energy = EnergyResetTracker::new();
    UplinkDecoder::new(&registry, &NoLookups, &energy, DecoderSettings::default())
        .decode(family, timestamp, device_id, hex)
        .unwrap()
}

/// Tests that error slots whose timestamp would overflow are dropped.
#[test]
fn test_error_stack_at_latest_timestamp() {
    let decoded = decode_at(Family::AssetTracker, i64::MAX, "A55E70", "00010002");
    assert!(decoded.recognized);
    assert_eq!(decoded.records.len(), 1);
    assert_eq!(decoded.records[0].timestamp, i64::MAX);
    assert_eq!(decoded.records[0].field("error"), Some(&FieldValue::Int(1)));
}

/// Tests that the clock offset is omitted when it does not fit.
#[test]
fn test_clock_offset_at_earliest_timestamp() {
    let decoded = decode_at(Family::ClockBeacon, i64::MIN, "C10C00", "0000000100");
    let synchro = decoded
        .records
        .iter()
        .find(|record| record.measurement == Measurement::Synchro)
        .unwrap();
    assert_eq!(synchro.field("device_time"), Some(&FieldValue::Int(1)));
    assert!(!synchro.has_field("clock_offset"));

    let decoded = decode_at(Family::ClockBeacon, i64::MAX, "C10C00", "0000000100");
    assert!(field(&decoded, Measurement::Synchro, "clock_offset").is_some());
}

/// Tests that no daily energy baseline is inserted at unrepresentable times.
#[test]
fn test_energy_frame_at_extreme_timestamps() {
    for timestamp in [i64::MIN, i64::MAX] {
        let decoded = decode_at(Family::DistributedIo, timestamp, "D10001", "03070103e804b0");
        assert!(decoded.recognized);
        assert!(decoded
            .records
            .iter()
            .all(|record| record.field("eact") != Some(&FieldValue::Int(0))));
        assert_eq!(
            field(&decoded, Measurement::Electrical, "eact"),
            Some(&FieldValue::Int(1000))
        );
    }
}

/// Tests that every frame decodes at the extremes of the timestamp range.
#[test]
fn test_every_frame_at_extreme_timestamps() {
    let mut payloads: Vec<(Family, String)> = Vec::new();
    for family in Family::ALL {
        for &len in family.frame_lengths() {
            for byte in ["00", "01", "ff"] {
                payloads.push((family, byte.repeat(len)));
            }
        }
    }
    for board in BoardType::ALL {
        for &len in board.body_lengths() {
            for byte in ["00", "01", "ff"] {
                let hex = format!("03{:02x}{}", board.id(), byte.repeat(len));
                payloads.push((Family::DistributedIo, hex));
            }
        }
    }

    for timestamp in [i64::MIN, i64::MAX] {
        for (family, hex) in &payloads {
            let decoded = decode_at(*family, timestamp, "BEEF01", hex);
            assert!(
                decoded.recognized || decoded.records.is_empty(),
                "{family} {hex} at {timestamp}"
            );
        }
    }
}
