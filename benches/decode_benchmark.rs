use criterion::{black_box, criterion_group, criterion_main, Criterion};
use sigfox_rs::payload::codec::{coordinate_from_word, one_complement_to_signed, scaled_current};
use sigfox_rs::{
    DecoderSettings, DeviceEntry, DeviceRegistry, EnergyResetTracker, Family, NoLookups,
    UplinkDecoder,
};

fn registry() -> DeviceRegistry {
    DeviceRegistry::from_entries([
        DeviceEntry::new("1A2B3C", Family::PowerSupply)
            .with_tag("rack", "R12")
            .with_tag("system", "core"),
        DeviceEntry::new("D10001", Family::DistributedIo)
            .with_tag("system", "pumps")
            .with_node(1, "meter"),
    ])
    .unwrap()
}

fn benchmark_decode_uplinks(c: &mut Criterion) {
    let registry = registry();
    let energy = EnergyResetTracker::new();
    let decoder = UplinkDecoder::new(&registry, &NoLookups, &energy, DecoderSettings::default());

    let frames = [
        ("power_supply_monitoring", Family::PowerSupply, "1A2B3C", "2fa302063bad0d5f1d"),
        ("weather_continuous", Family::Weather, "WS0001", "1537190327940c878513"),
        ("asset_tracker_geolocation", Family::AssetTracker, "A55E70", "90e810044b988e94003a15"),
        ("distributed_io_ac_meter", Family::DistributedIo, "D10001", "010788fc9388447e44b060"),
        ("power_meter_electrical", Family::PowerMeter, "PM0001", "88fc9388c47e44b0e032"),
    ];

    for (name, family, device, payload) in frames {
        c.bench_function(name, |b| {
            b.iter(|| {
                let decoded = decoder.decode(family, black_box(1_700_000_000), device, black_box(payload));
                let _ = black_box(decoded);
            })
        });
    }
}

fn benchmark_codecs(c: &mut Criterion) {
    c.bench_function("one_complement_to_signed", |b| {
        b.iter(|| one_complement_to_signed(black_box(0x8271), 15))
    });
    c.bench_function("scaled_current", |b| b.iter(|| scaled_current(black_box(0x9388))));
    c.bench_function("coordinate_from_word", |b| {
        b.iter(|| coordinate_from_word(black_box(0x90E8_1004)))
    });
}

criterion_group!(benches, benchmark_decode_uplinks, benchmark_codecs);
criterion_main!(benches);
