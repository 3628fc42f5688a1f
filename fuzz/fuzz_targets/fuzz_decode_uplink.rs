#![no_main]

use libfuzzer_sys::fuzz_target;
use sigfox_rs::util::hex::encode_hex;
use sigfox_rs::{
    DecoderSettings, DeviceEntry, DeviceRegistry, EnergyResetTracker, Family, HardwareRevision,
    NoLookups, UplinkDecoder,
};

fuzz_target!(|data: &[u8]| {
    // First byte picks the family and device; the rest is the payload.
    let Some((&selector, payload)) = data.split_first() else {
        return;
    };
    let family = Family::ALL[selector as usize % Family::ALL.len()];
    let device = if selector & 0x80 != 0 { "BEEF03" } else { "BEEF02" };

    let registry = DeviceRegistry::from_entries([
        DeviceEntry::new("BEEF02", Family::EnvSensor).with_revision(HardwareRevision::V2),
        DeviceEntry::new("BEEF03", Family::EnvSensor).with_revision(HardwareRevision::V3),
    ])
    .unwrap();
    let energy = EnergyResetTracker::new();
    let decoder = UplinkDecoder::new(&registry, &NoLookups, &energy, DecoderSettings::default());

    // Well-formed hex must never fail, whatever the bytes.
    let decoded = decoder.decode(family, 1_700_000_000, device, &encode_hex(payload));
    assert!(decoded.is_ok());
    if let Ok(decoded) = decoded {
        assert!(decoded.recognized || decoded.records.is_empty());
    }
});
