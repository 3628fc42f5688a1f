#![no_main]

use libfuzzer_sys::fuzz_target;
use sigfox_rs::util::hex::decode_payload;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        let _ = decode_payload(text);
    }
});
