#![no_main]

use classguide::phase::resolve_phase;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let input = String::from_utf8_lossy(data);
    let _ = resolve_phase(&input);
});
