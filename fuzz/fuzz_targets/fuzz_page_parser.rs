#![no_main]

use classguide::catalog::PageParser;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(markup) = std::str::from_utf8(data) {
        // Only panics matter; malformed pages are expected to be rejected.
        let _ = PageParser::new("https://terraria.wiki.gg").parse(markup);
    }
});
