//! Fuzz target for single-letter gerber drawings.

#![no_main]

use libfuzzer_sys::fuzz_target;
use paneliser::font::import::fuzz_parse_glyph;

fuzz_target!(|data: &[u8]| {
    if data.len() > 1024 * 1024 {
        return;
    }

    if let Ok(text) = std::str::from_utf8(data) {
        let _ = fuzz_parse_glyph(text);
    }
});
