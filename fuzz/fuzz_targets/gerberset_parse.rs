//! Fuzz target for gerberset manifest parsing.

#![no_main]

use std::path::Path;

use libfuzzer_sys::fuzz_target;
use paneliser::gerberset::parse_gerberset_str;

fuzz_target!(|data: &[u8]| {
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    if let Ok(xml) = std::str::from_utf8(data) {
        let _ = parse_gerberset_str(xml, Path::new("<fuzz>"));
    }
});
