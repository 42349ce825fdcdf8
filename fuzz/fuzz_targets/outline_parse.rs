//! Fuzz target for board outline parsing.
//!
//! Feeds arbitrary text to the RS-274X outline scanner, checking for
//! panics, crashes, or hangs.

#![no_main]

use std::path::Path;

use libfuzzer_sys::fuzz_target;
use paneliser::outline::parse_outline_str;

fuzz_target!(|data: &[u8]| {
    // Cap input size to avoid excessive memory usage.
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    if let Ok(text) = std::str::from_utf8(data) {
        let _ = parse_outline_str(text, Path::new("<fuzz>"));
    }
});
