#![no_main]

use libfuzzer_sys::fuzz_target;
use seqren_core::FormatSpec;

fuzz_target!(|data: &[u8]| {
    if data.len() < 4 {
        return;
    }

    let counter = u32::from_le_bytes([data[0], data[1], data[2], data[3]]);
    let input = String::from_utf8_lossy(&data[4..]);
    let mut parts = input.splitn(2, '\n');
    let pattern: String = parts.next().unwrap_or_default().chars().take(100).collect();
    let source: String = parts.next().unwrap_or_default().chars().take(100).collect();

    let spec = FormatSpec::parse(&pattern);
    let out = spec.format_name(&source, counter, None);
    let _ = spec.parse_seq_count(&out.text);
    let _ = spec.validate();
});
