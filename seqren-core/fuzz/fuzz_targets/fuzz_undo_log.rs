#![no_main]

use libfuzzer_sys::fuzz_target;
use seqren_core::undo_log::{read_stack, write_stack};

fuzz_target!(|data: &[u8]| {
    let stack = read_stack(data);

    // Whatever loads must write back and load the same way.
    let mut written = Vec::new();
    if write_stack(&stack, &mut written).is_ok() {
        assert_eq!(read_stack(written.as_slice()), stack);
    }
});
