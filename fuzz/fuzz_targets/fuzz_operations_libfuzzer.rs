#![no_main]

use fuzz_helpers::*;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|input: SequenceFuzzInput| {
    FuzzWorld::run(&input);
});
