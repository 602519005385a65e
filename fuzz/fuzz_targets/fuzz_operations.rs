use fuzz_helpers::*;
use honggfuzz::fuzz;

fn main() {
    loop {
        fuzz!(|data: &[u8]| {
            run_bytes(data);
        });
    }
}
