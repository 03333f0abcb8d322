#![no_main]

use arbitrary::Unstructured;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let _ = pathbool::arbitrary::check_boolean_no_panic(&mut Unstructured::new(data));
});
