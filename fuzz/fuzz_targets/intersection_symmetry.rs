#![no_main]

use arbitrary::Unstructured;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let _ = pathbool::arbitrary::check_intersection_symmetry(&mut Unstructured::new(data));
});
