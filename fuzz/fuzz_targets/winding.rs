#![no_main]

use arbitrary::Unstructured;
use libfuzzer_sys::fuzz_target;
use pathbool::FillRule;

// Reversing a path negates its winding numbers, everywhere.
fuzz_target!(|data: &[u8]| {
    let mut u = Unstructured::new(data);
    let Ok(path) = pathbool::arbitrary::closed_path(100.0, 3, &mut u) else {
        return;
    };
    let Ok(p) = pathbool::arbitrary::point(120.0, &mut u) else {
        return;
    };
    let w = path.winding_count(p);
    assert_eq!(path.reversed().winding_count(p), -w);
    assert_eq!(path.contains(p, FillRule::NonZero), w != 0);
});
