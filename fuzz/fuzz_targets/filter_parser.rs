#![no_main]

use eq_benchmark::filter::FilterSpec;
use eq_benchmark::record::BenchmarkId;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        // Parsing must reject, never panic
        if let Ok(spec) = FilterSpec::from_expr(BenchmarkId(1), input) {
            let _ = spec.describe();
            let _ = FilterSpec::from_expr(BenchmarkId(1), &spec.describe().replace(", ", ","));
        }
    }
});
