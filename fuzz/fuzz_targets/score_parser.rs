#![no_main]

use eq_benchmark::cli::parse_score;
use eq_benchmark::compare::validate_individual;
use eq_benchmark::record::MetricValues;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        if let Ok((metric, value)) = parse_score(input) {
            let _ = validate_individual(&MetricValues::new().with(metric, value));
        }
    }
});
