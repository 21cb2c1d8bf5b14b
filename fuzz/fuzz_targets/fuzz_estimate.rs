//! Fuzz target: frequency estimator
//!
//! Drives `FrequencyEstimator::estimate` with arbitrary clock, scale,
//! pulse count and tick span, and verifies:
//! - No panics or overflow for any input
//! - Zero or one pulse always reads as zero
//! - The result never exceeds `tick_rate × precision` unless saturated
//!
//! cargo fuzz run fuzz_estimate

#![no_main]

use flowdac::frequency::FrequencyEstimator;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|input: (u32, u32, u16, u64)| {
    let (tick_rate, precision, pulses, ticks) = input;
    let est = FrequencyEstimator::new(tick_rate, precision);
    let f = est.estimate(pulses, ticks);

    if pulses <= 1 {
        assert_eq!(f, 0);
        return;
    }
    if f != u32::MAX {
        assert!(u64::from(f) <= u64::from(tick_rate) * u64::from(precision));
    }
});
