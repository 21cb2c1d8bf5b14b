//! Frequency → DAC code calibration curve.
//!
//! The sensor is not linear, so the curve is a handful of measured
//! breakpoints joined by straight segments.  Inputs outside the table
//! clamp to the first or last code; nothing is extrapolated.
//!
//! ```text
//!  code
//!  4095 ┤                                   ●────
//!       │                               ╱
//!       │                          ●╱
//!       │              ●────●╱
//!    20 ┤   ●──────●
//!     0 ┼●─●
//!       └──────────────────────────────────────── Hz × 100
//! ```

use heapless::Vec;
use serde::{Deserialize, Serialize};

use crate::drivers::ltc1257::DAC_MAX_CODE;
use crate::error::CalibrationError;

/// Default table capacity.
pub const MAX_BREAKPOINTS: usize = 16;

/// One measured point of the curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Breakpoint {
    /// Scaled frequency (Hz × precision factor).
    pub frequency: u32,
    /// 12-bit DAC code.
    pub code: u16,
}

impl Breakpoint {
    pub const fn new(frequency: u32, code: u16) -> Self {
        Self { frequency, code }
    }
}

/// Factory curve for the Parker flow meter board (Hz × 100, 2.048 V
/// full scale).  The 299/300 pair is a deliberate step: below 3 Hz the
/// output is pinned to zero flow.
pub const PARKER_BREAKPOINTS: [Breakpoint; 12] = [
    Breakpoint::new(0, 0),
    Breakpoint::new(299, 0),
    Breakpoint::new(300, 20),
    Breakpoint::new(1018, 64),
    Breakpoint::new(2303, 128),
    Breakpoint::new(3684, 192),
    Breakpoint::new(4994, 256),
    Breakpoint::new(6410, 320),
    Breakpoint::new(10400, 512),
    Breakpoint::new(11780, 576),
    Breakpoint::new(78533, 3846),
    Breakpoint::new(83507, 4095),
];

/// A validated, immutable calibration table.
///
/// Frequencies are non-decreasing and every code fits 12 bits.  Codes
/// themselves may fall; the output is only monotonic if they don't.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalibrationTable<const N: usize = MAX_BREAKPOINTS> {
    points: Vec<Breakpoint, N>,
}

impl<const N: usize> CalibrationTable<N> {
    /// Validate `points` and copy them into the table.
    pub fn new(points: &[Breakpoint]) -> Result<Self, CalibrationError> {
        if points.is_empty() {
            return Err(CalibrationError::Empty);
        }
        let points = Vec::from_slice(points).map_err(|()| CalibrationError::TooManyPoints { max: N })?;

        for (index, point) in points.iter().enumerate() {
            if point.code > DAC_MAX_CODE {
                return Err(CalibrationError::CodeOutOfRange { index });
            }
            if index > 0 && point.frequency < points[index - 1].frequency {
                return Err(CalibrationError::Unordered { index });
            }
        }

        Ok(Self { points })
    }

    pub fn points(&self) -> &[Breakpoint] {
        &self.points
    }

    /// Saturation floor.
    pub fn first(&self) -> Breakpoint {
        self.points[0]
    }

    /// Saturation ceiling.
    pub fn last(&self) -> Breakpoint {
        self.points[self.points.len() - 1]
    }

    /// Map a scaled frequency onto a DAC code.
    pub fn interpolate(&self, frequency: u32) -> u16 {
        interpolate(&self.points, frequency)
    }
}

impl CalibrationTable<MAX_BREAKPOINTS> {
    /// The factory Parker curve.
    pub fn parker() -> Self {
        let mut points = Vec::new();
        for point in PARKER_BREAKPOINTS {
            // Capacity exceeds the factory table.
            let _ = points.push(point);
        }
        Self { points }
    }
}

/// Piecewise-linear lookup over raw breakpoints.
///
/// Clamps to the first/last code outside the table, returns a
/// breakpoint's own code on an exact hit and floors between points.
/// Returns 0 when there is nothing to look up.
pub fn interpolate(points: &[Breakpoint], frequency: u32) -> u16 {
    let (Some(first), Some(last)) = (points.first(), points.last()) else {
        return 0;
    };
    if frequency >= last.frequency {
        return last.code;
    }
    if frequency <= first.frequency {
        return first.code;
    }

    for pair in points.windows(2) {
        let (lo, hi) = (pair[0], pair[1]);
        if lo.frequency <= frequency && frequency <= hi.frequency {
            if frequency == lo.frequency {
                return lo.code;
            }
            if frequency == hi.frequency {
                return hi.code;
            }
            // lo < frequency < hi, so the span is non-zero.
            let t = i64::from(frequency - lo.frequency);
            let span = i64::from(hi.frequency - lo.frequency);
            let rise = i64::from(hi.code) - i64::from(lo.code);
            let code = i64::from(lo.code) + (t * rise).div_euclid(span);
            return code.clamp(0, i64::from(DAC_MAX_CODE)) as u16;
        }
    }

    0
}
