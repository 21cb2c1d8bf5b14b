//! Unified error types for the FlowDAC firmware.
//!
//! Only construction-time problems are errors: a calibration table that
//! violates its invariants or a configuration that cannot drive the loop.
//! Runtime anomalies (no pulses, out-of-range frequency) degrade to a
//! defined output value instead and never surface here.
//! All variants are `Copy` so they can be passed around without allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible construction step in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The calibration table failed validation.
    Calibration(CalibrationError),
    /// The loop configuration is unusable.
    Config(ConfigError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Calibration(e) => write!(f, "calibration: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
        }
    }
}

impl core::error::Error for Error {}

// ---------------------------------------------------------------------------
// Calibration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationError {
    /// No breakpoints were supplied.
    Empty,
    /// More breakpoints than the table capacity.
    TooManyPoints { max: usize },
    /// Breakpoint `index` has a lower frequency than its predecessor.
    Unordered { index: usize },
    /// Breakpoint `index` has an output code above the 12-bit range.
    CodeOutOfRange { index: usize },
}

impl fmt::Display for CalibrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "table has no breakpoints"),
            Self::TooManyPoints { max } => write!(f, "table holds at most {max} breakpoints"),
            Self::Unordered { index } => {
                write!(f, "breakpoint {index} decreases in frequency")
            }
            Self::CodeOutOfRange { index } => {
                write!(f, "breakpoint {index} code exceeds 4095")
            }
        }
    }
}

impl From<CalibrationError> for Error {
    fn from(e: CalibrationError) -> Self {
        Self::Calibration(e)
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Timer tick rate of zero.
    ZeroTickRate,
    /// Fixed-point precision multiplier of zero.
    ZeroPrecision,
    /// Refresh-window frequency divisor of zero.
    ZeroDivisor,
    /// Minimum refresh window of zero overflows.
    ZeroRefreshWindow,
    /// Minimum refresh window above the maximum.
    InvertedRefreshWindow { min: u16, max: u16 },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroTickRate => write!(f, "tick rate must be non-zero"),
            Self::ZeroPrecision => write!(f, "precision factor must be non-zero"),
            Self::ZeroDivisor => write!(f, "refresh divisor must be non-zero"),
            Self::ZeroRefreshWindow => write!(f, "minimum refresh window must be non-zero"),
            Self::InvertedRefreshWindow { min, max } => {
                write!(f, "refresh window min {min} exceeds max {max}")
            }
        }
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
