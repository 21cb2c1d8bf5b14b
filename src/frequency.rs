//! Pulse frequency from a closed measurement window.
//!
//! The measurement timer starts on the first edge of a window, so the
//! snapshot taken at the last edge spans exactly `pulses - 1` periods.
//! Frequencies are fixed-point: Hz × `precision_factor` (100 gives two
//! decimal places).  Everything is integer arithmetic; the numerator
//! `tick_rate × precision` does not fit 32 bits for fast clocks, so
//! intermediates are `u64`.

use crate::config::FlowDacConfig;
use crate::shared::Window;

/// Converts tick counts into scaled frequency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrequencyEstimator {
    tick_rate_hz: u32,
    precision_factor: u32,
}

impl FrequencyEstimator {
    pub const fn new(tick_rate_hz: u32, precision_factor: u32) -> Self {
        Self {
            tick_rate_hz,
            precision_factor,
        }
    }

    pub fn from_config(config: &FlowDacConfig) -> Self {
        Self::new(config.tick_rate_hz, config.precision_factor)
    }

    pub fn tick_rate_hz(&self) -> u32 {
        self.tick_rate_hz
    }

    pub fn precision_factor(&self) -> u32 {
        self.precision_factor
    }

    /// Scaled frequency for `pulses` edges spread over `elapsed_ticks`.
    ///
    /// Zero or one edge has no interval to measure and yields 0.  An
    /// average period below one tick saturates to `u32::MAX`.
    pub fn estimate(&self, pulses: u16, elapsed_ticks: u64) -> u32 {
        if pulses <= 1 {
            return 0;
        }
        let period = elapsed_ticks / u64::from(pulses - 1);
        if period == 0 {
            return u32::MAX;
        }
        let numerator = u64::from(self.tick_rate_hz) * u64::from(self.precision_factor);
        u32::try_from(numerator / period).unwrap_or(u32::MAX)
    }

    /// Estimate straight from a closed window of a timer with `modulus`
    /// ticks per overflow.
    pub fn estimate_window(&self, window: &Window, modulus: u32) -> u32 {
        self.estimate(window.pulses, window.snapshot.elapsed_ticks(modulus))
    }
}
