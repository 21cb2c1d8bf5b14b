//! Adaptive refresh window.
//!
//! A fast pulse train gives a good estimate in a short window, while a
//! slow one needs longer to see two edges.  The window therefore
//! shrinks as the last estimate grows:
//!
//! ```text
//! threshold = max(max_overflows − last_frequency / frequency_divisor, min_overflows)
//! ```
//!
//! With the Parker defaults (cadence overflow ≈ 5.9 ms) that is ~0.83 s
//! at standstill, ~0.74 s at 10 Hz and the 0.35 s floor from 50 Hz up.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Bounds of the refresh window, in cadence-timer overflows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshWindow {
    /// Shortest window, reached at high flow.
    pub min_overflows: u16,
    /// Longest window, used at zero flow.
    pub max_overflows: u16,
    /// Scaled-frequency units per overflow of shrink.
    pub frequency_divisor: u32,
}

impl Default for RefreshWindow {
    fn default() -> Self {
        Self {
            min_overflows: 60,
            max_overflows: 140,
            frequency_divisor: 63,
        }
    }
}

impl RefreshWindow {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.frequency_divisor == 0 {
            return Err(ConfigError::ZeroDivisor);
        }
        if self.min_overflows == 0 {
            return Err(ConfigError::ZeroRefreshWindow);
        }
        if self.min_overflows > self.max_overflows {
            return Err(ConfigError::InvertedRefreshWindow {
                min: self.min_overflows,
                max: self.max_overflows,
            });
        }
        Ok(())
    }

    /// Cadence overflows to wait before re-estimating.
    pub fn threshold(&self, last_frequency: u32) -> u16 {
        let shrink = last_frequency
            .checked_div(self.frequency_divisor)
            .unwrap_or(0);
        let shrink = u16::try_from(shrink).unwrap_or(u16::MAX);
        self.max_overflows
            .saturating_sub(shrink)
            .max(self.min_overflows)
    }

    /// Whether `cadence_overflows` has passed the threshold.
    pub fn is_due(&self, cadence_overflows: u16, last_frequency: u32) -> bool {
        cadence_overflows > self.threshold(last_frequency)
    }
}
