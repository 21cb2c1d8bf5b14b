//! Build-time configuration.
//!
//! The defaults are the constants the Parker board shipped with.  There
//! is no runtime reconfiguration; a different sensor/DAC pairing gets a
//! different `FlowDacConfig` and calibration table at build time.

use serde::{Deserialize, Serialize};

use crate::app::ports::Edge;
use crate::control::refresh::RefreshWindow;
use crate::error::ConfigError;

/// Crystal on the Parker flow meter board.
pub const PARKER_TICK_RATE_HZ: u32 = 11_059_000;

/// Core system configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowDacConfig {
    /// Measurement timer clock (CPU clock, no prescaler).
    pub tick_rate_hz: u32,
    /// Fixed-point scale of frequencies (100 = two decimals).
    pub precision_factor: u32,
    /// Input transition that counts as a pulse.
    pub pulse_edge: Edge,
    /// Adaptive refresh bounds in cadence-timer overflows.
    pub refresh: RefreshWindow,
}

impl Default for FlowDacConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: PARKER_TICK_RATE_HZ,
            precision_factor: 100,
            pulse_edge: Edge::Rising,
            refresh: RefreshWindow::default(),
        }
    }
}

impl FlowDacConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_rate_hz == 0 {
            return Err(ConfigError::ZeroTickRate);
        }
        if self.precision_factor == 0 {
            return Err(ConfigError::ZeroPrecision);
        }
        self.refresh.validate()
    }
}
