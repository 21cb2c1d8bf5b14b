//! Outbound control-loop events.
//!
//! The [`ControlLoop`](crate::control::ControlLoop) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other side
//! decide what to do with them: log to a debug UART, count them in a test,
//! or drop them entirely on a part with no spare pins.

use crate::control::{Measurement, Phase};

/// Structured events emitted by the control loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopEvent {
    /// Start-up finished; carries the first refresh threshold (overflows).
    Started { threshold: u16 },

    /// The loop moved between phases.
    PhaseChanged { from: Phase, to: Phase },

    /// A measurement cycle completed and the DAC was written.
    OutputUpdated(Measurement),

    /// The DAC write failed; the previous output is still latched.
    OutputFailed { code: u16 },
}
