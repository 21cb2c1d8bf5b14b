//! Port traits: the boundary between measurement logic and the board.
//!
//! ```text
//!   Board support ──▶ Port trait ──▶ ControlLoop (domain)
//! ```
//!
//! A board-support crate (register access on the AVR, or the simulated
//! board in [`adapters::sim`](crate::adapters::sim)) implements these
//! traits.  The control loop consumes them via generics, so the domain
//! core never touches registers directly.
//!
//! Digital outputs are plain `embedded-hal` [`OutputPin`]s and are not
//! repeated here.  Scoped interrupt masking goes through the
//! `critical-section` crate, whose implementation the HAL provides.
//!
//! [`OutputPin`]: embedded_hal::digital::OutputPin

use serde::{Deserialize, Serialize};

use super::events::LoopEvent;

// ───────────────────────────────────────────────────────────────
// Hardware counters
// ───────────────────────────────────────────────────────────────

/// A free-running hardware counter with an overflow interrupt.
///
/// The software half of the counter (overflow count) lives in
/// [`SharedState`](crate::shared::SharedState); this trait only covers
/// the register side.
pub trait CounterTimer {
    /// Ticks between two overflows (256 for an 8-bit counter).
    const MODULUS: u32;

    /// Current counter value, always below [`Self::MODULUS`].
    fn count(&self) -> u16;

    /// Zero the counter without changing whether it runs.
    fn reset(&mut self);

    /// Connect the counter to its clock.
    fn start(&mut self);

    /// Disconnect the counter from its clock, freezing its value.
    fn stop(&mut self);

    /// Unmask the overflow interrupt source.
    fn enable_overflow_interrupt(&mut self);
}

// ───────────────────────────────────────────────────────────────
// External edge interrupt
// ───────────────────────────────────────────────────────────────

/// Which input transitions raise the pulse interrupt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Edge {
    Rising,
    Falling,
    Any,
}

/// An edge-triggered external interrupt line (INT0 on the AVR).
pub trait EdgeInterrupt {
    /// Configure the input pin and the edge polarity.
    fn configure(&mut self, edge: Edge);

    fn enable(&mut self);

    fn disable(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Global interrupt flag
// ───────────────────────────────────────────────────────────────

/// Global interrupt unmask, used once at the end of start-up.
///
/// Masking for shared-state access is scoped with
/// `critical_section::with` rather than through this trait.
pub trait InterruptControl {
    fn enable_global(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Analog output (driven adapter: domain → DAC)
// ───────────────────────────────────────────────────────────────

/// Write-side port: the domain calls this to set the output voltage.
pub trait AnalogOutput {
    type Error;

    /// Latch a 12-bit code onto the output.  Bits above bit 11 are
    /// discarded.
    fn write_code(&mut self, code: u16) -> Result<(), Self::Error>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`LoopEvent`]s through this port.
pub trait EventSink {
    fn emit(&mut self, event: &LoopEvent);
}

/// Sink that drops every event.
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&mut self, _event: &LoopEvent) {}
}
