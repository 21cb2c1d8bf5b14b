//! The two overflow-counted timers.
//!
//! - **Measurement** (TIMER0, 8-bit, no prescaler): stopped at zero while
//!   a window waits for its first pulse; the pulse ISR starts it, the
//!   control loop freezes and re-arms it.
//! - **Cadence** (TIMER1, 16-bit, no prescaler): free-running, paces how
//!   often the loop re-estimates whether or not pulses arrive.  At
//!   11.059 MHz it overflows about every 5.9 ms.
//!
//! Each hardware counter is paired with a software overflow count in
//! [`SharedState`], bumped by the ISR bodies at the bottom of this file.

use crate::app::ports::CounterTimer;
use crate::shared::SharedState;

/// Register side of the measurement timer.
pub struct MeasurementTimer<T> {
    hw: T,
}

impl<T: CounterTimer> MeasurementTimer<T> {
    pub fn new(hw: T) -> Self {
        Self { hw }
    }

    pub fn enable_overflow_interrupt(&mut self) {
        self.hw.enable_overflow_interrupt();
    }

    /// Stop counting so the window's tick count can't move.
    pub fn freeze(&mut self) {
        self.hw.stop();
    }

    /// Zero the counter and leave it stopped for the next first pulse.
    ///
    /// The software overflow count is cleared by
    /// [`SharedState::close_window`] in the same critical section.
    pub fn rearm(&mut self) {
        self.hw.stop();
        self.hw.reset();
    }

    pub fn count(&self) -> u16 {
        self.hw.count()
    }
}

/// Register side of the cadence timer.
pub struct CadenceTimer<T> {
    hw: T,
}

impl<T: CounterTimer> CadenceTimer<T> {
    pub fn new(hw: T) -> Self {
        Self { hw }
    }

    pub fn enable_overflow_interrupt(&mut self) {
        self.hw.enable_overflow_interrupt();
    }

    pub fn freeze(&mut self) {
        self.hw.stop();
    }

    /// Zero the counter and let it run.
    pub fn restart(&mut self) {
        self.hw.reset();
        self.hw.start();
    }
}

// ── ISR bodies ────────────────────────────────────────────────

/// TIMER0 overflow.
pub fn on_measurement_overflow(shared: &SharedState) {
    shared.record_measurement_overflow();
}

/// TIMER1 overflow.
pub fn on_cadence_overflow(shared: &SharedState) {
    shared.record_cadence_overflow();
}
