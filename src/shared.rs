//! Counters shared between the interrupt handlers and the main loop.
//!
//! ```text
//! ┌──────────────┐               ┌─────────┐              ┌──────────┐
//! │ INT0 ISR     │──────────────▶│         │              │          │
//! │ TIMER0 OVF   │──────────────▶│ Shared  │─────────────▶│ Control  │
//! │ TIMER1 OVF   │──────────────▶│ State   │ close_window │ loop     │
//! └──────────────┘               └─────────┘              └──────────┘
//! ```
//!
//! The target is an 8-bit core, so even a `u16` read is two loads and
//! there are no atomic read-modify-write instructions.  Every access goes
//! through a `critical_section::Mutex`.  Inside an ISR the section is
//! already in force (the core clears the global flag on entry), so
//! `critical_section::with` only saves and restores the status register
//! there and never re-enables anything early.

use core::cell::Cell;

use critical_section::{CriticalSection, Mutex};

/// Measurement-timer position recorded at a pulse edge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MeasurementSnapshot {
    /// Measurement-timer overflows since the window opened.
    pub overflows: u32,
    /// Hardware counter value at the edge (0..MODULUS).
    pub sub_ticks: u16,
}

impl MeasurementSnapshot {
    pub const ZERO: Self = Self {
        overflows: 0,
        sub_ticks: 0,
    };

    /// Ticks elapsed between the first pulse of the window and this edge.
    pub fn elapsed_ticks(&self, modulus: u32) -> u64 {
        u64::from(self.overflows) * u64::from(modulus) + u64::from(self.sub_ticks)
    }
}

/// What a closed measurement window handed to the main loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Window {
    /// Edges seen during the window (saturating).
    pub pulses: u16,
    /// Position of the most recent edge.
    pub snapshot: MeasurementSnapshot,
}

#[derive(Debug, Clone, Copy)]
struct Counters {
    pulses: u16,
    snapshot: MeasurementSnapshot,
    measurement_overflows: u32,
    cadence_overflows: u16,
}

impl Counters {
    const ZERO: Self = Self {
        pulses: 0,
        snapshot: MeasurementSnapshot::ZERO,
        measurement_overflows: 0,
        cadence_overflows: 0,
    };
}

/// Interrupt-shared counters.  Meant to live in a `static`.
pub struct SharedState {
    inner: Mutex<Cell<Counters>>,
}

impl SharedState {
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(Cell::new(Counters::ZERO)),
        }
    }

    fn update<R>(&self, f: impl FnOnce(&mut Counters) -> R) -> R {
        critical_section::with(|cs| {
            let cell = self.inner.borrow(cs);
            let mut counters = cell.get();
            let out = f(&mut counters);
            cell.set(counters);
            out
        })
    }

    /// Pulse ISR: store the current tick position and count the edge.
    ///
    /// Returns `true` for the first edge of the window.
    pub fn record_pulse(&self, sub_ticks: u16) -> bool {
        self.update(|c| {
            c.snapshot = MeasurementSnapshot {
                overflows: c.measurement_overflows,
                sub_ticks,
            };
            c.pulses = c.pulses.saturating_add(1);
            c.pulses == 1
        })
    }

    /// Measurement-timer overflow ISR.
    pub fn record_measurement_overflow(&self) {
        self.update(|c| c.measurement_overflows = c.measurement_overflows.saturating_add(1));
    }

    /// Cadence-timer overflow ISR.
    pub fn record_cadence_overflow(&self) {
        self.update(|c| c.cadence_overflows = c.cadence_overflows.saturating_add(1));
    }

    pub fn cadence_overflows(&self) -> u16 {
        critical_section::with(|cs| self.inner.borrow(cs).get().cadence_overflows)
    }

    pub fn pulses(&self) -> u16 {
        critical_section::with(|cs| self.inner.borrow(cs).get().pulses)
    }

    /// Read the window and zero every counter in one step.
    ///
    /// Takes the caller's token so the read, the reset and whatever the
    /// caller does to the hardware counters share one masked region.
    pub fn close_window(&self, cs: CriticalSection<'_>) -> Window {
        let cell = self.inner.borrow(cs);
        let counters = cell.replace(Counters::ZERO);
        Window {
            pulses: counters.pulses,
            snapshot: counters.snapshot,
        }
    }
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new()
    }
}
