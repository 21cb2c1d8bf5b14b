//! Flow sensor pulse input (INT0).
//!
//! The sensor emits one pulse per fixed volume, so the pulse rate is the
//! flow rate.  Each qualifying edge records where the measurement timer
//! stands and counts the pulse; the first edge of a window also starts
//! the timer, so dead time before the first pulse never counts as an
//! interval.
//!
//! The body is a few loads and stores.  It does not touch the global
//! interrupt flag: the core masks interrupts on ISR entry, and
//! [`SharedState`] only saves and restores that state.

use crate::app::ports::CounterTimer;
use crate::shared::SharedState;

/// INT0 ISR body.  `timer` is the measurement timer's register handle.
pub fn on_pulse_edge<T: CounterTimer>(shared: &SharedState, timer: &mut T) {
    if shared.record_pulse(timer.count()) {
        timer.start();
    }
}
