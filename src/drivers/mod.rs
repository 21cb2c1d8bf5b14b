//! Peripheral drivers: the serial DAC and the two overflow-counted timers.

pub mod hw_timer;
pub mod ltc1257;
