//! Application boundary: the seams between the measurement core and the
//! board.
//!
//! All interaction with timers, interrupt sources, pins and the DAC
//! happens through **port traits** defined in [`ports`], keeping the
//! control loop fully testable without real peripherals.  [`events`]
//! carries what the loop reports outward.

pub mod events;
pub mod ports;
