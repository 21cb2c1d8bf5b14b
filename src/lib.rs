//! FlowDAC firmware library.
//!
//! Turns the pulse train of a flow meter into a 0 – 2.048 V signal on an
//! LTC1257 DAC, on an 8-bit AVR with no FPU and a few hundred bytes of
//! RAM.  Exposes the pure-logic modules for integration testing; every
//! register access sits behind the port traits in [`app::ports`].
//!
//! | Module              | Role                                           |
//! |---------------------|------------------------------------------------|
//! | `sensors::flow`     | INT0 ISR body: timestamp and count each pulse  |
//! | `drivers::hw_timer` | measurement / cadence timers and their ISRs    |
//! | `shared`            | interrupt-shared counters                      |
//! | `frequency`         | window → fixed-point frequency                 |
//! | `calibration`       | frequency → DAC code (piecewise linear)        |
//! | `drivers::ltc1257`  | bit-banged 12-bit serial DAC                   |
//! | `control`           | the main loop and its adaptive refresh window  |
//! | `adapters`          | log sink and the simulated board               |

#![cfg_attr(not(test), no_std)]
#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod calibration;
pub mod config;
pub mod control;
pub mod drivers;
pub mod error;
pub mod frequency;
pub mod sensors;
pub mod shared;
