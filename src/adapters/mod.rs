//! Adapters: concrete implementations of the port traits.
//!
//! | Adapter    | Implements                          | Connects to          |
//! |------------|-------------------------------------|----------------------|
//! | `log_sink` | EventSink                           | `log` facade         |
//! | `sim`      | CounterTimer, EdgeInterrupt,        | in-memory board      |
//! |            | InterruptControl, OutputPin         | model (host runs)    |

pub mod log_sink;
pub mod sim;
