//! Sensor inputs.  The flow meter is the only one: a pulse train on the
//! external interrupt pin.

pub mod flow;
