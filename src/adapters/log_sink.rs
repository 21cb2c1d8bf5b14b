//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing loop events to the `log` facade.
//! On the AVR build no logger is installed and the calls compile down
//! to nothing; the simulation binary routes them to stdout.

use log::{debug, info, warn};

use crate::app::events::LoopEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`LoopEvent`].
pub struct LogEventSink {
    /// Fixed-point scale of reported frequencies.
    precision_factor: u32,
}

impl LogEventSink {
    pub fn new(precision_factor: u32) -> Self {
        Self { precision_factor }
    }

    /// Digits after the decimal point for a power-of-ten scale.
    fn decimals(&self) -> usize {
        let mut digits = 0;
        let mut scale = self.precision_factor;
        while scale >= 10 {
            scale /= 10;
            digits += 1;
        }
        digits
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &LoopEvent) {
        match event {
            LoopEvent::Started { threshold } => {
                info!("START | refresh after {} overflows", threshold);
            }
            LoopEvent::PhaseChanged { from, to } => {
                debug!("PHASE | {:?} -> {:?}", from, to);
            }
            LoopEvent::OutputUpdated(m) => {
                let scale = self.precision_factor.max(1);
                info!(
                    "FLOW  | f={}.{:0width$} Hz | pulses={} | ticks={} | code={} ({} mV) | next={}",
                    m.frequency / scale,
                    m.frequency % scale,
                    m.pulses,
                    m.elapsed_ticks,
                    m.code,
                    u32::from(m.code) / 2,
                    m.next_threshold,
                    width = self.decimals(),
                );
            }
            LoopEvent::OutputFailed { code } => {
                warn!("FLOW  | DAC write of code {} failed", code);
            }
        }
    }
}
