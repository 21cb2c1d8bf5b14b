//! The main control loop.
//!
//! ```text
//!  Idle ──first pulse──▶ Measuring ──cadence > threshold──▶ Estimating
//!   ▲  └──────────────── cadence > threshold ──────────────────▶ │
//!   └──────────────── window closed, DAC written ◀────────────────┘
//! ```
//!
//! There is no scheduler: the firmware entry point calls [`ControlLoop::run`]
//! (or [`ControlLoop::poll`] in a loop) and everything else happens in the
//! three ISR bodies.  A cycle freezes both timers, closes the window,
//! estimates, interpolates and writes the DAC inside one critical section,
//! then re-arms the measurement timer and restarts the cadence timer
//! before interrupts come back.

pub mod refresh;

use core::convert::Infallible;

use log::{debug, info, warn};

use crate::app::events::LoopEvent;
use crate::app::ports::{AnalogOutput, CounterTimer, Edge, EdgeInterrupt, EventSink, InterruptControl};
use crate::calibration::{CalibrationTable, MAX_BREAKPOINTS};
use crate::config::FlowDacConfig;
use crate::drivers::hw_timer::{CadenceTimer, MeasurementTimer};
use crate::error;
use crate::frequency::FrequencyEstimator;
use crate::shared::SharedState;
use refresh::RefreshWindow;

/// Where the loop is within a measurement window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Window open, no pulse yet; measurement timer stopped.
    Idle,
    /// At least one pulse seen; measurement timer running.
    Measuring,
    /// Counters frozen while the output is computed and written.
    Estimating,
}

/// Result of one measurement cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Measurement {
    /// Pulses counted in the window.
    pub pulses: u16,
    /// Ticks from the first to the last pulse.
    pub elapsed_ticks: u64,
    /// Scaled frequency (Hz × precision factor).
    pub frequency: u32,
    /// Code written to the DAC.
    pub code: u16,
    /// Refresh threshold for the next window.
    pub next_threshold: u16,
}

/// Peripherals handed to the loop.
pub struct Board<M, C, X, D> {
    /// 8-bit measurement counter.
    pub measurement: M,
    /// 16-bit cadence counter.
    pub cadence: C,
    /// Flow pulse interrupt line.
    pub pulse_input: X,
    /// Analog output.
    pub dac: D,
}

/// Pulse-rate → analog-output loop.
pub struct ControlLoop<'s, M, C, X, D, const N: usize = MAX_BREAKPOINTS> {
    shared: &'s SharedState,
    measurement: MeasurementTimer<M>,
    cadence: CadenceTimer<C>,
    pulse_input: X,
    dac: D,
    estimator: FrequencyEstimator,
    table: CalibrationTable<N>,
    refresh: RefreshWindow,
    pulse_edge: Edge,
    last_frequency: u32,
    phase: Phase,
    cycles: u32,
}

impl<'s, M, C, X, D, const N: usize> ControlLoop<'s, M, C, X, D, N>
where
    M: CounterTimer,
    C: CounterTimer,
    X: EdgeInterrupt,
    D: AnalogOutput,
{
    /// Assemble the loop.  Does not touch the hardware; call
    /// [`start`](Self::start) next.
    pub fn new(
        shared: &'s SharedState,
        board: Board<M, C, X, D>,
        config: &FlowDacConfig,
        table: CalibrationTable<N>,
    ) -> error::Result<Self> {
        config.validate()?;
        Ok(Self {
            shared,
            measurement: MeasurementTimer::new(board.measurement),
            cadence: CadenceTimer::new(board.cadence),
            pulse_input: board.pulse_input,
            dac: board.dac,
            estimator: FrequencyEstimator::from_config(config),
            table,
            refresh: config.refresh,
            pulse_edge: config.pulse_edge,
            last_frequency: 0,
            phase: Phase::Idle,
            cycles: 0,
        })
    }

    /// Power-on sequence: arm the interrupt sources, open the first
    /// window, start the cadence timer and unmask interrupts.
    pub fn start(&mut self, irq: &mut impl InterruptControl, sink: &mut impl EventSink) {
        self.pulse_input.configure(self.pulse_edge);
        self.measurement.enable_overflow_interrupt();
        self.cadence.enable_overflow_interrupt();
        self.pulse_input.enable();

        let shared = self.shared;
        critical_section::with(|cs| {
            shared.close_window(cs);
            self.measurement.rearm();
            self.cadence.restart();
        });
        irq.enable_global();

        let threshold = self.refresh.threshold(self.last_frequency);
        info!(
            "loop: started (edge={:?}, tick={} Hz, window={} overflows, {} breakpoints)",
            self.pulse_edge,
            self.estimator.tick_rate_hz(),
            threshold,
            self.table.points().len()
        );
        sink.emit(&LoopEvent::Started { threshold });
    }

    /// One main-loop iteration.
    ///
    /// Returns the measurement when the cadence threshold tripped and a
    /// cycle ran.  A failed DAC write still closes the window and
    /// restarts the timers before the error is returned.
    pub fn poll(&mut self, sink: &mut impl EventSink) -> Result<Option<Measurement>, D::Error> {
        if !self
            .refresh
            .is_due(self.shared.cadence_overflows(), self.last_frequency)
        {
            let phase = if self.shared.pulses() == 0 {
                Phase::Idle
            } else {
                Phase::Measuring
            };
            self.set_phase(phase, sink);
            return Ok(None);
        }

        self.set_phase(Phase::Estimating, sink);
        let (measurement, written) = self.cycle();
        self.last_frequency = measurement.frequency;
        self.cycles = self.cycles.wrapping_add(1);
        self.set_phase(Phase::Idle, sink);

        match written {
            Ok(()) => {
                debug!(
                    "loop: pulses={} ticks={} f={} code={} next={}",
                    measurement.pulses,
                    measurement.elapsed_ticks,
                    measurement.frequency,
                    measurement.code,
                    measurement.next_threshold
                );
                sink.emit(&LoopEvent::OutputUpdated(measurement));
                Ok(Some(measurement))
            }
            Err(e) => {
                warn!("loop: DAC write failed (code={}), output unchanged", measurement.code);
                sink.emit(&LoopEvent::OutputFailed {
                    code: measurement.code,
                });
                Err(e)
            }
        }
    }

    /// Poll forever.  Only returns if the DAC reports an error.
    pub fn run(&mut self, sink: &mut impl EventSink) -> Result<Infallible, D::Error> {
        loop {
            self.poll(sink)?;
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Scaled frequency from the most recent cycle.
    pub fn last_frequency(&self) -> u32 {
        self.last_frequency
    }

    /// Completed cycles since start (wrapping).
    pub fn cycles(&self) -> u32 {
        self.cycles
    }

    pub fn dac(&self) -> &D {
        &self.dac
    }

    pub fn table(&self) -> &CalibrationTable<N> {
        &self.table
    }

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------

    fn cycle(&mut self) -> (Measurement, Result<(), D::Error>) {
        let shared = self.shared;
        critical_section::with(|cs| {
            self.measurement.freeze();
            self.cadence.freeze();

            let window = shared.close_window(cs);
            let elapsed_ticks = window.snapshot.elapsed_ticks(M::MODULUS);
            let frequency = self.estimator.estimate(window.pulses, elapsed_ticks);
            let code = self.table.interpolate(frequency);
            let written = self.dac.write_code(code);

            self.measurement.rearm();
            self.cadence.restart();

            let measurement = Measurement {
                pulses: window.pulses,
                elapsed_ticks,
                frequency,
                code,
                next_threshold: self.refresh.threshold(frequency),
            };
            (measurement, written)
        })
    }

    fn set_phase(&mut self, next: Phase, sink: &mut impl EventSink) {
        if next != self.phase {
            debug!("loop: {:?} -> {:?}", self.phase, next);
            sink.emit(&LoopEvent::PhaseChanged {
                from: self.phase,
                to: next,
            });
            self.phase = next;
        }
    }
}
