//! In-memory model of the flow meter board.
//!
//! Stands in for the AVR register layer on the host: two counters with
//! overflow interrupts, the INT0 pulse line, the global interrupt flag
//! and an LTC1257 shift register that decodes what the driver clocks
//! into it.  Time only moves when [`SimBoard::advance`] is called, and
//! ISR bodies run synchronously from there, so a simulation is fully
//! deterministic.
//!
//! The port traits are implemented for shared references, so the
//! control loop and the simulated ISRs can hold the same peripheral.

use core::cell::Cell;
use core::convert::Infallible;

use embedded_hal::digital::{ErrorType, OutputPin};

use crate::app::ports::{CounterTimer, Edge, EdgeInterrupt, InterruptControl};
use crate::drivers::hw_timer;
use crate::drivers::ltc1257::DAC_MAX_CODE;
use crate::sensors::flow;
use crate::shared::SharedState;

// ── Counters ──────────────────────────────────────────────────

/// A counter that wraps every `MODULUS` ticks.
pub struct SimCounter<const MODULUS: u32> {
    count: Cell<u32>,
    running: Cell<bool>,
    irq_enabled: Cell<bool>,
}

impl<const MODULUS: u32> SimCounter<MODULUS> {
    pub const fn new() -> Self {
        Self {
            count: Cell::new(0),
            running: Cell::new(false),
            irq_enabled: Cell::new(false),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.get()
    }

    /// Let `ticks` clock cycles pass.  Returns the overflow interrupts
    /// raised (none while stopped or with the interrupt masked).
    pub fn advance(&self, ticks: u32) -> u32 {
        if !self.running.get() {
            return 0;
        }
        let total = u64::from(self.count.get()) + u64::from(ticks);
        self.count.set((total % u64::from(MODULUS)) as u32);
        let overflows = (total / u64::from(MODULUS)) as u32;
        if self.irq_enabled.get() { overflows } else { 0 }
    }
}

impl<const MODULUS: u32> Default for SimCounter<MODULUS> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const MODULUS: u32> CounterTimer for &SimCounter<MODULUS> {
    const MODULUS: u32 = MODULUS;

    fn count(&self) -> u16 {
        self.count.get() as u16
    }

    fn reset(&mut self) {
        self.count.set(0);
    }

    fn start(&mut self) {
        self.running.set(true);
    }

    fn stop(&mut self) {
        self.running.set(false);
    }

    fn enable_overflow_interrupt(&mut self) {
        self.irq_enabled.set(true);
    }
}

// ── Pulse input and interrupt flag ────────────────────────────

#[derive(Default)]
pub struct SimPulseInput {
    edge: Cell<Option<Edge>>,
    enabled: Cell<bool>,
}

impl SimPulseInput {
    pub const fn new() -> Self {
        Self {
            edge: Cell::new(None),
            enabled: Cell::new(false),
        }
    }

    pub fn edge(&self) -> Option<Edge> {
        self.edge.get()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.get()
    }
}

impl EdgeInterrupt for &SimPulseInput {
    fn configure(&mut self, edge: Edge) {
        self.edge.set(Some(edge));
    }

    fn enable(&mut self) {
        self.enabled.set(true);
    }

    fn disable(&mut self) {
        self.enabled.set(false);
    }
}

#[derive(Default)]
pub struct SimInterrupts {
    enabled: Cell<bool>,
}

impl SimInterrupts {
    pub const fn new() -> Self {
        Self {
            enabled: Cell::new(false),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.get()
    }
}

impl InterruptControl for &SimInterrupts {
    fn enable_global(&mut self) {
        self.enabled.set(true);
    }
}

// ── LTC1257 model ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DacLine {
    Din,
    Sck,
    Load,
}

/// The DAC chip: a 12-bit shift register clocked on SCK rising, copied
/// to the output on LOAD rising.  LOAD idles high (pulled up).
pub struct SimDacChip {
    din: Cell<bool>,
    sck: Cell<bool>,
    load: Cell<bool>,
    shift: Cell<u16>,
    output: Cell<u16>,
    latches: Cell<u32>,
}

impl Default for SimDacChip {
    fn default() -> Self {
        Self::new()
    }
}

impl SimDacChip {
    pub const fn new() -> Self {
        Self {
            din: Cell::new(false),
            sck: Cell::new(false),
            load: Cell::new(true),
            shift: Cell::new(0),
            output: Cell::new(0),
            latches: Cell::new(0),
        }
    }

    fn drive(&self, line: DacLine, level: bool) {
        match line {
            DacLine::Din => self.din.set(level),
            DacLine::Sck => {
                if level && !self.sck.get() {
                    let bit = u16::from(self.din.get());
                    self.shift.set(((self.shift.get() << 1) | bit) & DAC_MAX_CODE);
                }
                self.sck.set(level);
            }
            DacLine::Load => {
                if level && !self.load.get() {
                    self.output.set(self.shift.get());
                    self.latches.set(self.latches.get() + 1);
                }
                self.load.set(level);
            }
        }
    }

    /// Code currently on the output.
    pub fn output_code(&self) -> u16 {
        self.output.get()
    }

    /// Output voltage for the 2.048 V reference.
    pub fn output_millivolts(&self) -> u32 {
        u32::from(self.output.get()) * 2048 / 4096
    }

    /// LOAD rising edges seen.
    pub fn latches(&self) -> u32 {
        self.latches.get()
    }

    pub fn level(&self, line: DacLine) -> bool {
        match line {
            DacLine::Din => self.din.get(),
            DacLine::Sck => self.sck.get(),
            DacLine::Load => self.load.get(),
        }
    }
}

/// One GPIO wired to a [`SimDacChip`] input.
pub struct SimDacPin<'a> {
    chip: &'a SimDacChip,
    line: DacLine,
}

impl ErrorType for SimDacPin<'_> {
    type Error = Infallible;
}

impl OutputPin for SimDacPin<'_> {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.chip.drive(self.line, false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.chip.drive(self.line, true);
        Ok(())
    }
}

// ── Board ─────────────────────────────────────────────────────

/// Measurement counter: 8-bit TIMER0.
pub type SimMeasurementCounter = SimCounter<256>;
/// Cadence counter: 16-bit TIMER1.
pub type SimCadenceCounter = SimCounter<65_536>;

/// Everything on the board the firmware talks to.
#[derive(Default)]
pub struct SimBoard {
    pub measurement: SimMeasurementCounter,
    pub cadence: SimCadenceCounter,
    pub pulse_input: SimPulseInput,
    pub interrupts: SimInterrupts,
    pub dac: SimDacChip,
}

impl SimBoard {
    pub const fn new() -> Self {
        Self {
            measurement: SimCounter::new(),
            cadence: SimCounter::new(),
            pulse_input: SimPulseInput::new(),
            interrupts: SimInterrupts::new(),
            dac: SimDacChip::new(),
        }
    }

    /// DIN, SCK and LOAD, in that order.
    pub fn dac_pins(&self) -> (SimDacPin<'_>, SimDacPin<'_>, SimDacPin<'_>) {
        (
            SimDacPin {
                chip: &self.dac,
                line: DacLine::Din,
            },
            SimDacPin {
                chip: &self.dac,
                line: DacLine::Sck,
            },
            SimDacPin {
                chip: &self.dac,
                line: DacLine::Load,
            },
        )
    }

    /// Let `ticks` CPU cycles pass, running the overflow ISRs.
    pub fn advance(&self, shared: &SharedState, ticks: u32) {
        let measurement = self.measurement.advance(ticks);
        let cadence = self.cadence.advance(ticks);
        if !self.interrupts.is_enabled() {
            return;
        }
        for _ in 0..measurement {
            hw_timer::on_measurement_overflow(shared);
        }
        for _ in 0..cadence {
            hw_timer::on_cadence_overflow(shared);
        }
    }

    /// A qualifying edge on the pulse pin.  Returns whether the ISR ran.
    pub fn edge(&self, shared: &SharedState) -> bool {
        if !(self.interrupts.is_enabled() && self.pulse_input.is_enabled()) {
            return false;
        }
        flow::on_pulse_edge(shared, &mut &self.measurement);
        true
    }
}

// ── Signal source ─────────────────────────────────────────────

/// A constant-rate pulse source feeding a [`SimBoard`].
#[derive(Debug, Clone, Copy)]
pub struct PulseTrain {
    /// Ticks between edges; 0 = no flow.
    period: u32,
    until_next: u32,
}

impl PulseTrain {
    pub fn new(period_ticks: u32) -> Self {
        Self {
            period: period_ticks,
            until_next: period_ticks,
        }
    }

    /// Pulse train for a scaled frequency (Hz × `precision_factor`).
    pub fn from_frequency(tick_rate_hz: u32, precision_factor: u32, frequency: u32) -> Self {
        Self::new(period_for(tick_rate_hz, precision_factor, frequency))
    }

    /// Change the rate; the next edge comes one new period from now.
    pub fn set_frequency(&mut self, tick_rate_hz: u32, precision_factor: u32, frequency: u32) {
        *self = Self::from_frequency(tick_rate_hz, precision_factor, frequency);
    }

    pub fn period(&self) -> u32 {
        self.period
    }

    /// Run the board for `ticks`, delivering every edge that falls in
    /// that span.  Returns the number of edges.
    pub fn run(&mut self, board: &SimBoard, shared: &SharedState, mut ticks: u32) -> u32 {
        if self.period == 0 {
            board.advance(shared, ticks);
            return 0;
        }
        let mut edges = 0;
        while ticks >= self.until_next {
            board.advance(shared, self.until_next);
            ticks -= self.until_next;
            board.edge(shared);
            edges += 1;
            self.until_next = self.period;
        }
        board.advance(shared, ticks);
        self.until_next -= ticks;
        edges
    }
}

fn period_for(tick_rate_hz: u32, precision_factor: u32, frequency: u32) -> u32 {
    if frequency == 0 {
        return 0;
    }
    let period = u64::from(tick_rate_hz) * u64::from(precision_factor) / u64::from(frequency);
    u32::try_from(period.max(1)).unwrap_or(u32::MAX)
}
