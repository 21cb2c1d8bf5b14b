//! Test doubles and harness helpers.
//!
//! Wires a [`ControlLoop`] to a [`SimBoard`] and records every event the
//! loop emits, so tests can assert on the full history.

use flowdac::adapters::sim::{PulseTrain, SimBoard, SimCounter, SimDacPin, SimPulseInput};
use flowdac::app::events::LoopEvent;
use flowdac::app::ports::{AnalogOutput, EventSink};
use flowdac::calibration::CalibrationTable;
use flowdac::config::FlowDacConfig;
use flowdac::control::{Board, ControlLoop, Measurement};
use flowdac::drivers::ltc1257::Ltc1257;
use flowdac::shared::SharedState;

/// Ticks between two polls of the loop.
pub const STEP_TICKS: u32 = 2_048;

/// Upper bound on steps before a test gives up waiting for a cycle.
const MAX_STEPS: u32 = 20_000;

// ── Event recorder ────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<LoopEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn measurements(&self) -> Vec<Measurement> {
        self.events
            .iter()
            .filter_map(|e| match e {
                LoopEvent::OutputUpdated(m) => Some(*m),
                _ => None,
            })
            .collect()
    }

    pub fn failures(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, LoopEvent::OutputFailed { .. }))
            .count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &LoopEvent) {
        self.events.push(*event);
    }
}

// ── Analog outputs ────────────────────────────────────────────

/// Output that rejects every write.
#[derive(Debug, Default)]
pub struct FailingDac {
    pub attempts: Vec<u16>,
}

#[derive(Debug, PartialEq, Eq)]
pub struct BusFault;

impl AnalogOutput for FailingDac {
    type Error = BusFault;

    fn write_code(&mut self, code: u16) -> Result<(), BusFault> {
        self.attempts.push(code);
        Err(BusFault)
    }
}

// ── Harness ───────────────────────────────────────────────────

pub type SimDac<'a> = Ltc1257<SimDacPin<'a>, SimDacPin<'a>, SimDacPin<'a>>;

pub type SimLoop<'a, D = SimDac<'a>> = ControlLoop<
    'a,
    &'a SimCounter<256>,
    &'a SimCounter<65_536>,
    &'a SimPulseInput,
    D,
>;

pub fn sim_dac(board: &SimBoard) -> SimDac<'_> {
    let (din, sck, load) = board.dac_pins();
    Ltc1257::new(din, sck, load).unwrap()
}

/// Build and start a loop on the simulated board with its LTC1257.
pub fn start_loop<'a>(
    shared: &'a SharedState,
    board: &'a SimBoard,
    config: &FlowDacConfig,
    sink: &mut RecordingSink,
) -> SimLoop<'a> {
    start_loop_with(shared, board, sim_dac(board), config, sink)
}

/// Build and start a loop on the simulated board with any output.
pub fn start_loop_with<'a, D: AnalogOutput>(
    shared: &'a SharedState,
    board: &'a SimBoard,
    dac: D,
    config: &FlowDacConfig,
    sink: &mut RecordingSink,
) -> SimLoop<'a, D> {
    let mut control = ControlLoop::new(
        shared,
        Board {
            measurement: &board.measurement,
            cadence: &board.cadence,
            pulse_input: &board.pulse_input,
            dac,
        },
        config,
        CalibrationTable::parker(),
    )
    .unwrap();
    let mut irq = &board.interrupts;
    control.start(&mut irq, sink);
    control
}

/// Drive the pulse train and poll until one cycle completes.
///
/// Returns the poll result of that cycle and the number of steps taken.
pub fn run_one_cycle<D: AnalogOutput>(
    control: &mut SimLoop<'_, D>,
    board: &SimBoard,
    shared: &SharedState,
    train: &mut PulseTrain,
    sink: &mut RecordingSink,
) -> (Result<Measurement, D::Error>, u32) {
    let start = control.cycles();
    for step in 1..=MAX_STEPS {
        train.run(board, shared, STEP_TICKS);
        let polled = control.poll(sink);
        if control.cycles() != start {
            let result = polled.map(|m| m.expect("a completed cycle returns its measurement"));
            return (result, step);
        }
    }
    panic!("no cycle within {MAX_STEPS} steps");
}
