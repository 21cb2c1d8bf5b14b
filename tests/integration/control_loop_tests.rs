//! End-to-end control loop behaviour on the simulated board.

use flowdac::adapters::sim::{PulseTrain, SimBoard};
use flowdac::app::events::LoopEvent;
use flowdac::app::ports::Edge;
use flowdac::calibration::CalibrationTable;
use flowdac::config::FlowDacConfig;
use flowdac::control::refresh::RefreshWindow;
use flowdac::control::{Board, ControlLoop, Phase};
use flowdac::error::{ConfigError, Error};
use flowdac::shared::SharedState;

use crate::mock_hw::{
    FailingDac, RecordingSink, STEP_TICKS, run_one_cycle, sim_dac, start_loop, start_loop_with,
};

/// 100.00 Hz at 11.059 MHz.
const PERIOD_100HZ: u32 = 110_590;

// ── Start-up ──────────────────────────────────────────────────

#[test]
fn start_arms_interrupts_and_cadence() {
    let shared = SharedState::new();
    let board = SimBoard::new();
    let mut sink = RecordingSink::new();
    let control = start_loop(&shared, &board, &FlowDacConfig::default(), &mut sink);

    assert_eq!(board.pulse_input.edge(), Some(Edge::Rising));
    assert!(board.pulse_input.is_enabled());
    assert!(board.interrupts.is_enabled());
    assert!(board.cadence.is_running());
    assert!(!board.measurement.is_running(), "measurement waits for the first pulse");
    assert_eq!(control.phase(), Phase::Idle);
    assert_eq!(sink.events, vec![LoopEvent::Started { threshold: 140 }]);
}

#[test]
fn configured_edge_reaches_the_pin() {
    let shared = SharedState::new();
    let board = SimBoard::new();
    let mut sink = RecordingSink::new();
    let config = FlowDacConfig {
        pulse_edge: Edge::Falling,
        ..FlowDacConfig::default()
    };
    let _control = start_loop(&shared, &board, &config, &mut sink);
    assert_eq!(board.pulse_input.edge(), Some(Edge::Falling));
}

#[test]
fn invalid_config_is_rejected() {
    let shared = SharedState::new();
    let board = SimBoard::new();
    let config = FlowDacConfig {
        refresh: RefreshWindow {
            frequency_divisor: 0,
            ..RefreshWindow::default()
        },
        ..FlowDacConfig::default()
    };
    let result = ControlLoop::new(
        &shared,
        Board {
            measurement: &board.measurement,
            cadence: &board.cadence,
            pulse_input: &board.pulse_input,
            dac: sim_dac(&board),
        },
        &config,
        CalibrationTable::parker(),
    );
    assert!(matches!(
        result,
        Err(Error::Config(ConfigError::ZeroDivisor))
    ));
}

// ── Measurement cycles ────────────────────────────────────────

#[test]
fn steady_100hz_flow_maps_to_code_492() {
    let shared = SharedState::new();
    let board = SimBoard::new();
    let mut sink = RecordingSink::new();
    let mut control = start_loop(&shared, &board, &FlowDacConfig::default(), &mut sink);
    let mut train = PulseTrain::new(PERIOD_100HZ);

    let (m, steps) = run_one_cycle(&mut control, &board, &shared, &mut train, &mut sink);
    let m = m.unwrap();

    // 141 cadence overflows of 65536 ticks.
    assert_eq!(steps * STEP_TICKS, 141 * 65_536);
    // Edges at k * 110590 for k = 1..=83.
    assert_eq!(m.pulses, 83);
    assert_eq!(m.elapsed_ticks, 82 * u64::from(PERIOD_100HZ));
    assert_eq!(m.frequency, 10_000);
    assert_eq!(m.code, 492);
    assert_eq!(m.next_threshold, 60);

    assert_eq!(board.dac.output_code(), 492);
    assert_eq!(board.dac.output_millivolts(), 246);
    assert_eq!(control.last_frequency(), 10_000);
    assert_eq!(control.cycles(), 1);
}

#[test]
fn fast_flow_shortens_the_next_window() {
    let shared = SharedState::new();
    let board = SimBoard::new();
    let mut sink = RecordingSink::new();
    let mut control = start_loop(&shared, &board, &FlowDacConfig::default(), &mut sink);
    let mut train = PulseTrain::new(PERIOD_100HZ);

    let _ = run_one_cycle(&mut control, &board, &shared, &mut train, &mut sink);
    let (m, steps) = run_one_cycle(&mut control, &board, &shared, &mut train, &mut sink);

    // Threshold 60: due on the 61st overflow after the restart.
    assert_eq!(steps * STEP_TICKS, 61 * 65_536);
    assert_eq!(m.unwrap().frequency, 10_000);
    assert_eq!(sink.measurements().len(), 2);
}

#[test]
fn no_flow_writes_zero_after_longest_window() {
    let shared = SharedState::new();
    let board = SimBoard::new();
    let mut sink = RecordingSink::new();
    let mut control = start_loop(&shared, &board, &FlowDacConfig::default(), &mut sink);
    let mut train = PulseTrain::new(0);

    let (m, steps) = run_one_cycle(&mut control, &board, &shared, &mut train, &mut sink);
    let m = m.unwrap();

    assert_eq!(steps * STEP_TICKS, 141 * 65_536);
    assert_eq!(m.pulses, 0);
    assert_eq!(m.frequency, 0);
    assert_eq!(m.code, 0);
    assert_eq!(m.next_threshold, 140);
    assert_eq!(board.dac.latches(), 1);
}

#[test]
fn single_pulse_window_reads_as_zero() {
    let shared = SharedState::new();
    let board = SimBoard::new();
    let mut sink = RecordingSink::new();
    let mut control = start_loop(&shared, &board, &FlowDacConfig::default(), &mut sink);

    // Slower than one window: exactly one edge lands in the first.
    let mut train = PulseTrain::new(5_000_000);
    let (m, _) = run_one_cycle(&mut control, &board, &shared, &mut train, &mut sink);
    let m = m.unwrap();

    assert_eq!(m.pulses, 1);
    assert_eq!(m.frequency, 0);
    assert_eq!(m.code, 0);
}

#[test]
fn output_follows_flow_changes() {
    let shared = SharedState::new();
    let board = SimBoard::new();
    let mut sink = RecordingSink::new();
    let config = FlowDacConfig::default();
    let mut control = start_loop(&shared, &board, &config, &mut sink);
    let table = CalibrationTable::parker();

    let mut train = PulseTrain::new(0);
    for frequency in [10_000, 40_000, 83_300, 1_000] {
        train.set_frequency(config.tick_rate_hz, config.precision_factor, frequency);
        // First window after a change straddles both rates.
        let _ = run_one_cycle(&mut control, &board, &shared, &mut train, &mut sink);
        let (m, _) = run_one_cycle(&mut control, &board, &shared, &mut train, &mut sink);
        let m = m.unwrap();

        let expected = u64::from(config.tick_rate_hz) * u64::from(config.precision_factor)
            / u64::from(train.period());
        assert_eq!(u64::from(m.frequency), expected, "source {frequency}");
        assert_eq!(m.code, table.interpolate(m.frequency));
        assert_eq!(board.dac.output_code(), m.code);
    }
}

#[test]
fn windows_reset_between_cycles() {
    let shared = SharedState::new();
    let board = SimBoard::new();
    let mut sink = RecordingSink::new();
    let mut control = start_loop(&shared, &board, &FlowDacConfig::default(), &mut sink);
    let mut train = PulseTrain::new(PERIOD_100HZ);

    let _ = run_one_cycle(&mut control, &board, &shared, &mut train, &mut sink);
    assert_eq!(shared.pulses(), 0);
    assert_eq!(shared.cadence_overflows(), 0);
    assert!(!board.measurement.is_running());
    assert!(board.cadence.is_running());
}

// ── Phases and events ─────────────────────────────────────────

#[test]
fn phases_follow_the_window() {
    let shared = SharedState::new();
    let board = SimBoard::new();
    let mut sink = RecordingSink::new();
    let mut control = start_loop(&shared, &board, &FlowDacConfig::default(), &mut sink);
    let mut train = PulseTrain::new(PERIOD_100HZ);

    train.run(&board, &shared, PERIOD_100HZ - 1);
    assert_eq!(control.poll(&mut sink), Ok(None));
    assert_eq!(control.phase(), Phase::Idle);

    train.run(&board, &shared, 1);
    assert_eq!(control.poll(&mut sink), Ok(None));
    assert_eq!(control.phase(), Phase::Measuring);

    let _ = run_one_cycle(&mut control, &board, &shared, &mut train, &mut sink);
    assert_eq!(control.phase(), Phase::Idle);

    let phases: Vec<_> = sink
        .events
        .iter()
        .filter_map(|e| match e {
            LoopEvent::PhaseChanged { from, to } => Some((*from, *to)),
            _ => None,
        })
        .collect();
    assert_eq!(
        phases,
        vec![
            (Phase::Idle, Phase::Measuring),
            (Phase::Measuring, Phase::Estimating),
            (Phase::Estimating, Phase::Idle),
        ]
    );
    assert!(matches!(sink.events.last(), Some(LoopEvent::OutputUpdated(_))));
}

#[test]
fn dac_failure_still_closes_the_window() {
    let shared = SharedState::new();
    let board = SimBoard::new();
    let mut sink = RecordingSink::new();
    let mut control = start_loop_with(
        &shared,
        &board,
        FailingDac::default(),
        &FlowDacConfig::default(),
        &mut sink,
    );
    let mut train = PulseTrain::new(PERIOD_100HZ);

    let (result, _) = run_one_cycle(&mut control, &board, &shared, &mut train, &mut sink);
    assert!(result.is_err());
    assert_eq!(control.dac().attempts, vec![492]);
    assert_eq!(sink.failures(), 1);
    assert!(sink.measurements().is_empty());

    // The loop carries on with the new estimate.
    assert_eq!(control.last_frequency(), 10_000);
    assert_eq!(control.phase(), Phase::Idle);
    assert_eq!(shared.pulses(), 0);
    assert!(board.cadence.is_running());
}
