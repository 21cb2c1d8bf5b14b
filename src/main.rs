//! flowdac-sim: run the firmware against the simulated board.
//!
//! ```text
//!   PulseTrain ──edges──▶ SimBoard ──ISR bodies──▶ SharedState
//!                            ▲                          │
//!                            │ timers, DAC pins         ▼
//!                            └──────────────────── ControlLoop ──▶ LogEventSink
//! ```
//!
//! Sweeps a flow profile (scaled Hz, held for N measurement cycles) and
//! logs every output update together with the voltage the simulated
//! LTC1257 actually latched.
//!
//! ```text
//! cargo run --features sim --bin flowdac-sim [freq:cycles ...]
//! ```
#![deny(unused_must_use)]

use anyhow::{Context, Result, bail};
use log::{Level, LevelFilter, Log, Metadata, Record, info};

use flowdac::adapters::log_sink::LogEventSink;
use flowdac::adapters::sim::{PulseTrain, SimBoard};
use flowdac::calibration::CalibrationTable;
use flowdac::config::FlowDacConfig;
use flowdac::control::{Board, ControlLoop};
use flowdac::drivers::ltc1257::Ltc1257;
use flowdac::shared::SharedState;

static SHARED: SharedState = SharedState::new();

/// Ticks the simulation advances between two main-loop polls.
const POLL_STEP_TICKS: u32 = 2_048;

/// 0, 5, 10, 100, 400, 833 Hz and back to standstill.
const DEFAULT_PROFILE: &[(u32, u32)] = &[
    (0, 2),
    (500, 3),
    (1_000, 3),
    (10_000, 3),
    (40_000, 3),
    (83_300, 3),
    (0, 2),
];

// ── Logger ────────────────────────────────────────────────────

struct StdoutLogger;

impl Log for StdoutLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= Level::Info
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            println!("{:<5} {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: StdoutLogger = StdoutLogger;

// ── Profile parsing ───────────────────────────────────────────

fn parse_profile(args: &[String]) -> Result<Vec<(u32, u32)>> {
    if args.is_empty() {
        return Ok(DEFAULT_PROFILE.to_vec());
    }
    args.iter()
        .map(|arg| {
            let Some((freq, cycles)) = arg.split_once(':') else {
                bail!("expected FREQ:CYCLES, got '{arg}'");
            };
            let freq = freq
                .parse()
                .with_context(|| format!("bad frequency in '{arg}'"))?;
            let cycles = cycles
                .parse()
                .with_context(|| format!("bad cycle count in '{arg}'"))?;
            Ok((freq, cycles))
        })
        .collect()
}

// ── Entry point ───────────────────────────────────────────────

fn main() -> Result<()> {
    log::set_logger(&LOGGER).map_err(|e| anyhow::anyhow!("logger: {e}"))?;
    log::set_max_level(LevelFilter::Info);

    let args: Vec<String> = std::env::args().skip(1).collect();
    let profile = parse_profile(&args)?;

    let config = FlowDacConfig::default();
    let table = CalibrationTable::parker();
    let board = SimBoard::new();

    let (din, sck, load) = board.dac_pins();
    let dac = Ltc1257::new(din, sck, load).unwrap_or_else(|e| match e {});

    let mut control = ControlLoop::new(
        &SHARED,
        Board {
            measurement: &board.measurement,
            cadence: &board.cadence,
            pulse_input: &board.pulse_input,
            dac,
        },
        &config,
        table,
    )
    .context("control loop rejected the configuration")?;

    let mut sink = LogEventSink::new(config.precision_factor);
    let mut irq = &board.interrupts;
    control.start(&mut irq, &mut sink);

    let mut train = PulseTrain::new(0);
    for &(frequency, cycles) in &profile {
        train.set_frequency(config.tick_rate_hz, config.precision_factor, frequency);
        info!(
            "SIM   | source {}.{:02} Hz (period {} ticks) for {} cycles",
            frequency / 100,
            frequency % 100,
            train.period(),
            cycles
        );

        let target = control.cycles().wrapping_add(cycles);
        while control.cycles() != target {
            train.run(&board, &SHARED, POLL_STEP_TICKS);
            let Ok(update) = control.poll(&mut sink);
            if update.is_some() {
                info!(
                    "SIM   | DAC output {} mV (code {})",
                    board.dac.output_millivolts(),
                    board.dac.output_code()
                );
            }
        }
    }

    info!("SIM   | done after {} cycles", control.cycles());
    Ok(())
}
