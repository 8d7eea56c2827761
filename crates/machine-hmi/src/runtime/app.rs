use crate::runtime::config::{RuntimeConfig, RuntimeError};
use crate::runtime::display::render_status;
use crate::runtime::history::SnapshotHistory;
use crate::runtime::logging::init_tracing;
use crate::runtime::operator::{spawn_stdin_reader, ConsoleInput};
use crate::runtime::telemetry;
use machine_core::{Command, CommandOutcome, Machine, NoiseSource, SeededNoise, TimeBase};
use std::io::Write;
use std::process::ExitCode;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionStats {
    pub ticks: u64,
    pub transitions: u64,
    pub rejected_commands: u64,
    pub max_temperature_c: f64,
}

pub fn run_from_args() -> ExitCode {
    let config = RuntimeConfig::from_env();
    if config.show_help {
        RuntimeConfig::print_help();
        return ExitCode::SUCCESS;
    }

    init_tracing(config.json_logs);
    match run(config) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "machine-hmi failed");
            ExitCode::FAILURE
        }
    }
}

pub fn run(config: RuntimeConfig) -> Result<SessionStats, RuntimeError> {
    telemetry::init();
    let _metrics_handle = telemetry::start_metrics_server(&config.metrics_addr);

    let engine_config = config.load_engine_config()?;
    let seed = config.seed.unwrap_or_else(rand::random);
    info!(
        seed,
        tick_ms = config.tick_interval.as_millis(),
        overheat_threshold_c = engine_config.overheat_threshold_c,
        recovery_exit_c = engine_config.recovery_exit_c,
        overheat_tick_limit = engine_config.overheat_tick_limit,
        "Starting machine simulation"
    );
    let mut machine = Machine::new(engine_config, SeededNoise::new(seed))?;

    let (tx, rx) = mpsc::channel();
    if config.console {
        let _reader = spawn_stdin_reader(tx);
        info!("Console ready. Type start, stop, reset, status or quit.");
    } else {
        drop(tx);
        info!("Console disabled");
    }

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let stats = run_session(&mut machine, &config, &rx, &mut out)?;

    info!(
        ticks = stats.ticks,
        transitions = stats.transitions,
        rejected_commands = stats.rejected_commands,
        max_temperature_c = stats.max_temperature_c,
        "Run complete"
    );
    Ok(stats)
}

/// Drive the tick loop until a stop condition is met.
///
/// Console input is drained between ticks so the machine only ever has one
/// writer.
pub(crate) fn run_session<N: NoiseSource, W: Write>(
    machine: &mut Machine<N>,
    config: &RuntimeConfig,
    inputs: &Receiver<ConsoleInput>,
    out: &mut W,
) -> Result<SessionStats, RuntimeError> {
    let timebase = TimeBase::new();
    let deadline = config.run_seconds.map(Duration::from_secs);
    let mut history = SnapshotHistory::new(config.history_len);
    let mut stats = SessionStats {
        max_temperature_c: machine.sensors().temperature,
        ..SessionStats::default()
    };

    if config.autostart {
        apply_command(machine, Command::Start, &mut history, &mut stats);
    }

    let mut next_tick = Instant::now();
    'session: loop {
        if config.max_ticks.is_some_and(|max| stats.ticks >= max) {
            info!(ticks = stats.ticks, "Tick limit reached");
            break;
        }
        if deadline.is_some_and(|limit| timebase.elapsed() >= limit) {
            info!("Run time elapsed");
            break;
        }

        loop {
            match inputs.try_recv() {
                Ok(ConsoleInput::Command(command)) => {
                    apply_command(machine, command, &mut history, &mut stats);
                }
                Ok(ConsoleInput::Status) => {
                    let sensors = machine.sensors();
                    let (window_min_c, window_max_c) = history
                        .temperature_range()
                        .unwrap_or((sensors.temperature, sensors.temperature));
                    info!(
                        state = %machine.state(),
                        temperature = sensors.temperature,
                        voltage = sensors.voltage,
                        speed = sensors.speed,
                        overheat_ticks = machine.overheat_ticks(),
                        window = history.len(),
                        window_min_c,
                        window_max_c,
                        "{}",
                        machine.status_message()
                    );
                }
                Ok(ConsoleInput::Quit) => {
                    info!("Operator quit");
                    break 'session;
                }
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            }
        }

        let snapshot = machine.tick();
        stats.ticks += 1;
        stats.max_temperature_c = stats.max_temperature_c.max(snapshot.sensors.temperature);
        if snapshot.transition.is_some() {
            stats.transitions += 1;
        }
        telemetry::record_snapshot(&snapshot);
        history.push(timebase.unix_ms(), snapshot);

        if config.jsonl {
            if let Some(entry) = history.latest() {
                writeln!(out, "{}", serde_json::to_string(entry)?)?;
            }
        } else {
            let line = render_status(
                &snapshot,
                machine.status_message(),
                &history,
                machine.config(),
            );
            writeln!(out, "{}", line)?;
        }
        out.flush()?;

        if !config.tick_interval.is_zero() {
            next_tick += config.tick_interval;
            let now = Instant::now();
            if next_tick > now {
                thread::sleep(next_tick - now);
            } else {
                next_tick = now;
            }
        }
    }

    Ok(stats)
}

fn apply_command<N: NoiseSource>(
    machine: &mut Machine<N>,
    command: Command,
    history: &mut SnapshotHistory,
    stats: &mut SessionStats,
) {
    match machine.apply(command) {
        Ok(CommandOutcome::Transitioned(transition)) => {
            stats.transitions += 1;
            telemetry::record_transition(&transition);
            info!(
                %command,
                from = %transition.from,
                to = %transition.to,
                "{}",
                transition.message()
            );
        }
        Ok(CommandOutcome::SensorsReset) => {
            history.clear();
            info!(%command, "Simulation reset to initial state.");
        }
        Err(e) => {
            stats.rejected_commands += 1;
            telemetry::record_rejection(command);
            warn!(error = %e, "Command ignored");
        }
    }
}
