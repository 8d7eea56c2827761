//! Text rendering of the control panel.

use crate::runtime::history::SnapshotHistory;
use machine_core::{tags, EngineConfig, MachineState, Snapshot};
use std::fmt::Write;

const NOMINAL_VOLTAGE_V: f64 = 240.0;
const NOMINAL_SPEED_RPM: f64 = 1500.0;
const SPARK_LEVELS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];
const SPARK_WIDTH: usize = 30;

/// Banner colour for a state.
pub fn banner_color(state: MachineState) -> &'static str {
    match state {
        MachineState::Idle => "gray",
        MachineState::Active => "green",
        MachineState::Overheating => "red",
        MachineState::Recovery => "yellow",
    }
}

/// Sparkline of the most recent values, scaled to the window's own range.
pub fn sparkline(values: &[f64]) -> String {
    let values = &values[values.len().saturating_sub(SPARK_WIDTH)..];
    let (lo, hi) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(*v), hi.max(*v))
        });
    let span = hi - lo;
    values
        .iter()
        .map(|v| {
            if span <= f64::EPSILON {
                SPARK_LEVELS[0]
            } else {
                let idx = ((v - lo) / span * (SPARK_LEVELS.len() - 1) as f64).round() as usize;
                SPARK_LEVELS[idx.min(SPARK_LEVELS.len() - 1)]
            }
        })
        .collect()
}

/// One status line per tick.
pub fn render_status(
    snapshot: &Snapshot,
    message: &str,
    history: &SnapshotHistory,
    config: &EngineConfig,
) -> String {
    let sensors = &snapshot.sensors;
    let mut line = String::new();
    let _ = write!(
        line,
        "#{:<5} [{:^11}|{:^6}] running={} ",
        snapshot.tick,
        snapshot.state,
        banner_color(snapshot.state),
        if snapshot.is_running() { "YES" } else { "NO" },
    );
    let _ = write!(
        line,
        "{}={:.1}{} ({:+.1} vs ambient) ",
        tags::TEMPERATURE_C.key,
        sensors.temperature,
        tags::TEMPERATURE_C.unit,
        sensors.temperature - config.ambient_temp_c,
    );
    let _ = write!(
        line,
        "{}={:.1}{} ({:+.1}) ",
        tags::VOLTAGE_V.key,
        sensors.voltage,
        tags::VOLTAGE_V.unit,
        sensors.voltage - NOMINAL_VOLTAGE_V,
    );
    let _ = write!(
        line,
        "{}={:.0}{} ({:+.0}) ",
        tags::SPEED_RPM.key,
        sensors.speed,
        tags::SPEED_RPM.unit,
        sensors.speed - NOMINAL_SPEED_RPM,
    );
    if snapshot.state == MachineState::Overheating {
        let _ = write!(
            line,
            "{}={}/{} ",
            tags::OVERHEAT_TICKS.key,
            snapshot.overheat_ticks,
            config.overheat_tick_limit,
        );
    }
    let temps: Vec<f64> = history.temperatures().collect();
    let _ = write!(line, "trend {} | {}", sparkline(&temps), message);
    line
}
