//! Prometheus metrics for the machine console.
//!
//! Read-only: the server exposes the latest snapshot and event counters, it
//! never accepts commands.

use machine_core::{tags, Command, Snapshot, Transition};
use prometheus::{Encoder, Gauge, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use std::sync::LazyLock;
use std::thread;
use tiny_http::{Response, Server};
use tracing::{error, info, warn};

pub static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

pub static TICKS: LazyLock<IntCounter> = LazyLock::new(|| {
    let counter = IntCounter::new(tags::TICKS.metric, "Simulation ticks executed").unwrap();
    REGISTRY.register(Box::new(counter.clone())).unwrap();
    counter
});

pub static TEMPERATURE_C: LazyLock<Gauge> = LazyLock::new(|| {
    let gauge = Gauge::new(tags::TEMPERATURE_C.metric, "Machine temperature in Celsius").unwrap();
    REGISTRY.register(Box::new(gauge.clone())).unwrap();
    gauge
});

pub static VOLTAGE_V: LazyLock<Gauge> = LazyLock::new(|| {
    let gauge = Gauge::new(tags::VOLTAGE_V.metric, "Supply voltage in volts").unwrap();
    REGISTRY.register(Box::new(gauge.clone())).unwrap();
    gauge
});

pub static SPEED_RPM: LazyLock<Gauge> = LazyLock::new(|| {
    let gauge = Gauge::new(tags::SPEED_RPM.metric, "Motor speed in RPM").unwrap();
    REGISTRY.register(Box::new(gauge.clone())).unwrap();
    gauge
});

/// Machine state (0=idle,1=active,2=overheating,3=recovery)
pub static STATE_CODE: LazyLock<IntGauge> = LazyLock::new(|| {
    let gauge = IntGauge::new(
        tags::STATE_CODE.metric,
        "Machine state (0=idle,1=active,2=overheating,3=recovery)",
    )
    .unwrap();
    REGISTRY.register(Box::new(gauge.clone())).unwrap();
    gauge
});

pub static OVERHEAT_TICKS: LazyLock<IntGauge> = LazyLock::new(|| {
    let gauge = IntGauge::new(
        tags::OVERHEAT_TICKS.metric,
        "Consecutive ticks spent overheating",
    )
    .unwrap();
    REGISTRY.register(Box::new(gauge.clone())).unwrap();
    gauge
});

pub static TRANSITIONS: LazyLock<IntCounterVec> = LazyLock::new(|| {
    let counter = IntCounterVec::new(
        Opts::new("machine_transitions_total", "State transitions by target state"),
        &["to"],
    )
    .unwrap();
    REGISTRY.register(Box::new(counter.clone())).unwrap();
    counter
});

pub static REJECTED_COMMANDS: LazyLock<IntCounterVec> = LazyLock::new(|| {
    let counter = IntCounterVec::new(
        Opts::new(
            "machine_rejected_commands_total",
            "Operator commands rejected as not permitted",
        ),
        &["command"],
    )
    .unwrap();
    REGISTRY.register(Box::new(counter.clone())).unwrap();
    counter
});

/// Force lazy initialization so every series is exported from the start.
pub fn init() {
    let _ = TICKS.get();
    let _ = TEMPERATURE_C.get();
    let _ = VOLTAGE_V.get();
    let _ = SPEED_RPM.get();
    let _ = STATE_CODE.get();
    let _ = OVERHEAT_TICKS.get();
    let _ = TRANSITIONS.with_label_values(&["IDLE"]).get();
    let _ = REJECTED_COMMANDS.with_label_values(&["start"]).get();
}

pub fn record_snapshot(snapshot: &Snapshot) {
    TICKS.inc();
    TEMPERATURE_C.set(snapshot.sensors.temperature);
    VOLTAGE_V.set(snapshot.sensors.voltage);
    SPEED_RPM.set(snapshot.sensors.speed);
    STATE_CODE.set(i64::from(snapshot.state.code()));
    OVERHEAT_TICKS.set(i64::from(snapshot.overheat_ticks));
    if let Some(transition) = snapshot.transition {
        record_transition(&transition);
    }
}

pub fn record_transition(transition: &Transition) {
    TRANSITIONS
        .with_label_values(&[transition.to.as_str()])
        .inc();
}

pub fn record_rejection(command: Command) {
    let label = command.to_string();
    REJECTED_COMMANDS
        .with_label_values(&[label.as_str()])
        .inc();
}

pub fn encode() -> Result<Vec<u8>, prometheus::Error> {
    let mut buffer = Vec::new();
    TextEncoder::new().encode(&REGISTRY.gather(), &mut buffer)?;
    Ok(buffer)
}

pub fn start_metrics_server(addr: &Option<String>) -> Option<thread::JoinHandle<()>> {
    addr.as_ref().map(|addr| {
        info!(addr = %addr, "Starting metrics server");
        serve_metrics(addr.clone())
    })
}

fn serve_metrics(bind_addr: String) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let server = match Server::http(&bind_addr) {
            Ok(s) => s,
            Err(e) => {
                error!("Failed to start metrics server on {}: {}", bind_addr, e);
                return;
            }
        };

        info!("Metrics server listening on http://{}/metrics", bind_addr);

        for request in server.incoming_requests() {
            match request.url() {
                "/metrics" => {
                    let buffer = match encode() {
                        Ok(buffer) => buffer,
                        Err(e) => {
                            warn!("Failed to encode metrics: {}", e);
                            let _ = request.respond(
                                Response::from_string("Internal Server Error")
                                    .with_status_code(500),
                            );
                            continue;
                        }
                    };
                    let mut response = Response::from_data(buffer);
                    if let Ok(header) = tiny_http::Header::from_bytes(
                        &b"Content-Type"[..],
                        &b"text/plain; version=0.0.4"[..],
                    ) {
                        response = response.with_header(header);
                    }
                    let _ = request.respond(response);
                }
                "/health" => {
                    let _ = request.respond(Response::from_string("OK"));
                }
                _ => {
                    let _ =
                        request.respond(Response::from_string("Not Found").with_status_code(404));
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use machine_core::Machine;

    #[test]
    fn snapshot_metrics_are_exported() {
        init();
        let mut machine = Machine::with_seed(4);
        machine.start().unwrap();
        let snapshot = machine.tick();
        record_snapshot(&snapshot);
        record_rejection(Command::Reset);

        let text = String::from_utf8(encode().unwrap()).unwrap();
        assert!(text.contains(tags::TEMPERATURE_C.metric));
        assert!(text.contains(tags::STATE_CODE.metric));
        assert!(text.contains("machine_rejected_commands_total{command=\"reset\"}"));
    }
}
