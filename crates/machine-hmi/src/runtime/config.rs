use machine_core::{ConfigError, EngineConfig};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("failed to read config {path}: {source}")]
    ReadConfig {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("config {path}: {source}")]
    InvalidConfig {
        path: PathBuf,
        #[source]
        source: ConfigError,
    },
    #[error(transparent)]
    Engine(#[from] ConfigError),
    #[error("failed to write snapshot: {0}")]
    Output(#[from] std::io::Error),
    #[error("failed to encode snapshot: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub show_help: bool,
    pub tick_interval: Duration,
    pub max_ticks: Option<u64>,
    pub run_seconds: Option<u64>,
    pub seed: Option<u64>,
    pub engine_config: Option<PathBuf>,
    pub autostart: bool,
    pub jsonl: bool,
    pub history_len: usize,
    pub json_logs: bool,
    pub metrics_addr: Option<String>,
    pub console: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            show_help: false,
            tick_interval: Duration::from_millis(1000),
            max_ticks: None,
            run_seconds: None,
            seed: None,
            engine_config: None,
            autostart: false,
            jsonl: false,
            history_len: 100,
            json_logs: false,
            metrics_addr: None,
            console: true,
        }
    }
}

impl RuntimeConfig {
    pub fn from_env() -> Self {
        let args: Vec<String> = std::env::args().collect();
        Self::from_args(&args)
    }

    pub fn from_args(args: &[String]) -> Self {
        let mut cfg = RuntimeConfig::default();
        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--tick-ms" => {
                    if i + 1 < args.len() {
                        if let Ok(ms) = args[i + 1].parse::<u64>() {
                            cfg.tick_interval = Duration::from_millis(ms);
                        }
                        i += 1;
                    }
                }
                "--ticks" => {
                    if i + 1 < args.len() {
                        cfg.max_ticks = args[i + 1].parse::<u64>().ok();
                        i += 1;
                    }
                }
                "--run-seconds" => {
                    if i + 1 < args.len() {
                        cfg.run_seconds = args[i + 1].parse::<u64>().ok();
                        i += 1;
                    }
                }
                "--seed" => {
                    if i + 1 < args.len() {
                        cfg.seed = args[i + 1].parse::<u64>().ok();
                        i += 1;
                    }
                }
                "--config" => {
                    if i + 1 < args.len() {
                        cfg.engine_config = Some(PathBuf::from(&args[i + 1]));
                        i += 1;
                    }
                }
                "--autostart" => {
                    cfg.autostart = true;
                }
                "--jsonl" => {
                    cfg.jsonl = true;
                }
                "--history" => {
                    if i + 1 < args.len() {
                        cfg.history_len = args[i + 1].parse().unwrap_or(100).max(1);
                        i += 1;
                    }
                }
                "--json-logs" => {
                    cfg.json_logs = true;
                }
                "--metrics-addr" => {
                    if i + 1 < args.len() {
                        cfg.metrics_addr = Some(args[i + 1].clone());
                        i += 1;
                    }
                }
                "--no-console" => {
                    cfg.console = false;
                }
                "--help" | "-h" => {
                    cfg.show_help = true;
                    break;
                }
                _ => {}
            }
            i += 1;
        }
        cfg
    }

    /// Engine configuration from `--config`, or the defaults.
    pub fn load_engine_config(&self) -> Result<EngineConfig, RuntimeError> {
        match &self.engine_config {
            Some(path) => read_engine_config(path),
            None => Ok(EngineConfig::default()),
        }
    }

    pub fn print_help() {
        println!(
            r#"machine-hmi - Virtual control panel for a simulated industrial machine

USAGE:
    machine-hmi [OPTIONS]

OPTIONS:
    --tick-ms <MS>          Wall-clock time per simulation tick [default: 1000]
    --ticks <N>             Stop after N ticks
    --run-seconds <SECS>    Stop after a fixed duration
    --seed <U64>            Seed for sensor noise (random if omitted)
    --config <PATH>         Engine configuration as JSON (missing fields use defaults)
    --autostart             Issue START before the first tick
    --jsonl                 Print every snapshot as one JSON line on stdout
    --history <N>           Snapshots kept for the trend display [default: 100]
    --json-logs             Output logs in JSON format (for log aggregation)
    --metrics-addr <ADDR>   Enable Prometheus metrics server on address (e.g., 0.0.0.0:9090)
    --no-console            Do not read operator commands from stdin
    -h, --help              Print this help message

CONSOLE COMMANDS (stdin):
    start | stop | reset | status | quit

ENVIRONMENT VARIABLES:
    RUST_LOG                Set log filter (e.g., RUST_LOG=debug,machine_core=trace)

EXAMPLES:
    # Interactive panel, one tick per second
    machine-hmi

    # Fast deterministic run for charting
    machine-hmi --autostart --seed 7 --tick-ms 0 --ticks 200 --jsonl --no-console
"#
        );
    }
}

fn read_engine_config(path: &Path) -> Result<EngineConfig, RuntimeError> {
    let text = std::fs::read_to_string(path).map_err(|source| RuntimeError::ReadConfig {
        path: path.to_path_buf(),
        source,
    })?;
    EngineConfig::from_json(&text).map_err(|source| RuntimeError::InvalidConfig {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn args(list: &[&str]) -> Vec<String> {
        std::iter::once("machine-hmi")
            .chain(list.iter().copied())
            .map(String::from)
            .collect()
    }

    #[test]
    fn defaults_without_flags() {
        let cfg = RuntimeConfig::from_args(&args(&[]));
        assert_eq!(cfg.tick_interval, Duration::from_secs(1));
        assert_eq!(cfg.history_len, 100);
        assert!(cfg.console);
        assert!(!cfg.autostart);
        assert!(cfg.max_ticks.is_none());
    }

    #[test]
    fn parses_run_flags() {
        let cfg = RuntimeConfig::from_args(&args(&[
            "--tick-ms",
            "0",
            "--ticks",
            "50",
            "--seed",
            "7",
            "--autostart",
            "--jsonl",
            "--no-console",
            "--history",
            "20",
        ]));
        assert_eq!(cfg.tick_interval, Duration::ZERO);
        assert_eq!(cfg.max_ticks, Some(50));
        assert_eq!(cfg.seed, Some(7));
        assert!(cfg.autostart);
        assert!(cfg.jsonl);
        assert!(!cfg.console);
        assert_eq!(cfg.history_len, 20);
    }

    #[test]
    fn help_stops_parsing() {
        let cfg = RuntimeConfig::from_args(&args(&["-h", "--autostart"]));
        assert!(cfg.show_help);
        assert!(!cfg.autostart);
    }

    #[test]
    fn zero_history_is_raised_to_one() {
        let cfg = RuntimeConfig::from_args(&args(&["--history", "0"]));
        assert_eq!(cfg.history_len, 1);
    }

    #[test]
    fn loads_engine_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "overheat_tick_limit": 2, "recovery_exit_c": 35.0 }}"#).unwrap();

        let cfg = RuntimeConfig {
            engine_config: Some(file.path().to_path_buf()),
            ..RuntimeConfig::default()
        };
        let engine = cfg.load_engine_config().unwrap();
        assert_eq!(engine.overheat_tick_limit, 2);
        assert_eq!(engine.recovery_exit_c, 35.0);
    }

    #[test]
    fn missing_config_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = RuntimeConfig {
            engine_config: Some(dir.path().join("absent.json")),
            ..RuntimeConfig::default()
        };
        assert!(matches!(
            cfg.load_engine_config(),
            Err(RuntimeError::ReadConfig { .. })
        ));
    }

    #[test]
    fn invalid_config_file_is_reported() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "overheat_tick_limit": 0 }}"#).unwrap();
        let cfg = RuntimeConfig {
            engine_config: Some(file.path().to_path_buf()),
            ..RuntimeConfig::default()
        };
        assert!(matches!(
            cfg.load_engine_config(),
            Err(RuntimeError::InvalidConfig {
                source: ConfigError::ZeroTickLimit,
                ..
            })
        ));
    }
}
