use crate::config::{ConfigError, EngineConfig};
use crate::noise::{NoiseSource, SeededNoise};
use crate::sensors::SensorReading;
use crate::state::{MachineState, Phase, Transition, TransitionCause};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Operator command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    Start,
    Stop,
    Reset,
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Command::Start => "start",
            Command::Stop => "stop",
            Command::Reset => "reset",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("{command} is not permitted while {state}")]
    NotPermitted {
        command: Command,
        state: MachineState,
    },
}

/// What a command did when it was accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    Transitioned(Transition),
    SensorsReset,
}

/// Result of one tick, handed to the display.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub tick: u64,
    pub state: MachineState,
    pub sensors: SensorReading,
    pub overheat_ticks: u32,
    /// Automatic transition taken during this tick, if any.
    pub transition: Option<Transition>,
}

impl Snapshot {
    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }
}

/// The machine engine.
///
/// Single-writer: commands and ticks are plain synchronous calls. Hosts that
/// serve several sessions keep one `Machine` per session.
#[derive(Debug, Clone)]
pub struct Machine<N: NoiseSource = SeededNoise> {
    config: EngineConfig,
    noise: N,
    phase: Phase,
    sensors: SensorReading,
    tick: u64,
    last_transition: Option<Transition>,
}

impl Machine<SeededNoise> {
    /// Default configuration with a seeded noise source.
    pub fn with_seed(seed: u64) -> Self {
        Self::build(EngineConfig::default(), SeededNoise::new(seed))
    }
}

impl<N: NoiseSource> Machine<N> {
    pub fn new(config: EngineConfig, noise: N) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(config, noise))
    }

    fn build(config: EngineConfig, noise: N) -> Self {
        let sensors = SensorReading::baseline(&config);
        Self {
            config,
            noise,
            phase: Phase::Idle,
            sensors,
            tick: 0,
            last_transition: None,
        }
    }

    pub fn state(&self) -> MachineState {
        self.phase.state()
    }

    pub fn sensors(&self) -> SensorReading {
        self.sensors
    }

    pub fn overheat_ticks(&self) -> u32 {
        self.phase.overheat_ticks()
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Most recent transition, whether commanded or automatic.
    pub fn last_transition(&self) -> Option<Transition> {
        self.last_transition
    }

    /// Operator-facing status line for the current state.
    pub fn status_message(&self) -> &'static str {
        match self.last_transition {
            Some(transition) => transition.message(),
            None => "System is idle. Ready to start.",
        }
    }

    pub fn start(&mut self) -> Result<Transition, CommandError> {
        match self.phase {
            Phase::Idle => Ok(self.transition(Phase::Active, TransitionCause::OperatorStart)),
            _ => Err(self.reject(Command::Start)),
        }
    }

    /// Operator e-stop; valid from every running state.
    pub fn stop(&mut self) -> Result<Transition, CommandError> {
        match self.phase {
            Phase::Idle => Err(self.reject(Command::Stop)),
            _ => Ok(self.transition(Phase::Idle, TransitionCause::OperatorStop)),
        }
    }

    /// Restore baseline sensor values. Only permitted once stopped.
    pub fn reset(&mut self) -> Result<(), CommandError> {
        match self.phase {
            Phase::Idle => {
                self.sensors = SensorReading::baseline(&self.config);
                debug!("sensors reset to baseline");
                Ok(())
            }
            _ => Err(self.reject(Command::Reset)),
        }
    }

    pub fn apply(&mut self, command: Command) -> Result<CommandOutcome, CommandError> {
        match command {
            Command::Start => self.start().map(CommandOutcome::Transitioned),
            Command::Stop => self.stop().map(CommandOutcome::Transitioned),
            Command::Reset => self.reset().map(|()| CommandOutcome::SensorsReset),
        }
    }

    /// Advance one step: evolve sensors under the current state, then
    /// evaluate that state's automatic guard against the new readings.
    pub fn tick(&mut self) -> Snapshot {
        self.tick += 1;
        self.sensors = self
            .sensors
            .evolve(self.phase.state(), &self.config, &mut self.noise);

        let temperature = self.sensors.temperature;
        let next = match self.phase {
            Phase::Idle => None,
            Phase::Active if temperature > self.config.overheat_threshold_c => Some((
                Phase::Overheating { ticks: 0 },
                TransitionCause::OverheatDetected,
            )),
            Phase::Active => None,
            Phase::Overheating { ticks } => {
                let ticks = ticks.saturating_add(1);
                if ticks >= self.config.overheat_tick_limit {
                    Some((Phase::Recovery, TransitionCause::OverheatTimeout))
                } else {
                    self.phase = Phase::Overheating { ticks };
                    None
                }
            }
            Phase::Recovery if temperature < self.config.recovery_exit_c => {
                Some((Phase::Idle, TransitionCause::Cooled))
            }
            Phase::Recovery => None,
        };

        let transition = next.map(|(phase, cause)| self.transition(phase, cause));

        Snapshot {
            tick: self.tick,
            state: self.phase.state(),
            sensors: self.sensors,
            overheat_ticks: self.phase.overheat_ticks(),
            transition,
        }
    }

    fn transition(&mut self, to: Phase, cause: TransitionCause) -> Transition {
        let transition = Transition {
            from: self.phase.state(),
            to: to.state(),
            cause,
        };
        self.phase = to;
        self.last_transition = Some(transition);
        info!(
            "tick {}: {} (temp {:.1} C)",
            self.tick, transition, self.sensors.temperature
        );
        transition
    }

    fn reject(&self, command: Command) -> CommandError {
        let state = self.phase.state();
        warn!("{} rejected while {}", command, state);
        CommandError::NotPermitted { command, state }
    }
}
