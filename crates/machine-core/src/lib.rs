//! Finite-state machine engine for a simulated industrial machine.
//!
//! The [`Machine`] tracks its operating mode and synthesizes temperature,
//! voltage and speed readings every [`Machine::tick`]. Operators drive it with
//! [`Machine::start`], [`Machine::stop`] and [`Machine::reset`].

pub mod config;
pub mod machine;
pub mod noise;
pub mod sensors;
pub mod state;
pub mod tags;
pub mod timebase;

pub use config::{Band, ConfigError, EngineConfig, Limits, StateProfile};
pub use machine::{Command, CommandError, CommandOutcome, Machine, Snapshot};
pub use noise::{FixedNoise, NoiseSource, SeededNoise};
pub use sensors::SensorReading;
pub use state::{MachineState, Transition, TransitionCause};
pub use timebase::TimeBase;
