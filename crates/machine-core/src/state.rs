use serde::{Deserialize, Serialize};
use std::fmt;

/// Operational mode reported to the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MachineState {
    #[default]
    Idle,
    Active,
    Overheating,
    Recovery,
}

impl MachineState {
    pub const ALL: [MachineState; 4] = [
        MachineState::Idle,
        MachineState::Active,
        MachineState::Overheating,
        MachineState::Recovery,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MachineState::Idle => "IDLE",
            MachineState::Active => "ACTIVE",
            MachineState::Overheating => "OVERHEATING",
            MachineState::Recovery => "RECOVERY",
        }
    }

    /// Stable numeric code, used for the state gauge.
    pub fn code(&self) -> u8 {
        match self {
            MachineState::Idle => 0,
            MachineState::Active => 1,
            MachineState::Overheating => 2,
            MachineState::Recovery => 3,
        }
    }

    pub fn is_running(&self) -> bool {
        !matches!(self, MachineState::Idle)
    }
}

impl fmt::Display for MachineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Internal FSM position. The overheat counter only exists while overheating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Phase {
    Idle,
    Active,
    Overheating {
        ticks: u32,
    },
    Recovery,
}

impl Phase {
    pub(crate) fn state(&self) -> MachineState {
        match self {
            Phase::Idle => MachineState::Idle,
            Phase::Active => MachineState::Active,
            Phase::Overheating { .. } => MachineState::Overheating,
            Phase::Recovery => MachineState::Recovery,
        }
    }

    pub(crate) fn overheat_ticks(&self) -> u32 {
        match self {
            Phase::Overheating { ticks } => *ticks,
            _ => 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionCause {
    /// Operator pressed start.
    OperatorStart,
    /// Operator pressed stop.
    OperatorStop,
    /// Temperature crossed the overheat threshold.
    OverheatDetected,
    /// Overheating persisted for the configured number of ticks.
    OverheatTimeout,
    /// Recovery cooled below the exit threshold.
    Cooled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub from: MachineState,
    pub to: MachineState,
    pub cause: TransitionCause,
}

impl Transition {
    /// Operator-facing status text for this transition.
    pub fn message(&self) -> &'static str {
        match (self.cause, self.from) {
            (TransitionCause::OperatorStart, _) => "System active and stable.",
            (TransitionCause::OperatorStop, MachineState::Overheating) => {
                "Emergency stop initiated."
            }
            (TransitionCause::OperatorStop, MachineState::Recovery) => {
                "Shutdown during recovery."
            }
            (TransitionCause::OperatorStop, _) => "System shutting down.",
            (TransitionCause::OverheatDetected, _) => {
                "CRITICAL: Overheating detected! High temp."
            }
            (TransitionCause::OverheatTimeout, _) => "System in recovery mode. Reducing load.",
            (TransitionCause::Cooled, _) => "Recovery complete. System idle. Ready for restart.",
        }
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {} ({:?})", self.from, self.to, self.cause)
    }
}
