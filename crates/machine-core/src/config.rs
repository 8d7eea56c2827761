use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Closed interval `[low, high]` that a random sample is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Band {
    pub low: f64,
    pub high: f64,
}

impl Band {
    pub const fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    /// Band centred on `nominal` with half-width `spread`.
    pub const fn around(nominal: f64, spread: f64) -> Self {
        Self {
            low: nominal - spread,
            high: nominal + spread,
        }
    }

    pub const fn fixed(value: f64) -> Self {
        Self {
            low: value,
            high: value,
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.low && value <= self.high
    }

    fn check(&self, field: &'static str) -> Result<(), ConfigError> {
        if !self.low.is_finite() || !self.high.is_finite() {
            return Err(ConfigError::NonFinite { field });
        }
        if !(self.high - self.low).is_finite() {
            return Err(ConfigError::NonFinite { field });
        }
        if self.low > self.high {
            return Err(ConfigError::InvertedBand {
                field,
                low: self.low,
                high: self.high,
            });
        }
        Ok(())
    }
}

/// Per-state evolution rule.
///
/// `speed` and `voltage` are resampled every tick. `temperature_step` is the
/// magnitude of the per-tick drift; its sign is decided by the state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StateProfile {
    pub speed: Band,
    pub voltage: Band,
    pub temperature_step: Band,
}

impl StateProfile {
    fn check(&self, state: &'static str) -> Result<(), ConfigError> {
        self.speed.check(state)?;
        self.voltage.check(state)?;
        self.temperature_step.check(state)?;
        if self.temperature_step.low < 0.0 {
            return Err(ConfigError::NegativeStep { field: state });
        }
        Ok(())
    }
}

/// Physical plausibility range every reading is clamped into.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Limits {
    pub max_temperature_c: f64,
    pub voltage: Band,
    pub speed: Band,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Baseline temperature; the machine never cools below it.
    pub ambient_temp_c: f64,
    /// Active -> Overheating once temperature rises strictly above this.
    pub overheat_threshold_c: f64,
    /// Recovery -> Idle once temperature falls strictly below this.
    pub recovery_exit_c: f64,
    /// Ticks spent in Overheating before escalating to Recovery.
    pub overheat_tick_limit: u32,
    pub idle: StateProfile,
    pub active: StateProfile,
    pub overheating: StateProfile,
    pub recovery: StateProfile,
    pub limits: Limits,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ambient_temp_c: 25.0,
            overheat_threshold_c: 80.0,
            recovery_exit_c: 40.0,
            overheat_tick_limit: 5,
            idle: StateProfile {
                speed: Band::fixed(0.0),
                voltage: Band::fixed(0.0),
                temperature_step: Band::new(0.2, 0.5),
            },
            active: StateProfile {
                speed: Band::around(1500.0, 15.0),
                voltage: Band::around(240.0, 1.5),
                temperature_step: Band::new(0.5, 1.5),
            },
            overheating: StateProfile {
                speed: Band::around(1550.0, 60.0),
                voltage: Band::around(240.0, 6.0),
                temperature_step: Band::new(0.1, 0.5),
            },
            recovery: StateProfile {
                speed: Band::around(300.0, 9.0),
                voltage: Band::around(242.0, 0.6),
                temperature_step: Band::new(1.0, 2.0),
            },
            limits: Limits {
                max_temperature_c: 150.0,
                voltage: Band::new(0.0, 300.0),
                speed: Band::new(0.0, 3000.0),
            },
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{field}: value must be finite")]
    NonFinite { field: &'static str },
    #[error("{field}: band low {low} exceeds high {high}")]
    InvertedBand {
        field: &'static str,
        low: f64,
        high: f64,
    },
    #[error("{field}: temperature step must not be negative")]
    NegativeStep { field: &'static str },
    #[error("recovery temperature step must be strictly positive, got {low}")]
    StalledRecovery { low: f64 },
    #[error(
        "thresholds must satisfy ambient ({ambient}) < recovery exit ({recovery_exit}) \
         < overheat ({overheat}) < max ({max})"
    )]
    ThresholdOrder {
        ambient: f64,
        recovery_exit: f64,
        overheat: f64,
        max: f64,
    },
    #[error("overheat tick limit must be at least 1")]
    ZeroTickLimit,
    #[error("invalid engine config: {0}")]
    Parse(#[from] serde_json::Error),
}

impl EngineConfig {
    /// Parse a (possibly partial) JSON document; missing fields take defaults.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let thresholds = [
            ("ambient_temp_c", self.ambient_temp_c),
            ("recovery_exit_c", self.recovery_exit_c),
            ("overheat_threshold_c", self.overheat_threshold_c),
            ("limits.max_temperature_c", self.limits.max_temperature_c),
        ];
        for (field, value) in thresholds {
            if !value.is_finite() {
                return Err(ConfigError::NonFinite { field });
            }
        }
        if !(self.ambient_temp_c < self.recovery_exit_c
            && self.recovery_exit_c < self.overheat_threshold_c
            && self.overheat_threshold_c < self.limits.max_temperature_c)
        {
            return Err(ConfigError::ThresholdOrder {
                ambient: self.ambient_temp_c,
                recovery_exit: self.recovery_exit_c,
                overheat: self.overheat_threshold_c,
                max: self.limits.max_temperature_c,
            });
        }
        if self.overheat_tick_limit == 0 {
            return Err(ConfigError::ZeroTickLimit);
        }

        self.idle.check("idle")?;
        self.active.check("active")?;
        self.overheating.check("overheating")?;
        self.recovery.check("recovery")?;
        if self.recovery.temperature_step.low <= 0.0 {
            return Err(ConfigError::StalledRecovery {
                low: self.recovery.temperature_step.low,
            });
        }
        self.limits.voltage.check("limits.voltage")?;
        self.limits.speed.check("limits.speed")?;
        Ok(())
    }

    /// Temperature clamp band, `[ambient, max]`.
    pub fn temperature_range(&self) -> Band {
        Band::new(self.ambient_temp_c, self.limits.max_temperature_c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_inverted_band() {
        let mut config = EngineConfig::default();
        config.active.voltage = Band::new(250.0, 230.0);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvertedBand { field: "active", .. })
        ));
    }

    #[test]
    fn rejects_recovery_exit_above_overheat() {
        let config = EngineConfig {
            recovery_exit_c: 90.0,
            ..EngineConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ThresholdOrder { .. })
        ));
    }

    #[test]
    fn rejects_nan_threshold() {
        let config = EngineConfig {
            overheat_threshold_c: f64::NAN,
            ..EngineConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonFinite {
                field: "overheat_threshold_c"
            })
        ));
    }

    #[test]
    fn rejects_zero_tick_limit() {
        let config = EngineConfig {
            overheat_tick_limit: 0,
            ..EngineConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::ZeroTickLimit)));
    }

    #[test]
    fn rejects_band_wider_than_f64() {
        let mut config = EngineConfig::default();
        config.limits.voltage = Band::new(-1e308, 1e308);
        config.active.voltage = Band::new(-1e308, 1e308);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonFinite { field: "active" })
        ));
    }

    #[test]
    fn rejects_recovery_that_cannot_cool() {
        let mut config = EngineConfig::default();
        config.recovery.temperature_step = Band::fixed(0.0);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::StalledRecovery { .. })
        ));
    }

    #[test]
    fn rejects_negative_step() {
        let mut config = EngineConfig::default();
        config.recovery.temperature_step = Band::new(-1.0, 2.0);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NegativeStep { field: "recovery" })
        ));
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = EngineConfig::from_json(r#"{ "overheat_tick_limit": 3 }"#).unwrap();
        assert_eq!(config.overheat_tick_limit, 3);
        assert_eq!(config.overheat_threshold_c, 80.0);
        assert_eq!(config.active, EngineConfig::default().active);
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        assert!(matches!(
            EngineConfig::from_json("{ not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn json_config_is_validated() {
        let res = EngineConfig::from_json(r#"{ "recovery_exit_c": 10.0 }"#);
        assert!(matches!(res, Err(ConfigError::ThresholdOrder { .. })));
    }
}
