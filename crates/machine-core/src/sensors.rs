use crate::config::EngineConfig;
use crate::noise::NoiseSource;
use crate::state::MachineState;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    pub temperature: f64,
    pub voltage: f64,
    pub speed: f64,
}

impl SensorReading {
    /// Idle machine at ambient temperature, no supply, not turning.
    pub fn baseline(config: &EngineConfig) -> Self {
        Self {
            temperature: config.ambient_temp_c,
            voltage: 0.0,
            speed: 0.0,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.temperature.is_finite() && self.voltage.is_finite() && self.speed.is_finite()
    }

    /// Next reading under the evolution rule of `state`.
    ///
    /// Speed and voltage are resampled from the state's band; temperature moves
    /// by one bounded step. Idle and Recovery cool, Active and Overheating heat.
    pub fn evolve<N: NoiseSource + ?Sized>(
        &self,
        state: MachineState,
        config: &EngineConfig,
        noise: &mut N,
    ) -> Self {
        let profile = match state {
            MachineState::Idle => &config.idle,
            MachineState::Active => &config.active,
            MachineState::Overheating => &config.overheating,
            MachineState::Recovery => &config.recovery,
        };

        let step = noise.sample(profile.temperature_step);
        let temperature = match state {
            MachineState::Active | MachineState::Overheating => self.temperature + step,
            MachineState::Idle | MachineState::Recovery => self.temperature - step,
        };

        let range = config.temperature_range();
        Self {
            temperature: clamp_finite(temperature, range.low, range.high),
            voltage: clamp_finite(
                noise.sample(profile.voltage),
                config.limits.voltage.low,
                config.limits.voltage.high,
            ),
            speed: clamp_finite(
                noise.sample(profile.speed),
                config.limits.speed.low,
                config.limits.speed.high,
            ),
        }
    }
}

/// Clamp into `[low, high]`, mapping NaN to `low`.
fn clamp_finite(value: f64, low: f64, high: f64) -> f64 {
    if value.is_nan() {
        low
    } else {
        value.clamp(low, high)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Band;
    use crate::noise::FixedNoise;

    #[test]
    fn active_heats_by_step() {
        let config = EngineConfig::default();
        let start = SensorReading::baseline(&config);
        let next = start.evolve(MachineState::Active, &config, &mut FixedNoise::high());
        assert_eq!(next.temperature, 26.5);
        assert_eq!(next.voltage, 241.5);
        assert_eq!(next.speed, 1515.0);
    }

    #[test]
    fn idle_never_cools_below_ambient() {
        let config = EngineConfig::default();
        let start = SensorReading::baseline(&config);
        let next = start.evolve(MachineState::Idle, &config, &mut FixedNoise::high());
        assert_eq!(next.temperature, config.ambient_temp_c);
        assert_eq!(next.voltage, 0.0);
        assert_eq!(next.speed, 0.0);
    }

    #[test]
    fn recovery_forces_low_speed() {
        let config = EngineConfig::default();
        let hot = SensorReading {
            temperature: 90.0,
            voltage: 240.0,
            speed: 1550.0,
        };
        let next = hot.evolve(MachineState::Recovery, &config, &mut FixedNoise::midpoint());
        assert_eq!(next.temperature, 88.5);
        assert_eq!(next.speed, 300.0);
    }

    #[test]
    fn readings_are_clamped_to_limits() {
        let mut config = EngineConfig::default();
        config.overheating.speed = Band::new(5000.0, 6000.0);
        let hot = SensorReading {
            temperature: config.limits.max_temperature_c,
            voltage: 240.0,
            speed: 1550.0,
        };
        let next = hot.evolve(MachineState::Overheating, &config, &mut FixedNoise::high());
        assert_eq!(next.temperature, config.limits.max_temperature_c);
        assert_eq!(next.speed, config.limits.speed.high);
    }

    #[test]
    fn nan_is_clamped_to_low() {
        assert_eq!(clamp_finite(f64::NAN, 0.0, 10.0), 0.0);
        assert_eq!(clamp_finite(f64::INFINITY, 0.0, 10.0), 10.0);
    }
}
