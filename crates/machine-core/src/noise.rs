use crate::config::Band;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of the bounded perturbations applied to sensor readings.
pub trait NoiseSource {
    /// Draw a value from the closed interval `band`.
    fn sample(&mut self, band: Band) -> f64;
}

/// Reproducible noise from a seeded generator.
#[derive(Debug, Clone)]
pub struct SeededNoise {
    rng: StdRng,
}

impl SeededNoise {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl NoiseSource for SeededNoise {
    fn sample(&mut self, band: Band) -> f64 {
        if band.low >= band.high {
            return band.low;
        }
        self.rng.random_range(band.low..=band.high)
    }
}

/// Always returns the same relative position inside every band.
///
/// `0.0` yields `low`, `1.0` yields `high`, `0.5` the midpoint.
#[derive(Debug, Clone, Copy)]
pub struct FixedNoise {
    fraction: f64,
}

impl FixedNoise {
    pub fn new(fraction: f64) -> Self {
        let fraction = if fraction.is_finite() {
            fraction.clamp(0.0, 1.0)
        } else {
            0.5
        };
        Self { fraction }
    }

    pub fn low() -> Self {
        Self::new(0.0)
    }

    pub fn midpoint() -> Self {
        Self::new(0.5)
    }

    pub fn high() -> Self {
        Self::new(1.0)
    }
}

impl NoiseSource for FixedNoise {
    fn sample(&mut self, band: Band) -> f64 {
        band.low + (band.high - band.low) * self.fraction
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_noise_is_reproducible() {
        let band = Band::new(-3.0, 7.0);
        let mut a = SeededNoise::new(42);
        let mut b = SeededNoise::new(42);
        for _ in 0..100 {
            assert_eq!(a.sample(band), b.sample(band));
        }
    }

    #[test]
    fn seeded_noise_stays_in_band() {
        let band = Band::around(240.0, 1.5);
        let mut noise = SeededNoise::new(7);
        for _ in 0..1000 {
            assert!(band.contains(noise.sample(band)));
        }
    }

    #[test]
    fn degenerate_band_returns_low() {
        let mut noise = SeededNoise::new(1);
        assert_eq!(noise.sample(Band::fixed(0.0)), 0.0);
    }

    #[test]
    fn fixed_noise_positions() {
        let band = Band::new(1.0, 2.0);
        assert_eq!(FixedNoise::low().sample(band), 1.0);
        assert_eq!(FixedNoise::midpoint().sample(band), 1.5);
        assert_eq!(FixedNoise::high().sample(band), 2.0);
        assert_eq!(FixedNoise::new(f64::NAN).sample(band), 1.5);
    }
}
