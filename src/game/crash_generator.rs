use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Draws crash points uniformly from `(min, max]`.
///
/// The random source is owned by the generator so rounds can be replayed
/// from a fixed seed.
pub struct RandomCrashGenerator<R = StdRng> {
    rng: R,
    min: f64,
    max: f64,
}

impl RandomCrashGenerator<StdRng> {
    /// Generator seeded from OS entropy
    pub fn from_entropy(min: f64, max: f64) -> Self {
        Self::new(StdRng::from_entropy(), min, max)
    }

    /// Deterministic generator (for testing)
    pub fn seeded(seed: u64, min: f64, max: f64) -> Self {
        Self::new(StdRng::seed_from_u64(seed), min, max)
    }
}

impl<R: Rng> RandomCrashGenerator<R> {
    pub fn new(rng: R, min: f64, max: f64) -> Self {
        debug_assert!(min >= 1.0 && max > min, "crash bounds must satisfy 1 <= min < max");
        Self { rng, min, max }
    }

    /// Crash point for the next round. An override above 1.0 is returned as is.
    pub fn generate(&mut self, override_point: Option<f64>) -> f64 {
        match override_point {
            Some(point) if point > 1.0 => point,
            _ => {
                // gen_range yields [0, span); subtracting from max maps it onto (min, max]
                let span = self.max - self.min;
                self.max - self.rng.gen_range(0.0..span)
            }
        }
    }
}
