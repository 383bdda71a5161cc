//! Seeded randomness — injectable so spawn and jitter behavior is
//! reproducible in tests and replays.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sha2::{Digest, Sha256};

/// The engine's single randomness capability. Constructed either from a
/// seed phrase (deterministic) or from OS entropy.
pub struct RandomSource {
    rng: StdRng,
}

impl RandomSource {
    /// Stretch an arbitrary phrase into a 32-byte seed.
    pub fn from_phrase(phrase: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(phrase.as_bytes());
        let digest = hasher.finalize();
        let mut seed = [0u8; 32];
        seed.copy_from_slice(&digest);
        Self { rng: StdRng::from_seed(seed) }
    }

    pub fn from_entropy() -> Self {
        Self { rng: StdRng::from_entropy() }
    }

    /// Uniform in [0, 1).
    pub fn unit(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }

    /// Uniform in [lo, hi).
    pub fn range(&mut self, lo: f64, hi: f64) -> f64 {
        if hi <= lo {
            return lo;
        }
        self.rng.gen_range(lo..hi)
    }

    /// Uniform in [-mag/2, mag/2) — a centered spread of width `mag`.
    pub fn spread(&mut self, mag: f64) -> f64 {
        (self.unit() - 0.5) * mag
    }

    /// Bernoulli draw; `p >= 1.0` always succeeds, `p <= 0.0` never does.
    pub fn chance(&mut self, p: f64) -> bool {
        if p <= 0.0 {
            return false;
        }
        if p >= 1.0 {
            return true;
        }
        self.unit() < p
    }

    pub fn index(&mut self, len: usize) -> usize {
        if len <= 1 {
            return 0;
        }
        self.rng.gen_range(0..len)
    }

    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            None
        } else {
            items.get(self.index(items.len()))
        }
    }
}
