use serde::{Deserialize, Serialize};

/// Seeded RNG for gesture generation.
///
/// Plain LCG so a seed replays identically on every platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        Self {
            state: seed ^ 0x9E37_79B9_7F4A_7C15,
        }
    }

    #[must_use]
    pub const fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        // High bits of an LCG are the well-mixed ones.
        self.state >> 11
    }

    /// Uniform index in `[0, len)`; `0` when `len == 0`.
    #[must_use]
    pub fn index(&mut self, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        let len_u64 = u64::try_from(len).unwrap_or(u64::MAX);
        usize::try_from(self.next_u64() % len_u64).unwrap_or(0)
    }

    /// Uniform value in `[0.0, 1.0)`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn unit(&mut self) -> f64 {
        // 53 significant bits out of the 53 we keep.
        (self.next_u64() & ((1 << 53) - 1)) as f64 / (1_u64 << 53) as f64
    }

    /// Uniform value in `[low, high)`.
    #[must_use]
    pub fn range_f64(&mut self, low: f64, high: f64) -> f64 {
        low + (high - low) * self.unit()
    }

    /// Bernoulli trial with integer percent.
    #[must_use]
    pub fn hit_rate_percent(&mut self, percent: u8) -> bool {
        if percent == 0 {
            return false;
        }
        if percent >= 100 {
            return true;
        }
        self.index(100) < usize::from(percent)
    }
}
