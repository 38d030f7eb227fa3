use serde::{Deserialize, Serialize};

/// Small seedable RNG so every simulated run replays bit-for-bit.
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

    /// Independent stream for a sub-component, derived from this one.
    #[must_use]
    pub fn fork(&mut self) -> Self {
        Self::new(self.next_u64())
    }

    #[must_use]
    pub const fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        // Upper bits of an LCG are the well-mixed ones.
        self.state ^ (self.state >> 29)
    }

    /// Value in `[0, upper_exclusive)`; zero when the range is empty.
    #[must_use]
    pub const fn next_bounded(&mut self, upper_exclusive: u64) -> u64 {
        if upper_exclusive == 0 {
            return 0;
        }
        self.next_u64() % upper_exclusive
    }

    /// Index into a collection of `len` elements.
    #[must_use]
    pub fn next_index(&mut self, len: usize) -> usize {
        let len_u64 = u64::try_from(len).unwrap_or(u64::MAX);
        usize::try_from(self.next_bounded(len_u64)).unwrap_or(0)
    }

    /// Uniform pick from `items`, `None` when empty.
    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            return None;
        }
        items.get(self.next_index(items.len()))
    }

    /// Bernoulli trial with integer percent.
    #[must_use]
    pub const fn hit_rate_percent(&mut self, percent: u8) -> bool {
        if percent == 0 {
            return false;
        }
        if percent >= 100 {
            return true;
        }
        self.next_bounded(100) < percent as u64
    }
}
