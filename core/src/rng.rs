//! Deterministic random number generation.
//!
//! RULE: Nothing in the pipeline may call any platform RNG.
//! All synthetic values (placeholder hours, simulated feature weights)
//! flow through StageRng instances derived from the single master seed
//! in PipelineConfig.
//!
//! Each stage gets its own RNG stream, seeded from
//! (master_seed XOR stage_index * golden-ratio constant). This means:
//!   - Adding a new stage never changes existing stages' streams.
//!   - Changing the row count never shifts the feature-importance draw.

use rand::{RngCore, SeedableRng};
use rand_pcg::Pcg64Mcg;

/// A named, deterministic RNG for a single pipeline stage.
pub struct StageRng {
    pub name: &'static str,
    inner: Pcg64Mcg,
}

impl StageRng {
    /// Create a stage RNG from the master seed and a stable stage index.
    /// The index must never change once assigned.
    pub fn new(master_seed: u64, stage_index: u64) -> Self {
        let derived_seed = master_seed ^ (stage_index.wrapping_mul(0x9e37_79b9_7f4a_7c15));
        Self {
            name: "unnamed",
            inner: Pcg64Mcg::seed_from_u64(derived_seed),
        }
    }

    pub fn with_name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    /// Roll a float in [0.0, 1.0).
    pub fn next_f64(&mut self) -> f64 {
        let bits = self.inner.next_u64();
        (bits >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// Roll a u64 in [0, n).
    pub fn next_u64_below(&mut self, n: u64) -> u64 {
        assert!(n > 0, "n must be > 0");
        self.inner.next_u64() % n
    }

    /// Roll a float in [low, high).
    pub fn uniform(&mut self, low: f64, high: f64) -> f64 {
        low + (high - low) * self.next_f64()
    }

    /// Bernoulli trial: returns true with probability p.
    pub fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }
}

/// All stage RNGs for a single run, indexed by stable slot.
pub struct RngBank {
    master_seed: u64,
}

impl RngBank {
    pub fn new(master_seed: u64) -> Self {
        Self { master_seed }
    }

    pub fn master_seed(&self) -> u64 {
        self.master_seed
    }

    pub fn for_stage(&self, slot: StageSlot) -> StageRng {
        StageRng::new(self.master_seed, slot as u64).with_name(slot.name())
    }
}

/// Stable stage slot assignments.
/// NEVER reorder or remove entries, only append.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u64)]
pub enum StageSlot {
    Calendar          = 0,
    FeatureImportance = 1,
}

impl StageSlot {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Calendar          => "calendar",
            Self::FeatureImportance => "feature_importance",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_stream() {
        let mut a = RngBank::new(7).for_stage(StageSlot::Calendar);
        let mut b = RngBank::new(7).for_stage(StageSlot::Calendar);
        for _ in 0..32 {
            assert_eq!(a.next_u64_below(24), b.next_u64_below(24));
        }
    }

    #[test]
    fn stages_are_independent_streams() {
        let bank = RngBank::new(7);
        let mut cal = bank.for_stage(StageSlot::Calendar);
        let mut feat = bank.for_stage(StageSlot::FeatureImportance);
        let a: Vec<f64> = (0..8).map(|_| cal.next_f64()).collect();
        let b: Vec<f64> = (0..8).map(|_| feat.next_f64()).collect();
        assert_ne!(a, b);
        assert_eq!(feat.name, "feature_importance");
    }

    #[test]
    fn uniform_stays_in_range() {
        let mut rng = RngBank::new(99).for_stage(StageSlot::FeatureImportance);
        for _ in 0..1_000 {
            let v = rng.uniform(0.1, 1.0);
            assert!((0.1..1.0).contains(&v), "out of range: {v}");
        }
    }
}
