//! Per-session step ordering.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Which of the two fixed step orderings this session uses.
///
/// Decided by an unbiased coin flip at session start (or pinned via
/// configuration for replay) and never re-randomized per context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepOrder {
    /// The ground-truth action is shown up front; the force rating precedes
    /// the generation loop.
    ForceFirst,
    /// Participants generate actions before seeing the ground-truth action.
    GenerationFirst,
}

impl StepOrder {
    /// Unbiased coin flip.
    pub fn flip<R: Rng>(rng: &mut R) -> Self {
        if rng.gen_bool(0.5) {
            StepOrder::ForceFirst
        } else {
            StepOrder::GenerationFirst
        }
    }
}

/// One of the six trial phases run for every sampled context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Scenario,
    Force,
    AttentionGate,
    GenerationLoop,
    RatingSweep,
    ActualRating,
}

/// The fixed phase sequence for a session's step order.
///
/// Pure function of the order; every sampled context runs the same sequence.
pub fn phases(order: StepOrder) -> [Phase; 6] {
    match order {
        StepOrder::ForceFirst => [
            Phase::Scenario,
            Phase::Force,
            Phase::AttentionGate,
            Phase::GenerationLoop,
            Phase::RatingSweep,
            Phase::ActualRating,
        ],
        StepOrder::GenerationFirst => [
            Phase::Scenario,
            Phase::GenerationLoop,
            Phase::Force,
            Phase::AttentionGate,
            Phase::RatingSweep,
            Phase::ActualRating,
        ],
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn force_first_runs_force_before_generation() {
        let seq = phases(StepOrder::ForceFirst);
        assert_eq!(seq[0], Phase::Scenario);
        assert_eq!(seq[1], Phase::Force);
        assert_eq!(seq[3], Phase::GenerationLoop);
        assert_eq!(seq[5], Phase::ActualRating);
    }

    #[test]
    fn generation_first_runs_generation_before_force() {
        let seq = phases(StepOrder::GenerationFirst);
        assert_eq!(
            seq,
            [
                Phase::Scenario,
                Phase::GenerationLoop,
                Phase::Force,
                Phase::AttentionGate,
                Phase::RatingSweep,
                Phase::ActualRating,
            ]
        );
    }

    #[test]
    fn flip_is_deterministic_under_a_seed() {
        let mut a = StdRng::seed_from_u64(5);
        let mut b = StdRng::seed_from_u64(5);
        assert_eq!(StepOrder::flip(&mut a), StepOrder::flip(&mut b));
    }

    #[test]
    fn serializes_as_snake_case() {
        let json = serde_json::to_string(&StepOrder::ForceFirst).expect("serialize");
        assert_eq!(json, "\"force_first\"");
    }
}
