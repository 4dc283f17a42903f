//! Distractor construction for the verification/attention gate.
//!
//! The gate shows three of a context's six candidate actions and asks which
//! one the agent actually did. The three displayed slots are derived from the
//! chosen slot by a random even offset; the arithmetic guarantees the true
//! action appears exactly once among three pairwise-distinct options.

use rand::Rng;

/// Even offsets applied to the chosen slot when building the option set.
pub const OFFSETS: [u8; 3] = [0, 2, 4];

/// Presentation indices (1-based) at which the gate runs.
///
/// The third and sixth contexts seen by the participant, regardless of which
/// physical contexts those are. "Sixth" only exists when N >= 6.
pub fn gate_runs_at(presentation_index: u32) -> bool {
    presentation_index == 3 || presentation_index == 6
}

/// Pick one of the three even offsets uniformly.
pub fn random_offset<R: Rng>(rng: &mut R) -> u8 {
    OFFSETS[rng.gen_range(0..OFFSETS.len())]
}

/// The three 1-indexed slots displayed for a chosen slot and offset.
///
/// Zero-based, the displayed slots are `(chosen - 1 + offset + k) mod 6` for
/// `k` in {0, 2, 4}. The chosen slot itself lands at whichever `k` cancels the
/// offset mod 6, so it is always included exactly once.
pub fn option_slots(chosen_slot: u8, offset: u8) -> [u8; 3] {
    debug_assert!((1..=6).contains(&chosen_slot));
    debug_assert!(OFFSETS.contains(&offset));
    OFFSETS.map(|k| (chosen_slot - 1 + offset + k) % 6 + 1)
}
