//! Session-scoped and context-scoped mutable state.
//!
//! The session owns its state for the full run, and each sampled context gets
//! a fresh [`ContextRunState`] that is dropped when its step sequence
//! finishes, so nothing can leak across contexts.

use rand::Rng;

use crate::core::context::Context;
use crate::core::timeline::StepOrder;

/// Per-participant state, created once per session.
#[derive(Debug)]
pub struct SessionState {
    /// Step ordering fixed for the whole session.
    pub order: StepOrder,
    /// Incremented once per sampled context, never reset.
    pub presentation_counter: u32,
}

impl SessionState {
    pub fn new(order: StepOrder) -> Self {
        Self {
            order,
            presentation_counter: 0,
        }
    }

    /// Advance to the next sampled context; returns its presentation index.
    ///
    /// Successive calls yield 1, 2, 3, ... with no repeats and no gaps.
    pub fn next_presentation(&mut self) -> u32 {
        self.presentation_counter += 1;
        self.presentation_counter
    }
}

/// Per-context state, created fresh when a sampled context begins.
#[derive(Debug)]
pub struct ContextRunState {
    /// 1-indexed slot of the ground-truth action, uniform in 1..=6.
    pub chosen_slot: u8,
    /// Text of the ground-truth action, looked up from the context.
    pub chosen_action: String,
    /// Participant-generated answers, append-only, never blank.
    pub generated_answers: Vec<String>,
    /// Next index of `generated_answers` to rate.
    pub rating_cursor: usize,
}

impl ContextRunState {
    pub fn begin<R: Rng>(context: &Context, rng: &mut R) -> Self {
        let chosen_slot = rng.gen_range(1..=6);
        Self {
            chosen_slot,
            chosen_action: context.action(chosen_slot).to_string(),
            generated_answers: Vec::new(),
            rating_cursor: 0,
        }
    }

    /// Trim and append an answer. Blank/whitespace-only input is dropped.
    ///
    /// Returns true if the answer was kept.
    pub fn push_answer(&mut self, raw: &str) -> bool {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return false;
        }
        self.generated_answers.push(trimmed.to_string());
        true
    }
}
