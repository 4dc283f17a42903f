//! Immutable scenario unit read from the external contexts table.

use serde::{Deserialize, Serialize};

/// One scenario: narrative text, a named agent, and six candidate actions.
///
/// The engine never mutates a context; the source of truth is the external
/// read-only table loaded by the embedding layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Context {
    pub id: String,
    pub text: String,
    pub agent: String,
    /// Candidate actions, addressed by 1-indexed slot.
    pub actions: [String; 6],
}

impl Context {
    /// Action text at a 1-indexed slot in 1..=6.
    pub fn action(&self, slot: u8) -> &str {
        debug_assert!((1..=6).contains(&slot), "slot out of range: {slot}");
        &self.actions[usize::from(slot) - 1]
    }
}
