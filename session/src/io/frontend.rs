//! The seam through which the engine suspends awaiting participant input.

use anyhow::Result;
use async_trait::async_trait;

use crate::step::{Answer, StepPrompt};

/// Presents one step to the participant and resolves with their response.
///
/// The engine awaits `present` exactly once per response attempt; a rejected
/// response (e.g. required but blank) results in another `present` call for
/// the same prompt. Suspension is unbounded: the engine imposes no timeout.
/// An error from the front end (e.g. closed input) is fatal to the session.
#[async_trait]
pub trait FrontEnd {
    async fn present(&mut self, prompt: &StepPrompt) -> Result<Answer>;
}
