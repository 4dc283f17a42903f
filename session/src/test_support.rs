//! Test-only doubles and fixtures for driving the engine without a participant.

use std::collections::VecDeque;

use anyhow::{Result, anyhow};
use async_trait::async_trait;

use crate::core::context::Context;
use crate::io::frontend::FrontEnd;
use crate::io::sink::DataSink;
use crate::record::{RecordTags, SessionRecord, StepKind, StepRecord};
use crate::step::{Answer, InputKind, Stimulus, StepPrompt};

/// Front end that replays a fixed queue of answers.
///
/// Each `present` call pops one answer, so a re-prompted step consumes the
/// next queued answer. Running out of answers is an error (the script was
/// shorter than the session).
#[derive(Debug, Default)]
pub struct ScriptedFrontEnd {
    answers: VecDeque<Answer>,
    seen: Vec<StepPrompt>,
}

impl ScriptedFrontEnd {
    pub fn new(answers: Vec<Answer>) -> Self {
        Self {
            answers: answers.into(),
            seen: Vec::new(),
        }
    }

    /// Number of `present` calls observed so far.
    pub fn presented(&self) -> usize {
        self.seen.len()
    }

    /// Every prompt shown, including re-prompts of the same step.
    pub fn prompts(&self) -> &[StepPrompt] {
        &self.seen
    }

    /// Answers left in the script.
    pub fn remaining(&self) -> usize {
        self.answers.len()
    }
}

#[async_trait]
impl FrontEnd for ScriptedFrontEnd {
    async fn present(&mut self, prompt: &StepPrompt) -> Result<Answer> {
        self.seen.push(prompt.clone());
        self.answers
            .pop_front()
            .ok_or_else(|| anyhow!("script exhausted at step {:?}", prompt.kind))
    }
}

/// Sink that rejects records, optionally only per-step ones.
#[derive(Debug, Default)]
pub struct FailingSink {
    /// Accept the final session record even though steps are rejected.
    pub accept_session: bool,
    pub step_attempts: usize,
}

#[async_trait]
impl DataSink for FailingSink {
    async fn on_step_complete(&mut self, _record: &StepRecord) -> Result<()> {
        self.step_attempts += 1;
        Err(anyhow!("sink unavailable"))
    }

    async fn on_session_complete(&mut self, _record: &SessionRecord) -> Result<()> {
        if self.accept_session {
            Ok(())
        } else {
            Err(anyhow!("sink unavailable"))
        }
    }
}

/// Deterministic context with six distinct actions derived from `id`.
pub fn context(id: &str) -> Context {
    Context {
        id: id.to_string(),
        text: format!("{id} narrative"),
        agent: format!("{id} agent"),
        actions: [1, 2, 3, 4, 5, 6].map(|slot| format!("{id} action {slot}")),
    }
}

/// Pool of `size` deterministic contexts.
pub fn context_pool(size: usize) -> Vec<Context> {
    (1..=size).map(|i| context(&format!("ctx-{i}"))).collect()
}

/// Minimal acknowledgement prompt for executor tests.
pub fn ack_prompt() -> StepPrompt {
    StepPrompt {
        kind: StepKind::Scenario,
        name: None,
        stimulus: Stimulus::Notice {
            text: "notice".to_string(),
        },
        input: InputKind::Acknowledge,
        required: false,
        persist: false,
        context_id: None,
        presentation_index: None,
        tags: RecordTags::default(),
    }
}

/// Free-text entry prompt with explicit required-ness for executor tests.
pub fn entry_prompt(required: bool) -> StepPrompt {
    StepPrompt {
        kind: StepKind::GenerationEntry,
        name: None,
        stimulus: Stimulus::GenerationEntry {
            text: "narrative".to_string(),
            agent: "agent".to_string(),
            action: None,
            previous: Vec::new(),
        },
        input: InputKind::FreeText,
        required,
        persist: false,
        context_id: Some("ctx-1".to_string()),
        presentation_index: Some(1),
        tags: RecordTags::default(),
    }
}
