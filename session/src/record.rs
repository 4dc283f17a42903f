//! Persisted data shapes: one record per executed step, one per session.
//!
//! These types are the write-only output of the engine. They must remain
//! stable and serializable; nothing in the engine reads a record back except
//! the loop/gate controllers, which inspect the record they just produced.

use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::SessionConfig;
use crate::core::timeline::StepOrder;

/// Tag identifying which step produced a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    /// Initial scenario presentation.
    Scenario,
    /// Agreement rating for the statement that the agent had to act as they did.
    Force,
    /// Verification that the participant recalls the presented action.
    AttentionCheck,
    /// Asks whether the participant wants to enter another action or stop.
    GenerationPrompt,
    /// Free-text collection of one participant-authored action.
    GenerationEntry,
    /// Three-axis rating of one participant-generated action.
    ResponseRating,
    /// Three-axis rating of the ground-truth action.
    ActualActionRating,
    /// Caller-supplied preamble/debrief step; `name` identifies which one.
    Plan,
}

/// One named answer from a survey step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurveyAnswer {
    pub name: String,
    pub value: String,
}

/// Kind-dependent response payload of a completed step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Payload {
    /// The participant acknowledged the stimulus (no data).
    Acknowledged,
    /// Free-text response, stored as entered.
    Text { text: String },
    /// Named free-text answers, in question order.
    Survey { answers: Vec<SurveyAnswer> },
    /// Menu selection: index into the offered options plus the option value.
    Choice { index: usize, option: String },
    /// Single slider value in 0..=100.
    Slider { value: u8 },
    /// Three-axis slider values in 0..=100.
    Ratings {
        probability: u8,
        morality: u8,
        normality: u8,
    },
    /// Verification selection and whether it matched the ground-truth action.
    Verification { selected: String, correct: bool },
}

/// Optional tags identifying the action a record concerns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordTags {
    /// Action text a force/rating/verification record is about.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    /// 1-indexed slot of the ground-truth action within its context.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_slot: Option<u8>,
    /// Index into the generated-answer list for response ratings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer_index: Option<usize>,
}

/// One record per executed step, emitted to the data sink in execution order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRecord {
    pub kind: StepKind,
    /// Caller-supplied label for `Plan` steps (e.g. which preamble screen).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_id: Option<String>,
    /// 1-indexed order in which the context was presented to this participant.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presentation_index: Option<u32>,
    pub payload: Payload,
    #[serde(flatten)]
    pub tags: RecordTags,
    /// Whether the sink should flush this record immediately rather than only
    /// at session end.
    pub persist: bool,
    /// RFC 3339 timestamp of record creation.
    pub recorded_at: String,
    /// Milliseconds since session start; non-decreasing across a session.
    pub elapsed_ms: u64,
}

/// The full session output, handed to the data sink exactly once at the end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub order: StepOrder,
    pub started_at: String,
    pub finished_at: String,
    /// Sampled context ids in presentation order.
    pub sampled_context_ids: Vec<String>,
    /// Echo of the configuration the session ran with.
    pub config: SessionConfig,
    pub steps: Vec<StepRecord>,
}

/// Monotonic session clock used to stamp records.
#[derive(Debug)]
pub struct SessionClock {
    started: Instant,
    started_at: DateTime<Utc>,
}

impl SessionClock {
    pub fn start() -> Self {
        Self {
            started: Instant::now(),
            started_at: Utc::now(),
        }
    }

    /// RFC 3339 timestamp of session start.
    pub fn started_at(&self) -> String {
        self.started_at.to_rfc3339()
    }

    /// Wall-clock timestamp plus elapsed milliseconds for a new record.
    pub fn stamp(&self) -> (String, u64) {
        let elapsed = self.started.elapsed().as_millis() as u64;
        (Utc::now().to_rfc3339(), elapsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_serializes_without_empty_tags() {
        let record = StepRecord {
            kind: StepKind::Scenario,
            name: None,
            context_id: Some("ctx-1".to_string()),
            presentation_index: Some(1),
            payload: Payload::Acknowledged,
            tags: RecordTags::default(),
            persist: true,
            recorded_at: "2024-01-01T00:00:00+00:00".to_string(),
            elapsed_ms: 12,
        };
        let json = serde_json::to_value(&record).expect("serialize");
        assert_eq!(json["kind"], "scenario");
        assert_eq!(json["payload"]["type"], "acknowledged");
        assert!(json.get("action").is_none());
        assert!(json.get("name").is_none());
    }

    #[test]
    fn clock_stamp_is_monotonic() {
        let clock = SessionClock::start();
        let (_, first) = clock.stamp();
        let (_, second) = clock.stamp();
        assert!(second >= first);
    }
}
