//! Single-step execution: present, await, validate, record, emit.
//!
//! The executor is the only place the engine suspends. It awaits the front
//! end once per response attempt, re-prompting the same step until the
//! response passes validation, then stamps a [`StepRecord`] and emits it to
//! the data sink. Sink failures are logged and never block the participant.

use std::fmt;

use anyhow::{Result, bail};
use tracing::{debug, warn};

use crate::io::frontend::FrontEnd;
use crate::io::sink::DataSink;
use crate::record::{Payload, RecordTags, SessionClock, StepKind, StepRecord, SurveyAnswer};

/// One free-text question of a survey step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurveyQuestion {
    pub prompt: String,
    pub name: String,
}

/// Where a slider starts before the participant moves it.
///
/// Generated-action ratings start unset; the ground-truth rating starts at the
/// midpoint. The asymmetry is deliberate and must be preserved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SliderStart {
    Unset,
    Midpoint,
}

/// Structural stimulus of a step. Rendering is opaque to the engine: the
/// front end decides wording and layout from these fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stimulus {
    /// Literal caller-supplied text (preamble/debrief screens).
    Notice { text: String },
    /// Initial scenario; `action` is present only when the ground-truth
    /// action is shown up front.
    Scenario {
        text: String,
        agent: String,
        action: Option<String>,
    },
    /// Force judgment; `highlight` marks the first time the participant sees
    /// the decision.
    Force {
        text: String,
        agent: String,
        action: String,
        highlight: bool,
    },
    /// Verification question; the options live in the input kind.
    Recall { agent: String },
    /// Asks for another action or a stop; carries previously collected
    /// answers so the front end can show them.
    GenerationPrompt {
        text: String,
        agent: String,
        action: Option<String>,
        previous: Vec<String>,
        can_stop: bool,
    },
    /// Free-text entry of one action.
    GenerationEntry {
        text: String,
        agent: String,
        action: Option<String>,
        previous: Vec<String>,
    },
    /// Three-axis rating of one action; `actual` marks the ground truth.
    Rating {
        agent: String,
        action: String,
        actual: bool,
        start: SliderStart,
    },
}

/// What kind of response the step expects from the front end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputKind {
    /// Any acknowledgement; no data collected.
    Acknowledge,
    /// One free-text answer.
    FreeText,
    /// One free-text answer per question, in order.
    Survey(Vec<SurveyQuestion>),
    /// Choice among the listed options.
    Menu(Vec<String>),
    /// Single 0..=100 slider.
    Slider,
    /// Three 0..=100 sliders (probability, morality, normality).
    Ratings,
    /// Verification choice among three options; correctness is computed
    /// against `truth` by the executor.
    Verify { options: [String; 3], truth: String },
}

/// Participant response supplied by the front end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    Acknowledged,
    Text(String),
    Survey(Vec<String>),
    Choice(usize),
    Slider(u8),
    Ratings {
        probability: u8,
        morality: u8,
        normality: u8,
    },
}

/// Full specification of one step handed to the front end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepPrompt {
    pub kind: StepKind,
    /// Label for `Plan` steps.
    pub name: Option<String>,
    pub stimulus: Stimulus,
    pub input: InputKind,
    /// Whether an empty response is rejected and re-prompted.
    pub required: bool,
    /// Whether the sink should flush the resulting record immediately.
    pub persist: bool,
    pub context_id: Option<String>,
    pub presentation_index: Option<u32>,
    pub tags: RecordTags,
}

/// Why a response was rejected; the step re-prompts, never fails.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Rejection {
    EmptyRequired,
    ChoiceOutOfRange { index: usize, options: usize },
    SliderOutOfRange { value: u8 },
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::EmptyRequired => write!(f, "required response is empty"),
            Rejection::ChoiceOutOfRange { index, options } => {
                write!(f, "choice {index} out of range (options: {options})")
            }
            Rejection::SliderOutOfRange { value } => {
                write!(f, "slider value {value} outside 0..=100")
            }
        }
    }
}

enum Verdict {
    Accept(Payload),
    Reprompt(Rejection),
}

/// Execute one step to completion.
///
/// Re-prompts indefinitely while the response fails validation (a
/// form-validation contract, not retry-with-backoff). Structural mismatch
/// between the requested input kind and the supplied answer is an embedding
/// bug and fails the session.
pub async fn execute_step<F, S>(
    frontend: &mut F,
    sink: &mut S,
    clock: &SessionClock,
    prompt: &StepPrompt,
) -> Result<StepRecord>
where
    F: FrontEnd + ?Sized,
    S: DataSink + ?Sized,
{
    loop {
        let answer = frontend.present(prompt).await?;
        match check_answer(prompt, &answer)? {
            Verdict::Accept(payload) => {
                let (recorded_at, elapsed_ms) = clock.stamp();
                let record = StepRecord {
                    kind: prompt.kind,
                    name: prompt.name.clone(),
                    context_id: prompt.context_id.clone(),
                    presentation_index: prompt.presentation_index,
                    payload,
                    tags: prompt.tags.clone(),
                    persist: prompt.persist,
                    recorded_at,
                    elapsed_ms,
                };
                if let Err(err) = sink.on_step_complete(&record).await {
                    warn!(kind = ?record.kind, error = %err, "data sink rejected step record");
                }
                return Ok(record);
            }
            Verdict::Reprompt(rejection) => {
                debug!(kind = ?prompt.kind, %rejection, "response rejected, re-prompting");
            }
        }
    }
}

/// Validate an answer against the prompt's input kind.
///
/// `Err` means the answer's shape does not match the requested kind at all.
fn check_answer(prompt: &StepPrompt, answer: &Answer) -> Result<Verdict> {
    let verdict = match (&prompt.input, answer) {
        (InputKind::Acknowledge, Answer::Acknowledged) => Verdict::Accept(Payload::Acknowledged),
        (InputKind::FreeText, Answer::Text(text)) => {
            if prompt.required && text.trim().is_empty() {
                Verdict::Reprompt(Rejection::EmptyRequired)
            } else {
                Verdict::Accept(Payload::Text { text: text.clone() })
            }
        }
        (InputKind::Survey(questions), Answer::Survey(values)) => {
            if questions.len() != values.len() {
                bail!(
                    "survey answer count {} does not match question count {}",
                    values.len(),
                    questions.len()
                );
            }
            if prompt.required && values.iter().any(|v| v.trim().is_empty()) {
                Verdict::Reprompt(Rejection::EmptyRequired)
            } else {
                let answers = questions
                    .iter()
                    .zip(values)
                    .map(|(q, v)| SurveyAnswer {
                        name: q.name.clone(),
                        value: v.clone(),
                    })
                    .collect();
                Verdict::Accept(Payload::Survey { answers })
            }
        }
        (InputKind::Menu(options), Answer::Choice(index)) => match options.get(*index) {
            Some(option) => Verdict::Accept(Payload::Choice {
                index: *index,
                option: option.clone(),
            }),
            None => Verdict::Reprompt(Rejection::ChoiceOutOfRange {
                index: *index,
                options: options.len(),
            }),
        },
        (InputKind::Slider, Answer::Slider(value)) => {
            if *value > 100 {
                Verdict::Reprompt(Rejection::SliderOutOfRange { value: *value })
            } else {
                Verdict::Accept(Payload::Slider { value: *value })
            }
        }
        (
            InputKind::Ratings,
            Answer::Ratings {
                probability,
                morality,
                normality,
            },
        ) => {
            match [*probability, *morality, *normality]
                .into_iter()
                .find(|v| *v > 100)
            {
                Some(value) => Verdict::Reprompt(Rejection::SliderOutOfRange { value }),
                None => Verdict::Accept(Payload::Ratings {
                    probability: *probability,
                    morality: *morality,
                    normality: *normality,
                }),
            }
        }
        (InputKind::Verify { options, truth }, Answer::Choice(index)) => {
            match options.get(*index) {
                Some(selected) => Verdict::Accept(Payload::Verification {
                    selected: selected.clone(),
                    correct: selected == truth,
                }),
                None => Verdict::Reprompt(Rejection::ChoiceOutOfRange {
                    index: *index,
                    options: options.len(),
                }),
            }
        }
        (input, answer) => bail!("answer {answer:?} does not match requested input {input:?}"),
    };
    Ok(verdict)
}
