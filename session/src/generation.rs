//! Generation loop controller: repeated prompt/entry cycle collecting
//! participant-authored alternative actions for one context.
//!
//! The loop is an explicit state machine whose transitions come from the
//! return values of the prompt and entry steps, not from inspecting a shared
//! record log. Exit is the participant's explicit choice; no cap is imposed,
//! so a participant who keeps choosing "continue" loops indefinitely.

use anyhow::Result;

use crate::core::context::Context;
use crate::core::state::ContextRunState;
use crate::core::timeline::StepOrder;
use crate::io::frontend::FrontEnd;
use crate::io::sink::DataSink;
use crate::record::{Payload, RecordTags, StepKind};
use crate::run::{Engine, action_shown_early};
use crate::step::{InputKind, StepPrompt, Stimulus};

/// Stable option values for the prompt step's menu. Front ends render their
/// own wording; records carry these tokens.
pub const CHOICE_CONTINUE: &str = "continue";
pub const CHOICE_STOP: &str = "stop";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoopState {
    AwaitingPromptChoice,
    AwaitingEntry,
    Exited,
}

/// Run the generation loop for one context, appending trimmed non-blank
/// answers to `run.generated_answers`.
///
/// The stop option is only offered once at least one answer has been
/// collected, so the loop cannot exit empty.
pub(crate) async fn collect_answers<F, S>(
    engine: &mut Engine<'_, F, S>,
    context: &Context,
    run: &mut ContextRunState,
    presentation_index: u32,
    order: StepOrder,
) -> Result<()>
where
    F: FrontEnd,
    S: DataSink,
{
    let mut state = LoopState::AwaitingPromptChoice;
    while state != LoopState::Exited {
        state = match state {
            LoopState::AwaitingPromptChoice => {
                let record = engine
                    .step(&prompt_step(context, run, presentation_index, order))
                    .await?;
                match record.payload {
                    Payload::Choice { ref option, .. } if option == CHOICE_STOP => {
                        LoopState::Exited
                    }
                    _ => LoopState::AwaitingEntry,
                }
            }
            LoopState::AwaitingEntry => {
                let required = engine.require_responses && run.generated_answers.is_empty();
                let record = engine
                    .step(&entry_step(context, run, presentation_index, order, required))
                    .await?;
                if let Payload::Text { ref text } = record.payload {
                    run.push_answer(text);
                }
                LoopState::AwaitingPromptChoice
            }
            LoopState::Exited => unreachable!("loop exits before matching"),
        };
    }
    Ok(())
}

fn prompt_step(
    context: &Context,
    run: &ContextRunState,
    presentation_index: u32,
    order: StepOrder,
) -> StepPrompt {
    let can_stop = !run.generated_answers.is_empty();
    let options = if can_stop {
        vec![CHOICE_CONTINUE.to_string(), CHOICE_STOP.to_string()]
    } else {
        vec![CHOICE_CONTINUE.to_string()]
    };
    StepPrompt {
        kind: StepKind::GenerationPrompt,
        name: None,
        stimulus: Stimulus::GenerationPrompt {
            text: context.text.clone(),
            agent: context.agent.clone(),
            action: action_shown_early(order).then(|| run.chosen_action.clone()),
            previous: run.generated_answers.clone(),
            can_stop,
        },
        input: InputKind::Menu(options),
        required: true,
        persist: false,
        context_id: Some(context.id.clone()),
        presentation_index: Some(presentation_index),
        tags: RecordTags::default(),
    }
}

fn entry_step(
    context: &Context,
    run: &ContextRunState,
    presentation_index: u32,
    order: StepOrder,
    required: bool,
) -> StepPrompt {
    StepPrompt {
        kind: StepKind::GenerationEntry,
        name: None,
        stimulus: Stimulus::GenerationEntry {
            text: context.text.clone(),
            agent: context.agent.clone(),
            action: action_shown_early(order).then(|| run.chosen_action.clone()),
            previous: run.generated_answers.clone(),
        },
        input: InputKind::FreeText,
        required,
        persist: true,
        context_id: Some(context.id.clone()),
        presentation_index: Some(presentation_index),
        tags: RecordTags::default(),
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::core::state::ContextRunState;
    use crate::io::sink::MemorySink;
    use crate::step::Answer;
    use crate::test_support::{ScriptedFrontEnd, context};

    async fn drive(
        answers: Vec<Answer>,
        require_responses: bool,
    ) -> (ContextRunState, ScriptedFrontEnd, MemorySink) {
        let ctx = context("ctx-1");
        let mut rng = StdRng::seed_from_u64(1);
        let mut run = ContextRunState::begin(&ctx, &mut rng);
        let mut frontend = ScriptedFrontEnd::new(answers);
        let mut sink = MemorySink::default();
        {
            let mut engine = Engine::new(&mut frontend, &mut sink, require_responses);
            collect_answers(
                &mut engine,
                &ctx,
                &mut run,
                1,
                StepOrder::GenerationFirst,
            )
            .await
            .expect("loop");
        }
        (run, frontend, sink)
    }

    #[tokio::test]
    async fn trims_answer_and_exits_on_stop() {
        let (run, frontend, _) = drive(
            vec![
                Answer::Choice(0),
                Answer::Text("Help the neighbor ".to_string()),
                Answer::Choice(1),
            ],
            true,
        )
        .await;
        assert_eq!(run.generated_answers, vec!["Help the neighbor"]);
        assert_eq!(frontend.presented(), 3);
    }

    #[tokio::test]
    async fn required_first_entry_rejects_blank() {
        let (run, frontend, sink) = drive(
            vec![
                Answer::Choice(0),
                Answer::Text(String::new()),
                Answer::Text("Take a walk".to_string()),
                Answer::Choice(1),
            ],
            true,
        )
        .await;
        assert_eq!(run.generated_answers, vec!["Take a walk"]);
        // The blank attempt was re-prompted, not recorded.
        assert_eq!(frontend.presented(), 4);
        assert_eq!(sink.steps.len(), 3);
    }

    #[tokio::test]
    async fn optional_blank_entry_is_dropped_but_recorded() {
        let (run, _, sink) = drive(
            vec![
                Answer::Choice(0),
                Answer::Text("   ".to_string()),
                Answer::Choice(0),
                Answer::Text("Take a walk".to_string()),
                Answer::Choice(1),
            ],
            false,
        )
        .await;
        assert_eq!(run.generated_answers, vec!["Take a walk"]);
        // Both entry attempts completed as steps under optional responses.
        assert_eq!(sink.steps.len(), 5);
    }

    #[tokio::test]
    async fn stop_is_not_offered_before_the_first_answer() {
        let (run, frontend, _) = drive(
            vec![
                // A stop attempt while empty is out of range and re-prompted.
                Answer::Choice(1),
                Answer::Choice(0),
                Answer::Text("Take a walk".to_string()),
                Answer::Choice(1),
            ],
            true,
        )
        .await;
        assert_eq!(run.generated_answers.len(), 1);

        let first = &frontend.prompts()[0];
        assert_eq!(
            first.input,
            InputKind::Menu(vec![CHOICE_CONTINUE.to_string()])
        );
        let last = frontend.prompts().last().expect("prompts");
        assert_eq!(
            last.input,
            InputKind::Menu(vec![CHOICE_CONTINUE.to_string(), CHOICE_STOP.to_string()])
        );
    }

    #[tokio::test]
    async fn loop_never_exits_empty() {
        let (run, _, _) = drive(
            vec![
                Answer::Choice(0),
                Answer::Text("First action".to_string()),
                Answer::Choice(1),
            ],
            true,
        )
        .await;
        assert!(!run.generated_answers.is_empty());
    }
}
