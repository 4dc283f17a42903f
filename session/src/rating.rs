//! Rating iterator: three-axis ratings for every generated answer, then one
//! for the ground-truth action.

use anyhow::Result;

use crate::core::context::Context;
use crate::core::state::ContextRunState;
use crate::io::frontend::FrontEnd;
use crate::io::sink::DataSink;
use crate::record::{RecordTags, StepKind};
use crate::run::Engine;
use crate::step::{InputKind, SliderStart, StepPrompt, Stimulus};

/// Walk `generated_answers` in insertion order, collecting probability,
/// morality and normality ratings for each entry.
///
/// Advances `run.rating_cursor` so each index is visited exactly once.
pub(crate) async fn rate_answers<F, S>(
    engine: &mut Engine<'_, F, S>,
    context: &Context,
    run: &mut ContextRunState,
    presentation_index: u32,
) -> Result<()>
where
    F: FrontEnd,
    S: DataSink,
{
    while run.rating_cursor < run.generated_answers.len() {
        let index = run.rating_cursor;
        let action = run.generated_answers[index].clone();
        let prompt = StepPrompt {
            kind: StepKind::ResponseRating,
            name: None,
            stimulus: Stimulus::Rating {
                agent: context.agent.clone(),
                action: action.clone(),
                actual: false,
                start: SliderStart::Unset,
            },
            input: InputKind::Ratings,
            required: false,
            persist: true,
            context_id: Some(context.id.clone()),
            presentation_index: Some(presentation_index),
            tags: RecordTags {
                action: Some(action),
                action_slot: None,
                answer_index: Some(index),
            },
        };
        engine.step(&prompt).await?;
        run.rating_cursor += 1;
    }
    Ok(())
}

/// One additional rating step for the ground-truth action.
///
/// Same three axes, but the sliders start at the midpoint rather than unset.
pub(crate) async fn rate_actual<F, S>(
    engine: &mut Engine<'_, F, S>,
    context: &Context,
    run: &ContextRunState,
    presentation_index: u32,
) -> Result<()>
where
    F: FrontEnd,
    S: DataSink,
{
    let prompt = StepPrompt {
        kind: StepKind::ActualActionRating,
        name: None,
        stimulus: Stimulus::Rating {
            agent: context.agent.clone(),
            action: run.chosen_action.clone(),
            actual: true,
            start: SliderStart::Midpoint,
        },
        input: InputKind::Ratings,
        required: false,
        persist: true,
        context_id: Some(context.id.clone()),
        presentation_index: Some(presentation_index),
        tags: RecordTags {
            action: Some(run.chosen_action.clone()),
            action_slot: Some(run.chosen_slot),
            answer_index: None,
        },
    };
    engine.step(&prompt).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::io::sink::MemorySink;
    use crate::step::Answer;
    use crate::test_support::{ScriptedFrontEnd, context};

    fn ratings(value: u8) -> Answer {
        Answer::Ratings {
            probability: value,
            morality: value,
            normality: value,
        }
    }

    #[tokio::test]
    async fn rates_every_answer_then_the_ground_truth_once() {
        let ctx = context("ctx-1");
        let mut rng = StdRng::seed_from_u64(2);
        let mut run = ContextRunState::begin(&ctx, &mut rng);
        run.push_answer("First action");
        run.push_answer("Second action");

        let mut frontend =
            ScriptedFrontEnd::new(vec![ratings(10), ratings(20), ratings(30)]);
        let mut sink = MemorySink::default();
        let mut engine = Engine::new(&mut frontend, &mut sink, true);

        rate_answers(&mut engine, &ctx, &mut run, 1).await.expect("sweep");
        rate_actual(&mut engine, &ctx, &run, 1).await.expect("actual");

        assert_eq!(run.rating_cursor, 2);
        assert_eq!(engine.steps.len(), run.generated_answers.len() + 1);

        let kinds: Vec<StepKind> = engine.steps.iter().map(|r| r.kind).collect();
        assert_eq!(
            kinds,
            vec![
                StepKind::ResponseRating,
                StepKind::ResponseRating,
                StepKind::ActualActionRating,
            ]
        );
        assert_eq!(engine.steps[0].tags.answer_index, Some(0));
        assert_eq!(engine.steps[0].tags.action.as_deref(), Some("First action"));
        assert_eq!(engine.steps[1].tags.answer_index, Some(1));

        let actual = engine.steps.last().expect("actual record");
        assert_eq!(actual.tags.action.as_deref(), Some(run.chosen_action.as_str()));
        assert_eq!(actual.tags.action_slot, Some(run.chosen_slot));
        assert_eq!(actual.tags.answer_index, None);
    }

    #[tokio::test]
    async fn slider_start_differs_between_generated_and_actual() {
        let ctx = context("ctx-1");
        let mut rng = StdRng::seed_from_u64(2);
        let mut run = ContextRunState::begin(&ctx, &mut rng);
        run.push_answer("First action");

        let mut frontend = ScriptedFrontEnd::new(vec![ratings(0), ratings(50)]);
        let mut sink = MemorySink::default();
        {
            let mut engine = Engine::new(&mut frontend, &mut sink, true);
            rate_answers(&mut engine, &ctx, &mut run, 1).await.expect("sweep");
            rate_actual(&mut engine, &ctx, &run, 1).await.expect("actual");
        }

        let starts: Vec<SliderStart> = frontend
            .prompts()
            .iter()
            .map(|p| match &p.stimulus {
                Stimulus::Rating { start, .. } => *start,
                other => panic!("unexpected stimulus {other:?}"),
            })
            .collect();
        assert_eq!(starts, vec![SliderStart::Unset, SliderStart::Midpoint]);
    }
}
