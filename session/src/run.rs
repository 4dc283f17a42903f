//! Session orchestration: wires sampler, timeline, gate, generation loop and
//! rating iterator into one full participant session.

use anyhow::{Context as _, Result};
use rand::Rng;
use tracing::{debug, info};

use crate::config::SessionConfig;
use crate::core::attention::{gate_runs_at, option_slots, random_offset};
use crate::core::context::Context;
use crate::core::sampler::sample_contexts;
use crate::core::state::{ContextRunState, SessionState};
use crate::core::timeline::{Phase, StepOrder, phases};
use crate::generation::collect_answers;
use crate::io::frontend::FrontEnd;
use crate::io::sink::DataSink;
use crate::rating::{rate_actual, rate_answers};
use crate::record::{RecordTags, SessionClock, SessionRecord, StepKind, StepRecord};
use crate::step::{InputKind, StepPrompt, Stimulus, execute_step};

/// One caller-supplied preamble/debrief step.
///
/// All wording lives with the caller; the engine sees only literal stimulus
/// strings and the input shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanStep {
    /// Label recorded on the step's record (e.g. "consent").
    pub name: String,
    pub stimulus: Stimulus,
    pub input: InputKind,
    pub required: bool,
}

/// Steps executed before the first and after the last sampled context.
///
/// An empty plan is valid; engine tests run bare trial blocks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionPlan {
    pub intro: Vec<PlanStep>,
    pub outro: Vec<PlanStep>,
}

/// Shared per-session execution handle threaded through the trial phases.
pub(crate) struct Engine<'a, F, S> {
    frontend: &'a mut F,
    sink: &'a mut S,
    clock: SessionClock,
    pub(crate) steps: Vec<StepRecord>,
    pub(crate) require_responses: bool,
}

impl<'a, F: FrontEnd, S: DataSink> Engine<'a, F, S> {
    pub(crate) fn new(frontend: &'a mut F, sink: &'a mut S, require_responses: bool) -> Self {
        Self {
            frontend,
            sink,
            clock: SessionClock::start(),
            steps: Vec::new(),
            require_responses,
        }
    }

    /// Run one step and append its record to the session's step list.
    pub(crate) async fn step(&mut self, prompt: &StepPrompt) -> Result<StepRecord> {
        let record = execute_step(self.frontend, self.sink, &self.clock, prompt).await?;
        self.steps.push(record.clone());
        Ok(record)
    }

    async fn plan_step(&mut self, step: &PlanStep) -> Result<()> {
        let prompt = StepPrompt {
            kind: StepKind::Plan,
            name: Some(step.name.clone()),
            stimulus: step.stimulus.clone(),
            input: step.input.clone(),
            required: step.required,
            persist: false,
            context_id: None,
            presentation_index: None,
            tags: RecordTags::default(),
        };
        self.step(&prompt).await?;
        Ok(())
    }
}

/// Drive one participant through a full session.
///
/// Samples `config.contexts_shown` contexts from the pool without
/// replacement, flips (or takes the pinned) step order, runs the intro plan,
/// the trial block for every sampled context, the outro plan, and finally
/// hands the assembled [`SessionRecord`] to the sink. Per-step sink failures
/// are logged and skipped; a failed session-completion call is propagated.
pub async fn run_session<F, S, R>(
    config: &SessionConfig,
    pool: &[Context],
    plan: &SessionPlan,
    frontend: &mut F,
    sink: &mut S,
    rng: &mut R,
) -> Result<SessionRecord>
where
    F: FrontEnd,
    S: DataSink,
    R: Rng,
{
    config.validate()?;
    let sampled = sample_contexts(pool, config.contexts_shown, rng)?;
    let order = config.forced_order.unwrap_or_else(|| StepOrder::flip(rng));
    info!(?order, contexts = sampled.len(), "session starting");

    let mut session = SessionState::new(order);
    let mut engine = Engine::new(frontend, sink, config.require_responses);
    let started_at = engine.clock.started_at();

    for step in &plan.intro {
        engine.plan_step(step).await?;
    }

    for context in &sampled {
        let presentation_index = session.next_presentation();
        let mut run = ContextRunState::begin(context, rng);
        debug!(
            context_id = %context.id,
            presentation_index,
            chosen_slot = run.chosen_slot,
            "context starting"
        );

        for phase in phases(order) {
            match phase {
                Phase::Scenario => {
                    engine
                        .step(&scenario_prompt(context, &run, presentation_index, order))
                        .await?;
                }
                Phase::Force => {
                    engine
                        .step(&force_prompt(context, &run, presentation_index, order))
                        .await?;
                }
                Phase::AttentionGate => {
                    if gate_runs_at(presentation_index) {
                        let offset = random_offset(rng);
                        engine
                            .step(&gate_prompt(context, &run, presentation_index, offset))
                            .await?;
                    }
                }
                Phase::GenerationLoop => {
                    collect_answers(&mut engine, context, &mut run, presentation_index, order)
                        .await?;
                }
                Phase::RatingSweep => {
                    rate_answers(&mut engine, context, &mut run, presentation_index).await?;
                }
                Phase::ActualRating => {
                    rate_actual(&mut engine, context, &run, presentation_index).await?;
                }
            }
        }
        debug!(
            context_id = %context.id,
            answers = run.generated_answers.len(),
            "context finished"
        );
    }

    for step in &plan.outro {
        engine.plan_step(step).await?;
    }

    let (finished_at, _) = engine.clock.stamp();
    let record = SessionRecord {
        order,
        started_at,
        finished_at,
        sampled_context_ids: sampled.iter().map(|c| c.id.clone()).collect(),
        config: config.clone(),
        steps: engine.steps,
    };
    sink.on_session_complete(&record)
        .await
        .context("data sink failed to accept the session record")?;
    info!(steps = record.steps.len(), "session complete");
    Ok(record)
}

/// The ground-truth action is visible before the generation loop only under
/// `ForceFirst`.
pub(crate) fn action_shown_early(order: StepOrder) -> bool {
    order == StepOrder::ForceFirst
}

fn scenario_prompt(
    context: &Context,
    run: &ContextRunState,
    presentation_index: u32,
    order: StepOrder,
) -> StepPrompt {
    StepPrompt {
        kind: StepKind::Scenario,
        name: None,
        stimulus: Stimulus::Scenario {
            text: context.text.clone(),
            agent: context.agent.clone(),
            action: action_shown_early(order).then(|| run.chosen_action.clone()),
        },
        input: InputKind::Acknowledge,
        required: false,
        persist: true,
        context_id: Some(context.id.clone()),
        presentation_index: Some(presentation_index),
        tags: RecordTags::default(),
    }
}

fn force_prompt(
    context: &Context,
    run: &ContextRunState,
    presentation_index: u32,
    order: StepOrder,
) -> StepPrompt {
    StepPrompt {
        kind: StepKind::Force,
        name: None,
        stimulus: Stimulus::Force {
            text: context.text.clone(),
            agent: context.agent.clone(),
            action: run.chosen_action.clone(),
            // Under GenerationFirst this is the participant's first look at
            // the decision.
            highlight: !action_shown_early(order),
        },
        input: InputKind::Slider,
        required: false,
        persist: true,
        context_id: Some(context.id.clone()),
        presentation_index: Some(presentation_index),
        tags: RecordTags {
            action: Some(run.chosen_action.clone()),
            action_slot: Some(run.chosen_slot),
            answer_index: None,
        },
    }
}

fn gate_prompt(
    context: &Context,
    run: &ContextRunState,
    presentation_index: u32,
    offset: u8,
) -> StepPrompt {
    let options = option_slots(run.chosen_slot, offset).map(|s| context.action(s).to_string());
    StepPrompt {
        kind: StepKind::AttentionCheck,
        name: None,
        stimulus: Stimulus::Recall {
            agent: context.agent.clone(),
        },
        input: InputKind::Verify {
            options,
            truth: run.chosen_action.clone(),
        },
        // Always required, independent of the require_responses setting.
        required: true,
        persist: true,
        context_id: Some(context.id.clone()),
        presentation_index: Some(presentation_index),
        tags: RecordTags {
            action: Some(run.chosen_action.clone()),
            action_slot: Some(run.chosen_slot),
            answer_index: None,
        },
    }
}
