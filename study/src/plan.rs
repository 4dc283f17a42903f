//! Preamble and debrief steps surrounding the trial block.
//!
//! All wording lives here, outside the engine; the engine only executes the
//! plan's steps through the same step executor as the trial block.

use session::run::{PlanStep, SessionPlan};
use session::step::{InputKind, Stimulus, SurveyQuestion};

const CONSENT: &str = "Please consider this information carefully before deciding whether \
to participate in this research. The purpose of this research is to examine which factors \
influence social judgment and decision-making. You will be asked to make judgements about \
individuals and actions in social scenarios. Your participation is completely voluntary and \
you may withdraw at any time without penalty. No personally identifiable information will be \
associated with your data. By continuing you consent to participate in this study.";

const COMMITMENT_PREAMBLE: &str = "We care about the quality of our data. For us to get the \
most accurate measures of your responses, it is important that you provide thoughtful answers \
to each question in this study.\n\nDo you commit to providing thoughtful answers to the \
questions in this study?";

const INSTRUCTIONS: &str = "In this study, you'll read several short stories and then will be \
asked a few questions about each story. Please read carefully. In some questions you will be \
asked to answer about what naturally comes to mind in a given scenario. Please try to answer \
these questions as honestly as possible without censoring your responses.";

const DEBRIEF: &str = "Study Debriefing\n\nJudgement and decision making are important aspects \
of public and private life. Using surveys like the one you just completed, we are examining \
the factors that go into making social decisions. By isolating different variables that are \
involved in social thought, we can better understand how we arrive at complex decision-making. \
Thank you for your participation!";

fn demographics() -> Vec<SurveyQuestion> {
    let questions = [
        ("How old are you?", "age"),
        (
            "Which is your dominant hand (e.g., Right, Left, Ambidextrous)?",
            "handedness",
        ),
        ("What is your native language?", "language"),
        ("What is your nationality?", "nationality"),
        ("In which country do you live?", "residence"),
        ("What is your gender (e.g., Male, Female, Other)?", "gender"),
        (
            "What is your education level (e.g., High school, College or university degree, \
             Graduate degree)?",
            "education",
        ),
    ];
    questions
        .into_iter()
        .map(|(prompt, name)| SurveyQuestion {
            prompt: prompt.to_string(),
            name: name.to_string(),
        })
        .collect()
}

/// The standard session plan: consent, demographics, commitment and
/// instructions up front, a debrief at the end.
pub fn default_plan(require_responses: bool) -> SessionPlan {
    SessionPlan {
        intro: vec![
            PlanStep {
                name: "consent".to_string(),
                stimulus: Stimulus::Notice {
                    text: CONSENT.to_string(),
                },
                input: InputKind::Acknowledge,
                required: false,
            },
            PlanStep {
                name: "participant_info".to_string(),
                stimulus: Stimulus::Notice {
                    text: "Please provide us with some demographic information.".to_string(),
                },
                input: InputKind::Survey(demographics()),
                required: require_responses,
            },
            PlanStep {
                name: "commitment".to_string(),
                stimulus: Stimulus::Notice {
                    text: COMMITMENT_PREAMBLE.to_string(),
                },
                input: InputKind::Menu(vec![
                    "I can't promise either way".to_string(),
                    "Yes, I will".to_string(),
                    "No, I will not".to_string(),
                ]),
                required: require_responses,
            },
            PlanStep {
                name: "instructions".to_string(),
                stimulus: Stimulus::Notice {
                    text: INSTRUCTIONS.to_string(),
                },
                input: InputKind::Acknowledge,
                required: false,
            },
        ],
        outro: vec![PlanStep {
            name: "debrief".to_string(),
            stimulus: Stimulus::Notice {
                text: DEBRIEF.to_string(),
            },
            input: InputKind::Acknowledge,
            required: false,
        }],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_has_four_intro_steps_and_a_debrief() {
        let plan = default_plan(true);
        let names: Vec<&str> = plan.intro.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["consent", "participant_info", "commitment", "instructions"]
        );
        assert_eq!(plan.outro.len(), 1);
        assert_eq!(plan.outro[0].name, "debrief");
    }

    #[test]
    fn demographics_requiredness_follows_the_setting() {
        let strict = default_plan(true);
        let lax = default_plan(false);
        assert!(strict.intro[1].required);
        assert!(!lax.intro[1].required);
    }
}
