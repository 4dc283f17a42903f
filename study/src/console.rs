//! Console front end: renders prompts with minijinja templates and reads
//! responses line by line.
//!
//! The engine owns validation (required-ness, ranges); this layer only loops
//! locally on input it cannot parse at all. EOF on the input stream is fatal.

use std::io::{BufRead, BufReader, Stdin, Stdout, Write};

use anyhow::{Context as _, Result, bail};
use async_trait::async_trait;
use minijinja::{Environment, context};

use session::io::frontend::FrontEnd;
use session::record::StepKind;
use session::step::{Answer, InputKind, SliderStart, StepPrompt, Stimulus};

const NOTICE_TEMPLATE: &str = include_str!("templates/notice.txt");
const SCENARIO_TEMPLATE: &str = include_str!("templates/scenario.txt");
const FORCE_TEMPLATE: &str = include_str!("templates/force.txt");
const RECALL_TEMPLATE: &str = include_str!("templates/recall.txt");
const GEN_PROMPT_TEMPLATE: &str = include_str!("templates/gen_prompt.txt");
const GEN_ENTRY_TEMPLATE: &str = include_str!("templates/gen_entry.txt");
const RATING_TEMPLATE: &str = include_str!("templates/rating.txt");

/// The three rating axes, phrased as in the study questions.
const RATING_AXES: [&str; 3] = [
    "probable or improbable",
    "moral or immoral",
    "normal or abnormal",
];

pub struct ConsoleFrontEnd<R, W> {
    env: Environment<'static>,
    input: R,
    output: W,
}

impl ConsoleFrontEnd<BufReader<Stdin>, Stdout> {
    pub fn stdio() -> Self {
        Self::new(BufReader::new(std::io::stdin()), std::io::stdout())
    }
}

impl<R: BufRead + Send, W: Write + Send> ConsoleFrontEnd<R, W> {
    pub fn new(input: R, output: W) -> Self {
        let mut env = Environment::new();
        env.add_template("notice", NOTICE_TEMPLATE)
            .expect("notice template should be valid");
        env.add_template("scenario", SCENARIO_TEMPLATE)
            .expect("scenario template should be valid");
        env.add_template("force", FORCE_TEMPLATE)
            .expect("force template should be valid");
        env.add_template("recall", RECALL_TEMPLATE)
            .expect("recall template should be valid");
        env.add_template("gen_prompt", GEN_PROMPT_TEMPLATE)
            .expect("gen_prompt template should be valid");
        env.add_template("gen_entry", GEN_ENTRY_TEMPLATE)
            .expect("gen_entry template should be valid");
        env.add_template("rating", RATING_TEMPLATE)
            .expect("rating template should be valid");
        Self { env, input, output }
    }

    fn render_stimulus(&self, stimulus: &Stimulus) -> Result<String> {
        let rendered = match stimulus {
            Stimulus::Notice { text } => self
                .env
                .get_template("notice")?
                .render(context! { text })?,
            Stimulus::Scenario {
                text,
                agent,
                action,
            } => self
                .env
                .get_template("scenario")?
                .render(context! { text, agent, action })?,
            Stimulus::Force {
                text,
                agent,
                action,
                highlight,
            } => self
                .env
                .get_template("force")?
                .render(context! { text, agent, action, highlight })?,
            Stimulus::Recall { agent } => self
                .env
                .get_template("recall")?
                .render(context! { agent })?,
            Stimulus::GenerationPrompt {
                text,
                agent,
                action,
                previous,
                ..
            } => self
                .env
                .get_template("gen_prompt")?
                .render(context! { text, agent, action, previous })?,
            Stimulus::GenerationEntry {
                text,
                agent,
                action,
                previous,
            } => self
                .env
                .get_template("gen_entry")?
                .render(context! { text, agent, action, previous })?,
            Stimulus::Rating {
                agent,
                action,
                actual,
                ..
            } => self
                .env
                .get_template("rating")?
                .render(context! { agent, action, actual })?,
        };
        Ok(rendered)
    }

    fn say(&mut self, text: &str) -> Result<()> {
        writeln!(self.output, "{text}").context("write to console")?;
        self.output.flush().context("flush console")?;
        Ok(())
    }

    fn read_line(&mut self) -> Result<String> {
        let mut line = String::new();
        let read = self.input.read_line(&mut line).context("read input")?;
        if read == 0 {
            bail!("input closed");
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    /// Read until a parseable unsigned integer is entered.
    fn read_number(&mut self, label: &str) -> Result<u8> {
        loop {
            self.say(label)?;
            let line = self.read_line()?;
            match line.trim().parse::<u8>() {
                Ok(value) => return Ok(value),
                Err(_) => self.say("Please enter a number.")?,
            }
        }
    }

    fn read_menu(&mut self, options: &[String]) -> Result<usize> {
        for (i, option) in options.iter().enumerate() {
            self.say(&format!("  [{}] {option}", i + 1))?;
        }
        loop {
            self.say("Enter the number of your choice:")?;
            let line = self.read_line()?;
            match line.trim().parse::<usize>() {
                // The engine validates the range and re-prompts if needed.
                Ok(n) if n >= 1 => return Ok(n - 1),
                _ => self.say("Please enter a number from the list.")?,
            }
        }
    }

    fn slider_hint(start: SliderStart) -> &'static str {
        match start {
            SliderStart::Unset => "Enter a value from 0 to 100:",
            SliderStart::Midpoint => "Enter a value from 0 to 100 (the slider starts at 50):",
        }
    }

    fn gather(&mut self, prompt: &StepPrompt) -> Result<Answer> {
        match &prompt.input {
            InputKind::Acknowledge => {
                self.say("[press Enter to continue]")?;
                self.read_line()?;
                Ok(Answer::Acknowledged)
            }
            InputKind::FreeText => {
                self.say("> ")?;
                Ok(Answer::Text(self.read_line()?))
            }
            InputKind::Survey(questions) => {
                let mut values = Vec::with_capacity(questions.len());
                for question in questions {
                    self.say(&question.prompt)?;
                    values.push(self.read_line()?);
                }
                Ok(Answer::Survey(values))
            }
            InputKind::Menu(options) => {
                let labels = self.menu_labels(prompt.kind, options);
                Ok(Answer::Choice(self.read_menu(&labels)?))
            }
            InputKind::Verify { options, .. } => {
                Ok(Answer::Choice(self.read_menu(options.as_slice())?))
            }
            InputKind::Slider => {
                let value = self.read_number("Enter a value from 0 to 100:")?;
                Ok(Answer::Slider(value))
            }
            InputKind::Ratings => {
                let start = match &prompt.stimulus {
                    Stimulus::Rating { start, .. } => *start,
                    _ => SliderStart::Unset,
                };
                let agent = match &prompt.stimulus {
                    Stimulus::Rating { agent, .. } => agent.clone(),
                    _ => "the agent".to_string(),
                };
                let mut values = [0u8; 3];
                for (value, axis) in values.iter_mut().zip(RATING_AXES) {
                    self.say(&format!(
                        "Do you think this is a {axis} thing for {agent} to do?"
                    ))?;
                    *value = self.read_number(Self::slider_hint(start))?;
                }
                Ok(Answer::Ratings {
                    probability: values[0],
                    morality: values[1],
                    normality: values[2],
                })
            }
        }
    }

    /// The generation prompt's menu carries stable tokens; everything else
    /// shows the caller's option texts as-is.
    fn menu_labels(&self, kind: StepKind, options: &[String]) -> Vec<String> {
        if kind != StepKind::GenerationPrompt {
            return options.to_vec();
        }
        options
            .iter()
            .map(|option| match option.as_str() {
                "continue" => {
                    if options.len() == 1 {
                        "Enter an action".to_string()
                    } else {
                        "Enter another action".to_string()
                    }
                }
                "stop" => "I can't think of any more actions".to_string(),
                other => other.to_string(),
            })
            .collect()
    }
}

#[async_trait]
impl<R: BufRead + Send, W: Write + Send> FrontEnd for ConsoleFrontEnd<R, W> {
    async fn present(&mut self, prompt: &StepPrompt) -> Result<Answer> {
        let stimulus = self.render_stimulus(&prompt.stimulus)?;
        self.say("")?;
        self.say(&stimulus)?;
        self.gather(prompt)
    }
}
