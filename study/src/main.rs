//! Console runner for the behavioral-study session engine.
//!
//! `study run` drives one participant through a full session at the terminal
//! and captures results under `results/<session-id>/`; `study validate`
//! checks a contexts table without running anything.

mod console;
mod plan;
mod results;
mod table;

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use rand::SeedableRng;
use rand::rngs::StdRng;

use session::config::{SessionConfig, load_config};
use session::io::sink::JsonlSink;
use session::run::run_session;

use crate::console::ConsoleFrontEnd;
use crate::results::MetaInput;

#[derive(Parser)]
#[command(name = "study", version, about = "Behavioral-study session runner")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run one participant session at the console.
    Run {
        /// Contexts table (TOML).
        #[arg(long)]
        table: PathBuf,
        /// Results base directory.
        #[arg(long, default_value = "results")]
        out: PathBuf,
        /// Session configuration file (TOML); defaults apply if omitted.
        #[arg(long)]
        config: Option<PathBuf>,
        /// Override the configured RNG seed.
        #[arg(long)]
        seed: Option<u64>,
        /// Override the configured number of contexts shown.
        #[arg(long)]
        contexts: Option<usize>,
        /// Disable required-response validation (debugging aid).
        #[arg(long)]
        optional_responses: bool,
    },
    /// Check a contexts table and exit.
    Validate {
        /// Contexts table (TOML).
        #[arg(long)]
        table: PathBuf,
    },
}

fn main() {
    if let Err(err) = run() {
        eprintln!("{:#}", err);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    session::logging::init();
    let cli = Cli::parse();
    match cli.command {
        Command::Run {
            table,
            out,
            config,
            seed,
            contexts,
            optional_responses,
        } => cmd_run(table, out, config, seed, contexts, optional_responses),
        Command::Validate { table } => cmd_validate(table),
    }
}

fn cmd_run(
    table: PathBuf,
    out: PathBuf,
    config: Option<PathBuf>,
    seed: Option<u64>,
    contexts: Option<usize>,
    optional_responses: bool,
) -> Result<()> {
    let mut cfg = match &config {
        Some(path) => load_config(path)?,
        None => SessionConfig::default(),
    };
    if let Some(seed) = seed {
        cfg.seed = Some(seed);
    }
    if let Some(contexts) = contexts {
        cfg.contexts_shown = contexts;
    }
    if optional_responses {
        cfg.require_responses = false;
    }
    cfg.validate()?;

    let pool = table::load_table(&table)?;
    let plan = plan::default_plan(cfg.require_responses);

    let session_id = results::new_session_id();
    let dir = results::prepare_dir(&out, &session_id)?;
    let mut sink = JsonlSink::create(&dir)?;
    let mut frontend = ConsoleFrontEnd::stdio();
    let mut rng = match cfg.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let started_at = Utc::now();
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .context("build tokio runtime")?;
    let outcome = runtime.block_on(run_session(
        &cfg,
        &pool,
        &plan,
        &mut frontend,
        &mut sink,
        &mut rng,
    ));

    // Meta is written whatever the outcome; partial step data is already on
    // disk via the sink.
    results::write_meta(
        &dir,
        &MetaInput {
            session_id: &session_id,
            table_path: &table,
            seed: cfg.seed,
            started_at,
            finished_at: Utc::now(),
            error: outcome.as_ref().err().map(|err| format!("{err:#}")),
        },
    )?;
    let session = outcome?;

    println!(
        "session {session_id} complete: {} steps, results in {}",
        session.steps.len(),
        dir.display()
    );
    Ok(())
}

fn cmd_validate(table: PathBuf) -> Result<()> {
    let contexts = table::load_table(&table)?;
    println!("{} ok: {} contexts", table.display(), contexts.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_run_with_overrides() {
        let cli = Cli::parse_from([
            "study",
            "run",
            "--table",
            "contexts.toml",
            "--seed",
            "7",
            "--contexts",
            "3",
            "--optional-responses",
        ]);
        match cli.command {
            Command::Run {
                table,
                seed,
                contexts,
                optional_responses,
                out,
                config,
            } => {
                assert_eq!(table, PathBuf::from("contexts.toml"));
                assert_eq!(seed, Some(7));
                assert_eq!(contexts, Some(3));
                assert!(optional_responses);
                assert_eq!(out, PathBuf::from("results"));
                assert_eq!(config, None);
            }
            Command::Validate { .. } => panic!("expected run"),
        }
    }

    #[test]
    fn parse_validate() {
        let cli = Cli::parse_from(["study", "validate", "--table", "contexts.toml"]);
        assert!(matches!(cli.command, Command::Validate { .. }));
    }

    /// Full console session: plan steps, one trial context, file capture.
    #[test]
    fn console_session_end_to_end() {
        use std::io::Cursor;

        use session::core::timeline::StepOrder;
        use session::record::StepKind;
        use session::test_support::context_pool;

        let cfg = SessionConfig {
            contexts_shown: 1,
            require_responses: true,
            seed: Some(1),
            forced_order: Some(StepOrder::ForceFirst),
        };
        let pool = context_pool(3);
        let plan = plan::default_plan(cfg.require_responses);

        let input = concat!(
            "\n",                                            // consent
            "34\nRight\nEnglish\nBritish\nUK\nFemale\nPhD\n", // demographics
            "2\n",                                           // commitment
            "\n",                                            // instructions
            "\n",                                            // scenario
            "40\n",                                          // force slider
            "1\n",                                           // enter an action
            "Call for help\n",                               // entry
            "2\n",                                           // stop
            "10\n20\n30\n",                                  // response rating
            "50\n50\n50\n",                                  // actual rating
            "\n",                                            // debrief
        );
        let mut frontend =
            console::ConsoleFrontEnd::new(Cursor::new(input.as_bytes().to_vec()), Vec::new());

        let temp = tempfile::tempdir().expect("tempdir");
        let mut sink = JsonlSink::create(temp.path()).expect("sink");
        let mut rng = StdRng::seed_from_u64(1);

        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .expect("runtime");
        let session = runtime
            .block_on(run_session(
                &cfg,
                &pool,
                &plan,
                &mut frontend,
                &mut sink,
                &mut rng,
            ))
            .expect("session");

        assert_eq!(session.steps.first().expect("first").kind, StepKind::Plan);
        assert_eq!(
            session.steps.last().expect("last").name.as_deref(),
            Some("debrief")
        );
        assert!(temp.path().join("steps.jsonl").exists());
        assert!(temp.path().join("session.json").exists());
    }
}
