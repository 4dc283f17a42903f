//! Adaptive trial-sequencing engine for single-participant behavioral sessions.
//!
//! This crate drives one participant through a randomized sequence of scenario
//! contexts, collecting free-text action generations and numeric ratings. The
//! architecture enforces a strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (sampling, step ordering,
//!   distractor construction, per-context state). No I/O, fully testable in
//!   isolation given an injected RNG.
//! - **[`io`]**: The two external seams — the front end a participant answers
//!   through and the data sink that receives records.
//!
//! Orchestration modules ([`run`], [`step`], [`generation`], [`rating`])
//! coordinate core logic with the seams to execute a full session.

pub mod config;
pub mod core;
pub mod generation;
pub mod io;
pub mod logging;
pub mod rating;
pub mod record;
pub mod run;
pub mod step;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
