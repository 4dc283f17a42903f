//! Results directory layout and run metadata.
//!
//! Each session writes `results/<session-id>/` containing `steps.jsonl`
//! (appended by the engine's sink as steps complete), `session.json` (the
//! full session record) and `meta.json` (written here, after the session
//! ends, whatever the outcome).

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use chrono::{DateTime, Utc};
use rand::Rng;
use rand::distributions::Alphanumeric;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;

/// Metadata for one session run, persisted to `meta.json`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct SessionMeta {
    pub session_id: String,
    pub table: String,
    /// SHA-256 hash of the contexts table for reproducibility tracking.
    pub table_hash: String,
    pub seed: Option<u64>,
    pub start_time: String,
    pub end_time: String,
    /// "completed" or "error".
    pub outcome: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// `session-<UTC timestamp>-<4 random alphanumerics>`.
///
/// Uses its own entropy so seeded replays still get fresh directories.
pub fn new_session_id() -> String {
    let stamp = Utc::now().format("%Y%m%d-%H%M%S");
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(4)
        .map(char::from)
        .collect();
    format!("session-{stamp}-{suffix}")
}

/// Create the per-session results directory.
pub fn prepare_dir(base: &Path, session_id: &str) -> Result<PathBuf> {
    let dir = base.join(session_id);
    fs::create_dir_all(&dir).with_context(|| format!("create results dir {}", dir.display()))?;
    Ok(dir)
}

/// Input for assembling [`SessionMeta`] after a run.
#[derive(Debug)]
pub struct MetaInput<'a> {
    pub session_id: &'a str,
    pub table_path: &'a Path,
    pub seed: Option<u64>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub error: Option<String>,
}

/// Write `meta.json` into the results directory.
pub fn write_meta(dir: &Path, input: &MetaInput<'_>) -> Result<()> {
    let table_hash = file_sha256(input.table_path).unwrap_or_default();
    let meta = SessionMeta {
        session_id: input.session_id.to_string(),
        table: input.table_path.display().to_string(),
        table_hash,
        seed: input.seed,
        start_time: input.started_at.to_rfc3339(),
        end_time: input.finished_at.to_rfc3339(),
        outcome: if input.error.is_none() {
            "completed".to_string()
        } else {
            "error".to_string()
        },
        error: input.error.clone(),
    };

    let path = dir.join("meta.json");
    let mut payload = serde_json::to_string_pretty(&meta).context("serialize meta")?;
    payload.push('\n');
    fs::write(&path, payload).with_context(|| format!("write {}", path.display()))?;
    debug!(path = %path.display(), "meta written");
    Ok(())
}

fn file_sha256(path: &Path) -> Result<String> {
    let contents = fs::read(path).with_context(|| format!("read {}", path.display()))?;
    let mut hasher = Sha256::new();
    hasher.update(contents);
    Ok(hex::encode(hasher.finalize()))
}
