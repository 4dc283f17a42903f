//! The data sink: write-only destination for step and session records.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::record::{SessionRecord, StepRecord};

/// Receives each completed step's record and the full session record.
///
/// Per-step delivery is best-effort: the engine logs a failure and continues,
/// because blocking the participant on a storage failure is explicitly
/// avoided. The session-completion call is awaited and its failure propagated,
/// so total loss at the very end is visible to the caller.
#[async_trait]
pub trait DataSink {
    async fn on_step_complete(&mut self, record: &StepRecord) -> Result<()>;
    async fn on_session_complete(&mut self, record: &SessionRecord) -> Result<()>;
}

/// In-memory sink, useful as a reference implementation and in tests.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub steps: Vec<StepRecord>,
    pub session: Option<SessionRecord>,
}

#[async_trait]
impl DataSink for MemorySink {
    async fn on_step_complete(&mut self, record: &StepRecord) -> Result<()> {
        self.steps.push(record.clone());
        Ok(())
    }

    async fn on_session_complete(&mut self, record: &SessionRecord) -> Result<()> {
        self.session = Some(record.clone());
        Ok(())
    }
}

/// File-backed sink: appends step records to `steps.jsonl` as they complete
/// and writes the full session record to `session.json` at the end.
///
/// Records with `persist = true` are flushed to the OS immediately; the rest
/// ride along with buffering. Partial data therefore survives an aborted
/// session up to the last persisted record.
#[derive(Debug)]
pub struct JsonlSink {
    steps: File,
    session_path: PathBuf,
}

impl JsonlSink {
    /// Create `steps.jsonl` (truncating) inside `dir`; `session.json` is
    /// written on session completion.
    pub fn create(dir: &Path) -> Result<Self> {
        let steps_path = dir.join("steps.jsonl");
        let steps = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&steps_path)
            .with_context(|| format!("create {}", steps_path.display()))?;
        Ok(Self {
            steps,
            session_path: dir.join("session.json"),
        })
    }
}

#[async_trait]
impl DataSink for JsonlSink {
    async fn on_step_complete(&mut self, record: &StepRecord) -> Result<()> {
        let mut line = serde_json::to_string(record).context("serialize step record")?;
        line.push('\n');
        self.steps
            .write_all(line.as_bytes())
            .context("append step record")?;
        if record.persist {
            self.steps.sync_data().context("flush step record")?;
        }
        Ok(())
    }

    async fn on_session_complete(&mut self, record: &SessionRecord) -> Result<()> {
        self.steps.sync_data().context("flush steps.jsonl")?;
        let mut payload =
            serde_json::to_string_pretty(record).context("serialize session record")?;
        payload.push('\n');
        std::fs::write(&self.session_path, payload)
            .with_context(|| format!("write {}", self.session_path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Payload, RecordTags, StepKind, StepRecord};

    fn record(kind: StepKind, persist: bool) -> StepRecord {
        StepRecord {
            kind,
            name: None,
            context_id: Some("ctx-1".to_string()),
            presentation_index: Some(1),
            payload: Payload::Acknowledged,
            tags: RecordTags::default(),
            persist,
            recorded_at: "2024-01-01T00:00:00+00:00".to_string(),
            elapsed_ms: 0,
        }
    }

    #[tokio::test]
    async fn jsonl_sink_appends_one_line_per_record() {
        let temp = tempfile::tempdir().expect("tempdir");
        let mut sink = JsonlSink::create(temp.path()).expect("create");
        sink.on_step_complete(&record(StepKind::Scenario, true))
            .await
            .expect("step");
        sink.on_step_complete(&record(StepKind::Force, false))
            .await
            .expect("step");

        let contents =
            std::fs::read_to_string(temp.path().join("steps.jsonl")).expect("read jsonl");
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        let first: StepRecord = serde_json::from_str(lines[0]).expect("parse");
        assert_eq!(first.kind, StepKind::Scenario);
    }

    #[tokio::test]
    async fn jsonl_sink_writes_session_json_at_completion() {
        let temp = tempfile::tempdir().expect("tempdir");
        let mut sink = JsonlSink::create(temp.path()).expect("create");
        let session = SessionRecord {
            order: crate::core::timeline::StepOrder::ForceFirst,
            started_at: "2024-01-01T00:00:00+00:00".to_string(),
            finished_at: "2024-01-01T00:10:00+00:00".to_string(),
            sampled_context_ids: vec!["ctx-1".to_string()],
            config: crate::config::SessionConfig::default(),
            steps: vec![record(StepKind::Scenario, true)],
        };
        sink.on_session_complete(&session).await.expect("complete");

        let raw = std::fs::read_to_string(temp.path().join("session.json")).expect("read");
        let parsed: SessionRecord = serde_json::from_str(&raw).expect("parse");
        assert_eq!(parsed, session);
    }
}
