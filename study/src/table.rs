//! Contexts table loading from TOML.
//!
//! The table is the read-only source of truth for scenarios. Validation is
//! fatal before any step executes; the distractor set of the attention gate
//! relies on a context's six action texts being pairwise distinct.

use std::fs;
use std::path::Path;

use anyhow::{Context as _, Result, bail};
use serde::Deserialize;

use session::core::context::Context;

#[derive(Debug, Deserialize)]
struct TableFile {
    #[serde(default)]
    contexts: Vec<ContextRow>,
}

#[derive(Debug, Deserialize)]
struct ContextRow {
    context_id: String,
    text: String,
    agent: String,
    action_1: String,
    action_2: String,
    action_3: String,
    action_4: String,
    action_5: String,
    action_6: String,
}

impl ContextRow {
    fn actions(&self) -> [String; 6] {
        [
            self.action_1.clone(),
            self.action_2.clone(),
            self.action_3.clone(),
            self.action_4.clone(),
            self.action_5.clone(),
            self.action_6.clone(),
        ]
    }
}

/// Load and validate the contexts table.
pub fn load_table(path: &Path) -> Result<Vec<Context>> {
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let table: TableFile =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;

    let errors = validate_rows(&table.contexts);
    if !errors.is_empty() {
        bail!(
            "invalid contexts table {}:\n- {}",
            path.display(),
            errors.join("\n- ")
        );
    }

    Ok(table
        .contexts
        .iter()
        .map(|row| Context {
            id: row.context_id.clone(),
            text: row.text.clone(),
            agent: row.agent.clone(),
            actions: row.actions(),
        })
        .collect())
}

fn validate_rows(rows: &[ContextRow]) -> Vec<String> {
    let mut errors = Vec::new();
    if rows.is_empty() {
        errors.push("table contains no contexts".to_string());
    }

    let mut seen_ids = std::collections::HashSet::new();
    for row in rows {
        let id = row.context_id.trim();
        if id.is_empty() {
            errors.push("context with empty context_id".to_string());
            continue;
        }
        if !seen_ids.insert(id.to_string()) {
            errors.push(format!("duplicate context_id: {id}"));
        }
        if row.text.trim().is_empty() {
            errors.push(format!("{id}: empty text"));
        }
        if row.agent.trim().is_empty() {
            errors.push(format!("{id}: empty agent"));
        }
        let actions = row.actions();
        for (i, action) in actions.iter().enumerate() {
            if action.trim().is_empty() {
                errors.push(format!("{id}: action_{} is blank", i + 1));
            }
        }
        let mut unique: Vec<&str> = actions.iter().map(|a| a.trim()).collect();
        unique.sort_unstable();
        unique.dedup();
        if unique.len() != actions.len() {
            errors.push(format!("{id}: actions must be pairwise distinct"));
        }
    }
    errors
}
