//! Feedback item model
//!
//! A feedback item is one finding produced by a lint/build step: a file, a
//! line, a message and a severity. Items arrive as a JSON array (the output
//! of whatever tool ran before us) and are immutable from here on.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Notice,
    Warning,
    Failure,
}

impl Severity {
    /// Glyph used when rendering an item into markdown.
    pub fn glyph(&self) -> &'static str {
        match self {
            Severity::Notice => "📝",
            Severity::Warning => "⚠️",
            Severity::Failure => "❌",
        }
    }

    /// GitHub check-run annotation level.
    pub fn annotation_level(&self) -> &'static str {
        match self {
            Severity::Notice => "notice",
            Severity::Warning => "warning",
            Severity::Failure => "failure",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackItem {
    /// Path in the new/current tree, repo-relative.
    pub path: String,
    /// 1-based line in the new file.
    pub line: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_line: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<u64>,
    pub severity: Severity,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Sticky items are struck through on cleanup instead of deleted, so the
    /// record of the finding survives its resolution.
    #[serde(default)]
    pub sticky: bool,
}

impl FeedbackItem {
    /// Identity for duplicate detection across runs.
    ///
    /// Deliberately excludes severity and title: re-running with the same
    /// finding at a different severity is still the same finding.
    pub fn dedup_key(&self) -> (String, u64, String) {
        (self.path.clone(), self.line, self.message.clone())
    }
}

/// Drop caller-supplied duplicates, keeping the first occurrence of each
/// identity (so the first occurrence's severity and title win).
pub fn dedup_items(items: &[FeedbackItem]) -> Vec<FeedbackItem> {
    let mut seen = HashSet::new();
    items
        .iter()
        .filter(|item| seen.insert(item.dedup_key()))
        .cloned()
        .collect()
}

/// Read a JSON array of feedback items from disk.
pub fn load_items(path: &Path) -> Result<Vec<FeedbackItem>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read feedback file {}", path.display()))?;
    let items: Vec<FeedbackItem> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse feedback file {}", path.display()))?;
    Ok(items)
}
