//! Check-run annotation channel
//!
//! Posts findings as inline annotations on a check run. The API caps
//! annotations at 50 per update, so items go out in batches: every batch
//! but the last is an intermediate in-progress update, and the final one
//! completes the run with a conclusion derived from the posted severities.
//!
//! There is no persistent per-item tracking key on this channel - each run
//! replaces the previous run's check wholesale - and annotations cannot be
//! deleted through the API, so `cleanup()` is a documented no-op.

use crate::feedback::{FeedbackItem, Severity};
use crate::github::{Annotation, CheckOutput, GithubClient};
use crate::router::{self, ANNOTATION_BATCH_LIMIT};
use crate::util::truncate;
use anyhow::Result;

/// Annotation titles render in a narrow column; long messages stay in the
/// message field.
const TITLE_MAX_CHARS: usize = 255;

pub struct ChecksChannel<'a> {
    client: &'a GithubClient,
    /// Check run name; doubles as the channel's scope identifier.
    name: String,
    head_sha: String,
}

impl<'a> ChecksChannel<'a> {
    pub fn new(client: &'a GithubClient, name: &str, head_sha: &str) -> Self {
        Self {
            client,
            name: name.to_string(),
            head_sha: head_sha.to_string(),
        }
    }

    /// Post all items as annotations in 50-item batches and complete the
    /// run. Returns the derived conclusion.
    pub async fn report(&self, items: &[FeedbackItem]) -> Result<&'static str> {
        let check = self.client.create_check_run(&self.name, &self.head_sha).await?;
        let conclusion = conclusion_for(items);

        let batches = router::chunk(items, ANNOTATION_BATCH_LIMIT);
        let last = batches.len() - 1;

        for (index, batch) in batches.iter().enumerate() {
            let output = CheckOutput {
                title: self.name.clone(),
                summary: summary_line(items),
                annotations: batch.iter().map(to_annotation).collect(),
            };
            let terminal = index == last;
            self.client
                .update_check_run(check.id, &output, terminal.then_some(conclusion))
                .await?;
        }

        Ok(conclusion)
    }

    /// Annotations cannot be removed once posted; the next `report()`
    /// supersedes them. Kept so every channel exposes the same surface.
    pub fn cleanup(&self) {
        eprintln!("  checks: cleanup is a no-op (annotations cannot be deleted)");
    }
}

/// `failure` if any failure-severity item was posted, `neutral` when only
/// warnings/notices were, `success` for a clean run.
pub fn conclusion_for(items: &[FeedbackItem]) -> &'static str {
    if items.iter().any(|i| i.severity == Severity::Failure) {
        "failure"
    } else if items.is_empty() {
        "success"
    } else {
        "neutral"
    }
}

fn summary_line(items: &[FeedbackItem]) -> String {
    let failures = items.iter().filter(|i| i.severity == Severity::Failure).count();
    let warnings = items.iter().filter(|i| i.severity == Severity::Warning).count();
    let notices = items.iter().filter(|i| i.severity == Severity::Notice).count();
    format!(
        "{} failure(s), {} warning(s), {} notice(s)",
        failures, warnings, notices
    )
}

fn to_annotation(item: &FeedbackItem) -> Annotation {
    let end_line = item.end_line.unwrap_or(item.line);
    // The API rejects columns on multi-line annotations.
    let same_line = end_line == item.line;
    Annotation {
        path: item.path.clone(),
        start_line: item.line,
        end_line,
        start_column: item.column.filter(|_| same_line),
        end_column: item.column.filter(|_| same_line),
        annotation_level: item.severity.annotation_level().to_string(),
        message: item.message.clone(),
        title: item.title.as_deref().map(|t| truncate(t, TITLE_MAX_CHARS)),
    }
}
