//! Summary comment channel
//!
//! Maintains exactly one issue comment per identifier on the PR
//! conversation. The whole rendered body is fingerprinted and the
//! fingerprint stored in the marker, so an unchanged run touches nothing
//! and a changed run replaces the body wholesale (no section merging on
//! this channel).

use crate::engine::{self, CleanupMode, Operation, Plan, TrackedComment};
use crate::feedback::{FeedbackItem, Severity};
use crate::github::GithubClient;
use crate::marker::{self, STICKY_SENTINEL};
use anyhow::Result;

pub struct SummaryChannel<'a> {
    client: &'a GithubClient,
    pr: u64,
    identifier: String,
}

impl<'a> SummaryChannel<'a> {
    pub fn new(client: &'a GithubClient, pr: u64, identifier: &str) -> Self {
        Self {
            client,
            pr,
            identifier: identifier.to_string(),
        }
    }

    /// Comments on the PR conversation that carry our marker for this
    /// identifier. Anything without a parseable marker is foreign and is
    /// never part of the snapshot.
    async fn list_tracked(&self) -> Result<Vec<TrackedComment>> {
        let comments = self.client.list_issue_comments(self.pr).await?;
        Ok(comments
            .into_iter()
            .filter(|c| marker::contains(&self.identifier, &c.body))
            .map(|c| TrackedComment {
                id: c.id,
                body: c.body,
            })
            .collect())
    }

    pub async fn report(&self, items: &[FeedbackItem]) -> Result<Plan> {
        let existing = self.list_tracked().await?;
        let body = render_summary(&self.identifier, items);
        let plan = engine::reconcile_summary(&existing, &self.identifier, &body);
        self.execute(&plan).await?;
        Ok(plan)
    }

    pub async fn cleanup(&self, mode: CleanupMode) -> Result<Plan> {
        let existing = self.list_tracked().await?;
        let plan = engine::cleanup(&existing, mode, &self.identifier);
        self.execute(&plan).await?;
        Ok(plan)
    }

    /// Execute operations sequentially; the first transport error aborts the
    /// remainder of the plan. Nothing is rolled back - a rerun reconverges.
    async fn execute(&self, plan: &Plan) -> Result<()> {
        for op in &plan.ops {
            match op {
                Operation::Create { body } => {
                    self.client.create_issue_comment(self.pr, body).await?;
                }
                Operation::UpdateMerge { id, body } | Operation::Strikethrough { id, body } => {
                    self.client.update_issue_comment(*id, body).await?;
                }
                Operation::Delete { id } => {
                    self.client.delete_issue_comment(*id).await?;
                }
                Operation::Skip { reason } => {
                    eprintln!("  summary: skipped ({})", reason);
                }
            }
        }
        Ok(())
    }
}

/// Render the aggregate summary body for a set of items, grouped by file.
pub fn render_summary(identifier: &str, items: &[FeedbackItem]) -> String {
    let failures = items.iter().filter(|i| i.severity == Severity::Failure).count();
    let warnings = items.iter().filter(|i| i.severity == Severity::Warning).count();
    let notices = items.iter().filter(|i| i.severity == Severity::Notice).count();

    let mut body = format!("## {} results\n\n", identifier);

    if items.is_empty() {
        body.push_str("No findings. ✅\n");
        return body;
    }

    body.push_str(&format!(
        "{} failure(s), {} warning(s), {} notice(s)\n",
        failures, warnings, notices
    ));

    // Group by file, preserving first-seen file order.
    let mut files: Vec<&str> = Vec::new();
    for item in items {
        if !files.contains(&item.path.as_str()) {
            files.push(&item.path);
        }
    }

    for file in files {
        body.push_str(&format!("\n### `{}`\n\n", file));
        for item in items.iter().filter(|i| i.path == file) {
            body.push_str(&format!(
                "- {} `{}:{}` {}\n",
                item.severity.glyph(),
                item.path,
                item.line,
                item.message
            ));
        }
    }

    if items.iter().any(|i| i.sticky) {
        body.push('\n');
        body.push_str(STICKY_SENTINEL);
        body.push('\n');
    }

    body
}
