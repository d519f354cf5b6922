//! Line review comment channel
//!
//! One review comment per (path, line), tracked across runs via the
//! embedded marker. New findings at an already-commented location merge
//! into the existing comment behind a section separator instead of piling
//! up duplicates.

use crate::engine::{self, CleanupMode, KeyedPlan, Operation, Plan, TrackedComment};
use crate::feedback::FeedbackItem;
use crate::github::GithubClient;
use crate::marker;
use crate::router::{self, PlacedItem, Routed};
use anyhow::Result;
use std::collections::BTreeMap;

/// Tracking key on this channel: resolved path + new-file line.
pub type LineKey = (String, u64);

pub struct ReviewChannel<'a> {
    client: &'a GithubClient,
    pr: u64,
    identifier: String,
    /// Head commit the new comments attach to.
    commit_id: String,
}

impl<'a> ReviewChannel<'a> {
    pub fn new(client: &'a GithubClient, pr: u64, identifier: &str, commit_id: &str) -> Self {
        Self {
            client,
            pr,
            identifier: identifier.to_string(),
            commit_id: commit_id.to_string(),
        }
    }

    /// Existing review comments owned by this identifier, keyed by location.
    /// Comments whose line metadata the API no longer reports (outdated
    /// against the current head) carry no usable key and are left for
    /// cleanup.
    async fn list_tracked(&self) -> Result<Vec<(LineKey, TrackedComment)>> {
        let comments = self.client.list_review_comments(self.pr).await?;
        Ok(comments
            .into_iter()
            .filter(|c| marker::contains(&self.identifier, &c.body))
            .filter_map(|c| {
                let line = c.line?;
                Some((
                    (c.path.clone(), line),
                    TrackedComment {
                        id: c.id,
                        body: c.body,
                    },
                ))
            })
            .collect())
    }

    /// Reconcile placed items against existing comments and execute the
    /// plan. The caller has already partitioned out-of-range items away via
    /// the router.
    pub async fn report(&self, placed: &[PlacedItem]) -> Result<KeyedPlan<LineKey>> {
        let existing = self.list_tracked().await?;

        let desired: Vec<(LineKey, String)> = placed
            .iter()
            .map(|p| {
                (
                    (p.path.clone(), p.item.line),
                    super::render_item(&p.item),
                )
            })
            .collect();

        let plan = engine::reconcile_keyed(&existing, &desired, &self.identifier);

        // Creates need a diff position; index the placed items by key.
        let mut positions: BTreeMap<LineKey, u64> = BTreeMap::new();
        for p in placed {
            // Last wins on key collision, matching path resolution.
            positions.insert((p.path.clone(), p.item.line), p.position);
        }

        for (key, op) in &plan.ops {
            match op {
                Operation::Create { body } => {
                    let Some(position) = positions.get(key) else {
                        // Cannot happen: every desired key came from a placed
                        // item. Guard anyway rather than panic.
                        eprintln!("  review: no position for {}:{}, skipping", key.0, key.1);
                        continue;
                    };
                    self.client
                        .create_review_comment(self.pr, &self.commit_id, &key.0, *position, body)
                        .await?;
                }
                Operation::UpdateMerge { id, body } | Operation::Strikethrough { id, body } => {
                    self.client.update_review_comment(*id, body).await?;
                }
                Operation::Delete { id } => {
                    self.client.delete_review_comment(*id).await?;
                }
                Operation::Skip { reason } => {
                    eprintln!("  review: {}:{} skipped ({})", key.0, key.1, reason);
                }
            }
        }

        Ok(plan)
    }

    /// Remove or strike through every tracked review comment, including
    /// outdated ones that no longer map to a line.
    pub async fn cleanup(&self, mode: CleanupMode) -> Result<Plan> {
        let comments = self.client.list_review_comments(self.pr).await?;
        let tracked: Vec<TrackedComment> = comments
            .into_iter()
            .filter(|c| marker::contains(&self.identifier, &c.body))
            .map(|c| TrackedComment {
                id: c.id,
                body: c.body,
            })
            .collect();

        let plan = engine::cleanup(&tracked, mode, &self.identifier);
        for op in &plan.ops {
            match op {
                Operation::Delete { id } => {
                    self.client.delete_review_comment(*id).await?;
                }
                Operation::Strikethrough { id, body } | Operation::UpdateMerge { id, body } => {
                    self.client.update_review_comment(*id, body).await?;
                }
                Operation::Create { .. } | Operation::Skip { .. } => {}
            }
        }
        Ok(plan)
    }

    /// Split items against the current diff; convenience wrapper so the
    /// reporter does not reach into `router` separately.
    pub fn partition(
        items: &[FeedbackItem],
        files: &[crate::diffmap::PrFile],
    ) -> Routed {
        router::partition(items, files)
    }
}
