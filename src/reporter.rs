//! Report orchestration
//!
//! Wires the channels together for one `report()` or `cleanup()` pass:
//! pick the primary channel, partition items against the diff, hand the
//! unplaceable remainder to the configured fallback. Every item flows
//! through exactly one channel per pass.

use crate::channels::checks::ChecksChannel;
use crate::channels::review::ReviewChannel;
use crate::channels::summary::SummaryChannel;
use crate::config::{Channel, Config};
use crate::feedback::{self, FeedbackItem};
use crate::github::GithubClient;
use crate::router::{self, OverflowPolicy};
use anyhow::Result;

pub struct Reporter<'a> {
    client: &'a GithubClient,
    config: &'a Config,
    pr: u64,
}

impl<'a> Reporter<'a> {
    pub fn new(client: &'a GithubClient, config: &'a Config, pr: u64) -> Self {
        Self { client, config, pr }
    }

    /// Post one run's feedback. Items that fit the primary channel go there;
    /// the rest follow the overflow policy.
    pub async fn report(&self, items: &[FeedbackItem]) -> Result<()> {
        // Tools sometimes emit the same finding twice; keep the first.
        let items = feedback::dedup_items(items);
        let items = items.as_slice();

        match self.config.channel {
            Channel::Summary => {
                let channel =
                    SummaryChannel::new(self.client, self.pr, &self.config.identifier);
                let plan = channel.report(items).await?;
                eprintln!("  summary: {} remote call(s)", plan.remote_ops());
            }
            Channel::Checks => {
                let head_sha = self.head_sha().await?;
                let channel =
                    ChecksChannel::new(self.client, &self.config.identifier, &head_sha);
                let conclusion = channel.report(items).await?;
                eprintln!("  checks: completed with conclusion '{}'", conclusion);
            }
            Channel::Review => {
                let pull = self.client.get_pull_request(self.pr).await?;
                let files = self.client.list_pr_files(self.pr).await?;

                let routed = ReviewChannel::partition(items, &files);

                // The batch limit caps what the native channel takes in one
                // pass; the remainder joins the out-of-range set.
                let (native, over_limit) =
                    router::split_at_limit(&routed.in_range, self.config.batch_limit);

                let channel = ReviewChannel::new(
                    self.client,
                    self.pr,
                    &self.config.identifier,
                    &pull.head.sha,
                );
                let plan = channel.report(native).await?;
                eprintln!(
                    "  review: {} in range, {} remote call(s)",
                    native.len(),
                    plan.remote_ops()
                );

                let mut fallback: Vec<FeedbackItem> = routed.out_of_range.clone();
                fallback.extend(over_limit.iter().map(|p| p.item.clone()));
                self.route_overflow(&fallback, &pull.head.sha).await?;
            }
        }
        Ok(())
    }

    /// Send items the primary channel could not take to the fallback
    /// channel. The overflow set is tracked under a derived identifier so
    /// its keys can never collide with the primary channel's.
    async fn route_overflow(&self, items: &[FeedbackItem], head_sha: &str) -> Result<()> {
        if items.is_empty() {
            return Ok(());
        }

        let derived = router::overflow_identifier(&self.config.identifier);
        match self.config.overflow {
            OverflowPolicy::Dismiss => {
                eprintln!("  overflow: dismissed {} item(s)", items.len());
            }
            OverflowPolicy::SummaryComment => {
                let channel = SummaryChannel::new(self.client, self.pr, &derived);
                let plan = channel.report(items).await?;
                eprintln!(
                    "  overflow: {} item(s) -> summary '{}', {} remote call(s)",
                    items.len(),
                    derived,
                    plan.remote_ops()
                );
            }
            OverflowPolicy::InlineAnnotations => {
                let channel = ChecksChannel::new(self.client, &derived, head_sha);
                channel.report(items).await?;
                eprintln!("  overflow: {} item(s) -> check '{}'", items.len(), derived);
            }
        }
        Ok(())
    }

    /// Remove (or strike through) everything previous runs posted under this
    /// identifier, including the derived overflow comment.
    pub async fn cleanup(&self) -> Result<()> {
        let mode = self.config.cleanup_mode;

        match self.config.channel {
            Channel::Summary => {
                let channel =
                    SummaryChannel::new(self.client, self.pr, &self.config.identifier);
                let plan = channel.cleanup(mode).await?;
                eprintln!("  summary cleanup: {} remote call(s)", plan.remote_ops());
            }
            Channel::Review => {
                let channel = ReviewChannel::new(
                    self.client,
                    self.pr,
                    &self.config.identifier,
                    "", // commit id is not needed for update/delete
                );
                let plan = channel.cleanup(mode).await?;
                eprintln!("  review cleanup: {} remote call(s)", plan.remote_ops());
            }
            Channel::Checks => {
                let channel = ChecksChannel::new(self.client, &self.config.identifier, "");
                channel.cleanup();
            }
        }

        if self.config.overflow == OverflowPolicy::SummaryComment {
            let derived = router::overflow_identifier(&self.config.identifier);
            let channel = SummaryChannel::new(self.client, self.pr, &derived);
            let plan = channel.cleanup(mode).await?;
            eprintln!(
                "  overflow cleanup ('{}'): {} remote call(s)",
                derived,
                plan.remote_ops()
            );
        }

        Ok(())
    }

    async fn head_sha(&self) -> Result<String> {
        Ok(self.client.get_pull_request(self.pr).await?.head.sha)
    }
}
