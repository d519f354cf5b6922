//! Overflow and out-of-range routing
//!
//! Not every feedback item fits its primary channel: a line may not be part
//! of the PR diff, or a batch may exceed the hard per-call annotation limit.
//! This module partitions an item set into placeable and unplaceable halves
//! and decides where the unplaceable half goes, so that every item flows
//! through exactly one channel per report - never two, and never silently
//! zero unless dismissal was asked for.

use crate::diffmap::{self, PrFile};
use crate::feedback::FeedbackItem;
use serde::{Deserialize, Serialize};

/// Where items that cannot be placed in their native channel go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// Drop them; no remote effect.
    Dismiss,
    /// Reconcile them into a summary comment under a derived identifier.
    #[default]
    SummaryComment,
    /// Send them to the check-run annotation channel, which has no
    /// line-in-diff constraint.
    InlineAnnotations,
}

/// GitHub caps check-run annotations at 50 per update call.
pub const ANNOTATION_BATCH_LIMIT: usize = 50;

/// An item successfully mapped into the diff.
#[derive(Debug, Clone)]
pub struct PlacedItem {
    pub item: FeedbackItem,
    /// Path after rename resolution; may differ from `item.path`.
    pub path: String,
    /// Diff-relative position for the review-comment protocol.
    pub position: u64,
}

/// Result of splitting an item set against the PR diff.
#[derive(Debug, Clone, Default)]
pub struct Routed {
    pub in_range: Vec<PlacedItem>,
    pub out_of_range: Vec<FeedbackItem>,
}

/// Split items into those addressable in the diff and those not.
///
/// An item is in range when its path resolves to a file in the listing
/// (exact, renamed, or basename match) and its line maps to a diff position.
/// Missing patches (binary, too large) and unresolvable paths land in
/// `out_of_range` - routing there is the handled path, not an error.
pub fn partition(items: &[FeedbackItem], files: &[PrFile]) -> Routed {
    let mut routed = Routed::default();

    for item in items {
        let placed = diffmap::resolve_file(&item.path, files).and_then(|file| {
            let patch = file.patch.as_deref()?;
            let position = diffmap::position_for_line(patch, item.line)?;
            Some(PlacedItem {
                item: item.clone(),
                path: file.filename.clone(),
                position,
            })
        });

        match placed {
            Some(p) => routed.in_range.push(p),
            None => routed.out_of_range.push(item.clone()),
        }
    }

    routed
}

/// Split a slice into fixed-size batches. Every batch but the last is an
/// intermediate update; only the last carries the terminal state transition.
pub fn chunk<T>(items: &[T], batch_limit: usize) -> Vec<&[T]> {
    if items.is_empty() {
        return vec![&[] as &[T]];
    }
    items.chunks(batch_limit.max(1)).collect()
}

/// Cap what the native channel takes in one pass. Items beyond the limit
/// are overflow and follow the fallback policy.
pub fn split_at_limit(placed: &[PlacedItem], limit: usize) -> (&[PlacedItem], &[PlacedItem]) {
    let limit = limit.max(1);
    if placed.len() > limit {
        placed.split_at(limit)
    } else {
        (placed, &[])
    }
}

/// Identifier the overflow set is tracked under. Derived so it can never
/// collide with the primary channel's tracking keys.
pub fn overflow_identifier(identifier: &str) -> String {
    format!("{}-overflow", identifier)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feedback::Severity;

    fn item(path: &str, line: u64) -> FeedbackItem {
        FeedbackItem {
            path: path.to_string(),
            line,
            end_line: None,
            column: None,
            severity: Severity::Warning,
            message: format!("finding at {}:{}", path, line),
            title: None,
            sticky: false,
        }
    }

    fn file(name: &str, patch: Option<&str>) -> PrFile {
        PrFile {
            filename: name.to_string(),
            previous_filename: None,
            status: "modified".to_string(),
            patch: patch.map(|p| p.to_string()),
        }
    }

    const PATCH: &str = "@@ -1,2 +1,3 @@\n fn main() {\n+    todo!();\n }";

    #[test]
    fn test_partition_in_and_out_of_range() {
        let files = vec![file("src/main.rs", Some(PATCH))];
        let items = vec![
            item("src/main.rs", 2),   // the added line
            item("src/main.rs", 40),  // beyond the hunk
            item("src/other.rs", 1),  // not in the listing
        ];
        let routed = partition(&items, &files);
        assert_eq!(routed.in_range.len(), 1);
        assert_eq!(routed.out_of_range.len(), 2);
        assert_eq!(routed.in_range[0].position, 3);
        assert_eq!(routed.in_range[0].path, "src/main.rs");
    }

    #[test]
    fn test_partition_binary_file_routes_out_of_range() {
        let files = vec![file("logo.png", None)];
        let routed = partition(&[item("logo.png", 1)], &files);
        assert!(routed.in_range.is_empty());
        assert_eq!(routed.out_of_range.len(), 1);
    }

    #[test]
    fn test_partition_resolves_renames() {
        let mut renamed = file("src/new_name.rs", Some(PATCH));
        renamed.previous_filename = Some("src/old_name.rs".to_string());
        let routed = partition(&[item("src/old_name.rs", 2)], &[renamed]);
        assert_eq!(routed.in_range.len(), 1);
        assert_eq!(routed.in_range[0].path, "src/new_name.rs");
    }

    #[test]
    fn test_partition_accounts_for_every_item() {
        let files = vec![file("src/main.rs", Some(PATCH))];
        let items: Vec<FeedbackItem> = (1..=10).map(|i| item("src/main.rs", i)).collect();
        let routed = partition(&items, &files);
        assert_eq!(routed.in_range.len() + routed.out_of_range.len(), items.len());
    }

    #[test]
    fn test_chunk_150_items_three_batches() {
        let items: Vec<FeedbackItem> = (1..=150).map(|i| item("src/lib.rs", i)).collect();
        let batches = chunk(&items, ANNOTATION_BATCH_LIMIT);
        assert_eq!(batches.len(), 3);
        assert!(batches.iter().all(|b| b.len() == 50));
    }

    #[test]
    fn test_chunk_uneven_remainder() {
        let items: Vec<FeedbackItem> = (1..=120).map(|i| item("src/lib.rs", i)).collect();
        let batches = chunk(&items, 50);
        assert_eq!(batches.len(), 3);
        assert_eq!(batches[2].len(), 20);
    }

    #[test]
    fn test_chunk_empty_yields_single_empty_batch() {
        // An empty run still needs one terminal update to complete the check.
        let items: Vec<FeedbackItem> = Vec::new();
        let batches = chunk(&items, 50);
        assert_eq!(batches.len(), 1);
        assert!(batches[0].is_empty());
    }

    #[test]
    fn test_split_at_limit_routes_tail_to_overflow() {
        let placed: Vec<PlacedItem> = (1..=150)
            .map(|i| PlacedItem {
                item: item("src/lib.rs", i),
                path: "src/lib.rs".to_string(),
                position: i,
            })
            .collect();
        let (native, overflow) = split_at_limit(&placed, 50);
        assert_eq!(native.len(), 50);
        assert_eq!(overflow.len(), 100);
        assert_eq!(overflow[0].item.line, 51);
    }

    #[test]
    fn test_split_at_limit_under_limit() {
        let placed: Vec<PlacedItem> = (1..=10)
            .map(|i| PlacedItem {
                item: item("src/lib.rs", i),
                path: "src/lib.rs".to_string(),
                position: i,
            })
            .collect();
        let (native, overflow) = split_at_limit(&placed, 50);
        assert_eq!(native.len(), 10);
        assert!(overflow.is_empty());
    }

    #[test]
    fn test_overflow_identifier_distinct_from_primary() {
        let derived = overflow_identifier("swiftlint");
        assert_eq!(derived, "swiftlint-overflow");
        assert_ne!(derived, "swiftlint");
    }

    #[test]
    fn test_overflow_policy_config_names() {
        let p: OverflowPolicy = serde_json::from_str("\"summary_comment\"").unwrap();
        assert_eq!(p, OverflowPolicy::SummaryComment);
        let p: OverflowPolicy = serde_json::from_str("\"dismiss\"").unwrap();
        assert_eq!(p, OverflowPolicy::Dismiss);
        let p: OverflowPolicy = serde_json::from_str("\"inline_annotations\"").unwrap();
        assert_eq!(p, OverflowPolicy::InlineAnnotations);
    }
}
