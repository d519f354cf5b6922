//! Reconciliation engine
//!
//! The pure core of the tool: given the comments a channel already tracks
//! and the set of feedback bodies we want present, compute the minimal
//! operation plan that converges remote state to desired state. The engine
//! performs no I/O and holds no state across calls - every invocation works
//! from the snapshot it is handed, and all bookkeeping (which comment id an
//! update targets) comes back inside the plan.

use crate::marker;
use std::collections::BTreeMap;

/// Snapshot of one remote comment owned by this tool. Channel adapters
/// convert their wire types into this before calling the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedComment {
    pub id: u64,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// Post a new comment with this body (marker included).
    Create { body: String },
    /// Replace the body of an existing comment, merging new content in.
    UpdateMerge { id: u64, body: String },
    /// Nothing to do; kept in the plan so callers can log why.
    Skip { reason: String },
    /// Remove a comment permanently.
    Delete { id: u64 },
    /// Replace a sticky comment's body with its struck-through form.
    Strikethrough { id: u64, body: String },
}

/// Ordered list of operations for one reconciliation pass. Computed fresh on
/// every call, never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Plan {
    pub ops: Vec<Operation>,
}

impl Plan {
    /// Operations that would hit the remote store (everything but Skip).
    pub fn remote_ops(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| !matches!(op, Operation::Skip { .. }))
            .count()
    }
}

/// A plan whose operations are tagged with the tracking key they apply to,
/// so a channel adapter knows where to place each `Create`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyedPlan<K> {
    pub ops: Vec<(K, Operation)>,
}

impl<K> Default for KeyedPlan<K> {
    fn default() -> Self {
        Self { ops: Vec::new() }
    }
}

impl<K> KeyedPlan<K> {
    /// Operations that would hit the remote store (everything but Skip).
    pub fn remote_ops(&self) -> usize {
        self.ops
            .iter()
            .filter(|(_, op)| !matches!(op, Operation::Skip { .. }))
            .count()
    }
}

/// What `cleanup()` does with tracked comments once a run is over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CleanupMode {
    /// Delete resolved comments; strike through sticky ones.
    #[default]
    Normal,
    /// Leave everything in place (append-only history).
    KeepHistory,
    /// Delete everything, sticky or not.
    Replace,
}

/// Pick the authoritative comment when a key unexpectedly maps to more than
/// one: the numerically highest id wins. The others are left untouched by
/// this pass; only cleanup removes staleness.
fn authoritative(comments: &[TrackedComment]) -> Option<&TrackedComment> {
    comments.iter().max_by_key(|c| c.id)
}

/// Reconcile desired bodies against existing comments, per tracking key.
///
/// `existing` pairs each tracked comment with its key; `desired` pairs each
/// rendered body with its key, in caller order. One comment per key is
/// maintained: new content merges into the existing comment's body behind a
/// section separator, and a body whose fingerprint matches any existing
/// section is skipped. Keys are processed in sorted order so plans are
/// deterministic.
pub fn reconcile_keyed<K: Ord + Clone>(
    existing: &[(K, TrackedComment)],
    desired: &[(K, String)],
    identifier: &str,
) -> KeyedPlan<K> {
    let mut existing_by_key: BTreeMap<K, Vec<TrackedComment>> = BTreeMap::new();
    for (key, comment) in existing {
        existing_by_key
            .entry(key.clone())
            .or_default()
            .push(comment.clone());
    }

    let mut desired_by_key: BTreeMap<K, Vec<&str>> = BTreeMap::new();
    for (key, body) in desired {
        desired_by_key
            .entry(key.clone())
            .or_default()
            .push(body.as_str());
    }

    let mut plan = KeyedPlan::default();

    for (key, bodies) in desired_by_key {
        let target = existing_by_key
            .get(&key)
            .and_then(|comments| authoritative(comments));

        // Sections already present at this key, fingerprinted for duplicate
        // detection, plus whatever this pass appends.
        let mut sections: Vec<String> = match target {
            Some(comment) => marker::remove_marker(&comment.body)
                .split(marker::SECTION_SEPARATOR)
                .map(|s| s.to_string())
                .collect(),
            None => Vec::new(),
        };
        let mut known: Vec<String> = sections.iter().map(|s| marker::fingerprint(s)).collect();
        let mut appended = false;

        for body in bodies {
            let print = marker::fingerprint(body);
            if known.contains(&print) {
                plan.ops.push((
                    key.clone(),
                    Operation::Skip {
                        reason: "duplicate content".to_string(),
                    },
                ));
                continue;
            }
            sections.push(body.trim().to_string());
            known.push(print);
            appended = true;
        }

        if !appended {
            continue;
        }

        let merged = sections.join(marker::SECTION_SEPARATOR);
        let body = marker::add_marker(&merged, identifier, false);
        match target {
            Some(comment) => plan.ops.push((
                key.clone(),
                Operation::UpdateMerge {
                    id: comment.id,
                    body,
                },
            )),
            None => plan.ops.push((key.clone(), Operation::Create { body })),
        }
    }

    plan
}

/// Reconcile the single summary comment for an identifier.
///
/// Unlike the keyed channel, the fingerprint covers the whole rendered body
/// and lives in the marker's hash field: equal fingerprint means skip, a
/// different one means full replace, no comment means create. (The
/// per-section vs whole-body asymmetry between the two channels is
/// deliberate compatibility behavior.)
pub fn reconcile_summary(
    existing: &[TrackedComment],
    identifier: &str,
    aggregate_body: &str,
) -> Plan {
    let mut plan = Plan::default();
    let new_print = marker::fingerprint(aggregate_body);

    match authoritative(existing) {
        Some(comment) => {
            let stored = marker::parse(&comment.body).and_then(|m| m.hash);
            if stored.as_deref() == Some(new_print.as_str()) {
                plan.ops.push(Operation::Skip {
                    reason: "summary unchanged".to_string(),
                });
            } else {
                plan.ops.push(Operation::UpdateMerge {
                    id: comment.id,
                    body: marker::add_marker(aggregate_body, identifier, true),
                });
            }
        }
        None => {
            plan.ops.push(Operation::Create {
                body: marker::add_marker(aggregate_body, identifier, true),
            });
        }
    }

    plan
}

/// Plan the removal of every tracked comment for an identifier.
///
/// Sticky comments (bodies carrying the sticky sentinel) are struck through
/// so the finding's record survives; everything else is deleted. The mode
/// can suppress cleanup entirely or force deletion regardless of sticky.
pub fn cleanup(existing: &[TrackedComment], mode: CleanupMode, identifier: &str) -> Plan {
    let mut plan = Plan::default();

    match mode {
        CleanupMode::KeepHistory => {}
        CleanupMode::Replace => {
            for comment in existing {
                plan.ops.push(Operation::Delete { id: comment.id });
            }
        }
        CleanupMode::Normal => {
            for comment in existing {
                if comment.body.contains(marker::STICKY_SENTINEL) {
                    plan.ops.push(Operation::Strikethrough {
                        id: comment.id,
                        body: marker::strike_through(&comment.body, identifier),
                    });
                } else {
                    plan.ops.push(Operation::Delete { id: comment.id });
                }
            }
        }
    }

    plan
}
