//! Diff position mapping
//!
//! GitHub's review-comment protocol addresses lines by *position*: an index
//! into the physical lines of a file's patch text, not a file line number.
//! This module parses the unified-diff patch returned by the "list pull
//! request files" endpoint and converts an absolute line number in the new
//! file into that position, plus resolves feedback paths against the file
//! list (including renames).

use serde::Deserialize;

/// One file entry from the pull request files listing.
///
/// `patch` is absent for binary and very large files; every caller must
/// treat a missing patch as "line not in diff", never as an error.
#[derive(Debug, Clone, Deserialize)]
pub struct PrFile {
    pub filename: String,
    #[serde(default)]
    pub previous_filename: Option<String>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub patch: Option<String>,
}

/// A parsed `@@ -a,b +c,d @@` hunk header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hunk {
    pub old_start: u64,
    pub old_count: u64,
    pub new_start: u64,
    pub new_count: u64,
}

/// Parse a hunk header line. Returns `None` for anything that is not a
/// well-formed header; callers skip such lines rather than failing, so a
/// malformed patch degrades to "no match".
pub fn parse_hunk_header(line: &str) -> Option<Hunk> {
    let rest = line.strip_prefix("@@ ")?;
    let end = rest.find(" @@")?;
    let ranges = &rest[..end];

    let mut parts = ranges.split_whitespace();
    let old = parts.next()?.strip_prefix('-')?;
    let new = parts.next()?.strip_prefix('+')?;
    if parts.next().is_some() {
        return None;
    }

    let (old_start, old_count) = parse_range(old)?;
    let (new_start, new_count) = parse_range(new)?;

    Some(Hunk {
        old_start,
        old_count,
        new_start,
        new_count,
    })
}

/// Parse a range like "10,5" or "10" into (start, count).
/// A missing count defaults to 1.
fn parse_range(s: &str) -> Option<(u64, u64)> {
    if let Some(comma) = s.find(',') {
        let start = s[..comma].parse().ok()?;
        let count = s[comma + 1..].parse().ok()?;
        Some((start, count))
    } else {
        let start = s.parse().ok()?;
        Some((start, 1))
    }
}

/// Collect every parseable hunk header in a patch, in order.
pub fn parse_hunks(patch: &str) -> Vec<Hunk> {
    patch.lines().filter_map(parse_hunk_header).collect()
}

/// Map an absolute line number in the new file to its diff position.
///
/// The position is a 1-based counter over every physical line of the patch
/// text, hunk headers included, reset once at the start of the patch and
/// never per hunk. Returns the position of the first addition-or-context
/// line whose new-file line number equals `line`; `None` when that line is
/// a deletion, outside every hunk, or only reachable through old-file
/// numbering.
pub fn position_for_line(patch: &str, line: u64) -> Option<u64> {
    let mut position: u64 = 0;
    let mut new_line: Option<u64> = None;

    for raw in patch.lines() {
        position += 1;

        if let Some(hunk) = parse_hunk_header(raw) {
            new_line = Some(hunk.new_start);
            continue;
        }

        let Some(current) = new_line else {
            // Before the first hunk header (or after a malformed one):
            // nothing here is addressable.
            continue;
        };

        if raw.starts_with('-') {
            // Deletion: advances the old file only, never commentable.
            continue;
        }
        if raw.starts_with('\\') {
            // "\ No newline at end of file" occupies a position but no line.
            continue;
        }

        // Addition or context line.
        if current == line {
            return Some(position);
        }
        new_line = Some(current + 1);
    }

    None
}

/// Whether `line` in the new file appears in the patch as an addition or
/// context line.
pub fn commentable(patch: &str, line: u64) -> bool {
    position_for_line(patch, line).is_some()
}

/// Resolve a feedback item's path against the PR file list.
///
/// Resolution order: exact filename match, then rename tracking (the item
/// path matches a file's `previous_filename` and resolves to its new name),
/// then a best-effort match on the final path component alone. Within each
/// rule, when the listing contains duplicate filenames the last entry wins.
pub fn resolve_path(path: &str, files: &[PrFile]) -> Option<String> {
    if let Some(f) = files.iter().rev().find(|f| f.filename == path) {
        return Some(f.filename.clone());
    }

    if let Some(f) = files
        .iter()
        .rev()
        .find(|f| f.previous_filename.as_deref() == Some(path))
    {
        return Some(f.filename.clone());
    }

    let base = path.rsplit('/').next()?;
    files
        .iter()
        .rev()
        .find(|f| f.filename.rsplit('/').next() == Some(base))
        .map(|f| f.filename.clone())
}

/// Find the file entry an item resolves to, applying the same rules as
/// [`resolve_path`].
pub fn resolve_file<'a>(path: &str, files: &'a [PrFile]) -> Option<&'a PrFile> {
    let resolved = resolve_path(path, files)?;
    files.iter().rev().find(|f| f.filename == resolved)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_PATCH: &str = "@@ -1,5 +1,7 @@\n import Foundation\n\n+// New comment added\n+\n class MyClass {\n-    func hello() {}\n+    func hello() {\n+        print(\"Hello\")\n+    }\n }";

    fn file(name: &str, patch: Option<&str>) -> PrFile {
        PrFile {
            filename: name.to_string(),
            previous_filename: None,
            status: "modified".to_string(),
            patch: patch.map(|p| p.to_string()),
        }
    }

    // ========================================================================
    // Hunk header parsing
    // ========================================================================

    #[test]
    fn test_parse_hunk_header_full() {
        let hunk = parse_hunk_header("@@ -1,5 +1,7 @@").unwrap();
        assert_eq!(hunk.old_start, 1);
        assert_eq!(hunk.old_count, 5);
        assert_eq!(hunk.new_start, 1);
        assert_eq!(hunk.new_count, 7);
    }

    #[test]
    fn test_parse_hunk_header_default_counts() {
        let hunk = parse_hunk_header("@@ -5 +10 @@").unwrap();
        assert_eq!(hunk.old_start, 5);
        assert_eq!(hunk.old_count, 1);
        assert_eq!(hunk.new_start, 10);
        assert_eq!(hunk.new_count, 1);
    }

    #[test]
    fn test_parse_hunk_header_with_context() {
        let hunk = parse_hunk_header("@@ -10,3 +12,4 @@ fn main() {").unwrap();
        assert_eq!(hunk.old_start, 10);
        assert_eq!(hunk.new_start, 12);
        assert_eq!(hunk.new_count, 4);
    }

    #[test]
    fn test_parse_hunk_header_rejects_garbage() {
        assert!(parse_hunk_header("not a header").is_none());
        assert!(parse_hunk_header("@@ malformed @@").is_none());
        assert!(parse_hunk_header("@@ -a,b +c,d @@").is_none());
        assert!(parse_hunk_header("").is_none());
    }

    #[test]
    fn test_parse_hunks_skips_bad_headers() {
        let patch = "@@ -1,2 +1,2 @@\n context\n@@ broken\n@@ -8,1 +9,2 @@\n+added";
        let hunks = parse_hunks(patch);
        assert_eq!(hunks.len(), 2);
        assert_eq!(hunks[1].new_start, 9);
    }

    // ========================================================================
    // Position mapping
    // ========================================================================

    #[test]
    fn test_position_for_line_in_diff() {
        // Line 3 of the new file is "// New comment added", an addition.
        let pos = position_for_line(SAMPLE_PATCH, 3).unwrap();
        assert!(pos > 0);
        assert_eq!(pos, 4); // header=1, import=2, blank=3, addition=4
    }

    #[test]
    fn test_position_for_line_outside_diff() {
        assert!(position_for_line(SAMPLE_PATCH, 100).is_none());
    }

    #[test]
    fn test_position_counts_header_lines() {
        // First content line sits below the header, so its position is 2.
        let patch = "@@ -1,1 +1,2 @@\n context\n+added";
        assert_eq!(position_for_line(patch, 1), Some(2));
        assert_eq!(position_for_line(patch, 2), Some(3));
    }

    #[test]
    fn test_position_counter_not_reset_per_hunk() {
        let patch = "@@ -1,1 +1,1 @@\n one\n@@ -10,1 +20,2 @@\n ten\n+twenty-one";
        // Second hunk: header at position 3, context at 4, addition at 5.
        assert_eq!(position_for_line(patch, 20), Some(4));
        assert_eq!(position_for_line(patch, 21), Some(5));
    }

    #[test]
    fn test_deleted_lines_not_commentable() {
        let patch = "@@ -1,3 +1,2 @@\n keep\n-gone\n still";
        // New file is "keep" (1), "still" (2); "gone" only existed in the old file.
        assert_eq!(position_for_line(patch, 1), Some(2));
        assert_eq!(position_for_line(patch, 2), Some(4));
        assert!(position_for_line(patch, 3).is_none());
    }

    #[test]
    fn test_no_newline_marker_occupies_position() {
        let patch = "@@ -1,1 +1,1 @@\n-old\n\\ No newline at end of file\n+new";
        assert_eq!(position_for_line(patch, 1), Some(4));
    }

    #[test]
    fn test_empty_patch() {
        assert!(position_for_line("", 1).is_none());
        assert!(parse_hunks("").is_empty());
    }

    #[test]
    fn test_commentable() {
        assert!(commentable(SAMPLE_PATCH, 3));
        assert!(!commentable(SAMPLE_PATCH, 100));
    }

    // ========================================================================
    // Path resolution
    // ========================================================================

    #[test]
    fn test_resolve_exact_match() {
        let files = vec![file("src/a.rs", None), file("src/b.rs", None)];
        assert_eq!(resolve_path("src/b.rs", &files), Some("src/b.rs".to_string()));
    }

    #[test]
    fn test_resolve_rename() {
        let mut renamed = file("New.swift", None);
        renamed.previous_filename = Some("Old.swift".to_string());
        let files = vec![file("Other.swift", None), renamed];
        assert_eq!(resolve_path("Old.swift", &files), Some("New.swift".to_string()));
    }

    #[test]
    fn test_resolve_basename_fallback() {
        let files = vec![file("deep/nested/dir/thing.rs", None)];
        assert_eq!(
            resolve_path("other/prefix/thing.rs", &files),
            Some("deep/nested/dir/thing.rs".to_string())
        );
    }

    #[test]
    fn test_resolve_no_match() {
        let files = vec![file("src/a.rs", None)];
        assert!(resolve_path("src/missing.rs", &files).is_none());
    }

    #[test]
    fn test_resolve_duplicate_filenames_last_wins() {
        // The files listing should not contain duplicates, but it has been
        // observed to. Last entry wins.
        let first = file("src/dup.rs", Some("@@ -1,1 +1,1 @@\n first"));
        let second = file("src/dup.rs", Some("@@ -1,1 +1,1 @@\n second"));
        let files = vec![first, second];
        let resolved = resolve_file("src/dup.rs", &files).unwrap();
        assert_eq!(resolved.patch.as_deref(), Some("@@ -1,1 +1,1 @@\n second"));
    }

    #[test]
    fn test_resolve_file_without_patch() {
        // Binary / too-large files have no patch; resolution still succeeds
        // and the caller routes the item out-of-range.
        let files = vec![file("image.png", None)];
        let resolved = resolve_file("image.png", &files).unwrap();
        assert!(resolved.patch.is_none());
    }
}
