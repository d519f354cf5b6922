//! Comment marker codec
//!
//! Every comment this tool posts starts with an invisible HTML comment that
//! links it back to us: `<!-- lintpost:<identifier>[:<hash>] -->`. The
//! identifier scopes all comments for one logical run purpose; the optional
//! hash is a content fingerprint used for change detection. The format is
//! bit-exact because other tooling greps for it.

use crate::util::hash_str;

/// Namespace inside the marker. Distinguishes our markers from other tools
/// that also hide HTML comments in comment bodies.
const NAMESPACE: &str = "lintpost";

const MARKER_OPEN: &str = "<!--";
const MARKER_CLOSE: &str = "-->";

/// Separator between merged content sections inside one comment body.
pub const SECTION_SEPARATOR: &str = "\n\n---\n\n";

/// Sentinel embedded in the rendered body of a sticky item. On cleanup a
/// body carrying this is struck through instead of deleted.
pub const STICKY_SENTINEL: &str = "<!-- sticky -->";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
    pub identifier: String,
    pub hash: Option<String>,
}

/// Render a marker line (no trailing newline).
pub fn generate(identifier: &str, hash: Option<&str>) -> String {
    match hash {
        Some(h) => format!("{} {}:{}:{} {}", MARKER_OPEN, NAMESPACE, identifier, h, MARKER_CLOSE),
        None => format!("{} {}:{} {}", MARKER_OPEN, NAMESPACE, identifier, MARKER_CLOSE),
    }
}

/// Parse a marker from the first line of a body.
///
/// Returns `None` for anything that is not exactly our marker shape; a
/// comment without a parseable marker is foreign and must never be touched.
pub fn parse(body: &str) -> Option<Marker> {
    let first_line = body.lines().next()?;
    let inner = first_line
        .strip_prefix(MARKER_OPEN)?
        .strip_suffix(MARKER_CLOSE)?
        .trim();

    let rest = inner.strip_prefix(NAMESPACE)?.strip_prefix(':')?;

    // identifier or identifier:hash - identifiers may not contain ':'.
    match rest.split_once(':') {
        Some((id, hash)) if !id.is_empty() && !hash.is_empty() => Some(Marker {
            identifier: id.to_string(),
            hash: Some(hash.to_string()),
        }),
        None if !rest.is_empty() => Some(Marker {
            identifier: rest.to_string(),
            hash: None,
        }),
        _ => None,
    }
}

/// Whether `body` carries our marker for exactly `identifier`.
///
/// The whole identifier must match between delimiters: `swiftlint` must not
/// match a comment tracked as `swiftlint-extra`.
pub fn contains(identifier: &str, body: &str) -> bool {
    parse(body).is_some_and(|m| m.identifier == identifier)
}

/// Deterministic fixed-width fingerprint of content, computed over the
/// trimmed text.
pub fn fingerprint(content: &str) -> String {
    hash_str(content.trim())
}

/// Prepend a marker line to `body`. When `include_hash` is set the marker
/// carries the fingerprint of `body`.
pub fn add_marker(body: &str, identifier: &str, include_hash: bool) -> String {
    let hash = include_hash.then(|| fingerprint(body));
    format!("{}\n{}", generate(identifier, hash.as_deref()), body)
}

/// Strip exactly one leading marker line (plus its newline). Left inverse of
/// [`add_marker`]: `remove_marker(&add_marker(x, id, _)) == x`.
pub fn remove_marker(body: &str) -> String {
    if parse(body).is_none() {
        return body.to_string();
    }
    match body.split_once('\n') {
        Some((_, rest)) => rest.to_string(),
        None => String::new(),
    }
}

/// Apply strikethrough markup to a resolved sticky body.
///
/// Strips the outer marker and the sticky sentinel, wraps every remaining
/// non-empty line in `~~`, then re-adds the marker. Lines already struck
/// through are left alone so repeated cleanup passes are idempotent.
pub fn strike_through(body: &str, identifier: &str) -> String {
    let marker = parse(body);
    let content = remove_marker(body);

    let struck: Vec<String> = content
        .lines()
        .filter(|line| line.trim() != STICKY_SENTINEL)
        .map(|line| {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with(MARKER_OPEN) {
                line.to_string()
            } else if trimmed.starts_with("~~") && trimmed.ends_with("~~") && trimmed.len() > 4 {
                line.to_string()
            } else {
                format!("~~{}~~", line)
            }
        })
        .collect();

    let id = marker
        .as_ref()
        .map(|m| m.identifier.as_str())
        .unwrap_or(identifier);
    let hash = marker.as_ref().and_then(|m| m.hash.as_deref());

    format!("{}\n{}", generate(id, hash), struck.join("\n"))
}
