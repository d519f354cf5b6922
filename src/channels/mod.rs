//! Presentation channels
//!
//! Three independent surfaces for the same feedback: inline check-run
//! annotations, one summary comment on the PR conversation, and per-line
//! review comments. Each adapter supplies the reconciliation engine with its
//! own notion of "already tracked" comments and executes the resulting plan;
//! the merge/skip logic itself lives in one place (`engine`), not three.

pub mod checks;
pub mod review;
pub mod summary;

use crate::feedback::FeedbackItem;
use crate::marker::STICKY_SENTINEL;

/// Render one feedback item into the markdown body of a line comment.
///
/// The sticky sentinel rides inside the body so that cleanup can tell,
/// from the remote comment alone, whether to strike through or delete.
pub fn render_item(item: &FeedbackItem) -> String {
    let mut body = String::new();

    match &item.title {
        Some(title) => {
            body.push_str(&format!("{} **{}**\n\n{}", item.severity.glyph(), title, item.message));
        }
        None => {
            body.push_str(&format!("{} {}", item.severity.glyph(), item.message));
        }
    }

    if item.sticky {
        body.push('\n');
        body.push_str(STICKY_SENTINEL);
    }

    body
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feedback::Severity;
    use crate::marker;

    fn item(message: &str, severity: Severity, sticky: bool) -> FeedbackItem {
        FeedbackItem {
            path: "src/a.rs".to_string(),
            line: 1,
            end_line: None,
            column: None,
            severity,
            message: message.to_string(),
            title: None,
            sticky,
        }
    }

    #[test]
    fn test_render_plain_item() {
        let rendered = render_item(&item("unused variable", Severity::Warning, false));
        assert!(rendered.contains("unused variable"));
        assert!(!rendered.contains(STICKY_SENTINEL));
    }

    #[test]
    fn test_render_sticky_item_embeds_sentinel() {
        let rendered = render_item(&item("must fix", Severity::Failure, true));
        assert!(rendered.contains(STICKY_SENTINEL));
    }

    #[test]
    fn test_render_with_title() {
        let mut i = item("long explanation", Severity::Notice, false);
        i.title = Some("Style".to_string());
        let rendered = render_item(&i);
        assert!(rendered.contains("**Style**"));
        assert!(rendered.contains("long explanation"));
    }

    #[test]
    fn test_rendering_is_fingerprint_stable() {
        let a = render_item(&item("same", Severity::Warning, false));
        let b = render_item(&item("same", Severity::Warning, false));
        assert_eq!(marker::fingerprint(&a), marker::fingerprint(&b));
    }
}
