//! `[[label]]` cross-reference extraction for Zettel content.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::event::{TAG_WIKILINK, Tag};
use crate::normalize::normalize;

static WIKILINK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[\[([^\[\]]*?)\]\]").expect("valid wikilink regex"));

/// Extract every `[[label]]` marker as a `("wikilink", slug)` tag.
///
/// Matches are non-overlapping and returned in order of appearance. Labels
/// that normalize to nothing (`[[ ]]`, `[[!!]]`) produce no tag.
#[must_use]
pub fn extract(text: &str) -> Vec<Tag> {
    WIKILINK_RE
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .filter_map(|label| normalize(label.as_str()))
        .map(|slug| Tag::pair(TAG_WIKILINK, slug))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slugs(text: &str) -> Vec<String> {
        extract(text)
            .iter()
            .filter_map(|tag| tag.value().map(str::to_owned))
            .collect()
    }

    #[test]
    fn extracts_in_order_of_appearance() {
        let tags = extract("See [[My Page]] and [[Other]]");
        assert_eq!(tags.len(), 2);
        assert_eq!(tags[0], Tag::pair("wikilink", "my-page"));
        assert_eq!(tags[1], Tag::pair("wikilink", "other"));
    }

    #[test]
    fn no_markers_no_tags() {
        assert!(extract("plain [text] with [single] brackets").is_empty());
        assert!(extract("").is_empty());
    }

    #[test]
    fn repeated_labels_are_kept() {
        assert_eq!(slugs("[[A]] then [[a]]"), vec!["a", "a"]);
    }

    #[test]
    fn empty_labels_are_dropped() {
        assert_eq!(slugs("[[ ]] [[!!]] [[ok]]"), vec!["ok"]);
    }

    #[test]
    fn unterminated_marker_is_ignored() {
        assert_eq!(slugs("[[open and [[Closed Link]]"), vec!["closed-link"]);
    }

    #[test]
    fn labels_are_normalized() {
        assert_eq!(slugs("[[Q&amp;A Session]]"), vec!["qa-session"]);
    }
}
