//! Slugs and id assignment for document nodes.
//!
//! [`normalize`] turns free text into a slug made of `[a-z0-9-]`. The
//! [`IdAllocator`] applies the id ladder used by the walker:
//!
//! 1. id written back by an earlier walk, verbatim;
//! 2. explicit id from the markup, normalized;
//! 3. title, normalized;
//! 4. `{root_id}_{context}_{n}` with one counter per context name.
//!
//! Synthesized ids contain `_`, which [`normalize`] never emits, so they
//! cannot collide with a label-derived id.

use std::collections::HashMap;

use crate::ast::{Document, NodeRef};

/// Separator that replaces whitespace runs inside a slug.
pub const SEPARATOR: char = '-';

/// Root id used when the document has neither an id nor a title.
pub const UNTITLED_ROOT: &str = "document";

/// Normalize free text into a slug.
///
/// Decodes character entities, lowercases, collapses whitespace runs into a
/// single [`SEPARATOR`] and strips every character outside `[a-z0-9-]`.
/// Returns `None` when nothing survives.
///
/// ```
/// use pharos_core::normalize::normalize;
///
/// assert_eq!(normalize("Chapter 1").as_deref(), Some("chapter-1"));
/// assert_eq!(normalize("Q&amp;A Session").as_deref(), Some("qa-session"));
/// assert_eq!(normalize("   "), None);
/// ```
#[must_use]
pub fn normalize(text: &str) -> Option<String> {
    let decoded = decode_entities(text);
    let mut slug = String::with_capacity(decoded.len());
    let mut pending_separator = false;

    for ch in decoded.trim().chars().flat_map(char::to_lowercase) {
        if ch.is_whitespace() {
            pending_separator = true;
            continue;
        }
        if pending_separator {
            slug.push(SEPARATOR);
            pending_separator = false;
        }
        slug.push(ch);
    }

    slug.retain(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == SEPARATOR);
    if slug.is_empty() { None } else { Some(slug) }
}

/// Decode the HTML/XML character references that markup parsers leave in
/// titles: the five XML entities, `&nbsp;`, and numeric references.
/// Unknown or malformed references are kept as written.
fn decode_entities(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let decoded = tail
            .find(';')
            .filter(|&semi| semi <= 10)
            .and_then(|semi| decode_entity(&tail[1..semi]).map(|ch| (ch, semi)));

        match decoded {
            Some((ch, semi)) => {
                out.push(ch);
                rest = &tail[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some(' '),
        _ => {
            let digits = name.strip_prefix('#')?;
            let code = match digits.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => digits.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}

/// Assigns node ids for one walk over one document.
///
/// Counters are scoped per context name, so untitled paragraphs number
/// `_paragraph_0`, `_paragraph_1`, ... independently of `_image_0`.
#[derive(Debug, Default)]
pub struct IdAllocator {
    root_id: Option<String>,
    counters: HashMap<&'static str, usize>,
}

impl IdAllocator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve the id of `node` and write it back onto the document.
    ///
    /// The first call must be for the root; its id prefixes every
    /// synthesized id handed out afterwards.
    pub fn assign(&mut self, doc: &mut Document, node: NodeRef) -> String {
        let id = self.resolve(doc, node);
        if self.root_id.is_none() {
            self.root_id = Some(id.clone());
        }
        doc.assign_id(node, &id);
        id
    }

    fn resolve(&mut self, doc: &Document, node: NodeRef) -> String {
        let n = doc.node(node);
        if let Some(id) = n.assigned_id() {
            return id.to_owned();
        }
        if let Some(id) = n.explicit_id().and_then(normalize) {
            return id;
        }
        if let Some(id) = n.title().and_then(normalize) {
            return id;
        }

        let Some(root_id) = self.root_id.as_deref() else {
            return UNTITLED_ROOT.to_owned();
        };
        let context = n.context().name();
        let counter = self.counters.entry(context).or_insert(0);
        let id = format!("{root_id}_{context}_{counter}");
        *counter += 1;
        id
    }
}
