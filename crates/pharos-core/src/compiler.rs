//! Record compilation over a scheduled id list.
//!
//! [`EventCompiler::compile`] pops ids off the back of the list produced by
//! [`crate::schedule::schedule`], so every child record is sealed before the
//! Index that references it. Each record is assembled completely, stamped
//! with `created_at` and the issuer, and only then hashed.
//!
//! | kind   | content     | tags                                                   |
//! |--------|-------------|--------------------------------------------------------|
//! | Index  | empty       | `title`?, `d`, `e`* (+ `author`, `version`, `published_on` on the root) |
//! | Zettel | raw source  | `title`?, `d`, `wikilink`*                              |

use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::ast::{Document, DocumentMeta, Node};
use crate::clock::Clock;
use crate::error::CompileError;
use crate::event::{
    Issuer, Kind, Record, RecordHasher, TAG_AUTHOR, TAG_D, TAG_E, TAG_PUBLISHED_ON, TAG_TITLE,
    TAG_VERSION, Tag,
};
use crate::walker::Walk;
use crate::wikilink;

/// Compiled records keyed by node id, in compile order (children first).
pub type RecordMap = IndexMap<String, Record>;

/// Borrowed view of everything a compile pass reads.
#[derive(Debug, Clone, Copy)]
pub struct EventCompiler<'a> {
    doc: &'a Document,
    walk: &'a Walk,
    hasher: &'a dyn RecordHasher,
    clock: &'a dyn Clock,
}

impl<'a> EventCompiler<'a> {
    #[must_use]
    pub const fn new(
        doc: &'a Document,
        walk: &'a Walk,
        hasher: &'a dyn RecordHasher,
        clock: &'a dyn Clock,
    ) -> Self {
        Self {
            doc,
            walk,
            hasher,
            clock,
        }
    }

    /// Compile every id in `ordered`, consuming it from the back.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError::MissingNode`] if a scheduled id is not in the
    /// walk tables, and [`CompileError::MissingChildId`] if an Index is
    /// reached before one of its children. Both indicate a schedule that
    /// does not match the adjacency table.
    pub fn compile(
        &self,
        mut ordered: Vec<String>,
        issuer: &Issuer,
    ) -> Result<RecordMap, CompileError> {
        let mut compiled = RecordMap::with_capacity(ordered.len());

        while let Some(node_id) = ordered.pop() {
            let record = self.compile_one(&node_id, issuer, &compiled)?;
            trace!(node = %node_id, id = %record.id, kind = %record.kind, "record sealed");
            compiled.insert(node_id, record);
        }

        debug!(
            records = compiled.len(),
            issuer = %issuer,
            "compile pass complete"
        );
        Ok(compiled)
    }

    fn compile_one(
        &self,
        node_id: &str,
        issuer: &Issuer,
        compiled: &RecordMap,
    ) -> Result<Record, CompileError> {
        let missing = || CompileError::MissingNode {
            node_id: node_id.to_owned(),
        };
        let node = self.doc.node(*self.walk.nodes.get(node_id).ok_or_else(missing)?);
        let kind = self.walk.kind_of(node_id).ok_or_else(missing)?;

        let (content, tags) = match kind {
            Kind::Index => (String::new(), self.index_tags(node_id, node, compiled)?),
            Kind::Zettel => {
                let content = node.raw_source().unwrap_or_default().to_owned();
                let tags = zettel_tags(node_id, node.title(), &content);
                (content, tags)
            }
        };

        let mut record =
            Record::unsealed(kind, content, tags, self.clock.now(), issuer.clone());
        record.seal(self.hasher);
        Ok(record)
    }

    fn index_tags(
        &self,
        node_id: &str,
        node: &Node,
        compiled: &RecordMap,
    ) -> Result<Vec<Tag>, CompileError> {
        let mut tags = head_tags(node_id, node.title());

        let children = self.walk.adjacency.get(node_id).into_iter().flatten();
        for child in children {
            let child_record = compiled.get(child).ok_or_else(|| CompileError::MissingChildId {
                index_id: node_id.to_owned(),
                child_id: child.clone(),
            })?;
            tags.push(Tag::pair(TAG_E, child_record.id.as_str()));
        }

        if node_id == self.walk.root_id
            && let Some(meta) = node.meta()
        {
            tags.extend(metadata_tags(meta));
        }

        Ok(tags)
    }
}

/// Tags for a Zettel: `title`?, `d`, then one `wikilink` per marker.
#[must_use]
pub fn zettel_tags(node_id: &str, title: Option<&str>, content: &str) -> Vec<Tag> {
    let mut tags = head_tags(node_id, title);
    tags.extend(wikilink::extract(content));
    tags
}

fn head_tags(node_id: &str, title: Option<&str>) -> Vec<Tag> {
    let mut tags = Vec::with_capacity(2);
    if let Some(title) = title {
        tags.push(Tag::pair(TAG_TITLE, title));
    }
    tags.push(Tag::pair(TAG_D, node_id));
    tags
}

/// Root-only tags. Blank values are dropped; a tag whose values are all
/// blank is omitted.
fn metadata_tags(meta: &DocumentMeta) -> Vec<Tag> {
    fn present(value: Option<&String>) -> Option<&str> {
        value.map(|v| v.trim()).filter(|v| !v.is_empty())
    }

    let mut tags = Vec::new();

    let authors: Vec<&str> = meta
        .authors
        .iter()
        .map(|a| a.trim())
        .filter(|a| !a.is_empty())
        .collect();
    if !authors.is_empty() {
        tags.push(Tag::new(TAG_AUTHOR, authors));
    }

    let version: Vec<&str> = [meta.revision_number.as_ref(), meta.revision_remark.as_ref()]
        .into_iter()
        .filter_map(present)
        .collect();
    if !version.is_empty() {
        tags.push(Tag::new(TAG_VERSION, version));
    }

    if let Some(date) = present(meta.revision_date.as_ref()) {
        tags.push(Tag::pair(TAG_PUBLISHED_ON, date));
    }

    tags
}
