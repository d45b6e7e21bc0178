//! Markdown front end: builds a [`Document`] from CommonMark source.
//!
//! Mapping:
//!
//! | markdown                              | document                                |
//! |---------------------------------------|-----------------------------------------|
//! | YAML front matter                     | root id, title and metadata             |
//! | first `#` heading before any block    | document title (`{#id}` → root id)      |
//! | `##`..`######` heading                | section at nesting level `L - 1`        |
//! | later `#` heading                     | level-1 section                         |
//! | any other top-level block             | leaf carrying the block's exact source  |
//!
//! A paragraph made of a single image becomes an `image` leaf.

use std::ops::Range;

use anyhow::{Context, Result};
use pharos_core::{Document, LeafKind, NodeRef};
use pulldown_cmark::{Event, HeadingLevel, Options, Parser, Tag};
use serde_yaml::Value;

/// Parse `source` into a document tree.
///
/// # Errors
///
/// Returns an error if the YAML front matter is present but malformed.
pub fn parse(source: &str) -> Result<Document> {
    let mut builder = Builder::new();
    let mut depth = 0_usize;
    let mut pending: Option<Pending> = None;

    for (event, range) in Parser::new_ext(source, options()).into_offset_iter() {
        match event {
            Event::Start(tag) => {
                if depth == 0 {
                    pending = Some(Pending::open(&tag, range));
                } else if let Some(block) = pending.as_mut() {
                    block.nested_start(&tag, depth);
                }
                depth += 1;
            }
            Event::End(_) => {
                depth = depth.saturating_sub(1);
                if depth == 0
                    && let Some(block) = pending.take()
                {
                    builder.finish(block, source)?;
                }
            }
            Event::Text(text) | Event::Code(text) | Event::Html(text) => {
                if let Some(block) = pending.as_mut() {
                    block.text(&text, depth);
                }
            }
            Event::Rule if depth == 0 => {
                builder.leaf(LeafKind::ThematicBreak, block_source(source, range));
            }
            _ => {
                if let Some(block) = pending.as_mut() {
                    block.other_inline(depth);
                }
            }
        }
    }

    Ok(builder.into_document())
}

fn options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_HEADING_ATTRIBUTES
        | Options::ENABLE_YAML_STYLE_METADATA_BLOCKS
}

fn block_source(source: &str, range: Range<usize>) -> &str {
    source
        .get(range)
        .unwrap_or_default()
        .trim_end_matches(['\n', '\r'])
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockKind {
    FrontMatter,
    Heading(u8),
    Leaf(LeafKind),
}

/// A top-level block whose end has not been seen yet.
#[derive(Debug)]
struct Pending {
    kind: BlockKind,
    range: Range<usize>,
    heading_id: Option<String>,
    text: String,
    images: usize,
    other_content: bool,
}

impl Pending {
    fn open(tag: &Tag<'_>, range: Range<usize>) -> Self {
        let mut heading_id = None;
        let kind = match tag {
            Tag::MetadataBlock(_) => BlockKind::FrontMatter,
            Tag::Heading { level, id, .. } => {
                heading_id = id.as_ref().map(ToString::to_string);
                BlockKind::Heading(heading_number(*level))
            }
            Tag::CodeBlock(_) => BlockKind::Leaf(LeafKind::Listing),
            Tag::List(Some(_)) => BlockKind::Leaf(LeafKind::OrderedList),
            Tag::List(None) => BlockKind::Leaf(LeafKind::UnorderedList),
            Tag::BlockQuote(_) => BlockKind::Leaf(LeafKind::Quote),
            Tag::Table(_) => BlockKind::Leaf(LeafKind::Table),
            Tag::HtmlBlock => BlockKind::Leaf(LeafKind::Passthrough),
            _ => BlockKind::Leaf(LeafKind::Paragraph),
        };
        Self {
            kind,
            range,
            heading_id,
            text: String::new(),
            images: 0,
            other_content: false,
        }
    }

    fn nested_start(&mut self, tag: &Tag<'_>, depth: usize) {
        if depth == 1 && matches!(tag, Tag::Image { .. }) {
            self.images += 1;
        } else if depth == 1 {
            self.other_content = true;
        }
    }

    fn text(&mut self, text: &str, depth: usize) {
        self.text.push_str(text);
        if depth == 1 && !text.trim().is_empty() {
            self.other_content = true;
        }
    }

    fn other_inline(&mut self, depth: usize) {
        if depth == 1 {
            self.other_content = true;
        }
    }

    fn leaf_kind(&self, kind: LeafKind) -> LeafKind {
        if kind == LeafKind::Paragraph && self.images == 1 && !self.other_content {
            LeafKind::Image
        } else {
            kind
        }
    }
}

const fn heading_number(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

/// Tracks where the next node goes while blocks stream in.
struct Builder {
    doc: Document,
    /// Open sections, innermost last, with their nesting level.
    sections: Vec<(u8, NodeRef)>,
    seen_block: bool,
    titled_by_front_matter: bool,
}

impl Builder {
    fn new() -> Self {
        Self {
            doc: Document::new(None),
            sections: Vec::new(),
            seen_block: false,
            titled_by_front_matter: false,
        }
    }

    fn into_document(self) -> Document {
        self.doc
    }

    fn parent(&self) -> NodeRef {
        self.sections
            .last()
            .map_or_else(|| self.doc.root(), |(_, node)| *node)
    }

    fn finish(&mut self, block: Pending, source: &str) -> Result<()> {
        match block.kind {
            BlockKind::FrontMatter => self.front_matter(&block.text)?,
            BlockKind::Heading(1) if !self.seen_block && !self.titled_by_front_matter => {
                let root = self.doc.root();
                self.doc.set_title(root, block.text.trim());
                if let Some(id) = block.heading_id {
                    self.doc.set_explicit_id(root, id);
                }
                self.seen_block = true;
            }
            BlockKind::Heading(level) => {
                let level = level.saturating_sub(1).max(1);
                while self.sections.last().is_some_and(|(open, _)| *open >= level) {
                    self.sections.pop();
                }
                let parent = self.parent();
                let title = block.text.trim();
                let title = (!title.is_empty()).then_some(title);
                let node = self.doc.add_section(parent, title, level);
                if let Some(id) = block.heading_id {
                    self.doc.set_explicit_id(node, id);
                }
                self.sections.push((level, node));
                self.seen_block = true;
            }
            BlockKind::Leaf(kind) => {
                let kind = block.leaf_kind(kind);
                self.leaf(kind, block_source(source, block.range));
            }
        }
        Ok(())
    }

    fn leaf(&mut self, kind: LeafKind, source: &str) {
        let parent = self.parent();
        self.doc.add_leaf(parent, kind, None, source);
        self.seen_block = true;
    }

    fn front_matter(&mut self, yaml: &str) -> Result<()> {
        if yaml.trim().is_empty() {
            return Ok(());
        }
        let value: Value = serde_yaml::from_str(yaml).context("Invalid YAML front matter")?;
        let Value::Mapping(map) = value else {
            return Ok(());
        };
        let field = |key: &str| map.get(key).and_then(scalar);
        let root = self.doc.root();

        if let Some(id) = field("id") {
            self.doc.set_explicit_id(root, id);
        }
        if let Some(title) = field("title") {
            self.doc.set_title(root, title);
            self.titled_by_front_matter = true;
        }

        let authors = map
            .get("authors")
            .or_else(|| map.get("author"))
            .map(string_list)
            .unwrap_or_default();
        let version = field("version");
        let edition = field("edition");
        let published_on = field("published_on");

        let meta = self.doc.meta_mut();
        meta.authors = authors;
        meta.revision_number = version;
        meta.revision_remark = edition;
        meta.revision_date = published_on;
        Ok(())
    }
}

fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn string_list(value: &Value) -> Vec<String> {
    match value {
        Value::Sequence(items) => items.iter().filter_map(scalar).collect(),
        other => scalar(other).into_iter().collect(),
    }
}
