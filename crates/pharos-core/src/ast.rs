//! Document tree handed to the walker by a parser adapter.
//!
//! The tree is an arena: nodes live in one `Vec` and refer to each other by
//! [`NodeRef`]. A node is exactly one of three shapes, and only that shape
//! carries the attributes that make sense for it:
//!
//! - [`NodeContext::Document`]: the root, owner of [`DocumentMeta`].
//! - [`NodeContext::Section`]: a titled container with a nesting level.
//! - [`NodeContext::Leaf`]: a content block with its raw source text.
//!
//! Parser adapters build the tree with [`Document::new`],
//! [`Document::add_section`] and [`Document::add_leaf`]. The walker writes each
//! node's resolved id back through [`Document::assign_id`].

use std::fmt;

/// Handle to a node inside a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeRef(usize);

impl NodeRef {
    /// Arena index of the node.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Block flavour of a leaf node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LeafKind {
    Paragraph,
    Image,
    Listing,
    Literal,
    UnorderedList,
    OrderedList,
    Quote,
    Table,
    Admonition,
    Passthrough,
    ThematicBreak,
}

impl LeafKind {
    /// Context name used when synthesizing ids for unlabeled leaves.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Paragraph => "paragraph",
            Self::Image => "image",
            Self::Listing => "listing",
            Self::Literal => "literal",
            Self::UnorderedList => "ulist",
            Self::OrderedList => "olist",
            Self::Quote => "quote",
            Self::Table => "table",
            Self::Admonition => "admonition",
            Self::Passthrough => "pass",
            Self::ThematicBreak => "thematic_break",
        }
    }
}

impl fmt::Display for LeafKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Root-only metadata read into the root Index record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentMeta {
    /// Author display names. Blank entries are ignored by the compiler.
    pub authors: Vec<String>,
    /// Revision number, published as the first `version` value.
    pub revision_number: Option<String>,
    /// Revision remark (edition), published as the second `version` value.
    pub revision_remark: Option<String>,
    /// Revision date, published as `published_on`.
    pub revision_date: Option<String>,
}

/// The shape of a node and the attributes that belong to that shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeContext {
    Document(DocumentMeta),
    Section { level: u8 },
    Leaf { kind: LeafKind, source: String },
}

impl NodeContext {
    /// Context name used when synthesizing ids.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Document(_) => "document",
            Self::Section { .. } => "section",
            Self::Leaf { kind, .. } => kind.as_str(),
        }
    }

    /// Returns `true` for node shapes that become Index records.
    #[must_use]
    pub const fn is_container(&self) -> bool {
        matches!(self, Self::Document(_) | Self::Section { .. })
    }
}

/// A single node of the document tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    explicit_id: Option<String>,
    assigned_id: Option<String>,
    title: Option<String>,
    context: NodeContext,
    parent: Option<NodeRef>,
    children: Vec<NodeRef>,
}

impl Node {
    fn new(context: NodeContext, title: Option<&str>, parent: Option<NodeRef>) -> Self {
        Self {
            explicit_id: None,
            assigned_id: None,
            title: title.map(str::to_owned),
            context,
            parent,
            children: Vec::new(),
        }
    }

    /// Id supplied by the markup (`{#id}`, `[[id]]`, front matter, ...).
    #[must_use]
    pub fn explicit_id(&self) -> Option<&str> {
        self.explicit_id.as_deref()
    }

    /// Id written back by a previous walk.
    #[must_use]
    pub fn assigned_id(&self) -> Option<&str> {
        self.assigned_id.as_deref()
    }

    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    #[must_use]
    pub const fn context(&self) -> &NodeContext {
        &self.context
    }

    /// Nesting level for sections; `0` for the document, `None` for leaves.
    #[must_use]
    pub const fn level(&self) -> Option<u8> {
        match self.context {
            NodeContext::Document(_) => Some(0),
            NodeContext::Section { level } => Some(level),
            NodeContext::Leaf { .. } => None,
        }
    }

    /// Raw markup source. Only leaves carry source.
    #[must_use]
    pub fn raw_source(&self) -> Option<&str> {
        match &self.context {
            NodeContext::Leaf { source, .. } => Some(source),
            _ => None,
        }
    }

    /// Document metadata. Only the root carries metadata.
    #[must_use]
    pub const fn meta(&self) -> Option<&DocumentMeta> {
        match &self.context {
            NodeContext::Document(meta) => Some(meta),
            _ => None,
        }
    }

    #[must_use]
    pub const fn parent(&self) -> Option<NodeRef> {
        self.parent
    }

    #[must_use]
    pub fn children(&self) -> &[NodeRef] {
        &self.children
    }
}

/// Arena-backed document tree. Node `0` is always the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    nodes: Vec<Node>,
}

impl Document {
    /// Create a document whose root carries `title`.
    #[must_use]
    pub fn new(title: Option<&str>) -> Self {
        Self {
            nodes: vec![Node::new(
                NodeContext::Document(DocumentMeta::default()),
                title,
                None,
            )],
        }
    }

    #[must_use]
    pub const fn root(&self) -> NodeRef {
        NodeRef(0)
    }

    /// Number of nodes in the arena, root included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always `false`: a document has at least its root.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Look up a node.
    ///
    /// # Panics
    ///
    /// Panics if `node` was not created by this document.
    #[must_use]
    pub fn node(&self, node: NodeRef) -> &Node {
        &self.nodes[node.0]
    }

    /// Mutable access to the root metadata.
    ///
    /// # Panics
    ///
    /// Never in practice: the root is created as a document node and its
    /// context is never replaced.
    pub fn meta_mut(&mut self) -> &mut DocumentMeta {
        match &mut self.nodes[0].context {
            NodeContext::Document(meta) => meta,
            _ => unreachable!("node 0 is always the document root"),
        }
    }

    /// Set the explicit (markup-supplied) id of a node.
    pub fn set_explicit_id(&mut self, node: NodeRef, id: impl Into<String>) {
        self.nodes[node.0].explicit_id = Some(id.into());
    }

    /// Set or replace the title of a node.
    pub fn set_title(&mut self, node: NodeRef, title: impl Into<String>) {
        self.nodes[node.0].title = Some(title.into());
    }

    /// Append a section under `parent` and return its handle.
    pub fn add_section(&mut self, parent: NodeRef, title: Option<&str>, level: u8) -> NodeRef {
        self.push(parent, Node::new(NodeContext::Section { level }, title, Some(parent)))
    }

    /// Append a leaf under `parent` and return its handle.
    pub fn add_leaf(
        &mut self,
        parent: NodeRef,
        kind: LeafKind,
        title: Option<&str>,
        source: impl Into<String>,
    ) -> NodeRef {
        let context = NodeContext::Leaf {
            kind,
            source: source.into(),
        };
        self.push(parent, Node::new(context, title, Some(parent)))
    }

    fn push(&mut self, parent: NodeRef, node: Node) -> NodeRef {
        let handle = NodeRef(self.nodes.len());
        self.nodes.push(node);
        self.nodes[parent.0].children.push(handle);
        handle
    }

    /// Record the id the walker resolved for `node`.
    pub fn assign_id(&mut self, node: NodeRef, id: &str) {
        self.nodes[node.0].assigned_id = Some(id.to_owned());
    }

    /// Replace a leaf's source. Returns `false` for non-leaf nodes.
    pub fn set_source(&mut self, node: NodeRef, text: &str) -> bool {
        match &mut self.nodes[node.0].context {
            NodeContext::Leaf { source, .. } => {
                text.clone_into(source);
                true
            }
            _ => false,
        }
    }

    /// Move `node` to the end of `new_parent`'s children.
    pub fn reparent(&mut self, node: NodeRef, new_parent: NodeRef) {
        if let Some(old) = self.nodes[node.0].parent {
            self.nodes[old.0].children.retain(|child| *child != node);
        }
        self.nodes[node.0].parent = Some(new_parent);
        self.nodes[new_parent.0].children.push(node);
    }

    /// Drop the parent back-reference of a node while leaving it listed among
    /// its former parent's children. Parser adapters use this for blocks
    /// whose owner could not be determined.
    pub fn orphan(&mut self, node: NodeRef) {
        self.nodes[node.0].parent = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_links_parent_and_children() {
        let mut doc = Document::new(Some("Book"));
        let root = doc.root();
        let chapter = doc.add_section(root, Some("Chapter 1"), 1);
        let para = doc.add_leaf(chapter, LeafKind::Paragraph, None, "Hello world");

        assert_eq!(doc.len(), 3);
        assert_eq!(doc.node(root).children(), &[chapter]);
        assert_eq!(doc.node(chapter).children(), &[para]);
        assert_eq!(doc.node(para).parent(), Some(chapter));
        assert_eq!(doc.node(para).raw_source(), Some("Hello world"));
        assert_eq!(doc.node(chapter).raw_source(), None);
        assert_eq!(doc.node(chapter).level(), Some(1));
        assert_eq!(doc.node(para).level(), None);
    }

    #[test]
    fn only_root_carries_meta() {
        let mut doc = Document::new(None);
        doc.meta_mut().authors.push("Ada".into());
        let leaf = doc.add_leaf(doc.root(), LeafKind::Image, None, "![x](x.png)");

        assert_eq!(doc.node(doc.root()).meta().map(|m| m.authors.len()), Some(1));
        assert!(doc.node(leaf).meta().is_none());
        assert_eq!(doc.node(leaf).context().name(), "image");
    }

    #[test]
    fn reparent_moves_between_child_lists() {
        let mut doc = Document::new(Some("Book"));
        let root = doc.root();
        let a = doc.add_section(root, Some("A"), 1);
        let b = doc.add_section(root, Some("B"), 1);
        let p = doc.add_leaf(a, LeafKind::Paragraph, None, "text");

        doc.reparent(p, b);

        assert!(doc.node(a).children().is_empty());
        assert_eq!(doc.node(b).children(), &[p]);
        assert_eq!(doc.node(p).parent(), Some(b));
    }

    #[test]
    fn set_source_rejects_containers() {
        let mut doc = Document::new(Some("Book"));
        let root = doc.root();
        let p = doc.add_leaf(root, LeafKind::Paragraph, None, "old");

        assert!(doc.set_source(p, "new"));
        assert_eq!(doc.node(p).raw_source(), Some("new"));
        assert!(!doc.set_source(root, "nope"));
    }
}
