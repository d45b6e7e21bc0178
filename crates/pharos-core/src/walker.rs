//! Breadth-first classification of a document tree.
//!
//! [`walk`] visits the root, then every node reachable through section
//! children in FIFO order, and produces three tables:
//!
//! - **node table**: node id → [`NodeRef`];
//! - **kind table**: node id → [`Kind`] (root and sections are Index, every
//!   other node is Zettel);
//! - **adjacency table**: Index id → ordered set of direct child ids, in
//!   document order.
//!
//! # Policies
//!
//! - **Depth ceiling**: a section whose nesting level is at or beyond
//!   [`CompilerConfig::depth_ceiling`] is registered and linked, but its
//!   children are never visited. The cut is permanent and not an error.
//! - **Duplicate ids**: the first node to claim an id keeps it; later
//!   claimants are skipped together with their subtrees.
//! - **Unlinked nodes**: a node whose parent does not resolve to a registered
//!   Index is registered but not linked anywhere, so it is never compiled.
//!
//! Duplicates and unlinked nodes are reported as [`WalkWarning`]s.

use std::collections::{HashMap, VecDeque};
use std::fmt;

use indexmap::{IndexMap, IndexSet};
use tracing::{debug, warn};

use crate::ast::{Document, NodeRef};
use crate::config::CompilerConfig;
use crate::event::Kind;
use crate::normalize::IdAllocator;

/// Index id → ordered set of direct child ids.
pub type Adjacency = IndexMap<String, IndexSet<String>>;

/// Something the walk skipped or could not place. Never fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalkWarning {
    /// The node's parent did not resolve to a registered Index.
    Unlinked { node_id: String },
    /// Another node already claimed this id; this one was dropped.
    DuplicateId { node_id: String, context: &'static str },
}

impl WalkWarning {
    #[must_use]
    pub fn node_id(&self) -> &str {
        match self {
            Self::Unlinked { node_id } | Self::DuplicateId { node_id, .. } => node_id,
        }
    }
}

impl fmt::Display for WalkWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unlinked { node_id } => {
                write!(f, "node '{node_id}' has no resolvable parent and will not be compiled")
            }
            Self::DuplicateId { node_id, context } => {
                write!(f, "{context} with duplicate id '{node_id}' was skipped")
            }
        }
    }
}

/// Tables produced by [`walk`].
#[derive(Debug, Clone, Default)]
pub struct Walk {
    pub root_id: String,
    pub nodes: IndexMap<String, NodeRef>,
    pub kinds: HashMap<String, Kind>,
    pub adjacency: Adjacency,
    /// Sections whose children were cut by the depth ceiling.
    pub truncated: Vec<String>,
    pub warnings: Vec<WalkWarning>,
}

impl Walk {
    #[must_use]
    pub fn kind_of(&self, node_id: &str) -> Option<Kind> {
        self.kinds.get(node_id).copied()
    }

    #[must_use]
    pub fn is_index(&self, node_id: &str) -> bool {
        self.kind_of(node_id) == Some(Kind::Index)
    }

    fn register(&mut self, id: &str, node: NodeRef, kind: Kind) {
        self.nodes.insert(id.to_owned(), node);
        self.kinds.insert(id.to_owned(), kind);
        if kind == Kind::Index {
            self.adjacency.insert(id.to_owned(), IndexSet::new());
        }
    }
}

/// Classify every reachable node of `doc` and build the walk tables.
///
/// Resolved ids are written back onto the document, so walking the same
/// document twice yields the same ids.
pub fn walk(doc: &mut Document, config: &CompilerConfig) -> Walk {
    let mut ids = IdAllocator::new();
    let mut out = Walk::default();

    let root = doc.root();
    let root_id = ids.assign(doc, root);
    out.register(&root_id, root, Kind::Index);
    out.root_id = root_id;

    let mut queue: VecDeque<NodeRef> = doc.node(root).children().iter().copied().collect();

    while let Some(node) = queue.pop_front() {
        let id = ids.assign(doc, node);
        let entry = doc.node(node);
        let is_container = entry.context().is_container();

        if out.nodes.contains_key(&id) {
            let warning = WalkWarning::DuplicateId {
                node_id: id,
                context: entry.context().name(),
            };
            warn!(%warning, "skipping duplicate node");
            out.warnings.push(warning);
            continue;
        }

        let kind = if is_container { Kind::Index } else { Kind::Zettel };
        out.register(&id, node, kind);

        let parent_id = entry
            .parent()
            .and_then(|parent| doc.node(parent).assigned_id());
        let Some(siblings) = parent_id.and_then(|pid| out.adjacency.get_mut(pid)) else {
            let warning = WalkWarning::Unlinked { node_id: id };
            warn!(%warning, "leaving node out of the graph");
            out.warnings.push(warning);
            continue;
        };
        siblings.insert(id.clone());

        if !is_container {
            continue;
        }

        let level = entry.level().unwrap_or_default();
        if level >= config.depth_ceiling {
            if !entry.children().is_empty() {
                debug!(
                    section = %id,
                    level,
                    skipped = entry.children().len(),
                    "depth ceiling reached, not descending"
                );
                out.truncated.push(id);
            }
            continue;
        }

        queue.extend(entry.children().iter().copied());
    }

    debug!(
        root = %out.root_id,
        nodes = out.nodes.len(),
        indexes = out.adjacency.len(),
        warnings = out.warnings.len(),
        "document walk complete"
    );

    out
}
