//! Owned compile state with lazy recompilation.
//!
//! A [`Session`] walks its document once, then serves record batches from a
//! cache. Mutations edit the cache or the adjacency table in place and raise
//! the stale flag; the next [`Session::get_events`] recompiles from the
//! current adjacency table.
//!
//! ```text
//! open ──▶ stale ──get_events──▶ fresh ──update_content / move_node / reset──▶ stale
//! ```

use std::collections::{HashMap, HashSet};

use indexmap::IndexSet;
use tracing::{debug, warn};

use crate::ast::{Document, NodeRef};
use crate::clock::{Clock, FloorClock, SystemClock};
use crate::compiler::{EventCompiler, RecordMap, zettel_tags};
use crate::config::CompilerConfig;
use crate::error::{CompileError, MutationError};
use crate::event::{Issuer, Kind, Nip01Hasher, Record, RecordHasher};
use crate::schedule::schedule;
use crate::walker::{Walk, WalkWarning, walk};

/// A document together with its walk tables and compiled record cache.
#[derive(Debug)]
pub struct Session {
    doc: Document,
    config: CompilerConfig,
    walk: Walk,
    records: RecordMap,
    event_ids: HashMap<String, String>,
    stale: bool,
    issuer: Option<Issuer>,
    /// Latest `created_at` of the previous compile.
    last_created_at: Option<i64>,
    hasher: Box<dyn RecordHasher>,
    clock: Box<dyn Clock>,
}

impl Session {
    /// Walk `doc` with the default hasher and the system clock.
    #[must_use]
    pub fn open(doc: Document, config: CompilerConfig) -> Self {
        Self::with_parts(doc, config, Box::new(Nip01Hasher), Box::new(SystemClock))
    }

    /// Walk `doc` with an explicit hasher and clock.
    #[must_use]
    pub fn with_parts(
        mut doc: Document,
        config: CompilerConfig,
        hasher: Box<dyn RecordHasher>,
        clock: Box<dyn Clock>,
    ) -> Self {
        let walk = walk(&mut doc, &config);
        Self {
            doc,
            config,
            walk,
            records: RecordMap::new(),
            event_ids: HashMap::new(),
            stale: true,
            issuer: None,
            last_created_at: None,
            hasher,
            clock,
        }
    }

    /// Return the record batch for `issuer`, recompiling if the cache is
    /// stale or was built for a different issuer.
    ///
    /// Records come children first: every `e` tag refers to a record that
    /// appears earlier in the batch.
    ///
    /// # Errors
    ///
    /// Returns a [`CompileError`] if the schedule and the walk tables
    /// disagree. The cache is left untouched in that case.
    pub fn get_events(&mut self, issuer: &Issuer) -> Result<&RecordMap, CompileError> {
        let issuer_changed = self.issuer.as_ref() != Some(issuer);
        if self.stale || issuer_changed {
            self.recompile(issuer)?;
        } else {
            debug!(records = self.records.len(), "serving cached records");
        }
        Ok(&self.records)
    }

    /// Records are stamped strictly after the previous batch.
    fn recompile(&mut self, issuer: &Issuer) -> Result<(), CompileError> {
        let ordered = schedule(&self.walk.root_id, &self.walk.adjacency);
        let floor = self
            .last_created_at
            .map_or(i64::MIN, |last| last.saturating_add(1));
        let clock = FloorClock::new(self.clock.as_ref(), floor);
        let records = EventCompiler::new(&self.doc, &self.walk, self.hasher.as_ref(), &clock)
            .compile(ordered, issuer)?;

        self.event_ids = records
            .iter()
            .map(|(node_id, record)| (node_id.clone(), record.id.clone()))
            .collect();
        self.last_created_at = records
            .values()
            .map(|record| record.created_at)
            .max()
            .or(self.last_created_at);
        self.records = records;
        self.issuer = Some(issuer.clone());
        self.stale = false;
        Ok(())
    }

    /// Replace the content of a compiled Zettel and reseal it.
    ///
    /// Wikilink tags are re-extracted and only this record's id changes; its
    /// `created_at` is kept. The new text is also written into the document
    /// so a full recompile keeps it. Parent indices still reference the old
    /// id until the next [`Self::get_events`], so the session goes stale.
    ///
    /// # Errors
    ///
    /// - [`MutationError::NotFound`] if no compiled record exists for `node_id`.
    /// - [`MutationError::IndexContent`] if the record is an Index.
    pub fn update_content(
        &mut self,
        node_id: &str,
        content: &str,
    ) -> Result<&Record, MutationError> {
        let record = self
            .records
            .get(node_id)
            .ok_or_else(|| MutationError::NotFound {
                node_id: node_id.to_owned(),
            })?;
        if record.kind == Kind::Index {
            return Err(MutationError::IndexContent {
                node_id: node_id.to_owned(),
            });
        }

        let node = self.node_ref(node_id)?;
        let title = self.doc.node(node).title().map(str::to_owned);
        let mut updated = Record::unsealed(
            Kind::Zettel,
            content.to_owned(),
            zettel_tags(node_id, title.as_deref(), content),
            record.created_at,
            record.issuer.clone(),
        );
        let old_id = record.id.clone();
        updated.seal(self.hasher.as_ref());

        debug!(node = %node_id, old = %old_id, new = %updated.id, "zettel content updated");
        self.doc.set_source(node, content);
        self.event_ids.insert(node_id.to_owned(), updated.id.clone());
        self.stale = true;

        let slot = self
            .records
            .get_mut(node_id)
            .ok_or_else(|| MutationError::NotFound {
                node_id: node_id.to_owned(),
            })?;
        *slot = updated;
        Ok(slot)
    }

    /// Move `node_id` from `old_parent` to the end of `new_parent`.
    ///
    /// The document tree is updated to match. Moving a node beneath itself
    /// or one of its descendants detaches that subtree from the root; it is
    /// logged and the subtree drops out of later batches.
    ///
    /// # Errors
    ///
    /// - [`MutationError::InvalidParent`] if either parent is not an Index.
    /// - [`MutationError::NotAChild`] if `old_parent` does not list `node_id`.
    ///
    /// Nothing is modified when an error is returned.
    pub fn move_node(
        &mut self,
        node_id: &str,
        old_parent: &str,
        new_parent: &str,
    ) -> Result<(), MutationError> {
        for parent in [old_parent, new_parent] {
            if !self.walk.is_index(parent) {
                return Err(MutationError::InvalidParent {
                    parent_id: parent.to_owned(),
                });
            }
        }
        let not_a_child = || MutationError::NotAChild {
            node_id: node_id.to_owned(),
            parent_id: old_parent.to_owned(),
        };
        if !self
            .walk
            .adjacency
            .get(old_parent)
            .is_some_and(|children| children.contains(node_id))
        {
            return Err(not_a_child());
        }
        let node = self.node_ref(node_id).map_err(|_| not_a_child())?;
        let target = self.node_ref(new_parent)?;

        if self.subtree_contains(node_id, new_parent) {
            warn!(
                node = %node_id,
                new_parent = %new_parent,
                "move places node inside its own subtree; subtree is detached from the root"
            );
        }

        if let Some(children) = self.walk.adjacency.get_mut(old_parent) {
            children.shift_remove(node_id);
        }
        if let Some(children) = self.walk.adjacency.get_mut(new_parent) {
            children.insert(node_id.to_owned());
        }
        self.doc.reparent(node, target);
        self.stale = true;

        debug!(node = %node_id, from = %old_parent, to = %new_parent, "node moved");
        Ok(())
    }

    /// Drop every cached record and mark the session stale.
    pub fn reset(&mut self) {
        self.records.clear();
        self.event_ids.clear();
        self.stale = true;
        debug!("session cache cleared");
    }

    #[must_use]
    pub fn root_id(&self) -> &str {
        &self.walk.root_id
    }

    #[must_use]
    pub fn kind_of(&self, node_id: &str) -> Option<Kind> {
        self.walk.kind_of(node_id)
    }

    /// Direct children of an Index, in order.
    #[must_use]
    pub fn children_of(&self, node_id: &str) -> Option<&IndexSet<String>> {
        self.walk.adjacency.get(node_id)
    }

    /// Cached record for a node, if compiled.
    #[must_use]
    pub fn record(&self, node_id: &str) -> Option<&Record> {
        self.records.get(node_id)
    }

    /// Cached record id for a node, if compiled.
    #[must_use]
    pub fn event_id(&self, node_id: &str) -> Option<&str> {
        self.event_ids.get(node_id).map(String::as_str)
    }

    #[must_use]
    pub fn warnings(&self) -> &[WalkWarning] {
        &self.walk.warnings
    }

    /// Sections whose contents were cut by the depth ceiling.
    #[must_use]
    pub fn truncated(&self) -> &[String] {
        &self.walk.truncated
    }

    #[must_use]
    pub const fn is_stale(&self) -> bool {
        self.stale
    }

    #[must_use]
    pub const fn document(&self) -> &Document {
        &self.doc
    }

    #[must_use]
    pub const fn config(&self) -> &CompilerConfig {
        &self.config
    }

    fn node_ref(&self, node_id: &str) -> Result<NodeRef, MutationError> {
        self.walk
            .nodes
            .get(node_id)
            .copied()
            .ok_or_else(|| MutationError::NotFound {
                node_id: node_id.to_owned(),
            })
    }

    /// Whether `needle` is `node_id` or one of its descendants.
    fn subtree_contains(&self, node_id: &str, needle: &str) -> bool {
        let mut stack = vec![node_id];
        let mut seen = HashSet::new();
        while let Some(id) = stack.pop() {
            if id == needle {
                return true;
            }
            if !seen.insert(id) {
                continue;
            }
            if let Some(children) = self.walk.adjacency.get(id) {
                stack.extend(children.iter().map(String::as_str));
            }
        }
        false
    }
}
