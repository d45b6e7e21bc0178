//! Hash-dependency ordering over the adjacency table.
//!
//! An Index record's id covers the ids of its children, so children must be
//! compiled first. [`schedule`] produces an id list in which every node
//! precedes all of its descendants; consuming that list from the back
//! therefore reaches every child before its parent.
//!
//! ```text
//! traversal: [root]            output: []
//! pop root  → push children    output: [root]
//! pop child → push its kids    output: [root, child, ...]
//! ```
//!
//! No recursion and no visited set: the adjacency table is a tree, so each
//! node is pushed exactly once.

use crate::walker::Adjacency;

/// Order `root_id` and every node reachable from it so that popping from the
/// end of the returned list never yields a node before its children.
#[must_use]
pub fn schedule(root_id: &str, adjacency: &Adjacency) -> Vec<String> {
    let mut traversal = vec![root_id.to_owned()];
    let mut ordered = Vec::with_capacity(adjacency.len());

    while let Some(id) = traversal.pop() {
        if let Some(children) = adjacency.get(&id) {
            traversal.extend(children.iter().cloned());
        }
        ordered.push(id);
    }

    ordered
}
