#![forbid(unsafe_code)]

//! Per-thread directory of live nodes, keyed by [`NodeId`].
//!
//! Observer records never capture the node they forward into. They name it
//! by id and resolve its height here at ordering time, so a record outliving
//! its dependent simply resolves to height zero.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::Weak;

/// Stable identifier of an [`Observable`](super::Observable) node.
///
/// Unique among all nodes created on the current thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u64);

impl NodeId {
    /// Get the raw id value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// Type-erased view of a node, enough to order propagation.
pub(crate) trait GraphNode {
    fn height(&self) -> usize;
    fn label(&self) -> String;
}

thread_local! {
    static NEXT_NODE_ID: Cell<u64> = const { Cell::new(1) };
    static NODES: RefCell<HashMap<NodeId, Weak<dyn GraphNode>>> = RefCell::new(HashMap::new());
}

pub(crate) fn next_node_id() -> NodeId {
    NEXT_NODE_ID.with(|next| {
        let id = next.get();
        next.set(id + 1);
        NodeId(id)
    })
}

pub(crate) fn register(id: NodeId, node: Weak<dyn GraphNode>) {
    NODES.with(|nodes| {
        nodes.borrow_mut().insert(id, node);
    });
}

/// Remove `id` from the directory.
///
/// Tolerates being called while the thread's storage is being torn down.
pub(crate) fn unregister(id: NodeId) {
    let _ = NODES.try_with(|nodes| {
        if let Ok(mut nodes) = nodes.try_borrow_mut() {
            nodes.remove(&id);
        }
    });
}

fn lookup(id: NodeId) -> Option<Weak<dyn GraphNode>> {
    NODES
        .try_with(|nodes| nodes.borrow().get(&id).cloned())
        .ok()
        .flatten()
}

/// Current height of node `id`, or 0 when the node no longer exists.
pub(crate) fn height_of(id: NodeId) -> usize {
    lookup(id)
        .and_then(|weak| weak.upgrade())
        .map_or(0, |node| node.height())
}

/// Debug label of node `id`, if it is still alive.
pub(crate) fn label_of(id: NodeId) -> Option<String> {
    lookup(id)
        .and_then(|weak| weak.upgrade())
        .map(|node| node.label())
}

/// Number of live nodes registered on this thread.
#[cfg(test)]
pub(crate) fn live_nodes() -> usize {
    NODES.with(|nodes| {
        nodes
            .borrow()
            .values()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    })
}
