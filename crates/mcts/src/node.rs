//! MCTS node types for tree storage.
//!
//! Uses arena allocation with indices for cache locality and simpler memory management.

use serde::Serialize;

/// Small constant added to visit counts wherever they are used as a
/// denominator, so unvisited nodes never divide by zero.
pub const EPSILON: f64 = 1e-6;

/// Index into the node arena.
///
/// This is a lightweight handle that references a node in the tree.
/// Parent links are plain indices too, so a node is never kept alive by
/// its parent pointer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// The root node is always at index 0.
    pub const ROOT: NodeId = NodeId(0);

    /// Position of the node in its tree's arena.
    pub fn index(self) -> usize {
        self.0
    }
}

/// Visit statistics for a single node, as exposed for inspection.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct NodeStats {
    /// Number of backpropagation passes that included this node.
    pub visit_count: u32,

    /// Accumulated reward.
    pub value_sum: f64,

    /// `value_sum / (visit_count + EPSILON)`.
    ///
    /// A placeholder (0.0) when the node has never been visited.
    pub mean_value: f64,
}

impl NodeStats {
    pub fn is_visited(&self) -> bool {
        self.visit_count > 0
    }
}

/// A node in the MCTS tree.
///
/// Each node owns the environment state it represents and remembers the
/// action that produced it (None for root).
#[derive(Clone, Debug)]
pub struct Node<S, A> {
    pub(crate) state: S,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) action: Option<A>,
    pub(crate) visit_count: u32,
    pub(crate) value_sum: f64,
}

impl<S, A> Node<S, A> {
    /// Create the root node.
    pub(crate) fn root(state: S) -> Self {
        Self {
            state,
            parent: None,
            children: Vec::new(),
            action: None,
            visit_count: 0,
            value_sum: 0.0,
        }
    }

    /// Create an unvisited child produced by `action`.
    pub(crate) fn child(state: S, parent: NodeId, action: A) -> Self {
        Self {
            state,
            parent: Some(parent),
            children: Vec::new(),
            action: Some(action),
            visit_count: 0,
            value_sum: 0.0,
        }
    }

    pub fn state(&self) -> &S {
        &self.state
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Children in expansion order.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn action(&self) -> Option<&A> {
        self.action.as_ref()
    }

    pub fn visit_count(&self) -> u32 {
        self.visit_count
    }

    pub fn value_sum(&self) -> f64 {
        self.value_sum
    }

    /// True if the node has no children yet (a frontier node).
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Mean reward, smoothed by [`EPSILON`].
    ///
    /// Meaningless for a node that has never been visited.
    pub fn mean_value(&self) -> f64 {
        self.value_sum / (self.visit_count as f64 + EPSILON)
    }

    pub fn stats(&self) -> NodeStats {
        NodeStats {
            visit_count: self.visit_count,
            value_sum: self.value_sum,
            mean_value: self.mean_value(),
        }
    }

    /// Record one backpropagation pass.
    pub(crate) fn record(&mut self, reward: f64) {
        self.visit_count += 1;
        self.value_sum += reward;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_node_is_unvisited() {
        let node: Node<i32, u8> = Node::child(3, NodeId::ROOT, 7);
        assert_eq!(node.visit_count(), 0);
        assert_eq!(node.value_sum(), 0.0);
        assert_eq!(node.mean_value(), 0.0);
        assert!(!node.stats().is_visited());
        assert_eq!(node.action(), Some(&7));
        assert_eq!(node.parent(), Some(NodeId::ROOT));
    }

    #[test]
    fn test_record_updates_mean() {
        let mut node: Node<i32, u8> = Node::root(0);
        node.record(1.0);
        node.record(0.5);

        assert_eq!(node.visit_count(), 2);
        assert!((node.value_sum() - 1.5).abs() < 1e-12);
        assert!((node.mean_value() - 0.75).abs() < 1e-5);
    }

    #[test]
    fn test_root_node() {
        let root: Node<i32, u8> = Node::root(5);
        assert_eq!(root.action(), None);
        assert_eq!(root.parent(), None);
        assert!(root.is_leaf());
        assert_eq!(*root.state(), 5);
    }
}
