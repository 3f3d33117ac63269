//! Arena-allocated MCTS tree.
//!
//! Nodes live in a single `Vec` and refer to each other by [`NodeId`].
//! Children are owned through the arena, parents are navigational indices
//! only, and dropping the tree drops every node at once.

use crate::node::{Node, NodeId, NodeStats, EPSILON};
use treesearch_core::{Environment, Result};

/// Arena-allocated MCTS tree.
#[derive(Clone, Debug)]
pub struct Tree<S, A> {
    nodes: Vec<Node<S, A>>,
}

impl<S, A> Tree<S, A> {
    /// Create a tree holding only a root for `root_state`.
    pub fn new(root_state: S) -> Self {
        Self {
            nodes: vec![Node::root(root_state)],
        }
    }

    /// Get a reference to a node by ID.
    ///
    /// # Panics
    /// Panics if the NodeId does not belong to this tree.
    pub fn get(&self, id: NodeId) -> &Node<S, A> {
        &self.nodes[id.0]
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> &mut Node<S, A> {
        &mut self.nodes[id.0]
    }

    pub fn root(&self) -> &Node<S, A> {
        self.get(NodeId::ROOT)
    }

    /// Get the number of nodes in the tree.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false: the root exists from construction.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterate over every node with its ID, in allocation order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node<S, A>)> {
        self.nodes.iter().enumerate().map(|(i, node)| (NodeId(i), node))
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).children()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).parent()
    }

    pub fn stats(&self, id: NodeId) -> NodeStats {
        self.get(id).stats()
    }

    /// Number of edges between `id` and the root.
    pub fn depth_of(&self, id: NodeId) -> usize {
        let mut depth = 0;
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            depth += 1;
            current = parent;
        }
        depth
    }

    /// Depth of the deepest node.
    pub fn max_depth(&self) -> usize {
        // Children are always allocated after their parent, so one forward
        // pass sees every parent's depth before its children.
        let mut depths = vec![0usize; self.nodes.len()];
        for (i, node) in self.nodes.iter().enumerate() {
            if let Some(parent) = node.parent {
                depths[i] = depths[parent.0] + 1;
            }
        }
        depths.into_iter().max().unwrap_or(0)
    }

    /// Add a new child under `parent`, returning its ID.
    pub(crate) fn add_child(&mut self, parent: NodeId, action: A, state: S) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::child(state, parent, action));
        self.get_mut(parent).children.push(id);
        id
    }

    /// UCT score of `child` given its parent's visit count.
    ///
    /// `mean + c * sqrt(ln(parent_visits + 1) / (child_visits + EPSILON))`
    pub fn uct_score(&self, child: NodeId, parent_visits: u32, exploration_weight: f64) -> f64 {
        let node = self.get(child);
        let exploration =
            ((parent_visits as f64 + 1.0).ln() / (node.visit_count as f64 + EPSILON)).sqrt();
        node.mean_value() + exploration_weight * exploration
    }

    /// The child of `id` with the highest UCT score.
    ///
    /// Ties go to the first child in expansion order. Returns `None` if the
    /// node has no children.
    pub fn best_child(&self, id: NodeId, exploration_weight: f64) -> Option<NodeId> {
        let parent_visits = self.get(id).visit_count;
        first_max(
            self.children(id)
                .iter()
                .map(|&child| (child, self.uct_score(child, parent_visits, exploration_weight))),
        )
    }

    /// The child of `id` with the most visits (ties go to the first child).
    ///
    /// This is the conventional "robust child" used to pick the action to
    /// play. It generally differs from [`Tree::best_child`], which adds an
    /// exploration bonus.
    pub fn most_visited_child(&self, id: NodeId) -> Option<NodeId> {
        first_max(
            self.children(id)
                .iter()
                .map(|&child| (child, self.get(child).visit_count as f64)),
        )
    }

    /// The visited child of `id` with the highest mean reward.
    ///
    /// Falls back to the first child when none has been visited yet.
    pub fn highest_value_child(&self, id: NodeId) -> Option<NodeId> {
        let visited = self
            .children(id)
            .iter()
            .filter(|&&child| self.get(child).visit_count > 0)
            .map(|&child| (child, self.get(child).mean_value()));
        first_max(visited).or_else(|| self.children(id).first().copied())
    }

    /// UCT descent from the root to a frontier node.
    ///
    /// Follows [`Tree::best_child`] until a node without children is reached.
    /// Mutates nothing.
    pub fn select(&self, exploration_weight: f64) -> NodeId {
        let mut current = NodeId::ROOT;
        while let Some(next) = self.best_child(current, exploration_weight) {
            current = next;
        }
        current
    }

    /// Add `reward` to every node from `id` up to and including the root.
    pub fn backpropagate(&mut self, id: NodeId, reward: f64) {
        let mut current = Some(id);
        while let Some(node_id) = current {
            let node = self.get_mut(node_id);
            node.record(reward);
            current = node.parent;
        }
    }

    /// Action on the most visited root child.
    pub fn best_action(&self) -> Option<&A> {
        self.most_visited_child(NodeId::ROOT)
            .and_then(|child| self.get(child).action())
    }
}

impl<S: Clone, A: Clone> Tree<S, A> {
    /// Create one child of `id` per legal action, all at once.
    ///
    /// Returns the number of children created. Terminal states, states
    /// without legal actions, and nodes that already have children produce
    /// none; callers treat a childless node as a dead end.
    ///
    /// # Errors
    /// Propagates `Error::IllegalAction` if the environment rejects one of
    /// the actions it reported as legal.
    pub fn expand<E>(&mut self, env: &E, id: NodeId) -> Result<usize>
    where
        E: Environment<State = S, Action = A>,
    {
        let node = self.get(id);
        if !node.children.is_empty() || env.is_terminal(&node.state) {
            return Ok(0);
        }

        let successors = env
            .legal_actions(&node.state)
            .into_iter()
            .map(|action| {
                let next = env.apply(&node.state, &action)?;
                Ok((action, next))
            })
            .collect::<Result<Vec<_>>>()?;

        let count = successors.len();
        for (action, next) in successors {
            self.add_child(id, action, next);
        }
        Ok(count)
    }
}

/// Argmax that keeps the first of equal scores.
fn first_max(scored: impl Iterator<Item = (NodeId, f64)>) -> Option<NodeId> {
    let mut best: Option<(NodeId, f64)> = None;
    for (id, score) in scored {
        match best {
            Some((_, best_score)) if score <= best_score || score.is_nan() => {}
            _ => best = Some((id, score)),
        }
    }
    best.map(|(id, _)| id)
}
