//! Utilities to traverse the tree structure.

use crate::geometry::BoxGeometry;
use crate::tree::index::{ApproxTree, NodeEntry};

/// A node of an [`ApproxTree`].
#[derive(Debug, Clone, Copy)]
pub struct Node<'a> {
    /// The tree that this node is a reference onto
    tree: &'a ApproxTree,

    /// Position in the node table
    index: usize,

    /// Number of splits between the root and this node
    depth: usize,
}

impl<'a> Node<'a> {
    pub(crate) fn from_root(tree: &'a ApproxTree) -> Self {
        Self {
            tree,
            index: 0,
            depth: 0,
        }
    }

    /// Position of this node in breadth-first order.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Depth of this node; the root is at depth 0.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Returns `true` if this is a leaf node without children.
    pub fn is_leaf(&self) -> bool {
        matches!(self.tree.nodes[self.index], NodeEntry::Leaf { .. })
    }

    /// Returns `true` if this is an internal node with children.
    pub fn is_parent(&self) -> bool {
        !self.is_leaf()
    }

    /// The center of this node's box.
    pub fn center(&self) -> &'a [f64] {
        self.tree.node_center(self.index)
    }

    /// The half extent of this node's box.
    pub fn half_extent(&self) -> &'a [f64] {
        self.tree.node_half_extent(self.index)
    }

    /// This node's box.
    pub fn geometry(&self) -> BoxGeometry {
        self.tree.node_geometry(self.index)
    }

    /// Returns `false` only for leaves kept at the maximum depth without meeting the
    /// tolerance.
    pub fn converged(&self) -> bool {
        match self.tree.nodes[self.index] {
            NodeEntry::Leaf { converged, .. } => converged,
            NodeEntry::Internal { .. } => true,
        }
    }

    /// The coefficients of this leaf's local model, or `None` for internal nodes.
    pub fn coefficients(&self) -> Option<&'a [f64]> {
        match self.tree.nodes[self.index] {
            NodeEntry::Leaf { leaf, .. } => Some(self.tree.leaf_coefficients(leaf)),
            NodeEntry::Internal { .. } => None,
        }
    }

    /// Returns an iterator over the child nodes of this node, in child index order. Empty for
    /// leaves.
    pub fn children(&self) -> impl Iterator<Item = Node<'a>> + 'a {
        let (start, end) = match self.tree.nodes[self.index] {
            NodeEntry::Internal { first_child } => {
                (first_child, first_child + (1 << self.tree.dimension()))
            }
            NodeEntry::Leaf { .. } => (0, 0),
        };
        let tree = self.tree;
        let depth = self.depth + 1;
        (start..end).map(move |index| Node { tree, index, depth })
    }
}
