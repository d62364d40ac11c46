use crate::config::ErrorCriterion;
use crate::constants::VERSION;
use crate::error::AccuracyWarning;
use crate::geometry::BoxGeometry;
use crate::tree::traversal::Node;

/// One entry of the node table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NodeEntry {
    /// An internal node. Its `2^D` children are stored contiguously starting at `first_child`.
    Internal { first_child: usize },
    /// A leaf. Its coefficients are block `leaf` of the coefficient table.
    Leaf { leaf: usize, converged: bool },
}

/// Metadata describing an [`ApproxTree`].
#[derive(Debug, Clone, PartialEq)]
pub struct TreeMetadata {
    pub(crate) dimension: usize,
    pub(crate) order: usize,
    pub(crate) tolerance: f64,
    pub(crate) max_depth: usize,
    pub(crate) criterion: ErrorCriterion,
    pub(crate) num_nodes: usize,
    pub(crate) num_leaves: usize,
    pub(crate) num_unconverged: usize,
}

impl TreeMetadata {
    pub(crate) fn new(
        dimension: usize,
        order: usize,
        tolerance: f64,
        max_depth: usize,
        criterion: ErrorCriterion,
    ) -> Self {
        Self {
            dimension,
            order,
            tolerance,
            max_depth,
            criterion,
            num_nodes: 0,
            num_leaves: 0,
            num_unconverged: 0,
        }
    }

    /// The number of dimensions.
    pub fn dimension(&self) -> usize {
        self.dimension
    }
    /// The per-axis polynomial order.
    pub fn order(&self) -> usize {
        self.order
    }
    /// The serialization format version.
    pub fn version(&self) -> i32 {
        VERSION
    }
    /// The tolerance each leaf was tested against.
    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }
    /// The depth at which boxes were no longer split.
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }
    /// How leaf errors were compared against the tolerance.
    pub fn criterion(&self) -> ErrorCriterion {
        self.criterion
    }
    /// The total number of nodes, internal and leaf.
    pub fn num_nodes(&self) -> usize {
        self.num_nodes
    }
    /// The number of leaves.
    pub fn num_leaves(&self) -> usize {
        self.num_leaves
    }
    /// The number of leaves kept at the maximum depth without meeting the tolerance.
    pub fn num_unconverged(&self) -> usize {
        self.num_unconverged
    }
    /// The number of coefficients stored per leaf, `order^dimension`.
    pub fn coefficients_per_leaf(&self) -> usize {
        self.order.pow(self.dimension as u32)
    }
}

/// Summary statistics of a built tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeStats {
    /// The total number of nodes, internal and leaf.
    pub num_nodes: usize,
    /// The number of leaves.
    pub num_leaves: usize,
    /// The number of leaves that did not meet the tolerance.
    pub num_unconverged: usize,
    /// Depth of the deepest leaf; the root is at depth 0.
    pub max_leaf_depth: usize,
    /// Bytes held by the node, box and coefficient tables.
    pub memory_bytes: usize,
}

/// An immutable approximation tree stored as flat tables.
///
/// Node 0 is the root. Nodes are stored in breadth-first order, and the children of every
/// internal node are contiguous. Usually this is created via
/// [`TreeBuilder`][crate::tree::TreeBuilder] or restored with
/// [`ApproxTree::try_from_bytes`].
#[derive(Debug, Clone, PartialEq)]
pub struct ApproxTree {
    pub(crate) metadata: TreeMetadata,
    pub(crate) nodes: Vec<NodeEntry>,
    /// The center then half extent of every node, `2 * dimension` values per node. Boxes are
    /// pushed as soon as their parent is split, so this may run ahead of `nodes` while the
    /// tree is assembled.
    pub(crate) boxes: Vec<f64>,
    pub(crate) coefficients: Vec<f64>,
}

impl ApproxTree {
    /// An empty tree whose only box is `domain`. Nodes are then pushed in breadth-first order
    /// with [`ApproxTree::push_internal`] and [`ApproxTree::push_leaf`].
    pub(crate) fn with_domain(mut metadata: TreeMetadata, domain: &BoxGeometry) -> Self {
        debug_assert_eq!(domain.dimension(), metadata.dimension);
        metadata.num_nodes = 0;
        metadata.num_leaves = 0;
        metadata.num_unconverged = 0;

        let mut boxes = Vec::with_capacity(2 * metadata.dimension);
        boxes.extend_from_slice(domain.center());
        boxes.extend_from_slice(domain.half_extent());

        Self {
            metadata,
            nodes: vec![],
            boxes,
            coefficients: vec![],
        }
    }

    /// The number of boxes assigned so far, including those of nodes not yet pushed.
    pub(crate) fn num_boxes(&self) -> usize {
        self.boxes.len() / (2 * self.metadata.dimension)
    }

    /// Push the next node as an internal node, appending the boxes of its children.
    pub(crate) fn push_internal(&mut self) {
        let index = self.nodes.len();
        debug_assert!(index < self.num_boxes());

        let first_child = self.num_boxes();
        let geometry = self.node_geometry(index);
        for child in geometry.children() {
            self.boxes.extend_from_slice(child.center());
            self.boxes.extend_from_slice(child.half_extent());
        }
        self.nodes.push(NodeEntry::Internal { first_child });
        self.metadata.num_nodes += 1;
    }

    /// Push the next node as a leaf holding `coefficients`.
    pub(crate) fn push_leaf(&mut self, coefficients: &[f64], converged: bool) {
        debug_assert!(self.nodes.len() < self.num_boxes());
        debug_assert_eq!(coefficients.len(), self.metadata.coefficients_per_leaf());

        self.nodes.push(NodeEntry::Leaf {
            leaf: self.metadata.num_leaves,
            converged,
        });
        self.coefficients.extend_from_slice(coefficients);
        self.metadata.num_nodes += 1;
        self.metadata.num_leaves += 1;
        if !converged {
            self.metadata.num_unconverged += 1;
        }
    }

    /// Access the metadata describing this tree.
    pub fn metadata(&self) -> &TreeMetadata {
        &self.metadata
    }

    /// The number of dimensions.
    pub fn dimension(&self) -> usize {
        self.metadata.dimension
    }

    /// The per-axis polynomial order.
    pub fn order(&self) -> usize {
        self.metadata.order
    }

    /// The full domain covered by this tree.
    pub fn domain(&self) -> BoxGeometry {
        self.node_geometry(0)
    }

    /// Access the root node for manual traversal.
    pub fn root(&self) -> Node<'_> {
        Node::from_root(self)
    }

    #[inline]
    pub(crate) fn node_center(&self, index: usize) -> &[f64] {
        let d = self.metadata.dimension;
        &self.boxes[2 * d * index..2 * d * index + d]
    }

    #[inline]
    pub(crate) fn node_half_extent(&self, index: usize) -> &[f64] {
        let d = self.metadata.dimension;
        &self.boxes[2 * d * index + d..2 * d * (index + 1)]
    }

    pub(crate) fn node_geometry(&self, index: usize) -> BoxGeometry {
        BoxGeometry::new(self.node_center(index), self.node_half_extent(index))
    }

    #[inline]
    pub(crate) fn leaf_coefficients(&self, leaf: usize) -> &[f64] {
        let n = self.metadata.coefficients_per_leaf();
        &self.coefficients[leaf * n..(leaf + 1) * n]
    }

    /// Returns `true` if every leaf met the tolerance.
    pub fn is_converged(&self) -> bool {
        self.metadata.num_unconverged == 0
    }

    /// A warning describing leaves that hit the maximum depth without meeting the tolerance,
    /// or `None` if every leaf converged.
    pub fn accuracy_warning(&self) -> Option<AccuracyWarning> {
        if self.is_converged() {
            return None;
        }
        Some(AccuracyWarning {
            unconverged_leaves: self.metadata.num_unconverged,
            num_leaves: self.metadata.num_leaves,
            max_depth: self.metadata.max_depth,
            tolerance: self.metadata.tolerance,
        })
    }

    /// Compute summary statistics by walking the tree.
    pub fn stats(&self) -> TreeStats {
        let mut max_leaf_depth = 0;
        let mut stack = vec![self.root()];
        while let Some(node) = stack.pop() {
            if node.is_leaf() {
                max_leaf_depth = max_leaf_depth.max(node.depth());
            } else {
                stack.extend(node.children());
            }
        }

        let memory_bytes = self.nodes.len() * std::mem::size_of::<NodeEntry>()
            + (self.boxes.len() + self.coefficients.len()) * std::mem::size_of::<f64>();

        TreeStats {
            num_nodes: self.metadata.num_nodes,
            num_leaves: self.metadata.num_leaves,
            num_unconverged: self.metadata.num_unconverged,
            max_leaf_depth,
            memory_bytes,
        }
    }
}
