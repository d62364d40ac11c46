//! Conversion between an [`ApproxTree`] and a flat byte buffer.
//!
//! The buffer starts with a fixed header so the dimension, order and version can be checked
//! before anything else is parsed:
//!
//! | offset | type | field |
//! |---|---|---|
//! | 0 | `[u8; 4]` | magic `PTRE` |
//! | 4 | `i32` | dimension |
//! | 8 | `i32` | order |
//! | 12 | `i32` | format version |
//! | 16 | `u32` | max depth |
//! | 20 | `u32` | error criterion |
//! | 24 | `u32` | number of nodes |
//! | 28 | `u32` | number of leaves |
//! | 32 | `f64` | tolerance |
//!
//! It is followed by the center and half extent of the domain (`f64`), one tag byte per node
//! in breadth-first order, padding to a multiple of 8 bytes, and finally the coefficients of
//! every leaf in leaf order. Child boxes are not stored: they are derived from the domain with
//! the same subdivision the builder used, which reproduces them exactly.

use std::fs::File;
use std::io::{ErrorKind, Read};
use std::mem::size_of;
use std::path::Path;

use bytemuck::{bytes_of, cast_slice, pod_read_unaligned, Pod};

use crate::config::{BuildConfig, ErrorCriterion};
use crate::constants::{
    HEADER_SIZE, MAGIC, MAX_DIMENSION, MAX_ORDER, TAG_INTERNAL, TAG_LEAF, TAG_UNCONVERGED_LEAF,
    VERSION,
};
use crate::error::{ApproxError, Result};
use crate::tree::index::{ApproxTree, NodeEntry, TreeMetadata};

/// The leading fields of a serialized tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeHeader {
    /// The number of dimensions.
    pub dimension: usize,
    /// The per-axis polynomial order.
    pub order: usize,
    /// The serialization format version.
    pub version: i32,
}

impl TreeHeader {
    /// Parse and validate the header at the start of `data`.
    pub fn try_new(data: &[u8]) -> Result<Self> {
        if data.len() < 16 {
            return Err(ApproxError::Format(format!(
                "Buffer of {} bytes is too short for a header.",
                data.len()
            )));
        }
        if data[0..4] != MAGIC {
            return Err(ApproxError::Format(
                "Data not in approximation tree format.".to_string(),
            ));
        }

        let version: i32 = read(data, 12);
        if version != VERSION {
            return Err(ApproxError::Format(format!(
                "Got v{} data when expected v{}.",
                version, VERSION
            )));
        }

        let dimension: i32 = read(data, 4);
        if !(1..=MAX_DIMENSION as i32).contains(&dimension) {
            return Err(ApproxError::Format(format!(
                "Unsupported dimension {}.",
                dimension
            )));
        }

        let order: i32 = read(data, 8);
        if !(1..=MAX_ORDER as i32).contains(&order) {
            return Err(ApproxError::Format(format!("Unsupported order {}.", order)));
        }

        Ok(Self {
            dimension: dimension as usize,
            order: order as usize,
            version,
        })
    }

    /// Check that this header describes a tree of the given dimension and order.
    pub fn expect(&self, dimension: usize, order: usize) -> Result<()> {
        if self.dimension != dimension || self.order != order {
            return Err(ApproxError::Format(format!(
                "Got tree of dimension {} and order {} when expected dimension {} and order {}.",
                self.dimension, self.order, dimension, order
            )));
        }
        Ok(())
    }
}

/// Read only the header of a serialized tree stored at `path`.
pub fn read_header(path: impl AsRef<Path>) -> Result<TreeHeader> {
    let mut buf = [0u8; 16];
    let mut file = File::open(path)?;
    file.read_exact(&mut buf).map_err(|err| match err.kind() {
        ErrorKind::UnexpectedEof => {
            ApproxError::Format("File is too short for a header.".to_string())
        }
        _ => ApproxError::Io(err),
    })?;
    TreeHeader::try_new(&buf)
}

#[inline]
fn read<T: Pod>(data: &[u8], offset: usize) -> T {
    pod_read_unaligned(&data[offset..offset + size_of::<T>()])
}

/// Copy a byte slice of native-endian `f64`s, which may be unaligned.
fn read_f64s(data: &[u8]) -> Vec<f64> {
    data.chunks_exact(size_of::<f64>())
        .map(pod_read_unaligned::<f64>)
        .collect()
}

#[inline]
fn write<T: Pod>(buf: &mut Vec<u8>, value: T) {
    buf.extend_from_slice(bytes_of(&value));
}

/// Padding after the node tags so that coefficients start on an 8-byte boundary.
#[inline]
fn tag_padding(num_nodes: usize) -> usize {
    (8 - (num_nodes % 8)) % 8
}

impl ApproxTree {
    /// The number of bytes [`ApproxTree::to_bytes`] produces.
    pub fn byte_length(&self) -> usize {
        let dimension = self.metadata.dimension;
        let num_nodes = self.nodes.len();
        HEADER_SIZE
            + 2 * dimension * size_of::<f64>()
            + num_nodes
            + tag_padding(num_nodes)
            + self.coefficients.len() * size_of::<f64>()
    }

    /// Serialize this tree to a byte buffer.
    pub fn to_bytes(&self) -> Vec<u8> {
        let metadata = &self.metadata;
        let mut buf = Vec::with_capacity(self.byte_length());

        buf.extend_from_slice(&MAGIC);
        write(&mut buf, metadata.dimension as i32);
        write(&mut buf, metadata.order as i32);
        write(&mut buf, VERSION);
        write(&mut buf, metadata.max_depth as u32);
        write(&mut buf, metadata.criterion.to_code());
        write(&mut buf, self.nodes.len() as u32);
        write(&mut buf, metadata.num_leaves as u32);
        write(&mut buf, metadata.tolerance);
        debug_assert_eq!(buf.len(), HEADER_SIZE);

        buf.extend_from_slice(cast_slice(self.node_center(0)));
        buf.extend_from_slice(cast_slice(self.node_half_extent(0)));

        buf.extend(self.nodes.iter().map(|node| match node {
            NodeEntry::Internal { .. } => TAG_INTERNAL,
            NodeEntry::Leaf {
                converged: true, ..
            } => TAG_LEAF,
            NodeEntry::Leaf {
                converged: false, ..
            } => TAG_UNCONVERGED_LEAF,
        }));
        buf.resize(buf.len() + tag_padding(self.nodes.len()), 0);

        buf.extend_from_slice(cast_slice(&self.coefficients));
        debug_assert_eq!(buf.len(), self.byte_length());
        buf
    }

    /// Restore a tree from a buffer produced by [`ApproxTree::to_bytes`].
    ///
    /// Every length and tag is validated; a malformed buffer returns
    /// [`ApproxError::Format`] and never panics.
    pub fn try_from_bytes(data: &[u8]) -> Result<Self> {
        let header = TreeHeader::try_new(data)?;
        if data.len() < HEADER_SIZE {
            return Err(truncated(data.len(), HEADER_SIZE));
        }

        let dimension = header.dimension;
        let order = header.order;
        let max_depth = read::<u32>(data, 16) as usize;
        let criterion = ErrorCriterion::from_code(read(data, 20))?;
        let num_nodes: u32 = read(data, 24);
        let num_leaves: u32 = read(data, 28);
        let tolerance: f64 = read(data, 32);
        let num_nodes = num_nodes as usize;
        let num_leaves = num_leaves as usize;

        let domain_end = HEADER_SIZE + 2 * dimension * size_of::<f64>();
        if data.len() < domain_end {
            return Err(truncated(data.len(), domain_end));
        }
        let domain = read_f64s(&data[HEADER_SIZE..domain_end]);
        let (center, half_extent) = domain.split_at(dimension);

        let config = BuildConfig::new(center, half_extent)
            .with_order(order)
            .with_tolerance(tolerance)
            .with_max_depth(max_depth)
            .with_criterion(criterion);
        config
            .validate()
            .map_err(|err| ApproxError::Format(format!("Invalid tree parameters. {}", err)))?;

        let metadata = TreeMetadata::new(
            dimension,
            order,
            tolerance,
            max_depth,
            criterion,
        );
        let coefficients_per_leaf = metadata.coefficients_per_leaf();

        let tags_end = domain_end + num_nodes;
        let coefficients_start = tags_end + tag_padding(num_nodes);
        let expected_length = num_leaves
            .checked_mul(coefficients_per_leaf)
            .and_then(|n| n.checked_mul(size_of::<f64>()))
            .and_then(|n| n.checked_add(coefficients_start))
            .ok_or_else(|| ApproxError::Format("Leaf count is too large.".to_string()))?;
        if data.len() != expected_length {
            return Err(ApproxError::Format(format!(
                "Incorrect buffer length. Expected {} got {}.",
                expected_length,
                data.len()
            )));
        }
        if num_nodes == 0 {
            return Err(ApproxError::Format("Tree has no nodes.".to_string()));
        }

        let tags = &data[domain_end..tags_end];
        let coefficients = read_f64s(&data[coefficients_start..]);

        let mut tree = ApproxTree::with_domain(metadata, &config.domain());
        // Depth of every box assigned so far
        let mut depths = vec![0usize];
        for (index, tag) in tags.iter().enumerate() {
            if index >= tree.num_boxes() {
                return Err(ApproxError::Format(format!(
                    "Node {} has no parent.",
                    index
                )));
            }
            let leaf = tree.metadata.num_leaves;
            let depth = depths[index];
            match *tag {
                TAG_INTERNAL => {
                    if depth >= max_depth {
                        return Err(ApproxError::Format(format!(
                            "Internal node {} at depth {} exceeds max depth {}.",
                            index, depth, max_depth
                        )));
                    }
                    if tree.num_boxes() + (1 << dimension) > num_nodes {
                        return Err(ApproxError::Format(format!(
                            "Children of node {} exceed the {} nodes in the tree.",
                            index, num_nodes
                        )));
                    }
                    tree.push_internal();
                    depths.resize(tree.num_boxes(), depth + 1);
                }
                TAG_LEAF | TAG_UNCONVERGED_LEAF => {
                    if *tag == TAG_UNCONVERGED_LEAF && depth != max_depth {
                        return Err(ApproxError::Format(format!(
                            "Unconverged leaf {} at depth {} is above max depth {}.",
                            index, depth, max_depth
                        )));
                    }
                    if leaf >= num_leaves {
                        return Err(ApproxError::Format(format!(
                            "Found more than the {} leaves in the header.",
                            num_leaves
                        )));
                    }
                    let block =
                        &coefficients[leaf * coefficients_per_leaf..(leaf + 1) * coefficients_per_leaf];
                    tree.push_leaf(block, *tag == TAG_LEAF);
                }
                t => {
                    return Err(ApproxError::Format(format!(
                        "Unexpected node tag {} at node {}.",
                        t, index
                    )))
                }
            }
        }

        if tree.num_boxes() != num_nodes || tree.metadata.num_leaves != num_leaves {
            return Err(ApproxError::Format(format!(
                "Node table describes {} nodes and {} leaves, header has {} and {}.",
                tree.num_boxes(),
                tree.metadata.num_leaves,
                num_nodes,
                num_leaves
            )));
        }

        Ok(tree)
    }
}

fn truncated(got: usize, expected: usize) -> ApproxError {
    ApproxError::Format(format!(
        "Buffer truncated. Expected at least {} bytes got {}.",
        expected, got
    ))
}
