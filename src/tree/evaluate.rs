//! Point location and evaluation.

#[cfg(feature = "rayon")]
use rayon::prelude::*;

use crate::geometry::child_index;
use crate::model::evaluate_in_box;
use crate::tree::index::{ApproxTree, NodeEntry};

impl ApproxTree {
    /// Index of the leaf node whose box contains `point`.
    ///
    /// Each step picks the child from the sign of `point - center` along every axis, so points
    /// outside the domain land in the nearest boundary leaf.
    #[inline]
    pub(crate) fn locate(&self, point: &[f64]) -> usize {
        let mut index = 0;
        while let NodeEntry::Internal { first_child } = self.nodes[index] {
            index = first_child + child_index(self.node_center(index), point);
        }
        index
    }

    /// Evaluate the approximation at `point`.
    ///
    /// `point` must have [`ApproxTree::dimension`] coordinates. Points outside the domain are
    /// extrapolated from the nearest boundary leaf and carry no accuracy guarantee; use
    /// [`ApproxTree::try_evaluate`] to reject them instead.
    #[inline]
    pub fn evaluate(&self, point: &[f64]) -> f64 {
        debug_assert_eq!(point.len(), self.dimension());
        let index = self.locate(point);
        match self.nodes[index] {
            NodeEntry::Leaf { leaf, .. } => evaluate_in_box(
                self.leaf_coefficients(leaf),
                self.metadata.order,
                self.node_center(index),
                self.node_half_extent(index),
                point,
            ),
            NodeEntry::Internal { .. } => unreachable!("locate always ends at a leaf"),
        }
    }

    /// Evaluate the approximation at `point`, or return `None` if `point` has the wrong number
    /// of coordinates or lies outside the domain.
    pub fn try_evaluate(&self, point: &[f64]) -> Option<f64> {
        if point.len() != self.dimension() {
            return None;
        }
        let center = self.node_center(0);
        let half_extent = self.node_half_extent(0);
        let inside = point
            .iter()
            .zip(center.iter().zip(half_extent))
            .all(|(x, (c, h))| (x - c).abs() <= *h);
        inside.then(|| self.evaluate(point))
    }

    /// Evaluate many points stored interleaved, `dimension` coordinates per point.
    ///
    /// With the `rayon` feature enabled points are evaluated in parallel.
    pub fn evaluate_many(&self, points: &[f64]) -> Vec<f64> {
        let dimension = self.dimension();
        assert_eq!(
            points.len() % dimension,
            0,
            "Got {} coordinates, not a multiple of dimension {}.",
            points.len(),
            dimension
        );

        #[cfg(feature = "rayon")]
        {
            points
                .par_chunks_exact(dimension)
                .map(|point| self.evaluate(point))
                .collect()
        }

        #[cfg(not(feature = "rayon"))]
        {
            points
                .chunks_exact(dimension)
                .map(|point| self.evaluate(point))
                .collect()
        }
    }
}
