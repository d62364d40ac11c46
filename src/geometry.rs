//! Axis-aligned boxes and their midpoint subdivision.

use crate::constants::MAX_DIMENSION;

/// An axis-aligned box described by its center and half extent in each dimension.
///
/// The box covers `[center[i] - half_extent[i], center[i] + half_extent[i]]` along axis `i`.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxGeometry {
    center: Vec<f64>,
    half_extent: Vec<f64>,
}

impl BoxGeometry {
    /// Create a new box.
    ///
    /// No validation beyond the length check is performed here; see
    /// [`BuildConfig::validate`][crate::BuildConfig::validate].
    ///
    /// # Panics
    ///
    /// Panics if `center` and `half_extent` have different lengths.
    pub fn new(center: &[f64], half_extent: &[f64]) -> Self {
        assert_eq!(
            center.len(),
            half_extent.len(),
            "center and half extent have different lengths"
        );
        Self {
            center: center.to_vec(),
            half_extent: half_extent.to_vec(),
        }
    }

    /// The number of dimensions of this box.
    pub fn dimension(&self) -> usize {
        self.center.len()
    }

    /// The center of this box.
    pub fn center(&self) -> &[f64] {
        &self.center
    }

    /// The half extent of this box in each dimension.
    pub fn half_extent(&self) -> &[f64] {
        &self.half_extent
    }

    /// Lower corner.
    pub fn min(&self) -> Vec<f64> {
        self.center
            .iter()
            .zip(&self.half_extent)
            .map(|(c, h)| c - h)
            .collect()
    }

    /// Upper corner.
    pub fn max(&self) -> Vec<f64> {
        self.center
            .iter()
            .zip(&self.half_extent)
            .map(|(c, h)| c + h)
            .collect()
    }

    /// The number of children produced by [`BoxGeometry::child`], `2^D`.
    #[inline]
    pub fn num_children(&self) -> usize {
        1 << self.dimension()
    }

    /// Returns `true` if the point lies inside this box, boundary included.
    pub fn contains(&self, point: &[f64]) -> bool {
        point.len() == self.dimension()
            && point
                .iter()
                .zip(self.center.iter().zip(&self.half_extent))
                .all(|(x, (c, h))| (x - c).abs() <= *h)
    }

    /// The child box at `index`, where bit `i` of `index` selects the upper half along axis
    /// `i`.
    pub fn child(&self, index: usize) -> Self {
        debug_assert!(index < self.num_children());
        let mut center = Vec::with_capacity(self.dimension());
        let mut half_extent = Vec::with_capacity(self.dimension());
        for (axis, (c, h)) in self.center.iter().zip(&self.half_extent).enumerate() {
            let quarter = 0.5 * h;
            if index & (1 << axis) != 0 {
                center.push(c + quarter);
            } else {
                center.push(c - quarter);
            }
            half_extent.push(quarter);
        }
        Self {
            center,
            half_extent,
        }
    }

    /// All `2^D` children of this box in index order.
    pub fn children(&self) -> impl Iterator<Item = BoxGeometry> + '_ {
        (0..self.num_children()).map(|i| self.child(i))
    }

    /// Map a point into this box's normalized frame, where the box spans `[-1, 1]` in every
    /// axis.
    #[inline]
    pub fn to_local(&self, point: &[f64], out: &mut [f64]) {
        to_local(&self.center, &self.half_extent, point, out)
    }

    /// Map a point from the normalized frame back into this box.
    #[inline]
    pub fn from_local(&self, local: &[f64], out: &mut [f64]) {
        for (i, x) in local.iter().enumerate() {
            out[i] = self.center[i] + self.half_extent[i] * x;
        }
    }
}

/// Index of the child of the box centered at `center` which contains `point`.
///
/// Points exactly on a splitting plane belong to the upper child.
#[inline]
pub(crate) fn child_index(center: &[f64], point: &[f64]) -> usize {
    debug_assert!(center.len() <= MAX_DIMENSION);
    let mut index = 0;
    for (axis, (c, x)) in center.iter().zip(point).enumerate() {
        if x >= c {
            index |= 1 << axis;
        }
    }
    index
}

#[inline]
pub(crate) fn to_local(center: &[f64], half_extent: &[f64], point: &[f64], out: &mut [f64]) {
    for i in 0..center.len() {
        out[i] = (point[i] - center[i]) / half_extent[i];
    }
}
