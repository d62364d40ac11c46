use std::fs;
use std::path::Path;

use log::debug;

use crate::config::BuildConfig;
use crate::error::{AccuracyWarning, Result};
use crate::function::TargetFunction;
use crate::tree::{ApproxTree, TreeBuilder, TreeHeader, TreeStats};

/// A fast approximation of a function over a box, built once and evaluated many times.
///
/// ```
/// use polytree::FunctionApproximator;
///
/// let scale = 1.5;
/// let func = move |x: &[f64]| scale * (x[0].cos() * x[1].sin()).exp();
/// let approx = FunctionApproximator::construct(&func, &[0.0, 0.0], &[1.0, 1.0], 8, 1e-10).unwrap();
///
/// let point: &[f64] = &[0.3, -0.7];
/// let rel_error = (approx.evaluate(point) / func(point) - 1.0).abs();
/// assert!(rel_error < 1e-9);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionApproximator {
    tree: ApproxTree,
}

impl FunctionApproximator {
    /// Fit `func` over the box with the given center and half extents.
    ///
    /// The dimension is the length of `center`. Returns
    /// [`ApproxError::Configuration`][crate::ApproxError::Configuration] if the dimension,
    /// order, tolerance or domain is out of range; no tree is built in that case.
    pub fn construct<F: TargetFunction>(
        func: &F,
        center: &[f64],
        half_extent: &[f64],
        order: usize,
        tolerance: f64,
    ) -> Result<Self> {
        let config = BuildConfig::new(center, half_extent)
            .with_order(order)
            .with_tolerance(tolerance);
        Self::with_config(func, config)
    }

    /// Fit `func` using every parameter of `config`.
    pub fn with_config<F: TargetFunction>(func: &F, config: BuildConfig) -> Result<Self> {
        let builder = TreeBuilder::try_new(config)?;
        Ok(Self {
            tree: builder.finish(func),
        })
    }

    /// Wrap an existing tree.
    pub fn from_tree(tree: ApproxTree) -> Self {
        Self { tree }
    }

    /// Access the underlying tree.
    pub fn tree(&self) -> &ApproxTree {
        &self.tree
    }

    /// Consume this approximator, returning the underlying tree.
    pub fn into_inner(self) -> ApproxTree {
        self.tree
    }

    /// The number of dimensions.
    pub fn dimension(&self) -> usize {
        self.tree.dimension()
    }

    /// The per-axis polynomial order.
    pub fn order(&self) -> usize {
        self.tree.order()
    }

    /// Evaluate the approximation at `point`. See [`ApproxTree::evaluate`].
    #[inline]
    pub fn evaluate(&self, point: &[f64]) -> f64 {
        self.tree.evaluate(point)
    }

    /// Evaluate at `point` if it lies inside the domain. See [`ApproxTree::try_evaluate`].
    pub fn try_evaluate(&self, point: &[f64]) -> Option<f64> {
        self.tree.try_evaluate(point)
    }

    /// Evaluate a batch of interleaved points. See [`ApproxTree::evaluate_many`].
    pub fn evaluate_many(&self, points: &[f64]) -> Vec<f64> {
        self.tree.evaluate_many(points)
    }

    /// Summary statistics of the underlying tree.
    pub fn stats(&self) -> TreeStats {
        self.tree.stats()
    }

    /// A warning if any leaf hit the maximum depth without meeting the tolerance.
    pub fn accuracy_warning(&self) -> Option<AccuracyWarning> {
        self.tree.accuracy_warning()
    }

    /// Serialize to a byte buffer.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.tree.to_bytes()
    }

    /// Restore from a byte buffer produced by [`FunctionApproximator::to_bytes`].
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Ok(Self {
            tree: ApproxTree::try_from_bytes(data)?,
        })
    }

    /// Write this approximator to `path`.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let buffer = self.to_bytes();
        fs::write(path, &buffer)?;
        debug!("Saved {} bytes to {}", buffer.len(), path.display());
        Ok(())
    }

    /// Read an approximator previously written with [`FunctionApproximator::save`].
    ///
    /// This always creates a new instance; an existing approximator is never overwritten in
    /// place.
    pub fn restore(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let buffer = fs::read(path)?;
        let approximator = Self::from_bytes(&buffer)?;
        debug!(
            "Restored {} leaves from {}",
            approximator.tree.metadata().num_leaves(),
            path.display()
        );
        Ok(approximator)
    }

    /// Like [`FunctionApproximator::restore`], but fail before parsing the tree unless it has
    /// the given dimension and order.
    pub fn restore_expecting(
        path: impl AsRef<Path>,
        dimension: usize,
        order: usize,
    ) -> Result<Self> {
        let buffer = fs::read(path)?;
        TreeHeader::try_new(&buffer)?.expect(dimension, order)?;
        Self::from_bytes(&buffer)
    }

    /// Free the tree now rather than at the end of scope.
    pub fn release(self) {
        drop(self)
    }
}
