use std::collections::VecDeque;

use log::{debug, trace, warn};
#[cfg(feature = "rayon")]
use rayon::iter::{IntoParallelIterator, ParallelIterator};

use crate::config::BuildConfig;
use crate::constants::ACCEPTANCE_FACTOR;
use crate::error::Result;
use crate::function::TargetFunction;
use crate::geometry::BoxGeometry;
use crate::model::ChebyshevBasis;
use crate::tree::index::{ApproxTree, TreeMetadata};

/// A builder to create an [`ApproxTree`].
///
/// ```
/// use polytree::tree::TreeBuilder;
/// use polytree::BuildConfig;
///
/// let config = BuildConfig::new(&[0.0], &[1.0]).with_order(8).with_tolerance(1e-12);
/// let builder = TreeBuilder::try_new(config).unwrap();
/// let tree = builder.finish(&|x: &[f64]| x[0].exp());
/// assert!(tree.is_converged());
/// assert!((tree.evaluate(&[0.5]) - 0.5f64.exp()).abs() < 1e-11);
/// ```
#[derive(Debug, Clone)]
pub struct TreeBuilder {
    config: BuildConfig,
    domain: BoxGeometry,
    basis: ChebyshevBasis,
}

/// The result of building one box, before flattening into an [`ApproxTree`].
enum Subtree {
    Leaf {
        coefficients: Vec<f64>,
        converged: bool,
    },
    Internal(Vec<Subtree>),
}

impl TreeBuilder {
    /// Validate `config` and precompute the basis shared by all boxes.
    pub fn try_new(config: BuildConfig) -> Result<Self> {
        config.validate()?;
        let domain = config.domain();
        let basis = ChebyshevBasis::new(config.dimension(), config.order);
        Ok(Self {
            config,
            domain,
            basis,
        })
    }

    /// Access the configuration of this builder.
    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// Access the basis used to fit each box.
    pub fn basis(&self) -> &ChebyshevBasis {
        &self.basis
    }

    /// Fit `func` over the domain, splitting boxes until each meets the tolerance or reaches
    /// the maximum depth.
    ///
    /// A box meets the tolerance when its error estimate on the test grid is within
    /// [`ACCEPTANCE_FACTOR`] times the tolerance.
    ///
    /// Leaves at the maximum depth that miss the tolerance are kept and flagged; see
    /// [`ApproxTree::accuracy_warning`].
    pub fn finish<F: TargetFunction>(&self, func: &F) -> ApproxTree {
        debug!(
            "Building {}-dimensional tree of order {} to tolerance {:e} (max depth {})",
            self.config.dimension(),
            self.config.order,
            self.config.tolerance,
            self.config.max_depth
        );

        let root = self.build_box(func, self.domain.clone(), 0);
        let tree = self.assemble(root);

        let metadata = tree.metadata();
        debug!(
            "Built tree with {} nodes and {} leaves",
            metadata.num_nodes(),
            metadata.num_leaves()
        );
        if let Some(warning) = tree.accuracy_warning() {
            warn!("{}", warning);
        }
        tree
    }

    fn build_box<F: TargetFunction>(
        &self,
        func: &F,
        geometry: BoxGeometry,
        depth: usize,
    ) -> Subtree {
        let coefficients = self.basis.fit(func, &geometry);
        let estimate = self.basis.estimate_error(&coefficients, &geometry, func);

        let threshold = ACCEPTANCE_FACTOR * self.config.tolerance;
        if estimate.satisfies(self.config.criterion, threshold) {
            return Subtree::Leaf {
                coefficients,
                converged: true,
            };
        }

        if depth >= self.config.max_depth {
            trace!(
                "Box at {:?} missed tolerance at max depth {}: {:?}",
                geometry.center(),
                depth,
                estimate
            );
            return Subtree::Leaf {
                coefficients,
                converged: false,
            };
        }

        trace!(
            "Splitting box at {:?} (depth {}): {:?}",
            geometry.center(),
            depth,
            estimate
        );
        Subtree::Internal(self.build_children(func, &geometry, depth + 1))
    }

    #[cfg(feature = "rayon")]
    fn build_children<F: TargetFunction>(
        &self,
        func: &F,
        geometry: &BoxGeometry,
        depth: usize,
    ) -> Vec<Subtree> {
        (0..geometry.num_children())
            .into_par_iter()
            .map(|i| self.build_box(func, geometry.child(i), depth))
            .collect()
    }

    #[cfg(not(feature = "rayon"))]
    fn build_children<F: TargetFunction>(
        &self,
        func: &F,
        geometry: &BoxGeometry,
        depth: usize,
    ) -> Vec<Subtree> {
        geometry
            .children()
            .map(|child| self.build_box(func, child, depth))
            .collect()
    }

    /// Flatten the built boxes breadth-first into node tables.
    fn assemble(&self, root: Subtree) -> ApproxTree {
        let metadata = TreeMetadata::new(
            self.config.dimension(),
            self.config.order,
            self.config.tolerance,
            self.config.max_depth,
            self.config.criterion,
        );
        let mut tree = ApproxTree::with_domain(metadata, &self.domain);

        let mut queue = VecDeque::from([root]);
        while let Some(subtree) = queue.pop_front() {
            match subtree {
                Subtree::Internal(children) => {
                    tree.push_internal();
                    queue.extend(children);
                }
                Subtree::Leaf {
                    coefficients,
                    converged,
                } => tree.push_leaf(&coefficients, converged),
            }
        }

        debug_assert_eq!(tree.nodes.len(), tree.num_boxes());
        tree
    }
}
