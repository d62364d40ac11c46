//! Construction parameters.

use crate::constants::{
    DEFAULT_MAX_DEPTH, DEFAULT_ORDER, DEFAULT_TOLERANCE, MAX_DEPTH, MAX_DIMENSION, MAX_ORDER,
};
use crate::error::{ApproxError, Result};
use crate::geometry::BoxGeometry;

/// How the error of a local model is compared against the tolerance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ErrorCriterion {
    /// Relative error, with an absolute fallback wherever the target is near zero.
    #[default]
    Relative,
    /// Absolute error everywhere.
    Absolute,
}

impl ErrorCriterion {
    pub(crate) fn to_code(self) -> u32 {
        match self {
            Self::Relative => 0,
            Self::Absolute => 1,
        }
    }

    pub(crate) fn from_code(code: u32) -> Result<Self> {
        match code {
            0 => Ok(Self::Relative),
            1 => Ok(Self::Absolute),
            c => Err(ApproxError::Format(format!("Unexpected error criterion {}.", c))),
        }
    }
}

/// Parameters describing the domain and accuracy of an approximation.
///
/// ```
/// use polytree::{BuildConfig, ErrorCriterion};
///
/// let config = BuildConfig::new(&[0.0, 0.0], &[1.0, 1.0])
///     .with_order(6)
///     .with_tolerance(1e-8)
///     .with_criterion(ErrorCriterion::Absolute);
/// assert!(config.validate().is_ok());
/// assert_eq!(config.dimension(), 2);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct BuildConfig {
    /// Center of the domain.
    pub center: Vec<f64>,
    /// Half the length of the domain in each dimension.
    pub half_extent: Vec<f64>,
    /// Number of Chebyshev nodes per axis in each box.
    pub order: usize,
    /// Maximum acceptable error of each leaf.
    pub tolerance: f64,
    /// Boxes at this depth are never split. The root is at depth 0.
    pub max_depth: usize,
    /// How errors are compared against `tolerance`.
    pub criterion: ErrorCriterion,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            center: vec![],
            half_extent: vec![],
            order: DEFAULT_ORDER,
            tolerance: DEFAULT_TOLERANCE,
            max_depth: DEFAULT_MAX_DEPTH,
            criterion: ErrorCriterion::default(),
        }
    }
}

impl BuildConfig {
    /// Create a config for the given domain with default order, tolerance and depth.
    pub fn new(center: &[f64], half_extent: &[f64]) -> Self {
        Self {
            center: center.to_vec(),
            half_extent: half_extent.to_vec(),
            ..Default::default()
        }
    }

    /// Set the polynomial order per axis.
    pub fn with_order(mut self, order: usize) -> Self {
        self.order = order;
        self
    }

    /// Set the error tolerance each leaf must meet.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Set the depth at which boxes are no longer split.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Set how leaf errors are compared against the tolerance.
    pub fn with_criterion(mut self, criterion: ErrorCriterion) -> Self {
        self.criterion = criterion;
        self
    }

    /// The number of dimensions of the domain.
    pub fn dimension(&self) -> usize {
        self.center.len()
    }

    /// The domain as a box.
    ///
    /// # Panics
    ///
    /// Panics if `center` and `half_extent` have different lengths, which
    /// [`BuildConfig::validate`] reports as an error.
    pub fn domain(&self) -> BoxGeometry {
        BoxGeometry::new(&self.center, &self.half_extent)
    }

    /// Check every parameter, returning [`ApproxError::Configuration`] on the first invalid
    /// one.
    pub fn validate(&self) -> Result<()> {
        let dimension = self.dimension();
        if !(1..=MAX_DIMENSION).contains(&dimension) {
            return Err(ApproxError::Configuration(format!(
                "Dimension must be between 1 and {}, got {}.",
                MAX_DIMENSION, dimension
            )));
        }
        if self.half_extent.len() != dimension {
            return Err(ApproxError::Configuration(format!(
                "Got {} half extents for a {}-dimensional center.",
                self.half_extent.len(),
                dimension
            )));
        }
        if let Some(c) = self.center.iter().find(|c| !c.is_finite()) {
            return Err(ApproxError::Configuration(format!(
                "Center must be finite, got {}.",
                c
            )));
        }
        if let Some(h) = self
            .half_extent
            .iter()
            .find(|h| !(h.is_finite() && **h > 0.0))
        {
            return Err(ApproxError::Configuration(format!(
                "Half extents must be positive and finite, got {}.",
                h
            )));
        }
        if !(1..=MAX_ORDER).contains(&self.order) {
            return Err(ApproxError::Configuration(format!(
                "Order must be between 1 and {}, got {}.",
                MAX_ORDER, self.order
            )));
        }
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(ApproxError::Configuration(format!(
                "Tolerance must be positive and finite, got {}.",
                self.tolerance
            )));
        }
        if self.max_depth > MAX_DEPTH {
            return Err(ApproxError::Configuration(format!(
                "Max depth must be at most {}, got {}.",
                MAX_DEPTH, self.max_depth
            )));
        }
        Ok(())
    }
}
