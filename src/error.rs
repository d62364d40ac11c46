use std::fmt::Debug;
use thiserror::Error;

/// Enum with all errors in this crate.
#[derive(Error, Debug)]
pub enum ApproxError {
    /// Invalid construction parameters (dimension, order, tolerance or domain).
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A serialized tree was malformed or incompatible with this version.
    #[error("Format error: {0}")]
    Format(String),

    /// Reading or writing persistent storage failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ApproxError>;

/// Non-fatal report that some leaves hit the maximum depth without meeting the tolerance.
///
/// The approximator is still usable, but accuracy in the affected regions is best-effort only.
#[derive(Error, Debug, Clone, PartialEq)]
#[error(
    "{unconverged_leaves} of {num_leaves} leaves reached max depth {max_depth} without meeting tolerance {tolerance:e}"
)]
pub struct AccuracyWarning {
    /// Number of leaves flagged as not meeting the tolerance.
    pub unconverged_leaves: usize,
    /// Total number of leaves in the tree.
    pub num_leaves: usize,
    /// The maximum depth the tree was allowed to reach.
    pub max_depth: usize,
    /// The tolerance the tree was built against.
    pub tolerance: f64,
}
