#![doc = include_str!("../README.md")]

mod approximator;
mod config;
pub mod constants;
mod error;
mod function;
pub mod geometry;
pub mod model;
pub mod tree;

pub use approximator::FunctionApproximator;
pub use config::{BuildConfig, ErrorCriterion};
pub use error::{AccuracyWarning, ApproxError, Result};
pub use function::{TargetFunction, WithData};
pub use geometry::BoxGeometry;

#[cfg(test)]
pub(crate) mod test;
