//! An adaptive `2^D`-ary tree of boxes, each leaf holding a local Chebyshev model.

#![warn(missing_docs)]

mod builder;
mod evaluate;
mod index;
mod serialize;
pub mod traversal;

pub use builder::TreeBuilder;
pub use index::{ApproxTree, TreeMetadata, TreeStats};
pub use serialize::{read_header, TreeHeader};
pub use traversal::Node;
