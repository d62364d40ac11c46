/// Magic bytes at the start of every serialized tree.
pub(crate) const MAGIC: [u8; 4] = *b"PTRE";

/// Serialization format version.
pub const VERSION: i32 = 1;

/// Size of the fixed part of the header, before the root box.
pub(crate) const HEADER_SIZE: usize = 40;

/// Largest supported number of dimensions.
pub const MAX_DIMENSION: usize = 5;

/// Largest supported polynomial order per axis.
pub const MAX_ORDER: usize = 32;

/// Largest supported tree depth.
pub const MAX_DEPTH: usize = 50;

/// Depth limit used when none is configured.
pub const DEFAULT_MAX_DEPTH: usize = 20;

/// Order used when none is configured.
pub const DEFAULT_ORDER: usize = 8;

/// Tolerance used when none is configured.
pub const DEFAULT_TOLERANCE: f64 = 1e-10;

/// A box is accepted only if its estimated error is within this fraction of the tolerance, to
/// cover deviations between test points.
pub const ACCEPTANCE_FACTOR: f64 = 0.5;

/// Function values at or below this magnitude are not used for relative error.
pub const NOISE_FLOOR: f64 = 1e-15;

/// Node tags in the serialized node table.
pub(crate) const TAG_INTERNAL: u8 = 0;
pub(crate) const TAG_LEAF: u8 = 1;
pub(crate) const TAG_UNCONVERGED_LEAF: u8 = 2;
