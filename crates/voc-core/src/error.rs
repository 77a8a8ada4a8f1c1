//! Error types for the streaming vocoder.

use thiserror::Error;

/// Construction-time error type.
///
/// The hot-path `synthesize` call is infallible by construction (see §7 of
/// the design doc) — every precondition checked here happens once, when a
/// [`crate::weights::WeightTable`] is validated against the compiled model
/// constants.
#[derive(Error, Debug)]
pub enum VocError {
    #[error("weight shape mismatch for {layer}: expected {expected}, got {got}")]
    WeightShapeMismatch {
        layer: String,
        expected: String,
        got: String,
    },

    #[error("sparse block index out of range for {layer}: block {block} >= {num_blocks}")]
    InvalidSparseIndex {
        layer: String,
        block: usize,
        num_blocks: usize,
    },

    #[error("normalization stats dimension mismatch: expected {expected}, got {got}")]
    StatsDimMismatch { expected: usize, got: usize },

    #[error("normalization stats std must be > 0 at index {index}, got {value}")]
    NonPositiveStd { index: usize, value: f32 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for vocoder construction.
pub type VocResult<T> = Result<T, VocError>;
