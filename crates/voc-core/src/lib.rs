//! Shared constants, configuration, and weight-table data model for the
//! streaming vocoder.
//!
//! This crate has no audio-processing logic of its own — it is the data
//! model that `voc-dsp`, `voc-nn`, and `voc-engine` are built against.

pub mod config;
pub mod constants;
pub mod error;
pub mod stats;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod weights;

pub use config::{ConverterConfig, VocoderConfig};
pub use error::{VocError, VocResult};
pub use stats::NormStats;
pub use weights::{
    Activation, ConvWeights, ConverterWeights, DenseWeights, DualFcWeights, EmbeddingTable,
    GruWeights, Matrix, SparseGruWeights, VocoderWeights, WeightTable,
};
