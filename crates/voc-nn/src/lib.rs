//! Layer primitives (§4.2) and the CycleVAE feature-conversion subgraph
//! (§4.3) for the streaming vocoder.

pub mod conv1d;
pub mod convert;
pub mod dense;
pub mod embedding;
pub mod gru;
pub mod mixture_head;
pub mod sparse_gru;

pub use conv1d::CausalConv1d;
pub use convert::{ConvertedFrame, ConverterNet};
pub use dense::Dense;
pub use embedding::Embedding;
pub use gru::Gru;
pub use mixture_head::DualFcMixtureHead;
pub use sparse_gru::SparseFrameGru;
