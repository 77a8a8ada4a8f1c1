//! Streaming vocoder and voice-conversion engines.
//!
//! This crate wires `voc-nn`'s layer primitives and `voc-dsp`'s kernels into
//! per-stream state (§4.4, §4.5) and exposes the two public driver types
//! (§6): [`VocoderEngine`] for vocoder-only streaming, and
//! [`ConversionEngine`] for the CycleVAE front-end plus vocoder pipeline.

mod driver;
mod state;

pub use driver::{ConversionEngine, VocoderEngine};
