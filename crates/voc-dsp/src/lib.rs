//! Numeric kernels, activations, samplers, the mu-law table, and the PQMF
//! synthesis filterbank (§4.1, §4.4).

pub mod activations;
pub mod kernels;
pub mod mulaw;
pub mod pqmf;
pub mod sampling;

pub use kernels::{
    dual_fc_combine, fc_logits_fused, sgemv_accum, sgemv_accum_16, sgemv_accum_sparse,
    sgemv_accum_sparse_gate,
};
pub use mulaw::build_table as build_mu_law_table;
pub use pqmf::{build_synth_filter, clamp_output, scale_to_i16, Deemphasis, PqmfSynthesizer};
pub use sampling::{rng_from_seed, sample_from_pdf_mwdlp, sample_gauss, sample_laplace, sample_laplace_residual};
