//! Weight-table data model (§3).
//!
//! A [`WeightTable`] is immutable after load: it owns every parameterized
//! layer's matrices, biases, activation tags, and (for sparse recurrents)
//! the explicit diagonal plus compressed block index. Byte layout of the
//! on-disk blob is a library-internal detail (§6) — this module only models
//! the logical shape, and a reimplementation is free to parse whatever blob
//! format its weight-export tool produces into these structs.

use crate::error::{VocError, VocResult};

/// Activation tag carried by a layer's weights. The *weight table* declares
/// which activation a layer uses; kernels never hard-code a choice (§9 open
/// question on encoder/decoder GRU activation).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Activation {
    Sigmoid,
    SigmoidExp,
    Tanh,
    TanhExp,
    TanhShrink,
    Relu,
    Linear,
    Softmax,
}

/// A row-major input-weight matrix with an explicit column stride, so a
/// matrix can be a sub-view of a larger contiguous buffer without copying
/// (used by the dual-FC head's per-band tiling).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Matrix {
    data: Vec<f32>,
    pub rows: usize,
    pub cols: usize,
    pub col_stride: usize,
}

impl Matrix {
    pub fn new(data: Vec<f32>, rows: usize, cols: usize, col_stride: usize) -> VocResult<Self> {
        let needed = cols * col_stride;
        if data.len() < needed {
            return Err(VocError::WeightShapeMismatch {
                layer: "matrix".into(),
                expected: format!(">= {needed} elements"),
                got: format!("{}", data.len()),
            });
        }
        Ok(Self {
            data,
            rows,
            cols,
            col_stride,
        })
    }

    /// Dense (no padding) constructor: `col_stride == rows`.
    pub fn dense(data: Vec<f32>, rows: usize, cols: usize) -> VocResult<Self> {
        if data.len() != rows * cols {
            return Err(VocError::WeightShapeMismatch {
                layer: "matrix".into(),
                expected: format!("{}", rows * cols),
                got: format!("{}", data.len()),
            });
        }
        Self::new(data, rows, cols, rows)
    }

    #[inline]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }
}

/// Dense/linear-dense layer weights: `rows` outputs, `cols` inputs.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct DenseWeights {
    pub weights: Matrix,
    pub bias: Vec<f32>,
    pub activation: Activation,
}

impl DenseWeights {
    pub fn new(weights: Matrix, bias: Vec<f32>, activation: Activation) -> VocResult<Self> {
        if bias.len() != weights.rows {
            return Err(VocError::WeightShapeMismatch {
                layer: "dense.bias".into(),
                expected: format!("{}", weights.rows),
                got: format!("{}", bias.len()),
            });
        }
        Ok(Self {
            weights,
            bias,
            activation,
        })
    }

    #[inline]
    pub fn out_dim(&self) -> usize {
        self.weights.rows
    }

    #[inline]
    pub fn in_dim(&self) -> usize {
        self.weights.cols
    }
}

/// Causal 1-D convolution weights: a flat `nb_neurons x (nb_inputs * kernel_size)`
/// matrix (§4.2 Conv1dLinear).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ConvWeights {
    pub weights: Matrix,
    pub bias: Vec<f32>,
    pub nb_inputs: usize,
    pub kernel_size: usize,
}

impl ConvWeights {
    pub fn new(
        weights: Matrix,
        bias: Vec<f32>,
        nb_inputs: usize,
        kernel_size: usize,
    ) -> VocResult<Self> {
        let expected_cols = nb_inputs * kernel_size;
        if weights.cols != expected_cols {
            return Err(VocError::WeightShapeMismatch {
                layer: "conv1d.weights".into(),
                expected: format!("{expected_cols} cols"),
                got: format!("{} cols", weights.cols),
            });
        }
        if bias.len() != weights.rows {
            return Err(VocError::WeightShapeMismatch {
                layer: "conv1d.bias".into(),
                expected: format!("{}", weights.rows),
                got: format!("{}", bias.len()),
            });
        }
        Ok(Self {
            weights,
            bias,
            nb_inputs,
            kernel_size,
        })
    }

    #[inline]
    pub fn nb_neurons(&self) -> usize {
        self.weights.rows
    }
}

/// Standard (dense-recurrent) GRU weights, keras `reset_after=True` layout:
/// gates packed `[z, r, h]` (§9 z/r-swap design note).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct GruWeights {
    pub recurrent_weights: Matrix,
    pub recurrent_bias: Vec<f32>,
    pub activation: Activation,
    pub hidden_size: usize,
}

impl GruWeights {
    pub fn new(
        recurrent_weights: Matrix,
        recurrent_bias: Vec<f32>,
        activation: Activation,
        hidden_size: usize,
    ) -> VocResult<Self> {
        let expected = 3 * hidden_size;
        if recurrent_weights.rows != expected || recurrent_weights.cols != hidden_size {
            return Err(VocError::WeightShapeMismatch {
                layer: "gru.recurrent_weights".into(),
                expected: format!("{expected} x {hidden_size}"),
                got: format!("{} x {}", recurrent_weights.rows, recurrent_weights.cols),
            });
        }
        if recurrent_bias.len() != expected {
            return Err(VocError::WeightShapeMismatch {
                layer: "gru.recurrent_bias".into(),
                expected: format!("{expected}"),
                got: format!("{}", recurrent_bias.len()),
            });
        }
        Ok(Self {
            recurrent_weights,
            recurrent_bias,
            activation,
            hidden_size,
        })
    }
}

/// Block-sparse frame-GRU weights: separate input/recurrent biases, an
/// explicit diagonal contribution per gate, and a compressed block index
/// describing which 16-row blocks of the recurrent matrix are stored.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SparseGruWeights {
    /// Recurrent matrix containing only the present 16-row blocks,
    /// concatenated in index order; `3 * hidden_size` rows total, sliced per
    /// gate by the caller.
    pub recurrent_weights: Matrix,
    pub recurrent_bias: Vec<f32>,
    /// Explicit diagonal, length `3 * hidden_size`.
    pub diagonal: Vec<f32>,
    /// Indices of the present 16-row blocks, one index stream per gate
    /// (length-3 outer vec, each inner vec is the block list for that gate).
    pub block_indices: Vec<Vec<usize>>,
    pub activation: Activation,
    pub hidden_size: usize,
}

impl SparseGruWeights {
    pub fn new(
        recurrent_weights: Matrix,
        recurrent_bias: Vec<f32>,
        diagonal: Vec<f32>,
        block_indices: Vec<Vec<usize>>,
        activation: Activation,
        hidden_size: usize,
    ) -> VocResult<Self> {
        if hidden_size % 16 != 0 {
            return Err(VocError::WeightShapeMismatch {
                layer: "sparse_gru.hidden_size".into(),
                expected: "multiple of 16".into(),
                got: format!("{hidden_size}"),
            });
        }
        let num_blocks = hidden_size / 16;
        if diagonal.len() != 3 * hidden_size {
            return Err(VocError::WeightShapeMismatch {
                layer: "sparse_gru.diagonal".into(),
                expected: format!("{}", 3 * hidden_size),
                got: format!("{}", diagonal.len()),
            });
        }
        if recurrent_bias.len() != 3 * hidden_size {
            return Err(VocError::WeightShapeMismatch {
                layer: "sparse_gru.recurrent_bias".into(),
                expected: format!("{}", 3 * hidden_size),
                got: format!("{}", recurrent_bias.len()),
            });
        }
        if block_indices.len() != 3 {
            return Err(VocError::WeightShapeMismatch {
                layer: "sparse_gru.block_indices".into(),
                expected: "3 gates".into(),
                got: format!("{}", block_indices.len()),
            });
        }
        for gate_blocks in &block_indices {
            for &b in gate_blocks {
                if b >= num_blocks {
                    return Err(VocError::InvalidSparseIndex {
                        layer: "sparse_gru".into(),
                        block: b,
                        num_blocks,
                    });
                }
            }
        }
        Ok(Self {
            recurrent_weights,
            recurrent_bias,
            diagonal,
            block_indices,
            activation,
            hidden_size,
        })
    }
}

/// Embedding table: `bands x codebook_size x hidden`, stored flat and
/// already multiplied by the target GRU's input weights (§9 — a precomputed
/// `codebook -> 3*hidden` projection; preserved so lookups are a pure
/// accumulate).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct EmbeddingTable {
    data: Vec<f32>,
    pub bands: usize,
    pub codebook_size: usize,
    pub hidden: usize,
}

impl EmbeddingTable {
    pub fn new(
        data: Vec<f32>,
        bands: usize,
        codebook_size: usize,
        hidden: usize,
    ) -> VocResult<Self> {
        let expected = bands * codebook_size * hidden;
        if data.len() != expected {
            return Err(VocError::WeightShapeMismatch {
                layer: "embedding".into(),
                expected: format!("{expected}"),
                got: format!("{}", data.len()),
            });
        }
        Ok(Self {
            data,
            bands,
            codebook_size,
            hidden,
        })
    }

    /// Contribution vector for `(band, code)`, length `hidden`.
    #[inline]
    pub fn lookup(&self, band: usize, code: usize) -> &[f32] {
        let start = (band * self.codebook_size + code) * self.hidden;
        &self.data[start..start + self.hidden]
    }
}

/// Dual-FC mixture head weights (§4.2 DualFCMwdlp10): two channels, each
/// producing `DLPC_ORDER` sign values, `DLPC_ORDER` magnitude values, and
/// `MID_OUT` mid-logit values per band, fused by per-band factors.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct DualFcWeights {
    /// Channel 1 and channel 2 dense projections, each
    /// `(2*DLPC_ORDER + MID_OUT)*bands` outputs from the shared hidden input.
    pub channel1: DenseWeights,
    pub channel2: DenseWeights,
    /// Per-band fusion factors, length `bands * (2*DLPC_ORDER + MID_OUT)` for
    /// each channel (§9 — per-band, not shared).
    pub fusion1: Vec<f32>,
    pub fusion2: Vec<f32>,
    /// Final FC mapping fused mid-logits (`MID_OUT` per band) to
    /// `SQRT_QUANTIZE` logits per band.
    pub logits_fc: DenseWeights,
    pub bands: usize,
}

/// All layers needed by the waveform generator (§4.4).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct VocoderWeights {
    pub input_conv: ConvWeights,
    pub input_dense: DenseWeights,
    pub gru_a_dense_feature: DenseWeights,
    pub gru_b_dense_feature: DenseWeights,
    pub gru_c_dense_feature: DenseWeights,
    pub gru_a: SparseGruWeights,
    pub gru_b: GruWeights,
    pub gru_c: GruWeights,
    pub gru_b_dense_state: DenseWeights,
    pub gru_c_dense_state: DenseWeights,
    pub embed_coarse: EmbeddingTable,
    pub embed_fine: EmbeddingTable,
    pub embed_coarse_for_fine: EmbeddingTable,
    pub coarse_head: DualFcWeights,
    pub fine_head: DualFcWeights,
    pub feature_norm: crate::stats::NormStats,
    pub pqmf_synth_filter: Vec<f32>,
}

/// All layers needed by the CycleVAE feature-conversion subgraph (§4.3).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ConverterWeights {
    pub enc_melsp_conv: ConvWeights,
    pub enc_excit_conv: ConvWeights,
    pub enc_melsp_gru: SparseGruWeights,
    pub enc_excit_gru: SparseGruWeights,
    pub enc_melsp_dense: DenseWeights,
    pub enc_excit_dense: DenseWeights,
    pub spk_gru: SparseGruWeights,
    pub spk_dense: DenseWeights,
    pub dec_excit_conv: ConvWeights,
    pub dec_excit_gru: SparseGruWeights,
    pub dec_excit_dense: DenseWeights,
    pub dec_melsp_conv: ConvWeights,
    pub dec_melsp_gru: SparseGruWeights,
    pub dec_melsp_dense: DenseWeights,
    pub post_conv: ConvWeights,
    pub post_gru: SparseGruWeights,
    pub post_dense: DenseWeights,
    pub melsp_stats: crate::stats::NormStats,
    pub uvf0_stats: crate::stats::NormStats,
    pub uvcap_stats: crate::stats::NormStats,
}

/// Top-level weight table for a full `synthesize_with_conversion` pipeline
/// (§3). Immutable after load; safe to share across streams behind an `Arc`.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct WeightTable {
    pub vocoder: VocoderWeights,
    pub converter: Option<ConverterWeights>,
}
