//! Matrix-vector accumulation kernels (§4.1).
//!
//! All variants accumulate into `out` (`out[i] += ...`) rather than
//! overwrite it, so a caller can chain several projections (e.g. GRU input +
//! embedding contributions) into one preactivation buffer without an
//! intermediate allocation, matching §5's "no allocation on the hot path"
//! resource policy.

use voc_core::Matrix;

/// `out[i] += sum_j W[j*col_stride + i] * x[j]`, for `i in 0..rows`,
/// `j in 0..cols`. This is the general dense mat-vec accumulate; the 16-row
/// tiled and block-sparse variants below are specializations of the same
/// access pattern.
#[inline]
pub fn sgemv_accum(out: &mut [f32], w: &Matrix, x: &[f32]) {
    debug_assert_eq!(out.len(), w.rows);
    debug_assert_eq!(x.len(), w.cols);
    let data = w.as_slice();
    let stride = w.col_stride;
    for j in 0..w.cols {
        let xj = x[j];
        if xj == 0.0 {
            continue;
        }
        let col = &data[j * stride..j * stride + w.rows];
        for i in 0..w.rows {
            out[i] += col[i] * xj;
        }
    }
}

/// 16-row tiled variant, used when `rows` is a multiple of 16. Functionally
/// identical to [`sgemv_accum`]; kept distinct so callers that know the
/// alignment holds (every sparse-GRU gate) can express that precondition in
/// the type of call they make, and so a SIMD backend has an obvious place to
/// specialize without touching the general path.
#[inline]
pub fn sgemv_accum_16(out: &mut [f32], w: &Matrix, x: &[f32]) {
    debug_assert_eq!(w.rows % 16, 0);
    sgemv_accum(out, w, x);
}

/// Block-sparse 16-wide mat-vec accumulate: `w` contains only the present
/// 16-row blocks, concatenated in the order given by `block_indices`; `x` is
/// the full (dense) input vector of length `full_rows`.
///
/// `w.rows` must equal `block_indices.len() * 16`; `w.cols == x.len()`.
#[inline]
pub fn sgemv_accum_sparse(
    out: &mut [f32],
    w: &Matrix,
    x: &[f32],
    block_indices: &[usize],
    full_rows: usize,
) {
    debug_assert_eq!(w.rows, block_indices.len() * 16);
    debug_assert_eq!(w.cols, x.len());
    let data = w.as_slice();
    let stride = w.col_stride;
    for j in 0..w.cols {
        let xj = x[j];
        if xj == 0.0 {
            continue;
        }
        let col = &data[j * stride..j * stride + w.rows];
        for (block_idx, &block) in block_indices.iter().enumerate() {
            let dst_start = block * 16;
            if dst_start + 16 > full_rows {
                continue;
            }
            let src_start = block_idx * 16;
            for k in 0..16 {
                out[dst_start + k] += col[src_start + k] * xj;
            }
        }
    }
}

/// Gate-sliced block-sparse accumulate: like [`sgemv_accum_sparse`], but the
/// present blocks for this gate start at `row_start` inside a larger matrix
/// shared across all three gates (the sparse frame-GRU's concatenated
/// recurrent matrix, §4.2).
#[inline]
pub fn sgemv_accum_sparse_gate(
    out: &mut [f32],
    w: &Matrix,
    x: &[f32],
    block_indices: &[usize],
    row_start: usize,
    full_rows: usize,
) {
    debug_assert_eq!(w.cols, x.len());
    debug_assert!(row_start + block_indices.len() * 16 <= w.rows);
    let data = w.as_slice();
    let stride = w.col_stride;
    for j in 0..w.cols {
        let xj = x[j];
        if xj == 0.0 {
            continue;
        }
        let col = &data[j * stride..j * stride + w.rows];
        for (i, &block) in block_indices.iter().enumerate() {
            let dst_start = block * 16;
            if dst_start + 16 > full_rows {
                continue;
            }
            let src_start = row_start + i * 16;
            for k in 0..16 {
                out[dst_start + k] += col[src_start + k] * xj;
            }
        }
    }
}

/// Dual-FC combine: `out[i] = w[i]*x[i] + w[i+stride]*x[i+stride]`, the
/// element-wise weighted sum that fuses the dual-FC head's two channels
/// (§4.1, §4.2 DualFCMwdlp10).
#[inline]
pub fn dual_fc_combine(out: &mut [f32], w1: &[f32], x1: &[f32], w2: &[f32], x2: &[f32]) {
    debug_assert_eq!(out.len(), x1.len());
    debug_assert_eq!(out.len(), x2.len());
    for i in 0..out.len() {
        out[i] = w1[i] * x1[i] + w2[i] * x2[i];
    }
}

/// Fused "fc-logits" variant: multiplies a per-band hidden block against a
/// shared logits matrix tiled over bands, producing `bands * out_per_band`
/// logits from `bands * in_per_band` hidden values.
#[inline]
pub fn fc_logits_fused(
    out: &mut [f32],
    shared: &Matrix,
    bias: &[f32],
    x: &[f32],
    bands: usize,
    in_per_band: usize,
    out_per_band: usize,
) {
    debug_assert_eq!(shared.rows, out_per_band);
    debug_assert_eq!(shared.cols, in_per_band);
    debug_assert_eq!(x.len(), bands * in_per_band);
    debug_assert_eq!(out.len(), bands * out_per_band);
    for band in 0..bands {
        let x_band = &x[band * in_per_band..(band + 1) * in_per_band];
        let out_band = &mut out[band * out_per_band..(band + 1) * out_per_band];
        out_band.copy_from_slice(bias);
        sgemv_accum(out_band, shared, x_band);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dense_matches_hand_computation() {
        // W is 2x3, row-major cols-of-length-rows layout (col_stride = rows)
        let w = Matrix::dense(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 2, 3).unwrap();
        let x = [1.0, 1.0, 1.0];
        let mut out = [0.0; 2];
        sgemv_accum(&mut out, &w, &x);
        // out[0] = col0[0] + col1[0] + col2[0] = 1 + 3 + 5 = 9
        // out[1] = col0[1] + col1[1] + col2[1] = 2 + 4 + 6 = 12
        assert_eq!(out, [9.0, 12.0]);
    }

    #[test]
    fn sparse_matches_dense_when_fully_populated() {
        let rows = 32;
        let cols = 4;
        let data: Vec<f32> = (0..rows * cols).map(|i| i as f32 * 0.01).collect();
        let dense = Matrix::dense(data.clone(), rows, cols).unwrap();
        let x = [0.5, -0.25, 1.0, 2.0];

        let mut dense_out = vec![0.0; rows];
        sgemv_accum(&mut dense_out, &dense, &x);

        // Same data, but presented as two fully-present 16-row blocks.
        let sparse = Matrix::dense(data, rows, cols).unwrap();
        let mut sparse_out = vec![0.0; rows];
        sgemv_accum_sparse(&mut sparse_out, &sparse, &x, &[0, 1], rows);

        for (a, b) in dense_out.iter().zip(sparse_out.iter()) {
            assert!((a - b).abs() < 1e-5);
        }
    }

    #[test]
    fn sparse_gate_matches_plain_sparse_at_zero_offset() {
        let rows = 32;
        let cols = 4;
        let data: Vec<f32> = (0..rows * cols).map(|i| i as f32 * 0.01).collect();
        let w = Matrix::dense(data, rows, cols).unwrap();
        let x = [0.5, -0.25, 1.0, 2.0];

        let mut plain_out = vec![0.0; rows];
        sgemv_accum_sparse(&mut plain_out, &w, &x, &[0, 1], rows);

        let mut gate_out = vec![0.0; rows];
        sgemv_accum_sparse_gate(&mut gate_out, &w, &x, &[0, 1], 0, rows);

        for (a, b) in plain_out.iter().zip(gate_out.iter()) {
            assert!((a - b).abs() < 1e-5);
        }
    }
}
