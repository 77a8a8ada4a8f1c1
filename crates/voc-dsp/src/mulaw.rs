//! 10-bit mu-law dequantization table (§4.4, glossary).

use voc_core::constants::QUANTIZE;

/// Standard telephony mu-law companding parameter.
const MU: f32 = 255.0;

/// Decode a single 10-bit mu-law code to a signed float in `[-1, 1)`.
///
/// `sign(x) * ((1 + mu)^|x| - 1) / mu`, where `x` is the code mapped
/// linearly onto `[-1, 1]` first.
pub fn mu_law_decode(code: usize, quantize: usize) -> f32 {
    let x = 2.0 * (code as f32) / (quantize as f32 - 1.0) - 1.0;
    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    sign * ((1.0 + MU).powf(x.abs()) - 1.0) / MU
}

/// Build the full `QUANTIZE`-entry table once at startup (immutable after
/// load, per §5's resource policy).
pub fn build_table() -> Vec<f32> {
    (0..QUANTIZE).map(|code| mu_law_decode(code, QUANTIZE)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use voc_core::constants::{QUANTIZE, SQRT_QUANTIZE};

    #[test]
    fn table_round_trips_against_reference_formula() {
        let table = build_table();
        assert_eq!(table.len(), QUANTIZE);
        for coarse in 0..SQRT_QUANTIZE {
            for fine in 0..SQRT_QUANTIZE {
                let idx = coarse * SQRT_QUANTIZE + fine;
                let expected = mu_law_decode(idx, QUANTIZE);
                assert!((table[idx] - expected).abs() < 1e-7);
            }
        }
    }

    #[test]
    fn table_is_monotonic_and_bounded() {
        let table = build_table();
        for w in table.windows(2) {
            assert!(w[1] >= w[0]);
        }
        assert!(*table.first().unwrap() >= -1.0);
        assert!(*table.last().unwrap() < 1.0);
    }
}
