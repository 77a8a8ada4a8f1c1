//! Samplers (§4.1, §4.1.1).
//!
//! Every sampler takes an explicit RNG handle rather than reaching for a
//! process-wide global, so two engines seeded identically draw identical
//! sequences regardless of what else is running on the same thread or
//! process (§8 Determinism / State-isolation).

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::activations::softmax;

/// Construct a per-stream RNG from a `u64` seed (§4.1.1).
pub fn rng_from_seed(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}

/// Draw `u ~ U[0,1)`, guarded against exact 0 the same way the reference
/// guards against `RAND_MAX` landing on a boundary (a tiny epsilon keeps
/// downstream `log`/`cdf` comparisons in range; see §7.4 numeric edge
/// cases).
#[inline]
fn uniform01(rng: &mut ChaCha8Rng) -> f32 {
    let u: f32 = rng.gen();
    u + f32::MIN_POSITIVE
}

/// Sample a categorical index from raw logits: softmax, form the cumulative
/// distribution, draw `u`, and return the largest index `i>0` with
/// `cdf[i] <= u`, else 0 (§4.1).
///
/// `logits` is overwritten with the softmax probabilities as a side effect
/// (no extra allocation on the hot path).
pub fn sample_from_pdf_mwdlp(logits: &mut [f32], rng: &mut ChaCha8Rng) -> usize {
    softmax(logits, false);
    let u = uniform01(rng);
    let mut cdf = 0.0;
    let mut chosen = 0usize;
    for (i, &p) in logits.iter().enumerate() {
        cdf += p;
        if i > 0 && cdf <= u {
            chosen = i;
        }
    }
    chosen
}

/// Draw `r ~ U(-1,1)` and return `loc - sign(r) * scale * log(1 - |r|)`.
pub fn sample_laplace(loc: f32, scale: f32, rng: &mut ChaCha8Rng) -> f32 {
    let u: f32 = rng.gen();
    let r = 2.0 * u - 1.0;
    let sign = if r >= 0.0 { 1.0 } else { -1.0 };
    loc - sign * scale * (1.0 - r.abs()).max(f32::MIN_POSITIVE).ln()
}

/// Laplace-sample a whole vector in place: `loc` is overwritten with the
/// residual-added value (`loc[i] += sample_laplace(0, scale[i])`), matching
/// the post-net's "`melsp_cv <- melsp_cv + residual`" step (§4.3).
pub fn sample_laplace_residual(loc: &mut [f32], scale: &[f32], rng: &mut ChaCha8Rng) {
    for (l, &s) in loc.iter_mut().zip(scale.iter()) {
        *l += sample_laplace(0.0, s, rng);
    }
}

/// Box-Muller Gaussian sampler with a temperature factor applied to the
/// standard deviation before the draw is added to the mean (§4.1,
/// §9 open question — default `0.25`, exposed as configuration via
/// [`voc_core::VocoderConfig::gauss_temperature`]).
pub fn sample_gauss(mu: &mut [f32], std: &[f32], temperature: f32, rng: &mut ChaCha8Rng) {
    debug_assert_eq!(mu.len(), std.len());
    let n = mu.len();
    let mut i = 0;
    while i < n {
        let u1: f32 = uniform01(rng);
        let u2: f32 = rng.gen();
        let r = (-2.0 * u1.ln()).sqrt();
        let theta = 2.0 * std::f32::consts::PI * u2;
        let z0 = r * theta.cos();
        mu[i] += temperature * std[i] * z0;
        if i + 1 < n {
            let z1 = r * theta.sin();
            mu[i + 1] += temperature * std[i + 1] * z1;
        }
        i += 2;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categorical_is_deterministic_for_fixed_seed() {
        let logits = [0.1, 2.0, -0.5, 0.3];
        let mut rng_a = rng_from_seed(1);
        let mut rng_b = rng_from_seed(1);
        let mut a = logits;
        let mut b = logits;
        let ia = sample_from_pdf_mwdlp(&mut a, &mut rng_a);
        let ib = sample_from_pdf_mwdlp(&mut b, &mut rng_b);
        assert_eq!(ia, ib);
    }

    #[test]
    fn categorical_never_returns_out_of_range() {
        let mut rng = rng_from_seed(42);
        for _ in 0..256 {
            let mut logits = [0.2, -1.0, 3.0, 0.0, -0.2];
            let idx = sample_from_pdf_mwdlp(&mut logits, &mut rng);
            assert!(idx < 5);
        }
    }

    #[test]
    fn laplace_zero_scale_is_identity() {
        let mut rng = rng_from_seed(7);
        let v = sample_laplace(3.0, 0.0, &mut rng);
        assert!((v - 3.0).abs() < 1e-6);
    }
}
