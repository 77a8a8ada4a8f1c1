//! PQMF synthesis filterbank, de-emphasis, and output scaling (§4.4, §4.4.1).

use voc_core::constants::{CLAMP_MAX, CLAMP_MIN, N_BANDS, PQMF_ORDER, PQMF_TAPS, PREEMPH};

/// Stopband-attenuation shape parameter for the Kaiser window, chosen for the
/// usual ~100dB PQMF design target (§4.4.1).
const KAISER_BETA: f64 = 9.0;

/// Zeroth-order modified Bessel function of the first kind, via its power
/// series. Twenty-four terms is comfortably enough for `beta` in the single
/// digits.
fn bessel_i0(x: f64) -> f64 {
    let half_x = x / 2.0;
    let mut term = 1.0;
    let mut sum = 1.0;
    for k in 1..=24 {
        term *= half_x / k as f64;
        let t = term * term;
        sum += t;
    }
    sum
}

fn kaiser_window(n: usize, len: usize, beta: f64) -> f64 {
    let m = (len - 1) as f64;
    let x = 2.0 * n as f64 / m - 1.0;
    bessel_i0(beta * (1.0 - x * x).max(0.0).sqrt()) / bessel_i0(beta)
}

/// Build the length-`PQMF_TAPS` synthesis prototype: a Kaiser-windowed-sinc
/// lowpass, cosine-modulated per sub-band and summed into one combined tap
/// sequence (§4.4.1). Computed once at construction time; the result never
/// changes at runtime.
pub fn build_synth_filter() -> Vec<f32> {
    let taps = PQMF_TAPS;
    let center = (taps - 1) as f64 / 2.0;
    let cutoff = std::f64::consts::PI / (2.0 * N_BANDS as f64);

    let mut prototype = vec![0.0f64; taps];
    for (n, slot) in prototype.iter_mut().enumerate() {
        let m = n as f64 - center;
        let sinc = if m.abs() < 1e-9 {
            cutoff / std::f64::consts::PI
        } else {
            (cutoff * m).sin() / (std::f64::consts::PI * m)
        };
        *slot = sinc * kaiser_window(n, taps, KAISER_BETA);
    }

    let mut filter = vec![0.0f64; taps];
    for k in 0..N_BANDS {
        let sign = if k % 2 == 0 { 1.0 } else { -1.0 };
        for n in 0..taps {
            let m = n as f64 - center;
            let angle = (2 * k + 1) as f64 * std::f64::consts::PI / (2.0 * N_BANDS as f64) * m
                + sign * std::f64::consts::PI / 4.0;
            filter[n] += prototype[n] * angle.cos();
        }
    }

    let norm = N_BANDS as f64;
    filter.into_iter().map(|v| (v / norm) as f32).collect()
}

/// Sanity check on a loaded (or freshly derived) synthesis filter: the tap
/// count must match the `(PQMF_ORDER + 1) * N_BANDS` layout §4.4 assumes.
pub fn expected_tap_count() -> usize {
    (PQMF_ORDER + 1) * N_BANDS
}

/// Shared ring-buffer synthesis state (§4.4's "PQMF ring update"). One ring
/// holds every band's recent history; each sample-step pushes the `N_BANDS`
/// newly generated sub-band samples in at once and reads `N_BANDS` wideband
/// outputs back out of the same ring, rather than running one independent
/// sliding FIR per band.
///
/// Each incoming sample is replicated across its `N_BANDS` polyphase slots
/// before being appended, so the ring holds `N_BANDS * N_BANDS` fresh entries
/// per step; the oldest `N_BANDS * N_BANDS` entries are dropped in the same
/// motion (a shift-left by `N_BANDS * N_BANDS`, matching the reference's
/// block move/copy per band-step). Output `j` is `Σ_k filter[k] *
/// ring[j*N_BANDS + k]`, so the ring must hold at least
/// `(N_BANDS - 1) * N_BANDS + taps` entries for the highest `j` to stay in
/// bounds.
pub struct PqmfSynthesizer {
    filter: Vec<f32>,
    ring: Vec<f32>,
}

impl PqmfSynthesizer {
    pub fn new(filter: Vec<f32>) -> Self {
        let taps = filter.len();
        let ring_len = taps + N_BANDS * (N_BANDS - 1);
        Self { filter, ring: vec![0.0; ring_len] }
    }

    pub fn taps(&self) -> usize {
        self.filter.len()
    }

    fn dot(&self, window: &[f32]) -> f32 {
        debug_assert_eq!(window.len(), self.filter.len());
        self.filter.iter().zip(window.iter()).map(|(a, b)| a * b).sum()
    }

    /// Push one sample-step's `N_BANDS` newly generated sub-band samples
    /// into the shared ring and synthesize the `N_BANDS` wideband samples
    /// they produce, pre-clamp and pre-de-emphasis.
    pub fn step(&mut self, band_samples: &[f32; N_BANDS]) -> [f32; N_BANDS] {
        let block = N_BANDS * N_BANDS;
        self.ring.rotate_left(block);
        let tail = self.ring.len() - block;
        for (band, &sample) in band_samples.iter().enumerate() {
            for phase in 0..N_BANDS {
                self.ring[tail + band * N_BANDS + phase] = sample;
            }
        }

        let taps = self.filter.len();
        let mut out = [0.0f32; N_BANDS];
        for (j, slot) in out.iter_mut().enumerate() {
            let window = &self.ring[j * N_BANDS..j * N_BANDS + taps];
            *slot = self.dot(window);
        }
        out
    }

    /// Snapshot the most recent `taps` ring entries, for the startup and
    /// flush bursts below.
    pub fn snapshot(&self) -> Vec<f32> {
        let taps = self.filter.len();
        self.ring[self.ring.len() - taps..].to_vec()
    }

    /// Startup burst (§4.4): synthesize `n_out` samples from a zero-pad-left
    /// copy of the ring, without disturbing the live ring used by
    /// steady-state [`Self::step`] calls.
    pub fn synth_zero_pad_left(&self, n_out: usize) -> Vec<f32> {
        let taps = self.filter.len();
        let mut padded = vec![0.0f32; n_out.saturating_sub(1) + taps];
        let ring = self.snapshot();
        padded[n_out.saturating_sub(1)..].copy_from_slice(&ring);
        (0..n_out).map(|i| self.dot(&padded[i..i + taps])).collect()
    }

    /// Flush burst (§4.4): synthesize `n_out` samples from a zero-pad-right
    /// copy of the ring, draining the filter's remaining context.
    pub fn synth_zero_pad_right(&self, n_out: usize) -> Vec<f32> {
        let taps = self.filter.len();
        let mut padded = vec![0.0f32; taps + n_out.saturating_sub(1)];
        let ring = self.snapshot();
        padded[..taps].copy_from_slice(&ring);
        (0..n_out).map(|i| self.dot(&padded[i..i + taps])).collect()
    }
}

/// Clamp to the reference's output interval (§4.4).
#[inline]
pub fn clamp_output(x: f32) -> f32 {
    x.clamp(CLAMP_MIN, CLAMP_MAX)
}

/// First-order de-emphasis accumulator (`PREEMPH` feedback coefficient),
/// applied once per synthesized sample between the two output clamps.
#[derive(Debug, Clone, Copy, Default)]
pub struct Deemphasis {
    mem: f32,
}

impl Deemphasis {
    pub fn new() -> Self {
        Self { mem: 0.0 }
    }

    /// `x <- clamp(x); x <- x + PREEMPH * mem; mem <- x; x <- clamp(x)`.
    pub fn apply(&mut self, x: f32) -> f32 {
        let x = clamp_output(x);
        let x = x + PREEMPH * self.mem;
        self.mem = x;
        clamp_output(x)
    }
}

/// Scale a clamped float sample to 16-bit PCM (§4.4: `round(x * 32768)`).
#[inline]
pub fn scale_to_i16(x: f32) -> i16 {
    (x * 32768.0).round().clamp(i16::MIN as f32, i16::MAX as f32) as i16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_has_expected_tap_count() {
        let filter = build_synth_filter();
        assert_eq!(filter.len(), expected_tap_count());
        assert_eq!(filter.len(), PQMF_TAPS);
    }

    #[test]
    fn filter_is_finite_and_not_degenerate() {
        let filter = build_synth_filter();
        assert!(filter.iter().all(|v| v.is_finite()));
        assert!(filter.iter().any(|&v| v.abs() > 1e-6));
    }

    #[test]
    fn silence_in_produces_silence_out() {
        let filter = build_synth_filter();
        let mut synth = PqmfSynthesizer::new(filter);
        for _ in 0..200 {
            let y = synth.step(&[0.0; N_BANDS]);
            assert!(y.iter().all(|v| v.abs() < 1e-6));
        }
    }

    #[test]
    fn clamp_respects_bounds() {
        assert_eq!(clamp_output(10.0), CLAMP_MAX);
        assert_eq!(clamp_output(-10.0), CLAMP_MIN);
        assert!((clamp_output(0.1) - 0.1).abs() < 1e-6);
    }

    #[test]
    fn deemphasis_is_stable_under_silence() {
        let mut de = Deemphasis::new();
        for _ in 0..1000 {
            let y = de.apply(0.0);
            assert_eq!(y, 0.0);
        }
    }

    #[test]
    fn scale_to_i16_round_trips_full_scale() {
        assert_eq!(scale_to_i16(0.0), 0);
        assert!(scale_to_i16(CLAMP_MAX) > 32000);
        assert!(scale_to_i16(CLAMP_MIN) < -32000);
    }

    #[test]
    fn zero_pad_bursts_are_finite() {
        let filter = build_synth_filter();
        let synth = PqmfSynthesizer::new(filter);
        let left = synth.synth_zero_pad_left(30);
        let right = synth.synth_zero_pad_right(40);
        assert_eq!(left.len(), 30);
        assert_eq!(right.len(), 40);
        assert!(left.iter().all(|v| v.is_finite()));
        assert!(right.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn step_produces_n_bands_outputs_per_call() {
        let filter = build_synth_filter();
        let mut synth = PqmfSynthesizer::new(filter);
        let out = synth.step(&[0.1; N_BANDS]);
        assert_eq!(out.len(), N_BANDS);
        assert!(out.iter().all(|v| v.is_finite()));
    }
}
