//! Noise primitives
//!
//! White, pink and brown noise sources plus the sparse percussive event
//! trigger the textures use for bird chirps, crackles and water drops.

use rand::Rng;

/// Leak coefficient of the brown-noise integrator
pub const BROWN_LEAK: f32 = 0.02;

/// Output gain restoring brown noise to a usable level after integration
pub const BROWN_GAIN: f32 = 3.5;

/// Output gain of the pink filter bank
const PINK_GAIN: f32 = 0.11;

/// Uniform white noise in [-1, 1)
#[inline]
pub fn white<R: Rng + ?Sized>(rng: &mut R) -> f32 {
    rng.gen_range(-1.0_f32..1.0)
}

/// Pink noise via Paul Kellett's refined filter bank
#[derive(Debug, Clone, Default)]
pub struct PinkNoise {
    b: [f32; 7],
}

impl PinkNoise {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shape one white sample into pink noise, clamped to [-1, 1]
    #[inline]
    pub fn next(&mut self, white: f32) -> f32 {
        let b = &mut self.b;
        b[0] = 0.99886 * b[0] + white * 0.0555179;
        b[1] = 0.99332 * b[1] + white * 0.0750759;
        b[2] = 0.96900 * b[2] + white * 0.1538520;
        b[3] = 0.86650 * b[3] + white * 0.3104856;
        b[4] = 0.55000 * b[4] + white * 0.5329522;
        b[5] = -0.7616 * b[5] - white * 0.0168980;
        let out = b[0] + b[1] + b[2] + b[3] + b[4] + b[5] + b[6] + white * 0.5362;
        b[6] = white * 0.115926;
        (out * PINK_GAIN).clamp(-1.0, 1.0)
    }
}

/// Brown noise from a leaky integrator
///
/// `y[i] = (y[i-1] + k * w[i]) / (1 + k)`. Plain integration of white noise
/// random-walks away from zero; the leak pulls it back, and the output gain
/// plus clamp keep it inside [-1, 1].
#[derive(Debug, Clone)]
pub struct BrownNoise {
    last: f32,
    leak: f32,
}

impl Default for BrownNoise {
    fn default() -> Self {
        Self::new(BROWN_LEAK)
    }
}

impl BrownNoise {
    pub fn new(leak: f32) -> Self {
        Self {
            last: 0.0,
            leak: leak.max(f32::EPSILON),
        }
    }

    #[inline]
    pub fn next(&mut self, white: f32) -> f32 {
        self.last = (self.last + self.leak * white) / (1.0 + self.leak);
        (self.last * BROWN_GAIN).clamp(-1.0, 1.0)
    }
}

/// Sparse percussive events
///
/// Each sample a Bernoulli draw with `probability` may fire an event; a fired
/// event restarts an exponential decay envelope. While an event is ringing
/// no new event is fired, so events stay distinct.
#[derive(Debug, Clone)]
pub struct SparseEvents {
    probability: f64,
    decay: f32,
    envelope: f32,
    /// Samples since the last trigger
    age: u32,
}

/// Envelope level below which an event counts as finished
const EVENT_FLOOR: f32 = 1e-3;

impl SparseEvents {
    /// # Arguments
    /// * `probability` - Per-sample trigger probability (1e-4 ..= 5e-6 in the textures)
    /// * `decay_secs` - Time for the envelope to fall by 60 dB
    /// * `sample_rate` - Sample rate in Hz
    pub fn new(probability: f64, decay_secs: f32, sample_rate: u32) -> Self {
        let decay_samples = (decay_secs * sample_rate as f32).max(1.0);
        Self {
            probability: probability.clamp(0.0, 1.0),
            // -60 dB over decay_samples
            decay: (EVENT_FLOOR.ln() / decay_samples).exp(),
            envelope: 0.0,
            age: 0,
        }
    }

    /// Advance one sample
    ///
    /// # Returns
    /// `(envelope, triggered)` where `triggered` is true on the sample an
    /// event starts.
    #[inline]
    pub fn next<R: Rng + ?Sized>(&mut self, rng: &mut R) -> (f32, bool) {
        if self.envelope > EVENT_FLOOR {
            self.envelope *= self.decay;
            self.age = self.age.saturating_add(1);
            return (self.envelope, false);
        }
        self.envelope = 0.0;
        if rng.gen_bool(self.probability) {
            self.envelope = 1.0;
            self.age = 0;
            return (1.0, true);
        }
        (0.0, false)
    }

    /// Samples elapsed since the current event fired
    pub fn age(&self) -> u32 {
        self.age
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::buffer::{channel_mean, channel_peak};
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn test_white_noise_range() {
        let mut rng = SmallRng::seed_from_u64(7);
        for _ in 0..10_000 {
            let s = white(&mut rng);
            assert!((-1.0..1.0).contains(&s));
        }
    }

    #[test]
    fn test_pink_noise_bounded_and_centered() {
        let mut rng = SmallRng::seed_from_u64(11);
        let mut pink = PinkNoise::new();
        let samples: Vec<f32> = (0..96_000).map(|_| pink.next(white(&mut rng))).collect();
        assert!(channel_peak(&samples) <= 1.0);
        assert!(channel_mean(&samples).abs() < 0.05);
    }

    #[test]
    fn test_brown_noise_never_exceeds_unity() {
        let mut rng = SmallRng::seed_from_u64(3);
        let mut brown = BrownNoise::default();
        for _ in 0..480_000 {
            assert!(brown.next(white(&mut rng)).abs() <= 1.0);
        }
    }

    #[test]
    fn test_sparse_events_are_rare() {
        let mut rng = SmallRng::seed_from_u64(5);
        let mut events = SparseEvents::new(1e-4, 0.05, 48000);
        let triggers = (0..480_000)
            .filter(|_| events.next(&mut rng).1)
            .count();
        // ~48 expected at p = 1e-4 without the ringing hold-off, fewer with it
        assert!(triggers > 5, "too few events: {triggers}");
        assert!(triggers < 100, "too many events: {triggers}");
    }

    #[test]
    fn test_event_envelope_decays() {
        let mut rng = SmallRng::seed_from_u64(1);
        let mut events = SparseEvents::new(1.0, 0.01, 1000);
        let (first, triggered) = events.next(&mut rng);
        assert!(triggered);
        assert_eq!(first, 1.0);
        let (second, _) = events.next(&mut rng);
        assert!(second < first);
    }
}
