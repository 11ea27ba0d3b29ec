//! Biquad filters for the synthesis layer
//!
//! Low-pass and high-pass sections built from the Audio EQ Cookbook
//! formulas. Oscillator voices use the low-pass to soften bright waveforms;
//! textures use both to shape noise.

use std::f64::consts::PI;

/// Filter response for a single biquad section
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    /// Remove above the cutoff
    LowPass,
    /// Remove below the cutoff
    HighPass,
}

/// Normalized biquad coefficients (all divided by a0)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct BiquadCoeffs {
    b0: f64,
    b1: f64,
    b2: f64,
    a1: f64,
    a2: f64,
}

impl BiquadCoeffs {
    fn calculate(kind: FilterKind, sample_rate: f64, cutoff: f64, q: f64) -> Self {
        // Keep the cutoff below Nyquist
        let freq = cutoff.clamp(10.0, sample_rate / 2.0 - 1.0);
        let q = q.clamp(0.1, 10.0);

        let w0 = 2.0 * PI * freq / sample_rate;
        let cos_w0 = w0.cos();
        let alpha = w0.sin() / (2.0 * q);

        let (b0, b1, b2, a0, a1, a2) = match kind {
            FilterKind::LowPass => (
                (1.0 - cos_w0) / 2.0,
                1.0 - cos_w0,
                (1.0 - cos_w0) / 2.0,
                1.0 + alpha,
                -2.0 * cos_w0,
                1.0 - alpha,
            ),
            FilterKind::HighPass => (
                (1.0 + cos_w0) / 2.0,
                -(1.0 + cos_w0),
                (1.0 + cos_w0) / 2.0,
                1.0 + alpha,
                -2.0 * cos_w0,
                1.0 - alpha,
            ),
        };

        BiquadCoeffs {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: a1 / a0,
            a2: a2 / a0,
        }
    }
}

/// Delay-line state for one channel
#[derive(Debug, Clone, Copy, Default)]
struct BiquadState {
    x1: f64,
    x2: f64,
    y1: f64,
    y2: f64,
}

impl BiquadState {
    #[inline]
    fn process(&mut self, input: f64, coeffs: &BiquadCoeffs) -> f64 {
        let output = coeffs.b0 * input + coeffs.b1 * self.x1 + coeffs.b2 * self.x2
            - coeffs.a1 * self.y1
            - coeffs.a2 * self.y2;

        self.x2 = self.x1;
        self.x1 = input;
        self.y2 = self.y1;
        self.y1 = output;

        output
    }
}

/// A stereo biquad section with independent left/right state
#[derive(Debug, Clone)]
pub struct Biquad {
    kind: FilterKind,
    cutoff: f32,
    coeffs: BiquadCoeffs,
    states: [BiquadState; 2],
}

impl Biquad {
    /// Butterworth Q for a single second-order section
    pub const BUTTERWORTH_Q: f32 = std::f32::consts::FRAC_1_SQRT_2;

    /// Create a filter section
    ///
    /// # Arguments
    /// * `kind` - Low-pass or high-pass response
    /// * `cutoff` - Cutoff frequency in Hz (clamped below Nyquist)
    /// * `q` - Resonance (clamped to 0.1..10)
    /// * `sample_rate` - Sample rate in Hz
    pub fn new(kind: FilterKind, cutoff: f32, q: f32, sample_rate: u32) -> Self {
        Self {
            kind,
            cutoff,
            coeffs: BiquadCoeffs::calculate(kind, sample_rate as f64, cutoff as f64, q as f64),
            states: [BiquadState::default(); 2],
        }
    }

    /// Butterworth low-pass
    pub fn low_pass(cutoff: f32, sample_rate: u32) -> Self {
        Self::new(FilterKind::LowPass, cutoff, Self::BUTTERWORTH_Q, sample_rate)
    }

    /// Butterworth high-pass
    pub fn high_pass(cutoff: f32, sample_rate: u32) -> Self {
        Self::new(FilterKind::HighPass, cutoff, Self::BUTTERWORTH_Q, sample_rate)
    }

    pub fn kind(&self) -> FilterKind {
        self.kind
    }

    pub fn cutoff(&self) -> f32 {
        self.cutoff
    }

    /// Filter one sample on `channel` (0 = left, 1 = right)
    #[inline]
    pub fn process(&mut self, input: f32, channel: usize) -> f32 {
        let state = &mut self.states[channel.min(1)];
        state.process(input as f64, &self.coeffs) as f32
    }

    /// Clear filter history
    pub fn reset(&mut self) {
        self.states = [BiquadState::default(); 2];
    }
}
