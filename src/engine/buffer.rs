//! Audio Buffer Management
//!
//! The multi-channel sample container shared by the generators, the voices
//! and the mixing engine, together with the signal statistics the generators
//! use to validate their output.

use crate::error::{Result, ZenmixError};

// ============================================================================
// Constants
// ============================================================================

/// Default sample rate used when no platform context dictates one (48kHz)
pub const DEFAULT_SAMPLE_RATE: u32 = 48000;

/// Threshold below which audio is considered silent (-80dBFS)
pub const SILENCE_THRESHOLD_DB: f32 = -80.0;

// ============================================================================
// Helper Functions
// ============================================================================

/// Convert linear amplitude to decibels
///
/// # Returns
/// Value in decibels. Returns -f32::INFINITY for zero input.
#[inline]
pub fn linear_to_db(linear: f32) -> f32 {
    if linear <= 0.0 {
        f32::NEG_INFINITY
    } else {
        20.0 * linear.log10()
    }
}

/// RMS level of a single channel (linear)
pub fn channel_rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_squares: f64 = samples.iter().map(|&s| (s as f64) * (s as f64)).sum();
    (sum_squares / samples.len() as f64).sqrt() as f32
}

/// Mean sample value of a single channel
pub fn channel_mean(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: f64 = samples.iter().map(|&s| s as f64).sum();
    (sum / samples.len() as f64) as f32
}

/// Peak absolute sample value of a single channel
pub fn channel_peak(samples: &[f32]) -> f32 {
    samples.iter().map(|s| s.abs()).fold(0.0_f32, f32::max)
}

/// Pearson correlation between two equally long channels
///
/// Returns 1.0 for identical channels and values near 0.0 for unrelated
/// ones. Returns 0.0 if either channel has no energy.
pub fn channel_correlation(a: &[f32], b: &[f32]) -> f32 {
    let n = a.len().min(b.len());
    if n == 0 {
        return 0.0;
    }
    let mean_a = channel_mean(&a[..n]) as f64;
    let mean_b = channel_mean(&b[..n]) as f64;

    let mut cov = 0.0_f64;
    let mut var_a = 0.0_f64;
    let mut var_b = 0.0_f64;
    for (&x, &y) in a[..n].iter().zip(&b[..n]) {
        let dx = x as f64 - mean_a;
        let dy = y as f64 - mean_b;
        cov += dx * dy;
        var_a += dx * dx;
        var_b += dy * dy;
    }

    if var_a <= f64::EPSILON || var_b <= f64::EPSILON {
        return 0.0;
    }
    (cov / (var_a.sqrt() * var_b.sqrt())) as f32
}

// ============================================================================
// Channel Layout
// ============================================================================

/// Audio channel configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ChannelLayout {
    /// Single channel (mono)
    Mono,
    /// Two channels (stereo: left, right)
    #[default]
    Stereo,
}

impl ChannelLayout {
    /// Returns the number of channels for this layout
    pub fn num_channels(&self) -> usize {
        match self {
            ChannelLayout::Mono => 1,
            ChannelLayout::Stereo => 2,
        }
    }

    /// Create a ChannelLayout from a channel count
    pub fn from_count(count: usize) -> Option<Self> {
        match count {
            1 => Some(ChannelLayout::Mono),
            2 => Some(ChannelLayout::Stereo),
            _ => None,
        }
    }
}

// ============================================================================
// Audio Buffer
// ============================================================================

/// Non-interleaved 32-bit float audio
///
/// Generators fill one of these once and hand it to a looping buffer source
/// behind an `Arc`; the mixer uses short ones as render blocks.
///
/// # Example
/// ```
/// use zenmix::engine::{AudioBuffer, ChannelLayout};
///
/// let buffer = AudioBuffer::new(48000, ChannelLayout::Stereo, 48000);
/// assert_eq!(buffer.channels(), 2);
/// assert_eq!(buffer.len(), 48000);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    /// Sample data: outer Vec is channels, inner Vec is samples
    pub samples: Vec<Vec<f32>>,
    /// Sample rate in Hz
    pub sample_rate: u32,
}

impl AudioBuffer {
    /// Create a new zeroed buffer
    ///
    /// # Arguments
    /// * `num_samples` - Number of samples per channel
    /// * `layout` - Channel configuration (Mono or Stereo)
    /// * `sample_rate` - Sample rate in Hz
    pub fn new(num_samples: usize, layout: ChannelLayout, sample_rate: u32) -> Self {
        let num_channels = layout.num_channels();
        Self {
            samples: vec![vec![0.0_f32; num_samples]; num_channels],
            sample_rate,
        }
    }

    /// Create an audio buffer from interleaved sample data
    ///
    /// # Returns
    /// Error if the data length is not a multiple of the channel count
    pub fn from_interleaved(
        interleaved: &[f32],
        layout: ChannelLayout,
        sample_rate: u32,
    ) -> Result<Self> {
        let num_channels = layout.num_channels();

        if interleaved.len() % num_channels != 0 {
            return Err(ZenmixError::InvalidAudioFormat {
                reason: format!(
                    "Interleaved data length {} is not divisible by channel count {}",
                    interleaved.len(),
                    num_channels
                ),
            });
        }

        let num_samples = interleaved.len() / num_channels;
        let mut samples = vec![Vec::with_capacity(num_samples); num_channels];
        for frame in interleaved.chunks_exact(num_channels) {
            for (ch, &sample) in frame.iter().enumerate() {
                samples[ch].push(sample);
            }
        }

        Ok(Self {
            samples,
            sample_rate,
        })
    }

    /// Convert the buffer to interleaved format (L, R, L, R, ...)
    pub fn to_interleaved(&self) -> Vec<f32> {
        let num_channels = self.channels();
        let num_samples = self.len();

        let mut interleaved = Vec::with_capacity(num_channels * num_samples);
        for sample_idx in 0..num_samples {
            for channel in &self.samples {
                interleaved.push(channel[sample_idx]);
            }
        }
        interleaved
    }

    /// Get the number of channels
    #[inline]
    pub fn channels(&self) -> usize {
        self.samples.len()
    }

    /// Get the number of samples per channel
    #[inline]
    pub fn len(&self) -> usize {
        self.samples.first().map(|ch| ch.len()).unwrap_or(0)
    }

    /// Check if the buffer is empty (no samples)
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the duration in seconds
    #[inline]
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.len() as f64 / self.sample_rate as f64
    }

    /// Get the channel layout
    pub fn channel_layout(&self) -> Option<ChannelLayout> {
        ChannelLayout::from_count(self.channels())
    }

    /// Get immutable access to a channel's samples
    ///
    /// # Panics
    /// Panics if the channel index is out of bounds
    #[inline]
    pub fn channel(&self, index: usize) -> &[f32] {
        &self.samples[index]
    }

    /// Get mutable access to a channel's samples
    ///
    /// # Panics
    /// Panics if the channel index is out of bounds
    #[inline]
    pub fn channel_mut(&mut self, index: usize) -> &mut [f32] {
        &mut self.samples[index]
    }

    /// Resize every channel to `num_samples` and zero it
    pub fn reset(&mut self, num_samples: usize) {
        for channel in &mut self.samples {
            channel.clear();
            channel.resize(num_samples, 0.0);
        }
    }

    /// Zero every sample, keeping the length
    pub fn silence(&mut self) {
        for channel in &mut self.samples {
            channel.fill(0.0);
        }
    }

    /// Check if all samples are finite (not NaN or Infinity)
    pub fn is_finite(&self) -> bool {
        self.samples
            .iter()
            .flat_map(|ch| ch.iter())
            .all(|s| s.is_finite())
    }

    /// Clamp all samples to the valid range [-1.0, 1.0]
    pub fn clamp(&mut self) {
        for channel in &mut self.samples {
            for sample in channel.iter_mut() {
                *sample = sample.clamp(-1.0, 1.0);
            }
        }
    }

    /// Peak absolute sample value across all channels
    pub fn peak(&self) -> f32 {
        self.samples
            .iter()
            .map(|ch| channel_peak(ch))
            .fold(0.0_f32, f32::max)
    }

    /// RMS level across all channels in dB
    pub fn rms_db(&self) -> f32 {
        if self.samples.is_empty() {
            return f32::NEG_INFINITY;
        }
        let mean_square = self
            .samples
            .iter()
            .map(|ch| {
                let rms = channel_rms(ch);
                rms * rms
            })
            .sum::<f32>()
            / self.channels() as f32;
        linear_to_db(mean_square.sqrt())
    }

    /// True if the RMS level sits above the silence threshold
    pub fn is_audible(&self) -> bool {
        self.rms_db() > SILENCE_THRESHOLD_DB
    }

    /// Remove the per-channel DC component
    pub fn remove_dc(&mut self) {
        for channel in &mut self.samples {
            let mean = channel_mean(channel);
            for sample in channel.iter_mut() {
                *sample -= mean;
            }
        }
    }

    /// Scale all channels so the peak equals `target`
    ///
    /// Silent buffers are left untouched.
    pub fn normalize_peak(&mut self, target: f32) {
        let peak = self.peak();
        if peak <= f32::EPSILON {
            return;
        }
        let gain = target / peak;
        for channel in &mut self.samples {
            for sample in channel.iter_mut() {
                *sample *= gain;
            }
        }
    }
}

impl Default for AudioBuffer {
    fn default() -> Self {
        Self::new(0, ChannelLayout::Stereo, DEFAULT_SAMPLE_RATE)
    }
}

// ============================================================================
// Tests
// ============================================================================
