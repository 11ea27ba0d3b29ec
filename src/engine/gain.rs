//! Gain Stage
//!
//! Linear gain with a per-sample ramp towards its target, so that volume,
//! mute and solo changes never step the signal.

/// Lowest ramp length accepted, in milliseconds
const MIN_RAMP_MS: f32 = 1.0;

/// Clamp a volume to [0, 1], mapping NaN to silence
#[inline]
pub fn clamp_unit(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// A click-free linear gain stage
///
/// Writes only move the target; `next_gain` walks the current value towards
/// it over the configured ramp length.
#[derive(Debug, Clone)]
pub struct GainRamp {
    current: f32,
    target: f32,
    step: f32,
    ramp_samples: u32,
}

impl GainRamp {
    /// Create a gain stage sitting at `initial`
    ///
    /// # Arguments
    /// * `initial` - Starting gain (clamped to [0, 1])
    /// * `ramp_ms` - Time a full target change takes
    /// * `sample_rate` - Sample rate the stage runs at
    pub fn new(initial: f32, ramp_ms: f32, sample_rate: u32) -> Self {
        let initial = clamp_unit(initial);
        let ramp_samples =
            ((ramp_ms.max(MIN_RAMP_MS) / 1000.0) * sample_rate as f32).round().max(1.0) as u32;
        Self {
            current: initial,
            target: initial,
            step: 0.0,
            ramp_samples,
        }
    }

    /// Set a new target gain (clamped to [0, 1])
    pub fn set_target(&mut self, target: f32) {
        let target = clamp_unit(target);
        if (target - self.target).abs() < f32::EPSILON {
            return;
        }
        self.target = target;
        self.step = (self.target - self.current) / self.ramp_samples as f32;
    }

    /// Jump straight to `value` without ramping
    pub fn jump_to(&mut self, value: f32) {
        let value = clamp_unit(value);
        self.current = value;
        self.target = value;
        self.step = 0.0;
    }

    /// The gain the stage is moving towards
    pub fn target(&self) -> f32 {
        self.target
    }

    /// The gain at the current sample position
    pub fn current(&self) -> f32 {
        self.current
    }

    /// True while the stage is still moving
    pub fn is_ramping(&self) -> bool {
        self.step != 0.0
    }

    /// Advance one sample and return the gain to apply to it
    #[inline]
    pub fn next_gain(&mut self) -> f32 {
        if self.step != 0.0 {
            self.current += self.step;
            let overshot = (self.step > 0.0 && self.current >= self.target)
                || (self.step < 0.0 && self.current <= self.target);
            if overshot {
                self.current = self.target;
                self.step = 0.0;
            }
        }
        self.current
    }

    /// Multiply `samples` in place by the ramped gain
    ///
    /// All channels of one frame receive the same gain, so the stage is
    /// advanced once per frame.
    pub fn apply(&mut self, channels: &mut [Vec<f32>], frames: usize) {
        if !self.is_ramping() {
            let gain = self.current;
            if (gain - 1.0).abs() < f32::EPSILON {
                return;
            }
            for channel in channels.iter_mut() {
                for sample in channel.iter_mut().take(frames) {
                    *sample *= gain;
                }
            }
            return;
        }

        for frame in 0..frames {
            let gain = self.next_gain();
            for channel in channels.iter_mut() {
                if let Some(sample) = channel.get_mut(frame) {
                    *sample *= gain;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_ramp_reaches_target() {
        let mut gain = GainRamp::new(0.0, 10.0, 1000);
        gain.set_target(1.0);
        assert!(gain.is_ramping());

        let mut last = 0.0;
        for _ in 0..11 {
            let g = gain.next_gain();
            assert!(g >= last, "ramp must be monotonic");
            last = g;
        }
        assert_relative_eq!(gain.current(), 1.0, epsilon = 1e-6);
        assert!(!gain.is_ramping());
    }

    #[test]
    fn test_ramp_has_no_step_discontinuity() {
        let mut gain = GainRamp::new(1.0, 20.0, 48000);
        gain.set_target(0.0);
        let mut previous = gain.current();
        for _ in 0..2000 {
            let g = gain.next_gain();
            assert!((previous - g).abs() < 0.01);
            previous = g;
        }
        assert_eq!(gain.current(), 0.0);
    }

    #[test]
    fn test_target_is_clamped() {
        let mut gain = GainRamp::new(2.0, 20.0, 48000);
        assert_eq!(gain.current(), 1.0);
        gain.set_target(-3.0);
        assert_eq!(gain.target(), 0.0);
    }

    #[test]
    fn test_nan_is_silence() {
        assert_eq!(clamp_unit(f32::NAN), 0.0);
        assert_eq!(clamp_unit(f32::INFINITY), 1.0);
    }

    #[test]
    fn test_apply_scales_all_channels() {
        let mut gain = GainRamp::new(0.5, 20.0, 48000);
        let mut channels = vec![vec![1.0; 4], vec![-1.0; 4]];
        gain.apply(&mut channels, 4);
        assert_eq!(channels[0], vec![0.5; 4]);
        assert_eq!(channels[1], vec![-0.5; 4]);
    }
}
