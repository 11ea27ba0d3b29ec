//! Continuous oscillator synthesis
//!
//! Simple tones, binaural brainwave tones and the fallback generator. Each
//! tone is an explicit `ToneKind` with a fixed parameter record; nothing is
//! looked up by matching fragments of a sound id.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use super::filter::Biquad;

/// Depth of the slow frequency LFO as a fraction of the base frequency
pub const LFO_DEPTH: f32 = 0.02;

/// Output level of oscillator voices before the voice gain
const TONE_AMPLITUDE: f32 = 0.3;

/// Fade at the end of a sustained tone given a fixed length
const RELEASE_SECS: f64 = 0.05;

/// Supported waveform shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Waveform {
    Sine,
    Sawtooth,
    Square,
    Triangle,
}

/// Slow modulation of the oscillator frequency
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Lfo {
    /// Modulation rate in Hz
    pub rate_hz: f32,
    /// Peak deviation as a fraction of the base frequency
    pub depth: f32,
}

impl Lfo {
    /// The standard organic drift: `rate_hz` at 2% depth
    pub fn drift(rate_hz: f32) -> Self {
        Self {
            rate_hz,
            depth: LFO_DEPTH,
        }
    }
}

/// Strike envelope for tones that ring out instead of sustaining
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Strike {
    /// Linear attack time in seconds
    pub attack_secs: f32,
    /// Total ring time in seconds; the tone ends after this
    pub ring_secs: f32,
}

/// Everything an oscillator voice needs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OscillatorParams {
    pub waveform: Waveform,
    /// Base frequency in Hz
    pub frequency: f32,
    /// Right-ear offset in Hz for binaural tones
    #[serde(default)]
    pub binaural_beat: Option<f32>,
    #[serde(default)]
    pub lfo: Option<Lfo>,
    /// Low-pass cutoff in Hz
    #[serde(default)]
    pub lowpass_cutoff: Option<f32>,
    /// Present for tones that end on their own
    #[serde(default)]
    pub strike: Option<Strike>,
    /// Interval at which a looping struck tone is rebuilt, in seconds
    #[serde(default)]
    pub retrigger_secs: Option<f32>,
    pub amplitude: f32,
}

impl OscillatorParams {
    /// A plain sine, the generator used when anything richer fails
    pub fn fallback(frequency: f32) -> Self {
        Self {
            waveform: Waveform::Sine,
            frequency,
            binaural_beat: None,
            lfo: None,
            lowpass_cutoff: None,
            strike: None,
            retrigger_secs: None,
            amplitude: TONE_AMPLITUDE,
        }
    }

    fn tone(waveform: Waveform, frequency: f32) -> Self {
        Self {
            waveform,
            ..Self::fallback(frequency)
        }
    }

    fn binaural(carrier: f32, beat: f32) -> Self {
        Self {
            binaural_beat: Some(beat),
            ..Self::fallback(carrier)
        }
    }

    /// Length of one tone in frames, `None` for sustained tones
    pub fn duration_frames(&self, sample_rate: u32) -> Option<u64> {
        self.strike
            .map(|s| (s.ring_secs.max(0.0) as f64 * sample_rate as f64).round() as u64)
    }
}

/// The oscillator-backed tones of the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ToneKind {
    AlphaBinaural,
    ThetaBinaural,
    DeltaBinaural,
    GammaBinaural,
    OmDrone,
    CityHum,
    Solfeggio528,
    MeditationChime,
    PureTone,
}

impl ToneKind {
    pub const ALL: [ToneKind; 9] = [
        ToneKind::AlphaBinaural,
        ToneKind::ThetaBinaural,
        ToneKind::DeltaBinaural,
        ToneKind::GammaBinaural,
        ToneKind::OmDrone,
        ToneKind::CityHum,
        ToneKind::Solfeggio528,
        ToneKind::MeditationChime,
        ToneKind::PureTone,
    ];

    /// Strategy tag selecting this tone in a catalog
    pub fn tag(self) -> &'static str {
        match self {
            ToneKind::AlphaBinaural => "alpha-binaural",
            ToneKind::ThetaBinaural => "theta-binaural",
            ToneKind::DeltaBinaural => "delta-binaural",
            ToneKind::GammaBinaural => "gamma-binaural",
            ToneKind::OmDrone => "om-drone",
            ToneKind::CityHum => "city-hum",
            ToneKind::Solfeggio528 => "solfeggio-528",
            ToneKind::MeditationChime => "meditation-chime",
            ToneKind::PureTone => "pure-tone",
        }
    }

    /// The parameter record for this tone
    pub fn params(self) -> OscillatorParams {
        match self {
            ToneKind::AlphaBinaural => OscillatorParams::binaural(200.0, 10.0),
            ToneKind::ThetaBinaural => OscillatorParams::binaural(180.0, 6.0),
            ToneKind::DeltaBinaural => OscillatorParams::binaural(150.0, 2.0),
            ToneKind::GammaBinaural => OscillatorParams::binaural(220.0, 40.0),
            ToneKind::OmDrone => OscillatorParams {
                lfo: Some(Lfo::drift(0.1)),
                lowpass_cutoff: Some(400.0),
                ..OscillatorParams::tone(Waveform::Sawtooth, 136.1)
            },
            ToneKind::CityHum => OscillatorParams {
                lfo: Some(Lfo::drift(0.05)),
                lowpass_cutoff: Some(220.0),
                amplitude: 0.2,
                ..OscillatorParams::tone(Waveform::Square, 60.0)
            },
            ToneKind::Solfeggio528 => OscillatorParams {
                lfo: Some(Lfo::drift(0.2)),
                ..OscillatorParams::tone(Waveform::Sine, 528.0)
            },
            ToneKind::MeditationChime => OscillatorParams {
                strike: Some(Strike {
                    attack_secs: 0.01,
                    ring_secs: 4.0,
                }),
                retrigger_secs: Some(12.0),
                ..OscillatorParams::tone(Waveform::Triangle, 880.0)
            },
            ToneKind::PureTone => OscillatorParams::tone(Waveform::Sine, 432.0),
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|kind| kind.tag() == tag)
    }
}

// ============================================================================
// Oscillator
// ============================================================================

/// A running stereo oscillator
///
/// Left and right run separate phases so binaural tones can offset the
/// right ear. Sawtooth and square use PolyBLEP to tame aliasing.
#[derive(Debug, Clone)]
pub struct Oscillator {
    params: OscillatorParams,
    sample_rate: f64,
    phase: [f64; 2],
    lfo_phase: f64,
    filter: Option<Biquad>,
    elapsed: u64,
    duration: Option<u64>,
    release: u64,
}

impl Oscillator {
    pub fn new(params: OscillatorParams, sample_rate: u32) -> Self {
        let filter = params
            .lowpass_cutoff
            .map(|cutoff| Biquad::low_pass(cutoff, sample_rate));
        let duration = params.duration_frames(sample_rate);
        Self {
            params,
            sample_rate: sample_rate.max(1) as f64,
            phase: [0.0; 2],
            lfo_phase: 0.0,
            filter,
            elapsed: 0,
            duration,
            release: 0,
        }
    }

    /// Cut a sustained tone after `frames` frames, fading out over the end
    ///
    /// Struck tones already end on their own and keep their ring length.
    pub fn with_length(mut self, frames: u64) -> Self {
        if self.duration.is_none() {
            self.duration = Some(frames);
            self.release = ((RELEASE_SECS * self.sample_rate) as u64).min(frames);
        }
        self
    }

    pub fn params(&self) -> &OscillatorParams {
        &self.params
    }

    /// True once the tone has run its length; unbounded sustained tones
    /// never finish
    pub fn is_finished(&self) -> bool {
        self.duration.is_some_and(|d| self.elapsed >= d)
    }

    /// Render `frames` frames, adding into `out`
    ///
    /// # Returns
    /// Number of frames actually produced (less than `frames` only when a
    /// struck tone ends inside the block)
    pub fn render(&mut self, out: &mut [Vec<f32>], frames: usize) -> usize {
        let mut produced = 0;
        for frame in 0..frames {
            if self.is_finished() {
                break;
            }
            let (left, right) = self.next_frame();
            if let Some(ch) = out.get_mut(0) {
                ch[frame] += left;
            }
            if let Some(ch) = out.get_mut(1) {
                ch[frame] += right;
            }
            produced += 1;
        }
        produced
    }

    fn next_frame(&mut self) -> (f32, f32) {
        let base = self.params.frequency as f64;
        let modulation = match self.params.lfo {
            Some(lfo) => {
                let m = (2.0 * PI * self.lfo_phase).sin() * lfo.depth as f64;
                self.lfo_phase = (self.lfo_phase + lfo.rate_hz as f64 / self.sample_rate).fract();
                m
            }
            None => 0.0,
        };
        let left_freq = base * (1.0 + modulation);
        let right_freq = left_freq + self.params.binaural_beat.unwrap_or(0.0) as f64;

        let envelope = self.envelope() * self.release_gain() * self.params.amplitude;
        let mut left = self.advance(0, left_freq) as f32 * envelope;
        let mut right = self.advance(1, right_freq) as f32 * envelope;

        if let Some(filter) = self.filter.as_mut() {
            left = filter.process(left, 0);
            right = filter.process(right, 1);
        }

        self.elapsed += 1;
        (left, right)
    }

    fn envelope(&self) -> f32 {
        let Some(strike) = self.params.strike else {
            return 1.0;
        };
        let t = self.elapsed as f32 / self.sample_rate as f32;
        if t < strike.attack_secs {
            return t / strike.attack_secs.max(f32::EPSILON);
        }
        // -60 dB by the end of the ring
        let ring = (strike.ring_secs - strike.attack_secs).max(f32::EPSILON);
        (-6.9 * (t - strike.attack_secs) / ring).exp()
    }

    fn release_gain(&self) -> f32 {
        match self.duration {
            Some(d) if self.release > 0 => {
                let remaining = d.saturating_sub(self.elapsed);
                (remaining as f32 / self.release as f32).min(1.0)
            }
            _ => 1.0,
        }
    }

    fn advance(&mut self, channel: usize, frequency: f64) -> f64 {
        let inc = (frequency / self.sample_rate).clamp(0.0, 0.5);
        let phase = self.phase[channel];
        let sample = match self.params.waveform {
            Waveform::Sine => (2.0 * PI * phase).sin(),
            Waveform::Sawtooth => (2.0 * phase - 1.0) - poly_blep(phase, inc),
            Waveform::Square => {
                let naive = if phase < 0.5 { 1.0 } else { -1.0 };
                naive + poly_blep(phase, inc) - poly_blep((phase + 0.5) % 1.0, inc)
            }
            Waveform::Triangle => {
                if phase < 0.5 {
                    4.0 * phase - 1.0
                } else {
                    3.0 - 4.0 * phase
                }
            }
        };
        self.phase[channel] = (phase + inc).fract();
        sample
    }
}

/// PolyBLEP correction at a waveform discontinuity
///
/// `t` is the phase in [0, 1), `dt` the phase increment per sample.
fn poly_blep(t: f64, dt: f64) -> f64 {
    if dt <= 0.0 {
        return 0.0;
    }
    if t < dt {
        let t = t / dt;
        2.0 * t - t * t - 1.0
    } else if t > 1.0 - dt {
        let t = (t - 1.0) / dt;
        t * t + 2.0 * t + 1.0
    } else {
        0.0
    }
}
