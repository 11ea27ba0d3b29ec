//! Voices
//!
//! A voice is one live instance of a sound: its own source node, its own
//! gain stage and the caller's volume, mute and solo flags.
//!
//! Source nodes are single-use. A node moves `Created -> Playing -> Stopped`
//! and never back; anything that needs the sound again builds a new node.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::catalog::SoundDescriptor;
use crate::engine::buffer::AudioBuffer;
use crate::engine::gain::{clamp_unit, GainRamp};
use crate::error::{Result, ZenmixError};
use crate::synth::{GeneratedSource, Oscillator, OscillatorParams};

// ============================================================================
// Instance ids
// ============================================================================

/// Identifies one `play` call's voice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstanceId(Uuid);

impl InstanceId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for InstanceId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// ============================================================================
// Source nodes
// ============================================================================

/// Lifecycle of a single-use node or voice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayState {
    #[default]
    Created,
    Playing,
    Stopped,
}

/// Plays a shared immutable buffer, optionally looping
#[derive(Debug, Clone)]
pub struct BufferSource {
    buffer: Arc<AudioBuffer>,
    position: usize,
    looping: bool,
}

impl BufferSource {
    pub fn new(buffer: Arc<AudioBuffer>, looping: bool) -> Self {
        Self {
            buffer,
            position: 0,
            looping,
        }
    }

    pub fn is_finished(&self) -> bool {
        !self.looping && self.position >= self.buffer.len()
    }

    /// Add up to `frames` frames into `out`
    ///
    /// Output channels beyond the buffer's own reuse its last channel.
    fn render(&mut self, out: &mut [Vec<f32>], frames: usize) -> usize {
        let len = self.buffer.len();
        let source_channels = self.buffer.channels();
        if len == 0 || source_channels == 0 {
            return 0;
        }

        let mut produced = 0;
        while produced < frames {
            if self.position >= len {
                if !self.looping {
                    break;
                }
                self.position = 0;
            }
            let n = (frames - produced).min(len - self.position);
            for (ch, channel) in out.iter_mut().enumerate() {
                let src = &self.buffer.samples[ch.min(source_channels - 1)]
                    [self.position..self.position + n];
                for (dst, s) in channel[produced..produced + n].iter_mut().zip(src) {
                    *dst += s;
                }
            }
            self.position += n;
            produced += n;
        }
        produced
    }
}

#[derive(Debug, Clone)]
enum SourceKind {
    Buffer(BufferSource),
    Oscillator(Oscillator),
}

/// A generator node exclusively owned by one voice
#[derive(Debug, Clone)]
pub struct SourceNode {
    kind: SourceKind,
    state: PlayState,
}

impl SourceNode {
    /// Build a node for generated content
    pub fn from_generated(source: &GeneratedSource, looping: bool, sample_rate: u32) -> Self {
        let kind = match source {
            GeneratedSource::Buffer(buffer) => {
                SourceKind::Buffer(BufferSource::new(Arc::clone(buffer), looping))
            }
            GeneratedSource::Oscillator(params) => {
                SourceKind::Oscillator(Oscillator::new(params.clone(), sample_rate))
            }
        };
        Self {
            kind,
            state: PlayState::Created,
        }
    }

    /// Give a sustained oscillator a fixed length; buffers are unaffected
    pub fn with_length(self, frames: u64) -> Self {
        let kind = match self.kind {
            SourceKind::Oscillator(o) => SourceKind::Oscillator(o.with_length(frames)),
            buffer => buffer,
        };
        Self { kind, ..self }
    }

    /// Start the node; a node starts at most once
    pub fn start(&mut self) -> Result<()> {
        if self.state != PlayState::Created {
            return Err(ZenmixError::NodeAlreadyStarted);
        }
        self.state = PlayState::Playing;
        Ok(())
    }

    /// Stop the node; stopping twice is harmless
    pub fn stop(&mut self) {
        self.state = PlayState::Stopped;
    }

    pub fn state(&self) -> PlayState {
        self.state
    }

    pub fn is_oscillator(&self) -> bool {
        matches!(self.kind, SourceKind::Oscillator(_))
    }

    pub fn oscillator_params(&self) -> Option<&OscillatorParams> {
        match &self.kind {
            SourceKind::Oscillator(o) => Some(o.params()),
            SourceKind::Buffer(_) => None,
        }
    }

    /// True once the node has nothing more to play
    pub fn is_finished(&self) -> bool {
        match &self.kind {
            SourceKind::Buffer(b) => b.is_finished(),
            SourceKind::Oscillator(o) => o.is_finished(),
        }
    }

    /// Add up to `frames` frames into `out`; silent unless playing
    pub fn render(&mut self, out: &mut [Vec<f32>], frames: usize) -> usize {
        if self.state != PlayState::Playing {
            return 0;
        }
        match &mut self.kind {
            SourceKind::Buffer(b) => b.render(out, frames),
            SourceKind::Oscillator(o) => o.render(out, frames),
        }
    }
}

// ============================================================================
// Voices
// ============================================================================

/// One live sound instance
#[derive(Debug)]
pub struct Voice {
    id: InstanceId,
    sound: Arc<SoundDescriptor>,
    source: Option<SourceNode>,
    gain: GainRamp,
    user_volume: f32,
    muted: bool,
    solo: bool,
    looping: bool,
    state: PlayState,
}

impl Voice {
    /// Create a voice around a fresh node
    ///
    /// The engine hands in a gain stage sitting at zero, so the first
    /// target ramps the voice in.
    pub fn new(
        sound: Arc<SoundDescriptor>,
        source: SourceNode,
        volume: f32,
        looping: bool,
        gain: GainRamp,
    ) -> Self {
        Self {
            id: InstanceId::new(),
            sound,
            source: Some(source),
            gain,
            user_volume: clamp_unit(volume),
            muted: false,
            solo: false,
            looping,
            state: PlayState::Created,
        }
    }

    pub fn id(&self) -> InstanceId {
        self.id
    }

    pub fn sound(&self) -> &Arc<SoundDescriptor> {
        &self.sound
    }

    pub fn sound_id(&self) -> &str {
        self.sound.id()
    }

    pub fn user_volume(&self) -> f32 {
        self.user_volume
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn is_solo(&self) -> bool {
        self.solo
    }

    pub fn is_looping(&self) -> bool {
        self.looping
    }

    pub fn state(&self) -> PlayState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlayState::Playing
    }

    /// Parameters of the voice's node, for oscillator voices
    pub fn oscillator_params(&self) -> Option<&OscillatorParams> {
        self.source.as_ref().and_then(SourceNode::oscillator_params)
    }

    /// Current value of the voice's gain stage
    pub fn gain(&self) -> &GainRamp {
        &self.gain
    }

    /// Begin playback; `Created -> Playing` only
    pub fn start(&mut self) -> Result<()> {
        if self.state != PlayState::Created {
            return Err(ZenmixError::NodeAlreadyStarted);
        }
        let source = self.source.as_mut().ok_or(ZenmixError::NodeAlreadyStarted)?;
        source.start()?;
        self.state = PlayState::Playing;
        debug!(sound = self.sound.id(), instance = %self.id, "voice started");
        Ok(())
    }

    /// Clamp and store the caller's volume
    ///
    /// The gain stage follows once the registry recomputes effective volume.
    pub fn set_volume(&mut self, volume: f32) {
        self.user_volume = clamp_unit(volume);
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    pub fn set_solo(&mut self, solo: bool) {
        self.solo = solo;
    }

    /// Move the gain stage towards `target` without stepping
    pub fn apply_gain(&mut self, target: f32) {
        self.gain.set_target(target);
    }

    /// Swap in a brand-new node, discarding the old one
    ///
    /// Used to re-strike looping tones; the old node is stopped, never
    /// restarted.
    pub fn replace_source(&mut self, mut source: SourceNode) -> Result<()> {
        if self.state != PlayState::Playing {
            return Ok(());
        }
        source.start()?;
        if let Some(mut old) = self.source.replace(source) {
            old.stop();
        }
        Ok(())
    }

    /// Stop and disconnect; idempotent
    pub fn stop(&mut self) {
        if self.state == PlayState::Stopped {
            return;
        }
        if let Some(mut source) = self.source.take() {
            source.stop();
        }
        self.gain.jump_to(0.0);
        self.state = PlayState::Stopped;
        debug!(sound = self.sound.id(), instance = %self.id, "voice stopped");
    }

    /// True once a non-looping voice has played out
    pub fn has_ended(&self) -> bool {
        !self.looping && self.source.as_ref().is_some_and(|s| s.is_finished())
    }

    /// Render one block through the voice's gain stage and add it to `out`
    ///
    /// `scratch` must have at least as many channels and frames as `out`.
    pub fn render_into(&mut self, scratch: &mut [Vec<f32>], out: &mut [Vec<f32>], frames: usize) {
        if self.state != PlayState::Playing {
            return;
        }
        let Some(source) = self.source.as_mut() else {
            return;
        };
        let channels = out.len().min(scratch.len());
        for channel in scratch.iter_mut().take(channels) {
            channel[..frames].fill(0.0);
        }
        source.render(&mut scratch[..channels], frames);
        self.gain.apply(&mut scratch[..channels], frames);
        for (dst, src) in out.iter_mut().zip(scratch.iter()) {
            for (d, s) in dst[..frames].iter_mut().zip(&src[..frames]) {
                *d += s;
            }
        }
    }
}
