//! Mixing Engine
//!
//! Owns the shared audio context, the voice registry, the master gain stage
//! and the whole public control surface. Failures stop here: `play` reports
//! a failed start through its `Result`, control calls report whether the
//! voice was found, and teardown never fails.
//!
//! # Example
//! ```
//! use zenmix::catalog::SoundCatalog;
//! use zenmix::engine::MixingEngine;
//!
//! let catalog = SoundCatalog::builtin();
//! let mut engine = MixingEngine::offline(8000);
//! engine.resume().unwrap();
//!
//! let noise = catalog.get("white-noise").unwrap();
//! let id = engine.play(&noise, 0.5, true).unwrap();
//! assert_eq!(engine.active_voices().len(), 1);
//!
//! engine.stop(id);
//! assert!(engine.active_voices().is_empty());
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::catalog::SoundDescriptor;
use crate::config::EngineConfig;
use crate::engine::buffer::{AudioBuffer, ChannelLayout, DEFAULT_SAMPLE_RATE};
use crate::engine::context::{ContextState, SharedContext};
use crate::engine::gain::{clamp_unit, GainRamp};
use crate::engine::host::{AudioHost, OfflineHost};
use crate::engine::registry::{self, VoiceRegistry};
use crate::engine::scheduler::RetriggerScheduler;
use crate::engine::voice::{InstanceId, PlayState, SourceNode, Voice};
use crate::error::{Result, ZenmixError};
use crate::synth::{self, GeneratedSource, SynthesisStrategy};

/// Frames per block for offline renders
pub const RENDER_BLOCK_FRAMES: usize = 1024;

/// Display snapshot of one voice
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VoiceInfo {
    pub instance_id: InstanceId,
    pub descriptor_id: String,
    pub volume: f32,
    /// False while the voice waits for the context to resume
    pub is_playing: bool,
    pub is_muted: bool,
    pub is_solo: bool,
}

/// The audio synthesis and mixing service
#[derive(Debug)]
pub struct MixingEngine {
    config: EngineConfig,
    context: SharedContext,
    registry: VoiceRegistry,
    scheduler: RetriggerScheduler,
    buffer_cache: HashMap<String, Arc<AudioBuffer>>,
    master_volume: f32,
    master_gain: GainRamp,
    enabled: bool,
    scratch: Vec<Vec<f32>>,
    cleaned_up: bool,
}

impl MixingEngine {
    /// Create an engine on top of a platform host
    ///
    /// Nothing touches the platform until [`initialize`](Self::initialize),
    /// [`resume`](Self::resume) or the first [`play`](Self::play).
    pub fn new(host: Box<dyn AudioHost>, config: EngineConfig) -> Self {
        let config = config.sanitized();
        let master_volume = config.default_master_volume;
        let master_gain = GainRamp::new(master_volume, config.ramp_ms, DEFAULT_SAMPLE_RATE);
        Self {
            config,
            context: SharedContext::new(host),
            registry: VoiceRegistry::new(),
            scheduler: RetriggerScheduler::new(),
            buffer_cache: HashMap::new(),
            master_volume,
            master_gain,
            enabled: true,
            scratch: Vec::new(),
            cleaned_up: false,
        }
    }

    /// An engine with default config on an [`OfflineHost`]
    pub fn offline(sample_rate: u32) -> Self {
        Self::new(Box::new(OfflineHost::new(sample_rate)), EngineConfig::default())
    }

    // ========================================================================
    // Context control
    // ========================================================================

    /// Create the shared context if it does not exist yet
    ///
    /// Idempotent and cheap after the first success.
    pub fn initialize(&mut self) -> Result<()> {
        let first = self.context.state() == ContextState::Uninitialized;
        match self.context.initialize() {
            Ok(sample_rate) => {
                if first {
                    self.master_gain =
                        GainRamp::new(self.master_volume, self.config.ramp_ms, sample_rate);
                }
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "audio context initialization failed");
                Err(e)
            }
        }
    }

    /// Ask the context to run and start any voices waiting on it
    ///
    /// # Returns
    /// The context state afterwards; `Suspended` means the platform is
    /// holding the resume until a user gesture, and voices start on a later
    /// [`poll`](Self::poll).
    pub fn resume(&mut self) -> Result<ContextState> {
        self.initialize()?;
        let state = self.context.resume()?;
        if state == ContextState::Running {
            self.start_pending();
        }
        Ok(state)
    }

    /// Stop pulling audio, keeping every voice
    pub fn suspend(&mut self) -> Result<()> {
        self.context.suspend()
    }

    /// Complete a pending resume if the platform allows it now
    ///
    /// Called by the host's scheduler; [`render`](Self::render) calls it too.
    ///
    /// # Returns
    /// Whether the context is running
    pub fn poll(&mut self) -> bool {
        if self.context.poll() {
            debug!("pending resume completed");
            self.start_pending();
        }
        self.context.is_running()
    }

    // ========================================================================
    // Voices
    // ========================================================================

    /// Play a sound
    ///
    /// With the default config a sound plays at most once: playing a sound
    /// that already has a voice returns that voice's id and changes nothing.
    /// If the context is not running yet the voice is registered and starts
    /// once the resume completes. `play` requests that resume itself unless
    /// the context was explicitly suspended.
    ///
    /// # Arguments
    /// * `descriptor` - The sound to play
    /// * `volume` - Caller volume, clamped to [0, 1]
    /// * `looping` - Loop the sound until stopped
    ///
    /// # Errors
    /// `EngineDisabled` while disabled, or the context error when the
    /// platform cannot provide one. Generator failures are not errors: the
    /// voice falls back to a plain sine.
    pub fn play(
        &mut self,
        descriptor: &Arc<SoundDescriptor>,
        volume: f32,
        looping: bool,
    ) -> Result<InstanceId> {
        if !self.enabled {
            debug!(sound = descriptor.id(), "play rejected: engine disabled");
            return Err(ZenmixError::EngineDisabled);
        }
        self.initialize()?;

        if !self.config.multi_instance {
            if let Some(existing) = self.registry.find_by_sound(descriptor.id()) {
                debug!(sound = descriptor.id(), instance = %existing, "already playing");
                return Ok(existing);
            }
        }

        let sample_rate = self.sample_rate();
        let generated = self.generate(descriptor, sample_rate);
        let mut node = SourceNode::from_generated(&generated, looping, sample_rate);
        if !looping {
            let frames = (self.config.one_shot_secs as f64 * sample_rate as f64).round() as u64;
            node = node.with_length(frames);
        }
        let gain = GainRamp::new(0.0, self.config.ramp_ms, sample_rate);
        let voice = Voice::new(Arc::clone(descriptor), node, volume, looping, gain);
        let id = voice.id();
        self.registry.insert(voice);
        self.registry.refresh_gains();

        // An explicit suspend (a hidden page) is left alone until resumed
        if !self.context.is_running() && !self.context.is_held() {
            match self.context.resume() {
                Ok(ContextState::Running) => {}
                Ok(state) => {
                    debug!(sound = descriptor.id(), %state, "voice deferred until context resumes")
                }
                Err(e) => warn!(error = %e, "resume before play failed"),
            }
        }
        if self.context.is_running() {
            // Voices deferred earlier go with this one
            self.start_pending();
            if !self.registry.contains(id) {
                return Err(ZenmixError::SynthesisFailed {
                    sound_id: descriptor.id().to_string(),
                    reason: "voice failed to start".to_string(),
                });
            }
        }
        Ok(id)
    }

    /// Set a voice's volume; `false` if the voice is gone
    pub fn set_voice_volume(&mut self, id: InstanceId, volume: f32) -> bool {
        self.update_voice(id, |voice| voice.set_volume(volume))
    }

    /// Mute or unmute a voice; `false` if the voice is gone
    pub fn mute_voice(&mut self, id: InstanceId, muted: bool) -> bool {
        self.update_voice(id, |voice| voice.set_muted(muted))
    }

    /// Solo or unsolo a voice; `false` if the voice is gone
    ///
    /// Solo affects every voice, so all gains are recomputed.
    pub fn solo_voice(&mut self, id: InstanceId, solo: bool) -> bool {
        self.update_voice(id, |voice| voice.set_solo(solo))
    }

    /// Stop one voice
    ///
    /// Idempotent: unknown or already-stopped ids return `false` and change
    /// nothing. A voice still waiting on a pending resume is discarded and
    /// never starts.
    pub fn stop(&mut self, id: InstanceId) -> bool {
        self.scheduler.cancel(id);
        match self.registry.remove(id) {
            Some(mut voice) => {
                voice.stop();
                self.registry.refresh_gains();
                true
            }
            None => false,
        }
    }

    /// Stop every voice; the registry is empty when this returns
    pub fn stop_all(&mut self) {
        let voices = self.registry.drain();
        let count = voices.len();
        for mut voice in voices {
            voice.stop();
        }
        self.scheduler.clear();
        if count > 0 {
            debug!(count, "stopped all voices");
        }
    }

    /// Snapshot of every registered voice, in play order
    pub fn active_voices(&self) -> Vec<VoiceInfo> {
        self.registry
            .iter()
            .map(|voice| VoiceInfo {
                instance_id: voice.id(),
                descriptor_id: voice.sound_id().to_string(),
                volume: voice.user_volume(),
                is_playing: voice.is_playing(),
                is_muted: voice.is_muted(),
                is_solo: voice.is_solo(),
            })
            .collect()
    }

    /// Effective volume of a voice before the master stage
    pub fn effective_volume(&self, id: InstanceId) -> Option<f32> {
        self.registry
            .get(id)
            .map(|voice| registry::effective_volume(voice, &self.registry))
    }

    /// The level a voice converges to at the output: effective × master
    pub fn audible_volume(&self, id: InstanceId) -> Option<f32> {
        self.effective_volume(id).map(|v| v * self.master_volume)
    }

    // ========================================================================
    // Master and enable
    // ========================================================================

    /// Set the master volume, clamped to [0, 1]
    pub fn set_master_volume(&mut self, volume: f32) {
        self.master_volume = clamp_unit(volume);
        self.master_gain.set_target(self.master_volume);
        self.registry.refresh_gains();
    }

    pub fn master_volume(&self) -> f32 {
        self.master_volume
    }

    /// Disabling stops every voice and rejects `play` until re-enabled
    pub fn set_enabled(&mut self, enabled: bool) {
        if !enabled {
            self.stop_all();
        }
        if self.enabled != enabled {
            info!(enabled, "audio engine toggled");
        }
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    // ========================================================================
    // Rendering
    // ========================================================================

    /// Pull one block of mixed audio into `out`
    ///
    /// The block is silent while the context is not running, and no source
    /// advances. Voices that played out are removed afterwards.
    pub fn render(&mut self, out: &mut AudioBuffer) {
        self.poll();
        out.silence();
        let frames = out.len();
        if frames == 0 || !self.context.is_running() {
            return;
        }

        self.run_retriggers(frames as u64);

        let channels = out.channels();
        if self.scratch.len() < channels || self.scratch.first().map_or(0, Vec::len) < frames {
            self.scratch = vec![vec![0.0; frames]; channels];
        }
        for voice in self.registry.iter_mut() {
            voice.render_into(&mut self.scratch, &mut out.samples, frames);
        }
        self.master_gain.apply(&mut out.samples, frames);
        out.clamp();

        self.reap_ended();
    }

    /// Render `seconds` of stereo output in fixed-size blocks
    pub fn render_seconds(&mut self, seconds: f32) -> AudioBuffer {
        let sample_rate = self.sample_rate();
        let total = (seconds.max(0.0) * sample_rate as f32).round() as usize;
        let mut output = AudioBuffer::new(total, ChannelLayout::Stereo, sample_rate);
        let mut block = AudioBuffer::new(RENDER_BLOCK_FRAMES, ChannelLayout::Stereo, sample_rate);

        let mut offset = 0;
        while offset < total {
            let frames = RENDER_BLOCK_FRAMES.min(total - offset);
            block.reset(frames);
            self.render(&mut block);
            for ch in 0..2 {
                output.channel_mut(ch)[offset..offset + frames].copy_from_slice(block.channel(ch));
            }
            offset += frames;
        }
        output
    }

    // ========================================================================
    // Teardown
    // ========================================================================

    /// Stop everything and close the shared context
    ///
    /// Safe to call from an unload handler: never fails, and only the first
    /// call does anything. The engine cannot play afterwards.
    pub fn cleanup(&mut self) {
        if self.cleaned_up {
            return;
        }
        self.cleaned_up = true;
        self.stop_all();
        self.buffer_cache.clear();
        if let Err(e) = self.context.close() {
            warn!(error = %e, "closing audio context failed");
        }
        info!("audio engine cleaned up");
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn context_state(&self) -> ContextState {
        self.context.state()
    }

    pub fn is_resume_pending(&self) -> bool {
        self.context.is_resume_pending()
    }

    /// The context's sample rate, or the default before it exists
    pub fn sample_rate(&self) -> u32 {
        self.context.sample_rate().unwrap_or(DEFAULT_SAMPLE_RATE)
    }

    pub fn voice_count(&self) -> usize {
        self.registry.len()
    }

    /// Number of generated buffers held for reuse
    pub fn cached_buffers(&self) -> usize {
        self.buffer_cache.len()
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn update_voice(&mut self, id: InstanceId, change: impl FnOnce(&mut Voice)) -> bool {
        let Some(voice) = self.registry.get_mut(id) else {
            debug!(instance = %id, "control call for unknown voice ignored");
            return false;
        };
        change(voice);
        self.registry.refresh_gains();
        true
    }

    /// Synthesize content for `descriptor`, falling back to a sine on failure
    fn generate(&mut self, descriptor: &SoundDescriptor, sample_rate: u32) -> GeneratedSource {
        let strategy = descriptor.strategy();
        let cacheable = self.config.cache_buffers && matches!(strategy, SynthesisStrategy::Buffer(_));
        if cacheable {
            if let Some(buffer) = self.buffer_cache.get(descriptor.id()) {
                return GeneratedSource::Buffer(Arc::clone(buffer));
            }
        }

        match synth::synthesize(descriptor.id(), strategy, sample_rate) {
            Ok(source) => {
                if let (true, GeneratedSource::Buffer(buffer)) = (cacheable, &source) {
                    self.buffer_cache
                        .insert(descriptor.id().to_string(), Arc::clone(buffer));
                }
                source
            }
            Err(e) => {
                warn!(
                    sound = descriptor.id(),
                    error = %e,
                    "generator failed, falling back to sine"
                );
                synth::fallback(self.config.fallback_frequency_hz)
            }
        }
    }

    /// Start one registered voice; a voice that fails is removed
    fn start_voice(&mut self, id: InstanceId) -> Result<()> {
        let sample_rate = self.sample_rate();
        let Some(voice) = self.registry.get_mut(id) else {
            return Ok(());
        };
        if let Err(e) = voice.start() {
            warn!(instance = %id, error = %e, "voice failed to start");
            self.stop(id);
            return Err(e);
        }
        if voice.is_looping() {
            if let Some(params) = voice.oscillator_params().cloned() {
                self.scheduler.schedule(id, &params, sample_rate);
            }
        }
        Ok(())
    }

    fn start_pending(&mut self) {
        let pending: Vec<InstanceId> = self
            .registry
            .iter()
            .filter(|voice| voice.state() == PlayState::Created)
            .map(Voice::id)
            .collect();
        for id in pending {
            if let Err(e) = self.start_voice(id) {
                debug!(instance = %id, error = %e, "pending voice dropped");
            }
        }
    }

    /// Re-strike looping tones whose interval elapsed with a fresh node
    fn run_retriggers(&mut self, frames: u64) {
        let sample_rate = self.sample_rate();
        for due in self.scheduler.advance(frames) {
            let Some(voice) = self.registry.get_mut(due.id) else {
                self.scheduler.cancel(due.id);
                continue;
            };
            let node =
                SourceNode::from_generated(&GeneratedSource::Oscillator(due.params), true, sample_rate);
            match voice.replace_source(node) {
                Ok(()) => debug!(instance = %due.id, "tone re-triggered"),
                Err(e) => warn!(instance = %due.id, error = %e, "re-trigger failed"),
            }
        }
    }

    fn reap_ended(&mut self) {
        let ended = self.registry.extract_if(Voice::has_ended);
        if ended.is_empty() {
            return;
        }
        for mut voice in ended {
            self.scheduler.cancel(voice.id());
            voice.stop();
        }
        self.registry.refresh_gains();
    }
}

impl Drop for MixingEngine {
    fn drop(&mut self) {
        self.cleanup();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::SoundCatalog;
    use crate::engine::host::GestureGate;
    use approx::assert_relative_eq;

    const RATE: u32 = 8000;

    fn setup() -> (MixingEngine, SoundCatalog) {
        let mut engine = MixingEngine::offline(RATE);
        engine.resume().unwrap();
        (engine, SoundCatalog::builtin())
    }

    fn sound(catalog: &SoundCatalog, id: &str) -> Arc<SoundDescriptor> {
        catalog.get(id).unwrap()
    }

    #[test]
    fn test_initialize_is_idempotent() {
        let host = OfflineHost::new(RATE);
        let counters = host.counters();
        let mut engine = MixingEngine::new(Box::new(host), EngineConfig::default());
        engine.initialize().unwrap();
        engine.initialize().unwrap();
        assert_eq!(counters.opens(), 1);
        assert_eq!(engine.sample_rate(), RATE);
    }

    #[test]
    fn test_play_starts_voice() {
        let (mut engine, catalog) = setup();
        let id = engine.play(&sound(&catalog, "om-drone"), 0.5, true).unwrap();
        let voices = engine.active_voices();
        assert_eq!(voices.len(), 1);
        assert_eq!(voices[0].instance_id, id);
        assert!(voices[0].is_playing);
    }

    #[test]
    fn test_replay_returns_existing_id() {
        let (mut engine, catalog) = setup();
        let drone = sound(&catalog, "om-drone");
        let first = engine.play(&drone, 0.5, true).unwrap();
        let second = engine.play(&drone, 0.9, true).unwrap();
        assert_eq!(first, second);
        assert_eq!(engine.voice_count(), 1);
        // The existing voice is left untouched
        assert_eq!(engine.active_voices()[0].volume, 0.5);
    }

    #[test]
    fn test_multi_instance_config() {
        let config = EngineConfig {
            multi_instance: true,
            ..EngineConfig::default()
        };
        let mut engine = MixingEngine::new(Box::new(OfflineHost::new(RATE)), config);
        let drone = sound(&SoundCatalog::builtin(), "om-drone");
        let a = engine.play(&drone, 0.5, true).unwrap();
        let b = engine.play(&drone, 0.5, true).unwrap();
        assert_ne!(a, b);
        assert_eq!(engine.voice_count(), 2);
    }

    #[test]
    fn test_buffers_are_cached_and_shared() {
        let config = EngineConfig {
            multi_instance: true,
            ..EngineConfig::default()
        };
        let mut engine = MixingEngine::new(Box::new(OfflineHost::new(RATE)), config);
        let rain = sound(&SoundCatalog::builtin(), "rain");
        engine.play(&rain, 0.5, true).unwrap();
        engine.play(&rain, 0.5, true).unwrap();
        assert_eq!(engine.cached_buffers(), 1);
    }

    #[test]
    fn test_control_calls_on_unknown_id() {
        let (mut engine, _) = setup();
        let ghost = InstanceId::new();
        assert!(!engine.set_voice_volume(ghost, 0.3));
        assert!(!engine.mute_voice(ghost, true));
        assert!(!engine.solo_voice(ghost, true));
        assert!(!engine.stop(ghost));
    }

    #[test]
    fn test_master_volume_scales_audible_volume() {
        let (mut engine, catalog) = setup();
        let id = engine.play(&sound(&catalog, "om-drone"), 0.8, true).unwrap();
        engine.set_master_volume(0.5);
        assert_relative_eq!(engine.audible_volume(id).unwrap(), 0.4);
    }

    #[test]
    fn test_render_silent_until_running() {
        let mut engine = MixingEngine::offline(RATE);
        let catalog = SoundCatalog::builtin();
        engine.initialize().unwrap();
        engine.suspend().unwrap();
        let mut block = AudioBuffer::new(256, ChannelLayout::Stereo, RATE);
        engine.render(&mut block);
        assert_eq!(block.peak(), 0.0);

        engine.resume().unwrap();
        engine.play(&sound(&catalog, "om-drone"), 1.0, true).unwrap();
        let out = engine.render_seconds(0.5);
        assert!(out.peak() > 0.01);
        assert!(out.peak() <= 1.0);
    }

    #[test]
    fn test_render_is_clamped() {
        let config = EngineConfig {
            multi_instance: true,
            ..EngineConfig::default()
        };
        let mut engine = MixingEngine::new(Box::new(OfflineHost::new(RATE)), config);
        let catalog = SoundCatalog::builtin();
        for id in ["white-noise", "brown-noise", "pink-noise", "rain", "ocean-waves"] {
            engine.play(&sound(&catalog, id), 1.0, true).unwrap();
        }
        let out = engine.render_seconds(1.0);
        assert!(out.is_finite());
        assert!(out.peak() <= 1.0);
    }

    #[test]
    fn test_one_shot_voice_is_reaped() {
        let (mut engine, catalog) = setup();
        engine.play(&sound(&catalog, "temple-bell"), 1.0, false).unwrap();
        assert_eq!(engine.voice_count(), 1);
        let SynthesisStrategy::Buffer(bell) = sound(&catalog, "temple-bell").strategy() else {
            panic!("temple bell should be a buffer texture");
        };
        engine.render_seconds(bell.duration_secs() + 0.5);
        assert_eq!(engine.voice_count(), 0);
    }

    #[test]
    fn test_one_shot_tone_is_reaped() {
        let config = EngineConfig {
            one_shot_secs: 1.0,
            ..EngineConfig::default()
        };
        let mut engine = MixingEngine::new(Box::new(OfflineHost::new(RATE)), config);
        let catalog = SoundCatalog::builtin();
        engine.resume().unwrap();
        engine.play(&sound(&catalog, "city-hum"), 1.0, false).unwrap();
        assert!(engine.render_seconds(0.5).peak() > 0.0);

        engine.render_seconds(1.0);
        assert_eq!(engine.voice_count(), 0);
        assert_eq!(engine.render_seconds(0.25).peak(), 0.0);
    }

    #[test]
    fn test_looping_chime_is_retriggered() {
        let (mut engine, catalog) = setup();
        let id = engine.play(&sound(&catalog, "meditation-chime"), 1.0, true).unwrap();
        // Render past the ring-out and the first re-trigger
        engine.render_seconds(13.0);
        assert_eq!(engine.voice_count(), 1);
        assert_eq!(engine.active_voices()[0].instance_id, id);
        let tail = engine.render_seconds(0.5);
        assert!(tail.peak() > 0.0);
    }

    #[test]
    fn test_generator_failure_falls_back() {
        // Buffer synthesis rejects rates under 8 kHz; the oscillator fallback does not
        let mut engine = MixingEngine::offline(4000);
        let catalog = SoundCatalog::builtin();
        let id = engine.play(&sound(&catalog, "rain"), 0.5, true);
        assert!(id.is_ok());
        assert_eq!(engine.cached_buffers(), 0);
        let out = engine.render_seconds(0.25);
        assert!(out.peak() > 0.0);
    }

    #[test]
    fn test_init_failure_blocks_play() {
        let mut engine = MixingEngine::new(
            Box::new(OfflineHost::failing("no device")),
            EngineConfig::default(),
        );
        let catalog = SoundCatalog::builtin();
        assert!(engine.initialize().is_err());
        let err = engine.play(&sound(&catalog, "rain"), 0.5, true).unwrap_err();
        assert_eq!(err.error_code(), "CONTEXT_UNAVAILABLE");
        assert!(engine.active_voices().is_empty());
    }

    #[test]
    fn test_gated_play_is_deferred() {
        let gate = GestureGate::new();
        let host = OfflineHost::new(RATE).with_gesture_gate(gate.clone());
        let mut engine = MixingEngine::new(Box::new(host), EngineConfig::default());
        let catalog = SoundCatalog::builtin();

        let id = engine.play(&sound(&catalog, "om-drone"), 0.5, true).unwrap();
        assert!(engine.is_resume_pending());
        assert!(!engine.active_voices()[0].is_playing);

        gate.release();
        assert!(engine.poll());
        let info = &engine.active_voices()[0];
        assert_eq!(info.instance_id, id);
        assert!(info.is_playing);
    }

    #[test]
    fn test_cleanup_closes_once() {
        let host = OfflineHost::new(RATE);
        let counters = host.counters();
        let mut engine = MixingEngine::new(Box::new(host), EngineConfig::default());
        engine.play(&sound(&SoundCatalog::builtin(), "rain"), 0.5, true).unwrap();

        engine.cleanup();
        engine.cleanup();
        drop(engine);
        assert_eq!(counters.closes(), 1);
    }

    #[test]
    fn test_play_after_cleanup_fails() {
        let (mut engine, catalog) = setup();
        engine.cleanup();
        let err = engine.play(&sound(&catalog, "rain"), 0.5, true).unwrap_err();
        assert_eq!(err.error_code(), "CONTEXT_CLOSED");
    }

    #[test]
    fn test_drop_closes_context() {
        let host = OfflineHost::new(RATE);
        let counters = host.counters();
        {
            let mut engine = MixingEngine::new(Box::new(host), EngineConfig::default());
            engine.resume().unwrap();
        }
        assert_eq!(counters.closes(), 1);
    }
}
