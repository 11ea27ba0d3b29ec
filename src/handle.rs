//! Shared engine handle
//!
//! The audio callback thread pulls blocks while UI code issues control
//! calls. Both go through one lock, which also serialises concurrent `play`
//! calls for the same sound so the at-most-one-voice rule holds.

use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

use crate::catalog::SoundDescriptor;
use crate::engine::{AudioBuffer, InstanceId, MixingEngine, VoiceInfo};
use crate::error::Result;

/// Cloneable, thread-safe handle to one [`MixingEngine`]
#[derive(Debug, Clone)]
pub struct EngineHandle {
    inner: Arc<Mutex<MixingEngine>>,
}

impl EngineHandle {
    pub fn new(engine: MixingEngine) -> Self {
        Self {
            inner: Arc::new(Mutex::new(engine)),
        }
    }

    /// Lock the engine for a sequence of calls
    pub fn lock(&self) -> MutexGuard<'_, MixingEngine> {
        self.inner.lock()
    }

    /// Run `f` with the engine locked
    pub fn with<T>(&self, f: impl FnOnce(&mut MixingEngine) -> T) -> T {
        f(&mut self.inner.lock())
    }

    pub fn play(&self, descriptor: &Arc<SoundDescriptor>, volume: f32, looping: bool) -> Result<InstanceId> {
        self.inner.lock().play(descriptor, volume, looping)
    }

    pub fn stop(&self, id: InstanceId) -> bool {
        self.inner.lock().stop(id)
    }

    pub fn stop_all(&self) {
        self.inner.lock().stop_all();
    }

    pub fn active_voices(&self) -> Vec<VoiceInfo> {
        self.inner.lock().active_voices()
    }

    /// Audio-thread entry point
    pub fn render(&self, out: &mut AudioBuffer) {
        self.inner.lock().render(out);
    }

    /// Tear the engine down now rather than when the last handle drops
    pub fn cleanup(&self) {
        self.inner.lock().cleanup();
    }
}
