//! Zenmix - Procedural Ambient Audio Engine
//!
//! Zenmix generates ambient sound (rain, ocean, forest, noise colours,
//! bells, drones, binaural tones) procedurally and mixes any number of
//! them with per-voice volume, mute and solo plus a master stage.
//!
//! # Architecture
//!
//! - `synth`: the Signal Generator. Pure functions turning a sound's
//!   synthesis strategy into a looping buffer or oscillator parameters.
//! - `engine`: voices, the voice registry, the shared audio context and the
//!   `MixingEngine` that owns them all.
//! - `catalog`, `mix`, `lifecycle`, `handle`: what an application wires
//!   around the engine (sound definitions, saved mixes, page lifecycle and
//!   cross-thread sharing).

pub mod catalog;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod handle;
pub mod lifecycle;
pub mod mix;
pub mod synth;

pub use catalog::{Category, SoundCatalog, SoundDescriptor};
pub use config::EngineConfig;
pub use engine::{InstanceId, MixingEngine, VoiceInfo};
pub use error::{Result, ZenmixError};
pub use handle::EngineHandle;
pub use lifecycle::LifecycleEvent;
pub use mix::{MixEntry, MixSnapshot};
