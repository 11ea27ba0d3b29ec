//! Audio Engine Module
//!
//! The mixing side of zenmix:
//! - Audio buffers and gain staging
//! - The platform host seam and shared context state machine
//! - Voices, the voice registry and re-trigger scheduling
//! - The `MixingEngine` control surface
//! - WAV export

pub mod buffer;
pub mod context;
pub mod gain;
pub mod host;
pub mod io;
pub mod mixer;
pub mod registry;
pub mod scheduler;
pub mod voice;

pub use buffer::{AudioBuffer, ChannelLayout, DEFAULT_SAMPLE_RATE};
pub use context::{ContextState, SharedContext};
pub use gain::{clamp_unit, GainRamp};
pub use host::{AudioHost, GestureGate, HostCounters, OfflineHost, ResumeStatus};
pub use io::{export_wav, import_wav, ExportFormat};
pub use mixer::{MixingEngine, VoiceInfo, RENDER_BLOCK_FRAMES};
pub use registry::{effective_volume, VoiceRegistry};
pub use scheduler::RetriggerScheduler;
pub use voice::{InstanceId, PlayState, SourceNode, Voice};
