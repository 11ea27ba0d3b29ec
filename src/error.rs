//! Error handling for Zenmix
//!
//! Errors are produced inside the engine and its generators. The
//! `MixingEngine` boundary absorbs them: callers only ever see a failed
//! `play` result or a `false` from a control call.

use thiserror::Error;

/// Result type alias for Zenmix operations
pub type Result<T> = std::result::Result<T, ZenmixError>;

/// Main error type for Zenmix operations
#[derive(Error, Debug)]
pub enum ZenmixError {
    // Context Errors
    #[error("Audio context unavailable: {reason}")]
    ContextUnavailable { reason: String },

    #[error("Audio context has been closed")]
    ContextClosed,

    #[error("Audio engine is disabled")]
    EngineDisabled,

    // Catalog Errors
    #[error("Unknown sound: {id}")]
    UnknownSound { id: String },

    #[error("Catalog error: {reason}")]
    CatalogError { reason: String },

    // Synthesis Errors
    #[error("Invalid sample rate: {sample_rate} Hz")]
    InvalidSampleRate { sample_rate: u32 },

    #[error("Synthesis failed for '{sound_id}': {reason}")]
    SynthesisFailed { sound_id: String, reason: String },

    #[error("DSP overflow: generator produced invalid audio (NaN/Inf) for '{sound_id}'")]
    DspOverflow { sound_id: String },

    #[error("Source node already started")]
    NodeAlreadyStarted,

    // Mix Errors
    #[error("Invalid mix: {reason}")]
    InvalidMix { reason: String },

    // I/O Errors
    #[error("Invalid audio format: {reason}")]
    InvalidAudioFormat { reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),
}

impl ZenmixError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            ZenmixError::ContextUnavailable { .. } => "CONTEXT_UNAVAILABLE",
            ZenmixError::ContextClosed => "CONTEXT_CLOSED",
            ZenmixError::EngineDisabled => "ENGINE_DISABLED",
            ZenmixError::UnknownSound { .. } => "UNKNOWN_SOUND",
            ZenmixError::CatalogError { .. } => "CATALOG_ERROR",
            ZenmixError::InvalidSampleRate { .. } => "INVALID_SAMPLE_RATE",
            ZenmixError::SynthesisFailed { .. } => "SYNTHESIS_FAILED",
            ZenmixError::DspOverflow { .. } => "DSP_OVERFLOW",
            ZenmixError::NodeAlreadyStarted => "NODE_ALREADY_STARTED",
            ZenmixError::InvalidMix { .. } => "INVALID_MIX",
            ZenmixError::InvalidAudioFormat { .. } => "INVALID_AUDIO_FORMAT",
            ZenmixError::Io(_) => "IO_ERROR",
            ZenmixError::Serialization(_) => "SERIALIZATION_ERROR",
            ZenmixError::Wav(_) => "WAV_ERROR",
        }
    }

    /// Check if this error is recoverable
    ///
    /// Synthesis errors are recoverable because the engine can fall back to
    /// the plain oscillator generator.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ZenmixError::InvalidSampleRate { .. }
                | ZenmixError::SynthesisFailed { .. }
                | ZenmixError::DspOverflow { .. }
                | ZenmixError::UnknownSound { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = ZenmixError::UnknownSound {
            id: "thunder".to_string(),
        };
        assert_eq!(err.error_code(), "UNKNOWN_SOUND");
        assert_eq!(ZenmixError::EngineDisabled.error_code(), "ENGINE_DISABLED");
    }

    #[test]
    fn test_synthesis_errors_are_recoverable() {
        let err = ZenmixError::DspOverflow {
            sound_id: "rain".to_string(),
        };
        assert!(err.is_recoverable());
        assert!(!ZenmixError::ContextClosed.is_recoverable());
    }
}
