//! Signal Generator
//!
//! Turns a sound's synthesis strategy into playable content: either a
//! looping buffer rendered once, or the parameters for a live oscillator.
//! Everything here is stateless with respect to the engine.

pub mod filter;
pub mod noise;
pub mod oscillator;
pub mod textures;

use std::sync::Arc;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::engine::buffer::AudioBuffer;
use crate::error::{Result, ZenmixError};

pub use filter::{Biquad, FilterKind};
pub use noise::{BrownNoise, PinkNoise, SparseEvents};
pub use oscillator::{Lfo, Oscillator, OscillatorParams, Strike, ToneKind, Waveform};
pub use textures::BufferAlgorithm;

/// Lowest sample rate buffer synthesis accepts
pub const MIN_SAMPLE_RATE: u32 = 8000;

/// Highest sample rate buffer synthesis accepts
pub const MAX_SAMPLE_RATE: u32 = 192_000;

/// How a sound is generated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "name", rename_all = "snake_case")]
pub enum SynthesisStrategy {
    /// Render a texture once and loop it
    Buffer(BufferAlgorithm),
    /// Run a live oscillator
    Oscillator(ToneKind),
}

impl SynthesisStrategy {
    /// Resolve a strategy from a single tag, exact match only
    pub fn from_tag(tag: &str) -> Option<Self> {
        BufferAlgorithm::from_tag(tag)
            .map(SynthesisStrategy::Buffer)
            .or_else(|| ToneKind::from_tag(tag).map(SynthesisStrategy::Oscillator))
    }

    pub fn tag(&self) -> &'static str {
        match self {
            SynthesisStrategy::Buffer(alg) => alg.tag(),
            SynthesisStrategy::Oscillator(tone) => tone.tag(),
        }
    }

    /// Every strategy tag, buffers first
    pub fn all_tags() -> impl Iterator<Item = &'static str> {
        BufferAlgorithm::ALL
            .iter()
            .map(|alg| alg.tag())
            .chain(ToneKind::ALL.iter().map(|tone| tone.tag()))
    }
}

/// Playable content produced for one sound
#[derive(Debug, Clone)]
pub enum GeneratedSource {
    /// Immutable buffer shared between voices of the same sound
    Buffer(Arc<AudioBuffer>),
    Oscillator(OscillatorParams),
}

impl GeneratedSource {
    pub fn is_buffer(&self) -> bool {
        matches!(self, GeneratedSource::Buffer(_))
    }
}

/// Generate content for `strategy` at `sample_rate`
///
/// # Arguments
/// * `sound_id` - Used only in error messages
/// * `strategy` - Strategy resolved at catalog load
/// * `sample_rate` - The platform context's sample rate
///
/// # Returns
/// The generated source, or an error the caller is expected to answer with
/// [`fallback`].
pub fn synthesize(
    sound_id: &str,
    strategy: SynthesisStrategy,
    sample_rate: u32,
) -> Result<GeneratedSource> {
    let mut rng = SmallRng::from_entropy();
    synthesize_with_rng(sound_id, strategy, sample_rate, &mut rng)
}

/// [`synthesize`] with a caller-supplied random source
pub fn synthesize_with_rng<R: Rng + ?Sized>(
    sound_id: &str,
    strategy: SynthesisStrategy,
    sample_rate: u32,
    rng: &mut R,
) -> Result<GeneratedSource> {
    match strategy {
        SynthesisStrategy::Buffer(alg) => {
            if !(MIN_SAMPLE_RATE..=MAX_SAMPLE_RATE).contains(&sample_rate) {
                return Err(ZenmixError::InvalidSampleRate { sample_rate });
            }
            let mut buffer = alg.render(sample_rate, rng);
            validate(sound_id, &mut buffer)?;
            debug!(
                sound = sound_id,
                algorithm = alg.tag(),
                seconds = buffer.duration_secs(),
                "rendered texture buffer"
            );
            Ok(GeneratedSource::Buffer(Arc::new(buffer)))
        }
        SynthesisStrategy::Oscillator(tone) => {
            if sample_rate == 0 {
                return Err(ZenmixError::InvalidSampleRate { sample_rate });
            }
            Ok(GeneratedSource::Oscillator(tone.params()))
        }
    }
}

/// The simplest generator: a plain sine oscillator
pub fn fallback(frequency: f32) -> GeneratedSource {
    GeneratedSource::Oscillator(OscillatorParams::fallback(frequency))
}

fn validate(sound_id: &str, buffer: &mut AudioBuffer) -> Result<()> {
    if !buffer.is_finite() {
        return Err(ZenmixError::DspOverflow {
            sound_id: sound_id.to_string(),
        });
    }
    if buffer.is_empty() || !buffer.is_audible() {
        return Err(ZenmixError::SynthesisFailed {
            sound_id: sound_id.to_string(),
            reason: "generated buffer is silent".to_string(),
        });
    }
    buffer.clamp();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_tags_are_unique() {
        let tags: Vec<&str> = SynthesisStrategy::all_tags().collect();
        let mut deduped = tags.clone();
        deduped.sort_unstable();
        deduped.dedup();
        assert_eq!(tags.len(), deduped.len());
    }

    #[test]
    fn test_from_tag_resolves_both_kinds() {
        assert_eq!(
            SynthesisStrategy::from_tag("brown-noise"),
            Some(SynthesisStrategy::Buffer(BufferAlgorithm::BrownNoise))
        );
        assert_eq!(
            SynthesisStrategy::from_tag("om-drone"),
            Some(SynthesisStrategy::Oscillator(ToneKind::OmDrone))
        );
        // Substrings never match
        assert_eq!(SynthesisStrategy::from_tag("rainforest"), None);
    }

    #[test]
    fn test_buffer_synthesis_rejects_bad_sample_rate() {
        let strategy = SynthesisStrategy::Buffer(BufferAlgorithm::Rain);
        let err = synthesize("rain", strategy, 4000).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_SAMPLE_RATE");
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_oscillator_synthesis_returns_params() {
        let source = synthesize(
            "om",
            SynthesisStrategy::Oscillator(ToneKind::OmDrone),
            48000,
        )
        .unwrap();
        match source {
            GeneratedSource::Oscillator(params) => assert_eq!(params, ToneKind::OmDrone.params()),
            other => panic!("expected oscillator, got {:?}", other),
        }
    }

    #[test]
    fn test_fallback_is_plain_sine() {
        match fallback(220.0) {
            GeneratedSource::Oscillator(params) => {
                assert_eq!(params.waveform, Waveform::Sine);
                assert!(params.lfo.is_none());
                assert!(params.lowpass_cutoff.is_none());
            }
            other => panic!("expected oscillator, got {:?}", other),
        }
    }

    #[test]
    fn test_serde_strategy_shape() {
        let json = serde_json::to_string(&SynthesisStrategy::Buffer(BufferAlgorithm::Ocean)).unwrap();
        assert_eq!(json, r#"{"kind":"buffer","name":"ocean"}"#);
    }
}
