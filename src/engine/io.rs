//! WAV file I/O
//!
//! Offline renders are written out as WAV so a mix can be auditioned
//! outside the engine. Import exists for inspecting previously exported
//! files and for round-trip checks in tests.

use std::path::Path;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use tracing::debug;

use crate::engine::buffer::{AudioBuffer, ChannelLayout};
use crate::error::{Result, ZenmixError};

/// Export format configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportFormat {
    /// Bit depth: 16, 24, or 32 (32 is float)
    pub bit_depth: u16,
}

impl Default for ExportFormat {
    fn default() -> Self {
        Self { bit_depth: 24 }
    }
}

impl ExportFormat {
    pub fn new(bit_depth: u16) -> Self {
        Self { bit_depth }
    }

    /// 16-bit integer, the smallest files
    pub fn compact() -> Self {
        Self { bit_depth: 16 }
    }

    /// 32-bit float, bit-exact with the engine's internal samples
    pub fn float() -> Self {
        Self { bit_depth: 32 }
    }

    fn wav_spec(&self, channels: u16, sample_rate: u32) -> Result<WavSpec> {
        let sample_format = match self.bit_depth {
            16 | 24 => SampleFormat::Int,
            32 => SampleFormat::Float,
            other => {
                return Err(ZenmixError::InvalidAudioFormat {
                    reason: format!("unsupported bit depth {other} (16, 24 or 32)"),
                })
            }
        };
        Ok(WavSpec {
            channels,
            sample_rate,
            bits_per_sample: self.bit_depth,
            sample_format,
        })
    }
}

/// Write `buffer` to a WAV file at the buffer's own sample rate
///
/// # Arguments
/// * `buffer` - Mono or stereo audio to write
/// * `path` - Destination; an existing file is overwritten
/// * `format` - Bit depth to write
pub fn export_wav(buffer: &AudioBuffer, path: &Path, format: ExportFormat) -> Result<()> {
    let channels = u16::try_from(buffer.channels()).unwrap_or(u16::MAX);
    let spec = format.wav_spec(channels, buffer.sample_rate)?;
    let mut writer = WavWriter::create(path, spec)?;

    let interleaved = buffer.to_interleaved();
    match format.bit_depth {
        16 => {
            for sample in interleaved {
                writer.write_sample((sample * 32767.0).clamp(-32768.0, 32767.0) as i16)?;
            }
        }
        24 => {
            for sample in interleaved {
                // hound stores 24-bit samples in an i32
                writer.write_sample((sample * 8_388_607.0).clamp(-8_388_608.0, 8_388_607.0) as i32)?;
            }
        }
        _ => {
            for sample in interleaved {
                writer.write_sample(sample)?;
            }
        }
    }

    writer.finalize()?;
    debug!(
        path = %path.display(),
        seconds = buffer.duration_secs(),
        bit_depth = format.bit_depth,
        "exported wav"
    );
    Ok(())
}

/// Read a mono or stereo WAV file into an [`AudioBuffer`]
///
/// No resampling is done; the buffer keeps the file's sample rate.
pub fn import_wav(path: &Path) -> Result<AudioBuffer> {
    let reader = WavReader::open(path)?;
    let spec = reader.spec();

    let layout = ChannelLayout::from_count(spec.channels as usize).ok_or_else(|| {
        ZenmixError::InvalidAudioFormat {
            reason: format!("{}-channel audio (only mono/stereo supported)", spec.channels),
        }
    })?;

    let interleaved: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader.into_samples::<f32>().collect::<std::result::Result<_, _>>()?,
        SampleFormat::Int => {
            let scale = 1.0 / (1_i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 * scale))
                .collect::<std::result::Result<_, _>>()?
        }
    };

    AudioBuffer::from_interleaved(&interleaved, layout, spec.sample_rate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use tempfile::tempdir;

    fn test_tone(sample_rate: u32) -> AudioBuffer {
        let mut buffer = AudioBuffer::new(sample_rate as usize / 10, ChannelLayout::Stereo, sample_rate);
        let w = 2.0 * std::f32::consts::PI * 440.0 / sample_rate as f32;
        for ch in 0..2 {
            for (i, s) in buffer.channel_mut(ch).iter_mut().enumerate() {
                *s = 0.5 * (w * i as f32).sin();
            }
        }
        buffer
    }

    #[test]
    fn test_export_and_import_24bit() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        let original = test_tone(48000);

        export_wav(&original, &path, ExportFormat::default()).unwrap();
        let loaded = import_wav(&path).unwrap();

        assert_eq!(loaded.sample_rate, 48000);
        assert_eq!(loaded.channels(), 2);
        assert_eq!(loaded.len(), original.len());
        for (a, b) in original.channel(0).iter().zip(loaded.channel(0)) {
            assert_abs_diff_eq!(a, b, epsilon = 1e-4);
        }
    }

    #[test]
    fn test_float_export_is_exact() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        let original = test_tone(22050);

        export_wav(&original, &path, ExportFormat::float()).unwrap();
        let loaded = import_wav(&path).unwrap();
        assert_eq!(loaded, original);
    }

    #[test]
    fn test_16bit_export_keeps_rate() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        export_wav(&test_tone(44100), &path, ExportFormat::compact()).unwrap();

        let reader = WavReader::open(&path).unwrap();
        assert_eq!(reader.spec().bits_per_sample, 16);
        assert_eq!(reader.spec().sample_rate, 44100);
    }

    #[test]
    fn test_unsupported_bit_depth() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.wav");
        let err = export_wav(&test_tone(8000), &path, ExportFormat::new(12)).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_AUDIO_FORMAT");
    }

    #[test]
    fn test_import_rejects_surround() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("surround.wav");
        let spec = hound::WavSpec {
            channels: 6,
            sample_rate: 8000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for _ in 0..60 {
            writer.write_sample(0_i16).unwrap();
        }
        writer.finalize().unwrap();

        let err = import_wav(&path).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_AUDIO_FORMAT");
    }

    #[test]
    fn test_import_missing_file() {
        let err = import_wav(Path::new("/definitely/not/here.wav")).unwrap_err();
        assert!(matches!(err, ZenmixError::Wav(_)));
    }
}
