//! CLI Command Implementations
//!
//! Every command drives a real `MixingEngine` on an offline host, so what
//! gets written to disk is exactly what the engine would play.

use std::path::Path;

use anyhow::{bail, Context};
use tracing::{info, warn};

use crate::catalog::SoundCatalog;
use crate::cli::OutputArgs;
use crate::config::EngineConfig;
use crate::engine::buffer::{channel_correlation, channel_mean};
use crate::engine::{export_wav, AudioBuffer, ChannelLayout, ExportFormat, MixingEngine, OfflineHost};
use crate::mix::MixSnapshot;
use crate::synth::{self, GeneratedSource, Oscillator};

/// Seconds of oscillator output `inspect` measures
const INSPECT_SECONDS: f32 = 2.0;

/// Load the engine config, falling back to defaults when it cannot be read
pub fn load_config(path: Option<&Path>) -> EngineConfig {
    let Some(path) = path else {
        return EngineConfig::default();
    };
    match EngineConfig::from_file(path) {
        Ok(config) => config,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "config not loaded, using defaults");
            EngineConfig::default()
        }
    }
}

/// Load a custom catalog, or the builtin one
pub fn load_catalog(path: Option<&Path>) -> anyhow::Result<SoundCatalog> {
    match path {
        Some(path) => SoundCatalog::from_file(path)
            .with_context(|| format!("loading catalog {}", path.display())),
        None => Ok(SoundCatalog::builtin()),
    }
}

/// Print the catalog.
pub fn list(catalog: &SoundCatalog, category: Option<&str>, json: bool) -> anyhow::Result<()> {
    let sounds: Vec<_> = catalog
        .iter()
        .filter(|d| category.map_or(true, |c| d.category().to_string() == c))
        .collect();

    if json {
        let descriptors: Vec<_> = sounds.iter().map(|d| d.as_ref()).collect();
        println!("{}", serde_json::to_string_pretty(&descriptors)?);
        return Ok(());
    }

    println!("{:<18} {:<20} {:<11} {:<18} premium", "id", "name", "category", "strategy");
    for d in sounds {
        println!(
            "{:<18} {:<20} {:<11} {:<18} {}",
            d.id(),
            d.display_name(),
            d.category().to_string(),
            d.strategy().tag(),
            if d.is_premium_only() { "yes" } else { "" }
        );
    }
    Ok(())
}

/// Render one sound to a WAV file.
#[allow(clippy::too_many_arguments)]
pub fn render(
    catalog: &SoundCatalog,
    config: EngineConfig,
    sound: &str,
    out: &Path,
    seconds: f32,
    volume: Option<f32>,
    once: bool,
    output: OutputArgs,
) -> anyhow::Result<()> {
    let descriptor = catalog.require(sound)?;
    let mut engine = offline_engine(config, output.sample_rate)?;
    let volume = volume.unwrap_or_else(|| descriptor.base_volume());

    engine
        .play(&descriptor, volume, descriptor.looping() && !once)
        .with_context(|| format!("playing {sound}"))?;
    let audio = engine.render_seconds(seconds);
    write(&audio, out, output)?;

    println!(
        "Rendered {} at volume {:.2} ({:.1}s) to {}",
        descriptor.display_name(),
        volume,
        seconds,
        out.display()
    );
    Ok(())
}

/// Render a saved mix to a WAV file.
pub fn render_mix(
    catalog: &SoundCatalog,
    config: EngineConfig,
    mix_path: &Path,
    out: &Path,
    seconds: f32,
    output: OutputArgs,
) -> anyhow::Result<()> {
    let mix = MixSnapshot::load(mix_path)
        .with_context(|| format!("loading mix {}", mix_path.display()))?;
    let mut engine = offline_engine(config, output.sample_rate)?;

    let ids = mix.restore(&mut engine, catalog)?;
    if ids.is_empty() {
        bail!("mix {} has no playable sounds", mix_path.display());
    }
    let audio = engine.render_seconds(seconds);
    write(&audio, out, output)?;

    println!(
        "Rendered {} of {} sounds ({:.1}s) to {}",
        ids.len(),
        mix.entries.len(),
        seconds,
        out.display()
    );
    Ok(())
}

/// Print statistics of a sound's generated audio.
pub fn inspect(catalog: &SoundCatalog, sound: &str, sample_rate: u32) -> anyhow::Result<()> {
    let descriptor = catalog.require(sound)?;
    let source = synth::synthesize(descriptor.id(), descriptor.strategy(), sample_rate)
        .with_context(|| format!("synthesizing {sound}"))?;

    println!("{} ({})", descriptor.display_name(), descriptor.id());
    println!("  strategy:    {}", descriptor.strategy().tag());

    let audio = match source {
        GeneratedSource::Buffer(buffer) => AudioBuffer::clone(&buffer),
        GeneratedSource::Oscillator(params) => {
            println!("  waveform:    {:?} @ {:.1} Hz", params.waveform, params.frequency);
            if let Some(beat) = params.binaural_beat {
                println!("  binaural:    {beat:.1} Hz");
            }
            if let Some(cutoff) = params.lowpass_cutoff {
                println!("  low-pass:    {cutoff:.0} Hz");
            }
            let frames = (INSPECT_SECONDS * sample_rate as f32) as usize;
            let mut buffer = AudioBuffer::new(frames, ChannelLayout::Stereo, sample_rate);
            Oscillator::new(params, sample_rate).render(&mut buffer.samples, frames);
            buffer
        }
    };

    println!("  duration:    {:.2}s", audio.duration_secs());
    println!("  channels:    {}", audio.channels());
    println!("  peak:        {:.3}", audio.peak());
    println!("  rms:         {:.1} dB", audio.rms_db());
    for ch in 0..audio.channels() {
        println!("  dc[{ch}]:       {:+.4}", channel_mean(audio.channel(ch)));
    }
    if audio.channels() == 2 {
        println!(
            "  correlation: {:.3}",
            channel_correlation(audio.channel(0), audio.channel(1))
        );
    }
    Ok(())
}

fn offline_engine(config: EngineConfig, sample_rate: u32) -> anyhow::Result<MixingEngine> {
    let mut engine = MixingEngine::new(Box::new(OfflineHost::new(sample_rate)), config);
    engine.resume().context("starting offline audio context")?;
    Ok(engine)
}

fn write(audio: &AudioBuffer, out: &Path, output: OutputArgs) -> anyhow::Result<()> {
    export_wav(audio, out, ExportFormat::new(output.bit_depth))
        .with_context(|| format!("writing {}", out.display()))?;
    info!(path = %out.display(), peak = audio.peak(), "render written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    fn output() -> OutputArgs {
        OutputArgs {
            sample_rate: 8000,
            bit_depth: 16,
        }
    }

    #[test]
    fn test_render_writes_wav() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("drone.wav");
        let catalog = SoundCatalog::builtin();

        render(&catalog, EngineConfig::default(), "om-drone", &out, 1.0, Some(0.8), false, output())
            .unwrap();

        let reader = hound::WavReader::open(&out).unwrap();
        assert_eq!(reader.spec().channels, 2);
        assert_eq!(reader.duration(), 8000);
    }

    #[test]
    fn test_render_unknown_sound() {
        let dir = tempdir().unwrap();
        let catalog = SoundCatalog::builtin();
        let result = render(
            &catalog,
            EngineConfig::default(),
            "thunder",
            &dir.path().join("x.wav"),
            1.0,
            Some(0.5),
            false,
            output(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_render_defaults_to_base_volume() {
        let dir = tempdir().unwrap();
        let catalog = SoundCatalog::builtin();
        let quiet = dir.path().join("quiet.wav");
        let loud = dir.path().join("loud.wav");
        let descriptor = catalog.get("solfeggio-528").unwrap();
        assert!(descriptor.base_volume() < 1.0);

        render(&catalog, EngineConfig::default(), "solfeggio-528", &quiet, 1.0, None, false, output())
            .unwrap();
        render(&catalog, EngineConfig::default(), "solfeggio-528", &loud, 1.0, Some(1.0), false, output())
            .unwrap();

        let quiet = crate::engine::import_wav(&quiet).unwrap();
        let loud = crate::engine::import_wav(&loud).unwrap();
        let ratio = quiet.peak() / loud.peak();
        assert!((ratio - descriptor.base_volume()).abs() < 0.02, "ratio {ratio}");
    }

    #[test]
    fn test_render_once_ends_sustained_tone() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("once.wav");
        let config = EngineConfig {
            one_shot_secs: 0.5,
            ..EngineConfig::default()
        };
        render(&SoundCatalog::builtin(), config, "om-drone", &out, 1.0, None, true, output()).unwrap();

        let audio = crate::engine::import_wav(&out).unwrap();
        let tail = &audio.channel(0)[6000..];
        assert!(tail.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_render_mix_file() {
        let dir = tempdir().unwrap();
        let mix_path = dir.path().join("mix.json");
        let mut file = std::fs::File::create(&mix_path).unwrap();
        write!(
            file,
            r#"{{"masterVolume": 0.8, "entries": [
                {{"descriptorId": "om-drone", "volume": 0.5}},
                {{"descriptorId": "city-hum", "volume": 0.3, "isMuted": true}}
            ]}}"#
        )
        .unwrap();

        let out = dir.path().join("mix.wav");
        render_mix(&SoundCatalog::builtin(), EngineConfig::default(), &mix_path, &out, 0.5, output())
            .unwrap();
        assert!(out.exists());
    }

    #[test]
    fn test_missing_config_falls_back() {
        let config = load_config(Some(Path::new("/no/such/config.json")));
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_inspect_both_strategies() {
        let catalog = SoundCatalog::builtin();
        inspect(&catalog, "brown-noise", 8000).unwrap();
        inspect(&catalog, "alpha-waves", 8000).unwrap();
    }
}
