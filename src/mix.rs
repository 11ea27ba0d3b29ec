//! Saved mixes
//!
//! A mix is the list of sounds that were playing with their volume, mute and
//! solo flags, plus the master volume. The engine owns no format for this;
//! a snapshot is taken from [`MixingEngine::active_voices`] and restored with
//! `stop_all` followed by one `play` per entry.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::catalog::SoundCatalog;
use crate::engine::{clamp_unit, InstanceId, MixingEngine};
use crate::error::{Result, ZenmixError};

/// One sound in a saved mix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MixEntry {
    pub descriptor_id: String,
    pub volume: f32,
    #[serde(default)]
    pub is_solo: bool,
    #[serde(default)]
    pub is_muted: bool,
}

/// A saved mix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MixSnapshot {
    pub master_volume: f32,
    pub entries: Vec<MixEntry>,
    #[serde(default = "Utc::now")]
    pub saved_at: DateTime<Utc>,
}

impl MixSnapshot {
    /// Record what the engine is playing right now, in play order
    pub fn capture(engine: &MixingEngine) -> Self {
        let entries = engine
            .active_voices()
            .into_iter()
            .map(|voice| MixEntry {
                descriptor_id: voice.descriptor_id,
                volume: voice.volume,
                is_solo: voice.is_solo,
                is_muted: voice.is_muted,
            })
            .collect();
        Self {
            master_volume: engine.master_volume(),
            entries,
            saved_at: Utc::now(),
        }
    }

    /// Replace whatever the engine is playing with this mix
    ///
    /// Every entry is checked against `catalog` before anything is stopped,
    /// so an invalid mix leaves the current one alone. Entries that fail to
    /// start are skipped.
    ///
    /// # Returns
    /// Instance ids of the restored voices, in entry order
    pub fn restore(&self, engine: &mut MixingEngine, catalog: &SoundCatalog) -> Result<Vec<InstanceId>> {
        let descriptors = self
            .entries
            .iter()
            .map(|entry| {
                catalog.get(&entry.descriptor_id).ok_or_else(|| ZenmixError::InvalidMix {
                    reason: format!("unknown sound '{}'", entry.descriptor_id),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        engine.stop_all();
        engine.set_master_volume(self.master_volume);

        let mut ids = Vec::with_capacity(self.entries.len());
        for (entry, descriptor) in self.entries.iter().zip(&descriptors) {
            match engine.play(descriptor, entry.volume, descriptor.looping()) {
                Ok(id) => {
                    engine.mute_voice(id, entry.is_muted);
                    engine.solo_voice(id, entry.is_solo);
                    ids.push(id);
                }
                Err(e) => warn!(sound = %entry.descriptor_id, error = %e, "mix entry not restored"),
            }
        }
        info!(restored = ids.len(), total = self.entries.len(), "mix restored");
        Ok(ids)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a mix, clamping volumes into range
    pub fn from_json_str(json: &str) -> Result<Self> {
        let mut mix: Self = serde_json::from_str(json)?;
        mix.master_volume = clamp_unit(mix.master_volume);
        for entry in &mut mix.entries {
            entry.volume = clamp_unit(entry.volume);
        }
        Ok(mix)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn engine() -> MixingEngine {
        let mut engine = MixingEngine::offline(8000);
        engine.resume().unwrap();
        engine
    }

    #[test]
    fn test_capture_records_flags() {
        let catalog = SoundCatalog::builtin();
        let mut engine = engine();
        let a = engine.play(&catalog.get("om-drone").unwrap(), 0.3, true).unwrap();
        engine.play(&catalog.get("city-hum").unwrap(), 0.6, true).unwrap();
        engine.solo_voice(a, true);
        engine.set_master_volume(0.7);

        let mix = MixSnapshot::capture(&engine);
        assert_eq!(mix.master_volume, 0.7);
        assert_eq!(
            mix.entries,
            vec![
                MixEntry {
                    descriptor_id: "om-drone".to_string(),
                    volume: 0.3,
                    is_solo: true,
                    is_muted: false,
                },
                MixEntry {
                    descriptor_id: "city-hum".to_string(),
                    volume: 0.6,
                    is_solo: false,
                    is_muted: false,
                },
            ]
        );
    }

    #[test]
    fn test_restore_replaces_current_mix() {
        let catalog = SoundCatalog::builtin();
        let mut engine = engine();
        let drone = engine.play(&catalog.get("om-drone").unwrap(), 0.3, true).unwrap();
        engine.mute_voice(drone, true);
        let mix = MixSnapshot::capture(&engine);

        engine.stop_all();
        engine.play(&catalog.get("city-hum").unwrap(), 0.9, true).unwrap();

        let ids = mix.restore(&mut engine, &catalog).unwrap();
        assert_eq!(ids.len(), 1);
        let voices = engine.active_voices();
        assert_eq!(voices.len(), 1);
        assert_eq!(voices[0].descriptor_id, "om-drone");
        assert!(voices[0].is_muted);
    }

    #[test]
    fn test_unknown_sound_leaves_engine_untouched() {
        let catalog = SoundCatalog::builtin();
        let mut engine = engine();
        engine.play(&catalog.get("om-drone").unwrap(), 0.3, true).unwrap();

        let mix = MixSnapshot {
            master_volume: 1.0,
            entries: vec![MixEntry {
                descriptor_id: "thunderstorm".to_string(),
                volume: 0.5,
                is_solo: false,
                is_muted: false,
            }],
            saved_at: Utc::now(),
        };
        let err = mix.restore(&mut engine, &catalog).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_MIX");
        assert_eq!(engine.active_voices().len(), 1);
    }

    #[test]
    fn test_json_shape_and_clamping() {
        let json = r#"{
            "masterVolume": 1.4,
            "entries": [
                {"descriptorId": "rain", "volume": -0.2},
                {"descriptorId": "forest", "volume": 0.5, "isSolo": true}
            ]
        }"#;
        let mix = MixSnapshot::from_json_str(json).unwrap();
        assert_eq!(mix.master_volume, 1.0);
        assert_eq!(mix.entries[0].volume, 0.0);
        assert!(mix.entries[1].is_solo);
        assert!(!mix.entries[1].is_muted);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mix.json");
        let mix = MixSnapshot {
            master_volume: 0.5,
            entries: vec![MixEntry {
                descriptor_id: "rain".to_string(),
                volume: 0.25,
                is_solo: false,
                is_muted: true,
            }],
            saved_at: Utc::now(),
        };
        mix.save(&path).unwrap();
        assert_eq!(MixSnapshot::load(&path).unwrap(), mix);
    }
}
