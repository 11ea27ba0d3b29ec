//! Sound Catalog
//!
//! Static definitions of every synthesizable sound. Descriptors are
//! immutable once loaded and shared with voices behind `Arc`.
//!
//! A descriptor's generation strategy is resolved when the catalog is
//! loaded: exactly one of its tags must be a strategy tag (see
//! [`SynthesisStrategy::from_tag`]). Zero or two conflicting strategy tags
//! are rejected up front instead of being guessed at play time.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ZenmixError};
use crate::synth::SynthesisStrategy;

/// Category a sound is filed under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Nature,
    Ambient,
    Focus,
    Meditation,
    Urban,
    Instrument,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Category::Nature => "nature",
            Category::Ambient => "ambient",
            Category::Focus => "focus",
            Category::Meditation => "meditation",
            Category::Urban => "urban",
            Category::Instrument => "instrument",
        };
        f.write_str(name)
    }
}

fn default_loop() -> bool {
    true
}

fn default_volume() -> f32 {
    0.5
}

/// Descriptor as written in a catalog file, before strategy resolution
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DescriptorSpec {
    pub id: String,
    pub display_name: String,
    #[serde(rename = "categoryTag")]
    pub category: Category,
    #[serde(default)]
    pub is_premium_only: bool,
    #[serde(default = "default_volume")]
    pub base_volume: f32,
    pub tags: BTreeSet<String>,
    #[serde(rename = "loop", default = "default_loop")]
    pub looping: bool,
}

/// Static definition of a synthesizable sound
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "DescriptorSpec", into = "DescriptorSpec")]
pub struct SoundDescriptor {
    id: String,
    display_name: String,
    category: Category,
    premium_only: bool,
    base_volume: f32,
    tags: BTreeSet<String>,
    looping: bool,
    strategy: SynthesisStrategy,
}

impl SoundDescriptor {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn category(&self) -> Category {
        self.category
    }

    /// Callers check entitlement before playing these; the engine does not
    pub fn is_premium_only(&self) -> bool {
        self.premium_only
    }

    pub fn base_volume(&self) -> f32 {
        self.base_volume
    }

    pub fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    pub fn looping(&self) -> bool {
        self.looping
    }

    pub fn strategy(&self) -> SynthesisStrategy {
        self.strategy
    }
}

impl TryFrom<DescriptorSpec> for SoundDescriptor {
    type Error = ZenmixError;

    fn try_from(spec: DescriptorSpec) -> Result<Self> {
        if spec.id.trim().is_empty() {
            return Err(ZenmixError::CatalogError {
                reason: "descriptor with empty id".to_string(),
            });
        }

        let mut strategies: Vec<SynthesisStrategy> = spec
            .tags
            .iter()
            .filter_map(|tag| SynthesisStrategy::from_tag(tag))
            .collect();
        strategies.dedup();

        let strategy = match strategies.as_slice() {
            [single] => *single,
            [] => {
                return Err(ZenmixError::CatalogError {
                    reason: format!("'{}' has no synthesis strategy tag", spec.id),
                })
            }
            many => {
                let tags: Vec<&str> = many.iter().map(|s| s.tag()).collect();
                return Err(ZenmixError::CatalogError {
                    reason: format!(
                        "'{}' has conflicting strategy tags: {}",
                        spec.id,
                        tags.join(", ")
                    ),
                });
            }
        };

        Ok(Self {
            id: spec.id,
            display_name: spec.display_name,
            category: spec.category,
            premium_only: spec.is_premium_only,
            base_volume: spec.base_volume.clamp(0.0, 1.0),
            tags: spec.tags,
            looping: spec.looping,
            strategy,
        })
    }
}

impl From<SoundDescriptor> for DescriptorSpec {
    fn from(d: SoundDescriptor) -> Self {
        Self {
            id: d.id,
            display_name: d.display_name,
            category: d.category,
            is_premium_only: d.premium_only,
            base_volume: d.base_volume,
            tags: d.tags,
            looping: d.looping,
        }
    }
}

/// Shorthand used by the builtin table
fn entry(
    id: &str,
    display_name: &str,
    category: Category,
    premium: bool,
    base_volume: f32,
    tags: &[&str],
) -> DescriptorSpec {
    DescriptorSpec {
        id: id.to_string(),
        display_name: display_name.to_string(),
        category,
        is_premium_only: premium,
        base_volume,
        tags: tags.iter().map(|t| t.to_string()).collect(),
        looping: true,
    }
}

fn builtin_specs() -> Vec<DescriptorSpec> {
    use Category::*;
    vec![
        entry("rain", "Gentle Rain", Nature, false, 0.6, &["rain", "calm", "sleep"]),
        entry("ocean-waves", "Ocean Waves", Nature, false, 0.6, &["ocean", "calm"]),
        entry("forest", "Forest Morning", Nature, false, 0.5, &["forest", "birds"]),
        entry("crackling-fire", "Crackling Fire", Nature, true, 0.5, &["fire", "cozy"]),
        entry("white-noise", "White Noise", Focus, false, 0.4, &["white-noise", "masking"]),
        entry("pink-noise", "Pink Noise", Focus, false, 0.4, &["pink-noise", "masking"]),
        entry("brown-noise", "Brown Noise", Focus, false, 0.5, &["brown-noise", "sleep"]),
        entry("alpha-waves", "Alpha Waves", Focus, true, 0.3, &["alpha-binaural", "brainwave"]),
        entry("gamma-focus", "Gamma Focus", Focus, true, 0.3, &["gamma-binaural", "brainwave"]),
        entry("theta-waves", "Theta Waves", Meditation, false, 0.3, &["theta-binaural", "brainwave"]),
        entry("delta-waves", "Delta Sleep", Meditation, true, 0.3, &["delta-binaural", "brainwave", "sleep"]),
        entry("zen-garden", "Zen Garden", Meditation, false, 0.5, &["zen-garden", "water"]),
        entry("singing-bowl", "Singing Bowl", Meditation, true, 0.5, &["singing-bowl", "tonal"]),
        entry("temple-bell", "Temple Bell", Meditation, false, 0.5, &["temple-bell", "tonal"]),
        entry("meditation-chime", "Meditation Chime", Meditation, false, 0.4, &["meditation-chime", "tonal"]),
        entry("solfeggio-528", "528 Hz Tone", Meditation, true, 0.3, &["solfeggio-528", "tonal"]),
        entry("om-drone", "Om Drone", Ambient, false, 0.4, &["om-drone", "drone"]),
        entry("pure-tone", "Pure Tone 432", Ambient, false, 0.3, &["pure-tone"]),
        entry("city-hum", "City Hum", Urban, false, 0.4, &["city-hum", "drone"]),
        entry("soft-piano", "Soft Piano", Instrument, true, 0.5, &["piano", "melodic"]),
    ]
}

/// The set of sounds available to the engine
#[derive(Debug, Clone, Default)]
pub struct SoundCatalog {
    sounds: BTreeMap<String, Arc<SoundDescriptor>>,
}

impl SoundCatalog {
    /// The catalog shipped with the crate
    pub fn builtin() -> Self {
        // The builtin table is covered by tests; a failure here is a bug in it
        Self::from_specs(builtin_specs()).unwrap_or_default()
    }

    /// Build a catalog, resolving every descriptor's strategy
    ///
    /// Fails on the first unresolvable descriptor or duplicate id.
    pub fn from_specs(specs: Vec<DescriptorSpec>) -> Result<Self> {
        let mut sounds = BTreeMap::new();
        for spec in specs {
            let descriptor = SoundDescriptor::try_from(spec)?;
            if sounds.contains_key(descriptor.id()) {
                return Err(ZenmixError::CatalogError {
                    reason: format!("duplicate sound id '{}'", descriptor.id()),
                });
            }
            sounds.insert(descriptor.id().to_string(), Arc::new(descriptor));
        }
        Ok(Self { sounds })
    }

    /// Load a catalog from a JSON array of descriptors
    pub fn from_json_str(json: &str) -> Result<Self> {
        let specs: Vec<DescriptorSpec> = serde_json::from_str(json)?;
        Self::from_specs(specs)
    }

    /// Load a catalog from a JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn get(&self, id: &str) -> Option<Arc<SoundDescriptor>> {
        self.sounds.get(id).cloned()
    }

    /// Like [`get`](Self::get) but with an error for unknown ids
    pub fn require(&self, id: &str) -> Result<Arc<SoundDescriptor>> {
        self.get(id).ok_or_else(|| ZenmixError::UnknownSound { id: id.to_string() })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<SoundDescriptor>> {
        self.sounds.values()
    }

    pub fn by_category(&self, category: Category) -> impl Iterator<Item = &Arc<SoundDescriptor>> {
        self.iter().filter(move |d| d.category() == category)
    }

    pub fn len(&self) -> usize {
        self.sounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sounds.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::{BufferAlgorithm, ToneKind};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_builtin_catalog_resolves_every_entry() {
        let specs = builtin_specs();
        let expected = specs.len();
        let catalog = SoundCatalog::from_specs(specs).unwrap();
        assert_eq!(catalog.len(), expected);
    }

    #[test]
    fn test_builtin_covers_every_category() {
        let catalog = SoundCatalog::builtin();
        for category in [
            Category::Nature,
            Category::Ambient,
            Category::Focus,
            Category::Meditation,
            Category::Urban,
            Category::Instrument,
        ] {
            assert!(
                catalog.by_category(category).next().is_some(),
                "no sounds in {category}"
            );
        }
    }

    #[test]
    fn test_strategy_resolved_from_tags() {
        let catalog = SoundCatalog::builtin();
        assert_eq!(
            catalog.get("ocean-waves").unwrap().strategy(),
            SynthesisStrategy::Buffer(BufferAlgorithm::Ocean)
        );
        assert_eq!(
            catalog.get("alpha-waves").unwrap().strategy(),
            SynthesisStrategy::Oscillator(ToneKind::AlphaBinaural)
        );
    }

    #[test]
    fn test_json_catalog_defaults() {
        let json = r#"[
            {"id": "night-rain", "displayName": "Night Rain", "categoryTag": "nature",
             "tags": ["rain", "night"]}
        ]"#;
        let catalog = SoundCatalog::from_json_str(json).unwrap();
        let rain = catalog.get("night-rain").unwrap();
        assert!(rain.looping());
        assert!(!rain.is_premium_only());
        assert_eq!(rain.base_volume(), 0.5);
        assert_eq!(rain.strategy(), SynthesisStrategy::Buffer(BufferAlgorithm::Rain));
    }

    #[test]
    fn test_missing_strategy_rejected() {
        let json = r#"[{"id": "mystery", "displayName": "?", "categoryTag": "ambient",
                        "tags": ["calm"]}]"#;
        let err = SoundCatalog::from_json_str(json).unwrap_err();
        assert_eq!(err.error_code(), "CATALOG_ERROR");
    }

    #[test]
    fn test_conflicting_strategy_rejected() {
        let spec = entry("storm", "Storm", Category::Nature, false, 0.5, &["rain", "ocean"]);
        let err = SoundCatalog::from_specs(vec![spec]).unwrap_err();
        assert_eq!(err.error_code(), "CATALOG_ERROR");
        assert!(err.to_string().contains("conflicting"));
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let a = entry("rain", "Rain", Category::Nature, false, 0.5, &["rain"]);
        let b = entry("rain", "Rain 2", Category::Nature, false, 0.5, &["rain"]);
        assert!(SoundCatalog::from_specs(vec![a, b]).is_err());
    }

    #[test]
    fn test_unknown_sound_error() {
        let err = SoundCatalog::builtin().require("thunder").unwrap_err();
        assert_eq!(err.error_code(), "UNKNOWN_SOUND");
    }

    #[test]
    fn test_descriptor_serializes_back_to_spec_shape() {
        let catalog = SoundCatalog::builtin();
        let json = serde_json::to_value(catalog.get("rain").unwrap().as_ref()).unwrap();
        assert_eq!(json["categoryTag"], "nature");
        assert_eq!(json["displayName"], "Gentle Rain");
    }
}
