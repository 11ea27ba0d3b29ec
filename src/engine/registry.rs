//! Voice registry and effective volume
//!
//! Solo is a registry-wide concept: one voice going solo changes what every
//! other voice should sound like. All of that composition lives in
//! [`effective_volume`], and [`VoiceRegistry::refresh_gains`] pushes the
//! result into every voice's gain stage after any change.

use crate::engine::voice::{InstanceId, Voice};

/// The volume a voice should currently be heard at, before master volume
///
/// 0 when the voice is muted; 0 when it is not soloed while some other voice
/// is; otherwise the caller's volume.
pub fn effective_volume(voice: &Voice, registry: &VoiceRegistry) -> f32 {
    if voice.is_muted() {
        return 0.0;
    }
    if !voice.is_solo() && registry.any_solo_except(voice.id()) {
        return 0.0;
    }
    voice.user_volume()
}

/// Live voices, in the order they were created
#[derive(Debug, Default)]
pub struct VoiceRegistry {
    voices: Vec<Voice>,
}

impl VoiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, voice: Voice) {
        self.voices.push(voice);
    }

    /// Take a voice out of the registry
    pub fn remove(&mut self, id: InstanceId) -> Option<Voice> {
        let index = self.voices.iter().position(|v| v.id() == id)?;
        Some(self.voices.remove(index))
    }

    /// Take every voice out of the registry
    pub fn drain(&mut self) -> Vec<Voice> {
        std::mem::take(&mut self.voices)
    }

    /// Remove and return the voices matching `predicate`
    pub fn extract_if(&mut self, mut predicate: impl FnMut(&Voice) -> bool) -> Vec<Voice> {
        let (taken, kept): (Vec<Voice>, Vec<Voice>) = std::mem::take(&mut self.voices)
            .into_iter()
            .partition(|v| predicate(v));
        self.voices = kept;
        taken
    }

    pub fn get(&self, id: InstanceId) -> Option<&Voice> {
        self.voices.iter().find(|v| v.id() == id)
    }

    pub fn get_mut(&mut self, id: InstanceId) -> Option<&mut Voice> {
        self.voices.iter_mut().find(|v| v.id() == id)
    }

    /// First voice playing (or waiting to play) `sound_id`
    pub fn find_by_sound(&self, sound_id: &str) -> Option<InstanceId> {
        self.voices
            .iter()
            .find(|v| v.sound_id() == sound_id)
            .map(Voice::id)
    }

    pub fn contains(&self, id: InstanceId) -> bool {
        self.get(id).is_some()
    }

    /// True if any voice other than `id` is soloed
    pub fn any_solo_except(&self, id: InstanceId) -> bool {
        self.voices.iter().any(|v| v.id() != id && v.is_solo())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Voice> {
        self.voices.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Voice> {
        self.voices.iter_mut()
    }

    pub fn ids(&self) -> Vec<InstanceId> {
        self.voices.iter().map(Voice::id).collect()
    }

    pub fn len(&self) -> usize {
        self.voices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }

    /// Recompute every voice's effective volume and ramp its gain there
    pub fn refresh_gains(&mut self) {
        let targets: Vec<f32> = self
            .voices
            .iter()
            .map(|v| effective_volume(v, self))
            .collect();
        for (voice, target) in self.voices.iter_mut().zip(targets) {
            voice.apply_gain(target);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::SoundCatalog;
    use crate::engine::gain::GainRamp;
    use crate::engine::voice::SourceNode;
    use crate::synth;

    fn voice(sound_id: &str, volume: f32) -> Voice {
        let sound = SoundCatalog::builtin().get(sound_id).unwrap();
        let source = SourceNode::from_generated(&synth::fallback(220.0), true, 8000);
        Voice::new(sound, source, volume, true, GainRamp::new(0.0, 1.0, 8000))
    }

    fn registry(ids: &[&str]) -> (VoiceRegistry, Vec<InstanceId>) {
        let mut registry = VoiceRegistry::new();
        let mut handles = Vec::new();
        for id in ids {
            let v = voice(id, 0.5);
            handles.push(v.id());
            registry.insert(v);
        }
        (registry, handles)
    }

    #[test]
    fn test_effective_volume_plain() {
        let (registry, ids) = registry(&["rain", "forest"]);
        let v = registry.get(ids[0]).unwrap();
        assert_eq!(effective_volume(v, &registry), 0.5);
    }

    #[test]
    fn test_solo_silences_others() {
        let (mut registry, ids) = registry(&["rain", "forest", "ocean-waves"]);
        registry.get_mut(ids[1]).unwrap().set_solo(true);

        let volumes: Vec<f32> = registry
            .iter()
            .map(|v| effective_volume(v, &registry))
            .collect();
        assert_eq!(volumes, vec![0.0, 0.5, 0.0]);
    }

    #[test]
    fn test_two_solos_both_audible() {
        let (mut registry, ids) = registry(&["rain", "forest", "ocean-waves"]);
        registry.get_mut(ids[0]).unwrap().set_solo(true);
        registry.get_mut(ids[2]).unwrap().set_solo(true);

        let volumes: Vec<f32> = registry
            .iter()
            .map(|v| effective_volume(v, &registry))
            .collect();
        assert_eq!(volumes, vec![0.5, 0.0, 0.5]);
    }

    #[test]
    fn test_mute_beats_solo() {
        let (mut registry, ids) = registry(&["rain", "forest"]);
        let v = registry.get_mut(ids[0]).unwrap();
        v.set_solo(true);
        v.set_muted(true);
        let v = registry.get(ids[0]).unwrap();
        assert_eq!(effective_volume(v, &registry), 0.0);
    }

    #[test]
    fn test_refresh_gains_sets_targets() {
        let (mut registry, ids) = registry(&["rain", "forest"]);
        registry.get_mut(ids[0]).unwrap().set_solo(true);
        registry.refresh_gains();
        assert_eq!(registry.get(ids[0]).unwrap().gain().target(), 0.5);
        assert_eq!(registry.get(ids[1]).unwrap().gain().target(), 0.0);
    }

    #[test]
    fn test_find_and_remove() {
        let (mut registry, ids) = registry(&["rain", "forest"]);
        assert_eq!(registry.find_by_sound("forest"), Some(ids[1]));
        assert!(registry.remove(ids[1]).is_some());
        assert!(registry.remove(ids[1]).is_none());
        assert_eq!(registry.find_by_sound("forest"), None);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_extract_if_keeps_order() {
        let (mut registry, ids) = registry(&["rain", "forest", "ocean-waves"]);
        let taken = registry.extract_if(|v| v.sound_id() == "forest");
        assert_eq!(taken.len(), 1);
        assert_eq!(registry.ids(), vec![ids[0], ids[2]]);
    }
}
