//! Re-trigger scheduling for looping struck tones
//!
//! An oscillator node cannot be restarted once it ends. Tones that ring out
//! (chimes) but should loop are kept going by building a fresh node at a
//! fixed interval. The schedule is counted in rendered frames, so it runs
//! exactly as fast as the audio does and pauses while the context is
//! suspended.

use std::collections::HashMap;

use crate::engine::voice::InstanceId;
use crate::synth::OscillatorParams;

#[derive(Debug, Clone)]
struct Entry {
    params: OscillatorParams,
    interval: u64,
    elapsed: u64,
}

/// A re-trigger that came due
#[derive(Debug, Clone, PartialEq)]
pub struct Retrigger {
    pub id: InstanceId,
    pub params: OscillatorParams,
}

/// Frame-clocked timer that re-strikes looping oscillator voices
#[derive(Debug, Clone, Default)]
pub struct RetriggerScheduler {
    entries: HashMap<InstanceId, Entry>,
}

impl RetriggerScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start re-triggering `id` if its tone rings out
    ///
    /// The interval is the tone's `retrigger_secs`, or its ring time when
    /// none is given. Sustained tones are ignored.
    ///
    /// # Returns
    /// `true` if the voice was scheduled
    pub fn schedule(&mut self, id: InstanceId, params: &OscillatorParams, sample_rate: u32) -> bool {
        let Some(strike) = params.strike else {
            return false;
        };
        let secs = params.retrigger_secs.unwrap_or(strike.ring_secs);
        let interval = (secs.max(0.0) as f64 * sample_rate as f64).round() as u64;
        if interval == 0 {
            return false;
        }
        self.entries.insert(
            id,
            Entry {
                params: params.clone(),
                interval,
                elapsed: 0,
            },
        );
        true
    }

    pub fn cancel(&mut self, id: InstanceId) {
        self.entries.remove(&id);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn is_scheduled(&self, id: InstanceId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Advance every schedule by `frames` and collect what came due
    pub fn advance(&mut self, frames: u64) -> Vec<Retrigger> {
        let mut due = Vec::new();
        for (id, entry) in self.entries.iter_mut() {
            entry.elapsed += frames;
            if entry.elapsed >= entry.interval {
                entry.elapsed %= entry.interval;
                due.push(Retrigger {
                    id: *id,
                    params: entry.params.clone(),
                });
            }
        }
        due
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::ToneKind;

    #[test]
    fn test_sustained_tones_not_scheduled() {
        let mut scheduler = RetriggerScheduler::new();
        let id = InstanceId::new();
        assert!(!scheduler.schedule(id, &ToneKind::OmDrone.params(), 48000));
        assert!(scheduler.is_empty());
    }

    #[test]
    fn test_chime_fires_on_interval() {
        let mut scheduler = RetriggerScheduler::new();
        let id = InstanceId::new();
        let params = ToneKind::MeditationChime.params();
        let secs = params.retrigger_secs.unwrap();
        assert!(scheduler.schedule(id, &params, 1000));

        let interval = (secs * 1000.0) as u64;
        assert!(scheduler.advance(interval - 1).is_empty());
        let due = scheduler.advance(1);
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].id, id);

        // Next interval starts from the trigger point
        assert!(scheduler.advance(interval - 1).is_empty());
        assert_eq!(scheduler.advance(1).len(), 1);
    }

    #[test]
    fn test_cancel_stops_schedule() {
        let mut scheduler = RetriggerScheduler::new();
        let id = InstanceId::new();
        scheduler.schedule(id, &ToneKind::MeditationChime.params(), 1000);
        scheduler.cancel(id);
        assert!(scheduler.advance(1_000_000).is_empty());
    }
}
