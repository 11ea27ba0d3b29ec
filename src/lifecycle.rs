//! Host lifecycle events
//!
//! The application's composition root owns the engine and forwards page or
//! window lifecycle events to it. Nothing here registers global hooks.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::engine::{ContextState, MixingEngine};

/// A lifecycle change of the hosting page or window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleEvent {
    /// The page went to the background
    Hidden,
    /// The page is visible again
    Visible,
    /// The user left the audio-bearing view
    NavigatedAway,
    /// The page is being unloaded
    Unload,
}

impl MixingEngine {
    /// React to a lifecycle event; never fails
    ///
    /// - `Hidden` suspends the context (when `suspend_when_hidden` is set)
    /// - `Visible` resumes it
    /// - `NavigatedAway` stops every voice
    /// - `Unload` tears the engine down
    pub fn handle_lifecycle(&mut self, event: LifecycleEvent) {
        debug!(?event, "lifecycle event");
        match event {
            LifecycleEvent::Hidden => {
                if self.config().suspend_when_hidden {
                    if let Err(e) = self.suspend() {
                        warn!(error = %e, "suspend on hide failed");
                    }
                }
            }
            LifecycleEvent::Visible => {
                // Only a context that exists is brought back
                if matches!(
                    self.context_state(),
                    ContextState::Uninitialized | ContextState::Closed
                ) {
                    return;
                }
                if let Err(e) = self.resume() {
                    warn!(error = %e, "resume on show failed");
                }
            }
            LifecycleEvent::NavigatedAway => self.stop_all(),
            LifecycleEvent::Unload => self.cleanup(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::SoundCatalog;
    use crate::config::EngineConfig;
    use crate::engine::OfflineHost;

    fn running_engine() -> MixingEngine {
        let mut engine = MixingEngine::offline(8000);
        engine.resume().unwrap();
        engine
    }

    #[test]
    fn test_hidden_then_visible() {
        let mut engine = running_engine();
        engine.handle_lifecycle(LifecycleEvent::Hidden);
        assert_eq!(engine.context_state(), ContextState::Suspended);
        engine.handle_lifecycle(LifecycleEvent::Visible);
        assert_eq!(engine.context_state(), ContextState::Running);
    }

    #[test]
    fn test_hidden_ignored_when_configured() {
        let config = EngineConfig {
            suspend_when_hidden: false,
            ..EngineConfig::default()
        };
        let mut engine = MixingEngine::new(Box::new(OfflineHost::new(8000)), config);
        engine.resume().unwrap();
        engine.handle_lifecycle(LifecycleEvent::Hidden);
        assert_eq!(engine.context_state(), ContextState::Running);
    }

    #[test]
    fn test_visible_does_not_create_context() {
        let mut engine = MixingEngine::offline(8000);
        engine.handle_lifecycle(LifecycleEvent::Visible);
        assert_eq!(engine.context_state(), ContextState::Uninitialized);
    }

    #[test]
    fn test_navigate_away_stops_voices() {
        let mut engine = running_engine();
        let catalog = SoundCatalog::builtin();
        engine.play(&catalog.get("om-drone").unwrap(), 0.5, true).unwrap();
        engine.handle_lifecycle(LifecycleEvent::NavigatedAway);
        assert!(engine.active_voices().is_empty());
        assert_eq!(engine.context_state(), ContextState::Running);
    }

    #[test]
    fn test_unload_closes_context() {
        let mut engine = running_engine();
        engine.handle_lifecycle(LifecycleEvent::Unload);
        assert_eq!(engine.context_state(), ContextState::Closed);
        // A late visibility event after unload is harmless
        engine.handle_lifecycle(LifecycleEvent::Visible);
        assert_eq!(engine.context_state(), ContextState::Closed);
    }
}
