//! Platform audio host
//!
//! The engine never talks to an audio device directly. Whatever owns the
//! device (a browser audio context, a cpal stream, an offline renderer)
//! implements [`AudioHost`] and pulls blocks through
//! [`MixingEngine::render`](crate::engine::MixingEngine::render).

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use crate::engine::buffer::DEFAULT_SAMPLE_RATE;
use crate::error::{Result, ZenmixError};

/// Outcome of asking the host to start running
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeStatus {
    /// The context is running and pulling audio
    Running,
    /// The platform holds the context until a user gesture arrives
    AwaitingGesture,
}

/// The platform side of the shared audio context
pub trait AudioHost: Send {
    /// Create the platform context
    ///
    /// # Returns
    /// The sample rate the context runs at
    fn open(&mut self) -> Result<u32>;

    /// Ask the context to run; may be held back by an autoplay policy
    fn resume(&mut self) -> Result<ResumeStatus>;

    fn suspend(&mut self) -> Result<()>;

    /// Release the platform context; called at most once
    fn close(&mut self) -> Result<()>;
}

/// Stand-in for the user gesture that releases an autoplay-gated context
///
/// Clones share one flag, so a test (or an input handler) can keep a copy
/// and release the gate after handing the host to the engine.
#[derive(Debug, Clone, Default)]
pub struct GestureGate(Arc<AtomicBool>);

impl GestureGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a qualifying user gesture
    pub fn release(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_released(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Call counters shared between an [`OfflineHost`] and its observer
#[derive(Debug, Clone, Default)]
pub struct HostCounters {
    opens: Arc<AtomicUsize>,
    closes: Arc<AtomicUsize>,
}

impl HostCounters {
    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::Acquire)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::Acquire)
    }
}

/// Host with no device behind it
///
/// Used for offline rendering and tests. It can simulate a platform that
/// refuses to create a context, and one that holds `resume` behind a
/// [`GestureGate`].
#[derive(Debug, Clone)]
pub struct OfflineHost {
    sample_rate: u32,
    open_failure: Option<String>,
    gate: Option<GestureGate>,
    counters: HostCounters,
    running: bool,
}

impl Default for OfflineHost {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLE_RATE)
    }
}

impl OfflineHost {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            open_failure: None,
            gate: None,
            counters: HostCounters::default(),
            running: false,
        }
    }

    /// A host whose `open` always fails with `reason`
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            open_failure: Some(reason.into()),
            ..Self::default()
        }
    }

    /// Hold `resume` until `gate` is released
    pub fn with_gesture_gate(mut self, gate: GestureGate) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Counters that stay readable after the host is moved into an engine
    pub fn counters(&self) -> HostCounters {
        self.counters.clone()
    }

    pub fn is_running(&self) -> bool {
        self.running
    }
}

impl AudioHost for OfflineHost {
    fn open(&mut self) -> Result<u32> {
        self.counters.opens.fetch_add(1, Ordering::AcqRel);
        if let Some(reason) = &self.open_failure {
            return Err(ZenmixError::ContextUnavailable {
                reason: reason.clone(),
            });
        }
        Ok(self.sample_rate)
    }

    fn resume(&mut self) -> Result<ResumeStatus> {
        if self.gate.as_ref().is_some_and(|gate| !gate.is_released()) {
            return Ok(ResumeStatus::AwaitingGesture);
        }
        self.running = true;
        Ok(ResumeStatus::Running)
    }

    fn suspend(&mut self) -> Result<()> {
        self.running = false;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.counters.closes.fetch_add(1, Ordering::AcqRel);
        self.running = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offline_host_opens_at_configured_rate() {
        let mut host = OfflineHost::new(44100);
        assert_eq!(host.open().unwrap(), 44100);
        assert_eq!(host.resume().unwrap(), ResumeStatus::Running);
        assert!(host.is_running());
    }

    #[test]
    fn test_failing_host() {
        let mut host = OfflineHost::failing("no audio device");
        let err = host.open().unwrap_err();
        assert_eq!(err.error_code(), "CONTEXT_UNAVAILABLE");
        assert_eq!(host.counters().opens(), 1);
    }

    #[test]
    fn test_gesture_gate_holds_resume() {
        let gate = GestureGate::new();
        let mut host = OfflineHost::default().with_gesture_gate(gate.clone());
        host.open().unwrap();

        assert_eq!(host.resume().unwrap(), ResumeStatus::AwaitingGesture);
        assert!(!host.is_running());

        gate.release();
        assert_eq!(host.resume().unwrap(), ResumeStatus::Running);
    }

    #[test]
    fn test_counters_survive_move() {
        let host = OfflineHost::default();
        let counters = host.counters();
        let mut boxed: Box<dyn AudioHost> = Box::new(host);
        boxed.close().unwrap();
        assert_eq!(counters.closes(), 1);
    }
}
