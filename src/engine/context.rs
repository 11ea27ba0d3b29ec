//! Shared audio context state machine
//!
//! Wraps the platform [`AudioHost`] and tracks where the context is in its
//! life: created lazily, moved between suspended and running, and closed
//! exactly once.
//!
//! ```text
//! Uninitialized --initialize--> Suspended <--resume/suspend--> Running
//!        \                          |                            |
//!         +----------close----------+------------close-----------+--> Closed
//! ```
//!
//! A resume that the platform holds back (autoplay policy) leaves the
//! context `Suspended` with a pending flag; [`SharedContext::poll`] retries
//! it until the host reports it running.

use std::fmt;

use tracing::{debug, info, warn};

use crate::engine::host::{AudioHost, ResumeStatus};
use crate::error::{Result, ZenmixError};

/// Where the shared context is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContextState {
    /// No platform context yet
    #[default]
    Uninitialized,
    /// Created but not pulling audio
    Suspended,
    /// Pulling audio
    Running,
    /// Released; cannot be reopened
    Closed,
}

impl fmt::Display for ContextState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContextState::Uninitialized => write!(f, "Uninitialized"),
            ContextState::Suspended => write!(f, "Suspended"),
            ContextState::Running => write!(f, "Running"),
            ContextState::Closed => write!(f, "Closed"),
        }
    }
}

/// The lazily-created, explicitly-closed audio context
pub struct SharedContext {
    host: Box<dyn AudioHost>,
    state: ContextState,
    sample_rate: Option<u32>,
    resume_pending: bool,
    held: bool,
}

impl fmt::Debug for SharedContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedContext")
            .field("state", &self.state)
            .field("sample_rate", &self.sample_rate)
            .field("resume_pending", &self.resume_pending)
            .field("held", &self.held)
            .finish_non_exhaustive()
    }
}

impl SharedContext {
    /// Wrap a host; nothing is opened until [`initialize`](Self::initialize)
    ///
    /// # Example
    /// ```
    /// use zenmix::engine::{ContextState, OfflineHost, SharedContext};
    ///
    /// let mut context = SharedContext::new(Box::new(OfflineHost::new(48000)));
    /// assert_eq!(context.state(), ContextState::Uninitialized);
    ///
    /// assert_eq!(context.initialize().unwrap(), 48000);
    /// assert_eq!(context.state(), ContextState::Suspended);
    /// ```
    pub fn new(host: Box<dyn AudioHost>) -> Self {
        Self {
            host,
            state: ContextState::Uninitialized,
            sample_rate: None,
            resume_pending: false,
            held: false,
        }
    }

    // ========================================================================
    // Transitions
    // ========================================================================

    /// Create the platform context if it does not exist yet
    ///
    /// Cheap and idempotent once the context exists.
    ///
    /// # Returns
    /// The context's sample rate
    pub fn initialize(&mut self) -> Result<u32> {
        match self.state {
            ContextState::Closed => Err(ZenmixError::ContextClosed),
            ContextState::Uninitialized => {
                let sample_rate = self.host.open()?;
                if sample_rate == 0 {
                    return Err(ZenmixError::InvalidSampleRate { sample_rate });
                }
                self.sample_rate = Some(sample_rate);
                self.state = ContextState::Suspended;
                info!(sample_rate, "audio context created");
                Ok(sample_rate)
            }
            ContextState::Suspended | ContextState::Running => {
                Ok(self.sample_rate.unwrap_or_default())
            }
        }
    }

    /// Ask the context to run
    ///
    /// Returns the resulting state. `Suspended` means the platform is
    /// waiting for a user gesture; the resume stays pending and completes
    /// on a later [`poll`](Self::poll).
    pub fn resume(&mut self) -> Result<ContextState> {
        self.initialize()?;
        self.held = false;
        if self.state == ContextState::Running {
            return Ok(self.state);
        }
        match self.host.resume()? {
            ResumeStatus::Running => {
                self.state = ContextState::Running;
                self.resume_pending = false;
                debug!("audio context running");
            }
            ResumeStatus::AwaitingGesture => {
                if !self.resume_pending {
                    debug!("audio context resume awaiting user gesture");
                }
                self.resume_pending = true;
            }
        }
        Ok(self.state)
    }

    /// Retry a pending resume
    ///
    /// # Returns
    /// `true` exactly when this call moved the context to running
    pub fn poll(&mut self) -> bool {
        if !self.resume_pending || self.state != ContextState::Suspended {
            return false;
        }
        match self.resume() {
            Ok(ContextState::Running) => true,
            Ok(_) => false,
            Err(e) => {
                warn!(error = %e, "pending resume failed");
                self.resume_pending = false;
                false
            }
        }
    }

    /// Stop pulling audio; also drops any pending resume
    ///
    /// A created context stays held until the next explicit
    /// [`resume`](Self::resume).
    pub fn suspend(&mut self) -> Result<()> {
        self.resume_pending = false;
        match self.state {
            ContextState::Running => {
                self.host.suspend()?;
                self.state = ContextState::Suspended;
                self.held = true;
                debug!("audio context suspended");
                Ok(())
            }
            ContextState::Suspended => {
                self.held = true;
                Ok(())
            }
            ContextState::Closed => Err(ZenmixError::ContextClosed),
            ContextState::Uninitialized => Ok(()),
        }
    }

    /// Release the platform context
    ///
    /// Only a created context is handed back to the host, and only once;
    /// later calls are no-ops. The state is `Closed` afterwards even if the
    /// host reported an error.
    pub fn close(&mut self) -> Result<()> {
        let previous = self.state;
        self.state = ContextState::Closed;
        self.resume_pending = false;
        self.held = false;
        match previous {
            ContextState::Closed | ContextState::Uninitialized => Ok(()),
            ContextState::Suspended | ContextState::Running => {
                info!("audio context closed");
                self.host.close()
            }
        }
    }

    // ========================================================================
    // State Queries
    // ========================================================================

    pub fn state(&self) -> ContextState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == ContextState::Running
    }

    pub fn is_closed(&self) -> bool {
        self.state == ContextState::Closed
    }

    /// True while a resume is waiting on the platform
    pub fn is_resume_pending(&self) -> bool {
        self.resume_pending
    }

    /// True after an explicit suspend that no resume has undone yet
    pub fn is_held(&self) -> bool {
        self.held
    }

    /// Sample rate, known once the context exists
    pub fn sample_rate(&self) -> Option<u32> {
        self.sample_rate
    }
}
