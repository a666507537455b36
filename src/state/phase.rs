/// Crawl phase definitions for the orchestrator's state machine
///
/// This module defines every phase a crawl run passes through and the
/// transitions allowed between them.
use crate::LexError;
use std::fmt;

/// Represents the current phase of a crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlPhase {
    // ===== Active Phases =====
    /// Loading the checkpoint or seeding the frontier
    Init,

    /// Draining the frontier
    Running,

    /// Writing a checkpoint; no entries are popped until it completes
    Checkpointing,

    // ===== Terminal Phases =====
    /// The frontier is empty and the crawl is complete
    Drained,

    /// A stop was requested; queued entries are kept for the next run
    Interrupted,
}

impl CrawlPhase {
    /// Returns true if the run has ended
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Drained | Self::Interrupted)
    }

    /// Returns true if moving from `self` to `next` is allowed
    pub fn can_transition_to(&self, next: CrawlPhase) -> bool {
        matches!(
            (self, next),
            (Self::Init, Self::Running)
                | (Self::Running, Self::Checkpointing)
                | (Self::Checkpointing, Self::Running)
                | (Self::Running, Self::Drained)
                | (Self::Running, Self::Interrupted)
                | (Self::Checkpointing, Self::Interrupted)
        )
    }

    /// Validates and performs a transition
    ///
    /// # Returns
    ///
    /// * `Ok(next)` - The transition is allowed
    /// * `Err(LexError::InvalidTransition)` - The transition is not allowed
    pub fn transition(self, next: CrawlPhase) -> Result<CrawlPhase, LexError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(LexError::InvalidTransition {
                from: self,
                to: next,
            })
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Running => "running",
            Self::Checkpointing => "checkpointing",
            Self::Drained => "drained",
            Self::Interrupted => "interrupted",
        }
    }

    /// Returns all possible phases
    pub fn all_phases() -> [Self; 5] {
        [
            Self::Init,
            Self::Running,
            Self::Checkpointing,
            Self::Drained,
            Self::Interrupted,
        ]
    }
}

impl fmt::Display for CrawlPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
