//! Lifecycle states of a single work unit
//!
//! ```text
//! Queued -> Fetching -> Extracting -> Completed
//!    \
//!     `---> Rejected
//! ```
//!
//! A unit whose fetch fails or is skipped goes straight from `Fetching` to
//! `Completed` with no content and no children.

use crate::SiftError;
use std::fmt;

/// Represents the current state of a work unit in one crawl job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitState {
    /// Admitted by the frontier, waiting for a concurrency slot
    Queued,

    /// Holding a slot, network I/O in progress
    Fetching,

    /// Holding a slot, markup being reduced to content
    Extracting,

    /// Finished, with or without content
    Completed,

    /// Dropped before any fetch (skip rule matched or job cancelled)
    Rejected,
}

impl UnitState {
    /// Returns true if no further transitions are possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Rejected)
    }

    /// Returns true while the unit holds one of the job's concurrency slots
    pub fn is_in_flight(&self) -> bool {
        matches!(self, Self::Fetching | Self::Extracting)
    }

    /// Checks whether moving to `next` is a legal transition
    pub fn can_transition_to(&self, next: UnitState) -> bool {
        matches!(
            (self, next),
            (Self::Queued, Self::Fetching)
                | (Self::Queued, Self::Rejected)
                | (Self::Fetching, Self::Extracting)
                | (Self::Fetching, Self::Completed)
                | (Self::Extracting, Self::Completed)
        )
    }

    /// Returns the next state, or an error for an illegal transition
    pub fn transition(self, next: UnitState) -> Result<UnitState, SiftError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(SiftError::InvalidTransition {
                from: self,
                to: next,
            })
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Fetching => "fetching",
            Self::Extracting => "extracting",
            Self::Completed => "completed",
            Self::Rejected => "rejected",
        }
    }
}

impl fmt::Display for UnitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
