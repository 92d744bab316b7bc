//! Period state definitions for tracking crawl progress
//!
//! A period moves `Pending → InFlight → Completed` or `Pending → InFlight → Failed`.

use crate::message::Period;
use crate::ArchiveError;
use std::fmt;

/// Represents the current state of a period within one crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PeriodState {
    /// Discovered and not yet started
    Pending,

    /// Index page and message pages are being fetched
    InFlight,

    /// Every discovered message was attempted and the period is recorded as done
    Completed,

    /// The index page could not be fetched, or completion could not be recorded.
    /// The period is retried on the next run.
    Failed,
}

impl PeriodState {
    /// Returns true if this is a terminal state (no further processing needed)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Returns true if the transition to `next` is allowed
    pub fn can_transition_to(&self, next: PeriodState) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::InFlight)
                | (Self::InFlight, Self::Completed)
                | (Self::InFlight, Self::Failed)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InFlight => "in_flight",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for PeriodState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A period together with its current state and message counters
#[derive(Debug, Clone)]
pub struct PeriodProgress {
    pub period: Period,
    pub index_url: String,
    state: PeriodState,
    pub messages_written: usize,
    pub message_errors: usize,
}

impl PeriodProgress {
    pub fn new(period: Period, index_url: impl Into<String>) -> Self {
        Self {
            period,
            index_url: index_url.into(),
            state: PeriodState::Pending,
            messages_written: 0,
            message_errors: 0,
        }
    }

    pub fn state(&self) -> PeriodState {
        self.state
    }

    /// Moves to `next`, rejecting transitions the state machine doesn't allow
    pub fn transition(&mut self, next: PeriodState) -> Result<(), ArchiveError> {
        if !self.state.can_transition_to(next) {
            return Err(ArchiveError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }

        tracing::trace!(period = %self.period, "{} -> {}", self.state, next);
        self.state = next;
        Ok(())
    }
}
