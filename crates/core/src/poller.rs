//! Card presence polling with a wall-clock deadline

use std::fmt;
use std::time::{Duration, Instant};

use tracing::{debug, trace};

use crate::clock::Clock;
use crate::error::ServiceError;
use crate::service::{CardService, ReaderState};

/// State of a presence poll
///
/// `Waiting` moves to exactly one of the two terminal states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    /// No card seen and the deadline has not passed
    Waiting,
    /// The reader reported a card
    CardPresent,
    /// The deadline passed without a card
    TimedOut,
}

impl PollState {
    /// Whether the poll is finished
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, Self::Waiting)
    }
}

/// Blocks on status queries until a card shows up or the deadline passes
pub struct PresencePoller<'a, S: CardService, C> {
    service: &'a S,
    context: &'a S::Context,
    clock: &'a C,
    retry_pause: Duration,
}

impl<S: CardService, C> fmt::Debug for PresencePoller<'_, S, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PresencePoller")
            .field("retry_pause", &self.retry_pause)
            .finish()
    }
}

impl<'a, S: CardService, C: Clock> PresencePoller<'a, S, C> {
    /// Create a poller on an established context
    pub const fn new(service: &'a S, context: &'a S::Context, clock: &'a C) -> Self {
        Self {
            service,
            context,
            clock,
            retry_pause: Duration::from_millis(10),
        }
    }

    /// Set the minimum spacing between two status queries
    pub const fn with_retry_pause(mut self, pause: Duration) -> Self {
        self.retry_pause = pause;
        self
    }

    /// Poll `state` until a card is present or `timeout` elapses
    ///
    /// The deadline is fixed when the poll starts. Each status query is bounded
    /// by the time left, and the deadline is re-checked after every return
    /// since a query may come back early without a card. Queries that return
    /// without a card sooner than the retry pause are spaced out to it.
    pub fn poll(&self, state: &mut ReaderState, timeout: Duration) -> PollState {
        let deadline = self.clock.now() + timeout;
        debug!(
            reader = %state.reader().to_string_lossy(),
            timeout_ms = timeout.as_millis() as u64,
            "Waiting for card"
        );

        let mut poll_state = PollState::Waiting;
        while !poll_state.is_terminal() {
            poll_state = self.step(state, deadline);
        }

        debug!(outcome = ?poll_state, "Presence poll finished");
        poll_state
    }

    /// One status query followed by the deadline check
    fn step(&self, state: &mut ReaderState, deadline: Instant) -> PollState {
        let started = self.clock.now();
        let remaining = deadline.saturating_duration_since(started);

        match self.service.get_status_change(self.context, remaining, state) {
            Ok(()) if state.is_card_present() => return PollState::CardPresent,
            Ok(()) => {
                trace!(status = %state.event_status(), "Reader changed without a card");
                state.sync_current_state();
            }
            Err(ServiceError::Timeout) => {
                trace!("Status query timed out");
            }
            Err(e) => {
                debug!(error = %e, "Status query failed");
            }
        }
        self.pause_after(started, deadline);

        if self.clock.now() >= deadline {
            PollState::TimedOut
        } else {
            PollState::Waiting
        }
    }

    /// Sleep out whatever is left of the retry pause since `started`
    fn pause_after(&self, started: Instant, deadline: Instant) {
        let now = self.clock.now();
        let pause = self
            .retry_pause
            .saturating_sub(now.saturating_duration_since(started))
            .min(deadline.saturating_duration_since(now));
        if !pause.is_zero() {
            trace!(pause_ms = pause.as_millis() as u64, "Pausing before the next query");
            self.clock.sleep(pause);
        }
    }
}
