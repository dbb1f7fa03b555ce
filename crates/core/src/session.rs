//! Resource-manager context guard
//!
//! A [`Session`] owns the context for the length of one tag read. Everything
//! acquired through it borrows the session, so the borrow checker enforces the
//! release order: card connections are dropped before the context they were
//! opened on.

use std::ffi::CStr;
use std::fmt;
use std::time::Duration;

use tracing::{debug, warn};

use crate::card::CardSession;
use crate::clock::Clock;
use crate::config::ShareMode;
use crate::error::{Error, Result, ServiceError};
use crate::poller::{PollState, PresencePoller};
use crate::reader::ReaderList;
use crate::service::{CardService, ReaderState};

/// Established resource-manager context, released on drop
pub struct Session<'s, S: CardService> {
    service: &'s S,
    context: Option<S::Context>,
}

impl<S: CardService> fmt::Debug for Session<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("established", &self.context.is_some())
            .finish()
    }
}

impl<'s, S: CardService> Session<'s, S> {
    /// Establish a context with the card service
    ///
    /// # Errors
    /// [`Error::ContextEstablishFailed`] when the service refuses a context.
    pub fn establish(service: &'s S) -> Result<Self> {
        let context = service
            .establish_context()
            .map_err(Error::ContextEstablishFailed)?;
        debug!("Resource manager context established");

        Ok(Self {
            service,
            context: Some(context),
        })
    }

    /// Card service backing this session
    pub const fn service(&self) -> &'s S {
        self.service
    }

    fn context(&self) -> &S::Context {
        // Only taken by `drop` and `release`, both consuming
        match &self.context {
            Some(context) => context,
            None => unreachable!("session used after release"),
        }
    }

    /// Discover the attached readers
    ///
    /// # Errors
    /// See [`ReaderList::discover`].
    pub fn discover_readers(&self) -> Result<ReaderList> {
        let readers = ReaderList::discover(self.service, self.context())?;
        debug!(count = readers.len(), "Readers discovered");
        Ok(readers)
    }

    /// Wait until `reader` reports a card or `timeout` elapses
    ///
    /// # Errors
    /// [`Error::NoCardDetected`] when the deadline passes first.
    pub fn wait_for_card<C: Clock>(
        &self,
        reader: &CStr,
        timeout: Duration,
        clock: &C,
        retry_pause: Duration,
    ) -> Result<ReaderState> {
        let poller =
            PresencePoller::new(self.service, self.context(), clock).with_retry_pause(retry_pause);

        let mut state = ReaderState::new(reader);
        match poller.poll(&mut state, timeout) {
            PollState::CardPresent => {
                debug!(
                    reader = %reader.to_string_lossy(),
                    atr = %hex::encode_upper(state.atr()),
                    "Card present"
                );
                Ok(state)
            }
            PollState::TimedOut | PollState::Waiting => Err(Error::NoCardDetected),
        }
    }

    /// Connect to the card in `reader`
    ///
    /// # Errors
    /// See [`CardSession::connect`].
    pub fn connect(&self, reader: &CStr, share_mode: ShareMode) -> Result<CardSession<'_, S>> {
        CardSession::connect(self.service, self.context(), reader, share_mode)
    }

    /// Release the context now, reporting a failure instead of logging it
    ///
    /// # Errors
    /// The service's error when the release fails. The context is gone either
    /// way.
    pub fn release(mut self) -> Result<(), ServiceError> {
        match self.context.take() {
            Some(context) => self.service.release_context(context),
            None => Ok(()),
        }
    }
}

impl<S: CardService> Drop for Session<'_, S> {
    fn drop(&mut self) {
        if let Some(context) = self.context.take() {
            match self.service.release_context(context) {
                Ok(()) => debug!("Resource manager context released"),
                Err(e) => warn!(error = %e, "Failed to release resource manager context"),
            }
        }
    }
}
