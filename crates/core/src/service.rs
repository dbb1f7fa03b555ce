//! Card-service capability consumed by the reader session
//!
//! A [`CardService`] is the platform boundary: it owns nothing itself and hands
//! out raw context and card handles. The session types in this crate wrap
//! every handle in a guard, so implementations do not need to track cleanup.

use std::ffi::{CStr, CString};
use std::time::Duration;

use bytes::Bytes;
use derive_more::Display;

use crate::card::ActiveProtocol;
use crate::config::ShareMode;
use crate::error::ServiceError;

/// Transmission protocol reported by the platform after connecting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum Protocol {
    /// Character-oriented half-duplex protocol
    #[display("T=0")]
    T0,
    /// Block-oriented half-duplex protocol
    #[display("T=1")]
    T1,
    /// Raw reader protocol
    #[display("RAW")]
    Raw,
}

/// Presence state of a reader as seen by a status query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display)]
pub enum ReaderStatus {
    /// The state is not known yet
    #[default]
    Unaware,
    /// No card in the reader
    Empty,
    /// A card is in the reader
    Present,
    /// A card is in the reader but does not answer
    Mute,
    /// The reader cannot be used
    Unavailable,
}

/// Last-known and current state of one reader
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaderState {
    reader: CString,
    current: ReaderStatus,
    event: ReaderStatus,
    current_word: u64,
    event_word: u64,
    atr: Bytes,
}

impl ReaderState {
    /// Start tracking a reader whose state is not known yet
    pub fn new(reader: impl Into<CString>) -> Self {
        Self {
            reader: reader.into(),
            current: ReaderStatus::Unaware,
            event: ReaderStatus::Unaware,
            current_word: 0,
            event_word: 0,
            atr: Bytes::new(),
        }
    }

    /// Reader name
    pub fn reader(&self) -> &CStr {
        &self.reader
    }

    /// State the caller last observed
    pub const fn current_status(&self) -> ReaderStatus {
        self.current
    }

    /// State reported by the last status query
    pub const fn event_status(&self) -> ReaderStatus {
        self.event
    }

    /// ATR reported with the last event, empty when no card answered
    pub fn atr(&self) -> &[u8] {
        &self.atr
    }

    /// Platform state word the caller last acknowledged, zero when unknown
    ///
    /// Backends whose state carries more than [`ReaderStatus`] can express
    /// (event counters, vendor flags) hand this back to the platform so the
    /// next query compares against exactly what was reported.
    pub const fn current_word(&self) -> u64 {
        self.current_word
    }

    /// Platform state word reported by the last status query
    pub const fn event_word(&self) -> u64 {
        self.event_word
    }

    /// Record the result of a status query
    ///
    /// Clears the platform word; backends that have one set it afterwards with
    /// [`set_event_word`](Self::set_event_word).
    pub fn set_event(&mut self, status: ReaderStatus, atr: Bytes) {
        self.event = status;
        self.event_word = 0;
        self.atr = atr;
    }

    /// Record the raw platform state word of the last event
    pub const fn set_event_word(&mut self, word: u64) {
        self.event_word = word;
    }

    /// Acknowledge the last event so the next query waits for a new change
    pub const fn sync_current_state(&mut self) {
        self.current = self.event;
        self.current_word = self.event_word;
    }

    /// Check whether the last event reports a card
    pub const fn is_card_present(&self) -> bool {
        matches!(self.event, ReaderStatus::Present)
    }
}

/// Platform smart-card service
///
/// The four capability groups are context lifetime, the two-phase reader list,
/// the blocking status query and the card connection.
pub trait CardService {
    /// Resource-manager context handle
    type Context;

    /// Connected card handle
    type Card;

    /// Acquire a resource-manager context
    fn establish_context(&self) -> Result<Self::Context, ServiceError>;

    /// Release a context obtained from [`establish_context`](Self::establish_context)
    fn release_context(&self, context: Self::Context) -> Result<(), ServiceError>;

    /// Size in bytes of the reader multi-string
    fn reader_list_len(&self, context: &Self::Context) -> Result<usize, ServiceError>;

    /// Fill `buffer` with NUL-separated reader names, ending with an empty name
    fn fill_reader_list(&self, context: &Self::Context, buffer: &mut [u8])
    -> Result<(), ServiceError>;

    /// Block until the reader state differs from `state.current_status()` or
    /// `timeout` elapses
    ///
    /// On success the new state is recorded with [`ReaderState::set_event`].
    fn get_status_change(
        &self,
        context: &Self::Context,
        timeout: Duration,
        state: &mut ReaderState,
    ) -> Result<(), ServiceError>;

    /// Connect to the card requesting T=0 or T=1
    ///
    /// Returns the card handle and the negotiated protocol, if the platform
    /// reported one.
    fn connect(
        &self,
        context: &Self::Context,
        reader: &CStr,
        share_mode: ShareMode,
    ) -> Result<(Self::Card, Option<Protocol>), ServiceError>;

    /// Disconnect from the card, leaving it in the reader
    fn disconnect(&self, card: Self::Card) -> Result<(), ServiceError>;

    /// Send `command` and write the answer into `response`
    ///
    /// Returns the number of response bytes written.
    fn transmit(
        &self,
        card: &Self::Card,
        protocol: ActiveProtocol,
        command: &[u8],
        response: &mut [u8],
    ) -> Result<usize, ServiceError>;
}

impl<S: CardService + ?Sized> CardService for &S {
    type Context = S::Context;
    type Card = S::Card;

    fn establish_context(&self) -> Result<Self::Context, ServiceError> {
        (**self).establish_context()
    }

    fn release_context(&self, context: Self::Context) -> Result<(), ServiceError> {
        (**self).release_context(context)
    }

    fn reader_list_len(&self, context: &Self::Context) -> Result<usize, ServiceError> {
        (**self).reader_list_len(context)
    }

    fn fill_reader_list(
        &self,
        context: &Self::Context,
        buffer: &mut [u8],
    ) -> Result<(), ServiceError> {
        (**self).fill_reader_list(context, buffer)
    }

    fn get_status_change(
        &self,
        context: &Self::Context,
        timeout: Duration,
        state: &mut ReaderState,
    ) -> Result<(), ServiceError> {
        (**self).get_status_change(context, timeout, state)
    }

    fn connect(
        &self,
        context: &Self::Context,
        reader: &CStr,
        share_mode: ShareMode,
    ) -> Result<(Self::Card, Option<Protocol>), ServiceError> {
        (**self).connect(context, reader, share_mode)
    }

    fn disconnect(&self, card: Self::Card) -> Result<(), ServiceError> {
        (**self).disconnect(card)
    }

    fn transmit(
        &self,
        card: &Self::Card,
        protocol: ActiveProtocol,
        command: &[u8],
        response: &mut [u8],
    ) -> Result<usize, ServiceError> {
        (**self).transmit(card, protocol, command, response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reader_state_tracking() {
        let mut state = ReaderState::new(c"ACS ACR122U 00 00".to_owned());
        assert_eq!(state.current_status(), ReaderStatus::Unaware);
        assert!(!state.is_card_present());

        state.set_event(ReaderStatus::Empty, Bytes::new());
        assert_eq!(state.current_status(), ReaderStatus::Unaware);
        state.sync_current_state();
        assert_eq!(state.current_status(), ReaderStatus::Empty);

        state.set_event(
            ReaderStatus::Present,
            Bytes::from_static(&[0x3B, 0x8F, 0x80, 0x01]),
        );
        assert!(state.is_card_present());
        assert_eq!(state.atr(), &[0x3B, 0x8F, 0x80, 0x01]);
        assert_eq!(state.reader(), c"ACS ACR122U 00 00");
    }

    #[test]
    fn test_platform_word_follows_sync() {
        let mut state = ReaderState::new(c"ACS ACR122U 00 00".to_owned());
        assert_eq!(state.current_word(), 0);

        state.set_event(ReaderStatus::Unavailable, Bytes::new());
        state.set_event_word(0x0003_0012);
        assert_eq!(state.current_word(), 0);

        state.sync_current_state();
        assert_eq!(state.current_status(), ReaderStatus::Unavailable);
        assert_eq!(state.current_word(), 0x0003_0012);

        // A new event without a word does not keep the stale one
        state.set_event(ReaderStatus::Empty, Bytes::new());
        assert_eq!(state.event_word(), 0);
        assert_eq!(state.current_word(), 0x0003_0012);
    }

    #[test]
    fn test_protocol_display() {
        assert_eq!(Protocol::T0.to_string(), "T=0");
        assert_eq!(Protocol::T1.to_string(), "T=1");
        assert_eq!(Protocol::Raw.to_string(), "RAW");
    }
}
