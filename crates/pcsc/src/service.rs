//! Card service backed by the system PC/SC library

use std::ffi::CStr;
use std::time::Duration;

use bytes::Bytes;
use nfc_tagid_core::{
    ActiveProtocol, CardService, Protocol, ReaderState, ReaderStatus, ServiceError, ShareMode,
};
use pcsc::{Card, Context, Disposition, Protocols, State};
use tracing::{debug, trace};

use crate::config::PcscConfig;
use crate::error::into_service_error;

/// [`CardService`] over PC/SC
#[derive(Debug, Clone, Default)]
pub struct PcscService {
    config: PcscConfig,
}

impl PcscService {
    /// Create a service with the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a service with a custom configuration
    pub const fn with_config(config: PcscConfig) -> Self {
        Self { config }
    }

    /// Configuration in use
    pub const fn config(&self) -> &PcscConfig {
        &self.config
    }
}

impl CardService for PcscService {
    type Context = Context;
    type Card = Card;

    fn establish_context(&self) -> Result<Context, ServiceError> {
        trace!(scope = ?self.config.scope, "Establishing PC/SC context");
        Context::establish(self.config.scope.into()).map_err(into_service_error)
    }

    fn release_context(&self, context: Context) -> Result<(), ServiceError> {
        // On failure pcsc hands the context back; dropping it retries the release
        context.release().map_err(|(_, e)| into_service_error(e))
    }

    fn reader_list_len(&self, context: &Context) -> Result<usize, ServiceError> {
        context.list_readers_len().map_err(into_service_error)
    }

    fn fill_reader_list(&self, context: &Context, buffer: &mut [u8]) -> Result<(), ServiceError> {
        context
            .list_readers(buffer)
            .map(|_| ())
            .map_err(into_service_error)
    }

    fn get_status_change(
        &self,
        context: &Context,
        timeout: Duration,
        state: &mut ReaderState,
    ) -> Result<(), ServiceError> {
        let current = match state.current_word() {
            0 => to_pcsc_state(state.current_status()),
            word => state_from_word(word),
        };
        let mut states = [pcsc::ReaderState::new(state.reader(), current)];
        context
            .get_status_change(timeout, &mut states)
            .map_err(into_service_error)?;

        let [reported] = &states;
        let event = reported.event_state();
        trace!(?event, count = reported.event_count(), "Reader state reported");
        state.set_event(from_pcsc_state(event), Bytes::copy_from_slice(reported.atr()));
        state.set_event_word(state_word(event, reported.event_count()));
        Ok(())
    }

    fn connect(
        &self,
        context: &Context,
        reader: &CStr,
        share_mode: ShareMode,
    ) -> Result<(Card, Option<Protocol>), ServiceError> {
        let card = context
            .connect(reader, to_pcsc_share_mode(share_mode), Protocols::T0 | Protocols::T1)
            .map_err(into_service_error)?;

        let protocol = match card.status2_owned() {
            Ok(status) => status.protocol2().map(from_pcsc_protocol),
            Err(e) => {
                debug!(error = %e, "Could not read the negotiated protocol");
                None
            }
        };
        Ok((card, protocol))
    }

    fn disconnect(&self, card: Card) -> Result<(), ServiceError> {
        card.disconnect(Disposition::LeaveCard)
            .map_err(|(_, e)| into_service_error(e))
    }

    fn transmit(
        &self,
        card: &Card,
        _protocol: ActiveProtocol,
        command: &[u8],
        response: &mut [u8],
    ) -> Result<usize, ServiceError> {
        // pcsc picks the protocol control block from the connection itself
        card.transmit(command, response)
            .map(<[u8]>::len)
            .map_err(into_service_error)
    }
}

const fn to_pcsc_share_mode(mode: ShareMode) -> pcsc::ShareMode {
    match mode {
        ShareMode::Exclusive => pcsc::ShareMode::Exclusive,
        ShareMode::Shared => pcsc::ShareMode::Shared,
        ShareMode::Direct => pcsc::ShareMode::Direct,
    }
}

const fn from_pcsc_protocol(protocol: pcsc::Protocol) -> Protocol {
    match protocol {
        pcsc::Protocol::T0 => Protocol::T0,
        pcsc::Protocol::T1 => Protocol::T1,
        pcsc::Protocol::RAW => Protocol::Raw,
    }
}

/// Pack flags and the card event counter the way the platform reports them
fn state_word(state: State, event_count: u32) -> u64 {
    u64::from(state.bits()) | (u64::from(event_count) << 16)
}

fn state_from_word(word: u64) -> State {
    State::from_bits_retain(word.try_into().unwrap_or_default())
}

fn to_pcsc_state(status: ReaderStatus) -> State {
    match status {
        ReaderStatus::Unaware => State::UNAWARE,
        ReaderStatus::Empty => State::EMPTY,
        ReaderStatus::Present => State::PRESENT,
        ReaderStatus::Mute => State::PRESENT | State::MUTE,
        ReaderStatus::Unavailable => State::UNAVAILABLE,
    }
}

fn from_pcsc_state(state: State) -> ReaderStatus {
    if state.contains(State::PRESENT) {
        // A mute card still counts as present; the connect stage reports it
        ReaderStatus::Present
    } else if state.contains(State::EMPTY) {
        ReaderStatus::Empty
    } else if state.intersects(State::UNAVAILABLE | State::IGNORE | State::UNKNOWN) {
        ReaderStatus::Unavailable
    } else {
        ReaderStatus::Unaware
    }
}
