//! Card connection and APDU exchange

use std::ffi::CStr;
use std::fmt;

use bytes::Bytes;
use derive_more::Display;
use tracing::{Level, debug, info, trace, warn};

use crate::apdu::ApduResponse;
use crate::config::ShareMode;
use crate::error::{Error, Result, ServiceError};
use crate::service::{CardService, Protocol};

/// Transmission protocol a session can exchange APDUs on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum ActiveProtocol {
    /// T=0
    #[display("T=0")]
    T0,
    /// T=1
    #[display("T=1")]
    T1,
}

impl ActiveProtocol {
    /// Narrow a negotiated protocol to a supported one
    pub const fn from_protocol(protocol: Protocol) -> Option<Self> {
        match protocol {
            Protocol::T0 => Some(Self::T0),
            Protocol::T1 => Some(Self::T1),
            Protocol::Raw => None,
        }
    }
}

impl From<ActiveProtocol> for Protocol {
    fn from(protocol: ActiveProtocol) -> Self {
        match protocol {
            ActiveProtocol::T0 => Self::T0,
            ActiveProtocol::T1 => Self::T1,
        }
    }
}

/// Connected card handle, disconnected on drop
struct CardHandle<'a, S: CardService> {
    service: &'a S,
    card: Option<S::Card>,
}

impl<S: CardService> CardHandle<'_, S> {
    fn card(&self) -> &S::Card {
        // Only taken by `drop` and `CardSession::disconnect`, both consuming
        match &self.card {
            Some(card) => card,
            None => unreachable!("card handle used after disconnect"),
        }
    }
}

impl<S: CardService> Drop for CardHandle<'_, S> {
    fn drop(&mut self) {
        if let Some(card) = self.card.take() {
            match self.service.disconnect(card) {
                Ok(()) => debug!("Card disconnected"),
                Err(e) => warn!(error = %e, "Failed to disconnect card"),
            }
        }
    }
}

/// Connection to a card over a supported protocol
///
/// Borrows the context it was opened on, so it always goes away first.
pub struct CardSession<'a, S: CardService> {
    handle: CardHandle<'a, S>,
    protocol: ActiveProtocol,
}

impl<S: CardService> fmt::Debug for CardSession<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CardSession")
            .field("connected", &self.handle.card.is_some())
            .field("protocol", &self.protocol)
            .finish()
    }
}

impl<'a, S: CardService> CardSession<'a, S> {
    /// Connect to the card in `reader`
    ///
    /// # Errors
    /// [`Error::CardConnectFailed`] when the connection fails and
    /// [`Error::UnsupportedProtocol`] when the negotiated protocol is neither
    /// T=0 nor T=1. The card is disconnected again in the latter case.
    pub fn connect(
        service: &'a S,
        context: &'a S::Context,
        reader: &CStr,
        share_mode: ShareMode,
    ) -> Result<Self> {
        let (card, negotiated) = service
            .connect(context, reader, share_mode)
            .map_err(Error::CardConnectFailed)?;

        let handle = CardHandle {
            service,
            card: Some(card),
        };

        let Some(protocol) = negotiated.and_then(ActiveProtocol::from_protocol) else {
            debug!(protocol = ?negotiated, "Negotiated protocol not supported");
            return Err(Error::UnsupportedProtocol(negotiated));
        };

        debug!(%protocol, ?share_mode, "Connected to card");
        Ok(Self { handle, protocol })
    }

    /// Negotiated protocol
    pub const fn protocol(&self) -> ActiveProtocol {
        self.protocol
    }

    /// Send raw command bytes and collect at most `capacity` response bytes
    ///
    /// # Errors
    /// [`Error::TransmitFailed`] when the transport call fails.
    pub fn transmit_raw(&self, command: &[u8], capacity: usize) -> Result<Bytes> {
        let card = self.handle.card();
        trace!(command = %hex::encode_upper(command), protocol = %self.protocol, "Transmitting command");

        let mut buffer = vec![0u8; capacity];
        let len = self
            .handle
            .service
            .transmit(card, self.protocol, command, &mut buffer)
            .map_err(Error::TransmitFailed)?;
        if len > buffer.len() {
            return Err(Error::TransmitFailed(ServiceError::InsufficientBuffer));
        }
        buffer.truncate(len);

        trace!(response = %hex::encode_upper(&buffer), "Received response");
        Ok(Bytes::from(buffer))
    }

    /// Exchange one APDU and split the answer into payload and status word
    ///
    /// # Errors
    /// [`Error::TransmitFailed`] when the transport call fails and
    /// [`Error::MalformedResponse`] when the answer lacks a status word.
    pub fn exchange(&self, command: &[u8], capacity: usize) -> Result<ApduResponse> {
        let response = ApduResponse::from_bytes(self.transmit_raw(command, capacity)?)?;

        let status = response.status();
        let level = status.tracing_level();
        if level == Level::DEBUG {
            debug!(%status, "Command completed");
        } else if level == Level::INFO {
            info!(%status, description = status.description(), "Command completed with a warning");
        } else {
            warn!(%status, description = status.description(), "Command returned an error status");
        }
        Ok(response)
    }

    /// Disconnect now, reporting a failure instead of logging it
    ///
    /// # Errors
    /// The service's error when the disconnect fails. The handle is gone
    /// either way.
    pub fn disconnect(mut self) -> Result<(), ServiceError> {
        match self.handle.card.take() {
            Some(card) => self.handle.service.disconnect(card),
            None => Ok(()),
        }
    }
}
