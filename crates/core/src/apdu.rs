//! The fixed `GET UID` command and its response framing

use bytes::Bytes;
use derive_more::Display;
use tracing::Level;

use crate::error::{Error, Result};

/// PC/SC pseudo-APDU asking the reader for the UID of the card in the field
///
/// `CLA=FF INS=CA P1=00 P2=00 Le=00`
pub const GET_UID: [u8; 5] = [0xFF, 0xCA, 0x00, 0x00, 0x00];

/// Size of the receive buffer handed to the transport
pub const RESPONSE_CAPACITY: usize = 256;

/// Status Word (SW1-SW2) trailing an APDU response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[display("{sw1:02X}{sw2:02X}")]
pub struct StatusWord {
    /// First status byte (SW1)
    pub sw1: u8,
    /// Second status byte (SW2)
    pub sw2: u8,
}

impl StatusWord {
    /// Status word of a successful command
    pub const SUCCESS: Self = Self::new(0x90, 0x00);

    /// Create a new status word
    pub const fn new(sw1: u8, sw2: u8) -> Self {
        Self { sw1, sw2 }
    }

    /// Convert to a u16 value (SW1 | SW2)
    pub const fn to_u16(&self) -> u16 {
        ((self.sw1 as u16) << 8) | (self.sw2 as u16)
    }

    /// Check if this status word indicates success (90 00)
    pub const fn is_success(&self) -> bool {
        self.sw1 == 0x90 && self.sw2 == 0x00
    }

    /// Get the appropriate tracing level for this status word
    pub const fn tracing_level(&self) -> Level {
        if self.is_success() {
            Level::DEBUG
        } else if self.sw1 == 0x62 || self.sw1 == 0x63 {
            Level::INFO
        } else {
            Level::WARN
        }
    }

    /// Get a description of this status word
    ///
    /// Covers the words a reader returns for the `GET DATA` pseudo-APDU.
    pub const fn description(&self) -> &'static str {
        match (self.sw1, self.sw2) {
            (0x90, 0x00) => "Success",
            (0x62, 0x82) => "End of data reached before Le bytes",
            (0x63, 0x00) => "Operation failed",
            (0x67, 0x00) => "Wrong length",
            (0x68, 0x00) => "Class byte not supported",
            (0x6A, 0x81) => "Function not supported",
            (0x6B, 0x00) => "Wrong parameters P1-P2",
            (0x6C, _) => "Wrong Le field",
            (0x6D, 0x00) => "Instruction not supported",
            (0x6E, 0x00) => "Class not supported",
            _ => "Unknown status",
        }
    }
}

/// Response to an APDU split into payload and status word
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApduResponse {
    payload: Bytes,
    status: StatusWord,
}

impl ApduResponse {
    /// Split raw response bytes into payload and trailing status word
    ///
    /// # Errors
    /// Returns [`Error::MalformedResponse`] when fewer than two bytes were received.
    pub fn from_bytes(data: Bytes) -> Result<Self> {
        let len = data.len();
        if len < 2 {
            return Err(Error::MalformedResponse { len });
        }

        let status = StatusWord::new(data[len - 2], data[len - 1]);
        let payload = data.slice(..len - 2);
        Ok(Self { payload, status })
    }

    /// Payload without the status word
    pub const fn payload(&self) -> &Bytes {
        &self.payload
    }

    /// Trailing status word
    pub const fn status(&self) -> StatusWord {
        self.status
    }

    /// Check whether the card reported success
    pub const fn is_success(&self) -> bool {
        self.status.is_success()
    }
}
