//! Error types for tag UID retrieval
//!
//! [`Error`] is the stage-coded error surfaced to callers: every variant maps to
//! the numeric stage code reported in the `Error:<code> <message>` result text.
//! [`ServiceError`] is what a [`CardService`](crate::CardService) backend
//! reports; stage errors keep it as their source.

use crate::apdu::StatusWord;
use crate::service::Protocol;

/// Result type used throughout the crate
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Errors reported by a card-service backend
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError {
    /// A blocking call reached its timeout
    #[error("Operation timed out")]
    Timeout,

    /// The platform knows of no reader
    #[error("No readers available")]
    NoReadersAvailable,

    /// No card is present in the reader
    #[error("No smart card present")]
    NoSmartcard,

    /// The card was removed during the operation
    #[error("Card was removed")]
    RemovedCard,

    /// The supplied buffer cannot hold the result
    #[error("Buffer too small")]
    InsufficientBuffer,

    /// The handle was already released
    #[error("Invalid handle")]
    InvalidHandle,

    /// Platform error with its native code
    #[error("{message} (code {code:#010X})")]
    Platform {
        /// Native error code
        code: u32,
        /// Platform description of the error
        message: String,
    },

    /// Other error with message
    #[error("{0}")]
    Other(String),
}

impl ServiceError {
    /// Create a platform error from its native code
    pub fn platform<S: Into<String>>(code: u32, message: S) -> Self {
        Self::Platform {
            code,
            message: message.into(),
        }
    }

    /// Create a general other error
    pub fn other<S: Into<String>>(message: S) -> Self {
        Self::Other(message.into())
    }
}

/// Terminal failure of a tag read, one variant per pipeline stage
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The timeout argument is not an integer
    #[error("Invalid input. Please enter an integer value.")]
    NonIntegerInput,

    /// No timeout argument was supplied
    #[error("No input detected.")]
    NoInput,

    /// The resource-manager context could not be established
    #[error("SCardEstablish failed.")]
    ContextEstablishFailed(#[source] ServiceError),

    /// The size probe of the reader list failed
    #[error("Get the size needed for the reader list failed.")]
    ReaderListSizeQueryFailed(#[source] ServiceError),

    /// The reader list buffer could not be allocated
    #[error("Allocate memory for the reader list failed.")]
    AllocationFailed {
        /// Requested buffer size in bytes
        requested: usize,
    },

    /// Filling the reader list failed, or it held no reader
    #[error("SCardListReaders failed.")]
    ReaderListFetchFailed(#[source] ServiceError),

    /// The deadline elapsed before a card was presented
    #[error("No card was detected.")]
    NoCardDetected,

    /// Connecting to the presented card failed
    #[error("SCardConnect failed.")]
    CardConnectFailed(#[source] ServiceError),

    /// The negotiated protocol is neither T=0 nor T=1
    #[error("Unsupported protocol.")]
    UnsupportedProtocol(Option<Protocol>),

    /// The transport call failed
    #[error("Failed to transmit command to the card.")]
    TransmitFailed(#[source] ServiceError),

    /// The response cannot even hold a status word
    #[error("Failed to transmit command to the card.")]
    MalformedResponse {
        /// Length of the received response
        len: usize,
    },

    /// The card answered with a non-success status word
    #[error("Card rejected the command (SW={status}).")]
    StatusRejected {
        /// Status word returned by the card
        status: StatusWord,
    },

    /// The card answered 90 00 without any UID byte
    #[error("Card returned an empty UID.")]
    EmptyUid,
}

impl Error {
    /// Stage code reported in the result text
    pub const fn code(&self) -> u8 {
        match self {
            Self::NonIntegerInput => 0,
            Self::NoInput => 1,
            Self::ContextEstablishFailed(_) => 2,
            Self::ReaderListSizeQueryFailed(_) => 3,
            Self::AllocationFailed { .. } => 4,
            Self::ReaderListFetchFailed(_) => 5,
            Self::NoCardDetected => 6,
            Self::CardConnectFailed(_) => 7,
            Self::UnsupportedProtocol(_) => 8,
            Self::TransmitFailed(_) | Self::MalformedResponse { .. } => 9,
            Self::StatusRejected { .. } => 10,
            Self::EmptyUid => 11,
        }
    }
}
