//! UID rendering

use bytes::Bytes;
use derive_more::Display;

use crate::apdu::ApduResponse;
use crate::error::{Error, Result};

/// Render a raw `GET UID` response as uppercase hex, status word excluded
///
/// Two digits per byte, no separators. A status-word-only response yields an
/// empty string.
///
/// # Errors
/// Returns [`Error::MalformedResponse`] when the response is shorter than the
/// two-byte status word.
pub fn encode_uid(response: &[u8]) -> Result<String> {
    let response = ApduResponse::from_bytes(Bytes::copy_from_slice(response))?;
    Ok(Uid::new(response.payload().clone()).to_hex())
}

/// Unique identifier of a contactless tag
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display)]
#[display("{}", hex::encode_upper(_0))]
pub struct Uid(Bytes);

impl Uid {
    /// Wrap raw UID bytes
    pub const fn new(bytes: Bytes) -> Self {
        Self(bytes)
    }

    /// Extract the UID from a `GET UID` response
    ///
    /// # Errors
    /// [`Error::StatusRejected`] for a non-success status word and
    /// [`Error::EmptyUid`] when the card answered without any UID byte.
    pub fn from_response(response: &ApduResponse) -> Result<Self> {
        if !response.is_success() {
            return Err(Error::StatusRejected {
                status: response.status(),
            });
        }
        if response.payload().is_empty() {
            return Err(Error::EmptyUid);
        }
        Ok(Self(response.payload().clone()))
    }

    /// Raw UID bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Uppercase hex rendering
    pub fn to_hex(&self) -> String {
        self.to_string()
    }
}
