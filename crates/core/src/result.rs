//! Text result handed back to the caller

use derive_more::Display;

use crate::codec::Uid;
use crate::error::{Error, Result};

/// The single text value produced by a tag read
///
/// Either the UID in uppercase hex or `Error:<code> <message>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display)]
#[display("{text}")]
pub struct ResultText {
    text: String,
    code: Option<u8>,
}

impl ResultText {
    /// Result carrying a UID
    pub fn uid(uid: &Uid) -> Self {
        Self {
            text: uid.to_hex(),
            code: None,
        }
    }

    /// Result carrying a stage-coded error
    pub fn error(err: &Error) -> Self {
        Self {
            text: format!("Error:{} {}", err.code(), err),
            code: Some(err.code()),
        }
    }

    /// The text value
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Stage code when the read failed
    pub const fn error_code(&self) -> Option<u8> {
        self.code
    }

    /// Whether the read failed
    pub const fn is_error(&self) -> bool {
        self.code.is_some()
    }

    /// Consume into the text value
    pub fn into_string(self) -> String {
        self.text
    }
}

impl From<Result<Uid>> for ResultText {
    fn from(result: Result<Uid>) -> Self {
        match result {
            Ok(uid) => Self::uid(&uid),
            Err(err) => Self::error(&err),
        }
    }
}

impl AsRef<str> for ResultText {
    fn as_ref(&self) -> &str {
        &self.text
    }
}
