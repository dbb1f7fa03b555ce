//! The tag read pipeline
//!
//! Stages run strictly in order: context, reader discovery, presence poll,
//! connection, `GET UID` exchange, decoding. Guards are dropped in reverse on
//! every return path.

use std::fmt;

use tracing::{debug, instrument};

use crate::apdu::GET_UID;
use crate::clock::{Clock, SystemClock};
use crate::codec::Uid;
use crate::config::SessionConfig;
use crate::error::Result;
use crate::input::TimeoutSpec;
use crate::result::ResultText;
use crate::service::CardService;
use crate::session::Session;

/// Reads tag UIDs through a card service
pub struct TagReader<S, C = SystemClock> {
    service: S,
    clock: C,
    config: SessionConfig,
}

impl<S, C> fmt::Debug for TagReader<S, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TagReader")
            .field("config", &self.config)
            .finish()
    }
}

impl<S: CardService> TagReader<S> {
    /// Create a reader with the default configuration and the system clock
    pub fn new(service: S) -> Self {
        Self {
            service,
            clock: SystemClock,
            config: SessionConfig::default(),
        }
    }
}

impl<S: CardService, C: Clock> TagReader<S, C> {
    /// Replace the configuration
    pub fn with_config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the time source
    pub fn with_clock<C2: Clock>(self, clock: C2) -> TagReader<S, C2> {
        TagReader {
            service: self.service,
            clock,
            config: self.config,
        }
    }

    /// Card service in use
    pub const fn service(&self) -> &S {
        &self.service
    }

    /// Configuration in use
    pub const fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Wait for a tag and read its UID
    ///
    /// # Errors
    /// The stage-coded [`Error`](crate::Error) of the first stage that failed.
    #[instrument(level = "debug", skip(self), fields(timeout_secs = timeout.seconds()))]
    pub fn read_uid(&self, timeout: TimeoutSpec) -> Result<Uid> {
        let session = Session::establish(&self.service)?;
        let readers = session.discover_readers()?;
        let reader = readers.first();

        session.wait_for_card(
            reader,
            timeout.as_duration(),
            &self.clock,
            self.config.retry_pause,
        )?;

        let card = session.connect(reader, self.config.share_mode)?;
        let response = card.exchange(&GET_UID, self.config.response_capacity)?;
        let uid = Uid::from_response(&response)?;

        debug!(%uid, "Tag UID read");
        Ok(uid)
    }

    /// Host-facing entry point: argument list in, result text out
    ///
    /// Never fails; every error becomes an `Error:<code> <message>` text.
    pub fn get_tag_id(&self, args: &[f64]) -> ResultText {
        let result = TimeoutSpec::from_args(args).and_then(|timeout| self.read_uid(timeout));
        if let Err(e) = &result {
            debug!(code = e.code(), error = %e, "Tag read failed");
        }
        ResultText::from(result)
    }
}

/// Read a tag UID with the default configuration
pub fn get_tag_id<S: CardService>(service: &S, args: &[f64]) -> ResultText {
    TagReader::new(service).get_tag_id(args)
}
