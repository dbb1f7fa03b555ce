//! Retrieve the UID of a contactless tag through a smart-card reader
//!
//! This crate implements the reader session that sits between a caller and the
//! platform card service:
//!
//! - validating the caller's timeout argument
//! - establishing a resource-manager context and discovering a reader
//! - waiting, with a deadline, for a card to be presented
//! - connecting with a supported transmission protocol
//! - sending the fixed `GET UID` command and decoding the response
//!
//! Every acquired resource is held by a scoped guard, so the context and the
//! card connection are released in reverse order whichever stage fails.
//!
//! The platform itself is abstracted behind [`CardService`]; the
//! `nfc-tagid-transport-pcsc` crate provides the PC/SC implementation.
//!
//! # Examples
//!
//! ```no_run
//! # fn demo<S: nfc_tagid_core::CardService>(service: S) {
//! use nfc_tagid_core::TagReader;
//!
//! let reader = TagReader::new(service);
//! let result = reader.get_tag_id(&[3.0]);
//! println!("{result}");
//! # }
//! ```
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![forbid(unsafe_code)]
#![warn(missing_docs, rustdoc::missing_crate_level_docs)]

// Re-export bytes for convenience
pub use bytes::Bytes;

pub mod apdu;
pub mod card;
pub mod clock;
pub mod codec;
pub mod config;
pub mod input;
pub mod poller;
pub mod reader;
pub mod result;
pub mod service;
pub mod session;
pub mod tag_reader;

mod error;
pub use error::{Error, Result, ServiceError};

pub use apdu::{ApduResponse, GET_UID, RESPONSE_CAPACITY, StatusWord};
pub use card::{ActiveProtocol, CardSession};
pub use clock::{Clock, SystemClock};
pub use codec::{Uid, encode_uid};
pub use config::{SessionConfig, ShareMode};
pub use input::TimeoutSpec;
pub use poller::{PollState, PresencePoller};
pub use reader::ReaderList;
pub use result::ResultText;
pub use service::{CardService, Protocol, ReaderState, ReaderStatus};
pub use session::Session;
pub use tag_reader::{TagReader, get_tag_id};
