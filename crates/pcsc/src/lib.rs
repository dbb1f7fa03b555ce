//! PC/SC card service for contactless tag reads
//!
//! This crate implements the [`CardService`](nfc_tagid_core::CardService) trait
//! from `nfc-tagid-core` on top of the system PC/SC library (`winscard` on
//! Windows, `PCSC.framework` on macOS, pcsc-lite elsewhere).
//!
//! # Examples
//!
//! ```no_run
//! use nfc_tagid_core::TagReader;
//! use nfc_tagid_transport_pcsc::PcscService;
//!
//! let reader = TagReader::new(PcscService::new());
//! let result = reader.get_tag_id(&[5.0]);
//! println!("{result}");
//! ```
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![warn(missing_docs)]

mod config;
mod error;
mod service;

pub use config::{PcscConfig, Scope};
pub use error::into_service_error;
pub use service::PcscService;

// Re-export the pcsc types that appear in the public API
pub use pcsc::{Card, Context};
