//! Common test utilities

#![allow(dead_code, unreachable_pub)]

use nfc_tagid_core::CardService;
use nfc_tagid_transport_pcsc::{Context, PcscConfig, PcscService, Scope};

/// Service using the user scope, which needs no elevated rights
pub fn user_service() -> PcscService {
    PcscService::with_config(PcscConfig::new().with_scope(Scope::User))
}

/// Try to get a real PC/SC context for tests
pub fn get_pcsc_context(service: &PcscService) -> Option<Context> {
    service.establish_context().ok()
}

/// Check whether at least one reader is attached
pub fn has_reader(service: &PcscService) -> bool {
    let Some(context) = get_pcsc_context(service) else {
        return false;
    };
    let attached = service
        .reader_list_len(&context)
        .map(|len| len > 1)
        .unwrap_or(false);
    let _ = service.release_context(context);
    attached
}
