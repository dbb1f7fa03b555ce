//! Mapping of PC/SC errors onto card-service errors

use nfc_tagid_core::ServiceError;

/// Translate a PC/SC error, keeping its native code when no variant fits
pub fn into_service_error(err: pcsc::Error) -> ServiceError {
    match err {
        pcsc::Error::Timeout => ServiceError::Timeout,
        pcsc::Error::NoReadersAvailable => ServiceError::NoReadersAvailable,
        pcsc::Error::NoSmartcard => ServiceError::NoSmartcard,
        pcsc::Error::RemovedCard => ServiceError::RemovedCard,
        pcsc::Error::InsufficientBuffer => ServiceError::InsufficientBuffer,
        pcsc::Error::InvalidHandle => ServiceError::InvalidHandle,
        other => ServiceError::platform(other as u32, other.to_string()),
    }
}
