//! Reader discovery

use std::ffi::{CStr, CString};
use std::iter;

use tracing::debug;

use crate::error::{Error, Result, ServiceError};
use crate::service::CardService;

/// Reader names reported by the platform, in platform order
///
/// Never empty: discovery fails when the platform reports no reader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaderList {
    first: CString,
    rest: Vec<CString>,
}

impl ReaderList {
    /// Query the reader list with the size-then-fill protocol
    ///
    /// # Errors
    /// [`Error::ReaderListSizeQueryFailed`] when the size probe fails,
    /// [`Error::AllocationFailed`] when the buffer cannot be reserved and
    /// [`Error::ReaderListFetchFailed`] when filling fails or yields no name.
    pub fn discover<S: CardService>(service: &S, context: &S::Context) -> Result<Self> {
        let len = service
            .reader_list_len(context)
            .map_err(Error::ReaderListSizeQueryFailed)?;

        let mut buffer = Vec::new();
        buffer
            .try_reserve_exact(len)
            .map_err(|_| Error::AllocationFailed { requested: len })?;
        buffer.resize(len, 0);

        service
            .fill_reader_list(context, &mut buffer)
            .map_err(Error::ReaderListFetchFailed)?;

        let mut names = parse_multi_string(&buffer).into_iter();
        let Some(first) = names.next() else {
            return Err(Error::ReaderListFetchFailed(
                ServiceError::NoReadersAvailable,
            ));
        };

        let list = Self {
            first,
            rest: names.collect(),
        };
        if list.len() > 1 {
            debug!(
                selected = %list.first().to_string_lossy(),
                ignored = list.len() - 1,
                "Several readers attached, using the first"
            );
        }
        Ok(list)
    }

    /// The reader every session targets
    pub fn first(&self) -> &CStr {
        &self.first
    }

    /// All reader names
    pub fn names(&self) -> impl Iterator<Item = &CStr> {
        iter::once(self.first.as_c_str()).chain(self.rest.iter().map(CString::as_c_str))
    }

    /// Number of readers
    pub const fn len(&self) -> usize {
        1 + self.rest.len()
    }

    /// Always false for a discovered list
    pub const fn is_empty(&self) -> bool {
        false
    }
}

/// Split a NUL-separated multi-string, stopping at the first empty name
fn parse_multi_string(buffer: &[u8]) -> Vec<CString> {
    buffer
        .split(|&b| b == 0)
        .take_while(|name| !name.is_empty())
        .filter_map(|name| CString::new(name).ok())
        .collect()
}
