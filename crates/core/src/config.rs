//! Configuration options for a reader session

use std::time::Duration;

use crate::apdu::RESPONSE_CAPACITY;

/// Sharing mode for card connections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShareMode {
    /// Exclusive access to the card
    Exclusive,
    /// Shared access to the card (default)
    #[default]
    Shared,
    /// Direct connection to the reader
    Direct,
}

/// Configuration options for a tag read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Sharing mode for the card connection
    pub share_mode: ShareMode,

    /// Capacity of the response buffer handed to the transport
    pub response_capacity: usize,

    /// Minimum spacing between status queries that return without a card
    pub retry_pause: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            share_mode: ShareMode::Shared,
            response_capacity: RESPONSE_CAPACITY,
            retry_pause: Duration::from_millis(10),
        }
    }
}

impl SessionConfig {
    /// Create a new default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the sharing mode
    pub const fn with_share_mode(mut self, mode: ShareMode) -> Self {
        self.share_mode = mode;
        self
    }

    /// Set the response buffer capacity
    pub const fn with_response_capacity(mut self, capacity: usize) -> Self {
        self.response_capacity = capacity;
        self
    }

    /// Set the pause between failed status queries
    pub const fn with_retry_pause(mut self, pause: Duration) -> Self {
        self.retry_pause = pause;
        self
    }
}
