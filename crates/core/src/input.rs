//! Timeout argument validation

use std::time::Duration;

use tracing::debug;

use crate::error::{Error, Result};

/// Timeout used when the caller asks for something outside the accepted range
pub const DEFAULT_TIMEOUT_SECS: u8 = 5;

/// Shortest accepted timeout
pub const MIN_TIMEOUT_SECS: u8 = 1;

/// Longest accepted timeout
pub const MAX_TIMEOUT_SECS: u8 = 10;

/// Validated wait time for a tag, in whole seconds within `1..=10`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeoutSpec {
    seconds: u8,
}

impl TimeoutSpec {
    /// Build from the caller's argument list; only the first value is read
    ///
    /// # Errors
    /// [`Error::NoInput`] for an empty list and [`Error::NonIntegerInput`] when
    /// the value has a fractional part or is NaN.
    pub fn from_args(args: &[f64]) -> Result<Self> {
        let Some(&value) = args.first() else {
            return Err(Error::NoInput);
        };
        Self::from_value(value)
    }

    /// Build from a single numeric value
    ///
    /// Integers outside `1..=10` fall back to 5 seconds.
    ///
    /// # Errors
    /// [`Error::NonIntegerInput`] when the value has a fractional part or is NaN.
    pub fn from_value(value: f64) -> Result<Self> {
        if value != value.trunc() {
            return Err(Error::NonIntegerInput);
        }

        if value < f64::from(MIN_TIMEOUT_SECS) || value > f64::from(MAX_TIMEOUT_SECS) {
            debug!(value, "Timeout out of range, using default");
            return Ok(Self::default());
        }

        Ok(Self {
            seconds: value as u8,
        })
    }

    /// Build from whole seconds, normalizing out-of-range values to the default
    pub const fn from_seconds(seconds: u8) -> Self {
        if seconds < MIN_TIMEOUT_SECS || seconds > MAX_TIMEOUT_SECS {
            Self {
                seconds: DEFAULT_TIMEOUT_SECS,
            }
        } else {
            Self { seconds }
        }
    }

    /// Timeout in seconds
    pub const fn seconds(&self) -> u8 {
        self.seconds
    }

    /// Timeout in milliseconds
    pub const fn as_millis(&self) -> u64 {
        self.seconds as u64 * 1000
    }

    /// Timeout as a duration
    pub const fn as_duration(&self) -> Duration {
        Duration::from_millis(self.as_millis())
    }
}

impl Default for TimeoutSpec {
    fn default() -> Self {
        Self {
            seconds: DEFAULT_TIMEOUT_SECS,
        }
    }
}
