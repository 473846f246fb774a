//! Per-call options
//!
//! Expiration policy, refresh flag and decoding strategy for a single `call`.

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::cache::{Decoder, JsonPrimitive};
use crate::error::{CacheError, Result};

// == Expiry ==
/// The two ways a caller can express expiration. Resolved once, at the call
/// boundary, into an absolute timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiry {
    /// Relative to the moment of the write
    After(Duration),
    /// Absolute instant
    At(DateTime<Utc>),
}

impl Expiry {
    /// Absolute expiry in Unix milliseconds for a write happening at `now_ms`.
    pub fn resolve(&self, now_ms: i64) -> i64 {
        match self {
            Expiry::After(duration) => {
                let millis = i64::try_from(duration.as_millis()).unwrap_or(i64::MAX);
                now_ms.saturating_add(millis)
            }
            Expiry::At(instant) => instant.timestamp_millis(),
        }
    }
}

/// Options for one `call`.
///
/// `decoder` must be set; composite types need an explicit reconstructor
/// (`Decoder::serde()` or `Decoder::reconstruct`), JSON primitives can use
/// [`CallOptions::primitive`].
#[derive(Debug, Clone)]
pub struct CallOptions<T> {
    /// Relative expiration, mutually exclusive with `cache_expiring`
    pub cache_duration: Option<Duration>,
    /// Absolute expiration, mutually exclusive with `cache_duration`
    pub cache_expiring: Option<DateTime<Utc>>,
    /// Skip the read, always invoke the producer (the result is still stored)
    pub force_refresh: bool,
    /// How a stored payload is turned back into `T`
    pub decoder: Option<Decoder<T>>,
}

impl<T> Default for CallOptions<T> {
    fn default() -> Self {
        Self {
            cache_duration: None,
            cache_expiring: None,
            force_refresh: false,
            decoder: None,
        }
    }
}

impl<T> CallOptions<T> {
    pub fn with_decoder(decoder: Decoder<T>) -> Self {
        Self {
            decoder: Some(decoder),
            ..Self::default()
        }
    }

    pub fn cache_duration(mut self, duration: Duration) -> Self {
        self.cache_duration = Some(duration);
        self
    }

    pub fn cache_expiring(mut self, instant: DateTime<Utc>) -> Self {
        self.cache_expiring = Some(instant);
        self
    }

    pub fn force_refresh(mut self, force: bool) -> Self {
        self.force_refresh = force;
        self
    }

    // == Validate ==
    /// Checks the caller contract and resolves the expiry form.
    ///
    /// The returned expiry is `None` when the engine's default duration applies.
    pub fn validate(&self, key: &str) -> Result<(&Decoder<T>, Option<Expiry>)> {
        if key.is_empty() {
            return Err(CacheError::InvalidArguments(
                "Cache key must not be empty".to_string(),
            ));
        }

        let decoder = self.decoder.as_ref().ok_or_else(|| {
            CacheError::InvalidArguments(
                "A reconstructor is required for non-primitive cached types".to_string(),
            )
        })?;

        let expiry = match (self.cache_duration, self.cache_expiring) {
            (Some(_), Some(_)) => Err(CacheError::InvalidArguments(
                "cache_duration and cache_expiring are mutually exclusive".to_string(),
            )),
            (Some(duration), None) => Ok(Some(Expiry::After(duration))),
            (None, Some(instant)) => Ok(Some(Expiry::At(instant))),
            (None, None) => Ok(None),
        }?;

        Ok((decoder, expiry))
    }
}

impl<T: JsonPrimitive> CallOptions<T> {
    /// Options returning the decoded JSON value as-is.
    pub fn primitive() -> Self {
        Self::with_decoder(Decoder::primitive())
    }
}

impl<T: serde::de::DeserializeOwned + 'static> CallOptions<T> {
    /// Options reconstructing `T` from its `Deserialize` impl.
    pub fn serde() -> Self {
        Self::with_decoder(Decoder::serde())
    }
}
