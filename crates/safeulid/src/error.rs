use crate::base32::Base32Error;
use chrono::{DateTime, Utc};

/// A result type defaulting to [`enum@Error`].
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// All errors that `safeulid` can produce.
///
/// Generation only ever fails with [`Error::TimestampOutOfRange`],
/// [`Error::InstantOutOfRange`], [`Error::EntropyExhausted`] or
/// [`Error::EntropyRead`]. None of them are transient in a way a blind retry
/// would fix, so they are handed back to the caller untouched.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The millisecond timestamp does not fit the 48-bit timestamp field.
    #[error("timestamp {millis}ms does not fit in the 48-bit ULID timestamp field")]
    TimestampOutOfRange {
        /// The rejected timestamp in milliseconds since the Unix epoch.
        millis: u64,
    },

    /// The instant returned by a [`crate::Clock`] falls outside the window
    /// representable by a ULID timestamp.
    #[error("instant {instant} is outside the representable ULID range")]
    InstantOutOfRange {
        /// The rejected instant.
        instant: DateTime<Utc>,
    },

    /// Incrementing the random component would overflow its 80 bits within a
    /// single millisecond.
    ///
    /// The caller decides whether to wait for the clock to advance.
    #[error("monotonic entropy exhausted for timestamp {timestamp}ms")]
    EntropyExhausted {
        /// The millisecond in which the random component ran out.
        timestamp: u64,
    },

    /// The underlying entropy stream failed to supply bytes.
    #[error("entropy source failed: {0}")]
    EntropyRead(#[source] Box<dyn core::error::Error + Send + Sync>),

    /// A [`crate::FactoryBuilder`] was built without an entropy source.
    #[error("no entropy source was configured for the factory")]
    MissingEntropySource,

    /// A [`crate::PoolConfig`] value was rejected.
    #[error("invalid pool configuration: {reason}")]
    InvalidConfig {
        /// Why the configuration was rejected.
        reason: &'static str,
    },

    /// The process-wide default factory was already initialised.
    #[error("the default factory has already been initialised")]
    AlreadyInitialized,

    /// A Crockford base32 string could not be decoded.
    #[error(transparent)]
    Base32(#[from] Base32Error),
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::EntropyRead(Box::new(err))
    }
}
