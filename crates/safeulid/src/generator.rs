use crate::{Error, RandSource, Result, Ulid};
use core::cmp::Ordering;
#[cfg(feature = "tracing")]
use tracing::instrument;

/// A *monotonic* ULID generator bound to a single entropy stream.
///
/// This generator is not thread-safe and performs no locking. Exclusive access
/// is enforced by its owner, normally the [`GeneratorPool`] handing it out.
///
/// ## Features
/// - ❌ Not thread-safe on its own
/// - ✅ Probabilistically unique (no coordination required)
/// - ✅ Time-ordered (monotonically increasing per millisecond)
///
/// [`GeneratorPool`]: crate::GeneratorPool
#[derive(Debug)]
pub struct MonotonicGenerator<R> {
    rng: R,
    last: Option<Ulid>,
}

impl<R: RandSource> MonotonicGenerator<R> {
    /// Creates a generator with no history; the first call always draws fresh
    /// entropy.
    pub const fn new(rng: R) -> Self {
        Self { rng, last: None }
    }

    /// Creates a generator that continues the sequence ending at `last`.
    ///
    /// Useful for restoring state or controlling the starting point manually.
    pub const fn from_last(rng: R, last: Ulid) -> Self {
        Self {
            rng,
            last: Some(last),
        }
    }

    /// The last ULID this generator produced, if any.
    pub const fn last(&self) -> Option<Ulid> {
        self.last
    }

    /// Generates a ULID for `timestamp` (milliseconds since the Unix epoch).
    ///
    /// - A timestamp newer than the last one draws 80 fresh random bits.
    /// - A repeated timestamp increments the previous random component by one,
    ///   so a same-millisecond burst is strictly increasing.
    /// - An older timestamp (the clock moved backwards) starts a new sequence
    ///   with fresh random bits.
    ///
    /// On error the generator state is left unchanged.
    ///
    /// # Errors
    /// - [`Error::TimestampOutOfRange`] if `timestamp` exceeds
    ///   [`Ulid::max_timestamp`]
    /// - [`Error::EntropyExhausted`] if the random component is already at its
    ///   maximum for this millisecond
    /// - [`Error::EntropyRead`] if the entropy stream fails
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn generate(&mut self, timestamp: u64) -> Result<Ulid> {
        if timestamp > Ulid::max_timestamp() {
            return Err(Error::TimestampOutOfRange { millis: timestamp });
        }

        let next = match self.last {
            Some(last) => match timestamp.cmp(&last.timestamp()) {
                Ordering::Equal => {
                    if !last.has_random_room() {
                        return Err(Self::cold_exhausted(timestamp));
                    }
                    last.increment_random()
                }
                Ordering::Greater | Ordering::Less => self.draw(timestamp)?,
            },
            None => self.draw(timestamp)?,
        };

        self.last = Some(next);
        Ok(next)
    }

    fn draw(&mut self, timestamp: u64) -> Result<Ulid> {
        let mut bytes = [0_u8; 16];
        self.rng.try_fill(&mut bytes[16 - Ulid::RANDOM_BYTES..])?;
        Ok(Ulid::from_parts(timestamp, u128::from_be_bytes(bytes)))
    }

    #[cold]
    #[inline(never)]
    fn cold_exhausted(timestamp: u64) -> Error {
        #[cfg(feature = "tracing")]
        tracing::warn!(timestamp, "monotonic entropy exhausted");
        Error::EntropyExhausted { timestamp }
    }
}
