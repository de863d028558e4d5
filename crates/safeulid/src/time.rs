use crate::{Error, Result, Ulid};
use chrono::{DateTime, Utc};
use std::sync::Arc;

const NANOS_PER_MILLI: i64 = 1_000_000;

/// The earliest instant a ULID timestamp can hold: the Unix epoch, since the
/// 48-bit field is unsigned.
pub const MIN_INSTANT: DateTime<Utc> = DateTime::<Utc>::UNIX_EPOCH;

/// A trait for clocks that report the current instant.
///
/// This abstraction allows you to plug in the system clock or a mocked clock
/// in tests.
///
/// # Example
///
/// ```
/// use chrono::{DateTime, Utc};
/// use safeulid::Clock;
///
/// struct Frozen;
/// impl Clock for Frozen {
///     fn now(&self) -> DateTime<Utc> {
///         DateTime::<Utc>::UNIX_EPOCH
///     }
/// }
///
/// assert_eq!(Frozen.now().timestamp_millis(), 0);
/// ```
pub trait Clock: Send + Sync {
    /// Returns the current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// The system wall clock.
#[derive(Default, Clone, Copy, Debug)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at a single instant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FixedClock(pub DateTime<Utc>);

impl FixedClock {
    #[must_use]
    pub const fn new(instant: DateTime<Utc>) -> Self {
        Self(instant)
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

/// The latest instant a ULID timestamp can be derived from.
///
/// Instants are converted through their signed 64-bit nanosecond offset from
/// the Unix epoch, so the upper bound is the smaller of `i64::MAX`
/// nanoseconds and [`Ulid::max_timestamp`] milliseconds.
#[must_use]
pub fn max_instant() -> DateTime<Utc> {
    let field_max = i64::try_from(Ulid::max_timestamp())
        .ok()
        .and_then(|ms| ms.checked_mul(NANOS_PER_MILLI))
        .unwrap_or(i64::MAX);
    DateTime::from_timestamp_nanos(field_max)
}

/// Converts an instant into whole milliseconds since the Unix epoch, checked
/// against the ULID timestamp field.
///
/// # Errors
/// Returns [`Error::InstantOutOfRange`] if the instant is before
/// [`MIN_INSTANT`] or after [`max_instant`].
pub fn unix_millis(instant: DateTime<Utc>) -> Result<u64> {
    let out_of_range = || Error::InstantOutOfRange { instant };

    let nanos = instant.timestamp_nanos_opt().ok_or_else(out_of_range)?;
    let millis = u64::try_from(nanos.div_euclid(NANOS_PER_MILLI)).map_err(|_| out_of_range())?;
    if millis > Ulid::max_timestamp() {
        return Err(out_of_range());
    }
    Ok(millis)
}
