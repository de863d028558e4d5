use crate::base32::{self, Base32Buf, Base32Error};
use chrono::{DateTime, Utc};
use core::{cmp::Ordering, fmt, str::FromStr};

/// A 128-bit ULID
///
/// - 48 bits timestamp (milliseconds since the Unix epoch)
/// - 80 bits random
///
/// ```text
///  Bit Index:  127            80 79           0
///              +----------------+-------------+
///  Field:      | timestamp (48) | random (80) |
///              +----------------+-------------+
///              |<-- MSB -- 128 bits -- LSB -->|
/// ```
///
/// Ordering is by the raw integer, which is the same as ordering by the
/// big-endian bytes and by the 26-character text form.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(transparent)]
pub struct Ulid {
    id: u128,
}

const _: () = {
    assert!(
        Ulid::TIMESTAMP_BITS + Ulid::RANDOM_BITS == u128::BITS,
        "Layout must match underlying type width"
    );
};

impl Ulid {
    pub const TIMESTAMP_BITS: u32 = 48;
    pub const RANDOM_BITS: u32 = 80;

    pub const RANDOM_SHIFT: u32 = 0;
    pub const TIMESTAMP_SHIFT: u32 = Self::RANDOM_SHIFT + Self::RANDOM_BITS;

    pub const TIMESTAMP_MASK: u128 = (1 << Self::TIMESTAMP_BITS) - 1;
    pub const RANDOM_MASK: u128 = (1 << Self::RANDOM_BITS) - 1;

    /// Number of bytes in the random component.
    pub const RANDOM_BYTES: usize = (Self::RANDOM_BITS / 8) as usize;

    /// The all-zero ULID.
    pub const NIL: Self = Self { id: 0 };

    /// Packs a timestamp and a random component. Bits outside each field's
    /// width are discarded.
    #[must_use]
    pub const fn from_parts(timestamp: u64, random: u128) -> Self {
        let t = (timestamp as u128 & Self::TIMESTAMP_MASK) << Self::TIMESTAMP_SHIFT;
        let r = (random & Self::RANDOM_MASK) << Self::RANDOM_SHIFT;
        Self { id: t | r }
    }

    /// Extracts the timestamp in milliseconds since the Unix epoch.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn timestamp(&self) -> u64 {
        ((self.id >> Self::TIMESTAMP_SHIFT) & Self::TIMESTAMP_MASK) as u64
    }

    /// Extracts the 80-bit random component.
    #[must_use]
    pub const fn random(&self) -> u128 {
        (self.id >> Self::RANDOM_SHIFT) & Self::RANDOM_MASK
    }

    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn max_timestamp() -> u64 {
        Self::TIMESTAMP_MASK as u64
    }

    #[must_use]
    pub const fn max_random() -> u128 {
        Self::RANDOM_MASK
    }

    /// Returns true if the random component can be incremented without
    /// overflowing.
    #[must_use]
    pub const fn has_random_room(&self) -> bool {
        self.random() < Self::max_random()
    }

    /// Returns the same timestamp with the random component incremented by
    /// one. Callers must check [`Self::has_random_room`] first.
    #[must_use]
    pub const fn increment_random(&self) -> Self {
        debug_assert!(self.has_random_room(), "random overflow");
        Self::from_parts(self.timestamp(), self.random() + 1)
    }

    /// Converts this type into its raw type representation
    #[must_use]
    pub const fn to_raw(&self) -> u128 {
        self.id
    }

    /// Converts a raw type into this type
    #[must_use]
    pub const fn from_raw(raw: u128) -> Self {
        Self { id: raw }
    }

    /// Returns the big-endian byte representation.
    #[must_use]
    pub const fn to_bytes(&self) -> [u8; 16] {
        self.id.to_be_bytes()
    }

    /// Builds a ULID from its big-endian byte representation.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self {
            id: u128::from_be_bytes(bytes),
        }
    }

    /// Returns the embedded timestamp as a UTC instant.
    ///
    /// The precision is limited to whole milliseconds.
    #[must_use]
    pub fn datetime(&self) -> Option<DateTime<Utc>> {
        i64::try_from(self.timestamp())
            .ok()
            .and_then(DateTime::from_timestamp_millis)
    }

    /// Encodes this ULID as 26 Crockford base32 characters without
    /// allocating.
    #[must_use]
    pub const fn encode(&self) -> Base32Buf {
        base32::encode(self.id)
    }

    /// Decodes a 26-character Crockford base32 string.
    ///
    /// # Errors
    /// See [`base32::decode`].
    pub fn decode(s: impl AsRef<str>) -> Result<Self, Base32Error> {
        base32::decode(s.as_ref()).map(Self::from_raw)
    }

    /// Compares two ULIDs by their byte order.
    #[must_use]
    pub fn compare(&self, other: &Self) -> Ordering {
        self.cmp(other)
    }
}

impl fmt::Display for Ulid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.encode().fmt(f)
    }
}

impl fmt::Debug for Ulid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ulid")
            .field("id", &format_args!("{} (0x{:x})", self.encode(), self.id))
            .field("timestamp", &self.timestamp())
            .field("random", &format_args!("0x{:x}", self.random()))
            .finish()
    }
}

impl FromStr for Ulid {
    type Err = Base32Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}

impl TryFrom<&str> for Ulid {
    type Error = Base32Error;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::decode(s)
    }
}

impl From<Ulid> for u128 {
    fn from(id: Ulid) -> Self {
        id.to_raw()
    }
}

impl From<u128> for Ulid {
    fn from(raw: u128) -> Self {
        Self::from_raw(raw)
    }
}

impl From<Ulid> for [u8; 16] {
    fn from(id: Ulid) -> Self {
        id.to_bytes()
    }
}

impl PartialEq<str> for Ulid {
    fn eq(&self, other: &str) -> bool {
        Self::decode(other).is_ok_and(|id| id == *self)
    }
}

impl PartialEq<&str> for Ulid {
    fn eq(&self, other: &&str) -> bool {
        self == *other
    }
}
