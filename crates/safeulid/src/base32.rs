//! Crockford base32 encoding for 128-bit identifiers.
//!
//! The encoding is fixed width (26 characters) and big-endian, so the
//! lexicographic order of the text form matches the numeric order of the
//! value it encodes.

use core::fmt;

/// Number of characters in an encoded 128-bit value (`ceil(128 / 5)`).
pub const ENCODED_LEN: usize = 26;

const ALPHABET: &[u8; 32] = b"0123456789ABCDEFGHJKMNPQRSTVWXYZ";
const NO_VALUE: u8 = 255;
const BITS_PER_CHAR: u32 = 5;
const CHAR_MASK: u128 = 0x1F;

/// Largest value the leading character may hold. 26 characters carry 130
/// bits, so the top two bits of the first character must be zero.
const MAX_LEADING: u8 = 7;

/// Lookup table for Crockford base32 decoding
const LOOKUP: [u8; 256] = {
    let mut lut = [NO_VALUE; 256];
    let mut i = 0_u8;
    // Main alphabet, allow lower-case
    while i < 32 {
        let c = ALPHABET[i as usize];
        lut[c as usize] = i;
        if c.is_ascii_uppercase() {
            lut[(c + 32) as usize] = i;
        }
        i += 1;
    }
    // Crockford-specific aliases
    lut[b'O' as usize] = 0;
    lut[b'o' as usize] = 0;
    lut[b'I' as usize] = 1;
    lut[b'i' as usize] = 1;
    lut[b'L' as usize] = 1;
    lut[b'l' as usize] = 1;
    lut
};

/// Errors produced while decoding a Crockford base32 string.
#[derive(Clone, Debug, PartialEq, Eq, Hash, thiserror::Error)]
pub enum Base32Error {
    /// The input was not exactly [`ENCODED_LEN`] bytes long.
    #[error("invalid length: expected {ENCODED_LEN} characters, got {len}")]
    InvalidLength {
        /// Length of the rejected input.
        len: usize,
    },
    /// The input contained a byte outside the Crockford alphabet.
    #[error("invalid character {byte:#04x} at index {index}")]
    InvalidChar {
        /// The offending byte.
        byte: u8,
        /// Its position in the input.
        index: usize,
    },
    /// The encoded value does not fit in 128 bits.
    #[error("encoded value overflows 128 bits")]
    Overflow,
}

/// Encodes `value` as 26 Crockford base32 characters.
#[must_use]
pub const fn encode(mut value: u128) -> Base32Buf {
    let mut buf = [0_u8; ENCODED_LEN];
    let mut i = ENCODED_LEN;
    while i > 0 {
        i -= 1;
        buf[i] = ALPHABET[(value & CHAR_MASK) as usize];
        value >>= BITS_PER_CHAR;
    }
    Base32Buf { buf }
}

/// Decodes 26 Crockford base32 characters into a 128-bit value.
///
/// Decoding is case-insensitive and accepts the Crockford aliases `O` (for
/// `0`) and `I`/`L` (for `1`).
///
/// # Errors
/// - [`Base32Error::InvalidLength`] if `encoded` is not 26 bytes
/// - [`Base32Error::InvalidChar`] for bytes outside the alphabet
/// - [`Base32Error::Overflow`] if the leading character exceeds `7`
pub fn decode(encoded: &str) -> Result<u128, Base32Error> {
    let bytes = encoded.as_bytes();
    if bytes.len() != ENCODED_LEN {
        return Err(Base32Error::InvalidLength { len: bytes.len() });
    }

    let mut acc = 0_u128;
    for (index, &byte) in bytes.iter().enumerate() {
        let val = LOOKUP[byte as usize];
        if val == NO_VALUE {
            return Err(Base32Error::InvalidChar { byte, index });
        }
        if index == 0 && val > MAX_LEADING {
            return Err(Base32Error::Overflow);
        }
        acc = (acc << BITS_PER_CHAR) | u128::from(val);
    }
    Ok(acc)
}

/// A stack-allocated, encoded identifier.
///
/// Implements [`fmt::Display`] and [`AsRef<str>`] without allocating.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Base32Buf {
    buf: [u8; ENCODED_LEN],
}

impl Base32Buf {
    /// Returns a `&str` view of the encoding.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        // SAFETY: `self.buf` only ever holds bytes taken from `ALPHABET`, all
        // of which are ASCII.
        unsafe { core::str::from_utf8_unchecked(&self.buf) }
    }

    /// Returns the raw ASCII bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; ENCODED_LEN] {
        &self.buf
    }
}

impl AsRef<str> for Base32Buf {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for Base32Buf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for Base32Buf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.as_str(), f)
    }
}

impl PartialEq<str> for Base32Buf {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for Base32Buf {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}
