//! Entropy streams and the factories that create them.
//!
//! A [`RandSource`] is one byte stream owned by a single generator. An
//! [`EntropySource`] manufactures a fresh [`RandSource`] every time the pool
//! needs a new generator, which keeps entropy domains isolated per factory.

use crate::{Error, Result};
use rand::{RngCore, SeedableRng, TryRngCore, rngs::StdRng};
use std::io::Read;

/// A stream of random bytes.
///
/// This abstraction allows you to plug in a real random source or a mocked
/// one in tests.
///
/// # Example
/// ```
/// use safeulid::RandSource;
///
/// struct FixedRand;
/// impl RandSource for FixedRand {
///     fn try_fill(&mut self, dest: &mut [u8]) -> safeulid::Result<()> {
///         dest.fill(0x2A);
///         Ok(())
///     }
/// }
///
/// let mut buf = [0_u8; 4];
/// FixedRand.try_fill(&mut buf).unwrap();
/// assert_eq!(buf, [0x2A; 4]);
/// ```
pub trait RandSource: Send {
    /// Fills `dest` entirely with random bytes.
    ///
    /// # Errors
    /// Returns [`Error::EntropyRead`] if the stream cannot supply the bytes.
    fn try_fill(&mut self, dest: &mut [u8]) -> Result<()>;
}

impl<R: RandSource + ?Sized> RandSource for Box<R> {
    fn try_fill(&mut self, dest: &mut [u8]) -> Result<()> {
        (**self).try_fill(dest)
    }
}

/// A factory of [`RandSource`] streams.
///
/// Any `Fn() -> R` closure that is `Send + Sync` is an entropy source.
pub trait EntropySource: Send + Sync {
    type Rand: RandSource;

    /// Returns a fresh, independent stream.
    fn new_rand(&self) -> Self::Rand;
}

impl<F, R> EntropySource for F
where
    F: Fn() -> R + Send + Sync,
    R: RandSource,
{
    type Rand = R;

    fn new_rand(&self) -> R {
        self()
    }
}

/// A `RandSource` that uses the thread-local RNG (`rand::rng()`).
///
/// This RNG is fast, cryptographically secure (ChaCha-based), and automatically
/// reseeded periodically.
///
/// The type does not store the RNG itself; it accesses the calling thread's
/// generator on each call, so it is `Send` and can be pooled.
#[derive(Default, Clone, Copy, Debug)]
pub struct ThreadRandom;

impl RandSource for ThreadRandom {
    fn try_fill(&mut self, dest: &mut [u8]) -> Result<()> {
        rand::rng().fill_bytes(dest);
        Ok(())
    }
}

/// A `RandSource` owning its own [`StdRng`] state.
///
/// Each instance is seeded from the thread-local RNG when constructed, so
/// every generator in a pool draws from an independent stream.
#[derive(Clone, Debug)]
pub struct StdRandom(StdRng);

impl StdRandom {
    #[must_use]
    pub fn new() -> Self {
        Self(StdRng::from_rng(&mut rand::rng()))
    }

    /// Deterministic stream, for reproducible tests.
    #[must_use]
    pub fn seed_from_u64(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }
}

impl Default for StdRandom {
    fn default() -> Self {
        Self::new()
    }
}

impl RandSource for StdRandom {
    fn try_fill(&mut self, dest: &mut [u8]) -> Result<()> {
        self.0.fill_bytes(dest);
        Ok(())
    }
}

/// Adapts any fallible [`rand`] generator into a [`RandSource`].
#[derive(Clone, Debug)]
pub struct RngSource<R>(pub R);

impl<R> RandSource for RngSource<R>
where
    R: TryRngCore + Send,
{
    fn try_fill(&mut self, dest: &mut [u8]) -> Result<()> {
        self.0
            .try_fill_bytes(dest)
            .map_err(|err| Error::EntropyRead(err.to_string().into()))
    }
}

/// Adapts a byte reader (e.g. `/dev/urandom`) into a [`RandSource`].
///
/// Short reads and I/O failures surface as [`Error::EntropyRead`].
#[derive(Debug)]
pub struct ReaderSource<R>(pub R);

impl<R> RandSource for ReaderSource<R>
where
    R: Read + Send,
{
    fn try_fill(&mut self, dest: &mut [u8]) -> Result<()> {
        Ok(self.0.read_exact(dest)?)
    }
}

/// The default entropy source: one [`StdRandom`] per generator.
#[derive(Default, Clone, Copy, Debug)]
pub struct DefaultEntropy;

impl EntropySource for DefaultEntropy {
    type Rand = StdRandom;

    fn new_rand(&self) -> StdRandom {
        StdRandom::new()
    }
}

/// An entropy source yielding [`ThreadRandom`] handles.
#[derive(Default, Clone, Copy, Debug)]
pub struct ThreadEntropy;

impl EntropySource for ThreadEntropy {
    type Rand = ThreadRandom;

    fn new_rand(&self) -> ThreadRandom {
        ThreadRandom
    }
}

/// A boxed stream.
pub type BoxRandSource = Box<dyn RandSource>;

/// A type-erased [`EntropySource`].
///
/// Used where the concrete source cannot appear in a type, such as the
/// process-wide default factory.
pub struct BoxEntropy(Box<dyn Fn() -> BoxRandSource + Send + Sync>);

impl BoxEntropy {
    pub fn new<E>(source: E) -> Self
    where
        E: EntropySource + 'static,
        E::Rand: 'static,
    {
        Self(Box::new(move || Box::new(source.new_rand()) as BoxRandSource))
    }
}

impl EntropySource for BoxEntropy {
    type Rand = BoxRandSource;

    fn new_rand(&self) -> BoxRandSource {
        (self.0)()
    }
}

impl core::fmt::Debug for BoxEntropy {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("BoxEntropy(..)")
    }
}
