//! The process-wide default factory.
//!
//! The default is built lazily on first use from [`DefaultEntropy`] and the
//! system clock. A program that needs a different entropy source installs its
//! own factory with [`init_default`] before anything generates an ID.
//!
//! # Example
//! ```rust
//! let id = safeulid::generate().unwrap();
//! assert_eq!(id.to_string().len(), 26);
//! ```

use crate::{BoxEntropy, DefaultEntropy, Error, Factory, Result, SystemClock, Ulid};
use std::sync::OnceLock;

/// The concrete type of the process-wide default factory.
pub type GlobalFactory = Factory<SystemClock, BoxEntropy>;

static DEFAULT: OnceLock<GlobalFactory> = OnceLock::new();

/// Returns the process-wide default factory, building it on first use.
pub fn default_factory() -> &'static GlobalFactory {
    DEFAULT.get_or_init(|| {
        #[cfg(feature = "tracing")]
        tracing::debug!("initialising default ULID factory");
        Factory::new(BoxEntropy::new(DefaultEntropy))
    })
}

/// Installs `factory` as the process-wide default.
///
/// # Errors
/// Returns [`Error::AlreadyInitialized`] if the default factory was already
/// installed or used. The default is never replaced once built.
pub fn init_default(factory: GlobalFactory) -> Result<()> {
    DEFAULT
        .set(factory)
        .map_err(|_| Error::AlreadyInitialized)?;
    #[cfg(feature = "tracing")]
    tracing::debug!("installed custom default ULID factory");
    Ok(())
}

/// Generates a ULID from the default factory.
///
/// # Errors
/// See [`Factory::generate`].
pub fn generate() -> Result<Ulid> {
    default_factory().generate()
}

/// Generates a ULID from the default factory, panicking on error.
///
/// # Panics
/// Panics if generation fails.
#[track_caller]
pub fn must_generate() -> Ulid {
    default_factory().must_generate()
}
