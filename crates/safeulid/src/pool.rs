//! A sharded free-list of [`MonotonicGenerator`]s.
//!
//! Callers check a generator out, produce exactly one ULID with it, and hand
//! it back. Generation never waits on the pool: contended shards are skipped,
//! and when no idle generator is found a new one is built from the pool's
//! [`EntropySource`].
//!
//! Each thread is pinned to a home shard (assigned round-robin), so a thread
//! normally receives the generator it used last and keeps producing a single
//! strictly increasing sequence.

use crate::{EntropySource, Error, MonotonicGenerator, Result};
use core::{
    cell::Cell,
    mem::ManuallyDrop,
    ops::{Deref, DerefMut},
    sync::atomic::{AtomicUsize, Ordering},
};
use crossbeam_utils::CachePadded;
use parking_lot::Mutex;

/// Round-robin counter handing out home shards to new threads.
static NEXT_HOME: AtomicUsize = AtomicUsize::new(0);

thread_local! {
    static HOME: Cell<Option<usize>> = const { Cell::new(None) };
}

fn home_index() -> usize {
    HOME.try_with(|home| {
        home.get().unwrap_or_else(|| {
            let index = NEXT_HOME.fetch_add(1, Ordering::Relaxed);
            home.set(Some(index));
            index
        })
    })
    // Thread-local storage is gone during thread teardown.
    .unwrap_or(0)
}

/// Sizing for a [`GeneratorPool`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PoolConfig {
    /// Number of independent free-lists. Must be at least one.
    pub shards: usize,
    /// Idle generators kept per shard; extras are discarded on release.
    pub idle_per_shard: usize,
}

impl PoolConfig {
    /// Upper bound on [`PoolConfig::shards`].
    pub const MAX_SHARDS: usize = 1 << 16;
    /// Upper bound on [`PoolConfig::idle_per_shard`].
    pub const MAX_IDLE_PER_SHARD: usize = 1 << 16;

    /// # Errors
    /// Returns [`Error::InvalidConfig`] if `shards` is zero or exceeds
    /// [`Self::MAX_SHARDS`], or if `idle_per_shard` exceeds
    /// [`Self::MAX_IDLE_PER_SHARD`].
    pub fn validate(&self) -> Result<()> {
        if self.shards == 0 {
            return Err(Error::InvalidConfig {
                reason: "shards must be greater than 0",
            });
        }
        if self.shards > Self::MAX_SHARDS {
            return Err(Error::InvalidConfig {
                reason: "shards exceeds PoolConfig::MAX_SHARDS",
            });
        }
        if self.idle_per_shard > Self::MAX_IDLE_PER_SHARD {
            return Err(Error::InvalidConfig {
                reason: "idle_per_shard exceeds PoolConfig::MAX_IDLE_PER_SHARD",
            });
        }
        Ok(())
    }
}

impl Default for PoolConfig {
    /// Four shards per logical CPU, eight idle generators each.
    fn default() -> Self {
        Self {
            shards: (num_cpus::get().max(1) * 4).min(Self::MAX_SHARDS),
            idle_per_shard: 8,
        }
    }
}

type Shard<R> = CachePadded<Mutex<Vec<MonotonicGenerator<R>>>>;

/// A concurrency-safe cache of [`MonotonicGenerator`]s.
///
/// The pool guarantees that a generator is never held by two callers at once;
/// that is what makes the unsynchronized [`MonotonicGenerator`] safe to use from any
/// number of threads. The pool grows on demand and shrinks by discarding
/// generators it has no room (or no uncontended shard) for.
pub struct GeneratorPool<E: EntropySource> {
    entropy: E,
    shards: Box<[Shard<E::Rand>]>,
    idle_per_shard: usize,
}

impl<E: EntropySource> GeneratorPool<E> {
    /// Creates a pool with [`PoolConfig::default`].
    pub fn with_defaults(entropy: E) -> Self {
        Self::from_valid_config(entropy, PoolConfig::default())
    }

    /// Creates a pool with an explicit configuration.
    ///
    /// # Errors
    /// Returns [`Error::InvalidConfig`] if the configuration is rejected by
    /// [`PoolConfig::validate`].
    pub fn new(entropy: E, config: PoolConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_valid_config(entropy, config))
    }

    fn from_valid_config(entropy: E, config: PoolConfig) -> Self {
        // Free-lists start empty and grow on release.
        let shards = (0..config.shards.max(1))
            .map(|_| CachePadded::new(Mutex::new(Vec::new())))
            .collect();
        Self {
            entropy,
            shards,
            idle_per_shard: config.idle_per_shard,
        }
    }

    /// Checks out a generator. Never blocks.
    ///
    /// Shards are probed with `try_lock`, starting at the calling thread's
    /// home shard. If no idle generator is reachable without waiting, a fresh
    /// one is built from the entropy source.
    pub fn acquire(&self) -> PooledGenerator<'_, E> {
        let len = self.shards.len();
        let start = home_index() % len;

        for offset in 0..len {
            let shard = &self.shards[(start + offset) % len];
            if let Some(generator) = shard.try_lock().and_then(|mut idle| idle.pop()) {
                return PooledGenerator::new(self, generator);
            }
        }

        #[cfg(feature = "tracing")]
        tracing::trace!(shard = start, "no idle generator, building a new one");
        PooledGenerator::new(self, MonotonicGenerator::new(self.entropy.new_rand()))
    }

    /// Returns a generator to the idle set. Never blocks.
    ///
    /// If every shard is contended or full, the generator is dropped; the next
    /// generator built in its place simply starts a new monotonic sequence.
    pub fn release(&self, generator: MonotonicGenerator<E::Rand>) {
        let len = self.shards.len();
        let start = home_index() % len;

        for offset in 0..len {
            let shard = &self.shards[(start + offset) % len];
            let Some(mut idle) = shard.try_lock() else {
                continue;
            };
            if idle.len() < self.idle_per_shard {
                idle.push(generator);
                return;
            }
        }

        #[cfg(feature = "tracing")]
        tracing::trace!(shard = start, "pool full or contended, discarding generator");
    }

    /// Counts idle generators. Never blocks.
    ///
    /// Contended shards are skipped, so the count is a best-effort snapshot
    /// that may be low or stale by the time it is returned.
    pub fn idle(&self) -> usize {
        self.shards
            .iter()
            .filter_map(|shard| shard.try_lock().map(|idle| idle.len()))
            .sum()
    }

    /// Discards every idle generator.
    ///
    /// Unlike the rest of the pool this waits for each shard's lock, so that
    /// no idle generator survives the call.
    pub fn clear(&self) {
        for shard in &*self.shards {
            shard.lock().clear();
        }
    }

    /// Number of shards in the pool.
    pub fn shards(&self) -> usize {
        self.shards.len()
    }

    /// The source new generators are built from.
    pub const fn entropy(&self) -> &E {
        &self.entropy
    }
}

impl<E: EntropySource + core::fmt::Debug> core::fmt::Debug for GeneratorPool<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("GeneratorPool")
            .field("entropy", &self.entropy)
            .field("shards", &self.shards.len())
            .field("idle_per_shard", &self.idle_per_shard)
            .finish_non_exhaustive()
    }
}

/// A generator checked out of a [`GeneratorPool`].
///
/// Dereferences to the [`MonotonicGenerator`]. Dropping the guard returns the
/// generator to the pool, so release happens on every path, errors and panics
/// included.
pub struct PooledGenerator<'pool, E: EntropySource> {
    pool: &'pool GeneratorPool<E>,
    generator: ManuallyDrop<MonotonicGenerator<E::Rand>>,
}

impl<'pool, E: EntropySource> PooledGenerator<'pool, E> {
    const fn new(pool: &'pool GeneratorPool<E>, generator: MonotonicGenerator<E::Rand>) -> Self {
        Self {
            pool,
            generator: ManuallyDrop::new(generator),
        }
    }

    /// Returns the generator to its pool now.
    pub fn release(self) {
        drop(self);
    }
}

impl<E: EntropySource> Deref for PooledGenerator<'_, E> {
    type Target = MonotonicGenerator<E::Rand>;

    fn deref(&self) -> &Self::Target {
        &self.generator
    }
}

impl<E: EntropySource> DerefMut for PooledGenerator<'_, E> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.generator
    }
}

impl<E: EntropySource> Drop for PooledGenerator<'_, E> {
    fn drop(&mut self) {
        // SAFETY: `generator` is taken exactly once, here, and `self` is not
        // used again afterwards.
        let generator = unsafe { ManuallyDrop::take(&mut self.generator) };
        self.pool.release(generator);
    }
}
