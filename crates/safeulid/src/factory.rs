use crate::{
    Clock, DefaultEntropy, EntropySource, Error, GeneratorPool, PoolConfig, Result, SystemClock,
    Ulid, unix_millis,
};
use chrono::{DateTime, Utc};
#[cfg(feature = "tracing")]
use tracing::instrument;

/// A thread-safe ULID factory.
///
/// A `Factory` couples a [`Clock`] with a [`GeneratorPool`]. Every call checks
/// one [`MonotonicGenerator`] out of the pool, stamps it with the current
/// millisecond and hands the generator back, so any number of threads can
/// share a single factory without ever contending on one lock.
///
/// IDs produced back-to-back on one thread form a strictly increasing
/// sequence; IDs from different threads are unique but only ordered by their
/// timestamp.
///
/// ## Example
/// ```
/// use safeulid::Factory;
///
/// let factory = Factory::new_default();
/// let a = factory.generate().unwrap();
/// let b = factory.generate().unwrap();
/// assert!(a < b);
/// ```
///
/// [`MonotonicGenerator`]: crate::MonotonicGenerator
#[derive(Debug)]
pub struct Factory<C = SystemClock, E = DefaultEntropy>
where
    E: EntropySource,
{
    clock: C,
    pool: GeneratorPool<E>,
}

impl Factory<SystemClock, DefaultEntropy> {
    /// Creates a factory using the system clock and one independently seeded
    /// [`StdRandom`](crate::StdRandom) stream per generator.
    #[must_use]
    pub fn new_default() -> Self {
        Self::new(DefaultEntropy)
    }
}

impl Default for Factory<SystemClock, DefaultEntropy> {
    fn default() -> Self {
        Self::new_default()
    }
}

impl<E: EntropySource> Factory<SystemClock, E> {
    /// Creates a factory using the system clock and the default
    /// [`PoolConfig`].
    pub fn new(entropy: E) -> Self {
        Self {
            clock: SystemClock,
            pool: GeneratorPool::with_defaults(entropy),
        }
    }

    /// Starts building a factory with a custom clock or pool configuration.
    #[must_use]
    pub fn builder() -> FactoryBuilder<SystemClock, E> {
        FactoryBuilder::new()
    }
}

impl<C, E> Factory<C, E>
where
    C: Clock,
    E: EntropySource,
{
    /// Generates a ULID for the clock's current instant.
    ///
    /// # Errors
    /// - [`Error::InstantOutOfRange`] if the clock reports an instant that
    ///   cannot be stored in a ULID timestamp
    /// - [`Error::EntropyExhausted`] if the generator ran out of increments
    ///   for this millisecond
    /// - [`Error::EntropyRead`] if the entropy stream fails
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn generate(&self) -> Result<Ulid> {
        let mut generator = self.pool.acquire();
        let millis = unix_millis(self.clock.now())?;
        generator.generate(millis)
    }

    /// Like [`Self::generate`], but panics on error.
    ///
    /// # Panics
    /// Panics if generation fails.
    #[track_caller]
    pub fn must_generate(&self) -> Ulid {
        match self.generate() {
            Ok(id) => id,
            Err(err) => panic!("failed to generate ULID: {err}"),
        }
    }

    /// Generates a ULID for a caller-supplied instant, bypassing the clock.
    ///
    /// # Errors
    /// See [`Self::generate`].
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn generate_at(&self, instant: DateTime<Utc>) -> Result<Ulid> {
        let mut generator = self.pool.acquire();
        generator.generate(unix_millis(instant)?)
    }

    /// Like [`Self::generate_at`], but panics on error.
    ///
    /// # Panics
    /// Panics if `instant` is out of range or generation fails.
    #[track_caller]
    pub fn must_generate_at(&self, instant: DateTime<Utc>) -> Ulid {
        match self.generate_at(instant) {
            Ok(id) => id,
            Err(err) => panic!("failed to generate ULID at {instant}: {err}"),
        }
    }

    pub const fn clock(&self) -> &C {
        &self.clock
    }

    pub const fn pool(&self) -> &GeneratorPool<E> {
        &self.pool
    }
}

/// Builder for a [`Factory`].
///
/// An entropy source is mandatory; [`FactoryBuilder::build`] fails with
/// [`Error::MissingEntropySource`] without one.
#[derive(Debug)]
pub struct FactoryBuilder<C = SystemClock, E = DefaultEntropy> {
    clock: C,
    entropy: Option<E>,
    config: PoolConfig,
}

impl<E> FactoryBuilder<SystemClock, E> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            clock: SystemClock,
            entropy: None,
            config: PoolConfig::default(),
        }
    }
}

impl<E> Default for FactoryBuilder<SystemClock, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C, E> FactoryBuilder<C, E> {
    #[must_use]
    pub fn entropy(mut self, entropy: E) -> Self {
        self.entropy = Some(entropy);
        self
    }

    #[must_use]
    pub fn clock<C2>(self, clock: C2) -> FactoryBuilder<C2, E> {
        FactoryBuilder {
            clock,
            entropy: self.entropy,
            config: self.config,
        }
    }

    #[must_use]
    pub fn config(mut self, config: PoolConfig) -> Self {
        self.config = config;
        self
    }
}

impl<C, E> FactoryBuilder<C, E>
where
    C: Clock,
    E: EntropySource,
{
    /// # Errors
    /// - [`Error::MissingEntropySource`] if no entropy source was set
    /// - [`Error::InvalidConfig`] if the pool configuration is rejected
    pub fn build(self) -> Result<Factory<C, E>> {
        let entropy = self.entropy.ok_or(Error::MissingEntropySource)?;
        let pool = GeneratorPool::new(entropy, self.config)?;
        Ok(Factory {
            clock: self.clock,
            pool,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FixedClock, ReaderSource, StdRandom};
    use chrono::TimeZone;
    use std::{
        collections::HashSet,
        io,
        sync::atomic::{AtomicI64, Ordering},
        thread::scope,
    };

    /// Advances by one millisecond on every reading.
    struct StepClock(AtomicI64);
    impl Clock for StepClock {
        fn now(&self) -> DateTime<Utc> {
            DateTime::from_timestamp_millis(self.0.fetch_add(1, Ordering::Relaxed)).unwrap()
        }
    }

    fn single_shard() -> PoolConfig {
        PoolConfig {
            shards: 1,
            idle_per_shard: 1,
        }
    }

    fn fixed_clock() -> FixedClock {
        FixedClock::new(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
    }

    fn year_one() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(1, 1, 1, 12, 30, 1).unwrap()
    }

    fn year_2263() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2263, 1, 1, 12, 30, 1).unwrap()
    }

    fn collect_concurrently<C, E>(
        factory: &Factory<C, E>,
        threads: usize,
        per_thread: usize,
    ) -> Vec<Ulid>
    where
        C: Clock,
        E: EntropySource,
    {
        scope(|s| {
            let handles: Vec<_> = (0..threads)
                .map(|_| {
                    s.spawn(move || {
                        (0..per_thread)
                            .map(|_| factory.must_generate())
                            .collect::<Vec<_>>()
                    })
                })
                .collect();
            handles.into_iter().flat_map(|h| h.join().unwrap()).collect()
        })
    }

    #[test]
    fn default_factory_renders_26_chars() {
        let id = Factory::new_default().must_generate();
        assert_eq!(id.to_string().len(), 26);
        assert_eq!(Factory::default().generate().unwrap().encode().as_str().len(), 26);
    }

    #[test]
    fn unique_across_16_threads_on_the_system_clock() {
        let factory = Factory::new_default();
        let ids = collect_concurrently(&factory, 16, 625);
        assert_eq!(ids.len(), 10_000);
        assert_eq!(ids.iter().collect::<HashSet<_>>().len(), 10_000);
    }

    #[test]
    fn unique_across_16_threads_within_one_millisecond() {
        let factory = Factory::builder()
            .clock(fixed_clock())
            .entropy(DefaultEntropy)
            .build()
            .unwrap();
        let ids = collect_concurrently(&factory, 16, 625);
        assert_eq!(ids.iter().collect::<HashSet<_>>().len(), 10_000);
        assert!(ids.iter().all(|id| id.timestamp() == ids[0].timestamp()));
    }

    #[test]
    fn constant_entropy_is_monotonic_on_one_thread() {
        let factory = Factory::builder()
            .clock(fixed_clock())
            .entropy(|| ReaderSource(io::repeat(b'x')))
            .config(single_shard())
            .build()
            .unwrap();

        let ids: Vec<Ulid> = (0..1_000).map(|_| factory.must_generate()).collect();
        for pair in ids.windows(2) {
            assert!(pair[0] < pair[1]);
            assert!(pair[0].to_string() < pair[1].to_string());
        }
    }

    #[test]
    fn advancing_clock_stays_monotonic() {
        let factory = Factory::builder()
            .clock(StepClock(AtomicI64::new(1_700_000_000_000)))
            .entropy(|| StdRandom::seed_from_u64(11))
            .build()
            .unwrap();

        let ids: Vec<Ulid> = (0..100).map(|_| factory.must_generate()).collect();
        for pair in ids.windows(2) {
            assert_eq!(pair[0].timestamp() + 1, pair[1].timestamp());
            assert!(pair[0] < pair[1]);
        }
    }

    #[test]
    fn year_one_is_rejected() {
        let factory = Factory::new_default();
        assert!(matches!(
            factory.generate_at(year_one()),
            Err(Error::InstantOutOfRange { .. })
        ));

        let frozen = Factory::builder()
            .clock(FixedClock::new(year_one()))
            .entropy(DefaultEntropy)
            .build()
            .unwrap();
        assert!(matches!(
            frozen.generate(),
            Err(Error::InstantOutOfRange { .. })
        ));
    }

    #[test]
    #[should_panic(expected = "failed to generate ULID")]
    fn must_generate_at_year_one_panics() {
        Factory::new_default().must_generate_at(year_one());
    }

    #[test]
    #[should_panic(expected = "failed to generate ULID")]
    fn must_generate_at_year_2263_panics() {
        Factory::new_default().must_generate_at(year_2263());
    }

    #[test]
    fn builder_rejects_oversized_config() {
        let result = Factory::builder()
            .entropy(DefaultEntropy)
            .config(PoolConfig {
                shards: 1,
                idle_per_shard: usize::MAX,
            })
            .build();
        assert!(matches!(result, Err(Error::InvalidConfig { .. })));
    }

    #[test]
    fn year_2263_is_rejected() {
        assert!(matches!(
            Factory::new_default().generate_at(year_2263()),
            Err(Error::InstantOutOfRange { instant }) if instant == year_2263()
        ));
    }

    #[test]
    fn generate_at_embeds_the_instant() {
        let instant = Utc.with_ymd_and_hms(2030, 5, 6, 7, 8, 9).unwrap();
        let id = Factory::new_default().must_generate_at(instant);
        assert_eq!(id.datetime(), Some(instant));
    }

    #[test]
    fn builder_without_entropy_is_rejected() {
        let result: Result<Factory> = Factory::builder().build();
        assert!(matches!(result, Err(Error::MissingEntropySource)));
    }

    #[test]
    fn builder_rejects_zero_shards() {
        let result = Factory::builder()
            .entropy(DefaultEntropy)
            .config(PoolConfig {
                shards: 0,
                idle_per_shard: 1,
            })
            .build();
        assert!(matches!(result, Err(Error::InvalidConfig { .. })));
    }

    #[test]
    fn entropy_failure_is_returned_and_generator_released() {
        let factory = Factory::builder()
            .entropy(|| ReaderSource(io::empty()))
            .config(single_shard())
            .build()
            .unwrap();

        assert!(matches!(factory.generate(), Err(Error::EntropyRead(_))));
        assert_eq!(factory.pool().idle(), 1);
    }

    #[test]
    fn exhaustion_within_one_millisecond_is_an_error() {
        let factory = Factory::builder()
            .clock(fixed_clock())
            .entropy(|| ReaderSource(io::repeat(0xFF)))
            .config(single_shard())
            .build()
            .unwrap();

        let first = factory.generate().unwrap();
        assert_eq!(first.random(), Ulid::max_random());
        assert!(matches!(
            factory.generate(),
            Err(Error::EntropyExhausted { timestamp }) if timestamp == first.timestamp()
        ));
    }

    #[test]
    #[should_panic(expected = "failed to generate ULID")]
    fn must_generate_panics_on_exhaustion() {
        let factory = Factory::builder()
            .clock(fixed_clock())
            .entropy(|| ReaderSource(io::repeat(0xFF)))
            .config(single_shard())
            .build()
            .unwrap();
        factory.must_generate();
        factory.must_generate();
    }
}
