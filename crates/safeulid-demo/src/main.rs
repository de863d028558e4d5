#![doc = include_str!("../README.md")]

mod config;
mod telemetry;

use anyhow::{anyhow, bail};
use clap::Parser;
use config::{CliArgs, DemoConfig};
use safeulid::{BoxEntropy, Clock, DefaultEntropy, EntropySource, Factory, Ulid};
use std::{
    collections::HashSet,
    io::{BufWriter, Write},
    thread::scope,
    time::Instant,
};
use telemetry::init_telemetry;
use tracing::{debug, info};

fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    let config = DemoConfig::try_from(args)?;

    init_telemetry()?;
    info!(
        threads = config.threads,
        count = config.count,
        isolated = config.isolated,
        "starting ULID generation"
    );

    let started = Instant::now();
    let mut ids = if config.isolated {
        let mut builder = Factory::builder().entropy(DefaultEntropy);
        if let Some(pool) = config.pool {
            builder = builder.config(pool);
        }
        let factory = builder.build()?;
        generate_all(&factory, &config)?
    } else {
        if let Some(pool) = config.pool {
            let factory = Factory::builder()
                .entropy(BoxEntropy::new(DefaultEntropy))
                .config(pool)
                .build()?;
            safeulid::init_default(factory)?;
            debug!(
                shards = pool.shards,
                idle_per_shard = pool.idle_per_shard,
                "installed custom default factory"
            );
        }
        generate_all(safeulid::default_factory(), &config)?
    };
    let elapsed = started.elapsed();

    if config.sort {
        ids.sort_unstable();
    }

    let distinct = ids.iter().collect::<HashSet<_>>().len();

    if !config.quiet {
        let stdout = std::io::stdout();
        let mut out = BufWriter::new(stdout.lock());
        for id in &ids {
            writeln!(out, "{id}")?;
        }
        out.flush()?;
    }

    info!(
        total = ids.len(),
        distinct,
        elapsed_us = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX),
        "finished ULID generation"
    );

    if distinct != config.total {
        bail!("{} duplicate ULIDs detected", config.total - distinct);
    }

    Ok(())
}

/// Spawns `config.threads` threads, each drawing `config.count` IDs from
/// `factory`.
fn generate_all<C, E>(
    factory: &Factory<C, E>,
    config: &DemoConfig,
) -> anyhow::Result<Vec<Ulid>>
where
    C: Clock,
    E: EntropySource,
{
    let count = config.count;
    scope(|s| {
        let handles: Vec<_> = (0..config.threads)
            .map(|_| {
                s.spawn(move || {
                    (0..count)
                        .map(|_| factory.must_generate())
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut ids = Vec::with_capacity(config.total);
        for handle in handles {
            let batch = handle
                .join()
                .map_err(|_| anyhow!("ULID generation thread panicked"))?;
            ids.extend(batch);
        }
        Ok(ids)
    })
}
