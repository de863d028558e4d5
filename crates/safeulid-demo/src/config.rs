use anyhow::bail;
use clap::Parser;
use safeulid::PoolConfig;

/// Runtime configuration for the `safeulid-demo` binary.
///
/// All values are parsed from CLI arguments or environment variables (a
/// `.env` file in the working directory is honoured).
#[derive(Parser, Debug, Clone)]
#[command(
    name = "safeulid-demo",
    version,
    about = "Generates ULIDs from many threads at once and checks them for duplicates"
)]
pub struct CliArgs {
    /// Number of threads generating IDs concurrently.
    ///
    /// Environment variable: `SAFEULID_THREADS`
    #[arg(short, long, env = "SAFEULID_THREADS", default_value_t = 16)]
    pub threads: usize,

    /// Number of IDs each thread generates.
    ///
    /// Environment variable: `SAFEULID_COUNT`
    #[arg(short, long, env = "SAFEULID_COUNT", default_value_t = 625)]
    pub count: usize,

    /// Number of generator pool shards. Defaults to four per logical CPU.
    ///
    /// Environment variable: `SAFEULID_SHARDS`
    #[arg(long, env = "SAFEULID_SHARDS")]
    pub shards: Option<usize>,

    /// Idle generators kept per shard. Defaults to 8.
    ///
    /// Environment variable: `SAFEULID_IDLE_PER_SHARD`
    #[arg(long, env = "SAFEULID_IDLE_PER_SHARD")]
    pub idle_per_shard: Option<usize>,

    /// Use a dedicated factory instead of the process-wide default.
    #[arg(long, default_value_t = false)]
    pub isolated: bool,

    /// Sort the IDs before printing them.
    #[arg(long, default_value_t = false)]
    pub sort: bool,

    /// Only log the summary and skip printing IDs.
    #[arg(short, long, default_value_t = false)]
    pub quiet: bool,
}

#[derive(Debug, Clone)]
pub struct DemoConfig {
    pub threads: usize,
    pub count: usize,
    pub total: usize,
    /// `None` keeps the library defaults.
    pub pool: Option<PoolConfig>,
    pub isolated: bool,
    pub sort: bool,
    pub quiet: bool,
}

impl TryFrom<CliArgs> for DemoConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        if args.threads == 0 {
            bail!("SAFEULID_THREADS must be greater than 0");
        }

        if args.count == 0 {
            bail!("SAFEULID_COUNT must be greater than 0");
        }

        if args.shards == Some(0) {
            bail!("SAFEULID_SHARDS must be greater than 0");
        }

        let total = args
            .threads
            .checked_mul(args.count)
            .ok_or_else(|| anyhow::anyhow!("Overflow in total ID count computation"))?;

        let pool = match (args.shards, args.idle_per_shard) {
            (None, None) => None,
            (shards, idle_per_shard) => {
                let defaults = PoolConfig::default();
                Some(PoolConfig {
                    shards: shards.unwrap_or(defaults.shards),
                    idle_per_shard: idle_per_shard.unwrap_or(defaults.idle_per_shard),
                })
            }
        };

        Ok(Self {
            threads: args.threads,
            count: args.count,
            total,
            pool,
            isolated: args.isolated,
            sort: args.sort,
            quiet: args.quiet,
        })
    }
}
