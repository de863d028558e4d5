use tracing_subscriber::{EnvFilter, fmt};

/// Installs a `tracing-subscriber` formatter on stderr.
///
/// Verbosity comes from `RUST_LOG`, defaulting to `info`. Stdout is left for
/// the generated IDs.
pub fn init_telemetry() -> anyhow::Result<()> {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(true)
        .with_timer(fmt::time::ChronoLocal::rfc_3339())
        .try_init()
        .map_err(anyhow::Error::msg)
}
