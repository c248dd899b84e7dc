use tracing_subscriber::EnvFilter;

/// Environment variable holding a tracing filter, e.g. `listing_rank=debug`.
pub const LOG_ENV: &str = "LISTING_RANK_LOG";

/// Install the global subscriber, writing to stderr so stdout stays clean
/// for tables and exports.
///
/// Precedence: `LISTING_RANK_LOG`, then `--verbose` (debug), then the
/// config file's `log`, then `warn`.
pub fn init_tracing(verbose: bool, configured: Option<&str>) {
    let fallback = if verbose {
        "listing_rank=debug"
    } else {
        configured.unwrap_or("warn")
    };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(fallback));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
