use tracing_subscriber::EnvFilter;

/// Environment variable holding a tracing filter, e.g. `CAO_LOG=cao_interaction=debug`.
pub const LOG_ENV: &str = "CAO_LOG";

/// Installs the stderr subscriber.
///
/// `CAO_LOG` wins when set; otherwise `debug` with `--debug` and `warn`
/// without, so logs stay out of the way of rendered panels.
pub fn init(debug: bool) {
    let default_level = if debug { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init();
}
